pub mod errors;
pub mod handlers;
pub mod models;
pub mod server;
pub mod thumbnails;

pub use errors::ApiError;
pub use models::AppState;
