use std::sync::Arc;

use actix_web::web;
use anyhow::Result;
use tokio::sync::Notify;
use tracing::{error, info};

use tubely_thumbnails::config::Config;
use tubely_thumbnails::storage::build_store;
use tubely_thumbnails::videos::InMemoryVideos;
use tubely_thumbnails::web::server::run_server;
use tubely_thumbnails::web::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();
    info!("Logging initialized, starting the application");

    let config = Config::from_env()?;

    let thumbnails = build_store(&config).await?;
    let state = web::Data::new(AppState::new(
        Arc::new(InMemoryVideos::new()),
        thumbnails,
        config.jwt_secret.clone(),
    ));

    // Create shutdown signal
    let shutdown = Arc::new(Notify::new());

    let ctrl_c_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {:?}", e);
            return;
        }
        ctrl_c_shutdown.notify_one();
    });

    if let Err(e) = run_server(&config, state, shutdown).await {
        error!("Web server error: {:?}", e);
        return Err(e.into());
    }

    info!("Shutdown complete");
    Ok(())
}
