use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use actix_files::Files;
use actix_web::{web, App, HttpServer};
use tokio::sync::Notify;
use tracing::info;

use crate::config::{Config, StoreKind};
use crate::web::handlers;
use crate::web::models::AppState;

/// API routes, without any static file serving.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::upload_thumbnail)
        .service(handlers::get_thumbnail)
        .service(handlers::create_video)
        .service(handlers::get_video);
}

pub async fn run_server(
    config: &Config,
    state: web::Data<AppState>,
    shutdown_signal: Arc<Notify>,
) -> std::io::Result<()> {
    let addr = config.bind_address().parse::<SocketAddr>().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Failed to parse host and port into SocketAddr: {e}"),
        )
    })?;

    // Filesystem thumbnails are served straight from the asset root.
    let assets: Option<PathBuf> = match config.thumbnail_store {
        StoreKind::Filesystem => Some(config.assets_root.clone()),
        StoreKind::Memory => None,
    };

    let server = HttpServer::new(move || {
        let assets = assets.clone();
        App::new().app_data(state.clone()).configure(move |cfg| {
            routes(cfg);
            if let Some(root) = assets {
                cfg.service(Files::new("/assets", root));
            }
        })
    })
    .bind(addr)?
    .run();

    info!("Starting thumbnail server on: {addr}");

    let handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal.notified().await;
        info!("Shutdown signal received, stopping web server");
        handle.stop(true).await;
    });

    server.await
}
