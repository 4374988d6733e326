use std::sync::Arc;

use anyhow::Result;
use imagedb::{
    catalog::{CatalogSnapshot, CatalogStore, LocalCatalog, read_seed},
    config::AppConfig,
    o11y,
    routes::{self, AppState},
};
use tokio::sync::RwLock;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Arc::new(AppConfig::load()?);

    let _telemetry = o11y::TelemetryGuard::init(&config)?;

    let store = Arc::new(CatalogStore::new(&config.data_dir));
    let seed_file = config.seed_file.clone();
    let snapshot = store.load_or_rebuild(|| match &seed_file {
        Some(path) => {
            tracing::info!(seed = %path.display(), "importing seed catalog");
            read_seed(path)
        }
        None => Ok(CatalogSnapshot::empty()),
    })?;
    tracing::info!(
        tags = snapshot.tags.len(),
        entities = snapshot.entities.len(),
        "catalog loaded"
    );

    let catalog = LocalCatalog::new(Arc::new(RwLock::new(snapshot)), Some(store));
    let state = AppState::new(config.clone(), catalog);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "HTTP server listening");

    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
