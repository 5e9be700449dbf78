use clearnext::client::HttpBackend;
use clearnext::notifications::{LogNotifier, NotificationService};
use clearnext::{router, AppState, Config, FileProfileStore, ProfileStore};
use std::{net::SocketAddr, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    let store: Arc<dyn ProfileStore> = Arc::new(FileProfileStore::open(config.data_path.clone()).await?);
    let backend = Arc::new(HttpBackend::new(config.api_url.clone()));
    info!(api = %config.api_url, timezone = %config.timezone, "using backend");

    if config.notifications {
        let service = NotificationService::new(store.clone(), Arc::new(LogNotifier));
        tokio::spawn(service.run());
    }

    let app = router(AppState::new(store, backend, config.timezone.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
    }
}
