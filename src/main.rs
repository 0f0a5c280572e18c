use keyscan::{
    config::AppConfig,
    scan::ScanContext,
    store::{connect_store_in_background, SharedLookupStore},
    web,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging first
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keyscan=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting keyscan v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load()?;
    info!(
        "Configuration loaded: network={:?}, formats={:?}",
        config.scan.network, config.scan.enabled_formats
    );

    // Sessions start immediately; lookups report "not found" until the store attaches
    let store = Arc::new(SharedLookupStore::new(config.store.lookup_timeout()));
    let store_handle = connect_store_in_background(store.clone(), config.store.clone());

    let scan = Arc::new(ScanContext::from_config(&config.scan, store));
    let state = web::AppState::new(scan, config.scan.event_buffer)
        .with_stop_grace(config.scan.stop_grace());
    let app = web::create_router(state, config.web.static_dir.as_deref());

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{} (websocket at /ws)", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store_handle.abort();
    info!("Server shut down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
