mod api;
mod router;
mod settlement_runner;
mod state;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rankd_core::Config;
use rankd_store::{RedisStore, Store};

use crate::state::AppState;

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    rankd_core::config::load_dotenv();
    let config = Config::from_env();
    config.log_summary();

    let store: Arc<dyn Store> = Arc::new(RedisStore::connect(&config.redis).await?);
    let state = Arc::new(AppState::new(config.clone(), store));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = tokio::spawn(settlement_runner::run_settlement_loop(
        state.clone(),
        shutdown_rx,
    ));

    let app = router::build_router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Hard stop: the in-flight tick finishes, no further ticks run.
    shutdown_tx.send(true).ok();
    scheduler.await.ok();
    info!("Shutdown complete");

    Ok(())
}
