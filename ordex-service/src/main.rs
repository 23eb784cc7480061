use std::net::SocketAddr;

use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ordex_broker::RequestConsumer;
use ordex_core::config::ServiceConfig;
use ordex_service::{router, AppState};
use ordex_store::OrderStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServiceConfig::from_env();
    let store = OrderStore::connect(&config.database_url).await?;

    // Supervised background consumer: strictly serialized message handling,
    // cancelled when the HTTP server shuts down.
    let cancel = CancellationToken::new();
    let consumer = RequestConsumer::new(config.clone(), store.clone());
    let consumer_task = tokio::spawn(consumer.run(cancel.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port()));
    let app = router(AppState::build(config.clone(), store)?);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, instance = %config.instance, "ordex listening");

    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            shutdown.cancel();
        })
        .await?;

    cancel.cancel();
    let _ = consumer_task.await;
    Ok(())
}
