mod dayfinder;
mod days;
mod problem;
mod router;
mod telemetry;

use std::net::SocketAddr;

use tracing::info;

use dayfinder_notify::HistoryClient;
use dayfinder_storage::Database;
use dayfinder_util::{load_env_file, AppConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let config = AppConfig::from_env()?;

    telemetry::init_tracing(&config)?;
    let metrics = telemetry::init_metrics()?;

    let storage = Database::connect(&config.database_url).await?;
    storage.run_migrations().await?;

    let history = HistoryClient::new(
        config.history_base_url.clone(),
        config.history_timeout,
        reqwest::Client::new(),
    );

    let state = router::AppState::new(metrics, storage, history);

    let addr: SocketAddr = config.bind_addr;
    info!(stage = "app", %addr, env = %config.environment.as_str(), "starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router::app_router(state))
        .await
        .map_err(|err| err.into())
}
