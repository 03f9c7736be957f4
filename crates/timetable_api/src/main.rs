use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use timetable_api::config::Config;
use timetable_api::db::TimetableDbManager;
use timetable_api::server::create_router;
use timetable_api::service::TimetableService;
use timetable_api::time::SystemClock;
use timetable_api::types::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Level is controlled by RUST_LOG (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("Failed to read configuration")?;
    info!(
        host = %config.host,
        port = config.port,
        database = %config.database_path.display(),
        "Configuration"
    );

    let store = TimetableDbManager::new(&config.database_path).with_context(|| {
        format!(
            "Failed to open timetable database at {}",
            config.database_path.display()
        )
    })?;

    let service = TimetableService::new(Arc::new(store), Arc::new(SystemClock));
    let app = create_router(Arc::new(AppState::new(service)));

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
    info!("Server is running on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
