use anyhow::Result;
use feeder::{build_connectors, DatabaseFiller};
use migration::{Migrator, MigratorTrait};
use shared::{get_db_connection, Config, Readiness, SeaOrmCandleStore};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod error;
mod routes;

use routes::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting candle API server...");

    let db = get_db_connection(&config.database_url).await?;
    Migrator::up(&db, None).await?;
    info!("Connected to database, migrations applied");

    let readiness = Readiness::new();
    let connectors = build_connectors(&config)?;
    let filler = DatabaseFiller::new(
        Arc::new(SeaOrmCandleStore::new(db.clone())),
        connectors,
        readiness.clone(),
        config.fill.clone(),
    );

    tokio::spawn(async move {
        if let Err(e) = filler.fill_database(chrono::Utc::now()).await {
            error!("Initial fill failed, serving broken state: {}", e);
        }
    });

    let app = routes::router(AppState { db, readiness });

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!("API server listening on http://{}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
