use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use product_service::config::{Config, HealthTimeouts};
use product_service::db::PgProductRepository;
use product_service::service::ProductService;
use product_service::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (ignored in production where env vars are injected)
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,product_service=debug")
            }),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;

    info!(max_connections = config.max_connections, "Connecting to PostgreSQL...");
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    info!("Database connection pool established.");

    info!("Running migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations complete.");

    let repository = PgProductRepository::new(pool);
    let state = AppState {
        products: ProductService::new(Arc::new(repository)),
        health: HealthTimeouts::from(&config),
    };

    let app = build_router(state);

    warn!(
        "No authentication is configured and CORS is permissive: every endpoint is open. \
         Keep this service behind an authenticating gateway."
    );

    let addr = format!("{}:{}", config.host, config.port);
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
}
