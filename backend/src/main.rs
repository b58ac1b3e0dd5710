use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use common::logger::init_logger;
use order_eta::{
    config::AppConfig,
    db::Db,
    estimation::WaitEstimator,
    http::{self, AppState, token::HmacOrderTokenVerifier},
    order::repository_sqlx::SqlxOrderRepository,
    time::SystemClock,
};

/// Connects the DB, runs migrations and wires the estimator behind the API.
async fn init_state(cfg: &AppConfig) -> anyhow::Result<AppState> {
    let db = Db::connect(&cfg.database_url)
        .await
        .context("database connect failed")?;
    db.migrate().await.context("schema migration failed")?;

    let repo = Arc::new(SqlxOrderRepository::new(db.pool.clone()));
    let estimator = WaitEstimator::from_config(repo.clone(), Arc::new(SystemClock), &cfg.estimator);
    let tokens = HmacOrderTokenVerifier::new(&cfg.order_token_secret)?;

    Ok(AppState {
        repo,
        estimator: Arc::new(estimator),
        tokens: Arc::new(tokens),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_logger("order-eta", is_production);

    tracing::info!("Starting order wait-time service...");

    let cfg = AppConfig::from_env();
    let addr: SocketAddr = cfg
        .bind_addr
        .parse()
        .with_context(|| format!("invalid BIND_ADDR: {}", cfg.bind_addr))?;

    let state = init_state(&cfg).await?;

    http::serve(state, addr, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = ?e, "failed to listen for shutdown signal");
        }
        tracing::info!("Shutdown signal received");
    })
    .await
}
