//! Rimba API Server
//!
//! Main entry point for the Rimba policy service.

mod sweeper;

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rimba_api::{AppState, create_router};
use rimba_core::access::PermissionOracle;
use rimba_core::policy::TransactionPolicy;
use rimba_db::{ProfileRepository, connect_with};
use rimba_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rimba=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    let db = connect_with(&config.database).await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    let policy = TransactionPolicy::from_config(&config.policy)?;
    info!(
        timezone = %config.policy.aggregation_timezone,
        cashless_threshold = %config.policy.cashless_threshold,
        "Transaction policy configured"
    );

    let oracle = PermissionOracle::new(
        Arc::new(ProfileRepository::new(db.clone())),
        Duration::from_secs(config.policy.permission_cache_ttl_secs),
    );

    let sweep_every = Duration::from_secs(config.policy.auto_approve_sweep_secs.max(1));
    tokio::spawn(sweeper::run(db.clone(), sweep_every));
    info!(every_secs = sweep_every.as_secs(), "Auto-approval sweeper started");

    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(JwtService::new(JwtConfig::from(&config.jwt))),
        oracle,
        policy,
        policy_config: Arc::new(config.policy.clone()),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
