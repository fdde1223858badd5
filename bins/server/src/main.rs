//! Tulay API Server
//!
//! Main entry point for the Tulay workflow service.

use std::sync::Arc;

use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tulay_api::{AppState, create_router};
use tulay_core::tier::TierThresholds;
use tulay_core::workflow::EventPublisher;
use tulay_db::{Migrator, connect};
use tulay_shared::jwt::JwtConfig;
use tulay_shared::{AppConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tulay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    let tier_thresholds =
        TierThresholds::new(config.tier.silver, config.tier.gold, config.tier.platinum)?;

    let db = connect(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    info!("Connected to database");

    if config.database.run_migrations {
        Migrator::up(&db, None).await?;
        info!("Migrations applied");
    }

    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expiry_secs: config.jwt.access_token_expiry_secs,
    });

    // Stand-in for the external mirror: it only needs committed changes.
    let publisher = EventPublisher::default();
    let mut events = publisher.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => info!(
                    entity_kind = %event.entity_kind,
                    entity_id = %event.entity_id,
                    new_status = %event.new_status,
                    occurred_at = %event.occurred_at,
                    "domain event"
                ),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "domain event listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        publisher,
        tier_thresholds,
        review_window_days: config.agreements.review_window_days,
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(
        %addr,
        silver = tier_thresholds.silver(),
        gold = tier_thresholds.gold(),
        platinum = tier_thresholds.platinum(),
        "Server listening"
    );

    axum::serve(listener, app).await?;

    Ok(())
}
