//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST routes for submissions, events, reports and agreements
//! - Authentication middleware
//! - Structured error responses

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tulay_core::tier::TierThresholds;
use tulay_core::workflow::EventPublisher;
use tulay_db::{EventRepository, ReportRepository, SubmissionRepository};
use tulay_shared::JwtService;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Domain event channel for post-commit listeners.
    pub publisher: EventPublisher,
    /// Successful-event breakpoints for tier upgrades.
    pub tier_thresholds: TierThresholds,
    /// Days ahead of agreement expiry that a review starts.
    pub review_window_days: u32,
}

impl AppState {
    /// Submission repository over the shared pool.
    #[must_use]
    pub fn submissions(&self) -> SubmissionRepository {
        SubmissionRepository::new((*self.db).clone(), self.publisher.clone())
    }

    /// Event repository over the shared pool.
    #[must_use]
    pub fn events(&self) -> EventRepository {
        EventRepository::new(
            (*self.db).clone(),
            self.publisher.clone(),
            self.tier_thresholds,
        )
    }

    /// Report repository over the shared pool.
    #[must_use]
    pub fn reports(&self) -> ReportRepository {
        ReportRepository::new((*self.db).clone(), self.publisher.clone())
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
