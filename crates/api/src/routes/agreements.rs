//! Agreement expiry sweep, driven by the external scheduler.

use axum::{Json, Router, body::Bytes, extract::State, routing::post};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::optional_json;
use crate::{ApiError, AppState, middleware::AuthUser};
use tulay_core::workflow::{EntityKind, PermissionMatrix, Transition};

/// Creates the agreement routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/agreements/sweep", post(sweep))
}

/// Optional sweep parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SweepRequest {
    /// Overrides the server's date, for backfills.
    pub today: Option<NaiveDate>,
}

/// Sweep summary.
#[derive(Debug, Serialize)]
pub struct SweepResponse {
    /// Date the sweep evaluated against.
    pub today: NaiveDate,
    /// Submissions moved, with their new status.
    pub changed: Vec<SweepChange>,
}

/// One moved submission.
#[derive(Debug, Serialize)]
pub struct SweepChange {
    /// Submission id.
    pub id: Uuid,
    /// Status after the sweep.
    pub status: String,
}

/// POST `/agreements/sweep` - Only the `system` role may run it.
async fn sweep(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Bytes,
) -> Result<Json<SweepResponse>, ApiError> {
    PermissionMatrix::authorize(
        auth.role(),
        EntityKind::Submission,
        Transition::MarkForRenewal,
    )?;
    let payload: SweepRequest = optional_json(&body)?;
    let today = payload.today.unwrap_or_else(|| Utc::now().date_naive());

    let changed = state
        .submissions()
        .sweep_agreements(today, state.review_window_days)
        .await?
        .into_iter()
        .map(|m| SweepChange {
            id: m.id,
            status: m.status,
        })
        .collect();

    Ok(Json(SweepResponse { today, changed }))
}
