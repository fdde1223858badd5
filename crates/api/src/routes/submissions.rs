//! Partnership submission routes.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use super::{NoteBody, TransitionBody, optional_json};
use crate::{ApiError, AppState, middleware::AuthUser};
use tulay_core::workflow::{DocumentRef, SubmissionStatus, Transition};
use tulay_db::CreateSubmissionInput;
use tulay_db::entities::submissions;

/// Creates the submission routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/submissions", get(list_submissions).post(create_submission))
        .route(
            "/submissions/{id}",
            get(get_submission).delete(delete_submission),
        )
        .route("/submissions/{id}/pre-approve", post(pre_approve))
        .route("/submissions/{id}/approve", post(approve))
        .route("/submissions/{id}/reject", post(reject))
        .route("/submissions/{id}/renew", post(renew))
        .route("/submissions/{id}/reapply", post(reapply))
        .route("/submissions/{id}/admin-notes", post(annotate))
}

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters for listing submissions.
#[derive(Debug, Deserialize)]
pub struct ListSubmissionsQuery {
    /// Filter by status (e.g. `PENDING`).
    pub status: Option<String>,
}

/// Request body for a new application.
#[derive(Debug, Deserialize)]
pub struct CreateSubmissionRequest {
    /// Barangay applying for the partnership.
    pub barangay_name: String,
    /// Stored MOA reference.
    pub moa: Option<DocumentRef>,
    /// Agreement expiry date (YYYY-MM-DD).
    pub agreement_expires_on: Option<NaiveDate>,
}

/// Request body for renewal.
#[derive(Debug, Deserialize)]
pub struct RenewRequest {
    /// New agreement expiry date; must be after today.
    pub agreement_expires_on: Option<NaiveDate>,
    /// Replacement MOA reference.
    pub moa: Option<DocumentRef>,
    /// Note appended to the admin notes.
    pub admin_notes: Option<String>,
}

/// Request body for re-applying after rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ReapplyRequest {
    /// New MOA reference; the rejected submission's MOA is reused if absent.
    pub moa: Option<DocumentRef>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET `/submissions` - List submissions, newest first.
async fn list_submissions(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ListSubmissionsQuery>,
) -> Result<Json<Vec<submissions::Model>>, ApiError> {
    let status = match query.status.as_deref() {
        Some(s) => Some(
            SubmissionStatus::parse(s)
                .ok_or_else(|| ApiError::validation(format!("unknown status '{s}'")))?,
        ),
        None => None,
    };
    Ok(Json(state.submissions().list(status).await?))
}

/// POST `/submissions` - Record a new application.
async fn create_submission(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateSubmissionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreateSubmissionInput {
        barangay_name: payload.barangay_name,
        moa: payload.moa,
        agreement_expires_on: payload.agreement_expires_on,
    };
    let model = state.submissions().create(input, &auth.actor()).await?;
    Ok((StatusCode::CREATED, Json(model)))
}

/// GET `/submissions/{id}` - Fetch one submission.
async fn get_submission(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<submissions::Model>, ApiError> {
    Ok(Json(state.submissions().get(id).await?))
}

/// DELETE `/submissions/{id}` - Administrative removal.
async fn delete_submission(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.submissions().delete(id, &auth.actor()).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn transition(
    state: &AppState,
    auth: &AuthUser,
    id: Uuid,
    body: &Bytes,
    transition: Transition,
) -> Result<Json<submissions::Model>, ApiError> {
    let body: TransitionBody = optional_json(body)?;
    let request = body.into_request(transition, auth.actor());
    Ok(Json(state.submissions().transition(id, &request).await?))
}

/// POST `/submissions/{id}/pre-approve`
async fn pre_approve(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<submissions::Model>, ApiError> {
    transition(&state, &auth, id, &body, Transition::PreApprove).await
}

/// POST `/submissions/{id}/approve`
async fn approve(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<submissions::Model>, ApiError> {
    transition(&state, &auth, id, &body, Transition::Approve).await
}

/// POST `/submissions/{id}/reject` - Requires `rejection_reason`.
async fn reject(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<submissions::Model>, ApiError> {
    transition(&state, &auth, id, &body, Transition::Reject).await
}

/// POST `/submissions/{id}/renew` - Re-stamp the agreement expiry.
async fn renew(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RenewRequest>,
) -> Result<Json<submissions::Model>, ApiError> {
    let mut request = TransitionBody {
        admin_notes: payload.admin_notes,
        ..TransitionBody::default()
    }
    .into_request(Transition::Renew, auth.actor());
    request.payload.agreement_expires_on = payload.agreement_expires_on;

    let model = state
        .submissions()
        .transition_with_moa(id, &request, payload.moa)
        .await?;
    Ok(Json(model))
}

/// POST `/submissions/{id}/reapply` - File a fresh application after rejection.
async fn reapply(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let payload: ReapplyRequest = optional_json(&body)?;
    let model = state
        .submissions()
        .reapply(id, payload.moa, &auth.actor())
        .await?;
    Ok((StatusCode::CREATED, Json(model)))
}

/// POST `/submissions/{id}/admin-notes`
async fn annotate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<NoteBody>,
) -> Result<Json<submissions::Model>, ApiError> {
    let model = state
        .submissions()
        .annotate(id, &auth.actor(), &payload.note)
        .await?;
    Ok(Json(model))
}
