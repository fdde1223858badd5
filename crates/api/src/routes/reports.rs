//! Report routes: primary flow, clearances and financials.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::Deserialize;
use uuid::Uuid;

use super::{NoteBody, TransitionBody, optional_json};
use crate::{ApiError, AppState, middleware::AuthUser};
use tulay_core::workflow::{ClearanceStage, DocumentRef, Financials, Transition};
use tulay_db::entities::reports;
use tulay_db::{CreateReportInput, UpdateFinancialsInput};

/// Creates the report routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/events/{id}/report",
            get(get_event_report).post(create_report),
        )
        .route("/reports/{id}", get(get_report))
        .route("/reports/{id}/submit", post(submit))
        .route("/reports/{id}/pre-approve", post(pre_approve))
        .route("/reports/{id}/review", post(review))
        .route("/reports/{id}/approve", post(approve))
        .route("/reports/{id}/reject", post(reject))
        .route("/reports/{id}/first-clearance", post(first_clearance))
        .route("/reports/{id}/final-clearance", post(final_clearance))
        .route("/reports/{id}/financials", put(update_financials))
        .route("/reports/{id}/admin-notes", post(annotate))
}

/// Request body for starting a report.
#[derive(Debug, Default, Deserialize)]
pub struct CreateReportRequest {
    /// Initial financial fields.
    pub financials: Option<Financials>,
    /// Stored report document reference.
    pub report_file: Option<DocumentRef>,
}

/// Request body for `PUT /reports/{id}/financials`.
#[derive(Debug, Deserialize)]
pub struct UpdateFinancialsRequest {
    /// Cash allocated to the event.
    pub cash_allocation: rust_decimal::Decimal,
    /// In-kind expenditure.
    pub in_kind_expenditure: rust_decimal::Decimal,
    /// Replacement report document reference.
    pub report_file: Option<DocumentRef>,
}

/// GET `/events/{id}/report`
async fn get_event_report(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<Json<reports::Model>, ApiError> {
    Ok(Json(state.reports().get_for_event(event_id).await?))
}

/// POST `/events/{id}/report` - Start the report for a completed event.
async fn create_report(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(event_id): Path<Uuid>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let payload: CreateReportRequest = optional_json(&body)?;
    let input = CreateReportInput {
        financials: payload.financials,
        report_file: payload.report_file,
    };
    let model = state
        .reports()
        .create(event_id, input, &auth.actor())
        .await?;
    Ok((StatusCode::CREATED, Json(model)))
}

/// GET `/reports/{id}`
async fn get_report(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<reports::Model>, ApiError> {
    Ok(Json(state.reports().get(id).await?))
}

async fn transition(
    state: &AppState,
    auth: &AuthUser,
    id: Uuid,
    body: &Bytes,
    transition: Transition,
) -> Result<Json<reports::Model>, ApiError> {
    let body: TransitionBody = optional_json(body)?;
    let request = body.into_request(transition, auth.actor());
    Ok(Json(state.reports().transition(id, &request).await?))
}

/// POST `/reports/{id}/submit`
async fn submit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<reports::Model>, ApiError> {
    transition(&state, &auth, id, &body, Transition::Submit).await
}

/// POST `/reports/{id}/pre-approve`
async fn pre_approve(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<reports::Model>, ApiError> {
    transition(&state, &auth, id, &body, Transition::PreApprove).await
}

/// POST `/reports/{id}/review`
async fn review(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<reports::Model>, ApiError> {
    transition(&state, &auth, id, &body, Transition::Review).await
}

/// POST `/reports/{id}/approve`
async fn approve(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<reports::Model>, ApiError> {
    transition(&state, &auth, id, &body, Transition::Approve).await
}

/// POST `/reports/{id}/reject` - Return to DRAFT; requires `rejection_reason`.
async fn reject(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<reports::Model>, ApiError> {
    transition(&state, &auth, id, &body, Transition::Reject).await
}

/// POST `/reports/{id}/first-clearance`
async fn first_clearance(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<reports::Model>, ApiError> {
    let model = state
        .reports()
        .clear(id, ClearanceStage::First, &auth.actor())
        .await?;
    Ok(Json(model))
}

/// POST `/reports/{id}/final-clearance` - Also clears the report's event.
async fn final_clearance(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<reports::Model>, ApiError> {
    let model = state
        .reports()
        .clear(id, ClearanceStage::Final, &auth.actor())
        .await?;
    Ok(Json(model))
}

/// PUT `/reports/{id}/financials` - Only while the report is editable.
async fn update_financials(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFinancialsRequest>,
) -> Result<Json<reports::Model>, ApiError> {
    let input = UpdateFinancialsInput {
        financials: Financials {
            cash_allocation: payload.cash_allocation,
            in_kind_expenditure: payload.in_kind_expenditure,
        },
        report_file: payload.report_file,
    };
    let model = state
        .reports()
        .update_financials(id, input, &auth.actor())
        .await?;
    Ok(Json(model))
}

/// POST `/reports/{id}/admin-notes`
async fn annotate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<NoteBody>,
) -> Result<Json<reports::Model>, ApiError> {
    let model = state
        .reports()
        .annotate(id, &auth.actor(), &payload.note)
        .await?;
    Ok(Json(model))
}
