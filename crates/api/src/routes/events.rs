//! Event routes.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use uuid::Uuid;

use super::{NoteBody, TransitionBody, optional_json};
use crate::{ApiError, AppState, middleware::AuthUser};
use tulay_core::workflow::{DocumentRef, Transition};
use tulay_db::CreateEventInput;
use tulay_db::entities::events;

/// Creates the event routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/submissions/{id}/events",
            get(list_events).post(create_event),
        )
        .route("/events/{id}", get(get_event))
        .route("/events/{id}/pre-approve", post(pre_approve))
        .route("/events/{id}/approve", post(approve))
        .route("/events/{id}/reject", post(reject))
        .route("/events/{id}/complete", post(complete))
        .route("/events/{id}/cancel", post(cancel))
        .route("/events/{id}/admin-notes", post(annotate))
}

/// Request body for proposing an event.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    /// Event title.
    pub title: String,
    /// Expected number of participants.
    pub expected_participants: i32,
    /// Stored proposal document reference.
    pub proposal: Option<DocumentRef>,
}

/// GET `/submissions/{id}/events` - A submission's events, oldest first.
async fn list_events(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(submission_id): Path<Uuid>,
) -> Result<Json<Vec<events::Model>>, ApiError> {
    Ok(Json(state.events().list_for_submission(submission_id).await?))
}

/// POST `/submissions/{id}/events` - Propose an event.
async fn create_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(submission_id): Path<Uuid>,
    Json(payload): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreateEventInput {
        title: payload.title,
        expected_participants: payload.expected_participants,
        proposal: payload.proposal,
    };
    let model = state
        .events()
        .create(submission_id, input, &auth.actor())
        .await?;
    Ok((StatusCode::CREATED, Json(model)))
}

/// GET `/events/{id}`
async fn get_event(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<events::Model>, ApiError> {
    Ok(Json(state.events().get(id).await?))
}

async fn transition(
    state: &AppState,
    auth: &AuthUser,
    id: Uuid,
    body: &Bytes,
    transition: Transition,
) -> Result<Json<events::Model>, ApiError> {
    let body: TransitionBody = optional_json(body)?;
    let request = body.into_request(transition, auth.actor());
    Ok(Json(state.events().transition(id, &request).await?))
}

/// POST `/events/{id}/pre-approve` - Owning submission must be APPROVED.
async fn pre_approve(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<events::Model>, ApiError> {
    transition(&state, &auth, id, &body, Transition::PreApprove).await
}

/// POST `/events/{id}/approve` - Owning submission must be APPROVED.
async fn approve(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<events::Model>, ApiError> {
    transition(&state, &auth, id, &body, Transition::Approve).await
}

/// POST `/events/{id}/reject`
async fn reject(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<events::Model>, ApiError> {
    transition(&state, &auth, id, &body, Transition::Reject).await
}

/// POST `/events/{id}/complete` - Requires `success`.
async fn complete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<events::Model>, ApiError> {
    transition(&state, &auth, id, &body, Transition::Complete).await
}

/// POST `/events/{id}/cancel`
async fn cancel(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<events::Model>, ApiError> {
    transition(&state, &auth, id, &body, Transition::Cancel).await
}

/// POST `/events/{id}/admin-notes`
async fn annotate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<NoteBody>,
) -> Result<Json<events::Model>, ApiError> {
    let model = state
        .events()
        .annotate(id, &auth.actor(), &payload.note)
        .await?;
    Ok(Json(model))
}
