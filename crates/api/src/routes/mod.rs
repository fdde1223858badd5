//! API route definitions.

use axum::{Router, body::Bytes, middleware};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{ApiError, AppState, middleware::auth::auth_middleware};
use tulay_core::workflow::{Actor, Transition, TransitionRequest};

pub mod agreements;
pub mod events;
pub mod health;
pub mod permissions;
pub mod reports;
pub mod submissions;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(permissions::routes())
        .merge(submissions::routes())
        .merge(events::routes())
        .merge(reports::routes())
        .merge(agreements::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}

// ============================================================================
// Shared request bodies
// ============================================================================

/// Body accepted by the generic transition endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct TransitionBody {
    /// Note appended to the entity's admin notes.
    pub admin_notes: Option<String>,
    /// Mandatory on reject.
    pub rejection_reason: Option<String>,
    /// Mandatory on event completion.
    pub success: Option<bool>,
}

/// Body for `POST /{kind}/{id}/admin-notes`.
#[derive(Debug, Deserialize)]
pub struct NoteBody {
    /// The note to append.
    pub note: String,
}

impl TransitionBody {
    /// Builds the request the workflow engine validates.
    pub(crate) fn into_request(self, transition: Transition, actor: Actor) -> TransitionRequest {
        let mut request = TransitionRequest::new(transition, actor);
        request.payload.admin_notes = self.admin_notes;
        request.payload.rejection_reason = self.rejection_reason;
        request.payload.success = self.success;
        request
    }
}

/// Parses an optional JSON body; an empty body yields the default.
pub(crate) fn optional_json<T>(body: &Bytes) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::validation(format!("invalid body: {e}")))
}
