//! Permission introspection.
//!
//! Clients render their action buttons from this response, so the UI
//! offers exactly what the server will accept.

use std::collections::BTreeMap;

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::{AppState, middleware::AuthUser};
use tulay_core::workflow::{EntityKind, PermissionMatrix, Transition};

/// Allowed transitions per entity kind for the caller's role.
#[derive(Debug, Serialize)]
pub struct PermissionsResponse {
    /// The caller's role slug.
    pub role: String,
    /// Transitions keyed by entity kind.
    pub permissions: BTreeMap<&'static str, Vec<Transition>>,
}

/// GET `/permissions` - Caller's allowed transitions.
async fn get_permissions(auth: AuthUser) -> Json<PermissionsResponse> {
    let role = auth.role().to_string();
    let permissions = EntityKind::ALL
        .iter()
        .map(|kind| {
            let allowed = PermissionMatrix::allowed_transitions(&role, *kind);
            (kind.as_str(), allowed.into_iter().collect::<Vec<_>>())
        })
        .collect();

    Json(PermissionsResponse { role, permissions })
}

/// Creates the permissions routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/permissions", get(get_permissions))
}
