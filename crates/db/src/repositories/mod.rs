//! Repository abstractions for data access.
//!
//! Repositories load an entity, ask the core workflow to validate the
//! requested transition, and commit the outcome with compare-and-swap on
//! `(id, status, version)`. A lost race surfaces as `StateConflict`.
//! Committed changes are announced on the [`EventPublisher`] afterwards.
//!
//! [`EventPublisher`]: tulay_core::workflow::EventPublisher

pub mod event;
pub mod report;
pub mod submission;

pub use event::{CreateEventInput, EventRepository};
pub use report::{CreateReportInput, ReportRepository, UpdateFinancialsInput};
pub use submission::{CreateSubmissionInput, SubmissionRepository};

use sea_orm::DbErr;
use tracing::warn;
use uuid::Uuid;

use tulay_core::workflow::{EntityKind, Transition, WorkflowError};

/// Map a database error into the workflow error space.
pub(crate) fn db_err(err: DbErr) -> WorkflowError {
    WorkflowError::Database(err.to_string())
}

/// Parse a stored status column back into its enum.
pub(crate) fn parse_stored<T>(
    kind: EntityKind,
    value: &str,
    parse: fn(&str) -> Option<T>,
) -> Result<T, WorkflowError> {
    parse(value).ok_or_else(|| WorkflowError::CorruptState {
        kind,
        value: value.to_string(),
    })
}

/// Log a refused request at warn with its classification.
pub(crate) fn log_refused(kind: EntityKind, id: Uuid, transition: Transition, err: &WorkflowError) {
    warn!(
        entity_kind = %kind,
        entity_id = %id,
        %transition,
        error_kind = err.kind().as_str(),
        error = %err,
        "transition refused"
    );
}

/// Validate a required, non-blank text field.
pub(crate) fn required_text(field: &str, value: &str) -> Result<String, WorkflowError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(WorkflowError::Validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}
