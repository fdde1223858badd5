//! Workflow error types.
//!
//! Every failure carries enough detail for a log line, and maps onto the
//! public [`ErrorKind`] taxonomy returned to callers.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::workflow::types::{EntityKind, Transition};

/// Caller-facing failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// The requested edge does not exist from the current status.
    InvalidTransition,
    /// The role lacks permission for the transition.
    Forbidden,
    /// A prerequisite sub-flow has not completed yet.
    OrderingViolation,
    /// Lost a race against a concurrent write; safe to retry once.
    StateConflict,
    /// Required payload missing or malformed.
    ValidationError,
    /// The entity does not exist.
    NotFound,
    /// Storage or other infrastructure failure.
    Internal,
}

impl ErrorKind {
    /// Returns the string representation used in the `kind` field.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidTransition => "InvalidTransition",
            Self::Forbidden => "Forbidden",
            Self::OrderingViolation => "OrderingViolation",
            Self::StateConflict => "StateConflict",
            Self::ValidationError => "ValidationError",
            Self::NotFound => "NotFound",
            Self::Internal => "Internal",
        }
    }

    /// Returns the HTTP status code for this kind.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidTransition | Self::ValidationError => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::StateConflict => 409,
            Self::OrderingViolation => 422,
            Self::Internal => 500,
        }
    }
}

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The requested edge is not in the graph for the current status.
    #[error("Cannot {transition} a {kind} in status {from}")]
    InvalidTransition {
        /// Entity kind.
        kind: EntityKind,
        /// Current status.
        from: String,
        /// Requested transition.
        transition: Transition,
    },

    /// The role lacks permission for the transition.
    #[error("Role '{role}' may not {transition} a {kind}")]
    Forbidden {
        /// The acting role slug.
        role: String,
        /// Entity kind.
        kind: EntityKind,
        /// Requested transition.
        transition: Transition,
    },

    /// A prerequisite sub-flow is incomplete.
    #[error("Cannot {transition} a {kind} before {prerequisite}")]
    OrderingViolation {
        /// Entity kind.
        kind: EntityKind,
        /// Requested transition.
        transition: Transition,
        /// What has to happen first.
        prerequisite: &'static str,
    },

    /// The owning submission is not approved.
    #[error("Owning submission is {status}; events require an APPROVED submission")]
    SubmissionNotApproved {
        /// The submission's committed status.
        status: String,
    },

    /// Clearance requested on a report that is not approved.
    #[error("Report is {status}; clearance requires an APPROVED report")]
    ReportNotApproved {
        /// The report's current status.
        status: String,
    },

    /// Report requested for an event that has not been held.
    #[error("Event is {status}; a report requires a COMPLETED event")]
    EventNotCompleted {
        /// The event's current status.
        status: String,
    },

    /// Report fields are frozen.
    #[error("Report is locked for editing (status {status})")]
    ReportLocked {
        /// The report's current status.
        status: String,
    },

    /// Re-apply requested from a submission that was not rejected.
    #[error("Only a REJECTED submission can be re-applied (currently {status})")]
    NotRejected {
        /// The source submission's status.
        status: String,
    },

    /// Compare-and-swap lost against a concurrent write.
    #[error("{kind} {id} was modified concurrently; re-read and retry")]
    StateConflict {
        /// Entity kind.
        kind: EntityKind,
        /// Entity id.
        id: Uuid,
    },

    /// A report already exists for the event.
    #[error("A report already exists for event {0}")]
    ReportAlreadyExists(Uuid),

    /// Rejection reason is required but not provided.
    #[error("Rejection reason is required")]
    RejectionReasonRequired,

    /// Completing an event requires a success flag.
    #[error("Success flag is required to complete an event")]
    SuccessFlagRequired,

    /// Renewal requires an expiry date after today.
    #[error("A future agreement expiry date is required")]
    ExpiryDateRequired,

    /// Other payload validation failure.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Entity kind.
        kind: EntityKind,
        /// Entity id.
        id: Uuid,
    },

    /// A stored value could not be read back as a known status.
    #[error("Unrecognized stored value '{value}' on {kind}")]
    CorruptState {
        /// Entity kind.
        kind: EntityKind,
        /// The offending value.
        value: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl WorkflowError {
    /// Returns the caller-facing classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTransition { .. }
            | Self::SubmissionNotApproved { .. }
            | Self::ReportNotApproved { .. }
            | Self::EventNotCompleted { .. }
            | Self::ReportLocked { .. }
            | Self::NotRejected { .. } => ErrorKind::InvalidTransition,

            Self::Forbidden { .. } => ErrorKind::Forbidden,

            Self::OrderingViolation { .. } => ErrorKind::OrderingViolation,

            Self::StateConflict { .. } | Self::ReportAlreadyExists(_) => ErrorKind::StateConflict,

            Self::RejectionReasonRequired
            | Self::SuccessFlagRequired
            | Self::ExpiryDateRequired
            | Self::Validation(_) => ErrorKind::ValidationError,

            Self::NotFound { .. } => ErrorKind::NotFound,

            Self::CorruptState { .. } | Self::Database(_) => ErrorKind::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::OrderingViolation { .. } => "ORDERING_VIOLATION",
            Self::SubmissionNotApproved { .. } => "SUBMISSION_NOT_APPROVED",
            Self::ReportNotApproved { .. } => "REPORT_NOT_APPROVED",
            Self::EventNotCompleted { .. } => "EVENT_NOT_COMPLETED",
            Self::ReportLocked { .. } => "REPORT_LOCKED",
            Self::NotRejected { .. } => "NOT_REJECTED",
            Self::StateConflict { .. } => "STATE_CONFLICT",
            Self::ReportAlreadyExists(_) => "REPORT_ALREADY_EXISTS",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
            Self::SuccessFlagRequired => "SUCCESS_FLAG_REQUIRED",
            Self::ExpiryDateRequired => "EXPIRY_DATE_REQUIRED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::CorruptState { .. } => "CORRUPT_STATE",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}
