//! Multi-actor approval workflow for partnership submissions, events and
//! reports.
//!
//! # Modules
//!
//! - `types` - Status enums, transitions, actors and requests
//! - `error` - Workflow error taxonomy
//! - `permissions` - Role-permission matrix
//! - `engine` - Generic graph executor
//! - `submission` - Submission graph, re-apply and expiry scheduling
//! - `event` - Event graph with the owning-submission guard
//! - `report` - Report graph and the two clearance sub-flows
//! - `notes` - Append-only admin notes
//! - `events` - Domain events published after commit

pub mod engine;
pub mod error;
pub mod event;
pub mod events;
pub mod notes;
pub mod permissions;
pub mod report;
pub mod submission;
pub mod types;

#[cfg(test)]
mod engine_props;
#[cfg(test)]
mod report_props;

pub use engine::{Edge, Guard, GuardFacts, Requirement, WorkflowEngine, WorkflowGraph, WorkflowState};
pub use error::{ErrorKind, WorkflowError};
pub use event::{EVENT_GRAPH, EventWorkflow};
pub use events::{DomainEvent, EventPublisher};
pub use notes::AdminNotes;
pub use permissions::{PermissionMatrix, Role};
pub use report::{
    Clearances, ClearanceStage, FINAL_CLEARANCE_GRAPH, FIRST_CLEARANCE_GRAPH, Financials,
    REPORT_GRAPH, ReportWorkflow,
};
pub use submission::{SUBMISSION_GRAPH, SubmissionWorkflow};
pub use types::{
    Actor, ClearanceStatus, DocumentRef, EntityKind, EventStatus, ReportStatus, Stage,
    SubmissionStatus, Transition, TransitionOutcome, TransitionPayload, TransitionRequest,
};
