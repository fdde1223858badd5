//! Event workflow.
//!
//! Events mirror the submission's early review stages, then run
//! APPROVED → COMPLETED → CLEARED. Pre-approval and approval are blocked
//! unless the owning submission is APPROVED.

use crate::workflow::engine::{
    Edge, Guard, GuardFacts, Requirement, WorkflowEngine, WorkflowGraph,
};
use crate::workflow::error::WorkflowError;
use crate::workflow::types::{
    Actor, ClearanceStatus, EntityKind, EventStatus, SubmissionStatus, Transition,
    TransitionOutcome, TransitionRequest,
};

use EventStatus::{Approved, Cancelled, Cleared, Completed, Pending, PreApproved, Rejected};

/// Event status graph.
pub const EVENT_GRAPH: WorkflowGraph<EventStatus> = WorkflowGraph {
    kind: EntityKind::Event,
    edges: &[
        Edge {
            from: Pending,
            transition: Transition::PreApprove,
            to: PreApproved,
            guards: &[Guard::OwnerSubmissionApproved],
            requires: &[],
        },
        Edge {
            from: Pending,
            transition: Transition::Reject,
            to: Rejected,
            guards: &[],
            requires: &[Requirement::Reason],
        },
        Edge {
            from: Pending,
            transition: Transition::Cancel,
            to: Cancelled,
            guards: &[],
            requires: &[],
        },
        Edge {
            from: PreApproved,
            transition: Transition::Approve,
            to: Approved,
            guards: &[Guard::OwnerSubmissionApproved],
            requires: &[],
        },
        Edge {
            from: PreApproved,
            transition: Transition::Reject,
            to: Rejected,
            guards: &[],
            requires: &[Requirement::Reason],
        },
        Edge {
            from: PreApproved,
            transition: Transition::Cancel,
            to: Cancelled,
            guards: &[],
            requires: &[],
        },
        Edge {
            from: Approved,
            transition: Transition::Complete,
            to: Completed,
            guards: &[],
            requires: &[Requirement::SuccessFlag],
        },
        Edge {
            from: Approved,
            transition: Transition::Cancel,
            to: Cancelled,
            guards: &[],
            requires: &[],
        },
        Edge {
            from: Completed,
            transition: Transition::Clear,
            to: Cleared,
            guards: &[Guard::LinkedReportFinalCleared],
            requires: &[],
        },
    ],
};

/// Stateless service for event transitions.
pub struct EventWorkflow;

impl EventWorkflow {
    /// Validate a transition on an event.
    ///
    /// # Arguments
    /// * `current` - The event's current status
    /// * `owner` - Committed status of the owning submission
    /// * `request` - The transition request
    pub fn apply(
        current: EventStatus,
        owner: SubmissionStatus,
        request: &TransitionRequest,
    ) -> Result<TransitionOutcome<EventStatus>, WorkflowError> {
        let facts = GuardFacts {
            owner_submission: Some(owner),
            ..GuardFacts::default()
        };
        WorkflowEngine::apply(&EVENT_GRAPH, current, request, &facts)
    }

    /// Validate closing out a completed event after its report's final clearance.
    pub fn clear(
        current: EventStatus,
        report_final_clearance: ClearanceStatus,
        actor: &Actor,
    ) -> Result<TransitionOutcome<EventStatus>, WorkflowError> {
        let facts = GuardFacts {
            final_clearance: Some(report_final_clearance),
            ..GuardFacts::default()
        };
        let request = TransitionRequest::new(Transition::Clear, actor.clone());
        WorkflowEngine::apply(&EVENT_GRAPH, current, &request, &facts)
    }

    /// Returns true if committing this outcome must feed the tier calculator.
    ///
    /// Only a completion with success = true counts.
    #[must_use]
    pub fn counts_toward_tier(outcome: &TransitionOutcome<EventStatus>) -> bool {
        outcome.transition == Transition::Complete && outcome.success == Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn request(transition: Transition, role: &str) -> TransitionRequest {
        TransitionRequest::new(transition, Actor::new(Uuid::new_v4(), role))
    }

    #[test]
    fn test_pre_approve_requires_approved_submission() {
        let req = request(Transition::PreApprove, "community-lead");
        for owner in [
            SubmissionStatus::Pending,
            SubmissionStatus::PreApproved,
            SubmissionStatus::Rejected,
            SubmissionStatus::UnderReview,
            SubmissionStatus::Renew,
        ] {
            assert!(matches!(
                EventWorkflow::apply(Pending, owner, &req),
                Err(WorkflowError::SubmissionNotApproved { .. })
            ));
        }
        let outcome = EventWorkflow::apply(Pending, SubmissionStatus::Approved, &req).unwrap();
        assert_eq!(outcome.to, PreApproved);
    }

    #[test]
    fn test_approve_requires_approved_submission() {
        let req = request(Transition::Approve, "super-admin");
        assert!(matches!(
            EventWorkflow::apply(PreApproved, SubmissionStatus::Renew, &req),
            Err(WorkflowError::SubmissionNotApproved { ref status }) if status == "RENEW"
        ));
        let outcome = EventWorkflow::apply(PreApproved, SubmissionStatus::Approved, &req).unwrap();
        assert_eq!(outcome.to, Approved);
    }

    #[test]
    fn test_complete_requires_success_flag() {
        let req = request(Transition::Complete, "community-lead");
        assert!(matches!(
            EventWorkflow::apply(Approved, SubmissionStatus::Approved, &req),
            Err(WorkflowError::SuccessFlagRequired)
        ));

        let outcome = EventWorkflow::apply(
            Approved,
            SubmissionStatus::Approved,
            &req.clone().with_success(false),
        )
        .unwrap();
        assert_eq!(outcome.to, Completed);
        assert_eq!(outcome.success, Some(false));
        assert!(!EventWorkflow::counts_toward_tier(&outcome));

        let outcome =
            EventWorkflow::apply(Approved, SubmissionStatus::Approved, &req.with_success(true))
                .unwrap();
        assert!(EventWorkflow::counts_toward_tier(&outcome));
    }

    #[test]
    fn test_complete_twice_is_invalid() {
        let req = request(Transition::Complete, "super-admin").with_success(true);
        assert!(matches!(
            EventWorkflow::apply(Completed, SubmissionStatus::Approved, &req),
            Err(WorkflowError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_cancel_never_counts_toward_tier() {
        let req = request(Transition::Cancel, "super-admin").with_success(true);
        let outcome = EventWorkflow::apply(Approved, SubmissionStatus::Approved, &req).unwrap();
        assert_eq!(outcome.to, Cancelled);
        assert!(outcome.success.is_none());
        assert!(!EventWorkflow::counts_toward_tier(&outcome));
    }

    #[test]
    fn test_clear_requires_final_clearance() {
        let actor = Actor::new(Uuid::new_v4(), "super-admin-b");
        assert!(matches!(
            EventWorkflow::clear(Completed, ClearanceStatus::Pending, &actor),
            Err(WorkflowError::OrderingViolation { .. })
        ));
        let outcome = EventWorkflow::clear(Completed, ClearanceStatus::Cleared, &actor).unwrap();
        assert_eq!(outcome.to, Cleared);

        let outcome =
            EventWorkflow::clear(Completed, ClearanceStatus::Cleared, &Actor::system()).unwrap();
        assert_eq!(outcome.to, Cleared);
    }

    #[test]
    fn test_clear_forbidden_for_super_admin() {
        let actor = Actor::new(Uuid::new_v4(), "super-admin");
        assert!(matches!(
            EventWorkflow::clear(Completed, ClearanceStatus::Cleared, &actor),
            Err(WorkflowError::Forbidden { .. })
        ));
    }
}
