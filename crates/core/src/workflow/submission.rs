//! Partnership submission workflow.

use chrono::NaiveDate;

use crate::workflow::engine::{Edge, GuardFacts, Requirement, WorkflowEngine, WorkflowGraph};
use crate::workflow::error::WorkflowError;
use crate::workflow::permissions::PermissionMatrix;
use crate::workflow::types::{
    Actor, EntityKind, SubmissionStatus, Transition, TransitionOutcome, TransitionRequest,
};

use SubmissionStatus::{Approved, Pending, PreApproved, Rejected, Renew, UnderReview};

/// Submission status graph.
pub const SUBMISSION_GRAPH: WorkflowGraph<SubmissionStatus> = WorkflowGraph {
    kind: EntityKind::Submission,
    edges: &[
        Edge {
            from: Pending,
            transition: Transition::PreApprove,
            to: PreApproved,
            guards: &[],
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
            from: PreApproved,
            transition: Transition::Approve,
            to: Approved,
            guards: &[],
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
            from: Approved,
            transition: Transition::MarkUnderReview,
            to: UnderReview,
            guards: &[],
            requires: &[],
        },
        Edge {
            from: Approved,
            transition: Transition::MarkForRenewal,
            to: Renew,
            guards: &[],
            requires: &[],
        },
        Edge {
            from: UnderReview,
            transition: Transition::MarkForRenewal,
            to: Renew,
            guards: &[],
            requires: &[],
        },
        Edge {
            from: UnderReview,
            transition: Transition::Renew,
            to: Approved,
            guards: &[],
            requires: &[Requirement::FutureExpiry],
        },
        Edge {
            from: Renew,
            transition: Transition::Renew,
            to: Approved,
            guards: &[],
            requires: &[Requirement::FutureExpiry],
        },
    ],
};

/// Stateless service for submission transitions.
pub struct SubmissionWorkflow;

impl SubmissionWorkflow {
    /// Validate a transition on a submission.
    pub fn apply(
        current: SubmissionStatus,
        request: &TransitionRequest,
    ) -> Result<TransitionOutcome<SubmissionStatus>, WorkflowError> {
        WorkflowEngine::apply(&SUBMISSION_GRAPH, current, request, &GuardFacts::default())
    }

    /// Validate a re-application from a prior submission.
    ///
    /// The prior record is never mutated; the caller creates a new PENDING
    /// submission linked to it.
    ///
    /// # Returns
    /// * `Ok(())` if the prior submission is REJECTED and the role may re-apply
    /// * `Err(WorkflowError::NotRejected)` otherwise
    /// * `Err(WorkflowError::Forbidden)` if the role lacks the permission
    pub fn reapply(prior: SubmissionStatus, actor: &Actor) -> Result<(), WorkflowError> {
        if prior != Rejected {
            return Err(WorkflowError::NotRejected {
                status: prior.as_str().to_string(),
            });
        }
        PermissionMatrix::authorize(&actor.role, EntityKind::Submission, Transition::Reapply)
    }

    /// Decide which scheduler transition, if any, applies to a submission.
    ///
    /// # Arguments
    /// * `status` - Current status
    /// * `expires_on` - Agreement expiry date, if recorded
    /// * `today` - The scheduler's notion of today
    /// * `review_window_days` - How far ahead of expiry a review starts
    #[must_use]
    pub fn expiry_transition(
        status: SubmissionStatus,
        expires_on: Option<NaiveDate>,
        today: NaiveDate,
        review_window_days: u32,
    ) -> Option<Transition> {
        let expires_on = expires_on?;
        let expired = expires_on <= today;
        let in_window = today + chrono::Days::new(u64::from(review_window_days)) >= expires_on;

        match status {
            Approved if expired => Some(Transition::MarkForRenewal),
            Approved if in_window => Some(Transition::MarkUnderReview),
            UnderReview if expired => Some(Transition::MarkForRenewal),
            _ => None,
        }
    }
}
