//! Generic workflow engine.
//!
//! Each entity's lifecycle is declared as a [`WorkflowGraph`]: a static list
//! of edges, each with guard predicates and payload requirements. The engine
//! validates a request against a graph and returns a [`TransitionOutcome`]
//! that the persistence layer commits with compare-and-swap.
//!
//! Checks run in a fixed order, and the first failure wins:
//! 1. the edge exists from the current status (`InvalidTransition`)
//! 2. the edge's guards hold (`OrderingViolation` or a cross-entity failure)
//! 3. the role holds the transition in the matrix (`Forbidden`)
//! 4. the payload carries what the edge requires (`ValidationError`)

use chrono::{DateTime, Utc};

use crate::workflow::error::WorkflowError;
use crate::workflow::permissions::PermissionMatrix;
use crate::workflow::types::{
    ClearanceStatus, EntityKind, ReportStatus, SubmissionStatus, Transition, TransitionOutcome,
    TransitionRequest,
};

/// Status type usable in a graph.
pub trait WorkflowState: Copy + Eq + std::fmt::Debug + 'static {
    /// Wire and storage representation.
    fn as_str(&self) -> &'static str;
}

impl WorkflowState for SubmissionStatus {
    fn as_str(&self) -> &'static str {
        SubmissionStatus::as_str(self)
    }
}

impl WorkflowState for crate::workflow::types::EventStatus {
    fn as_str(&self) -> &'static str {
        crate::workflow::types::EventStatus::as_str(self)
    }
}

impl WorkflowState for ReportStatus {
    fn as_str(&self) -> &'static str {
        ReportStatus::as_str(self)
    }
}

impl WorkflowState for ClearanceStatus {
    fn as_str(&self) -> &'static str {
        ClearanceStatus::as_str(self)
    }
}

/// Predicate over facts outside the entity's own status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// The owning submission's committed status is APPROVED.
    OwnerSubmissionApproved,
    /// The report's primary status is APPROVED.
    ReportApproved,
    /// The report's first clearance is CLEARED.
    FirstClearanceCleared,
    /// The linked report's final clearance is CLEARED.
    LinkedReportFinalCleared,
}

/// Payload an edge cannot be taken without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Non-blank rejection reason.
    Reason,
    /// Event success flag, true or false.
    SuccessFlag,
    /// Agreement expiry date strictly after the transition date.
    FutureExpiry,
}

/// Facts a guard may consult. Missing facts fail closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuardFacts {
    /// Status of the submission owning an event.
    pub owner_submission: Option<SubmissionStatus>,
    /// Primary status of the report.
    pub report_status: Option<ReportStatus>,
    /// First clearance of the report.
    pub first_clearance: Option<ClearanceStatus>,
    /// Final clearance of the report linked to an event.
    pub final_clearance: Option<ClearanceStatus>,
}

impl GuardFacts {
    fn check(&self, guard: Guard, kind: EntityKind, transition: Transition) -> Result<(), WorkflowError> {
        match guard {
            Guard::OwnerSubmissionApproved => match self.owner_submission {
                Some(SubmissionStatus::Approved) => Ok(()),
                other => Err(WorkflowError::SubmissionNotApproved {
                    status: other.map_or("UNKNOWN", |s| s.as_str()).to_string(),
                }),
            },
            Guard::ReportApproved => match self.report_status {
                Some(ReportStatus::Approved) => Ok(()),
                other => Err(WorkflowError::ReportNotApproved {
                    status: other.map_or("UNKNOWN", |s| s.as_str()).to_string(),
                }),
            },
            Guard::FirstClearanceCleared => match self.first_clearance {
                Some(ClearanceStatus::Cleared) => Ok(()),
                _ => Err(WorkflowError::OrderingViolation {
                    kind,
                    transition,
                    prerequisite: "first clearance",
                }),
            },
            Guard::LinkedReportFinalCleared => match self.final_clearance {
                Some(ClearanceStatus::Cleared) => Ok(()),
                _ => Err(WorkflowError::OrderingViolation {
                    kind,
                    transition,
                    prerequisite: "final clearance of its report",
                }),
            },
        }
    }
}

/// One edge of a status graph.
#[derive(Debug, Clone, Copy)]
pub struct Edge<S: 'static> {
    /// Source status.
    pub from: S,
    /// Transition name.
    pub transition: Transition,
    /// Target status.
    pub to: S,
    /// Guards evaluated in order.
    pub guards: &'static [Guard],
    /// Payload requirements.
    pub requires: &'static [Requirement],
}

/// A declared status graph for one entity kind.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowGraph<S: 'static> {
    /// Entity kind, used for permission lookups and errors.
    pub kind: EntityKind,
    /// All edges.
    pub edges: &'static [Edge<S>],
}

impl<S: WorkflowState> WorkflowGraph<S> {
    /// Finds the edge for a transition out of a status.
    #[must_use]
    pub fn edge(&self, from: S, transition: Transition) -> Option<&'static Edge<S>> {
        self.edges
            .iter()
            .find(|e| e.from == from && e.transition == transition)
    }

    /// Transitions leaving a status.
    pub fn outgoing(&self, from: S) -> impl Iterator<Item = Transition> + '_ {
        self.edges
            .iter()
            .filter(move |e| e.from == from)
            .map(|e| e.transition)
    }

    /// Check if a status transition is valid.
    #[must_use]
    pub fn is_valid_transition(&self, from: S, to: S) -> bool {
        self.edges.iter().any(|e| e.from == from && e.to == to)
    }
}

/// Stateless executor for declared graphs.
pub struct WorkflowEngine;

impl WorkflowEngine {
    /// Validate a transition request against a graph, stamped with the current time.
    ///
    /// # Arguments
    /// * `graph` - The entity's declared graph
    /// * `current` - The entity's current status
    /// * `request` - Requested transition, actor and payload
    /// * `facts` - Facts consulted by the edge's guards
    ///
    /// # Returns
    /// The outcome to commit, or the first failed check.
    pub fn apply<S: WorkflowState>(
        graph: &WorkflowGraph<S>,
        current: S,
        request: &TransitionRequest,
        facts: &GuardFacts,
    ) -> Result<TransitionOutcome<S>, WorkflowError> {
        Self::apply_at(graph, current, request, facts, Utc::now())
    }

    /// Same as [`WorkflowEngine::apply`] with an explicit timestamp.
    pub fn apply_at<S: WorkflowState>(
        graph: &WorkflowGraph<S>,
        current: S,
        request: &TransitionRequest,
        facts: &GuardFacts,
        at: DateTime<Utc>,
    ) -> Result<TransitionOutcome<S>, WorkflowError> {
        let transition = request.transition;

        let edge = graph
            .edge(current, transition)
            .ok_or_else(|| WorkflowError::InvalidTransition {
                kind: graph.kind,
                from: current.as_str().to_string(),
                transition,
            })?;

        for guard in edge.guards {
            facts.check(*guard, graph.kind, transition)?;
        }

        PermissionMatrix::authorize(&request.actor.role, graph.kind, transition)?;

        let payload = &request.payload;
        let rejection_reason = trimmed(payload.rejection_reason.as_deref());
        for requirement in edge.requires {
            match requirement {
                Requirement::Reason if rejection_reason.is_none() => {
                    return Err(WorkflowError::RejectionReasonRequired);
                }
                Requirement::SuccessFlag if payload.success.is_none() => {
                    return Err(WorkflowError::SuccessFlagRequired);
                }
                Requirement::FutureExpiry
                    if payload
                        .agreement_expires_on
                        .is_none_or(|d| d <= at.date_naive()) =>
                {
                    return Err(WorkflowError::ExpiryDateRequired);
                }
                _ => {}
            }
        }

        let requires = |r: Requirement| edge.requires.contains(&r);

        Ok(TransitionOutcome {
            from: current,
            to: edge.to,
            transition,
            actor: request.actor.clone(),
            at,
            rejection_reason: if requires(Requirement::Reason) {
                rejection_reason
            } else {
                None
            },
            admin_notes: trimmed(payload.admin_notes.as_deref()),
            success: if requires(Requirement::SuccessFlag) {
                payload.success
            } else {
                None
            },
            agreement_expires_on: if requires(Requirement::FutureExpiry) {
                payload.agreement_expires_on
            } else {
                None
            },
        })
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}
