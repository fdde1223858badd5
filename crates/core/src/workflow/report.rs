//! Report workflow with its two clearance sub-flows.
//!
//! The primary status runs DRAFT → SUBMITTED → PRE_APPROVED → REVIEWED →
//! APPROVED. Once APPROVED, first clearance and then final clearance are
//! granted as separate sub-flows, each with its own actor and timestamp.
//! Final clearance before first clearance is an ordering violation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::workflow::engine::{
    Edge, Guard, GuardFacts, Requirement, WorkflowEngine, WorkflowGraph,
};
use crate::workflow::error::WorkflowError;
use crate::workflow::permissions::PermissionMatrix;
use crate::workflow::types::{
    Actor, ClearanceStatus, EntityKind, ReportStatus, Transition, TransitionOutcome,
    TransitionRequest,
};

use ReportStatus::{Approved, Draft, PreApproved, Reviewed, Submitted};

/// Report primary status graph.
///
/// `reject` returns a report under review to DRAFT with a reason.
pub const REPORT_GRAPH: WorkflowGraph<ReportStatus> = WorkflowGraph {
    kind: EntityKind::Report,
    edges: &[
        Edge {
            from: Draft,
            transition: Transition::Submit,
            to: Submitted,
            guards: &[],
            requires: &[],
        },
        Edge {
            from: Submitted,
            transition: Transition::PreApprove,
            to: PreApproved,
            guards: &[],
            requires: &[],
        },
        Edge {
            from: PreApproved,
            transition: Transition::Review,
            to: Reviewed,
            guards: &[],
            requires: &[],
        },
        Edge {
            from: Reviewed,
            transition: Transition::Approve,
            to: Approved,
            guards: &[],
            requires: &[],
        },
        Edge {
            from: Submitted,
            transition: Transition::Reject,
            to: Draft,
            guards: &[],
            requires: &[Requirement::Reason],
        },
        Edge {
            from: PreApproved,
            transition: Transition::Reject,
            to: Draft,
            guards: &[],
            requires: &[Requirement::Reason],
        },
        Edge {
            from: Reviewed,
            transition: Transition::Reject,
            to: Draft,
            guards: &[],
            requires: &[Requirement::Reason],
        },
    ],
};

/// First clearance sub-flow.
pub const FIRST_CLEARANCE_GRAPH: WorkflowGraph<ClearanceStatus> = WorkflowGraph {
    kind: EntityKind::Report,
    edges: &[Edge {
        from: ClearanceStatus::Pending,
        transition: Transition::FirstClearance,
        to: ClearanceStatus::Cleared,
        guards: &[Guard::ReportApproved],
        requires: &[],
    }],
};

/// Final clearance sub-flow.
///
/// The first-clearance guard runs before the primary-status guard, so a
/// final clearance requested while first clearance is pending is always an
/// ordering violation.
pub const FINAL_CLEARANCE_GRAPH: WorkflowGraph<ClearanceStatus> = WorkflowGraph {
    kind: EntityKind::Report,
    edges: &[Edge {
        from: ClearanceStatus::Pending,
        transition: Transition::FinalClearance,
        to: ClearanceStatus::Cleared,
        guards: &[Guard::FirstClearanceCleared, Guard::ReportApproved],
        requires: &[],
    }],
};

/// Which clearance sub-flow a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClearanceStage {
    /// First pass.
    First,
    /// Final pass.
    Final,
}

impl ClearanceStage {
    /// The transition name for this stage.
    #[must_use]
    pub const fn transition(&self) -> Transition {
        match self {
            Self::First => Transition::FirstClearance,
            Self::Final => Transition::FinalClearance,
        }
    }

    /// Prefix used when a clearance is published, e.g. `FIRST_CLEARANCE`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::First => "FIRST_CLEARANCE",
            Self::Final => "FINAL_CLEARANCE",
        }
    }

    const fn graph(self) -> &'static WorkflowGraph<ClearanceStatus> {
        match self {
            Self::First => &FIRST_CLEARANCE_GRAPH,
            Self::Final => &FINAL_CLEARANCE_GRAPH,
        }
    }
}

/// Both clearance fields of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clearances {
    /// First clearance.
    pub first: ClearanceStatus,
    /// Final clearance.
    pub final_: ClearanceStatus,
}

impl Clearances {
    /// Both pending.
    pub const PENDING: Self = Self {
        first: ClearanceStatus::Pending,
        final_: ClearanceStatus::Pending,
    };

    /// Returns true if either clearance has been granted.
    #[must_use]
    pub fn any_cleared(&self) -> bool {
        self.first == ClearanceStatus::Cleared || self.final_ == ClearanceStatus::Cleared
    }

    /// Final cleared implies first cleared.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.final_ == ClearanceStatus::Pending || self.first == ClearanceStatus::Cleared
    }

    fn get(&self, stage: ClearanceStage) -> ClearanceStatus {
        match stage {
            ClearanceStage::First => self.first,
            ClearanceStage::Final => self.final_,
        }
    }
}

/// Report financial fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Financials {
    /// Cash allocated to the event.
    pub cash_allocation: Decimal,
    /// In-kind expenditure.
    pub in_kind_expenditure: Decimal,
}

impl Financials {
    /// 10^12: largest magnitude a `numeric(14, 2)` column holds, exclusive.
    pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

    /// Decimal places stored per amount.
    pub const SCALE: u32 = 2;

    /// Validate the amounts.
    ///
    /// # Returns
    /// * `Err(WorkflowError::Validation)` if any amount is negative, has more
    ///   than two decimal places, or does not fit the stored precision
    pub fn validate(&self) -> Result<(), WorkflowError> {
        Self::check_amount("cash_allocation", self.cash_allocation)?;
        Self::check_amount("in_kind_expenditure", self.in_kind_expenditure)
    }

    fn check_amount(field: &str, amount: Decimal) -> Result<(), WorkflowError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(WorkflowError::Validation(format!(
                "{field} must not be negative"
            )));
        }
        if amount.normalize().scale() > Self::SCALE {
            return Err(WorkflowError::Validation(format!(
                "{field} must have at most {} decimal places",
                Self::SCALE
            )));
        }
        if amount.abs() >= Self::MAX_AMOUNT {
            return Err(WorkflowError::Validation(format!(
                "{field} must be less than {}",
                Self::MAX_AMOUNT
            )));
        }
        Ok(())
    }

    /// Total cost (cash + in-kind).
    #[must_use]
    pub fn total_cost(&self) -> Decimal {
        self.cash_allocation + self.in_kind_expenditure
    }
}

/// Stateless service for report transitions.
pub struct ReportWorkflow;

impl ReportWorkflow {
    /// Validate a primary-status transition.
    pub fn apply(
        current: ReportStatus,
        request: &TransitionRequest,
    ) -> Result<TransitionOutcome<ReportStatus>, WorkflowError> {
        WorkflowEngine::apply(&REPORT_GRAPH, current, request, &GuardFacts::default())
    }

    /// Validate a clearance on one sub-flow.
    ///
    /// # Arguments
    /// * `status` - The report's primary status
    /// * `clearances` - Current clearance fields
    /// * `stage` - Which sub-flow to advance
    /// * `actor` - Who is asking
    pub fn clear(
        status: ReportStatus,
        clearances: Clearances,
        stage: ClearanceStage,
        actor: &Actor,
    ) -> Result<TransitionOutcome<ClearanceStatus>, WorkflowError> {
        let facts = GuardFacts {
            report_status: Some(status),
            first_clearance: Some(clearances.first),
            final_clearance: Some(clearances.final_),
            ..GuardFacts::default()
        };
        let request = TransitionRequest::new(stage.transition(), actor.clone());
        WorkflowEngine::apply(stage.graph(), clearances.get(stage), &request, &facts)
    }

    /// Returns true if financial fields and the report file may change.
    #[must_use]
    pub fn is_editable(status: ReportStatus, clearances: Clearances) -> bool {
        status == Draft && !clearances.any_cleared()
    }

    /// Validate an edit of financial fields or the report file.
    ///
    /// State is checked before role, matching the engine.
    ///
    /// # Returns
    /// * `Err(WorkflowError::ReportLocked)` if the report is not editable
    /// * `Err(WorkflowError::Forbidden)` if the role may not edit
    pub fn ensure_editable(
        status: ReportStatus,
        clearances: Clearances,
        actor: &Actor,
    ) -> Result<(), WorkflowError> {
        if !Self::is_editable(status, clearances) {
            return Err(WorkflowError::ReportLocked {
                status: status.as_str().to_string(),
            });
        }
        PermissionMatrix::authorize(&actor.role, EntityKind::Report, Transition::EditFinancials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn actor(role: &str) -> Actor {
        Actor::new(Uuid::new_v4(), role)
    }

    fn first_cleared() -> Clearances {
        Clearances {
            first: ClearanceStatus::Cleared,
            final_: ClearanceStatus::Pending,
        }
    }

    #[test]
    fn test_primary_happy_path() {
        let steps = [
            (Draft, Transition::Submit, "area-admin", Submitted),
            (Submitted, Transition::PreApprove, "community-lead", PreApproved),
            (PreApproved, Transition::Review, "super-admin", Reviewed),
            (Reviewed, Transition::Approve, "super-admin-a", Approved),
        ];
        for (from, transition, role, to) in steps {
            let req = TransitionRequest::new(transition, actor(role));
            assert_eq!(ReportWorkflow::apply(from, &req).unwrap().to, to);
        }
    }

    #[test]
    fn test_area_admin_only_submits_from_draft() {
        let req = TransitionRequest::new(Transition::Submit, actor("area-admin"));
        assert!(matches!(
            ReportWorkflow::apply(Submitted, &req),
            Err(WorkflowError::InvalidTransition { .. })
        ));
        let req = TransitionRequest::new(Transition::Review, actor("area-admin"));
        assert!(matches!(
            ReportWorkflow::apply(PreApproved, &req),
            Err(WorkflowError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_reject_returns_to_draft() {
        let req = TransitionRequest::new(Transition::Reject, actor("community-lead"))
            .with_reason("receipts missing");
        let outcome = ReportWorkflow::apply(Submitted, &req).unwrap();
        assert_eq!(outcome.to, Draft);
        assert_eq!(outcome.rejection_reason.as_deref(), Some("receipts missing"));

        let req = TransitionRequest::new(Transition::Reject, actor("super-admin"));
        assert!(matches!(
            ReportWorkflow::apply(Reviewed, &req),
            Err(WorkflowError::RejectionReasonRequired)
        ));
    }

    #[test]
    fn test_first_clearance_requires_approved_report() {
        let result = ReportWorkflow::clear(
            Reviewed,
            Clearances::PENDING,
            ClearanceStage::First,
            &actor("super-admin"),
        );
        assert!(matches!(
            result,
            Err(WorkflowError::ReportNotApproved { .. })
        ));

        let outcome = ReportWorkflow::clear(
            Approved,
            Clearances::PENDING,
            ClearanceStage::First,
            &actor("super-admin-a"),
        )
        .unwrap();
        assert_eq!(outcome.to, ClearanceStatus::Cleared);
        assert_eq!(outcome.transition, Transition::FirstClearance);
    }

    #[test]
    fn test_first_clearance_forbidden_for_super_admin_b() {
        let result = ReportWorkflow::clear(
            Approved,
            Clearances::PENDING,
            ClearanceStage::First,
            &actor("super-admin-b"),
        );
        assert!(matches!(result, Err(WorkflowError::Forbidden { .. })));
    }

    #[test]
    fn test_final_clearance_after_first() {
        let outcome = ReportWorkflow::clear(
            Approved,
            first_cleared(),
            ClearanceStage::Final,
            &actor("super-admin-b"),
        )
        .unwrap();
        assert_eq!(outcome.to, ClearanceStatus::Cleared);
    }

    #[test]
    fn test_final_clearance_before_first_is_ordering_violation() {
        for role in ["super-admin-b", "super-admin", "area-admin", "nobody"] {
            let result = ReportWorkflow::clear(
                Approved,
                Clearances::PENDING,
                ClearanceStage::Final,
                &actor(role),
            );
            assert!(
                matches!(result, Err(WorkflowError::OrderingViolation { .. })),
                "role {role}"
            );
        }
    }

    #[test]
    fn test_final_clearance_only_super_admin_b() {
        let result = ReportWorkflow::clear(
            Approved,
            first_cleared(),
            ClearanceStage::Final,
            &actor("super-admin"),
        );
        assert!(matches!(result, Err(WorkflowError::Forbidden { .. })));
    }

    #[test]
    fn test_clearance_cannot_repeat() {
        let result = ReportWorkflow::clear(
            Approved,
            first_cleared(),
            ClearanceStage::First,
            &actor("super-admin"),
        );
        assert!(matches!(
            result,
            Err(WorkflowError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_editable_only_in_draft_without_clearance() {
        assert!(ReportWorkflow::is_editable(Draft, Clearances::PENDING));
        assert!(!ReportWorkflow::is_editable(Submitted, Clearances::PENDING));
        assert!(!ReportWorkflow::is_editable(Draft, first_cleared()));

        assert!(ReportWorkflow::ensure_editable(Draft, Clearances::PENDING, &actor("area-admin")).is_ok());
        assert!(matches!(
            ReportWorkflow::ensure_editable(Approved, Clearances::PENDING, &actor("area-admin")),
            Err(WorkflowError::ReportLocked { .. })
        ));
        assert!(matches!(
            ReportWorkflow::ensure_editable(Draft, Clearances::PENDING, &actor("community-lead")),
            Err(WorkflowError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_locked_report_reports_lock_before_role() {
        for role in ["community-lead", "nobody", "area-admin"] {
            assert!(
                matches!(
                    ReportWorkflow::ensure_editable(Submitted, Clearances::PENDING, &actor(role)),
                    Err(WorkflowError::ReportLocked { .. })
                ),
                "role {role}"
            );
        }
    }

    #[test]
    fn test_financials() {
        let fin = Financials {
            cash_allocation: dec!(1500.50),
            in_kind_expenditure: dec!(250.25),
        };
        assert!(fin.validate().is_ok());
        assert_eq!(fin.total_cost(), dec!(1750.75));

        let negative = Financials {
            cash_allocation: dec!(-1),
            in_kind_expenditure: dec!(0),
        };
        assert!(matches!(negative.validate(), Err(WorkflowError::Validation(_))));

        let zero = Financials {
            cash_allocation: Decimal::ZERO,
            in_kind_expenditure: Decimal::ZERO,
        };
        assert!(zero.validate().is_ok());
    }

    #[test]
    fn test_financials_scale_and_precision() {
        let trailing_zeros = Financials {
            cash_allocation: dec!(10.500),
            in_kind_expenditure: dec!(0.10),
        };
        assert!(trailing_zeros.validate().is_ok());

        let sub_cent = Financials {
            cash_allocation: dec!(0.005),
            in_kind_expenditure: dec!(0.005),
        };
        assert!(matches!(sub_cent.validate(), Err(WorkflowError::Validation(_))));

        let largest = Financials {
            cash_allocation: dec!(999999999999.99),
            in_kind_expenditure: Decimal::ZERO,
        };
        assert!(largest.validate().is_ok());

        let overflow = Financials {
            cash_allocation: Decimal::ZERO,
            in_kind_expenditure: dec!(1000000000000),
        };
        assert!(matches!(overflow.validate(), Err(WorkflowError::Validation(_))));
        assert_eq!(Financials::MAX_AMOUNT, dec!(1000000000000));
    }

    #[test]
    fn test_clearances_consistency() {
        assert!(Clearances::PENDING.is_consistent());
        assert!(first_cleared().is_consistent());
        assert!(
            !Clearances {
                first: ClearanceStatus::Pending,
                final_: ClearanceStatus::Cleared,
            }
            .is_consistent()
        );
    }
}
