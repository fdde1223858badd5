//! Property-based tests for report clearance ordering.

use proptest::prelude::*;
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::permissions::Role;
use crate::workflow::report::{ClearanceStage, Clearances, ReportWorkflow};
use crate::workflow::types::{Actor, ClearanceStatus, ReportStatus};

fn arb_role() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(Role::ALL.to_vec()).prop_map(|r| r.as_str().to_string()),
        "[a-z-]{0,12}",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Final clearance with first clearance pending is an ordering violation
    /// for every role and every primary status.
    #[test]
    fn prop_final_before_first_is_ordering_violation(
        role in arb_role(),
        status in prop::sample::select(ReportStatus::ALL.to_vec()),
    ) {
        let actor = Actor::new(Uuid::new_v4(), role);
        let result = ReportWorkflow::clear(
            status,
            Clearances::PENDING,
            ClearanceStage::Final,
            &actor,
        );
        prop_assert!(
            matches!(result, Err(WorkflowError::OrderingViolation { .. })),
            "expected ordering violation"
        );
    }

    /// Any successful clearance keeps final ⇒ first.
    #[test]
    fn prop_clearances_stay_consistent(
        role in arb_role(),
        status in prop::sample::select(ReportStatus::ALL.to_vec()),
        first in prop::sample::select(ClearanceStatus::ALL.to_vec()),
        stage in prop_oneof![Just(ClearanceStage::First), Just(ClearanceStage::Final)],
    ) {
        let before = Clearances { first, final_: ClearanceStatus::Pending };
        let actor = Actor::new(Uuid::new_v4(), role);
        if let Ok(outcome) = ReportWorkflow::clear(status, before, stage, &actor) {
            let after = match stage {
                ClearanceStage::First => Clearances { first: outcome.to, ..before },
                ClearanceStage::Final => Clearances { final_: outcome.to, ..before },
            };
            prop_assert!(after.is_consistent());
            prop_assert_eq!(status, ReportStatus::Approved);
        }
    }

    /// Editable only in DRAFT with both clearances pending.
    #[test]
    fn prop_editability(
        status in prop::sample::select(ReportStatus::ALL.to_vec()),
        first in prop::sample::select(ClearanceStatus::ALL.to_vec()),
        final_ in prop::sample::select(ClearanceStatus::ALL.to_vec()),
    ) {
        let clearances = Clearances { first, final_ };
        let expected = status == ReportStatus::Draft
            && first == ClearanceStatus::Pending
            && final_ == ClearanceStatus::Pending;
        prop_assert_eq!(ReportWorkflow::is_editable(status, clearances), expected);
    }
}
