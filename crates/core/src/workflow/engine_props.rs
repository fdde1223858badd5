//! Property-based tests for the workflow engine over every declared graph.

use chrono::{Days, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use crate::workflow::engine::{GuardFacts, WorkflowEngine, WorkflowGraph, WorkflowState};
use crate::workflow::error::WorkflowError;
use crate::workflow::event::EVENT_GRAPH;
use crate::workflow::permissions::{PermissionMatrix, Role};
use crate::workflow::report::{FINAL_CLEARANCE_GRAPH, FIRST_CLEARANCE_GRAPH, REPORT_GRAPH};
use crate::workflow::submission::SUBMISSION_GRAPH;
use crate::workflow::types::{
    Actor, ClearanceStatus, EventStatus, ReportStatus, SubmissionStatus, Transition,
    TransitionRequest,
};

/// Strategy for role slugs: every known role plus junk.
fn arb_role() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => prop::sample::select(Role::ALL.to_vec()).prop_map(|r| r.as_str().to_string()),
        1 => "[a-z-]{0,12}",
    ]
}

fn arb_transition() -> impl Strategy<Value = Transition> {
    prop::sample::select(Transition::ALL.to_vec())
}

/// Strategy for a request with a random, possibly incomplete payload.
fn arb_request() -> impl Strategy<Value = TransitionRequest> {
    (
        arb_transition(),
        arb_role(),
        prop::option::of("[a-z ]{0,20}"),
        prop::option::of(any::<bool>()),
        prop::option::of(-30i64..400),
    )
        .prop_map(|(transition, role, reason, success, offset)| {
            let mut req = TransitionRequest::new(transition, Actor::new(Uuid::new_v4(), role));
            req.payload.rejection_reason = reason;
            req.payload.success = success;
            req.payload.agreement_expires_on = offset.map(|days| {
                let today = Utc::now().date_naive();
                if days >= 0 {
                    today + Days::new(days.unsigned_abs())
                } else {
                    today - Days::new(days.unsigned_abs())
                }
            });
            req
        })
}

fn arb_facts() -> impl Strategy<Value = GuardFacts> {
    (
        prop::option::of(prop::sample::select(SubmissionStatus::ALL.to_vec())),
        prop::option::of(prop::sample::select(ReportStatus::ALL.to_vec())),
        prop::option::of(prop::sample::select(ClearanceStatus::ALL.to_vec())),
        prop::option::of(prop::sample::select(ClearanceStatus::ALL.to_vec())),
    )
        .prop_map(|(owner_submission, report_status, first_clearance, final_clearance)| {
            GuardFacts {
                owner_submission,
                report_status,
                first_clearance,
                final_clearance,
            }
        })
}

/// A successful apply must follow a declared edge and a granted permission.
fn check_sound<S: WorkflowState>(
    graph: &WorkflowGraph<S>,
    current: S,
    req: &TransitionRequest,
    facts: &GuardFacts,
) -> Result<(), TestCaseError> {
    match WorkflowEngine::apply(graph, current, req, facts) {
        Ok(outcome) => {
            let edge = graph.edge(current, req.transition);
            prop_assert!(edge.is_some());
            prop_assert_eq!(outcome.from, current);
            prop_assert_eq!(Some(outcome.to), edge.map(|e| e.to));
            prop_assert!(PermissionMatrix::is_allowed(
                &req.actor.role,
                graph.kind,
                req.transition
            ));
        }
        Err(WorkflowError::InvalidTransition { .. }) => {
            prop_assert!(graph.edge(current, req.transition).is_none());
        }
        Err(WorkflowError::Forbidden { .. }) => {
            prop_assert!(!PermissionMatrix::is_allowed(
                &req.actor.role,
                graph.kind,
                req.transition
            ));
        }
        Err(_) => {}
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn prop_submission_graph_sound(
        current in prop::sample::select(SubmissionStatus::ALL.to_vec()),
        req in arb_request(),
        facts in arb_facts(),
    ) {
        check_sound(&SUBMISSION_GRAPH, current, &req, &facts)?;
    }

    #[test]
    fn prop_event_graph_sound(
        current in prop::sample::select(EventStatus::ALL.to_vec()),
        req in arb_request(),
        facts in arb_facts(),
    ) {
        check_sound(&EVENT_GRAPH, current, &req, &facts)?;
    }

    #[test]
    fn prop_report_graphs_sound(
        current in prop::sample::select(ReportStatus::ALL.to_vec()),
        clearance in prop::sample::select(ClearanceStatus::ALL.to_vec()),
        req in arb_request(),
        facts in arb_facts(),
    ) {
        check_sound(&REPORT_GRAPH, current, &req, &facts)?;
        check_sound(&FIRST_CLEARANCE_GRAPH, clearance, &req, &facts)?;
        check_sound(&FINAL_CLEARANCE_GRAPH, clearance, &req, &facts)?;
    }

    /// Roles outside the matrix never succeed.
    #[test]
    fn prop_unknown_role_always_fails(
        current in prop::sample::select(EventStatus::ALL.to_vec()),
        transition in arb_transition(),
        role in "[a-z]{1,6}_[a-z]{1,6}",
        facts in arb_facts(),
    ) {
        let req = TransitionRequest::new(transition, Actor::new(Uuid::nil(), role))
            .with_reason("r")
            .with_success(true);
        prop_assert!(WorkflowEngine::apply(&EVENT_GRAPH, current, &req, &facts).is_err());
    }

    /// No edge leaves a terminal status.
    #[test]
    fn prop_terminal_statuses_have_no_edges(
        s in prop::sample::select(SubmissionStatus::ALL.to_vec()),
        e in prop::sample::select(EventStatus::ALL.to_vec()),
    ) {
        if s.is_terminal() {
            prop_assert_eq!(SUBMISSION_GRAPH.outgoing(s).count(), 0);
        }
        if e.is_terminal() {
            prop_assert_eq!(EVENT_GRAPH.outgoing(e).count(), 0);
        }
    }
}
