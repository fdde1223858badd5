//! Report workflow, clearance ordering and financial locking.

mod common;

use rust_decimal_macros::dec;

use common::{actor, request, setup};
use tulay_core::workflow::{
    ClearanceStage, EntityKind, ErrorKind, Financials, Transition, WorkflowError,
};
use tulay_db::{CreateReportInput, UpdateFinancialsInput};

#[tokio::test]
async fn test_report_requires_completed_event() {
    let ctx = setup().await;
    let s = ctx.approved_submission().await;
    let e = ctx.approved_event(s.id).await;

    let err = ctx
        .reports
        .create(e.id, CreateReportInput::default(), &actor("area-admin"))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::EventNotCompleted { .. }));
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
}

#[tokio::test]
async fn test_one_report_per_event() {
    let ctx = setup().await;
    let s = ctx.approved_submission().await;
    let e = ctx.completed_event(s.id, true).await;

    let r = ctx
        .reports
        .create(
            e.id,
            CreateReportInput {
                financials: Some(Financials {
                    cash_allocation: dec!(1500.50),
                    in_kind_expenditure: dec!(250.25),
                }),
                report_file: None,
            },
            &actor("area-admin"),
        )
        .await
        .unwrap();
    assert_eq!(r.status, "DRAFT");
    assert_eq!(r.first_clearance_status, "PENDING");
    assert_eq!(r.final_clearance_status, "PENDING");
    assert_eq!(r.total_cost, dec!(1750.75));

    let err = ctx
        .reports
        .create(e.id, CreateReportInput::default(), &actor("super-admin"))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::ReportAlreadyExists(id) if id == e.id));
    assert_eq!(err.kind(), ErrorKind::StateConflict);

    assert_eq!(ctx.reports.get_for_event(e.id).await.unwrap().id, r.id);
}

#[tokio::test]
async fn test_primary_flow_stamps_each_step() {
    let ctx = setup().await;
    let (_, r) = ctx.approved_report().await;

    assert_eq!(r.status, "APPROVED");
    assert!(r.submitted_by.is_some());
    assert!(r.pre_approved_by.is_some());
    assert!(r.reviewed_by.is_some());
    assert!(r.approved_by.is_some());
    assert!(r.approved_at.is_some());
}

#[tokio::test]
async fn test_return_to_draft_requires_reason() {
    let ctx = setup().await;
    let s = ctx.approved_submission().await;
    let e = ctx.completed_event(s.id, true).await;
    let r = ctx
        .reports
        .create(e.id, CreateReportInput::default(), &actor("area-admin"))
        .await
        .unwrap();
    ctx.reports
        .transition(r.id, &request(Transition::Submit, "area-admin"))
        .await
        .unwrap();

    let err = ctx
        .reports
        .transition(r.id, &request(Transition::Reject, "community-lead"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);

    let returned = ctx
        .reports
        .transition(
            r.id,
            &request(Transition::Reject, "community-lead").with_reason("receipts missing"),
        )
        .await
        .unwrap();
    assert_eq!(returned.status, "DRAFT");
    assert_eq!(returned.returned_reason.as_deref(), Some("receipts missing"));
    assert!(returned.returned_by.is_some());
}

#[tokio::test]
async fn test_final_before_first_is_ordering_violation() {
    let ctx = setup().await;
    let (_, r) = ctx.approved_report().await;

    for role in ["super-admin-b", "super-admin", "area-admin"] {
        let err = ctx
            .reports
            .clear(r.id, ClearanceStage::Final, &actor(role))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OrderingViolation, "role {role}");
    }

    assert_eq!(ctx.reports.get(r.id).await.unwrap(), r);
}

#[tokio::test]
async fn test_clearance_requires_approved_report() {
    let ctx = setup().await;
    let s = ctx.approved_submission().await;
    let e = ctx.completed_event(s.id, true).await;
    let r = ctx
        .reports
        .create(e.id, CreateReportInput::default(), &actor("area-admin"))
        .await
        .unwrap();

    let err = ctx
        .reports
        .clear(r.id, ClearanceStage::First, &actor("super-admin"))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::ReportNotApproved { .. }));
}

#[tokio::test]
async fn test_final_clearance_closes_event() {
    let ctx = setup().await;
    let (e, r) = ctx.approved_report().await;

    let err = ctx
        .reports
        .clear(r.id, ClearanceStage::First, &actor("super-admin-b"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let mut first_rx = ctx.publisher.subscribe();
    let first_actor = actor("super-admin-a");
    let first = ctx
        .reports
        .clear(r.id, ClearanceStage::First, &first_actor)
        .await
        .unwrap();
    assert_eq!(first.first_clearance_status, "CLEARED");
    assert_eq!(first.first_cleared_by, Some(first_actor.user_id));
    assert_eq!(first.final_clearance_status, "PENDING");
    assert_eq!(ctx.events.get(e.id).await.unwrap().status, "COMPLETED");
    assert_eq!(
        first_rx.recv().await.unwrap().new_status,
        "FIRST_CLEARANCE:CLEARED"
    );

    let mut rx = ctx.publisher.subscribe();
    let final_actor = actor("super-admin-b");
    let cleared = ctx
        .reports
        .clear(r.id, ClearanceStage::Final, &final_actor)
        .await
        .unwrap();
    assert_eq!(cleared.final_clearance_status, "CLEARED");
    assert_eq!(cleared.final_cleared_by, Some(final_actor.user_id));
    assert!(cleared.final_cleared_at.is_some());
    assert_eq!(cleared.status, "APPROVED");

    let event = ctx.events.get(e.id).await.unwrap();
    assert_eq!(event.status, "CLEARED");
    assert_eq!(event.cleared_by, Some(final_actor.user_id));

    let report_evt = rx.recv().await.unwrap();
    assert_eq!(report_evt.entity_kind, EntityKind::Report);
    assert_eq!(report_evt.entity_id, r.id);
    assert_eq!(report_evt.new_status, "FINAL_CLEARANCE:CLEARED");
    let event_evt = rx.recv().await.unwrap();
    assert_eq!(event_evt.entity_kind, EntityKind::Event);
    assert_eq!(event_evt.new_status, "CLEARED");

    let err = ctx
        .reports
        .clear(r.id, ClearanceStage::Final, &final_actor)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
}

#[tokio::test]
async fn test_financials_editable_only_in_draft() {
    let ctx = setup().await;
    let s = ctx.approved_submission().await;
    let e = ctx.completed_event(s.id, true).await;
    let r = ctx
        .reports
        .create(e.id, CreateReportInput::default(), &actor("area-admin"))
        .await
        .unwrap();

    let updated = ctx
        .reports
        .update_financials(
            r.id,
            UpdateFinancialsInput {
                financials: Financials {
                    cash_allocation: dec!(1000.50),
                    in_kind_expenditure: dec!(500.25),
                },
                report_file: None,
            },
            &actor("area-admin"),
        )
        .await
        .unwrap();
    assert_eq!(updated.total_cost, dec!(1500.75));

    let err = ctx
        .reports
        .update_financials(
            r.id,
            UpdateFinancialsInput {
                financials: Financials {
                    cash_allocation: dec!(-1),
                    in_kind_expenditure: dec!(0),
                },
                report_file: None,
            },
            &actor("area-admin"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);

    ctx.reports
        .transition(r.id, &request(Transition::Submit, "area-admin"))
        .await
        .unwrap();

    let err = ctx
        .reports
        .update_financials(
            r.id,
            UpdateFinancialsInput {
                financials: Financials {
                    cash_allocation: dec!(1),
                    in_kind_expenditure: dec!(1),
                },
                report_file: None,
            },
            &actor("area-admin"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::ReportLocked { .. }));
    assert_eq!(err.error_code(), "REPORT_LOCKED");
    assert_eq!(
        ctx.reports.get(r.id).await.unwrap().total_cost,
        dec!(1500.75)
    );
}

#[tokio::test]
async fn test_financials_outside_stored_precision_are_refused() {
    let ctx = setup().await;
    let s = ctx.approved_submission().await;
    let e = ctx.completed_event(s.id, true).await;
    let r = ctx
        .reports
        .create(
            e.id,
            CreateReportInput {
                financials: Some(Financials {
                    cash_allocation: dec!(100.50),
                    in_kind_expenditure: dec!(20.25),
                }),
                report_file: None,
            },
            &actor("area-admin"),
        )
        .await
        .unwrap();

    for financials in [
        Financials {
            cash_allocation: dec!(0.005),
            in_kind_expenditure: dec!(0.005),
        },
        Financials {
            cash_allocation: dec!(1000000000000),
            in_kind_expenditure: dec!(0),
        },
    ] {
        let err = ctx
            .reports
            .update_financials(
                r.id,
                UpdateFinancialsInput {
                    financials,
                    report_file: None,
                },
                &actor("area-admin"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError, "{financials:?}");
    }

    let unchanged = ctx.reports.get(r.id).await.unwrap();
    assert_eq!(unchanged.version, r.version);
    assert_eq!(unchanged.cash_allocation, dec!(100.50));
    assert_eq!(unchanged.in_kind_expenditure, dec!(20.25));
    assert_eq!(unchanged.total_cost, dec!(120.75));

    let err = ctx
        .reports
        .create(
            ctx.completed_event(s.id, true).await.id,
            CreateReportInput {
                financials: Some(Financials {
                    cash_allocation: dec!(1.001),
                    in_kind_expenditure: dec!(0),
                }),
                report_file: None,
            },
            &actor("area-admin"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);
}

#[tokio::test]
async fn test_notes_allowed_after_clearance() {
    let ctx = setup().await;
    let (_, r) = ctx.approved_report().await;
    ctx.reports
        .clear(r.id, ClearanceStage::First, &actor("super-admin"))
        .await
        .unwrap();
    ctx.reports
        .clear(r.id, ClearanceStage::Final, &actor("super-admin-b"))
        .await
        .unwrap();

    let noted = ctx
        .reports
        .annotate(r.id, &actor("super-admin-b"), "archived")
        .await
        .unwrap();
    assert!(noted.admin_notes.unwrap().ends_with("super-admin-b] archived"));
}
