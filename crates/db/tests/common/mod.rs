//! Shared fixtures for repository integration tests.

#![allow(dead_code)]

use chrono::{Days, NaiveDate, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use tulay_core::tier::TierThresholds;
use tulay_core::workflow::{Actor, EventPublisher, Transition, TransitionRequest};
use tulay_db::entities::{events, reports, submissions};
use tulay_db::{
    CreateEventInput, CreateReportInput, CreateSubmissionInput, EventRepository, Migrator,
    ReportRepository, SubmissionRepository,
};

/// Repositories sharing one migrated in-memory database.
pub struct TestContext {
    pub db: DatabaseConnection,
    pub publisher: EventPublisher,
    pub submissions: SubmissionRepository,
    pub events: EventRepository,
    pub reports: ReportRepository,
}

/// Every pooled connection to `sqlite::memory:` is its own database, so the
/// pool is pinned to a single connection.
pub async fn setup() -> TestContext {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    let publisher = EventPublisher::default();
    TestContext {
        submissions: SubmissionRepository::new(db.clone(), publisher.clone()),
        events: EventRepository::new(db.clone(), publisher.clone(), TierThresholds::default()),
        reports: ReportRepository::new(db.clone(), publisher.clone()),
        db,
        publisher,
    }
}

pub fn actor(role: &str) -> Actor {
    Actor::new(Uuid::new_v4(), role)
}

pub fn request(transition: Transition, role: &str) -> TransitionRequest {
    TransitionRequest::new(transition, actor(role))
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn days_from_today(days: u64) -> NaiveDate {
    today() + Days::new(days)
}

impl TestContext {
    pub async fn pending_submission(&self) -> submissions::Model {
        self.submissions
            .create(
                CreateSubmissionInput {
                    barangay_name: "Barangay San Roque".to_string(),
                    moa: None,
                    agreement_expires_on: Some(days_from_today(365)),
                },
                &actor("area-admin"),
            )
            .await
            .unwrap()
    }

    pub async fn approved_submission(&self) -> submissions::Model {
        let s = self.pending_submission().await;
        self.submissions
            .transition(s.id, &request(Transition::PreApprove, "community-lead"))
            .await
            .unwrap();
        self.submissions
            .transition(s.id, &request(Transition::Approve, "super-admin"))
            .await
            .unwrap()
    }

    pub async fn pending_event(&self, submission_id: Uuid) -> events::Model {
        self.events
            .create(
                submission_id,
                CreateEventInput {
                    title: "Coastal clean-up".to_string(),
                    expected_participants: 40,
                    proposal: None,
                },
                &actor("community-lead"),
            )
            .await
            .unwrap()
    }

    pub async fn approved_event(&self, submission_id: Uuid) -> events::Model {
        let e = self.pending_event(submission_id).await;
        self.events
            .transition(e.id, &request(Transition::PreApprove, "community-lead"))
            .await
            .unwrap();
        self.events
            .transition(e.id, &request(Transition::Approve, "super-admin-a"))
            .await
            .unwrap()
    }

    pub async fn completed_event(&self, submission_id: Uuid, success: bool) -> events::Model {
        let e = self.approved_event(submission_id).await;
        self.events
            .transition(
                e.id,
                &request(Transition::Complete, "community-lead").with_success(success),
            )
            .await
            .unwrap()
    }

    pub async fn approved_report(&self) -> (events::Model, reports::Model) {
        let s = self.approved_submission().await;
        let e = self.completed_event(s.id, true).await;
        let r = self
            .reports
            .create(e.id, CreateReportInput::default(), &actor("area-admin"))
            .await
            .unwrap();
        for (transition, role) in [
            (Transition::Submit, "area-admin"),
            (Transition::PreApprove, "community-lead"),
            (Transition::Review, "super-admin"),
            (Transition::Approve, "super-admin"),
        ] {
            self.reports
                .transition(r.id, &request(transition, role))
                .await
                .unwrap();
        }
        let r = self.reports.get(r.id).await.unwrap();
        (e, r)
    }
}
