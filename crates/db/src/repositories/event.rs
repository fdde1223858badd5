//! Event repository.
//!
//! Event transitions read the owning submission inside the same database
//! transaction that commits the event, so the approval guard always sees a
//! committed submission status. A successful completion bumps the owning
//! submission's counter and tier in that same transaction.

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use tulay_core::tier::{Tier, TierCalculator, TierThresholds};
use tulay_core::workflow::{
    Actor, AdminNotes, DocumentRef, DomainEvent, EntityKind, EventPublisher, EventStatus,
    EventWorkflow, PermissionMatrix, SubmissionStatus, Transition, TransitionOutcome,
    TransitionRequest, WorkflowError,
};

use super::{db_err, log_refused, parse_stored, required_text};
use crate::entities::{events, submissions};

/// Input for proposing an event.
#[derive(Debug, Clone)]
pub struct CreateEventInput {
    /// Event title.
    pub title: String,
    /// Expected number of participants.
    pub expected_participants: i32,
    /// Proposal document reference from the file store.
    pub proposal: Option<DocumentRef>,
}

/// Event repository.
#[derive(Debug, Clone)]
pub struct EventRepository {
    db: DatabaseConnection,
    publisher: EventPublisher,
    thresholds: TierThresholds,
}

impl EventRepository {
    /// Creates a new event repository.
    #[must_use]
    pub const fn new(
        db: DatabaseConnection,
        publisher: EventPublisher,
        thresholds: TierThresholds,
    ) -> Self {
        Self {
            db,
            publisher,
            thresholds,
        }
    }

    /// Proposes an event under a submission, in PENDING.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden`, `Validation`, or `NotFound` for an unknown
    /// submission.
    pub async fn create(
        &self,
        submission_id: Uuid,
        input: CreateEventInput,
        actor: &Actor,
    ) -> Result<events::Model, WorkflowError> {
        PermissionMatrix::authorize(&actor.role, EntityKind::Event, Transition::Create)?;
        let title = required_text("title", &input.title)?;
        if input.expected_participants <= 0 {
            return Err(WorkflowError::Validation(
                "expected_participants must be positive".to_string(),
            ));
        }

        submissions::Entity::find_by_id(submission_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(WorkflowError::NotFound {
                kind: EntityKind::Submission,
                id: submission_id,
            })?;

        let now = Utc::now().into();
        let (proposal_path, proposal_name) = input
            .proposal
            .map_or((None, None), |d| (Some(d.path), Some(d.name)));

        let model = events::ActiveModel {
            id: Set(Uuid::new_v4()),
            submission_id: Set(submission_id),
            title: Set(title),
            expected_participants: Set(input.expected_participants),
            proposal_path: Set(proposal_path),
            proposal_name: Set(proposal_name),
            status: Set(EventStatus::Pending.as_str().to_string()),
            success: Set(None),
            reviewed_by: Set(None),
            reviewed_at: Set(None),
            approved_by: Set(None),
            approved_at: Set(None),
            rejected_by: Set(None),
            rejected_at: Set(None),
            rejection_reason: Set(None),
            completed_by: Set(None),
            completed_at: Set(None),
            cancelled_by: Set(None),
            cancelled_at: Set(None),
            cleared_by: Set(None),
            cleared_at: Set(None),
            admin_notes: Set(None),
            created_by: Set(actor.user_id),
            version: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(db_err)?;

        info!(
            entity_kind = "event",
            entity_id = %model.id,
            submission_id = %submission_id,
            actor = %actor.role,
            "event proposed"
        );
        self.publisher
            .publish(DomainEvent::now(EntityKind::Event, model.id, &model.status));
        Ok(model)
    }

    /// Finds an event by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such event exists.
    pub async fn get(&self, id: Uuid) -> Result<events::Model, WorkflowError> {
        events::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(WorkflowError::NotFound {
                kind: EntityKind::Event,
                id,
            })
    }

    /// Lists a submission's events, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_submission(
        &self,
        submission_id: Uuid,
    ) -> Result<Vec<events::Model>, WorkflowError> {
        events::Entity::find()
            .filter(events::Column::SubmissionId.eq(submission_id))
            .order_by_asc(events::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Applies a transition to an event.
    ///
    /// # Errors
    ///
    /// Any workflow failure, or `StateConflict` if the event changed
    /// between read and write.
    pub async fn transition(
        &self,
        id: Uuid,
        request: &TransitionRequest,
    ) -> Result<events::Model, WorkflowError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let snapshot = find_in(&txn, id).await?;
        let owner = submissions::Entity::find_by_id(snapshot.submission_id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(WorkflowError::NotFound {
                kind: EntityKind::Submission,
                id: snapshot.submission_id,
            })?;

        let status = parse_stored(EntityKind::Event, &snapshot.status, EventStatus::parse)?;
        let owner_status =
            parse_stored(EntityKind::Submission, &owner.status, SubmissionStatus::parse)?;

        let outcome = EventWorkflow::apply(status, owner_status, request)
            .inspect_err(|e| log_refused(EntityKind::Event, id, request.transition, e))?;

        commit_in(&txn, &snapshot, &outcome).await?;

        let tier_change = if EventWorkflow::counts_toward_tier(&outcome) {
            Some(record_success(&txn, snapshot.submission_id, &self.thresholds).await?)
        } else {
            None
        };

        txn.commit().await.map_err(db_err)?;

        log_committed(id, &outcome);
        if let Some((count, tier)) = tier_change {
            info!(
                entity_kind = "submission",
                entity_id = %snapshot.submission_id,
                successful_event_count = count,
                tier = %tier,
                "tier recomputed"
            );
        }
        self.publisher
            .publish(DomainEvent::now(EntityKind::Event, id, outcome.to.as_str()));

        self.get(id).await
    }

    /// Appends an admin note.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` for roles without annotate permission and
    /// `StateConflict` if the row changed concurrently.
    pub async fn annotate(
        &self,
        id: Uuid,
        actor: &Actor,
        note: &str,
    ) -> Result<events::Model, WorkflowError> {
        let snapshot = self.get(id).await?;
        let notes = AdminNotes::append(
            EntityKind::Event,
            actor,
            snapshot.admin_notes.as_deref(),
            note,
            Utc::now(),
        )
        .inspect_err(|e| log_refused(EntityKind::Event, id, Transition::AnnotateNotes, e))?;

        let result = events::Entity::update_many()
            .set(events::ActiveModel {
                admin_notes: Set(Some(notes)),
                version: Set(snapshot.version + 1),
                updated_at: Set(Utc::now().into()),
                ..Default::default()
            })
            .filter(events::Column::Id.eq(id))
            .filter(events::Column::Version.eq(snapshot.version))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(WorkflowError::StateConflict {
                kind: EntityKind::Event,
                id,
            });
        }
        self.get(id).await
    }
}

/// Loads an event inside a transaction.
pub(crate) async fn find_in(
    txn: &DatabaseTransaction,
    id: Uuid,
) -> Result<events::Model, WorkflowError> {
    events::Entity::find_by_id(id)
        .one(txn)
        .await
        .map_err(db_err)?
        .ok_or(WorkflowError::NotFound {
            kind: EntityKind::Event,
            id,
        })
}

/// Commits an event outcome with compare-and-swap inside a transaction.
pub(crate) async fn commit_in(
    txn: &DatabaseTransaction,
    snapshot: &events::Model,
    outcome: &TransitionOutcome<EventStatus>,
) -> Result<(), WorkflowError> {
    let at = outcome.at.into();
    let actor = Some(outcome.actor.user_id);

    let mut active = events::ActiveModel {
        status: Set(outcome.to.as_str().to_string()),
        version: Set(snapshot.version + 1),
        updated_at: Set(at),
        ..Default::default()
    };

    match outcome.transition {
        Transition::PreApprove => {
            active.reviewed_by = Set(actor);
            active.reviewed_at = Set(Some(at));
        }
        Transition::Approve => {
            active.approved_by = Set(actor);
            active.approved_at = Set(Some(at));
        }
        Transition::Reject => {
            active.rejected_by = Set(actor);
            active.rejected_at = Set(Some(at));
            active.rejection_reason = Set(outcome.rejection_reason.clone());
        }
        Transition::Complete => {
            active.completed_by = Set(actor);
            active.completed_at = Set(Some(at));
            active.success = Set(outcome.success);
        }
        Transition::Cancel => {
            active.cancelled_by = Set(actor);
            active.cancelled_at = Set(Some(at));
        }
        Transition::Clear => {
            active.cleared_by = Set(actor);
            active.cleared_at = Set(Some(at));
        }
        _ => {}
    }

    if let Some(note) = &outcome.admin_notes {
        active.admin_notes = Set(Some(AdminNotes::join(
            snapshot.admin_notes.as_deref(),
            &AdminNotes::line(&outcome.actor, outcome.at, note),
        )));
    }

    let result = events::Entity::update_many()
        .set(active)
        .filter(events::Column::Id.eq(snapshot.id))
        .filter(events::Column::Status.eq(outcome.from.as_str()))
        .filter(events::Column::Version.eq(snapshot.version))
        .exec(txn)
        .await
        .map_err(db_err)?;

    if result.rows_affected == 0 {
        let err = WorkflowError::StateConflict {
            kind: EntityKind::Event,
            id: snapshot.id,
        };
        log_refused(EntityKind::Event, snapshot.id, outcome.transition, &err);
        return Err(err);
    }
    Ok(())
}

/// Logs a committed event transition.
pub(crate) fn log_committed(id: Uuid, outcome: &TransitionOutcome<EventStatus>) {
    info!(
        entity_kind = "event",
        entity_id = %id,
        transition = %outcome.transition,
        actor = %outcome.actor.role,
        from = %outcome.from,
        to = %outcome.to,
        success = ?outcome.success,
        "transition committed"
    );
}

/// Increments the submission's successful-event counter and raises its
/// tier if the new count crosses a threshold.
///
/// The increment is a single `SET count = count + 1` so concurrent
/// completions under one submission never lose an update.
async fn record_success(
    txn: &DatabaseTransaction,
    submission_id: Uuid,
    thresholds: &TierThresholds,
) -> Result<(u32, Tier), WorkflowError> {
    submissions::Entity::update_many()
        .col_expr(
            submissions::Column::SuccessfulEventCount,
            Expr::col(submissions::Column::SuccessfulEventCount).add(1),
        )
        .filter(submissions::Column::Id.eq(submission_id))
        .exec(txn)
        .await
        .map_err(db_err)?;

    let submission = submissions::Entity::find_by_id(submission_id)
        .one(txn)
        .await
        .map_err(db_err)?
        .ok_or(WorkflowError::NotFound {
            kind: EntityKind::Submission,
            id: submission_id,
        })?;

    let count = u32::try_from(submission.successful_event_count).map_err(|_| {
        WorkflowError::CorruptState {
            kind: EntityKind::Submission,
            value: submission.successful_event_count.to_string(),
        }
    })?;
    let current = parse_stored(EntityKind::Submission, &submission.tier, Tier::parse)?;
    let tier = TierCalculator::recompute(current, count, thresholds);
    let now: DateTimeWithTimeZone = Utc::now().into();

    submissions::Entity::update_many()
        .col_expr(submissions::Column::Tier, Expr::value(tier.as_str()))
        .col_expr(submissions::Column::TierUpdatedAt, Expr::value(now))
        .col_expr(submissions::Column::UpdatedAt, Expr::value(now))
        .filter(submissions::Column::Id.eq(submission_id))
        .exec(txn)
        .await
        .map_err(db_err)?;

    Ok((count, tier))
}
