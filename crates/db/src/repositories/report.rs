//! Report repository: primary transitions, the two clearance sub-flows,
//! financial edits and admin notes.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use tulay_core::workflow::{
    Actor, AdminNotes, ClearanceStage, ClearanceStatus, Clearances, DocumentRef, DomainEvent,
    EntityKind, EventPublisher, EventStatus, EventWorkflow, Financials, PermissionMatrix,
    ReportStatus, ReportWorkflow, Transition, TransitionRequest, WorkflowError,
};

use super::event::{commit_in as commit_event_in, find_in as find_event_in, log_committed};
use super::{db_err, log_refused, parse_stored};
use crate::entities::reports;

/// Input for starting a report on a completed event.
#[derive(Debug, Clone, Default)]
pub struct CreateReportInput {
    /// Initial financial fields; zero when absent.
    pub financials: Option<Financials>,
    /// Report document reference from the file store.
    pub report_file: Option<DocumentRef>,
}

/// Input for editing a draft report.
#[derive(Debug, Clone)]
pub struct UpdateFinancialsInput {
    /// New financial fields.
    pub financials: Financials,
    /// Replacement report document, if any.
    pub report_file: Option<DocumentRef>,
}

/// Report repository.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: DatabaseConnection,
    publisher: EventPublisher,
}

impl ReportRepository {
    /// Creates a new report repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, publisher: EventPublisher) -> Self {
        Self { db, publisher }
    }

    /// Starts the report for a completed event, in DRAFT.
    ///
    /// # Errors
    ///
    /// Returns `EventNotCompleted` unless the event is COMPLETED and
    /// `ReportAlreadyExists` if the event already has a report.
    pub async fn create(
        &self,
        event_id: Uuid,
        input: CreateReportInput,
        actor: &Actor,
    ) -> Result<reports::Model, WorkflowError> {
        PermissionMatrix::authorize(&actor.role, EntityKind::Report, Transition::Create)?;
        let financials = input.financials.unwrap_or(Financials {
            cash_allocation: Decimal::ZERO,
            in_kind_expenditure: Decimal::ZERO,
        });
        financials.validate()?;

        let txn = self.db.begin().await.map_err(db_err)?;

        let event = find_event_in(&txn, event_id).await?;
        if EventStatus::parse(&event.status) != Some(EventStatus::Completed) {
            return Err(WorkflowError::EventNotCompleted {
                status: event.status,
            });
        }

        let existing = reports::Entity::find()
            .filter(reports::Column::EventId.eq(event_id))
            .one(&txn)
            .await
            .map_err(db_err)?;
        if existing.is_some() {
            return Err(WorkflowError::ReportAlreadyExists(event_id));
        }

        let now = Utc::now().into();
        let (path, name) = input
            .report_file
            .map_or((None, None), |d| (Some(d.path), Some(d.name)));

        let model = reports::ActiveModel {
            id: Set(Uuid::new_v4()),
            event_id: Set(event_id),
            status: Set(ReportStatus::Draft.as_str().to_string()),
            cash_allocation: Set(financials.cash_allocation),
            in_kind_expenditure: Set(financials.in_kind_expenditure),
            total_cost: Set(financials.total_cost()),
            report_file_path: Set(path),
            report_file_name: Set(name),
            submitted_by: Set(None),
            submitted_at: Set(None),
            pre_approved_by: Set(None),
            pre_approved_at: Set(None),
            reviewed_by: Set(None),
            reviewed_at: Set(None),
            approved_by: Set(None),
            approved_at: Set(None),
            returned_by: Set(None),
            returned_at: Set(None),
            returned_reason: Set(None),
            first_clearance_status: Set(ClearanceStatus::Pending.as_str().to_string()),
            first_cleared_by: Set(None),
            first_cleared_at: Set(None),
            final_clearance_status: Set(ClearanceStatus::Pending.as_str().to_string()),
            final_cleared_by: Set(None),
            final_cleared_at: Set(None),
            admin_notes: Set(None),
            created_by: Set(actor.user_id),
            version: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| unique_violation(e, event_id))?;

        txn.commit()
            .await
            .map_err(|e| unique_violation(e, event_id))?;

        info!(
            entity_kind = "report",
            entity_id = %model.id,
            event_id = %event_id,
            actor = %actor.role,
            "report created"
        );
        self.publisher
            .publish(DomainEvent::now(EntityKind::Report, model.id, &model.status));
        Ok(model)
    }

    /// Finds a report by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such report exists.
    pub async fn get(&self, id: Uuid) -> Result<reports::Model, WorkflowError> {
        reports::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(WorkflowError::NotFound {
                kind: EntityKind::Report,
                id,
            })
    }

    /// Finds the report of an event.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the event has no report.
    pub async fn get_for_event(&self, event_id: Uuid) -> Result<reports::Model, WorkflowError> {
        reports::Entity::find()
            .filter(reports::Column::EventId.eq(event_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(WorkflowError::NotFound {
                kind: EntityKind::Report,
                id: event_id,
            })
    }

    /// Applies a primary-status transition.
    ///
    /// # Errors
    ///
    /// Any workflow failure, or `StateConflict` if the report changed
    /// between read and write.
    pub async fn transition(
        &self,
        id: Uuid,
        request: &TransitionRequest,
    ) -> Result<reports::Model, WorkflowError> {
        let snapshot = self.get(id).await?;
        let status = parse_stored(EntityKind::Report, &snapshot.status, ReportStatus::parse)?;
        let outcome = ReportWorkflow::apply(status, request)
            .inspect_err(|e| log_refused(EntityKind::Report, id, request.transition, e))?;

        let at = outcome.at.into();
        let actor = Some(outcome.actor.user_id);
        let mut active = reports::ActiveModel {
            status: Set(outcome.to.as_str().to_string()),
            version: Set(snapshot.version + 1),
            updated_at: Set(at),
            ..Default::default()
        };

        match outcome.transition {
            Transition::Submit => {
                active.submitted_by = Set(actor);
                active.submitted_at = Set(Some(at));
            }
            Transition::PreApprove => {
                active.pre_approved_by = Set(actor);
                active.pre_approved_at = Set(Some(at));
            }
            Transition::Review => {
                active.reviewed_by = Set(actor);
                active.reviewed_at = Set(Some(at));
            }
            Transition::Approve => {
                active.approved_by = Set(actor);
                active.approved_at = Set(Some(at));
            }
            Transition::Reject => {
                active.returned_by = Set(actor);
                active.returned_at = Set(Some(at));
                active.returned_reason = Set(outcome.rejection_reason.clone());
            }
            _ => {}
        }

        if let Some(note) = &outcome.admin_notes {
            active.admin_notes = Set(Some(AdminNotes::join(
                snapshot.admin_notes.as_deref(),
                &AdminNotes::line(&outcome.actor, outcome.at, note),
            )));
        }

        let result = reports::Entity::update_many()
            .set(active)
            .filter(reports::Column::Id.eq(id))
            .filter(reports::Column::Status.eq(outcome.from.as_str()))
            .filter(reports::Column::Version.eq(snapshot.version))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(self.conflict(id, outcome.transition));
        }

        info!(
            entity_kind = "report",
            entity_id = %id,
            transition = %outcome.transition,
            actor = %outcome.actor.role,
            from = %outcome.from,
            to = %outcome.to,
            "transition committed"
        );
        self.publisher
            .publish(DomainEvent::now(EntityKind::Report, id, outcome.to.as_str()));

        self.get(id).await
    }

    /// Grants first or final clearance.
    ///
    /// Final clearance also closes out the report's event (COMPLETED →
    /// CLEARED) in the same database transaction, as the same actor.
    ///
    /// # Errors
    ///
    /// `OrderingViolation` for final before first, `ReportNotApproved`,
    /// `Forbidden`, or `StateConflict` on a lost race.
    pub async fn clear(
        &self,
        id: Uuid,
        stage: ClearanceStage,
        actor: &Actor,
    ) -> Result<reports::Model, WorkflowError> {
        let transition = stage.transition();
        let txn = self.db.begin().await.map_err(db_err)?;

        let snapshot = reports::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(WorkflowError::NotFound {
                kind: EntityKind::Report,
                id,
            })?;

        let status = parse_stored(EntityKind::Report, &snapshot.status, ReportStatus::parse)?;
        let clearances = clearances_of(&snapshot)?;
        let outcome = ReportWorkflow::clear(status, clearances, stage, actor)
            .inspect_err(|e| log_refused(EntityKind::Report, id, transition, e))?;

        let at = outcome.at.into();
        let mut active = reports::ActiveModel {
            version: Set(snapshot.version + 1),
            updated_at: Set(at),
            ..Default::default()
        };
        let column = match stage {
            ClearanceStage::First => {
                active.first_clearance_status = Set(outcome.to.as_str().to_string());
                active.first_cleared_by = Set(Some(actor.user_id));
                active.first_cleared_at = Set(Some(at));
                reports::Column::FirstClearanceStatus
            }
            ClearanceStage::Final => {
                active.final_clearance_status = Set(outcome.to.as_str().to_string());
                active.final_cleared_by = Set(Some(actor.user_id));
                active.final_cleared_at = Set(Some(at));
                reports::Column::FinalClearanceStatus
            }
        };

        let result = reports::Entity::update_many()
            .set(active)
            .filter(reports::Column::Id.eq(id))
            .filter(reports::Column::Status.eq(ReportStatus::Approved.as_str()))
            .filter(column.eq(outcome.from.as_str()))
            .filter(reports::Column::Version.eq(snapshot.version))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(self.conflict(id, transition));
        }

        let event_outcome = if stage == ClearanceStage::Final {
            let event = find_event_in(&txn, snapshot.event_id).await?;
            let event_status = parse_stored(EntityKind::Event, &event.status, EventStatus::parse)?;
            let outcome = EventWorkflow::clear(event_status, ClearanceStatus::Cleared, actor)
                .inspect_err(|e| {
                    log_refused(EntityKind::Event, event.id, Transition::Clear, e);
                })?;
            commit_event_in(&txn, &event, &outcome).await?;
            Some(outcome)
        } else {
            None
        };

        txn.commit().await.map_err(db_err)?;

        info!(
            entity_kind = "report",
            entity_id = %id,
            transition = %transition,
            actor = %actor.role,
            "clearance granted"
        );
        self.publisher
            .publish(DomainEvent::clearance(id, stage, outcome.to));
        if let Some(outcome) = event_outcome {
            log_committed(snapshot.event_id, &outcome);
            self.publisher.publish(DomainEvent::now(
                EntityKind::Event,
                snapshot.event_id,
                outcome.to.as_str(),
            ));
        }

        self.get(id).await
    }

    /// Replaces the financial fields and, optionally, the report file.
    ///
    /// # Errors
    ///
    /// `ReportLocked` once the report leaves DRAFT or any clearance is
    /// granted; `Validation` for negative amounts, more than two decimal
    /// places, or amounts of 10^12 and above.
    pub async fn update_financials(
        &self,
        id: Uuid,
        input: UpdateFinancialsInput,
        actor: &Actor,
    ) -> Result<reports::Model, WorkflowError> {
        let snapshot = self.get(id).await?;
        let status = parse_stored(EntityKind::Report, &snapshot.status, ReportStatus::parse)?;
        let clearances = clearances_of(&snapshot)?;

        ReportWorkflow::ensure_editable(status, clearances, actor)
            .and_then(|()| input.financials.validate())
            .inspect_err(|e| log_refused(EntityKind::Report, id, Transition::EditFinancials, e))?;

        let mut active = reports::ActiveModel {
            cash_allocation: Set(input.financials.cash_allocation),
            in_kind_expenditure: Set(input.financials.in_kind_expenditure),
            total_cost: Set(input.financials.total_cost()),
            version: Set(snapshot.version + 1),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };
        if let Some(file) = input.report_file {
            active.report_file_path = Set(Some(file.path));
            active.report_file_name = Set(Some(file.name));
        }

        let pending = ClearanceStatus::Pending.as_str();
        let result = reports::Entity::update_many()
            .set(active)
            .filter(reports::Column::Id.eq(id))
            .filter(reports::Column::Status.eq(ReportStatus::Draft.as_str()))
            .filter(reports::Column::FirstClearanceStatus.eq(pending))
            .filter(reports::Column::FinalClearanceStatus.eq(pending))
            .filter(reports::Column::Version.eq(snapshot.version))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(self.conflict(id, Transition::EditFinancials));
        }

        info!(
            entity_kind = "report",
            entity_id = %id,
            actor = %actor.role,
            total_cost = %input.financials.total_cost(),
            "financials updated"
        );
        self.get(id).await
    }

    /// Appends an admin note. Allowed in any status, including after
    /// clearance.
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
    ) -> Result<reports::Model, WorkflowError> {
        let snapshot = self.get(id).await?;
        let notes = AdminNotes::append(
            EntityKind::Report,
            actor,
            snapshot.admin_notes.as_deref(),
            note,
            Utc::now(),
        )
        .inspect_err(|e| log_refused(EntityKind::Report, id, Transition::AnnotateNotes, e))?;

        let result = reports::Entity::update_many()
            .set(reports::ActiveModel {
                admin_notes: Set(Some(notes)),
                version: Set(snapshot.version + 1),
                updated_at: Set(Utc::now().into()),
                ..Default::default()
            })
            .filter(reports::Column::Id.eq(id))
            .filter(reports::Column::Version.eq(snapshot.version))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(self.conflict(id, Transition::AnnotateNotes));
        }
        self.get(id).await
    }

    fn conflict(&self, id: Uuid, transition: Transition) -> WorkflowError {
        let err = WorkflowError::StateConflict {
            kind: EntityKind::Report,
            id,
        };
        log_refused(EntityKind::Report, id, transition, &err);
        err
    }
}

/// Reads both clearance columns.
fn clearances_of(model: &reports::Model) -> Result<Clearances, WorkflowError> {
    Ok(Clearances {
        first: parse_stored(
            EntityKind::Report,
            &model.first_clearance_status,
            ClearanceStatus::parse,
        )?,
        final_: parse_stored(
            EntityKind::Report,
            &model.final_clearance_status,
            ClearanceStatus::parse,
        )?,
    })
}

/// A unique-index hit on `event_id` means another request created the
/// report first.
fn unique_violation(err: DbErr, event_id: Uuid) -> WorkflowError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => WorkflowError::ReportAlreadyExists(event_id),
        _ => db_err(err),
    }
}
