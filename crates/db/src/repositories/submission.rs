//! Submission repository: intake, transitions, re-apply, renewal and the
//! agreement expiry sweep.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{info, warn};
use uuid::Uuid;

use tulay_core::tier::Tier;
use tulay_core::workflow::{
    Actor, AdminNotes, DocumentRef, DomainEvent, EntityKind, EventPublisher, PermissionMatrix,
    Stage, SubmissionStatus, SubmissionWorkflow, Transition, TransitionOutcome, TransitionRequest,
    WorkflowError,
};

use super::{db_err, log_refused, parse_stored, required_text};
use crate::entities::submissions;

/// Input for a new partnership application.
#[derive(Debug, Clone)]
pub struct CreateSubmissionInput {
    /// Barangay applying for the partnership.
    pub barangay_name: String,
    /// Signed MOA reference from the file store.
    pub moa: Option<DocumentRef>,
    /// Agreement expiry date, if already known.
    pub agreement_expires_on: Option<NaiveDate>,
}

/// Submission repository.
#[derive(Debug, Clone)]
pub struct SubmissionRepository {
    db: DatabaseConnection,
    publisher: EventPublisher,
}

impl SubmissionRepository {
    /// Creates a new submission repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, publisher: EventPublisher) -> Self {
        Self { db, publisher }
    }

    /// Records a new application in PENDING, stage NEW, tier BRONZE.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` if the role may not create submissions,
    /// `Validation` if the barangay name is blank.
    pub async fn create(
        &self,
        input: CreateSubmissionInput,
        actor: &Actor,
    ) -> Result<submissions::Model, WorkflowError> {
        PermissionMatrix::authorize(&actor.role, EntityKind::Submission, Transition::Create)?;
        let barangay_name = required_text("barangay_name", &input.barangay_name)?;
        self.insert(barangay_name, input.moa, input.agreement_expires_on, None, actor)
            .await
    }

    /// Files a fresh application linked to a rejected one.
    ///
    /// The rejected record is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `NotRejected` if the prior submission is not REJECTED.
    pub async fn reapply(
        &self,
        prior_id: Uuid,
        moa: Option<DocumentRef>,
        actor: &Actor,
    ) -> Result<submissions::Model, WorkflowError> {
        let prior = self.get(prior_id).await?;
        let status = parse_stored(EntityKind::Submission, &prior.status, SubmissionStatus::parse)?;
        SubmissionWorkflow::reapply(status, actor)
            .inspect_err(|e| log_refused(EntityKind::Submission, prior_id, Transition::Reapply, e))?;

        let moa = moa.or_else(|| match (prior.moa_path, prior.moa_name) {
            (Some(path), Some(name)) => Some(DocumentRef { path, name }),
            _ => None,
        });
        self.insert(prior.barangay_name, moa, None, Some(prior_id), actor)
            .await
    }

    async fn insert(
        &self,
        barangay_name: String,
        moa: Option<DocumentRef>,
        agreement_expires_on: Option<NaiveDate>,
        previous_submission_id: Option<Uuid>,
        actor: &Actor,
    ) -> Result<submissions::Model, WorkflowError> {
        let now = Utc::now().into();
        let (moa_path, moa_name) = moa.map_or((None, None), |d| (Some(d.path), Some(d.name)));

        let model = submissions::ActiveModel {
            id: Set(Uuid::new_v4()),
            barangay_name: Set(barangay_name),
            status: Set(SubmissionStatus::Pending.as_str().to_string()),
            stage: Set(Stage::New.as_str().to_string()),
            tier: Set(Tier::Bronze.as_str().to_string()),
            successful_event_count: Set(0),
            moa_path: Set(moa_path),
            moa_name: Set(moa_name),
            agreement_expires_on: Set(agreement_expires_on),
            reviewed_by: Set(None),
            reviewed_at: Set(None),
            approved_by: Set(None),
            approved_at: Set(None),
            rejected_by: Set(None),
            rejected_at: Set(None),
            rejection_reason: Set(None),
            renewed_by: Set(None),
            renewed_at: Set(None),
            tier_updated_at: Set(None),
            admin_notes: Set(None),
            previous_submission_id: Set(previous_submission_id),
            created_by: Set(actor.user_id),
            version: Set(1),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(db_err)?;

        info!(
            entity_kind = "submission",
            entity_id = %model.id,
            actor = %actor.role,
            reapply_of = ?previous_submission_id,
            "submission created"
        );
        self.publisher
            .publish(DomainEvent::now(EntityKind::Submission, model.id, &model.status));
        Ok(model)
    }

    /// Finds a submission by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such submission exists.
    pub async fn get(&self, id: Uuid) -> Result<submissions::Model, WorkflowError> {
        submissions::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(WorkflowError::NotFound {
                kind: EntityKind::Submission,
                id,
            })
    }

    /// Lists submissions, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(
        &self,
        status: Option<SubmissionStatus>,
    ) -> Result<Vec<submissions::Model>, WorkflowError> {
        let mut query = submissions::Entity::find();
        if let Some(status) = status {
            query = query.filter(submissions::Column::Status.eq(status.as_str()));
        }
        query
            .order_by_desc(submissions::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Applies a transition to a submission.
    ///
    /// # Errors
    ///
    /// Any workflow failure, or `StateConflict` if the submission changed
    /// between read and write.
    pub async fn transition(
        &self,
        id: Uuid,
        request: &TransitionRequest,
    ) -> Result<submissions::Model, WorkflowError> {
        self.transition_with_moa(id, request, None).await
    }

    /// Applies a transition, replacing the MOA reference on renewal.
    ///
    /// # Errors
    ///
    /// Same as [`SubmissionRepository::transition`].
    pub async fn transition_with_moa(
        &self,
        id: Uuid,
        request: &TransitionRequest,
        moa: Option<DocumentRef>,
    ) -> Result<submissions::Model, WorkflowError> {
        let snapshot = self.get(id).await?;
        let status =
            parse_stored(EntityKind::Submission, &snapshot.status, SubmissionStatus::parse)?;
        let outcome = SubmissionWorkflow::apply(status, request)
            .inspect_err(|e| log_refused(EntityKind::Submission, id, request.transition, e))?;
        self.commit(&snapshot, &outcome, moa).await
    }

    /// Commits a validated outcome against the snapshot it was validated on.
    ///
    /// # Errors
    ///
    /// Returns `StateConflict` if the row no longer matches the snapshot's
    /// status and version.
    pub async fn commit_transition(
        &self,
        snapshot: &submissions::Model,
        outcome: &TransitionOutcome<SubmissionStatus>,
    ) -> Result<submissions::Model, WorkflowError> {
        self.commit(snapshot, outcome, None).await
    }

    async fn commit(
        &self,
        snapshot: &submissions::Model,
        outcome: &TransitionOutcome<SubmissionStatus>,
        moa: Option<DocumentRef>,
    ) -> Result<submissions::Model, WorkflowError> {
        let at = outcome.at.into();
        let actor = Some(outcome.actor.user_id);

        let mut active = submissions::ActiveModel {
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
            Transition::Renew => {
                active.renewed_by = Set(actor);
                active.renewed_at = Set(Some(at));
                active.stage = Set(Stage::Renewal.as_str().to_string());
                active.agreement_expires_on = Set(outcome.agreement_expires_on);
                if let Some(moa) = moa {
                    active.moa_path = Set(Some(moa.path));
                    active.moa_name = Set(Some(moa.name));
                }
            }
            _ => {}
        }

        if let Some(note) = &outcome.admin_notes {
            active.admin_notes = Set(Some(AdminNotes::join(
                snapshot.admin_notes.as_deref(),
                &AdminNotes::line(&outcome.actor, outcome.at, note),
            )));
        }

        let result = submissions::Entity::update_many()
            .set(active)
            .filter(submissions::Column::Id.eq(snapshot.id))
            .filter(submissions::Column::Status.eq(outcome.from.as_str()))
            .filter(submissions::Column::Version.eq(snapshot.version))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            let err = WorkflowError::StateConflict {
                kind: EntityKind::Submission,
                id: snapshot.id,
            };
            log_refused(EntityKind::Submission, snapshot.id, outcome.transition, &err);
            return Err(err);
        }

        info!(
            entity_kind = "submission",
            entity_id = %snapshot.id,
            transition = %outcome.transition,
            actor = %outcome.actor.role,
            from = %outcome.from,
            to = %outcome.to,
            "transition committed"
        );
        self.publisher.publish(DomainEvent::now(
            EntityKind::Submission,
            snapshot.id,
            outcome.to.as_str(),
        ));

        self.get(snapshot.id).await
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
    ) -> Result<submissions::Model, WorkflowError> {
        let snapshot = self.get(id).await?;
        let notes = AdminNotes::append(
            EntityKind::Submission,
            actor,
            snapshot.admin_notes.as_deref(),
            note,
            Utc::now(),
        )
        .inspect_err(|e| log_refused(EntityKind::Submission, id, Transition::AnnotateNotes, e))?;

        let result = submissions::Entity::update_many()
            .set(submissions::ActiveModel {
                admin_notes: Set(Some(notes)),
                version: Set(snapshot.version + 1),
                updated_at: Set(Utc::now().into()),
                ..Default::default()
            })
            .filter(submissions::Column::Id.eq(id))
            .filter(submissions::Column::Version.eq(snapshot.version))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(WorkflowError::StateConflict {
                kind: EntityKind::Submission,
                id,
            });
        }
        self.get(id).await
    }

    /// Administrative delete. Removes the submission and, by cascade, its
    /// events and reports.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` unless the role is super-admin, `NotFound` if
    /// nothing was deleted.
    pub async fn delete(&self, id: Uuid, actor: &Actor) -> Result<(), WorkflowError> {
        PermissionMatrix::authorize(&actor.role, EntityKind::Submission, Transition::Delete)
            .inspect_err(|e| log_refused(EntityKind::Submission, id, Transition::Delete, e))?;

        let result = submissions::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(WorkflowError::NotFound {
                kind: EntityKind::Submission,
                id,
            });
        }

        warn!(
            entity_kind = "submission",
            entity_id = %id,
            actor = %actor.role,
            user_id = %actor.user_id,
            "submission deleted by administrator"
        );
        self.publisher
            .publish(DomainEvent::now(EntityKind::Submission, id, "deleted"));
        Ok(())
    }

    /// Moves partnerships along as their agreements near or pass expiry.
    ///
    /// Runs as the `system` actor. Submissions that lose a race with a
    /// concurrent request are skipped and picked up on the next sweep.
    ///
    /// # Arguments
    /// * `today` - The scheduler's date
    /// * `review_window_days` - Days before expiry that trigger UNDER_REVIEW
    ///
    /// # Returns
    /// The submissions that changed status.
    ///
    /// # Errors
    ///
    /// Returns an error if loading candidates fails.
    pub async fn sweep_agreements(
        &self,
        today: NaiveDate,
        review_window_days: u32,
    ) -> Result<Vec<submissions::Model>, WorkflowError> {
        let candidates = submissions::Entity::find()
            .filter(submissions::Column::Status.is_in([
                SubmissionStatus::Approved.as_str(),
                SubmissionStatus::UnderReview.as_str(),
            ]))
            .filter(submissions::Column::AgreementExpiresOn.is_not_null())
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let system = Actor::system();
        let mut changed = Vec::new();

        for snapshot in candidates {
            let status =
                parse_stored(EntityKind::Submission, &snapshot.status, SubmissionStatus::parse)?;
            let Some(transition) = SubmissionWorkflow::expiry_transition(
                status,
                snapshot.agreement_expires_on,
                today,
                review_window_days,
            ) else {
                continue;
            };

            let request = TransitionRequest::new(transition, system.clone());
            let outcome = SubmissionWorkflow::apply(status, &request)?;
            match self.commit(&snapshot, &outcome, None).await {
                Ok(model) => changed.push(model),
                Err(WorkflowError::StateConflict { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        info!(changed = changed.len(), %today, "agreement sweep finished");
        Ok(changed)
    }
}
