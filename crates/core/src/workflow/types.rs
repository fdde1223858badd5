//! Workflow domain types shared by the submission, event and report lifecycles.
//!
//! Every status, role and transition name is a string-backed enum so the
//! same spelling is used on the wire, in the database and in log fields.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a string-backed enum with `as_str`, case-insensitive `parse`,
/// `Display`, and serde keyed by the same strings.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant, )+
        }

        impl $name {
            /// All variants in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Returns the string representation.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }

            /// Parses a value from its string representation (case-insensitive).
            pub fn parse(s: &str) -> Option<Self> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use string_enum;

string_enum! {
    /// The three workflow-governed entity kinds.
    pub enum EntityKind {
        /// Community partnership application.
        Submission => "submission",
        /// Activity proposed under an approved partnership.
        Event => "event",
        /// Post-event accounting document.
        Report => "report",
    }
}

string_enum! {
    /// Named operations an actor can request against an entity.
    ///
    /// Most of these move an entity along its status graph. `Create`,
    /// `EditFinancials`, `AnnotateNotes` and `Delete` leave the status alone
    /// but are still gated by the permission matrix.
    pub enum Transition {
        /// Intake of a new entity.
        Create => "create",
        /// First-line review gate.
        PreApprove => "pre-approve",
        /// Final admin approval.
        Approve => "approve",
        /// Reject (or, for reports, return to draft) with a reason.
        Reject => "reject",
        /// Report review after pre-approval.
        Review => "review",
        /// Hand a draft report in.
        Submit => "submit",
        /// Mark an approved event as held.
        Complete => "complete",
        /// Call off an event before it is held.
        Cancel => "cancel",
        /// Close out a completed event once its report is final-cleared.
        Clear => "clear",
        /// First financial sign-off on an approved report.
        FirstClearance => "first-clearance",
        /// Final financial sign-off on an approved report.
        FinalClearance => "final-clearance",
        /// Scheduler: agreement expiry is approaching.
        MarkUnderReview => "mark-under-review",
        /// Scheduler: agreement has expired.
        MarkForRenewal => "mark-for-renewal",
        /// Renew an agreement and re-stamp its expiry date.
        Renew => "renew",
        /// File a fresh application linked to a rejected one.
        Reapply => "reapply",
        /// Change report financial fields or file.
        EditFinancials => "edit-financials",
        /// Append to the free-form admin notes.
        AnnotateNotes => "annotate-notes",
        /// Administrative removal.
        Delete => "delete",
    }
}

string_enum! {
    /// Partnership submission status.
    ///
    /// Valid transitions:
    /// - PENDING → PRE_APPROVED (pre-approve) | REJECTED (reject)
    /// - PRE_APPROVED → APPROVED (approve) | REJECTED (reject)
    /// - APPROVED → UNDER_REVIEW | RENEW (scheduler)
    /// - UNDER_REVIEW → RENEW (scheduler) | APPROVED (renew)
    /// - RENEW → APPROVED (renew)
    pub enum SubmissionStatus {
        /// Awaiting first-line review.
        Pending => "PENDING",
        /// Passed first-line review, awaiting admin approval.
        PreApproved => "PRE_APPROVED",
        /// Active partnership.
        Approved => "APPROVED",
        /// Turned down (absorbing).
        Rejected => "REJECTED",
        /// Agreement expiry approaching.
        UnderReview => "UNDER_REVIEW",
        /// Agreement expired, awaiting renewal.
        Renew => "RENEW",
    }
}

impl SubmissionStatus {
    /// Returns true if no transition leaves this status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected)
    }
}

string_enum! {
    /// Event status.
    pub enum EventStatus {
        /// Awaiting first-line review.
        Pending => "PENDING",
        /// Passed first-line review.
        PreApproved => "PRE_APPROVED",
        /// Cleared to be held.
        Approved => "APPROVED",
        /// Turned down (terminal).
        Rejected => "REJECTED",
        /// Held; success flag recorded.
        Completed => "COMPLETED",
        /// Called off (terminal).
        Cancelled => "CANCELLED",
        /// Report final-cleared (terminal).
        Cleared => "CLEARED",
    }
}

impl EventStatus {
    /// Returns true if no transition leaves this status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Cancelled | Self::Cleared)
    }
}

string_enum! {
    /// Report primary status.
    pub enum ReportStatus {
        /// Being prepared; the only editable status.
        Draft => "DRAFT",
        /// Handed in for review.
        Submitted => "SUBMITTED",
        /// Passed first-line review.
        PreApproved => "PRE_APPROVED",
        /// Reviewed by an admin.
        Reviewed => "REVIEWED",
        /// Approved; clearance may begin.
        Approved => "APPROVED",
    }
}

string_enum! {
    /// Status of one clearance sub-flow on a report.
    pub enum ClearanceStatus {
        /// Not yet signed off.
        Pending => "PENDING",
        /// Signed off.
        Cleared => "CLEARED",
    }
}

string_enum! {
    /// Whether a submission is a first-time or renewal application.
    pub enum Stage {
        /// First-time application.
        New => "NEW",
        /// Renewal of a lapsed agreement.
        Renewal => "RENEWAL",
    }
}

/// Reference to a document held by the external file store.
///
/// Only the reference is persisted; bytes never pass through the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Storage path returned by the file store.
    pub path: String,
    /// Original file name.
    pub name: String,
}

/// The identity performing a request, as supplied by the session provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// User identifier.
    pub user_id: Uuid,
    /// Role slug (e.g. `community-lead`).
    pub role: String,
}

impl Actor {
    /// Role slug used by the external expiry scheduler.
    pub const SYSTEM_ROLE: &'static str = "system";

    /// Creates a new actor.
    #[must_use]
    pub fn new(user_id: Uuid, role: impl Into<String>) -> Self {
        Self {
            user_id,
            role: role.into(),
        }
    }

    /// The scheduler identity (nil user id, `system` role).
    #[must_use]
    pub fn system() -> Self {
        Self::new(Uuid::nil(), Self::SYSTEM_ROLE)
    }
}

/// Optional request payload accompanying a transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionPayload {
    /// Note appended to the entity's admin notes on commit.
    pub admin_notes: Option<String>,
    /// Reason, required by reject edges.
    pub rejection_reason: Option<String>,
    /// Outcome of a held event, required by the complete edge.
    pub success: Option<bool>,
    /// New agreement expiry, required by the renew edge.
    pub agreement_expires_on: Option<NaiveDate>,
}

/// A request to move an entity along its graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    /// The requested transition.
    pub transition: Transition,
    /// Who is asking.
    pub actor: Actor,
    /// Accompanying data.
    pub payload: TransitionPayload,
}

impl TransitionRequest {
    /// Creates a request with an empty payload.
    #[must_use]
    pub fn new(transition: Transition, actor: Actor) -> Self {
        Self {
            transition,
            actor,
            payload: TransitionPayload::default(),
        }
    }

    /// Sets the rejection reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.payload.rejection_reason = Some(reason.into());
        self
    }

    /// Sets the admin note.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.payload.admin_notes = Some(notes.into());
        self
    }

    /// Sets the event success flag.
    #[must_use]
    pub fn with_success(mut self, success: bool) -> Self {
        self.payload.success = Some(success);
        self
    }

    /// Sets the renewed agreement expiry date.
    #[must_use]
    pub fn with_expiry(mut self, expires_on: NaiveDate) -> Self {
        self.payload.agreement_expires_on = Some(expires_on);
        self
    }
}

/// A validated transition, ready to be committed.
///
/// Carries the edge taken plus the audit data (who, when, why) to stamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome<S> {
    /// Status the entity must still be in when the outcome is committed.
    pub from: S,
    /// Status after the commit.
    pub to: S,
    /// The transition taken.
    pub transition: Transition,
    /// The acting user.
    pub actor: Actor,
    /// When the transition was validated.
    pub at: DateTime<Utc>,
    /// Trimmed rejection reason, present on reject edges.
    pub rejection_reason: Option<String>,
    /// Trimmed admin note, if any.
    pub admin_notes: Option<String>,
    /// Event success flag, present on the complete edge.
    pub success: Option<bool>,
    /// New agreement expiry, present on the renew edge.
    pub agreement_expires_on: Option<NaiveDate>,
}
