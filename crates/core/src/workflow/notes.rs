//! Append-only admin notes.
//!
//! Notes are a free-form text column shared by all three entity kinds.
//! Each annotation becomes one line stamped with its time and the author's
//! role; earlier lines are never rewritten.

use chrono::{DateTime, Utc};

use crate::workflow::error::WorkflowError;
use crate::workflow::permissions::PermissionMatrix;
use crate::workflow::types::{Actor, EntityKind, Transition};

/// Upper bound on a single annotation.
pub const MAX_NOTE_LEN: usize = 2000;

/// Stateless helper for admin notes.
pub struct AdminNotes;

impl AdminNotes {
    /// Format one note line.
    #[must_use]
    pub fn line(actor: &Actor, at: DateTime<Utc>, note: &str) -> String {
        format!("[{} {}] {}", at.format("%Y-%m-%d %H:%M"), actor.role, note)
    }

    /// Join a formatted line onto the existing notes text.
    ///
    /// Trailing whitespace on the existing text is dropped; blank text
    /// counts as no notes.
    #[must_use]
    pub fn join(existing: Option<&str>, line: &str) -> String {
        match existing.map(str::trim_end).filter(|s| !s.is_empty()) {
            Some(prev) => format!("{prev}\n{line}"),
            None => line.to_string(),
        }
    }

    /// Append a note to the existing text.
    ///
    /// # Arguments
    /// * `kind` - Entity kind being annotated
    /// * `actor` - Author of the note
    /// * `existing` - Current notes, if any
    /// * `note` - The new note
    /// * `at` - Timestamp for the new line
    ///
    /// # Returns
    /// The full notes text to store.
    pub fn append(
        kind: EntityKind,
        actor: &Actor,
        existing: Option<&str>,
        note: &str,
        at: DateTime<Utc>,
    ) -> Result<String, WorkflowError> {
        PermissionMatrix::authorize(&actor.role, kind, Transition::AnnotateNotes)?;

        let note = note.trim();
        if note.is_empty() {
            return Err(WorkflowError::Validation("note must not be empty".to_string()));
        }
        if note.chars().count() > MAX_NOTE_LEN {
            return Err(WorkflowError::Validation(format!(
                "note must be at most {MAX_NOTE_LEN} characters"
            )));
        }

        Ok(Self::join(existing, &Self::line(actor, at, note)))
    }
}
