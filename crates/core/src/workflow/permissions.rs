//! Role-permission matrix.
//!
//! One declarative table keyed by (role, entity kind) lists every transition
//! a role may request. The engine, the HTTP layer and the permissions
//! endpoint all consult this table, so what the UI offers and what the
//! server enforces come from the same data.

use std::collections::BTreeSet;

use crate::workflow::error::WorkflowError;
use crate::workflow::types::{EntityKind, Transition, string_enum};

string_enum! {
    /// Actor classification supplied by the identity provider.
    pub enum Role {
        /// Field partner; drafts and submits reports, views everything.
        AreaAdmin => "area-admin",
        /// First-line reviewer.
        CommunityLead => "community-lead",
        /// Approver, first clearance, administrative delete.
        SuperAdmin => "super-admin",
        /// Approver and first clearance.
        SuperAdminA => "super-admin-a",
        /// Final clearance only.
        SuperAdminB => "super-admin-b",
        /// External scheduler driving agreement expiry.
        System => "system",
    }
}

/// One row of the matrix.
struct Grant {
    role: Role,
    kind: EntityKind,
    transitions: &'static [Transition],
}

use EntityKind::{Event, Report, Submission};
use Transition::{
    AnnotateNotes, Approve, Cancel, Clear, Complete, Create, Delete, EditFinancials,
    FinalClearance, FirstClearance, MarkForRenewal, MarkUnderReview, PreApprove, Reapply, Reject,
    Renew, Review, Submit,
};

const MATRIX: &[Grant] = &[
    // area-admin: read-mostly, never approves, rejects or clears
    Grant {
        role: Role::AreaAdmin,
        kind: Submission,
        transitions: &[Create, Reapply],
    },
    Grant {
        role: Role::AreaAdmin,
        kind: Event,
        transitions: &[Create],
    },
    Grant {
        role: Role::AreaAdmin,
        kind: Report,
        transitions: &[Create, Submit, EditFinancials],
    },
    // community-lead
    Grant {
        role: Role::CommunityLead,
        kind: Submission,
        transitions: &[PreApprove, Reject, AnnotateNotes],
    },
    Grant {
        role: Role::CommunityLead,
        kind: Event,
        transitions: &[Create, PreApprove, Reject, Complete, AnnotateNotes],
    },
    Grant {
        role: Role::CommunityLead,
        kind: Report,
        transitions: &[PreApprove, Reject, AnnotateNotes],
    },
    // super-admin
    Grant {
        role: Role::SuperAdmin,
        kind: Submission,
        transitions: &[Create, Approve, Reject, Renew, Reapply, AnnotateNotes, Delete],
    },
    Grant {
        role: Role::SuperAdmin,
        kind: Event,
        transitions: &[Create, Approve, Reject, Complete, Cancel, AnnotateNotes],
    },
    Grant {
        role: Role::SuperAdmin,
        kind: Report,
        transitions: &[
            Create,
            EditFinancials,
            Review,
            Approve,
            Reject,
            FirstClearance,
            AnnotateNotes,
        ],
    },
    // super-admin-a
    Grant {
        role: Role::SuperAdminA,
        kind: Submission,
        transitions: &[Create, Approve, Reject, Renew, Reapply, AnnotateNotes],
    },
    Grant {
        role: Role::SuperAdminA,
        kind: Event,
        transitions: &[Create, Approve, Reject, Complete, Cancel, AnnotateNotes],
    },
    Grant {
        role: Role::SuperAdminA,
        kind: Report,
        transitions: &[
            Create,
            EditFinancials,
            Review,
            Approve,
            Reject,
            FirstClearance,
            AnnotateNotes,
        ],
    },
    // super-admin-b
    Grant {
        role: Role::SuperAdminB,
        kind: Submission,
        transitions: &[AnnotateNotes],
    },
    Grant {
        role: Role::SuperAdminB,
        kind: Event,
        transitions: &[Clear, AnnotateNotes],
    },
    Grant {
        role: Role::SuperAdminB,
        kind: Report,
        transitions: &[FinalClearance, AnnotateNotes],
    },
    // scheduler
    Grant {
        role: Role::System,
        kind: Submission,
        transitions: &[MarkUnderReview, MarkForRenewal],
    },
    Grant {
        role: Role::System,
        kind: Event,
        transitions: &[Clear],
    },
];

/// Stateless lookup over the role-permission matrix.
pub struct PermissionMatrix;

impl PermissionMatrix {
    /// Transitions granted to a known role on an entity kind.
    #[must_use]
    pub fn grants(role: Role, kind: EntityKind) -> &'static [Transition] {
        MATRIX
            .iter()
            .find(|g| g.role == role && g.kind == kind)
            .map_or(&[], |g| g.transitions)
    }

    /// Set of transitions a role slug may execute on an entity kind.
    ///
    /// Unknown role slugs get the empty set.
    #[must_use]
    pub fn allowed_transitions(role_slug: &str, kind: EntityKind) -> BTreeSet<Transition> {
        Role::parse(role_slug)
            .map(|role| Self::grants(role, kind).iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns true if the role slug may execute the transition.
    #[must_use]
    pub fn is_allowed(role_slug: &str, kind: EntityKind, transition: Transition) -> bool {
        Role::parse(role_slug).is_some_and(|role| Self::grants(role, kind).contains(&transition))
    }

    /// Checks a role slug against the matrix.
    ///
    /// # Returns
    /// * `Ok(())` if the transition is granted
    /// * `Err(WorkflowError::Forbidden)` otherwise
    pub fn authorize(
        role_slug: &str,
        kind: EntityKind,
        transition: Transition,
    ) -> Result<(), WorkflowError> {
        if Self::is_allowed(role_slug, kind, transition) {
            Ok(())
        } else {
            Err(WorkflowError::Forbidden {
                role: role_slug.to_string(),
                kind,
                transition,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("area-admin"), Some(Role::AreaAdmin));
        assert_eq!(Role::parse("SUPER-ADMIN-B"), Some(Role::SuperAdminB));
        assert_eq!(Role::parse("owner"), None);
    }

    #[test]
    fn test_unknown_role_gets_empty_set() {
        for kind in EntityKind::ALL {
            assert!(PermissionMatrix::allowed_transitions("janitor", *kind).is_empty());
            assert!(PermissionMatrix::allowed_transitions("", *kind).is_empty());
        }
    }

    #[test]
    fn test_every_role_has_a_row_per_kind_or_none() {
        for grant in MATRIX {
            let dupes = MATRIX
                .iter()
                .filter(|g| g.role == grant.role && g.kind == grant.kind)
                .count();
            assert_eq!(dupes, 1, "duplicate row for {} {}", grant.role, grant.kind);
        }
    }

    #[rstest]
    #[case("community-lead", EntityKind::Submission, Transition::PreApprove, true)]
    #[case("community-lead", EntityKind::Event, Transition::PreApprove, true)]
    #[case("community-lead", EntityKind::Report, Transition::PreApprove, true)]
    #[case("community-lead", EntityKind::Submission, Transition::Approve, false)]
    #[case("super-admin", EntityKind::Submission, Transition::Approve, true)]
    #[case("super-admin-a", EntityKind::Event, Transition::Approve, true)]
    #[case("super-admin-a", EntityKind::Report, Transition::Review, true)]
    #[case("super-admin", EntityKind::Report, Transition::FirstClearance, true)]
    #[case("super-admin", EntityKind::Report, Transition::FinalClearance, false)]
    #[case("super-admin-a", EntityKind::Report, Transition::FinalClearance, false)]
    #[case("super-admin-b", EntityKind::Report, Transition::FinalClearance, true)]
    #[case("super-admin-b", EntityKind::Report, Transition::FirstClearance, false)]
    #[case("super-admin-b", EntityKind::Submission, Transition::Approve, false)]
    #[case("area-admin", EntityKind::Report, Transition::Submit, true)]
    #[case("area-admin", EntityKind::Report, Transition::EditFinancials, true)]
    #[case("area-admin", EntityKind::Submission, Transition::PreApprove, false)]
    #[case("area-admin", EntityKind::Report, Transition::Approve, false)]
    #[case("system", EntityKind::Submission, Transition::MarkForRenewal, true)]
    #[case("system", EntityKind::Submission, Transition::Approve, false)]
    #[case("super-admin-a", EntityKind::Submission, Transition::Delete, false)]
    fn test_matrix_entries(
        #[case] role: &str,
        #[case] kind: EntityKind,
        #[case] transition: Transition,
        #[case] expected: bool,
    ) {
        assert_eq!(PermissionMatrix::is_allowed(role, kind, transition), expected);
    }

    #[test]
    fn test_area_admin_never_approves_rejects_or_clears() {
        let forbidden = [
            Transition::PreApprove,
            Transition::Approve,
            Transition::Reject,
            Transition::Review,
            Transition::FirstClearance,
            Transition::FinalClearance,
            Transition::Clear,
        ];
        for kind in EntityKind::ALL {
            let allowed = PermissionMatrix::allowed_transitions("area-admin", *kind);
            for t in forbidden {
                assert!(!allowed.contains(&t), "area-admin has {t} on {kind}");
            }
        }
    }

    #[test]
    fn test_authorize_returns_forbidden() {
        let result =
            PermissionMatrix::authorize("area-admin", EntityKind::Submission, Transition::PreApprove);
        assert!(matches!(
            result,
            Err(WorkflowError::Forbidden { ref role, .. }) if role == "area-admin"
        ));
        assert!(
            PermissionMatrix::authorize(
                "community-lead",
                EntityKind::Submission,
                Transition::PreApprove
            )
            .is_ok()
        );
    }
}
