//! `SeaORM` entity definitions.
//!
//! Status, stage and tier columns are plain strings holding the wire names
//! of the core enums. Every row carries a `version` used for compare-and-swap.

pub mod events;
pub mod reports;
pub mod submissions;

pub mod prelude {
    //! Entity re-exports.
    pub use super::events::Entity as Events;
    pub use super::reports::Entity as Reports;
    pub use super::submissions::Entity as Submissions;
}
