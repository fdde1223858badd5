//! `SeaORM` Entity for reports table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub event_id: Uuid,
    pub status: String,
    pub cash_allocation: Decimal,
    pub in_kind_expenditure: Decimal,
    pub total_cost: Decimal,
    pub report_file_path: Option<String>,
    pub report_file_name: Option<String>,
    pub submitted_by: Option<Uuid>,
    pub submitted_at: Option<DateTimeWithTimeZone>,
    pub pre_approved_by: Option<Uuid>,
    pub pre_approved_at: Option<DateTimeWithTimeZone>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTimeWithTimeZone>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTimeWithTimeZone>,
    pub returned_by: Option<Uuid>,
    pub returned_at: Option<DateTimeWithTimeZone>,
    pub returned_reason: Option<String>,
    pub first_clearance_status: String,
    pub first_cleared_by: Option<Uuid>,
    pub first_cleared_at: Option<DateTimeWithTimeZone>,
    pub final_clearance_status: String,
    pub final_cleared_by: Option<Uuid>,
    pub final_cleared_at: Option<DateTimeWithTimeZone>,
    pub admin_notes: Option<String>,
    pub created_by: Uuid,
    pub version: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::events::Entity",
        from = "Column::EventId",
        to = "super::events::Column::Id",
        on_delete = "Cascade"
    )]
    Events,
}

impl Related<super::events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
