use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Frozen copy of a work order as it stood before an update.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "work_order_revisions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub work_order_id: i32,
    pub revision_no: i32,
    pub wo_number: String,
    pub revision: i32,
    pub project_id: i32,
    pub end_client_id: i32,
    pub wo_date: NaiveDate,
    pub wo_validate: NaiveDate,
    pub total_value: Decimal,
    pub contact_person: String,
    pub contact_email: String,
    pub contact_number: String,
    pub billing_address: String,
    pub shipping_address: String,
    #[sea_orm(column_type = "Json")]
    pub payment_term: Json,
    #[sea_orm(column_type = "Json", nullable)]
    pub recurrence_patterns: Option<Json>,
    #[sea_orm(nullable)]
    pub comments: Option<String>,
    pub revised_by: i32,
    pub revised_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::work_order::Entity",
        from = "Column::WorkOrderId",
        to = "super::work_order::Column::Id"
    )]
    WorkOrder,
    #[sea_orm(has_many = "super::work_order_material_revision::Entity")]
    Materials,
    #[sea_orm(has_many = "super::work_order_attachment_revision::Entity")]
    Attachments,
}

impl Related<super::work_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkOrder.def()
    }
}

impl Related<super::work_order_material_revision::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Materials.def()
    }
}

impl Related<super::work_order_attachment_revision::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
