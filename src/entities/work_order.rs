use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Live work-order row; always the latest revision.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "work_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
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
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::end_client::Entity",
        from = "Column::EndClientId",
        to = "super::end_client::Column::Id"
    )]
    EndClient,
    #[sea_orm(has_many = "super::work_order_material::Entity")]
    Materials,
    #[sea_orm(has_many = "super::work_order_attachment::Entity")]
    Attachments,
    #[sea_orm(has_many = "super::work_order_revision::Entity")]
    Revisions,
    #[sea_orm(has_many = "super::invoice::Entity")]
    Invoices,
}

impl Related<super::end_client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EndClient.def()
    }
}

impl Related<super::work_order_material::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Materials.def()
    }
}

impl Related<super::work_order_attachment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl Related<super::work_order_revision::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Revisions.def()
    }
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
