use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "work_order_attachment_revisions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub work_order_revision_id: i32,
    pub work_order_id: i32,
    pub file_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::work_order_revision::Entity",
        from = "Column::WorkOrderRevisionId",
        to = "super::work_order_revision::Column::Id"
    )]
    Revision,
}

impl Related<super::work_order_revision::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Revision.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
