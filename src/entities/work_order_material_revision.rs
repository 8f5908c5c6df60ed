use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "work_order_material_revisions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub work_order_revision_id: i32,
    pub work_order_id: i32,
    /// Id the material had in the live table when snapshotted
    pub material_id: i32,
    pub item_name: String,
    pub hsn_code: String,
    pub unit_rate: Decimal,
    pub volume: Decimal,
    pub volume_used: Decimal,
    pub tax: Decimal,
    #[sea_orm(nullable)]
    pub tower_id: Option<i32>,
    #[sea_orm(column_type = "Json")]
    pub floor_ids: Json,
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
