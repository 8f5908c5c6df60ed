use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "work_order_materials")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub work_order_id: i32,
    pub item_name: String,
    pub hsn_code: String,
    pub unit_rate: Decimal,
    pub volume: Decimal,
    /// Running total consumed by invoices
    pub volume_used: Decimal,
    /// Percentage
    pub tax: Decimal,
    #[sea_orm(nullable)]
    pub tower_id: Option<i32>,
    /// JSON array of floor ids
    #[sea_orm(column_type = "Json")]
    pub floor_ids: Json,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn balance(&self) -> Decimal {
        self.volume - self.volume_used
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::work_order::Entity",
        from = "Column::WorkOrderId",
        to = "super::work_order::Column::Id"
    )]
    WorkOrder,
}

impl Related<super::work_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkOrder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
