use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::DispatchStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dispatch_details")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub dispatch_order_id: i32,
    pub vehicle_id: i32,
    pub driver_name: String,
    pub current_status: DispatchStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::dispatch_order::Entity",
        from = "Column::DispatchOrderId",
        to = "super::dispatch_order::Column::Id"
    )]
    DispatchOrder,
}

impl Related<super::dispatch_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DispatchOrder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
