use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::{DispatchStatus, TrackingLocation};

/// Append-only trail of a dispatch order.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dispatch_tracking_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub dispatch_order_id: i32,
    pub status: DispatchStatus,
    pub location: TrackingLocation,
    pub remarks: String,
    pub status_timestamp: DateTime<Utc>,
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
