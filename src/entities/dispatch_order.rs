use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::DispatchStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dispatch_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// `ORD` followed by one to six digits
    #[sea_orm(unique)]
    pub order_number: String,
    pub project_id: i32,
    pub dispatch_date: DateTime<Utc>,
    pub vehicle_id: i32,
    pub dispatched_by: i32,
    #[sea_orm(nullable)]
    pub recipient_id: Option<i32>,
    pub status: DispatchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vehicle::Entity",
        from = "Column::VehicleId",
        to = "super::vehicle::Column::Id"
    )]
    Vehicle,
    #[sea_orm(has_many = "super::dispatch_detail::Entity")]
    Details,
    #[sea_orm(has_many = "super::dispatch_order_item::Entity")]
    Items,
    #[sea_orm(has_many = "super::dispatch_tracking_log::Entity")]
    TrackingLogs,
}

impl Related<super::vehicle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vehicle.def()
    }
}

impl Related<super::dispatch_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Details.def()
    }
}

impl Related<super::dispatch_order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::dispatch_tracking_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrackingLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
