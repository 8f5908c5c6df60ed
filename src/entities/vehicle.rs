use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vehicles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub vehicle_number: String,
    pub driver_name: String,
    pub driver_phone: String,
    #[sea_orm(nullable)]
    pub emergency_contact: Option<String>,
    /// Payload capacity in tonnes
    #[sea_orm(nullable)]
    pub capacity: Option<f64>,
    #[sea_orm(nullable)]
    pub transporter_id: Option<i32>,
    #[sea_orm(nullable)]
    pub truck_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::dispatch_order::Entity")]
    DispatchOrders,
}

impl Related<super::dispatch_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DispatchOrders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
