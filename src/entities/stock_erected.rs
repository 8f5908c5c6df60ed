use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::ApprovalState;

/// One element's erection request.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_erected")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub precast_stock_id: i32,
    pub element_id: i32,
    pub project_id: i32,
    pub order_at: DateTime<Utc>,
    /// NULL while pending, then true (approved) or false (rejected)
    #[sea_orm(nullable)]
    pub approved_status: Option<bool>,
    pub received_in_erection: bool,
    pub erected: bool,
    #[sea_orm(nullable)]
    pub action_approve_or_reject: Option<DateTime<Utc>>,
    #[sea_orm(nullable)]
    pub comments: Option<String>,
    pub requested_by: i32,
}

impl Model {
    pub fn approval(&self) -> ApprovalState {
        ApprovalState::from(self.approved_status)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::precast_stock::Entity",
        from = "Column::PrecastStockId",
        to = "super::precast_stock::Column::Id"
    )]
    PrecastStock,
    #[sea_orm(has_many = "super::stock_erected_log::Entity")]
    Logs,
}

impl Related<super::precast_stock::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PrecastStock.def()
    }
}

impl Related<super::stock_erected_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Logs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
