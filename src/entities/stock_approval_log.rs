use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per stockyard receipt.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_approval_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub precast_stock_id: i32,
    pub element_id: i32,
    pub project_id: i32,
    pub status: String,
    pub acted_by: i32,
    #[sea_orm(nullable)]
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
