use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::ErectionLogStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_erected_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub stock_erected_id: i32,
    pub element_id: i32,
    pub status: ErectionLogStatus,
    pub acted_by: i32,
    #[sea_orm(nullable)]
    pub comments: Option<String>,
    pub action_timestamp: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::stock_erected::Entity",
        from = "Column::StockErectedId",
        to = "super::stock_erected::Column::Id"
    )]
    StockErected,
}

impl Related<super::stock_erected::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockErected.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
