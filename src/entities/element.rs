use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::ElementStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "elements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub project_id: i32,
    pub element_type_id: i32,
    pub name: String,
    pub status: ElementStatus,
    /// Soft delete; disabled elements are hidden from every read path
    pub disable: bool,
    /// Floor (a `precast` node) the element is destined for
    #[sea_orm(nullable)]
    pub target_location: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::element_type::Entity",
        from = "Column::ElementTypeId",
        to = "super::element_type::Column::Id"
    )]
    ElementType,
    #[sea_orm(has_one = "super::precast_stock::Entity")]
    PrecastStock,
}

impl Related<super::element_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ElementType.def()
    }
}

impl Related<super::precast_stock::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PrecastStock.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
