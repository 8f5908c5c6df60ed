use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::{Dimensions, DispositionFlags, LifecycleState};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "precast_stock")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub element_id: i32,
    pub project_id: i32,
    pub element_type_id: i32,
    pub element_type: String,
    #[sea_orm(nullable)]
    pub stockyard_id: Option<i32>,
    #[sea_orm(nullable)]
    pub storage_location: Option<String>,
    pub thickness_mm: f64,
    pub length_mm: f64,
    pub height_mm: f64,
    pub weight: f64,
    #[sea_orm(nullable)]
    pub target_location: Option<i32>,
    pub lifecycle_state: LifecycleState,
    /// Claimed by an erection request
    pub erection_requested: bool,
    #[sea_orm(nullable)]
    pub dispatch_start: Option<DateTime<Utc>>,
    #[sea_orm(nullable)]
    pub dispatch_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.thickness_mm, self.length_mm, self.height_mm)
    }

    pub fn flags(&self) -> DispositionFlags {
        DispositionFlags::derive(self.lifecycle_state, self.erection_requested)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::element::Entity",
        from = "Column::ElementId",
        to = "super::element::Column::Id"
    )]
    Element,
    #[sea_orm(has_many = "super::stock_erected::Entity")]
    StockErected,
}

impl Related<super::element::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Element.def()
    }
}

impl Related<super::stock_erected::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockErected.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
