use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::Dimensions;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "element_types")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub project_id: i32,
    /// Short code, e.g. "WP-01"
    pub element_type: String,
    pub element_type_name: String,
    pub thickness_mm: f64,
    pub length_mm: f64,
    pub height_mm: f64,
    /// kg/m³
    pub density: f64,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.thickness_mm, self.length_mm, self.height_mm)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::element::Entity")]
    Elements,
}

impl Related<super::element::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Elements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
