use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Human-facing status mirrored onto the `elements` row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ElementStatus {
    #[sea_orm(string_value = "Planned")]
    #[serde(rename = "Planned")]
    Planned,
    #[sea_orm(string_value = "In Production")]
    #[serde(rename = "In Production")]
    InProduction,
    #[sea_orm(string_value = "In Stockyard")]
    #[serde(rename = "In Stockyard")]
    InStockyard,
    #[sea_orm(string_value = "Dispatch")]
    #[serde(rename = "Dispatch")]
    Dispatch,
    #[sea_orm(string_value = "In Erection")]
    #[serde(rename = "In Erection")]
    InErection,
    #[sea_orm(string_value = "Erected")]
    #[serde(rename = "Erected")]
    Erected,
}
