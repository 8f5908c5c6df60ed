use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Status of a stock-erected log row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ErectionLogStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Approved")]
    Approved,
    #[sea_orm(string_value = "Rejected")]
    Rejected,
    #[sea_orm(string_value = "Received")]
    Received,
    #[sea_orm(string_value = "Erected")]
    Erected,
}

/// Decision state of an erection request, read from its nullable
/// `approved_status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalState {
    Pending,
    Approved,
    Rejected,
}

impl From<Option<bool>> for ApprovalState {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => ApprovalState::Pending,
            Some(true) => ApprovalState::Approved,
            Some(false) => ApprovalState::Rejected,
        }
    }
}
