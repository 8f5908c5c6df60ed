use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Status literals shared by dispatch details and tracking logs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum DispatchStatus {
    #[sea_orm(string_value = "Dispatched")]
    #[serde(rename = "Dispatched")]
    Dispatched,
    #[sea_orm(string_value = "In Transit")]
    #[serde(rename = "In Transit")]
    InTransit,
    #[sea_orm(string_value = "Accepted")]
    #[serde(rename = "Accepted")]
    Accepted,
    #[sea_orm(string_value = "Received")]
    #[serde(rename = "Received")]
    Received,
}

impl DispatchStatus {
    /// Orders move Dispatched -> In Transit -> Accepted and never back.
    pub fn can_advance_to(self, next: DispatchStatus) -> bool {
        matches!(
            (self, next),
            (DispatchStatus::Dispatched, DispatchStatus::InTransit)
                | (DispatchStatus::Dispatched, DispatchStatus::Accepted)
                | (DispatchStatus::InTransit, DispatchStatus::Accepted)
        )
    }

    pub fn is_open(self) -> bool {
        matches!(self, DispatchStatus::Dispatched | DispatchStatus::InTransit)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DispatchStatus::Dispatched => "Dispatched",
            DispatchStatus::InTransit => "In Transit",
            DispatchStatus::Accepted => "Accepted",
            DispatchStatus::Received => "Received",
        }
    }
}

/// Where a tracking event happened.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(40))")]
pub enum TrackingLocation {
    #[sea_orm(string_value = "Stockyard")]
    #[serde(rename = "Stockyard")]
    Stockyard,
    #[sea_orm(string_value = "Truck")]
    #[serde(rename = "Truck")]
    Truck,
    #[sea_orm(string_value = "Received in Erection Site")]
    #[serde(rename = "Received in Erection Site")]
    ErectionSite,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_is_monotonic() {
        assert!(DispatchStatus::Dispatched.can_advance_to(DispatchStatus::InTransit));
        assert!(DispatchStatus::InTransit.can_advance_to(DispatchStatus::Accepted));
        assert!(!DispatchStatus::Accepted.can_advance_to(DispatchStatus::InTransit));
        assert!(!DispatchStatus::InTransit.can_advance_to(DispatchStatus::Dispatched));
        assert!(!DispatchStatus::Accepted.can_advance_to(DispatchStatus::Accepted));
    }

    #[test]
    fn wire_literals_are_exact() {
        assert_eq!(
            serde_json::to_value(DispatchStatus::InTransit).unwrap(),
            "In Transit"
        );
        assert_eq!(
            serde_json::to_value(TrackingLocation::ErectionSite).unwrap(),
            "Received in Erection Site"
        );
        assert_eq!(DispatchStatus::Accepted.to_value(), "Accepted");
    }
}
