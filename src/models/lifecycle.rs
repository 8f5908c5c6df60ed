use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Where a precast item is in its physical life.
///
/// States are strictly ordered and every transition moves forward.
/// [`LifecycleState::ReceivedAtSite`] may skip ahead: a truck can be received
/// without ever being marked in transit, and stock can be received at site
/// straight from the yard.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    #[sea_orm(string_value = "produced")]
    Produced,
    #[sea_orm(string_value = "in_stockyard")]
    InStockyard,
    #[sea_orm(string_value = "reserved_for_dispatch")]
    ReservedForDispatch,
    #[sea_orm(string_value = "in_transit")]
    InTransit,
    #[sea_orm(string_value = "received_at_site")]
    ReceivedAtSite,
    #[sea_orm(string_value = "erected")]
    Erected,
}

impl LifecycleState {
    /// Whether `self -> next` is a legal single transition.
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Produced, InStockyard)
                | (InStockyard, ReservedForDispatch)
                | (ReservedForDispatch, InTransit)
                | (ReservedForDispatch, ReceivedAtSite)
                | (InTransit, ReceivedAtSite)
                | (InStockyard, ReceivedAtSite)
                | (ReceivedAtSite, Erected)
        )
    }

    /// The item has been physically received into a stockyard at some point.
    pub fn stockyard(self) -> bool {
        self >= LifecycleState::InStockyard
    }

    /// The item is reserved by, or has left with, a dispatch order.
    pub fn dispatch_status(self) -> bool {
        matches!(
            self,
            LifecycleState::ReservedForDispatch | LifecycleState::InTransit
        )
    }

    pub fn received_in_erection(self) -> bool {
        self >= LifecycleState::ReceivedAtSite
    }

    pub fn erected(self) -> bool {
        self == LifecycleState::Erected
    }
}

/// The five legacy disposition flags, derived from a lifecycle state plus the
/// orthogonal erection-request claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DispositionFlags {
    pub stockyard: bool,
    pub dispatch_status: bool,
    pub order_by_erection: bool,
    pub received_in_erection: bool,
    pub erected: bool,
}

impl DispositionFlags {
    pub fn derive(state: LifecycleState, erection_requested: bool) -> Self {
        Self {
            stockyard: state.stockyard(),
            dispatch_status: state.dispatch_status(),
            order_by_erection: erection_requested,
            received_in_erection: state.received_in_erection(),
            erected: state.erected(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LifecycleState::Produced, LifecycleState::InStockyard, true)]
    #[case(LifecycleState::InStockyard, LifecycleState::ReservedForDispatch, true)]
    #[case(LifecycleState::ReservedForDispatch, LifecycleState::InTransit, true)]
    #[case(LifecycleState::InTransit, LifecycleState::ReceivedAtSite, true)]
    #[case(LifecycleState::ReceivedAtSite, LifecycleState::Erected, true)]
    #[case(LifecycleState::Produced, LifecycleState::ReservedForDispatch, false)]
    #[case(LifecycleState::InTransit, LifecycleState::ReservedForDispatch, false)]
    #[case(LifecycleState::Erected, LifecycleState::ReceivedAtSite, false)]
    #[case(LifecycleState::InStockyard, LifecycleState::Erected, false)]
    fn transitions(
        #[case] from: LifecycleState,
        #[case] to: LifecycleState,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn derived_flags_follow_state() {
        let flags = DispositionFlags::derive(LifecycleState::ReservedForDispatch, false);
        assert!(flags.stockyard);
        assert!(flags.dispatch_status);
        assert!(!flags.received_in_erection);

        let flags = DispositionFlags::derive(LifecycleState::Erected, true);
        assert!(flags.stockyard && flags.order_by_erection && flags.received_in_erection);
        assert!(flags.erected);
        assert!(!flags.dispatch_status);
    }

    #[test]
    fn string_values_are_stable() {
        assert_eq!(LifecycleState::InStockyard.to_value(), "in_stockyard");
        assert_eq!(
            serde_json::to_value(LifecycleState::ReservedForDispatch).unwrap(),
            "reserved_for_dispatch"
        );
        assert_eq!(
            LifecycleState::try_from_value(&"received_at_site".to_string()).unwrap(),
            LifecycleState::ReceivedAtSite
        );
    }
}
