use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::entities::precast;
use crate::errors::ServiceError;
use crate::events::EventSender;

pub mod dispatch;
pub mod erection;
pub mod invoices;
pub mod precast_stock;
pub mod work_orders;

pub use dispatch::DispatchService;
pub use erection::ErectionService;
pub use invoices::InvoiceService;
pub use precast_stock::PrecastStockService;
pub use work_orders::WorkOrderService;

/// Every domain service, cloned into each request through the app state.
#[derive(Clone)]
pub struct AppServices {
    pub precast_stock: PrecastStockService,
    pub dispatch: DispatchService,
    pub erection: ErectionService,
    pub work_orders: WorkOrderService,
    pub invoices: InvoiceService,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender, config: &AppConfig) -> Self {
        Self {
            precast_stock: PrecastStockService::new(db_pool.clone(), event_sender.clone()),
            dispatch: DispatchService::new(
                db_pool.clone(),
                event_sender.clone(),
                config.order_number_max_attempts,
            ),
            erection: ErectionService::new(db_pool.clone(), event_sender.clone()),
            work_orders: WorkOrderService::new(db_pool.clone(), event_sender.clone()),
            invoices: InvoiceService::new(db_pool, event_sender),
        }
    }
}

pub const UNKNOWN_TOWER: &str = "Unknown Tower";
pub const UNKNOWN_FLOOR: &str = "Unknown Floor";
/// Id reported for a tower or floor that cannot be resolved
pub const UNKNOWN_LOCATION_ID: i32 = -1;

/// A floor and the tower above it in the `precast` hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Location {
    pub tower_id: i32,
    pub tower_name: String,
    pub floor_id: i32,
    pub floor_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FloorRef {
    pub floor_id: i32,
    pub floor_name: String,
}

/// One project's tower/floor tree, loaded in a single query.
///
/// Floors point at their tower through `parent_id`.
#[derive(Debug, Default)]
pub(crate) struct PrecastHierarchy {
    nodes: HashMap<i32, precast::Model>,
}

impl PrecastHierarchy {
    pub(crate) async fn load<C: ConnectionTrait>(
        db: &C,
        project_id: i32,
    ) -> Result<Self, ServiceError> {
        let nodes = precast::Entity::find()
            .filter(precast::Column::ProjectId.eq(project_id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(Self::from_nodes(nodes))
    }

    pub(crate) fn from_nodes(nodes: Vec<precast::Model>) -> Self {
        Self {
            nodes: nodes.into_iter().map(|n| (n.id, n)).collect(),
        }
    }

    /// Resolves a floor id into its floor and tower, using sentinels for
    /// anything missing.
    pub(crate) fn locate(&self, floor_id: Option<i32>) -> Location {
        let floor = floor_id.and_then(|id| self.nodes.get(&id));
        let tower = floor
            .and_then(|f| f.parent_id)
            .and_then(|id| self.nodes.get(&id));

        Location {
            tower_id: tower.map(|t| t.id).unwrap_or(UNKNOWN_LOCATION_ID),
            tower_name: tower
                .map(|t| t.name.clone())
                .unwrap_or_else(|| UNKNOWN_TOWER.to_string()),
            floor_id: floor.map(|f| f.id).unwrap_or(UNKNOWN_LOCATION_ID),
            floor_name: floor
                .map(|f| f.name.clone())
                .unwrap_or_else(|| UNKNOWN_FLOOR.to_string()),
        }
    }

    pub(crate) fn tower_name(&self, tower_id: Option<i32>) -> String {
        tower_id
            .and_then(|id| self.nodes.get(&id))
            .map(|t| t.name.clone())
            .unwrap_or_else(|| UNKNOWN_TOWER.to_string())
    }

    pub(crate) fn floor(&self, floor_id: i32) -> FloorRef {
        match self.nodes.get(&floor_id) {
            Some(f) => FloorRef {
                floor_id: f.id,
                floor_name: f.name.clone(),
            },
            None => FloorRef {
                floor_id: UNKNOWN_LOCATION_ID,
                floor_name: UNKNOWN_FLOOR.to_string(),
            },
        }
    }
}

/// Rejects id lists that name the same element more than once.
pub(crate) fn ensure_distinct(ids: &[i32], what: &str) -> Result<(), ServiceError> {
    let mut seen = BTreeSet::new();
    let duplicates: BTreeSet<i32> = ids.iter().copied().filter(|id| !seen.insert(*id)).collect();
    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::ValidationError(format!(
            "Duplicate {} ids: {:?}",
            what,
            duplicates.into_iter().collect::<Vec<_>>()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn node(id: i32, name: &str, parent_id: Option<i32>) -> precast::Model {
        precast::Model {
            id,
            project_id: 7,
            name: name.to_string(),
            parent_id,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn locate_walks_floor_to_tower() {
        let tree = PrecastHierarchy::from_nodes(vec![
            node(1, "Tower A", None),
            node(10, "Floor 3", Some(1)),
        ]);
        let location = tree.locate(Some(10));
        assert_eq!(location.tower_name, "Tower A");
        assert_eq!(location.floor_name, "Floor 3");
        assert_eq!(location.tower_id, 1);
    }

    #[test]
    fn missing_nodes_resolve_to_sentinels() {
        let tree = PrecastHierarchy::from_nodes(vec![node(10, "Floor 3", Some(99))]);

        let orphan = tree.locate(Some(10));
        assert_eq!(orphan.tower_name, UNKNOWN_TOWER);
        assert_eq!(orphan.floor_id, 10);

        let nowhere = tree.locate(None);
        assert_eq!(nowhere.floor_id, UNKNOWN_LOCATION_ID);
        assert_eq!(nowhere.floor_name, UNKNOWN_FLOOR);
        assert_eq!(tree.floor(55).floor_id, UNKNOWN_LOCATION_ID);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        assert!(ensure_distinct(&[1, 2, 3], "element").is_ok());
        let err = ensure_distinct(&[4, 5, 4, 4], "element").unwrap_err();
        assert!(err.to_string().contains("[4]"));
    }
}
