//! Stock Registry
//!
//! Owns the `precast_stock` rows and their lifecycle state. Dispatch and
//! erection move stock forward only through [`transition_stock`], a guarded
//! `UPDATE ... RETURNING` that touches rows still in an allowed source state.

use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::{Query, SimpleExpr},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::auth::Session;
use crate::db::{self, DbPool};
use crate::entities::{element, element_type, precast_stock, stock_approval_log};
use crate::errors::ServiceError;
use crate::events::{Event, EventKind, EventSender};
use crate::models::{DispositionFlags, ElementStatus, LifecycleState};
use crate::services::{ensure_distinct, Location, PrecastHierarchy};

/// Status written to `stock_approval_logs` on stockyard receipt
pub const STOCK_APPROVED: &str = "Approved";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePrecastStockRequest {
    #[validate(range(min = 1))]
    pub element_id: i32,
    #[validate(range(min = 1))]
    pub project_id: i32,
    pub stockyard_id: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct MarkReceivedRequest {
    #[validate(length(min = 1, message = "element_ids must not be empty"))]
    pub element_ids: Vec<i32>,
    pub stockyard_id: Option<i32>,
    pub storage_location: Option<String>,
}

/// Outcome of a stockyard receipt. Unknown ids are a warning, not an error.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StockReceiptOutcome {
    pub updated: usize,
    pub updated_ids: Vec<i32>,
    /// Ids with no stock row in this project
    pub not_found: Vec<i32>,
    /// Ids whose stock had already left the `produced` state
    pub skipped: Vec<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct StockFilter {
    pub stockyard_id: Option<i32>,
    pub element_type_id: Option<i32>,
    pub lifecycle_state: Option<LifecycleState>,
}

/// A stock row as seen by API clients, with the legacy disposition flags.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PrecastStockView {
    pub id: i32,
    pub element_id: i32,
    pub project_id: i32,
    pub element_type_id: i32,
    pub element_type: String,
    pub stockyard_id: Option<i32>,
    pub storage_location: Option<String>,
    /// e.g. `Thickness: 200.00mm, Length: 3000.00mm, Height: 120.00mm`
    pub dimensions: String,
    pub thickness_mm: f64,
    pub length_mm: f64,
    pub height_mm: f64,
    pub weight: f64,
    pub target_location: Option<i32>,
    pub lifecycle_state: LifecycleState,
    #[serde(flatten)]
    pub flags: DispositionFlags,
    pub dispatch_start: Option<DateTime<Utc>>,
    pub dispatch_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<precast_stock::Model> for PrecastStockView {
    fn from(model: precast_stock::Model) -> Self {
        Self {
            dimensions: model.dimensions().display(),
            flags: model.flags(),
            id: model.id,
            element_id: model.element_id,
            project_id: model.project_id,
            element_type_id: model.element_type_id,
            element_type: model.element_type,
            stockyard_id: model.stockyard_id,
            storage_location: model.storage_location,
            thickness_mm: model.thickness_mm,
            length_mm: model.length_mm,
            height_mm: model.height_mm,
            weight: model.weight,
            target_location: model.target_location,
            lifecycle_state: model.lifecycle_state,
            dispatch_start: model.dispatch_start,
            dispatch_end: model.dispatch_end,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StockListItem {
    #[serde(flatten)]
    pub stock: PrecastStockView,
    pub element_name: String,
    #[serde(flatten)]
    pub location: Location,
}

/// Stock rows of one element type.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ElementTypeGroup {
    pub element_type: String,
    pub element_type_id: i32,
    pub items: Vec<StockListItem>,
}

/// Moves stock rows of `project_id` whose element is in `element_ids` and
/// whose state is one of `from` into `to`, returning the element ids that
/// actually moved. `extra` columns are set on the same rows.
///
/// The state predicate is part of the `UPDATE` itself, so two concurrent
/// callers can never both move the same row.
pub(crate) async fn transition_stock<C: ConnectionTrait>(
    db: &C,
    project_id: i32,
    element_ids: &[i32],
    from: &[LifecycleState],
    to: LifecycleState,
    extra: Vec<(precast_stock::Column, SimpleExpr)>,
) -> Result<Vec<i32>, ServiceError> {
    if element_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut stmt = Query::update();
    stmt.table(precast_stock::Entity)
        .value(precast_stock::Column::LifecycleState, to)
        .value(precast_stock::Column::UpdatedAt, Utc::now());
    for (column, value) in extra {
        stmt.value(column, value);
    }
    stmt.and_where(precast_stock::Column::ProjectId.eq(project_id))
        .and_where(precast_stock::Column::ElementId.is_in(element_ids.iter().copied()))
        .and_where(precast_stock::Column::LifecycleState.is_in(from.iter().copied()))
        .returning_col(precast_stock::Column::ElementId);

    let backend = db.get_database_backend();
    let rows = db
        .query_all(backend.build(&stmt))
        .await
        .map_err(ServiceError::db_error)?;

    rows.iter()
        .map(|row| {
            row.try_get::<i32>("", "element_id")
                .map_err(ServiceError::db_error)
        })
        .collect()
}

/// Mirrors a status onto the element rows.
pub(crate) async fn set_element_status<C: ConnectionTrait>(
    db: &C,
    element_ids: &[i32],
    status: ElementStatus,
) -> Result<(), ServiceError> {
    if element_ids.is_empty() {
        return Ok(());
    }
    element::Entity::update_many()
        .col_expr(element::Column::Status, status.into())
        .col_expr(element::Column::UpdatedAt, Utc::now().into())
        .filter(element::Column::Id.is_in(element_ids.iter().copied()))
        .exec(db)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(())
}

/// Service for the precast stock registry
#[derive(Clone)]
pub struct PrecastStockService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl PrecastStockService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Registers a produced element as stock, deriving size and weight from
    /// its element type.
    #[instrument(skip(self, session), fields(actor = session.user_id))]
    pub async fn create_precast_stock(
        &self,
        request: CreatePrecastStockRequest,
        session: &Session,
    ) -> Result<PrecastStockView, ServiceError> {
        request.validate()?;
        let txn = db::begin(&self.db_pool).await?;

        let element = element::Entity::find_by_id(request.element_id)
            .filter(element::Column::ProjectId.eq(request.project_id))
            .filter(element::Column::Disable.eq(false))
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Element {} not found in project {}",
                    request.element_id, request.project_id
                ))
            })?;

        let element_type = element_type::Entity::find_by_id(element.element_type_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Element type {} not found",
                    element.element_type_id
                ))
            })?;

        let existing = precast_stock::Entity::find()
            .filter(precast_stock::Column::ElementId.eq(element.id))
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Element {} already has a stock row",
                element.id
            )));
        }

        let dimensions = element_type.dimensions();
        let now = Utc::now();
        let stock = precast_stock::ActiveModel {
            element_id: Set(element.id),
            project_id: Set(request.project_id),
            element_type_id: Set(element_type.id),
            element_type: Set(element_type.element_type.clone()),
            stockyard_id: Set(request.stockyard_id),
            storage_location: Set(None),
            thickness_mm: Set(dimensions.thickness_mm),
            length_mm: Set(dimensions.length_mm),
            height_mm: Set(dimensions.height_mm),
            weight: Set(dimensions.weight(element_type.density)),
            target_location: Set(element.target_location),
            lifecycle_state: Set(LifecycleState::Produced),
            erection_requested: Set(false),
            dispatch_start: Set(None),
            dispatch_end: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        db::commit(txn, "create_precast_stock").await?;

        info!(stock_id = stock.id, element_id = stock.element_id, "Precast stock created");
        self.event_sender.emit(
            Event::new(
                EventKind::PrecastStockCreated,
                session.user_id,
                json!({ "stock_id": stock.id, "element_id": stock.element_id }),
            )
            .in_project(stock.project_id),
        );

        Ok(stock.into())
    }

    /// Receives produced stock into the stockyard and writes one approval log
    /// row per received element.
    #[instrument(skip(self, session), fields(actor = session.user_id))]
    pub async fn mark_received_in_stockyard(
        &self,
        project_id: i32,
        request: MarkReceivedRequest,
        session: &Session,
    ) -> Result<StockReceiptOutcome, ServiceError> {
        request.validate()?;
        ensure_distinct(&request.element_ids, "element")?;

        let txn = db::begin(&self.db_pool).await?;

        let known: Vec<precast_stock::Model> = precast_stock::Entity::find()
            .filter(precast_stock::Column::ProjectId.eq(project_id))
            .filter(precast_stock::Column::ElementId.is_in(request.element_ids.iter().copied()))
            .all(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        let known_ids: HashSet<i32> = known.iter().map(|s| s.element_id).collect();

        let mut extra = Vec::new();
        if let Some(stockyard_id) = request.stockyard_id {
            extra.push((precast_stock::Column::StockyardId, stockyard_id.into()));
        }
        if let Some(location) = request.storage_location.clone() {
            extra.push((precast_stock::Column::StorageLocation, location.into()));
        }

        let updated_ids = transition_stock(
            &txn,
            project_id,
            &request.element_ids,
            &[LifecycleState::Produced],
            LifecycleState::InStockyard,
            extra,
        )
        .await?;
        let updated: HashSet<i32> = updated_ids.iter().copied().collect();

        set_element_status(&txn, &updated_ids, ElementStatus::InStockyard).await?;

        let now = Utc::now();
        let logs: Vec<stock_approval_log::ActiveModel> = known
            .iter()
            .filter(|stock| updated.contains(&stock.element_id))
            .map(|stock| stock_approval_log::ActiveModel {
                precast_stock_id: Set(stock.id),
                element_id: Set(stock.element_id),
                project_id: Set(project_id),
                status: Set(STOCK_APPROVED.to_string()),
                acted_by: Set(session.user_id),
                comments: Set(None),
                created_at: Set(now),
                ..Default::default()
            })
            .collect();
        if !logs.is_empty() {
            stock_approval_log::Entity::insert_many(logs)
                .exec(&txn)
                .await
                .map_err(ServiceError::db_error)?;
        }

        db::commit(txn, "mark_received_in_stockyard").await?;

        let mut updated_ids: Vec<i32> = request
            .element_ids
            .iter()
            .copied()
            .filter(|id| updated.contains(id))
            .collect();
        updated_ids.sort_unstable();
        let not_found: Vec<i32> = request
            .element_ids
            .iter()
            .copied()
            .filter(|id| !known_ids.contains(id))
            .collect();
        let skipped: Vec<i32> = request
            .element_ids
            .iter()
            .copied()
            .filter(|id| known_ids.contains(id) && !updated.contains(id))
            .collect();

        if !not_found.is_empty() {
            warn!(project_id, ?not_found, "Elements have no stock row in project");
        }
        info!(project_id, updated = updated_ids.len(), "Stock received in stockyard");

        if !updated_ids.is_empty() {
            self.event_sender.emit(
                Event::new(
                    EventKind::StockReceived,
                    session.user_id,
                    json!({ "element_ids": updated_ids }),
                )
                .in_project(project_id),
            );
        }

        Ok(StockReceiptOutcome {
            updated: updated_ids.len(),
            updated_ids,
            not_found,
            skipped,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_stock(&self, stock_id: i32) -> Result<PrecastStockView, ServiceError> {
        precast_stock::Entity::find_by_id(stock_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .map(PrecastStockView::from)
            .ok_or_else(|| ServiceError::NotFound(format!("Precast stock {} not found", stock_id)))
    }

    /// Stock of a project grouped by element type, skipping disabled elements.
    #[instrument(skip(self))]
    pub async fn read_disposition_for_project(
        &self,
        project_id: i32,
        filter: StockFilter,
    ) -> Result<Vec<ElementTypeGroup>, ServiceError> {
        let db = &*self.db_pool;

        let mut query = precast_stock::Entity::find()
            .find_also_related(element::Entity)
            .filter(precast_stock::Column::ProjectId.eq(project_id))
            .filter(element::Column::Disable.eq(false));
        if let Some(stockyard_id) = filter.stockyard_id {
            query = query.filter(precast_stock::Column::StockyardId.eq(stockyard_id));
        }
        if let Some(element_type_id) = filter.element_type_id {
            query = query.filter(precast_stock::Column::ElementTypeId.eq(element_type_id));
        }
        if let Some(state) = filter.lifecycle_state {
            query = query.filter(precast_stock::Column::LifecycleState.eq(state));
        }

        let rows = query
            .order_by_asc(precast_stock::Column::ElementType)
            .order_by_asc(precast_stock::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let hierarchy = PrecastHierarchy::load(db, project_id).await?;

        let mut groups: BTreeMap<(String, i32), Vec<StockListItem>> = BTreeMap::new();
        for (stock, element) in rows {
            let Some(element) = element else { continue };
            let location = hierarchy.locate(stock.target_location);
            groups
                .entry((stock.element_type.clone(), stock.element_type_id))
                .or_default()
                .push(StockListItem {
                    stock: stock.into(),
                    element_name: element.name,
                    location,
                });
        }

        Ok(groups
            .into_iter()
            .map(|((element_type, element_type_id), items)| ElementTypeGroup {
                element_type,
                element_type_id,
                items,
            })
            .collect())
    }
}
