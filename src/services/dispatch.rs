//! Dispatch Coordinator
//!
//! A dispatch order reserves stock for one vehicle trip and then moves
//! `Dispatched -> In Transit -> Accepted`. Reservation, order rows and the
//! first tracking log are written in one transaction; any unavailable item
//! rolls the whole order back.

use chrono::{DateTime, Utc};
use metrics::counter;
use rand::Rng;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::Session;
use crate::db::{self, DbPool};
use crate::entities::{
    dispatch_detail, dispatch_order, dispatch_order_item, dispatch_tracking_log, element_type,
    precast_stock, stock_erected, stock_erected_log, vehicle,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventKind, EventSender};
use crate::models::{
    DispatchStatus, ElementStatus, ErectionLogStatus, LifecycleState, TrackingLocation,
};
use crate::services::ensure_distinct;
use crate::services::erection::open_request;
use crate::services::precast_stock::{set_element_status, transition_stock};

pub const ORDER_NUMBER_PREFIX: &str = "ORD";
const ORDER_NUMBER_SPACE: u32 = 1_000_000;
const DISPATCH_REMARK: &str = "Items loaded and dispatched from stockyard";

/// `ORD` followed by 1 to 6 decimal digits.
pub fn generate_order_number<R: Rng>(rng: &mut R) -> String {
    format!("{}{}", ORDER_NUMBER_PREFIX, rng.gen_range(0..ORDER_NUMBER_SPACE))
}

pub fn is_valid_order_number(candidate: &str) -> bool {
    candidate
        .strip_prefix(ORDER_NUMBER_PREFIX)
        .map(|digits| {
            (1..=6).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit())
        })
        .unwrap_or(false)
}

/// Full vehicle description; upserted by `vehicle_number`.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct VehicleDetails {
    #[validate(length(min = 1, message = "vehicle_number is required"))]
    pub vehicle_number: String,
    #[validate(length(min = 1, message = "driver_name is required"))]
    pub driver_name: String,
    #[validate(length(min = 1, message = "driver_phone is required"))]
    pub driver_phone: String,
    pub emergency_contact: Option<String>,
    pub capacity: Option<f64>,
    pub transporter_id: Option<i32>,
    pub truck_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateDispatchRequest {
    #[validate(range(min = 1))]
    pub project_id: i32,
    /// Legacy reference to an existing vehicle; wins over `vehicle_details`
    pub vehicle_id: Option<i32>,
    pub vehicle_details: Option<VehicleDetails>,
    pub recipient_id: Option<i32>,
    pub dispatch_date: Option<DateTime<Utc>>,
    /// Element ids to load onto the vehicle
    #[serde(default)]
    pub items: Vec<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DispatchCreated {
    pub order_id: i32,
    pub order_number: String,
    pub dispatch_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DispatchTransition {
    pub order_id: i32,
    pub order_number: String,
    pub status: DispatchStatus,
    pub element_ids: Vec<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DispatchDetailView {
    pub id: i32,
    pub vehicle_id: i32,
    pub driver_name: String,
    pub current_status: DispatchStatus,
    pub updated_at: DateTime<Utc>,
}

impl From<dispatch_detail::Model> for DispatchDetailView {
    fn from(model: dispatch_detail::Model) -> Self {
        Self {
            id: model.id,
            vehicle_id: model.vehicle_id,
            driver_name: model.driver_name,
            current_status: model.current_status,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DispatchItemView {
    pub element_id: i32,
    pub precast_stock_id: i32,
    pub element_type: String,
    pub element_type_name: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrackingLogView {
    pub id: i32,
    pub dispatch_order_id: i32,
    pub status: DispatchStatus,
    pub location: TrackingLocation,
    pub remarks: String,
    pub status_timestamp: DateTime<Utc>,
}

impl From<dispatch_tracking_log::Model> for TrackingLogView {
    fn from(model: dispatch_tracking_log::Model) -> Self {
        Self {
            id: model.id,
            dispatch_order_id: model.dispatch_order_id,
            status: model.status,
            location: model.location,
            remarks: model.remarks,
            status_timestamp: model.status_timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DispatchOrderView {
    pub id: i32,
    pub order_number: String,
    pub project_id: i32,
    pub dispatch_date: DateTime<Utc>,
    pub vehicle_id: i32,
    pub dispatched_by: i32,
    pub recipient_id: Option<i32>,
    pub status: DispatchStatus,
    /// Most recently updated details row
    pub details: Option<DispatchDetailView>,
    /// Sorted by element id
    pub items: Vec<DispatchItemView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_logs: Option<Vec<TrackingLogView>>,
}

/// Service for dispatch orders
#[derive(Clone)]
pub struct DispatchService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
    order_number_attempts: u32,
}

impl DispatchService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender, order_number_attempts: u32) -> Self {
        Self {
            db_pool,
            event_sender,
            order_number_attempts: order_number_attempts.max(1),
        }
    }

    /// Atomically reserves the requested stock and records a new order.
    ///
    /// # Errors
    /// `ItemsUnavailable` with the offending ids when any item is not in the
    /// stockyard of `project_id`; nothing stays reserved in that case.
    #[instrument(skip(self, session), fields(actor = session.user_id))]
    pub async fn create_dispatch(
        &self,
        request: CreateDispatchRequest,
        session: &Session,
    ) -> Result<DispatchCreated, ServiceError> {
        request.validate()?;
        if let Some(details) = &request.vehicle_details {
            details.validate()?;
        }
        ensure_distinct(&request.items, "element")?;

        let txn = db::begin(&self.db_pool).await?;

        // the conditional update is the first write so racing orders queue on it
        let reserved = transition_stock(
            &txn,
            request.project_id,
            &request.items,
            &[LifecycleState::InStockyard],
            LifecycleState::ReservedForDispatch,
            vec![(precast_stock::Column::DispatchStart, Utc::now().into())],
        )
        .await?;

        if reserved.len() != request.items.len() {
            let reserved: HashSet<i32> = reserved.into_iter().collect();
            let unavailable: Vec<i32> = request
                .items
                .iter()
                .copied()
                .filter(|id| !reserved.contains(id))
                .collect();
            counter!("precast_dispatch.reservation_failed", 1);
            warn!(
                project_id = request.project_id,
                ?unavailable,
                "Dispatch rejected; items unavailable"
            );
            // `txn` is dropped here and rolls back the partial reservation
            return Err(ServiceError::ItemsUnavailable(unavailable));
        }

        let vehicle = self.resolve_vehicle(&txn, &request).await?;
        let order_number = self.allocate_order_number(&txn).await?;
        let now = Utc::now();

        let order = dispatch_order::ActiveModel {
            order_number: Set(order_number.clone()),
            project_id: Set(request.project_id),
            dispatch_date: Set(request.dispatch_date.unwrap_or(now)),
            vehicle_id: Set(vehicle.id),
            dispatched_by: Set(session.user_id),
            recipient_id: Set(request.recipient_id),
            status: Set(DispatchStatus::Dispatched),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(order_insert_error)?;

        let details = dispatch_detail::ActiveModel {
            dispatch_order_id: Set(order.id),
            vehicle_id: Set(vehicle.id),
            driver_name: Set(vehicle.driver_name.clone()),
            current_status: Set(DispatchStatus::Dispatched),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        if !request.items.is_empty() {
            let stock_ids: HashMap<i32, i32> = precast_stock::Entity::find()
                .filter(precast_stock::Column::ProjectId.eq(request.project_id))
                .filter(precast_stock::Column::ElementId.is_in(request.items.iter().copied()))
                .all(&txn)
                .await
                .map_err(ServiceError::db_error)?
                .into_iter()
                .map(|s| (s.element_id, s.id))
                .collect();

            let mut rows = Vec::with_capacity(request.items.len());
            for element_id in &request.items {
                let precast_stock_id = stock_ids.get(element_id).copied().ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "Reserved element {} has no stock row",
                        element_id
                    ))
                })?;
                rows.push(dispatch_order_item::ActiveModel {
                    dispatch_order_id: Set(order.id),
                    element_id: Set(*element_id),
                    precast_stock_id: Set(precast_stock_id),
                    created_at: Set(now),
                    ..Default::default()
                });
            }
            dispatch_order_item::Entity::insert_many(rows)
                .exec(&txn)
                .await
                .map_err(ServiceError::db_error)?;
        }

        append_tracking_log(
            &txn,
            order.id,
            DispatchStatus::Dispatched,
            TrackingLocation::Stockyard,
            DISPATCH_REMARK.to_string(),
        )
        .await?;

        db::commit(txn, "create_dispatch").await?;

        counter!("precast_dispatch.created", 1);
        info!(
            order_id = order.id,
            order_number = %order.order_number,
            items = request.items.len(),
            "Dispatch order created"
        );
        self.event_sender.emit(
            Event::new(
                EventKind::DispatchCreated,
                session.user_id,
                json!({
                    "order_id": order.id,
                    "order_number": order.order_number,
                    "element_ids": request.items,
                }),
            )
            .in_project(order.project_id),
        );

        Ok(DispatchCreated {
            order_id: order.id,
            order_number: order.order_number,
            dispatch_id: details.id,
        })
    }

    /// Marks a dispatched order as loaded and on the road.
    #[instrument(skip(self, session), fields(actor = session.user_id))]
    pub async fn transition_to_in_transit(
        &self,
        order_id: i32,
        session: &Session,
    ) -> Result<DispatchTransition, ServiceError> {
        let txn = db::begin(&self.db_pool).await?;
        let order = find_order(&txn, order_id).await?;

        if !order.status.can_advance_to(DispatchStatus::InTransit) {
            return Err(ServiceError::InvalidTransition(format!(
                "Dispatch order {} is '{}' and cannot move to 'In Transit'",
                order.order_number,
                order.status.as_str()
            )));
        }

        set_order_status(&txn, order.id, DispatchStatus::InTransit).await?;

        let element_ids = order_element_ids(&txn, order.id).await?;
        transition_stock(
            &txn,
            order.project_id,
            &element_ids,
            &[LifecycleState::ReservedForDispatch],
            LifecycleState::InTransit,
            Vec::new(),
        )
        .await?;

        append_tracking_log(
            &txn,
            order.id,
            DispatchStatus::InTransit,
            TrackingLocation::Truck,
            format!("Dispatch marked in transit by {}", session.user_name),
        )
        .await?;

        db::commit(txn, "dispatch_in_transit").await?;

        info!(order_id = order.id, "Dispatch order in transit");
        self.event_sender.emit(
            Event::new(
                EventKind::DispatchInTransit,
                session.user_id,
                json!({ "order_id": order.id, "order_number": order.order_number }),
            )
            .in_project(order.project_id),
        );

        Ok(DispatchTransition {
            order_id: order.id,
            order_number: order.order_number,
            status: DispatchStatus::InTransit,
            element_ids,
        })
    }

    /// Accepts the delivery at the erection site. Either every step commits
    /// or none does.
    #[instrument(skip(self, session), fields(actor = session.user_id))]
    pub async fn receive(
        &self,
        order_id: i32,
        session: &Session,
    ) -> Result<DispatchTransition, ServiceError> {
        let txn = db::begin(&self.db_pool).await?;
        let order = find_order(&txn, order_id).await?;

        if !order.status.can_advance_to(DispatchStatus::Accepted) {
            return Err(ServiceError::InvalidTransition(format!(
                "Dispatch order {} is '{}' and cannot be received",
                order.order_number,
                order.status.as_str()
            )));
        }

        let now = Utc::now();
        set_order_status(&txn, order.id, DispatchStatus::Accepted).await?;

        let element_ids = order_element_ids(&txn, order.id).await?;

        transition_stock(
            &txn,
            order.project_id,
            &element_ids,
            &[
                LifecycleState::ReservedForDispatch,
                LifecycleState::InTransit,
            ],
            LifecycleState::ReceivedAtSite,
            vec![
                (precast_stock::Column::DispatchEnd, Expr::value(now)),
                (precast_stock::Column::ErectionRequested, Expr::value(true)),
            ],
        )
        .await?;

        if !element_ids.is_empty() {
            let open = open_requests(&txn, order.project_id, &element_ids, session.user_id, now)
                .await?;
            let arrivals: Vec<&stock_erected::Model> = element_ids
                .iter()
                .filter_map(|id| open.get(id))
                .filter(|request| !request.received_in_erection)
                .collect();

            if !arrivals.is_empty() {
                stock_erected::Entity::update_many()
                    .col_expr(stock_erected::Column::ReceivedInErection, Expr::value(true))
                    .col_expr(stock_erected::Column::ActionApproveOrReject, Expr::value(now))
                    .filter(stock_erected::Column::Id.is_in(arrivals.iter().map(|r| r.id)))
                    .exec(&txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                let logs: Vec<stock_erected_log::ActiveModel> = arrivals
                    .iter()
                    .map(|request| stock_erected_log::ActiveModel {
                        stock_erected_id: Set(request.id),
                        element_id: Set(request.element_id),
                        status: Set(ErectionLogStatus::Received),
                        acted_by: Set(session.user_id),
                        comments: Set(Some(format!(
                            "Received with dispatch {}",
                            order.order_number
                        ))),
                        action_timestamp: Set(now),
                        ..Default::default()
                    })
                    .collect();
                stock_erected_log::Entity::insert_many(logs)
                    .exec(&txn)
                    .await
                    .map_err(ServiceError::db_error)?;
            }
        }

        set_element_status(&txn, &element_ids, ElementStatus::InErection).await?;

        append_tracking_log(
            &txn,
            order.id,
            DispatchStatus::Accepted,
            TrackingLocation::ErectionSite,
            format!("Dispatch received at erection site by {}", session.user_name),
        )
        .await?;

        db::commit(txn, "dispatch_receive").await?;

        info!(order_id = order.id, items = element_ids.len(), "Dispatch order received");
        self.event_sender.emit(
            Event::new(
                EventKind::DispatchReceived,
                session.user_id,
                json!({
                    "order_id": order.id,
                    "order_number": order.order_number,
                    "element_ids": element_ids,
                }),
            )
            .in_project(order.project_id),
        );

        Ok(DispatchTransition {
            order_id: order.id,
            order_number: order.order_number,
            status: DispatchStatus::Accepted,
            element_ids,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_dispatch(&self, order_id: i32) -> Result<DispatchOrderView, ServiceError> {
        let db = &*self.db_pool;
        let order = dispatch_order::Entity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Dispatch order {} not found", order_id)))?;

        let logs = dispatch_tracking_log::Entity::find()
            .filter(dispatch_tracking_log::Column::DispatchOrderId.eq(order.id))
            .order_by_asc(dispatch_tracking_log::Column::StatusTimestamp)
            .order_by_asc(dispatch_tracking_log::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut views = self.assemble(vec![order]).await?;
        let mut view = views
            .pop()
            .ok_or_else(|| ServiceError::InternalError("Dispatch order vanished".to_string()))?;
        view.tracking_logs = Some(logs.into_iter().map(TrackingLogView::from).collect());
        Ok(view)
    }

    /// Orders of a project, newest first, with their latest details and items.
    #[instrument(skip(self))]
    pub async fn get_by_project(&self, project_id: i32) -> Result<Vec<DispatchOrderView>, ServiceError> {
        let orders = dispatch_order::Entity::find()
            .filter(dispatch_order::Column::ProjectId.eq(project_id))
            .order_by_desc(dispatch_order::Column::DispatchDate)
            .order_by_desc(dispatch_order::Column::Id)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        self.assemble(orders).await
    }

    /// Tracking history of every order in a project, newest first.
    #[instrument(skip(self))]
    pub async fn get_tracking_logs(&self, project_id: i32) -> Result<Vec<TrackingLogView>, ServiceError> {
        let logs = dispatch_tracking_log::Entity::find()
            .inner_join(dispatch_order::Entity)
            .filter(dispatch_order::Column::ProjectId.eq(project_id))
            .order_by_desc(dispatch_tracking_log::Column::StatusTimestamp)
            .order_by_desc(dispatch_tracking_log::Column::Id)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(logs.into_iter().map(TrackingLogView::from).collect())
    }

    async fn assemble(
        &self,
        orders: Vec<dispatch_order::Model>,
    ) -> Result<Vec<DispatchOrderView>, ServiceError> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }
        let db = &*self.db_pool;
        let order_ids: Vec<i32> = orders.iter().map(|o| o.id).collect();

        let mut latest_details: HashMap<i32, dispatch_detail::Model> = HashMap::new();
        let details = dispatch_detail::Entity::find()
            .filter(dispatch_detail::Column::DispatchOrderId.is_in(order_ids.clone()))
            .order_by_desc(dispatch_detail::Column::UpdatedAt)
            .order_by_desc(dispatch_detail::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        for detail in details {
            latest_details.entry(detail.dispatch_order_id).or_insert(detail);
        }

        let items = dispatch_order_item::Entity::find()
            .filter(dispatch_order_item::Column::DispatchOrderId.is_in(order_ids))
            .order_by_asc(dispatch_order_item::Column::ElementId)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let stock: HashMap<i32, precast_stock::Model> = if items.is_empty() {
            HashMap::new()
        } else {
            precast_stock::Entity::find()
                .filter(precast_stock::Column::Id.is_in(items.iter().map(|i| i.precast_stock_id)))
                .all(db)
                .await
                .map_err(ServiceError::db_error)?
                .into_iter()
                .map(|s| (s.id, s))
                .collect()
        };

        let type_names: HashMap<i32, String> = if stock.is_empty() {
            HashMap::new()
        } else {
            element_type::Entity::find()
                .filter(element_type::Column::Id.is_in(stock.values().map(|s| s.element_type_id)))
                .all(db)
                .await
                .map_err(ServiceError::db_error)?
                .into_iter()
                .map(|t| (t.id, t.element_type_name))
                .collect()
        };

        let mut items_by_order: HashMap<i32, Vec<DispatchItemView>> = HashMap::new();
        for item in items {
            let Some(row) = stock.get(&item.precast_stock_id) else {
                debug!(element_id = item.element_id, "Dispatch item without stock row");
                continue;
            };
            items_by_order
                .entry(item.dispatch_order_id)
                .or_default()
                .push(DispatchItemView {
                    element_id: item.element_id,
                    precast_stock_id: item.precast_stock_id,
                    element_type: row.element_type.clone(),
                    element_type_name: type_names
                        .get(&row.element_type_id)
                        .cloned()
                        .unwrap_or_default(),
                    weight: row.weight,
                });
        }

        Ok(orders
            .into_iter()
            .map(|order| DispatchOrderView {
                details: latest_details.remove(&order.id).map(DispatchDetailView::from),
                items: items_by_order.remove(&order.id).unwrap_or_default(),
                id: order.id,
                order_number: order.order_number,
                project_id: order.project_id,
                dispatch_date: order.dispatch_date,
                vehicle_id: order.vehicle_id,
                dispatched_by: order.dispatched_by,
                recipient_id: order.recipient_id,
                status: order.status,
                tracking_logs: None,
            })
            .collect())
    }

    /// Uses the legacy vehicle id when given, otherwise upserts by number.
    async fn resolve_vehicle(
        &self,
        txn: &DatabaseTransaction,
        request: &CreateDispatchRequest,
    ) -> Result<vehicle::Model, ServiceError> {
        if let Some(vehicle_id) = request.vehicle_id {
            return vehicle::Entity::find_by_id(vehicle_id)
                .one(txn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| ServiceError::NotFound(format!("Vehicle {} not found", vehicle_id)));
        }

        let details = request.vehicle_details.as_ref().ok_or_else(|| {
            ServiceError::ValidationError(
                "Either vehicle_id or vehicle_details is required".to_string(),
            )
        })?;
        let now = Utc::now();

        let existing = vehicle::Entity::find()
            .filter(vehicle::Column::VehicleNumber.eq(details.vehicle_number.as_str()))
            .one(txn)
            .await
            .map_err(ServiceError::db_error)?;

        let saved = match existing {
            Some(found) => {
                let mut active: vehicle::ActiveModel = found.into();
                active.driver_name = Set(details.driver_name.clone());
                active.driver_phone = Set(details.driver_phone.clone());
                active.emergency_contact = Set(details.emergency_contact.clone());
                active.capacity = Set(details.capacity);
                active.transporter_id = Set(details.transporter_id);
                active.truck_type = Set(details.truck_type.clone());
                active.updated_at = Set(now);
                active.update(txn).await
            }
            None => {
                vehicle::ActiveModel {
                    vehicle_number: Set(details.vehicle_number.clone()),
                    driver_name: Set(details.driver_name.clone()),
                    driver_phone: Set(details.driver_phone.clone()),
                    emergency_contact: Set(details.emergency_contact.clone()),
                    capacity: Set(details.capacity),
                    transporter_id: Set(details.transporter_id),
                    truck_type: Set(details.truck_type.clone()),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(txn)
                .await
            }
        };
        saved.map_err(ServiceError::db_error)
    }

    async fn allocate_order_number(&self, txn: &DatabaseTransaction) -> Result<String, ServiceError> {
        for attempt in 1..=self.order_number_attempts {
            let candidate = generate_order_number(&mut rand::thread_rng());
            let taken = dispatch_order::Entity::find()
                .filter(dispatch_order::Column::OrderNumber.eq(candidate.as_str()))
                .count(txn)
                .await
                .map_err(ServiceError::db_error)?;
            if taken == 0 {
                return Ok(candidate);
            }
            debug!(attempt, %candidate, "Order number collision, retrying");
        }
        counter!("precast_dispatch.order_number_exhausted", 1);
        Err(ServiceError::Conflict(format!(
            "Could not allocate a unique order number after {} attempts",
            self.order_number_attempts
        )))
    }
}

/// The open (pending or approved, not erected) request of each element.
/// Elements arriving without one get a fresh pending request.
async fn open_requests(
    txn: &DatabaseTransaction,
    project_id: i32,
    element_ids: &[i32],
    actor: i32,
    now: DateTime<Utc>,
) -> Result<HashMap<i32, stock_erected::Model>, ServiceError> {
    let mut open: HashMap<i32, stock_erected::Model> = stock_erected::Entity::find()
        .filter(stock_erected::Column::ProjectId.eq(project_id))
        .filter(stock_erected::Column::ElementId.is_in(element_ids.iter().copied()))
        .filter(stock_erected::Column::Erected.eq(false))
        .filter(
            Condition::any()
                .add(stock_erected::Column::ApprovedStatus.is_null())
                .add(stock_erected::Column::ApprovedStatus.eq(true)),
        )
        .order_by_asc(stock_erected::Column::Id)
        .all(txn)
        .await
        .map_err(ServiceError::db_error)?
        .into_iter()
        .map(|request| (request.element_id, request))
        .collect();

    let unrequested: Vec<i32> = element_ids
        .iter()
        .copied()
        .filter(|id| !open.contains_key(id))
        .collect();
    if unrequested.is_empty() {
        return Ok(open);
    }

    let stocks = precast_stock::Entity::find()
        .filter(precast_stock::Column::ProjectId.eq(project_id))
        .filter(precast_stock::Column::ElementId.is_in(unrequested))
        .all(txn)
        .await
        .map_err(ServiceError::db_error)?;
    debug!(count = stocks.len(), "Opening erection requests for dispatched items");
    for stock in stocks {
        let request = open_request(txn, &stock, actor, now).await?;
        open.insert(stock.element_id, request);
    }
    Ok(open)
}

/// A concurrent insert can still win the race for an order number; the
/// unique index turns that into a conflict for the caller to retry.
fn order_insert_error(err: DbErr) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            ServiceError::Conflict(format!("Order number already taken: {}", detail))
        }
        _ => ServiceError::db_error(err),
    }
}

async fn find_order(
    txn: &DatabaseTransaction,
    order_id: i32,
) -> Result<dispatch_order::Model, ServiceError> {
    dispatch_order::Entity::find_by_id(order_id)
        .one(txn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Dispatch order {} not found", order_id)))
}

/// Updates the order and every details row to `status`.
async fn set_order_status(
    txn: &DatabaseTransaction,
    order_id: i32,
    status: DispatchStatus,
) -> Result<(), ServiceError> {
    let now = Utc::now();
    dispatch_order::Entity::update_many()
        .col_expr(dispatch_order::Column::Status, status.into())
        .col_expr(dispatch_order::Column::UpdatedAt, now.into())
        .filter(dispatch_order::Column::Id.eq(order_id))
        .exec(txn)
        .await
        .map_err(ServiceError::db_error)?;
    dispatch_detail::Entity::update_many()
        .col_expr(dispatch_detail::Column::CurrentStatus, status.into())
        .col_expr(dispatch_detail::Column::UpdatedAt, now.into())
        .filter(dispatch_detail::Column::DispatchOrderId.eq(order_id))
        .exec(txn)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(())
}

async fn order_element_ids(
    txn: &DatabaseTransaction,
    order_id: i32,
) -> Result<Vec<i32>, ServiceError> {
    Ok(dispatch_order_item::Entity::find()
        .filter(dispatch_order_item::Column::DispatchOrderId.eq(order_id))
        .order_by_asc(dispatch_order_item::Column::ElementId)
        .all(txn)
        .await
        .map_err(ServiceError::db_error)?
        .into_iter()
        .map(|item| item.element_id)
        .collect())
}

pub(crate) async fn append_tracking_log(
    txn: &DatabaseTransaction,
    order_id: i32,
    status: DispatchStatus,
    location: TrackingLocation,
    remarks: String,
) -> Result<dispatch_tracking_log::Model, ServiceError> {
    dispatch_tracking_log::ActiveModel {
        dispatch_order_id: Set(order_id),
        status: Set(status),
        location: Set(location),
        remarks: Set(remarks),
        status_timestamp: Set(Utc::now()),
        ..Default::default()
    }
    .insert(txn)
    .await
    .map_err(ServiceError::db_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn generated_numbers_have_legacy_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let number = generate_order_number(&mut rng);
            assert!(is_valid_order_number(&number), "bad order number {number}");
        }
    }

    #[test]
    fn order_number_validation() {
        assert!(is_valid_order_number("ORD0"));
        assert!(is_valid_order_number("ORD999999"));
        assert!(!is_valid_order_number("ORD"));
        assert!(!is_valid_order_number("ORD1234567"));
        assert!(!is_valid_order_number("ORX123"));
        assert!(!is_valid_order_number("ORD12a"));
    }

    #[test]
    fn other_insert_errors_stay_database_errors() {
        let err = order_insert_error(DbErr::Custom("boom".into()));
        assert!(matches!(err, ServiceError::DatabaseError(_)));
    }
}
