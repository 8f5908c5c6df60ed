//! Erection Coordinator
//!
//! Erection requests claim stocked items per floor and element type, are
//! approved or rejected by a manager, received at site and finally erected.
//! Every step appends to `stock_erected_logs`; the only in-place log update
//! is a pending row becoming approved.

use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::Session;
use crate::db::{self, DbPool};
use crate::entities::{
    dispatch_order, dispatch_order_item, element, precast_stock, stock_erected, stock_erected_log,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventKind, EventSender};
use crate::models::{
    ApprovalState, DispatchStatus, ElementStatus, ErectionLogStatus, LifecycleState,
    TrackingLocation,
};
use crate::services::dispatch::append_tracking_log;
use crate::services::ensure_distinct;
use crate::services::precast_stock::{set_element_status, transition_stock};

/// Stock states from which an erection request may be raised
const REQUESTABLE: [LifecycleState; 4] = [
    LifecycleState::InStockyard,
    LifecycleState::ReservedForDispatch,
    LifecycleState::InTransit,
    LifecycleState::ReceivedAtSite,
];

const APPROVED_COMMENT: &str = "Approved";

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct TypeQuantity {
    pub element_type_id: i32,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct FloorRequest {
    pub floor_id: i32,
    #[validate(length(min = 1))]
    pub items: Vec<TypeQuantity>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RaiseErectionRequest {
    #[validate(range(min = 1))]
    pub project_id: i32,
    #[validate(length(min = 1, message = "at least one floor is required"))]
    pub floors: Vec<FloorRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RaisedLine {
    pub floor_id: i32,
    pub element_type_id: i32,
    pub requested: u32,
    pub raised: u32,
    pub element_ids: Vec<i32>,
}

/// Raised-vs-requested counts; a shortfall is reported, not an error.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RaiseOutcome {
    pub lines: Vec<RaisedLine>,
    pub total_requested: u32,
    pub total_raised: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct Decision {
    pub element_id: i32,
    pub approved: bool,
    /// Required when rejecting
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct DecisionBatch {
    #[validate(length(min = 1, message = "decisions must not be empty"))]
    pub decisions: Vec<Decision>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DecisionOutcome {
    pub approved_ids: Vec<i32>,
    pub rejected_ids: Vec<i32>,
    /// Elements without any erection request
    pub missing_ids: Vec<i32>,
    /// Elements whose latest request was already decided, or whose stock is
    /// already on site when a rejection arrives
    pub skipped_ids: Vec<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SiteReceiptRequest {
    #[validate(length(min = 1, message = "element_ids must not be empty"))]
    pub element_ids: Vec<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct FinalizeErectedRequest {
    #[validate(length(min = 1, message = "element_ids must not be empty"))]
    pub element_ids: Vec<i32>,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErectionBatchOutcome {
    pub element_ids: Vec<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErectionRequestView {
    pub id: i32,
    pub precast_stock_id: i32,
    pub element_id: i32,
    pub project_id: i32,
    pub order_at: DateTime<Utc>,
    pub approval: ApprovalState,
    pub received_in_erection: bool,
    pub erected: bool,
    pub action_approve_or_reject: Option<DateTime<Utc>>,
    pub comments: Option<String>,
    pub requested_by: i32,
}

impl From<stock_erected::Model> for ErectionRequestView {
    fn from(model: stock_erected::Model) -> Self {
        Self {
            approval: model.approval(),
            id: model.id,
            precast_stock_id: model.precast_stock_id,
            element_id: model.element_id,
            project_id: model.project_id,
            order_at: model.order_at,
            received_in_erection: model.received_in_erection,
            erected: model.erected,
            action_approve_or_reject: model.action_approve_or_reject,
            comments: model.comments,
            requested_by: model.requested_by,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErectionLogView {
    pub id: i32,
    pub stock_erected_id: i32,
    pub element_id: i32,
    pub status: ErectionLogStatus,
    pub acted_by: i32,
    pub comments: Option<String>,
    pub action_timestamp: DateTime<Utc>,
}

impl From<stock_erected_log::Model> for ErectionLogView {
    fn from(model: stock_erected_log::Model) -> Self {
        Self {
            id: model.id,
            stock_erected_id: model.stock_erected_id,
            element_id: model.element_id,
            status: model.status,
            acted_by: model.acted_by,
            comments: model.comments,
            action_timestamp: model.action_timestamp,
        }
    }
}

/// Service for erection requests
#[derive(Clone)]
pub struct ErectionService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl ErectionService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Claims the oldest unrequested stock of each `(floor, element type)`.
    ///
    /// Each claimed item is committed in its own transaction. Fewer available
    /// items than requested is not an error; the outcome reports both counts.
    #[instrument(skip(self, session), fields(actor = session.user_id))]
    pub async fn raise_request(
        &self,
        request: RaiseErectionRequest,
        session: &Session,
    ) -> Result<RaiseOutcome, ServiceError> {
        request.validate()?;
        for floor in &request.floors {
            floor.validate()?;
            for line in &floor.items {
                line.validate()?;
            }
        }

        let db = &*self.db_pool;
        let mut lines = Vec::new();

        for floor in &request.floors {
            for line in &floor.items {
                let candidates = precast_stock::Entity::find()
                    .inner_join(element::Entity)
                    .filter(precast_stock::Column::ProjectId.eq(request.project_id))
                    .filter(precast_stock::Column::ElementTypeId.eq(line.element_type_id))
                    .filter(precast_stock::Column::TargetLocation.eq(floor.floor_id))
                    .filter(precast_stock::Column::ErectionRequested.eq(false))
                    .filter(precast_stock::Column::LifecycleState.is_in(REQUESTABLE))
                    .filter(element::Column::Disable.eq(false))
                    .order_by_asc(precast_stock::Column::Id)
                    .limit(u64::from(line.quantity))
                    .all(db)
                    .await
                    .map_err(ServiceError::db_error)?;

                let mut element_ids = Vec::with_capacity(candidates.len());
                for stock in candidates {
                    if self.claim(&stock, session).await? {
                        element_ids.push(stock.element_id);
                    }
                }

                let raised = element_ids.len() as u32;
                if raised < line.quantity {
                    warn!(
                        floor_id = floor.floor_id,
                        element_type_id = line.element_type_id,
                        requested = line.quantity,
                        raised,
                        "Erection request under-delivered"
                    );
                }
                lines.push(RaisedLine {
                    floor_id: floor.floor_id,
                    element_type_id: line.element_type_id,
                    requested: line.quantity,
                    raised,
                    element_ids,
                });
            }
        }

        let outcome = RaiseOutcome {
            total_requested: lines.iter().map(|l| l.requested).sum(),
            total_raised: lines.iter().map(|l| l.raised).sum(),
            lines,
        };

        info!(
            project_id = request.project_id,
            requested = outcome.total_requested,
            raised = outcome.total_raised,
            "Erection requests raised"
        );
        if outcome.total_raised > 0 {
            let element_ids: Vec<i32> = outcome
                .lines
                .iter()
                .flat_map(|l| l.element_ids.iter().copied())
                .collect();
            self.event_sender.emit(
                Event::new(
                    EventKind::ErectionRequested,
                    session.user_id,
                    json!({ "element_ids": element_ids }),
                )
                .in_project(request.project_id),
            );
        }

        Ok(outcome)
    }

    /// Claims one stock row for erection. Returns `false` if another request
    /// claimed it first.
    async fn claim(
        &self,
        stock: &precast_stock::Model,
        session: &Session,
    ) -> Result<bool, ServiceError> {
        let txn = db::begin(&self.db_pool).await?;
        let now = Utc::now();

        let claimed = precast_stock::Entity::update_many()
            .col_expr(precast_stock::Column::ErectionRequested, Expr::value(true))
            .col_expr(precast_stock::Column::UpdatedAt, Expr::value(now))
            .filter(precast_stock::Column::Id.eq(stock.id))
            .filter(precast_stock::Column::ErectionRequested.eq(false))
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        if claimed.rows_affected == 0 {
            debug!(stock_id = stock.id, "Stock already claimed for erection");
            return Ok(false);
        }

        open_request(&txn, stock, session.user_id, now).await?;

        db::commit(txn, "raise_erection_request").await?;
        Ok(true)
    }

    /// Applies a batch of approve/reject decisions in one transaction.
    ///
    /// # Errors
    /// `InvalidInput` for the whole batch if any rejection lacks comments.
    #[instrument(skip(self, session), fields(actor = session.user_id))]
    pub async fn decide(
        &self,
        batch: DecisionBatch,
        session: &Session,
    ) -> Result<DecisionOutcome, ServiceError> {
        batch.validate()?;
        if let Some(bad) = batch.decisions.iter().find(|d| {
            !d.approved && d.comments.as_deref().map(str::trim).unwrap_or("").is_empty()
        }) {
            return Err(ServiceError::InvalidInput(format!(
                "Comments are required to reject element {}",
                bad.element_id
            )));
        }

        let txn = db::begin(&self.db_pool).await?;
        let mut outcome = DecisionOutcome::default();

        for decision in &batch.decisions {
            let Some(request) = latest_request(&txn, decision.element_id, None).await? else {
                outcome.missing_ids.push(decision.element_id);
                continue;
            };
            if request.approval() != ApprovalState::Pending {
                outcome.skipped_ids.push(decision.element_id);
                continue;
            }
            if !decision.approved && request.received_in_erection {
                warn!(
                    element_id = decision.element_id,
                    "Stock already on site, rejection skipped"
                );
                outcome.skipped_ids.push(decision.element_id);
                continue;
            }

            let now = Utc::now();
            let mut active: stock_erected::ActiveModel = request.clone().into();
            active.action_approve_or_reject = Set(Some(now));

            if decision.approved {
                active.approved_status = Set(Some(true));
                active.comments = Set(Some(APPROVED_COMMENT.to_string()));
                active.update(&txn).await.map_err(ServiceError::db_error)?;

                set_erection_claim(&txn, request.precast_stock_id, true).await?;

                stock_erected_log::Entity::update_many()
                    .col_expr(
                        stock_erected_log::Column::Status,
                        ErectionLogStatus::Approved.into(),
                    )
                    .col_expr(stock_erected_log::Column::ActedBy, session.user_id.into())
                    .col_expr(
                        stock_erected_log::Column::Comments,
                        Expr::value(APPROVED_COMMENT),
                    )
                    .col_expr(stock_erected_log::Column::ActionTimestamp, now.into())
                    .filter(stock_erected_log::Column::StockErectedId.eq(request.id))
                    .filter(stock_erected_log::Column::Status.eq(ErectionLogStatus::Pending))
                    .exec(&txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                outcome.approved_ids.push(decision.element_id);
            } else {
                let comments = decision
                    .comments
                    .as_deref()
                    .map(str::trim)
                    .unwrap_or_default()
                    .to_string();
                active.approved_status = Set(Some(false));
                active.comments = Set(Some(comments.clone()));
                active.update(&txn).await.map_err(ServiceError::db_error)?;

                // frees the stock for a later request
                set_erection_claim(&txn, request.precast_stock_id, false).await?;

                append_log(
                    &txn,
                    &request,
                    ErectionLogStatus::Rejected,
                    session.user_id,
                    Some(comments),
                )
                .await?;

                outcome.rejected_ids.push(decision.element_id);
            }
        }

        db::commit(txn, "decide_erection_requests").await?;

        info!(
            approved = outcome.approved_ids.len(),
            rejected = outcome.rejected_ids.len(),
            missing = outcome.missing_ids.len(),
            "Erection decisions applied"
        );
        if !outcome.approved_ids.is_empty() || !outcome.rejected_ids.is_empty() {
            self.event_sender.emit(Event::new(
                EventKind::ErectionDecided,
                session.user_id,
                json!({
                    "approved": outcome.approved_ids,
                    "rejected": outcome.rejected_ids,
                }),
            ));
        }

        Ok(outcome)
    }

    /// Records arrival of requested elements at the erection site.
    #[instrument(skip(self, session), fields(actor = session.user_id))]
    pub async fn receive_at_site(
        &self,
        project_id: i32,
        request: SiteReceiptRequest,
        session: &Session,
    ) -> Result<ErectionBatchOutcome, ServiceError> {
        request.validate()?;
        ensure_distinct(&request.element_ids, "element")?;

        let txn = db::begin(&self.db_pool).await?;
        let now = Utc::now();

        for &element_id in &request.element_ids {
            let erection = latest_request(&txn, element_id, Some(project_id))
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "No erection request for element {} in project {}",
                        element_id, project_id
                    ))
                })?;

            if erection.approval() == ApprovalState::Rejected {
                return Err(ServiceError::InvalidTransition(format!(
                    "Erection request for element {} was rejected",
                    element_id
                )));
            }
            if erection.received_in_erection {
                debug!(element_id, "Element already received at site");
                continue;
            }

            let stock = find_stock(&txn, erection.precast_stock_id).await?;
            let from_dispatch = matches!(
                stock.lifecycle_state,
                LifecycleState::ReservedForDispatch | LifecycleState::InTransit
            );
            match stock.lifecycle_state {
                LifecycleState::ReceivedAtSite => {}
                state if state.can_transition_to(LifecycleState::ReceivedAtSite) => {
                    let mut extra = vec![(precast_stock::Column::ErectionRequested, Expr::value(true))];
                    if from_dispatch {
                        extra.push((precast_stock::Column::DispatchEnd, Expr::value(now)));
                    }
                    transition_stock(
                        &txn,
                        project_id,
                        &[element_id],
                        &[state],
                        LifecycleState::ReceivedAtSite,
                        extra,
                    )
                    .await?;
                }
                state => {
                    return Err(ServiceError::InvalidTransition(format!(
                        "Element {} is {:?} and cannot be received at site",
                        element_id, state
                    )))
                }
            }

            let mut active: stock_erected::ActiveModel = erection.clone().into();
            active.received_in_erection = Set(true);
            active.update(&txn).await.map_err(ServiceError::db_error)?;

            append_log(
                &txn,
                &erection,
                ErectionLogStatus::Received,
                session.user_id,
                None,
            )
            .await?;

            let dispatched = if from_dispatch {
                dispatch_order_item::Entity::find()
                    .inner_join(dispatch_order::Entity)
                    .filter(dispatch_order_item::Column::ElementId.eq(element_id))
                    .filter(dispatch_order::Column::ProjectId.eq(project_id))
                    .order_by_desc(dispatch_order_item::Column::Id)
                    .one(&txn)
                    .await
                    .map_err(ServiceError::db_error)?
            } else {
                None
            };

            match dispatched {
                Some(item) => {
                    append_tracking_log(
                        &txn,
                        item.dispatch_order_id,
                        DispatchStatus::Received,
                        TrackingLocation::ErectionSite,
                        format!(
                            "Element {} received at erection site by {}",
                            element_id, session.user_name
                        ),
                    )
                    .await?;
                    set_element_status(&txn, &[element_id], ElementStatus::Dispatch).await?;
                }
                None => {
                    set_element_status(&txn, &[element_id], ElementStatus::InErection).await?;
                }
            }
            debug!(element_id, at = %now, "Element received at site");
        }

        db::commit(txn, "erection_receive_at_site").await?;

        info!(project_id, count = request.element_ids.len(), "Elements received at site");
        self.event_sender.emit(
            Event::new(
                EventKind::ErectionReceived,
                session.user_id,
                json!({ "element_ids": request.element_ids }),
            )
            .in_project(project_id),
        );

        Ok(ErectionBatchOutcome {
            element_ids: request.element_ids,
        })
    }

    /// Marks approved, site-received elements as erected. Any element that
    /// does not qualify aborts the whole batch.
    #[instrument(skip(self, session), fields(actor = session.user_id))]
    pub async fn finalize_erected(
        &self,
        project_id: i32,
        request: FinalizeErectedRequest,
        session: &Session,
    ) -> Result<ErectionBatchOutcome, ServiceError> {
        request.validate()?;
        ensure_distinct(&request.element_ids, "element")?;

        let comments = request
            .comments
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        let txn = db::begin(&self.db_pool).await?;

        for &element_id in &request.element_ids {
            let erection = latest_request(&txn, element_id, Some(project_id))
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "No erection request for element {} in project {}",
                        element_id, project_id
                    ))
                })?;
            if erection.approval() != ApprovalState::Approved {
                return Err(ServiceError::InvalidInput(format!(
                    "Erection request for element {} is not approved",
                    element_id
                )));
            }

            let moved = transition_stock(
                &txn,
                project_id,
                &[element_id],
                &[LifecycleState::ReceivedAtSite],
                LifecycleState::Erected,
                Vec::new(),
            )
            .await?;
            if moved.is_empty() {
                return Err(ServiceError::InvalidTransition(format!(
                    "Element {} has not been received at the erection site",
                    element_id
                )));
            }

            let mut active: stock_erected::ActiveModel = erection.clone().into();
            active.erected = Set(true);
            if comments.is_some() {
                active.comments = Set(comments.clone());
            }
            active.update(&txn).await.map_err(ServiceError::db_error)?;

            append_log(
                &txn,
                &erection,
                ErectionLogStatus::Erected,
                session.user_id,
                comments.clone(),
            )
            .await?;
        }

        set_element_status(&txn, &request.element_ids, ElementStatus::Erected).await?;
        db::commit(txn, "finalize_erected").await?;

        info!(project_id, count = request.element_ids.len(), "Elements erected");
        self.event_sender.emit(
            Event::new(
                EventKind::ElementsErected,
                session.user_id,
                json!({ "element_ids": request.element_ids }),
            )
            .in_project(project_id),
        );

        Ok(ErectionBatchOutcome {
            element_ids: request.element_ids,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_requests(&self, project_id: i32) -> Result<Vec<ErectionRequestView>, ServiceError> {
        Ok(stock_erected::Entity::find()
            .filter(stock_erected::Column::ProjectId.eq(project_id))
            .order_by_asc(stock_erected::Column::Id)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(ErectionRequestView::from)
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_request_logs(&self, request_id: i32) -> Result<Vec<ErectionLogView>, ServiceError> {
        let db = &*self.db_pool;
        stock_erected::Entity::find_by_id(request_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Erection request {} not found", request_id))
            })?;

        Ok(stock_erected_log::Entity::find()
            .filter(stock_erected_log::Column::StockErectedId.eq(request_id))
            .order_by_asc(stock_erected_log::Column::ActionTimestamp)
            .order_by_asc(stock_erected_log::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(ErectionLogView::from)
            .collect())
    }
}

/// The most recent erection request for an element.
async fn latest_request<C: ConnectionTrait>(
    db: &C,
    element_id: i32,
    project_id: Option<i32>,
) -> Result<Option<stock_erected::Model>, ServiceError> {
    let mut query =
        stock_erected::Entity::find().filter(stock_erected::Column::ElementId.eq(element_id));
    if let Some(project_id) = project_id {
        query = query.filter(stock_erected::Column::ProjectId.eq(project_id));
    }
    query
        .order_by_desc(stock_erected::Column::Id)
        .one(db)
        .await
        .map_err(ServiceError::db_error)
}

/// Inserts a pending request for claimed stock together with its Pending log.
pub(crate) async fn open_request(
    txn: &DatabaseTransaction,
    stock: &precast_stock::Model,
    requested_by: i32,
    now: DateTime<Utc>,
) -> Result<stock_erected::Model, ServiceError> {
    let request = stock_erected::ActiveModel {
        precast_stock_id: Set(stock.id),
        element_id: Set(stock.element_id),
        project_id: Set(stock.project_id),
        order_at: Set(now),
        approved_status: Set(None),
        received_in_erection: Set(false),
        erected: Set(false),
        action_approve_or_reject: Set(None),
        comments: Set(None),
        requested_by: Set(requested_by),
        ..Default::default()
    }
    .insert(txn)
    .await
    .map_err(ServiceError::db_error)?;

    append_log(txn, &request, ErectionLogStatus::Pending, requested_by, None).await?;
    Ok(request)
}

async fn find_stock(
    txn: &DatabaseTransaction,
    stock_id: i32,
) -> Result<precast_stock::Model, ServiceError> {
    precast_stock::Entity::find_by_id(stock_id)
        .one(txn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Precast stock {} not found", stock_id)))
}

async fn set_erection_claim(
    txn: &DatabaseTransaction,
    stock_id: i32,
    requested: bool,
) -> Result<(), ServiceError> {
    precast_stock::Entity::update_many()
        .col_expr(precast_stock::Column::ErectionRequested, Expr::value(requested))
        .col_expr(precast_stock::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(precast_stock::Column::Id.eq(stock_id))
        .exec(txn)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(())
}

async fn append_log(
    txn: &DatabaseTransaction,
    request: &stock_erected::Model,
    status: ErectionLogStatus,
    acted_by: i32,
    comments: Option<String>,
) -> Result<(), ServiceError> {
    stock_erected_log::ActiveModel {
        stock_erected_id: Set(request.id),
        element_id: Set(request.element_id),
        status: Set(status),
        acted_by: Set(acted_by),
        comments: Set(comments),
        action_timestamp: Set(Utc::now()),
        ..Default::default()
    }
    .insert(txn)
    .await
    .map_err(ServiceError::db_error)?;
    Ok(())
}
