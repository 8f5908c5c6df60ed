use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::get,
    Router,
};

use super::common::{created_response, success_response, ValidatedJson};
use crate::auth::{AccessPolicy, Session};
use crate::errors::ServiceError;
use crate::services::work_orders::{RevisionView, WorkOrderFilter, WorkOrderPayload, WorkOrderView};
use crate::AppState;

pub fn work_order_routes() -> Router<AppState> {
    Router::new()
        .route("/work-orders", get(list_work_orders).post(create_work_order))
        .route("/work-orders/:id", get(get_work_order).put(update_work_order))
        .route("/work-orders/:id/revisions", get(list_revisions))
}

#[utoipa::path(
    post,
    path = "/api/v1/work-orders",
    request_body = WorkOrderPayload,
    responses(
        (status = 201, description = "Work order created", body = WorkOrderView),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller may not manage work orders", body = crate::errors::ErrorResponse),
        (status = 404, description = "End client not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Work Orders"
)]
pub async fn create_work_order(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(payload): ValidatedJson<WorkOrderPayload>,
) -> Result<Response, ServiceError> {
    AccessPolicy::for_session(&session).require_manager()?;
    let order = state.services.work_orders.create(payload, &session).await?;
    Ok(created_response(order))
}

#[utoipa::path(
    get,
    path = "/api/v1/work-orders",
    params(WorkOrderFilter),
    responses(
        (status = 200, description = "Live work orders", body = [WorkOrderView]),
    ),
    tag = "Work Orders"
)]
pub async fn list_work_orders(
    State(state): State<AppState>,
    Query(filter): Query<WorkOrderFilter>,
) -> Result<Response, ServiceError> {
    let orders = state.services.work_orders.list(filter).await?;
    Ok(success_response(orders))
}

#[utoipa::path(
    get,
    path = "/api/v1/work-orders/{id}",
    params(("id" = i32, Path, description = "Work order id")),
    responses(
        (status = 200, description = "Work order with materials and attachments", body = WorkOrderView),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Work Orders"
)]
pub async fn get_work_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let order = state.services.work_orders.get(id).await?;
    Ok(success_response(order))
}

/// Revise a work order, keeping the previous version as history
#[utoipa::path(
    put,
    path = "/api/v1/work-orders/{id}",
    params(("id" = i32, Path, description = "Work order id")),
    request_body = WorkOrderPayload,
    responses(
        (status = 200, description = "Work order revised", body = WorkOrderView),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller may not manage work orders", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Work Orders"
)]
pub async fn update_work_order(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<WorkOrderPayload>,
) -> Result<Response, ServiceError> {
    AccessPolicy::for_session(&session).require_manager()?;
    let order = state
        .services
        .work_orders
        .update(id, payload, &session)
        .await?;
    Ok(success_response(order))
}

#[utoipa::path(
    get,
    path = "/api/v1/work-orders/{id}/revisions",
    params(("id" = i32, Path, description = "Work order id")),
    responses(
        (status = 200, description = "Revisions, newest first", body = [RevisionView]),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Work Orders"
)]
pub async fn list_revisions(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let revisions = state.services.work_orders.list_revisions(id).await?;
    Ok(success_response(revisions))
}
