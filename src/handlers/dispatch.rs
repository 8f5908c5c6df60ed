use axum::{
    extract::{Path, State},
    response::Response,
    routing::{get, post},
    Router,
};

use super::common::{created_response, list_response, success_response, ValidatedJson};
use crate::auth::Session;
use crate::errors::ServiceError;
use crate::services::dispatch::{
    CreateDispatchRequest, DispatchCreated, DispatchOrderView, DispatchTransition, TrackingLogView,
};
use crate::AppState;

pub fn dispatch_routes() -> Router<AppState> {
    Router::new()
        .route("/dispatch-orders", post(create_dispatch))
        .route("/dispatch-orders/:id", get(get_dispatch))
        .route("/dispatch-orders/:id/in-transit", post(mark_in_transit))
        .route("/dispatch-orders/:id/receive", post(receive_dispatch))
        .route("/projects/:project_id/dispatch-orders", get(list_project_dispatches))
        .route(
            "/projects/:project_id/dispatch-tracking-logs",
            get(list_tracking_logs),
        )
}

/// Reserve stocked elements onto a truck
#[utoipa::path(
    post,
    path = "/api/v1/dispatch-orders",
    request_body = CreateDispatchRequest,
    responses(
        (status = 201, description = "Dispatch order created", body = DispatchCreated),
        (status = 400, description = "Invalid request or elements unavailable", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Vehicle not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Dispatch"
)]
pub async fn create_dispatch(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(payload): ValidatedJson<CreateDispatchRequest>,
) -> Result<Response, ServiceError> {
    let created = state
        .services
        .dispatch
        .create_dispatch(payload, &session)
        .await?;
    Ok(created_response(created))
}

#[utoipa::path(
    get,
    path = "/api/v1/dispatch-orders/{id}",
    params(("id" = i32, Path, description = "Dispatch order id")),
    responses(
        (status = 200, description = "Dispatch order with details, items and logs", body = DispatchOrderView),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Dispatch"
)]
pub async fn get_dispatch(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let order = state.services.dispatch.get_dispatch(id).await?;
    Ok(success_response(order))
}

#[utoipa::path(
    post,
    path = "/api/v1/dispatch-orders/{id}/in-transit",
    params(("id" = i32, Path, description = "Dispatch order id")),
    responses(
        (status = 200, description = "Order is in transit", body = DispatchTransition),
        (status = 400, description = "Order is not dispatched", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Dispatch"
)]
pub async fn mark_in_transit(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let transition = state
        .services
        .dispatch
        .transition_to_in_transit(id, &session)
        .await?;
    Ok(success_response(transition))
}

/// Accept a truck at the erection site
#[utoipa::path(
    post,
    path = "/api/v1/dispatch-orders/{id}/receive",
    params(("id" = i32, Path, description = "Dispatch order id")),
    responses(
        (status = 200, description = "Order accepted", body = DispatchTransition),
        (status = 400, description = "Order already received", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Dispatch"
)]
pub async fn receive_dispatch(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let transition = state.services.dispatch.receive(id, &session).await?;
    Ok(success_response(transition))
}

#[utoipa::path(
    get,
    path = "/api/v1/projects/{project_id}/dispatch-orders",
    params(("project_id" = i32, Path, description = "Project id")),
    responses(
        (status = 200, description = "Dispatch orders of the project", body = [DispatchOrderView]),
        (status = 204, description = "No dispatch orders"),
    ),
    tag = "Dispatch"
)]
pub async fn list_project_dispatches(
    State(state): State<AppState>,
    Path(project_id): Path<i32>,
) -> Result<Response, ServiceError> {
    let orders = state.services.dispatch.get_by_project(project_id).await?;
    Ok(list_response(orders))
}

#[utoipa::path(
    get,
    path = "/api/v1/projects/{project_id}/dispatch-tracking-logs",
    params(("project_id" = i32, Path, description = "Project id")),
    responses(
        (status = 200, description = "Tracking history of the project's trucks", body = [TrackingLogView]),
    ),
    tag = "Dispatch"
)]
pub async fn list_tracking_logs(
    State(state): State<AppState>,
    Path(project_id): Path<i32>,
) -> Result<Response, ServiceError> {
    let logs = state.services.dispatch.get_tracking_logs(project_id).await?;
    Ok(success_response(logs))
}
