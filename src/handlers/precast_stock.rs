use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
    Router,
};

use super::common::{created_response, list_response, success_response, ValidatedJson};
use crate::auth::Session;
use crate::errors::ServiceError;
use crate::services::precast_stock::{
    CreatePrecastStockRequest, ElementTypeGroup, MarkReceivedRequest, PrecastStockView,
    StockFilter, StockReceiptOutcome,
};
use crate::AppState;

pub fn precast_stock_routes() -> Router<AppState> {
    Router::new()
        .route("/precast-stock", post(create_precast_stock))
        .route("/precast-stock/:id", get(get_stock))
        .route(
            "/projects/:project_id/stockyard/receive",
            post(mark_received_in_stockyard),
        )
        .route(
            "/projects/:project_id/precast-stock",
            get(read_disposition_for_project),
        )
}

/// Register a produced element as precast stock
#[utoipa::path(
    post,
    path = "/api/v1/precast-stock",
    request_body = CreatePrecastStockRequest,
    responses(
        (status = 201, description = "Stock created", body = PrecastStockView),
        (status = 400, description = "Invalid request or stock already exists", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Element or element type not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Stock"
)]
pub async fn create_precast_stock(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(payload): ValidatedJson<CreatePrecastStockRequest>,
) -> Result<Response, ServiceError> {
    let stock = state
        .services
        .precast_stock
        .create_precast_stock(payload, &session)
        .await?;
    Ok(created_response(stock))
}

#[utoipa::path(
    get,
    path = "/api/v1/precast-stock/{id}",
    params(("id" = i32, Path, description = "Precast stock id")),
    responses(
        (status = 200, description = "Stock returned", body = PrecastStockView),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Stock"
)]
pub async fn get_stock(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let stock = state.services.precast_stock.get_stock(id).await?;
    Ok(success_response(stock))
}

/// Receive produced elements into the stockyard
#[utoipa::path(
    post,
    path = "/api/v1/projects/{project_id}/stockyard/receive",
    params(("project_id" = i32, Path, description = "Project id")),
    request_body = MarkReceivedRequest,
    responses(
        (status = 200, description = "Receipt outcome", body = StockReceiptOutcome),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    tag = "Stock"
)]
pub async fn mark_received_in_stockyard(
    State(state): State<AppState>,
    session: Session,
    Path(project_id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<MarkReceivedRequest>,
) -> Result<Response, ServiceError> {
    let outcome = state
        .services
        .precast_stock
        .mark_received_in_stockyard(project_id, payload, &session)
        .await?;
    Ok(success_response(outcome))
}

/// Stock of a project grouped by element type
#[utoipa::path(
    get,
    path = "/api/v1/projects/{project_id}/precast-stock",
    params(("project_id" = i32, Path, description = "Project id"), StockFilter),
    responses(
        (status = 200, description = "Stock grouped by element type", body = [ElementTypeGroup]),
        (status = 204, description = "No stock for this project"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    tag = "Stock"
)]
pub async fn read_disposition_for_project(
    State(state): State<AppState>,
    Path(project_id): Path<i32>,
    Query(filter): Query<StockFilter>,
) -> Result<Response, ServiceError> {
    let groups = state
        .services
        .precast_stock
        .read_disposition_for_project(project_id, filter)
        .await?;
    Ok(list_response(groups))
}
