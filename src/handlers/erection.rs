use axum::{
    extract::{Path, State},
    response::Response,
    routing::{get, post},
    Router,
};

use super::common::{created_response, success_response, ValidatedJson};
use crate::auth::{AccessPolicy, Session};
use crate::errors::ServiceError;
use crate::services::erection::{
    DecisionBatch, DecisionOutcome, ErectionBatchOutcome, ErectionLogView, ErectionRequestView,
    FinalizeErectedRequest, RaiseErectionRequest, RaiseOutcome, SiteReceiptRequest,
};
use crate::AppState;

pub fn erection_routes() -> Router<AppState> {
    Router::new()
        .route("/erection-requests", post(raise_request))
        .route("/erection-requests/decisions", post(decide))
        .route("/erection-requests/:id/logs", get(get_request_logs))
        .route("/projects/:project_id/erection/receive", post(receive_at_site))
        .route("/projects/:project_id/erection/erected", post(finalize_erected))
        .route("/projects/:project_id/erection-requests", get(list_requests))
}

/// Request stocked elements for erection by floor and element type
#[utoipa::path(
    post,
    path = "/api/v1/erection-requests",
    request_body = RaiseErectionRequest,
    responses(
        (status = 201, description = "Requests raised; may be fewer than asked for", body = RaiseOutcome),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    tag = "Erection"
)]
pub async fn raise_request(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(payload): ValidatedJson<RaiseErectionRequest>,
) -> Result<Response, ServiceError> {
    let outcome = state
        .services
        .erection
        .raise_request(payload, &session)
        .await?;
    Ok(created_response(outcome))
}

/// Approve or reject pending erection requests
#[utoipa::path(
    post,
    path = "/api/v1/erection-requests/decisions",
    request_body = DecisionBatch,
    responses(
        (status = 200, description = "Decisions applied", body = DecisionOutcome),
        (status = 400, description = "A rejection is missing its comment", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller may not decide", body = crate::errors::ErrorResponse),
    ),
    tag = "Erection"
)]
pub async fn decide(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(payload): ValidatedJson<DecisionBatch>,
) -> Result<Response, ServiceError> {
    AccessPolicy::for_session(&session).require_manager()?;
    let outcome = state.services.erection.decide(payload, &session).await?;
    Ok(success_response(outcome))
}

#[utoipa::path(
    post,
    path = "/api/v1/projects/{project_id}/erection/receive",
    params(("project_id" = i32, Path, description = "Project id")),
    request_body = SiteReceiptRequest,
    responses(
        (status = 200, description = "Elements received at site", body = ErectionBatchOutcome),
        (status = 400, description = "An element cannot be received", body = crate::errors::ErrorResponse),
        (status = 404, description = "No erection request for an element", body = crate::errors::ErrorResponse),
    ),
    tag = "Erection"
)]
pub async fn receive_at_site(
    State(state): State<AppState>,
    session: Session,
    Path(project_id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<SiteReceiptRequest>,
) -> Result<Response, ServiceError> {
    let outcome = state
        .services
        .erection
        .receive_at_site(project_id, payload, &session)
        .await?;
    Ok(success_response(outcome))
}

#[utoipa::path(
    post,
    path = "/api/v1/projects/{project_id}/erection/erected",
    params(("project_id" = i32, Path, description = "Project id")),
    request_body = FinalizeErectedRequest,
    responses(
        (status = 200, description = "Elements erected", body = ErectionBatchOutcome),
        (status = 400, description = "An element is not approved or not on site", body = crate::errors::ErrorResponse),
        (status = 404, description = "No erection request for an element", body = crate::errors::ErrorResponse),
    ),
    tag = "Erection"
)]
pub async fn finalize_erected(
    State(state): State<AppState>,
    session: Session,
    Path(project_id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<FinalizeErectedRequest>,
) -> Result<Response, ServiceError> {
    let outcome = state
        .services
        .erection
        .finalize_erected(project_id, payload, &session)
        .await?;
    Ok(success_response(outcome))
}

#[utoipa::path(
    get,
    path = "/api/v1/projects/{project_id}/erection-requests",
    params(("project_id" = i32, Path, description = "Project id")),
    responses(
        (status = 200, description = "Erection requests with their decision state", body = [ErectionRequestView]),
    ),
    tag = "Erection"
)]
pub async fn list_requests(
    State(state): State<AppState>,
    Path(project_id): Path<i32>,
) -> Result<Response, ServiceError> {
    let requests = state.services.erection.list_requests(project_id).await?;
    Ok(success_response(requests))
}

#[utoipa::path(
    get,
    path = "/api/v1/erection-requests/{id}/logs",
    params(("id" = i32, Path, description = "Erection request id")),
    responses(
        (status = 200, description = "Log history of the request", body = [ErectionLogView]),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Erection"
)]
pub async fn get_request_logs(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let logs = state.services.erection.get_request_logs(id).await?;
    Ok(success_response(logs))
}
