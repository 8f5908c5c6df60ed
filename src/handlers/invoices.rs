use axum::{
    extract::{Path, State},
    response::Response,
    routing::{get, post},
    Router,
};

use super::common::{created_response, list_response, success_response, ValidatedJson};
use crate::auth::{AccessPolicy, Session};
use crate::errors::ServiceError;
use crate::services::invoices::{CreateInvoiceRequest, InvoiceView, PendingInvoiceView};
use crate::AppState;

pub fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", post(create_invoice_draft))
        .route("/invoices/pending", get(list_pending_invoices))
        .route("/invoices/:id/finalize", post(finalize_invoice))
}

/// Draft an invoice against work-order materials
#[utoipa::path(
    post,
    path = "/api/v1/invoices",
    request_body = CreateInvoiceRequest,
    responses(
        (status = 201, description = "Draft invoice created", body = InvoiceView),
        (status = 400, description = "Volume exceeds the material balance", body = crate::errors::ErrorResponse),
        (status = 404, description = "Work order or material not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Invoices"
)]
pub async fn create_invoice_draft(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(payload): ValidatedJson<CreateInvoiceRequest>,
) -> Result<Response, ServiceError> {
    let invoice = state
        .services
        .invoices
        .create_invoice_draft(payload, &session)
        .await?;
    Ok(created_response(invoice))
}

#[utoipa::path(
    post,
    path = "/api/v1/invoices/{id}/finalize",
    params(("id" = i32, Path, description = "Invoice id")),
    responses(
        (status = 200, description = "Invoice finalised", body = InvoiceView),
        (status = 400, description = "Invoice already finalised", body = crate::errors::ErrorResponse),
        (status = 403, description = "Caller may not finalise invoices", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Invoices"
)]
pub async fn finalize_invoice(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    AccessPolicy::for_session(&session).require_manager()?;
    let invoice = state
        .services
        .invoices
        .finalize_invoice(id, &session)
        .await?;
    Ok(success_response(invoice))
}

/// Draft invoices visible to the caller
#[utoipa::path(
    get,
    path = "/api/v1/invoices/pending",
    responses(
        (status = 200, description = "Pending invoices with material balances", body = [PendingInvoiceView]),
        (status = 204, description = "No pending invoices"),
        (status = 403, description = "Caller may not view invoices", body = crate::errors::ErrorResponse),
    ),
    tag = "Invoices"
)]
pub async fn list_pending_invoices(
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, ServiceError> {
    let pending = state
        .services
        .invoices
        .list_pending_invoices(&session)
        .await?;
    Ok(list_response(pending))
}
