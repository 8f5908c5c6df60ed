use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Precast ERP API",
        version = "1.0.0",
        description = r#"
# Precast ERP server

Tracks precast concrete elements from the casting yard to erection on site,
and the work orders and invoices raised against each project.

## Authentication

Every endpoint except `/health` requires an opaque session id in the
`Authorization` header:

```
Authorization: <session-id>
```

A missing header is rejected with 400, an unknown or expired session with 401.

## Error Handling

Failures share one envelope:

```json
{
  "error": "Items unavailable for dispatch",
  "details": "...",
  "unavailable_elements": [102, 104],
  "request_id": "req-abc123xyz"
}
```

List endpoints answer 204 when there is nothing to return.
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Stock", description = "Precast stock registry"),
        (name = "Dispatch", description = "Dispatch orders from stockyard to site"),
        (name = "Erection", description = "Erection requests and approvals"),
        (name = "Work Orders", description = "Work orders and their revision history"),
        (name = "Invoices", description = "Draft invoices against work-order materials"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::health::health_check,

        // Stock
        crate::handlers::precast_stock::create_precast_stock,
        crate::handlers::precast_stock::get_stock,
        crate::handlers::precast_stock::mark_received_in_stockyard,
        crate::handlers::precast_stock::read_disposition_for_project,

        // Dispatch
        crate::handlers::dispatch::create_dispatch,
        crate::handlers::dispatch::get_dispatch,
        crate::handlers::dispatch::mark_in_transit,
        crate::handlers::dispatch::receive_dispatch,
        crate::handlers::dispatch::list_project_dispatches,
        crate::handlers::dispatch::list_tracking_logs,

        // Erection
        crate::handlers::erection::raise_request,
        crate::handlers::erection::decide,
        crate::handlers::erection::receive_at_site,
        crate::handlers::erection::finalize_erected,
        crate::handlers::erection::list_requests,
        crate::handlers::erection::get_request_logs,

        // Work orders
        crate::handlers::work_orders::create_work_order,
        crate::handlers::work_orders::list_work_orders,
        crate::handlers::work_orders::get_work_order,
        crate::handlers::work_orders::update_work_order,
        crate::handlers::work_orders::list_revisions,

        // Invoices
        crate::handlers::invoices::create_invoice_draft,
        crate::handlers::invoices::finalize_invoice,
        crate::handlers::invoices::list_pending_invoices,
    ),
    components(
        schemas(
            crate::models::LifecycleState,
            crate::models::DispatchStatus,
            crate::models::ApprovalState,
            crate::models::PaymentTerm,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
