mod common;

use axum::http::{Method, StatusCode};
use precast_erp::{
    entities::stock_approval_log,
    events::EventKind,
    models::{ElementStatus, LifecycleState},
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use common::{TestApp, ENGINEER, EXPIRED, PROJECT_ID};

#[tokio::test]
async fn registered_stock_starts_produced_with_derived_size() {
    let app = TestApp::new().await;
    let ids = app.produce(1, app.site.floor_1).await;

    let stock = app.stock_of(ids[0]).await;
    let (status, body) = app
        .get(&format!("/api/v1/precast-stock/{}", stock.id), ENGINEER)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lifecycle_state"], "produced");
    assert_eq!(body["stockyard"], false);
    assert_eq!(body["order_by_erection"], false);
    assert_eq!(
        body["dimensions"],
        "Thickness: 200.00mm, Length: 3000.00mm, Height: 1000.00mm"
    );
    // 0.2m * 3m * 1m at 2500 kg/m³
    let weight = body["weight"].as_f64().unwrap();
    assert!((weight - 1500.0).abs() < 1e-6, "weight {weight}");
}

#[tokio::test]
async fn stock_can_only_be_registered_once_per_element() {
    let app = TestApp::new().await;
    let ids = app.produce(1, app.site.floor_1).await;

    let (status, body) = app
        .post(
            "/api/v1/precast-stock",
            json!({ "element_id": ids[0], "project_id": PROJECT_ID }),
            ENGINEER,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already has a stock row"));
}

#[tokio::test]
async fn unknown_element_is_not_found() {
    let app = TestApp::new().await;
    let (status, _) = app
        .post(
            "/api/v1/precast-stock",
            json!({ "element_id": 4040, "project_id": PROJECT_ID }),
            ENGINEER,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stockyard_receipt_moves_produced_stock_and_logs_approval() {
    let app = TestApp::new().await;
    let ids = app.produce(2, app.site.floor_1).await;

    let (status, body) = app
        .post(
            &format!("/api/v1/projects/{}/stockyard/receive", PROJECT_ID),
            json!({
                "element_ids": [ids[0], ids[1], 999],
                "storage_location": "Bay 4"
            }),
            ENGINEER,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 2);
    assert_eq!(body["not_found"], json!([999]));
    assert_eq!(body["skipped"], json!([]));

    for id in &ids {
        let stock = app.stock_of(*id).await;
        assert_eq!(stock.lifecycle_state, LifecycleState::InStockyard);
        assert_eq!(stock.storage_location.as_deref(), Some("Bay 4"));
        assert_eq!(app.element(*id).await.status, ElementStatus::InStockyard);
    }

    let logs = stock_approval_log::Entity::find()
        .filter(stock_approval_log::Column::ElementId.is_in(ids.clone()))
        .filter(stock_approval_log::Column::Status.eq("Approved"))
        .count(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(logs, 2);
    assert!(app.wait_for_event(EventKind::StockReceived).await);
}

#[tokio::test]
async fn second_receipt_skips_stock_already_in_yard() {
    let app = TestApp::new().await;
    let ids = app.stocked(1, app.site.floor_1).await;

    let (status, body) = app
        .post(
            &format!("/api/v1/projects/{}/stockyard/receive", PROJECT_ID),
            json!({ "element_ids": ids }),
            ENGINEER,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 0);
    assert_eq!(body["skipped"], json!(ids));

    let logs = stock_approval_log::Entity::find()
        .filter(stock_approval_log::Column::ElementId.eq(ids[0]))
        .count(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(logs, 1);
}

#[tokio::test]
async fn disposition_groups_by_type_and_hides_disabled_elements() {
    let app = TestApp::new().await;
    let ids = app.stocked(3, app.site.floor_2).await;
    app.disable_element(ids[2]).await;

    let (status, body) = app
        .get(
            &format!("/api/v1/projects/{}/precast-stock", PROJECT_ID),
            ENGINEER,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let groups = body.as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["element_type"], "WP-01");

    let items = groups[0]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["tower_name"], "Tower A");
    assert_eq!(items[0]["floor_name"], "Floor 2");
    assert_eq!(items[0]["stockyard"], true);
}

#[tokio::test]
async fn disposition_filters_by_state() {
    let app = TestApp::new().await;
    app.stocked(1, app.site.floor_1).await;
    app.produce(2, app.site.floor_1).await;

    let (status, body) = app
        .get(
            &format!(
                "/api/v1/projects/{}/precast-stock?lifecycle_state=produced",
                PROJECT_ID
            ),
            ENGINEER,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn empty_disposition_is_no_content() {
    let app = TestApp::new().await;
    let (status, body) = app
        .get(
            &format!("/api/v1/projects/{}/precast-stock", PROJECT_ID),
            ENGINEER,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());
}

#[tokio::test]
async fn requests_without_session_header_are_bad_requests() {
    let app = TestApp::new().await;
    let (status, body) = app
        .request(
            Method::GET,
            &format!("/api/v1/projects/{}/precast-stock", PROJECT_ID),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Authorization"));
}

#[tokio::test]
async fn unknown_and_expired_sessions_are_unauthorized() {
    let app = TestApp::new().await;
    let uri = format!("/api/v1/projects/{}/precast-stock", PROJECT_ID);

    let (status, _) = app.get(&uri, "sess-nobody").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get(&uri, EXPIRED).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_needs_no_session() {
    let app = TestApp::new().await;
    let (status, body) = app
        .request(Method::GET, "/api/v1/health", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");
    assert_eq!(body["database"], "up");
}
