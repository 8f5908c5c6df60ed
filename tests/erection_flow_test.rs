mod common;

use axum::http::StatusCode;
use precast_erp::{
    entities::{dispatch_tracking_log, stock_erected, stock_erected_log},
    events::EventKind,
    models::{ApprovalState, DispatchStatus, ElementStatus, ErectionLogStatus, LifecycleState},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde_json::{json, Value};

use common::{TestApp, ENGINEER, MANAGER, PROJECT_ID};

fn raise_body(app: &TestApp, floor_id: i32, quantity: u32) -> Value {
    json!({
        "project_id": PROJECT_ID,
        "floors": [{
            "floor_id": floor_id,
            "items": [{ "element_type_id": app.element_type_id, "quantity": quantity }]
        }]
    })
}

async fn raise(app: &TestApp, floor_id: i32, quantity: u32) -> Value {
    let (status, body) = app
        .post(
            "/api/v1/erection-requests",
            raise_body(app, floor_id, quantity),
            ENGINEER,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

async fn decide(app: &TestApp, decisions: Value, session_id: &str) -> (StatusCode, Value) {
    app.post(
        "/api/v1/erection-requests/decisions",
        json!({ "decisions": decisions }),
        session_id,
    )
    .await
}

async fn request_of(app: &TestApp, element_id: i32) -> stock_erected::Model {
    stock_erected::Entity::find()
        .filter(stock_erected::Column::ElementId.eq(element_id))
        .order_by_desc(stock_erected::Column::Id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .expect("erection request")
}

async fn log_statuses(app: &TestApp, element_id: i32) -> Vec<ErectionLogStatus> {
    stock_erected_log::Entity::find()
        .filter(stock_erected_log::Column::ElementId.eq(element_id))
        .order_by_asc(stock_erected_log::Column::Id)
        .all(&*app.state.db)
        .await
        .unwrap()
        .into_iter()
        .map(|log| log.status)
        .collect()
}

#[tokio::test]
async fn raise_claims_oldest_stock_first() {
    let app = TestApp::new().await;
    let ids = app.stocked(3, app.site.floor_1).await;

    let body = raise(&app, app.site.floor_1, 2).await;

    assert_eq!(body["total_requested"], 2);
    assert_eq!(body["total_raised"], 2);
    assert_eq!(body["lines"][0]["element_ids"], json!([ids[0], ids[1]]));

    for id in &ids[..2] {
        assert!(app.stock_of(*id).await.erection_requested);
        assert_eq!(log_statuses(&app, *id).await, vec![ErectionLogStatus::Pending]);
        assert_eq!(request_of(&app, *id).await.approval(), ApprovalState::Pending);
    }
    assert!(!app.stock_of(ids[2]).await.erection_requested);
    assert!(log_statuses(&app, ids[2]).await.is_empty());
    assert!(app.wait_for_event(EventKind::ErectionRequested).await);
}

#[tokio::test]
async fn raise_reports_shortfall_without_failing() {
    let app = TestApp::new().await;
    let ids = app.stocked(1, app.site.floor_1).await;
    app.produce(1, app.site.floor_1).await;
    app.stocked(1, app.site.floor_2).await;

    let body = raise(&app, app.site.floor_1, 4).await;

    assert_eq!(body["total_requested"], 4);
    assert_eq!(body["total_raised"], 1);
    assert_eq!(body["lines"][0]["element_ids"], json!([ids[0]]));
}

#[tokio::test]
async fn claimed_and_disabled_stock_is_not_raised_again() {
    let app = TestApp::new().await;
    let ids = app.stocked(2, app.site.floor_1).await;
    raise(&app, app.site.floor_1, 1).await;
    app.disable_element(ids[1]).await;

    let body = raise(&app, app.site.floor_1, 2).await;
    assert_eq!(body["total_raised"], 0);
}

#[tokio::test]
async fn reject_without_comments_mutates_nothing() {
    let app = TestApp::new().await;
    let ids = app.stocked(2, app.site.floor_1).await;
    raise(&app, app.site.floor_1, 2).await;

    let (status, body) = decide(
        &app,
        json!([
            { "element_id": ids[1], "approved": true },
            { "element_id": ids[0], "approved": false, "comments": "" }
        ]),
        MANAGER,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Comments"));
    for id in &ids {
        let request = request_of(&app, *id).await;
        assert_eq!(request.approved_status, None);
        assert_eq!(request.comments, None);
        assert_eq!(log_statuses(&app, *id).await, vec![ErectionLogStatus::Pending]);
    }
}

#[tokio::test]
async fn only_managers_decide() {
    let app = TestApp::new().await;
    let ids = app.stocked(1, app.site.floor_1).await;
    raise(&app, app.site.floor_1, 1).await;

    let (status, _) = decide(
        &app,
        json!([{ "element_id": ids[0], "approved": true }]),
        ENGINEER,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(request_of(&app, ids[0]).await.approval(), ApprovalState::Pending);
}

#[tokio::test]
async fn approve_updates_the_pending_log_in_place() {
    let app = TestApp::new().await;
    let ids = app.stocked(1, app.site.floor_1).await;
    raise(&app, app.site.floor_1, 1).await;

    let (status, body) = decide(
        &app,
        json!([
            { "element_id": ids[0], "approved": true },
            { "element_id": 31337, "approved": true }
        ]),
        MANAGER,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["approved_ids"], json!([ids[0]]));
    assert_eq!(body["missing_ids"], json!([31337]));

    let request = request_of(&app, ids[0]).await;
    assert_eq!(request.approved_status, Some(true));
    assert_eq!(request.comments.as_deref(), Some("Approved"));
    assert!(request.action_approve_or_reject.is_some());
    assert_eq!(log_statuses(&app, ids[0]).await, vec![ErectionLogStatus::Approved]);

    // a decided request is not decided twice
    let (_, body) = decide(
        &app,
        json!([{ "element_id": ids[0], "approved": false, "comments": "late" }]),
        MANAGER,
    )
    .await;
    assert_eq!(body["skipped_ids"], json!([ids[0]]));
}

#[tokio::test]
async fn rejection_frees_stock_for_a_new_request() {
    let app = TestApp::new().await;
    let ids = app.stocked(1, app.site.floor_1).await;
    raise(&app, app.site.floor_1, 1).await;

    let (status, body) = decide(
        &app,
        json!([{ "element_id": ids[0], "approved": false, "comments": "Crack at corner" }]),
        MANAGER,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rejected_ids"], json!([ids[0]]));

    let request = request_of(&app, ids[0]).await;
    assert_eq!(request.approval(), ApprovalState::Rejected);
    assert_eq!(request.comments.as_deref(), Some("Crack at corner"));
    assert!(!app.stock_of(ids[0]).await.erection_requested);
    assert_eq!(
        log_statuses(&app, ids[0]).await,
        vec![ErectionLogStatus::Pending, ErectionLogStatus::Rejected]
    );

    let body = raise(&app, app.site.floor_1, 1).await;
    assert_eq!(body["total_raised"], 1);
}

async fn dispatch(app: &TestApp, ids: &[i32]) -> i32 {
    let (status, created) = app
        .post(
            "/api/v1/dispatch-orders",
            json!({
                "project_id": PROJECT_ID,
                "vehicle_details": {
                    "vehicle_number": "KA-01-X-9",
                    "driver_name": "Asha",
                    "driver_phone": "+91-9000000002"
                },
                "items": ids
            }),
            ENGINEER,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    created["order_id"].as_i64().unwrap() as i32
}

async fn receive_at_site(app: &TestApp, ids: &[i32]) -> StatusCode {
    let (status, _) = app
        .post(
            &format!("/api/v1/projects/{}/erection/receive", PROJECT_ID),
            json!({ "element_ids": ids }),
            ENGINEER,
        )
        .await;
    status
}

async fn site_receipts(app: &TestApp, order_id: i32) -> Vec<dispatch_tracking_log::Model> {
    dispatch_tracking_log::Entity::find()
        .filter(dispatch_tracking_log::Column::DispatchOrderId.eq(order_id))
        .filter(dispatch_tracking_log::Column::Status.eq(DispatchStatus::Received))
        .all(&*app.state.db)
        .await
        .unwrap()
}

#[tokio::test]
async fn dispatched_request_is_received_once_and_erected() {
    let app = TestApp::new().await;
    let ids = app.stocked(1, app.site.floor_1).await;
    raise(&app, app.site.floor_1, 1).await;
    decide(&app, json!([{ "element_id": ids[0], "approved": true }]), MANAGER).await;

    let order_id = dispatch(&app, &ids).await;
    let (status, _) = app
        .post(
            &format!("/api/v1/dispatch-orders/{}/receive", order_id),
            json!({}),
            ENGINEER,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(request_of(&app, ids[0]).await.received_in_erection);
    app.assert_disposition_invariants(ids[0]).await;

    // the arrival is already on record, so site receipts change nothing
    assert_eq!(receive_at_site(&app, &ids).await, StatusCode::OK);
    assert_eq!(receive_at_site(&app, &ids).await, StatusCode::OK);
    assert_eq!(app.state_of(ids[0]).await, LifecycleState::ReceivedAtSite);
    assert_eq!(app.element(ids[0]).await.status, ElementStatus::InErection);
    assert!(site_receipts(&app, order_id).await.is_empty());
    assert_eq!(
        log_statuses(&app, ids[0]).await,
        vec![ErectionLogStatus::Approved, ErectionLogStatus::Received]
    );

    let (status, _) = app
        .post(
            &format!("/api/v1/projects/{}/erection/erected", PROJECT_ID),
            json!({ "element_ids": ids, "comments": "Grouted" }),
            ENGINEER,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let stock = app.stock_of(ids[0]).await;
    assert_eq!(stock.lifecycle_state, LifecycleState::Erected);
    assert_eq!(app.element(ids[0]).await.status, ElementStatus::Erected);
    let request = request_of(&app, ids[0]).await;
    assert!(request.erected);
    assert_eq!(request.comments.as_deref(), Some("Grouted"));
    assert_eq!(
        log_statuses(&app, ids[0]).await,
        vec![
            ErectionLogStatus::Approved,
            ErectionLogStatus::Received,
            ErectionLogStatus::Erected,
        ]
    );
    app.assert_disposition_invariants(ids[0]).await;
    assert!(app.wait_for_event(EventKind::ElementsErected).await);
}

#[tokio::test]
async fn element_received_before_its_order_is_logged_once() {
    let app = TestApp::new().await;
    let ids = app.stocked(1, app.site.floor_1).await;
    raise(&app, app.site.floor_1, 1).await;
    decide(&app, json!([{ "element_id": ids[0], "approved": true }]), MANAGER).await;
    let order_id = dispatch(&app, &ids).await;

    assert_eq!(receive_at_site(&app, &ids).await, StatusCode::OK);
    let stock = app.stock_of(ids[0]).await;
    assert_eq!(stock.lifecycle_state, LifecycleState::ReceivedAtSite);
    assert!(stock.dispatch_end.is_some());
    assert_eq!(app.element(ids[0]).await.status, ElementStatus::Dispatch);
    let receipts = site_receipts(&app, order_id).await;
    assert_eq!(receipts.len(), 1);
    assert!(receipts[0].remarks.contains("received at erection site by Asha"));

    let (status, _) = app
        .post(
            &format!("/api/v1/dispatch-orders/{}/receive", order_id),
            json!({}),
            ENGINEER,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        log_statuses(&app, ids[0]).await,
        vec![ErectionLogStatus::Approved, ErectionLogStatus::Received]
    );
    app.assert_disposition_invariants(ids[0]).await;
}

#[tokio::test]
async fn rejected_request_cannot_be_received_at_site() {
    let app = TestApp::new().await;
    let ids = app.stocked(1, app.site.floor_1).await;
    raise(&app, app.site.floor_1, 1).await;
    decide(
        &app,
        json!([{ "element_id": ids[0], "approved": false, "comments": "wrong bay" }]),
        MANAGER,
    )
    .await;

    assert_eq!(receive_at_site(&app, &ids).await, StatusCode::BAD_REQUEST);
    let stock = app.stock_of(ids[0]).await;
    assert_eq!(stock.lifecycle_state, LifecycleState::InStockyard);
    assert!(!stock.erection_requested);
    assert!(!request_of(&app, ids[0]).await.received_in_erection);
    assert_eq!(
        log_statuses(&app, ids[0]).await,
        vec![ErectionLogStatus::Pending, ErectionLogStatus::Rejected]
    );
    app.assert_disposition_invariants(ids[0]).await;
}

#[tokio::test]
async fn request_on_site_is_not_rejected() {
    let app = TestApp::new().await;
    let ids = app.stocked(1, app.site.floor_1).await;
    raise(&app, app.site.floor_1, 1).await;
    assert_eq!(receive_at_site(&app, &ids).await, StatusCode::OK);

    let (status, outcome) = decide(
        &app,
        json!([{ "element_id": ids[0], "approved": false, "comments": "too late" }]),
        MANAGER,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["skipped_ids"], json!([ids[0]]));
    assert!(app.stock_of(ids[0]).await.erection_requested);
    assert_eq!(request_of(&app, ids[0]).await.approval(), ApprovalState::Pending);
    app.assert_disposition_invariants(ids[0]).await;
}

#[tokio::test]
async fn one_unapproved_element_keeps_the_batch_on_site() {
    let app = TestApp::new().await;
    let ids = app.stocked(2, app.site.floor_1).await;
    raise(&app, app.site.floor_1, 2).await;
    decide(&app, json!([{ "element_id": ids[0], "approved": true }]), MANAGER).await;
    assert_eq!(receive_at_site(&app, &ids).await, StatusCode::OK);

    let (status, _) = app
        .post(
            &format!("/api/v1/projects/{}/erection/erected", PROJECT_ID),
            json!({ "element_ids": ids }),
            ENGINEER,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    for id in &ids {
        assert_eq!(app.state_of(*id).await, LifecycleState::ReceivedAtSite);
        assert!(!request_of(&app, *id).await.erected);
        assert!(!log_statuses(&app, *id).await.contains(&ErectionLogStatus::Erected));
        assert_eq!(app.element(*id).await.status, ElementStatus::InErection);
    }
}

#[tokio::test]
async fn stock_received_straight_from_the_yard() {
    let app = TestApp::new().await;
    let ids = app.stocked(1, app.site.floor_1).await;
    raise(&app, app.site.floor_1, 1).await;

    let (status, _) = app
        .post(
            &format!("/api/v1/projects/{}/erection/receive", PROJECT_ID),
            json!({ "element_ids": ids }),
            ENGINEER,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.state_of(ids[0]).await, LifecycleState::ReceivedAtSite);
    assert_eq!(app.element(ids[0]).await.status, ElementStatus::InErection);
    assert!(request_of(&app, ids[0]).await.received_in_erection);
    app.assert_disposition_invariants(ids[0]).await;
}

#[tokio::test]
async fn receipt_without_request_aborts_the_batch() {
    let app = TestApp::new().await;
    let ids = app.stocked(2, app.site.floor_1).await;
    raise(&app, app.site.floor_1, 1).await;

    let (status, _) = app
        .post(
            &format!("/api/v1/projects/{}/erection/receive", PROJECT_ID),
            json!({ "element_ids": ids }),
            ENGINEER,
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.state_of(ids[0]).await, LifecycleState::InStockyard);
    assert!(!request_of(&app, ids[0]).await.received_in_erection);
}

#[tokio::test]
async fn unapproved_request_cannot_be_erected() {
    let app = TestApp::new().await;
    let ids = app.stocked(1, app.site.floor_1).await;
    raise(&app, app.site.floor_1, 1).await;
    app.post(
        &format!("/api/v1/projects/{}/erection/receive", PROJECT_ID),
        json!({ "element_ids": ids }),
        ENGINEER,
    )
    .await;

    let (status, _) = app
        .post(
            &format!("/api/v1/projects/{}/erection/erected", PROJECT_ID),
            json!({ "element_ids": ids }),
            ENGINEER,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.state_of(ids[0]).await, LifecycleState::ReceivedAtSite);
    assert!(!request_of(&app, ids[0]).await.erected);
}

#[tokio::test]
async fn approved_stock_still_in_yard_cannot_be_erected() {
    let app = TestApp::new().await;
    let ids = app.stocked(1, app.site.floor_1).await;
    raise(&app, app.site.floor_1, 1).await;
    decide(&app, json!([{ "element_id": ids[0], "approved": true }]), MANAGER).await;

    let (status, _) = app
        .post(
            &format!("/api/v1/projects/{}/erection/erected", PROJECT_ID),
            json!({ "element_ids": ids }),
            ENGINEER,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.state_of(ids[0]).await, LifecycleState::InStockyard);
    assert_eq!(log_statuses(&app, ids[0]).await, vec![ErectionLogStatus::Approved]);
}

#[tokio::test]
async fn requests_and_logs_are_listed() {
    let app = TestApp::new().await;
    let ids = app.stocked(1, app.site.floor_1).await;
    raise(&app, app.site.floor_1, 1).await;

    let (status, body) = app
        .get(
            &format!("/api/v1/projects/{}/erection-requests", PROJECT_ID),
            ENGINEER,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["element_id"], ids[0]);
    assert_eq!(body[0]["approval"], "pending");

    let request_id = body[0]["id"].as_i64().unwrap();
    let (status, logs) = app
        .get(
            &format!("/api/v1/erection-requests/{}/logs", request_id),
            ENGINEER,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logs[0]["status"], "Pending");

    let (status, _) = app
        .get("/api/v1/erection-requests/9999/logs", ENGINEER)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
