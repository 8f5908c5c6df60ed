mod common;

use axum::http::StatusCode;
use precast_erp::events::EventKind;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use common::{
    dec as decimal, work_order_body, TestApp, ADMIN, ENGINEER, FOREIGN_ADMIN, MANAGER,
    SUPERADMIN,
};

/// A work order with one material of volume 10 at rate 100.
async fn work_order(app: &TestApp, wo_number: &str, end_client_id: i32) -> (i32, i32) {
    let (status, body) = app
        .post(
            "/api/v1/work-orders",
            work_order_body(wo_number, end_client_id, &[(None, "Slab", "100", "10")]),
            MANAGER,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    (
        body["id"].as_i64().unwrap() as i32,
        body["materials"][0]["id"].as_i64().unwrap() as i32,
    )
}

async fn draft(app: &TestApp, work_order_id: i32, lines: &[(i32, &str)]) -> (StatusCode, Value) {
    let items: Vec<Value> = lines
        .iter()
        .map(|(material, volume)| json!({ "work_order_material_id": material, "volume": volume }))
        .collect();
    app.post(
        "/api/v1/invoices",
        json!({ "work_order_id": work_order_id, "items": items }),
        ENGINEER,
    )
    .await
}

async fn material_used(app: &TestApp, work_order_id: i32) -> rust_decimal::Decimal {
    let (_, order) = app
        .get(&format!("/api/v1/work-orders/{}", work_order_id), ENGINEER)
        .await;
    decimal(&order["materials"][0]["volume_used"])
}

#[tokio::test]
async fn draft_consumes_material_balance() {
    let app = TestApp::new().await;
    let (wo, material) = work_order(&app, "WO#10", app.home_end_client).await;

    let (status, invoice) = draft(&app, wo, &[(material, "2.5")]).await;
    assert_eq!(status, StatusCode::CREATED, "{invoice}");
    assert_eq!(invoice["invoice_number"], "INV-WO#10-1");
    assert_eq!(invoice["indraft"], true);
    assert_eq!(decimal(&invoice["items"][0]["amount"]), dec!(250));
    assert_eq!(decimal(&invoice["total_amount"]), dec!(250));

    let (status, second) = draft(&app, wo, &[(material, "0.75")]).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["invoice_number"], "INV-WO#10-2");

    assert_eq!(material_used(&app, wo).await, dec!(3.25));
    assert!(app.wait_for_event(EventKind::InvoiceDraftCreated).await);
}

#[tokio::test]
async fn overdrawn_line_consumes_nothing() {
    let app = TestApp::new().await;
    let (wo, material) = work_order(&app, "WO#11", app.home_end_client).await;
    draft(&app, wo, &[(material, "8")]).await;

    let (status, body) = draft(&app, wo, &[(material, "1.5"), (material, "1")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("remaining balance"));
    assert_eq!(material_used(&app, wo).await, dec!(8));

    // the whole balance can still be drawn exactly
    let (status, _) = draft(&app, wo, &[(material, "2")]).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(material_used(&app, wo).await, dec!(10));
}

#[tokio::test]
async fn lines_must_be_positive_and_present() {
    let app = TestApp::new().await;
    let (wo, material) = work_order(&app, "WO#12", app.home_end_client).await;

    let (status, _) = draft(&app, wo, &[(material, "0")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = draft(&app, wo, &[(material, "-1")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = draft(&app, wo, &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_work_order_or_material_is_not_found() {
    let app = TestApp::new().await;
    let (wo, _) = work_order(&app, "WO#13", app.home_end_client).await;
    let (other_wo, other_material) = work_order(&app, "WO#14", app.home_end_client).await;

    let (status, _) = draft(&app, 4040, &[(1, "1")]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = draft(&app, wo, &[(other_material, "1")]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(material_used(&app, other_wo).await, dec!(0));
}

#[tokio::test]
async fn invoices_finalise_once() {
    let app = TestApp::new().await;
    let (wo, material) = work_order(&app, "WO#15", app.home_end_client).await;
    let (_, invoice) = draft(&app, wo, &[(material, "1")]).await;
    let uri = format!("/api/v1/invoices/{}/finalize", invoice["id"]);

    let (status, _) = app.post(&uri, json!({}), ENGINEER).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, finalised) = app.post(&uri, json!({}), MANAGER).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(finalised["indraft"], false);
    assert_eq!(finalised["items"].as_array().unwrap().len(), 1);

    let (status, _) = app.post(&uri, json!({}), MANAGER).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/v1/invoices/4040/finalize", json!({}), MANAGER)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn pending_invoices_follow_client_ownership() {
    let app = TestApp::new().await;
    let (home_wo, home_material) = work_order(&app, "WO#16", app.home_end_client).await;
    let (away_wo, away_material) = work_order(&app, "WO#17", app.foreign_end_client).await;
    draft(&app, home_wo, &[(home_material, "2.5")]).await;
    draft(&app, away_wo, &[(away_material, "1")]).await;

    let (status, all) = app.get("/api/v1/invoices/pending", SUPERADMIN).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (status, own) = app.get("/api/v1/invoices/pending", ADMIN).await;
    assert_eq!(status, StatusCode::OK);
    let own = own.as_array().unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0]["end_client_name"], "Skyline Developers");
    let line = &own[0]["items"][0];
    assert_eq!(line["item_name"], "Slab");
    assert_eq!(decimal(&line["volume_used"]), dec!(2.5));
    assert_eq!(decimal(&line["balance"]), dec!(7.5));

    let (status, _) = app.get("/api/v1/invoices/pending", MANAGER).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn finalised_and_foreign_invoices_are_not_pending() {
    let app = TestApp::new().await;
    let (wo, material) = work_order(&app, "WO#18", app.home_end_client).await;

    let (status, _) = app.get("/api/v1/invoices/pending", SUPERADMIN).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, invoice) = draft(&app, wo, &[(material, "1")]).await;
    let (status, _) = app.get("/api/v1/invoices/pending", FOREIGN_ADMIN).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    app.post(
        &format!("/api/v1/invoices/{}/finalize", invoice["id"]),
        json!({}),
        MANAGER,
    )
    .await;
    let (status, _) = app.get("/api/v1/invoices/pending", ADMIN).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn invoiced_material_survives_revisions() {
    let app = TestApp::new().await;
    let (wo, material) = work_order(&app, "WO#19", app.home_end_client).await;
    draft(&app, wo, &[(material, "4")]).await;
    let uri = format!("/api/v1/work-orders/{}", wo);

    let dropped = work_order_body("WO#19", app.home_end_client, &[(None, "Beam", "50", "3")]);
    let (status, body) = app.put(&uri, dropped, MANAGER).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("cannot be removed"));

    let shrunk = work_order_body("WO#19", app.home_end_client, &[(Some(material), "Slab", "100", "3")]);
    let (status, _) = app.put(&uri, shrunk, MANAGER).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let grown = work_order_body("WO#19", app.home_end_client, &[(Some(material), "Slab", "100", "12")]);
    let (status, live) = app.put(&uri, grown, MANAGER).await;
    assert_eq!(status, StatusCode::OK, "{live}");
    let kept = &live["materials"][0];
    assert_eq!(kept["id"], material);
    assert_eq!(decimal(&kept["volume_used"]), dec!(4));
    assert_eq!(decimal(&kept["balance"]), dec!(8));
}
