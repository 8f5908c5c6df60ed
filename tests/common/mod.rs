#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tower::ServiceExt;

use precast_erp::{
    auth::{Role, Session},
    build_router,
    config::AppConfig,
    db,
    entities::{
        dispatch_order, dispatch_order_item, element, element_type, end_client, precast,
        precast_stock, session, stock_erected_log, user,
    },
    events::{self, EventKind, EventSender, EventSinks, MemorySink},
    models::{DispatchStatus, ElementStatus, ErectionLogStatus, LifecycleState},
    services::precast_stock::CreatePrecastStockRequest,
    AppState,
};

pub const PROJECT_ID: i32 = 1;
pub const OTHER_PROJECT_ID: i32 = 2;
/// Organisation owning the first end client
pub const HOME_CLIENT_ID: i32 = 500;
pub const FOREIGN_CLIENT_ID: i32 = 900;

/// Session ids seeded for each role.
pub const SUPERADMIN: &str = "sess-superadmin";
pub const ADMIN: &str = "sess-admin";
pub const FOREIGN_ADMIN: &str = "sess-foreign-admin";
pub const MANAGER: &str = "sess-manager";
pub const ENGINEER: &str = "sess-engineer";
pub const EXPIRED: &str = "sess-expired";

/// Tower and floor ids of the seeded `precast` hierarchy.
#[derive(Debug, Clone, Copy)]
pub struct Site {
    pub tower: i32,
    pub floor_1: i32,
    pub floor_2: i32,
}

/// Test application backed by a throwaway SQLite file.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub sink: MemorySink,
    pub site: Site,
    pub element_type_id: i32,
    pub home_end_client: i32,
    pub foreign_end_client: i32,
    _event_task: JoinHandle<()>,
    _db_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_pool_size(1).await
    }

    /// Same as `new` with `connections` pooled connections, for tests that
    /// run transactions side by side.
    pub async fn with_pool_size(connections: u32) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("erp.db").display());

        let mut cfg = AppConfig::new(url, "127.0.0.1".into(), 0, "test".into());
        cfg.db_max_connections = connections;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("connect sqlite");
        db::run_migrations(&pool).await.expect("run migrations");
        let db_arc = Arc::new(pool);

        let sink = MemorySink::new();
        let (event_sender, event_rx) = EventSender::channel(256);
        let event_task = tokio::spawn(events::process_events(
            event_rx,
            EventSinks {
                activity: Arc::new(sink.clone()),
                notifications: Arc::new(sink.clone()),
            },
        ));

        let state = AppState::new(db_arc, cfg, event_sender);
        let router = build_router(state.clone());

        let mut app = Self {
            router,
            state,
            sink,
            site: Site {
                tower: 0,
                floor_1: 0,
                floor_2: 0,
            },
            element_type_id: 0,
            home_end_client: 0,
            foreign_end_client: 0,
            _event_task: event_task,
            _db_dir: dir,
        };
        app.seed().await;
        app
    }

    async fn seed(&mut self) {
        let db = &*self.state.db;
        let now = Utc::now();

        let accounts = [
            (SUPERADMIN, "Meera", Role::Superadmin, None, 8),
            (ADMIN, "Arjun", Role::Admin, Some(HOME_CLIENT_ID), 8),
            (FOREIGN_ADMIN, "Kiran", Role::Admin, Some(FOREIGN_CLIENT_ID), 8),
            (MANAGER, "Priya", Role::ProjectManager, Some(HOME_CLIENT_ID), 8),
            (ENGINEER, "Asha", Role::SiteEngineer, Some(HOME_CLIENT_ID), 8),
            (EXPIRED, "Dev", Role::ProjectManager, None, -1),
        ];
        for (session_id, name, role, client_id, hours) in accounts {
            let owner = user::ActiveModel {
                name: Set(name.to_string()),
                email: Set(format!("{}@precast.test", name.to_lowercase())),
                role: Set(role.to_string()),
                client_id: Set(client_id),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await
            .expect("seed user");
            session::ActiveModel {
                session_id: Set(session_id.to_string()),
                user_id: Set(owner.id),
                expires_at: Set(now + Duration::hours(hours)),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await
            .expect("seed session");
        }

        self.home_end_client = seed_end_client(db, "Skyline Developers", HOME_CLIENT_ID).await;
        self.foreign_end_client = seed_end_client(db, "Harbour Estates", FOREIGN_CLIENT_ID).await;

        let tower = seed_node(db, "Tower A", None).await;
        self.site = Site {
            tower,
            floor_1: seed_node(db, "Floor 1", Some(tower)).await,
            floor_2: seed_node(db, "Floor 2", Some(tower)).await,
        };

        self.element_type_id = element_type::ActiveModel {
            project_id: Set(PROJECT_ID),
            element_type: Set("WP-01".to_string()),
            element_type_name: Set("Wall Panel".to_string()),
            thickness_mm: Set(200.0),
            length_mm: Set(3000.0),
            height_mm: Set(1000.0),
            density: Set(2500.0),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("seed element type")
        .id;
    }

    /// Resolves one of the seeded session ids.
    pub async fn session(&self, session_id: &str) -> Session {
        self.state
            .sessions
            .lookup(session_id)
            .await
            .expect("session lookup")
            .expect("seeded session")
    }

    /// Creates `count` elements on `floor_id` and registers a produced stock
    /// row for each. Returns the element ids.
    pub async fn produce(&self, count: usize, floor_id: i32) -> Vec<i32> {
        let caller = self.session(SUPERADMIN).await;
        let now = Utc::now();
        let mut ids = Vec::with_capacity(count);
        for n in 0..count {
            let element = element::ActiveModel {
                project_id: Set(PROJECT_ID),
                element_type_id: Set(self.element_type_id),
                name: Set(format!("WP-01-{}-{}", floor_id, n)),
                status: Set(ElementStatus::InProduction),
                disable: Set(false),
                target_location: Set(Some(floor_id)),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&*self.state.db)
            .await
            .expect("seed element");

            self.state
                .services
                .precast_stock
                .create_precast_stock(
                    CreatePrecastStockRequest {
                        element_id: element.id,
                        project_id: PROJECT_ID,
                        stockyard_id: Some(1),
                    },
                    &caller,
                )
                .await
                .expect("register stock");
            ids.push(element.id);
        }
        ids
    }

    /// Produces elements and receives them into the stockyard.
    pub async fn stocked(&self, count: usize, floor_id: i32) -> Vec<i32> {
        let ids = self.produce(count, floor_id).await;
        let (status, _) = self
            .post(
                &format!("/api/v1/projects/{}/stockyard/receive", PROJECT_ID),
                serde_json::json!({ "element_ids": ids }),
                ENGINEER,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        ids
    }

    pub async fn stock_of(&self, element_id: i32) -> precast_stock::Model {
        use sea_orm::{ColumnTrait, QueryFilter};
        precast_stock::Entity::find()
            .filter(precast_stock::Column::ElementId.eq(element_id))
            .one(&*self.state.db)
            .await
            .expect("query stock")
            .expect("stock row")
    }

    /// Checks the disposition invariants for one element: erected and
    /// received stock is requested and was stocked, reserved stock sits on
    /// exactly one open order, and each request logs every step once in
    /// time order.
    pub async fn assert_disposition_invariants(&self, element_id: i32) {
        use sea_orm::{ColumnTrait, QueryFilter, QueryOrder, QuerySelect};
        let db = &*self.state.db;
        let flags = self.stock_of(element_id).await.flags();

        if flags.erected {
            assert!(
                flags.received_in_erection && flags.order_by_erection && flags.stockyard,
                "erected element {element_id}: {flags:?}"
            );
        }
        if flags.received_in_erection {
            assert!(
                flags.order_by_erection && flags.stockyard,
                "received element {element_id}: {flags:?}"
            );
        }

        let open_orders = dispatch_order_item::Entity::find()
            .inner_join(dispatch_order::Entity)
            .filter(dispatch_order_item::Column::ElementId.eq(element_id))
            .filter(
                dispatch_order::Column::Status
                    .is_in([DispatchStatus::Dispatched, DispatchStatus::InTransit]),
            )
            .all(db)
            .await
            .expect("query open orders")
            .len();
        if flags.dispatch_status {
            assert!(flags.stockyard, "reserved element {element_id}: {flags:?}");
            assert_eq!(open_orders, 1, "open orders holding element {element_id}");
        }

        let logs = stock_erected_log::Entity::find()
            .filter(stock_erected_log::Column::ElementId.eq(element_id))
            .order_by_asc(stock_erected_log::Column::Id)
            .all(db)
            .await
            .expect("query erection logs");
        for pair in logs.windows(2) {
            assert!(
                pair[0].action_timestamp <= pair[1].action_timestamp,
                "erection logs out of order for element {element_id}"
            );
        }
        for status in [ErectionLogStatus::Received, ErectionLogStatus::Erected] {
            let mut per_request: Vec<i32> = logs
                .iter()
                .filter(|log| log.status == status)
                .map(|log| log.stock_erected_id)
                .collect();
            let total = per_request.len();
            per_request.sort_unstable();
            per_request.dedup();
            assert_eq!(total, per_request.len(), "{status:?} logged twice for element {element_id}");
        }
    }

    pub async fn state_of(&self, element_id: i32) -> LifecycleState {
        self.stock_of(element_id).await.lifecycle_state
    }

    pub async fn element(&self, element_id: i32) -> element::Model {
        element::Entity::find_by_id(element_id)
            .one(&*self.state.db)
            .await
            .expect("query element")
            .expect("element row")
    }

    pub async fn disable_element(&self, element_id: i32) {
        let mut row: element::ActiveModel = self.element(element_id).await.into();
        row.disable = Set(true);
        row.update(&*self.state.db).await.expect("disable element");
    }

    /// Sends a request and decodes the JSON body (`Value::Null` when empty).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        session_id: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(id) = session_id {
            builder = builder.header("authorization", id);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json).expect("serialize body"))
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("router error");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, session_id: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, Some(session_id)).await
    }

    pub async fn post(&self, uri: &str, body: Value, session_id: &str) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body), Some(session_id))
            .await
    }

    pub async fn put(&self, uri: &str, body: Value, session_id: &str) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body), Some(session_id))
            .await
    }

    /// Waits briefly for the event worker to record `kind`.
    pub async fn wait_for_event(&self, kind: EventKind) -> bool {
        for _ in 0..50 {
            if self.sink.kinds().contains(&kind) {
                return true;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        false
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

async fn seed_end_client(db: &db::DbPool, name: &str, client_id: i32) -> i32 {
    end_client::ActiveModel {
        name: Set(name.to_string()),
        client_id: Set(client_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed end client")
    .id
}

async fn seed_node(db: &db::DbPool, name: &str, parent_id: Option<i32>) -> i32 {
    precast::ActiveModel {
        project_id: Set(PROJECT_ID),
        name: Set(name.to_string()),
        parent_id: Set(parent_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed precast node")
    .id
}

/// Reads a decimal serialized as a JSON string or number.
pub fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("not a decimal: {other}"),
    }
}

/// A work-order body with one material per `(name, rate, volume)`.
pub fn work_order_body(
    wo_number: &str,
    end_client_id: i32,
    materials: &[(Option<i32>, &str, &str, &str)],
) -> Value {
    let materials: Vec<Value> = materials
        .iter()
        .map(|(id, name, rate, volume)| {
            serde_json::json!({
                "id": id,
                "item_name": name,
                "hsn_code": "6810",
                "unit_rate": rate,
                "volume": volume,
                "tax": "18",
                "tower_id": null,
                "floor_ids": [],
            })
        })
        .collect();
    serde_json::json!({
        "wo_number": wo_number,
        "project_id": PROJECT_ID,
        "end_client_id": end_client_id,
        "wo_date": "2026-01-05",
        "wo_validate": "2026-12-31",
        "total_value": "500000",
        "contact_person": "Rahul Menon",
        "contact_email": "rahul@skyline.test",
        "contact_number": "+91-9800000000",
        "billing_address": "12 Ring Road",
        "shipping_address": "Plot 7, Sector 4",
        "payment_term": { "advance": 30, "on_delivery": 70 },
        "recurrence_patterns": null,
        "comments": null,
        "materials": materials,
        "attachments": ["https://files.test/wo.pdf"],
    })
}
