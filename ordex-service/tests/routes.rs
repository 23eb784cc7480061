mod common;

use std::time::Duration;

use ordex_core::config::ServiceConfig;
use ordex_core::model::{NewOrder, OrderStatus};
use ordex_service::{router, AppState};
use ordex_store::OrderStore;
use sqlx::sqlite::SqlitePoolOptions;
use tempfile::TempDir;

struct TestApp {
    base: String,
    store: OrderStore,
    metrics_dir: TempDir,
}

impl TestApp {
    fn metrics_csv(&self) -> String {
        std::fs::read_to_string(self.metrics_dir.path().join("metrics_log.csv")).unwrap()
    }
}

async fn memory_store() -> OrderStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    OrderStore::with_pool(pool).await.unwrap()
}

/// Spin up the service with stubbed auth/certificate/sibling collaborators.
async fn test_app(siblings: Vec<String>) -> TestApp {
    let auth_url = common::spawn(common::auth_stub("alice")).await;
    let certificate_url = common::spawn(common::certificate_stub()).await;
    let metrics_dir = TempDir::new().unwrap();

    let config = ServiceConfig {
        instance: "1".into(),
        auth_url,
        certificate_url,
        siblings,
        http_timeout: Duration::from_secs(2),
        metrics_path: metrics_dir.path().join("metrics_log.csv"),
        ..ServiceConfig::default()
    };
    let store = memory_store().await;
    let base = common::spawn(router(AppState::build(config, store.clone()).unwrap())).await;
    TestApp {
        base,
        store,
        metrics_dir,
    }
}

#[tokio::test]
async fn health_reports_instance_without_auth() {
    let app = test_app(vec![]).await;
    let body: serde_json::Value = reqwest::get(format!("{}/health", app.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["instance"], "1");
    assert_eq!(body["service"], "ordex");
}

#[tokio::test]
async fn orders_lists_local_rows_without_auth() {
    let app = test_app(vec![]).await;
    app.store
        .create_order(NewOrder {
            order_id: "alice-1".into(),
            product_id: "p1".into(),
            quantity_ordered: 5,
            status: OrderStatus::Confirmed,
        })
        .await
        .unwrap();

    let body: serde_json::Value = reqwest::get(format!("{}/orders", app.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["orders"][0]["order_id"], "alice-1");
    assert_eq!(body["orders"][0]["status"], "confirmed");
}

#[tokio::test]
async fn create_order_requires_a_bearer_token() {
    let app = test_app(vec![]).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/create_order", app.base))
        .json(&serde_json::json!({ "product_id": "p1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = client
        .post(format!("{}/create_order", app.base))
        .header("Authorization", "Basic abc")
        .json(&serde_json::json!({ "product_id": "p1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn create_order_commits_and_stamps() {
    let app = test_app(vec![]).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/create_order", app.base))
        .header("Authorization", "Bearer token")
        .json(&serde_json::json!({ "product_id": "p1", "quantity": 7 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Order created");
    assert!(body["order_id"].as_str().unwrap().starts_with("alice-"));
    assert_eq!(body["certificate"]["certificate"], "deadbeef");

    let orders = app.store.list_orders().await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].quantity_ordered, 7);
    assert_eq!(orders[0].status, OrderStatus::Confirmed);
}

#[tokio::test]
async fn create_order_defaults_quantity_to_fifty() {
    let app = test_app(vec![]).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/create_order", app.base))
        .header("Authorization", "Bearer token")
        .json(&serde_json::json!({ "product_id": "p1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let orders = app.store.list_orders().await.unwrap();
    assert_eq!(orders[0].quantity_ordered, 50);
}

#[tokio::test]
async fn history_aggregates_siblings_and_stamps() {
    let sibling_a = common::spawn(common::sibling_stub(serde_json::json!([
        common::sibling_order(1, "alice-1"),
    ])))
    .await;
    let sibling_b = common::spawn(common::sibling_stub(serde_json::json!([
        common::sibling_order(1, "alice-1"),
        common::sibling_order(2, "alice-2"),
    ])))
    .await;
    let app = test_app(vec![sibling_a, sibling_b]).await;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/history", app.base))
        .header("Authorization", "Bearer token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();

    let ids: Vec<_> = body["orders"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["order_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["alice-1", "alice-2"]);
    assert_eq!(body["certificate"]["certificate"], "deadbeef");
}

#[tokio::test]
async fn metric_records_of_one_request_share_a_correlation_id() {
    let app = test_app(vec![]).await;
    let client = reqwest::Client::new();

    client
        .get(format!("{}/history", app.base))
        .header("Authorization", "Bearer token")
        .send()
        .await
        .unwrap();

    let csv = app.metrics_csv();
    let lines: Vec<_> = csv.lines().collect();
    // Header plus two records from the identity extractor (credential check
    // and access decision) and one from the history handler.
    assert_eq!(lines[0], "request_id,timestamp,event_type,user,status,details");
    assert_eq!(lines.len(), 4);
    let id_of = |line: &str| line.split(',').next().unwrap().to_string();
    assert_eq!(id_of(lines[1]), id_of(lines[2]));
    assert_eq!(id_of(lines[1]), id_of(lines[3]));

    // A second request gets a fresh correlation id.
    client
        .get(format!("{}/history", app.base))
        .header("Authorization", "Bearer token")
        .send()
        .await
        .unwrap();
    let csv = app.metrics_csv();
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines.len(), 7);
    assert_ne!(id_of(lines[1]), id_of(lines[4]));
}

#[tokio::test]
async fn auth_steps_are_logged_under_their_own_event_types() {
    let app = test_app(vec![]).await;
    let client = reqwest::Client::new();

    client
        .get(format!("{}/history", app.base))
        .header("Authorization", "Bearer token")
        .send()
        .await
        .unwrap();

    let csv = app.metrics_csv();
    let lines: Vec<_> = csv.lines().collect();
    let fields: Vec<Vec<&str>> = lines[1..].iter().map(|l| l.split(',').collect()).collect();
    assert_eq!(
        (fields[0][2], fields[0][3], fields[0][4], fields[0][5]),
        ("jwt_validation", "alice", "success", "token_valid")
    );
    assert_eq!(
        (fields[1][2], fields[1][3], fields[1][4], fields[1][5]),
        ("authorization", "alice", "success", "access_granted")
    );
}

#[tokio::test]
async fn rejected_auth_writes_a_failed_validation_record() {
    let app = test_app(vec![]).await;

    let response = reqwest::Client::new()
        .get(format!("{}/history", app.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let csv = app.metrics_csv();
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    let fields: Vec<&str> = lines[1].split(',').collect();
    assert_eq!(fields[2], "jwt_validation");
    assert_eq!(fields[3], "");
    assert_eq!(fields[4], "failed");
    assert_eq!(fields[5], "missing_token");
}

#[tokio::test]
async fn duplicate_order_id_surfaces_as_internal_error() {
    let app = test_app(vec![]).await;

    // Occupy every order id the handler could mint over the next seconds,
    // so the insert collides the way two same-second submissions would.
    let now = chrono::Utc::now().timestamp();
    for ts in now..now + 5 {
        app.store
            .create_order(NewOrder {
                order_id: format!("alice-{ts}"),
                product_id: "p1".into(),
                quantity_ordered: 1,
                status: OrderStatus::Confirmed,
            })
            .await
            .unwrap();
    }

    let response = reqwest::Client::new()
        .post(format!("{}/create_order", app.base))
        .header("Authorization", "Bearer token")
        .json(&serde_json::json!({ "product_id": "p1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
}
