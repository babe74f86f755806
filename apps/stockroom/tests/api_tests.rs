//! Integration tests for the Stockroom HTTP API.
//!
//! Uses axum-test to drive the router without binding a socket.

#![allow(clippy::unwrap_used, clippy::panic)]

use axum::body::Body;
use axum::http::{HeaderValue, Request};
use axum_test::TestServer;
use serde_json::{Value, json};
use stockroom::api::{ApiResponse, AppState, HealthResponse, create_router};
use stockroom::config::Config;
use stockroom_core::{
    Employee, ImportSummary, Item, Ledger, LineRequest, LowStockEntry, Requisition, RequisitionId,
    RequisitionStatus, Summary, TransactionRecord,
};
use tower::ServiceExt;

const ADMIN_KEY: &str = "test-admin-key-12345";

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn test_config(admin_key: Option<&str>) -> Config {
    Config {
        admin_key: admin_key.map(str::to_string),
        rate_limit: 0,
        ..Config::default()
    }
}

/// Server over a seeded in-memory ledger, admin routes open.
fn create_test_server() -> TestServer {
    let mut ledger = Ledger::in_memory();
    ledger.seed_if_empty().unwrap();
    let router = create_router(AppState::new(ledger), &test_config(None));
    TestServer::new(router).unwrap()
}

fn create_auth_test_server() -> TestServer {
    let mut ledger = Ledger::in_memory();
    ledger.seed_if_empty().unwrap();
    let router = create_router(AppState::new(ledger), &test_config(Some(ADMIN_KEY)));
    TestServer::new(router).unwrap()
}

fn bearer(key: &str) -> HeaderValue {
    format!("Bearer {}", key).parse::<HeaderValue>().unwrap()
}

async fn login(server: &TestServer, email: &str) -> Employee {
    let response = server.post("/login").json(&json!({ "email": email })).await;
    response.assert_status_ok();
    let body: ApiResponse<Employee> = response.json();
    body.data.unwrap()
}

async fn item_named(server: &TestServer, name: &str) -> Item {
    let body: ApiResponse<Vec<Item>> = server.get("/items").await.json();
    body.data
        .unwrap()
        .into_iter()
        .find(|i| i.name == name)
        .unwrap()
}

async fn submit(server: &TestServer, employee: &Employee, lines: Value) -> Requisition {
    let response = server
        .post("/requisitions")
        .json(&json!({ "employee_id": employee.id.0, "lines": lines }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let body: ApiResponse<Requisition> = response.json();
    body.data.unwrap()
}

// =============================================================================
// HEALTH AND LOGIN
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    assert!(!health.persistent);
}

#[tokio::test]
async fn test_login_known_email() {
    let server = create_test_server();

    let john = login(&server, "John@Company.com").await;

    assert_eq!(john.name, "John Doe");
    assert_eq!(john.department, "IT");
}

#[tokio::test]
async fn test_login_unknown_email() {
    let server = create_test_server();

    let response = server
        .post("/login")
        .json(&json!({ "email": "nobody@company.com" }))
        .await;

    response.assert_status_unauthorized();
    let body: ApiResponse<Value> = response.json();
    assert!(!body.success);
    assert!(body.data.is_none());
    assert!(body.error.is_some());
}

// =============================================================================
// ITEMS
// =============================================================================

#[tokio::test]
async fn test_list_items_in_id_order() {
    let server = create_test_server();

    let response = server.get("/items").await;

    response.assert_status_ok();
    let body: ApiResponse<Vec<Item>> = response.json();
    assert!(body.success);
    assert!(body.error.is_none());
    let items = body.data.unwrap();
    assert_eq!(items.len(), 10);
    assert!(items.windows(2).all(|w| w[0].id < w[1].id));
}

#[tokio::test]
async fn test_get_missing_item() {
    let server = create_test_server();

    let response = server.get("/items/999").await;

    response.assert_status_not_found();
    let body: ApiResponse<Value> = response.json();
    assert!(!body.success);
}

#[tokio::test]
async fn test_create_item_and_duplicate() {
    let server = create_test_server();

    let response = server
        .post("/items")
        .json(&json!({ "name": "Tape", "quantity": 12, "unit": "roll", "min_stock": 4 }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let body: ApiResponse<Item> = response.json();
    let tape = body.data.unwrap();
    assert_eq!(tape.quantity, 12);
    assert_eq!(tape.unit, "roll");

    let response = server
        .post("/items")
        .json(&json!({ "name": "tape", "quantity": 1 }))
        .await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_restock_increases_quantity() {
    let server = create_test_server();
    let stapler = item_named(&server, "Stapler").await;

    let response = server
        .post(&format!("/items/{}/restock", stapler.id))
        .json(&json!({ "quantity": 10, "note": "delivery" }))
        .await;

    response.assert_status_ok();
    let body: ApiResponse<Item> = response.json();
    assert_eq!(body.data.unwrap().quantity, stapler.quantity + 10);
}

#[tokio::test]
async fn test_malformed_json_is_client_error() {
    let server = create_test_server();

    let response = server
        .post("/items")
        .content_type("application/json")
        .bytes(bytes::Bytes::from("not valid json"))
        .await;

    assert!(response.status_code().is_client_error());
}

// =============================================================================
// REQUISITION WORKFLOW
// =============================================================================

#[tokio::test]
async fn test_check_reports_shortfall() {
    let server = create_test_server();
    let stapler = item_named(&server, "Stapler").await;

    let response = server
        .post("/requisitions/check")
        .json(&json!({ "lines": [{ "item_id": stapler.id.0, "quantity": 1000 }] }))
        .await;

    response.assert_status_ok();
    let body: ApiResponse<Value> = response.json();
    let lines = body.data.unwrap();
    assert_eq!(lines[0]["sufficient"], json!(false));
    assert_eq!(lines[0]["available"], json!(stapler.quantity));
}

#[tokio::test]
async fn test_submit_then_approve_decrements_stock() {
    let server = create_test_server();
    let john = login(&server, "john@company.com").await;
    let pen = item_named(&server, "Pen").await;
    let paper = item_named(&server, "A4 Paper").await;

    let requisition = submit(
        &server,
        &john,
        json!([
            { "item_id": pen.id.0, "quantity": 5 },
            { "item_id": paper.id.0, "quantity": 2 }
        ]),
    )
    .await;
    assert_eq!(requisition.status, RequisitionStatus::Pending);
    assert_eq!(requisition.lines.len(), 2);

    let response = server
        .post(&format!("/requisitions/{}/approve", requisition.id))
        .json(&json!({ "notes": "collect at reception" }))
        .await;
    response.assert_status_ok();
    let body: ApiResponse<Requisition> = response.json();
    let approved = body.data.unwrap();
    assert_eq!(approved.status, RequisitionStatus::Approved);
    assert_eq!(approved.admin_notes.as_deref(), Some("collect at reception"));
    assert!(approved.processed_at.is_some());

    assert_eq!(
        item_named(&server, "Pen").await.quantity,
        pen.quantity - 5
    );
    assert_eq!(
        item_named(&server, "A4 Paper").await.quantity,
        paper.quantity - 2
    );

    let body: ApiResponse<Vec<TransactionRecord>> =
        server.get("/history?kind=approved").await.json();
    let records = body.data.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.employee_name == "John Doe"));
}

#[tokio::test]
async fn test_approve_without_body() {
    let server = create_test_server();
    let jane = login(&server, "jane@company.com").await;
    let pencil = item_named(&server, "Pencil").await;
    let requisition = submit(
        &server,
        &jane,
        json!([{ "item_id": pencil.id.0, "quantity": 1 }]),
    )
    .await;

    let response = server
        .post(&format!("/requisitions/{}/approve", requisition.id))
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_insufficient_stock_blocks_approval() {
    let server = create_test_server();
    let bob = login(&server, "bob@company.com").await;
    let stapler = item_named(&server, "Stapler").await;
    let pen = item_named(&server, "Pen").await;

    let requisition = submit(
        &server,
        &bob,
        json!([
            { "item_id": pen.id.0, "quantity": 1 },
            { "item_id": stapler.id.0, "quantity": 5 }
        ]),
    )
    .await;

    // Stocktake finds fewer staplers than the pending requisition needs.
    server
        .post(&format!("/items/{}/correct", stapler.id))
        .json(&json!({ "quantity": 2, "note": "stocktake" }))
        .await
        .assert_status_ok();

    let response = server
        .post(&format!("/requisitions/{}/approve", requisition.id))
        .await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
    let body: ApiResponse<Value> = response.json();
    assert!(!body.success);

    // No line moved and the requisition is still pending.
    assert_eq!(item_named(&server, "Pen").await.quantity, pen.quantity);
    assert_eq!(item_named(&server, "Stapler").await.quantity, 2);
    let body: ApiResponse<Requisition> = server
        .get(&format!("/requisitions/{}", requisition.id))
        .await
        .json();
    assert_eq!(body.data.unwrap().status, RequisitionStatus::Pending);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_approvals_cannot_oversell() {
    let mut ledger = Ledger::in_memory();
    ledger.seed_if_empty().unwrap();
    let john = ledger.login("john@company.com").unwrap();
    let jane = ledger.login("jane@company.com").unwrap();
    let stapler = ledger
        .items()
        .unwrap()
        .into_iter()
        .find(|i| i.name == "Stapler")
        .unwrap();
    let all_staplers = [LineRequest {
        item_id: stapler.id,
        quantity: stapler.quantity,
    }];
    let first = ledger.submit_requisition(john.id, &all_staplers).unwrap();
    let second = ledger.submit_requisition(jane.id, &all_staplers).unwrap();

    let state = AppState::new(ledger);
    let router = create_router(state.clone(), &test_config(None));
    let approve = |id: RequisitionId| {
        let router = router.clone();
        tokio::spawn(async move {
            let request = Request::post(format!("/requisitions/{}/approve", id))
                .body(Body::empty())
                .unwrap();
            router.oneshot(request).await.unwrap().status().as_u16()
        })
    };

    let (a, b) = tokio::join!(approve(first.id), approve(second.id));
    let mut statuses = vec![a.unwrap(), b.unwrap()];
    statuses.sort_unstable();
    assert_eq!(statuses, vec![200, 409]);

    let ledger = state.ledger.read().await;
    assert_eq!(ledger.item(stapler.id).unwrap().quantity, 0);
    let approved = ledger
        .requisitions(Some(RequisitionStatus::Approved))
        .unwrap();
    let pending = ledger
        .requisitions(Some(RequisitionStatus::Pending))
        .unwrap();
    assert_eq!(approved.len(), 1);
    assert_eq!(pending.len(), 1);
}

#[tokio::test]
async fn test_reject_then_approve_conflicts() {
    let server = create_test_server();
    let alice = login(&server, "alice@company.com").await;
    let marker = item_named(&server, "Marker").await;
    let requisition = submit(
        &server,
        &alice,
        json!([{ "item_id": marker.id.0, "quantity": 3 }]),
    )
    .await;

    let response = server
        .post(&format!("/requisitions/{}/reject", requisition.id))
        .json(&json!({ "notes": "over budget" }))
        .await;
    response.assert_status_ok();

    let response = server
        .post(&format!("/requisitions/{}/approve", requisition.id))
        .await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
    assert_eq!(item_named(&server, "Marker").await.quantity, marker.quantity);
}

#[tokio::test]
async fn test_submit_empty_lines_rejected() {
    let server = create_test_server();
    let john = login(&server, "john@company.com").await;

    let response = server
        .post("/requisitions")
        .json(&json!({ "employee_id": john.id.0, "lines": [] }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_requisition_list_filters_by_status() {
    let server = create_test_server();
    let john = login(&server, "john@company.com").await;
    let pen = item_named(&server, "Pen").await;
    let first = submit(&server, &john, json!([{ "item_id": pen.id.0, "quantity": 1 }])).await;
    submit(&server, &john, json!([{ "item_id": pen.id.0, "quantity": 2 }])).await;
    server
        .post(&format!("/requisitions/{}/reject", first.id))
        .await
        .assert_status_ok();

    let body: ApiResponse<Vec<Requisition>> =
        server.get("/requisitions?status=pending").await.json();
    assert_eq!(body.data.unwrap().len(), 1);

    let body: ApiResponse<Vec<Requisition>> = server.get("/requisitions").await.json();
    assert_eq!(body.data.unwrap().len(), 2);

    server
        .get("/requisitions?status=lost")
        .await
        .assert_status_bad_request();

    let body: ApiResponse<Vec<Requisition>> = server
        .get(&format!("/employees/{}/requisitions", john.id))
        .await
        .json();
    let own = body.data.unwrap();
    assert_eq!(own.len(), 2);
    assert!(own[0].id > own[1].id, "newest first");
}

#[tokio::test]
async fn test_employee_with_pending_cannot_be_removed() {
    let server = create_test_server();
    let john = login(&server, "john@company.com").await;
    let pen = item_named(&server, "Pen").await;
    submit(&server, &john, json!([{ "item_id": pen.id.0, "quantity": 1 }])).await;

    let response = server.delete(&format!("/employees/{}", john.id)).await;
    response.assert_status(axum::http::StatusCode::CONFLICT);

    let response = server.delete(&format!("/items/{}", pen.id)).await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
}

// =============================================================================
// REPORTS
// =============================================================================

#[tokio::test]
async fn test_summary_and_low_stock() {
    let server = create_test_server();
    let stapler = item_named(&server, "Stapler").await;

    server
        .post(&format!("/items/{}/correct", stapler.id))
        .json(&json!({ "quantity": 2, "note": "stocktake" }))
        .await
        .assert_status_ok();

    let body: ApiResponse<Vec<LowStockEntry>> = server.get("/reports/low-stock").await.json();
    let low = body.data.unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].item.name, "Stapler");
    assert_eq!(low[0].shortfall, stapler.min_stock - 2);

    let body: ApiResponse<Summary> = server.get("/reports/summary").await.json();
    let summary = body.data.unwrap();
    assert_eq!(summary.item_count, 10);
    assert_eq!(summary.employee_count, 4);
    assert_eq!(summary.low_stock_count, 1);
}

#[tokio::test]
async fn test_history_rejects_bad_date() {
    let server = create_test_server();

    let response = server.get("/history?from=yesterday").await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_department_and_top_item_reports() {
    let server = create_test_server();
    let john = login(&server, "john@company.com").await;
    let jane = login(&server, "jane@company.com").await;
    let pen = item_named(&server, "Pen").await;
    let eraser = item_named(&server, "Eraser").await;

    for (employee, item, quantity) in [(&john, &pen, 7), (&jane, &eraser, 3), (&john, &eraser, 1)] {
        let requisition = submit(
            &server,
            employee,
            json!([{ "item_id": item.id.0, "quantity": quantity }]),
        )
        .await;
        server
            .post(&format!("/requisitions/{}/approve", requisition.id))
            .await
            .assert_status_ok();
    }

    let body: ApiResponse<Value> = server.get("/reports/departments").await.json();
    let departments = body.data.unwrap();
    // Alphabetical: HR before IT.
    assert_eq!(departments[0]["department"], json!("HR"));
    assert_eq!(departments[0]["approved_units"], json!(3));
    assert_eq!(departments[1]["department"], json!("IT"));
    assert_eq!(departments[1]["approved_units"], json!(8));

    let body: ApiResponse<Value> = server.get("/reports/top-items?limit=1").await.json();
    let top = body.data.unwrap();
    assert_eq!(top.as_array().map(Vec::len), Some(1));
    assert_eq!(top[0]["item_name"], json!("Pen"));
}

// =============================================================================
// CSV
// =============================================================================

#[tokio::test]
async fn test_export_items_csv() {
    let server = create_test_server();

    let response = server.get("/export/items.csv").await;

    response.assert_status_ok();
    let text = response.text();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("id,name,category,unit,quantity,min_stock,price_cents,last_updated")
    );
    assert_eq!(lines.count(), 10);
}

#[tokio::test]
async fn test_import_items_csv() {
    let server = create_test_server();
    let csv = "name,category,unit,quantity,min_stock,price_cents\n\
               Pen,Stationery,pcs,40,20,150\n\
               Highlighter,Stationery,pcs,25,5,120\n";

    let response = server
        .post("/import/items")
        .content_type("text/csv")
        .bytes(bytes::Bytes::from(csv))
        .await;

    response.assert_status_ok();
    let body: ApiResponse<ImportSummary> = response.json();
    let summary = body.data.unwrap();
    assert_eq!(summary.created, 1);
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.stock_corrected, 1);
    assert_eq!(item_named(&server, "Pen").await.quantity, 40);
    assert_eq!(item_named(&server, "Highlighter").await.quantity, 25);
}

#[tokio::test]
async fn test_import_bad_row_changes_nothing() {
    let server = create_test_server();
    let csv = "name,quantity\nHighlighter,25\n,3\n";

    let response = server
        .post("/import/items")
        .content_type("text/csv")
        .bytes(bytes::Bytes::from(csv))
        .await;

    response.assert_status_bad_request();
    let body: ApiResponse<Vec<Item>> = server.get("/items").await.json();
    assert_eq!(body.data.unwrap().len(), 10);
}

// =============================================================================
// ADMIN AUTHENTICATION
// =============================================================================

#[tokio::test]
async fn test_employee_routes_open_with_key_configured() {
    let server = create_auth_test_server();

    server.get("/health").await.assert_status_ok();
    server.get("/items").await.assert_status_ok();
    let john = login(&server, "john@company.com").await;
    let pen = item_named(&server, "Pen").await;
    submit(&server, &john, json!([{ "item_id": pen.id.0, "quantity": 1 }])).await;
    server
        .get(&format!("/employees/{}/requisitions", john.id))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_admin_routes_require_key() {
    let server = create_auth_test_server();

    let response = server.get("/requisitions").await;
    response.assert_status_unauthorized();
    assert!(response.headers().contains_key("www-authenticate"));
    let body: ApiResponse<Value> = response.json();
    assert!(!body.success);
    assert!(body.error.is_some());

    let response = server
        .get("/requisitions")
        .add_header(
            axum::http::header::AUTHORIZATION,
            bearer("wrong-key-entirely"),
        )
        .await;
    response.assert_status_unauthorized();

    let response = server
        .get("/requisitions")
        .add_header(axum::http::header::AUTHORIZATION, bearer(ADMIN_KEY))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_approval_requires_key() {
    let server = create_auth_test_server();
    let john = login(&server, "john@company.com").await;
    let pen = item_named(&server, "Pen").await;
    let requisition = submit(&server, &john, json!([{ "item_id": pen.id.0, "quantity": 4 }])).await;

    server
        .post(&format!("/requisitions/{}/approve", requisition.id))
        .await
        .assert_status_unauthorized();
    assert_eq!(item_named(&server, "Pen").await.quantity, pen.quantity);

    server
        .post(&format!("/requisitions/{}/approve", requisition.id))
        .add_header(axum::http::header::AUTHORIZATION, bearer(ADMIN_KEY))
        .await
        .assert_status_ok();
    assert_eq!(item_named(&server, "Pen").await.quantity, pen.quantity - 4);
}

// =============================================================================
// RATE LIMITING
// =============================================================================

#[tokio::test]
async fn test_rate_limit_returns_envelope() {
    let config = Config {
        rate_limit: 1,
        ..Config::default()
    };
    let router = create_router(AppState::new(Ledger::in_memory()), &config);
    let server = TestServer::new(router).unwrap();

    server.get("/health").await.assert_status_ok();
    let response = server.get("/health").await;

    response.assert_status(axum::http::StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));
    let body: ApiResponse<Value> = response.json();
    assert!(!body.success);
}
