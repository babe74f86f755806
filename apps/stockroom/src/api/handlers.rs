//! # API Endpoint Handlers
//!
//! Thin adapters between HTTP and the ledger. Reads take the shared lock,
//! mutations take the exclusive one.

use super::{
    AppState,
    types::{
        ApiError, ApiResponse, ApiResult, CheckRequest, DEFAULT_TOP_ITEMS, DecisionRequest,
        HealthResponse, HistoryQuery, LimitQuery, LoginRequest, StatusQuery, StockRequest,
        SubmitRequest,
    },
};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use stockroom_core::{
    Availability, DepartmentUsage, Employee, EmployeeId, ImportSummary, Item, ItemDraft, ItemId,
    ItemPatch, ItemUsage, LowStockEntry, NewEmployee, Requisition, RequisitionId, Summary,
    TransactionRecord,
};

fn created<T: serde::Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, Json(ApiResponse::ok(data)))
}

fn csv_download(filename: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

// =============================================================================
// HEALTH
// =============================================================================

pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let ledger = state.ledger.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        persistent: ledger.is_persistent(),
    })
}

// =============================================================================
// EMPLOYEE ROUTES
// =============================================================================

/// Identify an employee by email. There are no passwords.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Employee> {
    let ledger = state.ledger.read().await;
    match ledger.login(&request.email) {
        Ok(employee) => {
            tracing::info!(event = "login", employee_id = %employee.id, "Employee signed in");
            Ok(Json(ApiResponse::ok(employee)))
        }
        Err(e) => {
            tracing::warn!(event = "login_failure", "Unknown email");
            Err(e.into())
        }
    }
}

pub async fn list_items_handler(State(state): State<AppState>) -> ApiResult<Vec<Item>> {
    let ledger = state.ledger.read().await;
    Ok(Json(ApiResponse::ok(ledger.items()?)))
}

pub async fn get_item_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Item> {
    let ledger = state.ledger.read().await;
    Ok(Json(ApiResponse::ok(ledger.item(ItemId(id))?)))
}

/// Per-line availability for a draft requisition.
pub async fn check_handler(
    State(state): State<AppState>,
    Json(request): Json<CheckRequest>,
) -> ApiResult<Vec<Availability>> {
    let ledger = state.ledger.read().await;
    Ok(Json(ApiResponse::ok(
        ledger.check_availability(&request.lines)?,
    )))
}

pub async fn submit_handler(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut ledger = state.ledger.write().await;
    let requisition = ledger.submit_requisition(EmployeeId(request.employee_id), &request.lines)?;
    tracing::info!(
        event = "requisition_submitted",
        requisition_id = %requisition.id,
        employee_id = %requisition.employee_id,
        lines = requisition.lines.len(),
        "Requisition submitted"
    );
    Ok(created(requisition))
}

/// An employee's own requisitions, newest first.
pub async fn employee_requisitions_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Vec<Requisition>> {
    let ledger = state.ledger.read().await;
    Ok(Json(ApiResponse::ok(
        ledger.employee_requisitions(EmployeeId(id))?,
    )))
}

// =============================================================================
// ADMIN: ITEMS
// =============================================================================

pub async fn create_item_handler(
    State(state): State<AppState>,
    Json(draft): Json<ItemDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let mut ledger = state.ledger.write().await;
    let item = ledger.add_item(&draft)?;
    tracing::info!(event = "item_created", item_id = %item.id, "Item added");
    Ok(created(item))
}

pub async fn update_item_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(patch): Json<ItemPatch>,
) -> ApiResult<Item> {
    let mut ledger = state.ledger.write().await;
    let item = ledger.update_item(ItemId(id), &patch)?;
    tracing::info!(event = "item_updated", item_id = %item.id, "Item updated");
    Ok(Json(ApiResponse::ok(item)))
}

pub async fn delete_item_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Item> {
    let mut ledger = state.ledger.write().await;
    let item = ledger.remove_item(ItemId(id))?;
    tracing::info!(event = "item_removed", item_id = %item.id, "Item removed");
    Ok(Json(ApiResponse::ok(item)))
}

pub async fn restock_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<StockRequest>,
) -> ApiResult<Item> {
    let mut ledger = state.ledger.write().await;
    let item = ledger.restock(ItemId(id), request.quantity, request.note.as_deref())?;
    tracing::info!(
        event = "restock",
        item_id = %item.id,
        added = request.quantity,
        quantity = item.quantity,
        "Item restocked"
    );
    Ok(Json(ApiResponse::ok(item)))
}

pub async fn correct_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<StockRequest>,
) -> ApiResult<Item> {
    let mut ledger = state.ledger.write().await;
    let item = ledger.correct_stock(ItemId(id), request.quantity, request.note.as_deref())?;
    tracing::info!(
        event = "stock_corrected",
        item_id = %item.id,
        quantity = item.quantity,
        "Stock corrected"
    );
    Ok(Json(ApiResponse::ok(item)))
}

// =============================================================================
// ADMIN: REQUISITIONS
// =============================================================================

/// All requisitions, or one status with `?status=`. Oldest first.
pub async fn list_requisitions_handler(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Vec<Requisition>> {
    let status = query.status()?;
    let ledger = state.ledger.read().await;
    Ok(Json(ApiResponse::ok(ledger.requisitions(status)?)))
}

pub async fn get_requisition_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Requisition> {
    let ledger = state.ledger.read().await;
    Ok(Json(ApiResponse::ok(ledger.requisition(RequisitionId(id))?)))
}

pub async fn approve_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    request: Option<Json<DecisionRequest>>,
) -> ApiResult<Requisition> {
    let notes = request.and_then(|Json(r)| r.notes);
    let mut ledger = state.ledger.write().await;
    match ledger.approve_requisition(RequisitionId(id), notes.as_deref()) {
        Ok(requisition) => {
            tracing::info!(
                event = "requisition_approved",
                requisition_id = %requisition.id,
                units = requisition.total_quantity(),
                "Requisition approved"
            );
            Ok(Json(ApiResponse::ok(requisition)))
        }
        Err(e) => {
            tracing::warn!(
                event = "approval_refused",
                requisition_id = id,
                error = %e,
                "Requisition not approved"
            );
            Err(e.into())
        }
    }
}

pub async fn reject_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    request: Option<Json<DecisionRequest>>,
) -> ApiResult<Requisition> {
    let notes = request.and_then(|Json(r)| r.notes);
    let mut ledger = state.ledger.write().await;
    let requisition = ledger.reject_requisition(RequisitionId(id), notes.as_deref())?;
    tracing::info!(
        event = "requisition_rejected",
        requisition_id = %requisition.id,
        "Requisition rejected"
    );
    Ok(Json(ApiResponse::ok(requisition)))
}

// =============================================================================
// ADMIN: EMPLOYEES
// =============================================================================

pub async fn list_employees_handler(State(state): State<AppState>) -> ApiResult<Vec<Employee>> {
    let ledger = state.ledger.read().await;
    Ok(Json(ApiResponse::ok(ledger.employees()?)))
}

pub async fn create_employee_handler(
    State(state): State<AppState>,
    Json(employee): Json<NewEmployee>,
) -> Result<impl IntoResponse, ApiError> {
    let mut ledger = state.ledger.write().await;
    let employee = ledger.add_employee(&employee)?;
    tracing::info!(event = "employee_created", employee_id = %employee.id, "Employee added");
    Ok(created(employee))
}

pub async fn delete_employee_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Employee> {
    let mut ledger = state.ledger.write().await;
    let employee = ledger.remove_employee(EmployeeId(id))?;
    tracing::info!(event = "employee_removed", employee_id = %employee.id, "Employee removed");
    Ok(Json(ApiResponse::ok(employee)))
}

// =============================================================================
// ADMIN: HISTORY & REPORTS
// =============================================================================

pub async fn history_handler(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<TransactionRecord>> {
    let filter = query.to_filter()?;
    let ledger = state.ledger.read().await;
    Ok(Json(ApiResponse::ok(ledger.history(&filter)?)))
}

pub async fn summary_handler(State(state): State<AppState>) -> ApiResult<Summary> {
    let ledger = state.ledger.read().await;
    Ok(Json(ApiResponse::ok(ledger.summary()?)))
}

pub async fn low_stock_handler(State(state): State<AppState>) -> ApiResult<Vec<LowStockEntry>> {
    let ledger = state.ledger.read().await;
    Ok(Json(ApiResponse::ok(ledger.low_stock()?)))
}

pub async fn departments_handler(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<DepartmentUsage>> {
    let filter = query.to_filter()?;
    let ledger = state.ledger.read().await;
    Ok(Json(ApiResponse::ok(ledger.department_usage(&filter)?)))
}

pub async fn top_items_handler(
    State(state): State<AppState>,
    Query(limit): Query<LimitQuery>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<ItemUsage>> {
    let filter = query.to_filter()?;
    let limit = limit.limit.unwrap_or(DEFAULT_TOP_ITEMS);
    let ledger = state.ledger.read().await;
    Ok(Json(ApiResponse::ok(ledger.top_items(&filter, limit)?)))
}

// =============================================================================
// ADMIN: IMPORT / EXPORT
// =============================================================================

pub async fn export_items_handler(
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let ledger = state.ledger.read().await;
    Ok(csv_download("items.csv", ledger.export_items_csv()?))
}

pub async fn export_history_handler(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Response, ApiError> {
    let filter = query.to_filter()?;
    let ledger = state.ledger.read().await;
    Ok(csv_download("history.csv", ledger.export_history_csv(&filter)?))
}

/// Create or update items from a CSV body.
pub async fn import_items_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<ImportSummary> {
    let mut ledger = state.ledger.write().await;
    let summary = ledger.import_items_csv(&body)?;
    tracing::info!(
        event = "items_imported",
        created = summary.created,
        updated = summary.updated,
        "Items imported"
    );
    Ok(Json(ApiResponse::ok(summary)))
}
