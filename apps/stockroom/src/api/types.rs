//! # API Request/Response Types
//!
//! JSON structures for the HTTP API and the mapping from ledger errors
//! to HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use stockroom_core::{
    HistoryFilter, ItemId, LineRequest, RequisitionStatus, StockroomError, TransactionKind,
    parse_date_bound,
};

// =============================================================================
// RESPONSE ENVELOPE
// =============================================================================

/// Every JSON response uses this envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Health check payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub persistent: bool,
}

// =============================================================================
// ERRORS
// =============================================================================

/// A ledger error on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub StockroomError);

impl From<StockroomError> for ApiError {
    fn from(e: StockroomError) -> Self {
        Self(e)
    }
}

/// HTTP status for a ledger error.
pub fn status_for(error: &StockroomError) -> StatusCode {
    match error {
        StockroomError::ItemNotFound(_)
        | StockroomError::EmployeeNotFound(_)
        | StockroomError::RequisitionNotFound(_) => StatusCode::NOT_FOUND,
        StockroomError::UnknownEmail(_) => StatusCode::UNAUTHORIZED,
        StockroomError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        StockroomError::DuplicateItem(_)
        | StockroomError::DuplicateEmail(_)
        | StockroomError::InsufficientStock { .. }
        | StockroomError::AlreadyProcessed { .. }
        | StockroomError::ItemInUse(_)
        | StockroomError::EmployeeHasPending(_) => StatusCode::CONFLICT,
        StockroomError::SerializationError(_) | StockroomError::IoError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(event = "ledger_error", error = %self.0, "Request failed");
        }
        (status, Json(ApiResponse::<()>::error(self.0.to_string()))).into_response()
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

// =============================================================================
// REQUESTS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
}

/// Lines to check against current stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRequest {
    pub lines: Vec<LineRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub employee_id: u64,
    pub lines: Vec<LineRequest>,
}

/// Restock amount or corrected absolute quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockRequest {
    pub quantity: u64,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

/// `?status=` for the requisition list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

impl StatusQuery {
    pub fn status(&self) -> Result<Option<RequisitionStatus>, StockroomError> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => Ok(None),
            Some(s) => RequisitionStatus::parse(s).map(Some).ok_or_else(|| {
                StockroomError::InvalidInput(format!(
                    "unknown status '{}': expected pending, approved or rejected",
                    s
                ))
            }),
        }
    }
}

/// History filter as query parameters. Dates are `YYYY-MM-DD` or RFC 3339.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub department: Option<String>,
    pub employee: Option<String>,
    pub kind: Option<String>,
    pub item_id: Option<u64>,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl HistoryQuery {
    pub fn to_filter(&self) -> Result<HistoryFilter, StockroomError> {
        let kind = non_empty(self.kind.as_ref())
            .map(|k| {
                TransactionKind::parse(k).ok_or_else(|| {
                    StockroomError::InvalidInput(format!("unknown history kind '{}'", k))
                })
            })
            .transpose()?;
        Ok(HistoryFilter {
            from: non_empty(self.from.as_ref())
                .map(|v| parse_date_bound(v, false))
                .transpose()?,
            to: non_empty(self.to.as_ref())
                .map(|v| parse_date_bound(v, true))
                .transpose()?,
            department: non_empty(self.department.as_ref()).map(str::to_string),
            employee: non_empty(self.employee.as_ref()).map(str::to_string),
            kind,
            item_id: self.item_id.map(ItemId),
        })
    }
}

/// `?limit=` for ranked reports. Extracted next to a `HistoryQuery`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// Default number of rows in the top-items report.
pub const DEFAULT_TOP_ITEMS: usize = 10;

// =============================================================================
// TESTS
// =============================================================================
