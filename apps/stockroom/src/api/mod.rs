//! # Stockroom HTTP API Module
//!
//! JSON API over the ledger, using axum.
//!
//! ## Employee Endpoints (always open)
//!
//! - `GET /health` - Health check
//! - `POST /login` - Identify by email
//! - `GET /items`, `GET /items/{id}` - Browse the catalogue
//! - `POST /requisitions/check` - Check stock for draft lines
//! - `POST /requisitions` - Submit a requisition
//! - `GET /employees/{id}/requisitions` - Own requisition history
//!
//! ## Admin Endpoints (Bearer admin key when configured)
//!
//! - Items: `POST /items`, `PUT|DELETE /items/{id}`,
//!   `POST /items/{id}/restock`, `POST /items/{id}/correct`
//! - Requisitions: `GET /requisitions`, `GET /requisitions/{id}`,
//!   `POST /requisitions/{id}/approve`, `POST /requisitions/{id}/reject`
//! - Employees: `GET|POST /employees`, `DELETE /employees/{id}`
//! - Reports: `GET /history`, `GET /reports/{summary,low-stock,departments,top-items}`
//! - CSV: `GET /export/items.csv`, `GET /export/history.csv`, `POST /import/items`

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{AdminKey, is_employee_route};
pub use middleware::create_rate_limiter;
pub use types::{
    ApiResponse, CheckRequest, DecisionRequest, HealthResponse, LoginRequest, StockRequest,
    SubmitRequest, status_for,
};

use crate::config::Config;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use std::sync::Arc;
use stockroom_core::{Ledger, StockroomError};
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the ledger.
#[derive(Clone)]
pub struct AppState {
    /// Writers (every mutation) are serialised by this lock.
    pub ledger: Arc<RwLock<Ledger>>,
}

impl AppState {
    #[must_use]
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

const CORS_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

/// Build the CORS layer from the configured origins.
///
/// - `["*"]`: allows all origins
/// - empty: localhost only
/// - otherwise: exactly the listed origins
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(hv) => {
                tracing::info!("CORS: Allowing origin: {}", origin);
                Some(hv)
            }
            Err(e) => {
                tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        if !origins.is_empty() {
            tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
        }
        return build_localhost_cors();
    }

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(CORS_METHODS)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(CORS_METHODS)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate limiting (if enabled)
/// 5. Admin authentication (if a key is configured)
pub fn create_router(state: AppState, config: &Config) -> Router {
    let cors = build_cors_layer(&config.cors_origins);

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/login", post(handlers::login_handler))
        .route(
            "/items",
            get(handlers::list_items_handler).post(handlers::create_item_handler),
        )
        .route(
            "/items/{id}",
            get(handlers::get_item_handler)
                .put(handlers::update_item_handler)
                .delete(handlers::delete_item_handler),
        )
        .route("/items/{id}/restock", post(handlers::restock_handler))
        .route("/items/{id}/correct", post(handlers::correct_handler))
        .route(
            "/requisitions",
            get(handlers::list_requisitions_handler).post(handlers::submit_handler),
        )
        .route("/requisitions/check", post(handlers::check_handler))
        .route("/requisitions/{id}", get(handlers::get_requisition_handler))
        .route("/requisitions/{id}/approve", post(handlers::approve_handler))
        .route("/requisitions/{id}/reject", post(handlers::reject_handler))
        .route(
            "/employees",
            get(handlers::list_employees_handler).post(handlers::create_employee_handler),
        )
        .route(
            "/employees/{id}",
            axum::routing::delete(handlers::delete_employee_handler),
        )
        .route(
            "/employees/{id}/requisitions",
            get(handlers::employee_requisitions_handler),
        )
        .route("/history", get(handlers::history_handler))
        .route("/reports/summary", get(handlers::summary_handler))
        .route("/reports/low-stock", get(handlers::low_stock_handler))
        .route("/reports/departments", get(handlers::departments_handler))
        .route("/reports/top-items", get(handlers::top_items_handler))
        .route("/export/items.csv", get(handlers::export_items_handler))
        .route("/export/history.csv", get(handlers::export_history_handler))
        .route("/import/items", post(handlers::import_items_handler));

    // Authentication (innermost - runs last on request)
    match config.admin_key() {
        Some(key) => {
            tracing::info!("Admin key authentication enabled");
            router = router.layer(axum_middleware::from_fn_with_state(
                AdminKey(Arc::from(key)),
                auth::admin_auth_middleware,
            ));
        }
        None => {
            tracing::warn!(
                "Admin key authentication DISABLED - admin endpoints are publicly accessible! \
                 Set STOCKROOM_ADMIN_KEY or admin_key in the config file."
            );
        }
    }

    if config.rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", config.rate_limit);
        router = router.layer(axum_middleware::from_fn_with_state(
            create_rate_limiter(config.rate_limit),
            middleware::rate_limit_middleware,
        ));
    } else {
        tracing::info!("Rate limiting disabled");
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(config.max_body_bytes)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and run until Ctrl+C.
pub async fn run_server(config: &Config, ledger: Ledger) -> Result<(), StockroomError> {
    let addr = config.bind_addr();
    let router = create_router(AppState::new(ledger), config);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| StockroomError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Stockroom HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| StockroomError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
