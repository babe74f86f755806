//! # Admin Authentication
//!
//! Admin key authentication for the Stockroom HTTP API.
//!
//! Employee routes stay open (employees identify themselves by email).
//! Every other route is an admin route and, when an admin key is
//! configured, requires:
//! ```text
//! Authorization: Bearer <admin-key>
//! ```

use super::types::ApiResponse;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// The configured admin key, shared with the middleware.
#[derive(Clone)]
pub struct AdminKey(pub Arc<str>);

impl std::fmt::Debug for AdminKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AdminKey(..)")
    }
}

/// Whether a request may be served without the admin key.
pub fn is_employee_route(method: &Method, path: &str) -> bool {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    match (method, segments.as_slice()) {
        (&Method::GET, ["health"]) => true,
        (&Method::POST, ["login"]) => true,
        (&Method::GET, ["items"]) => true,
        (&Method::GET, ["items", id]) => id.parse::<u64>().is_ok(),
        (&Method::POST, ["requisitions"]) => true,
        (&Method::POST, ["requisitions", "check"]) => true,
        (&Method::GET, ["employees", id, "requisitions"]) => id.parse::<u64>().is_ok(),
        _ => false,
    }
}

/// Compare keys in constant time.
///
/// Both keys are padded to the same length so `ct_eq` always runs over
/// the same number of bytes.
fn keys_match(provided: &str, expected: &str) -> bool {
    let provided_bytes = provided.as_bytes();
    let expected_bytes = expected.as_bytes();

    let max_len = provided_bytes.len().max(expected_bytes.len());
    let mut padded_provided = vec![0u8; max_len];
    let mut padded_expected = vec![0u8; max_len];
    padded_provided[..provided_bytes.len()].copy_from_slice(provided_bytes);
    padded_expected[..expected_bytes.len()].copy_from_slice(expected_bytes);

    let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
    bytes_match && provided_bytes.len() == expected_bytes.len()
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
fn bearer_token(request: &Request<Body>) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

fn unauthorized(reason: &'static str, path: &str) -> Response {
    tracing::warn!(event = "auth_failure", reason, path, "Admin route refused");
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Bearer")],
        Json(ApiResponse::<()>::error("Admin key required")),
    )
        .into_response()
}

/// Admin key middleware. Only installed when a key is configured.
pub async fn admin_auth_middleware(
    State(expected): State<AdminKey>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method();
    if method == Method::OPTIONS || is_employee_route(method, request.uri().path()) {
        return next.run(request).await;
    }

    let refusal = match bearer_token(&request) {
        Some(token) if keys_match(token, &expected.0) => None,
        Some(_) => Some("invalid_admin_key"),
        None => Some("missing_bearer_token"),
    };
    match refusal {
        None => next.run(request).await,
        Some(reason) => unauthorized(reason, request.uri().path()),
    }
}

// =============================================================================
// TESTS
// =============================================================================
