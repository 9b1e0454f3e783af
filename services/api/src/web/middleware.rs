//! services/api/src/web/middleware.rs
//!
//! Identity middleware for protecting routes.

use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use doc_studio_core::domain::Identity;
use tracing::debug;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Reads the identity forwarded by the sign-in provider.
///
/// Returns `None` when the user id header is missing or blank.
pub fn identity_from_headers(headers: &HeaderMap) -> Option<Identity> {
    Some(Identity {
        id: header_value(headers, USER_ID_HEADER)?,
        name: header_value(headers, USER_NAME_HEADER),
        email: header_value(headers, USER_EMAIL_HEADER),
    })
}

/// Middleware that extracts the caller's `Identity` from request headers.
///
/// If present, inserts the identity into request extensions for handlers to use.
/// If missing, returns 401 Unauthorized.
pub async fn require_identity(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let identity = identity_from_headers(req.headers()).ok_or_else(|| {
        debug!(path = %req.uri().path(), "Rejected request without identity.");
        StatusCode::UNAUTHORIZED
    })?;
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
