//! Optional bearer-token gate in front of the admin API.
//!
//! When no admin token is configured every request passes through; access
//! control is then left to whatever sits in front of the service.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::app::AppState;
use crate::error::AppError;

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Compare without short-circuiting on the first differing byte.
fn tokens_match(provided: &str, expected: &str) -> bool {
    provided.len() == expected.len()
        && provided
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Axum middleware rejecting requests without the configured admin token.
pub async fn require_admin_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.admin_token.as_deref() else {
        return next.run(request).await;
    };

    match bearer_token(&headers) {
        Some(token) if tokens_match(token, expected) => next.run(request).await,
        Some(_) => {
            tracing::warn!("Invalid admin token provided");
            AppError::Auth("Invalid admin token".into()).into_response()
        }
        None => {
            tracing::debug!("No bearer token in Authorization header");
            AppError::Auth("Missing admin token".into()).into_response()
        }
    }
}
