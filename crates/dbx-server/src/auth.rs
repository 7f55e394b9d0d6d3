//! Authorization gate in front of every API route

use crate::rest::AppState;
use crate::types::ErrorResponse;
use axum::Json;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

/// Decides whether a request may reach the explorer
pub trait AuthGate: Send + Sync {
    fn is_authorized(&self, headers: &HeaderMap) -> bool;
}

/// Accepts `Authorization: Bearer <token>` matching the configured admin token.
///
/// With no token configured nothing is accepted.
#[derive(Clone)]
pub struct BearerTokenGate {
    token: Option<String>,
}

impl BearerTokenGate {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
        }
    }
}

impl AuthGate for BearerTokenGate {
    fn is_authorized(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = self.token.as_deref() else {
            return false;
        };

        headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .is_some_and(|presented| constant_time_eq(presented.as_bytes(), expected.as_bytes()))
    }
}

/// Compare without stopping at the first differing byte
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Middleware that refuses unauthorized requests before any handler runs
pub async fn require_auth(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !state.gate.is_authorized(req.headers()) {
        tracing::warn!(path = %req.uri().path(), "Unauthorized request");
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "unauthorized".to_string(),
            }),
        )
            .into_response();
    }

    next.run(req).await
}
