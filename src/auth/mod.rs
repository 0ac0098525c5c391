//! PSK and session-token authentication.
//!
//! Implements constant-time comparison to mitigate timing attacks.

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;

use crate::errors::{codes, AppError, ErrorDetails, ErrorResponse};
use crate::sessions::SessionGate;

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Who made the request, inserted as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// Holder of the pre-shared key, or anyone when no key is configured
    Psk,
    /// A signed-in session
    Session(String),
}

impl Caller {
    /// The session token, or `Unauthorized` for key-only callers.
    pub fn session_token(&self) -> Result<&str, AppError> {
        match self {
            Caller::Session(token) => Ok(token),
            Caller::Psk => Err(AppError::Unauthorized(
                "Sign in first: this endpoint needs a session token".to_string(),
            )),
        }
    }
}

/// Authentication layer function that takes the expected PSK and the
/// session registry as parameters.
pub async fn auth_layer(
    expected_psk: Option<String>,
    sessions: Arc<SessionGate>,
    mut request: Request,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string());

    // Session tokens are checked first so a signed-in caller keeps its
    // dashboard even when auth is disabled.
    if let Some(token) = &bearer {
        if sessions.touch(token).await {
            request
                .extensions_mut()
                .insert(Caller::Session(token.clone()));
            return next.run(request).await;
        }
    }

    // If no PSK is configured, allow all requests (dev mode)
    let Some(expected) = expected_psk else {
        request.extensions_mut().insert(Caller::Psk);
        return next.run(request).await;
    };

    let authorized = match (provided, bearer) {
        (Some(key), _) => constant_time_compare(&key, &expected),
        (None, Some(key)) => constant_time_compare(&key, &expected),
        (None, None) => return unauthorized_response("Missing API key or session token"),
    };

    if authorized {
        request.extensions_mut().insert(Caller::Psk);
        next.run(request).await
    } else {
        unauthorized_response("Invalid API key or session token")
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorResponse {
        success: false,
        error: ErrorDetails {
            code: codes::UNAUTHORIZED.to_string(),
            message: message.to_string(),
            details: None,
        },
        revision_id: 0,
    };

    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
