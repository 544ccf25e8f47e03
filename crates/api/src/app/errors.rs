//! Error to HTTP response mapping.
//!
//! Every error body is `{ "error": <code>, "message": <text> }`.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use ecom_auth::{AuthError, TokenError};
use ecom_core::StoreError;
use ecom_orders::LedgerError;

pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    match err {
        AuthError::Unauthenticated => json_error(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            "missing or malformed bearer token",
        ),
        AuthError::Token(e) => token_error_to_response(e),
        AuthError::Forbidden => json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string()),
        AuthError::InvalidCredentials => json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            err.to_string(),
        ),
        AuthError::Unauthorized(reason) => {
            json_error(StatusCode::UNAUTHORIZED, "unauthorized", reason.to_string())
        }
        AuthError::InvalidInput(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        AuthError::Hashing(e) => internal("hashing_error", e.to_string()),
        AuthError::Store(e) => store_error_to_response(e),
    }
}

fn token_error_to_response(err: TokenError) -> axum::response::Response {
    match err {
        TokenError::InvalidSignature | TokenError::Malformed(_) | TokenError::WrongKind { .. } => {
            json_error(StatusCode::UNAUTHORIZED, "invalid_token", err.to_string())
        }
        TokenError::Expired => json_error(StatusCode::UNAUTHORIZED, "token_expired", err.to_string()),
        TokenError::InvalidDuration | TokenError::Signing(_) => {
            internal("token_error", err.to_string())
        }
    }
}

pub fn ledger_error_to_response(err: LedgerError) -> axum::response::Response {
    match err {
        LedgerError::InvalidInput(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        LedgerError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "order not found"),
        LedgerError::Store(e) => store_error_to_response(e),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::Backend(msg) => internal("store_error", msg),
    }
}

/// Log the detail; the client only sees the code.
fn internal(code: &'static str, detail: String) -> axum::response::Response {
    error!(code, %detail, "request failed");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, code, "internal server error")
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Parse a path segment, answering 400 `invalid_id` on failure.
pub fn parse_id<T: std::str::FromStr>(
    raw: &str,
    what: &str,
) -> Result<T, axum::response::Response> {
    raw.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id")))
}
