use axum::{
    extract::State,
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use ecom_auth::{AdminGuard, AuthGuard};

use crate::app::errors;

#[derive(Clone)]
pub struct AuthState {
    pub guard: AuthGuard,
    pub admin: AdminGuard,
}

impl AuthState {
    pub fn new(guard: AuthGuard) -> Self {
        Self {
            admin: AdminGuard::new(guard.clone()),
            guard,
        }
    }
}

/// Verify the bearer access token and attach its `Claims` to the request.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let claims = state
        .guard
        .authenticate(authorization(req.headers()), Utc::now())
        .map_err(errors::auth_error_to_response)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Like [`auth_middleware`], but the claims must carry the admin flag.
pub async fn admin_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let claims = state
        .admin
        .authenticate(authorization(req.headers()), Utc::now())
        .map_err(errors::auth_error_to_response)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Header values that are not visible ASCII are treated as absent.
fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}
