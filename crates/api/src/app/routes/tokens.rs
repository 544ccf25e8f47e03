use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use ecom_auth::Claims;
use ecom_core::SessionId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Exchange a refresh token for a new access token. Unguarded: the refresh
/// token in the body is the credential.
pub async fn renew(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RenewRequest>,
) -> axum::response::Response {
    match services.auth.renew(&body.refresh_token, Utc::now()).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

pub async fn revoke(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<String>,
) -> axum::response::Response {
    let session_id: SessionId = match errors::parse_id(&session_id, "session") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.auth.revoke_as(&claims, session_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}
