//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and service construction
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and mapping into domain inputs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Routes are grouped by guard: public, authenticated, admin-only. Groups
/// may share a path as long as the methods differ.
pub fn build_app(services: AppServices) -> Router {
    let auth_state = middleware::AuthState::new(services.guard.clone());
    let services = Arc::new(services);

    let authenticated = routes::authenticated_router().layer(
        axum::middleware::from_fn_with_state(auth_state.clone(), middleware::auth_middleware),
    );
    let admin = routes::admin_router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::admin_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::public_router())
        .merge(authenticated)
        .merge(admin)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
