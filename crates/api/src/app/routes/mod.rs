use axum::{
    Router,
    routing::{delete, get, patch, post},
};

pub mod orders;
pub mod system;
pub mod tokens;
pub mod users;

/// Routes that need no bearer token.
pub fn public_router() -> Router {
    Router::new()
        .route("/users", post(users::create_user))
        .route("/users/login", post(users::login))
        .route("/tokens/renew", post(tokens::renew))
}

/// Routes behind the access-token guard. Handlers receive `Claims`.
pub fn authenticated_router() -> Router {
    Router::new()
        .route("/users", patch(users::update_user))
        .route("/users/logout/:session_id", post(users::logout))
        .route("/tokens/revoke/:session_id", post(tokens::revoke))
        .route("/orders", post(orders::create_order))
        .route(
            "/orders/:id",
            get(orders::get_order).delete(orders::delete_order),
        )
        .route("/myorders", get(orders::my_orders))
}

/// Routes behind the admin guard.
pub fn admin_router() -> Router {
    Router::new()
        .route("/users", get(users::list_users))
        .route("/users/:id", delete(users::delete_user))
        .route("/orders", get(orders::list_orders))
        .route("/orders/:id/status", patch(orders::update_order_status))
}
