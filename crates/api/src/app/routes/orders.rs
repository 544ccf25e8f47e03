use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};

use ecom_auth::Claims;
use ecom_core::OrderId;
use ecom_orders::{Order, OrderStatus};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    let (order, items) = body.into_parts(claims.subject_id);

    match services.orders.create_order(order, items).await {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.orders.list_orders().await {
        Ok(orders) => (StatusCode::OK, Json(orders)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn my_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
) -> axum::response::Response {
    match services.orders.list_orders_for_user(claims.subject_id).await {
        Ok(orders) => (StatusCode::OK, Json(orders)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order = match load_visible_order(&services, &claims, &id).await {
        Ok(order) => order,
        Err(resp) => return resp,
    };
    (StatusCode::OK, Json(order)).into_response()
}

pub async fn delete_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order = match load_visible_order(&services, &claims, &id).await {
        Ok(order) => order,
        Err(resp) => return resp,
    };

    match services.orders.delete_order(order.id()).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn update_order_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateOrderStatusRequest>,
) -> axum::response::Response {
    let id: OrderId = match errors::parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let status: OrderStatus = match body.status.parse() {
        Ok(v) => v,
        Err(msg) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_status", msg),
    };

    match services.orders.update_order_status(id, status).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

/// Load an order the caller may see: their own, or any order for admins.
async fn load_visible_order(
    services: &AppServices,
    claims: &Claims,
    raw_id: &str,
) -> Result<Order, axum::response::Response> {
    let id: OrderId = errors::parse_id(raw_id, "order")?;
    let order = services
        .orders
        .get_order(id)
        .await
        .map_err(errors::ledger_error_to_response)?;

    if !claims.is_admin && order.user_id() != claims.subject_id {
        return Err(errors::json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "order belongs to another user",
        ));
    }
    Ok(order)
}
