use serde::Deserialize;

use ecom_auth::RegisterUser;
use ecom_core::{ProductId, UserId};
use ecom_orders::{NewOrder, NewOrderItem};

// -------------------------
// Request DTOs
// -------------------------

/// Public registration never grants admin.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl From<CreateUserRequest> for RegisterUser {
    fn from(req: CreateUserRequest) -> Self {
        RegisterUser {
            name: req.name,
            email: req.email,
            password: req.password,
            is_admin: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenewRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    pub name: String,
    pub quantity: i64,
    #[serde(default)]
    pub image: String,
    pub price: i64,
    pub product_id: ProductId,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
    pub payment_method: String,
    pub tax_price: i64,
    pub shipping_price: i64,
    pub total_price: i64,
}

impl CreateOrderRequest {
    /// Split into ledger inputs, owned by `user_id`.
    pub fn into_parts(self, user_id: UserId) -> (NewOrder, Vec<NewOrderItem>) {
        let order = NewOrder {
            payment_method: self.payment_method,
            tax_price: self.tax_price,
            shipping_price: self.shipping_price,
            total_price: self.total_price,
            user_id,
        };
        let items = self
            .items
            .into_iter()
            .map(|i| NewOrderItem {
                name: i.name,
                quantity: i.quantity,
                image: i.image,
                price: i.price,
                product_id: i.product_id,
            })
            .collect();
        (order, items)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_request_takes_owner_from_caller() {
        let req: CreateOrderRequest = serde_json::from_value(serde_json::json!({
            "items": [{"name": "mug", "quantity": 2, "price": 450, "product_id": 7}],
            "payment_method": "card",
            "tax_price": 90,
            "shipping_price": 500,
            "total_price": 1490
        }))
        .unwrap();

        let (order, items) = req.into_parts(UserId::new(42));
        assert_eq!(order.user_id, UserId::new(42));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, ProductId::new(7));
        assert_eq!(items[0].image, "");
    }

    #[test]
    fn registration_ignores_admin_flag() {
        let req: CreateUserRequest = serde_json::from_value(serde_json::json!({
            "name": "Eve", "email": "e@x.com", "password": "pw", "is_admin": true
        }))
        .unwrap();
        assert!(!RegisterUser::from(req).is_admin);
    }
}
