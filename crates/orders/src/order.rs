use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ecom_core::{OrderId, OrderItemId, ProductId, UserId};

/// Order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!(
                "unknown order status '{other}' (expected pending, shipped, delivered or cancelled)"
            )),
        }
    }
}

/// Parent row of an order, as stored.
///
/// Prices are in the smallest currency unit (e.g. cents).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub payment_method: String,
    pub tax_price: i64,
    pub shipping_price: i64,
    pub total_price: i64,
    pub status: OrderStatus,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Child row: one line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub name: String,
    pub quantity: i64,
    pub image: String,
    /// Unit price in the smallest currency unit.
    pub price: i64,
    pub product_id: ProductId,
    pub order_id: OrderId,
}

/// An order together with its full item set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(flatten)]
    pub record: OrderRecord,
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn from_parts(record: OrderRecord, items: Vec<OrderItem>) -> Self {
        Self { record, items }
    }

    pub fn id(&self) -> OrderId {
        self.record.id
    }

    pub fn user_id(&self) -> UserId {
        self.record.user_id
    }
}

/// Parent fields supplied by the caller; the store assigns id and timestamps.
///
/// `user_id` is the acting user's identity, attached from verified claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub payment_method: String,
    pub tax_price: i64,
    pub shipping_price: i64,
    pub total_price: i64,
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub name: String,
    pub quantity: i64,
    pub image: String,
    pub price: i64,
    pub product_id: ProductId,
}

impl NewOrder {
    /// Reject requests that could never form a valid committed order.
    ///
    /// An order with zero items is never persisted.
    pub fn validate(&self, items: &[NewOrderItem]) -> Result<(), String> {
        if self.payment_method.trim().is_empty() {
            return Err("payment method is required".to_string());
        }
        if self.tax_price < 0 || self.shipping_price < 0 || self.total_price < 0 {
            return Err("prices must not be negative".to_string());
        }
        if items.is_empty() {
            return Err("an order needs at least one item".to_string());
        }
        for (idx, item) in items.iter().enumerate() {
            if item.quantity <= 0 {
                return Err(format!("item {idx}: quantity must be positive"));
            }
            if item.price < 0 {
                return Err(format!("item {idx}: price must not be negative"));
            }
        }
        Ok(())
    }
}
