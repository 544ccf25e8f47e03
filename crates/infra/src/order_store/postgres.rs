//! Postgres-backed ledger store.
//!
//! Each unit of work is one `sqlx::Transaction`. Dropping a [`PgLedgerTx`]
//! without committing rolls the transaction back.
//!
//! `orders.status` is stored as lowercase text; an unknown value read back is
//! a `Backend` error rather than a silent default.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use ecom_core::{OrderId, OrderItemId, ProductId, StoreError, StoreResult, UserId};
use ecom_orders::{LedgerStore, LedgerTx, NewOrder, NewOrderItem, OrderItem, OrderRecord, OrderStatus};

use crate::sqlx_errors::map_sqlx_error;

#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    #[instrument(skip(self), err)]
    async fn begin(&self) -> StoreResult<Box<dyn LedgerTx>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(Box::new(PgLedgerTx { tx }))
    }
}

pub struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

const ORDER_COLUMNS: &str = "id, payment_method, tax_price, shipping_price, total_price, status, user_id, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, name, quantity, image, price, product_id, order_id";

fn order_from_row(row: &PgRow) -> StoreResult<OrderRecord> {
    let decode = |e: sqlx::Error| map_sqlx_error("decode_order", e);
    let status: String = row.try_get("status").map_err(decode)?;
    let status = status.parse::<OrderStatus>().map_err(StoreError::Backend)?;
    let id: i64 = row.try_get("id").map_err(decode)?;
    let user_id: i64 = row.try_get("user_id").map_err(decode)?;

    Ok(OrderRecord {
        id: OrderId::new(id),
        payment_method: row.try_get("payment_method").map_err(decode)?,
        tax_price: row.try_get("tax_price").map_err(decode)?,
        shipping_price: row.try_get("shipping_price").map_err(decode)?,
        total_price: row.try_get("total_price").map_err(decode)?,
        status,
        user_id: UserId::new(user_id),
        created_at: row.try_get("created_at").map_err(decode)?,
        updated_at: row.try_get("updated_at").map_err(decode)?,
    })
}

fn item_from_row(row: &PgRow) -> StoreResult<OrderItem> {
    let decode = |e: sqlx::Error| map_sqlx_error("decode_order_item", e);
    let id: i64 = row.try_get("id").map_err(decode)?;
    let product_id: i64 = row.try_get("product_id").map_err(decode)?;
    let order_id: i64 = row.try_get("order_id").map_err(decode)?;

    Ok(OrderItem {
        id: OrderItemId::new(id),
        name: row.try_get("name").map_err(decode)?,
        quantity: row.try_get("quantity").map_err(decode)?,
        image: row.try_get("image").map_err(decode)?,
        price: row.try_get("price").map_err(decode)?,
        product_id: ProductId::new(product_id),
        order_id: OrderId::new(order_id),
    })
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn insert_order(&mut self, order: &NewOrder) -> StoreResult<OrderRecord> {
        let sql = format!(
            r#"
            INSERT INTO orders (payment_method, tax_price, shipping_price, total_price, status, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ORDER_COLUMNS}
            "#
        );

        let row = sqlx::query(&sql)
            .bind(&order.payment_method)
            .bind(order.tax_price)
            .bind(order.shipping_price)
            .bind(order.total_price)
            .bind(OrderStatus::Pending.as_str())
            .bind(order.user_id.get())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order", e))?;

        order_from_row(&row)
    }

    async fn insert_item(
        &mut self,
        order_id: OrderId,
        item: &NewOrderItem,
    ) -> StoreResult<OrderItem> {
        let sql = format!(
            r#"
            INSERT INTO order_items (name, quantity, image, price, product_id, order_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ITEM_COLUMNS}
            "#
        );

        let row = sqlx::query(&sql)
            .bind(&item.name)
            .bind(item.quantity)
            .bind(&item.image)
            .bind(item.price)
            .bind(item.product_id.get())
            .bind(order_id.get())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order_item", e))?;

        item_from_row(&row)
    }

    async fn fetch_order(&mut self, id: OrderId) -> StoreResult<OrderRecord> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("fetch_order", e))?
            .ok_or(StoreError::NotFound)?;

        order_from_row(&row)
    }

    async fn fetch_orders(&mut self, owner: Option<UserId>) -> StoreResult<Vec<OrderRecord>> {
        let rows = match owner {
            Some(user_id) => {
                let sql = format!(
                    "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY id ASC"
                );
                sqlx::query(&sql)
                    .bind(user_id.get())
                    .fetch_all(&mut *self.tx)
                    .await
            }
            None => {
                let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY id ASC");
                sqlx::query(&sql).fetch_all(&mut *self.tx).await
            }
        }
        .map_err(|e| map_sqlx_error("fetch_orders", e))?;

        rows.iter().map(order_from_row).collect()
    }

    async fn fetch_items(&mut self, order_id: OrderId) -> StoreResult<Vec<OrderItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id ASC");
        let rows = sqlx::query(&sql)
            .bind(order_id.get())
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("fetch_order_items", e))?;

        rows.iter().map(item_from_row).collect()
    }

    async fn update_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> StoreResult<OrderRecord> {
        let sql = format!(
            r#"
            UPDATE orders
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "#
        );

        let row = sqlx::query(&sql)
            .bind(id.get())
            .bind(status.as_str())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("update_order_status", e))?
            .ok_or(StoreError::NotFound)?;

        order_from_row(&row)
    }

    async fn delete_items(&mut self, order_id: OrderId) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(order_id.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_order_items", e))?;
        Ok(result.rows_affected())
    }

    async fn delete_order(&mut self, id: OrderId) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_order", e))?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback_transaction", e))
    }
}
