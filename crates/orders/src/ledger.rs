//! Atomic order persistence.
//!
//! The store is consumed as a unit-of-work capability: [`LedgerStore::begin`]
//! opens one scoped transaction, the ledger issues its statements through the
//! returned [`LedgerTx`], and the transaction is committed or rolled back
//! before the operation returns. A transaction is never held across two
//! logical operations.
//!
//! ## Atomicity
//!
//! - `create_order` inserts the parent, takes its generated id, inserts every
//!   item with that id, then commits. Any failure rolls back the whole unit, so
//!   an order is either fully populated or absent.
//! - `delete_order` removes items, then the parent, in one unit.
//! - Reads run inside a unit as well so parent and items come from one
//!   snapshot; a failure on the item read fails the whole read.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{instrument, warn};

use ecom_core::{OrderId, StoreError, StoreResult, UserId};

use crate::order::{NewOrder, NewOrderItem, Order, OrderItem, OrderRecord, OrderStatus};

/// One open unit of work against the order tables.
///
/// Dropping a transaction without calling [`LedgerTx::commit`] must discard
/// every statement issued through it.
#[async_trait]
pub trait LedgerTx: Send {
    /// Insert the parent row and return it with its generated id.
    async fn insert_order(&mut self, order: &NewOrder) -> StoreResult<OrderRecord>;

    async fn insert_item(&mut self, order_id: OrderId, item: &NewOrderItem)
    -> StoreResult<OrderItem>;

    /// `NotFound` if absent.
    async fn fetch_order(&mut self, id: OrderId) -> StoreResult<OrderRecord>;

    /// Parent rows, optionally restricted to one owner, in store order.
    async fn fetch_orders(&mut self, owner: Option<UserId>) -> StoreResult<Vec<OrderRecord>>;

    /// Item rows of one order, in store order.
    async fn fetch_items(&mut self, order_id: OrderId) -> StoreResult<Vec<OrderItem>>;

    /// `NotFound` if absent.
    async fn update_status(&mut self, id: OrderId, status: OrderStatus)
    -> StoreResult<OrderRecord>;

    /// Returns the number of rows removed.
    async fn delete_items(&mut self, order_id: OrderId) -> StoreResult<u64>;

    /// Returns the number of rows removed.
    async fn delete_order(&mut self, id: OrderId) -> StoreResult<u64>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}

/// A relational store able to open order units of work.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn LedgerTx>>;
}

#[async_trait]
impl<T: LedgerStore + ?Sized> LedgerStore for Arc<T> {
    async fn begin(&self) -> StoreResult<Box<dyn LedgerTx>> {
        (**self).begin().await
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("order not found")]
    NotFound,

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for LedgerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => LedgerError::NotFound,
            other => LedgerError::Store(other),
        }
    }
}

/// Owns atomic creation, retrieval and deletion of orders with their items.
#[derive(Debug, Clone)]
pub struct OrderLedger<S> {
    store: S,
}

impl<S: LedgerStore> OrderLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[instrument(skip(self, order, items), fields(user_id = %order.user_id, item_count = items.len()), err)]
    pub async fn create_order(
        &self,
        order: NewOrder,
        items: Vec<NewOrderItem>,
    ) -> Result<Order, LedgerError> {
        order.validate(&items).map_err(LedgerError::InvalidInput)?;

        let mut tx = self.store.begin().await?;
        match insert_order_with_items(tx.as_mut(), &order, &items).await {
            Ok(created) => {
                tx.commit().await?;
                Ok(created)
            }
            Err(e) => abort(tx, e).await,
        }
    }

    #[instrument(skip(self), err)]
    pub async fn get_order(&self, id: OrderId) -> Result<Order, LedgerError> {
        let mut tx = self.store.begin().await?;
        let result = match tx.fetch_order(id).await {
            Ok(record) => with_items(tx.as_mut(), record).await,
            Err(e) => Err(e),
        };
        finish_read(tx, result).await
    }

    /// Every order with its items, read fresh on each call.
    #[instrument(skip(self), err)]
    pub async fn list_orders(&self) -> Result<Vec<Order>, LedgerError> {
        self.list(None).await
    }

    #[instrument(skip(self), err)]
    pub async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, LedgerError> {
        self.list(Some(user_id)).await
    }

    async fn list(&self, owner: Option<UserId>) -> Result<Vec<Order>, LedgerError> {
        let mut tx = self.store.begin().await?;
        let result = list_with_items(tx.as_mut(), owner).await;
        finish_read(tx, result).await
    }

    #[instrument(skip(self), err)]
    pub async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, LedgerError> {
        let mut tx = self.store.begin().await?;
        let result = match tx.update_status(id, status).await {
            Ok(record) => with_items(tx.as_mut(), record).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(order) => {
                tx.commit().await?;
                Ok(order)
            }
            Err(e) => abort(tx, e.into()).await,
        }
    }

    /// Delete items, then the parent; both or neither.
    ///
    /// Fails with `NotFound` when no parent row exists.
    #[instrument(skip(self), err)]
    pub async fn delete_order(&self, id: OrderId) -> Result<(), LedgerError> {
        let mut tx = self.store.begin().await?;
        match delete_order_with_items(tx.as_mut(), id).await {
            Ok(()) => {
                tx.commit().await?;
                Ok(())
            }
            Err(e) => abort(tx, e).await,
        }
    }
}

async fn insert_order_with_items<T: LedgerTx + ?Sized>(
    tx: &mut T,
    order: &NewOrder,
    items: &[NewOrderItem],
) -> Result<Order, LedgerError> {
    let record = tx.insert_order(order).await?;

    let mut created = Vec::with_capacity(items.len());
    for item in items {
        created.push(tx.insert_item(record.id, item).await?);
    }

    Ok(Order::from_parts(record, created))
}

async fn delete_order_with_items<T: LedgerTx + ?Sized>(tx: &mut T, id: OrderId) -> Result<(), LedgerError> {
    tx.delete_items(id).await?;
    let removed = tx.delete_order(id).await?;
    if removed == 0 {
        return Err(LedgerError::NotFound);
    }
    Ok(())
}

async fn with_items<T: LedgerTx + ?Sized>(tx: &mut T, record: OrderRecord) -> StoreResult<Order> {
    let items = tx.fetch_items(record.id).await?;
    Ok(Order::from_parts(record, items))
}

async fn list_with_items<T: LedgerTx + ?Sized>(
    tx: &mut T,
    owner: Option<UserId>,
) -> StoreResult<Vec<Order>> {
    let records = tx.fetch_orders(owner).await?;
    let mut orders = Vec::with_capacity(records.len());
    for record in records {
        orders.push(with_items(&mut *tx, record).await?);
    }
    Ok(orders)
}

/// Close a read-only unit: commit on success, roll back on failure.
async fn finish_read<T>(tx: Box<dyn LedgerTx>, result: StoreResult<T>) -> Result<T, LedgerError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => abort(tx, e.into()).await,
    }
}

/// Roll back and surface the original failure.
async fn abort<T>(tx: Box<dyn LedgerTx>, err: LedgerError) -> Result<T, LedgerError> {
    if let Err(rollback_err) = tx.rollback().await {
        warn!(error = %rollback_err, original = %err, "rollback failed");
    }
    Err(err)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;
    use ecom_core::{OrderItemId, ProductId};

    use super::*;

    /// Records every call; fails the calls named in `fail`.
    #[derive(Default)]
    struct Script {
        calls: Mutex<Vec<&'static str>>,
        fail: Vec<&'static str>,
        orders_present: bool,
    }

    impl Script {
        fn failing(names: &[&'static str]) -> Arc<Self> {
            Arc::new(Self {
                fail: names.to_vec(),
                orders_present: true,
                ..Self::default()
            })
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn call(&self, name: &'static str) -> StoreResult<()> {
            self.calls.lock().unwrap().push(name);
            if self.fail.contains(&name) {
                Err(StoreError::backend(format!("scripted {name} failure")))
            } else {
                Ok(())
            }
        }
    }

    struct ScriptTx(Arc<Script>);

    fn record(id: i64) -> OrderRecord {
        OrderRecord {
            id: OrderId::new(id),
            payment_method: "card".to_string(),
            tax_price: 0,
            shipping_price: 0,
            total_price: 100,
            status: OrderStatus::Pending,
            user_id: UserId::new(1),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[async_trait]
    impl LedgerTx for ScriptTx {
        async fn insert_order(&mut self, _order: &NewOrder) -> StoreResult<OrderRecord> {
            self.0.call("insert_order")?;
            Ok(record(1))
        }

        async fn insert_item(
            &mut self,
            order_id: OrderId,
            item: &NewOrderItem,
        ) -> StoreResult<OrderItem> {
            self.0.call("insert_item")?;
            Ok(OrderItem {
                id: OrderItemId::new(1),
                name: item.name.clone(),
                quantity: item.quantity,
                image: item.image.clone(),
                price: item.price,
                product_id: item.product_id,
                order_id,
            })
        }

        async fn fetch_order(&mut self, id: OrderId) -> StoreResult<OrderRecord> {
            self.0.call("fetch_order")?;
            if self.0.orders_present {
                Ok(record(id.get()))
            } else {
                Err(StoreError::NotFound)
            }
        }

        async fn fetch_orders(&mut self, _owner: Option<UserId>) -> StoreResult<Vec<OrderRecord>> {
            self.0.call("fetch_orders")?;
            Ok(vec![record(1), record(2)])
        }

        async fn fetch_items(&mut self, _order_id: OrderId) -> StoreResult<Vec<OrderItem>> {
            self.0.call("fetch_items")?;
            Ok(vec![])
        }

        async fn update_status(
            &mut self,
            id: OrderId,
            status: OrderStatus,
        ) -> StoreResult<OrderRecord> {
            self.0.call("update_status")?;
            let mut r = record(id.get());
            r.status = status;
            Ok(r)
        }

        async fn delete_items(&mut self, _order_id: OrderId) -> StoreResult<u64> {
            self.0.call("delete_items")?;
            Ok(2)
        }

        async fn delete_order(&mut self, _id: OrderId) -> StoreResult<u64> {
            self.0.call("delete_order")?;
            Ok(if self.0.orders_present { 1 } else { 0 })
        }

        async fn commit(self: Box<Self>) -> StoreResult<()> {
            self.0.call("commit")
        }

        async fn rollback(self: Box<Self>) -> StoreResult<()> {
            self.0.call("rollback")
        }
    }

    struct ScriptStore(Arc<Script>);

    #[async_trait]
    impl LedgerStore for ScriptStore {
        async fn begin(&self) -> StoreResult<Box<dyn LedgerTx>> {
            self.0.call("begin")?;
            Ok(Box::new(ScriptTx(self.0.clone())))
        }
    }

    fn ledger(script: &Arc<Script>) -> OrderLedger<ScriptStore> {
        OrderLedger::new(ScriptStore(script.clone()))
    }

    fn order() -> NewOrder {
        NewOrder {
            payment_method: "card".to_string(),
            tax_price: 0,
            shipping_price: 0,
            total_price: 100,
            user_id: UserId::new(1),
        }
    }

    fn items(n: usize) -> Vec<NewOrderItem> {
        (0..n)
            .map(|_| NewOrderItem {
                name: "widget".to_string(),
                quantity: 1,
                image: String::new(),
                price: 50,
                product_id: ProductId::new(5),
            })
            .collect()
    }

    #[tokio::test]
    async fn create_inserts_parent_then_items_then_commits() {
        let script = Script::failing(&[]);
        let created = ledger(&script).create_order(order(), items(2)).await.unwrap();

        assert_eq!(created.items.len(), 2);
        assert_eq!(
            script.calls(),
            vec!["begin", "insert_order", "insert_item", "insert_item", "commit"]
        );
    }

    #[tokio::test]
    async fn parent_failure_attempts_no_items() {
        let script = Script::failing(&["insert_order"]);
        let err = ledger(&script).create_order(order(), items(2)).await.unwrap_err();

        assert!(matches!(err, LedgerError::Store(StoreError::Backend(_))));
        assert_eq!(script.calls(), vec!["begin", "insert_order", "rollback"]);
    }

    #[tokio::test]
    async fn item_failure_rolls_back_and_reports_original_error() {
        let script = Script::failing(&["insert_item", "rollback"]);
        let err = ledger(&script).create_order(order(), items(3)).await.unwrap_err();

        assert_eq!(
            err,
            LedgerError::Store(StoreError::backend("scripted insert_item failure"))
        );
        assert_eq!(script.calls(), vec!["begin", "insert_order", "insert_item", "rollback"]);
    }

    #[tokio::test]
    async fn invalid_input_never_opens_a_unit() {
        let script = Script::failing(&[]);
        let err = ledger(&script).create_order(order(), vec![]).await.unwrap_err();

        assert!(matches!(err, LedgerError::InvalidInput(_)));
        assert!(script.calls().is_empty());
    }

    #[tokio::test]
    async fn commit_failure_fails_the_create() {
        let script = Script::failing(&["commit"]);
        assert!(ledger(&script).create_order(order(), items(1)).await.is_err());
    }

    #[tokio::test]
    async fn item_read_failure_fails_get_and_rolls_back() {
        let script = Script::failing(&["fetch_items"]);
        let err = ledger(&script).get_order(OrderId::new(1)).await.unwrap_err();

        assert!(matches!(err, LedgerError::Store(_)));
        assert_eq!(
            script.calls(),
            vec!["begin", "fetch_order", "fetch_items", "rollback"]
        );
    }

    #[tokio::test]
    async fn delete_removes_items_before_parent() {
        let script = Script::failing(&[]);
        ledger(&script).delete_order(OrderId::new(1)).await.unwrap();
        assert_eq!(
            script.calls(),
            vec!["begin", "delete_items", "delete_order", "commit"]
        );
    }

    #[tokio::test]
    async fn delete_of_absent_order_is_not_found_and_rolls_back() {
        let script = Arc::new(Script::default());
        let err = ledger(&script).delete_order(OrderId::new(9)).await.unwrap_err();

        assert_eq!(err, LedgerError::NotFound);
        assert_eq!(
            script.calls(),
            vec!["begin", "delete_items", "delete_order", "rollback"]
        );
    }

    #[tokio::test]
    async fn list_reads_items_for_every_parent() {
        let script = Script::failing(&[]);
        let orders = ledger(&script).list_orders().await.unwrap();

        assert_eq!(orders.len(), 2);
        assert_eq!(
            script.calls(),
            vec!["begin", "fetch_orders", "fetch_items", "fetch_items", "commit"]
        );
    }
}
