//! In-memory ledger store with failure injection.
//!
//! A unit of work takes the table lock for its whole lifetime and operates on
//! a private copy of the tables. Commit writes the copy back; rollback or drop
//! discards it. Units are therefore fully serialized.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use ecom_core::{OrderId, OrderItemId, StoreError, StoreResult, UserId};
use ecom_orders::{LedgerStore, LedgerTx, NewOrder, NewOrderItem, OrderItem, OrderRecord, OrderStatus};

#[derive(Debug, Clone, Default)]
struct LedgerState {
    next_order_id: i64,
    next_item_id: i64,
    orders: BTreeMap<OrderId, OrderRecord>,
    items: BTreeMap<OrderItemId, OrderItem>,
}

/// Failures to inject into subsequent units of work.
///
/// The plan is captured when a unit begins and stays in force until cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailurePlan {
    pub fail_begin: bool,
    pub fail_order_insert: bool,
    /// Zero-based index of the item insert that fails within one unit.
    pub fail_item_insert_at: Option<usize>,
    pub fail_item_read: bool,
    pub fail_item_delete: bool,
    pub fail_order_delete: bool,
    pub fail_commit: bool,
}

#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: Arc<Mutex<LedgerState>>,
    failures: StdMutex<FailurePlan>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inject_failures(&self, plan: FailurePlan) {
        *self.plan_guard() = plan;
    }

    pub fn clear_failures(&self) {
        self.inject_failures(FailurePlan::default());
    }

    /// Committed parent rows.
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }

    /// Committed item rows.
    pub async fn item_count(&self) -> usize {
        self.state.lock().await.items.len()
    }

    // The plan is plain data, so a panic mid-update cannot leave it torn.
    fn plan_guard(&self) -> MutexGuard<'_, FailurePlan> {
        self.failures.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn begin(&self) -> StoreResult<Box<dyn LedgerTx>> {
        let plan = self.plan_guard().clone();
        if plan.fail_begin {
            return Err(injected("begin"));
        }

        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryLedgerTx {
            guard,
            working,
            plan,
            items_inserted: 0,
        }))
    }
}

fn injected(operation: &str) -> StoreError {
    StoreError::backend(format!("injected failure in {operation}"))
}

struct InMemoryLedgerTx {
    guard: OwnedMutexGuard<LedgerState>,
    working: LedgerState,
    plan: FailurePlan,
    items_inserted: usize,
}

#[async_trait]
impl LedgerTx for InMemoryLedgerTx {
    async fn insert_order(&mut self, order: &NewOrder) -> StoreResult<OrderRecord> {
        if self.plan.fail_order_insert {
            return Err(injected("insert_order"));
        }

        self.working.next_order_id += 1;
        let record = OrderRecord {
            id: OrderId::new(self.working.next_order_id),
            payment_method: order.payment_method.clone(),
            tax_price: order.tax_price,
            shipping_price: order.shipping_price,
            total_price: order.total_price,
            status: OrderStatus::Pending,
            user_id: order.user_id,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.working.orders.insert(record.id, record.clone());
        Ok(record)
    }

    async fn insert_item(
        &mut self,
        order_id: OrderId,
        item: &NewOrderItem,
    ) -> StoreResult<OrderItem> {
        let index = self.items_inserted;
        self.items_inserted += 1;
        if self.plan.fail_item_insert_at == Some(index) {
            return Err(injected("insert_item"));
        }
        if !self.working.orders.contains_key(&order_id) {
            return Err(StoreError::backend(format!(
                "foreign key violation: order {order_id} does not exist"
            )));
        }

        self.working.next_item_id += 1;
        let row = OrderItem {
            id: OrderItemId::new(self.working.next_item_id),
            name: item.name.clone(),
            quantity: item.quantity,
            image: item.image.clone(),
            price: item.price,
            product_id: item.product_id,
            order_id,
        };
        self.working.items.insert(row.id, row.clone());
        Ok(row)
    }

    async fn fetch_order(&mut self, id: OrderId) -> StoreResult<OrderRecord> {
        self.working.orders.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn fetch_orders(&mut self, owner: Option<UserId>) -> StoreResult<Vec<OrderRecord>> {
        Ok(self
            .working
            .orders
            .values()
            .filter(|o| owner.is_none_or(|user_id| o.user_id == user_id))
            .cloned()
            .collect())
    }

    async fn fetch_items(&mut self, order_id: OrderId) -> StoreResult<Vec<OrderItem>> {
        if self.plan.fail_item_read {
            return Err(injected("fetch_items"));
        }
        Ok(self
            .working
            .items
            .values()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn update_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> StoreResult<OrderRecord> {
        let record = self.working.orders.get_mut(&id).ok_or(StoreError::NotFound)?;
        record.status = status;
        record.updated_at = Some(Utc::now());
        Ok(record.clone())
    }

    async fn delete_items(&mut self, order_id: OrderId) -> StoreResult<u64> {
        if self.plan.fail_item_delete {
            return Err(injected("delete_items"));
        }
        let before = self.working.items.len();
        self.working.items.retain(|_, i| i.order_id != order_id);
        Ok((before - self.working.items.len()) as u64)
    }

    async fn delete_order(&mut self, id: OrderId) -> StoreResult<u64> {
        if self.plan.fail_order_delete {
            return Err(injected("delete_order"));
        }
        if self.working.items.values().any(|i| i.order_id == id) {
            return Err(StoreError::backend(format!(
                "foreign key violation: order {id} still has items"
            )));
        }
        Ok(self.working.orders.remove(&id).map_or(0, |_| 1))
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        if self.plan.fail_commit {
            return Err(injected("commit"));
        }
        let InMemoryLedgerTx {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ecom_core::ProductId;

    use super::*;

    fn new_order() -> NewOrder {
        NewOrder {
            payment_method: "card".to_string(),
            tax_price: 0,
            shipping_price: 0,
            total_price: 100,
            user_id: UserId::new(1),
        }
    }

    fn new_item() -> NewOrderItem {
        NewOrderItem {
            name: "widget".to_string(),
            quantity: 1,
            image: "widget.png".to_string(),
            price: 100,
            product_id: ProductId::new(3),
        }
    }

    #[tokio::test]
    async fn uncommitted_writes_are_discarded_on_drop() {
        let store = InMemoryLedgerStore::new();
        {
            let mut tx = store.begin().await.unwrap();
            let record = tx.insert_order(&new_order()).await.unwrap();
            tx.insert_item(record.id, &new_item()).await.unwrap();
        }
        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.item_count().await, 0);
    }

    #[tokio::test]
    async fn commit_publishes_writes() {
        let store = InMemoryLedgerStore::new();
        let mut tx = store.begin().await.unwrap();
        let record = tx.insert_order(&new_order()).await.unwrap();
        tx.insert_item(record.id, &new_item()).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.order_count().await, 1);
        assert_eq!(store.item_count().await, 1);
    }

    #[tokio::test]
    async fn item_insert_requires_existing_parent() {
        let store = InMemoryLedgerStore::new();
        let mut tx = store.begin().await.unwrap();
        let err = tx.insert_item(OrderId::new(99), &new_item()).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[tokio::test]
    async fn parent_delete_with_items_left_is_refused() {
        let store = InMemoryLedgerStore::new();
        let mut tx = store.begin().await.unwrap();
        let record = tx.insert_order(&new_order()).await.unwrap();
        tx.insert_item(record.id, &new_item()).await.unwrap();

        assert!(tx.delete_order(record.id).await.is_err());
        assert_eq!(tx.delete_items(record.id).await.unwrap(), 1);
        assert_eq!(tx.delete_order(record.id).await.unwrap(), 1);
        assert_eq!(tx.delete_order(record.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn injected_begin_failure_is_a_backend_error() {
        let store = InMemoryLedgerStore::new();
        store.inject_failures(FailurePlan {
            fail_begin: true,
            ..FailurePlan::default()
        });
        assert!(matches!(store.begin().await, Err(StoreError::Backend(_))));

        store.clear_failures();
        assert!(store.begin().await.is_ok());
    }

    #[tokio::test]
    async fn failure_plan_survives_a_poisoned_lock() {
        let store = InMemoryLedgerStore::new();
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _held = store.failures.lock().unwrap();
            panic!("poison the plan lock");
        }));
        assert!(store.failures.is_poisoned());

        store.inject_failures(FailurePlan {
            fail_begin: true,
            ..FailurePlan::default()
        });
        match store.begin().await {
            Err(StoreError::Backend(msg)) => assert!(msg.contains("begin")),
            _ => panic!("expected injected begin failure"),
        }

        store.clear_failures();
        assert!(store.begin().await.is_ok());
    }
}
