//! Orders domain module.
//!
//! Order and order-item types, the unit-of-work capability a relational store
//! must provide, and the [`OrderLedger`] that keeps an order and its items
//! atomic (no IO of its own, no HTTP).

pub mod ledger;
pub mod order;

pub use ledger::{LedgerError, LedgerStore, LedgerTx, OrderLedger};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderRecord, OrderStatus};
