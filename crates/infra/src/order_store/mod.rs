//! Order ledger backends.
//!
//! Both backends hand out one transaction per unit of work; nothing issued
//! through a [`ecom_orders::LedgerTx`] is visible to other units until commit.

pub mod in_memory;
pub mod postgres;

pub use in_memory::{FailurePlan, InMemoryLedgerStore};
pub use postgres::PostgresLedgerStore;
