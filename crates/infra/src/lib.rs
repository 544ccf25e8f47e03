//! Infrastructure layer: Postgres and in-memory stores, password hashing,
//! configuration and database bootstrap.

pub mod config;
pub mod db;
pub mod order_store;
pub mod password;
pub mod session_store;
pub mod user_store;

mod sqlx_errors;

pub use config::{AdminSeed, AppConfig};
pub use order_store::{FailurePlan, InMemoryLedgerStore, PostgresLedgerStore};
pub use password::Argon2Hasher;
pub use session_store::{InMemorySessionStore, PostgresSessionStore};
pub use user_store::{InMemoryUserStore, PostgresUserStore};
