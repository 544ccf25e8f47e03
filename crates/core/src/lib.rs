//! `ecom-core`: shared building blocks for the ecom backend.
//!
//! This crate contains identifiers and the storage error model shared by the
//! auth and order crates (no infrastructure concerns).

pub mod error;
pub mod id;

pub use error::{StoreError, StoreResult};
pub use id::{OrderId, OrderItemId, ProductId, SessionId, UserId};
