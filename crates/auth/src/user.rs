//! Registered users.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ecom_core::{StoreResult, UserId};

/// A registered user.
///
/// `password_hash` is an opaque digest produced by a [`crate::PasswordHasher`]
/// and is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// Partial update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub password_hash: Option<String>,
}

/// Persistence capability for users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Duplicate email is a `Conflict`.
    async fn create_user(&self, new: NewUser) -> StoreResult<User>;

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User>;

    async fn list_users(&self) -> StoreResult<Vec<User>>;

    async fn update_user(&self, email: &str, update: UserUpdate) -> StoreResult<User>;

    /// `NotFound` if absent.
    async fn delete_user(&self, id: UserId) -> StoreResult<()>;
}
