//! Refresh-token sessions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ecom_core::{SessionId, StoreResult};

/// Persisted session backing one refresh token.
///
/// # Invariants
/// - `id` equals the `jti` of the refresh token that created the session and
///   never changes.
/// - After creation only `is_revoked` (false -> true) and `updated_at` change;
///   otherwise the row is deleted outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_email: String,
    pub refresh_token: String,
    pub is_revoked: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Input for [`SessionStore::create_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub id: SessionId,
    pub user_email: String,
    pub refresh_token: String,
    pub is_revoked: bool,
    pub expires_at: DateTime<Utc>,
}

/// Persistence capability for sessions. The store is the single source of
/// truth for revocation.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a new row. An existing id is a `Conflict`, never an overwrite.
    async fn create_session(&self, new: NewSession) -> StoreResult<Session>;

    /// `NotFound` if absent.
    async fn get_session(&self, id: SessionId) -> StoreResult<Session>;

    /// Flip the revoked flag. Revoking twice is not an error; revoking an
    /// unknown id is `NotFound`.
    async fn revoke_session(&self, id: SessionId) -> StoreResult<()>;

    /// Remove the row. Absence is not an error.
    async fn delete_session(&self, id: SessionId) -> StoreResult<()>;
}
