use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use ecom_auth::{NewSession, Session, SessionStore};
use ecom_core::{SessionId, StoreError, StoreResult};

/// In-memory session store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StoreError {
    StoreError::backend("lock poisoned")
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_session(&self, new: NewSession) -> StoreResult<Session> {
        let mut sessions = self.sessions.write().map_err(|_| poisoned())?;
        if sessions.contains_key(&new.id) {
            return Err(StoreError::conflict(format!("session {} already exists", new.id)));
        }

        let now = Utc::now();
        let session = Session {
            id: new.id,
            user_email: new.user_email,
            refresh_token: new.refresh_token,
            is_revoked: new.is_revoked,
            expires_at: new.expires_at,
            created_at: now,
            updated_at: now,
        };
        sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: SessionId) -> StoreResult<Session> {
        let sessions = self.sessions.read().map_err(|_| poisoned())?;
        sessions.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn revoke_session(&self, id: SessionId) -> StoreResult<()> {
        let mut sessions = self.sessions.write().map_err(|_| poisoned())?;
        let session = sessions.get_mut(&id).ok_or(StoreError::NotFound)?;
        if !session.is_revoked {
            session.is_revoked = true;
            session.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_session(&self, id: SessionId) -> StoreResult<()> {
        let mut sessions = self.sessions.write().map_err(|_| poisoned())?;
        sessions.remove(&id);
        Ok(())
    }
}
