use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use ecom_auth::{NewUser, User, UserStore, UserUpdate};
use ecom_core::{StoreError, StoreResult, UserId};

#[derive(Debug, Default)]
struct UserTable {
    next_id: i64,
    rows: BTreeMap<UserId, User>,
}

/// In-memory user store. Ids are assigned sequentially from 1.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    table: RwLock<UserTable>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::backend("lock poisoned")
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let mut table = self.table.write().map_err(|_| poisoned())?;
        if table.rows.values().any(|u| u.email == new.email) {
            return Err(StoreError::conflict(format!("email {} already registered", new.email)));
        }

        table.next_id += 1;
        let now = Utc::now();
        let user = User {
            id: UserId::new(table.next_id),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            is_admin: new.is_admin,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
        let table = self.table.read().map_err(|_| poisoned())?;
        table
            .rows
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let table = self.table.read().map_err(|_| poisoned())?;
        Ok(table.rows.values().cloned().collect())
    }

    async fn update_user(&self, email: &str, update: UserUpdate) -> StoreResult<User> {
        let mut table = self.table.write().map_err(|_| poisoned())?;
        let user = table
            .rows
            .values_mut()
            .find(|u| u.email == email)
            .ok_or(StoreError::NotFound)?;

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(hash) = update.password_hash {
            user.password_hash = hash;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<()> {
        let mut table = self.table.write().map_err(|_| poisoned())?;
        table.rows.remove(&id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ada".to_string(),
            email: email.to_string(),
            password_hash: "digest".to_string(),
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn assigns_sequential_ids_and_rejects_duplicate_email() {
        let store = InMemoryUserStore::new();
        let a = store.create_user(new_user("a@x.com")).await.unwrap();
        let b = store.create_user(new_user("b@x.com")).await.unwrap();
        assert_eq!(a.id.get(), 1);
        assert_eq!(b.id.get(), 2);

        let err = store.create_user(new_user("a@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.list_users().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_changes_only_supplied_fields() {
        let store = InMemoryUserStore::new();
        store.create_user(new_user("a@x.com")).await.unwrap();

        let updated = store
            .update_user(
                "a@x.com",
                UserUpdate {
                    name: Some("Grace".to_string()),
                    ..UserUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Grace");
        assert_eq!(updated.password_hash, "digest");
        assert!(!updated.is_admin);

        let err = store.update_user("nobody@x.com", UserUpdate::default()).await;
        assert_eq!(err, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn delete_unknown_is_not_found() {
        let store = InMemoryUserStore::new();
        let user = store.create_user(new_user("a@x.com")).await.unwrap();
        store.delete_user(user.id).await.unwrap();
        assert_eq!(store.delete_user(user.id).await, Err(StoreError::NotFound));
        assert_eq!(store.get_user_by_email("a@x.com").await, Err(StoreError::NotFound));
    }
}
