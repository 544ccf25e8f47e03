//! Postgres-backed session store.
//!
//! Rows live in the `sessions` table keyed by the refresh token's `jti`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use ecom_auth::{NewSession, Session, SessionStore};
use ecom_core::{SessionId, StoreError, StoreResult};

use crate::sqlx_errors::map_sqlx_error;

#[derive(Debug, Clone)]
pub struct PostgresSessionStore {
    pool: PgPool,
}

impl PostgresSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SESSION_COLUMNS: &str =
    "id, user_email, refresh_token, is_revoked, expires_at, created_at, updated_at";

fn session_from_row(row: &PgRow) -> Result<Session, sqlx::Error> {
    let id: Uuid = row.try_get("id")?;
    let expires_at: DateTime<Utc> = row.try_get("expires_at")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    Ok(Session {
        id: SessionId::from_uuid(id),
        user_email: row.try_get("user_email")?,
        refresh_token: row.try_get("refresh_token")?,
        is_revoked: row.try_get("is_revoked")?,
        expires_at,
        created_at,
        updated_at,
    })
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    #[instrument(skip(self, new), fields(session_id = %new.id), err)]
    async fn create_session(&self, new: NewSession) -> StoreResult<Session> {
        let sql = format!(
            r#"
            INSERT INTO sessions (id, user_email, refresh_token, is_revoked, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SESSION_COLUMNS}
            "#
        );

        let row = sqlx::query(&sql)
            .bind(new.id.as_uuid())
            .bind(&new.user_email)
            .bind(&new.refresh_token)
            .bind(new.is_revoked)
            .bind(new.expires_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_session", e))?;

        session_from_row(&row).map_err(|e| map_sqlx_error("create_session", e))
    }

    #[instrument(skip(self), fields(session_id = %id), err)]
    async fn get_session(&self, id: SessionId) -> StoreResult<Session> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1");

        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_session", e))?
            .ok_or(StoreError::NotFound)?;

        session_from_row(&row).map_err(|e| map_sqlx_error("get_session", e))
    }

    #[instrument(skip(self), fields(session_id = %id), err)]
    async fn revoke_session(&self, id: SessionId) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET is_revoked = TRUE, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("revoke_session", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(session_id = %id), err)]
    async fn delete_session(&self, id: SessionId) -> StoreResult<()> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_session", e))?;
        Ok(())
    }
}
