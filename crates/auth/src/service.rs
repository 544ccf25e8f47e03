//! Login, renewal, revocation and logout.
//!
//! Login mints an access token and a refresh token and persists a session
//! keyed by the refresh token's id. Renewal is the only place the session
//! store is consulted: it verifies the refresh token, then checks the session
//! is present, not revoked, not stale, and still owned by the token's email.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use ecom_core::{SessionId, StoreError, UserId};

use crate::claims::{Claims, TokenError, TokenKind};
use crate::password::{HashError, PasswordHasher};
use crate::session::{NewSession, SessionStore};
use crate::token::TokenSigner;
use crate::user::{NewUser, User, UserStore, UserUpdate};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No usable bearer token on the request.
    #[error("missing or malformed bearer token")]
    Unauthenticated,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("forbidden: admin privileges required")]
    Forbidden,

    #[error("invalid email or password")]
    InvalidCredentials,

    /// Renewal refused by the session check.
    #[error("unauthorized: {0}")]
    Unauthorized(SessionRejection),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("password hashing failed: {0}")]
    Hashing(#[from] HashError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why a refresh token was refused during renewal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRejection {
    Missing,
    Revoked,
    Expired,
    EmailMismatch,
}

impl core::fmt::Display for SessionRejection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            SessionRejection::Missing => "session not found",
            SessionRejection::Revoked => "session revoked",
            SessionRejection::Expired => "session expired",
            SessionRejection::EmailMismatch => "invalid session",
        };
        f.write_str(msg)
    }
}

/// Token lifetimes; configuration defaults, not invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    pub access: Duration,
    pub refresh: Duration,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access: Duration::from_secs(15 * 60),
            refresh: Duration::from_secs(24 * 60 * 60),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub session_id: SessionId,
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenewOutcome {
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
}

/// Registration input (plaintext password, hashed before storage).
#[derive(Debug, Clone)]
pub struct RegisterUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub is_admin: bool,
}

/// Session-based authentication over pluggable stores.
#[derive(Clone)]
pub struct AuthService {
    signer: Arc<TokenSigner>,
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    lifetimes: TokenLifetimes,
}

impl AuthService {
    pub fn new(
        signer: Arc<TokenSigner>,
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
        lifetimes: TokenLifetimes,
    ) -> Self {
        Self {
            signer,
            sessions,
            users,
            hasher,
            lifetimes,
        }
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, AuthError> {
        let user = match self.users.get_user_by_email(email).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(e.into()),
        };

        if !self.hasher.verify(password, &user.password_hash) {
            warn!(user_id = %user.id, "login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let (access_token, access_claims) = self.signer.create_token(
            user.id,
            &user.email,
            user.is_admin,
            TokenKind::Access,
            self.lifetimes.access,
            now,
        )?;
        let (refresh_token, refresh_claims) = self.signer.create_token(
            user.id,
            &user.email,
            user.is_admin,
            TokenKind::Refresh,
            self.lifetimes.refresh,
            now,
        )?;

        let session = self
            .sessions
            .create_session(NewSession {
                id: refresh_claims.session_id(),
                user_email: user.email.clone(),
                refresh_token: refresh_token.clone(),
                is_revoked: false,
                expires_at: refresh_claims.expires_at,
            })
            .await?;

        info!(user_id = %user.id, session_id = %session.id, "session created");

        Ok(LoginOutcome {
            session_id: session.id,
            access_token,
            refresh_token,
            access_token_expires_at: access_claims.expires_at,
            refresh_token_expires_at: refresh_claims.expires_at,
            user,
        })
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The refresh token and its session are left untouched.
    pub async fn renew(
        &self,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> Result<RenewOutcome, AuthError> {
        let refresh_claims = self
            .signer
            .verify_kind(refresh_token, TokenKind::Refresh, now)?;
        self.check_session(&refresh_claims, now).await?;

        let (access_token, access_claims) = self.signer.create_token(
            refresh_claims.subject_id,
            &refresh_claims.email,
            refresh_claims.is_admin,
            TokenKind::Access,
            self.lifetimes.access,
            now,
        )?;

        Ok(RenewOutcome {
            access_token,
            access_token_expires_at: access_claims.expires_at,
        })
    }

    async fn check_session(&self, claims: &Claims, now: DateTime<Utc>) -> Result<(), AuthError> {
        let session_id = claims.session_id();
        let session = match self.sessions.get_session(session_id).await {
            Ok(session) => session,
            Err(StoreError::NotFound) => return Err(reject(session_id, SessionRejection::Missing)),
            Err(e) => return Err(e.into()),
        };

        if session.is_revoked {
            return Err(reject(session_id, SessionRejection::Revoked));
        }
        if session.is_expired_at(now) {
            return Err(reject(session_id, SessionRejection::Expired));
        }
        if session.user_email != claims.email {
            return Err(reject(session_id, SessionRejection::EmailMismatch));
        }

        Ok(())
    }

    pub async fn revoke(&self, session_id: SessionId) -> Result<(), AuthError> {
        self.sessions.revoke_session(session_id).await?;
        info!(session_id = %session_id, "session revoked");
        Ok(())
    }

    pub async fn logout(&self, session_id: SessionId) -> Result<(), AuthError> {
        self.sessions.delete_session(session_id).await?;
        info!(session_id = %session_id, "session deleted");
        Ok(())
    }

    /// [`AuthService::revoke`] on behalf of `caller`, who must own the session
    /// or be an admin.
    pub async fn revoke_as(&self, caller: &Claims, session_id: SessionId) -> Result<(), AuthError> {
        let session = self.sessions.get_session(session_id).await?;
        authorize_session(caller, &session.user_email)?;
        self.revoke(session_id).await
    }

    /// [`AuthService::logout`] on behalf of `caller`. An absent session is
    /// already logged out.
    pub async fn logout_as(&self, caller: &Claims, session_id: SessionId) -> Result<(), AuthError> {
        match self.sessions.get_session(session_id).await {
            Ok(session) => authorize_session(caller, &session.user_email)?,
            Err(StoreError::NotFound) => return Ok(()),
            Err(e) => return Err(e.into()),
        }
        self.logout(session_id).await
    }

    pub async fn register(&self, input: RegisterUser) -> Result<User, AuthError> {
        let email = input.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::InvalidInput("a valid email is required".to_string()));
        }
        if input.password.is_empty() {
            return Err(AuthError::InvalidInput("password must not be empty".to_string()));
        }

        let password_hash = self.hasher.hash(&input.password)?;
        let user = self
            .users
            .create_user(NewUser {
                name: input.name,
                email: email.to_string(),
                password_hash,
                is_admin: input.is_admin,
            })
            .await?;

        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Update the profile owned by `email` (taken from verified claims).
    pub async fn update_profile(
        &self,
        email: &str,
        name: Option<String>,
        password: Option<String>,
    ) -> Result<User, AuthError> {
        let password_hash = match password {
            Some(p) if p.is_empty() => {
                return Err(AuthError::InvalidInput("password must not be empty".to_string()));
            }
            Some(p) => Some(self.hasher.hash(&p)?),
            None => None,
        };

        let user = self
            .users
            .update_user(
                email,
                UserUpdate {
                    name,
                    password_hash,
                },
            )
            .await?;
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        Ok(self.users.list_users().await?)
    }

    pub async fn delete_user(&self, id: UserId) -> Result<(), AuthError> {
        self.users.delete_user(id).await?;
        info!(user_id = %id, "user deleted");
        Ok(())
    }
}

fn reject(session_id: SessionId, reason: SessionRejection) -> AuthError {
    warn!(session_id = %session_id, %reason, "renewal rejected");
    AuthError::Unauthorized(reason)
}

fn authorize_session(caller: &Claims, owner_email: &str) -> Result<(), AuthError> {
    if caller.is_admin || caller.email == owner_email {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}
