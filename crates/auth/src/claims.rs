use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use ecom_core::{SessionId, UserId};

/// Which half of a login pair a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Identity claims carried by every bearer token (access and refresh).
///
/// Claims are produced fresh on every mint and never mutated. Timestamps are
/// encoded as whole seconds since the epoch (`iat`/`exp`), as JWT expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the authenticated user's id.
    #[serde(rename = "sub")]
    pub subject_id: UserId,

    pub email: String,

    pub is_admin: bool,

    #[serde(rename = "typ")]
    pub kind: TokenKind,

    /// Unique token identifier. For refresh tokens this is also the session id.
    #[serde(rename = "jti")]
    pub token_id: Uuid,

    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl Claims {
    /// Session id a refresh token with these claims is bound to.
    pub fn session_id(&self) -> SessionId {
        SessionId::from_uuid(self.token_id)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed: {0}")]
    Malformed(String),

    /// A refresh token presented where an access token is required, or the
    /// reverse.
    #[error("expected {expected:?} token")]
    WrongKind { expected: TokenKind },

    #[error("token lifetime is not representable")]
    InvalidDuration,

    #[error("token could not be signed: {0}")]
    Signing(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Claims {
        Claims {
            subject_id: UserId::new(3),
            email: "a@x.com".to_string(),
            is_admin: false,
            kind: TokenKind::Refresh,
            token_id: Uuid::now_v7(),
            issued_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            expires_at: Utc.timestamp_opt(1_700_000_900, 0).unwrap(),
        }
    }

    #[test]
    fn claims_use_registered_jwt_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["sub"], 3);
        assert_eq!(json["iat"], 1_700_000_000i64);
        assert_eq!(json["exp"], 1_700_000_900i64);
        assert!(json["jti"].is_string());
        assert_eq!(json["typ"], "refresh");
    }

    #[test]
    fn expiry_is_strictly_after_expires_at() {
        let claims = sample();
        assert!(!claims.is_expired_at(claims.expires_at));
        assert!(claims.is_expired_at(claims.expires_at + chrono::Duration::seconds(1)));
    }

    #[test]
    fn session_id_mirrors_token_id() {
        let claims = sample();
        assert_eq!(claims.session_id().as_uuid(), &claims.token_id);
    }
}
