//! Request-boundary guards.
//!
//! A guard is a pure function from an `Authorization` header value to verified
//! claims (or an error). It never touches the session store: revocation is
//! only enforced when a refresh token is exchanged, so an access token stays
//! usable until it expires. Refresh tokens are never accepted here, which
//! bounds the revocation delay by the access lifetime.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::claims::{Claims, TokenKind};
use crate::service::AuthError;
use crate::token::TokenSigner;

/// Resolves a bearer access token to verified claims.
#[derive(Debug, Clone)]
pub struct AuthGuard {
    signer: Arc<TokenSigner>,
}

impl AuthGuard {
    pub fn new(signer: Arc<TokenSigner>) -> Self {
        Self { signer }
    }

    /// Extract the bearer token, verify its signature, then its expiry, then
    /// that it is an access token.
    pub fn authenticate(
        &self,
        authorization: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Claims, AuthError> {
        let token = extract_bearer(authorization)?;
        let claims = self.signer.verify_kind(token, TokenKind::Access, now)?;
        Ok(claims)
    }
}

/// [`AuthGuard`] that additionally requires the admin claim.
#[derive(Debug, Clone)]
pub struct AdminGuard {
    inner: AuthGuard,
}

impl AdminGuard {
    pub fn new(inner: AuthGuard) -> Self {
        Self { inner }
    }

    pub fn authenticate(
        &self,
        authorization: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Claims, AuthError> {
        let claims = self.inner.authenticate(authorization, now)?;
        require_admin(&claims)?;
        Ok(claims)
    }
}

/// Fail with `Forbidden` unless the claims carry the admin flag.
pub fn require_admin(claims: &Claims) -> Result<(), AuthError> {
    if claims.is_admin {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::Unauthenticated)?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::Unauthenticated)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::Unauthenticated);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ecom_core::UserId;

    use super::*;
    use crate::claims::TokenError;

    fn signer() -> Arc<TokenSigner> {
        Arc::new(TokenSigner::new("guard-secret"))
    }

    fn bearer_of(signer: &TokenSigner, is_admin: bool, kind: TokenKind) -> String {
        let (token, _) = signer
            .create_token(
                UserId::new(9),
                "g@x.com",
                is_admin,
                kind,
                Duration::from_secs(900),
                Utc::now(),
            )
            .unwrap();
        format!("Bearer {token}")
    }

    fn bearer(signer: &TokenSigner, is_admin: bool) -> String {
        bearer_of(signer, is_admin, TokenKind::Access)
    }

    #[test]
    fn missing_or_non_bearer_header_is_unauthenticated() {
        let guard = AuthGuard::new(signer());
        assert_eq!(guard.authenticate(None, Utc::now()), Err(AuthError::Unauthenticated));
        assert_eq!(
            guard.authenticate(Some("Basic abc"), Utc::now()),
            Err(AuthError::Unauthenticated)
        );
        assert_eq!(
            guard.authenticate(Some("Bearer   "), Utc::now()),
            Err(AuthError::Unauthenticated)
        );
    }

    #[test]
    fn valid_access_token_yields_claims() {
        let signer = signer();
        let guard = AuthGuard::new(signer.clone());
        let header = bearer(&signer, false);

        let claims = guard.authenticate(Some(&header), Utc::now()).unwrap();
        assert_eq!(claims.subject_id, UserId::new(9));
        assert_eq!(claims.email, "g@x.com");
    }

    #[test]
    fn refresh_token_is_not_a_bearer_credential() {
        let signer = signer();
        let guard = AuthGuard::new(signer.clone());
        let admin = AdminGuard::new(guard.clone());
        let header = bearer_of(&signer, true, TokenKind::Refresh);

        let wrong_kind = Err(AuthError::Token(TokenError::WrongKind {
            expected: TokenKind::Access,
        }));
        assert_eq!(guard.authenticate(Some(&header), Utc::now()), wrong_kind);
        assert_eq!(admin.authenticate(Some(&header), Utc::now()), wrong_kind);
    }

    #[test]
    fn expired_access_token_is_rejected() {
        let signer = signer();
        let guard = AuthGuard::new(signer.clone());
        let header = bearer(&signer, false);

        let later = Utc::now() + chrono::Duration::minutes(16);
        assert_eq!(
            guard.authenticate(Some(&header), later),
            Err(AuthError::Token(TokenError::Expired))
        );
    }

    #[test]
    fn admin_guard_requires_admin_claim() {
        let signer = signer();
        let admin = AdminGuard::new(AuthGuard::new(signer.clone()));

        let user_header = bearer(&signer, false);
        assert_eq!(admin.authenticate(Some(&user_header), Utc::now()), Err(AuthError::Forbidden));

        let admin_header = bearer(&signer, true);
        assert!(admin.authenticate(Some(&admin_header), Utc::now()).unwrap().is_admin);
    }

    #[test]
    fn admin_guard_reports_authentication_failures_before_forbidden() {
        let admin = AdminGuard::new(AuthGuard::new(signer()));
        let forged = bearer(&TokenSigner::new("wrong"), true);
        assert_eq!(
            admin.authenticate(Some(&forged), Utc::now()),
            Err(AuthError::Token(TokenError::InvalidSignature))
        );
    }
}
