//! HS256 token minting and verification.

use std::time::Duration;

use chrono::{DateTime, SubsecRound, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use uuid::Uuid;

use ecom_core::UserId;

use crate::claims::{Claims, TokenError, TokenKind};

/// Stateless signer/verifier for bearer tokens.
///
/// Holds the process-wide secret; immutable after construction and safe to
/// share across requests without synchronization.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl core::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenSigner").finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();

        // Expiry is checked against the caller's clock after the signature
        // has been verified, so the library's own time checks are disabled.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.set_required_spec_claims::<&str>(&[]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Mint a token for `subject_id` valid for `valid_for` starting at `now`.
    pub fn create_token(
        &self,
        subject_id: UserId,
        email: &str,
        is_admin: bool,
        kind: TokenKind,
        valid_for: Duration,
        now: DateTime<Utc>,
    ) -> Result<(String, Claims), TokenError> {
        let issued_at = now.trunc_subsecs(0);
        let lifetime =
            chrono::Duration::from_std(valid_for).map_err(|_| TokenError::InvalidDuration)?;
        let expires_at = issued_at
            .checked_add_signed(lifetime)
            .ok_or(TokenError::InvalidDuration)?;

        let claims = Claims {
            subject_id,
            email: email.to_string(),
            is_admin,
            kind,
            token_id: Uuid::now_v7(),
            issued_at,
            expires_at,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok((token, claims))
    }

    /// [`TokenSigner::verify_token`], then require the token to be of `kind`.
    pub fn verify_kind(
        &self,
        token: &str,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<Claims, TokenError> {
        let claims = self.verify_token(token, now)?;
        if claims.kind != kind {
            return Err(TokenError::WrongKind { expected: kind });
        }
        Ok(claims)
    }

    /// Verify signature first, then expiry against `now`.
    pub fn verify_token(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                _ => TokenError::Malformed(e.to_string()),
            })?;

        let claims = data.claims;
        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}
