//! Signed access/refresh tokens.
//!
//! Access and refresh tokens are plain HS256 JWTs carrying the username and
//! an expiry. The two kinds use distinct secrets and distinct lifetimes, so a
//! leaked refresh secret cannot forge access tokens and vice versa.

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_ACCESS_TTL_SECONDS: i64 = 900;
pub const DEFAULT_REFRESH_TTL_SECONDS: i64 = 86_400;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

/// Claims embedded in both token kinds. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub exp: i64,
}

/// One signing key plus its lifetime.
pub struct Signer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: i64,
}

impl Signer {
    #[must_use]
    pub fn new(secret: &[u8], ttl_seconds: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_seconds,
        }
    }

    /// Sign a token for `username` expiring `ttl_seconds` from now.
    ///
    /// # Errors
    /// Returns `TokenError::Invalid` if encoding fails, which does not happen
    /// for HS256 with serializable claims.
    pub fn sign(&self, username: &str) -> Result<String, TokenError> {
        let claims = Claims {
            username: username.to_string(),
            exp: Utc::now().timestamp() + self.ttl_seconds,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| TokenError::Invalid)
    }

    /// Verify signature and expiry, returning the embedded claims.
    ///
    /// # Errors
    /// `TokenError::Expired` when the token is well-formed but past its
    /// expiry; `TokenError::Invalid` for every other failure.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

/// The access/refresh key pair used by the session service.
pub struct TokenSuite {
    pub access: Signer,
    pub refresh: Signer,
}

impl TokenSuite {
    #[must_use]
    pub fn new(
        access_secret: &[u8],
        refresh_secret: &[u8],
        access_ttl_seconds: i64,
        refresh_ttl_seconds: i64,
    ) -> Self {
        Self {
            access: Signer::new(access_secret, access_ttl_seconds),
            refresh: Signer::new(refresh_secret, refresh_ttl_seconds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suite() -> TokenSuite {
        TokenSuite::new(
            b"access-secret",
            b"refresh-secret",
            DEFAULT_ACCESS_TTL_SECONDS,
            DEFAULT_REFRESH_TTL_SECONDS,
        )
    }

    #[test]
    fn sign_verify_round_trip() {
        let suite = suite();
        let token = suite.access.sign("alice").expect("sign should succeed");
        assert_eq!(token.split('.').count(), 3);

        let claims = suite.access.verify(&token).expect("verify should succeed");
        assert_eq!(claims.username, "alice");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let signer = Signer::new(b"access-secret", -10);
        let token = signer.sign("alice").expect("sign should succeed");
        assert_eq!(signer.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = suite().access.sign("alice").expect("sign should succeed");
        let other = Signer::new(b"other-secret", DEFAULT_ACCESS_TTL_SECONDS);
        assert_eq!(other.verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn access_and_refresh_secrets_are_not_interchangeable() {
        let suite = suite();
        let refresh = suite.refresh.sign("alice").expect("sign should succeed");
        assert_eq!(suite.access.verify(&refresh), Err(TokenError::Invalid));

        let access = suite.access.sign("alice").expect("sign should succeed");
        assert_eq!(suite.refresh.verify(&access), Err(TokenError::Invalid));
    }

    #[test]
    fn garbage_input_is_invalid() {
        let suite = suite();
        assert_eq!(suite.access.verify(""), Err(TokenError::Invalid));
        assert_eq!(suite.access.verify("a.b.c"), Err(TokenError::Invalid));
        assert_eq!(
            suite.access.verify("not a token at all"),
            Err(TokenError::Invalid)
        );
    }
}
