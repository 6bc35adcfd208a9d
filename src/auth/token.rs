//! HS256 access/refresh token pairs.
//!
//! Both kinds carry the user id in `sub`; the `kind` claim keeps a refresh token
//! from being accepted where an access token is required and vice versa.

use crate::core::authz::UserId;
use crate::errors::{Error, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Which half of a pair a token is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived, presented on every request
    Access,
    /// Longer-lived, exchanged for a new pair
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    kind: TokenKind,
    iat: i64,
    exp: i64,
}

/// Tokens returned by sign-in and refresh
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenPair {
    /// Bearer token for API requests
    pub access: String,
    /// Token for `POST /users/token-refresh`
    pub refresh: String,
}

/// Signing and verification keys plus token lifetimes
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenKeys {
    /// Builds keys from a shared secret.
    #[must_use]
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Issues a fresh access/refresh pair for `user_id`.
    pub fn issue_pair(&self, user_id: UserId) -> Result<TokenPair> {
        Ok(TokenPair {
            access: self.issue(user_id, TokenKind::Access, self.access_ttl)?,
            refresh: self.issue(user_id, TokenKind::Refresh, self.refresh_ttl)?,
        })
    }

    fn issue(&self, user_id: UserId, kind: TokenKind, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        let expires = now.checked_add_signed(ttl).ok_or_else(|| Error::Config {
            message: format!("token lifetime {ttl} overflows the clock"),
        })?;
        let claims = Claims {
            sub: user_id.to_string(),
            kind,
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(Into::into)
    }

    /// Verifies signature, expiry and kind, returning the user id.
    ///
    /// Every failure is reported as [`Error::Unauthorized`].
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<UserId> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|e| Error::unauthorized(format!("invalid token: {e}")))?;
        if data.claims.kind != expected {
            return Err(Error::unauthorized("wrong token kind"));
        }
        data.claims
            .sub
            .parse()
            .map_err(|_| Error::unauthorized("invalid token subject"))
    }
}
