// ============================
// backend-lib/src/auth/session.rs
// ============================
//! Session token signing and verification.
//!
//! Sessions are stateless: a signed HS256 token carries the user identity
//! and its own expiry, nothing is kept server side.
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use linkshelf_common::UserIdentity;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default session TTL (time to live)
pub const SESSION_TTL: Duration = Duration::from_secs(60 * 60); // 1 hour

/// Source of the current unix time in seconds
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_secs() as i64, Ordering::SeqCst);
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Payload of a session token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    pub user: UserIdentity,
    /// Issued at, unix seconds
    pub iat: i64,
    /// Expires at, unix seconds
    pub exp: i64,
}

impl SessionClaims {
    /// A claim is valid only while `now < exp`
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}

/// Why a request was not let through
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    #[error("auth header not set")]
    HeaderNotSet,

    #[error("bearer token missing")]
    BearerTokenMissing,

    /// Bad signature, malformed payload or expired
    #[error("invalid token")]
    InvalidToken,
}

/// Pull the token out of an `Authorization` header value
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthRejection> {
    let rest = header
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AuthRejection::HeaderNotSet)?;

    match rest.split(' ').next() {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AuthRejection::BearerTokenMissing),
    }
}

/// Why a token could not be minted
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("session expiry does not fit in a unix timestamp")]
    ExpiryOutOfRange,

    #[error(transparent)]
    Encode(#[from] jsonwebtoken::errors::Error),
}

/// Mints session tokens
pub struct TokenSigner {
    key: EncodingKey,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenSigner {
    pub fn new(secret: &[u8], ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            key: EncodingKey::from_secret(secret),
            ttl,
            clock,
        }
    }

    /// Sign a token for `user`, valid from now until now + TTL
    pub fn issue(&self, user: UserIdentity) -> Result<String, TokenError> {
        let iat = self.clock.now();
        let ttl = i64::try_from(self.ttl.as_secs().max(1))
            .map_err(|_| TokenError::ExpiryOutOfRange)?;
        let exp = iat.checked_add(ttl).ok_or(TokenError::ExpiryOutOfRange)?;

        let claims = SessionClaims { user, iat, exp };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.key)?)
    }
}

/// Checks session tokens presented by clients
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenVerifier {
    pub fn new(secret: &[u8], clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against our own clock, with no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat"]);

        Self {
            key: DecodingKey::from_secret(secret),
            validation,
            clock,
        }
    }

    /// Verify signature and expiry, returning the embedded claims
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthRejection> {
        let claims = decode::<SessionClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "session token rejected");
                AuthRejection::InvalidToken
            })?;

        if claims.exp <= claims.iat || claims.is_expired_at(self.clock.now()) {
            tracing::debug!(exp = claims.exp, "session token expired");
            return Err(AuthRejection::InvalidToken);
        }

        Ok(claims)
    }
}
