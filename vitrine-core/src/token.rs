//! Signed, time-limited password-reset tokens
//!
//! Tokens bind `(subject = email, purpose = "password-reset",
//! issued-at)` under an HS256 signature and expire exactly one hour
//! after issuance by default. Validation here is necessary but not
//! sufficient for a reset: the repository additionally requires the
//! token to equal the single token stored on the target account, which
//! is what makes tokens single-use and lets a re-issue supersede an
//! earlier token before its window closes.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::{Error, error::TokenError};

const RESET_PURPOSE: &str = "password-reset";

/// Process-wide signing configuration, injected at startup and
/// immutable thereafter.
#[derive(Clone)]
pub struct TokenConfig {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenConfig {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::hours(1),
        }
    }

    /// Override the validity window. Used by tests; production keeps
    /// the 1-hour default.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ResetClaims {
    sub: String,
    purpose: String,
    iat: i64,
    exp: i64,
}

/// Issues and validates reset tokens. Stateless apart from the shared
/// signing secret; the stored per-account token fields carry the
/// consumed/superseded state.
pub struct ResetTokenService {
    config: TokenConfig,
}

impl ResetTokenService {
    pub fn new(config: TokenConfig) -> Self {
        Self { config }
    }

    /// Issue a signed token for the given email. The encoding is
    /// deterministic given the claims but not guessable without the
    /// signing secret.
    pub fn issue(&self, email: &str) -> Result<String, Error> {
        let now = Utc::now();
        let claims = ResetClaims {
            sub: email.to_string(),
            purpose: RESET_PURPOSE.to_string(),
            iat: now.timestamp(),
            exp: (now + self.config.ttl).timestamp(),
        };

        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(&self.config.secret),
        )
        .map_err(|_| TokenError::Invalid.into())
    }

    /// Validate a token and return the email it was bound to.
    ///
    /// Fails with `Expired` when the validity window has passed and
    /// `Invalid` when the signature does not verify or the purpose
    /// tag mismatches.
    pub fn validate(&self, token: &str) -> Result<String, Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let data = jsonwebtoken::decode::<ResetClaims>(
            token,
            &DecodingKey::from_secret(&self.config.secret),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => Error::Token(TokenError::Expired),
            _ => Error::Token(TokenError::Invalid),
        })?;

        if data.claims.purpose != RESET_PURPOSE {
            return Err(TokenError::Invalid.into());
        }

        Ok(data.claims.sub)
    }
}
