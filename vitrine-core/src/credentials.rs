//! Credential hashing capability
//!
//! Wraps the secret-hashing primitive behind a small seam so the rest
//! of the core only sees `hash(secret) -> digest` and
//! `verify(secret, digest) -> bool`. No internal state.

#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialVerifier;

impl CredentialVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Hash a secret into an opaque digest.
    pub fn hash(&self, secret: &str) -> String {
        password_auth::generate_hash(secret)
    }

    /// Verify a secret against a stored digest.
    pub fn verify(&self, secret: &str, digest: &str) -> bool {
        password_auth::verify_password(secret, digest).is_ok()
    }
}
