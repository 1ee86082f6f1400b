//! ID generation utilities with prefix support
//!
//! Identifiers are opaque prefixed strings with at least 96 bits of
//! entropy, URL-safe and free of padding.

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};

/// Generate a prefixed ID with 96 bits of entropy
///
/// The ID format is `{prefix}_{random}` where the random part is
/// base64 URL-safe encoded without padding.
pub fn generate_prefixed_id(prefix: &str) -> String {
    let mut bytes = [0u8; 12];
    OsRng.try_fill_bytes(&mut bytes).unwrap();

    let encoded = BASE64_URL_SAFE_NO_PAD.encode(bytes);

    format!("{prefix}_{encoded}")
}

/// Validate that a prefixed ID has the expected prefix and at least
/// 96 bits of decodable payload.
pub fn validate_prefixed_id(id: &str, expected_prefix: &str) -> bool {
    if !id.starts_with(&format!("{expected_prefix}_")) {
        return false;
    }

    let random_part = &id[expected_prefix.len() + 1..];

    match BASE64_URL_SAFE_NO_PAD.decode(random_part) {
        Ok(decoded) => decoded.len() >= 12,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_prefixed_id() {
        let id = generate_prefixed_id("acct");
        assert!(id.starts_with("acct_"));

        let id2 = generate_prefixed_id("acct");
        assert_ne!(id, id2);
    }

    #[test]
    fn test_validate_prefixed_id() {
        let id = generate_prefixed_id("acct");
        assert!(validate_prefixed_id(&id, "acct"));
        assert!(!validate_prefixed_id(&id, "sess"));

        assert!(!validate_prefixed_id("acct", "acct"));
        assert!(!validate_prefixed_id("acct_", "acct"));
        assert!(!validate_prefixed_id("acct_invalid!", "acct"));
    }

    #[test]
    fn test_id_is_url_safe() {
        let id = generate_prefixed_id("sess");
        assert!(
            id.chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        );
    }
}
