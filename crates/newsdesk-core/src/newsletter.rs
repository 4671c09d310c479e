//! Newsletter helpers shared by the server and the CLI.

use sha2::{Digest, Sha256};

use crate::secret::secure_eq;

/// Normalizes an address for storage and comparison.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Hex SHA-256 over the normalized address and the newsletter secret.
///
/// Sent in unsubscribe links so a reader can leave without logging in, while
/// nobody can unsubscribe an address they do not hold a link for.
pub fn unsubscribe_token(email: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_email(email).as_bytes());
    hasher.update(b":");
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Checks a token from an unsubscribe link.
pub fn verify_unsubscribe_token(email: &str, secret: &str, token: &str) -> bool {
    let expected = unsubscribe_token(email, secret);
    secure_eq(expected.as_bytes(), token.to_ascii_lowercase().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Reader@Example.COM "), "reader@example.com");
    }

    #[test]
    fn test_token_is_stable_and_case_insensitive_on_email() {
        let a = unsubscribe_token("reader@example.com", "secret");
        let b = unsubscribe_token("READER@example.com", "secret");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_token_depends_on_secret() {
        assert_ne!(
            unsubscribe_token("reader@example.com", "one"),
            unsubscribe_token("reader@example.com", "two")
        );
    }

    #[test]
    fn test_verify() {
        let token = unsubscribe_token("reader@example.com", "secret");
        assert!(verify_unsubscribe_token("reader@example.com", "secret", &token));
        assert!(verify_unsubscribe_token(
            "reader@example.com",
            "secret",
            &token.to_uppercase()
        ));
        assert!(!verify_unsubscribe_token("other@example.com", "secret", &token));
        assert!(!verify_unsubscribe_token("reader@example.com", "secret", "abc"));
    }
}
