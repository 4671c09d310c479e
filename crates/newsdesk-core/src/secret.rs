//! Comparison of secrets supplied by callers (admin tokens, unsubscribe tokens).

use subtle::ConstantTimeEq;

/// Compares two byte strings without short-circuiting on the first mismatch.
///
/// Lengths are not hidden.
pub fn secure_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
