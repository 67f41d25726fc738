//! Deterministic two-party conversation identifiers.

use sha2::{Digest, Sha256};

/// Number of digest bytes kept for the identifier.
const CONVERSATION_ID_BYTES: usize = 16;

/// Compute the conversation identifier for a pair of users.
///
/// `SHA-256` over the sorted pair, truncated to 16 bytes and formatted as a
/// UUID-like string. Commutative: `conversation_id(a, b) ==
/// conversation_id(b, a)`. This is a deterministic routing identifier, not a
/// random UUID - both participants compute it independently and arrive at
/// the same value without coordination.
pub fn conversation_id(a: &str, b: &str) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

    let mut hasher = Sha256::new();
    hasher.update(lo.as_bytes());
    hasher.update(b":");
    hasher.update(hi.as_bytes());
    let digest = hasher.finalize();

    format_uuid_like(&digest[..CONVERSATION_ID_BYTES])
}

/// Render 16 bytes in the 8-4-4-4-12 hex layout.
fn format_uuid_like(bytes: &[u8]) -> String {
    debug_assert_eq!(bytes.len(), CONVERSATION_ID_BYTES);

    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("{}-{}-{}-{}-{}", &hex[0..8], &hex[8..12], &hex[12..16], &hex[16..20], &hex[20..32])
}
