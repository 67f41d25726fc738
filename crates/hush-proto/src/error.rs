//! Wire validation error types.

use thiserror::Error;

/// Errors raised while validating wire data, always before any crypto runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// A field did not decode as strict base64.
    #[error("{field} is not valid base64")]
    InvalidBase64 {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A field's decoded size exceeds its class cap.
    #[error("{field} exceeds maximum size of {max_bytes} bytes")]
    TooLarge {
        /// Name of the offending field.
        field: &'static str,
        /// The enforced cap in decoded bytes.
        max_bytes: usize,
    },

    /// A fixed-length field (the 12-byte IV, the PIN salt) decoded to the
    /// wrong number of bytes.
    #[error("{field} must decode to exactly {expected} bytes, got {got}")]
    InvalidLength {
        /// Name of the offending field.
        field: &'static str,
        /// Required decoded length.
        expected: usize,
        /// Actual decoded length.
        got: usize,
    },

    /// A decrypted payload did not match any known shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The payload's embedded kind disagrees with the transport routing.
    #[error("payload kind {got} does not match transport routing {expected}")]
    KindMismatch {
        /// Kind implied by the transport route.
        expected: &'static str,
        /// Kind embedded in the decrypted payload.
        got: &'static str,
    },
}
