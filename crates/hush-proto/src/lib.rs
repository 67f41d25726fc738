//! Hush wire formats.
//!
//! Shared request/response shapes and the base64 blob wire form, with all
//! validation that must run before anything reaches the crypto layer: strict
//! base64 decoding, exact IV length, and decoded-size caps per payload
//! class. The server never inspects plaintext - these types are the entire
//! surface it understands.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod auth;
pub mod blob;
mod error;
pub mod group;
pub mod limits;
pub mod payload;

pub use auth::{AuthDenied, AuthRequest, AuthSuccess, BlockedNotice};
pub use blob::{BlobClass, WireBlob, WirePinEnvelope};
pub use error::WireError;
pub use group::{GroupMemberView, GroupStateView, MemberRole};
pub use payload::{
    ContactPayload, DirectMessagePayload, GroupMessagePayload, IdentityPayload, PayloadKind,
    PlaintextPayload, decode_payload,
};
