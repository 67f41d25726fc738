//! Typed plaintext payloads.
//!
//! Decrypted bytes are never trusted as free-form JSON: they must parse into
//! exactly one variant of a closed union, and the embedded kind must agree
//! with the transport-level routing that delivered the blob. A payload that
//! claims to be a direct message but arrived on a group route is rejected,
//! not routed by its own claim.

use serde::{Deserialize, Serialize};

use crate::error::WireError;

/// A two-party message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectMessagePayload {
    /// Deterministic conversation identifier the message belongs to.
    pub conversation_id: String,
    /// Message text.
    pub body: String,
    /// Sender-claimed Unix-seconds timestamp.
    pub sent_at: u64,
}

/// A group message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupMessagePayload {
    /// Group the message belongs to.
    pub group_id: String,
    /// Key epoch the body was encrypted under.
    pub epoch: u64,
    /// Message text.
    pub body: String,
    /// Sender-claimed Unix-seconds timestamp.
    pub sent_at: u64,
}

/// The user's own identity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityPayload {
    /// Stable user identifier.
    pub user_id: String,
    /// Display name shown to contacts.
    pub display_name: String,
}

/// One contact-list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactPayload {
    /// The contact's user identifier.
    pub user_id: String,
    /// Name the owner stored for this contact.
    pub display_name: String,
}

/// The closed set of plaintext payload shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlaintextPayload {
    /// Two-party message.
    DirectMessage(DirectMessagePayload),
    /// Group message.
    GroupMessage(GroupMessagePayload),
    /// Identity record.
    Identity(IdentityPayload),
    /// Contact entry.
    Contact(ContactPayload),
}

impl PlaintextPayload {
    /// The kind tag of this payload.
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::DirectMessage(_) => PayloadKind::DirectMessage,
            Self::GroupMessage(_) => PayloadKind::GroupMessage,
            Self::Identity(_) => PayloadKind::Identity,
            Self::Contact(_) => PayloadKind::Contact,
        }
    }
}

/// Payload kind as implied by transport routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// Two-party message route.
    DirectMessage,
    /// Group message route.
    GroupMessage,
    /// Identity store route.
    Identity,
    /// Contact store route.
    Contact,
}

impl PayloadKind {
    /// Stable name matching the wire tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DirectMessage => "direct_message",
            Self::GroupMessage => "group_message",
            Self::Identity => "identity",
            Self::Contact => "contact",
        }
    }
}

/// Parse decrypted bytes and cross-check the embedded kind against the
/// route that delivered the blob.
///
/// # Errors
///
/// [`WireError::MalformedPayload`] for anything that is not exactly one
/// known shape, [`WireError::KindMismatch`] when the payload's own tag
/// disagrees with the transport routing.
pub fn decode_payload(bytes: &[u8], expected: PayloadKind) -> Result<PlaintextPayload, WireError> {
    let payload: PlaintextPayload = serde_json::from_slice(bytes)
        .map_err(|e| WireError::MalformedPayload(e.to_string()))?;

    let got = payload.kind();
    if got != expected {
        return Err(WireError::KindMismatch { expected: expected.as_str(), got: got.as_str() });
    }

    Ok(payload)
}
