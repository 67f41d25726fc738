//! Error types for the client core.

use hush_crypto::CryptoError;
use hush_proto::WireError;
use thiserror::Error;

/// Errors from session and group operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Operation referenced a group this manager does not track.
    #[error("unknown group: {0}")]
    UnknownGroup(String),

    /// Operation referenced a user who is not a member of the group.
    #[error("user {user_id} is not a member of group {group_id}")]
    NotAMember {
        /// Group the operation targeted.
        group_id: String,
        /// The non-member user.
        user_id: String,
    },

    /// Attempted to add a user who is already a member.
    #[error("user {user_id} is already a member of group {group_id}")]
    AlreadyMember {
        /// Group the operation targeted.
        group_id: String,
        /// The duplicate user.
        user_id: String,
    },

    /// Attempted to remove the only remaining owner.
    #[error("cannot remove the sole owner of group {0}")]
    SoleOwner(String),

    /// A group must keep at least one member.
    #[error("group {0} cannot be left empty")]
    EmptyGroup(String),

    /// Underlying crypto failure.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// A decrypted payload failed wire validation.
    #[error(transparent)]
    Wire(#[from] WireError),
}
