//! Group membership API views.
//!
//! What the group membership collaborator returns to a client: the current
//! key epoch, the member roster, and the caller's own wrapped key envelope.
//! Other members' envelopes are never sent to the caller.

use serde::{Deserialize, Serialize};

use crate::blob::WireBlob;

/// Role of a member within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    /// Group creator; cannot be removed while sole owner.
    Owner,
    /// May mutate membership.
    Admin,
    /// Regular participant.
    Member,
}

/// One roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMemberView {
    /// Member identifier.
    pub user_id: String,
    /// Member role.
    pub role: MemberRole,
    /// Unix seconds at which the member joined.
    pub joined_at: u64,
}

/// Group state as served to one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStateView {
    /// Group identifier.
    pub id: String,
    /// Current key epoch; strictly increases on every membership change.
    pub key_epoch: u64,
    /// Ordered member roster.
    pub members: Vec<GroupMemberView>,
    /// The caller's wrapped epoch-key envelope, if one exists for the
    /// current epoch.
    pub my_encrypted_key_envelope: Option<WireBlob>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_as_snake_case() {
        assert_eq!(serde_json::to_string(&MemberRole::Owner).unwrap(), "\"owner\"");
        assert_eq!(serde_json::to_string(&MemberRole::Admin).unwrap(), "\"admin\"");
        assert_eq!(serde_json::to_string(&MemberRole::Member).unwrap(), "\"member\"");
    }

    #[test]
    fn unknown_role_is_rejected() {
        let result: Result<MemberRole, _> = serde_json::from_str("\"superuser\"");
        assert!(result.is_err());
    }

    #[test]
    fn state_view_roundtrip() {
        let view = GroupStateView {
            id: "g-1".into(),
            key_epoch: 4,
            members: vec![GroupMemberView {
                user_id: "alice".into(),
                role: MemberRole::Owner,
                joined_at: 1_700_000_000,
            }],
            my_encrypted_key_envelope: None,
        };

        let json = serde_json::to_string(&view).unwrap();
        let back: GroupStateView = serde_json::from_str(&json).unwrap();
        assert_eq!(back, view);
    }
}
