//! Member workflows
//!
//! Each workflow models one console dialog without any rendering: it is
//! opened with the group and member lists fetched when the dialog opens,
//! stages the operator's selections, reports which controls are disabled,
//! and produces the mutation the group view submits.

mod add_members;
mod delete_member;
mod edit_member;
mod invite_member;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::entities::{GroupMembership, Member, RoleName, RoleScope};

pub use add_members::AddMembersDialog;
pub use delete_member::DeleteMemberDialog;
pub use edit_member::{ApiRoleTransition, EditMemberDialog};
pub use invite_member::InviteMemberDialog;

/// Membership whose external reference has not been resolved yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipDraft {
    pub id: String,
    pub display_name: String,
    pub roles: BTreeMap<RoleScope, RoleName>,
}

impl MembershipDraft {
    pub fn role(&self, scope: RoleScope) -> Option<&RoleName> {
        self.roles.get(&scope)
    }

    pub fn into_membership(self, reference: impl Into<String>) -> GroupMembership {
        GroupMembership::new(self.id, reference, &self.roles)
    }
}

impl From<&Member> for MembershipDraft {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id.clone(),
            display_name: member.display_name.clone(),
            roles: member.roles.clone(),
        }
    }
}

impl From<Member> for MembershipDraft {
    fn from(member: Member) -> Self {
        Self {
            id: member.id,
            display_name: member.display_name,
            roles: member.roles,
        }
    }
}

/// Result of the add and edit dialogs
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AddOrUpdateMembersResult {
    pub memberships: Vec<GroupMembership>,
}

/// Result of the delete dialog
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeleteMemberResult {
    pub should_delete: bool,
    /// Replacement taking over PRIMARY_OWNER when the deleted member held it
    pub primary_owner_membership: Option<MembershipDraft>,
}
