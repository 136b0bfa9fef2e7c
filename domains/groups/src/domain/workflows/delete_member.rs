//! Delete member dialog

use super::{DeleteMemberResult, MembershipDraft};
use crate::domain::entities::{Member, RoleName, RoleScope};
use crate::domain::state::{MembershipState, StateError};

/// Confirms removal of a member, collecting a new primary owner when the
/// member being removed holds the role
#[derive(Debug, Clone)]
pub struct DeleteMemberDialog {
    member: Member,
    state: MembershipState,
    replacement: Option<Member>,
}

impl DeleteMemberDialog {
    pub fn new(member_id: &str, members: &[Member]) -> Result<Self, StateError> {
        let state = MembershipState::new(members);
        let member = state
            .find_by_ref(member_id)
            .cloned()
            .ok_or_else(|| StateError::UnknownMember(member_id.to_string()))?;
        Ok(Self {
            member,
            state,
            replacement: None,
        })
    }

    pub fn member(&self) -> &Member {
        &self.member
    }

    pub fn requires_replacement(&self) -> bool {
        self.member.is_primary_owner()
    }

    pub fn replacement_candidates(&self) -> Vec<&Member> {
        self.state
            .find_all()
            .iter()
            .filter(|member| member.id != self.member.id)
            .collect()
    }

    /// The sole member of a group cannot be removed while primary owner
    pub fn can_delete(&self) -> bool {
        !(self.requires_replacement() && self.replacement_candidates().is_empty())
    }

    pub fn select_replacement(&mut self, member_id: &str) -> Result<(), StateError> {
        if !self.requires_replacement() {
            return Err(StateError::GuardFailed(format!(
                "{} is not the primary owner",
                self.member.display_name
            )));
        }
        if member_id == self.member.id {
            return Err(StateError::GuardFailed(
                "The removed member cannot replace itself".to_string(),
            ));
        }
        let replacement = self
            .state
            .find_by_ref(member_id)
            .cloned()
            .ok_or_else(|| StateError::UnknownMember(member_id.to_string()))?;
        self.replacement = Some(replacement);
        Ok(())
    }

    pub fn is_submit_disabled(&self) -> bool {
        !self.can_delete() || (self.requires_replacement() && self.replacement.is_none())
    }

    pub fn confirm(&self) -> Result<DeleteMemberResult, StateError> {
        if !self.can_delete() {
            return Err(StateError::GuardFailed(format!(
                "{} is the last member and primary owner of the group",
                self.member.display_name
            )));
        }

        let primary_owner_membership = if self.requires_replacement() {
            let promoted = self
                .replacement
                .clone()
                .ok_or(StateError::ReplacementRequired)?
                .with_role(RoleScope::Api, RoleName::PrimaryOwner);
            Some(MembershipDraft::from(promoted))
        } else {
            None
        };

        Ok(DeleteMemberResult {
            should_delete: true,
            primary_owner_membership,
        })
    }

    /// Closing the dialog discards everything staged
    pub fn cancel(&self) -> DeleteMemberResult {
        DeleteMemberResult::default()
    }
}
