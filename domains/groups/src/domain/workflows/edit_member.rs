//! Edit member dialog
//!
//! The API role picked for the member decides how many memberships the
//! dialog produces:
//! - Upgrade to PRIMARY_OWNER: the current primary owner, if any, is
//!   demoted to OWNER in the same batch.
//! - Downgrade from PRIMARY_OWNER: a replacement must be selected and is
//!   promoted in the same batch.
//! - Anything else: the member alone.

use std::collections::BTreeMap;

use super::MembershipDraft;
use crate::domain::entities::{Group, Member, PrimaryOwnerMode, RoleName, RoleScope};
use crate::domain::state::{MembershipState, StateError};

/// Class of change applied to the member's API role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiRoleTransition {
    Upgrade,
    Downgrade,
    Lateral,
}

impl ApiRoleTransition {
    pub fn classify(initial: Option<&RoleName>, target: Option<&RoleName>) -> Self {
        let was_owner = initial.is_some_and(RoleName::is_primary_owner);
        let is_owner = target.is_some_and(RoleName::is_primary_owner);
        match (was_owner, is_owner) {
            (false, true) => ApiRoleTransition::Upgrade,
            (true, false) => ApiRoleTransition::Downgrade,
            _ => ApiRoleTransition::Lateral,
        }
    }
}

impl std::fmt::Display for ApiRoleTransition {
    #[mutants::skip] // Only rendered into tracing fields
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upgrade => write!(f, "upgrade"),
            Self::Downgrade => write!(f, "downgrade"),
            Self::Lateral => write!(f, "lateral"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EditMemberDialog {
    group_id: String,
    member: Member,
    state: MembershipState,
    primary_owner_mode: PrimaryOwnerMode,
    roles: BTreeMap<RoleScope, RoleName>,
    replacement: Option<Member>,
}

impl EditMemberDialog {
    pub fn new(
        group: &Group,
        member_id: &str,
        members: &[Member],
        primary_owner_mode: PrimaryOwnerMode,
    ) -> Result<Self, StateError> {
        let state = MembershipState::new(members);
        let member = state
            .find_by_ref(member_id)
            .cloned()
            .ok_or_else(|| StateError::UnknownMember(member_id.to_string()))?;

        Ok(Self {
            group_id: group.id.clone(),
            roles: member.roles.clone(),
            member,
            state,
            primary_owner_mode,
            replacement: None,
        })
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn member(&self) -> &Member {
        &self.member
    }

    pub fn initial_api_role(&self) -> Option<&RoleName> {
        self.member.api_role()
    }

    pub fn role(&self, scope: RoleScope) -> Option<&RoleName> {
        self.roles.get(&scope)
    }

    pub fn is_role_option_disabled(&self, scope: RoleScope, role: &RoleName) -> bool {
        role.is_primary_owner()
            && scope.has_primary_owner()
            && self.primary_owner_mode.is_user_only()
    }

    pub fn set_role(&mut self, scope: RoleScope, role: RoleName) -> Result<(), StateError> {
        if self.is_role_option_disabled(scope, &role) {
            return Err(StateError::GuardFailed(format!(
                "{} is not available in scope {}",
                role, scope
            )));
        }
        if role.is_blank() && scope == RoleScope::Api && self.member.is_primary_owner() {
            return Err(StateError::GuardFailed(
                "The primary owner must be given another API role".to_string(),
            ));
        }
        if role.is_blank() {
            self.roles.remove(&scope);
        } else {
            self.roles.insert(scope, role);
        }
        if self.transition() != ApiRoleTransition::Downgrade {
            self.replacement = None;
        }
        Ok(())
    }

    pub fn transition(&self) -> ApiRoleTransition {
        ApiRoleTransition::classify(self.initial_api_role(), self.roles.get(&RoleScope::Api))
    }

    /// Member with the roles currently picked in the dialog
    pub fn candidate(&self) -> Member {
        Member {
            roles: self.roles.clone(),
            ..self.member.clone()
        }
    }

    pub fn replacement_candidates(&self) -> Vec<&Member> {
        self.state
            .find_all()
            .iter()
            .filter(|member| member.id != self.member.id)
            .collect()
    }

    pub fn replacement(&self) -> Option<&Member> {
        self.replacement.as_ref()
    }

    pub fn select_replacement(&mut self, member_id: &str) -> Result<(), StateError> {
        if self.transition() != ApiRoleTransition::Downgrade {
            return Err(StateError::GuardFailed(
                "A replacement is only needed when demoting the primary owner".to_string(),
            ));
        }
        if member_id == self.member.id {
            return Err(StateError::GuardFailed(
                "The demoted member cannot replace itself".to_string(),
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
        self.transition() == ApiRoleTransition::Downgrade && self.replacement.is_none()
    }

    /// Memberships to submit together, in one batch
    pub fn submit(&self) -> Result<Vec<MembershipDraft>, StateError> {
        let candidate = self.candidate();

        let drafts = match self.transition() {
            ApiRoleTransition::Upgrade => {
                let mut drafts = Vec::with_capacity(2);
                if self.state.is_primary_owner_promotion(&candidate) {
                    if let Some(owner) = self.state.get_primary_owner() {
                        let mut demoted = owner.clone();
                        demoted.roles.insert(RoleScope::Api, RoleName::Owner);
                        drafts.push(MembershipDraft::from(demoted));
                    }
                }
                drafts.push(MembershipDraft::from(candidate));
                drafts
            }
            ApiRoleTransition::Downgrade => {
                let promoted = self
                    .replacement
                    .clone()
                    .ok_or(StateError::ReplacementRequired)?
                    .with_role(RoleScope::Api, RoleName::PrimaryOwner);
                vec![
                    MembershipDraft::from(candidate),
                    MembershipDraft::from(promoted),
                ]
            }
            ApiRoleTransition::Lateral => vec![MembershipDraft::from(candidate)],
        };

        tracing::debug!(
            member_id = %self.member.id,
            transition = %self.transition(),
            batch_size = drafts.len(),
            "Edit member dialog submitted"
        );
        Ok(drafts)
    }
}
