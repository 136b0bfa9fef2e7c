//! Invite-by-email dialog

use crate::domain::entities::{Group, Invitation, Member, RoleName, RoleScope};
use crate::domain::state::StateError;
use apim_common::Result;

#[derive(Debug, Clone)]
pub struct InviteMemberDialog {
    group: Group,
    member_count: usize,
    invited_emails: Vec<String>,
    is_admin: bool,
    api_role: Option<RoleName>,
    application_role: Option<RoleName>,
}

impl InviteMemberDialog {
    pub fn new(group: &Group, members: &[Member], invitations: &[Invitation]) -> Self {
        Self {
            api_role: group.default_role(RoleScope::Api).cloned(),
            application_role: group.default_role(RoleScope::Application).cloned(),
            group: group.clone(),
            member_count: members.len(),
            invited_emails: invitations
                .iter()
                .map(|invitation| invitation.email.to_lowercase())
                .collect(),
            is_admin: false,
        }
    }

    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    pub fn is_disabled(&self) -> bool {
        !self.group.email_invitation
            || self
                .group
                .is_max_invitation_reached(self.member_count, self.invited_emails.len())
    }

    pub fn api_role(&self) -> Option<&RoleName> {
        self.api_role.as_ref()
    }

    pub fn application_role(&self) -> Option<&RoleName> {
        self.application_role.as_ref()
    }

    /// Invitations carry API and APPLICATION roles only, never PRIMARY_OWNER
    pub fn set_role(
        &mut self,
        scope: RoleScope,
        role: RoleName,
    ) -> std::result::Result<(), StateError> {
        if !self.group.can_change_default_role(scope, self.is_admin) {
            return Err(StateError::GuardFailed(format!(
                "Default {} role of this group is locked",
                scope
            )));
        }
        if role.is_primary_owner() {
            return Err(StateError::GuardFailed(
                "Primary owners cannot be invited".to_string(),
            ));
        }
        let role = Some(role).filter(|role| !role.is_blank());
        match scope {
            RoleScope::Api => self.api_role = role,
            RoleScope::Application => self.application_role = role,
            other => {
                return Err(StateError::GuardFailed(format!(
                    "Invitations do not carry a {} role",
                    other
                )))
            }
        }
        Ok(())
    }

    pub fn submit(&self, email: &str) -> Result<Invitation> {
        if self.is_disabled() {
            return Err(StateError::GuardFailed(
                "Email invitations are not available for this group".to_string(),
            )
            .into());
        }
        let email = email.trim();
        if self.invited_emails.contains(&email.to_lowercase()) {
            return Err(StateError::GuardFailed(format!("{} is already invited", email)).into());
        }

        Invitation::for_group(
            &self.group.id,
            email,
            self.api_role.clone(),
            self.application_role.clone(),
        )
    }
}
