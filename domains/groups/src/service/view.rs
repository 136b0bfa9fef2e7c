//! Group members view
//!
//! One `GroupMembersView` exists per open group. It owns everything the
//! member workflows read (group, members, invitations, settings, configured
//! roles and the membership baseline) and is the only place that submits
//! their results to the management API.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::ManagementApi;
use crate::domain::entities::{
    ConsoleSettings, Group, GroupMembership, Invitation, Member, Role, RoleName, RoleScope,
};
use crate::domain::state::MembershipState;
use crate::domain::workflows::{
    AddMembersDialog, DeleteMemberDialog, DeleteMemberResult, EditMemberDialog, InviteMemberDialog,
    MembershipDraft,
};
use apim_common::{Error, Result};

pub struct GroupMembersView {
    api: Arc<dyn ManagementApi>,
    group: Group,
    members: Vec<Member>,
    invitations: Vec<Invitation>,
    settings: ConsoleSettings,
    roles: BTreeMap<RoleScope, Vec<Role>>,
    state: MembershipState,
    is_admin: bool,
}

fn sort_members(members: &mut [Member]) {
    members.sort_by(|a, b| {
        a.display_name
            .to_lowercase()
            .cmp(&b.display_name.to_lowercase())
    });
}

impl GroupMembersView {
    /// Fetch the group and everything its member workflows need
    pub async fn open(api: Arc<dyn ManagementApi>, group_id: &str) -> Result<Self> {
        let group = api.get_group(group_id).await?;
        let settings = api.get_settings().await?;

        let mut roles = BTreeMap::new();
        for scope in RoleScope::MEMBER_SCOPES {
            let mut scoped = api.list_roles(scope).await?;
            scoped.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
            roles.insert(scope, scoped);
        }

        let mut members = api.get_members(&group.id).await?;
        sort_members(&mut members);
        let invitations = api.get_invitations(&group.id).await?;
        let state = MembershipState::new(&members);

        info!(
            group_id = %group.id,
            members = members.len(),
            invitations = invitations.len(),
            "Group members view opened"
        );

        Ok(Self {
            api,
            group,
            members,
            invitations,
            settings,
            roles,
            state,
            is_admin: false,
        })
    }

    /// Operator may change locked default roles
    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    pub fn group(&self) -> &Group {
        &self.group
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn invitations(&self) -> &[Invitation] {
        &self.invitations
    }

    pub fn settings(&self) -> &ConsoleSettings {
        &self.settings
    }

    pub fn roles(&self, scope: RoleScope) -> &[Role] {
        self.roles
            .get(&scope)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn membership_state(&self) -> &MembershipState {
        &self.state
    }

    pub fn is_max_invitation_reached(&self) -> bool {
        self.group
            .is_max_invitation_reached(self.members.len(), self.invitations.len())
    }

    pub fn can_add_members(&self) -> bool {
        (self.is_admin || self.group.can_invite_members()) && !self.is_max_invitation_reached()
    }

    /// The only member left cannot be removed while primary owner
    pub fn is_delete_disabled(&self) -> bool {
        matches!(self.members.as_slice(), [only] if only.is_primary_owner())
    }

    /// Re-fetch members and invitations and bring the baseline up to date
    pub async fn reload(&mut self) -> Result<()> {
        let mut members = self.api.get_members(&self.group.id).await?;
        sort_members(&mut members);
        let invitations = self.api.get_invitations(&self.group.id).await?;

        self.state.sync(&members);
        let stale: Vec<String> = self
            .state
            .find_all()
            .iter()
            .filter(|stored| !members.iter().any(|member| member.id == stored.id))
            .map(|stored| stored.id.clone())
            .collect();
        for id in stale {
            self.state.remove(&id);
        }

        debug!(
            group_id = %self.group.id,
            members = members.len(),
            invitations = invitations.len(),
            "Group members reloaded"
        );
        self.members = members;
        self.invitations = invitations;
        Ok(())
    }

    pub fn add_members_dialog(&self) -> AddMembersDialog {
        AddMembersDialog::new(
            &self.group,
            &self.members,
            self.invitations.len(),
            self.settings.primary_owner_mode(),
        )
        .with_admin(self.is_admin)
    }

    pub fn edit_member_dialog(&self, member_id: &str) -> Result<EditMemberDialog> {
        Ok(EditMemberDialog::new(
            &self.group,
            member_id,
            &self.members,
            self.settings.primary_owner_mode(),
        )?)
    }

    pub fn delete_member_dialog(&self, member_id: &str) -> Result<DeleteMemberDialog> {
        Ok(DeleteMemberDialog::new(member_id, &self.members)?)
    }

    pub fn invite_member_dialog(&self) -> InviteMemberDialog {
        InviteMemberDialog::new(&self.group, &self.members, &self.invitations)
            .with_admin(self.is_admin)
    }

    /// Look up each draft's external reference through the user search
    pub async fn resolve_references(
        &self,
        drafts: Vec<MembershipDraft>,
    ) -> Result<Vec<GroupMembership>> {
        let mut memberships = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let users = self.api.search_users(&draft.display_name).await?;
            let reference = users
                .into_iter()
                .find(|user| user.id.as_deref() == Some(draft.id.as_str()))
                .map(|user| user.reference)
                .or_else(|| {
                    self.state
                        .find_by_ref(&draft.id)
                        .and_then(|member| member.reference.clone())
                })
                .ok_or_else(|| {
                    Error::NotFound(format!(
                        "No user reference found for {}",
                        draft.display_name
                    ))
                })?;
            memberships.push(draft.into_membership(reference));
        }
        Ok(memberships)
    }

    /// Submit a membership batch in a single call.
    ///
    /// Entries without roles are dropped; an empty batch makes no call and
    /// returns 0. A batch that would leave two primary owners is refused
    /// before reaching the server.
    pub async fn submit_memberships(&mut self, memberships: Vec<GroupMembership>) -> Result<usize> {
        let batch: Vec<GroupMembership> = memberships
            .into_iter()
            .filter(|membership| !membership.is_empty())
            .collect();

        if batch.is_empty() {
            warn!(group_id = %self.group.id, "Membership batch has no roles, nothing submitted");
            return Ok(0);
        }

        let next = self.state.preview(&batch);
        if let Err(e) = next.validate() {
            warn!(group_id = %self.group.id, error = %e, "Membership batch refused");
            return Err(e.into());
        }

        match self
            .api
            .add_or_update_memberships(&self.group.id, &batch)
            .await
        {
            Ok(()) => {
                info!(
                    group_id = %self.group.id,
                    count = batch.len(),
                    "Memberships saved"
                );
                if !self.refresh().await {
                    self.state = next;
                }
                Ok(batch.len())
            }
            Err(e) => self.fail(e).await,
        }
    }

    pub async fn submit_add(&mut self, dialog: &AddMembersDialog) -> Result<usize> {
        self.submit_memberships(dialog.submit().memberships).await
    }

    pub async fn submit_edit(&mut self, dialog: &EditMemberDialog) -> Result<usize> {
        let drafts = dialog.submit()?;
        let memberships = self.resolve_references(drafts).await?;
        self.submit_memberships(memberships).await
    }

    /// Remove a member, handing primary ownership over first when needed.
    ///
    /// The handover is one batch (departing owner to OWNER, replacement to
    /// PRIMARY_OWNER) sent before the delete, so a failed delete leaves the
    /// group with exactly one primary owner.
    pub async fn delete_member(
        &mut self,
        member_id: &str,
        result: DeleteMemberResult,
    ) -> Result<()> {
        if !result.should_delete {
            return Ok(());
        }

        let member = self
            .state
            .find_by_ref(member_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Member not found in group: {}", member_id)))?;

        let transferred = match result.primary_owner_membership {
            Some(replacement) => {
                let mut departing = MembershipDraft::from(&member);
                departing.roles.insert(RoleScope::Api, RoleName::Owner);
                let memberships = self.resolve_references(vec![departing, replacement]).await?;
                self.submit_memberships(memberships).await?;
                info!(
                    group_id = %self.group.id,
                    from = %member.id,
                    "Primary ownership transferred"
                );
                true
            }
            None if member.is_primary_owner() => {
                return Err(Error::Validation(
                    "The primary owner can only be removed after handing over ownership"
                        .to_string(),
                ));
            }
            None => false,
        };

        match self.api.delete_member(&self.group.id, member_id).await {
            Ok(()) => {
                self.state.remove(member_id);
                if self.group.api_primary_owner.as_deref() == Some(member_id) {
                    self.group.api_primary_owner = None;
                }
                info!(
                    group_id = %self.group.id,
                    member_id = %member_id,
                    "Member removed from group"
                );
                self.refresh().await;
                Ok(())
            }
            Err(e) => {
                if transferred {
                    error!(
                        group_id = %self.group.id,
                        member_id = %member_id,
                        error = %e,
                        "Ownership was transferred but the member could not be removed"
                    );
                }
                self.fail(e).await
            }
        }
    }

    pub async fn invite(&mut self, invitation: Invitation) -> Result<Invitation> {
        match self.api.invite_member(&self.group.id, &invitation).await {
            Ok(created) => {
                info!(group_id = %self.group.id, email = %created.email, "Invitation sent");
                self.refresh().await;
                Ok(created)
            }
            Err(e) => self.fail(e).await,
        }
    }

    pub async fn delete_invitation(&mut self, invitation_id: &str) -> Result<()> {
        match self
            .api
            .delete_invitation(&self.group.id, invitation_id)
            .await
        {
            Ok(()) => {
                info!(
                    group_id = %self.group.id,
                    invitation_id = %invitation_id,
                    "Invitation deleted"
                );
                self.refresh().await;
                Ok(())
            }
            Err(e) => self.fail(e).await,
        }
    }

    /// Reload without failing the caller; false when the server state could
    /// not be fetched
    async fn refresh(&mut self) -> bool {
        match self.reload().await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    group_id = %self.group.id,
                    error = %e,
                    "Could not reload group members"
                );
                false
            }
        }
    }

    /// Report a failed call and fall back to the server's state
    async fn fail<T>(&mut self, err: Error) -> Result<T> {
        error!(group_id = %self.group.id, error = %err, "Management API call failed");
        self.refresh().await;
        Err(err)
    }
}
