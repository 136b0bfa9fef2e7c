//! Search-and-add members dialog

use std::collections::BTreeMap;

use super::AddOrUpdateMembersResult;
use crate::domain::entities::{
    Group, GroupMembership, Member, PrimaryOwnerMode, RoleName, RoleScope, SearchableUser,
};
use crate::domain::state::{MembershipState, StateError};

/// Stages users found by search and the roles they will receive
#[derive(Debug, Clone)]
pub struct AddMembersDialog {
    group: Group,
    state: MembershipState,
    pending_invitations: usize,
    primary_owner_mode: PrimaryOwnerMode,
    is_admin: bool,
    default_roles: BTreeMap<RoleScope, RoleName>,
    selected: Vec<SearchableUser>,
}

impl AddMembersDialog {
    pub fn new(
        group: &Group,
        members: &[Member],
        pending_invitations: usize,
        primary_owner_mode: PrimaryOwnerMode,
    ) -> Self {
        let default_roles = RoleScope::MEMBER_SCOPES
            .into_iter()
            .filter_map(|scope| group.default_role(scope).map(|role| (scope, role.clone())))
            .collect();

        Self {
            group: group.clone(),
            state: MembershipState::new(members),
            pending_invitations,
            primary_owner_mode,
            is_admin: false,
            default_roles,
            selected: Vec::new(),
        }
    }

    /// Environment administrators may change locked default roles
    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    pub fn default_role(&self, scope: RoleScope) -> Option<&RoleName> {
        self.default_roles.get(&scope)
    }

    pub fn can_change_role(&self, scope: RoleScope) -> bool {
        self.group.can_change_default_role(scope, self.is_admin)
    }

    /// PRIMARY_OWNER cannot be offered when the scope already has one or
    /// when only users may own APIs in this environment
    pub fn is_role_option_disabled(&self, scope: RoleScope, role: &RoleName) -> bool {
        role.is_primary_owner()
            && scope.has_primary_owner()
            && (self.primary_owner_mode.is_user_only() || self.state.has_primary_owner_in(scope))
    }

    /// Change the role every selected user receives in `scope`
    pub fn set_default_role(&mut self, scope: RoleScope, role: RoleName) -> Result<(), StateError> {
        if !self.can_change_role(scope) {
            return Err(StateError::GuardFailed(format!(
                "Default {} role of this group is locked",
                scope
            )));
        }
        if self.is_role_option_disabled(scope, &role) {
            return Err(StateError::GuardFailed(format!(
                "{} is not available in scope {}",
                role, scope
            )));
        }
        if role.is_primary_owner() && self.selected.len() > 1 {
            return Err(StateError::GuardFailed(
                "Only one user can be added as primary owner".to_string(),
            ));
        }

        if role.is_blank() {
            self.default_roles.remove(&scope);
        } else {
            self.default_roles.insert(scope, role);
        }
        Ok(())
    }

    /// Number of staged users that would become primary owner
    pub fn staged_primary_owner_count(&self) -> usize {
        let grants_primary_owner = self
            .default_roles
            .iter()
            .any(|(scope, role)| scope.has_primary_owner() && role.is_primary_owner());
        if grants_primary_owner {
            self.selected.len()
        } else {
            0
        }
    }

    /// Slots taken by members, pending invitations and staged users
    pub fn occupied_slots(&self) -> usize {
        self.state.len() + self.pending_invitations + self.selected.len()
    }

    pub fn is_search_disabled(&self) -> bool {
        let capacity_reached = self
            .group
            .capacity()
            .is_some_and(|max| self.occupied_slots() >= max);
        capacity_reached || self.staged_primary_owner_count() >= 1
    }

    fn is_known(&self, user: &SearchableUser) -> bool {
        let same_user = |id: Option<&String>, reference: Option<&str>| {
            (user.id.is_some() && id == user.id.as_ref())
                || reference == Some(user.reference.as_str())
        };
        self.state
            .find_all()
            .iter()
            .any(|member| same_user(Some(&member.id), member.reference.as_deref()))
            || self
                .selected
                .iter()
                .any(|staged| same_user(staged.id.as_ref(), Some(staged.reference.as_str())))
    }

    pub fn select_user(&mut self, user: SearchableUser) -> Result<(), StateError> {
        if self.is_search_disabled() {
            return Err(StateError::GuardFailed(
                "No more members can be added to this group".to_string(),
            ));
        }
        if self.is_known(&user) {
            return Err(StateError::GuardFailed(format!(
                "{} is already a member or selected",
                user.display_name
            )));
        }
        tracing::debug!(reference = %user.reference, "Staging user for group membership");
        self.selected.push(user);
        Ok(())
    }

    /// Remove a staged user by reference
    pub fn deselect_user(&mut self, reference: &str) -> bool {
        let before = self.selected.len();
        self.selected.retain(|user| user.reference != reference);
        before != self.selected.len()
    }

    pub fn selected_users(&self) -> &[SearchableUser] {
        &self.selected
    }

    pub fn is_submit_disabled(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn submit(&self) -> AddOrUpdateMembersResult {
        AddOrUpdateMembersResult {
            memberships: self
                .selected
                .iter()
                .map(|user| {
                    GroupMembership::new(
                        user.id.clone().unwrap_or_default(),
                        &user.reference,
                        &self.default_roles,
                    )
                })
                .collect(),
        }
    }
}
