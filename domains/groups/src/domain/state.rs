//! Membership state for a group
//!
//! `MembershipState` holds value copies of the members last known from the
//! management API. It is the "before" baseline against which a candidate
//! member is compared: `MemberState` answers what changed for one member,
//! `MembershipState` answers whether the change touches primary ownership
//! of the group as a whole.
//!
//! The single-primary-owner rule is not enforced by refusing mutations here.
//! Callers query `is_primary_owner_promotion` / `is_primary_owner_demotion`
//! before submitting, pair the ownership change with its counterpart, and
//! run `preview(..).validate()` on the resulting batch.

use thiserror::Error;

use crate::domain::entities::{GroupMembership, Member, RoleName, RoleScope};
use apim_common::Error;

/// Errors raised by membership workflows
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    #[error("Scope {scope} would have {count} primary owners ({members})")]
    MultiplePrimaryOwners {
        scope: RoleScope,
        count: usize,
        members: String,
    },

    #[error("Member not found in group: {0}")]
    UnknownMember(String),

    #[error("A replacement primary owner must be selected")]
    ReplacementRequired,

    #[error("Guard condition failed: {0}")]
    GuardFailed(String),
}

impl From<StateError> for Error {
    fn from(err: StateError) -> Self {
        match err {
            StateError::MultiplePrimaryOwners { .. } => Error::Conflict(err.to_string()),
            StateError::UnknownMember(_) => Error::NotFound(err.to_string()),
            StateError::ReplacementRequired | StateError::GuardFailed(_) => {
                Error::Validation(err.to_string())
            }
        }
    }
}

/// Candidate member paired with its stored snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct MemberState {
    current: Member,
    previous: Option<Member>,
}

impl MemberState {
    pub fn new(current: Member, previous: Option<Member>) -> Self {
        Self { current, previous }
    }

    pub fn current_state(&self) -> &Member {
        &self.current
    }

    pub fn last_state(&self) -> Option<&Member> {
        self.previous.as_ref()
    }

    pub fn is_new_member(&self) -> bool {
        self.previous.is_none()
    }

    pub fn was_primary_owner_in(&self, scope: RoleScope) -> bool {
        self.previous
            .as_ref()
            .is_some_and(|previous| previous.is_primary_owner_in(scope))
    }

    pub fn was_primary_owner(&self) -> bool {
        self.was_primary_owner_in(RoleScope::Api)
    }

    pub fn is_primary_owner_in(&self, scope: RoleScope) -> bool {
        self.current.is_primary_owner_in(scope)
    }

    pub fn is_primary_owner(&self) -> bool {
        self.is_primary_owner_in(RoleScope::Api)
    }

    /// True for new members, or when the role in `scope` differs from the snapshot
    pub fn is_role_update_in(&self, scope: RoleScope) -> bool {
        match &self.previous {
            None => true,
            Some(previous) => previous.role(scope) != self.current.role(scope),
        }
    }

    pub fn is_api_role_update(&self) -> bool {
        self.is_role_update_in(RoleScope::Api)
    }

    /// Scopes in which the candidate holds PRIMARY_OWNER
    pub fn primary_owner_scopes(&self) -> Vec<RoleScope> {
        RoleScope::PRIMARY_OWNER_SCOPES
            .into_iter()
            .filter(|scope| self.current.is_primary_owner_in(*scope))
            .collect()
    }
}

/// Snapshot of all members of one group
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MembershipState {
    members: Vec<Member>,
}

impl MembershipState {
    /// Take a value copy of the given members
    pub fn new(members: &[Member]) -> Self {
        Self {
            members: members.to_vec(),
        }
    }

    pub fn find_all(&self) -> &[Member] {
        &self.members
    }

    pub fn find_by_ref(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|member| member.id == id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Pair a copy of the candidate with the stored member of the same id
    pub fn state_of(&self, member: &Member) -> MemberState {
        MemberState::new(member.clone(), self.find_by_ref(&member.id).cloned())
    }

    pub fn is_new_member(&self, member: &Member) -> bool {
        self.find_by_ref(&member.id).is_none()
    }

    /// Members holding PRIMARY_OWNER in `scope`
    pub fn primary_owners_in(&self, scope: RoleScope) -> impl Iterator<Item = &Member> {
        self.members
            .iter()
            .filter(move |member| member.is_primary_owner_in(scope))
    }

    pub fn get_primary_owner_in(&self, scope: RoleScope) -> Option<&Member> {
        self.primary_owners_in(scope).next()
    }

    pub fn get_primary_owner(&self) -> Option<&Member> {
        self.get_primary_owner_in(RoleScope::Api)
    }

    pub fn has_primary_owner_in(&self, scope: RoleScope) -> bool {
        self.get_primary_owner_in(scope).is_some()
    }

    pub fn has_primary_owner(&self) -> bool {
        self.has_primary_owner_in(RoleScope::Api)
    }

    /// The candidate gives up PRIMARY_OWNER in `scope`
    pub fn is_primary_owner_demotion_in(&self, member: &Member, scope: RoleScope) -> bool {
        let state = self.state_of(member);
        state.is_role_update_in(scope) && state.was_primary_owner_in(scope)
    }

    pub fn is_primary_owner_demotion(&self, member: &Member) -> bool {
        self.is_primary_owner_demotion_in(member, RoleScope::Api)
    }

    /// The candidate takes PRIMARY_OWNER in `scope` while another member holds it
    pub fn is_primary_owner_promotion_in(&self, member: &Member, scope: RoleScope) -> bool {
        let state = self.state_of(member);
        state.is_role_update_in(scope)
            && state.is_primary_owner_in(scope)
            && self
                .primary_owners_in(scope)
                .any(|owner| owner.id != member.id)
    }

    pub fn is_primary_owner_promotion(&self, member: &Member) -> bool {
        self.is_primary_owner_promotion_in(member, RoleScope::Api)
    }

    /// Current primary owner of each requested scope
    pub fn primary_owners_with_scopes(&self, scopes: &[RoleScope]) -> Vec<(Member, RoleScope)> {
        scopes
            .iter()
            .filter_map(|scope| {
                self.get_primary_owner_in(*scope)
                    .map(|owner| (owner.clone(), *scope))
            })
            .collect()
    }

    /// Append a copy of a newly added member
    pub fn add(&mut self, member: &Member) {
        self.members.push(member.clone());
    }

    pub fn remove(&mut self, id: &str) -> Option<Member> {
        let index = self.members.iter().position(|member| member.id == id)?;
        Some(self.members.remove(index))
    }

    /// Overwrite stored members with the given values, appending unknown ones
    pub fn sync(&mut self, members: &[Member]) {
        for member in members {
            match self.members.iter_mut().find(|m| m.id == member.id) {
                Some(stored) => *stored = member.clone(),
                None => self.members.push(member.clone()),
            }
        }
    }

    /// State after applying a membership batch, leaving `self` untouched
    pub fn preview(&self, memberships: &[GroupMembership]) -> MembershipState {
        let mut next = self.clone();
        for membership in memberships.iter().filter(|m| !m.is_empty()) {
            let roles = membership
                .roles
                .iter()
                .map(|role| (role.scope, role.name.clone()));
            match next.members.iter_mut().find(|m| m.id == membership.id) {
                Some(stored) => stored.roles.extend(roles),
                None => {
                    let mut member = Member::new(&membership.id, &membership.reference);
                    member.reference = Some(membership.reference.clone());
                    member.roles.extend(roles);
                    next.members.push(member);
                }
            }
        }
        next
    }

    /// Check that no primary-owner scope has more than one holder
    pub fn validate(&self) -> Result<(), StateError> {
        for scope in RoleScope::PRIMARY_OWNER_SCOPES {
            let owners: Vec<&Member> = self.primary_owners_in(scope).collect();
            if owners.len() > 1 {
                return Err(StateError::MultiplePrimaryOwners {
                    scope,
                    count: owners.len(),
                    members: owners
                        .iter()
                        .map(|owner| owner.display_name.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                });
            }
        }
        Ok(())
    }

    /// Role of `id` in `scope`, if the member is known
    pub fn role_of(&self, id: &str, scope: RoleScope) -> Option<&RoleName> {
        self.find_by_ref(id).and_then(|member| member.role(scope))
    }
}

// ============================================================================
// Tests
// ============================================================================
