//! Mock Management API Implementation
//!
//! Keeps groups, members, invitations, users and roles in memory and
//! records every call for test assertions.
//! Thread-safe via `Arc<Mutex<>>`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use apim_common::{Error, Result};
use apim_groups::{
    ConsoleSettings, Group, GroupMembership, Invitation, ManagementApi, Member, Role, RoleName,
    RoleScope, SearchableUser,
};
use chrono::Utc;
use reqwest::StatusCode;

/// Management API operations, used to inject failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetGroup,
    GetMembers,
    AddOrUpdateMemberships,
    DeleteMember,
    GetInvitations,
    InviteMember,
    DeleteInvitation,
    SearchUsers,
    ListRoles,
    GetSettings,
}

/// One call received by the mock
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    GetGroup(String),
    GetMembers(String),
    AddOrUpdateMemberships {
        group_id: String,
        memberships: Vec<GroupMembership>,
    },
    DeleteMember {
        group_id: String,
        member_id: String,
    },
    GetInvitations(String),
    InviteMember {
        group_id: String,
        invitation: Invitation,
    },
    DeleteInvitation {
        group_id: String,
        invitation_id: String,
    },
    SearchUsers(String),
    ListRoles(RoleScope),
    GetSettings,
}

impl RecordedCall {
    /// Calls that change server state
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            RecordedCall::AddOrUpdateMemberships { .. }
                | RecordedCall::DeleteMember { .. }
                | RecordedCall::InviteMember { .. }
                | RecordedCall::DeleteInvitation { .. }
        )
    }
}

#[derive(Debug, Default)]
struct Store {
    groups: HashMap<String, Group>,
    members: HashMap<String, Vec<Member>>,
    invitations: HashMap<String, Vec<Invitation>>,
    users: Vec<SearchableUser>,
    roles: HashMap<RoleScope, Vec<Role>>,
    settings: ConsoleSettings,
    failures: HashMap<Operation, (StatusCode, String)>,
    calls: Vec<RecordedCall>,
}

/// In-memory management API.
#[derive(Debug, Clone, Default)]
pub struct MockManagementApi {
    store: Arc<Mutex<Store>>,
}

impl MockManagementApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock seeded with a small group for offline use
    pub fn with_demo_data() -> Self {
        let mut group = Group {
            id: "demo".to_string(),
            name: "Demo group".to_string(),
            max_invitation: Some(10),
            email_invitation: true,
            system_invitation: true,
            manageable: true,
            ..Group::default()
        };
        group.roles.insert(RoleScope::Api, RoleName::User);
        group.roles.insert(RoleScope::Application, RoleName::User);

        let roles = |scope: RoleScope| {
            [RoleName::PrimaryOwner, RoleName::Owner, RoleName::User]
                .into_iter()
                .filter(|name| scope.has_primary_owner() || !name.is_primary_owner())
                .map(|name| Role {
                    id: None,
                    default: name == RoleName::User,
                    system: name != RoleName::User,
                    name,
                    scope,
                })
                .collect::<Vec<_>>()
        };

        Self::new()
            .with_group(group)
            .with_members(
                "demo",
                vec![
                    Member::new("admin", "Admin")
                        .with_role(RoleScope::Api, RoleName::PrimaryOwner)
                        .with_role(RoleScope::Application, RoleName::Owner),
                    Member::new("jdoe", "John Doe").with_role(RoleScope::Api, RoleName::User),
                ],
            )
            .with_users(vec![
                user("admin", "Admin"),
                user("jdoe", "John Doe"),
                user("asmith", "Alice Smith"),
            ])
            .with_roles(RoleScope::Api, roles(RoleScope::Api))
            .with_roles(RoleScope::Application, roles(RoleScope::Application))
            .with_roles(RoleScope::Integration, roles(RoleScope::Integration))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Store>> {
        self.store
            .lock()
            .map_err(|e| Error::Internal(format!("mock store lock poisoned: {e}")))
    }

    fn seed(self, apply: impl FnOnce(&mut Store)) -> Self {
        if let Ok(mut store) = self.store.lock() {
            apply(&mut store);
        }
        self
    }

    pub fn with_group(self, group: Group) -> Self {
        self.seed(|store| {
            store.groups.insert(group.id.clone(), group);
        })
    }

    pub fn with_members(self, group_id: &str, members: Vec<Member>) -> Self {
        self.seed(|store| {
            store.members.insert(group_id.to_string(), members);
        })
    }

    pub fn with_invitations(self, group_id: &str, invitations: Vec<Invitation>) -> Self {
        self.seed(|store| {
            store.invitations.insert(group_id.to_string(), invitations);
        })
    }

    /// Users returned by the search
    pub fn with_users(self, users: Vec<SearchableUser>) -> Self {
        self.seed(|store| store.users = users)
    }

    pub fn with_roles(self, scope: RoleScope, roles: Vec<Role>) -> Self {
        self.seed(|store| {
            store.roles.insert(scope, roles);
        })
    }

    pub fn with_settings(self, settings: ConsoleSettings) -> Self {
        self.seed(|store| store.settings = settings)
    }

    /// Make every following call of `operation` fail with the given status
    pub fn fail_on(&self, operation: Operation, status: u16, body: &str) {
        if let Ok(mut store) = self.store.lock() {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            store.failures.insert(operation, (status, body.to_string()));
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut store) = self.store.lock() {
            store.failures.clear();
        }
    }

    /// Return all recorded calls.
    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.store
            .lock()
            .expect("mock store lock poisoned, prior test panicked")
            .calls
            .clone()
    }

    /// Return recorded calls that change server state.
    pub fn recorded_mutations(&self) -> Vec<RecordedCall> {
        self.recorded_calls()
            .into_iter()
            .filter(RecordedCall::is_mutation)
            .collect()
    }

    /// Current members of a group as stored by the mock.
    pub fn stored_members(&self, group_id: &str) -> Vec<Member> {
        self.store
            .lock()
            .expect("mock store lock poisoned, prior test panicked")
            .members
            .get(group_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Current invitations of a group as stored by the mock.
    pub fn stored_invitations(&self, group_id: &str) -> Vec<Invitation> {
        self.store
            .lock()
            .expect("mock store lock poisoned, prior test panicked")
            .invitations
            .get(group_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Clear recorded calls and injected failures; seeded data is kept.
    pub fn reset(&self) {
        let mut store = self
            .store
            .lock()
            .expect("mock store lock poisoned, prior test panicked");
        store.calls.clear();
        store.failures.clear();
    }

    /// Record the call, then fail if a failure is injected for it
    fn record(&self, operation: Operation, call: RecordedCall) -> Result<MutexGuard<'_, Store>> {
        let mut store = self.lock()?;
        tracing::debug!(?operation, "Mock management API: recording call");
        store.calls.push(call);
        if let Some((status, body)) = store.failures.get(&operation) {
            return Err(Error::from_status(*status, body.clone()));
        }
        Ok(store)
    }
}

fn user(id: &str, display_name: &str) -> SearchableUser {
    SearchableUser {
        id: Some(id.to_string()),
        reference: format!("ref-{}", id),
        email: Some(format!("{}@example.com", id)),
        display_name: display_name.to_string(),
    }
}

fn group_not_found(group_id: &str) -> Error {
    Error::NotFound(format!("Group not found: {}", group_id))
}

#[async_trait::async_trait]
impl ManagementApi for MockManagementApi {
    async fn get_group(&self, group_id: &str) -> Result<Group> {
        let store = self.record(Operation::GetGroup, RecordedCall::GetGroup(group_id.to_string()))?;
        store
            .groups
            .get(group_id)
            .cloned()
            .ok_or_else(|| group_not_found(group_id))
    }

    async fn get_members(&self, group_id: &str) -> Result<Vec<Member>> {
        let store = self.record(
            Operation::GetMembers,
            RecordedCall::GetMembers(group_id.to_string()),
        )?;
        Ok(store.members.get(group_id).cloned().unwrap_or_default())
    }

    async fn add_or_update_memberships(
        &self,
        group_id: &str,
        memberships: &[GroupMembership],
    ) -> Result<()> {
        let mut store = self.record(
            Operation::AddOrUpdateMemberships,
            RecordedCall::AddOrUpdateMemberships {
                group_id: group_id.to_string(),
                memberships: memberships.to_vec(),
            },
        )?;
        if !store.groups.contains_key(group_id) {
            return Err(group_not_found(group_id));
        }

        for membership in memberships {
            let display_name = store
                .users
                .iter()
                .find(|user| user.reference == membership.reference)
                .map(|user| user.display_name.clone())
                .unwrap_or_else(|| membership.reference.clone());
            let members = store.members.entry(group_id.to_string()).or_default();
            let index = match members.iter().position(|member| member.id == membership.id) {
                Some(index) => index,
                None => {
                    let mut member = Member::new(membership.id.clone(), display_name);
                    member.reference = Some(membership.reference.clone());
                    members.push(member);
                    members.len() - 1
                }
            };
            for role in &membership.roles {
                members[index].roles.insert(role.scope, role.name.clone());
            }
        }
        Ok(())
    }

    async fn delete_member(&self, group_id: &str, member_id: &str) -> Result<()> {
        let mut store = self.record(
            Operation::DeleteMember,
            RecordedCall::DeleteMember {
                group_id: group_id.to_string(),
                member_id: member_id.to_string(),
            },
        )?;
        let members = store
            .members
            .get_mut(group_id)
            .ok_or_else(|| group_not_found(group_id))?;
        let before = members.len();
        members.retain(|member| member.id != member_id);
        if members.len() == before {
            return Err(Error::NotFound(format!("Member not found: {}", member_id)));
        }
        Ok(())
    }

    async fn get_invitations(&self, group_id: &str) -> Result<Vec<Invitation>> {
        let store = self.record(
            Operation::GetInvitations,
            RecordedCall::GetInvitations(group_id.to_string()),
        )?;
        Ok(store.invitations.get(group_id).cloned().unwrap_or_default())
    }

    async fn invite_member(&self, group_id: &str, invitation: &Invitation) -> Result<Invitation> {
        let mut store = self.record(
            Operation::InviteMember,
            RecordedCall::InviteMember {
                group_id: group_id.to_string(),
                invitation: invitation.clone(),
            },
        )?;
        let mut created = invitation.clone();
        created.id = Some(uuid::Uuid::new_v4().to_string());
        created.created_at = Some(Utc::now());
        store
            .invitations
            .entry(group_id.to_string())
            .or_default()
            .push(created.clone());
        Ok(created)
    }

    async fn delete_invitation(&self, group_id: &str, invitation_id: &str) -> Result<()> {
        let mut store = self.record(
            Operation::DeleteInvitation,
            RecordedCall::DeleteInvitation {
                group_id: group_id.to_string(),
                invitation_id: invitation_id.to_string(),
            },
        )?;
        if let Some(invitations) = store.invitations.get_mut(group_id) {
            invitations.retain(|invitation| invitation.id.as_deref() != Some(invitation_id));
        }
        Ok(())
    }

    async fn search_users(&self, query: &str) -> Result<Vec<SearchableUser>> {
        let store = self.record(
            Operation::SearchUsers,
            RecordedCall::SearchUsers(query.to_string()),
        )?;
        let query = query.to_lowercase();
        Ok(store
            .users
            .iter()
            .filter(|user| {
                user.display_name.to_lowercase().contains(&query)
                    || user
                        .email
                        .as_deref()
                        .is_some_and(|email| email.to_lowercase().contains(&query))
            })
            .cloned()
            .collect())
    }

    async fn list_roles(&self, scope: RoleScope) -> Result<Vec<Role>> {
        let store = self.record(Operation::ListRoles, RecordedCall::ListRoles(scope))?;
        Ok(store.roles.get(&scope).cloned().unwrap_or_default())
    }

    async fn get_settings(&self) -> Result<ConsoleSettings> {
        let store = self.record(Operation::GetSettings, RecordedCall::GetSettings)?;
        Ok(store.settings.clone())
    }
}
