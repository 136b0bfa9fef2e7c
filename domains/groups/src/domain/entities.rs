//! Domain entities for the groups domain
//!
//! These types mirror the wire shapes exchanged with the management API
//! (group, members, role memberships, invitations, configured roles, user
//! search results) and carry the business rules the console applies to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use apim_common::{Error, Result};
use validator::ValidateEmail;

/// Namespace for roles. A member holds at most one role per scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleScope {
    Api,
    Application,
    Integration,
    Cluster,
    Group,
}

impl RoleScope {
    /// Scopes in which a single primary owner is tracked
    pub const PRIMARY_OWNER_SCOPES: [RoleScope; 2] = [RoleScope::Api, RoleScope::Integration];

    /// Scopes a member dialog edits
    pub const MEMBER_SCOPES: [RoleScope; 3] = [
        RoleScope::Api,
        RoleScope::Application,
        RoleScope::Integration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleScope::Api => "API",
            RoleScope::Application => "APPLICATION",
            RoleScope::Integration => "INTEGRATION",
            RoleScope::Cluster => "CLUSTER",
            RoleScope::Group => "GROUP",
        }
    }

    /// Check if a primary owner is tracked in this scope
    pub fn has_primary_owner(&self) -> bool {
        Self::PRIMARY_OWNER_SCOPES.contains(self)
    }
}

impl std::fmt::Display for RoleScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RoleScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "API" => Ok(RoleScope::Api),
            "APPLICATION" => Ok(RoleScope::Application),
            "INTEGRATION" => Ok(RoleScope::Integration),
            "CLUSTER" => Ok(RoleScope::Cluster),
            "GROUP" => Ok(RoleScope::Group),
            other => Err(Error::Validation(format!("Unknown role scope: {}", other))),
        }
    }
}

/// Role name within a scope.
///
/// The system roles are closed variants; anything else configured on the
/// platform is carried as `Custom`. An empty name means "no role".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoleName {
    PrimaryOwner,
    Owner,
    User,
    Admin,
    Custom(String),
}

impl RoleName {
    pub fn as_str(&self) -> &str {
        match self {
            RoleName::PrimaryOwner => "PRIMARY_OWNER",
            RoleName::Owner => "OWNER",
            RoleName::User => "USER",
            RoleName::Admin => "ADMIN",
            RoleName::Custom(name) => name,
        }
    }

    pub fn is_primary_owner(&self) -> bool {
        matches!(self, RoleName::PrimaryOwner)
    }

    /// The "no role" placeholder offered first in role pickers
    pub fn is_blank(&self) -> bool {
        matches!(self, RoleName::Custom(name) if name.trim().is_empty())
    }
}

impl From<String> for RoleName {
    fn from(name: String) -> Self {
        match name.as_str() {
            "PRIMARY_OWNER" => RoleName::PrimaryOwner,
            "OWNER" => RoleName::Owner,
            "USER" => RoleName::User,
            "ADMIN" => RoleName::Admin,
            _ => RoleName::Custom(name),
        }
    }
}

impl From<&str> for RoleName {
    fn from(name: &str) -> Self {
        RoleName::from(name.to_string())
    }
}

impl From<RoleName> for String {
    fn from(role: RoleName) -> Self {
        match role {
            RoleName::Custom(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for RoleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Member of a group with one role per scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default)]
    pub roles: BTreeMap<RoleScope, RoleName>,
}

impl Member {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Member {
            id: id.into(),
            display_name: display_name.into(),
            reference: None,
            roles: BTreeMap::new(),
        }
    }

    /// Builder-style role assignment
    pub fn with_role(mut self, scope: RoleScope, role: impl Into<RoleName>) -> Self {
        self.roles.insert(scope, role.into());
        self
    }

    pub fn role(&self, scope: RoleScope) -> Option<&RoleName> {
        self.roles.get(&scope)
    }

    pub fn api_role(&self) -> Option<&RoleName> {
        self.role(RoleScope::Api)
    }

    /// Check if the member holds PRIMARY_OWNER in the given scope
    pub fn is_primary_owner_in(&self, scope: RoleScope) -> bool {
        self.role(scope).is_some_and(RoleName::is_primary_owner)
    }

    /// Check if the member is the API primary owner
    pub fn is_primary_owner(&self) -> bool {
        self.is_primary_owner_in(RoleScope::Api)
    }
}

/// Automatic association events configured on a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupEvent {
    ApiCreate,
    ApplicationCreate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRule {
    pub event: GroupEvent,
}

/// Group configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Default role per scope assigned to new members
    #[serde(default)]
    pub roles: BTreeMap<RoleScope, RoleName>,
    /// Capacity for members plus pending invitations; absent or zero is unlimited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_invitation: Option<u32>,
    #[serde(default)]
    pub lock_api_role: bool,
    #[serde(default)]
    pub lock_application_role: bool,
    #[serde(default)]
    pub event_rules: Vec<EventRule>,
    #[serde(default)]
    pub email_invitation: bool,
    #[serde(default)]
    pub system_invitation: bool,
    #[serde(default)]
    pub disable_membership_notifications: bool,
    #[serde(default)]
    pub manageable: bool,
    #[serde(
        rename = "apiPrimaryOwner",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub api_primary_owner: Option<String>,
}

impl Group {
    /// Default role for new members in a scope, ignoring blank entries
    pub fn default_role(&self, scope: RoleScope) -> Option<&RoleName> {
        self.roles.get(&scope).filter(|role| !role.is_blank())
    }

    /// Members can be added when the group is manageable and at least one
    /// invitation channel is enabled
    pub fn can_invite_members(&self) -> bool {
        self.manageable && (self.system_invitation || self.email_invitation)
    }

    /// Capacity limit, `None` when unlimited
    pub fn capacity(&self) -> Option<usize> {
        self.max_invitation
            .filter(|max| *max > 0)
            .map(|max| max as usize)
    }

    /// Check if members and pending invitations fill the group's capacity
    pub fn is_max_invitation_reached(&self, members: usize, invitations: usize) -> bool {
        match self.capacity() {
            Some(max) => members + invitations >= max,
            None => false,
        }
    }

    /// Check if the default role of a scope may be changed by the caller
    pub fn can_change_default_role(&self, scope: RoleScope, is_admin: bool) -> bool {
        if is_admin {
            return true;
        }
        match scope {
            RoleScope::Api => !self.lock_api_role,
            RoleScope::Application => !self.lock_application_role,
            _ => false,
        }
    }
}

/// Role assignment within one scope, as submitted in a membership
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedRole {
    pub name: RoleName,
    pub scope: RoleScope,
}

/// Mutation request persisting one member's roles across scopes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub id: String,
    pub reference: String,
    pub roles: Vec<ScopedRole>,
}

impl GroupMembership {
    pub fn new(
        id: impl Into<String>,
        reference: impl Into<String>,
        roles: &BTreeMap<RoleScope, RoleName>,
    ) -> Self {
        GroupMembership {
            id: id.into(),
            reference: reference.into(),
            roles: roles
                .iter()
                .filter(|(_, name)| !name.is_blank())
                .map(|(scope, name)| ScopedRole {
                    name: name.clone(),
                    scope: *scope,
                })
                .collect(),
        }
    }

    /// A membership without roles is a no-op and never submitted
    pub fn is_empty(&self) -> bool {
        self.roles.iter().all(|role| role.name.is_blank())
    }

    pub fn role(&self, scope: RoleScope) -> Option<&RoleName> {
        self.roles
            .iter()
            .find(|role| role.scope == scope)
            .map(|role| &role.name)
    }
}

/// Platform role configured for a scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: RoleName,
    pub scope: RoleScope,
    #[serde(default)]
    pub system: bool,
    #[serde(default)]
    pub default: bool,
}

/// User returned by the user search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchableUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: String,
}

/// Who may hold API primary ownership in an environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrimaryOwnerMode {
    User,
    Group,
    #[default]
    Hybrid,
}

impl PrimaryOwnerMode {
    /// Only individual users may be primary owners
    pub fn is_user_only(&self) -> bool {
        matches!(self, PrimaryOwnerMode::User)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(rename = "primaryOwnerMode", default)]
    pub primary_owner_mode: PrimaryOwnerMode,
}

/// Environment settings consumed by the member workflows
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConsoleSettings {
    #[serde(default)]
    pub api: ApiSettings,
}

impl ConsoleSettings {
    pub fn primary_owner_mode(&self) -> PrimaryOwnerMode {
        self.api.primary_owner_mode
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvitationReferenceType {
    Group,
    Api,
    Application,
}

/// Pending invitation to join a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub reference_type: InvitationReferenceType,
    pub reference_id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_role: Option<RoleName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_role: Option<RoleName>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl Invitation {
    /// Create a group invitation with validation
    pub fn for_group(
        group_id: impl Into<String>,
        email: impl Into<String>,
        api_role: Option<RoleName>,
        application_role: Option<RoleName>,
    ) -> Result<Self> {
        let email = email.into();
        if !email.validate_email() {
            return Err(Error::Validation("Invalid email format".to_string()));
        }

        Ok(Invitation {
            id: None,
            reference_type: InvitationReferenceType::Group,
            reference_id: group_id.into(),
            email,
            api_role: api_role.filter(|role| !role.is_blank()),
            application_role: application_role.filter(|role| !role.is_blank()),
            created_at: None,
        })
    }
}
