//! Management API collaborator and group view orchestration

mod view;

use crate::domain::entities::{
    ConsoleSettings, Group, GroupMembership, Invitation, Member, Role, RoleScope, SearchableUser,
};
use apim_common::Result;

pub use view::GroupMembersView;

/// Management API operations the member workflows depend on.
///
/// `add_or_update_memberships` receives the whole batch in one call; the
/// implementation must not split it.
#[async_trait::async_trait]
pub trait ManagementApi: Send + Sync {
    /// GET /configuration/groups/{id}
    async fn get_group(&self, group_id: &str) -> Result<Group>;

    /// GET /configuration/groups/{id}/members
    async fn get_members(&self, group_id: &str) -> Result<Vec<Member>>;

    /// POST /configuration/groups/{id}/members
    async fn add_or_update_memberships(
        &self,
        group_id: &str,
        memberships: &[GroupMembership],
    ) -> Result<()>;

    /// DELETE /configuration/groups/{id}/members/{memberId}
    async fn delete_member(&self, group_id: &str, member_id: &str) -> Result<()>;

    /// GET /configuration/groups/{id}/invitations
    async fn get_invitations(&self, group_id: &str) -> Result<Vec<Invitation>>;

    /// POST /configuration/groups/{id}/invitations
    async fn invite_member(&self, group_id: &str, invitation: &Invitation) -> Result<Invitation>;

    /// DELETE /configuration/groups/{id}/invitations/{invitationId}
    async fn delete_invitation(&self, group_id: &str, invitation_id: &str) -> Result<()>;

    /// GET /search/users?q=
    async fn search_users(&self, query: &str) -> Result<Vec<SearchableUser>>;

    /// GET /configuration/rolescopes/{scope}/roles
    async fn list_roles(&self, scope: RoleScope) -> Result<Vec<Role>>;

    /// GET /settings
    async fn get_settings(&self) -> Result<ConsoleSettings>;
}
