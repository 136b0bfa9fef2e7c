//! Shared fixtures for the group membership integration tests
//!
//! Members follow the `Test Member {id}` / `testmember{id}` naming used by
//! the console fixtures so user search resolves every member by display
//! name.

use std::sync::{Arc, Once};

use apim_groups::{Group, GroupMembersView, Member, RoleName, RoleScope, SearchableUser};
use apim_management::mock::MockManagementApi;

pub const GROUP_ID: &str = "1";

static INIT: Once = Once::new();

/// Route tracing output through the test harness once per binary
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("apim=debug"))
            .with_test_writer()
            .try_init();
    });
}

pub fn group(max_invitation: Option<u32>) -> Group {
    let mut group = Group {
        id: GROUP_ID.to_string(),
        name: "Group 1".to_string(),
        max_invitation,
        email_invitation: true,
        system_invitation: true,
        manageable: true,
        ..Group::default()
    };
    group.roles.insert(RoleScope::Api, RoleName::User);
    group
}

pub fn member(id: &str, api_role: RoleName) -> Member {
    let mut member =
        Member::new(id, format!("Test Member {}", id)).with_role(RoleScope::Api, api_role);
    member.reference = Some(format!("testmember{}", id));
    member
}

pub fn user(id: &str) -> SearchableUser {
    SearchableUser {
        id: Some(id.to_string()),
        reference: format!("testmember{}", id),
        email: Some(format!("testmember{}@xxx.com", id)),
        display_name: format!("Test Member {}", id),
    }
}

/// Mock holding group `1` with the given members; users A to F are searchable
pub fn api_with(group: Group, members: Vec<Member>) -> MockManagementApi {
    MockManagementApi::new()
        .with_group(group)
        .with_members(GROUP_ID, members)
        .with_users(["A", "B", "C", "D", "E", "F"].into_iter().map(user).collect())
}

pub async fn open_view(api: &MockManagementApi) -> GroupMembersView {
    init_tracing();
    GroupMembersView::open(Arc::new(api.clone()), GROUP_ID)
        .await
        .expect("group view should open")
}

pub fn primary_owners(members: &[Member]) -> Vec<&Member> {
    members
        .iter()
        .filter(|member| member.is_primary_owner())
        .collect()
}
