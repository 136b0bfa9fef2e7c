//! Group view against the HTTP management client
//!
//! Checks the requests that actually leave the console for the member
//! workflows, using a local mock server.

use std::sync::Arc;

use apim_groups::{GroupMembersView, GroupMembership, RoleName, RoleScope};
use apim_management::client::HttpManagementClient;
use apim_management::ManagementConfig;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENV: &str = "/management/organizations/DEFAULT/environments/DEFAULT";
const ORG: &str = "/management/organizations/DEFAULT";

fn members_json() -> Value {
    json!([
        { "id": "A", "displayName": "Test Member A", "roles": { "API": "PRIMARY_OWNER" } },
        { "id": "B", "displayName": "Test Member B", "roles": { "API": "USER" } }
    ])
}

/// Departing owner A demoted to OWNER, B promoted, in one request body
fn transfer_batch() -> Value {
    json!([
        {
            "id": "A",
            "reference": "testmemberA",
            "roles": [{ "name": "OWNER", "scope": "API" }]
        },
        {
            "id": "B",
            "reference": "testmemberB",
            "roles": [{ "name": "PRIMARY_OWNER", "scope": "API" }]
        }
    ])
}

async fn mount_group(server: &MockServer, max_invitation: Option<u32>) {
    Mock::given(method("GET"))
        .and(path(format!("{}/configuration/groups/1", ENV)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "1",
            "name": "Group 1",
            "max_invitation": max_invitation,
            "manageable": true,
            "email_invitation": true,
            "roles": { "API": "USER" }
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/configuration/groups/1/members", ENV)))
        .respond_with(ResponseTemplate::new(200).set_body_json(members_json()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/configuration/groups/1/invitations", ENV)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/settings", ENV)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "api": { "primaryOwnerMode": "HYBRID" }
        })))
        .mount(server)
        .await;
    for scope in ["API", "APPLICATION", "INTEGRATION"] {
        Mock::given(method("GET"))
            .and(path(format!("{}/configuration/rolescopes/{}/roles", ORG, scope)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "name": "OWNER", "scope": scope },
                { "name": "USER", "scope": scope, "default": true }
            ])))
            .mount(server)
            .await;
    }
    for id in ["A", "B"] {
        Mock::given(method("GET"))
            .and(path(format!("{}/search/users", ORG)))
            .and(query_param("q", format!("Test Member {}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": id,
                "reference": format!("testmember{}", id),
                "displayName": format!("Test Member {}", id)
            }])))
            .mount(server)
            .await;
    }
}

async fn open(server: &MockServer) -> GroupMembersView {
    let client = HttpManagementClient::new(ManagementConfig {
        provider: "http".to_string(),
        base_url: format!("{}/management", server.uri()),
        organization_id: "DEFAULT".to_string(),
        environment_id: "DEFAULT".to_string(),
        api_token: None,
    })
    .unwrap();
    GroupMembersView::open(Arc::new(client), "1").await.unwrap()
}

#[tokio::test]
async fn test_promotion_posts_two_element_batch() {
    let server = MockServer::start().await;
    mount_group(&server, None).await;
    Mock::given(method("POST"))
        .and(path(format!("{}/configuration/groups/1/members", ENV)))
        .and(body_json(transfer_batch()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut view = open(&server).await;
    let mut dialog = view.edit_member_dialog("B").unwrap();
    dialog
        .set_role(RoleScope::Api, RoleName::PrimaryOwner)
        .unwrap();
    assert_eq!(view.submit_edit(&dialog).await.unwrap(), 2);
}

#[tokio::test]
async fn test_empty_roles_batch_sends_no_request() {
    let server = MockServer::start().await;
    mount_group(&server, None).await;
    Mock::given(method("POST"))
        .and(path(format!("{}/configuration/groups/1/members", ENV)))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut view = open(&server).await;
    let saved = view
        .submit_memberships(vec![GroupMembership {
            id: "x".to_string(),
            reference: "x".to_string(),
            roles: Vec::new(),
        }])
        .await
        .unwrap();
    assert_eq!(saved, 0);
}

#[tokio::test]
async fn test_delete_transfers_ownership_before_removal() {
    let server = MockServer::start().await;
    mount_group(&server, None).await;
    Mock::given(method("POST"))
        .and(path(format!("{}/configuration/groups/1/members", ENV)))
        .and(body_json(transfer_batch()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}/configuration/groups/1/members/A", ENV)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut view = open(&server).await;
    let mut dialog = view.delete_member_dialog("A").unwrap();
    assert!(dialog.is_submit_disabled());
    dialog.select_replacement("B").unwrap();
    let result = dialog.confirm().unwrap();
    view.delete_member("A", result).await.unwrap();

    let requests = server.received_requests().await.unwrap_or_default();
    let post = requests
        .iter()
        .position(|r| r.method.as_str() == "POST")
        .expect("transfer posted");
    let delete = requests
        .iter()
        .position(|r| r.method.as_str() == "DELETE")
        .expect("member deleted");
    assert!(post < delete);
}

#[tokio::test]
async fn test_full_group_disables_add_search() {
    let server = MockServer::start().await;
    mount_group(&server, Some(2)).await;

    let view = open(&server).await;
    assert!(view.add_members_dialog().is_search_disabled());
    assert!(!view.can_add_members());
}
