//! Edit member dialog, submitted through the group view

use apim_common::Error;
use apim_groups::{ApiRoleTransition, RoleName, RoleScope};
use apim_management::mock::{Operation, RecordedCall};

use crate::common::*;

fn memberships_of(call: &RecordedCall) -> Vec<(String, Option<RoleName>)> {
    match call {
        RecordedCall::AddOrUpdateMemberships { memberships, .. } => memberships
            .iter()
            .map(|m| (m.id.clone(), m.role(RoleScope::Api).cloned()))
            .collect(),
        other => panic!("Expected a membership batch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_promotion_demotes_existing_primary_owner_in_same_batch() {
    let api = api_with(
        group(None),
        vec![
            member("A", RoleName::PrimaryOwner),
            member("B", RoleName::User),
        ],
    );
    let mut view = open_view(&api).await;

    let mut dialog = view.edit_member_dialog("B").unwrap();
    dialog
        .set_role(RoleScope::Api, RoleName::PrimaryOwner)
        .unwrap();
    assert_eq!(dialog.transition(), ApiRoleTransition::Upgrade);

    let saved = view.submit_edit(&dialog).await.unwrap();
    assert_eq!(saved, 2);

    let mutations = api.recorded_mutations();
    assert_eq!(mutations.len(), 1, "transfer must be a single call");
    let batch = memberships_of(&mutations[0]);
    assert!(batch.contains(&("A".to_string(), Some(RoleName::Owner))));
    assert!(batch.contains(&("B".to_string(), Some(RoleName::PrimaryOwner))));

    let owners = primary_owners(view.members());
    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0].id, "B");
}

#[tokio::test]
async fn test_references_resolved_through_user_search() {
    let api = api_with(
        group(None),
        vec![
            member("A", RoleName::PrimaryOwner),
            member("B", RoleName::User),
        ],
    );
    let mut view = open_view(&api).await;

    let mut dialog = view.edit_member_dialog("B").unwrap();
    dialog.set_role(RoleScope::Api, RoleName::Owner).unwrap();
    view.submit_edit(&dialog).await.unwrap();

    let calls = api.recorded_calls();
    assert!(calls.contains(&RecordedCall::SearchUsers("Test Member B".to_string())));
    match api.recorded_mutations().first() {
        Some(RecordedCall::AddOrUpdateMemberships { memberships, .. }) => {
            assert_eq!(memberships.len(), 1);
            assert_eq!(memberships[0].reference, "testmemberB");
        }
        other => panic!("Expected a membership batch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_demotion_requires_replacement_before_submit() {
    let api = api_with(
        group(None),
        vec![
            member("A", RoleName::PrimaryOwner),
            member("B", RoleName::User),
            member("C", RoleName::User),
        ],
    );
    let mut view = open_view(&api).await;

    let mut dialog = view.edit_member_dialog("A").unwrap();
    dialog.set_role(RoleScope::Api, RoleName::Owner).unwrap();
    assert!(dialog.is_submit_disabled());
    assert!(view.submit_edit(&dialog).await.is_err());
    assert!(api.recorded_mutations().is_empty());

    dialog.select_replacement("C").unwrap();
    assert!(!dialog.is_submit_disabled());
    view.submit_edit(&dialog).await.unwrap();

    let batch = memberships_of(&api.recorded_mutations()[0]);
    assert_eq!(batch.len(), 2);
    assert!(batch.contains(&("A".to_string(), Some(RoleName::Owner))));
    assert!(batch.contains(&("C".to_string(), Some(RoleName::PrimaryOwner))));
}

#[tokio::test]
async fn test_lateral_change_is_single_membership() {
    let api = api_with(
        group(None),
        vec![
            member("A", RoleName::PrimaryOwner),
            member("B", RoleName::User),
        ],
    );
    let mut view = open_view(&api).await;

    let mut dialog = view.edit_member_dialog("B").unwrap();
    dialog
        .set_role(RoleScope::Application, RoleName::Owner)
        .unwrap();
    assert_eq!(dialog.transition(), ApiRoleTransition::Lateral);
    view.submit_edit(&dialog).await.unwrap();

    match &api.recorded_mutations()[0] {
        RecordedCall::AddOrUpdateMemberships { memberships, .. } => {
            assert_eq!(memberships.len(), 1);
            assert_eq!(
                memberships[0].role(RoleScope::Application),
                Some(&RoleName::Owner)
            );
        }
        other => panic!("Expected a membership batch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_rejection_reloads_and_reports() {
    let api = api_with(
        group(None),
        vec![
            member("A", RoleName::PrimaryOwner),
            member("B", RoleName::User),
        ],
    );
    let mut view = open_view(&api).await;
    api.fail_on(Operation::AddOrUpdateMemberships, 500, "backend down");

    let mut dialog = view.edit_member_dialog("B").unwrap();
    dialog.set_role(RoleScope::Api, RoleName::Owner).unwrap();
    let err = view.submit_edit(&dialog).await.unwrap_err();
    assert!(matches!(err, Error::Response { .. }));

    let reloads = api
        .recorded_calls()
        .into_iter()
        .filter(|call| matches!(call, RecordedCall::GetMembers(_)))
        .count();
    assert_eq!(reloads, 2, "initial load plus reload after failure");
    assert_eq!(
        view.membership_state().role_of("B", RoleScope::Api),
        Some(&RoleName::User)
    );
}

#[tokio::test]
async fn test_user_only_mode_hides_primary_owner_option() {
    use apim_groups::{ApiSettings, ConsoleSettings, PrimaryOwnerMode};

    let api = api_with(group(None), vec![member("A", RoleName::User)]).with_settings(
        ConsoleSettings {
            api: ApiSettings {
                primary_owner_mode: PrimaryOwnerMode::User,
            },
        },
    );
    let view = open_view(&api).await;

    let mut dialog = view.edit_member_dialog("A").unwrap();
    assert!(dialog.is_role_option_disabled(RoleScope::Api, &RoleName::PrimaryOwner));
    assert!(dialog
        .set_role(RoleScope::Api, RoleName::PrimaryOwner)
        .is_err());
}

#[tokio::test]
async fn test_unknown_member_cannot_be_edited() {
    let api = api_with(group(None), vec![member("A", RoleName::PrimaryOwner)]);
    let view = open_view(&api).await;
    assert!(matches!(view.edit_member_dialog("Z"), Err(Error::NotFound(_))));
}
