//! Delete member dialog and ownership handover

use apim_common::Error;
use apim_groups::{RoleName, RoleScope};
use apim_management::mock::{Operation, RecordedCall};

use crate::common::*;

#[tokio::test]
async fn test_primary_owner_delete_blocked_until_replacement() {
    let api = api_with(
        group(None),
        vec![
            member("A", RoleName::PrimaryOwner),
            member("B", RoleName::User),
            member("C", RoleName::Owner),
        ],
    );
    let mut view = open_view(&api).await;

    let mut dialog = view.delete_member_dialog("A").unwrap();
    assert!(dialog.requires_replacement());
    assert!(dialog.is_submit_disabled());

    dialog.select_replacement("C").unwrap();
    assert!(!dialog.is_submit_disabled());
    let result = dialog.confirm().unwrap();
    view.delete_member("A", result).await.unwrap();

    let mutations = api.recorded_mutations();
    assert_eq!(mutations.len(), 2);
    match &mutations[0] {
        RecordedCall::AddOrUpdateMemberships { memberships, .. } => {
            let promoted = memberships
                .iter()
                .find(|m| m.id == "C")
                .expect("replacement in batch");
            assert_eq!(promoted.role(RoleScope::Api), Some(&RoleName::PrimaryOwner));
            let departing = memberships
                .iter()
                .find(|m| m.id == "A")
                .expect("departing owner in batch");
            assert_eq!(departing.role(RoleScope::Api), Some(&RoleName::Owner));
        }
        other => panic!("Expected the transfer batch first, got {:?}", other),
    }
    assert_eq!(
        mutations[1],
        RecordedCall::DeleteMember {
            group_id: GROUP_ID.to_string(),
            member_id: "A".to_string(),
        }
    );

    let owners = primary_owners(view.members());
    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0].id, "C");
    assert!(view.membership_state().find_by_ref("A").is_none());
}

#[tokio::test]
async fn test_failed_delete_after_transfer_keeps_one_primary_owner() {
    let api = api_with(
        group(None),
        vec![
            member("A", RoleName::PrimaryOwner),
            member("B", RoleName::User),
        ],
    );
    let mut view = open_view(&api).await;
    api.fail_on(Operation::DeleteMember, 500, "boom");

    let mut dialog = view.delete_member_dialog("A").unwrap();
    dialog.select_replacement("B").unwrap();
    let result = dialog.confirm().unwrap();
    assert!(view.delete_member("A", result).await.is_err());

    let stored = api.stored_members(GROUP_ID);
    assert_eq!(stored.len(), 2);
    let owners = primary_owners(&stored);
    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0].id, "B");
    assert_eq!(primary_owners(view.members()).len(), 1);
}

#[tokio::test]
async fn test_plain_member_delete_is_single_call() {
    let api = api_with(
        group(None),
        vec![
            member("A", RoleName::PrimaryOwner),
            member("B", RoleName::User),
        ],
    );
    let mut view = open_view(&api).await;

    let dialog = view.delete_member_dialog("B").unwrap();
    let result = dialog.confirm().unwrap();
    view.delete_member("B", result).await.unwrap();

    assert_eq!(
        api.recorded_mutations(),
        vec![RecordedCall::DeleteMember {
            group_id: GROUP_ID.to_string(),
            member_id: "B".to_string(),
        }]
    );
    assert_eq!(view.members().len(), 1);
}

#[tokio::test]
async fn test_sole_primary_owner_cannot_be_removed() {
    let api = api_with(group(None), vec![member("A", RoleName::PrimaryOwner)]);
    let view = open_view(&api).await;

    assert!(view.is_delete_disabled());
    let dialog = view.delete_member_dialog("A").unwrap();
    assert!(!dialog.can_delete());
    assert!(dialog.is_submit_disabled());
}

#[tokio::test]
async fn test_cancel_makes_no_call() {
    let api = api_with(
        group(None),
        vec![
            member("A", RoleName::PrimaryOwner),
            member("B", RoleName::User),
        ],
    );
    let mut view = open_view(&api).await;

    let mut dialog = view.delete_member_dialog("A").unwrap();
    dialog.select_replacement("B").unwrap();
    let result = dialog.cancel();
    view.delete_member("A", result).await.unwrap();

    assert!(api.recorded_mutations().is_empty());
}

#[tokio::test]
async fn test_primary_owner_without_transfer_is_refused() {
    let api = api_with(
        group(None),
        vec![
            member("A", RoleName::PrimaryOwner),
            member("B", RoleName::User),
        ],
    );
    let mut view = open_view(&api).await;

    let result = apim_groups::DeleteMemberResult {
        should_delete: true,
        primary_owner_membership: None,
    };
    assert!(matches!(
        view.delete_member("A", result).await,
        Err(Error::Validation(_))
    ));
    assert!(api.recorded_mutations().is_empty());
}

#[tokio::test]
async fn test_sole_primary_owner_direct_delete_is_refused() {
    let api = api_with(group(None), vec![member("A", RoleName::PrimaryOwner)]);
    let mut view = open_view(&api).await;

    let result = apim_groups::DeleteMemberResult {
        should_delete: true,
        primary_owner_membership: None,
    };
    assert!(matches!(
        view.delete_member("A", result).await,
        Err(Error::Validation(_))
    ));
    assert!(api.recorded_mutations().is_empty());
    assert_eq!(api.stored_members(GROUP_ID).len(), 1);
}

#[tokio::test]
async fn test_reload_failure_after_transfer_still_removes_member() {
    let api = api_with(
        group(None),
        vec![
            member("A", RoleName::PrimaryOwner),
            member("B", RoleName::User),
        ],
    );
    let mut view = open_view(&api).await;

    let mut dialog = view.delete_member_dialog("A").unwrap();
    dialog.select_replacement("B").unwrap();
    let result = dialog.confirm().unwrap();
    api.fail_on(Operation::GetMembers, 503, "flaky");

    view.delete_member("A", result).await.unwrap();

    let mutations = api.recorded_mutations();
    assert_eq!(mutations.len(), 2);
    assert!(matches!(
        mutations[0],
        RecordedCall::AddOrUpdateMemberships { .. }
    ));
    assert!(matches!(mutations[1], RecordedCall::DeleteMember { .. }));

    let stored = api.stored_members(GROUP_ID);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, "B");
    assert!(stored[0].is_primary_owner());

    let state = view.membership_state();
    assert!(state.find_by_ref("A").is_none());
    let owner = state
        .get_primary_owner()
        .expect("replacement holds ownership");
    assert_eq!(owner.id, "B");
}
