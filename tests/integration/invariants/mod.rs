//! At most one API primary owner, across sequences of operations

use apim_common::Error;
use apim_groups::{GroupMembership, ManagementApi, RoleName, RoleScope};

use crate::common::*;

#[tokio::test]
async fn test_ownership_round_trip_keeps_single_owner() {
    let api = api_with(
        group(None),
        vec![
            member("A", RoleName::PrimaryOwner),
            member("B", RoleName::User),
            member("C", RoleName::User),
        ],
    );
    let mut view = open_view(&api).await;

    for next in ["B", "C", "A", "C"] {
        let mut dialog = view.edit_member_dialog(next).unwrap();
        dialog
            .set_role(RoleScope::Api, RoleName::PrimaryOwner)
            .unwrap();
        view.submit_edit(&dialog).await.unwrap();

        let owners = primary_owners(view.members());
        assert_eq!(owners.len(), 1, "after promoting {}", next);
        assert_eq!(owners[0].id, next);
        assert!(view.membership_state().validate().is_ok());
    }

    let mut dialog = view.delete_member_dialog("C").unwrap();
    dialog.select_replacement("A").unwrap();
    let result = dialog.confirm().unwrap();
    view.delete_member("C", result).await.unwrap();

    let stored = api.stored_members(GROUP_ID);
    assert_eq!(stored.len(), 2);
    let owners = primary_owners(&stored);
    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0].id, "A");
}

#[tokio::test]
async fn test_batch_with_second_primary_owner_is_refused() {
    let api = api_with(
        group(None),
        vec![
            member("A", RoleName::PrimaryOwner),
            member("B", RoleName::User),
        ],
    );
    let mut view = open_view(&api).await;

    let roles = [(RoleScope::Api, RoleName::PrimaryOwner)].into();
    let err = view
        .submit_memberships(vec![GroupMembership::new("B", "testmemberB", &roles)])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Conflict(_)));
    assert!(api.recorded_mutations().is_empty());
}

#[tokio::test]
async fn test_reload_picks_up_concurrent_changes() {
    let api = api_with(
        group(None),
        vec![
            member("A", RoleName::PrimaryOwner),
            member("B", RoleName::User),
        ],
    );
    let mut view = open_view(&api).await;

    // another administrator removes B
    api.delete_member(GROUP_ID, "B").await.unwrap();

    view.reload().await.unwrap();
    assert_eq!(view.members().len(), 1);
    assert!(view.membership_state().find_by_ref("B").is_none());
    assert!(view
        .membership_state()
        .is_new_member(&member("B", RoleName::User)));
}
