//! Command execution against a management API.
//!
//! Every command opens a fresh group view, runs one member workflow and
//! renders a short plain-text report.

use std::fmt::Write;
use std::sync::Arc;

use anyhow::{bail, Context};
use apim_groups::{GroupMembersView, Invitation, ManagementApi, Member, RoleName, RoleScope};
use tracing::{info, warn};

use crate::cli::{Command, InvitationsAction, MembersAction, RoleArgs};

/// Run one command and return what should be printed
pub async fn execute(
    api: Arc<dyn ManagementApi>,
    command: Command,
    is_admin: bool,
) -> anyhow::Result<String> {
    match command {
        Command::Members { action } => members(api, action, is_admin).await,
        Command::Invitations { action } => invitations(api, action, is_admin).await,
    }
}

async fn open(
    api: Arc<dyn ManagementApi>,
    group_id: &str,
    is_admin: bool,
) -> anyhow::Result<GroupMembersView> {
    let view = GroupMembersView::open(api, group_id)
        .await
        .with_context(|| format!("Failed to open group {}", group_id))?;
    Ok(view.with_admin(is_admin))
}

async fn members(
    api: Arc<dyn ManagementApi>,
    action: MembersAction,
    is_admin: bool,
) -> anyhow::Result<String> {
    match action {
        MembersAction::List { group } => {
            let view = open(api, &group, is_admin).await?;
            Ok(render_members(view.members()))
        }
        MembersAction::Add {
            group,
            query,
            roles,
        } => add_members(api, &group, &query, &roles, is_admin).await,
        MembersAction::Edit {
            group,
            member,
            roles,
            replacement,
        } => {
            let mut view = open(api, &group, is_admin).await?;
            let mut dialog = view.edit_member_dialog(&member)?;
            for (scope, role) in roles.roles() {
                dialog.set_role(scope, role)?;
            }
            if let Some(replacement) = replacement {
                dialog.select_replacement(&replacement)?;
            }
            if dialog.is_submit_disabled() {
                bail!(
                    "{} is the primary owner; pass --replacement to hand the role over",
                    dialog.member().display_name
                );
            }
            let saved = view.submit_edit(&dialog).await?;
            Ok(format!("Updated {} membership(s)\n", saved))
        }
        MembersAction::Remove {
            group,
            member,
            replacement,
        } => {
            let mut view = open(api, &group, is_admin).await?;
            let mut dialog = view.delete_member_dialog(&member)?;
            if !dialog.can_delete() {
                bail!(
                    "{} is the last member and primary owner of the group",
                    dialog.member().display_name
                );
            }
            if let Some(replacement) = replacement {
                dialog.select_replacement(&replacement)?;
            }
            if dialog.is_submit_disabled() {
                bail!(
                    "{} is the primary owner; pass --replacement to hand the role over",
                    dialog.member().display_name
                );
            }
            let name = dialog.member().display_name.clone();
            let result = dialog.confirm()?;
            view.delete_member(&member, result).await?;
            Ok(format!("Removed {}\n", name))
        }
    }
}

async fn add_members(
    api: Arc<dyn ManagementApi>,
    group: &str,
    query: &str,
    roles: &RoleArgs,
    is_admin: bool,
) -> anyhow::Result<String> {
    let mut view = open(api.clone(), group, is_admin).await?;
    if !view.can_add_members() {
        bail!("No more members can be added to group {}", group);
    }

    let mut dialog = view.add_members_dialog();
    for user in api.search_users(query).await? {
        let name = user.display_name.clone();
        if let Err(e) = dialog.select_user(user) {
            warn!(user = %name, error = %e, "User skipped");
        }
    }
    if dialog.is_submit_disabled() {
        bail!("No user to add for query '{}'", query);
    }
    for (scope, role) in roles.roles() {
        dialog.set_default_role(scope, role)?;
    }

    let saved = view.submit_add(&dialog).await?;
    info!(group_id = %group, saved, "Members added");
    Ok(format!("Added {} member(s)\n", saved))
}

async fn invitations(
    api: Arc<dyn ManagementApi>,
    action: InvitationsAction,
    is_admin: bool,
) -> anyhow::Result<String> {
    match action {
        InvitationsAction::List { group } => {
            let view = open(api, &group, is_admin).await?;
            Ok(render_invitations(view.invitations()))
        }
        InvitationsAction::Send {
            group,
            email,
            api_role,
            application_role,
        } => {
            let mut view = open(api, &group, is_admin).await?;
            let mut dialog = view.invite_member_dialog();
            let roles = RoleArgs {
                api_role,
                application_role,
                integration_role: None,
            };
            for (scope, role) in roles.roles() {
                dialog.set_role(scope, role)?;
            }
            let invitation = dialog.submit(&email)?;
            let created = view.invite(invitation).await?;
            Ok(format!(
                "Invited {} ({})\n",
                created.email,
                created.id.as_deref().unwrap_or("-")
            ))
        }
        InvitationsAction::Delete { group, invitation } => {
            let mut view = open(api, &group, is_admin).await?;
            view.delete_invitation(&invitation).await?;
            Ok(format!("Deleted invitation {}\n", invitation))
        }
    }
}

fn role_cell(role: Option<&RoleName>) -> &str {
    role.map(RoleName::as_str).unwrap_or("-")
}

pub fn render_members(members: &[Member]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<24} {:<32} {:<16} {:<16} {:<16}",
        "ID", "NAME", "API", "APPLICATION", "INTEGRATION"
    );
    for member in members {
        let _ = writeln!(
            out,
            "{:<24} {:<32} {:<16} {:<16} {:<16}",
            member.id,
            member.display_name,
            role_cell(member.role(RoleScope::Api)),
            role_cell(member.role(RoleScope::Application)),
            role_cell(member.role(RoleScope::Integration)),
        );
    }
    out
}

pub fn render_invitations(invitations: &[Invitation]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<38} {:<32} {:<16} {:<16} {}",
        "ID", "EMAIL", "API", "APPLICATION", "CREATED"
    );
    for invitation in invitations {
        let _ = writeln!(
            out,
            "{:<38} {:<32} {:<16} {:<16} {}",
            invitation.id.as_deref().unwrap_or("-"),
            invitation.email,
            role_cell(invitation.api_role.as_ref()),
            role_cell(invitation.application_role.as_ref()),
            invitation
                .created_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    out
}
