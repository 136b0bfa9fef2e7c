//! Command line schema for the console binary.

use std::collections::BTreeMap;

use apim_groups::{RoleName, RoleScope};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "apim-console")]
#[command(about = "Manage APIM group members and invitations")]
#[command(version)]
pub struct Cli {
    /// Act as an environment administrator (may change locked default roles)
    #[arg(long, global = true, env = "APIM_CONSOLE_ADMIN")]
    pub admin: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Group members
    Members {
        #[command(subcommand)]
        action: MembersAction,
    },
    /// Pending email invitations
    Invitations {
        #[command(subcommand)]
        action: InvitationsAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum MembersAction {
    /// List members and their roles
    List {
        #[arg(long)]
        group: String,
    },
    /// Search users and add every match with the selected roles
    Add {
        #[arg(long)]
        group: String,
        /// User search query
        #[arg(long)]
        query: String,
        #[command(flatten)]
        roles: RoleArgs,
    },
    /// Change a member's roles
    Edit {
        #[arg(long)]
        group: String,
        #[arg(long)]
        member: String,
        #[command(flatten)]
        roles: RoleArgs,
        /// Member taking over primary ownership when it is given up
        #[arg(long)]
        replacement: Option<String>,
    },
    /// Remove a member
    Remove {
        #[arg(long)]
        group: String,
        #[arg(long)]
        member: String,
        /// Member taking over primary ownership
        #[arg(long)]
        replacement: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum InvitationsAction {
    List {
        #[arg(long)]
        group: String,
    },
    /// Invite someone by email
    Send {
        #[arg(long)]
        group: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        api_role: Option<String>,
        #[arg(long)]
        application_role: Option<String>,
    },
    Delete {
        #[arg(long)]
        group: String,
        #[arg(long)]
        invitation: String,
    },
}

/// Role overrides, one per member scope
#[derive(Args, Debug, Clone, Default)]
pub struct RoleArgs {
    #[arg(long)]
    pub api_role: Option<String>,
    #[arg(long)]
    pub application_role: Option<String>,
    #[arg(long)]
    pub integration_role: Option<String>,
}

impl RoleArgs {
    pub fn roles(&self) -> BTreeMap<RoleScope, RoleName> {
        [
            (RoleScope::Api, &self.api_role),
            (RoleScope::Application, &self.application_role),
            (RoleScope::Integration, &self.integration_role),
        ]
        .into_iter()
        .filter_map(|(scope, role)| {
            role.as_deref()
                .map(|role| (scope, RoleName::from(role.trim().to_ascii_uppercase())))
        })
        .collect()
    }
}
