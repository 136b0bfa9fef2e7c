//! Groups domain: members, role memberships, primary ownership, invitations

pub mod domain;
pub mod service;

// Re-export domain types at the crate root for convenience
pub use domain::entities::*;
pub use domain::state::{MemberState, MembershipState, StateError};
pub use domain::workflows::{
    AddMembersDialog, AddOrUpdateMembersResult, ApiRoleTransition, DeleteMemberDialog,
    DeleteMemberResult, EditMemberDialog, InviteMemberDialog, MembershipDraft,
};

// Re-export service types
pub use service::{GroupMembersView, ManagementApi};
