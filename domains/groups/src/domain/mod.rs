//! Groups domain layer: entities, membership state, member workflows

pub mod entities;
pub mod state;
pub mod workflows;
