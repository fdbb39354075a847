//! Change events published on the live update stream.
//!
//! Clients mirror catalog and user listings into local state by applying
//! these events; on broadcast lag they re-list from the REST endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Entity a change event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
    Books,
    Users,
    Borrows,
}

/// What happened to the entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Created,
    Updated,
    Deleted,
    Borrowed,
    Returned,
    /// A write was refused by the role guards. Only emitted outside
    /// production, for developer-facing diagnostics.
    Denied,
}

/// A single change notification
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChangeEvent {
    pub entity: Entity,
    pub action: Action,
    /// Affected row id; absent for denied writes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
}

impl ChangeEvent {
    pub fn new(entity: Entity, action: Action, id: i32) -> Self {
        Self {
            entity,
            action,
            id: Some(id),
        }
    }

    pub fn denied(entity: Entity) -> Self {
        Self {
            entity,
            action: Action::Denied,
            id: None,
        }
    }
}
