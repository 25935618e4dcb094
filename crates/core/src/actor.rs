//! Actor identity and role checks.
//!
//! Roles are deliberately coarse: `user` can read/propose/enrich,
//! `approver` additionally approves, posts, exports and applies
//! reconciliations. All gated actions fail closed.

use serde::{Deserialize, Serialize};

use crate::error::{OfficeError, OfficeResult};

/// Who performed an action, for the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorType {
    User,
    Agent,
}

impl core::fmt::Display for ActorType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ActorType::User => f.write_str("user"),
            ActorType::Agent => f.write_str("agent"),
        }
    }
}

/// RBAC role at the command boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Approver,
}

/// A resolved principal: identity plus role, passed explicitly into every
/// gated service function (no ambient "current session").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub actor_type: ActorType,
    /// User name or agent identifier.
    pub name: String,
    pub role: Role,
}

impl Actor {
    pub fn user(name: impl Into<String>, role: Role) -> Self {
        Self {
            actor_type: ActorType::User,
            name: name.into(),
            role,
        }
    }

    pub fn agent(name: impl Into<String>) -> Self {
        Self {
            actor_type: ActorType::Agent,
            name: name.into(),
            role: Role::User,
        }
    }

    pub fn is_approver(&self) -> bool {
        self.role == Role::Approver
    }

    /// Pure policy check; no IO, no business logic.
    pub fn require_approver(&self, action: &str) -> OfficeResult<()> {
        if self.is_approver() {
            Ok(())
        } else {
            Err(OfficeError::permission(format!(
                "only users with the approver role can {action}"
            )))
        }
    }
}
