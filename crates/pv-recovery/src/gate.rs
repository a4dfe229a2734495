//! Access-control seam
//!
//! Authentication happens upstream; the engine only asks a yes/no question
//! about an already-identified caller.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: String,
    pub role: Role,
}

impl Caller {
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::User,
        }
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Admin,
        }
    }
}

/// Decides whether `caller` may recover a record owned by `owner`.
pub trait AccessGate: Send + Sync {
    fn is_authorized(&self, caller: &Caller, owner: &str) -> bool;
}

/// Self-service or privileged role.
pub struct OwnerOrPrivileged;

impl AccessGate for OwnerOrPrivileged {
    fn is_authorized(&self, caller: &Caller, owner: &str) -> bool {
        caller.role == Role::Admin || caller.id == owner
    }
}
