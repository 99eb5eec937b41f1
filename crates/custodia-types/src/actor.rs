use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::{ActorId, OrgId};

/// Role held by an actor in the custody process.
///
/// Roles gate which action types an actor may originate; the mapping lives
/// in the policy table, not here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Officer,
    Analyst,
    Supervisor,
    Prosecutor,
    Judge,
    Auditor,
}

impl Role {
    /// All roles, in declaration order.
    pub const ALL: [Role; 6] = [
        Role::Officer,
        Role::Analyst,
        Role::Supervisor,
        Role::Prosecutor,
        Role::Judge,
        Role::Auditor,
    ];

    /// Canonical uppercase name, as persisted in ledger records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Officer => "OFFICER",
            Role::Analyst => "ANALYST",
            Role::Supervisor => "SUPERVISOR",
            Role::Prosecutor => "PROSECUTOR",
            Role::Judge => "JUDGE",
            Role::Auditor => "AUDITOR",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "OFFICER" => Ok(Role::Officer),
            "ANALYST" => Ok(Role::Analyst),
            "SUPERVISOR" => Ok(Role::Supervisor),
            "PROSECUTOR" => Ok(Role::Prosecutor),
            "JUDGE" => Ok(Role::Judge),
            "AUDITOR" => Ok(Role::Auditor),
            other => Err(TypeError::UnknownRole(other.to_string())),
        }
    }
}

/// An identity as recorded on a ledger event.
///
/// The role and organization are captured at append time. A later change
/// in the directory or policy table never rewrites historical events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub actor_id: ActorId,
    pub role: Role,
    pub org: OrgId,
}

impl Actor {
    pub fn new(actor_id: ActorId, role: Role, org: OrgId) -> Self {
        Self {
            actor_id,
            role,
            org,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.actor_id, self.role, self.org)
    }
}
