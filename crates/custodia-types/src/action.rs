use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Custody action recorded by a ledger event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    /// Evidence enters custody; creates the evidence record.
    Intake,
    /// Custody moves between holders or organizations.
    Transfer,
    /// Evidence is read or examined without alteration.
    Access,
    /// Forensic analysis is performed.
    Analysis,
    /// Evidence is placed into or moved within storage.
    Storage,
    /// Evidence is submitted to a court.
    CourtSubmission,
    /// An organization attests to another event (carries a target).
    Endorse,
}

impl ActionType {
    /// All action types, in declaration order.
    pub const ALL: [ActionType; 7] = [
        ActionType::Intake,
        ActionType::Transfer,
        ActionType::Access,
        ActionType::Analysis,
        ActionType::Storage,
        ActionType::CourtSubmission,
        ActionType::Endorse,
    ];

    /// Canonical uppercase name, as persisted in ledger records.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Intake => "INTAKE",
            ActionType::Transfer => "TRANSFER",
            ActionType::Access => "ACCESS",
            ActionType::Analysis => "ANALYSIS",
            ActionType::Storage => "STORAGE",
            ActionType::CourtSubmission => "COURT_SUBMISSION",
            ActionType::Endorse => "ENDORSE",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INTAKE" => Ok(ActionType::Intake),
            "TRANSFER" => Ok(ActionType::Transfer),
            "ACCESS" => Ok(ActionType::Access),
            "ANALYSIS" => Ok(ActionType::Analysis),
            "STORAGE" => Ok(ActionType::Storage),
            "COURT_SUBMISSION" => Ok(ActionType::CourtSubmission),
            "ENDORSE" => Ok(ActionType::Endorse),
            other => Err(TypeError::UnknownAction(other.to_string())),
        }
    }
}
