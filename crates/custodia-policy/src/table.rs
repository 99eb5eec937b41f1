use std::collections::{HashMap, HashSet};

use tracing::debug;

use custodia_types::{ActionType, Actor, Role};

use crate::error::PolicyError;

/// Static role/action permission table plus endorsement thresholds.
///
/// Built once at startup and never mutated. Authorization is a pure
/// lookup; there is no rule evaluation or dispatch hierarchy behind it.
pub struct PolicyTable {
    permitted: HashMap<Role, HashSet<ActionType>>,
    thresholds: HashMap<ActionType, u32>,
}

/// The standard custody grid.
///
/// Officers handle physical custody (intake, movement, storage); analysts
/// additionally perform analysis; supervisors may do everything including
/// court submission; prosecutors access and submit to court; judges and
/// auditors only access. Every role except the auditor may endorse.
const STANDARD_GRID: &[(Role, &[ActionType])] = &[
    (
        Role::Officer,
        &[
            ActionType::Intake,
            ActionType::Transfer,
            ActionType::Access,
            ActionType::Storage,
            ActionType::Endorse,
        ],
    ),
    (
        Role::Analyst,
        &[
            ActionType::Transfer,
            ActionType::Access,
            ActionType::Analysis,
            ActionType::Storage,
            ActionType::Endorse,
        ],
    ),
    (
        Role::Supervisor,
        &[
            ActionType::Intake,
            ActionType::Transfer,
            ActionType::Access,
            ActionType::Analysis,
            ActionType::Storage,
            ActionType::CourtSubmission,
            ActionType::Endorse,
        ],
    ),
    (
        Role::Prosecutor,
        &[
            ActionType::Access,
            ActionType::CourtSubmission,
            ActionType::Endorse,
        ],
    ),
    (Role::Judge, &[ActionType::Access, ActionType::Endorse]),
    (Role::Auditor, &[ActionType::Access]),
];

impl PolicyTable {
    /// The standard custody policy: the grid above, with TRANSFER and
    /// COURT_SUBMISSION requiring endorsement by 2 distinct organizations
    /// and every other action type requiring 1.
    pub fn standard() -> Self {
        let permitted = STANDARD_GRID
            .iter()
            .map(|(role, actions)| (*role, actions.iter().copied().collect()))
            .collect();

        let thresholds = HashMap::from([
            (ActionType::Transfer, 2),
            (ActionType::CourtSubmission, 2),
        ]);

        Self {
            permitted,
            thresholds,
        }
    }

    /// Whether the actor's role may originate this action type.
    pub fn authorize(&self, actor: &Actor, action: ActionType) -> bool {
        self.permitted
            .get(&actor.role)
            .is_some_and(|actions| actions.contains(&action))
    }

    /// Authorization as a checked result, for append paths.
    pub fn check(&self, actor: &Actor, action: ActionType) -> Result<(), PolicyError> {
        if self.authorize(actor, action) {
            Ok(())
        } else {
            debug!(actor = %actor.actor_id, role = %actor.role, action = %action, "action denied by policy");
            Err(PolicyError::RoleNotAuthorized {
                role: actor.role,
                action,
            })
        }
    }

    /// How many distinct organizations must endorse an event of this
    /// action type before it is FINAL.
    pub fn required_endorsing_orgs(&self, action: ActionType) -> u32 {
        self.thresholds.get(&action).copied().unwrap_or(1)
    }

    /// The action types a role may originate, in declaration order.
    pub fn permitted_actions(&self, role: Role) -> Vec<ActionType> {
        let Some(actions) = self.permitted.get(&role) else {
            return Vec::new();
        };
        ActionType::ALL
            .into_iter()
            .filter(|a| actions.contains(a))
            .collect()
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for PolicyTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PolicyTable({} roles)", self.permitted.len())
    }
}
