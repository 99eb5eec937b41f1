use custodia_types::{ActionType, ActorId, Role};

/// Errors from policy and identity checks.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PolicyError {
    /// The caller-presented identity does not resolve to a known actor.
    #[error("unknown identity: {0}")]
    UnknownIdentity(ActorId),

    /// The actor's role may not originate this action type.
    #[error("role {role} is not authorized for {action}")]
    RoleNotAuthorized { role: Role, action: ActionType },
}
