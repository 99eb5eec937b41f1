use std::collections::HashMap;
use std::sync::RwLock;

use custodia_types::{Actor, ActorId};

use crate::error::PolicyError;

/// Registry resolving opaque actor IDs to their role and organization.
///
/// Resolution happens at request time; the resolved `Actor` is then
/// recorded on the ledger event, so later directory changes never alter
/// what historical events say about who acted.
pub struct IdentityDirectory {
    actors: RwLock<HashMap<ActorId, Actor>>,
}

impl IdentityDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self {
            actors: RwLock::new(HashMap::new()),
        }
    }

    /// Register an actor, replacing any existing entry with the same ID.
    pub fn register(&self, actor: Actor) {
        let mut actors = self.actors.write().expect("lock poisoned");
        actors.insert(actor.actor_id.clone(), actor);
    }

    /// Resolve a caller-presented actor ID.
    pub fn resolve(&self, actor_id: &ActorId) -> Result<Actor, PolicyError> {
        let actors = self.actors.read().expect("lock poisoned");
        actors
            .get(actor_id)
            .cloned()
            .ok_or_else(|| PolicyError::UnknownIdentity(actor_id.clone()))
    }

    /// All registered actors, sorted by ID.
    pub fn actors(&self) -> Vec<Actor> {
        let actors = self.actors.read().expect("lock poisoned");
        let mut list: Vec<Actor> = actors.values().cloned().collect();
        list.sort_by(|a, b| a.actor_id.cmp(&b.actor_id));
        list
    }

    /// Number of registered actors.
    pub fn len(&self) -> usize {
        self.actors.read().expect("lock poisoned").len()
    }

    /// Returns `true` if no actors are registered.
    pub fn is_empty(&self) -> bool {
        self.actors.read().expect("lock poisoned").is_empty()
    }
}

impl Default for IdentityDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for IdentityDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IdentityDirectory({} actors)", self.len())
    }
}
