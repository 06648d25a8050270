//! Agent registry: id- and name-indexed agent records, each owning its
//! inbox queue and typed state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{AgentId, Name, QueueCapacity};
use crate::error::RuntimeError;
use crate::runtime::queue::SignalQueue;

/// A scalar value held in an agent's state record. The compiler's
/// semantic pass (`InvalidStateAccess`) has already checked that
/// handler bodies only touch fields of the matching variant, so the
/// runtime never needs to fail a state access — it reads and writes
/// `StateValue`s it already knows are well-typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StateValue {
    /// A signed integer field.
    Int(i64),
    /// A floating-point field.
    Float(f64),
    /// A boolean field.
    Bool(bool),
    /// A UTF-8 text field.
    Text(String),
}

/// One live agent: its identity, inbox, and state record.
pub struct AgentRecord {
    id: AgentId,
    name: Name,
    state: HashMap<String, StateValue>,
    queue: SignalQueue,
}

impl AgentRecord {
    /// The agent's id.
    #[must_use]
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// The agent's declared name.
    #[must_use]
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Reads a state field by name.
    #[must_use]
    pub fn state(&self, field: &str) -> Option<&StateValue> {
        self.state.get(field)
    }

    /// Writes a state field by name, inserting it if new.
    pub fn set_state(&mut self, field: impl Into<String>, value: StateValue) {
        self.state.insert(field.into(), value);
    }

    /// Borrows this agent's inbox queue.
    #[must_use]
    pub fn queue(&self) -> &SignalQueue {
        &self.queue
    }

    /// Mutably borrows this agent's inbox queue.
    pub fn queue_mut(&mut self) -> &mut SignalQueue {
        &mut self.queue
    }
}

/// Fixed-capacity collection of [`AgentRecord`]s, indexed by id in a
/// hash map and by name via linear scan.
///
/// By-name lookup deliberately doesn't get its own index: a network's
/// agent count is expected to stay in the few-hundreds, so a scan over
/// `agents` costs nothing a reader would notice, and it avoids carrying
/// a second map that could fall out of sync with the first if a name
/// ever changed after registration.
pub struct AgentRegistry {
    agents: HashMap<AgentId, AgentRecord>,
    capacity: usize,
}

impl AgentRegistry {
    /// Creates an empty registry with room for `capacity` agents.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            agents: HashMap::new(),
            capacity,
        }
    }

    /// Number of registered agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the registry holds no agents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Registers a new agent with the given id, name, and inbox
    /// capacity.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::AgentExists`] if `id` is already
    /// registered, or [`RuntimeError::CapacityExceeded`] if the registry
    /// is full.
    pub fn register(
        &mut self,
        id: AgentId,
        name: Name,
        queue_capacity: QueueCapacity,
    ) -> Result<(), RuntimeError> {
        if self.agents.contains_key(&id) {
            return Err(RuntimeError::AgentExists(id));
        }
        if self.agents.len() >= self.capacity {
            return Err(RuntimeError::CapacityExceeded {
                max: self.capacity,
            });
        }
        self.agents.insert(
            id,
            AgentRecord {
                id,
                name,
                state: HashMap::new(),
                queue: SignalQueue::new(queue_capacity),
            },
        );
        Ok(())
    }

    /// Looks up an agent by id.
    #[must_use]
    pub fn get(&self, id: AgentId) -> Option<&AgentRecord> {
        self.agents.get(&id)
    }

    /// Mutably looks up an agent by id.
    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut AgentRecord> {
        self.agents.get_mut(&id)
    }

    /// Looks up an agent by its declared name.
    ///
    /// A linear scan over `agents` — see the struct-level doc comment
    /// for why this doesn't carry a second by-name index.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&AgentRecord> {
        self.agents.values().find(|record| record.name.to_string() == name)
    }

    /// Resolves a name to an id.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::AgentNotFound`] if no agent has that
    /// name.
    pub fn resolve(&self, name: &str) -> Result<AgentId, RuntimeError> {
        self.get_by_name(name)
            .map(AgentRecord::id)
            .ok_or_else(|| RuntimeError::AgentNotFound(name.to_string()))
    }

    /// Iterates over agent ids in arbitrary but stable-per-run order.
    pub fn ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.agents.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::{AgentRegistry, StateValue};
    use crate::domain::{AgentId, Name, QueueCapacity};

    fn registry(capacity: usize) -> AgentRegistry {
        AgentRegistry::new(capacity)
    }

    #[test]
    fn register_then_lookup_by_id_and_name() {
        let mut reg = registry(4);
        let id = AgentId::try_new(1).unwrap();
        reg.register(id, Name::try_new("spore").unwrap(), QueueCapacity::round_up(4))
            .unwrap();
        assert_eq!(reg.get(id).unwrap().id(), id);
        assert_eq!(reg.get_by_name("spore").unwrap().id(), id);
        assert_eq!(reg.resolve("spore").unwrap(), id);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut reg = registry(4);
        let id = AgentId::try_new(1).unwrap();
        reg.register(id, Name::try_new("a").unwrap(), QueueCapacity::round_up(4))
            .unwrap();
        let err = reg
            .register(id, Name::try_new("b").unwrap(), QueueCapacity::round_up(4))
            .unwrap_err();
        assert_eq!(err, crate::error::RuntimeError::AgentExists(id));
    }

    #[test]
    fn capacity_exceeded_once_full() {
        let mut reg = registry(1);
        reg.register(
            AgentId::try_new(1).unwrap(),
            Name::try_new("a").unwrap(),
            QueueCapacity::round_up(4),
        )
        .unwrap();
        let err = reg
            .register(
                AgentId::try_new(2).unwrap(),
                Name::try_new("b").unwrap(),
                QueueCapacity::round_up(4),
            )
            .unwrap_err();
        assert_eq!(err, crate::error::RuntimeError::CapacityExceeded { max: 1 });
    }

    #[test]
    fn unknown_name_does_not_resolve() {
        let reg = registry(4);
        assert!(reg.resolve("ghost").is_err());
    }

    #[test]
    fn state_round_trips() {
        let mut reg = registry(4);
        let id = AgentId::try_new(1).unwrap();
        reg.register(id, Name::try_new("a").unwrap(), QueueCapacity::round_up(4))
            .unwrap();
        reg.get_mut(id).unwrap().set_state("count", StateValue::Int(3));
        assert_eq!(reg.get(id).unwrap().state("count"), Some(&StateValue::Int(3)));
    }
}
