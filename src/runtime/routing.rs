//! Routing table: `(source_agent, frequency) -> destinations`, backing
//! the SENSE phase's fan-out.
//!
//! Open-addressed with FNV-1a hashing and linear probing. A flat array
//! keeps lookups at one cache line for the common case of a handful of
//! destinations per key, which covers everything from a plain
//! point-to-point echo up through a broadcast to many listeners.

use crate::domain::{AgentId, FrequencyId};
use crate::error::RuntimeError;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(source: AgentId, frequency: FrequencyId) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in source.into_inner().to_le_bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    for byte in frequency.into_inner().to_le_bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

struct RoutingSlot {
    source: AgentId,
    frequency: FrequencyId,
    destinations: Vec<AgentId>,
}

/// Maps a `(source_agent, frequency)` pair to the set of agents
/// subscribed to receive it.
pub struct RoutingTable {
    slots: Vec<Option<RoutingSlot>>,
    len: usize,
}

impl RoutingTable {
    /// Creates a table with room for `capacity` distinct `(source,
    /// frequency)` entries (not destinations — one entry holds many).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            len: 0,
        }
    }

    /// Number of distinct `(source, frequency)` entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the table holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Fixed entry capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn find_slot(&self, source: AgentId, frequency: FrequencyId) -> Option<usize> {
        let capacity = self.slots.len();
        let start = (fnv1a(source, frequency) as usize) % capacity;
        for step in 0..capacity {
            let idx = (start + step) % capacity;
            match &self.slots[idx] {
                Some(slot) if slot.source == source && slot.frequency == frequency => {
                    return Some(idx);
                }
                None => return Some(idx),
                Some(_) => continue,
            }
        }
        None
    }

    /// Registers `destination` as a recipient of signals emitted by
    /// `source` on `frequency`. Idempotent: binding the same pair twice
    /// does not duplicate the destination.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::TableFull`] if the probe sequence wraps
    /// without finding the key or a free slot.
    pub fn bind(
        &mut self,
        source: AgentId,
        frequency: FrequencyId,
        destination: AgentId,
    ) -> Result<(), RuntimeError> {
        let capacity = self.slots.len();
        let idx = self
            .find_slot(source, frequency)
            .ok_or(RuntimeError::TableFull { capacity })?;

        match &mut self.slots[idx] {
            Some(slot) => {
                if !slot.destinations.contains(&destination) {
                    slot.destinations.push(destination);
                }
            }
            None => {
                self.slots[idx] = Some(RoutingSlot {
                    source,
                    frequency,
                    destinations: vec![destination],
                });
                self.len += 1;
            }
        }
        Ok(())
    }

    /// Looks up the destinations bound to `(source, frequency)`, if any.
    #[must_use]
    pub fn destinations(&self, source: AgentId, frequency: FrequencyId) -> &[AgentId] {
        let capacity = self.slots.len();
        let start = (fnv1a(source, frequency) as usize) % capacity;
        for step in 0..capacity {
            let idx = (start + step) % capacity;
            match &self.slots[idx] {
                Some(slot) if slot.source == source && slot.frequency == frequency => {
                    return &slot.destinations;
                }
                Some(_) => continue,
                None => return &[],
            }
        }
        &[]
    }
}
