//! Domain primitives for the signal runtime
//!
//! Newtypes built with `nutype` so illegal states — a zero frequency id, a
//! payload over the hard cap, a queue capacity that isn't a power of two —
//! are rejected at the construction boundary rather than checked ad hoc at
//! every call site.

use nutype::nutype;
use serde::{Deserialize, Serialize};

/// Hard ceiling on a signal's payload, in bytes.
pub const MAX_PAYLOAD: u32 = 64 * 1024;

/// Identifies a declared message frequency. Small positive integer,
/// immutable once the frequency catalog is finalized.
#[nutype(
    validate(greater = 0),
    derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)
)]
pub struct FrequencyId(u32);

/// Identifies a durable agent. Agents are numbered `1..=N` at topology
/// init and keep their id for the program's lifetime.
#[nutype(
    validate(greater = 0),
    derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)
)]
pub struct AgentId(u32);

/// Human-readable, non-empty name for a frequency, agent, or fruiting
/// body. Trimmed on construction.
#[nutype(
    sanitize(trim),
    validate(len_char_min = 1, len_char_max = 128),
    derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)
)]
pub struct Name(String);

/// Payload size in bytes. Bounded above by [`MAX_PAYLOAD`]; zero is
/// valid and yields a null payload with zero capacity.
#[nutype(
    validate(less_or_equal = MAX_PAYLOAD),
    derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)
)]
pub struct PayloadSize(u32);

/// A bounded queue's capacity. Always a power of two; `queue_create`
/// rounds up to the next one before constructing this type, so the
/// invariant is enforced here rather than re-checked by callers.
#[nutype(
    validate(predicate = |n: &u32| n.is_power_of_two() && *n > 0),
    derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)
)]
pub struct QueueCapacity(u32);

impl QueueCapacity {
    /// Rounds `requested` up to the next power of two and constructs a
    /// valid capacity. `0` rounds up to `1`.
    #[must_use]
    pub fn round_up(requested: u32) -> Self {
        let rounded = requested.max(1).next_power_of_two();
        Self::try_new(rounded).expect("next_power_of_two is always a power of two")
    }

    /// The bitmask used to wrap ring-buffer indices: `capacity - 1`.
    #[must_use]
    pub fn mask(&self) -> u32 {
        self.into_inner() - 1
    }
}

/// Number of consecutive empty cycles before the scheduler exits
/// `run()`. Defaults to `10`.
#[nutype(
    validate(greater = 0),
    derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default),
    default = 10
)]
pub struct MaxEmptyCycles(u32);

/// Count of tidal cycles executed so far. Monotonic for the lifetime of
/// a `Network`.
#[nutype(
    derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)
)]
pub struct CycleCount(u64);

impl CycleCount {
    /// Returns a new count one greater than this one.
    #[must_use]
    pub fn incremented(self) -> Self {
        Self::new(self.into_inner() + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::{AgentId, MAX_PAYLOAD, PayloadSize, QueueCapacity};

    #[test]
    fn frequency_id_rejects_zero() {
        assert!(super::FrequencyId::try_new(0).is_err());
        assert!(super::FrequencyId::try_new(1).is_ok());
    }

    #[test]
    fn agent_id_rejects_zero() {
        assert!(AgentId::try_new(0).is_err());
    }

    #[test]
    fn payload_size_accepts_zero_and_max() {
        assert!(PayloadSize::try_new(0).is_ok());
        assert!(PayloadSize::try_new(MAX_PAYLOAD).is_ok());
        assert!(PayloadSize::try_new(MAX_PAYLOAD + 1).is_err());
    }

    #[test]
    fn queue_capacity_round_up() {
        assert_eq!(QueueCapacity::round_up(1).into_inner(), 1);
        assert_eq!(QueueCapacity::round_up(3).into_inner(), 4);
        assert_eq!(QueueCapacity::round_up(16).into_inner(), 16);
        assert_eq!(QueueCapacity::round_up(17).into_inner(), 32);
        assert_eq!(QueueCapacity::round_up(0).into_inner(), 1);
    }

    #[test]
    fn queue_capacity_mask() {
        let cap = QueueCapacity::round_up(8);
        assert_eq!(cap.mask(), 7);
    }

    #[test]
    fn queue_capacity_rejects_non_power_of_two() {
        assert!(QueueCapacity::try_new(6).is_err());
    }

    proptest::proptest! {
        #[test]
        fn round_up_is_always_a_power_of_two_no_smaller_than_requested(requested in 0u32..1_000_000) {
            let cap = QueueCapacity::round_up(requested);
            let value = cap.into_inner();
            proptest::prop_assert!(value.is_power_of_two());
            proptest::prop_assert!(value >= requested.max(1));
            proptest::prop_assert_eq!(cap.mask(), value - 1);
        }
    }
}
