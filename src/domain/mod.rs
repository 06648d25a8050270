//! Domain primitives shared across the runtime and compiler.

pub mod primitives;

pub use primitives::{
    AgentId, CycleCount, FrequencyId, MaxEmptyCycles, Name, PayloadSize, QueueCapacity,
    MAX_PAYLOAD,
};
