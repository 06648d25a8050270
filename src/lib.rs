//! Mycelial: a bio-themed signal runtime and compiler front-end.
//!
//! Typed messages ("signals") pass between long-lived agents over a
//! deterministic, single-threaded "tidal cycle" scheduler: REST
//! (deliver queued emissions), SENSE (find agents with pending work),
//! ACT (run handlers, collecting what they emit for the next cycle).
//! A small compiler turns Mycelial source text into a compact binary
//! descriptor the runtime loads directly — see [`compiler`] and
//! [`runtime::network::Network`].

pub mod compiler;
pub mod config;
pub mod domain;
pub mod error;
pub mod observability;
pub mod runtime;

pub use compiler::{compile, NetworkDescriptor, Program};
pub use config::{ConfigError, NetworkConfig};
pub use domain::{AgentId, CycleCount, FrequencyId, MaxEmptyCycles, Name, PayloadSize, QueueCapacity};
pub use error::{CompileError, IoError, MycelialError, RuntimeError, SemanticError, SyntaxError};
pub use observability::{init_tracing, CycleReport, RuntimeEvent};
pub use runtime::{DispatchEntry, DispatchTable, Emission, FruitingBody, Network, Signal};

pub use ::tracing::{debug, error, info, instrument, warn};
pub use serde::{Deserialize, Serialize};
pub use thiserror::Error;
