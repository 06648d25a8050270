//! The signal runtime: memory arena, signals, queues, routing,
//! registry, dispatch, scheduler, and the `Network` that ties them
//! together.

pub mod arena;
pub mod dispatch;
pub mod network;
pub mod queue;
pub mod registry;
pub mod routing;
pub mod scheduler;
pub mod signal;

pub use arena::{Arena, ArenaStats};
pub use dispatch::{DispatchEntry, DispatchTable, Emission, Guard, Handler, Outcome};
pub use network::{FruitingBody, Network};
pub use queue::{QueueStats, SignalQueue};
pub use registry::{AgentRecord, AgentRegistry, StateValue};
pub use routing::RoutingTable;
pub use scheduler::{rotate_start, ControlFlow, TidalScheduler};
pub use signal::{Signal, SignalFlags};
