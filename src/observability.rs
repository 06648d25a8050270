//! Structured logging setup and per-cycle telemetry events.

use serde::{Deserialize, Serialize};

use crate::domain::{AgentId, CycleCount, FrequencyId};

/// Initializes the global `tracing` subscriber from `RUST_LOG` (or a
/// sensible default). Intended to be called once, near the start of a
/// binary's `main`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mycelial=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}

/// A structured summary of one tidal cycle, suitable for logging or for
/// a host to inspect after `Network::run_cycles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    /// The cycle that just completed.
    pub cycle: CycleCount,
    /// Number of (agent, signal) pairs processed in ACT this cycle.
    pub signals_processed: usize,
    /// Number of handler invocations that returned `HandlerFailed`.
    pub handler_failures: usize,
    /// Number of guard evaluations that declined their signal.
    pub guard_rejections: usize,
    /// Number of emitted signals dropped for a full destination queue.
    pub dropped_deliveries: usize,
}

impl CycleReport {
    /// An empty report for a cycle that processed nothing.
    #[must_use]
    pub fn empty(cycle: CycleCount) -> Self {
        Self {
            cycle,
            signals_processed: 0,
            handler_failures: 0,
            guard_rejections: 0,
            dropped_deliveries: 0,
        }
    }

    /// Whether this cycle did any work at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signals_processed == 0
    }
}

/// One observable event a handler or the scheduler can report for
/// external monitoring. Distinct from the signals themselves — this is
/// telemetry, not message payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuntimeEvent {
    /// A handler ran to completion for `(agent, frequency)`.
    Dispatched {
        /// The agent that handled the signal.
        agent: AgentId,
        /// The frequency dispatched.
        frequency: FrequencyId,
    },
    /// A guard declined a signal.
    GuardDeclined {
        /// The agent whose guard declined.
        agent: AgentId,
        /// The frequency declined.
        frequency: FrequencyId,
    },
    /// A handler returned a failure.
    HandlerFailed {
        /// The agent whose handler failed.
        agent: AgentId,
        /// The frequency being handled.
        frequency: FrequencyId,
        /// The failure reason the handler reported.
        reason: String,
    },
    /// A destination queue overflowed during an emit flush.
    DeliveryDropped {
        /// The agent whose queue overflowed.
        agent: AgentId,
        /// The frequency that was dropped.
        frequency: FrequencyId,
    },
}

#[cfg(test)]
mod tests {
    use super::CycleReport;
    use crate::domain::CycleCount;

    #[test]
    fn empty_report_is_empty() {
        let report = CycleReport::empty(CycleCount::new(3));
        assert!(report.is_empty());
        assert_eq!(report.cycle.into_inner(), 3);
    }

    #[test]
    fn nonempty_report_is_not_empty() {
        let mut report = CycleReport::empty(CycleCount::new(0));
        report.signals_processed = 1;
        assert!(!report.is_empty());
    }
}
