//! Dispatch table: per-`(agent, frequency)` guard and handler bindings,
//! driving the ACT phase.
//!
//! The compiler resolves handler and guard *names* into a
//! [`crate::compiler::descriptor::NetworkDescriptor`]; a host embedding
//! this runtime binds those names to native closures via
//! [`DispatchTable::bind`] before calling [`crate::runtime::network::Network::run`],
//! rather than interpreting any compiled bytecode — there isn't any.

use std::collections::HashMap;

use tracing::instrument;

use crate::domain::{AgentId, FrequencyId};
use crate::runtime::registry::AgentRecord;
use crate::runtime::signal::Signal;

/// A signal a handler wants to emit on its own frequency, to be routed
/// to whatever destinations are bound to `(this agent, frequency)` once
/// the handler returns.
#[derive(Debug, Clone)]
pub struct Emission {
    /// The frequency to emit on.
    pub frequency: FrequencyId,
    /// The raw payload bytes for the new signal.
    pub payload: Vec<u8>,
}

/// A guard: decides whether a handler should run for a given signal.
pub type Guard = Box<dyn Fn(&AgentRecord, &Signal) -> bool>;

/// A handler: reacts to a signal, mutating agent state in place and
/// pushing any signals it wants to emit onto `emitted`.
///
/// Returns `Err(reason)` to report [`Outcome::HandlerFailed`] without
/// aborting the cycle.
pub type Handler =
    Box<dyn FnMut(&mut AgentRecord, &Signal, &mut Vec<Emission>) -> Result<(), String>>;

/// One bound `(agent, frequency)` reaction.
pub struct DispatchEntry {
    guard: Option<Guard>,
    handler: Handler,
}

impl DispatchEntry {
    /// Binds a handler with no guard — it always runs.
    pub fn unconditional(handler: Handler) -> Self {
        Self {
            guard: None,
            handler,
        }
    }

    /// Binds a handler that only runs when `guard` returns `true`.
    pub fn guarded(guard: Guard, handler: Handler) -> Self {
        Self {
            guard: Some(guard),
            handler,
        }
    }
}

/// The outcome of attempting to dispatch one signal to one agent.
#[derive(Debug)]
pub enum Outcome {
    /// The handler ran to completion.
    Dispatched,
    /// A guard declined the signal; the handler did not run.
    GuardDeclined,
    /// No entry is bound for this `(agent, frequency)` pair.
    NoHandler,
    /// The handler ran and returned a failure.
    HandlerFailed(String),
}

/// Maps `(agent, frequency)` to the guard and handler that react to it.
#[derive(Default)]
pub struct DispatchTable {
    entries: HashMap<(AgentId, FrequencyId), DispatchEntry>,
}

impl DispatchTable {
    /// Creates an empty dispatch table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds (or rebinds) the reaction for `(agent, frequency)`.
    pub fn bind(&mut self, agent: AgentId, frequency: FrequencyId, entry: DispatchEntry) {
        self.entries.insert((agent, frequency), entry);
    }

    /// Whether any entry is bound for `(agent, frequency)`.
    #[must_use]
    pub fn is_bound(&self, agent: AgentId, frequency: FrequencyId) -> bool {
        self.entries.contains_key(&(agent, frequency))
    }

    /// Runs the bound guard (if any) and handler for `signal` against
    /// `record`, collecting any signals the handler emits into
    /// `emitted`.
    #[instrument(skip(self, record, signal, emitted), fields(agent = ?record.id(), frequency = ?signal.frequency_id()))]
    pub fn invoke(
        &mut self,
        record: &mut AgentRecord,
        signal: &Signal,
        emitted: &mut Vec<Emission>,
    ) -> Outcome {
        let Some(entry) = self
            .entries
            .get_mut(&(record.id(), signal.frequency_id()))
        else {
            return Outcome::NoHandler;
        };

        if let Some(guard) = &entry.guard {
            if !guard(record, signal) {
                tracing::debug!("guard declined signal");
                return Outcome::GuardDeclined;
            }
        }

        match (entry.handler)(record, signal, emitted) {
            Ok(()) => {
                signal.mark_processed();
                Outcome::Dispatched
            }
            Err(reason) => {
                tracing::warn!(%reason, "handler failed");
                Outcome::HandlerFailed(reason)
            }
        }
    }
}
