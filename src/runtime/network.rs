//! `Network`: wires the arena, registry, routing table, dispatch table,
//! and scheduler into the REST / SENSE / ACT cycle loop, with a
//! fruiting body as the one entry point a host can reach from another
//! thread.
//!
//! This is the runtime's one `&mut self` owner. Everything it holds —
//! [`Arena`], [`AgentRegistry`], [`RoutingTable`], [`DispatchTable`] —
//! is plain, single-threaded state; only [`FruitingBody`], the
//! injection entry point a host hands to other threads, needs to be
//! thread-safe, and it is the one piece here that reaches for a mutex
//! instead of an `Rc`.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use tracing::instrument;

use crate::config::NetworkConfig;
use crate::domain::{AgentId, CycleCount, FrequencyId, Name};
use crate::error::RuntimeError;
use crate::observability::{CycleReport, RuntimeEvent};
use crate::runtime::arena::Arena;
use crate::runtime::dispatch::{DispatchEntry, DispatchTable, Emission, Outcome};
use crate::runtime::registry::AgentRegistry;
use crate::runtime::routing::RoutingTable;
use crate::runtime::scheduler::{rotate_start, ControlFlow, TidalScheduler};
use crate::runtime::signal::Signal;

/// The reserved frequency fired by the REST phase once per cycle for
/// every agent with an `on cycle` trigger, independent of anything
/// queued. There is no declared frequency `0`, since `FrequencyId`
/// requires a value greater than zero, so this can't collide with a
/// network-declared frequency.
fn on_cycle_frequency() -> FrequencyId {
    FrequencyId::try_new(u32::MAX).expect("u32::MAX is a valid FrequencyId")
}

/// One signal queued for exogenous delivery by a fruiting body, waiting
/// to be drained into its target's inbox on the next REST phase.
struct PendingInjection {
    source: AgentId,
    target: AgentId,
    frequency: FrequencyId,
    payload: Vec<u8>,
}

/// A thread-safe handle for injecting signals into a running
/// [`Network`] from outside the cooperative scheduler loop.
///
/// Deliberately a plain `Mutex`-guarded queue rather than a lock-free
/// MPSC: fruiting bodies are an external-stimulus interface, not a
/// hot path, and a mutex keeps the injection order first-in-first-out
/// without the hazards of a hand-rolled lock-free structure.
#[derive(Clone)]
pub struct FruitingBody {
    queue: Arc<Mutex<VecDeque<PendingInjection>>>,
    observers: Arc<Mutex<HashMap<(AgentId, FrequencyId), Vec<mpsc::Sender<Vec<u8>>>>>>,
}

impl FruitingBody {
    fn new() -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
            observers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Subscribes to every signal emitted on `(source, frequency)`,
    /// delivered synchronously at the end of the cycle's ACT phase that
    /// produced them. Matches `observe(name) -> signal_stream` from the
    /// host API: the receiver yields one payload per matching emission,
    /// in emission order, for as long as the `Network` runs.
    #[must_use]
    pub fn observe(&self, source: AgentId, frequency: FrequencyId) -> mpsc::Receiver<Vec<u8>> {
        let (tx, rx) = mpsc::channel();
        self.observers
            .lock()
            .expect("fruiting body mutex poisoned")
            .entry((source, frequency))
            .or_default()
            .push(tx);
        rx
    }

    /// Pushes `payload` to every observer subscribed to `(source,
    /// frequency)`, dropping senders whose receiver has gone away.
    fn notify(&self, source: AgentId, frequency: FrequencyId, payload: &[u8]) {
        let mut observers = self.observers.lock().expect("fruiting body mutex poisoned");
        if let Some(senders) = observers.get_mut(&(source, frequency)) {
            senders.retain(|tx| tx.send(payload.to_vec()).is_ok());
        }
    }

    /// Queues a signal for delivery directly to `target`'s inbox on the
    /// network's next REST phase. Bypasses the routing table: this is a
    /// targeted external stimulus, not an agent-to-agent emission.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned by a prior panic in
    /// another thread holding it.
    pub fn inject(&self, source: AgentId, target: AgentId, frequency: FrequencyId, payload: Vec<u8>) {
        self.queue.lock().expect("fruiting body mutex poisoned").push_back(PendingInjection {
            source,
            target,
            frequency,
            payload,
        });
    }

    fn drain(&self) -> Vec<PendingInjection> {
        let mut queue = self.queue.lock().expect("fruiting body mutex poisoned");
        queue.drain(..).collect()
    }
}

/// The signal runtime: owns every agent, queue, routing binding, and
/// dispatch entry in one network, and drives them through tidal cycles.
pub struct Network {
    arena: Rc<RefCell<Arena>>,
    registry: AgentRegistry,
    routing: RoutingTable,
    dispatch: DispatchTable,
    scheduler: TidalScheduler,
    fruiting_body: FruitingBody,
    on_cycle_subscribers: Vec<AgentId>,
    config: NetworkConfig,
    next_agent_id: u32,
    tick: u64,
}

impl Network {
    /// Builds an empty network from `config`.
    #[must_use]
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            arena: Rc::new(RefCell::new(Arena::new(config.arena_page_bytes))),
            registry: AgentRegistry::new(config.max_agents),
            routing: RoutingTable::new(config.max_routing_entries),
            dispatch: DispatchTable::new(),
            scheduler: TidalScheduler::new(config.max_empty_cycles),
            fruiting_body: FruitingBody::new(),
            on_cycle_subscribers: Vec::new(),
            next_agent_id: 1,
            tick: 0,
            config,
        }
    }

    /// Registers a new agent with a default-capacity inbox and returns
    /// its id.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::CapacityExceeded`] if the registry is
    /// full.
    pub fn spawn(&mut self, name: Name) -> Result<AgentId, RuntimeError> {
        let id = AgentId::try_new(self.next_agent_id)
            .expect("monotonically increasing agent ids stay above zero");
        self.next_agent_id += 1;
        self.registry
            .register(id, name, self.config.default_queue_capacity)?;
        Ok(id)
    }

    /// Binds a handler (and optional guard) to react whenever `agent`
    /// receives a signal on `frequency`.
    pub fn on(&mut self, agent: AgentId, frequency: FrequencyId, entry: DispatchEntry) {
        self.dispatch.bind(agent, frequency, entry);
    }

    /// Subscribes `agent` to the `on cycle` trigger: its `entry` runs
    /// once per REST phase, every cycle, independent of its inbox.
    pub fn on_cycle(&mut self, agent: AgentId, entry: DispatchEntry) {
        self.dispatch.bind(agent, on_cycle_frequency(), entry);
        if !self.on_cycle_subscribers.contains(&agent) {
            self.on_cycle_subscribers.push(agent);
        }
    }

    /// Routes signals `source` emits on `frequency` to `destination`'s
    /// inbox.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::TableFull`] if the routing table has no
    /// room for a new `(source, frequency)` entry.
    pub fn socket(
        &mut self,
        source: AgentId,
        frequency: FrequencyId,
        destination: AgentId,
    ) -> Result<(), RuntimeError> {
        self.routing.bind(source, frequency, destination)
    }

    /// Returns a cloneable handle a host can use to inject signals from
    /// another thread.
    #[must_use]
    pub fn fruiting_body(&self) -> FruitingBody {
        self.fruiting_body.clone()
    }

    /// Subscribes to every signal the agent named `name` emits on
    /// `frequency`. The returned receiver yields a payload once per
    /// cycle's ACT phase in which that emission occurred, synchronous
    /// with cycle boundaries as the host API requires.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::AgentNotFound`] if no agent has that
    /// name.
    pub fn observe(&self, name: &str, frequency: FrequencyId) -> Result<mpsc::Receiver<Vec<u8>>, RuntimeError> {
        let agent = self.registry.resolve(name)?;
        Ok(self.fruiting_body.observe(agent, frequency))
    }

    /// The cycle about to run.
    #[must_use]
    pub fn cycle(&self) -> CycleCount {
        self.scheduler.cycle()
    }

    /// Reads a state field for `agent`, for hosts inspecting results
    /// between or after runs. Returns `None` if the agent doesn't exist
    /// or never set that field.
    #[must_use]
    pub fn agent_state(&self, agent: AgentId, field: &str) -> Option<&crate::runtime::registry::StateValue> {
        self.registry.get(agent)?.state(field)
    }

    fn next_tick(&mut self) -> u64 {
        let tick = self.tick;
        self.tick += 1;
        tick
    }

    fn route_emission(
        &mut self,
        source: AgentId,
        frequency: FrequencyId,
        payload: &[u8],
        report: &mut CycleReport,
        events: &mut Vec<RuntimeEvent>,
    ) {
        let destinations = self.routing.destinations(source, frequency).to_vec();
        let broadcast = destinations.len() > 1;
        for destination in destinations {
            let tick = self.next_tick();
            let Ok(signal) = Signal::create(frequency, source, payload, tick, &self.arena) else {
                report.dropped_deliveries += 1;
                events.push(RuntimeEvent::DeliveryDropped {
                    agent: destination,
                    frequency,
                });
                continue;
            };
            if broadcast {
                signal.mark_broadcast();
            }
            let Some(record) = self.registry.get_mut(destination) else {
                continue;
            };
            if record.queue_mut().enqueue(signal).is_err() {
                report.dropped_deliveries += 1;
                events.push(RuntimeEvent::DeliveryDropped {
                    agent: destination,
                    frequency,
                });
            }
        }
    }

    /// Runs exactly one REST / SENSE / ACT cycle and returns its report.
    #[instrument(skip(self), fields(cycle = ?self.scheduler.cycle()))]
    pub fn run_cycle(&mut self) -> CycleReport {
        let cycle = self.scheduler.cycle();
        let mut report = CycleReport::empty(cycle);
        let mut events = Vec::new();
        let mut emissions: Vec<(AgentId, Emission)> = Vec::new();

        // REST: deliver anything queued from the previous cycle's emissions,
        // drain exogenous injections, then fire every `on cycle` trigger.
        let injections = self.fruiting_body.drain();
        for injection in injections {
            let tick = self.next_tick();
            match Signal::create(injection.frequency, injection.source, &injection.payload, tick, &self.arena) {
                Ok(signal) => {
                    if let Some(record) = self.registry.get_mut(injection.target) {
                        if record.queue_mut().enqueue(signal).is_err() {
                            report.dropped_deliveries += 1;
                            events.push(RuntimeEvent::DeliveryDropped {
                                agent: injection.target,
                                frequency: injection.frequency,
                            });
                        }
                    }
                }
                Err(_) => {
                    report.dropped_deliveries += 1;
                }
            }
        }

        for agent in self.on_cycle_subscribers.clone() {
            let tick = self.next_tick();
            let Ok(signal) = Signal::create(on_cycle_frequency(), agent, &[], tick, &self.arena) else {
                continue;
            };
            let Some(record) = self.registry.get_mut(agent) else {
                continue;
            };
            let mut local_emissions = Vec::new();
            let outcome = self.dispatch.invoke(record, &signal, &mut local_emissions);
            record_outcome(agent, on_cycle_frequency(), outcome, &mut report, &mut events);
            for emission in local_emissions {
                emissions.push((agent, emission));
            }
        }

        // SENSE: a fair rotation over agents with non-empty inboxes. Each
        // agent contributes at most one signal to this cycle's work list,
        // no matter how many more are pending — that cap is what keeps
        // latency bounded across the network even when one agent's inbox
        // is saturated. Anything left over waits for the next cycle.
        let mut ids: Vec<AgentId> = self.registry.ids().collect();
        ids.sort();
        let offset = rotate_start(ids.len(), cycle);
        let ordered: Vec<AgentId> = ids
            .iter()
            .cycle()
            .skip(offset)
            .take(ids.len())
            .copied()
            .collect();

        let mut work_list: Vec<(AgentId, Signal)> = Vec::new();
        for agent in &ordered {
            if let Some(record) = self.registry.get_mut(*agent) {
                if let Some(signal) = record.queue_mut().dequeue() {
                    work_list.push((*agent, signal));
                }
            }
        }

        // ACT: invoke the dispatch table for exactly the signals SENSE
        // pulled this cycle, in spawn-rotation order.
        for (agent, signal) in work_list {
            let Some(record) = self.registry.get_mut(agent) else {
                signal.release();
                continue;
            };
            let mut local_emissions = Vec::new();
            let outcome = self.dispatch.invoke(record, &signal, &mut local_emissions);
            record_outcome(agent, signal.frequency_id(), outcome, &mut report, &mut events);
            for emission in local_emissions {
                emissions.push((agent, emission));
            }
            signal.release();
        }

        // Emissions made this cycle are routed now, landing in inboxes in
        // time for next cycle's REST — never the same cycle's ACT, so a
        // handler can never observe its own emission before a tick passes.
        // Fruiting-body observers see the same emissions synchronously,
        // here at the end of ACT, ahead of the routing that will deliver
        // them to other agents next cycle.
        for (source, emission) in emissions {
            self.fruiting_body.notify(source, emission.frequency, &emission.payload);
            self.route_emission(source, emission.frequency, &emission.payload, &mut report, &mut events);
        }

        if self.config.enable_detailed_logs {
            for event in &events {
                tracing::debug!(?event, "runtime event");
            }
        }

        report
    }

    /// Runs up to `n` cycles, stopping early if the scheduler's
    /// empty-cycle shutdown policy fires.
    pub fn run_cycles(&mut self, n: u64) -> Vec<CycleReport> {
        let mut reports = Vec::with_capacity(n as usize);
        for _ in 0..n {
            let report = self.run_cycle();
            let flow = self.scheduler.advance(&report);
            reports.push(report);
            if flow == ControlFlow::Shutdown {
                break;
            }
        }
        reports
    }

    /// Runs cycles until the scheduler's empty-cycle shutdown policy
    /// fires.
    pub fn run(&mut self) -> Vec<CycleReport> {
        let mut reports = Vec::new();
        loop {
            let report = self.run_cycle();
            let flow = self.scheduler.advance(&report);
            reports.push(report);
            if flow == ControlFlow::Shutdown {
                break;
            }
        }
        reports
    }
}

fn record_outcome(
    agent: AgentId,
    frequency: FrequencyId,
    outcome: Outcome,
    report: &mut CycleReport,
    events: &mut Vec<RuntimeEvent>,
) {
    match outcome {
        Outcome::Dispatched => {
            report.signals_processed += 1;
            events.push(RuntimeEvent::Dispatched { agent, frequency });
        }
        Outcome::GuardDeclined => {
            report.guard_rejections += 1;
            events.push(RuntimeEvent::GuardDeclined { agent, frequency });
        }
        Outcome::NoHandler => {}
        Outcome::HandlerFailed(reason) => {
            report.handler_failures += 1;
            events.push(RuntimeEvent::HandlerFailed {
                agent,
                frequency,
                reason,
            });
        }
    }
}
