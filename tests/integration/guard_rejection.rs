//! A guard that always declines prevents its handler from running and
//! is counted separately from a dispatched signal.

use mycelial::runtime::registry::StateValue;
use mycelial::{DispatchEntry, FrequencyId, Name, Network, NetworkConfig};

#[test]
fn declined_guard_never_runs_its_handler() {
    let mut net = Network::new(NetworkConfig::testing());
    let gatekeeper = net.spawn(Name::try_new("gatekeeper").unwrap()).unwrap();
    let freq = FrequencyId::try_new(1).unwrap();

    net.on(
        gatekeeper,
        freq,
        DispatchEntry::guarded(
            Box::new(|record, _signal| {
                matches!(record.state("armed"), Some(StateValue::Bool(true)))
            }),
            Box::new(|record, _signal, _emitted| {
                record.set_state("opened", StateValue::Bool(true));
                Ok(())
            }),
        ),
    );

    net.fruiting_body().inject(gatekeeper, gatekeeper, freq, Vec::new());
    let reports = net.run_cycles(3);

    assert!(net.agent_state(gatekeeper, "opened").is_none());
    assert_eq!(reports.iter().map(|r| r.guard_rejections).sum::<usize>(), 1);
    assert_eq!(reports.iter().map(|r| r.signals_processed).sum::<usize>(), 0);
}
