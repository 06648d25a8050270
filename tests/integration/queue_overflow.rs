//! Emissions that arrive faster than a destination's inbox drains are
//! dropped and counted rather than blocking the cycle.

use mycelial::{DispatchEntry, Emission, FrequencyId, Name, Network, NetworkConfig, QueueCapacity};

#[test]
fn excess_emissions_to_a_full_inbox_are_dropped_and_counted() {
    let mut net = Network::new(
        NetworkConfig::builder()
            .default_queue_capacity(QueueCapacity::round_up(1))
            .build()
            .unwrap(),
    );
    let flood = net.spawn(Name::try_new("flood").unwrap()).unwrap();
    let sink = net.spawn(Name::try_new("sink").unwrap()).unwrap();
    let freq = FrequencyId::try_new(1).unwrap();
    net.socket(flood, freq, sink).unwrap();

    net.on_cycle(
        flood,
        DispatchEntry::unconditional(Box::new(move |_record, _signal, emitted| {
            for _ in 0..4 {
                emitted.push(Emission {
                    frequency: freq,
                    payload: Vec::new(),
                });
            }
            Ok(())
        })),
    );

    let reports = net.run_cycles(3);
    let dropped: usize = reports.iter().map(|r| r.dropped_deliveries).sum();
    assert!(dropped >= 3, "expected at least 3 drops from a 1-slot inbox, got {dropped}");
}
