//! Two networks built identically and fed the same external stimuli
//! produce identical cycle reports, cycle by cycle.

use mycelial::runtime::registry::StateValue;
use mycelial::{DispatchEntry, Emission, FrequencyId, Name, Network, NetworkConfig};

fn build() -> Network {
    let mut net = Network::new(NetworkConfig::testing());
    let relay = net.spawn(Name::try_new("relay").unwrap()).unwrap();
    let a = net.spawn(Name::try_new("a").unwrap()).unwrap();
    let b = net.spawn(Name::try_new("b").unwrap()).unwrap();
    let freq = FrequencyId::try_new(1).unwrap();
    net.socket(relay, freq, a).unwrap();
    net.socket(relay, freq, b).unwrap();

    net.on_cycle(
        relay,
        DispatchEntry::unconditional(Box::new(move |record, _signal, emitted| {
            let beat = match record.state("beat") {
                Some(StateValue::Int(n)) => *n,
                _ => 0,
            };
            record.set_state("beat", StateValue::Int(beat + 1));
            emitted.push(Emission {
                frequency: freq,
                payload: beat.to_le_bytes().to_vec(),
            });
            Ok(())
        })),
    );
    for agent in [a, b] {
        net.on(
            agent,
            freq,
            DispatchEntry::unconditional(Box::new(|record, _signal, _emitted| {
                let count = match record.state("count") {
                    Some(StateValue::Int(n)) => *n,
                    _ => 0,
                };
                record.set_state("count", StateValue::Int(count + 1));
                Ok(())
            })),
        );
    }
    net
}

#[test]
fn identical_construction_and_stimuli_yield_identical_reports() {
    let mut first = build();
    let mut second = build();

    let first_reports = first.run_cycles(6);
    let second_reports = second.run_cycles(6);

    assert_eq!(first_reports, second_reports);
}
