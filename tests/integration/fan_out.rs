//! A single broadcast signal fans out to every socket bound to the
//! same `(source, frequency)` pair, and each destination's copy is
//! marked as a broadcast delivery.

use mycelial::runtime::{registry::StateValue, Emission};
use mycelial::{DispatchEntry, FrequencyId, Name, Network, NetworkConfig};

#[test]
fn one_emission_reaches_every_bound_destination() {
    let mut net = Network::new(NetworkConfig::testing());
    let broadcaster = net.spawn(Name::try_new("broadcaster").unwrap()).unwrap();
    let listeners: Vec<_> = ["north", "south", "east"]
        .iter()
        .map(|name| net.spawn(Name::try_new(*name).unwrap()).unwrap())
        .collect();

    let announce = FrequencyId::try_new(1).unwrap();
    for &listener in &listeners {
        net.socket(broadcaster, announce, listener).unwrap();
        net.on(
            listener,
            announce,
            DispatchEntry::unconditional(Box::new(|record, signal, _emitted| {
                record.set_state("heard_broadcast", StateValue::Bool(signal.flags().broadcast));
                Ok(())
            })),
        );
    }

    net.on_cycle(
        broadcaster,
        DispatchEntry::unconditional(Box::new(move |_record, _signal, emitted| {
            emitted.push(Emission {
                frequency: announce,
                payload: Vec::new(),
            });
            Ok(())
        })),
    );

    net.run_cycles(3);
    for listener in listeners {
        assert_eq!(
            net.agent_state(listener, "heard_broadcast"),
            Some(&StateValue::Bool(true))
        );
    }
}
