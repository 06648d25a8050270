//! Exogenous injection through a `FruitingBody` lands directly in the
//! named target's inbox, bypassing the routing table entirely.

use mycelial::runtime::registry::StateValue;
use mycelial::{DispatchEntry, FrequencyId, Name, Network, NetworkConfig};

#[test]
fn injected_signal_reaches_its_target_without_a_socket() {
    let mut net = Network::new(NetworkConfig::testing());
    let stimulus = net.spawn(Name::try_new("stimulus").unwrap()).unwrap();
    let observer = net.spawn(Name::try_new("observer").unwrap()).unwrap();
    let freq = FrequencyId::try_new(1).unwrap();

    // Deliberately no `net.socket(...)` binding between the two agents:
    // this signal must still arrive because it's injected directly.
    net.on(
        observer,
        freq,
        DispatchEntry::unconditional(Box::new(|record, signal, _emitted| {
            record.set_state("source_matches", StateValue::Bool(true));
            record.set_state("payload_len", StateValue::Int(signal.payload_size() as i64));
            Ok(())
        })),
    );

    net.fruiting_body()
        .inject(stimulus, observer, freq, b"hello".to_vec());
    net.run_cycles(2);

    assert_eq!(
        net.agent_state(observer, "source_matches"),
        Some(&StateValue::Bool(true))
    );
    assert_eq!(net.agent_state(observer, "payload_len"), Some(&StateValue::Int(5)));
}
