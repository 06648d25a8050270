//! The host API's `observe` side: a host subscribes to everything an
//! agent emits on a frequency and receives each payload synchronous
//! with the cycle that produced it, without needing a socket at all.

use mycelial::{DispatchEntry, Emission, FrequencyId, Name, Network, NetworkConfig};

#[test]
fn observer_sees_every_emission_with_no_socket_bound() {
    let mut net = Network::new(NetworkConfig::testing());
    let beacon = net.spawn(Name::try_new("beacon").unwrap()).unwrap();
    let pulse = FrequencyId::try_new(1).unwrap();

    net.on_cycle(
        beacon,
        DispatchEntry::unconditional(Box::new(move |_record, _signal, emitted| {
            emitted.push(Emission {
                frequency: pulse,
                payload: b"pulse".to_vec(),
            });
            Ok(())
        })),
    );

    let rx = net.observe("beacon", pulse).expect("beacon is registered");
    net.run_cycles(3);

    let received: Vec<_> = rx.try_iter().collect();
    assert_eq!(received.len(), 3);
    assert!(received.iter().all(|payload| payload == b"pulse"));
}

#[test]
fn observing_an_unregistered_name_is_an_error() {
    let net = Network::new(NetworkConfig::testing());
    assert!(net.observe("nobody", FrequencyId::try_new(1).unwrap()).is_err());
}
