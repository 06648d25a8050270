//! Compiles Mycelial source into a descriptor, then builds a live
//! network from that descriptor's topology, binding native handlers by
//! the compiled `handler_name` the way an embedding host would.

use std::collections::HashMap;

use mycelial::runtime::{registry::StateValue, Emission};
use mycelial::{compile, DispatchEntry, FrequencyId, Name, Network, NetworkConfig};

const SOURCE: &str = r#"
    frequency ping { value: int }
    agent sender {
        on cycle {
            emit ping { value: 1 }
        }
    }
    agent receiver {
        state { total: int }
        on ping {
            state.total = state.total + payload.value
        }
    }
    socket sender.ping -> receiver
"#;

#[test]
fn compiled_topology_wires_up_into_a_running_network() {
    let descriptor = compile(SOURCE).unwrap();
    assert_eq!(descriptor.agents.len(), 2);
    assert_eq!(descriptor.sockets.len(), 1);

    let mut net = Network::new(NetworkConfig::testing());
    let mut agent_ids = HashMap::new();
    for agent in &descriptor.agents {
        let id = net.spawn(Name::try_new(agent.name.clone()).unwrap()).unwrap();
        agent_ids.insert(agent.id, id);
    }
    for socket in &descriptor.sockets {
        net.socket(
            agent_ids[&socket.source_agent],
            FrequencyId::try_new(socket.frequency).unwrap(),
            agent_ids[&socket.destination_agent],
        )
        .unwrap();
    }

    let ping = FrequencyId::try_new(1).unwrap();
    for entry in &descriptor.entries {
        let agent = agent_ids[&entry.agent];
        if entry.handler_name == "sender.cycle" {
            net.on_cycle(
                agent,
                DispatchEntry::unconditional(Box::new(move |_record, _signal, emitted| {
                    emitted.push(Emission {
                        frequency: ping,
                        payload: 1i64.to_le_bytes().to_vec(),
                    });
                    Ok(())
                })),
            );
        } else if entry.handler_name == "receiver.ping" {
            net.on(
                agent,
                ping,
                DispatchEntry::unconditional(Box::new(|record, signal, _emitted| {
                    let incoming = signal
                        .payload()
                        .map(|p| i64::from_le_bytes(p[..8].try_into().unwrap()))
                        .unwrap_or(0);
                    let total = match record.state("total") {
                        Some(StateValue::Int(n)) => *n,
                        _ => 0,
                    };
                    record.set_state("total", StateValue::Int(total + incoming));
                    Ok(())
                })),
            );
        }
    }

    net.run_cycles(4);
    let receiver = agent_ids[&descriptor.agents.iter().find(|a| a.name == "receiver").unwrap().id];
    assert!(matches!(
        net.agent_state(receiver, "total"),
        Some(StateValue::Int(n)) if *n >= 1
    ));
}
