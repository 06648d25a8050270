//! A tally agent flips to "decided" only once enough votes accumulate,
//! exercising a guard that reads accumulated state rather than just the
//! incoming payload.

use mycelial::runtime::registry::StateValue;
use mycelial::{DispatchEntry, Emission, FrequencyId, Name, Network, NetworkConfig};

const THRESHOLD: i64 = 3;

#[test_log::test]
fn tally_decides_once_votes_reach_the_threshold() {
    let mut net = Network::new(NetworkConfig::testing());
    let tally = net.spawn(Name::try_new("tally").unwrap()).unwrap();
    let voters: Vec<_> = ["a", "b", "c", "d", "e"]
        .iter()
        .map(|name| net.spawn(Name::try_new(*name).unwrap()).unwrap())
        .collect();

    let vote = FrequencyId::try_new(1).unwrap();
    for &voter in &voters {
        net.socket(voter, vote, tally).unwrap();
        net.on_cycle(
            voter,
            DispatchEntry::unconditional(Box::new(move |_record, _signal, emitted| {
                emitted.push(Emission {
                    frequency: vote,
                    payload: Vec::new(),
                });
                Ok(())
            })),
        );
    }

    net.on(
        tally,
        vote,
        DispatchEntry::unconditional(Box::new(|record, _signal, _emitted| {
            let votes = match record.state("votes") {
                Some(StateValue::Int(n)) => *n,
                _ => 0,
            };
            let votes = votes + 1;
            record.set_state("votes", StateValue::Int(votes));
            if votes >= THRESHOLD {
                record.set_state("decided", StateValue::Bool(true));
            }
            Ok(())
        })),
    );

    // All five voters emit every cycle, but the tally only ever pulls one
    // queued vote off its inbox per cycle — fairness caps each agent to one
    // signal per cycle, so the backlog outpaces the drain and the threshold
    // is crossed on the cycle count, not the vote count: cycle 0 queues the
    // first votes, cycles 1-3 each drain exactly one, crossing THRESHOLD.
    net.run_cycles(4);

    assert_eq!(net.agent_state(tally, "decided"), Some(&StateValue::Bool(true)));
    assert!(matches!(
        net.agent_state(tally, "votes"),
        Some(StateValue::Int(n)) if *n >= THRESHOLD
    ));
}
