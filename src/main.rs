//! Runtime host: loads a compiled network descriptor and drives it
//! through tidal cycles, printing a summary report per cycle.
//!
//! A descriptor only carries topology and handler *names* — see the
//! module doc on [`mycelial::runtime::dispatch`] for why. This binary
//! has no way to know what a given handler actually does, so it binds
//! a harmless no-op to every entry and logs a warning for each. A real
//! embedder links against this crate directly and calls
//! [`mycelial::Network::on`] with its own native closures, the way
//! this crate's own integration tests do.

use std::path::PathBuf;

use clap::Parser;
use mycelial::compiler::descriptor::NetworkDescriptor;
use mycelial::domain::Name;
use mycelial::runtime::{DispatchEntry, Network};
use mycelial::{init_tracing, NetworkConfig};

/// Loads a compiled Mycelial descriptor and runs it to completion.
#[derive(Parser, Debug)]
#[command(name = "mycelial", version, about)]
struct Cli {
    /// Path to a compiled descriptor produced by `mycelialc`.
    descriptor: PathBuf,

    /// Maximum number of cycles to run before stopping unconditionally.
    #[arg(long, default_value_t = 10_000)]
    max_cycles: u64,

    /// Use production-scale tables instead of the development preset.
    #[arg(long)]
    production: bool,
}

fn main() -> std::process::ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let bytes = match std::fs::read(&cli.descriptor) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("failed to read {}: {err}", cli.descriptor.display());
            return std::process::ExitCode::from(2);
        }
    };

    let descriptor = match NetworkDescriptor::decode(&bytes) {
        Ok(d) => d,
        Err(err) => {
            eprintln!("malformed descriptor: {err}");
            return std::process::ExitCode::from(3);
        }
    };

    let config = if cli.production {
        NetworkConfig::production()
    } else {
        NetworkConfig::development()
    };

    let mut network = Network::new(config);
    let mut agent_ids = std::collections::HashMap::new();
    for agent in &descriptor.agents {
        let name = match Name::try_new(agent.name.clone()) {
            Ok(name) => name,
            Err(err) => {
                eprintln!("invalid agent name `{}`: {err}", agent.name);
                return std::process::ExitCode::from(4);
            }
        };
        match network.spawn(name) {
            Ok(id) => {
                agent_ids.insert(agent.id, id);
            }
            Err(err) => {
                eprintln!("failed to register agent `{}`: {err}", agent.name);
                return std::process::ExitCode::from(4);
            }
        }
    }

    for socket in &descriptor.sockets {
        let (Some(&source), Some(&destination)) = (
            agent_ids.get(&socket.source_agent),
            agent_ids.get(&socket.destination_agent),
        ) else {
            continue;
        };
        let frequency = match mycelial::FrequencyId::try_new(socket.frequency) {
            Ok(f) => f,
            Err(_) => continue,
        };
        if let Err(err) = network.socket(source, frequency, destination) {
            eprintln!("failed to bind socket: {err}");
            return std::process::ExitCode::from(4);
        }
    }

    for entry in &descriptor.entries {
        let Some(&agent) = agent_ids.get(&entry.agent) else {
            continue;
        };
        let handler_name = entry.handler_name.clone();
        let noop = DispatchEntry::unconditional(Box::new(move |_record, _signal, _emitted| {
            tracing::warn!(handler = %handler_name, "no native handler bound; running as a no-op");
            Ok(())
        }));
        if entry.frequency == 0 {
            network.on_cycle(agent, noop);
        } else if let Ok(frequency) = mycelial::FrequencyId::try_new(entry.frequency) {
            network.on(agent, frequency, noop);
        }
    }

    let reports = network.run_cycles(cli.max_cycles);
    let total_processed: usize = reports.iter().map(|r| r.signals_processed).sum();
    let total_failures: usize = reports.iter().map(|r| r.handler_failures).sum();
    let total_dropped: usize = reports.iter().map(|r| r.dropped_deliveries).sum();

    println!(
        "ran {} cycles: {total_processed} signals processed, {total_failures} handler failures, {total_dropped} deliveries dropped",
        reports.len(),
    );

    std::process::ExitCode::SUCCESS
}
