//! Lowers a semantically-checked [`Program`] into a [`NetworkDescriptor`],
//! the compiler's final stage.
//!
//! Assumes [`crate::compiler::semantic::check`] has already passed:
//! name resolution failures here are reported as the same
//! [`SemanticError`] variants semantic checking uses, since by this
//! stage they indicate the checker missed something rather than a
//! fresh class of error.

use std::collections::HashMap;

use crate::compiler::ast::Program;
use crate::compiler::descriptor::{
    AgentDescriptor, EntryDescriptor, FrequencyDescriptor, NetworkDescriptor, SocketDescriptor,
};
use crate::error::SemanticError;

const ON_CYCLE: &str = "cycle";

/// Lowers `program` into a [`NetworkDescriptor`], assigning each
/// frequency and agent a stable numeric id in declaration order.
///
/// # Errors
///
/// Returns [`SemanticError`] if a name used in `program` doesn't
/// resolve — this should not happen for a program that already passed
/// [`crate::compiler::semantic::check`].
pub fn lower(program: &Program) -> Result<NetworkDescriptor, SemanticError> {
    let frequency_ids: HashMap<&str, u32> = program
        .frequencies
        .iter()
        .enumerate()
        .map(|(i, f)| (f.name.as_str(), (i + 1) as u32))
        .collect();
    let agent_ids: HashMap<&str, u32> = program
        .agents
        .iter()
        .enumerate()
        .map(|(i, a)| (a.name.as_str(), (i + 1) as u32))
        .collect();

    let frequencies = program
        .frequencies
        .iter()
        .map(|f| FrequencyDescriptor {
            id: frequency_ids[f.name.as_str()],
            name: f.name.clone(),
            fields: f.fields.iter().map(|field| (field.name.clone(), field.ty)).collect(),
        })
        .collect();

    let agents = program
        .agents
        .iter()
        .map(|a| AgentDescriptor {
            id: agent_ids[a.name.as_str()],
            name: a.name.clone(),
            state: a.state.iter().map(|field| (field.name.clone(), field.ty)).collect(),
        })
        .collect();

    let mut sockets = Vec::with_capacity(program.sockets.len());
    for socket in &program.sockets {
        let source_agent = *agent_ids.get(socket.source.as_str()).ok_or_else(|| {
            SemanticError::UndeclaredAgent {
                span: socket.span,
                name: socket.source.clone(),
            }
        })?;
        let destination_agent = *agent_ids.get(socket.destination.as_str()).ok_or_else(|| {
            SemanticError::UndeclaredAgent {
                span: socket.span,
                name: socket.destination.clone(),
            }
        })?;
        let frequency = *frequency_ids.get(socket.frequency.as_str()).ok_or_else(|| {
            SemanticError::UndeclaredFrequency {
                span: socket.span,
                name: socket.frequency.clone(),
            }
        })?;
        sockets.push(SocketDescriptor {
            source_agent,
            frequency,
            destination_agent,
        });
    }

    let mut entries = Vec::new();
    for agent in &program.agents {
        let agent_id = agent_ids[agent.name.as_str()];
        for handler in &agent.handlers {
            let frequency = if handler.frequency == ON_CYCLE {
                // The `on cycle` trigger has no declared frequency; the
                // runtime binds it through `Network::on_cycle` rather
                // than through a routed frequency id, so it carries a
                // sentinel of 0 here (never a real frequency, which is
                // always >= 1).
                0
            } else {
                *frequency_ids.get(handler.frequency.as_str()).ok_or_else(|| {
                    SemanticError::UndeclaredFrequency {
                        span: handler.span,
                        name: handler.frequency.clone(),
                    }
                })?
            };
            entries.push(EntryDescriptor {
                agent: agent_id,
                frequency,
                has_guard: handler.guard.is_some(),
                handler_name: format!("{}.{}", agent.name, handler.frequency),
            });
        }
    }

    Ok(NetworkDescriptor {
        frequencies,
        agents,
        sockets,
        entries,
    })
}
