//! Semantic checking: five static rules run over a parsed [`Program`]
//! before lowering — undeclared frequency or agent references, a
//! socket whose declared frequency doesn't match, a state or payload
//! access to an undeclared field or one used at an incompatible type,
//! and a duplicate handler binding.

use std::collections::{HashMap, HashSet};

use crate::compiler::ast::{BinOp, Expr, FieldDecl, FieldType, FrequencyDecl, Literal, Program, Stmt};
use crate::error::SemanticError;

fn collect_expr_refs(expr: &Expr, state_refs: &mut Vec<String>, payload_refs: &mut Vec<String>) {
    match expr {
        Expr::Literal(_) => {}
        Expr::State(field) => state_refs.push(field.clone()),
        Expr::Payload(field) => payload_refs.push(field.clone()),
        Expr::BinOp { lhs, rhs, .. } => {
            collect_expr_refs(lhs, state_refs, payload_refs);
            collect_expr_refs(rhs, state_refs, payload_refs);
        }
        Expr::Not(inner) => collect_expr_refs(inner, state_refs, payload_refs),
    }
}

fn field_names(fields: &[FieldDecl]) -> HashSet<&str> {
    fields.iter().map(|f| f.name.as_str()).collect()
}

fn field_types(fields: &[FieldDecl]) -> HashMap<&str, FieldType> {
    fields.iter().map(|f| (f.name.as_str(), f.ty)).collect()
}

/// Infers the type an expression evaluates to, given the declared types
/// of the state and payload fields it may reference.
///
/// Returns `None` if the expression refers to a field absent from
/// either map (already reported as an undeclared access elsewhere) or
/// combines operands whose types don't agree with the operator — a
/// type-incompatible expression has no type.
fn expr_type(
    expr: &Expr,
    state_types: &HashMap<&str, FieldType>,
    payload_types: &HashMap<&str, FieldType>,
) -> Option<FieldType> {
    match expr {
        Expr::Literal(Literal::Int(_)) => Some(FieldType::Int),
        Expr::Literal(Literal::Float(_)) => Some(FieldType::Float),
        Expr::Literal(Literal::Bool(_)) => Some(FieldType::Bool),
        Expr::Literal(Literal::Text(_)) => Some(FieldType::Text),
        Expr::State(field) => state_types.get(field.as_str()).copied(),
        Expr::Payload(field) => payload_types.get(field.as_str()).copied(),
        Expr::BinOp { op, lhs, rhs } => {
            let lhs_ty = expr_type(lhs, state_types, payload_types)?;
            let rhs_ty = expr_type(rhs, state_types, payload_types)?;
            match op {
                BinOp::And | BinOp::Or => {
                    (lhs_ty == FieldType::Bool && rhs_ty == FieldType::Bool).then_some(FieldType::Bool)
                }
                BinOp::Add | BinOp::Sub => {
                    (lhs_ty == rhs_ty && matches!(lhs_ty, FieldType::Int | FieldType::Float))
                        .then_some(lhs_ty)
                }
                BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => {
                    (lhs_ty == rhs_ty && matches!(lhs_ty, FieldType::Int | FieldType::Float))
                        .then_some(FieldType::Bool)
                }
                BinOp::Eq | BinOp::NotEq => (lhs_ty == rhs_ty).then_some(FieldType::Bool),
            }
        }
        Expr::Not(inner) => {
            (expr_type(inner, state_types, payload_types)? == FieldType::Bool).then_some(FieldType::Bool)
        }
    }
}

/// Runs every semantic check over `program`, accumulating every
/// violation found rather than stopping at the first.
///
/// # Errors
///
/// Returns every [`SemanticError`] the program violates, in source
/// order. Empty iff the program is well-formed.
pub fn check(program: &Program) -> Result<(), Vec<SemanticError>> {
    let mut errors = Vec::new();

    let frequencies: HashMap<&str, &FrequencyDecl> = program
        .frequencies
        .iter()
        .map(|f| (f.name.as_str(), f))
        .collect();
    let agents: HashMap<&str, usize> = program
        .agents
        .iter()
        .enumerate()
        .map(|(i, a)| (a.name.as_str(), i))
        .collect();

    for agent in &program.agents {
        let state_fields = field_names(&agent.state);
        let state_types = field_types(&agent.state);
        let mut seen_handlers: HashSet<&str> = HashSet::new();

        for handler in &agent.handlers {
            if handler.frequency != "cycle" {
                if seen_handlers.contains(handler.frequency.as_str()) {
                    errors.push(SemanticError::DuplicateHandler {
                        span: handler.span,
                        agent: agent.name.clone(),
                        frequency: handler.frequency.clone(),
                    });
                }
                seen_handlers.insert(handler.frequency.as_str());

                if !frequencies.contains_key(handler.frequency.as_str()) {
                    errors.push(SemanticError::UndeclaredFrequency {
                        span: handler.span,
                        name: handler.frequency.clone(),
                    });
                }
            }

            let payload_fields = frequencies
                .get(handler.frequency.as_str())
                .map(|f| field_names(&f.fields))
                .unwrap_or_default();
            let payload_types = frequencies
                .get(handler.frequency.as_str())
                .map(|f| field_types(&f.fields))
                .unwrap_or_default();

            let mut state_refs = Vec::new();
            let mut payload_refs = Vec::new();
            if let Some(guard) = &handler.guard {
                collect_expr_refs(guard, &mut state_refs, &mut payload_refs);

                let guard_fields_known = state_refs.iter().all(|f| state_fields.contains(f.as_str()))
                    && payload_refs.iter().all(|f| payload_fields.contains(f.as_str()));
                if guard_fields_known && expr_type(guard, &state_types, &payload_types) != Some(FieldType::Bool) {
                    if let Some(field) = payload_refs.first() {
                        errors.push(SemanticError::InvalidPayloadAccess {
                            span: handler.span,
                            field: field.clone(),
                            reason: "guard must evaluate to bool".to_string(),
                        });
                    } else if let Some(field) = state_refs.first() {
                        errors.push(SemanticError::InvalidStateAccess {
                            span: handler.span,
                            agent: agent.name.clone(),
                            field: field.clone(),
                            reason: "guard must evaluate to bool".to_string(),
                        });
                    }
                }
            }
            for stmt in &handler.body {
                match stmt {
                    Stmt::Assign { field, value, span } => {
                        if !state_fields.contains(field.as_str()) {
                            errors.push(SemanticError::InvalidStateAccess {
                                span: *span,
                                agent: agent.name.clone(),
                                field: field.clone(),
                                reason: "no such state field".to_string(),
                            });
                        } else if let Some(&declared) = state_types.get(field.as_str()) {
                            let value_fields_known = {
                                let mut vs = Vec::new();
                                let mut vp = Vec::new();
                                collect_expr_refs(value, &mut vs, &mut vp);
                                vs.iter().all(|f| state_fields.contains(f.as_str()))
                                    && vp.iter().all(|f| payload_fields.contains(f.as_str()))
                            };
                            if value_fields_known {
                                match expr_type(value, &state_types, &payload_types) {
                                    Some(actual) if actual == declared => {}
                                    found => {
                                        errors.push(SemanticError::InvalidStateAccess {
                                            span: *span,
                                            agent: agent.name.clone(),
                                            field: field.clone(),
                                            reason: format!(
                                                "expected {declared:?}, found {found:?}"
                                            ),
                                        });
                                    }
                                }
                            }
                        }
                        collect_expr_refs(value, &mut state_refs, &mut payload_refs);
                    }
                    Stmt::Emit {
                        frequency, fields, ..
                    } => {
                        if !frequencies.contains_key(frequency.as_str()) {
                            errors.push(SemanticError::UndeclaredFrequency {
                                span: handler.span,
                                name: frequency.clone(),
                            });
                        }
                        let target_types = frequencies
                            .get(frequency.as_str())
                            .map(|f| field_types(&f.fields))
                            .unwrap_or_default();
                        for (field_name, value) in fields {
                            let mut vs = Vec::new();
                            let mut vp = Vec::new();
                            collect_expr_refs(value, &mut vs, &mut vp);
                            let value_fields_known = vs.iter().all(|f| state_fields.contains(f.as_str()))
                                && vp.iter().all(|f| payload_fields.contains(f.as_str()));
                            if value_fields_known {
                                if let Some(&declared) = target_types.get(field_name.as_str()) {
                                    match expr_type(value, &state_types, &payload_types) {
                                        Some(actual) if actual == declared => {}
                                        found => {
                                            errors.push(SemanticError::InvalidPayloadAccess {
                                                span: handler.span,
                                                field: field_name.clone(),
                                                reason: format!(
                                                    "expected {declared:?}, found {found:?}"
                                                ),
                                            });
                                        }
                                    }
                                }
                            }
                            collect_expr_refs(value, &mut state_refs, &mut payload_refs);
                        }
                    }
                }
            }

            for field in &state_refs {
                if !state_fields.contains(field.as_str()) {
                    errors.push(SemanticError::InvalidStateAccess {
                        span: handler.span,
                        agent: agent.name.clone(),
                        field: field.clone(),
                        reason: "no such state field".to_string(),
                    });
                }
            }
            for field in &payload_refs {
                if handler.frequency == "cycle" || !payload_fields.contains(field.as_str()) {
                    errors.push(SemanticError::InvalidPayloadAccess {
                        span: handler.span,
                        field: field.clone(),
                        reason: format!(
                            "frequency `{}` declares no such payload field",
                            handler.frequency
                        ),
                    });
                }
            }
        }
    }

    for socket in &program.sockets {
        if !agents.contains_key(socket.source.as_str()) {
            errors.push(SemanticError::UndeclaredAgent {
                span: socket.span,
                name: socket.source.clone(),
            });
        }
        if !agents.contains_key(socket.destination.as_str()) {
            errors.push(SemanticError::UndeclaredAgent {
                span: socket.span,
                name: socket.destination.clone(),
            });
        }
        if !frequencies.contains_key(socket.frequency.as_str()) {
            errors.push(SemanticError::UndeclaredFrequency {
                span: socket.span,
                name: socket.frequency.clone(),
            });
        }

        if let Some(&idx) = agents.get(socket.destination.as_str()) {
            let destination = &program.agents[idx];
            let has_handler = destination
                .handlers
                .iter()
                .any(|h| h.frequency == socket.frequency);
            if !has_handler {
                errors.push(SemanticError::SocketFrequencyMismatch {
                    span: socket.span,
                    agent: socket.destination.clone(),
                    frequency: socket.frequency.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
