//! Compiler front-end: source text to a compiled [`NetworkDescriptor`].
//!
//! `lex` -> `parse` -> `semantic::check` -> `lowering::lower`, each
//! stage a plain function over the previous stage's output rather than
//! threading a single mutable "compiler state" object through.

pub mod ast;
pub mod descriptor;
pub mod lexer;
pub mod lowering;
pub mod parser;
pub mod semantic;

pub use ast::Program;
pub use descriptor::NetworkDescriptor;

use crate::error::CompileError;

/// Compiles Mycelial source text into a [`NetworkDescriptor`], running
/// every stage: lexing, parsing, semantic checking, and lowering.
///
/// # Errors
///
/// Returns [`CompileError::Syntax`] for a lexical or parse failure, or
/// [`CompileError::Semantic`] for the first of the semantic violations
/// found (see [`semantic::check`] to collect all of them at once).
pub fn compile(source: &str) -> Result<NetworkDescriptor, CompileError> {
    let tokens = lexer::lex(source)?;
    let program = parser::parse(tokens)?;
    semantic::check(&program).map_err(|mut errors| {
        CompileError::Semantic(errors.remove(0))
    })?;
    lowering::lower(&program).map_err(CompileError::Semantic)
}
