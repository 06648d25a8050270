//! Error taxonomy for Mycelial
//!
//! Compile-time errors (lexical/syntactic, semantic) are one family,
//! runtime errors are another, and a crate-level error unifies both at
//! the CLI and host-API boundary. Each subsystem gets its own
//! `thiserror` enum rather than one flat one, so a `match` at a call
//! site only has to consider the variants that subsystem can actually
//! produce.

use thiserror::Error;

use crate::domain::AgentId;

/// A location in source text, attached to compile-time errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SourceSpan {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
    /// Length of the offending span, in characters.
    pub len: u32,
}

impl SourceSpan {
    /// Builds a span from a line/column position and length.
    #[must_use]
    pub fn new(line: u32, column: u32, len: u32) -> Self {
        Self { line, column, len }
    }
}

impl std::fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Errors raised while lexing or parsing source text.
#[derive(Debug, Error)]
pub enum SyntaxError {
    /// An unrecognized character or token sequence.
    #[error("{span}: unexpected token {found:?}")]
    UnexpectedToken {
        /// Where the bad token starts.
        span: SourceSpan,
        /// What was actually found.
        found: String,
    },

    /// Input ended while a construct was still open.
    #[error("{span}: unexpected end of input, expected {expected}")]
    UnexpectedEof {
        /// Where input ran out.
        span: SourceSpan,
        /// A description of what was expected.
        expected: String,
    },

    /// A token was expected but something else was found.
    #[error("{span}: expected {expected}, found {found:?}")]
    Expected {
        /// Where the mismatch occurred.
        span: SourceSpan,
        /// A description of what was expected.
        expected: String,
        /// What was actually found.
        found: String,
    },
}

/// Errors raised during semantic checking.
#[derive(Debug, Error)]
pub enum SemanticError {
    /// A socket, rule trigger, or emit referenced an undeclared frequency.
    #[error("{span}: undeclared frequency `{name}`")]
    UndeclaredFrequency {
        /// Where the reference occurred.
        span: SourceSpan,
        /// The frequency name referenced.
        name: String,
    },

    /// A socket referenced an undeclared hyphal agent.
    #[error("{span}: undeclared agent `{name}`")]
    UndeclaredAgent {
        /// Where the reference occurred.
        span: SourceSpan,
        /// The agent name referenced.
        name: String,
    },

    /// A socket's frequency doesn't match the destination's handler set
    /// or the source's emit capabilities.
    #[error("{span}: `{agent}` has no handler for frequency `{frequency}`")]
    SocketFrequencyMismatch {
        /// Where the socket was declared.
        span: SourceSpan,
        /// The agent missing the binding.
        agent: String,
        /// The frequency in question.
        frequency: String,
    },

    /// A handler referenced a state field that either doesn't exist or
    /// has an incompatible type.
    #[error("{span}: state field `{field}` on `{agent}`: {reason}")]
    InvalidStateAccess {
        /// Where the access occurred.
        span: SourceSpan,
        /// The agent whose state was accessed.
        agent: String,
        /// The field name accessed.
        field: String,
        /// Why the access is invalid.
        reason: String,
    },

    /// A handler body referenced a payload field with an incompatible
    /// type, or one that doesn't exist on the frequency's schema.
    #[error("{span}: payload field `{field}`: {reason}")]
    InvalidPayloadAccess {
        /// Where the access occurred.
        span: SourceSpan,
        /// The payload field name accessed.
        field: String,
        /// Why the access is invalid.
        reason: String,
    },

    /// Two handlers bind the same `(agent, frequency)` pair.
    #[error("{span}: duplicate handler for `{agent}` on frequency `{frequency}`")]
    DuplicateHandler {
        /// Where the second binding was declared.
        span: SourceSpan,
        /// The agent with the duplicate binding.
        agent: String,
        /// The frequency bound twice.
        frequency: String,
    },
}

/// Errors raised while compiling source text to a `NetworkDescriptor`.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Lexical or syntactic failure.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// Semantic-checking failure.
    #[error(transparent)]
    Semantic(#[from] SemanticError),
}

/// Errors raised by the signal runtime at steady state.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum RuntimeError {
    /// The arena's free lists and bump region are both exhausted.
    #[error("arena exhausted: requested {requested} bytes")]
    OutOfMemory {
        /// The allocation size that could not be satisfied.
        requested: usize,
    },

    /// A signal payload exceeds [`crate::domain::MAX_PAYLOAD`].
    #[error("payload of {size} bytes exceeds the {} byte limit", crate::domain::MAX_PAYLOAD)]
    PayloadTooLarge {
        /// The requested payload size.
        size: usize,
    },

    /// Attempted to register an agent id that's already registered.
    #[error("agent {0} is already registered")]
    AgentExists(AgentId),

    /// Looked up an agent id or name that isn't registered.
    #[error("agent not found: {0}")]
    AgentNotFound(String),

    /// The registry has no room for another agent.
    #[error("registry capacity exceeded (max {max})")]
    CapacityExceeded {
        /// The registry's fixed capacity.
        max: usize,
    },

    /// The routing table's open-addressing probe wrapped without
    /// finding a free or matching slot.
    #[error("routing table is full (capacity {capacity})")]
    TableFull {
        /// The table's capacity at the time of the failed insert.
        capacity: usize,
    },
}

/// Host/file-I/O failures, surfaced as a typed kind rather than a raw
/// `std::io::Error` so callers can match without downcasting.
#[derive(Debug, Error)]
pub enum IoError {
    /// Reading source or a compiled descriptor failed.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The path that could not be read.
        path: String,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Writing a compiled descriptor or output artifact failed.
    #[error("failed to write {path}: {source}")]
    Write {
        /// The path that could not be written.
        path: String,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A compiled descriptor's header or section layout was malformed.
    #[error("malformed descriptor: {0}")]
    MalformedDescriptor(String),
}

/// Crate-level error unifying every subsystem at the CLI and host-API
/// boundary.
#[derive(Debug, Error)]
pub enum MycelialError {
    /// A compile-time failure.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// A runtime failure.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// A host-boundary I/O failure.
    #[error(transparent)]
    Io(#[from] IoError),
}

impl From<SyntaxError> for MycelialError {
    fn from(err: SyntaxError) -> Self {
        Self::Compile(CompileError::Syntax(err))
    }
}

impl From<SemanticError> for MycelialError {
    fn from(err: SemanticError) -> Self {
        Self::Compile(CompileError::Semantic(err))
    }
}
