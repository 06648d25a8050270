//! Abstract syntax tree for Mycelial source text.

use crate::error::SourceSpan;

/// A scalar literal appearing in source text.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// An integer literal.
    Int(i64),
    /// A floating-point literal.
    Float(f64),
    /// A boolean literal.
    Bool(bool),
    /// A quoted string literal.
    Text(String),
}

/// A declared field type for agent state and frequency payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// `int`
    Int,
    /// `float`
    Float,
    /// `bool`
    Bool,
    /// `text`
    Text,
}

/// One named, typed field in a `state` or `frequency` block.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    /// The field's name.
    pub name: String,
    /// The field's declared type.
    pub ty: FieldType,
    /// Where this field was declared.
    pub span: SourceSpan,
}

/// A `frequency NAME { ... }` declaration: a named message shape.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyDecl {
    /// The frequency's name.
    pub name: String,
    /// The payload fields it carries.
    pub fields: Vec<FieldDecl>,
    /// Where this declaration occurs.
    pub span: SourceSpan,
}

/// A binary comparison or boolean operator in a guard or handler body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `and`
    And,
    /// `or`
    Or,
    /// `+`
    Add,
    /// `-`
    Sub,
}

/// An expression usable in a guard condition or a handler body.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value.
    Literal(Literal),
    /// A reference to `state.FIELD`.
    State(String),
    /// A reference to `payload.FIELD`.
    Payload(String),
    /// A binary operation.
    BinOp {
        /// The operator.
        op: BinOp,
        /// The left operand.
        lhs: Box<Expr>,
        /// The right operand.
        rhs: Box<Expr>,
    },
    /// Logical negation.
    Not(Box<Expr>),
}

/// One statement in a handler body.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `state.FIELD = EXPR`
    Assign {
        /// The state field assigned.
        field: String,
        /// The value expression.
        value: Expr,
        /// Where this statement occurs.
        span: SourceSpan,
    },
    /// `emit FREQUENCY { field: EXPR, ... }`
    Emit {
        /// The frequency emitted.
        frequency: String,
        /// Field initializers for the emitted payload.
        fields: Vec<(String, Expr)>,
        /// Where this statement occurs.
        span: SourceSpan,
    },
}

/// `on FREQUENCY [if GUARD] { STATEMENTS }` inside an agent body.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerDecl {
    /// The frequency this handler reacts to.
    pub frequency: String,
    /// An optional guard expression; `None` means unconditional.
    pub guard: Option<Expr>,
    /// The handler's statement body.
    pub body: Vec<Stmt>,
    /// Where this handler was declared.
    pub span: SourceSpan,
}

/// `agent NAME { state { ... } on ... { ... } ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct AgentDecl {
    /// The agent's name.
    pub name: String,
    /// Declared state fields.
    pub state: Vec<FieldDecl>,
    /// Bound handlers, including any `on cycle` handler.
    pub handlers: Vec<HandlerDecl>,
    /// Where this declaration occurs.
    pub span: SourceSpan,
}

/// `socket SOURCE.FREQUENCY -> DESTINATION`
#[derive(Debug, Clone, PartialEq)]
pub struct SocketDecl {
    /// The emitting agent.
    pub source: String,
    /// The frequency routed.
    pub frequency: String,
    /// The receiving agent.
    pub destination: String,
    /// Where this declaration occurs.
    pub span: SourceSpan,
}

/// A complete parsed source file: a flat list of top-level
/// declarations in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    /// Declared frequencies.
    pub frequencies: Vec<FrequencyDecl>,
    /// Declared agents.
    pub agents: Vec<AgentDecl>,
    /// Declared sockets.
    pub sockets: Vec<SocketDecl>,
}
