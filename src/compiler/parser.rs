//! Recursive-descent parser: token stream to [`Program`].

use crate::compiler::ast::{
    AgentDecl, BinOp, Expr, FieldDecl, FieldType, FrequencyDecl, HandlerDecl, Literal, Program,
    SocketDecl, Stmt,
};
use crate::compiler::lexer::{Token, TokenKind};
use crate::error::{SourceSpan, SyntaxError};

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn span(&self) -> SourceSpan {
        self.peek().span
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn at_ident(&self, text: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Ident(s) if s == text)
    }

    fn expect_ident(&mut self, text: &str) -> Result<(), SyntaxError> {
        if self.at_ident(text) {
            self.bump();
            Ok(())
        } else {
            Err(self.expected(text))
        }
    }

    fn expected(&self, what: &str) -> SyntaxError {
        SyntaxError::Expected {
            span: self.span(),
            expected: what.to_string(),
            found: format!("{:?}", self.peek().kind),
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), SyntaxError> {
        if &self.peek().kind == kind {
            self.bump();
            Ok(())
        } else {
            Err(self.expected(&format!("{kind:?}")))
        }
    }

    fn take_ident(&mut self) -> Result<(String, SourceSpan), SyntaxError> {
        let span = self.span();
        match self.bump().kind {
            TokenKind::Ident(name) => Ok((name, span)),
            other => Err(SyntaxError::Expected {
                span,
                expected: "identifier".to_string(),
                found: format!("{other:?}"),
            }),
        }
    }

    fn parse_type(&mut self) -> Result<FieldType, SyntaxError> {
        let (name, span) = self.take_ident()?;
        match name.as_str() {
            "int" => Ok(FieldType::Int),
            "float" => Ok(FieldType::Float),
            "bool" => Ok(FieldType::Bool),
            "text" => Ok(FieldType::Text),
            other => Err(SyntaxError::Expected {
                span,
                expected: "a type (int, float, bool, text)".to_string(),
                found: other.to_string(),
            }),
        }
    }

    fn parse_field_list(&mut self) -> Result<Vec<FieldDecl>, SyntaxError> {
        self.expect(&TokenKind::LBrace)?;
        let mut fields = Vec::new();
        while self.peek().kind != TokenKind::RBrace {
            let (name, span) = self.take_ident()?;
            self.expect(&TokenKind::Colon)?;
            let ty = self.parse_type()?;
            fields.push(FieldDecl { name, ty, span });
            if self.peek().kind == TokenKind::Comma {
                self.bump();
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(fields)
    }

    fn parse_frequency(&mut self) -> Result<FrequencyDecl, SyntaxError> {
        let span = self.span();
        self.expect_ident("frequency")?;
        let (name, _) = self.take_ident()?;
        let fields = self.parse_field_list()?;
        Ok(FrequencyDecl { name, fields, span })
    }

    fn parse_socket(&mut self) -> Result<SocketDecl, SyntaxError> {
        let span = self.span();
        self.expect_ident("socket")?;
        let (source, _) = self.take_ident()?;
        self.expect(&TokenKind::Dot)?;
        let (frequency, _) = self.take_ident()?;
        self.expect(&TokenKind::Arrow)?;
        let (destination, _) = self.take_ident()?;
        Ok(SocketDecl {
            source,
            frequency,
            destination,
            span,
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let span = self.span();
        match self.peek().kind.clone() {
            TokenKind::Int(n) => {
                self.bump();
                Ok(Expr::Literal(Literal::Int(n)))
            }
            TokenKind::Float(n) => {
                self.bump();
                Ok(Expr::Literal(Literal::Float(n)))
            }
            TokenKind::Text(s) => {
                self.bump();
                Ok(Expr::Literal(Literal::Text(s)))
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Ident(name) => match name.as_str() {
                "true" => {
                    self.bump();
                    Ok(Expr::Literal(Literal::Bool(true)))
                }
                "false" => {
                    self.bump();
                    Ok(Expr::Literal(Literal::Bool(false)))
                }
                "not" => {
                    self.bump();
                    Ok(Expr::Not(Box::new(self.parse_unary()?)))
                }
                "state" => {
                    self.bump();
                    self.expect(&TokenKind::Dot)?;
                    let (field, _) = self.take_ident()?;
                    Ok(Expr::State(field))
                }
                "payload" => {
                    self.bump();
                    self.expect(&TokenKind::Dot)?;
                    let (field, _) = self.take_ident()?;
                    Ok(Expr::Payload(field))
                }
                _ => Err(SyntaxError::Expected {
                    span,
                    expected: "an expression".to_string(),
                    found: name,
                }),
            },
            other => Err(SyntaxError::Expected {
                span,
                expected: "an expression".to_string(),
                found: format!("{other:?}"),
            }),
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_primary()
    }

    fn parse_additive(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_unary()?;
            lhs = Expr::BinOp {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> Result<Expr, SyntaxError> {
        let lhs = self.parse_additive()?;
        let op = match self.peek().kind {
            TokenKind::EqEq => BinOp::Eq,
            TokenKind::NotEq => BinOp::NotEq,
            TokenKind::Lt => BinOp::Lt,
            TokenKind::LtEq => BinOp::LtEq,
            TokenKind::Gt => BinOp::Gt,
            TokenKind::GtEq => BinOp::GtEq,
            _ => return Ok(lhs),
        };
        self.bump();
        let rhs = self.parse_additive()?;
        Ok(Expr::BinOp {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn parse_and(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_comparison()?;
        while self.at_ident("and") {
            self.bump();
            let rhs = self.parse_comparison()?;
            lhs = Expr::BinOp {
                op: BinOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_and()?;
        while self.at_ident("or") {
            self.bump();
            let rhs = self.parse_and()?;
            lhs = Expr::BinOp {
                op: BinOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let span = self.span();
        if self.at_ident("state") {
            self.bump();
            self.expect(&TokenKind::Dot)?;
            let (field, _) = self.take_ident()?;
            self.expect(&TokenKind::Eq)?;
            let value = self.parse_expr()?;
            Ok(Stmt::Assign { field, value, span })
        } else if self.at_ident("emit") {
            self.bump();
            let (frequency, _) = self.take_ident()?;
            let mut fields = Vec::new();
            if self.peek().kind == TokenKind::LBrace {
                self.bump();
                while self.peek().kind != TokenKind::RBrace {
                    let (name, _) = self.take_ident()?;
                    self.expect(&TokenKind::Colon)?;
                    let value = self.parse_expr()?;
                    fields.push((name, value));
                    if self.peek().kind == TokenKind::Comma {
                        self.bump();
                    }
                }
                self.expect(&TokenKind::RBrace)?;
            }
            Ok(Stmt::Emit {
                frequency,
                fields,
                span,
            })
        } else {
            Err(self.expected("a statement (state.FIELD = ... or emit FREQUENCY)"))
        }
    }

    fn parse_handler(&mut self) -> Result<HandlerDecl, SyntaxError> {
        let span = self.span();
        self.expect_ident("on")?;
        let (frequency, _) = self.take_ident()?;
        let guard = if self.at_ident("if") {
            self.bump();
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(&TokenKind::LBrace)?;
        let mut body = Vec::new();
        while self.peek().kind != TokenKind::RBrace {
            body.push(self.parse_stmt()?);
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(HandlerDecl {
            frequency,
            guard,
            body,
            span,
        })
    }

    fn parse_agent(&mut self) -> Result<AgentDecl, SyntaxError> {
        let span = self.span();
        self.expect_ident("agent")?;
        let (name, _) = self.take_ident()?;
        self.expect(&TokenKind::LBrace)?;
        let mut state = Vec::new();
        let mut handlers = Vec::new();
        while self.peek().kind != TokenKind::RBrace {
            if self.at_ident("state") {
                self.bump();
                state = self.parse_field_list()?;
            } else if self.at_ident("on") {
                handlers.push(self.parse_handler()?);
            } else {
                return Err(self.expected("`state` or `on`"));
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(AgentDecl {
            name,
            state,
            handlers,
            span,
        })
    }

    fn parse_program(&mut self) -> Result<Program, SyntaxError> {
        let mut program = Program::default();
        while self.peek().kind != TokenKind::Eof {
            if self.at_ident("frequency") {
                program.frequencies.push(self.parse_frequency()?);
            } else if self.at_ident("agent") {
                program.agents.push(self.parse_agent()?);
            } else if self.at_ident("socket") {
                program.sockets.push(self.parse_socket()?);
            } else {
                return Err(self.expected("`frequency`, `agent`, or `socket`"));
            }
        }
        Ok(program)
    }
}

/// Parses a token stream produced by [`crate::compiler::lexer::lex`]
/// into a [`Program`].
///
/// # Errors
///
/// Returns [`SyntaxError`] on the first malformed construct.
pub fn parse(tokens: Vec<Token>) -> Result<Program, SyntaxError> {
    Parser::new(tokens).parse_program()
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::compiler::ast::{BinOp, Expr, FieldType, Literal};
    use crate::compiler::lexer::lex;

    #[test]
    fn parses_a_frequency_and_two_agents_with_a_socket() {
        let source = r#"
            frequency ping {
                value: int
            }
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
        let program = parse(lex(source).unwrap()).unwrap();
        assert_eq!(program.frequencies.len(), 1);
        assert_eq!(program.frequencies[0].fields[0].ty, FieldType::Int);
        assert_eq!(program.agents.len(), 2);
        assert_eq!(program.sockets.len(), 1);
        assert_eq!(program.sockets[0].source, "sender");
        assert_eq!(program.sockets[0].destination, "receiver");
    }

    #[test]
    fn parses_a_guarded_handler() {
        let source = r#"
            agent a {
                state { threshold: int }
                on ping if payload.value >= state.threshold {
                    state.threshold = state.threshold + 1
                }
            }
        "#;
        let program = parse(lex(source).unwrap()).unwrap();
        let handler = &program.agents[0].handlers[0];
        assert!(matches!(
            handler.guard,
            Some(Expr::BinOp { op: BinOp::GtEq, .. })
        ));
    }

    #[test]
    fn parses_boolean_and_text_literals() {
        let source = r#"
            agent a {
                state { armed: bool, label: text }
                on cycle {
                    state.armed = true
                    state.label = "ready"
                }
            }
        "#;
        let program = parse(lex(source).unwrap()).unwrap();
        assert_eq!(program.agents[0].state.len(), 2);
        let body = &program.agents[0].handlers[0].body;
        assert_eq!(body.len(), 2);
        if let crate::compiler::ast::Stmt::Assign { value, .. } = &body[1] {
            assert_eq!(*value, Expr::Literal(Literal::Text("ready".to_string())));
        } else {
            panic!("expected assignment");
        }
    }

    #[test]
    fn missing_closing_brace_is_a_syntax_error() {
        let source = "agent a { state { x: int }";
        assert!(parse(lex(source).unwrap()).is_err());
    }

    #[test]
    fn unknown_top_level_keyword_is_a_syntax_error() {
        assert!(parse(lex("banana").unwrap()).is_err());
    }
}
