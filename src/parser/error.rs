//! Parser error types

use crate::ast::Span;
use crate::lexer::{LexError, Token};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: Token,
        span: Span,
    },

    #[error("unexpected end of input: expected {expected}")]
    UnexpectedEof { expected: String, last_span: Span },
}

impl ParseError {
    pub fn span(&self) -> &Span {
        match self {
            ParseError::Lex(err) => err.span(),
            ParseError::UnexpectedToken { span, .. } => span,
            ParseError::UnexpectedEof { last_span, .. } => last_span,
        }
    }

    pub fn unexpected(expected: impl Into<String>, found: Token, span: Span) -> Self {
        ParseError::UnexpectedToken {
            expected: expected.into(),
            found,
            span,
        }
    }

    pub fn eof(expected: impl Into<String>, last_span: Span) -> Self {
        ParseError::UnexpectedEof {
            expected: expected.into(),
            last_span,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
