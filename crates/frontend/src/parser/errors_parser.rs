use thiserror::*;

use super::{Token, TokenKind};
use tools::errors::{ErrorKind, ReportCodeErr};

// Human readable name of a token in diagnostics
pub(super) fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::EndLine => "new line".into(),
        TokenKind::EOF => "end of input".into(),
        TokenKind::String => format!("'{}'", token.value),
        _ => token.value.clone(),
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ParserError {
    #[error("Unexpected end of input")]
    UnexpectedEndOfInput,

    #[error("Invalid syntax, unexpected {0}")]
    InvalidSyntax(String),

    #[error("Expected {expected}, found {found}")]
    ExpectedToken { expected: String, found: String },

    #[error("Expected an identifier after '{0}'")]
    ExpectedIdentifier(String),

    #[error("Invalid number literal '{0}'")]
    InvalidNumber(String),

    // Blocks
    #[error("Expected 'end' after multi-line statement")]
    MissingEnd,

    #[error("Expected '->' or new-lines after parameter list in function definition")]
    MissingFunctionBody,

    #[error("Expected '=' (initialization for loop var) or 'in' (range-based loop) in for-statement")]
    InvalidForHeader,

    // Function scopes
    #[error("'{0}' outside a user-defined function")]
    OutsideFunction(String),

    #[error("'nonlocal' is only allowed inside a nested function")]
    NonlocalOutsideClosure,

    // Assignments
    #[error("Cannot assign to the result of a function call")]
    AssignToCall,

    #[error("Cannot assign to '{0}' without declaring it, use 'var {0} = ...'")]
    AssignWithoutVar(String),

    #[error("Invalid assignment target")]
    InvalidAssignTarget,
}

impl ParserError {
    pub(super) fn expected(expected: &str, found: &Token) -> Self {
        ParserError::ExpectedToken {
            expected: expected.into(),
            found: describe(found),
        }
    }
}

impl ReportCodeErr for ParserError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Syntax
    }
}
