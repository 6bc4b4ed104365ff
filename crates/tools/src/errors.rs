use colored::*;
use std::fmt::Display;

use crate::position::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    IllegalCharacter,
    Syntax,
    Runtime,
    Type,
    Value,
    Attribute,
    OS,
    Panic,
    StopIteration,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::IllegalCharacter => "IllegalCharacterError",
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Runtime => "RuntimeError",
            ErrorKind::Type => "TypeError",
            ErrorKind::Value => "ValueError",
            ErrorKind::Attribute => "AttributeError",
            ErrorKind::OS => "OSError",
            ErrorKind::Panic => "Panic",
            ErrorKind::StopIteration => "StopIteration",
        };

        write!(f, "{}", name)
    }
}

// Header shared by every diagnostic
pub fn format_diagnostic(kind: ErrorKind, pos: &Position, details: &str) -> String {
    format!(
        "File \"{}\", line {}\n  {}: {}",
        pos.filename,
        pos.line + 1,
        kind.to_string().red().bold(),
        details
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeErr {
    pub kind: ErrorKind,
    pub position: Position,
    pub details: String,
}

impl Display for CodeErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format_diagnostic(self.kind, &self.position, &self.details))
    }
}

impl std::error::Error for CodeErr {}

pub trait ReportCodeErr: Display {
    fn kind(&self) -> ErrorKind;

    fn to_glob_err(&self, pos: &Position) -> CodeErr {
        CodeErr {
            kind: self.kind(),
            position: pos.clone(),
            details: self.to_string(),
        }
    }
}
