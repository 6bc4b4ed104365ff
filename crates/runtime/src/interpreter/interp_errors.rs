use std::fmt::Display;
use std::rc::Rc;

use colored::*;
use thiserror::Error;

use tools::errors::{format_diagnostic, CodeErr, ErrorKind, ReportCodeErr};
use tools::position::Position;

use crate::environment::Context;
use crate::values::{Dictionary, OperationError, Value};

#[derive(Error, Debug, PartialEq)]
pub enum InterpreterError {
    #[error("'{0}' is not defined")]
    UndefinedVariable(String),

    #[error("'{0}' object is not callable")]
    NotCallable(&'static str),

    #[error("Maximum call stack depth ({0}) exceeded")]
    StackOverflow(usize),

    // Parameter binding
    #[error("Too many arguments given to function '{name}' (Expected {expected} but got {got})")]
    TooManyArguments {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("Too few arguments given to function '{name}' (Expected {expected} but got {got})")]
    TooFewArguments {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("Too few arguments given to function '{name}' (Expected at least {expected} but got {got})")]
    TooFewArgumentsAtLeast {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("Too many mutable arguments")]
    TooManyMutableArguments,

    #[error("Mutable argument appeared before positional arguments")]
    MutableArgumentNotLast,

    // Control flow
    #[error("'{0}' outside a loop")]
    OutsideLoop(&'static str),

    #[error("For-loop step cannot be zero")]
    ZeroStep,

    #[error("For-loop bounds must be Numbers (got {0})")]
    ForBoundType(&'static str),

    #[error("No binding for nonlocal '{0}' found")]
    NoNonlocalBinding(String),

    // Objects
    #[error("Prototype of object '{0}' has no constructor")]
    NoConstructor(String),

    #[error("Constructor is not callable")]
    ConstructorNotCallable,

    #[error("Keyword 'new' requires a prototype object")]
    NewRequiresPrototype,

    #[error("{0}")]
    Operation(#[from] OperationError),
}

impl ReportCodeErr for InterpreterError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotCallable(_)
            | Self::TooManyArguments { .. }
            | Self::TooFewArguments { .. }
            | Self::TooFewArgumentsAtLeast { .. }
            | Self::ForBoundType(_)
            | Self::NoConstructor(_)
            | Self::ConstructorNotCallable
            | Self::NewRequiresPrototype => ErrorKind::Type,
            Self::ZeroStep => ErrorKind::Value,
            Self::Operation(e) => e.kind(),
            _ => ErrorKind::Runtime,
        }
    }
}

// Runtime error with the frames it went through
#[derive(Debug, Clone, PartialEq)]
pub struct Exception {
    pub kind: ErrorKind,
    pub details: String,
    pub position: Position,
    // Innermost frame first
    pub trace: Vec<(String, Position)>,
    // Error being handled when this one was raised
    pub cause: Option<Box<Exception>>,
}

impl Exception {
    pub fn new(err: &impl ReportCodeErr, pos: &Position, ctx: &Context) -> Self {
        Self {
            kind: err.kind(),
            details: err.to_string(),
            position: pos.clone(),
            trace: ctx.traceback(pos),
            cause: None,
        }
    }

    // Front-end failure of code loaded at run time (eval, require)
    pub fn from_code_err(err: CodeErr, ctx: &Context) -> Self {
        Self {
            kind: err.kind,
            details: err.details,
            trace: ctx.traceback(&err.position),
            position: err.position,
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: Option<Box<Exception>>) -> Self {
        self.cause = cause;
        self
    }

    // What a deferred expression sees as `__lastexc__`
    pub fn to_value(&self) -> Value {
        let mut dict = Dictionary::new();
        dict.insert(Value::string("category"), Value::string(&self.kind.to_string()));
        dict.insert(Value::string("message"), Value::string(&self.details));
        dict.insert(Value::string("line"), Value::int(self.position.line as i64 + 1));
        dict.insert(Value::string("column"), Value::int(self.position.column as i64 + 1));
        dict.insert(Value::string("filename"), Value::String(Rc::clone(&self.position.filename)));

        Value::new_dict(dict)
    }
}

impl Display for Exception {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(cause) = &self.cause {
            writeln!(f, "{}\n", cause)?;
            writeln!(
                f,
                "{}\n",
                "Above exception is the direct cause of the following exception".italic()
            )?;
        }

        write!(f, "{}", format_diagnostic(self.kind, &self.position, &self.details))?;
        write!(f, "\nTraceback (innermost first):")?;

        for (label, pos) in &self.trace {
            write!(f, "\n  at {} [{}]", label, pos)?;
        }

        Ok(())
    }
}

// Anything that can stop a run: a front-end diagnostic or a runtime error
#[derive(Error, Debug, PartialEq)]
pub enum RunError {
    #[error("{0}")]
    Code(#[from] CodeErr),

    #[error("{0}")]
    Runtime(Box<Exception>),
}

impl RunError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RunError::Code(e) => e.kind,
            RunError::Runtime(e) => e.kind,
        }
    }

    pub fn details(&self) -> &str {
        match self {
            RunError::Code(e) => &e.details,
            RunError::Runtime(e) => &e.details,
        }
    }
}
