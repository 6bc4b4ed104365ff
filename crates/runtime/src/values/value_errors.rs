use thiserror::Error;

use tools::errors::{ErrorKind, ReportCodeErr};

#[derive(Debug, Error, PartialEq, Clone)]
pub enum OperationError {
    #[error("Illegal operation '{op}' between '{left}' and '{right}'")]
    Illegal {
        op: String,
        left: &'static str,
        right: &'static str,
    },

    // Numbers
    #[error("Division by zero")]
    DivisionByZero,

    #[error("Integer overflow")]
    IntegerOverflow,

    // Strings
    #[error("The right of '*' in string multiplication must be an integer")]
    StringRepeatNotInteger,

    #[error("String repetition is longer than {0} bytes")]
    StringTooLong(usize),

    #[error("String index must be a Number (got {0})")]
    StringIndexType(&'static str),

    #[error("String index must be a non-negative integer (got {0})")]
    StringIndexInvalid(String),

    #[error("String index out of range (maximum is {max} but got {got})")]
    StringIndexOutOfRange { max: i64, got: i64 },

    // Lists
    #[error("List index must be a Number (got {0})")]
    ListIndexType(&'static str),

    #[error("List index must be an integer")]
    ListIndexNotInteger,

    #[error("List index out of range (given {given} but maximum is {max})")]
    ListIndexOutOfRange { given: i64, max: i64 },

    // Dictionaries and objects
    #[error("Dictionary has no attribute `{0}`")]
    MissingKey(String),

    #[error("Object '{class}' has no attribute `{attr}`")]
    MissingMember { class: String, attr: String },

    #[error("Invalid key type")]
    InvalidKeyType,

    #[error("Invalid type for '__cls__': '{0}'")]
    ClassNameType(&'static str),

    #[error("'{0}' has no user-defined attribute")]
    NoAttribute(&'static str),

    #[error("'{0}' object has no user-defined attribute")]
    NoAttributeAssign(&'static str),

    #[error("'{0}' object is not subscriptable")]
    NotSubscriptable(&'static str),

    #[error("'{0}' object cannot be assigned through subscription")]
    NotIndexAssignable(&'static str),

    #[error("Object '{0}' is not iterable")]
    NotIterable(&'static str),

    #[error("Cannot perform 'len' on object '{0}'")]
    NoLength(&'static str),
}

impl OperationError {
    pub fn illegal(op: impl ToString, left: &'static str, right: &'static str) -> Self {
        Self::Illegal {
            op: op.to_string(),
            left,
            right,
        }
    }
}

impl ReportCodeErr for OperationError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::DivisionByZero
            | Self::IntegerOverflow
            | Self::StringTooLong(_)
            | Self::StringIndexOutOfRange { .. }
            | Self::ListIndexOutOfRange { .. } => ErrorKind::Runtime,
            Self::MissingKey(_) | Self::MissingMember { .. } => ErrorKind::Attribute,
            _ => ErrorKind::Type,
        }
    }
}
