use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use tools::errors::{ErrorKind, ReportCodeErr};

mod collections;
mod io;
mod lang;
mod math;

use crate::environment::{Context, SymbolTable};
use crate::interpreter::Exception;
use crate::values::{BuiltinFunction, NativeFn, Number, OperationError, Value};

#[derive(Debug, Error)]
pub enum NativeFnError {
    #[error("Type of argument '{param}' mismatched: requires one of {expected} but got {got}")]
    WrongArgType {
        param: &'static str,
        expected: &'static str,
        got: &'static str,
    },

    #[error("Argument '{0}' must be a String (got {1})")]
    NotAString(&'static str, &'static str),

    #[error("Could not convert '{0}' to an integer")]
    InvalidInt(String),

    #[error("Could not convert '{0}' to a float")]
    InvalidFloat(String),

    #[error("range(x) requires an positive integer")]
    RangeNotPositive,

    #[error("List index must be an integer")]
    IndexNotInteger,

    #[error("Negative index not allowed here")]
    NegativeIndex,

    #[error("del('{0}'): not defined")]
    Undefined(String),

    #[error("Attempted to delete non-user defined function: '{0}'")]
    DeleteBuiltin(String),

    // Files and streams
    #[error("Failed to open file: '{0}'")]
    FileOpen(String),

    #[error("Invalid file open mode: '{0}'")]
    InvalidMode(String),

    #[error("Failed to open module: '{0}'")]
    ModuleOpen(String),

    #[error("Failed to write output: {0}")]
    Output(String),

    #[error("Failed to read input: {0}")]
    Input(String),

    // Raised on purpose by the program
    #[error("{0}")]
    Panic(String),

    #[error("Iteration stopped")]
    StopIteration,

    #[error("{0}")]
    Operation(#[from] OperationError),

    // Error of code run by the built-in itself, already located
    #[error("{0}")]
    Raised(Box<Exception>),
}

impl ReportCodeErr for NativeFnError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::WrongArgType { .. } | Self::NotAString(..) => ErrorKind::Type,
            Self::InvalidInt(_)
            | Self::InvalidFloat(_)
            | Self::RangeNotPositive
            | Self::IndexNotInteger
            | Self::NegativeIndex
            | Self::Undefined(_)
            | Self::InvalidMode(_) => ErrorKind::Value,
            Self::DeleteBuiltin(_) => ErrorKind::Runtime,
            Self::FileOpen(_) | Self::ModuleOpen(_) | Self::Output(_) | Self::Input(_) => ErrorKind::OS,
            Self::Panic(_) => ErrorKind::Panic,
            Self::StopIteration => ErrorKind::StopIteration,
            Self::Operation(e) => e.kind(),
            Self::Raised(e) => e.kind,
        }
    }
}

// Name, declared parameters and implementation of every built-in
const BUILTINS: &[(&str, &[&str], NativeFn)] = &[
    ("print", &["_str"], io::print),
    ("println", &["_str"], io::println),
    ("readLine", &[], io::read_line),
    ("input", &["__prompt__"], io::input),
    ("readFile", &["_filename"], io::read_file),
    ("writeFile", &["_filename", "_str", "__mode__"], io::write_file),
    ("sin", &["_x"], math::sin),
    ("cos", &["_x"], math::cos),
    ("tan", &["_x"], math::tan),
    ("abs", &["_x"], math::abs),
    ("log", &["_x"], math::log),
    ("ln", &["_x"], math::ln),
    ("sqrt", &["_x"], math::sqrt),
    ("isFloating", &["_num"], math::is_floating),
    ("isInteger", &["_num"], math::is_integer),
    ("parseInt", &["_str"], math::parse_int),
    ("parseFloat", &["_str"], math::parse_float),
    ("len", &["_seq"], collections::len),
    ("set", &["_lst", "_idx", "_value"], collections::set),
    ("append", &["_lst", "_o"], collections::append),
    ("concat", &["_lst1", "_lst2"], collections::concat),
    ("remove", &["_lst", "_idx"], collections::remove),
    ("range", &["_a", "__b__", "__c__"], collections::range),
    ("pack", &["_lst"], collections::pack),
    ("typeof", &["_object"], lang::type_of),
    ("str", &["_object"], lang::to_str),
    ("eval", &["_code"], lang::eval),
    ("panic", &["_err"], lang::panic),
    ("recover", &["__value__"], lang::recover),
    ("stopIteration", &[], lang::stop_iteration),
    ("del", &["_varName"], lang::del),
    ("builtins", &[], lang::builtins),
    ("require", &["_module"], lang::require),
];

// Fills the table every global scope falls back on
pub fn register(table: &mut SymbolTable) {
    table.set("null", Value::null());
    table.set("true", Value::bool(true));
    table.set("false", Value::bool(false));

    for (name, params, func) in BUILTINS {
        table.set(name, Value::Builtin(Rc::new(BuiltinFunction::new(name, params, *func))));
    }
}

pub fn names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = BUILTINS.iter().map(|(name, ..)| *name).collect();
    names.sort_unstable();
    names
}

// --------
// Helpers
// --------

// Positional parameters are always bound
fn arg(ctx: &Context, name: &str) -> Value {
    ctx.symbols.borrow().get_local(name).unwrap_or_else(Value::null)
}

fn optional_arg(ctx: &Context, name: &str) -> Option<Value> {
    ctx.symbols.borrow().get_local(name)
}

fn number_arg(ctx: &Context, name: &'static str) -> Result<Number, NativeFnError> {
    match arg(ctx, name) {
        Value::Number(n) => Ok(n),
        other => Err(NativeFnError::WrongArgType {
            param: name,
            expected: "Number",
            got: other.kind(),
        }),
    }
}

fn string_arg(ctx: &Context, name: &'static str) -> Result<Rc<str>, NativeFnError> {
    match arg(ctx, name) {
        Value::String(s) => Ok(s),
        other => Err(NativeFnError::WrongArgType {
            param: name,
            expected: "String",
            got: other.kind(),
        }),
    }
}

fn list_arg(ctx: &Context, name: &'static str) -> Result<Rc<RefCell<Vec<Value>>>, NativeFnError> {
    match arg(ctx, name) {
        Value::List(l) => Ok(l),
        other => Err(NativeFnError::WrongArgType {
            param: name,
            expected: "List",
            got: other.kind(),
        }),
    }
}

// Frame that called the built-in
fn caller(ctx: &Rc<Context>) -> Rc<Context> {
    ctx.parent.clone().unwrap_or_else(|| ctx.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_is_registered() {
        let mut table = SymbolTable::new(None);
        register(&mut table);

        for name in names() {
            assert!(
                matches!(table.get(name), Some(Value::Builtin(_))),
                "{} is missing",
                name
            );
        }
        assert_eq!(table.get("true"), Some(Value::int(1)));
    }

    #[test]
    fn parameters_follow_the_naming_conventions() {
        use crate::values::{param_kind, ParamKind};

        for (name, params, _) in BUILTINS {
            for param in params.iter() {
                assert!(param.starts_with('_'), "{}({})", name, param);
                assert_ne!(param_kind(param), ParamKind::Variadic, "{}({})", name, param);
            }
        }
    }

    #[test]
    fn error_kinds() {
        assert_eq!(NativeFnError::Panic("boom".into()).kind(), ErrorKind::Panic);
        assert_eq!(NativeFnError::FileOpen("a.txt".into()).kind(), ErrorKind::OS);
        assert_eq!(
            NativeFnError::WrongArgType {
                param: "_x",
                expected: "Number",
                got: "String"
            }
            .to_string(),
            "Type of argument '_x' mismatched: requires one of Number but got String"
        );
    }
}
