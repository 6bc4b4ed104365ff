use std::collections::HashMap;
use std::rc::Rc;

use frontend::ast::FunctionDefinition;

use super::capabilities::Callable;
use super::Value;
use crate::environment::{Context, SharedTable};
use crate::interpreter::Interpreter;
use crate::native_functions::NativeFnError;

// Arguments are read from the frame, bound under the declared parameter names
pub type NativeFn = fn(&Interpreter, &Rc<Context>) -> Result<Value, NativeFnError>;

pub const ANONYMOUS: &str = "<anonymous>";

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ParamKind {
    Positional,
    // `__name__`, left unbound when no argument is given
    Optional,
    // `_name_`, collects the remaining arguments
    Variadic,
}

pub fn param_kind(name: &str) -> ParamKind {
    if name.len() > 4 && name.starts_with("__") && name.ends_with("__") {
        ParamKind::Optional
    } else if name.len() > 2
        && name.starts_with('_')
        && name.ends_with('_')
        && !name.starts_with("__")
        && !name.ends_with("__")
    {
        ParamKind::Variadic
    } else {
        ParamKind::Positional
    }
}

// `_rest_` is bound as `rest`
pub fn variadic_name(name: &str) -> &str {
    &name[1..name.len() - 1]
}

pub struct Function {
    pub definition: Rc<FunctionDefinition>,
    // Values of the free and cell variables when the function was defined
    pub closure: HashMap<String, Value>,
    // Global table of the module that defined it
    pub globals: SharedTable,
}

impl Function {
    pub fn new(
        definition: Rc<FunctionDefinition>,
        closure: HashMap<String, Value>,
        globals: SharedTable,
    ) -> Self {
        Self {
            definition,
            closure,
            globals,
        }
    }

    // Methods are the functions taking their object first
    pub fn is_method(&self) -> bool {
        matches!(
            self.definition.params.first().map(String::as_str),
            Some("self") | Some("this")
        )
    }
}

impl Callable for Function {
    fn name(&self) -> &str {
        self.definition.name.as_deref().unwrap_or(ANONYMOUS)
    }

    fn params(&self) -> &[String] {
        &self.definition.params
    }
}

pub struct BuiltinFunction {
    pub name: String,
    pub params: Vec<String>,
    pub func: NativeFn,
}

impl BuiltinFunction {
    pub fn new(name: &str, params: &[&str], func: NativeFn) -> Self {
        Self {
            name: name.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            func,
        }
    }
}

impl Callable for BuiltinFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn params(&self) -> &[String] {
        &self.params
    }
}

// A function whose first parameter is bound to `receiver`
pub struct Method {
    pub func: Rc<Function>,
    pub receiver: Value,
}

pub struct BuiltinMethod {
    pub func: Rc<BuiltinFunction>,
    pub receiver: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_conventions() {
        assert_eq!(param_kind("x"), ParamKind::Positional);
        assert_eq!(param_kind("_str"), ParamKind::Positional);
        assert_eq!(param_kind("__prompt__"), ParamKind::Optional);
        assert_eq!(param_kind("_rest_"), ParamKind::Variadic);
        assert_eq!(param_kind("__"), ParamKind::Positional);
        assert_eq!(param_kind("_"), ParamKind::Positional);
        assert_eq!(variadic_name("_rest_"), "rest");
    }
}
