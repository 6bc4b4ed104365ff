use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use tracing::debug;

use super::{arg, caller, optional_arg, string_arg, NativeFnError};
use crate::environment::{Context, SymbolTable};
use crate::interpreter::{Exception, Interpreter, RunError, LAST_EXCEPTION, RECOVERED};
use crate::values::Value;

type NativeResult = Result<Value, NativeFnError>;

// Errors of code run on behalf of the caller keep their own position
fn raised(err: RunError, ctx: &Context) -> NativeFnError {
    match err {
        RunError::Code(e) => NativeFnError::Raised(Box::new(Exception::from_code_err(e, ctx))),
        RunError::Runtime(e) => NativeFnError::Raised(e),
    }
}

pub(super) fn type_of(_: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    let kind = arg(ctx, "_object").kind();
    Ok(Value::string(&format!("<type '{}'>", kind)))
}

pub(super) fn to_str(_: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    Ok(Value::string(&arg(ctx, "_object").to_string()))
}

// Runs in the caller's scope, gives the value of the last statement
pub(super) fn eval(interp: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    let code = string_arg(ctx, "_code")?;
    let caller = caller(ctx);

    let values = interp
        .run(&code, "<eval>", &caller)
        .map_err(|e| raised(e, &caller))?;

    Ok(values.into_iter().last().unwrap_or_else(Value::null))
}

pub(super) fn panic(_: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    Err(NativeFnError::Panic(arg(ctx, "_err").to_string()))
}

// Only meaningful in a deferred expression: its frame holds the pending error,
// and the function frame above it receives the recovered value
pub(super) fn recover(_: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    let deferred = caller(ctx);
    let pending = deferred.symbols.borrow_mut().remove(LAST_EXCEPTION);

    match (pending, &deferred.parent) {
        (Some(exception), Some(function)) => {
            let value = optional_arg(ctx, "__value__").unwrap_or_else(Value::null);
            function.declare(RECOVERED, value);
            Ok(exception)
        }
        _ => Ok(Value::null()),
    }
}

pub(super) fn stop_iteration(_: &Interpreter, _: &Rc<Context>) -> NativeResult {
    Err(NativeFnError::StopIteration)
}

// Removes the innermost binding visible from the caller
pub(super) fn del(interp: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    let name = string_arg(ctx, "_varName")?;
    let mut table = Some(caller(ctx).symbols.clone());

    while let Some(current) = table {
        if Rc::ptr_eq(&current, interp.builtins()) {
            if current.borrow().contains_local(&name) {
                return Err(NativeFnError::DeleteBuiltin(name.to_string()));
            }
            break;
        }

        if current.borrow_mut().remove(&name).is_some() {
            debug!(name = %name, "deleted");
            return Ok(Value::null());
        }
        table = current.borrow().parent();
    }

    Err(NativeFnError::Undefined(name.to_string()))
}

pub(super) fn builtins(interp: &Interpreter, _: &Rc<Context>) -> NativeResult {
    let names = interp.builtins().borrow().names();
    Ok(Value::new_list(names.iter().map(|n| Value::string(n)).collect()))
}

// `<name>.yan` from the working directory, then from the import path
fn module_path(interp: &Interpreter, name: &str) -> Option<PathBuf> {
    let file = format!("{}.yan", name);
    [PathBuf::from(&file), interp.config.import_path.join(&file)]
        .into_iter()
        .find(|path| path.is_file())
}

// Loads a module once, then copies its top-level names into the caller
pub(super) fn require(interp: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    let name = string_arg(ctx, "_module")?;
    let caller = caller(ctx);

    let cached = interp.modules.borrow().get(&*name).cloned();
    let module = match cached {
        Some(module) => {
            debug!(module = %name, "module already loaded");
            module
        }
        None => load_module(interp, &name, ctx)?,
    };

    let exported: Vec<(String, Value)> = {
        let symbols = module.symbols.borrow();
        symbols
            .names()
            .into_iter()
            .filter_map(|name| symbols.get_local(&name).map(|value| (name, value)))
            .collect()
    };
    for (symbol, value) in exported {
        caller.declare(&symbol, value);
    }

    Ok(Value::null())
}

fn load_module(interp: &Interpreter, name: &str, ctx: &Rc<Context>) -> Result<Rc<Context>, NativeFnError> {
    let path = module_path(interp, name).ok_or_else(|| NativeFnError::ModuleOpen(name.to_string()))?;
    let source = fs::read_to_string(&path).map_err(|_| NativeFnError::ModuleOpen(name.to_string()))?;

    let global = SymbolTable::shared(Some(interp.builtins().clone()));
    let label = format!("<module '{}'>", name);
    let module = match &ctx.entry {
        Some(entry) => Context::frame(&label, &caller(ctx), entry.clone(), global.clone(), global),
        None => Context::root(&label, global),
    };

    debug!(module = name, path = %path.display(), "loading module");

    // Registered first so that a module requiring itself gets the partial one
    interp.modules.borrow_mut().insert(name.to_string(), module.clone());

    if let Err(e) = interp.run(&source, &path.to_string_lossy(), &module) {
        interp.modules.borrow_mut().remove(name);
        return Err(raised(e, &module));
    }

    Ok(module)
}
