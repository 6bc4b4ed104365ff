use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, trace};

use tools::position::Span;

use super::{Exception, Interpreter, InterpreterError, RuntimeResult, Signal};
use crate::environment::{Context, SymbolTable};
use crate::native_functions::NativeFnError;
use crate::values::{
    param_kind, variadic_name, BuiltinFunction, BuiltinMethod, Callable, Function, Method, ParamKind, Value,
};

pub(crate) const LAST_EXCEPTION: &str = "__lastexc__";
pub(crate) const RECOVERED: &str = "__recovered__";

// Held for the duration of a user call, gives the depth back when dropped
struct CallGuard<'a> {
    depth: &'a Cell<usize>,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

// Binds `args` to the parameters declared by `callable`
pub(crate) fn bind_arguments(
    callable: &dyn Callable,
    args: Vec<Value>,
    table: &mut SymbolTable,
) -> Result<(), InterpreterError> {
    let params = callable.params();
    let variadics = params
        .iter()
        .filter(|p| param_kind(p) == ParamKind::Variadic)
        .count();

    if variadics > 1 {
        return Err(InterpreterError::TooManyMutableArguments);
    }
    let has_variadic = variadics == 1;
    if has_variadic && params.last().map(|p| param_kind(p)) != Some(ParamKind::Variadic) {
        return Err(InterpreterError::MutableArgumentNotLast);
    }

    let fixed = if has_variadic { &params[..params.len() - 1] } else { params };
    let required = fixed
        .iter()
        .filter(|p| param_kind(p) == ParamKind::Positional)
        .count();

    if !has_variadic && args.len() > fixed.len() {
        return Err(InterpreterError::TooManyArguments {
            name: callable.name().into(),
            expected: fixed.len(),
            got: args.len(),
        });
    }
    if args.len() < required {
        let (name, expected, got) = (callable.name().into(), required, args.len());
        return Err(if has_variadic || required < fixed.len() {
            InterpreterError::TooFewArgumentsAtLeast { name, expected, got }
        } else {
            InterpreterError::TooFewArguments { name, expected, got }
        });
    }

    let mut args = args.into_iter();
    for param in fixed {
        // Optional parameters stay unbound when no argument is left
        if let Some(arg) = args.next() {
            table.set(param, arg);
        }
    }

    if let Some(param) = params.last().filter(|_| has_variadic) {
        let mut rest = Vec::new();
        for arg in args {
            match arg {
                Value::Pack(values) => rest.extend(values.iter().cloned()),
                other => rest.push(other),
            }
        }

        table.set(variadic_name(param), Value::new_list(rest));
    }

    Ok(())
}

impl Interpreter {
    pub fn call(&self, callee: &Value, args: Vec<Value>, span: &Span, ctx: &Rc<Context>) -> RuntimeResult {
        match callee {
            Value::Function(func) => self.call_function(func, None, args, span, ctx),
            Value::Method(method) => {
                self.call_function(&method.func, Some(method.receiver.clone()), args, span, ctx)
            }
            Value::Builtin(func) => self.call_builtin(func, None, args, span, ctx),
            Value::BuiltinMethod(method) => {
                self.call_builtin(&method.func, Some(method.receiver.clone()), args, span, ctx)
            }
            Value::Class(_) => self.instantiate(callee, args, span, ctx),
            _ => Err(self.error(InterpreterError::NotCallable(callee.kind()), span, ctx)),
        }
    }

    fn enter_call(&self, span: &Span, ctx: &Rc<Context>) -> Result<CallGuard<'_>, Signal> {
        let max = self.config.max_call_depth;
        if self.depth.get() >= max {
            return Err(self.error(InterpreterError::StackOverflow(max), span, ctx));
        }

        self.depth.set(self.depth.get() + 1);
        Ok(CallGuard { depth: &self.depth })
    }

    fn call_function(
        &self,
        func: &Rc<Function>,
        receiver: Option<Value>,
        mut args: Vec<Value>,
        span: &Span,
        ctx: &Rc<Context>,
    ) -> RuntimeResult {
        let _guard = self.enter_call(span, ctx)?;

        let frame = Context::frame(
            func.name(),
            ctx,
            span.start.clone(),
            SymbolTable::shared(Some(func.globals.clone())),
            func.globals.clone(),
        );
        *frame.nonlocals.borrow_mut() = func.closure.clone();

        if let Some(receiver) = receiver {
            args.insert(0, receiver);
        }
        bind_arguments(&**func, args, &mut frame.symbols.borrow_mut())
            .map_err(|e| self.error(e, span, ctx))?;

        debug!(function = func.name(), depth = self.depth.get(), "call");

        let definition = &func.definition;
        let outcome = match self.evaluate(&definition.body, &frame) {
            Ok(value) if definition.auto_return => Ok(value),
            Ok(_) => Ok(Value::null()),
            Err(signal) => self.settle(signal, &frame),
        };

        self.run_deferred(&frame, outcome)
    }

    fn call_builtin(
        &self,
        func: &Rc<BuiltinFunction>,
        receiver: Option<Value>,
        mut args: Vec<Value>,
        span: &Span,
        ctx: &Rc<Context>,
    ) -> RuntimeResult {
        let frame = Context::frame(
            &func.name,
            ctx,
            span.start.clone(),
            SymbolTable::shared(None),
            ctx.global.clone(),
        );

        if let Some(receiver) = receiver {
            args.insert(0, receiver);
        }
        bind_arguments(&**func, args, &mut frame.symbols.borrow_mut())
            .map_err(|e| self.error(e, span, ctx))?;

        trace!(builtin = %func.name, "call");

        (func.func)(self, &frame).map_err(|e| match e {
            NativeFnError::Raised(exception) => Signal::Error(exception),
            other => Signal::Error(Box::new(Exception::new(&other, &span.start, &frame))),
        })
    }

    // Copy of the prototype with its constructor run on it
    pub(super) fn instantiate(
        &self,
        prototype: &Value,
        args: Vec<Value>,
        span: &Span,
        ctx: &Rc<Context>,
    ) -> RuntimeResult {
        let Value::Class(class) = prototype else {
            return Err(self.error(InterpreterError::NewRequiresPrototype, span, ctx));
        };

        let (instance, constructor) = {
            let class = class.borrow();
            let constructor = class
                .constructor()
                .ok_or_else(|| InterpreterError::NoConstructor(class.class_name.clone()));
            (class.instance(), constructor)
        };
        let constructor = constructor.map_err(|e| self.error(e, span, ctx))?;

        let instance = Value::new_class(instance);
        let bound = match constructor {
            Value::Function(func) => Value::Method(Rc::new(Method {
                func,
                receiver: instance.clone(),
            })),
            Value::Builtin(func) => Value::BuiltinMethod(Rc::new(BuiltinMethod {
                func,
                receiver: instance.clone(),
            })),
            _ => return Err(self.error(InterpreterError::ConstructorNotCallable, span, ctx)),
        };

        self.call(&bound, args, span, ctx)?;

        Ok(instance)
    }

    // Runs the expressions queued by `defer`, in order. When unwinding, each one
    // sees the pending error as `__lastexc__` and may recover from it
    fn run_deferred(&self, frame: &Rc<Context>, outcome: Result<Value, Box<Exception>>) -> RuntimeResult {
        let deferred: Vec<_> = frame.deferred.borrow_mut().drain(..).collect();
        if deferred.is_empty() {
            return outcome.map_err(Signal::Error);
        }

        debug!(function = %frame.label, count = deferred.len(), "running deferred expressions");

        let (mut value, mut error) = match outcome {
            Ok(value) => (value, None),
            Err(e) => (Value::null(), Some(e)),
        };

        for expr in deferred {
            let deferred_frame = Context::frame(
                "<deferred>",
                frame,
                expr.span.start.clone(),
                SymbolTable::shared(Some(frame.symbols.clone())),
                frame.global.clone(),
            );
            if let Some(e) = &error {
                deferred_frame.declare(LAST_EXCEPTION, e.to_value());
            }

            let result = self
                .evaluate(&expr, &deferred_frame)
                .or_else(|signal| self.settle(signal, &deferred_frame));

            match result {
                Err(raised) => error = Some(Box::new(raised.with_cause(error.take()))),
                Ok(_) => {
                    let recovered = frame.symbols.borrow_mut().remove(RECOVERED);
                    if let (Some(recovered), Some(_)) = (recovered, &error) {
                        debug!(function = %frame.label, "recovered from error");
                        value = recovered;
                        error = None;
                    }
                }
            }
        }

        match error {
            Some(e) => Err(Signal::Error(e)),
            None => Ok(value),
        }
    }
}
