use std::rc::Rc;

use super::{number_arg, string_arg, NativeFnError};
use crate::environment::Context;
use crate::interpreter::Interpreter;
use crate::values::{Number, Value};

type NativeResult = Result<Value, NativeFnError>;

fn unary_float(ctx: &Context, f: fn(f64) -> f64) -> NativeResult {
    let x = number_arg(ctx, "_x")?;
    Ok(Value::float(f(x.as_f64())))
}

pub(super) fn sin(_: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    unary_float(ctx, f64::sin)
}

pub(super) fn cos(_: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    unary_float(ctx, f64::cos)
}

pub(super) fn tan(_: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    unary_float(ctx, f64::tan)
}

pub(super) fn abs(_: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    unary_float(ctx, f64::abs)
}

pub(super) fn log(_: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    unary_float(ctx, f64::log10)
}

pub(super) fn ln(_: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    unary_float(ctx, f64::ln)
}

pub(super) fn sqrt(_: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    unary_float(ctx, f64::sqrt)
}

pub(super) fn is_floating(_: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    let num = number_arg(ctx, "_num")?;
    Ok(Value::bool(matches!(num, Number::Float(_))))
}

pub(super) fn is_integer(_: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    let num = number_arg(ctx, "_num")?;
    Ok(Value::bool(matches!(num, Number::Int(_))))
}

pub(super) fn parse_int(_: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    let text = string_arg(ctx, "_str")?;
    text.trim()
        .parse::<i64>()
        .map(Value::int)
        .map_err(|_| NativeFnError::InvalidInt(text.to_string()))
}

pub(super) fn parse_float(_: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    let text = string_arg(ctx, "_str")?;
    text.trim()
        .parse::<f64>()
        .map(Value::float)
        .map_err(|_| NativeFnError::InvalidFloat(text.to_string()))
}
