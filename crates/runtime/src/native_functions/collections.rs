use std::rc::Rc;

use super::{arg, list_arg, optional_arg, NativeFnError};
use crate::environment::Context;
use crate::interpreter::Interpreter;
use crate::values::{resolve_index, Number, Value};

type NativeResult = Result<Value, NativeFnError>;

pub(super) fn len(_: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    let length = arg(ctx, "_seq").length()?;
    Ok(Value::int(length as i64))
}

pub(super) fn set(_: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    let list = list_arg(ctx, "_lst")?;
    let index = arg(ctx, "_idx");
    match index {
        Value::Number(Number::Int(i)) if i < 0 => return Err(NativeFnError::NegativeIndex),
        Value::Number(Number::Int(_)) => {}
        _ => return Err(NativeFnError::IndexNotInteger),
    }

    let mut list = list.borrow_mut();
    let idx = resolve_index(list.len(), &index)?;
    list[idx] = arg(ctx, "_value");

    Ok(Value::null())
}

pub(super) fn append(_: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    let list = list_arg(ctx, "_lst")?;
    list.borrow_mut().push(arg(ctx, "_o"));

    Ok(Value::null())
}

pub(super) fn concat(_: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    let first = list_arg(ctx, "_lst1")?;
    let second = list_arg(ctx, "_lst2")?;

    let mut values = first.borrow().clone();
    values.extend(second.borrow().iter().cloned());

    Ok(Value::new_list(values))
}

// Gives back the removed element
pub(super) fn remove(_: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    let list = list_arg(ctx, "_lst")?;
    let index = arg(ctx, "_idx");

    let mut list = list.borrow_mut();
    let idx = resolve_index(list.len(), &index)?;

    Ok(list.remove(idx))
}

fn range_bound(value: Value) -> Result<i64, NativeFnError> {
    match value {
        Value::Number(Number::Int(i)) if i >= 0 => Ok(i),
        _ => Err(NativeFnError::RangeNotPositive),
    }
}

// range(end), range(start, end) or range(start, end, step)
pub(super) fn range(_: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    let a = range_bound(arg(ctx, "_a"))?;
    let (start, end) = match optional_arg(ctx, "__b__") {
        Some(b) => (a, range_bound(b)?),
        None => (0, a),
    };
    let step = match optional_arg(ctx, "__c__") {
        Some(c) => range_bound(c)?,
        None => 1,
    };
    if step == 0 {
        return Err(NativeFnError::RangeNotPositive);
    }

    let values = (start..end).step_by(step as usize).map(Value::int).collect();

    Ok(Value::new_list(values))
}

// Elements get spliced into the variadic parameter receiving the pack
pub(super) fn pack(_: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    let list = list_arg(ctx, "_lst")?;
    let values = list.borrow().clone();

    Ok(Value::Pack(Rc::new(values)))
}
