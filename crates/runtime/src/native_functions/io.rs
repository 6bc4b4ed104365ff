use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use tracing::debug;

use super::{arg, optional_arg, string_arg, NativeFnError};
use crate::environment::Context;
use crate::interpreter::Interpreter;
use crate::values::Value;

type NativeResult = Result<Value, NativeFnError>;

pub(super) fn print(interp: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    interp
        .write(&arg(ctx, "_str").to_string())
        .map_err(|e| NativeFnError::Output(e.to_string()))?;

    Ok(Value::null())
}

pub(super) fn println(interp: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    interp
        .write(&format!("{}\n", arg(ctx, "_str")))
        .map_err(|e| NativeFnError::Output(e.to_string()))?;

    Ok(Value::null())
}

// Line from stdin, without its terminator
fn read_stdin_line() -> Result<String, NativeFnError> {
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| NativeFnError::Input(e.to_string()))?;

    let trimmed = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(trimmed);
    Ok(line)
}

pub(super) fn read_line(_: &Interpreter, _: &Rc<Context>) -> NativeResult {
    Ok(Value::string(&read_stdin_line()?))
}

pub(super) fn input(interp: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    if let Some(prompt) = optional_arg(ctx, "__prompt__") {
        interp
            .write(&prompt.to_string())
            .map_err(|e| NativeFnError::Output(e.to_string()))?;
    }

    Ok(Value::string(&read_stdin_line()?))
}

pub(super) fn read_file(_: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    let filename = string_arg(ctx, "_filename")?;
    let content = fs::read_to_string(&*filename).map_err(|e| {
        debug!(file = %filename, error = %e, "read failed");
        NativeFnError::FileOpen(filename.to_string())
    })?;

    Ok(Value::string(&content))
}

// Mode `w` truncates, `wa` appends
pub(super) fn write_file(_: &Interpreter, ctx: &Rc<Context>) -> NativeResult {
    let filename = string_arg(ctx, "_filename")?;
    let content = string_arg(ctx, "_str")?;
    let mode = match optional_arg(ctx, "__mode__") {
        Some(Value::String(mode)) => mode,
        Some(other) => return Err(NativeFnError::NotAString("__mode__", other.kind())),
        None => Rc::from("w"),
    };

    let mut options = OpenOptions::new();
    match &*mode {
        "w" => options.write(true).create(true).truncate(true),
        "wa" => options.append(true).create(true),
        _ => return Err(NativeFnError::InvalidMode(mode.to_string())),
    };

    let mut file = options.open(&*filename).map_err(|e| {
        debug!(file = %filename, error = %e, "open failed");
        NativeFnError::FileOpen(filename.to_string())
    })?;
    file.write_all(content.as_bytes())
        .map_err(|e| NativeFnError::Output(e.to_string()))?;

    Ok(Value::null())
}
