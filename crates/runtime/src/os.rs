//! Process and reflection builtins.
//!
//! Environment access, program arguments, wall clock, parsing, `typeof`,
//! the struct `tag` reader, and cooperative exit.

use crate::error::{BuiltinResult, want_argc, want_int, want_str, want_struct};
use crate::runtime::Runtime;
use bp_core::{Value, lock_container};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Variant name of the argument.
pub fn type_of(args: &[Value]) -> BuiltinResult {
    want_argc("typeof", args, 1)?;
    Ok(Value::str(args[0].type_name()))
}

/// Field 0 of a struct, the variant tag by convention. An empty struct has
/// no tag and yields `Null`.
pub fn tag(args: &[Value]) -> BuiltinResult {
    want_argc("tag", args, 1)?;
    let s = want_struct("tag", args, 0)?;
    Ok(lock_container(s).tag().unwrap_or(Value::Null))
}

/// Program arguments as an array of strings.
pub fn argv(rt: &Runtime, args: &[Value]) -> BuiltinResult {
    want_argc("argv", args, 0)?;
    Ok(Value::array_from(
        rt.args().iter().map(|a| Value::str(a.as_str())).collect(),
    ))
}

pub fn argc(rt: &Runtime, args: &[Value]) -> BuiltinResult {
    want_argc("argc", args, 0)?;
    Ok(Value::Int(rt.args().len() as i64))
}

/// Environment variable value, `Null` when unset.
pub fn getenv(args: &[Value]) -> BuiltinResult {
    want_argc("getenv", args, 1)?;
    let name = want_str("getenv", args, 0)?;
    match std::env::var(name.to_string_lossy().as_ref()) {
        Ok(value) => Ok(Value::str(value)),
        Err(_) => Ok(Value::Null),
    }
}

/// Milliseconds since the Unix epoch.
pub fn clock_ms(args: &[Value]) -> BuiltinResult {
    want_argc("clock_ms", args, 0)?;
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO);
    Ok(Value::Int(now.as_millis() as i64))
}

/// Signal the VM to halt cooperatively when this builtin returns.
pub fn exit(rt: &mut Runtime, args: &[Value]) -> BuiltinResult {
    want_argc("exit", args, 1)?;
    let code = want_int("exit", args, 0)?;
    rt.request_exit(code as i32);
    Ok(Value::Null)
}

pub fn sleep(args: &[Value]) -> BuiltinResult {
    want_argc("sleep", args, 1)?;
    let ms = want_int("sleep", args, 0)?;
    if ms > 0 {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }
    Ok(Value::Null)
}

/// Decimal integer parse; malformed input is a recoverable `Null`.
pub fn parse_int(args: &[Value]) -> BuiltinResult {
    want_argc("parse_int", args, 1)?;
    let s = want_str("parse_int", args, 0)?;
    match s.to_string_lossy().trim().parse::<i64>() {
        Ok(v) => Ok(Value::Int(v)),
        Err(_) => Ok(Value::Null),
    }
}

/// Float parse; malformed input is a recoverable `Null`.
pub fn parse_float(args: &[Value]) -> BuiltinResult {
    want_argc("parse_float", args, 1)?;
    let s = want_str("parse_float", args, 0)?;
    match s.to_string_lossy().trim().parse::<f64>() {
        Ok(v) => Ok(Value::Float(v)),
        Err(_) => Ok(Value::Null),
    }
}
