//! Runtime error handling.
//!
//! Builtins never panic on guest-reachable paths. A misuse the guest cannot
//! sensibly handle (wrong argument count, wrong variant, out-of-range index,
//! empty pop) is a fatal `RuntimeError`; the driver prints it to stderr and
//! exits with status 1. Recoverable conditions (file-read miss, invalid
//! regex, malformed input to a parse builtin) are reported as values, not
//! errors.

use bp_core::{Array, BpString, Map, StructData, Value};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Fatal runtime error carrying the formatted message, which always names
/// the failing builtin and the expected shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    message: String,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        RuntimeError {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RuntimeError {}

/// Result type of every builtin.
pub type BuiltinResult = Result<Value, RuntimeError>;

/// Argument-count check; every builtin calls this first.
pub fn want_argc(name: &str, args: &[Value], n: usize) -> Result<(), RuntimeError> {
    if args.len() == n {
        Ok(())
    } else {
        Err(RuntimeError::new(format!(
            "{}: expected {} argument{}, got {}",
            name,
            n,
            if n == 1 { "" } else { "s" },
            args.len()
        )))
    }
}

fn shape_error(name: &str, idx: usize, want: &str, got: &Value) -> RuntimeError {
    RuntimeError::new(format!(
        "{}: expected {} at argument {}, got {}",
        name,
        want,
        idx + 1,
        got.type_name()
    ))
}

pub fn want_int(name: &str, args: &[Value], idx: usize) -> Result<i64, RuntimeError> {
    match &args[idx] {
        Value::Int(i) => Ok(*i),
        other => Err(shape_error(name, idx, "int", other)),
    }
}

pub fn want_float(name: &str, args: &[Value], idx: usize) -> Result<f64, RuntimeError> {
    match &args[idx] {
        Value::Float(f) => Ok(*f),
        other => Err(shape_error(name, idx, "float", other)),
    }
}

pub fn want_bool(name: &str, args: &[Value], idx: usize) -> Result<bool, RuntimeError> {
    match &args[idx] {
        Value::Bool(b) => Ok(*b),
        other => Err(shape_error(name, idx, "bool", other)),
    }
}

pub fn want_str<'a>(
    name: &str,
    args: &'a [Value],
    idx: usize,
) -> Result<&'a Arc<BpString>, RuntimeError> {
    match &args[idx] {
        Value::Str(s) => Ok(s),
        other => Err(shape_error(name, idx, "str", other)),
    }
}

pub fn want_array<'a>(
    name: &str,
    args: &'a [Value],
    idx: usize,
) -> Result<&'a Arc<Mutex<Array>>, RuntimeError> {
    match &args[idx] {
        Value::Array(a) => Ok(a),
        other => Err(shape_error(name, idx, "array", other)),
    }
}

pub fn want_map<'a>(
    name: &str,
    args: &'a [Value],
    idx: usize,
) -> Result<&'a Arc<Mutex<Map>>, RuntimeError> {
    match &args[idx] {
        Value::Map(m) => Ok(m),
        other => Err(shape_error(name, idx, "map", other)),
    }
}

pub fn want_struct<'a>(
    name: &str,
    args: &'a [Value],
    idx: usize,
) -> Result<&'a Arc<Mutex<StructData>>, RuntimeError> {
    match &args[idx] {
        Value::Struct(s) => Ok(s),
        other => Err(shape_error(name, idx, "struct", other)),
    }
}

pub fn want_ptr(name: &str, args: &[Value], idx: usize) -> Result<u64, RuntimeError> {
    match &args[idx] {
        Value::Ptr(p) => Ok(*p),
        other => Err(shape_error(name, idx, "ptr", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argc_mismatch_names_builtin() {
        let err = want_argc("str_upper", &[], 1).unwrap_err();
        assert_eq!(err.message(), "str_upper: expected 1 argument, got 0");
        let err = want_argc("pad_left", &[Value::Null], 3).unwrap_err();
        assert_eq!(err.message(), "pad_left: expected 3 arguments, got 1");
    }

    #[test]
    fn test_shape_mismatch_names_variant() {
        let args = vec![Value::Int(1)];
        let err = want_str("str_upper", &args, 0).unwrap_err();
        assert_eq!(err.message(), "str_upper: expected str at argument 1, got int");
    }

    #[test]
    fn test_want_int_accepts_int_only() {
        let args = vec![Value::Float(1.0)];
        assert!(want_int("abs", &args, 0).is_err());
        let args = vec![Value::Int(-3)];
        assert_eq!(want_int("abs", &args, 0).unwrap(), -3);
    }
}
