//! Map builtins.
//!
//! Lookup misses return the `Null` sentinel; `map_has_key` tells a miss
//! apart from a stored `Null`. Keys outside `{Int, Float, Bool, Str, Null}`
//! are accepted but hash to 0 (weak keys). A map cannot be stored directly
//! inside itself, same policy as arrays.

use crate::error::{BuiltinResult, RuntimeError, want_argc, want_int, want_map};
use bp_core::{Map, Value, lock_container};
use std::sync::{Arc, Mutex};

fn reject_self_insert(
    name: &str,
    target: &Arc<Mutex<Map>>,
    v: &Value,
) -> Result<(), RuntimeError> {
    if let Value::Map(other) = v {
        if Arc::ptr_eq(target, other) {
            return Err(RuntimeError::new(format!(
                "{}: container cannot contain itself",
                name
            )));
        }
    }
    Ok(())
}

pub fn map_new(args: &[Value]) -> BuiltinResult {
    want_argc("map_new", args, 1)?;
    let cap = want_int("map_new", args, 0)?;
    if cap < 0 {
        return Err(RuntimeError::new(format!(
            "map_new: capacity must be non-negative, got {}",
            cap
        )));
    }
    Ok(Value::map(cap as usize))
}

pub fn map_len(args: &[Value]) -> BuiltinResult {
    want_argc("map_len", args, 1)?;
    let map = want_map("map_len", args, 0)?;
    Ok(Value::Int(lock_container(map).len() as i64))
}

pub fn map_get(args: &[Value]) -> BuiltinResult {
    want_argc("map_get", args, 2)?;
    let map = want_map("map_get", args, 0)?;
    Ok(lock_container(map).get(&args[1]).unwrap_or(Value::Null))
}

pub fn map_set(args: &[Value]) -> BuiltinResult {
    want_argc("map_set", args, 3)?;
    let map = want_map("map_set", args, 0)?;
    reject_self_insert("map_set", map, &args[1])?;
    reject_self_insert("map_set", map, &args[2])?;
    lock_container(map).set(args[1].clone(), args[2].clone());
    Ok(Value::Null)
}

pub fn map_has_key(args: &[Value]) -> BuiltinResult {
    want_argc("map_has_key", args, 2)?;
    let map = want_map("map_has_key", args, 0)?;
    Ok(Value::Bool(lock_container(map).has_key(&args[1])))
}

pub fn map_delete(args: &[Value]) -> BuiltinResult {
    want_argc("map_delete", args, 2)?;
    let map = want_map("map_delete", args, 0)?;
    Ok(Value::Bool(lock_container(map).delete(&args[1])))
}

pub fn map_keys(args: &[Value]) -> BuiltinResult {
    want_argc("map_keys", args, 1)?;
    let map = want_map("map_keys", args, 0)?;
    Ok(Value::array_from(lock_container(map).keys()))
}

pub fn map_values(args: &[Value]) -> BuiltinResult {
    want_argc("map_values", args, 1)?;
    let map = want_map("map_values", args, 0)?;
    Ok(Value::array_from(lock_container(map).values()))
}
