//! Array builtins.
//!
//! Thin wrappers over `bp_core::Array` that add the fatal-error policy:
//! out-of-range access and popping an empty array are programmer errors the
//! guest cannot handle, so they fail the run. Storing a container directly
//! inside itself is rejected; reference counting has no cycle collector, and
//! the direct case is cheap to catch at every mutation site.

use crate::error::{BuiltinResult, RuntimeError, want_argc, want_array, want_int};
use bp_core::{Array, Value, lock_container};
use std::sync::{Arc, Mutex};

/// Reject `v` when it is the same heap object as `target`.
pub(crate) fn reject_self_insert(
    name: &str,
    target: &Arc<Mutex<Array>>,
    v: &Value,
) -> Result<(), RuntimeError> {
    if let Value::Array(other) = v {
        if Arc::ptr_eq(target, other) {
            return Err(RuntimeError::new(format!(
                "{}: container cannot contain itself",
                name
            )));
        }
    }
    Ok(())
}

pub fn array_new(args: &[Value]) -> BuiltinResult {
    want_argc("array_new", args, 1)?;
    let cap = want_int("array_new", args, 0)?;
    if cap < 0 {
        return Err(RuntimeError::new(format!(
            "array_new: capacity must be non-negative, got {}",
            cap
        )));
    }
    Ok(Value::array(cap as usize))
}

pub fn array_len(args: &[Value]) -> BuiltinResult {
    want_argc("array_len", args, 1)?;
    let arr = want_array("array_len", args, 0)?;
    Ok(Value::Int(lock_container(arr).len() as i64))
}

pub fn array_push(args: &[Value]) -> BuiltinResult {
    want_argc("array_push", args, 2)?;
    let arr = want_array("array_push", args, 0)?;
    reject_self_insert("array_push", arr, &args[1])?;
    lock_container(arr).push(args[1].clone());
    Ok(Value::Null)
}

pub fn array_pop(args: &[Value]) -> BuiltinResult {
    want_argc("array_pop", args, 1)?;
    let arr = want_array("array_pop", args, 0)?;
    lock_container(arr)
        .pop()
        .ok_or_else(|| RuntimeError::new("array_pop: empty array"))
}

pub fn array_get(args: &[Value]) -> BuiltinResult {
    want_argc("array_get", args, 2)?;
    let arr = want_array("array_get", args, 0)?;
    let idx = want_int("array_get", args, 1)?;
    let arr = lock_container(arr);
    arr.get(idx).ok_or_else(|| {
        RuntimeError::new(format!(
            "array_get: index {} out of range (len {})",
            idx,
            arr.len()
        ))
    })
}

pub fn array_set(args: &[Value]) -> BuiltinResult {
    want_argc("array_set", args, 3)?;
    let arr = want_array("array_set", args, 0)?;
    let idx = want_int("array_set", args, 1)?;
    reject_self_insert("array_set", arr, &args[2])?;
    let mut arr = lock_container(arr);
    if !arr.set(idx, args[2].clone()) {
        return Err(RuntimeError::new(format!(
            "array_set: index {} out of range (len {})",
            idx,
            arr.len()
        )));
    }
    Ok(Value::Null)
}

pub fn array_insert(args: &[Value]) -> BuiltinResult {
    want_argc("array_insert", args, 3)?;
    let arr = want_array("array_insert", args, 0)?;
    let idx = want_int("array_insert", args, 1)?;
    reject_self_insert("array_insert", arr, &args[2])?;
    let mut arr = lock_container(arr);
    if !arr.insert(idx, args[2].clone()) {
        return Err(RuntimeError::new(format!(
            "array_insert: index {} out of range (len {})",
            idx,
            arr.len()
        )));
    }
    Ok(Value::Null)
}

pub fn array_remove(args: &[Value]) -> BuiltinResult {
    want_argc("array_remove", args, 2)?;
    let arr = want_array("array_remove", args, 0)?;
    let idx = want_int("array_remove", args, 1)?;
    let mut arr = lock_container(arr);
    let len = arr.len();
    arr.remove(idx).ok_or_else(|| {
        RuntimeError::new(format!(
            "array_remove: index {} out of range (len {})",
            idx, len
        ))
    })
}

pub fn array_slice(args: &[Value]) -> BuiltinResult {
    want_argc("array_slice", args, 3)?;
    let arr = want_array("array_slice", args, 0)?;
    let start = want_int("array_slice", args, 1)?;
    let length = want_int("array_slice", args, 2)?;
    let sliced = lock_container(arr).slice(start, length);
    Ok(Value::Array(Arc::new(Mutex::new(sliced))))
}

pub fn array_sort(args: &[Value]) -> BuiltinResult {
    want_argc("array_sort", args, 1)?;
    let arr = want_array("array_sort", args, 0)?;
    lock_container(arr).sort();
    Ok(Value::Null)
}

pub fn array_concat(args: &[Value]) -> BuiltinResult {
    want_argc("array_concat", args, 2)?;
    let a = want_array("array_concat", args, 0)?;
    let b = want_array("array_concat", args, 1)?;
    // Same payload on both sides: a single lock serves both reads. Distinct
    // payloads lock in address order so concurrent concats cannot deadlock.
    let merged = if Arc::ptr_eq(a, b) {
        let guard = lock_container(a);
        guard.concat(&guard)
    } else if (Arc::as_ptr(a) as usize) < (Arc::as_ptr(b) as usize) {
        let ga = lock_container(a);
        let gb = lock_container(b);
        ga.concat(&gb)
    } else {
        let gb = lock_container(b);
        let ga = lock_container(a);
        ga.concat(&gb)
    };
    Ok(Value::Array(Arc::new(Mutex::new(merged))))
}

pub fn array_copy(args: &[Value]) -> BuiltinResult {
    want_argc("array_copy", args, 1)?;
    let arr = want_array("array_copy", args, 0)?;
    let copied = lock_container(arr).copy();
    Ok(Value::Array(Arc::new(Mutex::new(copied))))
}

pub fn array_clear(args: &[Value]) -> BuiltinResult {
    want_argc("array_clear", args, 1)?;
    let arr = want_array("array_clear", args, 0)?;
    lock_container(arr).clear();
    Ok(Value::Null)
}

pub fn array_index_of(args: &[Value]) -> BuiltinResult {
    want_argc("array_index_of", args, 2)?;
    let arr = want_array("array_index_of", args, 0)?;
    Ok(Value::Int(lock_container(arr).index_of(&args[1])))
}

pub fn array_contains(args: &[Value]) -> BuiltinResult {
    want_argc("array_contains", args, 2)?;
    let arr = want_array("array_contains", args, 0)?;
    Ok(Value::Bool(lock_container(arr).contains(&args[1])))
}

pub fn array_reverse(args: &[Value]) -> BuiltinResult {
    want_argc("array_reverse", args, 1)?;
    let arr = want_array("array_reverse", args, 0)?;
    lock_container(arr).reverse();
    Ok(Value::Null)
}

pub fn array_fill(args: &[Value]) -> BuiltinResult {
    want_argc("array_fill", args, 2)?;
    let arr = want_array("array_fill", args, 0)?;
    reject_self_insert("array_fill", arr, &args[1])?;
    lock_container(arr).fill(args[1].clone());
    Ok(Value::Null)
}
