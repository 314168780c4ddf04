//! Integer math and bitwise builtins.
//!
//! All operations are `i64`-typed with two's complement wrapping where
//! overflow is representable. `floor`, `ceil` and `round` on ints are the
//! identity; the float lane lives in `float_ops`.

use crate::error::{BuiltinResult, RuntimeError, want_argc, want_int};
use bp_core::Value;

pub fn abs(args: &[Value]) -> BuiltinResult {
    want_argc("abs", args, 1)?;
    Ok(Value::Int(want_int("abs", args, 0)?.wrapping_abs()))
}

pub fn min(args: &[Value]) -> BuiltinResult {
    want_argc("min", args, 2)?;
    let a = want_int("min", args, 0)?;
    let b = want_int("min", args, 1)?;
    Ok(Value::Int(a.min(b)))
}

pub fn max(args: &[Value]) -> BuiltinResult {
    want_argc("max", args, 2)?;
    let a = want_int("max", args, 0)?;
    let b = want_int("max", args, 1)?;
    Ok(Value::Int(a.max(b)))
}

pub fn pow(args: &[Value]) -> BuiltinResult {
    want_argc("pow", args, 2)?;
    let base = want_int("pow", args, 0)?;
    let exp = want_int("pow", args, 1)?;
    if exp < 0 {
        return Err(RuntimeError::new(format!(
            "pow: exponent must be non-negative, got {}",
            exp
        )));
    }
    if exp > u32::MAX as i64 {
        return Err(RuntimeError::new(format!(
            "pow: exponent too large, got {}",
            exp
        )));
    }
    Ok(Value::Int(base.wrapping_pow(exp as u32)))
}

/// Integer square root (floor).
pub fn sqrt(args: &[Value]) -> BuiltinResult {
    want_argc("sqrt", args, 1)?;
    let n = want_int("sqrt", args, 0)?;
    if n < 0 {
        return Err(RuntimeError::new(format!(
            "sqrt: argument must be non-negative, got {}",
            n
        )));
    }
    // Float estimate, then correct for rounding at the top of the range.
    let mut r = (n as f64).sqrt() as i64;
    while r > 0 && r.wrapping_mul(r) > n {
        r -= 1;
    }
    while (r + 1).checked_mul(r + 1).is_some_and(|sq| sq <= n) {
        r += 1;
    }
    Ok(Value::Int(r))
}

pub fn floor(args: &[Value]) -> BuiltinResult {
    want_argc("floor", args, 1)?;
    Ok(Value::Int(want_int("floor", args, 0)?))
}

pub fn ceil(args: &[Value]) -> BuiltinResult {
    want_argc("ceil", args, 1)?;
    Ok(Value::Int(want_int("ceil", args, 0)?))
}

pub fn round(args: &[Value]) -> BuiltinResult {
    want_argc("round", args, 1)?;
    Ok(Value::Int(want_int("round", args, 0)?))
}

pub fn clamp(args: &[Value]) -> BuiltinResult {
    want_argc("clamp", args, 3)?;
    let v = want_int("clamp", args, 0)?;
    let lo = want_int("clamp", args, 1)?;
    let hi = want_int("clamp", args, 2)?;
    if lo > hi {
        return Err(RuntimeError::new(format!(
            "clamp: empty range [{}, {}]",
            lo, hi
        )));
    }
    Ok(Value::Int(v.max(lo).min(hi)))
}

pub fn sign(args: &[Value]) -> BuiltinResult {
    want_argc("sign", args, 1)?;
    Ok(Value::Int(want_int("sign", args, 0)?.signum()))
}

pub fn bit_and(args: &[Value]) -> BuiltinResult {
    want_argc("bit_and", args, 2)?;
    Ok(Value::Int(
        want_int("bit_and", args, 0)? & want_int("bit_and", args, 1)?,
    ))
}

pub fn bit_or(args: &[Value]) -> BuiltinResult {
    want_argc("bit_or", args, 2)?;
    Ok(Value::Int(
        want_int("bit_or", args, 0)? | want_int("bit_or", args, 1)?,
    ))
}

pub fn bit_xor(args: &[Value]) -> BuiltinResult {
    want_argc("bit_xor", args, 2)?;
    Ok(Value::Int(
        want_int("bit_xor", args, 0)? ^ want_int("bit_xor", args, 1)?,
    ))
}

pub fn bit_not(args: &[Value]) -> BuiltinResult {
    want_argc("bit_not", args, 1)?;
    Ok(Value::Int(!want_int("bit_not", args, 0)?))
}

/// Shift count is masked to the word width.
pub fn shl(args: &[Value]) -> BuiltinResult {
    want_argc("shl", args, 2)?;
    let v = want_int("shl", args, 0)?;
    let n = want_int("shl", args, 1)?;
    Ok(Value::Int(v.wrapping_shl(n as u32)))
}

/// Arithmetic (sign-extending) right shift, count masked to word width.
pub fn shr(args: &[Value]) -> BuiltinResult {
    want_argc("shr", args, 2)?;
    let v = want_int("shr", args, 0)?;
    let n = want_int("shr", args, 1)?;
    Ok(Value::Int(v.wrapping_shr(n as u32)))
}
