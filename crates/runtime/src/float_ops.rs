//! Floating-point builtins and the int/float conversions.
//!
//! Floats are IEEE 754 doubles. Transcendental functions delegate to the
//! host libm; `float_to_int` truncates with saturation (NaN converts to 0).

use crate::error::{BuiltinResult, want_argc, want_float, want_int};
use bp_core::Value;

fn unary(name: &'static str, args: &[Value], f: fn(f64) -> f64) -> BuiltinResult {
    want_argc(name, args, 1)?;
    Ok(Value::Float(f(want_float(name, args, 0)?)))
}

fn binary(name: &'static str, args: &[Value], f: fn(f64, f64) -> f64) -> BuiltinResult {
    want_argc(name, args, 2)?;
    Ok(Value::Float(f(
        want_float(name, args, 0)?,
        want_float(name, args, 1)?,
    )))
}

pub fn fsin(args: &[Value]) -> BuiltinResult {
    unary("fsin", args, f64::sin)
}

pub fn fcos(args: &[Value]) -> BuiltinResult {
    unary("fcos", args, f64::cos)
}

pub fn ftan(args: &[Value]) -> BuiltinResult {
    unary("ftan", args, f64::tan)
}

pub fn fatan(args: &[Value]) -> BuiltinResult {
    unary("fatan", args, f64::atan)
}

pub fn fatan2(args: &[Value]) -> BuiltinResult {
    binary("fatan2", args, f64::atan2)
}

pub fn fsqrt(args: &[Value]) -> BuiltinResult {
    unary("fsqrt", args, f64::sqrt)
}

pub fn fpow(args: &[Value]) -> BuiltinResult {
    binary("fpow", args, f64::powf)
}

/// Natural logarithm.
pub fn flog(args: &[Value]) -> BuiltinResult {
    unary("flog", args, f64::ln)
}

pub fn flog10(args: &[Value]) -> BuiltinResult {
    unary("flog10", args, f64::log10)
}

pub fn fexp(args: &[Value]) -> BuiltinResult {
    unary("fexp", args, f64::exp)
}

pub fn fabs(args: &[Value]) -> BuiltinResult {
    unary("fabs", args, f64::abs)
}

pub fn ffloor(args: &[Value]) -> BuiltinResult {
    unary("ffloor", args, f64::floor)
}

pub fn fceil(args: &[Value]) -> BuiltinResult {
    unary("fceil", args, f64::ceil)
}

/// Round half away from zero, like C `round`.
pub fn fround(args: &[Value]) -> BuiltinResult {
    unary("fround", args, f64::round)
}

pub fn fmin(args: &[Value]) -> BuiltinResult {
    binary("fmin", args, f64::min)
}

pub fn fmax(args: &[Value]) -> BuiltinResult {
    binary("fmax", args, f64::max)
}

pub fn int_to_float(args: &[Value]) -> BuiltinResult {
    want_argc("int_to_float", args, 1)?;
    Ok(Value::Float(want_int("int_to_float", args, 0)? as f64))
}

/// Truncate toward zero; saturates at the i64 range, NaN becomes 0.
pub fn float_to_int(args: &[Value]) -> BuiltinResult {
    want_argc("float_to_int", args, 1)?;
    Ok(Value::Int(want_float("float_to_int", args, 0)? as i64))
}

pub fn is_nan(args: &[Value]) -> BuiltinResult {
    want_argc("is_nan", args, 1)?;
    Ok(Value::Bool(want_float("is_nan", args, 0)?.is_nan()))
}

pub fn is_inf(args: &[Value]) -> BuiltinResult {
    want_argc("is_inf", args, 1)?;
    Ok(Value::Bool(want_float("is_inf", args, 0)?.is_infinite()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(v: f64) -> Value {
        Value::Float(v)
    }

    fn as_f(v: Value) -> f64 {
        match v {
            Value::Float(x) => x,
            other => panic!("expected float, got {:?}", other),
        }
    }

    #[test]
    fn test_trig_and_sqrt() {
        assert!((as_f(fsin(&[f(0.0)]).unwrap())).abs() < 1e-12);
        assert!((as_f(fcos(&[f(0.0)]).unwrap()) - 1.0).abs() < 1e-12);
        assert_eq!(as_f(fsqrt(&[f(9.0)]).unwrap()), 3.0);
        assert!(as_f(fsqrt(&[f(-1.0)]).unwrap()).is_nan());
    }

    #[test]
    fn test_logs_and_exp() {
        assert!((as_f(flog(&[f(std::f64::consts::E)]).unwrap()) - 1.0).abs() < 1e-12);
        assert_eq!(as_f(flog10(&[f(1000.0)]).unwrap()), 3.0);
        assert_eq!(as_f(fexp(&[f(0.0)]).unwrap()), 1.0);
    }

    #[test]
    fn test_rounding_family() {
        assert_eq!(as_f(ffloor(&[f(1.7)]).unwrap()), 1.0);
        assert_eq!(as_f(fceil(&[f(1.2)]).unwrap()), 2.0);
        assert_eq!(as_f(fround(&[f(2.5)]).unwrap()), 3.0);
        assert_eq!(as_f(fround(&[f(-2.5)]).unwrap()), -3.0);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(int_to_float(&[Value::Int(3)]).unwrap(), Value::Float(3.0));
        assert_eq!(float_to_int(&[f(3.9)]).unwrap(), Value::Int(3));
        assert_eq!(float_to_int(&[f(-3.9)]).unwrap(), Value::Int(-3));
        assert_eq!(float_to_int(&[f(f64::NAN)]).unwrap(), Value::Int(0));
        assert_eq!(float_to_int(&[f(1e300)]).unwrap(), Value::Int(i64::MAX));
    }

    #[test]
    fn test_nan_inf_predicates() {
        assert_eq!(is_nan(&[f(f64::NAN)]).unwrap(), Value::Bool(true));
        assert_eq!(is_nan(&[f(1.0)]).unwrap(), Value::Bool(false));
        assert_eq!(is_inf(&[f(f64::INFINITY)]).unwrap(), Value::Bool(true));
        assert_eq!(is_inf(&[f(1.0)]).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_float_shape_is_strict() {
        // Ints are not silently promoted; int_to_float is the conversion.
        assert!(fsin(&[Value::Int(0)]).is_err());
        assert!(fpow(&[f(1.0), Value::Int(2)]).is_err());
    }

    #[test]
    fn test_fmin_fmax() {
        assert_eq!(as_f(fmin(&[f(1.5), f(-2.0)]).unwrap()), -2.0);
        assert_eq!(as_f(fmax(&[f(1.5), f(-2.0)]).unwrap()), 1.5);
    }
}
