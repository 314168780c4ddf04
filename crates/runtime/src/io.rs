//! I/O builtins and the canonical value renderer.
//!
//! One formatter serves `print`, `to_str` and the container renderings:
//! ints in decimal, floats in shortest round-trip form, `true`/`false`,
//! `null`, arrays as `[e1, e2]`, maps as `{k: v}` in slot order, handles as
//! `<ptr:0x...>`. Rendering works on bytes end to end so non-UTF-8 string
//! content passes through untouched.

use crate::error::{BuiltinResult, want_argc, want_str};
use bp_core::{Value, lock_container};
use std::io::{BufRead, Write};

/// Shortest readable float form: `Display` for finite values (round-trip
/// exact), `inf`/`-inf`/`nan` spelled out.
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else {
        f.to_string()
    }
}

/// Canonical rendering of one value, appended to `out`.
pub fn render_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Int(i) => out.extend_from_slice(i.to_string().as_bytes()),
        Value::Float(f) => out.extend_from_slice(format_float(*f).as_bytes()),
        Value::Bool(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
        Value::Null => out.extend_from_slice(b"null"),
        Value::Str(s) => out.extend_from_slice(s.as_bytes()),
        Value::Array(arr) => {
            out.push(b'[');
            let arr = lock_container(arr);
            for (i, item) in arr.iter().enumerate() {
                if i > 0 {
                    out.extend_from_slice(b", ");
                }
                render_value(item, out);
            }
            out.push(b']');
        }
        Value::Map(map) => {
            out.push(b'{');
            let map = lock_container(map);
            for (i, (k, v)) in map.iter().enumerate() {
                if i > 0 {
                    out.extend_from_slice(b", ");
                }
                render_value(k, out);
                out.extend_from_slice(b": ");
                render_value(v, out);
            }
            out.push(b'}');
        }
        Value::Struct(s) => {
            let s = lock_container(s);
            match s.tag() {
                Some(Value::Str(tag)) => {
                    out.extend_from_slice(b"<struct:");
                    out.extend_from_slice(tag.as_bytes());
                    out.push(b'>');
                }
                Some(Value::Int(tag)) => {
                    out.extend_from_slice(format!("<struct:{}>", tag).as_bytes());
                }
                _ => out.extend_from_slice(b"<struct>"),
            }
        }
        Value::Class(c) => out.extend_from_slice(format!("<class:{}>", c.name).as_bytes()),
        Value::Ptr(p) => out.extend_from_slice(format!("<ptr:0x{:x}>", p).as_bytes()),
        Value::Func(id) => out.extend_from_slice(format!("<fn:{}>", id).as_bytes()),
    }
}

/// Render to an owned byte buffer.
pub fn render_to_bytes(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    render_value(value, &mut out);
    out
}

/// `print(...)`: arguments space-separated, newline-terminated.
pub fn print(args: &[Value]) -> BuiltinResult {
    let mut out = Vec::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push(b' ');
        }
        render_value(arg, &mut out);
    }
    out.push(b'\n');
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    let _ = lock.write_all(&out);
    let _ = lock.flush();
    Ok(Value::Null)
}

/// `read_line()`: one line from stdin with the trailing `\r?\n` trimmed,
/// `Null` at end of input.
pub fn read_line(args: &[Value]) -> BuiltinResult {
    want_argc("read_line", args, 0)?;
    let stdin = std::io::stdin();
    let mut buf = Vec::new();
    match stdin.lock().read_until(b'\n', &mut buf) {
        Ok(0) => Ok(Value::Null),
        Ok(_) => {
            if buf.last() == Some(&b'\n') {
                buf.pop();
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
            }
            Ok(Value::str(buf))
        }
        Err(_) => Ok(Value::Null),
    }
}

/// `to_str(v)`: canonical rendering as a string.
pub fn to_str(args: &[Value]) -> BuiltinResult {
    want_argc("to_str", args, 1)?;
    Ok(Value::str(render_to_bytes(&args[0])))
}

/// `str_concat(a, b)`.
pub fn str_concat(args: &[Value]) -> BuiltinResult {
    want_argc("str_concat", args, 2)?;
    let a = want_str("str_concat", args, 0)?;
    let b = want_str("str_concat", args, 1)?;
    Ok(Value::Str(std::sync::Arc::new(a.concat(b))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(v: &Value) -> String {
        String::from_utf8(render_to_bytes(v)).unwrap()
    }

    #[test]
    fn test_scalar_renderings() {
        assert_eq!(rendered(&Value::Int(-42)), "-42");
        assert_eq!(rendered(&Value::Bool(true)), "true");
        assert_eq!(rendered(&Value::Bool(false)), "false");
        assert_eq!(rendered(&Value::Null), "null");
        assert_eq!(rendered(&Value::str("hi")), "hi");
    }

    #[test]
    fn test_float_renderings() {
        assert_eq!(rendered(&Value::Float(3.14)), "3.14");
        assert_eq!(rendered(&Value::Float(1.0)), "1");
        assert_eq!(rendered(&Value::Float(f64::NAN)), "nan");
        assert_eq!(rendered(&Value::Float(f64::INFINITY)), "inf");
        assert_eq!(rendered(&Value::Float(f64::NEG_INFINITY)), "-inf");
    }

    #[test]
    fn test_array_rendering() {
        let arr = Value::array_from(vec![Value::Int(1), Value::str("x"), Value::Null]);
        assert_eq!(rendered(&arr), "[1, x, null]");
    }

    #[test]
    fn test_map_rendering_slot_order() {
        let m = Value::map(0);
        if let Value::Map(map) = &m {
            let mut map = lock_container(map);
            map.set(Value::str("a"), Value::Int(1));
        }
        assert_eq!(rendered(&m), "{a: 1}");
    }

    #[test]
    fn test_ptr_and_func_renderings() {
        assert_eq!(rendered(&Value::Ptr(0x2a)), "<ptr:0x2a>");
        assert_eq!(rendered(&Value::Func(7)), "<fn:7>");
    }

    #[test]
    fn test_struct_rendering_uses_tag() {
        let s = Value::struct_new(None, 2);
        if let Value::Struct(data) = &s {
            lock_container(data).set(0, Value::str("Cons"));
        }
        assert_eq!(rendered(&s), "<struct:Cons>");
        let untagged = Value::struct_new(None, 0);
        assert_eq!(rendered(&untagged), "<struct>");
    }

    #[test]
    fn test_to_str_builtin() {
        let out = to_str(&[Value::Int(5)]).unwrap();
        assert_eq!(out, Value::str("5"));
        assert!(to_str(&[]).is_err());
    }

    #[test]
    fn test_str_concat_builtin() {
        let out = str_concat(&[Value::str("foo"), Value::str("bar")]).unwrap();
        assert_eq!(out, Value::str("foobar"));
        assert!(str_concat(&[Value::str("a"), Value::Int(1)]).is_err());
    }
}
