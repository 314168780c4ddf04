//! String builtins.
//!
//! Every operation works on bytes. Case mapping is ASCII-only, `find`
//! returns byte offsets, and length means byte count throughout. Fatal
//! shape errors name the builtin and the expected argument.

use crate::error::{BuiltinResult, RuntimeError, want_argc, want_array, want_int, want_str};
use bp_core::{BpString, Value, lock_container};
use std::sync::Arc;

/// Upper bound for `str_repeat` counts.
pub const MAX_REPEAT: i64 = 1000;

fn str_value(bytes: Vec<u8>) -> Value {
    Value::Str(Arc::new(BpString::from_bytes(bytes)))
}

/// Byte offset of the first occurrence of `needle` in `haystack`, or -1.
/// An empty needle matches at offset 0.
fn find_bytes(haystack: &[u8], needle: &[u8]) -> i64 {
    if needle.is_empty() {
        return 0;
    }
    if needle.len() > haystack.len() {
        return -1;
    }
    haystack
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i as i64)
        .unwrap_or(-1)
}

pub fn upper(args: &[Value]) -> BuiltinResult {
    want_argc("str_upper", args, 1)?;
    let s = want_str("str_upper", args, 0)?;
    Ok(str_value(s.as_bytes().to_ascii_uppercase()))
}

pub fn lower(args: &[Value]) -> BuiltinResult {
    want_argc("str_lower", args, 1)?;
    let s = want_str("str_lower", args, 0)?;
    Ok(str_value(s.as_bytes().to_ascii_lowercase()))
}

pub fn trim(args: &[Value]) -> BuiltinResult {
    want_argc("str_trim", args, 1)?;
    let s = want_str("str_trim", args, 0)?;
    let bytes = s.as_bytes();
    let is_space = |b: &u8| matches!(b, b' ' | b'\t' | b'\r' | b'\n');
    let start = bytes.iter().position(|b| !is_space(b)).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !is_space(b)).map_or(start, |i| i + 1);
    Ok(str_value(bytes[start..end].to_vec()))
}

pub fn starts_with(args: &[Value]) -> BuiltinResult {
    want_argc("starts_with", args, 2)?;
    let s = want_str("starts_with", args, 0)?;
    let prefix = want_str("starts_with", args, 1)?;
    Ok(Value::Bool(s.as_bytes().starts_with(prefix.as_bytes())))
}

pub fn ends_with(args: &[Value]) -> BuiltinResult {
    want_argc("ends_with", args, 2)?;
    let s = want_str("ends_with", args, 0)?;
    let suffix = want_str("ends_with", args, 1)?;
    Ok(Value::Bool(s.as_bytes().ends_with(suffix.as_bytes())))
}

pub fn find(args: &[Value]) -> BuiltinResult {
    want_argc("str_find", args, 2)?;
    let s = want_str("str_find", args, 0)?;
    let needle = want_str("str_find", args, 1)?;
    Ok(Value::Int(find_bytes(s.as_bytes(), needle.as_bytes())))
}

/// First occurrence only; the remainder of the string is untouched.
pub fn replace(args: &[Value]) -> BuiltinResult {
    want_argc("str_replace", args, 3)?;
    let s = want_str("str_replace", args, 0)?;
    let from = want_str("str_replace", args, 1)?;
    let to = want_str("str_replace", args, 2)?;
    if from.is_empty() {
        return Ok(args[0].clone());
    }
    match find_bytes(s.as_bytes(), from.as_bytes()) {
        -1 => Ok(args[0].clone()),
        at => {
            let at = at as usize;
            let mut out = Vec::with_capacity(s.len() - from.len() + to.len());
            out.extend_from_slice(&s.as_bytes()[..at]);
            out.extend_from_slice(to.as_bytes());
            out.extend_from_slice(&s.as_bytes()[at + from.len()..]);
            Ok(str_value(out))
        }
    }
}

pub fn reverse(args: &[Value]) -> BuiltinResult {
    want_argc("str_reverse", args, 1)?;
    let s = want_str("str_reverse", args, 0)?;
    let mut bytes = s.as_bytes().to_vec();
    bytes.reverse();
    Ok(str_value(bytes))
}

pub fn repeat(args: &[Value]) -> BuiltinResult {
    want_argc("str_repeat", args, 2)?;
    let s = want_str("str_repeat", args, 0)?;
    let count = want_int("str_repeat", args, 1)?;
    if count < 0 {
        return Err(RuntimeError::new(format!(
            "str_repeat: count must be non-negative, got {}",
            count
        )));
    }
    if count > MAX_REPEAT {
        return Err(RuntimeError::new(format!(
            "str_repeat: count too large (max {}), got {}",
            MAX_REPEAT, count
        )));
    }
    let mut out = Vec::with_capacity(s.len() * count as usize);
    for _ in 0..count {
        out.extend_from_slice(s.as_bytes());
    }
    Ok(str_value(out))
}

fn pad(name: &str, args: &[Value], left: bool) -> BuiltinResult {
    want_argc(name, args, 3)?;
    let s = want_str(name, args, 0)?;
    let width = want_int(name, args, 1)?;
    let pad = want_str(name, args, 2)?;
    if pad.is_empty() {
        return Err(RuntimeError::new(format!("{}: pad string is empty", name)));
    }
    let width = width.max(0) as usize;
    if s.len() >= width {
        return Ok(args[0].clone());
    }
    // The pad cycles byte by byte when it is longer than one byte.
    let fill: Vec<u8> = pad
        .as_bytes()
        .iter()
        .cycle()
        .take(width - s.len())
        .copied()
        .collect();
    let mut out = Vec::with_capacity(width);
    if left {
        out.extend_from_slice(&fill);
        out.extend_from_slice(s.as_bytes());
    } else {
        out.extend_from_slice(s.as_bytes());
        out.extend_from_slice(&fill);
    }
    Ok(str_value(out))
}

pub fn pad_left(args: &[Value]) -> BuiltinResult {
    pad("pad_left", args, true)
}

pub fn pad_right(args: &[Value]) -> BuiltinResult {
    pad("pad_right", args, false)
}

pub fn contains(args: &[Value]) -> BuiltinResult {
    want_argc("str_contains", args, 2)?;
    let s = want_str("str_contains", args, 0)?;
    let needle = want_str("str_contains", args, 1)?;
    Ok(Value::Bool(find_bytes(s.as_bytes(), needle.as_bytes()) >= 0))
}

/// Non-overlapping occurrence count; an empty needle counts zero.
pub fn count(args: &[Value]) -> BuiltinResult {
    want_argc("str_count", args, 2)?;
    let s = want_str("str_count", args, 0)?;
    let needle = want_str("str_count", args, 1)?;
    if needle.is_empty() {
        return Ok(Value::Int(0));
    }
    let (hay, pat) = (s.as_bytes(), needle.as_bytes());
    let mut n = 0i64;
    let mut at = 0usize;
    while at + pat.len() <= hay.len() {
        if &hay[at..at + pat.len()] == pat {
            n += 1;
            at += pat.len();
        } else {
            at += 1;
        }
    }
    Ok(Value::Int(n))
}

/// One-byte string, or the empty string when out of range.
pub fn char_at(args: &[Value]) -> BuiltinResult {
    want_argc("char_at", args, 2)?;
    let s = want_str("char_at", args, 0)?;
    let idx = want_int("char_at", args, 1)?;
    if idx < 0 || idx as usize >= s.len() {
        return Ok(str_value(Vec::new()));
    }
    Ok(str_value(vec![s.as_bytes()[idx as usize]]))
}

/// Alias of `str_find`.
pub fn index_of(args: &[Value]) -> BuiltinResult {
    want_argc("index_of", args, 2)?;
    let s = want_str("index_of", args, 0)?;
    let needle = want_str("index_of", args, 1)?;
    Ok(Value::Int(find_bytes(s.as_bytes(), needle.as_bytes())))
}

/// ASCII only: codes outside `[0, 127]` are fatal.
pub fn chr(args: &[Value]) -> BuiltinResult {
    want_argc("chr", args, 1)?;
    let code = want_int("chr", args, 0)?;
    if !(0..=127).contains(&code) {
        return Err(RuntimeError::new(format!(
            "chr: code must be in [0, 127], got {}",
            code
        )));
    }
    Ok(str_value(vec![code as u8]))
}

/// First byte of the string.
pub fn ord(args: &[Value]) -> BuiltinResult {
    want_argc("ord", args, 1)?;
    let s = want_str("ord", args, 0)?;
    match s.as_bytes().first() {
        Some(&b) => Ok(Value::Int(i64::from(b))),
        None => Err(RuntimeError::new("ord: empty string")),
    }
}

/// Lowercase hex of the two's complement bit pattern.
pub fn int_to_hex(args: &[Value]) -> BuiltinResult {
    want_argc("int_to_hex", args, 1)?;
    let v = want_int("int_to_hex", args, 0)?;
    Ok(str_value(format!("{:x}", v).into_bytes()))
}

/// Parse hex (optional `0x` prefix). Malformed input is a recoverable
/// `Null`, not an error.
pub fn hex_to_int(args: &[Value]) -> BuiltinResult {
    want_argc("hex_to_int", args, 1)?;
    let s = want_str("hex_to_int", args, 0)?;
    let text = s.to_string_lossy();
    let digits = text
        .trim()
        .strip_prefix("0x")
        .or_else(|| text.trim().strip_prefix("0X"))
        .unwrap_or(text.trim());
    match u64::from_str_radix(digits, 16) {
        Ok(v) => Ok(Value::Int(v as i64)),
        Err(_) => Ok(Value::Null),
    }
}

/// Split on a separator; an empty separator splits into single bytes.
pub fn split_str(args: &[Value]) -> BuiltinResult {
    want_argc("split_str", args, 2)?;
    let s = want_str("split_str", args, 0)?;
    let sep = want_str("split_str", args, 1)?;
    let bytes = s.as_bytes();
    let mut parts = Vec::new();
    if sep.is_empty() {
        for &b in bytes {
            parts.push(str_value(vec![b]));
        }
        return Ok(Value::array_from(parts));
    }
    let pat = sep.as_bytes();
    let mut start = 0usize;
    let mut at = 0usize;
    while at + pat.len() <= bytes.len() {
        if &bytes[at..at + pat.len()] == pat {
            parts.push(str_value(bytes[start..at].to_vec()));
            at += pat.len();
            start = at;
        } else {
            at += 1;
        }
    }
    parts.push(str_value(bytes[start..].to_vec()));
    Ok(Value::array_from(parts))
}

/// Join an array of strings with a separator.
pub fn join_arr(args: &[Value]) -> BuiltinResult {
    want_argc("join_arr", args, 2)?;
    let arr = want_array("join_arr", args, 0)?;
    let sep = want_str("join_arr", args, 1)?;
    let arr = lock_container(arr);
    let mut out = Vec::new();
    for (i, item) in arr.iter().enumerate() {
        let Value::Str(s) = item else {
            return Err(RuntimeError::new(format!(
                "join_arr: expected array of str, element {} is {}",
                i,
                item.type_name()
            )));
        };
        if i > 0 {
            out.extend_from_slice(sep.as_bytes());
        }
        out.extend_from_slice(s.as_bytes());
    }
    Ok(str_value(out))
}

/// Concatenate an array of strings.
pub fn concat_all(args: &[Value]) -> BuiltinResult {
    want_argc("concat_all", args, 1)?;
    let arr = want_array("concat_all", args, 0)?;
    let arr = lock_container(arr);
    let mut out = Vec::new();
    for (i, item) in arr.iter().enumerate() {
        let Value::Str(s) = item else {
            return Err(RuntimeError::new(format!(
                "concat_all: expected array of str, element {} is {}",
                i,
                item.type_name()
            )));
        };
        out.extend_from_slice(s.as_bytes());
    }
    Ok(str_value(out))
}

/// Build a string from an array of byte values (each masked to 0xFF).
pub fn str_from_chars(args: &[Value]) -> BuiltinResult {
    want_argc("str_from_chars", args, 1)?;
    let arr = want_array("str_from_chars", args, 0)?;
    let arr = lock_container(arr);
    let mut out = Vec::with_capacity(arr.len());
    for (i, item) in arr.iter().enumerate() {
        let Value::Int(b) = item else {
            return Err(RuntimeError::new(format!(
                "str_from_chars: expected array of int, element {} is {}",
                i,
                item.type_name()
            )));
        };
        out.push((*b & 0xff) as u8);
    }
    Ok(str_value(out))
}

/// Explode a string into an array of byte values.
pub fn str_bytes(args: &[Value]) -> BuiltinResult {
    want_argc("str_bytes", args, 1)?;
    let s = want_str("str_bytes", args, 0)?;
    Ok(Value::array_from(
        s.as_bytes().iter().map(|&b| Value::Int(i64::from(b))).collect(),
    ))
}

pub fn str_len(args: &[Value]) -> BuiltinResult {
    want_argc("str_len", args, 1)?;
    let s = want_str("str_len", args, 0)?;
    Ok(Value::Int(s.len() as i64))
}

/// Clamping substring: never fails.
pub fn substr(args: &[Value]) -> BuiltinResult {
    want_argc("substr", args, 3)?;
    let s = want_str("substr", args, 0)?;
    let start = want_int("substr", args, 1)?;
    let length = want_int("substr", args, 2)?;
    Ok(Value::Str(Arc::new(s.substring(start, length))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::str(text)
    }

    fn as_text(v: &Value) -> String {
        match v {
            Value::Str(s) => s.to_string_lossy().into_owned(),
            other => panic!("expected str, got {:?}", other),
        }
    }

    #[test]
    fn test_case_mapping_is_ascii_only() {
        assert_eq!(as_text(&upper(&[s("abÿc")]).unwrap()), "ABÿC");
        assert_eq!(as_text(&lower(&[s("AbC")]).unwrap()), "abc");
    }

    #[test]
    fn test_trim() {
        assert_eq!(as_text(&trim(&[s("  hi\r\n")]).unwrap()), "hi");
        assert_eq!(as_text(&trim(&[s("\t \n")]).unwrap()), "");
        assert_eq!(as_text(&trim(&[s("x")]).unwrap()), "x");
    }

    #[test]
    fn test_find_semantics() {
        assert_eq!(find(&[s("hello"), s("ll")]).unwrap(), Value::Int(2));
        assert_eq!(find(&[s("hello"), s("zz")]).unwrap(), Value::Int(-1));
        assert_eq!(find(&[s("hello"), s("")]).unwrap(), Value::Int(0));
        assert_eq!(find(&[s(""), s("x")]).unwrap(), Value::Int(-1));
    }

    #[test]
    fn test_replace_first_only() {
        let out = replace(&[s("a-b-c"), s("-"), s("+")]).unwrap();
        assert_eq!(as_text(&out), "a+b-c");
        let miss = replace(&[s("abc"), s("z"), s("+")]).unwrap();
        assert_eq!(as_text(&miss), "abc");
        let empty = replace(&[s("abc"), s(""), s("+")]).unwrap();
        assert_eq!(as_text(&empty), "abc");
    }

    #[test]
    fn test_repeat_limits() {
        assert_eq!(as_text(&repeat(&[s("ab"), Value::Int(3)]).unwrap()), "ababab");
        assert_eq!(as_text(&repeat(&[s("x"), Value::Int(0)]).unwrap()), "");
        assert!(repeat(&[s("x"), Value::Int(1001)]).is_err());
        assert!(repeat(&[s("x"), Value::Int(-1)]).is_err());
    }

    #[test]
    fn test_pad_cycles_multichar_pad() {
        let out = pad_left(&[s("7"), Value::Int(6), s("ab")]).unwrap();
        assert_eq!(as_text(&out), "ababa7");
        let out = pad_right(&[s("7"), Value::Int(4), s("xy")]).unwrap();
        assert_eq!(as_text(&out), "7xyx");
        // Wide enough already: unchanged.
        let out = pad_left(&[s("abcdef"), Value::Int(3), s("-")]).unwrap();
        assert_eq!(as_text(&out), "abcdef");
        assert!(pad_left(&[s("x"), Value::Int(5), s("")]).is_err());
    }

    #[test]
    fn test_count_non_overlapping() {
        assert_eq!(count(&[s("aaaa"), s("aa")]).unwrap(), Value::Int(2));
        assert_eq!(count(&[s("abcabc"), s("abc")]).unwrap(), Value::Int(2));
        assert_eq!(count(&[s("abc"), s("")]).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_char_at_bounds() {
        assert_eq!(as_text(&char_at(&[s("abc"), Value::Int(1)]).unwrap()), "b");
        assert_eq!(as_text(&char_at(&[s("abc"), Value::Int(3)]).unwrap()), "");
        assert_eq!(as_text(&char_at(&[s("abc"), Value::Int(-1)]).unwrap()), "");
    }

    #[test]
    fn test_chr_ord() {
        assert_eq!(as_text(&chr(&[Value::Int(65)]).unwrap()), "A");
        assert!(chr(&[Value::Int(128)]).is_err());
        assert!(chr(&[Value::Int(-1)]).is_err());
        assert_eq!(ord(&[s("A")]).unwrap(), Value::Int(65));
        assert!(ord(&[s("")]).is_err());
    }

    #[test]
    fn test_hex_roundtrip() {
        assert_eq!(as_text(&int_to_hex(&[Value::Int(255)]).unwrap()), "ff");
        assert_eq!(
            as_text(&int_to_hex(&[Value::Int(-1)]).unwrap()),
            "ffffffffffffffff"
        );
        assert_eq!(hex_to_int(&[s("ff")]).unwrap(), Value::Int(255));
        assert_eq!(hex_to_int(&[s("0x10")]).unwrap(), Value::Int(16));
        assert_eq!(hex_to_int(&[s("zz")]).unwrap(), Value::Null);
    }

    #[test]
    fn test_split_and_join() {
        let parts = split_str(&[s("a,b,,c"), s(",")]).unwrap();
        let Value::Array(arr) = &parts else { panic!() };
        let texts: Vec<String> = lock_container(arr).iter().map(as_text).collect();
        assert_eq!(texts, vec!["a", "b", "", "c"]);

        let joined = join_arr(&[parts, s("-")]).unwrap();
        assert_eq!(as_text(&joined), "a-b--c");
    }

    #[test]
    fn test_split_empty_sep_is_per_byte() {
        let parts = split_str(&[s("abc"), s("")]).unwrap();
        let Value::Array(arr) = &parts else { panic!() };
        let texts: Vec<String> = lock_container(arr).iter().map(as_text).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_bytes_roundtrip() {
        // str_bytes then str_from_chars is the identity, including non-UTF-8
        // bytes.
        let original = Value::str(vec![b'h', 0x00, b'i', 0xc3, 0xa9, 0xff]);
        let bytes = str_bytes(&[original.clone()]).unwrap();
        let back = str_from_chars(&[bytes]).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_concat_all() {
        let arr = Value::array_from(vec![s("a"), s("b"), s("c")]);
        assert_eq!(as_text(&concat_all(&[arr]).unwrap()), "abc");
        let bad = Value::array_from(vec![s("a"), Value::Int(1)]);
        assert!(concat_all(&[bad]).is_err());
    }

    #[test]
    fn test_substr_clamps() {
        assert_eq!(
            as_text(&substr(&[s("hello"), Value::Int(1), Value::Int(3)]).unwrap()),
            "ell"
        );
        assert_eq!(
            as_text(&substr(&[s("hello"), Value::Int(-2), Value::Int(2)]).unwrap()),
            "he"
        );
        assert_eq!(
            as_text(&substr(&[s("hello"), Value::Int(9), Value::Int(2)]).unwrap()),
            ""
        );
    }

    #[test]
    fn test_shape_errors_name_builtin() {
        let err = upper(&[Value::Int(1)]).unwrap_err();
        assert!(err.message().starts_with("str_upper:"));
        let err = find(&[s("a")]).unwrap_err();
        assert!(err.message().contains("expected 2 arguments"));
    }
}
