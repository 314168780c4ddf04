//! Regular expression builtins.
//!
//! Patterns compile per call with `regex::bytes`, which runs directly over
//! guest byte strings and cannot backtrack catastrophically. An invalid
//! pattern is never fatal; each builtin falls back to its benign default
//! (false, -1, input unchanged, singleton split, empty find list). The
//! match iterator advances past zero-length matches, so patterns like `a*`
//! terminate.

use crate::error::{BuiltinResult, want_argc, want_str};
use bp_core::{BpString, Value};
use regex::bytes::{NoExpand, Regex};
use std::sync::Arc;

/// Per-call compilation; `None` marks an invalid pattern (or one that is
/// not valid UTF-8, which the pattern language itself requires).
fn compile(pattern: &BpString) -> Option<Regex> {
    let text = std::str::from_utf8(pattern.as_bytes()).ok()?;
    Regex::new(text).ok()
}

fn str_value(bytes: Vec<u8>) -> Value {
    Value::Str(Arc::new(BpString::from_bytes(bytes)))
}

/// True when the pattern matches anywhere (no anchoring).
pub fn regex_match(args: &[Value]) -> BuiltinResult {
    want_argc("regex_match", args, 2)?;
    let text = want_str("regex_match", args, 0)?;
    let pattern = want_str("regex_match", args, 1)?;
    Ok(Value::Bool(match compile(pattern) {
        Some(re) => re.is_match(text.as_bytes()),
        None => false,
    }))
}

/// Byte offset of the first match, -1 on miss or invalid pattern.
pub fn regex_search(args: &[Value]) -> BuiltinResult {
    want_argc("regex_search", args, 2)?;
    let text = want_str("regex_search", args, 0)?;
    let pattern = want_str("regex_search", args, 1)?;
    let offset = compile(pattern)
        .and_then(|re| re.find(text.as_bytes()).map(|m| m.start() as i64))
        .unwrap_or(-1);
    Ok(Value::Int(offset))
}

/// Replace every non-overlapping match with a literal replacement (no
/// backreference expansion). Invalid pattern returns the input unchanged.
pub fn regex_replace(args: &[Value]) -> BuiltinResult {
    want_argc("regex_replace", args, 3)?;
    let text = want_str("regex_replace", args, 0)?;
    let pattern = want_str("regex_replace", args, 1)?;
    let replacement = want_str("regex_replace", args, 2)?;
    match compile(pattern) {
        Some(re) => Ok(str_value(
            re.replace_all(text.as_bytes(), NoExpand(replacement.as_bytes()))
                .into_owned(),
        )),
        None => Ok(args[0].clone()),
    }
}

/// Split around matches. Invalid pattern yields a singleton array holding
/// the input.
pub fn regex_split(args: &[Value]) -> BuiltinResult {
    want_argc("regex_split", args, 2)?;
    let text = want_str("regex_split", args, 0)?;
    let pattern = want_str("regex_split", args, 1)?;
    let parts = match compile(pattern) {
        Some(re) => re
            .split(text.as_bytes())
            .map(|part| str_value(part.to_vec()))
            .collect(),
        None => vec![args[0].clone()],
    };
    Ok(Value::array_from(parts))
}

/// All non-overlapping matched substrings; empty on invalid pattern.
pub fn regex_find_all(args: &[Value]) -> BuiltinResult {
    want_argc("regex_find_all", args, 2)?;
    let text = want_str("regex_find_all", args, 0)?;
    let pattern = want_str("regex_find_all", args, 1)?;
    let matches = match compile(pattern) {
        Some(re) => re
            .find_iter(text.as_bytes())
            .map(|m| str_value(m.as_bytes().to_vec()))
            .collect(),
        None => Vec::new(),
    };
    Ok(Value::array_from(matches))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bp_core::lock_container;

    fn s(text: &str) -> Value {
        Value::str(text)
    }

    fn texts(v: &Value) -> Vec<String> {
        let Value::Array(arr) = v else { panic!("expected array") };
        lock_container(arr)
            .iter()
            .map(|item| match item {
                Value::Str(s) => s.to_string_lossy().into_owned(),
                other => panic!("expected str, got {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_match_is_unanchored() {
        assert_eq!(
            regex_match(&[s("hello world"), s("wo.ld")]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            regex_match(&[s("hello"), s("^ell")]).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_search_offset() {
        assert_eq!(
            regex_search(&[s("a1 b2"), s("[0-9]")]).unwrap(),
            Value::Int(1)
        );
        assert_eq!(regex_search(&[s("abc"), s("[0-9]")]).unwrap(), Value::Int(-1));
    }

    #[test]
    fn test_replace_all_matches_literal() {
        let out = regex_replace(&[s("a1 b2 c3"), s("[0-9]"), s("X")]).unwrap();
        assert_eq!(out, s("aX bX cX"));
        // Replacement is literal: $0 is not expanded.
        let out = regex_replace(&[s("ab"), s("a"), s("$0")]).unwrap();
        assert_eq!(out, s("$0b"));
    }

    #[test]
    fn test_split() {
        let out = regex_split(&[s("a1b22c"), s("[0-9]+")]).unwrap();
        assert_eq!(texts(&out), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_find_all_scenario() {
        let out = regex_find_all(&[s("aaabaa"), s("a+")]).unwrap();
        assert_eq!(texts(&out), vec!["aaa", "aa"]);
    }

    #[test]
    fn test_zero_length_match_terminates() {
        let out = regex_find_all(&[s("ab"), s("x*")]).unwrap();
        // One (empty) match per position; the point is it terminates.
        assert_eq!(texts(&out).len(), 3);
    }

    #[test]
    fn test_invalid_pattern_defaults() {
        let bad = s("(unclosed");
        assert_eq!(
            regex_match(&[s("x"), bad.clone()]).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            regex_search(&[s("x"), bad.clone()]).unwrap(),
            Value::Int(-1)
        );
        assert_eq!(
            regex_replace(&[s("x"), bad.clone(), s("y")]).unwrap(),
            s("x")
        );
        assert_eq!(texts(&regex_split(&[s("x"), bad.clone()]).unwrap()), vec!["x"]);
        assert!(texts(&regex_find_all(&[s("x"), bad]).unwrap()).is_empty());
    }

    #[test]
    fn test_bytes_text_matches() {
        // Non-UTF-8 haystack is fine; the pattern works on bytes.
        let hay = Value::str(vec![0xff, b'a', b'1', 0xfe]);
        assert_eq!(
            regex_search(&[hay, s("[0-9]")]).unwrap(),
            Value::Int(2)
        );
    }
}
