//! JSON builtins.
//!
//! Hand-written recursive descent over the RFC 8259 subset the language
//! speaks: objects, arrays, strings with standard escapes (including
//! `\uXXXX`), numbers, `true`/`false`/`null`. No comments, no trailing
//! commas, no NaN/Infinity. The serializer is the inverse, emitting compact
//! canonical output with map entries in slot order.
//!
//! This is not delegated to a serde backend: guest strings are raw bytes
//! with no UTF-8 guarantee, numbers split into the int lane unless a
//! decimal point or exponent is present, and non-ASCII `\uXXXX` escapes
//! decode to `?` because strings have no code-point representation.

use crate::error::{BuiltinResult, want_argc, want_str};
use crate::io::format_float;
use bp_core::{Value, lock_container};

/// `json_parse(text)`: the parsed value, or `Null` on malformed input.
pub fn json_parse(args: &[Value]) -> BuiltinResult {
    want_argc("json_parse", args, 1)?;
    let text = want_str("json_parse", args, 0)?;
    let mut parser = Parser {
        bytes: text.as_bytes(),
        pos: 0,
    };
    parser.skip_ws();
    let Some(value) = parser.parse_value() else {
        return Ok(Value::Null);
    };
    parser.skip_ws();
    if parser.pos != parser.bytes.len() {
        return Ok(Value::Null);
    }
    Ok(value)
}

/// `json_stringify(value)`: compact canonical JSON.
pub fn json_stringify(args: &[Value]) -> BuiltinResult {
    want_argc("json_stringify", args, 1)?;
    let mut out = Vec::new();
    write_value(&args[0], &mut out);
    Ok(Value::str(out))
}

// Parsing --------------------------------------------------------------

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, kw: &[u8]) -> bool {
        if self.bytes[self.pos..].starts_with(kw) {
            self.pos += kw.len();
            true
        } else {
            false
        }
    }

    fn parse_value(&mut self) -> Option<Value> {
        self.skip_ws();
        match self.peek()? {
            b'{' => self.parse_object(),
            b'[' => self.parse_array(),
            b'"' => self.parse_string().map(Value::str),
            b't' => self.eat_keyword(b"true").then_some(Value::Bool(true)),
            b'f' => self.eat_keyword(b"false").then_some(Value::Bool(false)),
            b'n' => self.eat_keyword(b"null").then_some(Value::Null),
            b'-' | b'0'..=b'9' => self.parse_number(),
            _ => None,
        }
    }

    fn parse_object(&mut self) -> Option<Value> {
        self.eat(b'{');
        let map = Value::map(0);
        let Value::Map(handle) = &map else { unreachable!() };
        self.skip_ws();
        if self.eat(b'}') {
            return Some(map.clone());
        }
        loop {
            self.skip_ws();
            if self.peek() != Some(b'"') {
                return None;
            }
            let key = self.parse_string()?;
            self.skip_ws();
            if !self.eat(b':') {
                return None;
            }
            let value = self.parse_value()?;
            lock_container(handle).set(Value::str(key), value);
            self.skip_ws();
            if self.eat(b',') {
                continue;
            }
            if self.eat(b'}') {
                return Some(map.clone());
            }
            return None;
        }
    }

    fn parse_array(&mut self) -> Option<Value> {
        self.eat(b'[');
        let mut items = Vec::new();
        self.skip_ws();
        if self.eat(b']') {
            return Some(Value::array_from(items));
        }
        loop {
            let value = self.parse_value()?;
            items.push(value);
            self.skip_ws();
            if self.eat(b',') {
                continue;
            }
            if self.eat(b']') {
                return Some(Value::array_from(items));
            }
            return None;
        }
    }

    /// String body after the opening quote; returns decoded bytes.
    fn parse_string(&mut self) -> Option<Vec<u8>> {
        self.eat(b'"');
        let mut out = Vec::new();
        loop {
            match self.bump()? {
                b'"' => return Some(out),
                b'\\' => match self.bump()? {
                    b'"' => out.push(b'"'),
                    b'\\' => out.push(b'\\'),
                    b'/' => out.push(b'/'),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0c),
                    b'n' => out.push(b'\n'),
                    b'r' => out.push(b'\r'),
                    b't' => out.push(b'\t'),
                    b'u' => {
                        let mut code: u32 = 0;
                        for _ in 0..4 {
                            let digit = (self.bump()? as char).to_digit(16)?;
                            code = code * 16 + digit;
                        }
                        // Strings are byte arrays; a code point beyond ASCII
                        // has no representation and renders as '?'.
                        if code < 0x80 {
                            out.push(code as u8);
                        } else {
                            out.push(b'?');
                        }
                    }
                    _ => return None,
                },
                b => out.push(b),
            }
        }
    }

    /// Int lane unless a decimal point or exponent appears; an integer too
    /// large for i64 falls over to the float lane.
    fn parse_number(&mut self) -> Option<Value> {
        let start = self.pos;
        self.eat(b'-');
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        let mut is_float = false;
        if self.eat(b'.') {
            is_float = true;
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            is_float = true;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
        }
        let text = std::str::from_utf8(&self.bytes[start..self.pos]).ok()?;
        if text.is_empty() || text == "-" {
            return None;
        }
        if is_float {
            text.parse::<f64>().ok().map(Value::Float)
        } else {
            match text.parse::<i64>() {
                Ok(i) => Some(Value::Int(i)),
                Err(_) => text.parse::<f64>().ok().map(Value::Float),
            }
        }
    }
}

// Serialization --------------------------------------------------------

fn write_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Int(i) => out.extend_from_slice(i.to_string().as_bytes()),
        Value::Float(f) => {
            // JSON has no NaN/Infinity.
            if f.is_finite() {
                out.extend_from_slice(format_float(*f).as_bytes());
            } else {
                out.extend_from_slice(b"null");
            }
        }
        Value::Bool(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
        Value::Null => out.extend_from_slice(b"null"),
        Value::Str(s) => write_string(s.as_bytes(), out),
        Value::Array(arr) => {
            out.push(b'[');
            let arr = lock_container(arr);
            for (i, item) in arr.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(item, out);
            }
            out.push(b']');
        }
        Value::Map(map) => {
            out.push(b'{');
            let map = lock_container(map);
            for (i, (k, v)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                match k {
                    Value::Str(s) => write_string(s.as_bytes(), out),
                    // Non-string keys render canonically inside quotes.
                    other => write_string(&crate::io::render_to_bytes(other), out),
                }
                out.push(b':');
                write_value(v, out);
            }
            out.push(b'}');
        }
        // Handles, functions and records have no JSON form.
        _ => out.extend_from_slice(b"null"),
    }
}

fn write_string(bytes: &[u8], out: &mut Vec<u8>) {
    out.push(b'"');
    for &b in bytes {
        match b {
            b'"' => out.extend_from_slice(b"\\\""),
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\t' => out.extend_from_slice(b"\\t"),
            b if b < 0x20 => out.extend_from_slice(format!("\\u{:04x}", b).as_bytes()),
            b => out.push(b),
        }
    }
    out.push(b'"');
}
