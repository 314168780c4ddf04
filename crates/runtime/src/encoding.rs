//! Bytes codec and Base64 builtins.
//!
//! A byte-array is an ordinary guest array whose elements are ints in
//! `[0, 255]`; writes mask stored values to 0xFF. The multi-byte codecs are
//! little-endian (`bytes_write_*`/`bytes_read_*`) except for the explicit
//! big-endian pair `int_to_bytes`/`int_from_bytes`.

use crate::error::{BuiltinResult, RuntimeError, want_argc, want_array, want_int, want_str};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use bp_core::{Array, Value, lock_container};

/// Standard alphabet, lenient about trailing padding on decode.
fn lenient_decoder() -> GeneralPurpose {
    GeneralPurpose::new(
        &base64::alphabet::STANDARD,
        GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
    )
}

/// Read element `idx` of a byte-array, masked to 0xFF.
fn byte_at(name: &str, arr: &Array, idx: usize) -> Result<u8, RuntimeError> {
    match arr.get(idx as i64) {
        Some(Value::Int(b)) => Ok((b & 0xff) as u8),
        Some(other) => Err(RuntimeError::new(format!(
            "{}: expected array of int, element {} is {}",
            name,
            idx,
            other.type_name()
        ))),
        None => Err(RuntimeError::new(format!(
            "{}: index {} out of range (len {})",
            name,
            idx,
            arr.len()
        ))),
    }
}

fn check_span(name: &str, arr: &Array, off: i64, width: usize) -> Result<usize, RuntimeError> {
    if off < 0 || (off as usize) + width > arr.len() {
        return Err(RuntimeError::new(format!(
            "{}: offset {} with width {} out of range (len {})",
            name,
            off,
            width,
            arr.len()
        )));
    }
    Ok(off as usize)
}

/// Zero-filled byte-array of length `n`.
pub fn bytes_new(args: &[Value]) -> BuiltinResult {
    want_argc("bytes_new", args, 1)?;
    let n = want_int("bytes_new", args, 0)?;
    if n < 0 {
        return Err(RuntimeError::new(format!(
            "bytes_new: length must be non-negative, got {}",
            n
        )));
    }
    Ok(Value::array_from(vec![Value::Int(0); n as usize]))
}

pub fn bytes_get(args: &[Value]) -> BuiltinResult {
    want_argc("bytes_get", args, 2)?;
    let arr = want_array("bytes_get", args, 0)?;
    let idx = want_int("bytes_get", args, 1)?;
    let arr = lock_container(arr);
    let off = check_span("bytes_get", &arr, idx, 1)?;
    Ok(Value::Int(i64::from(byte_at("bytes_get", &arr, off)?)))
}

pub fn bytes_set(args: &[Value]) -> BuiltinResult {
    want_argc("bytes_set", args, 3)?;
    let arr = want_array("bytes_set", args, 0)?;
    let idx = want_int("bytes_set", args, 1)?;
    let v = want_int("bytes_set", args, 2)?;
    let mut arr = lock_container(arr);
    let off = check_span("bytes_set", &arr, idx, 1)?;
    arr.set(off as i64, Value::Int(v & 0xff));
    Ok(Value::Null)
}

pub fn bytes_len(args: &[Value]) -> BuiltinResult {
    want_argc("bytes_len", args, 1)?;
    let arr = want_array("bytes_len", args, 0)?;
    Ok(Value::Int(lock_container(arr).len() as i64))
}

pub fn bytes_append(args: &[Value]) -> BuiltinResult {
    want_argc("bytes_append", args, 2)?;
    let arr = want_array("bytes_append", args, 0)?;
    let v = want_int("bytes_append", args, 1)?;
    lock_container(arr).push(Value::Int(v & 0xff));
    Ok(Value::Null)
}

fn write_le(name: &str, args: &[Value], width: usize) -> BuiltinResult {
    want_argc(name, args, 3)?;
    let arr = want_array(name, args, 0)?;
    let off = want_int(name, args, 1)?;
    let v = want_int(name, args, 2)? as u64;
    let mut arr = lock_container(arr);
    let off = check_span(name, &arr, off, width)?;
    for i in 0..width {
        arr.set((off + i) as i64, Value::Int(((v >> (8 * i)) & 0xff) as i64));
    }
    Ok(Value::Null)
}

fn read_le(name: &str, args: &[Value], width: usize) -> Result<u64, RuntimeError> {
    want_argc(name, args, 2)?;
    let arr = want_array(name, args, 0)?;
    let off = want_int(name, args, 1)?;
    let arr = lock_container(arr);
    let off = check_span(name, &arr, off, width)?;
    let mut v: u64 = 0;
    for i in 0..width {
        v |= u64::from(byte_at(name, &arr, off + i)?) << (8 * i);
    }
    Ok(v)
}

pub fn bytes_write_u16(args: &[Value]) -> BuiltinResult {
    write_le("bytes_write_u16", args, 2)
}

pub fn bytes_write_u32(args: &[Value]) -> BuiltinResult {
    write_le("bytes_write_u32", args, 4)
}

pub fn bytes_write_i64(args: &[Value]) -> BuiltinResult {
    write_le("bytes_write_i64", args, 8)
}

pub fn bytes_read_u16(args: &[Value]) -> BuiltinResult {
    Ok(Value::Int(read_le("bytes_read_u16", args, 2)? as i64))
}

pub fn bytes_read_u32(args: &[Value]) -> BuiltinResult {
    Ok(Value::Int(read_le("bytes_read_u32", args, 4)? as i64))
}

pub fn bytes_read_i64(args: &[Value]) -> BuiltinResult {
    Ok(Value::Int(read_le("bytes_read_i64", args, 8)? as i64))
}

/// Big-endian encoding of the low `size` bytes of `value`, `size` in
/// `[1, 8]`.
pub fn int_to_bytes(args: &[Value]) -> BuiltinResult {
    want_argc("int_to_bytes", args, 2)?;
    let value = want_int("int_to_bytes", args, 0)? as u64;
    let size = want_int("int_to_bytes", args, 1)?;
    if !(1..=8).contains(&size) {
        return Err(RuntimeError::new(format!(
            "int_to_bytes: size must be in [1, 8], got {}",
            size
        )));
    }
    let size = size as usize;
    let mut out = Vec::with_capacity(size);
    for i in (0..size).rev() {
        out.push(Value::Int(((value >> (8 * i)) & 0xff) as i64));
    }
    Ok(Value::array_from(out))
}

/// Big-endian decode of `size` bytes at `off`.
pub fn int_from_bytes(args: &[Value]) -> BuiltinResult {
    want_argc("int_from_bytes", args, 3)?;
    let arr = want_array("int_from_bytes", args, 0)?;
    let off = want_int("int_from_bytes", args, 1)?;
    let size = want_int("int_from_bytes", args, 2)?;
    if !(1..=8).contains(&size) {
        return Err(RuntimeError::new(format!(
            "int_from_bytes: size must be in [1, 8], got {}",
            size
        )));
    }
    let arr = lock_container(arr);
    let off = check_span("int_from_bytes", &arr, off, size as usize)?;
    let mut v: u64 = 0;
    for i in 0..size as usize {
        v = (v << 8) | u64::from(byte_at("int_from_bytes", &arr, off + i)?);
    }
    Ok(Value::Int(v as i64))
}

/// Byte-array to Base64 text (standard alphabet, padded).
pub fn base64_encode(args: &[Value]) -> BuiltinResult {
    want_argc("base64_encode", args, 1)?;
    let arr = want_array("base64_encode", args, 0)?;
    let bytes: Vec<u8> = {
        let arr = lock_container(arr);
        let mut out = Vec::with_capacity(arr.len());
        for i in 0..arr.len() {
            out.push(byte_at("base64_encode", &arr, i)?);
        }
        out
    };
    Ok(Value::str(STANDARD.encode(&bytes)))
}

/// Base64 text to byte-array; malformed input is a recoverable `Null`.
/// Trailing padding is accepted but not required.
pub fn base64_decode(args: &[Value]) -> BuiltinResult {
    want_argc("base64_decode", args, 1)?;
    let text = want_str("base64_decode", args, 0)?;
    match lenient_decoder().decode(text.as_bytes()) {
        Ok(bytes) => Ok(Value::array_from(
            bytes.into_iter().map(|b| Value::Int(i64::from(b))).collect(),
        )),
        Err(_) => Ok(Value::Null),
    }
}
