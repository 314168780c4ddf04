//! File builtins.
//!
//! Descriptors are short-lived within a single call (open, use, close) and
//! never escape to guest code. Read misses are recoverable values (empty
//! string, -1 size); write failures are fatal, per the error table.

use crate::error::{BuiltinResult, RuntimeError, want_argc, want_array, want_str};
use bp_core::{BpString, Value, lock_container};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Paths are guest byte strings; on unix they map to `OsStr` bytes
/// untouched, elsewhere through a lossy UTF-8 view.
fn path_of(s: &BpString) -> PathBuf {
    #[cfg(unix)]
    {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;
        PathBuf::from(OsStr::from_bytes(s.as_bytes()))
    }
    #[cfg(not(unix))]
    {
        PathBuf::from(s.to_string_lossy().into_owned())
    }
}

/// Whole file as a string; an unreadable file is the empty string.
pub fn file_read(args: &[Value]) -> BuiltinResult {
    want_argc("file_read", args, 1)?;
    let path = path_of(want_str("file_read", args, 0)?);
    match fs::read(&path) {
        Ok(bytes) => Ok(Value::str(bytes)),
        Err(_) => Ok(Value::str("")),
    }
}

pub fn file_write(args: &[Value]) -> BuiltinResult {
    want_argc("file_write", args, 2)?;
    let path = path_of(want_str("file_write", args, 0)?);
    let content = want_str("file_write", args, 1)?;
    fs::write(&path, content.as_bytes()).map_err(|e| {
        RuntimeError::new(format!(
            "file_write: failed to write '{}': {}",
            path.display(),
            e
        ))
    })?;
    Ok(Value::Null)
}

pub fn file_append(args: &[Value]) -> BuiltinResult {
    want_argc("file_append", args, 2)?;
    let path = path_of(want_str("file_append", args, 0)?);
    let content = want_str("file_append", args, 1)?;
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| {
            RuntimeError::new(format!(
                "file_append: failed to open '{}': {}",
                path.display(),
                e
            ))
        })?;
    file.write_all(content.as_bytes()).map_err(|e| {
        RuntimeError::new(format!(
            "file_append: failed to write '{}': {}",
            path.display(),
            e
        ))
    })?;
    Ok(Value::Null)
}

pub fn file_exists(args: &[Value]) -> BuiltinResult {
    want_argc("file_exists", args, 1)?;
    let path = path_of(want_str("file_exists", args, 0)?);
    Ok(Value::Bool(path.exists()))
}

/// True if the file was removed.
pub fn file_delete(args: &[Value]) -> BuiltinResult {
    want_argc("file_delete", args, 1)?;
    let path = path_of(want_str("file_delete", args, 0)?);
    Ok(Value::Bool(fs::remove_file(&path).is_ok()))
}

/// Size in bytes, -1 when the file cannot be stat'ed.
pub fn file_size(args: &[Value]) -> BuiltinResult {
    want_argc("file_size", args, 1)?;
    let path = path_of(want_str("file_size", args, 0)?);
    match fs::metadata(&path) {
        Ok(meta) => Ok(Value::Int(meta.len() as i64)),
        Err(_) => Ok(Value::Int(-1)),
    }
}

pub fn file_copy(args: &[Value]) -> BuiltinResult {
    want_argc("file_copy", args, 2)?;
    let src = path_of(want_str("file_copy", args, 0)?);
    let dst = path_of(want_str("file_copy", args, 1)?);
    fs::copy(&src, &dst).map_err(|e| {
        RuntimeError::new(format!(
            "file_copy: failed to copy '{}' to '{}': {}",
            src.display(),
            dst.display(),
            e
        ))
    })?;
    Ok(Value::Null)
}

/// Whole file as a byte-array; an unreadable file is the empty array.
pub fn file_read_bytes(args: &[Value]) -> BuiltinResult {
    want_argc("file_read_bytes", args, 1)?;
    let path = path_of(want_str("file_read_bytes", args, 0)?);
    let bytes = fs::read(&path).unwrap_or_default();
    Ok(Value::array_from(
        bytes.into_iter().map(|b| Value::Int(i64::from(b))).collect(),
    ))
}

pub fn file_write_bytes(args: &[Value]) -> BuiltinResult {
    want_argc("file_write_bytes", args, 2)?;
    let path = path_of(want_str("file_write_bytes", args, 0)?);
    let arr = want_array("file_write_bytes", args, 1)?;
    let bytes: Vec<u8> = {
        let arr = lock_container(arr);
        let mut out = Vec::with_capacity(arr.len());
        for (i, v) in arr.iter().enumerate() {
            let Value::Int(b) = v else {
                return Err(RuntimeError::new(format!(
                    "file_write_bytes: expected array of int, element {} is {}",
                    i,
                    v.type_name()
                )));
            };
            out.push((*b & 0xff) as u8);
        }
        out
    };
    fs::write(&path, &bytes).map_err(|e| {
        RuntimeError::new(format!(
            "file_write_bytes: failed to write '{}': {}",
            path.display(),
            e
        ))
    })?;
    Ok(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn s(text: &str) -> Value {
        Value::str(text)
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let path_v = s(path.to_str().unwrap());
        file_write(&[path_v.clone(), s("hello file")]).unwrap();
        assert_eq!(file_read(&[path_v]).unwrap(), s("hello file"));
    }

    #[test]
    fn test_read_miss_is_empty_string() {
        assert_eq!(
            file_read(&[s("/nonexistent/path/file.txt")]).unwrap(),
            s("")
        );
    }

    #[test]
    fn test_write_failure_is_fatal() {
        let err = file_write(&[s("/nonexistent/dir/file.txt"), s("x")]).unwrap_err();
        assert!(err.message().starts_with("file_write:"));
    }

    #[test]
    fn test_append_accumulates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let path_v = s(path.to_str().unwrap());
        file_append(&[path_v.clone(), s("a")]).unwrap();
        file_append(&[path_v.clone(), s("b")]).unwrap();
        assert_eq!(file_read(&[path_v]).unwrap(), s("ab"));
    }

    #[test]
    fn test_exists_delete_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.bin");
        let path_v = s(path.to_str().unwrap());
        assert_eq!(file_exists(&[path_v.clone()]).unwrap(), Value::Bool(false));
        assert_eq!(file_size(&[path_v.clone()]).unwrap(), Value::Int(-1));

        file_write(&[path_v.clone(), s("1234")]).unwrap();
        assert_eq!(file_exists(&[path_v.clone()]).unwrap(), Value::Bool(true));
        assert_eq!(file_size(&[path_v.clone()]).unwrap(), Value::Int(4));

        assert_eq!(file_delete(&[path_v.clone()]).unwrap(), Value::Bool(true));
        assert_eq!(file_delete(&[path_v.clone()]).unwrap(), Value::Bool(false));
        assert_eq!(file_exists(&[path_v]).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_copy() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        file_write(&[s(a.to_str().unwrap()), s("payload")]).unwrap();
        file_copy(&[s(a.to_str().unwrap()), s(b.to_str().unwrap())]).unwrap();
        assert_eq!(file_read(&[s(b.to_str().unwrap())]).unwrap(), s("payload"));
        assert!(file_copy(&[s("/no/such"), s(b.to_str().unwrap())]).is_err());
    }

    #[test]
    fn test_bytes_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bytes.bin");
        let path_v = s(path.to_str().unwrap());
        let data = Value::array_from(vec![
            Value::Int(0),
            Value::Int(255),
            Value::Int(0x1ff), // masked to 0xff
            Value::Int(7),
        ]);
        file_write_bytes(&[path_v.clone(), data]).unwrap();
        let back = file_read_bytes(&[path_v]).unwrap();
        let Value::Array(arr) = &back else { panic!() };
        let arr = lock_container(arr);
        let bytes: Vec<i64> = arr
            .iter()
            .map(|v| match v {
                Value::Int(i) => *i,
                _ => panic!("expected int"),
            })
            .collect();
        assert_eq!(bytes, vec![0, 255, 255, 7]);
    }

    #[test]
    fn test_read_bytes_miss_is_empty_array() {
        let out = file_read_bytes(&[s("/no/such/file")]).unwrap();
        let Value::Array(arr) = &out else { panic!() };
        assert!(lock_container(arr).is_empty());
    }
}
