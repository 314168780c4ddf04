//! Security primitive builtins.
//!
//! Digests run over the raw bytes of the input string and come back as
//! lowercase hex. `secure_compare` uses a constant-time comparison so that
//! signature and token checks do not leak through timing; unequal lengths
//! return false immediately, timing is length-independent only on
//! equal-length inputs. None of this is FIPS-audited; the digests are
//! language primitives, not a crypto library.

use crate::error::{BuiltinResult, want_argc, want_str};
use bp_core::Value;
use md5::Md5;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// SHA-256 digest as a 64-character lowercase hex string.
pub fn sha256(args: &[Value]) -> BuiltinResult {
    want_argc("sha256", args, 1)?;
    let s = want_str("sha256", args, 0)?;
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    Ok(Value::str(hex::encode(hasher.finalize())))
}

/// MD5 digest as a 32-character lowercase hex string. Legacy checksums
/// only; not collision-resistant.
pub fn md5(args: &[Value]) -> BuiltinResult {
    want_argc("md5", args, 1)?;
    let s = want_str("md5", args, 0)?;
    let mut hasher = Md5::new();
    hasher.update(s.as_bytes());
    Ok(Value::str(hex::encode(hasher.finalize())))
}

/// Constant-time equality over equal-length strings.
pub fn secure_compare(args: &[Value]) -> BuiltinResult {
    want_argc("secure_compare", args, 2)?;
    let a = want_str("secure_compare", args, 0)?;
    let b = want_str("secure_compare", args, 1)?;
    Ok(Value::Bool(bool::from(a.as_bytes().ct_eq(b.as_bytes()))))
}
