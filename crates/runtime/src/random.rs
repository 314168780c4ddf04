//! Random builtins.
//!
//! The guest PRNG is the classic LCG (`state = state*1103515245 + 12345`,
//! output `(state/65536) % 32768`) with process-wide state owned by the
//! runtime; `rand_seed` sets the state directly, so sequences are
//! reproducible. `random_bytes` reads `/dev/urandom` and degrades to the
//! LCG when the device is unavailable (implementation-defined, not
//! cryptographic).

use crate::error::{BuiltinResult, RuntimeError, want_argc, want_int};
use crate::runtime::Runtime;
use bp_core::Value;
use std::io::Read;

pub fn rand(rt: &Runtime, args: &[Value]) -> BuiltinResult {
    want_argc("rand", args, 0)?;
    Ok(Value::Int(rt.lcg_next()))
}

pub fn rand_seed(rt: &Runtime, args: &[Value]) -> BuiltinResult {
    want_argc("rand_seed", args, 1)?;
    rt.lcg_seed(want_int("rand_seed", args, 0)?);
    Ok(Value::Null)
}

/// `lo + lcg_next() % (hi - lo)`; the range must be non-empty.
pub fn rand_range(rt: &Runtime, args: &[Value]) -> BuiltinResult {
    want_argc("rand_range", args, 2)?;
    let lo = want_int("rand_range", args, 0)?;
    let hi = want_int("rand_range", args, 1)?;
    if hi <= lo {
        return Err(RuntimeError::new(format!(
            "rand_range: empty range [{}, {})",
            lo, hi
        )));
    }
    Ok(Value::Int(lo + rt.lcg_next() % (hi - lo)))
}

/// `n` bytes from `/dev/urandom` as a byte-array (ints 0..255).
pub fn random_bytes(rt: &Runtime, args: &[Value]) -> BuiltinResult {
    want_argc("random_bytes", args, 1)?;
    let n = want_int("random_bytes", args, 0)?;
    if n < 0 {
        return Err(RuntimeError::new(format!(
            "random_bytes: count must be non-negative, got {}",
            n
        )));
    }
    let mut buf = vec![0u8; n as usize];
    if !fill_from_urandom(&mut buf) {
        // Degraded mode: LCG output folded to bytes.
        for b in buf.iter_mut() {
            *b = (rt.lcg_next() & 0xff) as u8;
        }
    }
    Ok(Value::array_from(
        buf.into_iter().map(|b| Value::Int(i64::from(b))).collect(),
    ))
}

fn fill_from_urandom(buf: &mut [u8]) -> bool {
    match std::fs::File::open("/dev/urandom") {
        Ok(mut f) => f.read_exact(buf).is_ok(),
        Err(_) => false,
    }
}
