//! BetterPython runtime: builtins, exceptions, concurrency.
//!
//! The VM dispatch loop drives this crate through three surfaces:
//! - `registry::call(rt, id, args)`, the single entry point into the closed
//!   set of ~150 builtins,
//! - `Runtime`, the per-thread context (handle side table, LCG state, argv,
//!   cooperative exit flag, exception checkpoint stack),
//! - `exceptions`, the try/throw/catch protocol the loop unwinds with.
//!
//! Fatal errors surface as `RuntimeError` values, never panics; the driver
//! prints them to stderr and exits with status 1.

pub mod arithmetic;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod exceptions;
pub mod file;
pub mod float_ops;
pub mod io;
pub mod json;
pub mod list_ops;
pub mod map_ops;
pub mod os;
pub mod random;
pub mod regex_ops;
pub mod registry;
pub mod runtime;
pub mod string_ops;
pub mod sync;
pub mod thread_ops;

pub use error::{BuiltinResult, RuntimeError};
pub use exceptions::{
    Checkpoint, ExceptionStack, MAX_EXCEPTION_DEPTH, report_unhandled, unhandled_message,
};
pub use io::{render_to_bytes, render_value};
pub use registry::{BUILTINS, BuiltinId, call};
pub use runtime::Runtime;
pub use sync::{GuestCond, GuestMutex};
