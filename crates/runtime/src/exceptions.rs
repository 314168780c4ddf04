//! Guest exception protocol.
//!
//! A fixed-depth stack of checkpoints drives non-local transfer of control
//! for guest try/catch. `TRY` pushes a checkpoint capturing the VM's value
//! stack and frame depth plus the catch arm's address; `THROW` stores the
//! payload and hands the innermost checkpoint back to the dispatch loop,
//! which rewinds its own stacks to the recorded depths and resumes at the
//! handler; `CATCH` consumes the payload. A throw with no checkpoint on the
//! stack is unhandled: the payload is reported on stderr and the process
//! exits with status 1.
//!
//! Each runtime (and therefore each guest thread) owns its own checkpoint
//! stack. Exceptions never cross threads.

use crate::error::RuntimeError;
use bp_core::Value;

/// Maximum nesting of guest `try` regions.
pub const MAX_EXCEPTION_DEPTH: usize = 64;

/// State captured at `TRY` entry, restored on `THROW`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    /// Value-stack depth to unwind to.
    pub stack_depth: usize,
    /// Call-frame depth to unwind to.
    pub frame_depth: usize,
    /// Bytecode address of the catch arm.
    pub handler_pc: usize,
}

/// Per-thread checkpoint stack plus the in-flight exception payload.
#[derive(Debug)]
pub struct ExceptionStack {
    frames: Vec<Checkpoint>,
    current: Value,
    has_exception: bool,
}

impl Default for ExceptionStack {
    fn default() -> Self {
        ExceptionStack::new()
    }
}

impl ExceptionStack {
    pub fn new() -> Self {
        ExceptionStack {
            frames: Vec::with_capacity(MAX_EXCEPTION_DEPTH),
            current: Value::Null,
            has_exception: false,
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Enter a guarded region. Overflowing the checkpoint stack is fatal.
    pub fn push(&mut self, checkpoint: Checkpoint) -> Result<(), RuntimeError> {
        if self.frames.len() >= MAX_EXCEPTION_DEPTH {
            return Err(RuntimeError::new(format!(
                "try: exception stack overflow (max depth {})",
                MAX_EXCEPTION_DEPTH
            )));
        }
        self.frames.push(checkpoint);
        Ok(())
    }

    /// Leave a guarded region normally (no throw happened).
    pub fn pop(&mut self) -> Option<Checkpoint> {
        self.frames.pop()
    }

    /// Throw: record the payload and pop to the innermost checkpoint.
    /// `None` means the exception is unhandled.
    pub fn throw(&mut self, value: Value) -> Option<Checkpoint> {
        self.current = value;
        self.has_exception = true;
        self.frames.pop()
    }

    pub fn has_exception(&self) -> bool {
        self.has_exception
    }

    /// Catch: consume the in-flight payload and clear the flag.
    pub fn take_current(&mut self) -> Value {
        self.has_exception = false;
        std::mem::replace(&mut self.current, Value::Null)
    }
}

/// Render an exception payload for the unhandled report: string content for
/// `Str`, decimal for `Int`, `<unknown>` for everything else.
pub fn payload_text(value: &Value) -> String {
    match value {
        Value::Str(s) => s.to_string_lossy().into_owned(),
        Value::Int(i) => i.to_string(),
        _ => "<unknown>".to_string(),
    }
}

/// The stderr line for an unhandled throw.
pub fn unhandled_message(value: &Value) -> String {
    format!("Unhandled exception: {}", payload_text(value))
}

/// Print the unhandled-exception report to stderr and return the process
/// exit status the driver should use.
pub fn report_unhandled(value: &Value) -> i32 {
    eprintln!("{}", unhandled_message(value));
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cp(pc: usize) -> Checkpoint {
        Checkpoint {
            stack_depth: 0,
            frame_depth: 0,
            handler_pc: pc,
        }
    }

    #[test]
    fn test_throw_pops_innermost() {
        let mut ex = ExceptionStack::new();
        ex.push(cp(10)).unwrap();
        ex.push(cp(20)).unwrap();
        let target = ex.throw(Value::str("boom")).unwrap();
        assert_eq!(target.handler_pc, 20);
        assert!(ex.has_exception());
        assert_eq!(ex.take_current(), Value::str("boom"));
        assert!(!ex.has_exception());
        assert_eq!(ex.depth(), 1);
    }

    #[test]
    fn test_unhandled_throw_returns_none() {
        let mut ex = ExceptionStack::new();
        assert!(ex.throw(Value::Int(3)).is_none());
        assert!(ex.has_exception());
    }

    #[test]
    fn test_normal_exit_pops_checkpoint() {
        let mut ex = ExceptionStack::new();
        ex.push(cp(5)).unwrap();
        assert_eq!(ex.pop(), Some(cp(5)));
        assert_eq!(ex.depth(), 0);
    }

    #[test]
    fn test_overflow_is_fatal() {
        let mut ex = ExceptionStack::new();
        for i in 0..MAX_EXCEPTION_DEPTH {
            ex.push(cp(i)).unwrap();
        }
        let err = ex.push(cp(999)).unwrap_err();
        assert!(err.message().contains("exception stack overflow"));
    }

    #[test]
    fn test_payload_text_variants() {
        assert_eq!(payload_text(&Value::str("boom")), "boom");
        assert_eq!(payload_text(&Value::Int(-7)), "-7");
        assert_eq!(payload_text(&Value::Bool(true)), "<unknown>");
        assert_eq!(payload_text(&Value::Null), "<unknown>");
    }

    #[test]
    fn test_unhandled_message_format() {
        assert_eq!(
            unhandled_message(&Value::str("boom")),
            "Unhandled exception: boom"
        );
        assert_eq!(
            unhandled_message(&Value::array(0)),
            "Unhandled exception: <unknown>"
        );
    }

    #[test]
    fn test_nested_rethrow() {
        let mut ex = ExceptionStack::new();
        ex.push(cp(1)).unwrap();
        ex.push(cp(2)).unwrap();
        // Inner handler catches, then rethrows to the outer one.
        let inner = ex.throw(Value::str("first")).unwrap();
        assert_eq!(inner.handler_pc, 2);
        let payload = ex.take_current();
        let outer = ex.throw(payload).unwrap();
        assert_eq!(outer.handler_pc, 1);
        assert_eq!(ex.take_current(), Value::str("first"));
        assert!(ex.throw(Value::Null).is_none());
    }
}
