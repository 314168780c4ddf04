//! Threading builtins.
//!
//! Threads are OS threads sharing the managed heap; mutexes and condition
//! variables are runtime-owned objects reached through `Ptr` handles.
//! `thread_spawn` is deliberately not callable as a plain builtin: spawning
//! needs the caller frame's closure context, which only the VM's spawn
//! opcode can capture (see `Runtime::spawn_thread`). Joining returns the
//! thread's return value; detaching severs the handle without stopping the
//! thread. No primitive takes a timeout; guests build timeouts from
//! `clock_ms` + `sleep` + `mutex_trylock`.

use crate::error::{BuiltinResult, RuntimeError, want_argc, want_int, want_ptr};
use crate::runtime::Runtime;
use bp_core::Value;
use std::time::Duration;

pub fn thread_current(rt: &Runtime, args: &[Value]) -> BuiltinResult {
    want_argc("thread_current", args, 0)?;
    Ok(Value::Int(rt.thread_id() as i64))
}

pub fn thread_yield(args: &[Value]) -> BuiltinResult {
    want_argc("thread_yield", args, 0)?;
    std::thread::yield_now();
    Ok(Value::Null)
}

pub fn thread_sleep(args: &[Value]) -> BuiltinResult {
    want_argc("thread_sleep", args, 1)?;
    let ms = want_int("thread_sleep", args, 0)?;
    if ms > 0 {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }
    Ok(Value::Null)
}

/// Stub: spawning requires the VM opcode that captures the caller's
/// closure context.
pub fn thread_spawn(args: &[Value]) -> BuiltinResult {
    let _ = args;
    Err(RuntimeError::new(
        "thread_spawn: requires VM closure capture; use the spawn opcode",
    ))
}

/// Block until the thread finishes and return its value. The handle is
/// consumed; a second join on the same handle is fatal.
pub fn thread_join(rt: &Runtime, args: &[Value]) -> BuiltinResult {
    want_argc("thread_join", args, 1)?;
    let id = want_ptr("thread_join", args, 0)?;
    let handle = rt.take_thread("thread_join", id)?;
    handle
        .join()
        .map_err(|_| RuntimeError::new("thread_join: thread panicked"))
}

/// Sever the handle; the thread keeps running.
pub fn thread_detach(rt: &Runtime, args: &[Value]) -> BuiltinResult {
    want_argc("thread_detach", args, 1)?;
    let id = want_ptr("thread_detach", args, 0)?;
    drop(rt.take_thread("thread_detach", id)?);
    Ok(Value::Null)
}

pub fn mutex_new(rt: &Runtime, args: &[Value]) -> BuiltinResult {
    want_argc("mutex_new", args, 0)?;
    Ok(rt.new_mutex())
}

pub fn mutex_lock(rt: &Runtime, args: &[Value]) -> BuiltinResult {
    want_argc("mutex_lock", args, 1)?;
    let id = want_ptr("mutex_lock", args, 0)?;
    rt.mutex("mutex_lock", id)?.lock();
    Ok(Value::Null)
}

pub fn mutex_trylock(rt: &Runtime, args: &[Value]) -> BuiltinResult {
    want_argc("mutex_trylock", args, 1)?;
    let id = want_ptr("mutex_trylock", args, 0)?;
    Ok(Value::Bool(rt.mutex("mutex_trylock", id)?.try_lock()))
}

pub fn mutex_unlock(rt: &Runtime, args: &[Value]) -> BuiltinResult {
    want_argc("mutex_unlock", args, 1)?;
    let id = want_ptr("mutex_unlock", args, 0)?;
    if !rt.mutex("mutex_unlock", id)?.unlock() {
        return Err(RuntimeError::new("mutex_unlock: mutex is not locked"));
    }
    Ok(Value::Null)
}

pub fn cond_new(rt: &Runtime, args: &[Value]) -> BuiltinResult {
    want_argc("cond_new", args, 0)?;
    Ok(rt.new_cond())
}

/// Atomically release the mutex and wait; the mutex is reacquired before
/// returning.
pub fn cond_wait(rt: &Runtime, args: &[Value]) -> BuiltinResult {
    want_argc("cond_wait", args, 2)?;
    let cond_id = want_ptr("cond_wait", args, 0)?;
    let mutex_id = want_ptr("cond_wait", args, 1)?;
    let cond = rt.cond("cond_wait", cond_id)?;
    let mutex = rt.mutex("cond_wait", mutex_id)?;
    if !cond.wait(&mutex) {
        return Err(RuntimeError::new("cond_wait: mutex is not locked"));
    }
    Ok(Value::Null)
}

pub fn cond_signal(rt: &Runtime, args: &[Value]) -> BuiltinResult {
    want_argc("cond_signal", args, 1)?;
    let id = want_ptr("cond_signal", args, 0)?;
    rt.cond("cond_signal", id)?.signal();
    Ok(Value::Null)
}

pub fn cond_broadcast(rt: &Runtime, args: &[Value]) -> BuiltinResult {
    want_argc("cond_broadcast", args, 1)?;
    let id = want_ptr("cond_broadcast", args, 0)?;
    rt.cond("cond_broadcast", id)?.broadcast();
    Ok(Value::Null)
}
