//! Runtime context shared between the VM and the builtin layer.
//!
//! A `Runtime` is the per-thread view of one running guest program. Spawned
//! guest threads fork the runtime: the handle side table, argv and the LCG
//! random state are process-wide (shared through an `Arc`), while the
//! exception checkpoint stack and the pending-exit flag stay per thread.
//!
//! `Value::Ptr` is never a raw address: it is a key into the side table
//! owned here, so handle lifetime stays under runtime control and a stale
//! handle is a fatal error instead of a wild pointer.

use crate::error::RuntimeError;
use crate::exceptions::ExceptionStack;
use crate::sync::{GuestCond, GuestMutex};
use bp_core::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

/// Objects reachable through `Value::Ptr` handles.
#[derive(Debug)]
enum HandleObj {
    Mutex(Arc<GuestMutex>),
    Cond(Arc<GuestCond>),
    /// Present until joined or detached.
    Thread(JoinHandle<Value>),
}

/// Process-wide state shared by every guest thread.
#[derive(Debug)]
struct Shared {
    handles: Mutex<HashMap<u64, HandleObj>>,
    next_handle: AtomicU64,
    next_thread_id: AtomicU64,
    /// LCG state: `state = state * 1103515245 + 12345`, output
    /// `(state / 65536) % 32768`. Process-wide, guarded by a lock but not
    /// deterministic under concurrent use.
    lcg: Mutex<u64>,
    args: Vec<String>,
}

/// Per-thread runtime context handed to every builtin call.
#[derive(Debug)]
pub struct Runtime {
    shared: Arc<Shared>,
    pub exceptions: ExceptionStack,
    thread_id: u64,
    exit_code: Option<i32>,
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Runtime::with_args(Vec::new())
    }

    pub fn with_args(args: Vec<String>) -> Self {
        Runtime {
            shared: Arc::new(Shared {
                handles: Mutex::new(HashMap::new()),
                next_handle: AtomicU64::new(1),
                next_thread_id: AtomicU64::new(1),
                lcg: Mutex::new(0),
                args,
            }),
            exceptions: ExceptionStack::new(),
            thread_id: 0,
            exit_code: None,
        }
    }

    /// Child view for a spawned guest thread: shared heap-side state, fresh
    /// exception stack and exit flag.
    pub fn fork(&self) -> Runtime {
        Runtime {
            shared: self.shared.clone(),
            exceptions: ExceptionStack::new(),
            thread_id: self.shared.next_thread_id.fetch_add(1, Ordering::Relaxed),
            exit_code: None,
        }
    }

    pub fn thread_id(&self) -> u64 {
        self.thread_id
    }

    pub fn args(&self) -> &[String] {
        &self.shared.args
    }

    /// `exit(code)`: the VM halts cooperatively when the current builtin
    /// returns.
    pub fn request_exit(&mut self, code: i32) {
        self.exit_code = Some(code);
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_code.is_some()
    }

    pub fn take_exit(&mut self) -> Option<i32> {
        self.exit_code.take()
    }

    // Handle side table ----------------------------------------------------

    fn insert_handle(&self, obj: HandleObj) -> Value {
        let id = self.shared.next_handle.fetch_add(1, Ordering::Relaxed);
        self.handles_guard().insert(id, obj);
        Value::Ptr(id)
    }

    fn handles_guard(&self) -> std::sync::MutexGuard<'_, HashMap<u64, HandleObj>> {
        self.shared
            .handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn new_mutex(&self) -> Value {
        self.insert_handle(HandleObj::Mutex(Arc::new(GuestMutex::new())))
    }

    pub fn new_cond(&self) -> Value {
        self.insert_handle(HandleObj::Cond(Arc::new(GuestCond::new())))
    }

    pub fn mutex(&self, name: &str, id: u64) -> Result<Arc<GuestMutex>, RuntimeError> {
        match self.handles_guard().get(&id) {
            Some(HandleObj::Mutex(m)) => Ok(m.clone()),
            _ => Err(RuntimeError::new(format!(
                "{}: invalid mutex handle",
                name
            ))),
        }
    }

    pub fn cond(&self, name: &str, id: u64) -> Result<Arc<GuestCond>, RuntimeError> {
        match self.handles_guard().get(&id) {
            Some(HandleObj::Cond(c)) => Ok(c.clone()),
            _ => Err(RuntimeError::new(format!("{}: invalid cond handle", name))),
        }
    }

    /// Remove and return a thread handle for join/detach. A second take of
    /// the same handle fails.
    pub fn take_thread(&self, name: &str, id: u64) -> Result<JoinHandle<Value>, RuntimeError> {
        let mut guard = self.handles_guard();
        match guard.get(&id) {
            Some(HandleObj::Thread(_)) => match guard.remove(&id) {
                Some(HandleObj::Thread(h)) => Ok(h),
                _ => unreachable!(),
            },
            _ => Err(RuntimeError::new(format!(
                "{}: invalid thread handle",
                name
            ))),
        }
    }

    /// Spawn an OS thread running `body` against a forked runtime and
    /// return its opaque handle. The VM's spawn opcode is the only caller;
    /// the `thread_spawn` builtin itself is a fatal stub because it cannot
    /// capture the caller's closure context.
    pub fn spawn_thread<F>(&self, body: F) -> Value
    where
        F: FnOnce(&mut Runtime) -> Value + Send + 'static,
    {
        let mut child = self.fork();
        let handle = std::thread::spawn(move || body(&mut child));
        self.insert_handle(HandleObj::Thread(handle))
    }

    // Process-wide LCG -----------------------------------------------------

    pub fn lcg_seed(&self, seed: i64) {
        *self.shared.lcg.lock().unwrap_or_else(PoisonError::into_inner) = seed as u64;
    }

    /// Next value in `[0, 32768)`.
    pub fn lcg_next(&self) -> i64 {
        let mut state = self.shared.lcg.lock().unwrap_or_else(PoisonError::into_inner);
        *state = state.wrapping_mul(1103515245).wrapping_add(12345);
        ((*state / 65536) % 32768) as i64
    }
}
