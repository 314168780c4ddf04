//! Guest-visible synchronization primitives.
//!
//! Guest mutexes and condition variables cannot be thin wrappers over
//! `std::sync` guards: guest code locks in one builtin call and unlocks in
//! another, so no guard lifetime can span the pair. Both primitives are
//! explicit state machines driven by a host mutex/condvar pair.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

fn relock<'a, T>(m: &'a Mutex<T>) -> MutexGuard<'a, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Non-recursive guest mutex. `lock` blocks, `try_lock` does not, `unlock`
/// reports misuse (unlocking an unlocked mutex) to the caller.
#[derive(Debug, Default)]
pub struct GuestMutex {
    locked: Mutex<bool>,
    cv: Condvar,
}

impl GuestMutex {
    pub fn new() -> Self {
        GuestMutex::default()
    }

    pub fn lock(&self) {
        let mut locked = relock(&self.locked);
        while *locked {
            locked = self.cv.wait(locked).unwrap_or_else(PoisonError::into_inner);
        }
        *locked = true;
    }

    /// True if the lock was acquired.
    pub fn try_lock(&self) -> bool {
        let mut locked = relock(&self.locked);
        if *locked {
            false
        } else {
            *locked = true;
            true
        }
    }

    /// False if the mutex was not locked; the builtin turns that into a
    /// fatal error.
    pub fn unlock(&self) -> bool {
        let mut locked = relock(&self.locked);
        if !*locked {
            return false;
        }
        *locked = false;
        self.cv.notify_one();
        true
    }

    pub fn is_locked(&self) -> bool {
        *relock(&self.locked)
    }
}

#[derive(Debug, Default)]
struct CondState {
    waiters: u64,
    permits: u64,
    generation: u64,
}

/// Guest condition variable with POSIX-shaped semantics: `signal` wakes at
/// most one current waiter and is lost when nobody waits, `broadcast` wakes
/// every current waiter.
#[derive(Debug, Default)]
pub struct GuestCond {
    state: Mutex<CondState>,
    cv: Condvar,
}

impl GuestCond {
    pub fn new() -> Self {
        GuestCond::default()
    }

    /// Atomically release `mutex`, wait for a signal or broadcast, then
    /// reacquire `mutex`. Returns false (without waiting) when the caller
    /// did not hold the mutex.
    pub fn wait(&self, mutex: &GuestMutex) -> bool {
        let mut state = relock(&self.state);
        let generation = state.generation;
        state.waiters += 1;
        // Registered as a waiter before the mutex drops, so a signal racing
        // with the release cannot be lost.
        if !mutex.unlock() {
            state.waiters -= 1;
            return false;
        }
        loop {
            if state.permits > 0 {
                state.permits -= 1;
                break;
            }
            if state.generation != generation {
                break;
            }
            state = self.cv.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        state.waiters -= 1;
        drop(state);
        mutex.lock();
        true
    }

    /// Wake at most one waiter. A signal with no waiters is a no-op.
    pub fn signal(&self) {
        let mut state = relock(&self.state);
        if state.waiters > state.permits {
            state.permits += 1;
            self.cv.notify_one();
        }
    }

    /// Wake every current waiter.
    pub fn broadcast(&self) {
        let mut state = relock(&self.state);
        if state.waiters > 0 {
            state.generation = state.generation.wrapping_add(1);
            state.permits = 0;
            self.cv.notify_all();
        }
    }
}
