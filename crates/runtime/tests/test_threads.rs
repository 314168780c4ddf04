//! Threaded integration tests: shared heap plus guest synchronization, the
//! way the VM's spawn opcode wires them together.

use bp_core::{Value, lock_container};
use bp_runtime::registry::{BuiltinId, call};
use bp_runtime::Runtime;

/// Eight writers, ten thousand inserts each, one shared map guarded by one
/// guest mutex: every insert must land.
#[test]
fn test_concurrent_map_set_under_mutex() {
    const THREADS: i64 = 8;
    const PER_THREAD: i64 = 10_000;

    let mut rt = Runtime::new();
    let map = Value::map(0);
    let mutex = call(&mut rt, BuiltinId::MutexNew, &[]).unwrap();

    let mut handles = Vec::new();
    for t in 0..THREADS {
        let map = map.clone();
        let mutex = mutex.clone();
        handles.push(rt.spawn_thread(move |child| {
            for i in 0..PER_THREAD {
                call(child, BuiltinId::MutexLock, std::slice::from_ref(&mutex)).unwrap();
                call(
                    child,
                    BuiltinId::MapSet,
                    &[
                        map.clone(),
                        Value::Int(t * PER_THREAD + i),
                        Value::Int(i),
                    ],
                )
                .unwrap();
                call(child, BuiltinId::MutexUnlock, std::slice::from_ref(&mutex)).unwrap();
            }
            Value::Null
        }));
    }
    for handle in handles {
        call(&mut rt, BuiltinId::ThreadJoin, &[handle]).unwrap();
    }

    assert_eq!(
        call(&mut rt, BuiltinId::MapLen, &[map]).unwrap(),
        Value::Int(THREADS * PER_THREAD)
    );
}

/// Values move between threads by value of the tag plus the shared payload
/// pointer: a child's pushes are visible to the parent.
#[test]
fn test_shared_array_across_threads() {
    let mut rt = Runtime::new();
    let arr = Value::array(0);

    let arr2 = arr.clone();
    let handle = rt.spawn_thread(move |child| {
        for i in 0..100 {
            call(child, BuiltinId::ArrayPush, &[arr2.clone(), Value::Int(i)]).unwrap();
        }
        arr2
    });
    let returned = call(&mut rt, BuiltinId::ThreadJoin, &[handle]).unwrap();

    assert_eq!(returned, arr);
    let Value::Array(payload) = &arr else { panic!("expected array") };
    assert_eq!(lock_container(payload).len(), 100);
}

/// Join returns the guest value the thread body produced.
#[test]
fn test_join_returns_value() {
    let mut rt = Runtime::new();
    let handle = rt.spawn_thread(|child| {
        call(child, BuiltinId::StrUpper, &[Value::str("done")]).unwrap()
    });
    assert_eq!(
        call(&mut rt, BuiltinId::ThreadJoin, &[handle]).unwrap(),
        Value::str("DONE")
    );
}

/// Trylock contention: exactly one of many racing threads can hold the
/// mutex at a time.
#[test]
fn test_trylock_contention() {
    let mut rt = Runtime::new();
    let mutex = call(&mut rt, BuiltinId::MutexNew, &[]).unwrap();

    call(&mut rt, BuiltinId::MutexLock, std::slice::from_ref(&mutex)).unwrap();
    let m2 = mutex.clone();
    let handle = rt.spawn_thread(move |child| {
        call(child, BuiltinId::MutexTrylock, std::slice::from_ref(&m2)).unwrap()
    });
    assert_eq!(
        call(&mut rt, BuiltinId::ThreadJoin, &[handle]).unwrap(),
        Value::Bool(false)
    );
    call(&mut rt, BuiltinId::MutexUnlock, std::slice::from_ref(&mutex)).unwrap();

    let m3 = mutex.clone();
    let handle = rt.spawn_thread(move |child| {
        let got = call(child, BuiltinId::MutexTrylock, std::slice::from_ref(&m3)).unwrap();
        if got == Value::Bool(true) {
            call(child, BuiltinId::MutexUnlock, std::slice::from_ref(&m3)).unwrap();
        }
        got
    });
    assert_eq!(
        call(&mut rt, BuiltinId::ThreadJoin, &[handle]).unwrap(),
        Value::Bool(true)
    );
}
