//! Value: what guest code talks about.
//!
//! A `Value` is a tagged union that is cheap to copy. Scalar variants carry
//! their payload inline; heap variants carry an `Arc` to a shared payload, so
//! duplicating a value never copies container contents. A live value keeps
//! its payload addressable; dropping the last reference frees it.
//!
//! Mutable containers (`Array`, `Map`, `Struct`) sit behind a per-container
//! lock so the heap can be shared across guest threads. Value copies between
//! threads are by-value of the tag plus the refcounted payload pointer.

use crate::array::Array;
use crate::map::Map;
use crate::record::{ClassDef, StructData};
use crate::string::BpString;
use std::cmp::Ordering;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Tagged guest value.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    /// Immutable byte string.
    Str(Arc<BpString>),
    /// Ordered sequence, shared and internally locked.
    Array(Arc<Mutex<Array>>),
    /// Open-addressed hash table, shared and internally locked.
    Map(Arc<Mutex<Map>>),
    /// Fixed-field record; field 0 carries the `__tag` convention for
    /// tagged-union use.
    Struct(Arc<Mutex<StructData>>),
    /// Type descriptor for struct instances.
    Class(Arc<ClassDef>),
    /// Opaque handle into the runtime side table (threads, mutexes, conds).
    /// Never a raw address.
    Ptr(u64),
    /// Function index into the merged bytecode image.
    Func(u32),
}

impl Value {
    pub fn str(s: impl Into<BpString>) -> Value {
        Value::Str(Arc::new(s.into()))
    }

    pub fn array(cap: usize) -> Value {
        Value::Array(Arc::new(Mutex::new(Array::with_capacity(cap))))
    }

    pub fn array_from(items: Vec<Value>) -> Value {
        Value::Array(Arc::new(Mutex::new(Array::from_vec(items))))
    }

    pub fn map(cap: usize) -> Value {
        Value::Map(Arc::new(Mutex::new(Map::with_capacity(cap))))
    }

    pub fn struct_new(class: Option<Arc<ClassDef>>, field_count: usize) -> Value {
        Value::Struct(Arc::new(Mutex::new(StructData::new(class, field_count))))
    }

    /// Variant name as guest code sees it (`typeof` builtin).
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Null => "null",
            Value::Str(_) => "str",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Struct(_) => "struct",
            Value::Class(_) => "class",
            Value::Ptr(_) => "ptr",
            Value::Func(_) => "func",
        }
    }
}

/// Lock a shared container, tolerating poison. A guest thread that dies while
/// holding a container lock must not wedge the heap for everyone else.
pub fn lock_container<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Value equality: scalars by value, strings by content, containers by
/// identity (same heap payload), handles and function ids by number.
/// Cross-variant comparisons are false; `Float` follows IEEE (NaN != NaN).
pub fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Null, Value::Null) => true,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => Arc::ptr_eq(x, y),
        (Value::Map(x), Value::Map(y)) => Arc::ptr_eq(x, y),
        (Value::Struct(x), Value::Struct(y)) => Arc::ptr_eq(x, y),
        (Value::Class(x), Value::Class(y)) => Arc::ptr_eq(x, y),
        (Value::Ptr(x), Value::Ptr(y)) => x == y,
        (Value::Func(x), Value::Func(y)) => x == y,
        _ => false,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        value_eq(self, other)
    }
}

/// Stable hash for map keys. Only `{Int, Float, Bool, Str, Null}` hash
/// meaningfully; every other variant hashes to 0 and acts as a weak key.
pub fn hash_value(v: &Value) -> u64 {
    match v {
        Value::Int(i) => *i as u64,
        Value::Float(f) => f.to_bits(),
        Value::Bool(b) => u64::from(*b),
        Value::Null => 0,
        Value::Str(s) => s.hash_djb2(),
        _ => 0,
    }
}

/// Sort comparator. Defined only for homogeneous int, float and string
/// pairs; any other pairing is non-comparable and returns `None`, which the
/// stable sort treats as "leave in place".
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
        (Value::Str(x), Value::Str(y)) => Some(x.as_bytes().cmp(y.as_bytes())),
        _ => None,
    }
}
