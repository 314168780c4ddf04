//! BetterPython core: the tagged value model and managed heap.
//!
//! Key design principles:
//! - `Value`: what guest code talks about (Int, Str, Array, ...), cheap to
//!   copy, heap payloads jointly owned through `Arc`.
//! - Containers (`Array`, `Map`, `StructData`) are internally locked so the
//!   heap is safe to share across guest threads.
//! - The map is a hand-built open-addressed table because its probe, resize
//!   and iteration behavior are part of the language contract.

pub mod array;
pub mod map;
pub mod record;
pub mod string;
pub mod value;

pub use array::Array;
pub use map::Map;
pub use record::{ClassDef, StructData};
pub use string::BpString;
pub use value::{Value, compare_values, hash_value, lock_container, value_eq};
