//! Struct and class records.
//!
//! A struct is a heap record with a fixed field count addressed by index.
//! By convention field 0 holds a `__tag` value (string or int) when the
//! struct is used as a tagged-union carrier; the `tag` builtin reads it.

use crate::value::Value;
use std::sync::Arc;

/// Type descriptor shared by struct instances.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub field_names: Vec<String>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>, field_names: Vec<String>) -> Arc<ClassDef> {
        Arc::new(ClassDef {
            name: name.into(),
            field_names,
        })
    }

    pub fn field_count(&self) -> usize {
        self.field_names.len()
    }
}

/// Instance payload: a fixed-size field array, optionally typed by a class.
#[derive(Debug)]
pub struct StructData {
    pub class: Option<Arc<ClassDef>>,
    fields: Vec<Value>,
}

impl StructData {
    /// All fields start as `Null`.
    pub fn new(class: Option<Arc<ClassDef>>, field_count: usize) -> Self {
        StructData {
            class,
            fields: vec![Value::Null; field_count],
        }
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, idx: usize) -> Option<Value> {
        self.fields.get(idx).cloned()
    }

    pub fn set(&mut self, idx: usize, v: Value) -> bool {
        match self.fields.get_mut(idx) {
            Some(slot) => {
                *slot = v;
                true
            }
            None => false,
        }
    }

    /// Field 0, the variant tag by convention.
    pub fn tag(&self) -> Option<Value> {
        self.get(0)
    }
}
