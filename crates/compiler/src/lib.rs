//! BetterPython compiler-side core: module graph and linker.
//!
//! The driver builds a `ModuleGraph` from the entry file (discovery on
//! search paths, parse-on-demand through a `ModuleParser`, cycle
//! detection), topologically sorts it, compiles each module externally, and
//! hands the ordered `CompiledModule`s to `linker::link` for the single
//! merged `Image` the VM executes.

pub mod ast;
pub mod bytecode;
pub mod config;
pub mod graph;
pub mod linker;

pub use ast::{FunctionSig, Import, Module, ModuleParser};
pub use bytecode::{CallTarget, CompiledFunction, CompiledModule, Const, Image, Instr, SymbolEntry};
pub use config::GraphConfig;
pub use graph::{ENTRY_MODULE_NAME, MAX_SEARCH_PATHS, MODULE_EXTENSION, ModuleGraph, PATH_ENV_VAR};
pub use linker::{QUALIFIER, TOP_LEVEL_NAME, link, qualify};
