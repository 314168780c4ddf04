//! Multi-module linker.
//!
//! Consumes topologically ordered `CompiledModule`s and produces one
//! `Image`. Every function gets a merged index and the qualified name
//! `{module}${short}`; exported functions are additionally addressable by
//! short name from modules that list their origin as an import. Constant
//! pools merge with byte-equality de-duplication. Call targets rewrite to
//! merged indices; builtin targets pass through by name for the VM to bind
//! at load time.

use crate::bytecode::{
    CallTarget, CompiledFunction, CompiledModule, Const, Image, Instr, SymbolEntry,
};
use crate::graph::ENTRY_MODULE_NAME;
use std::collections::HashMap;
use tracing::debug;

/// Qualified-name separator, literal `$` on the wire between link passes.
pub const QUALIFIER: char = '$';

/// Name of the implicit top-level function of each module.
pub const TOP_LEVEL_NAME: &str = "__toplevel__";

pub fn qualify(module: &str, short: &str) -> String {
    format!("{}{}{}", module, QUALIFIER, short)
}

/// Link topologically ordered modules into a single image.
///
/// `F0` is the entry module's top level; dependency modules' top levels are
/// linked as `{module}$__toplevel__` functions (their invocation order is
/// the code generator's concern).
pub fn link(modules: &[CompiledModule]) -> Result<Image, String> {
    let entry_at = modules
        .iter()
        .position(|m| m.name == ENTRY_MODULE_NAME)
        .ok_or_else(|| format!("link: entry module '{}' missing", ENTRY_MODULE_NAME))?;

    // Pass 1: assign merged indices and build the symbol table. The entry
    // top level claims index 0; everything else follows module order.
    let mut symbols: Vec<SymbolEntry> = Vec::new();
    let mut by_qualified: HashMap<String, u32> = HashMap::new();
    // (module position, function, merged index), in emission order.
    let mut emission: Vec<(usize, &CompiledFunction)> = Vec::new();

    fn assign<'m>(
        symbols: &mut Vec<SymbolEntry>,
        by_qualified: &mut HashMap<String, u32>,
        emission: &mut Vec<(usize, &'m CompiledFunction)>,
        module_at: usize,
        module: &'m CompiledModule,
        func: &'m CompiledFunction,
    ) -> Result<(), String> {
        let index = emission.len() as u32;
        let qualified = qualify(&module.name, &func.name);
        if by_qualified.insert(qualified.clone(), index).is_some() {
            return Err(format!(
                "link: symbol collision: duplicate qualified name '{}'",
                qualified
            ));
        }
        symbols.push(SymbolEntry {
            short_name: func.name.clone(),
            qualified_name: qualified,
            module: module.name.clone(),
            index,
            exported: func.exported,
        });
        emission.push((module_at, func));
        Ok(())
    }

    assign(
        &mut symbols,
        &mut by_qualified,
        &mut emission,
        entry_at,
        &modules[entry_at],
        &modules[entry_at].top_level,
    )?;
    for (at, module) in modules.iter().enumerate() {
        if at != entry_at {
            assign(
                &mut symbols,
                &mut by_qualified,
                &mut emission,
                at,
                module,
                &module.top_level,
            )?;
        }
        for func in &module.functions {
            assign(&mut symbols, &mut by_qualified, &mut emission, at, module, func)?;
        }
    }
    debug!(functions = emission.len(), "assigned merged indices");

    // Pass 2: per-module visibility sets for short-name resolution. Own
    // functions claim their short name first; an import whose export would
    // re-claim a taken short+importer pair is a link error.
    let mut visible: Vec<HashMap<String, u32>> = Vec::with_capacity(modules.len());
    for module in modules {
        let mut set: HashMap<String, u32> = HashMap::new();
        for func in &module.functions {
            let index = by_qualified[&qualify(&module.name, &func.name)];
            if set.insert(func.name.clone(), index).is_some() {
                return Err(format!(
                    "link: symbol collision: '{}' defined twice in module '{}'",
                    func.name, module.name
                ));
            }
        }
        for import in &module.imports {
            let origin = modules
                .iter()
                .find(|m| &m.name == import)
                .ok_or_else(|| {
                    format!(
                        "link: module '{}' imports '{}', which is not in the link set",
                        module.name, import
                    )
                })?;
            for func in origin.functions.iter().filter(|f| f.exported) {
                let index = by_qualified[&qualify(&origin.name, &func.name)];
                if set.insert(func.name.clone(), index).is_some() {
                    return Err(format!(
                        "link: symbol collision: '{}' in module '{}' (import '{}')",
                        func.name, module.name, import
                    ));
                }
            }
        }
        visible.push(set);
    }

    // Pass 3: merge constant pools with byte-equality de-duplication.
    let mut constants: Vec<Const> = Vec::new();
    let mut pool_index: HashMap<Const, u32> = HashMap::new();
    let mut remap: Vec<Vec<u32>> = Vec::with_capacity(modules.len());
    for module in modules {
        let mut module_remap = Vec::with_capacity(module.constants.len());
        for c in &module.constants {
            let merged = *pool_index.entry(c.clone()).or_insert_with(|| {
                constants.push(c.clone());
                (constants.len() - 1) as u32
            });
            module_remap.push(merged);
        }
        remap.push(module_remap);
    }
    debug!(merged = constants.len(), "merged constant pool");

    // Pass 4: emit functions with rewritten call targets and constant
    // indices.
    let mut functions = Vec::with_capacity(emission.len());
    for (at, func) in emission {
        let module = &modules[at];
        let mut linked = func.clone();
        linked.name = qualify(&module.name, &func.name);
        for instr in linked.code.iter_mut() {
            rewrite(instr, module, &visible[at], &by_qualified, &remap[at])?;
        }
        functions.push(linked);
    }

    Ok(Image {
        functions,
        constants,
        symbols,
        entry: 0,
    })
}

fn resolve_target(
    target: &CallTarget,
    module: &CompiledModule,
    visible: &HashMap<String, u32>,
    by_qualified: &HashMap<String, u32>,
) -> Result<CallTarget, String> {
    match target {
        CallTarget::Named(name) => {
            let index = if name.contains(QUALIFIER) {
                by_qualified.get(name).copied()
            } else {
                visible.get(name).copied()
            };
            match index {
                Some(i) => Ok(CallTarget::Index(i)),
                None => Err(format!(
                    "link: undefined symbol '{}' in module '{}'",
                    name, module.name
                )),
            }
        }
        CallTarget::Builtin(name) => Ok(CallTarget::Builtin(name.clone())),
        CallTarget::Index(i) => Ok(CallTarget::Index(*i)),
    }
}

fn rewrite(
    instr: &mut Instr,
    module: &CompiledModule,
    visible: &HashMap<String, u32>,
    by_qualified: &HashMap<String, u32>,
    remap: &[u32],
) -> Result<(), String> {
    match instr {
        Instr::LoadConst(i) => {
            let at = *i as usize;
            if at >= remap.len() {
                return Err(format!(
                    "link: constant index {} out of range in module '{}'",
                    i, module.name
                ));
            }
            *i = remap[at];
        }
        Instr::Call { target, .. } | Instr::Spawn { target, .. } => {
            *target = resolve_target(target, module, visible, by_qualified)?;
        }
        _ => {}
    }
    Ok(())
}
