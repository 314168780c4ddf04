//! End-to-end resolve -> topo-sort -> compile -> link pipeline, with a stub
//! parser and a trivial code generator standing in for the external stages.

use bp_compiler::{
    CallTarget, CompiledFunction, CompiledModule, Const, FunctionSig, GraphConfig, Image, Import,
    Instr, Module, ModuleGraph, ModuleParser, TOP_LEVEL_NAME, link, qualify,
};
use std::fs;
use std::path::{Path, PathBuf};

/// `import NAME` / `export fn NAME` / `fn NAME`, one per line.
struct LineParser;

impl ModuleParser for LineParser {
    fn parse(&self, name: &str, source: &[u8]) -> Result<Module, String> {
        let text = std::str::from_utf8(source)
            .map_err(|_| format!("module '{}' is not valid UTF-8", name))?;
        let mut imports = Vec::new();
        let mut functions = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if let Some(rest) = line.strip_prefix("import ") {
                imports.push(Import {
                    module_name: rest.trim().to_string(),
                });
            } else if let Some(rest) = line.strip_prefix("export fn ") {
                functions.push(FunctionSig {
                    name: rest.trim().to_string(),
                    arity: 0,
                    exported: true,
                });
            } else if let Some(rest) = line.strip_prefix("fn ") {
                functions.push(FunctionSig {
                    name: rest.trim().to_string(),
                    arity: 0,
                    exported: false,
                });
            }
        }
        Ok(Module {
            name: name.to_string(),
            imports,
            functions,
        })
    }
}

/// Stand-in for the bytecode compiler: every function loads the module
/// name from the constant pool and returns; the top level calls every
/// function defined in the module.
fn compile_module(graph: &ModuleGraph, idx: usize) -> CompiledModule {
    let info = graph.module(idx);
    let ast = info.ast.as_ref().expect("resolved modules are parsed");
    let constants = vec![Const::Str(info.name.clone().into_bytes())];

    let functions: Vec<CompiledFunction> = ast
        .functions
        .iter()
        .map(|sig| CompiledFunction {
            name: sig.name.clone(),
            exported: sig.exported,
            arity: sig.arity,
            locals: 0,
            code: vec![Instr::LoadConst(0), Instr::Return],
        })
        .collect();

    let mut top_code: Vec<Instr> = ast
        .functions
        .iter()
        .map(|sig| Instr::Call {
            target: CallTarget::Named(sig.name.clone()),
            argc: 0,
        })
        .collect();
    top_code.push(Instr::Return);

    CompiledModule {
        name: info.name.clone(),
        imports: ast.imports.iter().map(|i| i.module_name.clone()).collect(),
        top_level: CompiledFunction {
            name: TOP_LEVEL_NAME.to_string(),
            exported: false,
            arity: 0,
            locals: 0,
            code: top_code,
        },
        functions,
        constants,
    }
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(format!("{}.bp", name));
    fs::write(&path, content).unwrap();
    path
}

fn build(entry: &Path) -> Result<Image, String> {
    let graph = ModuleGraph::resolve_all_with_config(entry, &LineParser, &GraphConfig::new())?;
    let order = graph.topo_sort()?;
    let compiled: Vec<CompiledModule> = order.iter().map(|&i| compile_module(&graph, i)).collect();
    link(&compiled)
}

#[test]
fn test_three_module_program_links() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "strings", "export fn pad\nfn pad_inner\n");
    write(dir.path(), "report", "import strings\nexport fn render\n");
    let entry = write(dir.path(), "main", "import report\nfn main\n");

    let image = build(&entry).unwrap();

    // F0 is the entry top level; one symbol per merged function.
    assert_eq!(image.entry, 0);
    assert_eq!(image.functions[0].name, qualify("__main__", TOP_LEVEL_NAME));
    assert_eq!(image.symbols.len(), image.functions.len());

    // Every call target is resolved (Index) or a builtin by name.
    for func in &image.functions {
        for instr in &func.code {
            if let Instr::Call { target, .. } | Instr::Spawn { target, .. } = instr {
                assert!(
                    !matches!(target, CallTarget::Named(_)),
                    "unresolved target in {}: {:?}",
                    func.name,
                    target
                );
            }
        }
    }

    // Per-module name constants deduplicated into one pool.
    assert_eq!(image.constants.len(), 3);
    let expected: Vec<&str> = vec!["strings", "report", "__main__"];
    for name in expected {
        assert!(
            image
                .constants
                .iter()
                .any(|c| *c == Const::Str(name.as_bytes().to_vec())),
            "missing constant for {}",
            name
        );
    }

    // The private helper is only addressable through its qualified name.
    assert!(
        image
            .symbols
            .iter()
            .any(|s| s.qualified_name == "strings$pad_inner" && !s.exported)
    );
}

#[test]
fn test_cycle_aborts_the_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "u", "import main\n");
    let entry = write(dir.path(), "main", "import u\n");

    let err = build(&entry).unwrap_err();
    assert!(err.contains("circular dependency detected"), "{}", err);
}

#[test]
fn test_diamond_links_once() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "c", "export fn shared\n");
    write(dir.path(), "a", "import c\nexport fn fa\n");
    write(dir.path(), "b", "import c\nexport fn fb\n");
    let entry = write(dir.path(), "main", "import a\nimport b\n");

    let image = build(&entry).unwrap();
    // c linked exactly once even though two modules import it.
    let shared: Vec<_> = image
        .symbols
        .iter()
        .filter(|s| s.qualified_name == "c$shared")
        .collect();
    assert_eq!(shared.len(), 1);
}
