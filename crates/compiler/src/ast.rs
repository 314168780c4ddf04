//! The slice of the parser's output the module graph consumes.
//!
//! Parsing itself lives outside this crate; the graph asks a `ModuleParser`
//! for a `Module` on demand and only ever looks at the import list and the
//! function signatures (names, arity, export flags). Function bodies travel
//! through the external bytecode compiler and come back as
//! `bytecode::CompiledModule`s for linking.

/// One parsed source unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: String,
    pub imports: Vec<Import>,
    pub functions: Vec<FunctionSig>,
}

/// An import declaration: the imported module's name (`a/b/c` maps to
/// `a/b/c.bp` under a search root).
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub module_name: String,
}

/// Signature of one function definition. Exported symbols are tagged in the
/// AST and become short-name addressable from importing modules.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSig {
    pub name: String,
    pub arity: usize,
    pub exported: bool,
}

/// Parser hook: the graph hands over the raw source bytes and the module
/// name, the parser returns the AST or an error message.
pub trait ModuleParser {
    fn parse(&self, name: &str, source: &[u8]) -> Result<Module, String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_shape() {
        let m = Module {
            name: "util".to_string(),
            imports: vec![Import {
                module_name: "fmt".to_string(),
            }],
            functions: vec![FunctionSig {
                name: "helper".to_string(),
                arity: 2,
                exported: true,
            }],
        };
        assert_eq!(m.imports[0].module_name, "fmt");
        assert!(m.functions[0].exported);
    }
}
