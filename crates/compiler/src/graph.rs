//! Module graph: discovery, parse-on-demand, recursive import resolution.
//!
//! The entry file is canonicalized, registered as `__main__` at index 0,
//! and its imports are resolved depth first. A module index never changes
//! once assigned and `modules` is append-only during resolution, so
//! dependency edges are stable indices. Cycles are detected with a visit
//! stack: resolving a name to a module that is on the stack and not yet
//! fully parsed aborts with a "circular dependency detected" error. After
//! successful resolution the graph is acyclic and `topo_sort` yields a
//! compile order with every dependency ahead of its dependents.

use crate::ast::{Module, ModuleParser};
use crate::config::GraphConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

/// At most this many search roots are retained.
pub const MAX_SEARCH_PATHS: usize = 16;

/// Name under which the entry file is registered.
pub const ENTRY_MODULE_NAME: &str = "__main__";

/// Colon-separated list of extra search roots.
pub const PATH_ENV_VAR: &str = "BETTERPYTHON_PATH";

/// Source file extension.
pub const MODULE_EXTENSION: &str = "bp";

/// Fixed stdlib candidates, probed in order; the first existing directory
/// wins.
const STDLIB_CANDIDATES: &[&str] = &[
    "/usr/local/lib/betterpython/stdlib",
    "/usr/lib/betterpython/stdlib",
    "./stdlib",
];

/// One discovered module.
#[derive(Debug)]
pub struct ModuleInfo {
    pub name: String,
    /// Canonical path of the source file.
    pub path: PathBuf,
    pub source: Vec<u8>,
    pub ast: Option<Module>,
    pub parsed: bool,
    pub compiled: bool,
    /// Indices into the graph's module list.
    pub deps: Vec<usize>,
}

/// The resolved module set plus the search roots it was built with.
#[derive(Debug)]
pub struct ModuleGraph {
    modules: Vec<ModuleInfo>,
    search_paths: Vec<PathBuf>,
    entry: usize,
}

impl ModuleGraph {
    /// Resolve the entry file and, recursively, everything it imports.
    pub fn resolve_all(entry_path: &Path, parser: &dyn ModuleParser) -> Result<ModuleGraph, String> {
        ModuleGraph::resolve_all_with_config(entry_path, parser, &GraphConfig::default())
    }

    pub fn resolve_all_with_config(
        entry_path: &Path,
        parser: &dyn ModuleParser,
        config: &GraphConfig,
    ) -> Result<ModuleGraph, String> {
        let entry_path = entry_path
            .canonicalize()
            .map_err(|e| format!("failed to canonicalize '{}': {}", entry_path.display(), e))?;
        let mut graph = ModuleGraph {
            modules: Vec::new(),
            search_paths: build_search_paths(&entry_path, config),
            entry: 0,
        };
        debug!(paths = ?graph.search_paths, "search roots");
        let mut stack = Vec::new();
        graph.load_module(ENTRY_MODULE_NAME, entry_path, parser, &mut stack)?;
        Ok(graph)
    }

    pub fn modules(&self) -> &[ModuleInfo] {
        &self.modules
    }

    pub fn module(&self, idx: usize) -> &ModuleInfo {
        &self.modules[idx]
    }

    pub fn entry_index(&self) -> usize {
        self.entry
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Register, read and parse one module, then resolve its imports depth
    /// first. The index is assigned before parsing so that the module is
    /// visible to cycle detection while on the stack.
    fn load_module(
        &mut self,
        name: &str,
        path: PathBuf,
        parser: &dyn ModuleParser,
        stack: &mut Vec<usize>,
    ) -> Result<usize, String> {
        let idx = self.modules.len();
        self.modules.push(ModuleInfo {
            name: name.to_string(),
            path: path.clone(),
            source: Vec::new(),
            ast: None,
            parsed: false,
            compiled: false,
            deps: Vec::new(),
        });
        stack.push(idx);
        debug!(module = name, index = idx, path = %path.display(), "registered module");

        let source = std::fs::read(&path)
            .map_err(|e| format!("failed to read module '{}' at '{}': {}", name, path.display(), e))?;
        let ast = parser.parse(name, &source)?;
        let imports: Vec<String> = ast.imports.iter().map(|i| i.module_name.clone()).collect();
        self.modules[idx].source = source;
        self.modules[idx].ast = Some(ast);

        let referrer_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        for import in imports {
            let dep = self.resolve_import(&import, &referrer_dir, parser, stack)?;
            if !self.modules[idx].deps.contains(&dep) {
                self.modules[idx].deps.push(dep);
            }
        }

        self.modules[idx].parsed = true;
        stack.pop();
        Ok(idx)
    }

    /// Resolve one import by name: cache hit, cycle, or fresh load.
    fn resolve_import(
        &mut self,
        name: &str,
        referrer_dir: &Path,
        parser: &dyn ModuleParser,
        stack: &mut Vec<usize>,
    ) -> Result<usize, String> {
        if let Some(idx) = self.modules.iter().position(|m| m.name == name) {
            return self.cache_hit(idx, name, stack);
        }
        let path = self.find_module(name, referrer_dir).ok_or_else(|| {
            format!(
                "module '{}' not found (searched {} and {} root{})",
                name,
                referrer_dir.display(),
                self.search_paths.len(),
                if self.search_paths.len() == 1 { "" } else { "s" }
            )
        })?;
        // The same file can be reached under two names (the entry module is
        // registered as __main__); match by canonical path as well.
        if let Some(idx) = self.modules.iter().position(|m| m.path == path) {
            return self.cache_hit(idx, name, stack);
        }
        self.load_module(name, path, parser, stack)
    }

    fn cache_hit(&self, idx: usize, name: &str, stack: &[usize]) -> Result<usize, String> {
        if !self.modules[idx].parsed && stack.contains(&idx) {
            let chain: Vec<&str> = stack
                .iter()
                .map(|&i| self.modules[i].name.as_str())
                .chain(std::iter::once(name))
                .collect();
            return Err(format!(
                "circular dependency detected: {}",
                chain.join(" -> ")
            ));
        }
        debug!(module = name, index = idx, "import cache hit");
        Ok(idx)
    }

    /// Find `name`'s source file: the importing module's directory first,
    /// then each search root in order. First match wins.
    fn find_module(&self, name: &str, referrer_dir: &Path) -> Option<PathBuf> {
        let rel = PathBuf::from(format!("{}.{}", name, MODULE_EXTENSION));
        let local = referrer_dir.join(&rel);
        if local.is_file() {
            return local.canonicalize().ok();
        }
        for root in &self.search_paths {
            let candidate = root.join(&rel);
            if candidate.is_file() {
                return candidate.canonicalize().ok();
            }
        }
        None
    }

    /// Dependencies-first compile order via post-order DFS from the entry.
    /// A grey node on the walk means a cycle survived resolution; the sort
    /// aborts rather than emit a bogus order.
    pub fn topo_sort(&self) -> Result<Vec<usize>, String> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            White,
            Grey,
            Black,
        }
        fn visit(
            graph: &ModuleGraph,
            idx: usize,
            marks: &mut [Mark],
            order: &mut Vec<usize>,
        ) -> Result<(), String> {
            match marks[idx] {
                Mark::Black => return Ok(()),
                Mark::Grey => {
                    return Err(format!(
                        "cycle detected during topological sort at module '{}'",
                        graph.modules[idx].name
                    ));
                }
                Mark::White => {}
            }
            marks[idx] = Mark::Grey;
            for &dep in &graph.modules[idx].deps {
                visit(graph, dep, marks, order)?;
            }
            marks[idx] = Mark::Black;
            order.push(idx);
            Ok(())
        }

        let mut marks = vec![Mark::White; self.modules.len()];
        let mut order = Vec::with_capacity(self.modules.len());
        visit(self, self.entry, &mut marks, &mut order)?;
        debug!(?order, "topological order");
        Ok(order)
    }
}

fn push_root(paths: &mut Vec<PathBuf>, root: PathBuf) {
    if paths.len() < MAX_SEARCH_PATHS && !paths.contains(&root) {
        paths.push(root);
    }
}

/// Search roots, in consultation order: the entry module's directory,
/// configured extras, `BETTERPYTHON_PATH` components, the first existing
/// stdlib candidate (or the configured override), then `./packages`.
fn build_search_paths(entry_path: &Path, config: &GraphConfig) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = entry_path.parent() {
        push_root(&mut paths, dir.to_path_buf());
    }
    for extra in &config.extra_search_paths {
        push_root(&mut paths, extra.clone());
    }
    if let Ok(env) = std::env::var(PATH_ENV_VAR) {
        for part in env.split(':').filter(|p| !p.is_empty()) {
            push_root(&mut paths, PathBuf::from(part));
        }
    }
    match &config.stdlib_root {
        Some(root) => push_root(&mut paths, root.clone()),
        None => {
            for candidate in STDLIB_CANDIDATES {
                if Path::new(candidate).is_dir() {
                    push_root(&mut paths, PathBuf::from(candidate));
                    break;
                }
            }
        }
    }
    push_root(&mut paths, PathBuf::from("./packages"));
    paths
}

#[cfg(test)]
pub(crate) mod testutil {
    use crate::ast::{FunctionSig, Import, Module, ModuleParser};

    /// Line-oriented stub parser for graph tests: `import NAME`,
    /// `export fn NAME`, `fn NAME`.
    pub struct LineParser;

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
}
