//! Graph configuration.
//!
//! Lets a driver extend module resolution without environment variables:
//! extra search roots slot in after the entry module's directory and before
//! `BETTERPYTHON_PATH`, and the stdlib root can be pinned instead of probed
//! from the fixed candidate list.

use std::path::PathBuf;

/// Builder-style resolver configuration.
#[derive(Debug, Clone, Default)]
pub struct GraphConfig {
    /// Search roots consulted before the environment paths.
    pub extra_search_paths: Vec<PathBuf>,
    /// Pinned stdlib directory; when unset the fixed candidates are probed.
    pub stdlib_root: Option<PathBuf>,
}

impl GraphConfig {
    pub fn new() -> Self {
        GraphConfig::default()
    }

    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.extra_search_paths.push(path.into());
        self
    }

    pub fn with_stdlib_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdlib_root = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = GraphConfig::new()
            .with_search_path("/opt/bp/lib")
            .with_search_path("vendor")
            .with_stdlib_root("/opt/bp/stdlib");
        assert_eq!(config.extra_search_paths.len(), 2);
        assert_eq!(config.stdlib_root, Some(PathBuf::from("/opt/bp/stdlib")));
    }

    #[test]
    fn test_default_is_empty() {
        let config = GraphConfig::default();
        assert!(config.extra_search_paths.is_empty());
        assert!(config.stdlib_root.is_none());
    }
}
