use std::collections::HashMap;
use std::env as stdenv;
use std::path::{Path, PathBuf};

/// Mutable, session-level view of the process state that handlers may consult.
///
/// The environment contains:
/// - `vars`: variables visible to handlers (only `HOME` is consulted today).
/// - `current_dir`: the directory relative paths are resolved against.
/// - `should_exit`: raised when the interrupt key is seen somewhere other than
///   the line editor (e.g. inside the pager); the session stops as soon as it
///   notices.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of variables (e.g. HOME).
    pub vars: HashMap<String, String>,
    /// The current working directory of the session.
    pub current_dir: PathBuf,
    /// When set to true, the interactive loop terminates.
    pub should_exit: bool,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            should_exit: false,
        }
    }

    /// An environment rooted at `dir` with no variables, for embedding and tests.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self {
            vars: HashMap::new(),
            current_dir: dir.into(),
            should_exit: false,
        }
    }

    /// Get the value of a variable.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    /// Set or override a variable.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Resolve `path` against the session working directory.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.current_dir.join(path)
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
