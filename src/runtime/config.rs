//! Interpreter configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default simulated heap capacity in bytes
pub const DEFAULT_HEAP_SIZE: usize = 1024;

/// Default limit on nested user calls
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// How struct values are rendered by `print`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Field map only: `{x: 3, y: 0}`
    Plain,
    /// Type-prefixed: `Point { x: 3, y: 0 }`
    #[default]
    Pretty,
}

/// Settings shared by an interpreter and every module it imports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Capacity of the simulated heap; writes at or past it fail
    pub heap_size: usize,
    /// Directory `import name;` resolves `name.grv` against
    pub module_root: PathBuf,
    /// Maximum nesting of function and method calls
    pub max_call_depth: usize,
    /// Struct rendering for `print`
    pub format: Format,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            heap_size: DEFAULT_HEAP_SIZE,
            module_root: PathBuf::from("."),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            format: Format::Pretty,
        }
    }
}

impl InterpreterConfig {
    /// Creates the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the heap capacity
    pub fn with_heap_size(mut self, heap_size: usize) -> Self {
        self.heap_size = heap_size;
        self
    }

    /// Sets the module root directory
    pub fn with_module_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.module_root = root.into();
        self
    }

    /// Sets the call depth limit
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Sets the struct rendering format
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }
}
