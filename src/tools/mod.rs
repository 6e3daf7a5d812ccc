//! Builtin function system for Gravox
//!
//! When a call target is not a user-defined function the interpreter looks it
//! up here and invokes it with already-evaluated arguments. Builtin failures
//! flow through the same error path as interpreter errors.

pub mod stdlib;

use crate::error::{Error, Result};
use crate::runtime::{Format, Heap, Value};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::debug;

/// Number of arguments a builtin accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Arity {
    /// Exactly this many
    Exact(usize),
    /// Inclusive range
    Range(usize, usize),
    /// Any number
    Variadic,
}

impl Arity {
    /// Whether `count` arguments are acceptable
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::Range(min, max) => (min..=max).contains(&count),
            Arity::Variadic => true,
        }
    }

    /// Smallest acceptable count, used in arity errors
    pub fn minimum(&self) -> usize {
        match *self {
            Arity::Exact(n) | Arity::Range(n, _) => n,
            Arity::Variadic => 0,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::Range(min, max) => write!(f, "{}..{}", min, max),
            Arity::Variadic => write!(f, "variadic"),
        }
    }
}

/// Interpreter state a builtin may touch
pub struct ToolContext<'a> {
    /// Program output (what `print` writes to)
    pub output: &'a mut dyn Write,
    /// Line source for `input`
    pub input: &'a mut dyn BufRead,
    /// Simulated heap, read-only
    pub heap: &'a Heap,
    /// Struct rendering format
    pub format: Format,
}

/// Tool trait - every builtin implements this
pub trait Tool: Send + Sync {
    /// Name the program calls the builtin by
    fn name(&self) -> &str;

    /// Tool description
    fn description(&self) -> &str;

    /// Execute the tool
    fn execute(&self, ctx: &mut ToolContext<'_>, args: &[Value]) -> Result<Value>;

    /// Accepted argument counts
    fn arity(&self) -> Arity {
        Arity::Variadic
    }

    /// Declared return type
    fn returns(&self) -> &str {
        "any"
    }

    /// Whether the result replaces a variable passed as the first argument
    fn updates_first_argument(&self) -> bool {
        false
    }
}

/// Catalog entry describing one builtin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSignature {
    /// Builtin name
    pub name: String,
    /// Accepted argument counts
    pub arity: Arity,
    /// Declared return type
    pub returns: String,
    /// One-line description
    pub description: String,
}

/// Tool registry
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create new registry with the standard library
    pub fn new() -> Self {
        #[allow(unused_mut)]
        let mut registry = ToolRegistry::empty();

        #[cfg(feature = "stdlib")]
        stdlib::register_all(&mut registry);

        registry
    }

    /// Create empty registry (for testing)
    pub fn empty() -> Self {
        ToolRegistry {
            tools: HashMap::new(),
        }
    }

    /// Register a tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    /// Get tool by exact name
    pub fn get(&self, name: &str) -> Result<Arc<dyn Tool>> {
        self.tools
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UndefinedFunction {
                name: name.to_string(),
            })
    }

    /// Check if tool exists
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Whether calling `name` writes its result back into the first argument
    pub fn updates_first_argument(&self, name: &str) -> bool {
        self.tools
            .get(name)
            .map_or(false, |tool| tool.updates_first_argument())
    }

    /// List all tool names
    pub fn list_tools(&self) -> Vec<String> {
        let mut names: Vec<_> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get tool count
    pub fn count(&self) -> usize {
        self.tools.len()
    }

    /// Name, arity and return type of every builtin, sorted by name
    pub fn catalog(&self) -> Vec<ToolSignature> {
        let mut catalog: Vec<ToolSignature> = self
            .tools
            .values()
            .map(|tool| ToolSignature {
                name: tool.name().to_string(),
                arity: tool.arity(),
                returns: tool.returns().to_string(),
                description: tool.description().to_string(),
            })
            .collect();
        catalog.sort_by(|a, b| a.name.cmp(&b.name));
        catalog
    }

    /// Checks arity and runs a builtin
    pub fn call(&self, name: &str, ctx: &mut ToolContext<'_>, args: &[Value]) -> Result<Value> {
        let tool = self.get(name)?;
        let arity = tool.arity();
        if !arity.accepts(args.len()) {
            return Err(Error::ArityMismatch {
                function: name.to_string(),
                expected: arity.minimum(),
                got: args.len(),
            });
        }
        debug!(builtin = name, args = args.len(), "builtin dispatch");
        tool.execute(ctx, args)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
