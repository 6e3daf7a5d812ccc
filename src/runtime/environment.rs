use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::runtime::Value;

/// Address given to bindings that live outside the heap (`self`, `e`)
pub const UNMAPPED_ADDRESS: i64 = -1;

/// Symbol table entry
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    /// Declared type name
    pub type_name: String,
    /// Current value
    pub value: Value,
    /// Simulated heap address, or [`UNMAPPED_ADDRESS`]
    pub address: i64,
}

impl Symbol {
    /// Creates a symbol table entry
    pub fn new(type_name: impl Into<String>, value: Value, address: i64) -> Self {
        Symbol {
            type_name: type_name.into(),
            value,
            address,
        }
    }

    /// Whether the symbol is backed by a heap cell
    pub fn is_mapped(&self) -> bool {
        self.address != UNMAPPED_ADDRESS
    }
}

/// Environment for variable scoping
///
/// One frame per active call. Entering a call pushes a full copy of the
/// caller's frame; leaving it pops the copy, so assignments made by the
/// callee never leak back into the caller.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Stack of call frames; never empty
    frames: Vec<HashMap<String, Symbol>>,
}

impl Environment {
    /// Creates a new environment with a global frame
    pub fn new() -> Self {
        Environment {
            frames: vec![HashMap::new()],
        }
    }

    fn current(&self) -> &HashMap<String, Symbol> {
        // frames is never empty: exit_call keeps the global frame
        &self.frames[self.frames.len() - 1]
    }

    fn current_mut(&mut self) -> &mut HashMap<String, Symbol> {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// Pushes a copy of the current frame for a call
    pub fn enter_call(&mut self) {
        let copy = self.current().clone();
        self.frames.push(copy);
    }

    /// Discards the innermost call frame
    pub fn exit_call(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Number of active frames (1 at top level)
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Binds (or rebinds) a symbol in the current frame
    pub fn define(&mut self, name: impl Into<String>, symbol: Symbol) {
        self.current_mut().insert(name.into(), symbol);
    }

    /// Looks up a symbol
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.current().get(name)
    }

    /// Looks up a symbol, failing if it is not declared
    pub fn lookup(&self, name: &str) -> Result<&Symbol> {
        self.get(name).ok_or_else(|| Error::UndeclaredVariable {
            name: name.to_string(),
        })
    }

    /// Mutable access to a declared symbol
    pub fn lookup_mut(&mut self, name: &str) -> Result<&mut Symbol> {
        self.current_mut()
            .get_mut(name)
            .ok_or_else(|| Error::UndeclaredVariable {
                name: name.to_string(),
            })
    }

    /// Checks if a symbol is visible
    pub fn contains(&self, name: &str) -> bool {
        self.current().contains_key(name)
    }

    /// Removes a symbol from the current frame
    pub fn remove(&mut self, name: &str) -> Option<Symbol> {
        self.current_mut().remove(name)
    }

    /// Names visible in the current frame, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.current().keys().cloned().collect();
        names.sort();
        names
    }

    /// Moves every symbol of the current frame out, leaving it empty
    pub fn drain(&mut self) -> Vec<(String, Symbol)> {
        self.current_mut().drain().collect()
    }

    /// Binds many symbols at once
    pub fn extend(&mut self, symbols: impl IntoIterator<Item = (String, Symbol)>) {
        self.current_mut().extend(symbols);
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
