//! Standard library builtins for Gravox

pub mod collections;
pub mod console;
pub mod heap;
pub mod io;
pub mod json;
pub mod style;
pub mod time;

use crate::tools::ToolRegistry;

/// Register all standard library tools
pub fn register_all(registry: &mut ToolRegistry) {
    console::register(registry);
    heap::register(registry);
    collections::register(registry);
    io::register(registry);
    json::register(registry);
    time::register(registry);
    style::register(registry);
}
