//! Runtime execution for Gravox programs

mod coerce;
mod config;
mod environment;
mod interpreter;
mod memory;
mod value;

pub use coerce::{is_float_type, is_integer_type, TypeRegistry, FLOAT_TYPES, INTEGER_TYPES};
pub use config::{Format, InterpreterConfig, DEFAULT_HEAP_SIZE, DEFAULT_MAX_CALL_DEPTH};
pub use environment::{Environment, Symbol, UNMAPPED_ADDRESS};
pub use interpreter::{Interpreter, SharedInput, SharedOutput};
pub use memory::{size_of_type, Heap};
pub use value::{Value, DYNAMIC_RECORD};
