//! # Gravox
//!
//! A small scripting language with systems flavour: typed declarations over a
//! simulated, capacity-bounded heap, manual `let`/`free`, pointers, structs
//! with methods, enums, arrays and `try`/`catch`.
//!
//! ## Basic Usage
//!
//! ```rust
//! use gravox::{Interpreter, InterpreterConfig, Parser, Scanner, Value};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let code = r#"
//!     def square(n: int32) -> int32 { return n * n; }
//!     let total: int32 = 0;
//!     for (let i: int32 = 1; i < 4; i = i + 1) {
//!         total = total + square(i);
//!     }
//!     return total;
//! "#;
//!
//! // Tokenize (scan)
//! let mut scanner = Scanner::new(code);
//! let tokens = scanner.scan_tokens()?;
//!
//! // Parse into AST
//! let mut parser = Parser::new(tokens);
//! let program = parser.parse()?;
//!
//! // Execute
//! let mut interpreter = Interpreter::new(InterpreterConfig::default());
//! let result = interpreter.execute(&program)?;
//!
//! assert_eq!(result, Value::Int(14));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Source Code → Scanner → Tokens → Parser → AST → Interpreter
//!                                                    │
//!                                  import name; ─────┘ (nested Scanner/Parser/Interpreter)
//! ```
//!
//! - [`Scanner`] - Tokenizes source code into tokens
//! - [`Parser`] - Parses tokens into the AST
//! - [`Interpreter`] - Walks the AST over a simulated [`Heap`]
//! - [`Value`] - Runtime value representation
//! - [`ToolRegistry`] - Builtin functions consulted when a call is not user-defined
//!
//! ## Error Handling
//!
//! Every stage reports through [`Error`]. Uncaught failures can be formatted
//! the way the command line prints them:
//!
//! ```rust
//! use gravox::{Interpreter, InterpreterConfig};
//!
//! let mut interpreter = Interpreter::new(InterpreterConfig::default());
//! let err = interpreter.run_source("let x: int32 = 5 / 0;").unwrap_err();
//! assert_eq!(
//!     interpreter.report(&err),
//!     "error at 1 (let x: int32 = (5 / 0)): Division by zero"
//! );
//! ```

/// Version of the Gravox interpreter
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod tools;

// Re-export main types
pub use error::{Diagnostic, Error, ErrorKind, Result};
pub use lexer::{tokenize, Scanner, Token, TokenKind};
pub use parser::{parse_source, BinaryOp, Expression, Parser, Program, Statement, UnaryOp};
pub use runtime::{
    Environment, Format, Heap, Interpreter, InterpreterConfig, SharedOutput, Symbol, Value,
};
pub use tools::{Arity, Tool, ToolRegistry, ToolSignature};

/// Runs a whole script with the given configuration, writing program output to `output`
///
/// Returns the value of a top-level `return`, or null.
pub fn run_source(source: &str, config: InterpreterConfig, output: SharedOutput) -> Result<Value> {
    Interpreter::new(config).with_output(output).run_source(source)
}
