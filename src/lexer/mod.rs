//! Lexical analysis for Gravox
//!
//! Converts source text into a flat stream of tokens with line/column positions.

mod scanner;
mod token;

pub use scanner::{tokenize, Scanner};
pub use token::{Token, TokenKind, DATA_TYPES};
