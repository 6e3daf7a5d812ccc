//! Gravox Parser Module
//!
//! Parses the token stream into an Abstract Syntax Tree (AST). Statements are
//! parsed by recursive descent, expressions by precedence climbing.

mod ast;
#[allow(clippy::module_inception)]
mod parser;

pub use ast::{
    BinaryOp, Block, EnumDef, ExprKind, Expression, FunctionDef, Param, Position, Precedence,
    Program, Statement, StmtKind, StructDef, UnaryOp,
};
pub use parser::{parse_source, Parser, MAX_NESTING};
