//! Error types for the Gravox toolchain
//!
//! Every stage (scanner, parser, interpreter, builtins) reports failures
//! through the single [`Error`] enum so that `try`/`catch` in user programs
//! can intercept any of them uniformly.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Gravox errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Lexical errors
    /// Character that starts no token
    ///
    /// **Example:** `let x: int32 = 5 $ 3;`
    #[error("Unexpected character '{ch}' at {line}:{column}")]
    UnexpectedCharacter {
        /// Offending character
        ch: char,
        /// Line number (1-indexed)
        line: usize,
        /// Column number (1-indexed)
        column: usize,
    },

    /// String literal without a closing quote
    #[error("Unterminated string literal starting at {line}:{column}")]
    UnterminatedString {
        /// Line number (1-indexed)
        line: usize,
        /// Column number (1-indexed)
        column: usize,
    },

    /// Character literal without a closing quote
    #[error("Unterminated character literal at {line}:{column}")]
    UnterminatedChar {
        /// Line number (1-indexed)
        line: usize,
        /// Column number (1-indexed)
        column: usize,
    },

    /// Digit run that is not a valid integer or float (`1.2.3`)
    #[error("Invalid number literal '{text}' at {line}:{column}")]
    InvalidNumber {
        /// Source text of the literal
        text: String,
        /// Line number (1-indexed)
        line: usize,
        /// Column number (1-indexed)
        column: usize,
    },

    // Syntax errors
    /// Parser expected one token but found another
    ///
    /// **Example:** `let x int32;` (missing `:`)
    #[error("Expected {expected}, got {got} at {line}:{column}")]
    UnexpectedToken {
        /// Grammar rule that was being parsed
        rule: String,
        /// Expected token description
        expected: String,
        /// Actual token received
        got: String,
        /// Line number (1-indexed)
        line: usize,
        /// Column number (1-indexed)
        column: usize,
    },

    /// Structured lexer/parser failure for editor tooling
    ///
    /// The message text is the JSON serialization of the payload.
    #[error("{0}")]
    Diagnostic(Box<Diagnostic>),

    // Runtime errors
    /// Reference to a variable that was never declared (or was freed)
    ///
    /// **Prevention:** declare with `let name: type;` before use
    #[error("Variable '{name}' not declared")]
    UndeclaredVariable {
        /// Variable name
        name: String,
    },

    /// Name declared twice where uniqueness is required
    #[error("'{name}' is already declared in {context}")]
    Redeclaration {
        /// Duplicated name
        name: String,
        /// Where the duplicate occurred (struct, enum, parameter list)
        context: String,
    },

    /// Wrong number of arguments in a call
    #[error("Incorrect number of arguments for function '{function}'. Expected {expected}, got {got}")]
    ArityMismatch {
        /// Function or builtin name
        function: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// Division by zero
    ///
    /// **Example:** `let x: int32 = 5 / 0;`
    #[error("Division by zero")]
    DivisionByZero,

    /// Modulo by zero
    #[error("Modulo by zero")]
    ModuloByZero,

    /// Dereference of an address with no live memory cell
    #[error("Invalid memory access at address {address}")]
    InvalidMemoryAccess {
        /// Requested address
        address: i64,
    },

    /// Write past the configured heap capacity
    #[error("Segmentation fault: address {address} exceeds heap capacity of {capacity} bytes")]
    HeapCapacityExceeded {
        /// Address that was written
        address: i64,
        /// Configured heap size
        capacity: usize,
    },

    /// Array index outside `0..length`
    #[error("Index {index} out of range for array of length {length}")]
    IndexOutOfBounds {
        /// Requested index
        index: i64,
        /// Array length
        length: usize,
    },

    /// Coercion of a value to a declared or cast type failed
    #[error("Cannot cast value '{value}' to type '{target}'")]
    TypeCast {
        /// Rendered source value
        value: String,
        /// Target type name
        target: String,
    },

    /// Operand has the wrong type for an operation
    #[error("Type error: expected {expected}, got {got}")]
    TypeError {
        /// Expected type
        expected: String,
        /// Actual type
        got: String,
    },

    /// Binary operator applied to unsupported operand types
    #[error("Invalid operation: {op} on types {left_type} and {right_type}")]
    InvalidOperation {
        /// Operator symbol
        op: String,
        /// Left operand type
        left_type: String,
        /// Right operand type
        right_type: String,
    },

    /// Field not declared by the struct definition
    #[error("Struct '{struct_name}' does not have field '{field}'")]
    MissingField {
        /// Struct type name
        struct_name: String,
        /// Requested field
        field: String,
    },

    /// Field syntax used on something that is not a struct instance
    #[error("'{name}' is not a struct variable")]
    NotAStruct {
        /// Variable name or rendered expression
        name: String,
    },

    /// Call to a name that is neither user-defined nor a builtin
    #[error("Function '{name}' not defined")]
    UndefinedFunction {
        /// Function name
        name: String,
    },

    /// Method call with no `Type::method` registration
    #[error("Method '{method}' not found for type '{type_name}'")]
    UndefinedMethod {
        /// Method name
        method: String,
        /// Receiver type
        type_name: String,
    },

    /// Enum accessed with a member it does not declare
    #[error("Enum '{enum_name}' has no member '{member}'")]
    UnknownEnumMember {
        /// Enum name
        enum_name: String,
        /// Requested member
        member: String,
    },

    /// Call target is an expression that cannot be called
    #[error("Value is not callable: {description}")]
    NotCallable {
        /// Description of the callee
        description: String,
    },

    /// Misuse of `&` or `*`
    #[error("Invalid pointer operation: {reason}")]
    InvalidPointer {
        /// What went wrong
        reason: String,
    },

    /// `import name;` with no `name.grv` under the module root
    #[error("Module '{name}' not found")]
    ModuleNotFound {
        /// Module name
        name: String,
    },

    /// Use of a construct that has been retired
    #[error("{feature} is deprecated: {advice}")]
    Deprecated {
        /// Deprecated construct
        feature: String,
        /// Replacement hint
        advice: String,
    },

    /// Nested user calls exceeded the configured limit
    #[error("Maximum call depth exceeded (limit: {limit})")]
    CallDepthExceeded {
        /// Configured limit
        limit: usize,
    },

    // Builtin errors
    /// Invalid arguments provided to a builtin
    #[error("Invalid arguments for builtin {tool}: {reason}")]
    InvalidArguments {
        /// Builtin name
        tool: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Builtin failed while running
    #[error("Builtin execution failed: {tool} - {reason}")]
    ToolExecutionError {
        /// Builtin name
        tool: String,
        /// Failure reason
        reason: String,
    },

    /// Filesystem or terminal I/O failure
    #[error("I/O error: {message}")]
    Io {
        /// Error message
        message: String,
    },

    /// General runtime error
    #[error("Runtime error: {0}")]
    RuntimeError(String),
}

/// Pipeline stage an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Raised by the scanner
    Lexical,
    /// Raised by the parser
    Syntax,
    /// Raised while interpreting (including builtins)
    Runtime,
}

/// Source location inside a structured diagnostic (zero-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Line number (0-indexed)
    pub line: usize,
    /// Column number (0-indexed)
    pub column: usize,
}

/// Structured lexer/parser failure consumed by editor tooling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Grammar rule that failed (parser failures)
    #[serde(rename = "fn", default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    /// Failure cause (lexer failures): `unexpect`, `string`, `char`, `number`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    /// Expected token description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect: Option<String>,
    /// Actual token description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub got: Option<String>,
    /// Offending character or literal text
    #[serde(rename = "char", default, skip_serializing_if = "Option::is_none")]
    pub character: Option<String>,
    /// Where the failure happened
    pub loc: Location,
}

impl Diagnostic {
    /// Serializes the payload to its JSON wire form
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

fn zero_based(line: usize, column: usize) -> Location {
    Location {
        line: line.saturating_sub(1),
        column: column.saturating_sub(1),
    }
}

impl Error {
    /// Create a runtime error with a message
    pub fn runtime(msg: impl Into<String>) -> Self {
        Error::RuntimeError(msg.into())
    }

    /// Create an invalid-arguments error for a builtin
    pub fn invalid_args(tool: &str, reason: impl Into<String>) -> Self {
        Error::InvalidArguments {
            tool: tool.to_string(),
            reason: reason.into(),
        }
    }

    /// Classify the pipeline stage that raised this error
    pub fn classify(&self) -> ErrorKind {
        match self {
            Error::UnexpectedCharacter { .. }
            | Error::UnterminatedString { .. }
            | Error::UnterminatedChar { .. }
            | Error::InvalidNumber { .. } => ErrorKind::Lexical,
            Error::UnexpectedToken { .. } => ErrorKind::Syntax,
            Error::Diagnostic(d) => {
                if d.function.is_some() {
                    ErrorKind::Syntax
                } else {
                    ErrorKind::Lexical
                }
            }
            _ => ErrorKind::Runtime,
        }
    }

    /// Structured payload for lexer and parser failures
    ///
    /// Returns `None` for runtime errors, which have no source location.
    pub fn to_diagnostic(&self) -> Option<Diagnostic> {
        let blank = |cause: &str, line, column| Diagnostic {
            function: None,
            cause: Some(cause.to_string()),
            expect: None,
            got: None,
            character: None,
            loc: zero_based(line, column),
        };
        match self {
            Error::UnexpectedCharacter { ch, line, column } => Some(Diagnostic {
                character: Some(ch.to_string()),
                ..blank("unexpect", *line, *column)
            }),
            Error::UnterminatedString { line, column } => Some(blank("string", *line, *column)),
            Error::UnterminatedChar { line, column } => Some(blank("char", *line, *column)),
            Error::InvalidNumber { text, line, column } => Some(Diagnostic {
                character: Some(text.clone()),
                ..blank("number", *line, *column)
            }),
            Error::UnexpectedToken {
                rule,
                expected,
                got,
                line,
                column,
            } => Some(Diagnostic {
                function: Some(rule.clone()),
                cause: None,
                expect: Some(expected.clone()),
                got: Some(got.clone()),
                character: None,
                loc: zero_based(*line, *column),
            }),
            Error::Diagnostic(d) => Some((**d).clone()),
            _ => None,
        }
    }

    /// Converts a lexer/parser error into its structured form when requested
    pub fn structured(self, enabled: bool) -> Self {
        if !enabled {
            return self;
        }
        match self.to_diagnostic() {
            Some(diagnostic) => Error::Diagnostic(Box::new(diagnostic)),
            None => self,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for Gravox operations
pub type Result<T> = std::result::Result<T, Error>;
