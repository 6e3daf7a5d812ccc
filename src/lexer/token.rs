use serde::{Deserialize, Serialize};

/// A single token from the source code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The type of token
    pub kind: TokenKind,
    /// Original text of the token
    pub lexeme: String,
    /// Line number where token appears (1-indexed)
    pub line: usize,
    /// Column number where token starts (1-indexed)
    pub column: usize,
}

impl Token {
    /// Creates a new token with the given properties
    pub fn new(kind: TokenKind, lexeme: String, line: usize, column: usize) -> Self {
        Token {
            kind,
            lexeme,
            line,
            column,
        }
    }
}

/// Builtin type names recognised by the scanner
pub const DATA_TYPES: &[&str] = &[
    "int8", "int16", "int32", "int64", "uint8", "uint16", "uint32", "uint64", "float32", "float64",
    "char", "string", "array", "Result",
];

/// All possible token types in Gravox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    /// Integer literal
    Integer(i64),
    /// Floating-point literal
    Float(f64),
    /// Character literal (`'a'`)
    Char(char),
    /// String literal
    String(String),
    /// `null`, usable both as a literal and as a type name
    Null,

    /// Identifier (variables, functions, user types)
    Identifier(String),
    /// Builtin data type name (`int32`, `float64`, `char`, ...)
    DataType(String),

    // Keywords
    /// LET keyword
    Let,
    /// FREE keyword
    Free,
    /// DEF keyword
    Def,
    /// STRUCT keyword
    Struct,
    /// ENUM keyword
    Enum,
    /// IF keyword
    If,
    /// ELIF keyword
    Elif,
    /// ELSE keyword
    Else,
    /// WHILE keyword
    While,
    /// FOR keyword
    For,
    /// RETURN keyword
    Return,
    /// SPAWN keyword
    Spawn,
    /// IMPORT keyword
    Import,
    /// TRY keyword
    Try,
    /// CATCH keyword
    Catch,
    /// `Ok` result constructor
    Ok,
    /// `Err` result constructor
    Err,

    // Operators
    /// Assignment (=)
    Assign,
    /// Plus (+)
    Plus,
    /// Minus (-)
    Minus,
    /// Star (*): multiplication or dereference depending on position
    Star,
    /// Slash (/)
    Slash,
    /// Percent (%)
    Percent,
    /// Equality (==)
    Eq,
    /// Inequality (!=)
    NotEq,
    /// Greater than (>)
    Gt,
    /// Less than (<)
    Lt,
    /// Greater than or equal (>=)
    GtEq,
    /// Less than or equal (<=)
    LtEq,
    /// Ampersand (&): bitwise AND or address-of depending on position
    Ampersand,
    /// Pipe (|)
    Pipe,
    /// Caret (^)
    Caret,
    /// Left shift (<<)
    Shl,
    /// Right shift (>>)
    Shr,
    /// Tilde (~)
    Tilde,
    /// Arrow (->)
    Arrow,

    // Delimiters
    /// Left parenthesis (
    LeftParen,
    /// Right parenthesis )
    RightParen,
    /// Left brace {
    LeftBrace,
    /// Right brace }
    RightBrace,
    /// Left bracket [
    LeftBracket,
    /// Right bracket ]
    RightBracket,
    /// Semicolon
    Semicolon,
    /// Colon
    Colon,
    /// Comma
    Comma,
    /// Dot
    Dot,

    // Special
    /// End of file marker
    Eof,
}

impl TokenKind {
    /// Check if token is a keyword
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Let
                | TokenKind::Free
                | TokenKind::Def
                | TokenKind::Struct
                | TokenKind::Enum
                | TokenKind::If
                | TokenKind::Elif
                | TokenKind::Else
                | TokenKind::While
                | TokenKind::For
                | TokenKind::Return
                | TokenKind::Spawn
                | TokenKind::Import
                | TokenKind::Try
                | TokenKind::Catch
                | TokenKind::Ok
                | TokenKind::Err
        )
    }

    /// Get keyword token from an identifier run
    pub fn keyword(s: &str) -> Option<TokenKind> {
        let kind = match s {
            "let" => TokenKind::Let,
            "free" => TokenKind::Free,
            "def" => TokenKind::Def,
            "struct" => TokenKind::Struct,
            "enum" => TokenKind::Enum,
            "if" => TokenKind::If,
            "elif" => TokenKind::Elif,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "for" => TokenKind::For,
            "return" => TokenKind::Return,
            "spawn" => TokenKind::Spawn,
            "import" => TokenKind::Import,
            "try" => TokenKind::Try,
            "catch" => TokenKind::Catch,
            "Ok" => TokenKind::Ok,
            "Err" => TokenKind::Err,
            "null" => TokenKind::Null,
            _ if DATA_TYPES.contains(&s) => TokenKind::DataType(s.to_string()),
            _ => return None,
        };
        Some(kind)
    }

    /// Whether the token can name a type in a declaration
    pub fn is_type_name(&self) -> bool {
        matches!(
            self,
            TokenKind::DataType(_) | TokenKind::Identifier(_) | TokenKind::Null
        )
    }

    /// Stable upper-case name used in parser diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Integer(_) => "INT_LITERAL",
            TokenKind::Float(_) => "FLOAT_LITERAL",
            TokenKind::Char(_) => "CHAR_LITERAL",
            TokenKind::String(_) => "STRING_LITERAL",
            TokenKind::Null => "NULL",
            TokenKind::Identifier(_) => "IDENTIFIER",
            TokenKind::DataType(_) => "DATA_TYPE",
            TokenKind::Let => "LET",
            TokenKind::Free => "FREE",
            TokenKind::Def => "DEF",
            TokenKind::Struct => "STRUCT",
            TokenKind::Enum => "ENUM",
            TokenKind::If => "IF",
            TokenKind::Elif => "ELIF",
            TokenKind::Else => "ELSE",
            TokenKind::While => "WHILE",
            TokenKind::For => "FOR",
            TokenKind::Return => "RETURN",
            TokenKind::Spawn => "SPAWN",
            TokenKind::Import => "IMPORT",
            TokenKind::Try => "TRY",
            TokenKind::Catch => "CATCH",
            TokenKind::Ok => "OK",
            TokenKind::Err => "ERR",
            TokenKind::Assign => "ASSIGN",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Star => "STAR",
            TokenKind::Slash => "DIVIDE",
            TokenKind::Percent => "MODULO",
            TokenKind::Eq => "EQUAL",
            TokenKind::NotEq => "NOT_EQUAL",
            TokenKind::Gt => "GREATER_THAN",
            TokenKind::Lt => "LESS_THAN",
            TokenKind::GtEq => "GREATER_EQUAL",
            TokenKind::LtEq => "LESS_EQUAL",
            TokenKind::Ampersand => "AMPERSAND",
            TokenKind::Pipe => "OR",
            TokenKind::Caret => "XOR",
            TokenKind::Shl => "LSHIFT",
            TokenKind::Shr => "RSHIFT",
            TokenKind::Tilde => "BIT_NOT",
            TokenKind::Arrow => "ARROW",
            TokenKind::LeftParen => "LPAREN",
            TokenKind::RightParen => "RPAREN",
            TokenKind::LeftBrace => "LBRACE",
            TokenKind::RightBrace => "RBRACE",
            TokenKind::LeftBracket => "LBRACKET",
            TokenKind::RightBracket => "RBRACKET",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Colon => "COLON",
            TokenKind::Comma => "COMMA",
            TokenKind::Dot => "DOT",
            TokenKind::Eof => "EOF",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TokenKind::Integer(n) => write!(f, "{}", n),
            TokenKind::Float(fl) => write!(f, "{}", fl),
            TokenKind::Char(c) => write!(f, "'{}'", c),
            TokenKind::String(s) => write!(f, "\"{}\"", s),
            TokenKind::Identifier(id) => write!(f, "{}", id),
            TokenKind::DataType(ty) => write!(f, "{}", ty),
            _ => write!(f, "{}", self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_detection() {
        assert_eq!(TokenKind::keyword("let"), Some(TokenKind::Let));
        assert_eq!(TokenKind::keyword("Ok"), Some(TokenKind::Ok));
        assert_eq!(TokenKind::keyword("null"), Some(TokenKind::Null));
        assert_eq!(
            TokenKind::keyword("uint16"),
            Some(TokenKind::DataType("uint16".to_string()))
        );
        assert_eq!(TokenKind::keyword("Point"), None);
        assert_eq!(TokenKind::keyword("any"), None);
    }

    #[test]
    fn test_is_keyword() {
        assert!(TokenKind::Free.is_keyword());
        assert!(TokenKind::Catch.is_keyword());
        assert!(!TokenKind::Integer(42).is_keyword());
        assert!(!TokenKind::Identifier("test".to_string()).is_keyword());
    }

    #[test]
    fn test_diagnostic_names() {
        assert_eq!(TokenKind::Semicolon.name(), "SEMICOLON");
        assert_eq!(TokenKind::Identifier("x".into()).name(), "IDENTIFIER");
        assert_eq!(TokenKind::Eof.to_string(), "EOF");
    }
}
