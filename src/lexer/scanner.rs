use super::token::{Token, TokenKind};
use crate::error::{Error, Result};

/// Scanner for Gravox source text
pub struct Scanner {
    /// Source code as character vector
    source: Vec<char>,
    /// Accumulated tokens
    tokens: Vec<Token>,
    /// Start position of current token
    start: usize,
    /// Current position in source
    current: usize,
    /// Current line number (1-indexed)
    line: usize,
    /// Current column number (1-indexed)
    column: usize,
    /// Line where the current token started
    start_line: usize,
    /// Column where the current token started
    start_column: usize,
    /// Report failures as structured diagnostics
    lsp_mode: bool,
}

impl Scanner {
    /// Creates a new scanner from source code
    pub fn new(source: &str) -> Self {
        Scanner {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            column: 1,
            start_line: 1,
            start_column: 1,
            lsp_mode: false,
        }
    }

    /// Switches failures to the structured `{cause, char, loc}` form
    pub fn with_lsp_mode(mut self, enabled: bool) -> Self {
        self.lsp_mode = enabled;
        self
    }

    /// Scans all tokens from source code, terminated by an EOF token
    pub fn scan_tokens(&mut self) -> Result<Vec<Token>> {
        while !self.is_at_end() {
            self.start = self.current;
            self.start_line = self.line;
            self.start_column = self.column;
            self.scan_token().map_err(|e| e.structured(self.lsp_mode))?;
        }

        self.tokens.push(Token::new(
            TokenKind::Eof,
            String::new(),
            self.line,
            self.column,
        ));

        Ok(std::mem::take(&mut self.tokens))
    }

    fn scan_token(&mut self) -> Result<()> {
        let c = self.advance();

        match c {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            c if c.is_whitespace() => {}

            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            '[' => self.add_token(TokenKind::LeftBracket),
            ']' => self.add_token(TokenKind::RightBracket),
            ';' => self.add_token(TokenKind::Semicolon),
            ':' => self.add_token(TokenKind::Colon),
            ',' => self.add_token(TokenKind::Comma),
            '.' => self.add_token(TokenKind::Dot),

            '+' => self.add_token(TokenKind::Plus),
            '-' => {
                if self.match_char('>') {
                    self.add_token(TokenKind::Arrow);
                } else {
                    self.add_token(TokenKind::Minus);
                }
            }
            '*' => self.add_token(TokenKind::Star),
            '/' => {
                if self.match_char('/') {
                    self.skip_line_comment();
                } else {
                    self.add_token(TokenKind::Slash);
                }
            }
            '%' => self.add_token(TokenKind::Percent),
            '&' => self.add_token(TokenKind::Ampersand),
            '|' => self.add_token(TokenKind::Pipe),
            '^' => self.add_token(TokenKind::Caret),
            '~' => self.add_token(TokenKind::Tilde),

            '=' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::Eq);
                } else {
                    self.add_token(TokenKind::Assign);
                }
            }
            '!' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::NotEq);
                } else {
                    return Err(self.unexpected('!'));
                }
            }
            '<' => {
                if self.match_char('<') {
                    self.add_token(TokenKind::Shl);
                } else if self.match_char('=') {
                    self.add_token(TokenKind::LtEq);
                } else {
                    self.add_token(TokenKind::Lt);
                }
            }
            '>' => {
                if self.match_char('>') {
                    self.add_token(TokenKind::Shr);
                } else if self.match_char('=') {
                    self.add_token(TokenKind::GtEq);
                } else {
                    self.add_token(TokenKind::Gt);
                }
            }

            '"' => self.scan_string()?,
            '\'' => self.scan_char()?,

            c if c.is_ascii_digit() => self.scan_number()?,

            c if c.is_alphabetic() || c == '_' => self.scan_identifier_or_keyword(),

            _ => return Err(self.unexpected(c)),
        }

        Ok(())
    }

    fn unexpected(&self, ch: char) -> Error {
        Error::UnexpectedCharacter {
            ch,
            line: self.start_line,
            column: self.start_column,
        }
    }

    fn skip_line_comment(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
        }
    }

    /// Reads one escape sequence after a backslash; unknown escapes stay verbatim
    fn read_escape(&mut self, value: &mut String) {
        let escaped = self.advance();
        match escaped {
            'n' => value.push('\n'),
            't' => value.push('\t'),
            'r' => value.push('\r'),
            '0' => value.push('\0'),
            '\\' => value.push('\\'),
            '"' => value.push('"'),
            '\'' => value.push('\''),
            other => {
                value.push('\\');
                value.push(other);
            }
        }
    }

    fn scan_string(&mut self) -> Result<()> {
        let mut value = String::new();

        while !self.is_at_end() && self.peek() != '"' {
            let c = self.peek();
            if c == '\\' && self.peek_next() != '\0' {
                self.advance();
                self.read_escape(&mut value);
            } else {
                self.advance();
                if c == '\n' {
                    self.line += 1;
                    self.column = 1;
                }
                value.push(c);
            }
        }

        if self.is_at_end() {
            return Err(Error::UnterminatedString {
                line: self.start_line,
                column: self.start_column,
            });
        }

        self.advance(); // Closing "

        self.add_token(TokenKind::String(value));
        Ok(())
    }

    fn scan_char(&mut self) -> Result<()> {
        let unterminated = Error::UnterminatedChar {
            line: self.start_line,
            column: self.start_column,
        };

        if self.is_at_end() || matches!(self.peek(), '\'' | '\n') {
            return Err(unterminated);
        }

        let mut value = String::new();
        if self.peek() == '\\' {
            self.advance();
            if self.is_at_end() {
                return Err(unterminated);
            }
            self.read_escape(&mut value);
        } else {
            value.push(self.advance());
        }

        // `'\q'` keeps the backslash, so only a lone char is valid
        let mut chars = value.chars();
        let ch = match (chars.next(), chars.next()) {
            (Some(ch), None) => ch,
            _ => return Err(unterminated),
        };

        if !self.match_char('\'') {
            return Err(unterminated);
        }

        self.add_token(TokenKind::Char(ch));
        Ok(())
    }

    fn scan_number(&mut self) -> Result<()> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        let mut dots = 0;
        while self.peek() == '.' && self.peek_next().is_ascii_digit() {
            dots += 1;
            self.advance(); // consume .
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text = self.lexeme();
        let (line, column) = (self.start_line, self.start_column);
        let invalid = || Error::InvalidNumber {
            text: text.clone(),
            line,
            column,
        };

        match dots {
            0 => {
                let value: i64 = text.parse().map_err(|_| invalid())?;
                self.add_token(TokenKind::Integer(value));
            }
            1 => {
                let value: f64 = text.parse().map_err(|_| invalid())?;
                self.add_token(TokenKind::Float(value));
            }
            _ => return Err(invalid()),
        }

        Ok(())
    }

    fn scan_identifier_or_keyword(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = self.lexeme();
        let kind = TokenKind::keyword(&text).unwrap_or(TokenKind::Identifier(text));
        self.add_token(kind);
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        self.column += 1;
        c
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.source[self.current]
        }
    }

    fn peek_next(&self) -> char {
        if self.current + 1 >= self.source.len() {
            '\0'
        } else {
            self.source[self.current + 1]
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            false
        } else {
            self.current += 1;
            self.column += 1;
            true
        }
    }

    fn lexeme(&self) -> String {
        self.source[self.start..self.current].iter().collect()
    }

    fn add_token(&mut self, kind: TokenKind) {
        let lexeme = self.lexeme();
        self.tokens
            .push(Token::new(kind, lexeme, self.start_line, self.start_column));
    }
}

/// Tokenizes a whole source text
pub fn tokenize(source: &str, lsp_mode: bool) -> Result<Vec<Token>> {
    Scanner::new(source).with_lsp_mode(lsp_mode).scan_tokens()
}
