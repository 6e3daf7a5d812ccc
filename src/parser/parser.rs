use super::ast::{
    BinaryOp, Block, EnumDef, ExprKind, Expression, FunctionDef, Param, Position, Precedence,
    Program, Statement, StmtKind, StructDef, UnaryOp,
};
use crate::error::{Error, Result};
use crate::lexer::{Token, TokenKind};
use std::collections::HashSet;
use std::sync::Arc;

/// Deepest allowed nesting of blocks, parentheses and prefix operators
pub const MAX_NESTING: usize = 128;

/// Recursive-descent parser for statements, precedence climbing for expressions
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    /// Enums defined so far, so `Name.Member` can become an enum member node
    enums: HashSet<String>,
    lsp_mode: bool,
    /// Blocks, parentheses and prefix operators currently open
    depth: usize,
}

impl Parser {
    /// Creates a new parser over a token stream ending in EOF
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            current: 0,
            enums: HashSet::new(),
            lsp_mode: false,
            depth: 0,
        }
    }

    /// Switches failures to the structured `{fn, expect, got, loc}` form
    pub fn with_lsp_mode(mut self, enabled: bool) -> Self {
        self.lsp_mode = enabled;
        self
    }

    /// Parses the tokens into an AST
    pub fn parse(&mut self) -> Result<Program> {
        let lsp_mode = self.lsp_mode;
        self.parse_program().map_err(|e| e.structured(lsp_mode))
    }

    fn parse_program(&mut self) -> Result<Program> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }

        Ok(Program { statements })
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        let token = self.peek().clone();
        let pos = position_of(&token);

        let kind = match &token.kind {
            TokenKind::Let => self.parse_let()?,
            TokenKind::Free => self.parse_free()?,
            TokenKind::Def => StmtKind::FunctionDef(self.parse_function_def()?),
            TokenKind::Struct => self.parse_struct_def()?,
            TokenKind::Enum => self.parse_enum_def()?,
            TokenKind::If => self.parse_if()?,
            TokenKind::While => self.parse_while()?,
            TokenKind::For => self.parse_for()?,
            TokenKind::Return => self.parse_return()?,
            TokenKind::Spawn => self.parse_spawn()?,
            TokenKind::Import => self.parse_import()?,
            TokenKind::Try => self.parse_try()?,
            TokenKind::Identifier(name) => match self.peek_at(1).kind.clone() {
                TokenKind::Assign => {
                    let kind = self.parse_assignment(name.clone())?;
                    self.consume(TokenKind::Semicolon, "assignment")?;
                    kind
                }
                TokenKind::LeftParen if name == "print" => self.parse_print()?,
                TokenKind::Dot => self.parse_dotted()?,
                _ => self.parse_expression_statement()?,
            },
            _ => self.parse_expression_statement()?,
        };

        Ok(Statement { kind, pos })
    }

    fn parse_expression_statement(&mut self) -> Result<StmtKind> {
        let expr = self.parse_expression()?;
        self.consume(TokenKind::Semicolon, "statement")?;
        Ok(StmtKind::Expression(expr))
    }

    fn parse_block(&mut self) -> Result<Block> {
        self.nested("block", Self::parse_block_inner)
    }

    fn parse_block_inner(&mut self) -> Result<Block> {
        let open = self.consume(TokenKind::LeftBrace, "block")?;
        let mut statements = Vec::new();

        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }
        self.consume(TokenKind::RightBrace, "block")?;

        Ok(Block {
            statements,
            pos: position_of(&open),
        })
    }

    fn parse_let(&mut self) -> Result<StmtKind> {
        self.consume(TokenKind::Let, "let")?;
        let name = self.expect_identifier("let")?;
        self.consume(TokenKind::Colon, "let")?;
        let type_name = self.expect_type("let")?;

        let value = if self.match_kind(&TokenKind::Assign) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "let")?;

        Ok(StmtKind::Let {
            name,
            type_name,
            value,
        })
    }

    fn parse_free(&mut self) -> Result<StmtKind> {
        self.consume(TokenKind::Free, "free")?;
        let name = self.expect_identifier("free")?;
        self.consume(TokenKind::Semicolon, "free")?;
        Ok(StmtKind::Free { name })
    }

    /// `name = value` without the terminator
    fn parse_assignment(&mut self, name: String) -> Result<StmtKind> {
        self.advance(); // name
        self.consume(TokenKind::Assign, "assignment")?;
        let value = self.parse_expression()?;
        Ok(StmtKind::Assign { name, value })
    }

    fn parse_print(&mut self) -> Result<StmtKind> {
        self.advance(); // print
        self.consume(TokenKind::LeftParen, "print")?;
        let args = self.parse_arguments("print")?;
        self.consume(TokenKind::Semicolon, "print")?;
        Ok(StmtKind::Print { args })
    }

    /// `a.b = v;` assignment or a dotted expression statement (`p.move(1);`)
    fn parse_dotted(&mut self) -> Result<StmtKind> {
        let expr = self.parse_postfix()?;

        if self.check(&TokenKind::Assign) {
            let (target, path) = match field_path(&expr) {
                Some(found) => found,
                None => return Err(self.expected("assignment", "field access")),
            };
            self.advance(); // =
            let value = self.parse_expression()?;
            self.consume(TokenKind::Semicolon, "assignment")?;
            return Ok(StmtKind::FieldAssign {
                target,
                path,
                value,
            });
        }

        // Allow operators after a dotted operand, e.g. `p.x + 1;`
        let expr = self.continue_binary(expr, Precedence::BitOr)?;
        self.consume(TokenKind::Semicolon, "statement")?;
        Ok(StmtKind::Expression(expr))
    }

    fn parse_params(&mut self, rule: &str) -> Result<Vec<Param>> {
        self.consume(TokenKind::LeftParen, rule)?;
        let mut params = Vec::new();

        if !self.check(&TokenKind::RightParen) {
            loop {
                let name = self.expect_identifier(rule)?;
                self.consume(TokenKind::Colon, rule)?;
                let type_name = self.expect_type(rule)?;
                params.push(Param { name, type_name });
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, rule)?;

        Ok(params)
    }

    fn parse_function_def(&mut self) -> Result<Arc<FunctionDef>> {
        let def = self.consume(TokenKind::Def, "def")?;
        let name = self.expect_identifier("def")?;
        let params = self.parse_params("def")?;
        self.consume(TokenKind::Arrow, "def")?;
        let return_type = self.expect_type("def")?;
        let body = self.parse_block()?;

        Ok(Arc::new(FunctionDef {
            name,
            params,
            return_type,
            body,
            pos: position_of(&def),
        }))
    }

    fn parse_struct_def(&mut self) -> Result<StmtKind> {
        let keyword = self.consume(TokenKind::Struct, "struct")?;
        let name = self.expect_identifier("struct")?;
        self.consume(TokenKind::LeftBrace, "struct")?;

        let mut fields = Vec::new();
        let mut methods = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            if self.check(&TokenKind::Def) {
                methods.push(self.parse_function_def()?);
            } else {
                let field = self.expect_identifier("struct")?;
                self.consume(TokenKind::Colon, "struct")?;
                let type_name = self.expect_type("struct")?;
                self.consume(TokenKind::Semicolon, "struct")?;
                fields.push(Param {
                    name: field,
                    type_name,
                });
            }
        }
        self.consume(TokenKind::RightBrace, "struct")?;

        Ok(StmtKind::StructDef(Arc::new(StructDef {
            name,
            fields,
            methods,
            pos: position_of(&keyword),
        })))
    }

    fn parse_enum_def(&mut self) -> Result<StmtKind> {
        let keyword = self.consume(TokenKind::Enum, "enum")?;
        let name = self.expect_identifier("enum")?;
        self.consume(TokenKind::LeftBrace, "enum")?;

        let mut members = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            members.push(self.expect_identifier("enum")?);
            if !self.match_kind(&TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RightBrace, "enum")?;

        self.enums.insert(name.clone());
        Ok(StmtKind::EnumDef(Arc::new(EnumDef {
            name,
            members,
            pos: position_of(&keyword),
        })))
    }

    fn parse_condition(&mut self, rule: &str) -> Result<Expression> {
        self.consume(TokenKind::LeftParen, rule)?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RightParen, rule)?;
        Ok(condition)
    }

    fn parse_if(&mut self) -> Result<StmtKind> {
        self.consume(TokenKind::If, "if")?;
        let condition = self.parse_condition("if")?;
        let then_block = self.parse_block()?;

        let mut elif_branches = Vec::new();
        while self.match_kind(&TokenKind::Elif) {
            let elif_condition = self.parse_condition("elif")?;
            elif_branches.push((elif_condition, self.parse_block()?));
        }

        let else_block = if self.match_kind(&TokenKind::Else) {
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(StmtKind::If {
            condition,
            then_block,
            elif_branches,
            else_block,
        })
    }

    fn parse_while(&mut self) -> Result<StmtKind> {
        self.consume(TokenKind::While, "while")?;
        let condition = self.parse_condition("while")?;
        let body = self.parse_block()?;
        Ok(StmtKind::While { condition, body })
    }

    fn parse_for(&mut self) -> Result<StmtKind> {
        self.consume(TokenKind::For, "for")?;
        self.consume(TokenKind::LeftParen, "for")?;
        let init = self.parse_statement()?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::Semicolon, "for")?;

        let increment_pos = position_of(self.peek());
        let assigned = match (&self.peek().kind, &self.peek_at(1).kind) {
            (TokenKind::Identifier(name), TokenKind::Assign) => Some(name.clone()),
            _ => None,
        };
        let increment = match assigned {
            Some(name) => self.parse_assignment(name)?,
            None => StmtKind::Expression(self.parse_expression()?),
        };
        // a trailing `;` before `)` is tolerated
        self.match_kind(&TokenKind::Semicolon);
        self.consume(TokenKind::RightParen, "for")?;
        let body = self.parse_block()?;

        Ok(StmtKind::For {
            init: Box::new(init),
            condition,
            increment: Box::new(Statement {
                kind: increment,
                pos: increment_pos,
            }),
            body,
        })
    }

    fn parse_return(&mut self) -> Result<StmtKind> {
        self.consume(TokenKind::Return, "return")?;
        let value = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenKind::Semicolon, "return")?;
        Ok(StmtKind::Return { value })
    }

    fn parse_spawn(&mut self) -> Result<StmtKind> {
        self.consume(TokenKind::Spawn, "spawn")?;
        match &self.peek().kind {
            TokenKind::Identifier(word) if word == "task" => {
                self.advance();
            }
            _ => return Err(self.expected("spawn", "task")),
        }
        let name = self.expect_identifier("spawn")?;
        let params = self.parse_params("spawn")?;
        let body = self.parse_block()?;
        Ok(StmtKind::Spawn { name, params, body })
    }

    fn parse_import(&mut self) -> Result<StmtKind> {
        self.consume(TokenKind::Import, "import")?;
        let module = self.expect_identifier("import")?;
        self.consume(TokenKind::Semicolon, "import")?;
        Ok(StmtKind::Import { module })
    }

    fn parse_try(&mut self) -> Result<StmtKind> {
        self.consume(TokenKind::Try, "try")?;
        let body = self.parse_block()?;
        let handler = if self.match_kind(&TokenKind::Catch) {
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(StmtKind::Try { body, handler })
    }

    // --- Expressions ---

    fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_binary(Precedence::BitOr)
    }

    fn parse_binary(&mut self, min: Precedence) -> Result<Expression> {
        let left = self.parse_unary()?;
        self.continue_binary(left, min)
    }

    /// Precedence climbing from an already-parsed left operand
    fn continue_binary(&mut self, mut left: Expression, min: Precedence) -> Result<Expression> {
        while let Some(op) = self.binary_op() {
            let precedence = op.precedence();
            if precedence < min {
                break;
            }
            self.advance();
            let right = self.parse_binary(precedence.next())?;
            let pos = left.pos;
            left = Expression::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                pos,
            );
        }
        Ok(left)
    }

    /// Infix reading of the current token
    fn binary_op(&self) -> Option<BinaryOp> {
        let op = match self.peek().kind {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Mod,
            TokenKind::Eq => BinaryOp::Eq,
            TokenKind::NotEq => BinaryOp::NotEq,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::LtEq => BinaryOp::LtEq,
            TokenKind::GtEq => BinaryOp::GtEq,
            TokenKind::Ampersand => BinaryOp::BitAnd,
            TokenKind::Pipe => BinaryOp::BitOr,
            TokenKind::Caret => BinaryOp::BitXor,
            TokenKind::Shl => BinaryOp::Shl,
            TokenKind::Shr => BinaryOp::Shr,
            _ => return None,
        };
        Some(op)
    }

    /// Prefix reading: `-x`, `~x`, `&x`, `*p`, `<type> x`
    fn parse_unary(&mut self) -> Result<Expression> {
        self.nested("expression", Self::parse_unary_inner)
    }

    fn parse_unary_inner(&mut self) -> Result<Expression> {
        let token = self.peek().clone();
        let pos = position_of(&token);

        let kind = match token.kind {
            TokenKind::Minus => {
                self.advance();
                ExprKind::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(self.parse_unary()?),
                }
            }
            TokenKind::Tilde => {
                self.advance();
                ExprKind::Unary {
                    op: UnaryOp::BitNot,
                    operand: Box::new(self.parse_unary()?),
                }
            }
            TokenKind::Ampersand => {
                self.advance();
                ExprKind::PointerRef(Box::new(self.parse_unary()?))
            }
            TokenKind::Star => {
                self.advance();
                ExprKind::PointerDeref(Box::new(self.parse_unary()?))
            }
            TokenKind::Lt if self.is_cast() => {
                self.advance(); // <
                let target = self.expect_type("cast")?;
                self.consume(TokenKind::Gt, "cast")?;
                ExprKind::Cast {
                    target,
                    expr: Box::new(self.parse_unary()?),
                }
            }
            _ => return self.parse_postfix(),
        };

        Ok(Expression::new(kind, pos))
    }

    fn is_cast(&self) -> bool {
        matches!(self.peek_at(1).kind, TokenKind::DataType(_))
            && self.peek_at(2).kind == TokenKind::Gt
    }

    fn parse_postfix(&mut self) -> Result<Expression> {
        let mut node = self.parse_atom()?;

        loop {
            let pos = node.pos;
            if self.match_kind(&TokenKind::LeftParen) {
                let args = self.parse_arguments("call")?;
                node = Expression::new(
                    ExprKind::Call {
                        callee: Box::new(node),
                        args,
                    },
                    pos,
                );
            } else if self.match_kind(&TokenKind::LeftBracket) {
                let index = self.parse_expression()?;
                self.consume(TokenKind::RightBracket, "index")?;
                node = Expression::new(
                    ExprKind::Index {
                        array: Box::new(node),
                        index: Box::new(index),
                    },
                    pos,
                );
            } else if self.match_kind(&TokenKind::Dot) {
                let member = match &self.peek().kind {
                    TokenKind::Identifier(name) => name.clone(),
                    TokenKind::Integer(n) => n.to_string(),
                    _ => return Err(self.expected("member", "IDENTIFIER")),
                };
                self.advance();

                let kind = if self.match_kind(&TokenKind::LeftParen) {
                    ExprKind::MethodCall {
                        receiver: Box::new(node),
                        method: member,
                        args: self.parse_arguments("method")?,
                    }
                } else {
                    let enum_name = match &node.kind {
                        ExprKind::Identifier(name) if self.enums.contains(name) => Some(name.clone()),
                        _ => None,
                    };
                    match enum_name {
                        Some(enum_name) => ExprKind::EnumMember { enum_name, member },
                        None => ExprKind::FieldAccess {
                            object: Box::new(node),
                            field: member,
                        },
                    }
                };
                node = Expression::new(kind, pos);
            } else {
                break;
            }
        }

        Ok(node)
    }

    /// Comma-separated arguments after an already-consumed `(`
    fn parse_arguments(&mut self, rule: &str) -> Result<Vec<Expression>> {
        let mut args = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, rule)?;
        Ok(args)
    }

    fn parse_atom(&mut self) -> Result<Expression> {
        let token = self.peek().clone();
        let pos = position_of(&token);

        let kind = match token.kind {
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.consume(TokenKind::RightParen, "expression")?;
                return Ok(inner);
            }
            TokenKind::Integer(n) => {
                self.advance();
                ExprKind::IntLiteral(n)
            }
            TokenKind::Float(x) => {
                self.advance();
                ExprKind::FloatLiteral(x)
            }
            TokenKind::Char(c) => {
                self.advance();
                ExprKind::CharLiteral(c)
            }
            TokenKind::String(s) => {
                self.advance();
                ExprKind::StringLiteral(s)
            }
            TokenKind::Null => {
                self.advance();
                ExprKind::NullLiteral
            }
            TokenKind::LeftBracket => {
                self.advance();
                ExprKind::ArrayLiteral(self.parse_array_elements()?)
            }
            TokenKind::Ok => ExprKind::ResultOk(self.parse_result_payload()?),
            TokenKind::Err => ExprKind::ResultErr(self.parse_result_payload()?),
            TokenKind::Identifier(name) => {
                self.advance();
                if self.is_struct_literal() {
                    self.parse_struct_literal(name)?
                } else {
                    ExprKind::Identifier(name)
                }
            }
            _ => return Err(self.expected("expression", "expression")),
        };

        Ok(Expression::new(kind, pos))
    }

    /// `Ok(value)` / `Err(value)` argument
    fn parse_result_payload(&mut self) -> Result<Box<Expression>> {
        self.advance(); // Ok | Err
        self.consume(TokenKind::LeftParen, "result")?;
        let inner = self.parse_expression()?;
        self.consume(TokenKind::RightParen, "result")?;
        Ok(Box::new(inner))
    }

    fn parse_array_elements(&mut self) -> Result<Vec<Expression>> {
        let mut elements = Vec::new();
        while !self.check(&TokenKind::RightBracket) && !self.is_at_end() {
            elements.push(self.parse_expression()?);
            if !self.match_kind(&TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RightBracket, "array")?;
        Ok(elements)
    }

    /// `Name {` followed by `}` or `field:`
    fn is_struct_literal(&self) -> bool {
        self.check(&TokenKind::LeftBrace)
            && match self.peek_at(1).kind {
                TokenKind::RightBrace => true,
                TokenKind::Identifier(_) => self.peek_at(2).kind == TokenKind::Colon,
                _ => false,
            }
    }

    fn parse_struct_literal(&mut self, name: String) -> Result<ExprKind> {
        self.consume(TokenKind::LeftBrace, "struct literal")?;
        let mut fields = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            let field = self.expect_identifier("struct literal")?;
            self.consume(TokenKind::Colon, "struct literal")?;
            fields.push((field, self.parse_expression()?));
            if !self.match_kind(&TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RightBrace, "struct literal")?;
        Ok(ExprKind::StructInstantiation { name, fields })
    }

    // --- Token cursor ---

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let index = (self.current + offset).min(self.tokens.len().saturating_sub(1));
        &self.tokens[index]
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.tokens[self.current.saturating_sub(1)].clone()
    }

    fn check(&self, kind: &TokenKind) -> bool {
        if self.is_at_end() {
            return false;
        }
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn match_kind(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, rule: &str) -> Result<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.expected(rule, kind.name()))
        }
    }

    /// Runs `parse` one nesting level deeper, failing past [`MAX_NESTING`]
    fn nested<T>(&mut self, rule: &str, parse: fn(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING {
            return Err(self.expected(rule, &format!("at most {} nested levels", MAX_NESTING)));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn expected(&self, rule: &str, expected: &str) -> Error {
        let token = self.peek();
        Error::UnexpectedToken {
            rule: rule.to_string(),
            expected: expected.to_string(),
            got: token.kind.name().to_string(),
            line: token.line,
            column: token.column,
        }
    }

    fn expect_identifier(&mut self, rule: &str) -> Result<String> {
        match &self.peek().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.expected(rule, "IDENTIFIER")),
        }
    }

    /// Builtin type, `null`, or a user type name
    fn expect_type(&mut self, rule: &str) -> Result<String> {
        let name = match &self.peek().kind {
            TokenKind::DataType(name) | TokenKind::Identifier(name) => name.clone(),
            TokenKind::Null => "null".to_string(),
            _ => return Err(self.expected(rule, "DATA_TYPE")),
        };
        self.advance();
        Ok(name)
    }
}

fn position_of(token: &Token) -> Position {
    Position::new(token.line.saturating_sub(1), token.column.saturating_sub(1))
}

/// Splits `root.a.b` into `("root", ["a", "b"])`
fn field_path(expr: &Expression) -> Option<(String, Vec<String>)> {
    match &expr.kind {
        ExprKind::FieldAccess { object, field } => {
            let (root, mut path) = match &object.kind {
                ExprKind::Identifier(name) => (name.clone(), Vec::new()),
                _ => field_path(object)?,
            };
            path.push(field.clone());
            Some((root, path))
        }
        _ => None,
    }
}

/// Parses a whole source text
pub fn parse_source(source: &str, lsp_mode: bool) -> Result<Program> {
    let tokens = crate::lexer::tokenize(source, lsp_mode)?;
    Parser::new(tokens).with_lsp_mode(lsp_mode).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Program {
        parse_source(source, false).unwrap()
    }

    fn first_expr(source: &str) -> Expression {
        match parse(source).statements.remove(0).kind {
            StmtKind::Expression(expr) => expr,
            other => panic!("Expected expression statement, got {:?}", other),
        }
    }

    fn let_value(source: &str) -> Expression {
        match parse(source).statements.remove(0).kind {
            StmtKind::Let { value, .. } => value.unwrap(),
            other => panic!("Expected let, got {:?}", other),
        }
    }

    #[test]
    fn test_let_with_initializer() {
        let program = parse("let x: int32 = 5;");
        assert_eq!(program.statements.len(), 1);
        match &program.statements[0].kind {
            StmtKind::Let {
                name,
                type_name,
                value,
            } => {
                assert_eq!(name, "x");
                assert_eq!(type_name, "int32");
                assert_eq!(value.as_ref().unwrap().kind, ExprKind::IntLiteral(5));
            }
            _ => panic!("Expected let"),
        }
    }

    #[test]
    fn test_precedence_climbing() {
        let expr = let_value("let x: int32 = 1 + 2 * 3;");
        assert_eq!(expr.to_string(), "(1 + (2 * 3))");

        let expr = let_value("let x: int32 = 1 | 2 ^ 3 & 4 == 5;");
        assert_eq!(expr.to_string(), "(1 | (2 ^ (3 & (4 == 5))))");

        let expr = let_value("let x: int32 = 1 << 2 + 3 < 4;");
        assert_eq!(expr.to_string(), "((1 << (2 + 3)) < 4)");
    }

    #[test]
    fn test_left_associativity() {
        let expr = let_value("let x: int32 = 10 - 3 - 2;");
        assert_eq!(expr.to_string(), "((10 - 3) - 2)");
    }

    #[test]
    fn test_ampersand_positional() {
        let expr = let_value("let x: int32 = a & b;");
        assert!(matches!(
            expr.kind,
            ExprKind::Binary {
                op: BinaryOp::BitAnd,
                ..
            }
        ));

        let expr = let_value("let p: int64 = &a;");
        assert!(matches!(expr.kind, ExprKind::PointerRef(_)));

        let expr = let_value("let y: int32 = a * *p;");
        match expr.kind {
            ExprKind::Binary {
                op: BinaryOp::Mul,
                right,
                ..
            } => assert!(matches!(right.kind, ExprKind::PointerDeref(_))),
            other => panic!("Expected multiplication, got {:?}", other),
        }
    }

    #[test]
    fn test_cast_binds_to_unary_operand() {
        let expr = let_value("let x: int32 = <int32> f(2) + 1;");
        match expr.kind {
            ExprKind::Binary { left, .. } => match left.kind {
                ExprKind::Cast { target, expr } => {
                    assert_eq!(target, "int32");
                    assert!(matches!(expr.kind, ExprKind::Call { .. }));
                }
                other => panic!("Expected cast, got {:?}", other),
            },
            other => panic!("Expected binary, got {:?}", other),
        }
    }

    #[test]
    fn test_less_than_is_not_a_cast() {
        let expr = let_value("let x: int32 = a < b;");
        assert!(matches!(
            expr.kind,
            ExprKind::Binary {
                op: BinaryOp::Lt,
                ..
            }
        ));
    }

    #[test]
    fn test_parenthesised_expression_is_inner_node() {
        let expr = let_value("let x: int32 = (y);");
        assert_eq!(expr.kind, ExprKind::Identifier("y".to_string()));
    }

    #[test]
    fn test_if_elif_else() {
        let program = parse("if (a) { print(1); } elif (b) { print(2); } elif (c) { } else { print(3); }");
        match &program.statements[0].kind {
            StmtKind::If {
                elif_branches,
                else_block,
                then_block,
                ..
            } => {
                assert_eq!(then_block.statements.len(), 1);
                assert_eq!(elif_branches.len(), 2);
                assert!(else_block.is_some());
            }
            _ => panic!("Expected if"),
        }
    }

    #[test]
    fn test_for_loop() {
        let program = parse("for (let i: int32 = 0; i < 3; i = i + 1) { print(i); }");
        match &program.statements[0].kind {
            StmtKind::For {
                init, increment, ..
            } => {
                assert!(matches!(init.kind, StmtKind::Let { .. }));
                assert!(matches!(increment.kind, StmtKind::Assign { .. }));
            }
            _ => panic!("Expected for"),
        }
    }

    #[test]
    fn test_struct_with_methods() {
        let program = parse(
            "struct Point { x: int32; def norm() -> int32 { return self.x; } y: int32; }",
        );
        match &program.statements[0].kind {
            StmtKind::StructDef(def) => {
                assert_eq!(def.name, "Point");
                assert_eq!(def.fields.len(), 2);
                assert_eq!(def.methods.len(), 1);
                assert_eq!(def.methods[0].name, "norm");
            }
            _ => panic!("Expected struct"),
        }
    }

    #[test]
    fn test_enum_trailing_comma_and_member() {
        let program = parse("enum Color { Red, Green, Blue, } print(Color.Red);");
        match &program.statements[0].kind {
            StmtKind::EnumDef(def) => assert_eq!(def.members, vec!["Red", "Green", "Blue"]),
            _ => panic!("Expected enum"),
        }
        match &program.statements[1].kind {
            StmtKind::Print { args } => assert_eq!(
                args[0].kind,
                ExprKind::EnumMember {
                    enum_name: "Color".to_string(),
                    member: "Red".to_string()
                }
            ),
            _ => panic!("Expected print"),
        }

        let program = parse("enum Dir { Up, Down }");
        match &program.statements[0].kind {
            StmtKind::EnumDef(def) => assert_eq!(def.members.len(), 2),
            _ => panic!("Expected enum"),
        }
    }

    #[test]
    fn test_field_assignment_path() {
        let program = parse("line.start.x = 4;");
        match &program.statements[0].kind {
            StmtKind::FieldAssign { target, path, .. } => {
                assert_eq!(target, "line");
                assert_eq!(path, &vec!["start".to_string(), "x".to_string()]);
            }
            _ => panic!("Expected field assignment"),
        }
    }

    #[test]
    fn test_method_call_statement() {
        let program = parse("p.move(1, 2);");
        match &program.statements[0].kind {
            StmtKind::Expression(expr) => match &expr.kind {
                ExprKind::MethodCall { method, args, .. } => {
                    assert_eq!(method, "move");
                    assert_eq!(args.len(), 2);
                }
                other => panic!("Expected method call, got {:?}", other),
            },
            _ => panic!("Expected expression"),
        }
    }

    #[test]
    fn test_numeric_member_access() {
        let expr = first_expr("arr.0;");
        assert_eq!(
            expr.kind,
            ExprKind::FieldAccess {
                object: Box::new(Expression::new(
                    ExprKind::Identifier("arr".to_string()),
                    Position::new(0, 0)
                )),
                field: "0".to_string()
            }
        );
    }

    #[test]
    fn test_struct_literal() {
        let expr = let_value("let p: Point = Point { x: 1, y: 2 };");
        match expr.kind {
            ExprKind::StructInstantiation { name, fields } => {
                assert_eq!(name, "Point");
                assert_eq!(fields.len(), 2);
            }
            other => panic!("Expected struct literal, got {:?}", other),
        }
    }

    #[test]
    fn test_spawn_try_import_return() {
        let program = parse(
            "import utils; spawn task worker(n: int32) { print(n); } \
             try { risky(); } catch { print(e); } \
             def f() -> null { return; }",
        );
        assert!(matches!(program.statements[0].kind, StmtKind::Import { .. }));
        assert!(matches!(program.statements[1].kind, StmtKind::Spawn { .. }));
        assert!(matches!(
            program.statements[2].kind,
            StmtKind::Try {
                handler: Some(_),
                ..
            }
        ));
        match &program.statements[3].kind {
            StmtKind::FunctionDef(def) => {
                assert_eq!(def.return_type, "null");
                assert!(matches!(
                    def.body.statements[0].kind,
                    StmtKind::Return { value: None }
                ));
            }
            _ => panic!("Expected def"),
        }
    }

    #[test]
    fn test_positions_are_zero_based() {
        let program = parse("\n  free x;");
        assert_eq!(program.statements[0].pos, Position::new(1, 2));
    }

    #[test]
    fn test_missing_semicolon_message() {
        let err = parse_source("let x: int32 = 5", false).unwrap_err();
        assert_eq!(err.to_string(), "Expected SEMICOLON, got EOF at 1:17");
    }

    #[test]
    fn test_structured_parse_error() {
        let err = parse_source("let x int32;", true).unwrap_err();
        let json: serde_json::Value = serde_json::from_str(&err.to_string()).unwrap();
        assert_eq!(json["fn"], "let");
        assert_eq!(json["expect"], "COLON");
        assert_eq!(json["got"], "DATA_TYPE");
        assert_eq!(json["loc"]["line"], 0);
        assert_eq!(json["loc"]["column"], 6);
    }

    #[test]
    fn test_nesting_limit() {
        let open = "(".repeat(MAX_NESTING - 1);
        let close = ")".repeat(MAX_NESTING - 1);
        let at_limit = format!("let x: int32 = {}1{};", open, close);
        assert!(parse_source(&at_limit, false).is_ok());

        let parens = format!("let x: int32 = {}1{};", "(".repeat(5000), ")".repeat(5000));
        let err = parse_source(&parens, false).unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedToken { ref rule, .. } if rule == "expression"
        ));

        let negations = format!("print({}1);", "- ".repeat(5000));
        assert!(matches!(
            parse_source(&negations, false),
            Err(Error::UnexpectedToken { .. })
        ));

        let blocks = format!("{}{}", "if (1) { ".repeat(5000), "}".repeat(5000));
        assert!(matches!(
            parse_source(&blocks, false),
            Err(Error::UnexpectedToken { .. })
        ));
    }
}
