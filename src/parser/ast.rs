use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Source position of a node (0-indexed line and column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Line number (0-indexed)
    pub line: usize,
    /// Column number (0-indexed)
    pub column: usize,
}

impl Position {
    /// Creates a position from zero-based coordinates
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

/// Complete Gravox program
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    /// Top-level statements in the program
    pub statements: Vec<Statement>,
}

/// Brace-delimited statement list
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    /// Statements in source order
    pub statements: Vec<Statement>,
    /// Position of the opening brace
    pub pos: Position,
}

/// Statement node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// What the statement does
    pub kind: StmtKind,
    /// Where it starts
    pub pos: Position,
}

/// Statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    /// Allocation: `let name: type [= value];`
    Let {
        /// Variable name
        name: String,
        /// Declared type name
        type_name: String,
        /// Optional initializer
        value: Option<Expression>,
    },

    /// Release: `free name;`
    Free {
        /// Variable name
        name: String,
    },

    /// Variable assignment: `name = value;`
    Assign {
        /// Variable name
        name: String,
        /// Value expression
        value: Expression,
    },

    /// Field assignment: `name.a.b = value;`
    FieldAssign {
        /// Root variable name
        target: String,
        /// Field path below the root, outermost first
        path: Vec<String>,
        /// Value expression
        value: Expression,
    },

    /// Function definition
    FunctionDef(Arc<FunctionDef>),

    /// Struct definition with fields and methods
    StructDef(Arc<StructDef>),

    /// Enum definition
    EnumDef(Arc<EnumDef>),

    /// `if (c) {..} [elif (c) {..}]* [else {..}]`
    If {
        /// Condition expression to evaluate
        condition: Expression,
        /// Block executed when the condition holds
        then_block: Block,
        /// `elif` branches in order
        elif_branches: Vec<(Expression, Block)>,
        /// Optional fallback block
        else_block: Option<Block>,
    },

    /// While loop
    While {
        /// Loop condition expression
        condition: Expression,
        /// Loop body
        body: Block,
    },

    /// `for (init; condition; increment) {..}`
    For {
        /// Runs once before the loop
        init: Box<Statement>,
        /// Checked before each iteration
        condition: Expression,
        /// Runs after each iteration
        increment: Box<Statement>,
        /// Loop body
        body: Block,
    },

    /// Return statement
    Return {
        /// Optional value to return
        value: Option<Expression>,
    },

    /// `print(args...);`
    Print {
        /// Values to print
        args: Vec<Expression>,
    },

    /// `spawn task name(params) {..}`; the body runs inline
    Spawn {
        /// Task name
        name: String,
        /// Declared parameters (not bound)
        params: Vec<Param>,
        /// Task body
        body: Block,
    },

    /// `import name;`
    Import {
        /// Module name without the `.grv` extension
        module: String,
    },

    /// `try {..} [catch {..}]`
    Try {
        /// Guarded block
        body: Block,
        /// Handler run when the guarded block fails
        handler: Option<Block>,
    },

    /// Expression statement
    Expression(Expression),
}

/// Typed name used for parameters and struct fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    /// Name
    pub name: String,
    /// Declared type name
    pub type_name: String,
}

/// Function or method definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    /// Function name
    pub name: String,
    /// Parameters in call order
    pub params: Vec<Param>,
    /// Declared return type
    pub return_type: String,
    /// Function body
    pub body: Block,
    /// Position of the `def` keyword
    pub pos: Position,
}

/// Struct definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDef {
    /// Struct name
    pub name: String,
    /// Fields in declaration order
    pub fields: Vec<Param>,
    /// Methods, registered as `Name::method`
    pub methods: Vec<Arc<FunctionDef>>,
    /// Position of the `struct` keyword
    pub pos: Position,
}

impl StructDef {
    /// Declared type of a field
    pub fn field_type(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == field)
            .map(|f| f.type_name.as_str())
    }
}

/// Enum definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDef {
    /// Enum name
    pub name: String,
    /// Member names in declaration order
    pub members: Vec<String>,
    /// Position of the `enum` keyword
    pub pos: Position,
}

/// Expression node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    /// Expression variant
    pub kind: ExprKind,
    /// Where it starts
    pub pos: Position,
}

impl Expression {
    /// Creates an expression node
    pub fn new(kind: ExprKind, pos: Position) -> Self {
        Expression { kind, pos }
    }
}

/// Expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    /// Integer literal
    IntLiteral(i64),
    /// Float literal
    FloatLiteral(f64),
    /// Character literal
    CharLiteral(char),
    /// String literal
    StringLiteral(String),
    /// `null`
    NullLiteral,
    /// `[a, b, c]`
    ArrayLiteral(Vec<Expression>),

    /// Variable reference
    Identifier(String),

    /// Binary operation
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expression>,
        /// Right operand
        right: Box<Expression>,
    },

    /// Unary `-` or `~`
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expression>,
    },

    /// `&name`: address of a variable
    PointerRef(Box<Expression>),

    /// `*expr`: memory read at an address
    PointerDeref(Box<Expression>),

    /// `<type> expr`
    Cast {
        /// Target type name
        target: String,
        /// Value being cast
        expr: Box<Expression>,
    },

    /// Function call
    Call {
        /// Callee expression (an identifier for callable targets)
        callee: Box<Expression>,
        /// Arguments in order
        args: Vec<Expression>,
    },

    /// `receiver.method(args)`
    MethodCall {
        /// Receiver expression
        receiver: Box<Expression>,
        /// Method name
        method: String,
        /// Arguments in order
        args: Vec<Expression>,
    },

    /// `object.field` (or `array.N`)
    FieldAccess {
        /// Accessed expression
        object: Box<Expression>,
        /// Field name or numeric index text
        field: String,
    },

    /// `array[index]`
    Index {
        /// Indexed expression
        array: Box<Expression>,
        /// Index expression
        index: Box<Expression>,
    },

    /// `Enum.Member` for an enum defined earlier in the same source
    EnumMember {
        /// Enum name
        enum_name: String,
        /// Member name
        member: String,
    },

    /// `Name { field: value, .. }`
    StructInstantiation {
        /// Struct name
        name: String,
        /// Explicit field initializers
        fields: Vec<(String, Expression)>,
    },

    /// `Ok(value)` (deprecated)
    ResultOk(Box<Expression>),

    /// `Err(value)` (deprecated)
    ResultErr(Box<Expression>),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Addition or concatenation (+)
    Add,
    /// Subtraction (-)
    Sub,
    /// Multiplication (*)
    Mul,
    /// True division (/)
    Div,
    /// Modulo (%)
    Mod,
    /// Equality (==)
    Eq,
    /// Inequality (!=)
    NotEq,
    /// Less than (<)
    Lt,
    /// Greater than (>)
    Gt,
    /// Less than or equal (<=)
    LtEq,
    /// Greater than or equal (>=)
    GtEq,
    /// Bitwise AND (&)
    BitAnd,
    /// Bitwise OR (|)
    BitOr,
    /// Bitwise XOR (^)
    BitXor,
    /// Left shift (<<)
    Shl,
    /// Right shift (>>)
    Shr,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
    /// Bitwise NOT (~)
    BitNot,
}

/// Operator precedence levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    /// No precedence
    None,
    /// Bitwise OR (|)
    BitOr,
    /// Bitwise XOR (^)
    BitXor,
    /// Bitwise AND (&)
    BitAnd,
    /// Equality operators (==, !=)
    Equality,
    /// Comparison operators (<, >, <=, >=)
    Comparison,
    /// Shift operators (<<, >>)
    Shift,
    /// Addition and subtraction (+, -)
    Term,
    /// Multiplication, division, modulo (*, /, %)
    Factor,
    /// Unary operators (-, ~, &, *, casts)
    Unary,
    /// Call operators (., (), [])
    Call,
}

impl Precedence {
    /// The next tighter level
    pub fn next(self) -> Precedence {
        match self {
            Precedence::None => Precedence::BitOr,
            Precedence::BitOr => Precedence::BitXor,
            Precedence::BitXor => Precedence::BitAnd,
            Precedence::BitAnd => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Shift,
            Precedence::Shift => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Unary,
            Precedence::Unary | Precedence::Call => Precedence::Call,
        }
    }
}

impl BinaryOp {
    /// Returns the precedence level of this binary operator
    pub fn precedence(&self) -> Precedence {
        match self {
            BinaryOp::BitOr => Precedence::BitOr,
            BinaryOp::BitXor => Precedence::BitXor,
            BinaryOp::BitAnd => Precedence::BitAnd,
            BinaryOp::Eq | BinaryOp::NotEq => Precedence::Equality,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq | BinaryOp::GtEq => Precedence::Comparison,
            BinaryOp::Shl | BinaryOp::Shr => Precedence::Shift,
            BinaryOp::Add | BinaryOp::Sub => Precedence::Term,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => Precedence::Factor,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::LtEq => "<=",
            BinaryOp::GtEq => ">=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
        };
        f.write_str(symbol)
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::BitNot => write!(f, "~"),
        }
    }
}

fn write_list(f: &mut fmt::Formatter, items: &[Expression]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            ExprKind::IntLiteral(n) => write!(f, "{}", n),
            ExprKind::FloatLiteral(x) => write!(f, "{:?}", x),
            ExprKind::CharLiteral(c) => write!(f, "'{}'", c.escape_default()),
            ExprKind::StringLiteral(s) => write!(f, "\"{}\"", s.escape_default()),
            ExprKind::NullLiteral => write!(f, "null"),
            ExprKind::ArrayLiteral(items) => {
                write!(f, "[")?;
                write_list(f, items)?;
                write!(f, "]")
            }
            ExprKind::Identifier(name) => write!(f, "{}", name),
            ExprKind::Binary { op, left, right } => write!(f, "({} {} {})", left, op, right),
            ExprKind::Unary { op, operand } => write!(f, "{}{}", op, operand),
            ExprKind::PointerRef(inner) => write!(f, "&{}", inner),
            ExprKind::PointerDeref(inner) => write!(f, "*{}", inner),
            ExprKind::Cast { target, expr } => write!(f, "<{}> {}", target, expr),
            ExprKind::Call { callee, args } => {
                write!(f, "{}(", callee)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => {
                write!(f, "{}.{}(", receiver, method)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            ExprKind::FieldAccess { object, field } => write!(f, "{}.{}", object, field),
            ExprKind::Index { array, index } => write!(f, "{}[{}]", array, index),
            ExprKind::EnumMember { enum_name, member } => write!(f, "{}.{}", enum_name, member),
            ExprKind::StructInstantiation { name, fields } => {
                write!(f, "{} {{ ", name)?;
                for (i, (field, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", field, value)?;
                }
                write!(f, " }}")
            }
            ExprKind::ResultOk(inner) => write!(f, "Ok({})", inner),
            ExprKind::ResultErr(inner) => write!(f, "Err({})", inner),
        }
    }
}

/// One-line summary of a statement, used in runtime error reports
impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            StmtKind::Let {
                name,
                type_name,
                value,
            } => match value {
                Some(v) => write!(f, "let {}: {} = {}", name, type_name, v),
                None => write!(f, "let {}: {}", name, type_name),
            },
            StmtKind::Free { name } => write!(f, "free {}", name),
            StmtKind::Assign { name, value } => write!(f, "{} = {}", name, value),
            StmtKind::FieldAssign {
                target,
                path,
                value,
            } => write!(f, "{}.{} = {}", target, path.join("."), value),
            StmtKind::FunctionDef(def) => write!(f, "def {}", def.name),
            StmtKind::StructDef(def) => write!(f, "struct {}", def.name),
            StmtKind::EnumDef(def) => write!(f, "enum {}", def.name),
            StmtKind::If { condition, .. } => write!(f, "if ({})", condition),
            StmtKind::While { condition, .. } => write!(f, "while ({})", condition),
            StmtKind::For { condition, .. } => write!(f, "for (..; {}; ..)", condition),
            StmtKind::Return { value: Some(v) } => write!(f, "return {}", v),
            StmtKind::Return { value: None } => write!(f, "return"),
            StmtKind::Print { args } => {
                write!(f, "print(")?;
                write_list(f, args)?;
                write!(f, ")")
            }
            StmtKind::Spawn { name, .. } => write!(f, "spawn task {}", name),
            StmtKind::Import { module } => write!(f, "import {}", module),
            StmtKind::Try { .. } => write!(f, "try"),
            StmtKind::Expression(expr) => write!(f, "{}", expr),
        }
    }
}
