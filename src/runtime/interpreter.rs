use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::parser::{
    parse_source, BinaryOp, Block, ExprKind, Expression, FunctionDef, Program, Statement,
    StmtKind, UnaryOp,
};
use crate::runtime::{
    Environment, Heap, InterpreterConfig, Symbol, TypeRegistry, Value, DYNAMIC_RECORD,
    UNMAPPED_ADDRESS,
};
use crate::tools::stdlib::console;
use crate::tools::{ToolContext, ToolRegistry};

/// Remaining native stack below which evaluation moves to a fresh segment
const STACK_RED_ZONE: usize = 128 * 1024;

/// Size of each fresh stack segment
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// Writer shared by an interpreter and the modules it imports
pub type SharedOutput = Rc<RefCell<dyn Write>>;

/// Line source shared by an interpreter and the modules it imports
pub type SharedInput = Rc<RefCell<dyn BufRead>>;

/// Outcome of executing a statement
#[derive(Debug, Clone, PartialEq)]
enum Flow {
    /// Continue with the next statement
    Normal,
    /// A `return` is unwinding to the enclosing call
    Return(Value),
}

/// Tree-walking interpreter
///
/// Owns the symbol table, the simulated heap and the function, struct and
/// enum registries. Imports run in a separate interpreter whose state is
/// merged back by value.
pub struct Interpreter {
    env: Environment,
    heap: Heap,
    functions: HashMap<String, Arc<FunctionDef>>,
    types: TypeRegistry,
    tools: Arc<ToolRegistry>,
    output: SharedOutput,
    input: SharedInput,
    config: InterpreterConfig,
    /// Statements started so far
    step: usize,
    /// One-line description of the most recently started statement
    last_node: String,
    call_depth: usize,
}

impl Interpreter {
    /// Creates an interpreter writing to stdout and reading stdin
    pub fn new(config: InterpreterConfig) -> Self {
        Interpreter {
            env: Environment::new(),
            heap: Heap::new(config.heap_size),
            functions: HashMap::new(),
            types: TypeRegistry::new(),
            tools: Arc::new(ToolRegistry::new()),
            output: Rc::new(RefCell::new(io::stdout())),
            input: Rc::new(RefCell::new(BufReader::new(io::stdin()))),
            config,
            step: 0,
            last_node: String::new(),
            call_depth: 0,
        }
    }

    /// Redirects program output
    pub fn with_output(mut self, output: SharedOutput) -> Self {
        self.output = output;
        self
    }

    /// Redirects the line source used by `input`
    pub fn with_input(mut self, input: SharedInput) -> Self {
        self.input = input;
        self
    }

    /// Replaces the builtin table
    pub fn with_registry(mut self, registry: ToolRegistry) -> Self {
        self.tools = Arc::new(registry);
        self
    }

    /// Configuration in effect
    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Simulated heap
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Symbol table
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Current value of a variable
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.env.get(name).map(|symbol| &symbol.value)
    }

    /// Whether a function (or `Struct::method`) is registered
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Struct and enum definitions
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Number of statements started so far
    pub fn step(&self) -> usize {
        self.step
    }

    /// Description of the statement that was running last
    pub fn last_node(&self) -> &str {
        &self.last_node
    }

    /// Formats an uncaught failure the way the command line reports it
    pub fn report(&self, err: &Error) -> String {
        format!("error at {} ({}): {}", self.step, self.last_node, err)
    }

    /// Tokenizes, parses and executes a whole script
    pub fn run_source(&mut self, source: &str) -> Result<Value> {
        let program = parse_source(source, false)?;
        self.execute(&program)
    }

    /// Execute a program
    ///
    /// Returns the value of a top-level `return`, or null.
    pub fn execute(&mut self, program: &Program) -> Result<Value> {
        for statement in &program.statements {
            if let Flow::Return(value) = self.execute_statement(statement)? {
                return Ok(value);
            }
        }
        Ok(Value::Null)
    }

    fn execute_block(&mut self, block: &Block) -> Result<Flow> {
        for statement in &block.statements {
            if let flow @ Flow::Return(_) = self.execute_statement(statement)? {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn execute_statement(&mut self, stmt: &Statement) -> Result<Flow> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.execute_statement_inner(stmt)
        })
    }

    fn execute_statement_inner(&mut self, stmt: &Statement) -> Result<Flow> {
        self.step += 1;
        self.last_node = stmt.to_string();
        trace!(step = self.step, node = %self.last_node, "statement");

        match &stmt.kind {
            StmtKind::Let {
                name,
                type_name,
                value,
            } => {
                let address = self.heap.allocate(type_name);
                let value = match value {
                    Some(expr) => {
                        let raw = self.evaluate(expr)?;
                        self.types.coerce(raw, type_name)?
                    }
                    None => self.types.default_value(type_name),
                };
                self.heap.write(address, value.clone())?;
                self.env
                    .define(name.clone(), Symbol::new(type_name.clone(), value, address));
                Ok(Flow::Normal)
            }

            StmtKind::Free { name } => {
                let address = self.env.lookup(name)?.address;
                self.env.remove(name);
                self.heap.free(address);
                trace!(name = %name, address, "free");
                Ok(Flow::Normal)
            }

            StmtKind::Assign { name, value } => {
                let raw = self.evaluate(value)?;
                let declared = self.env.lookup(name)?.type_name.clone();
                let value = self.types.coerce(raw, &declared)?;
                self.store(name, value)?;
                Ok(Flow::Normal)
            }

            StmtKind::FieldAssign {
                target,
                path,
                value,
            } => {
                let new_value = self.evaluate(value)?;
                let current = self.env.lookup(target)?.value.clone();
                if !matches!(current, Value::Struct { .. }) {
                    return Err(Error::NotAStruct {
                        name: target.clone(),
                    });
                }
                let updated = self.assign_field(current, path, new_value)?;
                self.store(target, updated)?;
                Ok(Flow::Normal)
            }

            StmtKind::FunctionDef(def) => {
                self.functions.insert(def.name.clone(), Arc::clone(def));
                Ok(Flow::Normal)
            }

            StmtKind::StructDef(def) => {
                self.types.register_struct(Arc::clone(def))?;
                for method in &def.methods {
                    self.functions
                        .insert(format!("{}::{}", def.name, method.name), Arc::clone(method));
                }
                Ok(Flow::Normal)
            }

            StmtKind::EnumDef(def) => {
                self.types.register_enum(Arc::clone(def))?;
                Ok(Flow::Normal)
            }

            StmtKind::If {
                condition,
                then_block,
                elif_branches,
                else_block,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute_block(then_block);
                }
                for (elif_condition, block) in elif_branches {
                    if self.evaluate(elif_condition)?.is_truthy() {
                        return self.execute_block(block);
                    }
                }
                match else_block {
                    Some(block) => self.execute_block(block),
                    None => Ok(Flow::Normal),
                }
            }

            StmtKind::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let flow @ Flow::Return(_) = self.execute_block(body)? {
                        return Ok(flow);
                    }
                }
                Ok(Flow::Normal)
            }

            StmtKind::For {
                init,
                condition,
                increment,
                body,
            } => {
                if let flow @ Flow::Return(_) = self.execute_statement(init)? {
                    return Ok(flow);
                }
                while self.evaluate(condition)?.is_truthy() {
                    if let flow @ Flow::Return(_) = self.execute_block(body)? {
                        return Ok(flow);
                    }
                    if let flow @ Flow::Return(_) = self.execute_statement(increment)? {
                        return Ok(flow);
                    }
                }
                Ok(Flow::Normal)
            }

            StmtKind::Return { value } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }

            StmtKind::Print { args } => {
                let values = self.evaluate_all(args)?;
                let mut output = self.output.borrow_mut();
                console::write_line(&mut *output, &values, self.config.format)?;
                Ok(Flow::Normal)
            }

            StmtKind::Spawn { name, body, .. } => {
                debug!(task = %name, "spawn (inline)");
                self.execute_block(body)
            }

            StmtKind::Import { module } => {
                self.import(module)?;
                Ok(Flow::Normal)
            }

            StmtKind::Try { body, handler } => match self.execute_block(body) {
                Ok(flow) => Ok(flow),
                Err(err) => {
                    debug!(error = %err, "caught failure");
                    self.env.define(
                        "e",
                        Symbol::new(
                            DYNAMIC_RECORD,
                            Value::string(err.to_string()),
                            UNMAPPED_ADDRESS,
                        ),
                    );
                    match handler {
                        Some(block) => self.execute_block(block),
                        None => Ok(Flow::Normal),
                    }
                }
            },

            StmtKind::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }
        }
    }

    /// Updates a declared variable and its memory cell
    fn store(&mut self, name: &str, value: Value) -> Result<()> {
        let symbol = self.env.lookup_mut(name)?;
        symbol.value = value.clone();
        let address = symbol.address;
        if address != UNMAPPED_ADDRESS {
            self.heap.write(address, value)?;
        }
        Ok(())
    }

    /// Stores a builtin's updated first argument into the variable it came from
    fn write_back(&mut self, name: &str, value: Value) -> Result<()> {
        let Some(type_name) = self.env.get(name).map(|symbol| symbol.type_name.clone()) else {
            return Ok(());
        };
        let value = self.types.coerce(value, &type_name)?;
        trace!(variable = name, "builtin write-back");
        self.store(name, value)
    }

    /// Rebuilds `current` with the field at `path` replaced
    fn assign_field(&self, current: Value, path: &[String], new_value: Value) -> Result<Value> {
        let Some((field, rest)) = path.split_first() else {
            return Ok(new_value);
        };
        let (type_name, mut fields) = match current {
            Value::Struct { type_name, fields } => (type_name, fields),
            other => {
                return Err(Error::NotAStruct {
                    name: other.to_string(),
                })
            }
        };

        let value = if type_name == DYNAMIC_RECORD {
            let inner = fields.get(field).cloned().unwrap_or(Value::Null);
            self.assign_field(inner, rest, new_value)?
        } else {
            let missing = || Error::MissingField {
                struct_name: type_name.clone(),
                field: field.clone(),
            };
            let field_type = self
                .types
                .struct_def(&type_name)
                .and_then(|def| def.field_type(field))
                .ok_or_else(missing)?
                .to_string();
            let inner = fields.get(field).cloned().ok_or_else(missing)?;
            let assigned = self.assign_field(inner, rest, new_value)?;
            self.types.coerce(assigned, &field_type)?
        };

        Arc::make_mut(&mut fields).insert(field.clone(), value);
        Ok(Value::Struct { type_name, fields })
    }

    fn import(&mut self, module: &str) -> Result<()> {
        let path = self.config.module_root.join(format!("{}.grv", module));
        if !path.is_file() {
            return Err(Error::ModuleNotFound {
                name: module.to_string(),
            });
        }
        if self.call_depth >= self.config.max_call_depth {
            return Err(Error::CallDepthExceeded {
                limit: self.config.max_call_depth,
            });
        }

        let source = fs::read_to_string(&path)?;
        let program = parse_source(&source, false)?;

        let start = self.heap.next_address();
        let mut child = Interpreter {
            env: Environment::new(),
            heap: Heap::new(self.config.heap_size),
            functions: HashMap::new(),
            types: TypeRegistry::new(),
            tools: Arc::clone(&self.tools),
            output: Rc::clone(&self.output),
            input: Rc::clone(&self.input),
            config: self.config.clone(),
            step: 0,
            last_node: String::new(),
            call_depth: self.call_depth + 1,
        };
        child.heap.set_next_address(start);
        child.execute(&program)?;

        debug!(
            module,
            path = %path.display(),
            start,
            end = child.heap.next_address(),
            "import"
        );

        self.functions.extend(child.functions);
        self.types.merge(child.types);
        self.env.extend(child.env.drain());
        self.heap.merge(child.heap);
        Ok(())
    }

    fn evaluate_all(&mut self, exprs: &[Expression]) -> Result<Vec<Value>> {
        exprs.iter().map(|expr| self.evaluate(expr)).collect()
    }

    /// Evaluate an expression, growing the native stack when it runs low
    fn evaluate(&mut self, expr: &Expression) -> Result<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.evaluate_inner(expr))
    }

    fn evaluate_inner(&mut self, expr: &Expression) -> Result<Value> {
        match &expr.kind {
            ExprKind::IntLiteral(n) => Ok(Value::Int(*n)),
            ExprKind::FloatLiteral(x) => Ok(Value::Float(*x)),
            ExprKind::CharLiteral(c) => Ok(Value::Char(*c)),
            ExprKind::StringLiteral(s) => Ok(Value::string(s.clone())),
            ExprKind::NullLiteral => Ok(Value::Null),
            ExprKind::ArrayLiteral(items) => Ok(Value::array(self.evaluate_all(items)?)),

            ExprKind::Identifier(name) => {
                if let Some(symbol) = self.env.get(name) {
                    return Ok(symbol.value.clone());
                }
                if self.types.enum_def(name).is_some() {
                    return Ok(Value::string(name.clone()));
                }
                Err(Error::UndeclaredVariable { name: name.clone() })
            }

            ExprKind::Binary { op, left, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                apply_binary_op(*op, left, right)
            }

            ExprKind::Unary { op, operand } => {
                let value = self.evaluate(operand)?;
                apply_unary_op(*op, value)
            }

            ExprKind::PointerRef(inner) => match &inner.kind {
                ExprKind::Identifier(name) => Ok(Value::Int(self.env.lookup(name)?.address)),
                _ => Err(Error::InvalidPointer {
                    reason: format!("'&' can only be applied to variables, not '{}'", inner),
                }),
            },

            ExprKind::PointerDeref(inner) => match self.evaluate(inner)? {
                Value::Int(address) => self.heap.read(address),
                other => Err(Error::InvalidPointer {
                    reason: format!(
                        "dereference expects a memory address, got {}",
                        other.type_name()
                    ),
                }),
            },

            ExprKind::Cast { target, expr } => {
                let value = self.evaluate(expr)?;
                self.types.coerce(value, target)
            }

            ExprKind::Call { callee, args } => {
                let ExprKind::Identifier(name) = &callee.kind else {
                    return Err(Error::NotCallable {
                        description: callee.to_string(),
                    });
                };
                let values = self.evaluate_all(args)?;
                if let Some(def) = self.functions.get(name).cloned() {
                    return self.call_function(&def, values, None);
                }
                if self.tools.has(name) {
                    let result = self.call_builtin(name, &values)?;
                    if self.tools.updates_first_argument(name) {
                        if let Some(ExprKind::Identifier(target)) = args.first().map(|a| &a.kind) {
                            self.write_back(target, result.clone())?;
                        }
                    }
                    return Ok(result);
                }
                Err(Error::UndefinedFunction { name: name.clone() })
            }

            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => {
                let declared = match &receiver.kind {
                    ExprKind::Identifier(name) => {
                        self.env.get(name).map(|symbol| symbol.type_name.clone())
                    }
                    _ => None,
                };
                let instance = self.evaluate(receiver)?;
                let runtime_type = instance.type_name();

                let found = declared
                    .iter()
                    .chain(std::iter::once(&runtime_type))
                    .find_map(|type_name| {
                        self.functions
                            .get(&format!("{}::{}", type_name, method))
                            .map(|def| (type_name.clone(), Arc::clone(def)))
                    });
                let Some((type_name, def)) = found else {
                    return Err(Error::UndefinedMethod {
                        method: method.clone(),
                        type_name: declared.unwrap_or(runtime_type),
                    });
                };

                let args = self.evaluate_all(args)?;
                let this = Symbol::new(type_name, instance, UNMAPPED_ADDRESS);
                self.call_function(&def, args, Some(this))
            }

            ExprKind::FieldAccess { object, field } => {
                if let ExprKind::Identifier(name) = &object.kind {
                    if !self.env.contains(name) && self.types.enum_def(name).is_some() {
                        return self.enum_member(name, field);
                    }
                }
                let value = self.evaluate(object)?;
                match &value {
                    Value::Array(_) => {
                        let index = field.parse::<i64>().map_err(|_| Error::TypeError {
                            expected: "numeric index".to_string(),
                            got: field.clone(),
                        })?;
                        value.get_index(index)
                    }
                    Value::Struct { .. } => value.get_field(field),
                    _ => Err(Error::NotAStruct {
                        name: object.to_string(),
                    }),
                }
            }

            ExprKind::Index { array, index } => {
                let container = self.evaluate(array)?;
                let index = self.evaluate(index)?.as_int()?;
                container.get_index(index)
            }

            ExprKind::EnumMember { enum_name, member } => self.enum_member(enum_name, member),

            ExprKind::StructInstantiation { name, fields } => {
                let def = self
                    .types
                    .struct_def(name)
                    .cloned()
                    .ok_or_else(|| Error::NotAStruct { name: name.clone() })?;
                let mut instance = self.types.default_value(name);
                if let Value::Struct { fields: slots, .. } = &mut instance {
                    for (field, expr) in fields {
                        let field_type =
                            def.field_type(field).ok_or_else(|| Error::MissingField {
                                struct_name: name.clone(),
                                field: field.clone(),
                            })?;
                        let raw = self.evaluate(expr)?;
                        let value = self.types.coerce(raw, field_type)?;
                        Arc::make_mut(slots).insert(field.clone(), value);
                    }
                }
                Ok(instance)
            }

            ExprKind::ResultOk(inner) => {
                warn!("Ok(...) is deprecated, use try/catch instead");
                Ok(Value::Ok(Box::new(self.evaluate(inner)?)))
            }

            ExprKind::ResultErr(inner) => {
                warn!("Err(...) is deprecated, use try/catch instead");
                Ok(Value::Err(Box::new(self.evaluate(inner)?)))
            }
        }
    }

    fn enum_member(&self, enum_name: &str, member: &str) -> Result<Value> {
        let def = self
            .types
            .enum_def(enum_name)
            .ok_or_else(|| Error::UndeclaredVariable {
                name: enum_name.to_string(),
            })?;
        if def.members.iter().any(|m| m == member) {
            Ok(Value::string(member))
        } else {
            Err(Error::UnknownEnumMember {
                enum_name: enum_name.to_string(),
                member: member.to_string(),
            })
        }
    }

    fn call_builtin(&self, name: &str, args: &[Value]) -> Result<Value> {
        let mut output = self.output.borrow_mut();
        let mut input = self.input.borrow_mut();
        let mut ctx = ToolContext {
            output: &mut *output,
            input: &mut *input,
            heap: &self.heap,
            format: self.config.format,
        };
        self.tools.call(name, &mut ctx, args)
    }

    /// Runs a function or method in a copy of the caller's scope
    fn call_function(
        &mut self,
        def: &FunctionDef,
        args: Vec<Value>,
        this: Option<Symbol>,
    ) -> Result<Value> {
        if args.len() != def.params.len() {
            return Err(Error::ArityMismatch {
                function: def.name.clone(),
                expected: def.params.len(),
                got: args.len(),
            });
        }
        if self.call_depth >= self.config.max_call_depth {
            return Err(Error::CallDepthExceeded {
                limit: self.config.max_call_depth,
            });
        }
        let mut seen = HashSet::new();
        for param in &def.params {
            if !seen.insert(param.name.as_str()) {
                return Err(Error::Redeclaration {
                    name: param.name.clone(),
                    context: format!("parameters of '{}'", def.name),
                });
            }
        }

        debug!(function = %def.name, depth = self.call_depth + 1, "call");
        self.env.enter_call();
        self.call_depth += 1;
        let result = self.run_body(def, args, this);
        self.call_depth -= 1;
        self.env.exit_call();
        result
    }

    fn run_body(&mut self, def: &FunctionDef, args: Vec<Value>, this: Option<Symbol>) -> Result<Value> {
        if let Some(this) = this {
            self.env.define("self", this);
        }
        for (param, arg) in def.params.iter().zip(args) {
            let value = self.types.coerce(arg, &param.type_name)?;
            let address = self.heap.allocate(&param.type_name);
            self.heap.write(address, value.clone())?;
            self.env.define(
                param.name.clone(),
                Symbol::new(param.type_name.clone(), value, address),
            );
        }

        match self.execute_block(&def.body)? {
            Flow::Return(Value::Null) | Flow::Normal => Ok(Value::Null),
            Flow::Return(value) => self.types.coerce(value, &def.return_type),
        }
    }
}

fn invalid(op: &str, left: &Value, right: &Value) -> Error {
    Error::InvalidOperation {
        op: op.to_string(),
        left_type: left.type_name(),
        right_type: right.type_name(),
    }
}

fn truth(b: bool) -> Value {
    Value::Int(i64::from(b))
}

/// Numeric operation on two numbers; integers stay integers
fn arithmetic(
    op: &str,
    left: Value,
    right: Value,
    ints: fn(i64, i64) -> i64,
    floats: fn(f64, f64) -> f64,
) -> Result<Value> {
    match (&left, &right) {
        (Value::Int(l), Value::Int(r)) => Ok(Value::Int(ints(*l, *r))),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            Ok(Value::Float(floats(left.as_float()?, right.as_float()?)))
        }
        _ => Err(invalid(op, &left, &right)),
    }
}

/// Remainder with the sign of the divisor
fn floor_mod(l: i64, r: i64) -> i64 {
    let m = l.wrapping_rem(r);
    if m != 0 && ((m < 0) != (r < 0)) {
        m + r
    } else {
        m
    }
}

fn compare(op: &str, left: &Value, right: &Value) -> Result<Ordering> {
    let ordering = match (left, right) {
        (Value::Int(l), Value::Int(r)) => Some(l.cmp(r)),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            left.as_float()?.partial_cmp(&right.as_float()?)
        }
        (Value::String(_) | Value::Char(_), Value::String(_) | Value::Char(_)) => {
            Some(left.to_string_value().cmp(&right.to_string_value()))
        }
        _ => None,
    };
    ordering.ok_or_else(|| invalid(op, left, right))
}

fn apply_binary_op(op: BinaryOp, left: Value, right: Value) -> Result<Value> {
    match op {
        BinaryOp::Add => match (&left, &right) {
            (Value::String(_), _) | (_, Value::String(_)) => Ok(Value::String(
                left.to_string_value() + &right.to_string_value(),
            )),
            (Value::Char(l), Value::Char(r)) => Ok(Value::String(format!("{}{}", l, r))),
            (Value::Array(l), Value::Array(r)) => {
                let mut items = (**l).clone();
                items.extend(r.iter().cloned());
                Ok(Value::array(items))
            }
            _ => arithmetic("+", left, right, i64::saturating_add, |l, r| l + r),
        },
        BinaryOp::Sub => arithmetic("-", left, right, i64::saturating_sub, |l, r| l - r),
        BinaryOp::Mul => arithmetic("*", left, right, i64::saturating_mul, |l, r| l * r),

        BinaryOp::Div => {
            if !left.is_numeric() || !right.is_numeric() {
                return Err(invalid("/", &left, &right));
            }
            let divisor = right.as_float()?;
            if divisor == 0.0 {
                return Err(Error::DivisionByZero);
            }
            Ok(Value::Float(left.as_float()? / divisor))
        }

        BinaryOp::Mod => {
            if right.is_numeric() && right.as_float()? == 0.0 {
                return Err(Error::ModuloByZero);
            }
            arithmetic("%", left, right, floor_mod, |l, r| {
                let m = l % r;
                if m != 0.0 && ((m < 0.0) != (r < 0.0)) {
                    m + r
                } else {
                    m
                }
            })
        }

        BinaryOp::Eq => Ok(truth(left == right)),
        BinaryOp::NotEq => Ok(truth(left != right)),
        BinaryOp::Lt => Ok(truth(compare("<", &left, &right)? == Ordering::Less)),
        BinaryOp::Gt => Ok(truth(compare(">", &left, &right)? == Ordering::Greater)),
        BinaryOp::LtEq => Ok(truth(compare("<=", &left, &right)? != Ordering::Greater)),
        BinaryOp::GtEq => Ok(truth(compare(">=", &left, &right)? != Ordering::Less)),

        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Shl | BinaryOp::Shr => {
            let (l, r) = match (&left, &right) {
                (Value::Int(l), Value::Int(r)) => (*l, *r),
                _ => return Err(invalid(&op.to_string(), &left, &right)),
            };
            if matches!(op, BinaryOp::Shl | BinaryOp::Shr) && r < 0 {
                return Err(Error::runtime(format!("Negative shift count: {}", r)));
            }
            let shift = u32::try_from(r).ok();
            Ok(Value::Int(match op {
                BinaryOp::BitAnd => l & r,
                BinaryOp::BitOr => l | r,
                BinaryOp::BitXor => l ^ r,
                BinaryOp::Shl => shift.and_then(|s| l.checked_shl(s)).unwrap_or(0),
                _ => shift
                    .and_then(|s| l.checked_shr(s))
                    .unwrap_or(if l < 0 { -1 } else { 0 }),
            }))
        }
    }
}

fn apply_unary_op(op: UnaryOp, value: Value) -> Result<Value> {
    match (op, &value) {
        (UnaryOp::Neg, Value::Int(n)) => Ok(Value::Int(n.saturating_neg())),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::BitNot, Value::Int(n)) => Ok(Value::Int(!n)),
        _ => Err(Error::InvalidOperation {
            op: op.to_string(),
            left_type: value.type_name(),
            right_type: "none".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> (Result<Value>, String, Interpreter) {
        run_with(source, InterpreterConfig::default())
    }

    fn run_with(source: &str, config: InterpreterConfig) -> (Result<Value>, String, Interpreter) {
        let buffer = Rc::new(RefCell::new(Vec::<u8>::new()));
        let mut interpreter = Interpreter::new(config).with_output(buffer.clone());
        let result = interpreter.run_source(source);
        let output = String::from_utf8(buffer.borrow().clone()).unwrap();
        (result, output, interpreter)
    }

    fn output_of(source: &str) -> String {
        let (result, output, _) = run(source);
        result.unwrap();
        output
    }

    #[test]
    fn test_declare_assign_print() {
        assert_eq!(output_of("let x: int32 = 5; x = x + 1; print(x);"), "6\n");
    }

    #[test]
    fn test_division_is_true_division() {
        assert_eq!(output_of("print(7 / 2); let x: int32 = 7 / 2; print(x);"), "3.5\n3\n");
        let (result, _, _) = run("let x: int32 = 5 / 0;");
        assert_eq!(result.unwrap_err(), Error::DivisionByZero);
        let (result, _, _) = run("let x: int32 = 5 % 0;");
        assert_eq!(result.unwrap_err(), Error::ModuloByZero);
    }

    #[test]
    fn test_modulo_follows_divisor_sign() {
        assert_eq!(output_of("print(-7 % 3, 7 % -3, 7 % 3);"), "2 -2 1\n");
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            output_of(r#"print(1 < 2, 2 <= 1, "a" + 1, 'a' + 'b', 6 & 3, 6 | 3, 6 ^ 3, 1 << 4, -16 >> 2, ~0);"#),
            "1 0 a1 ab 2 7 5 16 -4 -1\n"
        );
        assert_eq!(output_of("print([1] + [2, 3]);"), "[1, 2, 3]\n");
        let (result, _, _) = run("print(1 << -1);");
        assert!(result.is_err());
        let (result, _, _) = run(r#"print("a" - 1);"#);
        assert!(matches!(result, Err(Error::InvalidOperation { .. })));
    }

    #[test]
    fn test_return_unwinds_nested_blocks() {
        let source = r#"
            def find(limit: int32) -> int32 {
                let i: int32 = 0;
                while (1) {
                    if (i == limit) { return i * 10; }
                    i = i + 1;
                }
                return -1;
            }
            print(find(3));
        "#;
        assert_eq!(output_of(source), "30\n");
    }

    #[test]
    fn test_top_level_return_stops_program() {
        let (result, output, _) = run("print(1); return 5; print(2);");
        assert_eq!(result.unwrap(), Value::Int(5));
        assert_eq!(output, "1\n");
    }

    #[test]
    fn test_callee_runs_in_a_copy() {
        let source = r#"
            let x: int32 = 1;
            def bump() -> int32 { x = 99; return x; }
            print(bump(), x);
        "#;
        assert_eq!(output_of(source), "99 1\n");
    }

    #[test]
    fn test_pointer_writes_persist() {
        let source = r#"
            let x: int32 = 7;
            let p: int64 = &x;
            print(*p, p);
        "#;
        assert_eq!(output_of(source), "7 0\n");
        let (result, _, _) = run("print(&(1 + 2));");
        assert!(matches!(result, Err(Error::InvalidPointer { .. })));
        let (result, _, _) = run("print(*40);");
        assert_eq!(
            result.unwrap_err(),
            Error::InvalidMemoryAccess { address: 40 }
        );
    }

    #[test]
    fn test_arity_and_undefined() {
        let (result, _, _) = run("def f(a: int32) -> int32 { return a; } f(1, 2);");
        assert!(matches!(result, Err(Error::ArityMismatch { expected: 1, got: 2, .. })));
        let (result, _, _) = run("nothing(1);");
        assert!(matches!(result, Err(Error::UndefinedFunction { .. })));
        let (result, _, _) = run("print(y);");
        assert_eq!(
            result.unwrap_err().to_string(),
            "Variable 'y' not declared"
        );
    }

    #[test]
    fn test_methods_bind_self() {
        let source = r#"
            struct Counter {
                count: int32;
                def doubled() -> int32 { return self.count * 2; }
            }
            let c: Counter;
            c.count = 21;
            print(c.doubled());
        "#;
        assert_eq!(output_of(source), "42\n");
        let (result, _, _) = run("struct S { a: int8; } let s: S; s.missing();");
        assert!(matches!(result, Err(Error::UndefinedMethod { .. })));
    }

    #[test]
    fn test_struct_literal_and_nested_assignment() {
        let source = r#"
            struct Inner { v: int32; }
            struct Outer { inner: Inner; tag: int8; }
            let o: Outer;
            o.inner.v = 4.9;
            print(o);
            let i: Inner = Inner { v: 8 };
            print(i.v);
        "#;
        assert_eq!(
            output_of(source),
            "Outer { inner: Inner { v: 4 }, tag: 0 }\n8\n"
        );
        let (result, _, _) = run("struct P { x: int32; } let p: P; p.z = 1;");
        assert!(matches!(result, Err(Error::MissingField { .. })));
    }

    #[test]
    fn test_try_binds_message() {
        let source = r#"
            try { let x: int32 = 1 / 0; } catch { print(e); }
            try { nothing(); }
            print("after");
        "#;
        assert_eq!(output_of(source), "Division by zero\nafter\n");
    }

    #[test]
    fn test_call_depth_limit() {
        let config = InterpreterConfig::default().with_max_call_depth(8);
        let (result, _, _) = run_with("def f(n: int32) -> int32 { return f(n + 1); } f(0);", config);
        assert_eq!(result.unwrap_err(), Error::CallDepthExceeded { limit: 8 });
    }

    #[test]
    fn test_report_names_failing_statement() {
        let (result, _, interpreter) = run("let a: int32 = 1;\nlet x: int32 = a / 0;");
        let err = result.unwrap_err();
        assert_eq!(
            interpreter.report(&err),
            "error at 2 (let x: int32 = (a / 0)): Division by zero"
        );
    }

    #[test]
    fn test_builtins_see_heap() {
        assert_eq!(
            output_of("let a: int64; let b: char; print(gravox_heapusage(), gravox_heapsize());"),
            "9 1024\n"
        );
    }
}
