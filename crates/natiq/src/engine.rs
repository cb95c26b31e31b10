//! The tree-walking evaluator (SPEC_FULL §3, §4.E/F).
//!
//! Grounded on the teacher's `Engine::eval_stmt`/`eval_expr` split in
//! `engine.rs`, but with the teacher's lexical-closure call frames replaced
//! by the whole-environment swap spec.md §3/§9 requires: a call installs a
//! fresh [`Scope`], runs the body against it, then restores the caller's
//! scope unconditionally.

use crate::ast::{BinaryOp, Block, Expr, ExprKind, Literal, Program, Stmt, StmtKind, UnaryOp};
use crate::builtins::{core_library, host_facades, host_tag};
use crate::error::{EvalError, Error, Flow, Signal};
use crate::scope::Scope;
use crate::token::Position;
use crate::value::{Callable, Number, Text, Value};
use ahash::AHashMap;
use smallvec::SmallVec;
use std::io::Write;
use std::rc::Rc;

/// Call-argument lists are almost always short; `SmallVec` avoids a heap
/// allocation for the common case, matching the teacher's `fn_call.rs`.
type Args = SmallVec<[Value; 4]>;

type EResult<T> = Result<T, Flow>;

/// One interpreter instance: the live environment, the process-global
/// function table, the built-in library, and the stream `print`/`print-line`
/// write to. Re-used across lines in the CLI's REPL so top-level bindings
/// persist between inputs (spec.md §6).
pub struct Engine {
    scope: Scope,
    functions: AHashMap<String, crate::ast::SharedFunctionDef>,
    builtins: AHashMap<&'static str, Callable>,
    output: Box<dyn Write>,
    current_position: Position,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self::with_output(Box::new(std::io::stdout()))
    }

    /// Build an engine that writes `print`/`print-line` output to a custom
    /// sink - used by tests that need to assert on program output instead
    /// of inheriting the process's real stdout.
    #[must_use]
    pub fn with_output(output: Box<dyn Write>) -> Self {
        let mut builtins = AHashMap::default();
        for (name, callable) in core_library().into_iter().chain(host_facades()) {
            builtins.insert(name, callable);
        }
        Self {
            scope: Scope::new(),
            functions: AHashMap::default(),
            builtins,
            output,
            current_position: Position::START,
        }
    }

    /// Lex, parse, and evaluate a complete source string against this
    /// engine's current state (top-level variables and functions persist
    /// across calls, matching the CLI's REPL mode).
    pub fn run_source(&mut self, source: &str) -> Result<(), Error> {
        tracing::debug!(bytes = source.len(), "lexing");
        let tokens = crate::token::Lexer::new(source)
            .tokenize()
            .map_err(|(err, pos)| Error::lex(err, pos))?;

        tracing::debug!(tokens = tokens.len(), "parsing");
        let program = crate::parse::Parser::new(tokens)
            .parse_program()
            .map_err(|(err, pos)| Error::parse(err, pos))?;

        tracing::debug!(statements = program.statements.len(), "evaluating");
        self.eval_program(&program).map_err(|flow| self.flow_to_error(flow))
    }

    fn flow_to_error(&self, flow: Flow) -> Error {
        match flow {
            Flow::Error(err) => Error::eval(err, self.current_position),
            Flow::Signal(_) => Error::eval(
                EvalError::Internal("break/return/continue escaped the program".to_string()),
                self.current_position,
            ),
        }
    }

    fn eval_program(&mut self, program: &Program) -> EResult<()> {
        for stmt in &program.statements {
            self.eval_stmt(stmt)?;
        }
        Ok(())
    }

    fn eval_block(&mut self, block: &Block) -> EResult<()> {
        for stmt in &block.statements {
            self.eval_stmt(stmt)?;
        }
        Ok(())
    }

    fn eval_stmt(&mut self, stmt: &Stmt) -> EResult<()> {
        self.current_position = stmt.position;
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.eval_expr(expr)?;
                Ok(())
            }
            StmtKind::Assign { name, value } => {
                if self.scope.is_constant(name) {
                    return Err(EvalError::CannotModifyConstant(name.clone()).into());
                }
                let value = self.eval_expr(value)?;
                self.scope.assign(name.clone(), value);
                Ok(())
            }
            StmtKind::VarDecl { name, init, is_const } => {
                if self.scope.is_declared(name) {
                    return Err(EvalError::AlreadyDefined(name.clone()).into());
                }
                let value = match init {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Null,
                };
                self.scope.declare(name.clone(), value, *is_const);
                Ok(())
            }
            StmtKind::Print { value, trailing_newline } => {
                let value = self.eval_expr(value)?;
                let rendered = value.display();
                if *trailing_newline {
                    writeln!(self.output, "{rendered}")
                } else {
                    write!(self.output, "{rendered}")
                }
                .map_err(|e| EvalError::Internal(format!("write failed: {e}")))?;
                Ok(())
            }
            StmtKind::If { condition, then_block, else_block } => {
                if self.eval_expr(condition)?.is_truthy() {
                    self.eval_block(then_block)
                } else if let Some(else_block) = else_block {
                    self.eval_block(else_block)
                } else {
                    Ok(())
                }
            }
            StmtKind::While { condition, body } => {
                while self.eval_expr(condition)?.is_truthy() {
                    match self.eval_block(body) {
                        Ok(()) => {}
                        Err(Flow::Signal(Signal::Break)) => break,
                        Err(Flow::Signal(Signal::Continue)) => continue,
                        Err(other) => return Err(other),
                    }
                }
                Ok(())
            }
            StmtKind::For { variable, iterable, body } => {
                let iterable = self.eval_expr(iterable)?;
                let items = self.iterate(&iterable)?;
                for item in items {
                    self.scope.assign(variable.clone(), item);
                    match self.eval_block(body) {
                        Ok(()) => {}
                        Err(Flow::Signal(Signal::Break)) => break,
                        Err(Flow::Signal(Signal::Continue)) => continue,
                        Err(other) => return Err(other),
                    }
                }
                Ok(())
            }
            StmtKind::FunctionDef(def) => {
                self.functions.insert(def.name.clone(), def.clone());
                Ok(())
            }
            StmtKind::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Null,
                };
                Err(Flow::Signal(Signal::Return(value)))
            }
            StmtKind::Break => Err(Flow::Signal(Signal::Break)),
            StmtKind::Continue => Err(Flow::Signal(Signal::Continue)),
        }
    }

    /// Materialize a `for`-loop's source into the sequence of values it
    /// binds the loop variable to in turn (spec.md §4.D): an integer Number
    /// counts `0..n`, List/Text/Object each walk their own elements.
    fn iterate(&self, value: &Value) -> Result<Vec<Value>, Flow> {
        match value {
            Value::Number(n) => {
                let n = match n {
                    Number::Int(n) => *n,
                    Number::Float(f) => *f as i64,
                };
                Ok((0..n.max(0)).map(Value::int).collect())
            }
            Value::List(items) => Ok(items.borrow().clone()),
            Value::Text(s) => Ok(s.chars().map(|c| Value::text(c.to_string())).collect()),
            Value::Object(map) => {
                Ok(map.borrow().keys().map(|k| Value::Text(k.clone())).collect())
            }
            other => Err(EvalError::NotIterable(other.type_name().to_string()).into()),
        }
    }

    fn eval_expr(&mut self, expr: &Expr) -> EResult<Value> {
        self.current_position = expr.position;
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(Self::eval_literal(lit)),
            ExprKind::Identifier(name) => self.lookup(name),
            ExprKind::Binary { op: BinaryOp::Or, left, right } => {
                let left = self.eval_expr(left)?;
                if left.is_truthy() {
                    Ok(left)
                } else {
                    self.eval_expr(right)
                }
            }
            ExprKind::Binary { op: BinaryOp::And, left, right } => {
                let left = self.eval_expr(left)?;
                if !left.is_truthy() {
                    Ok(left)
                } else {
                    self.eval_expr(right)
                }
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.eval_expr(left)?;
                let right = self.eval_expr(right)?;
                Ok(Self::apply_binary(*op, left, right)?)
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.eval_expr(operand)?;
                Ok(Self::apply_unary(*op, operand)?)
            }
            ExprKind::Call { callee, args } => {
                let callee_value = self.eval_expr(callee)?;
                let Value::Function(callable) = callee_value else {
                    return Err(EvalError::NotCallable(callee_value.type_name().to_string()).into());
                };
                let mut arg_values: Args = SmallVec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.eval_expr(arg)?);
                }
                self.call(callable, arg_values)
            }
            ExprKind::Index { collection, index } => {
                let collection = self.eval_expr(collection)?;
                let index = self.eval_expr(index)?;
                Ok(Self::apply_index(collection, index)?)
            }
            ExprKind::Property { object, name } => {
                let object = self.eval_expr(object)?;
                Self::apply_property(object, name)
            }
            ExprKind::List(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.eval_expr(element)?);
                }
                Ok(Value::list(items))
            }
            ExprKind::Object(entries) => {
                let mut map = indexmap::IndexMap::new();
                for (key, value_expr) in entries {
                    let value = self.eval_expr(value_expr)?;
                    map.insert(Text::from(key.as_str()), value);
                }
                Ok(Value::object(map))
            }
        }
    }

    fn eval_literal(lit: &Literal) -> Value {
        match lit {
            Literal::Int(n) => Value::int(*n),
            Literal::Float(n) => Value::float(*n),
            Literal::Text(s) => Value::text(s.as_str()),
            Literal::Boolean(b) => Value::Boolean(*b),
            Literal::Null => Value::Null,
        }
    }

    /// Resolution order per spec.md §3: the live environment first, then
    /// the built-in library, then user-defined functions.
    fn lookup(&self, name: &str) -> EResult<Value> {
        if let Some(value) = self.scope.get(name) {
            return Ok(value.clone());
        }
        if let Some(callable) = self.builtins.get(name) {
            return Ok(Value::Function(callable.clone()));
        }
        if let Some(def) = self.functions.get(name) {
            return Ok(Value::Function(Callable::User(def.clone())));
        }
        Err(EvalError::UndefinedVariable(name.to_string()).into())
    }

    fn call(&mut self, callable: Callable, args: Args) -> EResult<Value> {
        match callable {
            Callable::Builtin(_, f) => f(&args).map_err(Flow::Error),
            Callable::User(def) => self.call_user_function(&def, args),
        }
    }

    /// Install a fresh, empty frame holding only the parameter bindings
    /// (extra arguments ignored, missing ones left unbound), run the body,
    /// then restore the caller's frame regardless of how the body returned -
    /// the whole-environment swap of spec.md §3/§9 in place of closures.
    fn call_user_function(
        &mut self,
        def: &crate::ast::SharedFunctionDef,
        args: Args,
    ) -> EResult<Value> {
        let caller_scope = self.scope.swap_fresh();
        for (param, value) in def.params.iter().zip(args) {
            self.scope.assign(param.clone(), value);
        }
        let body_result = self.eval_block(&def.body);
        self.scope.restore(caller_scope);

        match body_result {
            Ok(()) => Ok(Value::Null),
            Err(Flow::Signal(Signal::Return(value))) => Ok(value),
            Err(Flow::Signal(Signal::Break | Signal::Continue)) => Err(EvalError::Internal(
                "break/continue escaped the enclosing loop".to_string(),
            )
            .into()),
            Err(other @ Flow::Error(_)) => Err(other),
        }
    }

    fn apply_unary(op: UnaryOp, operand: Value) -> Result<Value, EvalError> {
        match op {
            UnaryOp::Not => Ok(Value::Boolean(!operand.is_truthy())),
            UnaryOp::Neg => match operand {
                Value::Number(Number::Int(n)) => Ok(Value::int(-n)),
                Value::Number(Number::Float(n)) => Ok(Value::float(-n)),
                other => Err(EvalError::TypeMismatch {
                    op: "-".to_string(),
                    lhs: other.type_name().to_string(),
                    rhs: String::new(),
                }),
            },
        }
    }

    fn apply_binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
        match op {
            BinaryOp::Eq => Ok(Value::Boolean(values_equal(&left, &right))),
            BinaryOp::NotEq => Ok(Value::Boolean(!values_equal(&left, &right))),
            BinaryOp::Add => match (left, right) {
                (Value::Number(a), Value::Number(b)) => {
                    Ok(Value::Number(a.apply(b, |a, b| a.checked_add(b), |a, b| a + b)?))
                }
                (Value::Text(a), Value::Text(b)) => {
                    let mut out = a;
                    out.push_str(&b);
                    Ok(Value::Text(out))
                }
                (a, b) => Err(type_mismatch("+", &a, &b)),
            },
            BinaryOp::Sub => arithmetic("-", left, right, |a, b| a.checked_sub(b), |a, b| a - b),
            BinaryOp::Mul => arithmetic("*", left, right, |a, b| a.checked_mul(b), |a, b| a * b),
            BinaryOp::Div => match (left, right) {
                (Value::Number(a), Value::Number(b)) => {
                    if b.is_zero() {
                        return Err(EvalError::DivisionByZero);
                    }
                    Ok(Value::Number(a.apply(
                        b,
                        |a, b| a.checked_div(b),
                        |a, b| a / b,
                    )?))
                }
                (a, b) => Err(type_mismatch("/", &a, &b)),
            },
            BinaryOp::Mod => match (left, right) {
                (Value::Number(a), Value::Number(b)) => {
                    if b.is_zero() {
                        return Err(EvalError::DivisionByZero);
                    }
                    Ok(Value::Number(a.apply(
                        b,
                        |a, b| a.checked_rem(b),
                        |a, b| a % b,
                    )?))
                }
                (a, b) => Err(type_mismatch("%", &a, &b)),
            },
            BinaryOp::Pow => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(pow(a, b))),
                (a, b) => Err(type_mismatch("**", &a, &b)),
            },
            BinaryOp::Greater | BinaryOp::Less | BinaryOp::GreaterEq | BinaryOp::LessEq => {
                compare(op, &left, &right)
            }
            BinaryOp::And | BinaryOp::Or => {
                unreachable!("short-circuit operators are handled in eval_expr")
            }
        }
    }

    fn apply_index(collection: Value, index: Value) -> Result<Value, EvalError> {
        match collection {
            Value::List(items) => {
                let items = items.borrow();
                let i = index_to_isize(&index)?;
                items
                    .get(usize::try_from(i).unwrap_or(usize::MAX))
                    .cloned()
                    .ok_or(EvalError::IndexOutOfRange { len: items.len(), index: i as i64 })
            }
            Value::Text(s) => {
                let chars: Vec<char> = s.chars().collect();
                let i = index_to_isize(&index)?;
                chars
                    .get(usize::try_from(i).unwrap_or(usize::MAX))
                    .map(|c| Value::text(c.to_string()))
                    .ok_or(EvalError::IndexOutOfRange { len: chars.len(), index: i as i64 })
            }
            Value::Object(map) => {
                let Value::Text(key) = index else {
                    return Err(EvalError::TypeMismatch {
                        op: "[]".to_string(),
                        lhs: "كائن".to_string(),
                        rhs: index.type_name().to_string(),
                    });
                };
                map.borrow()
                    .get(key.as_str())
                    .cloned()
                    .ok_or_else(|| EvalError::MissingKey(key.to_string()))
            }
            other => Err(EvalError::NotIndexable(other.type_name().to_string())),
        }
    }

    /// Property-access differs from indexing in exactly one way: a missing
    /// Object key returns `عدم` instead of erroring (spec.md §4.D).
    fn apply_property(object: Value, name: &str) -> EResult<Value> {
        match object {
            Value::Object(map) => {
                let map_ref = map.borrow();
                if let Some(host_name) = host_tag(&map_ref) {
                    return Err(EvalError::HostUnavailable(host_name).into());
                }
                Ok(map_ref.get(name).cloned().unwrap_or(Value::Null))
            }
            other => Err(EvalError::NotIndexable(other.type_name().to_string()).into()),
        }
    }
}

fn type_mismatch(op: &str, lhs: &Value, rhs: &Value) -> EvalError {
    EvalError::TypeMismatch {
        op: op.to_string(),
        lhs: lhs.type_name().to_string(),
        rhs: rhs.type_name().to_string(),
    }
}

fn arithmetic(
    op: &str,
    left: Value,
    right: Value,
    int_op: impl Fn(i64, i64) -> Option<i64>,
    float_op: impl Fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.apply(b, int_op, float_op)?)),
        (a, b) => Err(type_mismatch(op, &a, &b)),
    }
}

fn pow(base: Number, exponent: Number) -> Number {
    if let (Number::Int(b), Number::Int(e)) = (base, exponent) {
        if let Ok(e) = u32::try_from(e) {
            if let Some(result) = b.checked_pow(e) {
                return Number::Int(result);
            }
        }
    }
    Number::Float(base.as_f64().powf(exponent.as_f64()))
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let ordering = match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            a.as_f64().partial_cmp(&b.as_f64()).ok_or_else(|| type_mismatch("<>", left, right))?
        }
        (Value::Text(a), Value::Text(b)) => a.cmp(b),
        _ => return Err(type_mismatch("<>", left, right)),
    };
    let result = match op {
        BinaryOp::Greater => ordering.is_gt(),
        BinaryOp::Less => ordering.is_lt(),
        BinaryOp::GreaterEq => ordering.is_ge(),
        BinaryOp::LessEq => ordering.is_le(),
        _ => unreachable!(),
    };
    Ok(Value::Boolean(result))
}

fn index_to_isize(index: &Value) -> Result<isize, EvalError> {
    match index {
        Value::Number(Number::Int(n)) => Ok(*n as isize),
        Value::Number(Number::Float(f)) => Ok(*f as isize),
        other => Err(EvalError::TypeMismatch {
            op: "[]".to_string(),
            lhs: "قائمة".to_string(),
            rhs: other.type_name().to_string(),
        }),
    }
}

/// Structural equality for `==`/`!=`. Functions compare by identity of their
/// pointer since closures have no notion of structural equality.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Text(a), Value::Text(b)) => a == b,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::Null, Value::Null) => true,
        (Value::List(a), Value::List(b)) => {
            Rc::ptr_eq(a, b) || {
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y))
            }
        }
        (Value::Object(a), Value::Object(b)) => {
            Rc::ptr_eq(a, b) || {
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                    && a.iter().all(|(k, v)| b.get(k).is_some_and(|bv| values_equal(v, bv)))
            }
        }
        (Value::Function(Callable::User(a)), Value::Function(Callable::User(b))) => {
            Rc::ptr_eq(a, b)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> (Engine, String) {
        let buffer = Rc::new(std::cell::RefCell::new(Vec::new()));
        struct SharedWriter(Rc<std::cell::RefCell<Vec<u8>>>);
        impl Write for SharedWriter {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.borrow_mut().write(buf)
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        let mut engine = Engine::with_output(Box::new(SharedWriter(buffer.clone())));
        engine.run_source(source).expect("program should evaluate");
        let output = String::from_utf8(buffer.borrow().clone()).unwrap();
        (engine, output)
    }

    #[test]
    fn prints_arithmetic_result() {
        let (_, output) = run("اطبع_سطر(1 + 2 * 3)");
        assert_eq!(output, "7\n");
    }

    #[test]
    fn power_is_right_associative_at_runtime() {
        let (_, output) = run("اطبع_سطر(2 ** 3 ** 2)");
        assert_eq!(output, "512\n");
    }

    #[test]
    fn const_reassignment_is_rejected() {
        let mut engine = Engine::with_output(Box::new(std::io::sink()));
        let err = engine.run_source("ثابت س = 1\nس = 2").unwrap_err();
        assert!(matches!(err.kind, crate::error::ErrorKind::Eval(EvalError::CannotModifyConstant(_))));
    }

    #[test]
    fn function_call_does_not_see_caller_locals() {
        let mut engine = Engine::with_output(Box::new(std::io::sink()));
        let err = engine
            .run_source("متغير م = 1\nدالة خذ() { ارجع م }\nخذ()")
            .unwrap_err();
        assert!(matches!(err.kind, crate::error::ErrorKind::Eval(EvalError::UndefinedVariable(_))));
    }

    #[test]
    fn short_circuit_or_returns_left_operand_unboxed() {
        let (_, output) = run("اطبع_سطر(5 او (1 / 0))");
        assert_eq!(output, "5\n");
    }

    #[test]
    fn for_loop_over_range_binds_outer_scope() {
        let (_, output) = run("متغير مجموع = 0\nلكل ع في مدى(4) { مجموع = مجموع + ع }\nاطبع_سطر(مجموع)");
        assert_eq!(output, "6\n");
    }

    #[test]
    fn property_access_on_missing_key_is_null_but_index_errors() {
        let mut engine = Engine::with_output(Box::new(std::io::sink()));
        engine.run_source("متغير ك = {}\nمتغير ن = ك.غائب").unwrap();
        let err = engine.run_source("ك[\"غائب\"]").unwrap_err();
        assert!(matches!(err.kind, crate::error::ErrorKind::Eval(EvalError::MissingKey(_))));
    }
}
