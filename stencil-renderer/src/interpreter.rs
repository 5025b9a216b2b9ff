//! Tree-walking interpreter for compiled programs.
//!
//! Variables live in one flat scope. `var` names are hoisted to `undefined`
//! before the first statement runs, except names the context already has:
//! those keep reading the context field until first assigned. A bare name
//! resolves to a local first and then to a property of the render context;
//! `this` is the context itself.

use std::collections::HashMap;

use crate::ast::*;
use crate::error::ExecError;
use crate::value::{parse_number, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Normal,
    Break,
    Continue,
}

type ExecResult<T> = Result<T, ExecError>;

/// Run `program` against `this` and return the accumulated output.
///
/// `max_iterations` bounds the total number of loop iterations across the
/// whole run.
pub fn execute(program: &Program, this: &Value, max_iterations: u64) -> ExecResult<String> {
    let mut interpreter = Interpreter::new(this, max_iterations);
    for name in program.declared_names() {
        if !this.has_property(name) {
            interpreter.locals.insert(name.to_string(), Value::Undefined);
        }
    }
    for stmt in &program.body {
        // Stray break/continue are rejected by the parser.
        interpreter.exec(stmt)?;
    }
    tracing::trace!(
        iterations = interpreter.iterations,
        bytes = interpreter.out.len(),
        "executed program"
    );
    Ok(interpreter.out)
}

struct Interpreter<'a> {
    this: &'a Value,
    locals: HashMap<String, Value>,
    out: String,
    iterations: u64,
    max_iterations: u64,
}

impl<'a> Interpreter<'a> {
    fn new(this: &'a Value, max_iterations: u64) -> Self {
        Self {
            this,
            locals: HashMap::new(),
            out: String::new(),
            iterations: 0,
            max_iterations,
        }
    }

    fn tick(&mut self) -> ExecResult<()> {
        self.iterations += 1;
        if self.iterations > self.max_iterations {
            return Err(ExecError::IterationLimit {
                limit: self.max_iterations,
            });
        }
        Ok(())
    }

    // ==================== STATEMENTS ====================

    fn exec(&mut self, stmt: &Stmt) -> ExecResult<Flow> {
        match stmt {
            Stmt::Text(text) => self.out.push_str(text),
            Stmt::Print(exprs) => {
                for expr in exprs {
                    let value = self.eval(expr)?;
                    self.out.push_str(&value.to_output());
                }
            }
            Stmt::Expr(expr) => {
                self.eval(expr)?;
            }
            Stmt::VarDecl(decls) => {
                for (name, init) in decls {
                    if let Some(init) = init {
                        let value = self.eval(init)?;
                        self.locals.insert(name.clone(), value);
                    }
                }
            }
            Stmt::Block(body) => return self.exec_all(body),
            Stmt::If {
                test,
                then,
                otherwise,
            } => {
                if self.eval(test)?.is_truthy() {
                    return self.exec(then);
                } else if let Some(otherwise) = otherwise {
                    return self.exec(otherwise);
                }
            }
            Stmt::For {
                init,
                test,
                update,
                body,
            } => {
                if let Some(init) = init {
                    self.exec(init)?;
                }
                loop {
                    if let Some(test) = test {
                        if !self.eval(test)?.is_truthy() {
                            break;
                        }
                    }
                    self.tick()?;
                    if self.exec(body)? == Flow::Break {
                        break;
                    }
                    if let Some(update) = update {
                        self.eval(update)?;
                    }
                }
            }
            Stmt::ForIn {
                binding,
                object,
                body,
                ..
            } => {
                let object = self.eval(object)?;
                for key in object.keys() {
                    self.tick()?;
                    self.locals.insert(binding.clone(), Value::String(key));
                    if self.exec(body)? == Flow::Break {
                        break;
                    }
                }
            }
            Stmt::While { test, body } => {
                while self.eval(test)?.is_truthy() {
                    self.tick()?;
                    if self.exec(body)? == Flow::Break {
                        break;
                    }
                }
            }
            Stmt::DoWhile { body, test } => loop {
                self.tick()?;
                if self.exec(body)? == Flow::Break || !self.eval(test)?.is_truthy() {
                    break;
                }
            },
            Stmt::Switch {
                discriminant,
                cases,
            } => return self.exec_switch(discriminant, cases),
            Stmt::Break => return Ok(Flow::Break),
            Stmt::Continue => return Ok(Flow::Continue),
            Stmt::Empty => {}
        }
        Ok(Flow::Normal)
    }

    fn exec_all(&mut self, body: &[Stmt]) -> ExecResult<Flow> {
        for stmt in body {
            let flow = self.exec(stmt)?;
            if flow != Flow::Normal {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    /// Matching uses `===`. Execution starts at the matching case (or
    /// `default`) and falls through until `break`.
    fn exec_switch(&mut self, discriminant: &Expr, cases: &[SwitchCase]) -> ExecResult<Flow> {
        let value = self.eval(discriminant)?;

        let mut start = None;
        for (i, case) in cases.iter().enumerate() {
            if let Some(test) = &case.test {
                if self.eval(test)?.strict_eq(&value) {
                    start = Some(i);
                    break;
                }
            }
        }
        let Some(start) = start.or_else(|| cases.iter().position(|c| c.test.is_none())) else {
            return Ok(Flow::Normal);
        };

        for case in &cases[start..] {
            match self.exec_all(&case.body)? {
                Flow::Normal => {}
                Flow::Break => return Ok(Flow::Normal),
                Flow::Continue => return Ok(Flow::Continue),
            }
        }
        Ok(Flow::Normal)
    }

    // ==================== EXPRESSIONS ====================

    fn lookup(&self, name: &str) -> ExecResult<Value> {
        if let Some(value) = self.locals.get(name) {
            return Ok(value.clone());
        }
        if self.this.has_property(name) {
            return self.this.get_property(name);
        }
        Err(ExecError::NotDefined {
            name: name.to_string(),
        })
    }

    fn is_bound(&self, name: &str) -> bool {
        self.locals.contains_key(name) || self.this.has_property(name)
    }

    fn eval(&mut self, expr: &Expr) -> ExecResult<Value> {
        let value = match expr {
            Expr::Number(n) => Value::Number(*n),
            Expr::Str(s) => Value::String(s.clone()),
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Null => Value::Null,
            Expr::Undefined => Value::Undefined,
            Expr::Array(items) => {
                let items = items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<ExecResult<Vec<_>>>()?;
                Value::from(items)
            }
            Expr::Ident(name) => self.lookup(name)?,
            Expr::This => self.this.clone(),
            Expr::Member { object, property } => self.eval(object)?.get_property(property)?,
            Expr::Index { object, index } => {
                let object = self.eval(object)?;
                let index = self.eval(index)?;
                object.get_index(&index)?
            }
            Expr::Call { callee, args } => self.eval_call(callee, args)?,
            Expr::Unary { op, operand } => match op {
                UnaryOp::Typeof => match &**operand {
                    Expr::Ident(name) if !self.is_bound(name) => Value::from("undefined"),
                    operand => Value::from(self.eval(operand)?.type_of()),
                },
                UnaryOp::Not => Value::Bool(!self.eval(operand)?.is_truthy()),
                UnaryOp::Neg => Value::Number(-self.eval(operand)?.to_number()),
                UnaryOp::Plus => Value::Number(self.eval(operand)?.to_number()),
            },
            Expr::Update { op, prefix, target } => {
                let old = self.lookup(target)?.to_number();
                let new = match op {
                    UpdateOp::Increment => old + 1.0,
                    UpdateOp::Decrement => old - 1.0,
                };
                self.locals.insert(target.clone(), Value::Number(new));
                Value::Number(if *prefix { new } else { old })
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                binary(*op, &lhs, &rhs)
            }
            Expr::Logical { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                match (op, lhs.is_truthy()) {
                    (LogicalOp::And, false) | (LogicalOp::Or, true) => lhs,
                    _ => self.eval(rhs)?,
                }
            }
            Expr::Conditional {
                test,
                then,
                otherwise,
            } => {
                if self.eval(test)?.is_truthy() {
                    self.eval(then)?
                } else {
                    self.eval(otherwise)?
                }
            }
            Expr::Assign { op, target, value } => {
                let value = match op {
                    AssignOp::Assign => self.eval(value)?,
                    AssignOp::Compound(op) => {
                        let current = self.lookup(target)?;
                        let rhs = self.eval(value)?;
                        binary(*op, &current, &rhs)
                    }
                };
                self.locals.insert(target.clone(), value.clone());
                value
            }
            Expr::Sequence(items) => {
                let mut last = Value::Undefined;
                for item in items {
                    last = self.eval(item)?;
                }
                last
            }
        };
        Ok(value)
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr]) -> ExecResult<Value> {
        match callee {
            Expr::Member { object, property } => {
                if let Expr::Ident(name) = &**object {
                    if name == "Math" && !self.is_bound(name) {
                        let args = self.eval_args(args)?;
                        return call_math(property, &args);
                    }
                }
                let receiver = self.eval(object)?;
                let args = self.eval_args(args)?;
                receiver.call_method(property, &args)
            }
            Expr::Index { object, index } => {
                let receiver = self.eval(object)?;
                let method = self.eval(index)?.to_display();
                let args = self.eval_args(args)?;
                receiver.call_method(&method, &args)
            }
            Expr::Ident(name) if !self.is_bound(name) => {
                let args = self.eval_args(args)?;
                call_global(name, &args)
            }
            other => Err(ExecError::NotAFunction {
                callee: other.to_string(),
            }),
        }
    }

    fn eval_args(&mut self, args: &[Expr]) -> ExecResult<Vec<Value>> {
        args.iter().map(|arg| self.eval(arg)).collect()
    }
}

fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
    use std::cmp::Ordering::*;

    let numeric = |f: fn(f64, f64) -> f64| Value::Number(f(lhs.to_number(), rhs.to_number()));
    match op {
        BinaryOp::Add => lhs.add(rhs),
        BinaryOp::Sub => numeric(|a, b| a - b),
        BinaryOp::Mul => numeric(|a, b| a * b),
        BinaryOp::Div => numeric(|a, b| a / b),
        BinaryOp::Rem => numeric(|a, b| a % b),
        BinaryOp::Lt => Value::Bool(matches!(lhs.compare(rhs), Some(Less))),
        BinaryOp::LtEq => Value::Bool(matches!(lhs.compare(rhs), Some(Less | Equal))),
        BinaryOp::Gt => Value::Bool(matches!(lhs.compare(rhs), Some(Greater))),
        BinaryOp::GtEq => Value::Bool(matches!(lhs.compare(rhs), Some(Greater | Equal))),
        BinaryOp::Eq => Value::Bool(lhs.loose_eq(rhs)),
        BinaryOp::NotEq => Value::Bool(!lhs.loose_eq(rhs)),
        BinaryOp::StrictEq => Value::Bool(lhs.strict_eq(rhs)),
        BinaryOp::StrictNotEq => Value::Bool(!lhs.strict_eq(rhs)),
    }
}

/// Free functions available when the name is not shadowed.
fn call_global(name: &str, args: &[Value]) -> ExecResult<Value> {
    let arg = args.first().cloned().unwrap_or_default();
    let value = match name {
        "String" => Value::String(if args.is_empty() {
            String::new()
        } else {
            arg.to_display()
        }),
        "Number" => Value::Number(if args.is_empty() { 0.0 } else { arg.to_number() }),
        "Boolean" => Value::Bool(arg.is_truthy()),
        "isNaN" => Value::Bool(arg.to_number().is_nan()),
        "parseFloat" => Value::Number(parse_leading_float(&arg.to_display())),
        "parseInt" => Value::Number(parse_leading_int(&arg.to_display())),
        _ => {
            return Err(ExecError::NotDefined {
                name: name.to_string(),
            })
        }
    };
    Ok(value)
}

fn call_math(name: &str, args: &[Value]) -> ExecResult<Value> {
    let nums: Vec<f64> = args.iter().map(Value::to_number).collect();
    let first = nums.first().copied().unwrap_or(f64::NAN);
    let n = match name {
        "floor" => first.floor(),
        "ceil" => first.ceil(),
        // Halves round towards +∞.
        "round" => (first + 0.5).floor(),
        "abs" => first.abs(),
        "max" => nums.iter().copied().fold(f64::NEG_INFINITY, |acc, n| {
            if acc.is_nan() || n.is_nan() {
                f64::NAN
            } else {
                acc.max(n)
            }
        }),
        "min" => nums.iter().copied().fold(f64::INFINITY, |acc, n| {
            if acc.is_nan() || n.is_nan() {
                f64::NAN
            } else {
                acc.min(n)
            }
        }),
        _ => {
            return Err(ExecError::NotAFunction {
                callee: format!("Math.{name}"),
            })
        }
    };
    Ok(Value::Number(n))
}

/// Longest numeric prefix, after leading whitespace.
fn parse_leading_float(s: &str) -> f64 {
    let s = s.trim_start();
    // A sign may lead the number or follow the exponent marker.
    let mut end = 0;
    let mut prev = None;
    for c in s.chars() {
        let sign_allowed = end == 0 || matches!(prev, Some('e' | 'E'));
        if c.is_ascii_digit()
            || matches!(c, '.' | 'e' | 'E')
            || (sign_allowed && matches!(c, '+' | '-'))
        {
            end += 1;
            prev = Some(c);
        } else {
            break;
        }
    }
    if let Some(n) = (1..=end).rev().find_map(|len| s[..len].parse::<f64>().ok()) {
        n
    } else if s.starts_with("Infinity") || s.starts_with("+Infinity") {
        f64::INFINITY
    } else if s.starts_with("-Infinity") {
        f64::NEG_INFINITY
    } else {
        f64::NAN
    }
}

fn parse_leading_int(s: &str) -> f64 {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, s.strip_prefix('+').unwrap_or(s)),
    };
    let (radix, digits) = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => (16, hex),
        None => (10, digits),
    };
    let prefix: String = digits.chars().take_while(|c| c.is_digit(radix)).collect();
    if prefix.is_empty() {
        return f64::NAN;
    }
    let value = if radix == 10 {
        parse_number(&prefix)
    } else {
        u64::from_str_radix(&prefix, radix).map_or(f64::NAN, |v| v as f64)
    };
    sign * value
}
