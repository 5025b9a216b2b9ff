//! Compiled program representation.
//!
//! A [`Program`] is the tagged-variant tree produced from one template body.
//! Its `Display` impl prints the equivalent script (accumulator preamble,
//! one `out.push(...)` per emission, raw statements in between) and is what
//! failure diagnostics log.

use std::fmt::{self, Write as _};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    Typeof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

/// `=` or a compound assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Compound(BinaryOp),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    Undefined,
    Array(Vec<Expr>),
    Ident(String),
    This,
    Member {
        object: Box<Expr>,
        property: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Update {
        op: UpdateOp,
        prefix: bool,
        target: String,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: String,
        value: Box<Expr>,
    },
    Sequence(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// `None` for `default:`.
    pub test: Option<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Append literal template text.
    Text(String),
    /// Append the value of each expression, in order.
    Print(Vec<Expr>),
    Expr(Expr),
    VarDecl(Vec<(String, Option<Expr>)>),
    Block(Vec<Stmt>),
    If {
        test: Expr,
        then: Box<Stmt>,
        otherwise: Option<Box<Stmt>>,
    },
    For {
        init: Option<Box<Stmt>>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    ForIn {
        binding: String,
        declare: bool,
        object: Expr,
        body: Box<Stmt>,
    },
    While {
        test: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        test: Expr,
    },
    Switch {
        discriminant: Expr,
        cases: Vec<SwitchCase>,
    },
    Break,
    Continue,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub body: Vec<Stmt>,
}

impl Program {
    /// Names declared with `var` anywhere in the program.
    pub fn declared_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for stmt in &self.body {
            collect_declared(stmt, &mut names);
        }
        names.sort_unstable();
        names.dedup();
        names
    }
}

fn collect_declared<'a>(stmt: &'a Stmt, names: &mut Vec<&'a str>) {
    match stmt {
        Stmt::VarDecl(decls) => names.extend(decls.iter().map(|(name, _)| name.as_str())),
        Stmt::Block(body) => body.iter().for_each(|s| collect_declared(s, names)),
        Stmt::If {
            then, otherwise, ..
        } => {
            collect_declared(then, names);
            if let Some(otherwise) = otherwise {
                collect_declared(otherwise, names);
            }
        }
        Stmt::For { init, body, .. } => {
            if let Some(init) = init {
                collect_declared(init, names);
            }
            collect_declared(body, names);
        }
        Stmt::ForIn {
            binding,
            declare,
            body,
            ..
        } => {
            if *declare {
                names.push(binding);
            }
            collect_declared(body, names);
        }
        Stmt::While { body, .. } | Stmt::DoWhile { body, .. } => collect_declared(body, names),
        Stmt::Switch { cases, .. } => cases
            .iter()
            .flat_map(|c| c.body.iter())
            .for_each(|s| collect_declared(s, names)),
        Stmt::Text(_)
        | Stmt::Print(_)
        | Stmt::Expr(_)
        | Stmt::Break
        | Stmt::Continue
        | Stmt::Empty => {}
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "var out = [];")?;
        for stmt in &self.body {
            write_stmt(f, stmt, 0)?;
        }
        write!(f, "return out.join(\"\");")
    }
}

fn indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_str("  ")?;
    }
    Ok(())
}

/// Writes `stmt` as the body of a control statement, opening on the current line.
fn write_body(f: &mut fmt::Formatter<'_>, stmt: &Stmt, depth: usize) -> fmt::Result {
    match stmt {
        Stmt::Block(body) => {
            writeln!(f, " {{")?;
            for s in body {
                write_stmt(f, s, depth + 1)?;
            }
            indent(f, depth)?;
            f.write_char('}')
        }
        other => {
            writeln!(f)?;
            write_stmt(f, other, depth + 1)?;
            indent(f, depth)
        }
    }
}

fn write_stmt(f: &mut fmt::Formatter<'_>, stmt: &Stmt, depth: usize) -> fmt::Result {
    indent(f, depth)?;
    match stmt {
        Stmt::Text(text) => writeln!(f, "out.push({});", Quoted(text)),
        Stmt::Print(args) => writeln!(f, "out.push({});", List(args)),
        Stmt::Expr(expr) => writeln!(f, "{expr};"),
        Stmt::VarDecl(decls) => {
            f.write_str("var ")?;
            write_decls(f, decls)?;
            writeln!(f, ";")
        }
        Stmt::Block(body) => {
            writeln!(f, "{{")?;
            for s in body {
                write_stmt(f, s, depth + 1)?;
            }
            indent(f, depth)?;
            writeln!(f, "}}")
        }
        Stmt::If {
            test,
            then,
            otherwise,
        } => {
            write!(f, "if ({test})")?;
            write_body(f, then, depth)?;
            if let Some(otherwise) = otherwise {
                f.write_str(" else")?;
                write_body(f, otherwise, depth)?;
            }
            writeln!(f)
        }
        Stmt::For {
            init,
            test,
            update,
            body,
        } => {
            f.write_str("for (")?;
            match init.as_deref() {
                Some(Stmt::VarDecl(decls)) => {
                    f.write_str("var ")?;
                    write_decls(f, decls)?;
                }
                Some(Stmt::Expr(expr)) => write!(f, "{expr}")?,
                _ => {}
            }
            f.write_str("; ")?;
            if let Some(test) = test {
                write!(f, "{test}")?;
            }
            f.write_str("; ")?;
            if let Some(update) = update {
                write!(f, "{update}")?;
            }
            f.write_char(')')?;
            write_body(f, body, depth)?;
            writeln!(f)
        }
        Stmt::ForIn {
            binding,
            declare,
            object,
            body,
        } => {
            let var = if *declare { "var " } else { "" };
            write!(f, "for ({var}{binding} in {object})")?;
            write_body(f, body, depth)?;
            writeln!(f)
        }
        Stmt::While { test, body } => {
            write!(f, "while ({test})")?;
            write_body(f, body, depth)?;
            writeln!(f)
        }
        Stmt::DoWhile { body, test } => {
            f.write_str("do")?;
            write_body(f, body, depth)?;
            writeln!(f, " while ({test});")
        }
        Stmt::Switch {
            discriminant,
            cases,
        } => {
            writeln!(f, "switch ({discriminant}) {{")?;
            for case in cases {
                indent(f, depth + 1)?;
                match &case.test {
                    Some(test) => writeln!(f, "case {test}:")?,
                    None => writeln!(f, "default:")?,
                }
                for s in &case.body {
                    write_stmt(f, s, depth + 2)?;
                }
            }
            indent(f, depth)?;
            writeln!(f, "}}")
        }
        Stmt::Break => writeln!(f, "break;"),
        Stmt::Continue => writeln!(f, "continue;"),
        Stmt::Empty => writeln!(f, ";"),
    }
}

fn write_decls(f: &mut fmt::Formatter<'_>, decls: &[(String, Option<Expr>)]) -> fmt::Result {
    for (i, (name, init)) in decls.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        f.write_str(name)?;
        if let Some(init) = init {
            write!(f, " = {init}")?;
        }
    }
    Ok(())
}

/// A string literal with quotes, backslashes and control characters escaped.
struct Quoted<'a>(&'a str);

impl fmt::Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('"')?;
        for c in self.0.chars() {
            match c {
                '"' => f.write_str("\\\"")?,
                '\\' => f.write_str("\\\\")?,
                '\n' => f.write_str("\\n")?,
                '\r' => f.write_str("\\r")?,
                '\t' => f.write_str("\\t")?,
                c if c.is_control() => write!(f, "\\u{:04x}", c as u32)?,
                c => f.write_char(c)?,
            }
        }
        f.write_char('"')
    }
}

struct List<'a>(&'a [Expr]);

impl fmt::Display for List<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, expr) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{expr}")?;
        }
        Ok(())
    }
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNotEq => "!==",
        }
    }
}

/// Wraps compound operands in parentheses.
struct Operand<'a>(&'a Expr);

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Expr::Binary { .. }
            | Expr::Logical { .. }
            | Expr::Conditional { .. }
            | Expr::Assign { .. }
            | Expr::Sequence(_) => write!(f, "({})", self.0),
            other => write!(f, "{other}"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => f.write_str(&crate::value::format_number(*n)),
            Expr::Str(s) => write!(f, "{}", Quoted(s)),
            Expr::Bool(b) => write!(f, "{b}"),
            Expr::Null => f.write_str("null"),
            Expr::Undefined => f.write_str("undefined"),
            Expr::Array(items) => write!(f, "[{}]", List(items)),
            Expr::Ident(name) => f.write_str(name),
            Expr::This => f.write_str("this"),
            Expr::Member { object, property } => write!(f, "{}.{property}", Operand(object)),
            Expr::Index { object, index } => write!(f, "{}[{index}]", Operand(object)),
            Expr::Call { callee, args } => write!(f, "{}({})", Operand(callee), List(args)),
            Expr::Unary { op, operand } => {
                let sym = match op {
                    UnaryOp::Not => "!",
                    UnaryOp::Neg => "-",
                    UnaryOp::Plus => "+",
                    UnaryOp::Typeof => "typeof ",
                };
                write!(f, "{sym}{}", Operand(operand))
            }
            Expr::Update { op, prefix, target } => {
                let sym = match op {
                    UpdateOp::Increment => "++",
                    UpdateOp::Decrement => "--",
                };
                if *prefix {
                    write!(f, "{sym}{target}")
                } else {
                    write!(f, "{target}{sym}")
                }
            }
            Expr::Binary { op, lhs, rhs } => {
                write!(f, "{} {} {}", Operand(lhs), op.symbol(), Operand(rhs))
            }
            Expr::Logical { op, lhs, rhs } => {
                let sym = match op {
                    LogicalOp::And => "&&",
                    LogicalOp::Or => "||",
                };
                write!(f, "{} {sym} {}", Operand(lhs), Operand(rhs))
            }
            Expr::Conditional {
                test,
                then,
                otherwise,
            } => write!(
                f,
                "{} ? {} : {}",
                Operand(test),
                Operand(then),
                Operand(otherwise)
            ),
            Expr::Assign { op, target, value } => match op {
                AssignOp::Assign => write!(f, "{target} = {}", Operand(value)),
                AssignOp::Compound(bin) => {
                    write!(f, "{target} {}= {}", bin.symbol(), Operand(value))
                }
            },
            Expr::Sequence(items) => write!(f, "{}", List(items)),
        }
    }
}
