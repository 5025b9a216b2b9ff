//! Error types for stencil-renderer.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Byte range inside a template body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// 1-based line and column of `self.start` within `body`.
    pub fn line_col(&self, body: &str) -> (usize, usize) {
        line_col(body, self.start)
    }
}

/// 1-based line and column of byte `offset` within `body`.
pub fn line_col(body: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(body.len());
    let before = body.get(..offset).unwrap_or(body);
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map_or(before.chars().count(), |nl| before[nl + 1..].chars().count())
        + 1;
    (line, column)
}

// ---------------------------------------------------------------------------
// ParseError
// ---------------------------------------------------------------------------

/// A syntax error in directive code, with location information.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    pub line: usize,
    pub column: usize,
    pub expected: Option<String>,
    pub found: Option<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            line: 0,
            column: 0,
            expected: None,
            found: None,
        }
    }

    pub fn unexpected_token(span: Span, expected: &str, found: &str) -> Self {
        Self {
            expected: Some(expected.to_string()),
            found: Some(found.to_string()),
            ..Self::new(format!("expected {expected}, found {found}"), span)
        }
    }

    pub fn unexpected_eof(span: Span, expected: &str) -> Self {
        Self {
            expected: Some(expected.to_string()),
            found: Some("end of template".to_string()),
            ..Self::new(
                format!("unexpected end of template, expected {expected}"),
                span,
            )
        }
    }

    /// Resolve line/column against the template body the span points into.
    pub fn locate(mut self, body: &str) -> Self {
        let (line, column) = self.span.line_col(body);
        self.line = line;
        self.column = column;
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "syntax error at offset {}: {}", self.span.start, self.message)
        } else {
            write!(
                f,
                "syntax error at line {}, column {}: {}",
                self.line, self.column, self.message
            )
        }
    }
}

impl std::error::Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;

// ---------------------------------------------------------------------------
// ExecError
// ---------------------------------------------------------------------------

/// Runtime faults raised while executing a compiled program.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecError {
    /// A bare name bound neither locally nor in the render context.
    #[error("{name} is not defined")]
    NotDefined { name: String },

    /// Property read on `null` or `undefined`.
    #[error("cannot read properties of {base} (reading '{property}')")]
    NullAccess { base: &'static str, property: String },

    #[error("{callee} is not a function")]
    NotAFunction { callee: String },

    #[error("{0}")]
    Range(String),

    #[error("loop iteration limit of {limit} exceeded")]
    IterationLimit { limit: u64 },
}

// ---------------------------------------------------------------------------
// RenderError
// ---------------------------------------------------------------------------

/// Every way a render call can fail.
#[derive(Debug, Error)]
pub enum RenderError {
    /// An open marker without a matching close marker.
    #[error("unterminated directive at line {line}, column {column}: missing `%>`")]
    UnterminatedDirective {
        offset: usize,
        line: usize,
        column: usize,
        body: String,
    },

    /// The generated program does not parse.
    #[error("generation failure: {0}")]
    Generation(#[from] ParseError),

    /// The program failed while running against the context.
    #[error("execution failure: {0}")]
    Execution(#[from] ExecError),

    /// JSON serialization error while building the render context.
    #[error("context serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors loading an [`EngineConfig`](crate::config::EngineConfig) file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config not found at {path}")]
    NotFound { path: PathBuf },

    #[error("config io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
