//! # stencil-renderer
//!
//! Compiles `<% … %>` templates into a small AST and interprets it against a
//! serializable context. No code is generated or evaluated at run time.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use serde_json::json;
//! use stencil_renderer::{EngineConfig, TemplateEngine};
//!
//! let engine = TemplateEngine::new(EngineConfig::default());
//! let html = engine.set(
//!     "<ul><% for (var i = 0; i < this.items.length; i++) { %><li><% this.items[i] %></li><% } %></ul>",
//!     &json!({ "items": ["a", "b"] }),
//! );
//! assert_eq!(html.as_deref(), Some("<ul><li>a</li><li>b</li></ul>"));
//! ```
//!
//! - [`scan`]: split a body into literals and directives
//! - [`lexer`], [`parser`]: directive code to [`ast`]
//! - [`compiler`]: body to [`ast::Program`]
//! - [`interpreter`]: run a program against a [`Value`]
//! - [`engine`]: [`TemplateEngine`] facade

pub mod ast;
pub mod compiler;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod scan;
pub mod value;

pub use ast::Program;
pub use config::EngineConfig;
pub use context::RenderContext;
pub use engine::TemplateEngine;
pub use error::{ConfigError, ExecError, ParseError, RenderError};
pub use value::Value;
