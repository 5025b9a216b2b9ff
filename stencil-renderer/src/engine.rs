//! [`TemplateEngine`]: the registry plus the compile/execute pipeline.
//!
//! Each render goes through the same stages:
//!
//! | Stage      | Work                                              | Failure                 |
//! |------------|---------------------------------------------------|-------------------------|
//! | Tokenizing | split the body at `<%` / `%>`                     | `UnterminatedDirective` |
//! | Emitting   | turn literals and expressions into emissions      | `Generation`            |
//! | Compiling  | parse statements and emissions into a [`Program`] | `Generation`            |
//! | Executing  | run the program against the context               | `Execution`             |
//!
//! [`TemplateEngine::render`] returns the error; [`TemplateEngine::set`] logs
//! it and returns `None`.

use std::borrow::Cow;

use serde::Serialize;

use stencil_core::TemplateRegistry;

use crate::ast::Program;
use crate::compiler;
use crate::config::EngineConfig;
use crate::context::RenderContext;
use crate::error::RenderError;
use crate::interpreter;

/// Owns the template registry and renders by name or by raw body.
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    registry: TemplateRegistry,
    config: EngineConfig,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl TemplateEngine {
    /// Construct a new [`TemplateEngine`] with the built-in catalogue loaded.
    pub fn new(config: EngineConfig) -> Self {
        let registry = TemplateRegistry::with_builtins(config.dynamic_slot.as_str());
        Self { registry, config }
    }

    /// Construct a [`TemplateEngine`] around an existing registry.
    pub fn with_registry(registry: TemplateRegistry, config: EngineConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TemplateRegistry {
        &mut self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Raw body registered under `name`, or `None` if absent.
    pub fn get(&self, name: &str) -> Option<String> {
        self.registry.get(name)
    }

    /// The registered body for `name_or_body`, or the argument itself when no
    /// template has that name.
    pub fn resolve<'a>(&self, name_or_body: &'a str) -> Cow<'a, str> {
        match self.registry.get(name_or_body) {
            Some(body) => Cow::Owned(body),
            None => Cow::Borrowed(name_or_body),
        }
    }

    /// Compile a template (by name or raw body) without running it.
    pub fn compile(&self, name_or_body: &str) -> Result<Program, RenderError> {
        compiler::compile_with_depth(&self.resolve(name_or_body), self.config.max_depth)
    }

    /// Render a template (by name or raw body), returning any failure.
    pub fn render(&self, name_or_body: &str, ctx: &RenderContext) -> Result<String, RenderError> {
        let program = self.compile(name_or_body)?;
        self.execute(&program, ctx)
    }

    /// Render a template (by name or raw body) against `data`.
    ///
    /// Never fails loudly: any error is logged with the generated program
    /// listing and `None` is returned.
    pub fn set<T: Serialize + ?Sized>(&self, name_or_body: &str, data: &T) -> Option<String> {
        let template = self.label(name_or_body);
        let body = self.resolve(name_or_body);

        let program = match compiler::compile_with_depth(&body, self.config.max_depth) {
            Ok(program) => program,
            Err(err) => {
                self.report(template, &body, None, &err);
                return None;
            }
        };

        let rendered = RenderContext::from_serialize(data)
            .and_then(|ctx| self.execute(&program, &ctx));
        match rendered {
            Ok(output) => Some(output),
            Err(err) => {
                self.report(template, &body, Some(&program), &err);
                None
            }
        }
    }

    /// Stage `body` into the dynamic slot, then render the slot.
    pub fn dynamic_content<T: Serialize + ?Sized>(
        &mut self,
        body: impl Into<String>,
        data: &T,
    ) -> Option<String> {
        self.registry.stage_dynamic(body);
        let slot = self.registry.dynamic_slot().to_string();
        self.set(&slot, data)
    }

    fn execute(&self, program: &Program, ctx: &RenderContext) -> Result<String, RenderError> {
        let output = interpreter::execute(program, ctx.root(), self.config.max_iterations)?;
        Ok(output)
    }

    /// Short name for log fields: the template name, or `<inline>` for raw
    /// bodies.
    fn label<'a>(&self, name_or_body: &'a str) -> &'a str {
        if self.registry.contains(name_or_body) {
            name_or_body
        } else {
            "<inline>"
        }
    }

    fn report(&self, template: &str, body: &str, program: Option<&Program>, err: &RenderError) {
        match program {
            Some(program) if self.config.log_program => {
                tracing::error!(error = %err, template, program = %program, "template render failed");
            }
            _ => {
                tracing::error!(error = %err, template, body, "template render failed");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stencil_core::TemplateDefinition;

    #[test]
    fn builtins_are_registered() {
        let engine = TemplateEngine::default();
        assert!(engine.get("loading").is_some());
        assert!(engine.get("pagingCommands").is_some());
    }

    #[test]
    fn resolve_prefers_registered_names() {
        let engine = TemplateEngine::default();
        assert!(matches!(engine.resolve("loading"), Cow::Owned(_)));
        assert_eq!(engine.resolve("just text"), Cow::Borrowed("just text"));
    }

    #[test]
    fn set_renders_inline_body() {
        let engine = TemplateEngine::default();
        assert_eq!(
            engine.set("Hello, <% this.name %>!", &json!({"name": "World"})).as_deref(),
            Some("Hello, World!")
        );
    }

    #[test]
    fn set_returns_none_on_each_failure_kind() {
        let engine = TemplateEngine::default();
        let data = json!({});
        assert_eq!(engine.set("<% if (this.x", &data), None);
        assert_eq!(engine.set("<% if (this.x) { %>", &data), None);
        assert_eq!(engine.set("<% nope %>", &data), None);
    }

    #[test]
    fn set_surfaces_serialization_failures_as_none() {
        use std::collections::HashMap;

        // Non-string map keys cannot become a context.
        let data: HashMap<(u8, u8), u8> = [((1, 2), 3)].into_iter().collect();
        let engine = TemplateEngine::default();
        assert_eq!(engine.set("static", &data), None);
        assert!(matches!(
            engine.render("static", &RenderContext::new()),
            Ok(ref s) if s == "static"
        ));
    }

    #[test]
    fn render_reports_error_kind() {
        let engine = TemplateEngine::default();
        let err = engine
            .render("<% this.a.b %>", &RenderContext::new())
            .unwrap_err();
        assert!(matches!(err, RenderError::Execution(_)));
        assert!(err.to_string().starts_with("execution failure"));
    }

    #[test]
    fn iteration_limit_comes_from_config() {
        let engine = TemplateEngine::new(EngineConfig {
            max_iterations: 3,
            ..EngineConfig::default()
        });
        let body = "<% for (var i = 0; i < this.n; i++) { %>.<% } %>";
        assert_eq!(engine.set(body, &json!({"n": 3})).as_deref(), Some("..."));
        assert_eq!(engine.set(body, &json!({"n": 4})), None);
    }

    #[test]
    fn deep_nesting_fails_softly() {
        let engine = TemplateEngine::default();
        let body = format!("<% {}1{} %>", "(".repeat(500), ")".repeat(500));
        assert_eq!(engine.set(&body, &json!({})), None);
        assert!(matches!(
            engine.render(&body, &RenderContext::new()),
            Err(RenderError::Generation(ref e)) if e.message.contains("nesting too deep")
        ));
    }

    #[test]
    fn depth_limit_comes_from_config() {
        let engine = TemplateEngine::new(EngineConfig {
            max_depth: 4,
            ..EngineConfig::default()
        });
        assert_eq!(engine.set("<% ((1)) %>", &json!({})).as_deref(), Some("1"));
        assert_eq!(engine.set("<% ((((((1)))))) %>", &json!({})), None);
    }

    #[test]
    fn dynamic_content_stages_into_configured_slot() {
        let mut engine = TemplateEngine::new(EngineConfig {
            dynamic_slot: "overlay".into(),
            ..EngineConfig::default()
        });
        let out = engine.dynamic_content("<b><% this.msg %></b>", &json!({"msg": "hi"}));
        assert_eq!(out.as_deref(), Some("<b>hi</b>"));
        assert_eq!(engine.get("overlay").as_deref(), Some("<b><% this.msg %></b>"));
    }

    #[test]
    fn registered_templates_render_by_name() {
        let mut engine = TemplateEngine::default();
        engine
            .registry_mut()
            .register(TemplateDefinition::from_body("greet", "Hi <% who %>"))
            .expect("register");
        assert_eq!(
            engine.set("greet", &json!({"who": "there"})).as_deref(),
            Some("Hi there")
        );
    }
}
