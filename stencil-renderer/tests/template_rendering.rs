use rstest::rstest;
use serde::Serialize;
use serde_json::json;
use stencil_renderer::{EngineConfig, RenderContext, RenderError, TemplateEngine};

fn engine() -> TemplateEngine {
    TemplateEngine::new(EngineConfig::default())
}

#[derive(Serialize)]
struct Paging {
    #[serde(rename = "currentPage")]
    current_page: String,
    prev: Vec<u32>,
    next: Vec<u32>,
    last: u32,
}

#[derive(Serialize)]
struct Slide {
    src: &'static str,
}

// ---------------------------------------------------------------------------
// Basic rendering
// ---------------------------------------------------------------------------

#[test]
fn directive_free_body_renders_unchanged() {
    let body = "<p class=\"note\">plain 'text'\n\twith \\ escapes</p>";
    assert_eq!(engine().set(body, &json!({})).as_deref(), Some(body));
}

#[test]
fn expression_interpolates_context_field() {
    let out = engine().set("Hello, <% this.name %>!", &json!({"name": "World"}));
    assert_eq!(out.as_deref(), Some("Hello, World!"));
}

#[test]
fn for_loop_over_items() {
    let body = "<% for (var i=0;i<this.items.length;i++) { %>(<% this.items[i] %>)<% } %>";
    let out = engine().set(body, &json!({"items": ["a", "b"]}));
    assert_eq!(out.as_deref(), Some("(a)(b)"));
}

#[rstest]
#[case(json!({"items": []}), "[]")]
#[case(json!({"items": [1]}), "[shown]")]
#[case(json!({"items": [1, 2]}), "[shown]")]
fn if_guard_on_length(#[case] data: serde_json::Value, #[case] expected: &str) {
    let body = "[<% if (this.items.length) { %>shown<% } %>]";
    assert_eq!(engine().set(body, &data).as_deref(), Some(expected));
}

#[test]
fn literal_double_quotes_never_break_compilation() {
    let body = "<a href=\"<% this.url %>\" title=\"say \"hi\"\">link</a>";
    let out = engine().set(body, &json!({"url": "/x"}));
    assert_eq!(
        out.as_deref(),
        Some("<a href=\"/x\" title=\"say \"hi\"\">link</a>")
    );
}

#[test]
fn numbers_print_in_shortest_form() {
    let out = engine().set("<% 1 + 2 %> <% 0.1 * 3 %> <% 10 / 4 %>", &json!({}));
    assert_eq!(out.as_deref(), Some("3 0.30000000000000004 2.5"));
}

#[test]
fn missing_field_renders_empty() {
    let out = engine().set("[<% this.nothing %>]", &json!({"something": 1}));
    assert_eq!(out.as_deref(), Some("[]"));
}

#[test]
fn multiple_values_in_one_expression_directive() {
    let out = engine().set("<% this.a, '-', this.b %>", &json!({"a": 1, "b": 2}));
    assert_eq!(out.as_deref(), Some("1-2"));
}

// ---------------------------------------------------------------------------
// Soft failure contract
// ---------------------------------------------------------------------------

#[rstest]
#[case("<% if (this.x")]
#[case("<% if (this.x) { %>never closed")]
#[case("<% } %>")]
#[case("<% this.a. %>")]
#[case("<% undefinedName %>")]
#[case("<% this.user.name %>")]
#[case("<% this.count.toFixed(200) %>")]
fn failures_return_none(#[case] body: &str) {
    let data = json!({"user": null, "count": 1});
    assert_eq!(engine().set(body, &data), None);
}

#[test]
fn strict_render_distinguishes_failure_kinds() {
    let engine = engine();
    let ctx = RenderContext::new();
    assert!(matches!(
        engine.render("<% x", &ctx),
        Err(RenderError::UnterminatedDirective { line: 1, column: 1, .. })
    ));
    assert!(matches!(
        engine.render("<% if (true) { %>", &ctx),
        Err(RenderError::Generation(_))
    ));
    assert!(matches!(
        engine.render("<% nope %>", &ctx),
        Err(RenderError::Execution(_))
    ));
}

// ---------------------------------------------------------------------------
// Registry integration
// ---------------------------------------------------------------------------

#[test]
fn unknown_name_is_rendered_as_body() {
    let engine = engine();
    assert_eq!(engine.get("nonexistent"), None);
    assert_eq!(
        engine.set("nonexistent", &json!({})).as_deref(),
        Some("nonexistent")
    );
}

#[test]
fn rerendering_is_idempotent() {
    let engine = engine();
    let data = json!({"msg": "Saved"});
    let first = engine.set("formResponse", &data);
    let second = engine.set("formResponse", &data);
    assert!(first.is_some());
    assert_eq!(first, second);
}

#[test]
fn form_response_builtin() {
    let out = engine().set("formResponse", &json!({"msg": "Thanks!"}));
    assert_eq!(
        out.as_deref(),
        Some("<p class='form__reponse'>Thanks!</p>")
    );
}

#[test]
fn loading_builtin_is_static() {
    assert_eq!(
        engine().set("loading", &json!({})).as_deref(),
        Some("<div class=\"loading\"></div>")
    );
}

#[test]
fn paging_commands_builtin() {
    let data = Paging {
        current_page: "3".into(),
        prev: vec![1, 2],
        next: vec![4],
        last: 9,
    };
    let out = engine().set("pagingCommands", &data).expect("render pagingCommands");

    assert!(out.contains("js-paging--first"));
    assert!(out.contains("data-page='2'>&lsaquo;</button>"));
    assert!(out.contains("data-page='1'>1</button>"));
    assert!(out.contains("data-page='2'>2</button>"));
    assert!(out.contains("<span class='gallery__paging__cmd is-active'> 3 </span>"));
    assert!(out.contains("data-page='4'>4</button>"));
    assert!(out.contains("data-page='4'> &rsaquo; </button>"));
    assert!(out.contains("data-page='9'> &raquo; </button>"));
    assert!(!out.contains("<%"));
}

#[test]
fn paging_commands_first_page_has_no_back_controls() {
    let data = Paging {
        current_page: "1".into(),
        prev: vec![],
        next: vec![2, 3],
        last: 3,
    };
    let out = engine().set("pagingCommands", &data).expect("render pagingCommands");
    assert!(!out.contains("js-paging--first"));
    assert!(!out.contains("js-paging--prev"));
    assert!(out.starts_with("<span class='gallery__paging__cmd is-active'> 1 </span>"));
}

#[test]
fn show_case_builtin_iterates_array_context() {
    let slides = [Slide { src: "a.png" }, Slide { src: "b.png" }];
    let out = engine().set("showCase", &slides).expect("render showCase");
    assert_eq!(
        out,
        "<div class='showcase-gallery'>\
         <div class='showcase-gallery__el'><img src='a.png' alt=''></div>\
         <div class='showcase-gallery__el'><img src='b.png' alt=''></div>\
         </div>"
    );
}

#[test]
fn dynamic_content_renders_through_layer() {
    let mut engine = engine();
    let out = engine
        .dynamic_content("<div class='layer__content'><% this.content %></div>", &json!({"content": "Hi"}))
        .expect("render dynamic content");
    assert_eq!(out, "<div class='layer__content'>Hi</div>");
    assert_eq!(
        engine.get("layer").as_deref(),
        Some("<div class='layer__content'><% this.content %></div>")
    );
}

// ---------------------------------------------------------------------------
// Control flow across directives
// ---------------------------------------------------------------------------

#[test]
fn else_branch_across_directives() {
    let body = "<% if (this.user) { %>Hi <% this.user %><% } else { %>Sign in<% } %>";
    let engine = engine();
    assert_eq!(engine.set(body, &json!({"user": "ada"})).as_deref(), Some("Hi ada"));
    assert_eq!(engine.set(body, &json!({"user": null})).as_deref(), Some("Sign in"));
}

#[test]
fn switch_across_directives() {
    let body = "<% switch (this.kind) { %>\
                <% case 'warn': %>!<% break; %>\
                <% case 'info': %>i<% break; %>\
                <% } %>";
    let engine = engine();
    assert_eq!(engine.set(body, &json!({"kind": "warn"})).as_deref(), Some("!"));
    assert_eq!(engine.set(body, &json!({"kind": "info"})).as_deref(), Some("i"));
    assert_eq!(engine.set(body, &json!({"kind": "none"})).as_deref(), Some(""));
}

#[test]
fn runaway_loop_is_bounded() {
    let engine = TemplateEngine::new(EngineConfig {
        max_iterations: 1_000,
        ..EngineConfig::default()
    });
    assert_eq!(engine.set("<% for (;;) { } %>", &json!({})), None);
}

// ---------------------------------------------------------------------------
// Declarations and limits
// ---------------------------------------------------------------------------

#[rstest]
#[case(json!({"title": "Hi"}), "Hi")]
#[case(json!({}), "Untitled")]
fn var_default_idiom_reads_caller_data(#[case] data: serde_json::Value, #[case] expected: &str) {
    let body = "<% var title = title || 'Untitled' %><h1><% title %></h1>";
    assert_eq!(
        engine().set(body, &data),
        Some(format!("<h1>{expected}</h1>"))
    );
}

#[test]
fn context_field_is_visible_before_its_declaration() {
    let out = engine().set("[<% name %>]<% var name = 'x' %>", &json!({"name": "Ada"}));
    assert_eq!(out.as_deref(), Some("[Ada]"));
}

#[test]
fn deeply_nested_directive_fails_softly() {
    let engine = engine();
    for depth in [500, 2_000, 20_000] {
        let body = format!("<% {}1{} %>", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(engine.set(&body, &json!({})), None);
    }
    let unary = format!("<% {}1 %>", "!".repeat(5_000));
    assert!(matches!(
        engine.render(&unary, &RenderContext::new()),
        Err(RenderError::Generation(_))
    ));
}
