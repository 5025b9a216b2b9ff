//! Template body → [`Program`].
//!
//! Literal text and expression directives become self-contained emission
//! statements. Statement directives contribute raw tokens, spliced together
//! with placeholders for the emissions, so one parse sees the whole control
//! structure of the template.

use crate::ast::{Program, Stmt};
use crate::error::{RenderError, Span};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::parser::{Parser, DEFAULT_MAX_DEPTH};
use crate::scan::{self, DirectiveKind, Segment};

/// Compile `body` into an executable program.
pub fn compile(body: &str) -> Result<Program, RenderError> {
    compile_with_depth(body, DEFAULT_MAX_DEPTH)
}

/// [`compile`] with an explicit nesting limit for the parser.
pub fn compile_with_depth(body: &str, max_depth: usize) -> Result<Program, RenderError> {
    let segments = scan::tokenize(body)?;
    let segment_count = segments.len();

    let mut tokens: Vec<Token> = Vec::new();
    let mut emissions: Vec<Stmt> = Vec::new();

    for segment in segments {
        match segment {
            Segment::Literal { text, span } => {
                tokens.push(Token::new(TokenKind::Emit(emissions.len()), span));
                emissions.push(Stmt::Text(text.to_string()));
            }
            Segment::Directive {
                kind: DirectiveKind::Expression,
                content,
                span,
            } => {
                let mut expr_tokens = Lexer::new(content, span.start)
                    .tokenize()
                    .map_err(|e| e.locate(body))?;
                expr_tokens.push(Token::new(TokenKind::Eof, Span::new(span.end, span.end)));
                let args = Parser::new(expr_tokens)
                    .with_max_depth(max_depth)
                    .parse_print()
                    .map_err(|e| e.locate(body))?;
                tokens.push(Token::new(TokenKind::Emit(emissions.len()), span));
                emissions.push(Stmt::Print(args));
            }
            Segment::Directive {
                kind: DirectiveKind::Statement,
                content,
                span,
            } => {
                let stmt_tokens = Lexer::new(content, span.start)
                    .tokenize()
                    .map_err(|e| e.locate(body))?;
                tokens.extend(stmt_tokens);
            }
        }
    }

    tokens.push(Token::new(TokenKind::Eof, Span::new(body.len(), body.len())));
    let program = Parser::with_emissions(tokens, emissions)
        .with_max_depth(max_depth)
        .parse_program()
        .map_err(|e| e.locate(body))?;

    tracing::trace!(
        segments = segment_count,
        statements = program.body.len(),
        "compiled template"
    );
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;

    #[test]
    fn plain_text_is_a_single_text_statement() {
        let program = compile("Hello, world").expect("compile");
        assert_eq!(program.body, vec![Stmt::Text("Hello, world".into())]);
    }

    #[test]
    fn empty_body_compiles_to_empty_program() {
        assert!(compile("").expect("compile").body.is_empty());
    }

    #[test]
    fn expression_directive_prints() {
        let program = compile("Hi <% this.name %>!").expect("compile");
        assert_eq!(program.body.len(), 3);
        assert_eq!(
            program.body[1],
            Stmt::Print(vec![Expr::Member {
                object: Box::new(Expr::This),
                property: "name".into()
            }])
        );
    }

    #[test]
    fn empty_directive_prints_nothing() {
        let program = compile("a<%  %>b").expect("compile");
        assert_eq!(program.body[1], Stmt::Print(Vec::new()));
    }

    #[test]
    fn control_flow_spans_directives() {
        let program =
            compile("<% if (this.ok) { %>yes<% } else { %>no<% } %>").expect("compile");
        assert_eq!(program.body.len(), 1);
        match &program.body[0] {
            Stmt::If {
                then,
                otherwise: Some(otherwise),
                ..
            } => {
                assert_eq!(**then, Stmt::Block(vec![Stmt::Text("yes".into())]));
                assert_eq!(**otherwise, Stmt::Block(vec![Stmt::Text("no".into())]));
            }
            other => panic!("expected if/else, got {other:?}"),
        }
    }

    #[test]
    fn literal_quotes_and_newlines_survive() {
        let body = "<p class=\"x\">it's\n\\n</p>";
        let program = compile(body).expect("compile");
        assert_eq!(program.body, vec![Stmt::Text(body.into())]);
    }

    #[test]
    fn unbalanced_braces_fail_generation() {
        let err = compile("<% if (this.ok) { %>open").unwrap_err();
        assert!(matches!(err, RenderError::Generation(_)));
    }

    #[test]
    fn syntax_error_is_located_in_body() {
        let err = compile("line one\n<% this.a + %>").unwrap_err();
        match err {
            RenderError::Generation(e) => {
                assert_eq!(e.line, 2);
                assert_eq!(e.found.as_deref(), Some("end of template"));
            }
            other => panic!("expected generation failure, got {other:?}"),
        }
    }

    #[test]
    fn nesting_limit_applies_to_both_directive_kinds() {
        let deep = format!("<% {}1{} %>", "(".repeat(500), ")".repeat(500));
        assert!(matches!(compile(&deep), Err(RenderError::Generation(_))));

        let body = "<% if (a) { if (b) { %>x<% } } %>";
        assert!(compile_with_depth(body, 3).is_err());
        assert!(compile_with_depth(body, 16).is_ok());
    }

    #[test]
    fn unterminated_directive_is_reported() {
        assert!(matches!(
            compile("<% this.a"),
            Err(RenderError::UnterminatedDirective { .. })
        ));
    }
}
