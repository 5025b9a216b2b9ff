//! Directive-boundary scanner.
//!
//! Splits a template body into literal text and `<% … %>` directives. The
//! first `%>` after an open marker always closes it; directives do not nest.

use crate::error::{line_col, RenderError, Span};

pub const OPEN: &str = "<%";
pub const CLOSE: &str = "%>";

/// Leading patterns that mark directive content as statement code.
const STATEMENT_PREFIXES: &[&str] = &[
    "var", "if", "for", "else", "switch", "case", "break", "{", "}", ";",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    /// Raw program code: declarations, control flow, braces.
    Statement,
    /// A value to evaluate and append.
    Expression,
}

/// One piece of a template body, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal {
        text: &'a str,
        span: Span,
    },
    Directive {
        kind: DirectiveKind,
        /// Trimmed content between the markers.
        content: &'a str,
        /// Location of `content` within the body.
        span: Span,
    },
}

/// Classify trimmed directive content.
///
/// This is a plain prefix test, so `format` counts as a statement because it
/// starts with `for`.
pub fn classify(content: &str) -> DirectiveKind {
    let content = content.strip_prefix(' ').unwrap_or(content);
    if STATEMENT_PREFIXES.iter().any(|p| content.starts_with(p)) {
        DirectiveKind::Statement
    } else {
        DirectiveKind::Expression
    }
}

/// Split `body` into segments. Empty literals are dropped.
pub fn tokenize(body: &str) -> Result<Vec<Segment<'_>>, RenderError> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    while let Some(rel) = body[cursor..].find(OPEN) {
        let open = cursor + rel;
        if open > cursor {
            segments.push(Segment::Literal {
                text: &body[cursor..open],
                span: Span::new(cursor, open),
            });
        }

        let inner_start = open + OPEN.len();
        let Some(rel_close) = body[inner_start..].find(CLOSE) else {
            let (line, column) = line_col(body, open);
            return Err(RenderError::UnterminatedDirective {
                offset: open,
                line,
                column,
                body: body.to_string(),
            });
        };
        let inner_end = inner_start + rel_close;

        let raw = &body[inner_start..inner_end];
        let content = raw.trim();
        let lead = raw.len() - raw.trim_start().len();
        let start = inner_start + lead;
        segments.push(Segment::Directive {
            kind: classify(content),
            content,
            span: Span::new(start, start + content.len()),
        });

        cursor = inner_end + CLOSE.len();
    }

    if cursor < body.len() {
        segments.push(Segment::Literal {
            text: &body[cursor..],
            span: Span::new(cursor, body.len()),
        });
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("var x = 1;", DirectiveKind::Statement)]
    #[case("if (this.items.length) {", DirectiveKind::Statement)]
    #[case("for (var i = 0; i < 3; i++) {", DirectiveKind::Statement)]
    #[case("} else {", DirectiveKind::Statement)]
    #[case("else {", DirectiveKind::Statement)]
    #[case("switch (x) {", DirectiveKind::Statement)]
    #[case("case 1:", DirectiveKind::Statement)]
    #[case("break;", DirectiveKind::Statement)]
    #[case("{", DirectiveKind::Statement)]
    #[case("}", DirectiveKind::Statement)]
    #[case(";", DirectiveKind::Statement)]
    #[case("format", DirectiveKind::Statement)]
    #[case("this.name", DirectiveKind::Expression)]
    #[case("currentPage -1", DirectiveKind::Expression)]
    #[case("default:", DirectiveKind::Expression)]
    #[case("while (x) {", DirectiveKind::Expression)]
    #[case("", DirectiveKind::Expression)]
    fn classification(#[case] content: &str, #[case] expected: DirectiveKind) {
        assert_eq!(classify(content), expected);
    }

    #[test]
    fn plain_text_is_one_literal() {
        let segments = tokenize("no directives here").expect("tokenize");
        assert_eq!(
            segments,
            vec![Segment::Literal {
                text: "no directives here",
                span: Span::new(0, 18)
            }]
        );
    }

    #[test]
    fn empty_body_has_no_segments() {
        assert!(tokenize("").expect("tokenize").is_empty());
    }

    #[test]
    fn directive_content_is_trimmed_with_span() {
        let body = "Hi <%  this.name  %>!";
        let segments = tokenize(body).expect("tokenize");
        assert_eq!(segments.len(), 3);
        match &segments[1] {
            Segment::Directive { kind, content, span } => {
                assert_eq!(*kind, DirectiveKind::Expression);
                assert_eq!(*content, "this.name");
                assert_eq!(&body[span.start..span.end], "this.name");
            }
            other => panic!("expected directive, got {other:?}"),
        }
    }

    #[test]
    fn adjacent_directives_emit_no_empty_literal() {
        let segments = tokenize("<% a %><% b %>").expect("tokenize");
        assert_eq!(segments.len(), 2);
        assert!(segments
            .iter()
            .all(|s| matches!(s, Segment::Directive { .. })));
    }

    #[test]
    fn first_close_marker_wins() {
        let segments = tokenize("<% a <% b %> c %>").expect("tokenize");
        match &segments[0] {
            Segment::Directive { content, .. } => assert_eq!(*content, "a <% b"),
            other => panic!("expected directive, got {other:?}"),
        }
        match &segments[1] {
            Segment::Literal { text, .. } => assert_eq!(*text, " c %>"),
            other => panic!("expected literal, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_directive_reports_position() {
        let err = tokenize("ok\n  <% if (this.x").unwrap_err();
        match err {
            RenderError::UnterminatedDirective {
                offset,
                line,
                column,
                ..
            } => {
                assert_eq!(offset, 5);
                assert_eq!((line, column), (2, 3));
            }
            other => panic!("expected UnterminatedDirective, got {other:?}"),
        }
    }

    #[test]
    fn close_marker_overlapping_open_is_unterminated() {
        assert!(matches!(
            tokenize("<%>"),
            Err(RenderError::UnterminatedDirective { .. })
        ));
    }
}
