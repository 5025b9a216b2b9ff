//! Lexer for directive code.
//!
//! Spans are absolute byte offsets into the template body, so errors can point
//! at the directive that caused them.

use crate::error::{ParseError, ParseResult, Span};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Var,
    If,
    Else,
    For,
    In,
    While,
    Do,
    Switch,
    Case,
    Default,
    Break,
    Continue,
    True,
    False,
    Null,
    This,
    Typeof,

    // Literals
    Ident(String),
    Number(f64),
    Str(String),

    // Symbols
    LParen,        // (
    RParen,        // )
    LBracket,      // [
    RBracket,      // ]
    LBrace,        // {
    RBrace,        // }
    Comma,         // ,
    Semicolon,     // ;
    Colon,         // :
    Question,      // ?
    Dot,           // .
    Plus,          // +
    Minus,         // -
    Star,          // *
    Slash,         // /
    Percent,       // %
    Bang,          // !
    Assign,        // =
    PlusAssign,    // +=
    MinusAssign,   // -=
    StarAssign,    // *=
    SlashAssign,   // /=
    PercentAssign, // %=
    EqEq,          // ==
    NotEq,         // !=
    EqEqEq,        // ===
    NotEqEq,       // !==
    Lt,            // <
    LtEq,          // <=
    Gt,            // >
    GtEq,          // >=
    AndAnd,        // &&
    OrOr,          // ||
    PlusPlus,      // ++
    MinusMinus,    // --

    /// Placeholder for a literal or expression directive, by index into the
    /// compiler's emission table.
    Emit(usize),

    Eof,
}

impl TokenKind {
    /// Human-readable form for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier `{name}`"),
            TokenKind::Number(n) => format!("number `{n}`"),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Emit(_) => "template text".to_string(),
            TokenKind::Eof => "end of template".to_string(),
            other => match other.keyword_text().or_else(|| other.symbol_text()) {
                Some(text) => format!("`{text}`"),
                None => format!("{other:?}"),
            },
        }
    }

    /// Source spelling of keyword tokens.
    pub fn keyword_text(&self) -> Option<&'static str> {
        Some(match self {
            TokenKind::Var => "var",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::For => "for",
            TokenKind::In => "in",
            TokenKind::While => "while",
            TokenKind::Do => "do",
            TokenKind::Switch => "switch",
            TokenKind::Case => "case",
            TokenKind::Default => "default",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::This => "this",
            TokenKind::Typeof => "typeof",
            _ => return None,
        })
    }

    fn symbol_text(&self) -> Option<&'static str> {
        Some(match self {
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Colon => ":",
            TokenKind::Question => "?",
            TokenKind::Dot => ".",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Bang => "!",
            TokenKind::Assign => "=",
            TokenKind::PlusAssign => "+=",
            TokenKind::MinusAssign => "-=",
            TokenKind::StarAssign => "*=",
            TokenKind::SlashAssign => "/=",
            TokenKind::PercentAssign => "%=",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::EqEqEq => "===",
            TokenKind::NotEqEq => "!==",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::AndAnd => "&&",
            TokenKind::OrOr => "||",
            TokenKind::PlusPlus => "++",
            TokenKind::MinusMinus => "--",
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Longest symbols first so `===` wins over `==` and `=`.
const SYMBOLS: &[(&str, TokenKind)] = &[
    ("===", TokenKind::EqEqEq),
    ("!==", TokenKind::NotEqEq),
    ("==", TokenKind::EqEq),
    ("!=", TokenKind::NotEq),
    ("<=", TokenKind::LtEq),
    (">=", TokenKind::GtEq),
    ("&&", TokenKind::AndAnd),
    ("||", TokenKind::OrOr),
    ("++", TokenKind::PlusPlus),
    ("--", TokenKind::MinusMinus),
    ("+=", TokenKind::PlusAssign),
    ("-=", TokenKind::MinusAssign),
    ("*=", TokenKind::StarAssign),
    ("/=", TokenKind::SlashAssign),
    ("%=", TokenKind::PercentAssign),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("[", TokenKind::LBracket),
    ("]", TokenKind::RBracket),
    ("{", TokenKind::LBrace),
    ("}", TokenKind::RBrace),
    (",", TokenKind::Comma),
    (";", TokenKind::Semicolon),
    (":", TokenKind::Colon),
    ("?", TokenKind::Question),
    (".", TokenKind::Dot),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    ("!", TokenKind::Bang),
    ("=", TokenKind::Assign),
    ("<", TokenKind::Lt),
    (">", TokenKind::Gt),
];

pub struct Lexer<'a> {
    input: &'a str,
    cursor: usize,
    /// Offset of `input` within the template body.
    base: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, base: usize) -> Self {
        Self {
            input,
            cursor: 0,
            base,
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.cursor..]
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(self.base + start, self.base + self.cursor)
    }

    /// Tokenize the whole input. No trailing `Eof` is appended.
    pub fn tokenize(mut self) -> ParseResult<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn skip_trivia(&mut self) -> ParseResult<()> {
        loop {
            let rest = self.remaining();
            let trimmed = rest.trim_start();
            self.cursor += rest.len() - trimmed.len();

            if trimmed.starts_with("//") {
                let end = trimmed.find('\n').unwrap_or(trimmed.len());
                self.cursor += end;
            } else if trimmed.starts_with("/*") {
                let start = self.cursor;
                match trimmed[2..].find("*/") {
                    Some(end) => self.cursor += end + 4,
                    None => {
                        return Err(ParseError::new(
                            "unterminated comment",
                            self.span_from(start),
                        ))
                    }
                }
            } else {
                return Ok(());
            }
        }
    }

    fn next_token(&mut self) -> ParseResult<Option<Token>> {
        self.skip_trivia()?;
        let rest = self.remaining();
        let Some(first) = rest.chars().next() else {
            return Ok(None);
        };
        let start = self.cursor;

        if first == '"' || first == '\'' {
            let value = self.lex_string(first)?;
            return Ok(Some(Token::new(TokenKind::Str(value), self.span_from(start))));
        }

        let starts_fraction = first == '.'
            && rest[1..].chars().next().is_some_and(|c| c.is_ascii_digit());
        if first.is_ascii_digit() || starts_fraction {
            let value = self.lex_number()?;
            return Ok(Some(Token::new(TokenKind::Number(value), self.span_from(start))));
        }

        if first.is_alphabetic() || first == '_' || first == '$' {
            let len: usize = rest
                .chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '$')
                .map(char::len_utf8)
                .sum();
            let word = &rest[..len];
            self.cursor += len;
            let kind = match word {
                "var" | "let" | "const" => TokenKind::Var,
                "if" => TokenKind::If,
                "else" => TokenKind::Else,
                "for" => TokenKind::For,
                "in" => TokenKind::In,
                "while" => TokenKind::While,
                "do" => TokenKind::Do,
                "switch" => TokenKind::Switch,
                "case" => TokenKind::Case,
                "default" => TokenKind::Default,
                "break" => TokenKind::Break,
                "continue" => TokenKind::Continue,
                "true" => TokenKind::True,
                "false" => TokenKind::False,
                "null" => TokenKind::Null,
                "this" => TokenKind::This,
                "typeof" => TokenKind::Typeof,
                _ => TokenKind::Ident(word.to_string()),
            };
            return Ok(Some(Token::new(kind, self.span_from(start))));
        }

        for (text, kind) in SYMBOLS {
            if rest.starts_with(text) {
                self.cursor += text.len();
                return Ok(Some(Token::new(kind.clone(), self.span_from(start))));
            }
        }

        self.cursor += first.len_utf8();
        Err(ParseError::new(
            format!("unexpected character `{first}`"),
            self.span_from(start),
        ))
    }

    fn lex_number(&mut self) -> ParseResult<f64> {
        let start = self.cursor;
        let bytes = self.input.as_bytes();
        let mut end = self.cursor;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end < bytes.len() && bytes[end] == b'.' {
            end += 1;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
        }
        if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
            let mut exp = end + 1;
            if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
                exp += 1;
            }
            if exp < bytes.len() && bytes[exp].is_ascii_digit() {
                while exp < bytes.len() && bytes[exp].is_ascii_digit() {
                    exp += 1;
                }
                end = exp;
            }
        }
        self.cursor = end;
        self.input[start..end]
            .parse::<f64>()
            .map_err(|_| ParseError::new("malformed number", self.span_from(start)))
    }

    fn lex_string(&mut self, quote: char) -> ParseResult<String> {
        let start = self.cursor;
        let mut value = String::new();
        let mut chars = self.input[start + 1..].char_indices();
        while let Some((idx, c)) = chars.next() {
            match c {
                c if c == quote => {
                    self.cursor = start + 1 + idx + c.len_utf8();
                    return Ok(value);
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, 'r')) => value.push('\r'),
                    Some((_, '0')) => value.push('\0'),
                    Some((_, 'u')) => {
                        let hex: String = chars.by_ref().take(4).map(|(_, h)| h).collect();
                        let decoded = u32::from_str_radix(&hex, 16)
                            .ok()
                            .and_then(char::from_u32);
                        match decoded {
                            Some(ch) if hex.len() == 4 => value.push(ch),
                            _ => {
                                self.cursor = start + 1 + idx;
                                return Err(ParseError::new(
                                    "invalid unicode escape",
                                    self.span_from(start),
                                ));
                            }
                        }
                    }
                    Some((_, other)) => value.push(other),
                    None => break,
                },
                other => value.push(other),
            }
        }
        self.cursor = self.input.len();
        Err(ParseError::new(
            "unterminated string literal",
            self.span_from(start),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src, 0)
            .tokenize()
            .expect("tokenize")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn for_header() {
        assert_eq!(
            kinds("for ( var i = 0, len = prev.length; i < len; i+=1 ) {"),
            vec![
                TokenKind::For,
                TokenKind::LParen,
                TokenKind::Var,
                TokenKind::Ident("i".into()),
                TokenKind::Assign,
                TokenKind::Number(0.0),
                TokenKind::Comma,
                TokenKind::Ident("len".into()),
                TokenKind::Assign,
                TokenKind::Ident("prev".into()),
                TokenKind::Dot,
                TokenKind::Ident("length".into()),
                TokenKind::Semicolon,
                TokenKind::Ident("i".into()),
                TokenKind::Lt,
                TokenKind::Ident("len".into()),
                TokenKind::Semicolon,
                TokenKind::Ident("i".into()),
                TokenKind::PlusAssign,
                TokenKind::Number(1.0),
                TokenKind::RParen,
                TokenKind::LBrace,
            ]
        );
    }

    #[test]
    fn longest_symbol_wins() {
        assert_eq!(
            kinds("a === b !== c == d"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::EqEqEq,
                TokenKind::Ident("b".into()),
                TokenKind::NotEqEq,
                TokenKind::Ident("c".into()),
                TokenKind::EqEq,
                TokenKind::Ident("d".into()),
            ]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(
            kinds("42 3.5 .25 1e3"),
            vec![
                TokenKind::Number(42.0),
                TokenKind::Number(3.5),
                TokenKind::Number(0.25),
                TokenKind::Number(1000.0),
            ]
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            kinds(r#"'it\'s' "a\"b\n" "A""#),
            vec![
                TokenKind::Str("it's".into()),
                TokenKind::Str("a\"b\n".into()),
                TokenKind::Str("A".into()),
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("a /* note */ + // trailing\n b"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Plus,
                TokenKind::Ident("b".into()),
            ]
        );
    }

    #[test]
    fn spans_are_offset_by_base() {
        let tokens = Lexer::new("x + yy", 10).tokenize().expect("tokenize");
        assert_eq!(tokens[0].span, Span::new(10, 11));
        assert_eq!(tokens[2].span, Span::new(14, 16));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = Lexer::new("'abc", 0).tokenize().unwrap_err();
        assert!(err.message.contains("unterminated string"));
    }

    #[test]
    fn unexpected_character_is_an_error() {
        let err = Lexer::new("a # b", 0).tokenize().unwrap_err();
        assert!(err.message.contains('#'));
        assert_eq!(err.span, Span::new(2, 3));
    }

    #[test]
    fn let_and_const_read_as_var() {
        assert_eq!(kinds("let"), vec![TokenKind::Var]);
        assert_eq!(kinds("const"), vec![TokenKind::Var]);
    }
}
