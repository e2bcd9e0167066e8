//! Token scanner shared by the island sub-grammars.
//!
//! Spans are relative to the island text; errors are rebased through the
//! walker source information handed in by the dispatcher.
use crate::error::{EngineError, EngineResult};
use crate::source::ParseTreeWalkerSourceInformation;
use crate::utils::span::{Position, Span};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Plain identifier, `true`/`false` included.
    Identifier(String),
    /// String literal, quotes and escapes intact.
    String(String),
    Integer(String),
    Float(String),
    /// Fixed-point literal; text excludes the `D` suffix.
    Decimal(String),
    /// Date or date-time literal; text excludes the leading `%`.
    Date(String),
    /// Time-of-day literal; text excludes the leading `%`.
    StrictTime(String),
    /// `%latest`
    LatestDate,
    BraceOpen,
    BraceClose,
    BracketOpen,
    BracketClose,
    ParenOpen,
    ParenClose,
    Comma,
    Colon,
    PathSeparator,
    Dot,
    Slash,
    Plus,
    Minus,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Scan the full island text into tokens, ending with an `Eof` token.
pub fn tokenize(
    input: &str,
    walker: &ParseTreeWalkerSourceInformation,
) -> EngineResult<Vec<Token>> {
    Lexer::new(input, walker).run()
}

struct Lexer<'a> {
    input: &'a str,
    pos: Position,
    walker: &'a ParseTreeWalkerSourceInformation,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str, walker: &'a ParseTreeWalkerSourceInformation) -> Self {
        Self {
            input,
            pos: Position::start(),
            walker,
        }
    }

    fn run(mut self) -> EngineResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let start = self.pos;
            let Some(ch) = self.peek() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    span: Span::new(start, start),
                });
                return Ok(tokens);
            };
            let kind = match ch {
                '{' => self.single(TokenKind::BraceOpen),
                '}' => self.single(TokenKind::BraceClose),
                '[' => self.single(TokenKind::BracketOpen),
                ']' => self.single(TokenKind::BracketClose),
                '(' => self.single(TokenKind::ParenOpen),
                ')' => self.single(TokenKind::ParenClose),
                ',' => self.single(TokenKind::Comma),
                '.' => self.single(TokenKind::Dot),
                '/' => self.single(TokenKind::Slash),
                '+' => self.single(TokenKind::Plus),
                '-' => self.single(TokenKind::Minus),
                ':' => {
                    self.advance();
                    if self.peek() == Some(':') {
                        self.advance();
                        TokenKind::PathSeparator
                    } else {
                        TokenKind::Colon
                    }
                }
                '\'' => self.string_literal(start)?,
                '%' => self.percent_literal(),
                c if c.is_ascii_digit() => self.number(),
                c if c.is_alphabetic() || c == '_' => self.identifier(),
                other => {
                    return Err(EngineError::parser(
                        format!("Unexpected character '{}'", other),
                        self.walker.source_information(Span::single(start)),
                    ));
                }
            };
            tokens.push(Token {
                kind,
                span: Span::new(start, self.pos),
            });
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos.offset..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek() {
            self.pos = self.pos.advance(ch);
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn string_literal(&mut self, start: Position) -> EngineResult<TokenKind> {
        self.advance();
        loop {
            match self.peek() {
                Some('\\') => {
                    self.advance();
                    self.advance();
                }
                Some('\'') => {
                    self.advance();
                    let span = Span::new(start, self.pos);
                    return Ok(TokenKind::String(span.slice(self.input).to_string()));
                }
                Some(_) => self.advance(),
                None => {
                    return Err(EngineError::parser(
                        "Unterminated string literal",
                        self.walker
                            .source_information(Span::new(start, self.pos)),
                    ));
                }
            }
        }
    }

    /// `%`-prefixed literal: date, date-time, time, or `%latest`.
    fn percent_literal(&mut self) -> TokenKind {
        self.advance();
        let body_start = self.pos;
        while matches!(
            self.peek(),
            Some(c) if c.is_ascii_alphanumeric() || matches!(c, '-' | ':' | '+' | '.')
        ) {
            self.advance();
        }
        let text = Span::new(body_start, self.pos).slice(self.input).to_string();
        if text == "latest" {
            TokenKind::LatestDate
        } else if text.contains('-') || !text.contains(':') {
            TokenKind::Date(text)
        } else {
            TokenKind::StrictTime(text)
        }
    }

    fn number(&mut self) -> TokenKind {
        let start = self.pos;
        let mut is_float = false;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        // fraction: a dot followed by a digit, so `1.prop` stays an integer
        if self.peek() == Some('.') {
            let after_dot = self.input[self.pos.offset + 1..].chars().next();
            if matches!(after_dot, Some(c) if c.is_ascii_digit()) {
                is_float = true;
                self.advance();
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            is_float = true;
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.advance();
            }
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }
        let text = Span::new(start, self.pos).slice(self.input).to_string();
        match self.peek() {
            Some('D') | Some('d') => {
                self.advance();
                TokenKind::Decimal(text)
            }
            Some('F') | Some('f') => {
                self.advance();
                TokenKind::Float(text)
            }
            _ if is_float => TokenKind::Float(text),
            _ => TokenKind::Integer(text),
        }
    }

    fn identifier(&mut self) -> TokenKind {
        let start = self.pos;
        while matches!(
            self.peek(),
            Some(c) if c.is_alphanumeric() || c == '_' || c == '$'
        ) {
            self.advance();
        }
        TokenKind::Identifier(Span::new(start, self.pos).slice(self.input).to_string())
    }
}

/// Cursor over a token stream with rebased-error helpers.
pub struct TokenCursor<'a> {
    tokens: Vec<Token>,
    index: usize,
    walker: &'a ParseTreeWalkerSourceInformation,
}

impl<'a> TokenCursor<'a> {
    pub fn new(tokens: Vec<Token>, walker: &'a ParseTreeWalkerSourceInformation) -> Self {
        Self {
            tokens,
            index: 0,
            walker,
        }
    }

    pub fn peek(&self) -> &Token {
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    pub fn next(&mut self) -> Token {
        let token = self.peek().clone();
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
        token
    }

    pub fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    /// Consume the next token if it matches.
    pub fn eat(&mut self, kind: &TokenKind) -> bool {
        if &self.peek().kind == kind {
            self.next();
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, kind: TokenKind, what: &str) -> EngineResult<Token> {
        if self.peek().kind == kind {
            Ok(self.next())
        } else {
            Err(self.unexpected(what))
        }
    }

    pub fn expect_identifier(&mut self, what: &str) -> EngineResult<(String, Span)> {
        match self.peek().kind.clone() {
            TokenKind::Identifier(name) => {
                let token = self.next();
                Ok((name, token.span))
            }
            _ => Err(self.unexpected(what)),
        }
    }

    pub fn unexpected(&self, what: &str) -> EngineError {
        EngineError::parser(
            format!("Expected {}", what),
            self.walker.source_information(self.peek().span),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<TokenKind> {
        let walker = ParseTreeWalkerSourceInformation::new("test", 0, 0);
        tokenize(input, &walker)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_punctuation_and_identifiers() {
        assert_eq!(
            lex("Person { firstName }"),
            vec![
                TokenKind::Identifier("Person".into()),
                TokenKind::BraceOpen,
                TokenKind::Identifier("firstName".into()),
                TokenKind::BraceClose,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            lex("1 2.5 3.14D 2e10"),
            vec![
                TokenKind::Integer("1".into()),
                TokenKind::Float("2.5".into()),
                TokenKind::Decimal("3.14".into()),
                TokenKind::Float("2e10".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_dot_after_integer_is_not_a_fraction() {
        assert_eq!(
            lex("1.prop"),
            vec![
                TokenKind::Integer("1".into()),
                TokenKind::Dot,
                TokenKind::Identifier("prop".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_percent_literals() {
        assert_eq!(
            lex("%2020-01-01 %10:20:30 %latest %2020-01-01T10:00:00"),
            vec![
                TokenKind::Date("2020-01-01".into()),
                TokenKind::StrictTime("10:20:30".into()),
                TokenKind::LatestDate,
                TokenKind::Date("2020-01-01T10:00:00".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_and_path_separator() {
        assert_eq!(
            lex("my::pkg::Enum.VALUE 'it\\'s'"),
            vec![
                TokenKind::Identifier("my".into()),
                TokenKind::PathSeparator,
                TokenKind::Identifier("pkg".into()),
                TokenKind::PathSeparator,
                TokenKind::Identifier("Enum".into()),
                TokenKind::Dot,
                TokenKind::Identifier("VALUE".into()),
                TokenKind::String("'it\\'s'".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string_error() {
        let walker = ParseTreeWalkerSourceInformation::new("test", 0, 0);
        let err = tokenize("'oops", &walker).unwrap_err();
        assert_eq!(err.message, "Unterminated string literal");
    }

    #[test]
    fn test_error_positions_are_rebased() {
        let walker = ParseTreeWalkerSourceInformation::new("doc.pure", 7, 12);
        let err = tokenize("  ~", &walker).unwrap_err();
        let si = err.source_information.unwrap();
        assert_eq!(si.start_line, 8);
        assert_eq!(si.start_column, 15);
    }
}
