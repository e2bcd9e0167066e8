//! Primitive value sub-parser.
//!
//! Function test parameters and expected values are written as bare primitive
//! values. Those slices are re-parsed here, with coordinates rebased to the
//! value's position in the host document.
use crate::error::{EngineError, EngineResult};
use crate::island::lexer::{self, TokenCursor, TokenKind};
use crate::protocol::value::{
    CBoolean, CByteArray, CDateTime, CDecimal, CFloat, CInteger, CStrictDate, CStrictTime,
    CString, Collection, EnumValue, Multiplicity, ValueSpecification,
};
use crate::source::{ParseTreeWalkerSourceInformation, SourceInformation};
use crate::utils::names;
use crate::utils::span::Span;

/// Parse one primitive value: an atomic value or a `[...]` vector of them.
pub fn parse_primitive_value(
    input: &str,
    walker: &ParseTreeWalkerSourceInformation,
) -> EngineResult<ValueSpecification> {
    let tokens = lexer::tokenize(input, walker)?;
    let mut cursor = TokenCursor::new(tokens, walker);
    let value = if cursor.peek().kind == TokenKind::BracketOpen {
        parse_vector(&mut cursor, walker)?
    } else {
        parse_atomic(&mut cursor, walker)?
    };
    if !cursor.at_eof() {
        return Err(cursor.unexpected("end of value"));
    }
    Ok(value)
}

/// Classify a `%`-literal body (no leading `%`): values carrying a time
/// component become date-times, plain calendar dates stay strict dates.
pub fn date_literal(text: &str, source_information: Option<SourceInformation>) -> ValueSpecification {
    if text.contains('T') || text.contains(':') {
        ValueSpecification::CDateTime(CDateTime {
            value: text.to_string(),
            source_information,
        })
    } else {
        ValueSpecification::CStrictDate(CStrictDate {
            value: text.to_string(),
            source_information,
        })
    }
}

fn parse_vector(
    cursor: &mut TokenCursor,
    walker: &ParseTreeWalkerSourceInformation,
) -> EngineResult<ValueSpecification> {
    let open = cursor.expect(TokenKind::BracketOpen, "'['")?;
    let mut values = Vec::new();
    let close = if cursor.peek().kind == TokenKind::BracketClose {
        cursor.next()
    } else {
        loop {
            values.push(parse_atomic(cursor, walker)?);
            if cursor.eat(&TokenKind::Comma) {
                continue;
            }
            break cursor.expect(TokenKind::BracketClose, "']'")?;
        }
    };
    let span = open.span.merge(close.span);
    let size = values.len() as i64;
    Ok(ValueSpecification::Collection(Collection {
        multiplicity: Multiplicity::new(size, Some(size)),
        values,
        source_information: walker.node_source_information(span),
    }))
}

pub(crate) fn parse_atomic(
    cursor: &mut TokenCursor,
    walker: &ParseTreeWalkerSourceInformation,
) -> EngineResult<ValueSpecification> {
    let token = cursor.next();
    let si = walker.node_source_information(token.span);
    match token.kind {
        TokenKind::String(text) => Ok(ValueSpecification::CString(CString {
            value: names::from_grammar_string(&text, true),
            source_information: si,
        })),
        TokenKind::Integer(text) => integer(&text, token.span, walker),
        TokenKind::Float(text) => float(&text, token.span, walker),
        TokenKind::Decimal(text) => Ok(ValueSpecification::CDecimal(CDecimal {
            value: text,
            source_information: si,
        })),
        TokenKind::Date(text) => Ok(date_literal(&text, si)),
        TokenKind::StrictTime(text) => Ok(ValueSpecification::CStrictTime(CStrictTime {
            value: text,
            source_information: si,
        })),
        TokenKind::Minus => {
            let (text, span) = signed_number(cursor, token.span)?;
            match cursor_kind_of(&text) {
                NumberKind::Integer => integer(&format!("-{}", text), span, walker),
                NumberKind::Float => float(&format!("-{}", text), span, walker),
            }
        }
        TokenKind::Plus => {
            let (text, span) = signed_number(cursor, token.span)?;
            match cursor_kind_of(&text) {
                NumberKind::Integer => integer(&text, span, walker),
                NumberKind::Float => float(&text, span, walker),
            }
        }
        TokenKind::Identifier(name) if name == "true" || name == "false" => {
            Ok(ValueSpecification::CBoolean(CBoolean {
                value: name == "true",
                source_information: si,
            }))
        }
        TokenKind::Identifier(name) if name == "toBytes" => {
            byte_array(cursor, token.span, walker)
        }
        TokenKind::Identifier(name) => enum_reference(cursor, name, token.span, walker),
        _ => Err(EngineError::parser(
            "Expected a primitive value",
            walker.source_information(token.span),
        )),
    }
}

enum NumberKind {
    Integer,
    Float,
}

fn cursor_kind_of(text: &str) -> NumberKind {
    if text.contains('.') || text.contains('e') || text.contains('E') {
        NumberKind::Float
    } else {
        NumberKind::Integer
    }
}

/// After a sign token, the magnitude must follow immediately.
fn signed_number(cursor: &mut TokenCursor, sign_span: Span) -> EngineResult<(String, Span)> {
    let token = cursor.next();
    match token.kind {
        TokenKind::Integer(text) | TokenKind::Float(text) => {
            Ok((text, sign_span.merge(token.span)))
        }
        _ => Err(cursor.unexpected("a number after the sign")),
    }
}

fn integer(
    text: &str,
    span: Span,
    walker: &ParseTreeWalkerSourceInformation,
) -> EngineResult<ValueSpecification> {
    let value = text.parse::<i64>().map_err(|_| {
        EngineError::parser(
            format!("{} is not supported", text),
            walker.source_information(span),
        )
    })?;
    Ok(ValueSpecification::CInteger(CInteger {
        value,
        source_information: walker.node_source_information(span),
    }))
}

fn float(
    text: &str,
    span: Span,
    walker: &ParseTreeWalkerSourceInformation,
) -> EngineResult<ValueSpecification> {
    let value = text.parse::<f64>().map_err(|_| {
        EngineError::parser(
            format!("{} is not supported", text),
            walker.source_information(span),
        )
    })?;
    Ok(ValueSpecification::CFloat(CFloat {
        value,
        source_information: walker.node_source_information(span),
    }))
}

/// `toBytes('data')`
fn byte_array(
    cursor: &mut TokenCursor,
    start: Span,
    walker: &ParseTreeWalkerSourceInformation,
) -> EngineResult<ValueSpecification> {
    cursor.expect(TokenKind::ParenOpen, "'('")?;
    let token = cursor.next();
    let data = match token.kind {
        TokenKind::String(text) => names::from_grammar_string(&text, true),
        _ => return Err(cursor.unexpected("a string literal")),
    };
    let close = cursor.expect(TokenKind::ParenClose, "')'")?;
    Ok(ValueSpecification::CByteArray(CByteArray {
        value: data.into_bytes(),
        source_information: walker.node_source_information(start.merge(close.span)),
    }))
}

/// `pkg::Enum.VALUE`
fn enum_reference(
    cursor: &mut TokenCursor,
    first: String,
    start: Span,
    walker: &ParseTreeWalkerSourceInformation,
) -> EngineResult<ValueSpecification> {
    let mut segments = vec![first];
    while cursor.eat(&TokenKind::PathSeparator) {
        let (name, _) = cursor.expect_identifier("an identifier after '::'")?;
        segments.push(name);
    }
    cursor.expect(TokenKind::Dot, "'.' before the enum value")?;
    let (value, value_span) = cursor.expect_identifier("an enum value")?;
    Ok(ValueSpecification::EnumValue(EnumValue {
        full_path: segments.join(names::PATH_SEPARATOR),
        value,
        source_information: walker.node_source_information(start.merge(value_span)),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn walker() -> ParseTreeWalkerSourceInformation {
        ParseTreeWalkerSourceInformation::new("test", 0, 0)
    }

    fn parse(input: &str) -> ValueSpecification {
        parse_primitive_value(input, &walker()).unwrap()
    }

    #[test]
    fn test_scalars() {
        assert_matches!(parse("'hello'"), ValueSpecification::CString(s) if s.value == "hello");
        assert_matches!(parse("42"), ValueSpecification::CInteger(i) if i.value == 42);
        assert_matches!(parse("-42"), ValueSpecification::CInteger(i) if i.value == -42);
        assert_matches!(parse("2.5"), ValueSpecification::CFloat(f) if f.value == 2.5);
        assert_matches!(parse("3.14D"), ValueSpecification::CDecimal(d) if d.value == "3.14");
        assert_matches!(parse("true"), ValueSpecification::CBoolean(b) if b.value);
    }

    #[test]
    fn test_dates() {
        assert_matches!(
            parse("%2020-01-01"),
            ValueSpecification::CStrictDate(d) if d.value == "2020-01-01"
        );
        assert_matches!(
            parse("%2020-01-01T10:15:30"),
            ValueSpecification::CDateTime(d) if d.value == "2020-01-01T10:15:30"
        );
        assert_matches!(
            parse("%10:15:30"),
            ValueSpecification::CStrictTime(t) if t.value == "10:15:30"
        );
    }

    #[test]
    fn test_vector_multiplicity_matches_size() {
        let value = parse("[1, 2, 3]");
        let ValueSpecification::Collection(collection) = value else {
            panic!("expected a collection");
        };
        assert_eq!(collection.values.len(), 3);
        assert_eq!(collection.multiplicity, Multiplicity::new(3, Some(3)));
    }

    #[test]
    fn test_vector_span_ends_at_closing_bracket() {
        let value = parse_primitive_value("[1, 2]  ", &walker()).unwrap();
        let ValueSpecification::Collection(collection) = value else {
            panic!("expected a collection");
        };
        let si = collection.source_information.unwrap();
        assert_eq!(si.start_column, 1);
        // points at ']', not at whatever follows it
        assert_eq!(si.end_column, 6);
    }

    #[test]
    fn test_enum_reference() {
        let value = parse("my::pkg::Colour.RED");
        let ValueSpecification::EnumValue(e) = value else {
            panic!("expected an enum value");
        };
        assert_eq!(e.full_path, "my::pkg::Colour");
        assert_eq!(e.value, "RED");
    }

    #[test]
    fn test_byte_array() {
        let value = parse("toBytes('abc')");
        let ValueSpecification::CByteArray(b) = value else {
            panic!("expected a byte array");
        };
        assert_eq!(b.value, b"abc");
    }

    #[test]
    fn test_integer_overflow_is_a_parser_error() {
        let err = parse_primitive_value("99999999999999999999", &walker()).unwrap_err();
        assert_eq!(err.message, "99999999999999999999 is not supported");
    }

    #[test]
    fn test_trailing_input_rejected() {
        assert!(parse_primitive_value("1 2", &walker()).is_err());
    }
}
