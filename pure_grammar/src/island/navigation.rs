//! Navigation path sub-grammar: `/Class.property.other(arg)`.
//!
//! The parsed path is wrapped in a class-instance node tagged `path`,
//! carrying the payload for downstream consumption.
use serde::Serialize;

use crate::error::{EngineError, EngineResult};
use crate::island::lexer::{self, TokenCursor, TokenKind};
use crate::island::primitive;
use crate::protocol::value::{ClassInstance, ValueSpecification};
use crate::source::{ParseTreeWalkerSourceInformation, SourceInformation};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct NavigationPath {
    #[serde(rename = "_type")]
    type_: &'static str,
    start_type: String,
    path: Vec<PropertyPathElement>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct PropertyPathElement {
    #[serde(rename = "_type")]
    type_: &'static str,
    property: String,
    parameters: Vec<ValueSpecification>,
}

/// Parse navigation content (leading and trailing `#` already stripped).
/// `source_information` covers the whole island in the host document.
pub fn parse(
    input: &str,
    walker: &ParseTreeWalkerSourceInformation,
    source_information: Option<SourceInformation>,
) -> EngineResult<ValueSpecification> {
    let tokens = lexer::tokenize(input, walker)?;
    let mut cursor = TokenCursor::new(tokens, walker);

    cursor.expect(TokenKind::Slash, "'/' at the start of a navigation path")?;
    let (start_type, _) = cursor.expect_identifier("a class name")?;

    let mut path = Vec::new();
    while cursor.eat(&TokenKind::Dot) {
        let (property, _) = cursor.expect_identifier("a property name")?;
        let mut parameters = Vec::new();
        if cursor.eat(&TokenKind::ParenOpen) {
            if !cursor.eat(&TokenKind::ParenClose) {
                loop {
                    parameters.push(primitive::parse_atomic(&mut cursor, walker)?);
                    if cursor.eat(&TokenKind::Comma) {
                        continue;
                    }
                    cursor.expect(TokenKind::ParenClose, "')'")?;
                    break;
                }
            }
        }
        path.push(PropertyPathElement {
            type_: "propertyPathElement",
            property,
            parameters,
        });
    }
    if !cursor.at_eof() {
        return Err(cursor.unexpected("'.' or end of navigation path"));
    }

    let payload = NavigationPath {
        type_: "path",
        start_type,
        path,
    };
    let value = serde_json::to_value(&payload)
        .map_err(|e| EngineError::execution(format!("Failed to serialize navigation path: {}", e)))?;
    Ok(ValueSpecification::ClassInstance(ClassInstance {
        type_: "path".to_string(),
        value,
        source_information,
    }))
}
