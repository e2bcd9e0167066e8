//! Graph fetch tree sub-grammar: `#{ Class { prop, alias: prop(args), sub { ... } } }#`.
use serde::Serialize;

use crate::error::{EngineError, EngineResult};
use crate::island::lexer::{self, TokenCursor, TokenKind};
use crate::island::primitive;
use crate::protocol::value::{ClassInstance, ValueSpecification};
use crate::source::{ParseTreeWalkerSourceInformation, SourceInformation};
use crate::utils::names;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct RootGraphFetchTree {
    #[serde(rename = "_type")]
    type_: &'static str,
    class: String,
    sub_trees: Vec<PropertyGraphFetchTree>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct PropertyGraphFetchTree {
    #[serde(rename = "_type")]
    type_: &'static str,
    property: String,
    parameters: Vec<ValueSpecification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alias: Option<String>,
    sub_trees: Vec<PropertyGraphFetchTree>,
}

/// Parse graph fetch content (trailing `}#` already stripped). The result is
/// wrapped in a class-instance node tagged `rootGraphFetchTree`.
pub fn parse(
    input: &str,
    walker: &ParseTreeWalkerSourceInformation,
    source_information: Option<SourceInformation>,
) -> EngineResult<ValueSpecification> {
    let tokens = lexer::tokenize(input, walker)?;
    let mut cursor = TokenCursor::new(tokens, walker);

    let class = qualified_name(&mut cursor)?;
    let sub_trees = sub_tree_block(&mut cursor, walker)?;
    if !cursor.at_eof() {
        return Err(cursor.unexpected("end of graph fetch tree"));
    }

    let payload = RootGraphFetchTree {
        type_: "rootGraphFetchTree",
        class,
        sub_trees,
    };
    let value = serde_json::to_value(&payload).map_err(|e| {
        EngineError::execution(format!("Failed to serialize graph fetch tree: {}", e))
    })?;
    Ok(ValueSpecification::ClassInstance(ClassInstance {
        type_: "rootGraphFetchTree".to_string(),
        value,
        source_information,
    }))
}

fn qualified_name(cursor: &mut TokenCursor) -> EngineResult<String> {
    let (first, _) = cursor.expect_identifier("a class name")?;
    let mut segments = vec![first];
    while cursor.eat(&TokenKind::PathSeparator) {
        let (next, _) = cursor.expect_identifier("an identifier after '::'")?;
        segments.push(next);
    }
    Ok(segments.join(names::PATH_SEPARATOR))
}

/// `{ property (, property)* }`
fn sub_tree_block(
    cursor: &mut TokenCursor,
    walker: &ParseTreeWalkerSourceInformation,
) -> EngineResult<Vec<PropertyGraphFetchTree>> {
    cursor.expect(TokenKind::BraceOpen, "'{'")?;
    let mut trees = Vec::new();
    loop {
        trees.push(property_tree(cursor, walker)?);
        if cursor.eat(&TokenKind::Comma) {
            continue;
        }
        cursor.expect(TokenKind::BraceClose, "'}'")?;
        return Ok(trees);
    }
}

fn property_tree(
    cursor: &mut TokenCursor,
    walker: &ParseTreeWalkerSourceInformation,
) -> EngineResult<PropertyGraphFetchTree> {
    let (first, _) = cursor.expect_identifier("a property name")?;
    // `alias: property` form
    let (alias, property) = if cursor.eat(&TokenKind::Colon) {
        let (property, _) = cursor.expect_identifier("a property name after the alias")?;
        (Some(first), property)
    } else {
        (None, first)
    };

    let mut parameters = Vec::new();
    if cursor.eat(&TokenKind::ParenOpen) {
        if !cursor.eat(&TokenKind::ParenClose) {
            loop {
                parameters.push(primitive::parse_atomic(cursor, walker)?);
                if cursor.eat(&TokenKind::Comma) {
                    continue;
                }
                cursor.expect(TokenKind::ParenClose, "')'")?;
                break;
            }
        }
    }

    let sub_trees = if cursor.peek().kind == TokenKind::BraceOpen {
        sub_tree_block(cursor, walker)?
    } else {
        Vec::new()
    };

    Ok(PropertyGraphFetchTree {
        type_: "propertyGraphFetchTree",
        property,
        parameters,
        alias,
        sub_trees,
    })
}
