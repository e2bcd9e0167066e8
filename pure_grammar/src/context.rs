//! Parser context: the registry of pluggable embedded parsers available to a
//! walk.
use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::error::EngineResult;
use crate::source::{ParseTreeWalkerSourceInformation, SourceInformation};

/// A parser for extension-owned island content (`#Tag{...}#`).
///
/// Implementations receive the island text with a coordinate base already
/// rebased to the island's position, so any error they raise points at the
/// true location in the host document.
pub trait EmbeddedParser: Send + Sync {
    /// The tag this parser handles, as written in the opening delimiter.
    fn type_tag(&self) -> &str;

    /// Parse the island content into an opaque payload. `source_information`
    /// covers the whole island in the host document.
    fn parse(
        &self,
        content: &str,
        walker_source_information: &ParseTreeWalkerSourceInformation,
        source_information: &SourceInformation,
    ) -> EngineResult<JsonValue>;
}

/// Context threaded through a walk. Holds the embedded parsers keyed by tag;
/// the map is ordered so error messages list available tags deterministically.
#[derive(Default, Clone)]
pub struct ParserContext {
    embedded_parsers: BTreeMap<String, Arc<dyn EmbeddedParser>>,
}

impl ParserContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an embedded parser under its declared tag. A later
    /// registration with the same tag replaces the earlier one.
    pub fn register_embedded_parser(&mut self, parser: Arc<dyn EmbeddedParser>) {
        self.embedded_parsers
            .insert(parser.type_tag().to_string(), parser);
    }

    pub fn embedded_parser(&self, tag: &str) -> Option<&Arc<dyn EmbeddedParser>> {
        self.embedded_parsers.get(tag)
    }

    /// Registered tags in sorted order.
    pub fn embedded_parser_tags(&self) -> Vec<&str> {
        self.embedded_parsers.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for ParserContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserContext")
            .field("embedded_parsers", &self.embedded_parser_tags())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    impl EmbeddedParser for Fixed {
        fn type_tag(&self) -> &str {
            self.0
        }

        fn parse(
            &self,
            content: &str,
            _walker_source_information: &ParseTreeWalkerSourceInformation,
            _source_information: &SourceInformation,
        ) -> EngineResult<JsonValue> {
            Ok(JsonValue::String(content.to_string()))
        }
    }

    #[test]
    fn test_tags_are_sorted() {
        let mut context = ParserContext::new();
        context.register_embedded_parser(Arc::new(Fixed("Relational")));
        context.register_embedded_parser(Arc::new(Fixed("Binding")));
        assert_eq!(context.embedded_parser_tags(), vec!["Binding", "Relational"]);
        assert!(context.embedded_parser("Relational").is_some());
        assert!(context.embedded_parser("Unknown").is_none());
    }
}
