//! Island-grammar dispatch.
//!
//! An island block hands its raw content to a dedicated parser: the built-in
//! graph fetch and navigation path grammars, or an embedded parser registered
//! for the tag written in the opening delimiter. The content's coordinate
//! base is rebased so errors raised inside the island point at the host
//! document.
use log::debug;

use crate::cst;
use crate::error::{EngineError, EngineResult};
use crate::island::{graph_fetch, navigation};
use crate::protocol::value::{ClassInstance, ValueSpecification};

use super::DomainWalker;

impl DomainWalker<'_> {
    pub(crate) fn visit_island(
        &self,
        ctx: &cst::IslandDefinition,
    ) -> EngineResult<ValueSpecification> {
        match ctx {
            cst::IslandDefinition::Extension(extension) => self.island_extension(extension),
            cst::IslandDefinition::NavigationPath(block) => self.navigation_path(block),
        }
    }

    fn island_extension(&self, ctx: &cst::IslandExtension) -> EngineResult<ValueSpecification> {
        let tag = ctx.tag();
        let content: String = ctx
            .content
            .iter()
            .map(|fragment| fragment.text.as_str())
            .collect();
        let content = strip_close(&content);
        let island_walker = self
            .walker_source_information()
            .for_island(ctx.open_span, ctx.open_text.chars().count());

        if tag.is_empty() {
            if content.trim().is_empty() {
                return Err(EngineError::parser(
                    "Graph fetch tree must not be empty",
                    self.source_information(ctx.span),
                ));
            }
            return graph_fetch::parse(
                content,
                &island_walker,
                self.node_source_information(ctx.span),
            );
        }

        let Some(parser) = self.parser_context.embedded_parser(tag) else {
            return Err(EngineError::parser(
                format!(
                    "Can't find an embedded Pure parser for the type '{}' available ones: [{}]",
                    tag,
                    self.parser_context.embedded_parser_tags().join(",")
                ),
                self.source_information(ctx.span),
            ));
        };
        debug!("dispatching island content to embedded parser '{}'", tag);
        let source_information = self.source_information(ctx.span);
        let value = parser.parse(content, &island_walker, &source_information)?;
        Ok(ValueSpecification::ClassInstance(ClassInstance {
            type_: parser.type_tag().to_string(),
            value,
            source_information: self.node_source_information(ctx.span),
        }))
    }

    /// `#/Class.property#`: the delimiters are stripped and the content is
    /// rebased past the single `#`.
    fn navigation_path(&self, ctx: &cst::NavigationPathBlock) -> EngineResult<ValueSpecification> {
        let inner = ctx
            .text
            .strip_prefix('#')
            .and_then(|text| text.strip_suffix('#'))
            .unwrap_or(&ctx.text);
        let island_walker = self.walker_source_information().for_island(ctx.span, 1);
        navigation::parse(
            inner,
            &island_walker,
            self.node_source_information(ctx.span),
        )
    }
}

/// Island content includes the closing `}#`; drop it along with any trailing
/// whitespace before it.
fn strip_close(content: &str) -> &str {
    let trimmed = content.trim_end();
    trimmed.strip_suffix("}#").unwrap_or(trimmed)
}
