//! Parse-tree walker: turns the typed parse tree into protocol elements.
//!
//! The walker is split by concern: element builders in [`domain`], the
//! operator-precedence expression builder in [`expression`], lambda handling
//! in [`lambda`], and island-grammar dispatch in [`island`]. All of it hangs
//! off [`DomainWalker`], which carries the coordinate base and the registry
//! of embedded parsers.
mod domain;
mod expression;
mod island;
mod lambda;

pub use lambda::LambdaContext;

use log::debug;

use crate::context::ParserContext;
use crate::cst;
use crate::error::{EngineError, EngineResult};
use crate::protocol::domain::{ImportAwareCodeSection, PackageableElement};
use crate::protocol::value::Multiplicity;
use crate::source::{ParseTreeWalkerSourceInformation, SourceInformation};
use crate::utils::span::Span;

pub struct DomainWalker<'a> {
    walker_source_information: ParseTreeWalkerSourceInformation,
    parser_context: &'a ParserContext,
}

impl<'a> DomainWalker<'a> {
    pub fn new(
        walker_source_information: ParseTreeWalkerSourceInformation,
        parser_context: &'a ParserContext,
    ) -> Self {
        Self {
            walker_source_information,
            parser_context,
        }
    }

    pub fn walker_source_information(&self) -> &ParseTreeWalkerSourceInformation {
        &self.walker_source_information
    }

    /// Walk a parsed section: imports and element paths are recorded on the
    /// section, the built elements are returned in declaration order.
    pub fn visit_definition(
        &self,
        definition: &cst::Definition,
        section: &mut ImportAwareCodeSection,
    ) -> EngineResult<Vec<PackageableElement>> {
        for import in &definition.imports {
            section.imports.push(import.full_path());
        }
        let mut elements = Vec::with_capacity(definition.elements.len());
        for element in &definition.elements {
            let element = self.visit_element(element)?;
            debug!("built element {}", element.path());
            section.elements.push(element.path());
            elements.push(element);
        }
        Ok(elements)
    }

    fn visit_element(&self, element: &cst::ElementDefinition) -> EngineResult<PackageableElement> {
        Ok(match element {
            cst::ElementDefinition::Class(ctx) => {
                PackageableElement::Class(self.visit_class(ctx)?)
            }
            cst::ElementDefinition::Association(ctx) => {
                PackageableElement::Association(self.visit_association(ctx)?)
            }
            cst::ElementDefinition::Enumeration(ctx) => {
                PackageableElement::Enumeration(self.visit_enumeration(ctx)?)
            }
            cst::ElementDefinition::Profile(ctx) => {
                PackageableElement::Profile(self.visit_profile(ctx)?)
            }
            cst::ElementDefinition::Function(ctx) => {
                PackageableElement::Function(self.visit_function(ctx)?)
            }
            cst::ElementDefinition::Measure(ctx) => {
                PackageableElement::Measure(self.visit_measure(ctx)?)
            }
        })
    }

    pub(crate) fn source_information(&self, span: Span) -> SourceInformation {
        self.walker_source_information.source_information(span)
    }

    pub(crate) fn node_source_information(&self, span: Span) -> Option<SourceInformation> {
        self.walker_source_information.node_source_information(span)
    }

    /// `[1]`, `[0..1]`, `[*]`, `[1..*]`. A single bound is both lower and
    /// upper; a sole `*` means zero to many.
    pub(crate) fn build_multiplicity(
        &self,
        arg: &cst::MultiplicityArg,
    ) -> EngineResult<Multiplicity> {
        let upper = if arg.upper == "*" {
            None
        } else {
            Some(self.multiplicity_bound(&arg.upper, arg.span)?)
        };
        let lower = match &arg.lower {
            Some(text) => self.multiplicity_bound(text, arg.span)?,
            None => upper.unwrap_or(0),
        };
        Ok(Multiplicity::new(lower, upper))
    }

    fn multiplicity_bound(&self, text: &str, span: Span) -> EngineResult<i64> {
        text.parse::<i64>().map_err(|_| {
            EngineError::parser(
                format!("Invalid multiplicity bound '{}'", text),
                self.source_information(span),
            )
        })
    }
}
