//! Lambda building and the naming context threaded through a walk.
use crate::cst;
use crate::error::EngineResult;
use crate::protocol::value::{Lambda, ValueSpecification, Variable};
use crate::utils::names;

use super::DomainWalker;

/// Source of synthetic lambda names within one element walk.
///
/// Every lambda built while walking an element draws the next name from the
/// element's context (`owner$0`, `owner$1`, ...), so names are deterministic
/// across re-parses of identical source.
#[derive(Debug, Clone)]
pub struct LambdaContext {
    owner: String,
    counter: u32,
}

impl LambdaContext {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            counter: 0,
        }
    }

    /// Context for an element path; package separators are flattened so the
    /// drawn names stay identifier-shaped.
    pub fn for_element(path: &str) -> Self {
        Self::new(path.replace(names::PATH_SEPARATOR, "_"))
    }

    pub fn next_name(&mut self) -> String {
        let name = format!("{}${}", self.owner, self.counter);
        self.counter += 1;
        name
    }
}

impl DomainWalker<'_> {
    /// Build a lambda from any of its written forms (`{x, y | ...}`,
    /// `x | ...`, `| ...`), drawing its name from the context.
    pub(crate) fn process_lambda(
        &self,
        ctx: &cst::LambdaDefinition,
        lambda_context: &mut LambdaContext,
    ) -> EngineResult<Lambda> {
        let parameters = ctx
            .parameters
            .iter()
            .map(|param| self.lambda_param(param))
            .collect::<EngineResult<Vec<_>>>()?;
        let body = self.code_block(&ctx.body, lambda_context)?;
        Ok(Lambda {
            name: Some(lambda_context.next_name()),
            parameters,
            body,
            source_information: self.node_source_information(ctx.pipe_span),
        })
    }

    /// Untyped parameters carry only their name; typed ones also get their
    /// declared class, multiplicity, and position.
    fn lambda_param(&self, param: &cst::LambdaParam) -> EngineResult<Variable> {
        match &param.type_ {
            Some((type_, multiplicity)) => Ok(Variable {
                name: param.name.name(),
                class: Some(type_.text()),
                multiplicity: Some(self.build_multiplicity(multiplicity)?),
                source_information: self.node_source_information(param.span),
            }),
            None => Ok(Variable {
                name: param.name.name(),
                class: None,
                multiplicity: None,
                source_information: None,
            }),
        }
    }

    pub(crate) fn code_block(
        &self,
        block: &cst::CodeBlock,
        lambda_context: &mut LambdaContext,
    ) -> EngineResult<Vec<ValueSpecification>> {
        block
            .lines
            .iter()
            .map(|line| match line {
                cst::ProgramLine::Expression(expression) => {
                    self.combined_expression(expression, lambda_context)
                }
                cst::ProgramLine::Let(let_expression) => {
                    self.let_expression(let_expression, lambda_context)
                }
            })
            .collect()
    }

    /// Entry point for a bare code block used where a lambda is expected.
    /// A block that is a single written lambda is returned as-is; anything
    /// else is wrapped in an anonymous one.
    pub fn code_block_lambda(
        &self,
        block: &cst::CodeBlock,
        lambda_context: &mut LambdaContext,
    ) -> EngineResult<Lambda> {
        let mut body = self.code_block(block, lambda_context)?;
        if body.len() == 1 {
            match body.pop() {
                Some(ValueSpecification::Lambda(lambda)) => return Ok(lambda),
                Some(other) => body.push(other),
                None => {}
            }
        }
        Ok(Lambda {
            name: None,
            parameters: vec![],
            body,
            source_information: self.node_source_information(block.span),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_drawn_in_sequence() {
        let mut context = LambdaContext::new("getAge");
        assert_eq!(context.next_name(), "getAge$0");
        assert_eq!(context.next_name(), "getAge$1");
        assert_eq!(context.next_name(), "getAge$2");
    }

    #[test]
    fn test_element_context_flattens_path() {
        let mut context = LambdaContext::for_element("model::domain::Person");
        assert_eq!(context.next_name(), "model_domain_Person$0");
    }
}
