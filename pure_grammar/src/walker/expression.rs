//! Expression building with operator-precedence resolution.
//!
//! The grammar hands over a primary expression followed by a flat run of
//! operator fragments. Boolean and arithmetic fragments are buffered
//! separately: whenever the kind switches, the pending buffer is folded into
//! the opposite side's running result, so `a + b > c or d` becomes
//! `or(greaterThan(plus(a, b), c), d)`.
//!
//! Within an arithmetic run, `+`, `-` and `*` build n-ary nodes over a
//! collection of operands while `/` and the comparisons stay binary. A
//! higher-precedence operator arriving after a lower-precedence node steals
//! that node's last operand.
use crate::cst;
use crate::error::{EngineError, EngineResult};
use crate::island::primitive;
use crate::protocol::value::{
    AppliedFunction, AppliedProperty, CBoolean, CDecimal, CFloat, CInteger, CLatestDate, CString,
    CStrictTime, Collection, GenericTypeInstance, KeyExpression, Multiplicity,
    PackageableElementPtr, UnitType, ValueSpecification, Variable,
};
use crate::utils::span::Span;

use super::{DomainWalker, LambdaContext};

impl DomainWalker<'_> {
    pub(crate) fn combined_expression(
        &self,
        ctx: &cst::CombinedExpression,
        lambda_context: &mut LambdaContext,
    ) -> EngineResult<ValueSpecification> {
        let primary = self.expression(&ctx.expression, lambda_context)?;
        if ctx.parts.is_empty() {
            return Ok(primary);
        }
        let mut bool_result = primary.clone();
        let mut arith_result = primary;
        let mut arithmetic: Vec<&cst::ArithmeticPart> = Vec::new();
        let mut boolean: Vec<&cst::BooleanPart> = Vec::new();
        for part in &ctx.parts {
            match part {
                cst::ExpressionPart::Arithmetic(fragment) => {
                    if !boolean.is_empty() {
                        bool_result =
                            self.boolean_chain(&boolean, arith_result.clone(), lambda_context)?;
                        boolean.clear();
                    }
                    arithmetic.push(fragment);
                }
                cst::ExpressionPart::Boolean(fragment) => {
                    if !arithmetic.is_empty() {
                        arith_result =
                            self.arithmetic_chain(&arithmetic, bool_result.clone(), lambda_context)?;
                        arithmetic.clear();
                    }
                    boolean.push(fragment);
                }
            }
        }
        if !arithmetic.is_empty() {
            self.arithmetic_chain(&arithmetic, bool_result, lambda_context)
        } else {
            self.boolean_chain(&boolean, arith_result, lambda_context)
        }
    }

    /// Fold a run of arithmetic fragments over an input expression.
    fn arithmetic_chain(
        &self,
        parts: &[&cst::ArithmeticPart],
        input: ValueSpecification,
        lambda_context: &mut LambdaContext,
    ) -> EngineResult<ValueSpecification> {
        let mut applied: Option<AppliedFunction> = None;
        for part in parts {
            let next = if is_comparison(part.op) {
                let left = match applied.take() {
                    Some(previous) => ValueSpecification::AppliedFunction(previous),
                    None => input.clone(),
                };
                self.build_comparison(part, left, lambda_context)?
            } else {
                self.process_op(applied.take(), part, &input, lambda_context)?
            };
            applied = Some(next);
        }
        match applied {
            Some(applied) => Ok(ValueSpecification::AppliedFunction(applied)),
            None => Ok(input),
        }
    }

    /// Attach one `+`/`-`/`*`/`/` fragment to the node built so far.
    ///
    /// When the fragment's operator binds tighter than the previous node's,
    /// the previous node keeps its place and its last operand is rebuilt
    /// around the new operator; otherwise the previous node becomes the new
    /// node's first operand.
    fn process_op(
        &self,
        applied: Option<AppliedFunction>,
        part: &cst::ArithmeticPart,
        input: &ValueSpecification,
        lambda_context: &mut LambdaContext,
    ) -> EngineResult<AppliedFunction> {
        let Some(mut previous) = applied else {
            return self.build_arithmetic_op(part, input.clone(), lambda_context);
        };
        if is_strictly_lower_precedence(&previous.function, part.op) {
            if is_comparison_function(&previous.function) {
                // binary comparison node: rebuild its right operand
                if let Some(last) = previous.parameters.pop() {
                    let nested = self.build_arithmetic_op(part, last, lambda_context)?;
                    previous.parameters.truncate(1);
                    previous
                        .parameters
                        .push(ValueSpecification::AppliedFunction(nested));
                }
            } else if let Some(ValueSpecification::Collection(collection)) =
                previous.parameters.first_mut()
            {
                // n-ary node: rebuild the last collected operand
                if let Some(last) = collection.values.pop() {
                    let nested = self.build_arithmetic_op(part, last, lambda_context)?;
                    collection
                        .values
                        .push(ValueSpecification::AppliedFunction(nested));
                    collection.source_information = self.node_source_information(part.span);
                }
            }
            Ok(previous)
        } else {
            self.build_arithmetic_op(
                part,
                ValueSpecification::AppliedFunction(previous),
                lambda_context,
            )
        }
    }

    /// `+`, `-` and `*` take all the fragment's operands at once, collected
    /// after the initial input; `/` folds left into nested binary nodes.
    fn build_arithmetic_op(
        &self,
        part: &cst::ArithmeticPart,
        initial: ValueSpecification,
        lambda_context: &mut LambdaContext,
    ) -> EngineResult<AppliedFunction> {
        let operands = part
            .operands
            .iter()
            .map(|operand| self.expression(operand, lambda_context))
            .collect::<EngineResult<Vec<_>>>()?;
        match part.op {
            cst::ArithOp::Plus | cst::ArithOp::Minus | cst::ArithOp::Times => {
                let mut values = Vec::with_capacity(operands.len() + 1);
                values.push(initial);
                values.extend(operands);
                Ok(AppliedFunction {
                    function: part.op.function_name().to_string(),
                    parameters: vec![self.collect(values, part.span)],
                    source_information: self.node_source_information(part.span),
                })
            }
            _ => {
                let mut operands = operands.into_iter();
                let first = operands.next().ok_or_else(|| {
                    EngineError::parser(
                        "Expected an operand",
                        self.source_information(part.span),
                    )
                })?;
                let mut applied = AppliedFunction {
                    function: part.op.function_name().to_string(),
                    parameters: vec![initial, first],
                    source_information: self.node_source_information(part.span),
                };
                for operand in operands {
                    applied = AppliedFunction {
                        function: part.op.function_name().to_string(),
                        parameters: vec![ValueSpecification::AppliedFunction(applied), operand],
                        source_information: self.node_source_information(part.span),
                    };
                }
                Ok(applied)
            }
        }
    }

    fn build_comparison(
        &self,
        part: &cst::ArithmeticPart,
        left: ValueSpecification,
        lambda_context: &mut LambdaContext,
    ) -> EngineResult<AppliedFunction> {
        let operand = part.operands.first().ok_or_else(|| {
            EngineError::parser("Expected an operand", self.source_information(part.span))
        })?;
        let right = self.expression(operand, lambda_context)?;
        Ok(AppliedFunction {
            function: part.op.function_name().to_string(),
            parameters: vec![left, right],
            source_information: self.node_source_information(part.span),
        })
    }

    /// Fold a run of `and`/`or` fragments. `and` binds tighter: when it
    /// follows an `or` node it steals that node's right operand.
    fn boolean_chain(
        &self,
        parts: &[&cst::BooleanPart],
        input: ValueSpecification,
        lambda_context: &mut LambdaContext,
    ) -> EngineResult<ValueSpecification> {
        let mut applied: Option<AppliedFunction> = None;
        for part in parts {
            let next = match applied.take() {
                None => self.build_boolean_op(part, input.clone(), lambda_context)?,
                Some(mut previous) => {
                    if previous.function == "or" && part.op == cst::BoolOp::And {
                        if let Some(last) = previous.parameters.pop() {
                            let nested = self.build_boolean_op(part, last, lambda_context)?;
                            previous.parameters.truncate(1);
                            previous
                                .parameters
                                .push(ValueSpecification::AppliedFunction(nested));
                        }
                        previous
                    } else {
                        self.build_boolean_op(
                            part,
                            ValueSpecification::AppliedFunction(previous),
                            lambda_context,
                        )?
                    }
                }
            };
            applied = Some(next);
        }
        match applied {
            Some(applied) => Ok(ValueSpecification::AppliedFunction(applied)),
            None => Ok(input),
        }
    }

    fn build_boolean_op(
        &self,
        part: &cst::BooleanPart,
        left: ValueSpecification,
        lambda_context: &mut LambdaContext,
    ) -> EngineResult<AppliedFunction> {
        let right = self.expression(&part.operand, lambda_context)?;
        Ok(AppliedFunction {
            function: part.op.function_name().to_string(),
            parameters: vec![left, right],
            source_information: self.node_source_information(part.span),
        })
    }

    /// `== right` becomes `equal(left, right)`; `!=` wraps it in `not`.
    fn equal_not_equal(
        &self,
        ctx: &cst::EqualNotEqual,
        input: ValueSpecification,
        lambda_context: &mut LambdaContext,
    ) -> EngineResult<ValueSpecification> {
        let right = self.combined_arithmetic_only(&ctx.right, lambda_context)?;
        let equal = AppliedFunction {
            function: "equal".to_string(),
            parameters: vec![input, right],
            source_information: self.node_source_information(ctx.op_span),
        };
        if ctx.negated {
            Ok(ValueSpecification::AppliedFunction(AppliedFunction {
                function: "not".to_string(),
                parameters: vec![ValueSpecification::AppliedFunction(equal)],
                source_information: self.node_source_information(ctx.op_span),
            }))
        } else {
            Ok(ValueSpecification::AppliedFunction(equal))
        }
    }

    fn combined_arithmetic_only(
        &self,
        ctx: &cst::CombinedArithmeticOnly,
        lambda_context: &mut LambdaContext,
    ) -> EngineResult<ValueSpecification> {
        let primary = self.expression(&ctx.expression, lambda_context)?;
        if ctx.parts.is_empty() {
            return Ok(primary);
        }
        let parts: Vec<&cst::ArithmeticPart> = ctx.parts.iter().collect();
        self.arithmetic_chain(&parts, primary, lambda_context)
    }

    pub(crate) fn expression(
        &self,
        ctx: &cst::Expression,
        lambda_context: &mut LambdaContext,
    ) -> EngineResult<ValueSpecification> {
        let mut result = match &ctx.base {
            cst::BaseExpression::Combined(combined) => {
                self.combined_expression(combined, lambda_context)?
            }
            cst::BaseExpression::Atomic(atomic) => self.atomic_expression(atomic, lambda_context)?,
            cst::BaseExpression::Not { expression, span } => {
                ValueSpecification::AppliedFunction(AppliedFunction {
                    function: "not".to_string(),
                    parameters: vec![self.expression(expression, lambda_context)?],
                    source_information: self.node_source_information(*span),
                })
            }
            cst::BaseExpression::Signed {
                negative,
                expression,
                op_span,
                ..
            } => ValueSpecification::AppliedFunction(AppliedFunction {
                function: if *negative { "minus" } else { "plus" }.to_string(),
                parameters: vec![self.expression(expression, lambda_context)?],
                source_information: self.node_source_information(*op_span),
            }),
            cst::BaseExpression::Array { expressions, span } => {
                let values = expressions
                    .iter()
                    .map(|expression| self.expression(expression, lambda_context))
                    .collect::<EngineResult<Vec<_>>>()?;
                self.collect(values, *span)
            }
        };
        for application in &ctx.applications {
            result = match application {
                cst::PropertyOrFunctionApplication::Property(property) => {
                    self.property_application(property, result, lambda_context)?
                }
                cst::PropertyOrFunctionApplication::Function(function) => {
                    let mut current = result;
                    for call in &function.calls {
                        let mut parameters = Vec::with_capacity(call.arguments.len() + 1);
                        parameters.push(current);
                        for argument in &call.arguments {
                            parameters.push(self.combined_expression(argument, lambda_context)?);
                        }
                        current = ValueSpecification::AppliedFunction(AppliedFunction {
                            function: call.name.full_path(),
                            parameters,
                            source_information: self.node_source_information(call.name.span),
                        });
                    }
                    current
                }
            };
        }
        if let Some(equal_not_equal) = &ctx.equal_not_equal {
            result = self.equal_not_equal(equal_not_equal, result, lambda_context)?;
        }
        Ok(result)
    }

    fn property_application(
        &self,
        ctx: &cst::PropertyApplication,
        input: ValueSpecification,
        lambda_context: &mut LambdaContext,
    ) -> EngineResult<ValueSpecification> {
        let mut parameters = vec![input];
        match &ctx.arguments {
            None => {}
            Some(cst::PropertyArguments::Expressions(arguments)) => {
                for argument in arguments {
                    parameters.push(self.combined_expression(argument, lambda_context)?);
                }
            }
            Some(cst::PropertyArguments::LatestDates { count, span }) => {
                for _ in 0..*count {
                    parameters.push(ValueSpecification::CLatestDate(CLatestDate {
                        source_information: self.node_source_information(*span),
                    }));
                }
            }
        }
        Ok(ValueSpecification::AppliedProperty(AppliedProperty {
            property: ctx.property.name(),
            parameters,
            source_information: self.node_source_information(ctx.property.span),
        }))
    }

    fn atomic_expression(
        &self,
        ctx: &cst::AtomicExpression,
        lambda_context: &mut LambdaContext,
    ) -> EngineResult<ValueSpecification> {
        match ctx {
            cst::AtomicExpression::Literal(literal) => self.literal(literal),
            cst::AtomicExpression::Island(island) => self.visit_island(island),
            cst::AtomicExpression::New(new_instance) => {
                self.new_instance(new_instance, lambda_context)
            }
            cst::AtomicExpression::Variable(variable) => {
                Ok(ValueSpecification::Variable(Variable {
                    name: variable.name.name(),
                    class: None,
                    multiplicity: None,
                    source_information: self.node_source_information(variable.span),
                }))
            }
            cst::AtomicExpression::TypeReference(type_) => Ok(match type_ {
                cst::TypeRef::Named(name) => {
                    ValueSpecification::GenericTypeInstance(GenericTypeInstance {
                        full_path: name.full_path(),
                        source_information: self.node_source_information(name.span),
                    })
                }
                cst::TypeRef::Unit(unit) => ValueSpecification::UnitType(UnitType {
                    unit_type: unit.full_path(),
                    source_information: self.node_source_information(unit.span),
                }),
            }),
            cst::AtomicExpression::Lambda(lambda) => Ok(ValueSpecification::Lambda(
                self.process_lambda(lambda, lambda_context)?,
            )),
            cst::AtomicExpression::InstanceReference(reference) => {
                self.instance_reference(reference, lambda_context)
            }
        }
    }

    fn literal(&self, ctx: &cst::Literal) -> EngineResult<ValueSpecification> {
        match ctx {
            cst::Literal::String(literal) => Ok(ValueSpecification::CString(CString {
                value: literal.value(),
                source_information: self.node_source_information(literal.span),
            })),
            cst::Literal::Integer { text, span } => {
                let value = text.parse::<i64>().map_err(|_| {
                    EngineError::parser(
                        format!("{} is not supported", text),
                        self.source_information(*span),
                    )
                })?;
                Ok(ValueSpecification::CInteger(CInteger {
                    value,
                    source_information: self.node_source_information(*span),
                }))
            }
            cst::Literal::Float { text, span } => {
                let value = text.parse::<f64>().map_err(|_| {
                    EngineError::parser(
                        format!("{} is not supported", text),
                        self.source_information(*span),
                    )
                })?;
                Ok(ValueSpecification::CFloat(CFloat {
                    value,
                    source_information: self.node_source_information(*span),
                }))
            }
            cst::Literal::Decimal { text, span } => {
                let value = text
                    .strip_suffix('D')
                    .or_else(|| text.strip_suffix('d'))
                    .unwrap_or(text);
                Ok(ValueSpecification::CDecimal(CDecimal {
                    value: value.to_string(),
                    source_information: self.node_source_information(*span),
                }))
            }
            cst::Literal::Date(date) => {
                let body = date.text.strip_prefix('%').unwrap_or(&date.text);
                Ok(primitive::date_literal(
                    body,
                    self.node_source_information(date.span),
                ))
            }
            cst::Literal::StrictTime { text, span } => {
                let value = text.strip_prefix('%').unwrap_or(text);
                Ok(ValueSpecification::CStrictTime(CStrictTime {
                    value: value.to_string(),
                    source_information: self.node_source_information(*span),
                }))
            }
            cst::Literal::Boolean { text, span } => Ok(ValueSpecification::CBoolean(CBoolean {
                value: text == "true",
                source_information: self.node_source_information(*span),
            })),
        }
    }

    fn instance_reference(
        &self,
        ctx: &cst::InstanceReference,
        lambda_context: &mut LambdaContext,
    ) -> EngineResult<ValueSpecification> {
        match (&ctx.target, &ctx.all_or_function) {
            (cst::InstanceTarget::Element(name), None) => {
                Ok(ValueSpecification::PackageableElementPtr(
                    PackageableElementPtr {
                        full_path: name.full_path(),
                        source_information: self.node_source_information(name.span),
                    },
                ))
            }
            (cst::InstanceTarget::Unit(unit), None) => Ok(ValueSpecification::UnitType(UnitType {
                unit_type: unit.full_path(),
                source_information: self.node_source_information(unit.span),
            })),
            (cst::InstanceTarget::Element(name), Some(all_or_function)) => {
                self.all_or_function(all_or_function, name, lambda_context)
            }
            (cst::InstanceTarget::Unit(_), Some(_)) | (cst::InstanceTarget::Empty, _) => {
                Err(EngineError::parser(
                    "Expected a non-empty function caller",
                    self.source_information(ctx.span),
                ))
            }
        }
    }

    fn all_or_function(
        &self,
        ctx: &cst::AllOrFunction,
        name: &cst::QualifiedName,
        lambda_context: &mut LambdaContext,
    ) -> EngineResult<ValueSpecification> {
        let element = ValueSpecification::PackageableElementPtr(PackageableElementPtr {
            full_path: name.full_path(),
            source_information: self.node_source_information(name.span),
        });
        match ctx {
            cst::AllOrFunction::All { span } => {
                Ok(ValueSpecification::AppliedFunction(AppliedFunction {
                    function: "getAll".to_string(),
                    parameters: vec![element],
                    source_information: self.node_source_information(*span),
                }))
            }
            cst::AllOrFunction::AllVersions { span } => {
                Ok(ValueSpecification::AppliedFunction(AppliedFunction {
                    function: "getAllVersions".to_string(),
                    parameters: vec![element],
                    source_information: self.node_source_information(*span),
                }))
            }
            cst::AllOrFunction::AllVersionsInRange { text, span } => Err(EngineError::parser(
                format!("{} is not supported", text),
                self.source_information(*span),
            )),
            cst::AllOrFunction::Milestoning { arguments, span } => {
                let mut parameters = vec![element];
                for argument in arguments {
                    parameters.push(match argument {
                        cst::MilestoningArgument::Variable(variable) => {
                            ValueSpecification::Variable(Variable {
                                name: variable.name.name(),
                                class: None,
                                multiplicity: None,
                                source_information: self.node_source_information(variable.span),
                            })
                        }
                        cst::MilestoningArgument::Date(date) => {
                            let body = date.text.strip_prefix('%').unwrap_or(&date.text);
                            primitive::date_literal(body, self.node_source_information(date.span))
                        }
                        cst::MilestoningArgument::Latest { span } => {
                            ValueSpecification::CLatestDate(CLatestDate {
                                source_information: self.node_source_information(*span),
                            })
                        }
                    });
                }
                Ok(ValueSpecification::AppliedFunction(AppliedFunction {
                    function: "getAll".to_string(),
                    parameters,
                    source_information: self.node_source_information(*span),
                }))
            }
            cst::AllOrFunction::Call { arguments, .. } => {
                let parameters = arguments
                    .iter()
                    .map(|argument| self.combined_expression(argument, lambda_context))
                    .collect::<EngineResult<Vec<_>>>()?;
                Ok(ValueSpecification::AppliedFunction(AppliedFunction {
                    function: name.full_path(),
                    parameters,
                    source_information: self.node_source_information(name.span),
                }))
            }
        }
    }

    /// `^Class(key = value, ...)` builds a `new` application: the class
    /// pointer, an empty variable name, and the key expressions collected.
    fn new_instance(
        &self,
        ctx: &cst::NewInstance,
        lambda_context: &mut LambdaContext,
    ) -> EngineResult<ValueSpecification> {
        let mut keys = Vec::with_capacity(ctx.assignments.len());
        for assignment in &ctx.assignments {
            let Some(value) = &assignment.value else {
                return Err(EngineError::parser(
                    format!(
                        "Expected a value for property '{}'",
                        assignment.property.name()
                    ),
                    self.source_information(assignment.span),
                ));
            };
            let expression = self.combined_expression(value, lambda_context)?;
            keys.push(ValueSpecification::KeyExpression(KeyExpression {
                // the key keeps the raw identifier text, quotes included
                key: Box::new(ValueSpecification::CString(CString {
                    value: assignment.property.text.clone(),
                    source_information: None,
                })),
                expression: Box::new(expression),
                source_information: self.node_source_information(assignment.span),
            }));
        }
        Ok(ValueSpecification::AppliedFunction(AppliedFunction {
            function: "new".to_string(),
            parameters: vec![
                ValueSpecification::PackageableElementPtr(PackageableElementPtr {
                    full_path: ctx.class.full_path(),
                    source_information: self.node_source_information(ctx.class.span),
                }),
                ValueSpecification::CString(CString {
                    value: String::new(),
                    source_information: None,
                }),
                self.collect(keys, ctx.span),
            ],
            source_information: self.node_source_information(ctx.span),
        }))
    }

    /// `let name = value` becomes `letFunction('name', value)`; both the
    /// name and the value report the whole statement's position.
    pub(crate) fn let_expression(
        &self,
        ctx: &cst::LetExpression,
        lambda_context: &mut LambdaContext,
    ) -> EngineResult<ValueSpecification> {
        let mut value = self.combined_expression(&ctx.value, lambda_context)?;
        let source_information = self.node_source_information(ctx.span);
        value.set_source_information(source_information.clone());
        Ok(ValueSpecification::AppliedFunction(AppliedFunction {
            function: "letFunction".to_string(),
            parameters: vec![
                ValueSpecification::CString(CString {
                    value: ctx.name.name(),
                    source_information: source_information.clone(),
                }),
                value,
            ],
            source_information,
        }))
    }

    /// Collect values with a size-exact multiplicity.
    pub(crate) fn collect(&self, values: Vec<ValueSpecification>, span: Span) -> ValueSpecification {
        let size = values.len() as i64;
        ValueSpecification::Collection(Collection {
            multiplicity: Multiplicity::new(size, Some(size)),
            values,
            source_information: self.node_source_information(span),
        })
    }
}

fn is_comparison(op: cst::ArithOp) -> bool {
    matches!(
        op,
        cst::ArithOp::LessThan
            | cst::ArithOp::LessThanEqual
            | cst::ArithOp::GreaterThan
            | cst::ArithOp::GreaterThanEqual
    )
}

fn is_comparison_function(name: &str) -> bool {
    matches!(
        name,
        "lessThan" | "lessThanEqual" | "greaterThan" | "greaterThanEqual"
    )
}

/// True when the node built for `previous` must keep its place and absorb
/// the `next` operator into its last operand.
fn is_strictly_lower_precedence(previous: &str, next: cst::ArithOp) -> bool {
    let next_additive = matches!(next, cst::ArithOp::Plus | cst::ArithOp::Minus);
    let next_product = matches!(
        next,
        cst::ArithOp::Times | cst::ArithOp::Divide
    );
    (is_comparison_function(previous) && (next_additive || next_product))
        || (matches!(previous, "plus" | "minus") && next_product)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ParserContext;
    use crate::cst::{
        ArithOp, ArithmeticPart, AtomicExpression, BaseExpression, BoolOp, BooleanPart,
        CombinedExpression, EqualNotEqual, Expression, ExpressionPart, Identifier, LetExpression,
        Literal, VariableRef,
    };
    use crate::source::ParseTreeWalkerSourceInformation;

    fn dummy() -> Span {
        Span::dummy()
    }

    fn int(n: i64) -> Expression {
        Expression {
            base: BaseExpression::Atomic(AtomicExpression::Literal(Literal::Integer {
                text: n.to_string(),
                span: dummy(),
            })),
            applications: vec![],
            equal_not_equal: None,
            span: dummy(),
        }
    }

    fn var(name: &str) -> Expression {
        Expression {
            base: BaseExpression::Atomic(AtomicExpression::Variable(VariableRef {
                name: Identifier::new(name, dummy()),
                span: dummy(),
            })),
            applications: vec![],
            equal_not_equal: None,
            span: dummy(),
        }
    }

    fn arith(op: ArithOp, operands: Vec<Expression>) -> ExpressionPart {
        ExpressionPart::Arithmetic(ArithmeticPart {
            op,
            op_span: dummy(),
            operands,
            span: dummy(),
        })
    }

    fn boolean(op: BoolOp, operand: Expression) -> ExpressionPart {
        ExpressionPart::Boolean(BooleanPart {
            op,
            op_span: dummy(),
            operand,
            span: dummy(),
        })
    }

    fn combined(primary: Expression, parts: Vec<ExpressionPart>) -> CombinedExpression {
        CombinedExpression {
            expression: Box::new(primary),
            parts,
            span: dummy(),
        }
    }

    fn walk(expression: &CombinedExpression) -> ValueSpecification {
        let context = ParserContext::new();
        let walker = DomainWalker::new(
            ParseTreeWalkerSourceInformation::new("test", 0, 0),
            &context,
        );
        let mut lambda_context = LambdaContext::new("test");
        walker
            .combined_expression(expression, &mut lambda_context)
            .unwrap()
    }

    fn as_func(value: &ValueSpecification) -> &AppliedFunction {
        match value {
            ValueSpecification::AppliedFunction(applied) => applied,
            other => panic!("expected an applied function, got {:?}", other),
        }
    }

    fn as_collection(value: &ValueSpecification) -> &Collection {
        match value {
            ValueSpecification::Collection(collection) => collection,
            other => panic!("expected a collection, got {:?}", other),
        }
    }

    fn as_int(value: &ValueSpecification) -> i64 {
        match value {
            ValueSpecification::CInteger(n) => n.value,
            other => panic!("expected an integer, got {:?}", other),
        }
    }

    #[test]
    fn test_times_binds_tighter_than_plus() {
        // 1 + 2 * 3  =>  plus([1, times([2, 3])])
        let result = walk(&combined(
            int(1),
            vec![
                arith(ArithOp::Plus, vec![int(2)]),
                arith(ArithOp::Times, vec![int(3)]),
            ],
        ));
        let plus = as_func(&result);
        assert_eq!(plus.function, "plus");
        let operands = &as_collection(&plus.parameters[0]).values;
        assert_eq!(as_int(&operands[0]), 1);
        let times = as_func(&operands[1]);
        assert_eq!(times.function, "times");
        let inner = &as_collection(&times.parameters[0]).values;
        assert_eq!(as_int(&inner[0]), 2);
        assert_eq!(as_int(&inner[1]), 3);
    }

    #[test]
    fn test_times_after_divide_takes_the_whole_quotient() {
        // 8 / 4 * 2  =>  times([divide(8, 4), 2]): a finished quotient is an
        // ordinary operand, never rebuilt around the incoming operator.
        let result = walk(&combined(
            int(8),
            vec![
                arith(ArithOp::Divide, vec![int(4)]),
                arith(ArithOp::Times, vec![int(2)]),
            ],
        ));
        let times = as_func(&result);
        assert_eq!(times.function, "times");
        let operands = &as_collection(&times.parameters[0]).values;
        let divide = as_func(&operands[0]);
        assert_eq!(divide.function, "divide");
        assert_eq!(as_int(&divide.parameters[0]), 8);
        assert_eq!(as_int(&divide.parameters[1]), 4);
        assert_eq!(as_int(&operands[1]), 2);
    }

    #[test]
    fn test_divide_is_binary_and_left_associative() {
        // 12 / 3 / 2  =>  divide(divide(12, 3), 2)
        let result = walk(&combined(
            int(12),
            vec![arith(ArithOp::Divide, vec![int(3), int(2)])],
        ));
        let outer = as_func(&result);
        assert_eq!(outer.function, "divide");
        assert_eq!(as_int(&outer.parameters[1]), 2);
        let inner = as_func(&outer.parameters[0]);
        assert_eq!(inner.function, "divide");
        assert_eq!(as_int(&inner.parameters[0]), 12);
        assert_eq!(as_int(&inner.parameters[1]), 3);
    }

    #[test]
    fn test_divide_after_plus_steals_last_operand() {
        // 1 + 10 / 2  =>  plus([1, divide(10, 2)])
        let result = walk(&combined(
            int(1),
            vec![
                arith(ArithOp::Plus, vec![int(10)]),
                arith(ArithOp::Divide, vec![int(2)]),
            ],
        ));
        let plus = as_func(&result);
        assert_eq!(plus.function, "plus");
        let operands = &as_collection(&plus.parameters[0]).values;
        assert_eq!(as_int(&operands[0]), 1);
        let divide = as_func(&operands[1]);
        assert_eq!(divide.function, "divide");
        assert_eq!(as_int(&divide.parameters[0]), 10);
        assert_eq!(as_int(&divide.parameters[1]), 2);
    }

    #[test]
    fn test_plus_after_divide_takes_the_node_as_input() {
        // 10 / 2 + 1  =>  plus([divide(10, 2), 1])
        let result = walk(&combined(
            int(10),
            vec![
                arith(ArithOp::Divide, vec![int(2)]),
                arith(ArithOp::Plus, vec![int(1)]),
            ],
        ));
        let plus = as_func(&result);
        assert_eq!(plus.function, "plus");
        let operands = &as_collection(&plus.parameters[0]).values;
        let divide = as_func(&operands[0]);
        assert_eq!(divide.function, "divide");
        assert_eq!(as_int(&operands[1]), 1);
    }

    #[test]
    fn test_arithmetic_binds_tighter_than_comparison() {
        // $a < $b + 1  =>  lessThan($a, plus([$b, 1]))
        let result = walk(&combined(
            var("a"),
            vec![
                arith(ArithOp::LessThan, vec![var("b")]),
                arith(ArithOp::Plus, vec![int(1)]),
            ],
        ));
        let less_than = as_func(&result);
        assert_eq!(less_than.function, "lessThan");
        assert!(matches!(
            &less_than.parameters[0],
            ValueSpecification::Variable(v) if v.name == "a"
        ));
        let plus = as_func(&less_than.parameters[1]);
        assert_eq!(plus.function, "plus");
        let operands = &as_collection(&plus.parameters[0]).values;
        assert!(matches!(
            &operands[0],
            ValueSpecification::Variable(v) if v.name == "b"
        ));
        assert_eq!(as_int(&operands[1]), 1);
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        // $a or $b and $c  =>  or($a, and($b, $c))
        let result = walk(&combined(
            var("a"),
            vec![boolean(BoolOp::Or, var("b")), boolean(BoolOp::And, var("c"))],
        ));
        let or = as_func(&result);
        assert_eq!(or.function, "or");
        let and = as_func(&or.parameters[1]);
        assert_eq!(and.function, "and");
        assert!(matches!(
            &and.parameters[0],
            ValueSpecification::Variable(v) if v.name == "b"
        ));
        assert!(matches!(
            &and.parameters[1],
            ValueSpecification::Variable(v) if v.name == "c"
        ));
    }

    #[test]
    fn test_arithmetic_run_feeds_boolean_run() {
        // 1 + 2 > $x or $y  =>  or(greaterThan(plus([1, 2]), $x), $y)
        let result = walk(&combined(
            int(1),
            vec![
                arith(ArithOp::Plus, vec![int(2)]),
                arith(ArithOp::GreaterThan, vec![var("x")]),
                boolean(BoolOp::Or, var("y")),
            ],
        ));
        let or = as_func(&result);
        assert_eq!(or.function, "or");
        let greater_than = as_func(&or.parameters[0]);
        assert_eq!(greater_than.function, "greaterThan");
        let plus = as_func(&greater_than.parameters[0]);
        assert_eq!(plus.function, "plus");
        assert!(matches!(
            &or.parameters[1],
            ValueSpecification::Variable(v) if v.name == "y"
        ));
    }

    #[test]
    fn test_not_equal_wraps_equal_in_not() {
        let expression = CombinedExpression {
            expression: Box::new(Expression {
                base: BaseExpression::Atomic(AtomicExpression::Variable(VariableRef {
                    name: Identifier::new("x", dummy()),
                    span: dummy(),
                })),
                applications: vec![],
                equal_not_equal: Some(EqualNotEqual {
                    negated: true,
                    op_span: dummy(),
                    right: crate::cst::CombinedArithmeticOnly {
                        expression: Box::new(int(1)),
                        parts: vec![],
                        span: dummy(),
                    },
                    span: dummy(),
                }),
                span: dummy(),
            }),
            parts: vec![],
            span: dummy(),
        };
        let result = walk(&expression);
        let not = as_func(&result);
        assert_eq!(not.function, "not");
        let equal = as_func(&not.parameters[0]);
        assert_eq!(equal.function, "equal");
        assert_eq!(as_int(&equal.parameters[1]), 1);
    }

    #[test]
    fn test_let_expression_shape() {
        let context = ParserContext::new();
        let walker = DomainWalker::new(
            ParseTreeWalkerSourceInformation::new("test", 0, 0),
            &context,
        );
        let mut lambda_context = LambdaContext::new("test");
        let let_expression = LetExpression {
            name: Identifier::new("age", dummy()),
            value: combined(int(7), vec![]),
            span: dummy(),
        };
        let result = walker
            .let_expression(&let_expression, &mut lambda_context)
            .unwrap();
        let applied = as_func(&result);
        assert_eq!(applied.function, "letFunction");
        assert!(matches!(
            &applied.parameters[0],
            ValueSpecification::CString(s) if s.value == "age"
        ));
        assert_eq!(as_int(&applied.parameters[1]), 7);
    }

    #[test]
    fn test_integer_overflow_reports_parser_error() {
        let context = ParserContext::new();
        let walker = DomainWalker::new(
            ParseTreeWalkerSourceInformation::new("test", 0, 0),
            &context,
        );
        let mut lambda_context = LambdaContext::new("test");
        let literal = combined(
            Expression {
                base: BaseExpression::Atomic(AtomicExpression::Literal(Literal::Integer {
                    text: "99999999999999999999".to_string(),
                    span: dummy(),
                })),
                applications: vec![],
                equal_not_equal: None,
                span: dummy(),
            },
            vec![],
        );
        let err = walker
            .combined_expression(&literal, &mut lambda_context)
            .unwrap_err();
        assert_eq!(err.message, "99999999999999999999 is not supported");
    }

    #[test]
    fn test_decimal_literal_strips_suffix() {
        let context = ParserContext::new();
        let walker = DomainWalker::new(
            ParseTreeWalkerSourceInformation::new("test", 0, 0),
            &context,
        );
        let value = walker
            .literal(&Literal::Decimal {
                text: "3.14D".to_string(),
                span: dummy(),
            })
            .unwrap();
        assert!(matches!(
            value,
            ValueSpecification::CDecimal(d) if d.value == "3.14"
        ));
    }

    #[test]
    fn test_empty_function_caller_is_rejected() {
        let context = ParserContext::new();
        let walker = DomainWalker::new(
            ParseTreeWalkerSourceInformation::new("test", 0, 0),
            &context,
        );
        let mut lambda_context = LambdaContext::new("test");
        let reference = crate::cst::InstanceReference {
            target: crate::cst::InstanceTarget::Empty,
            all_or_function: Some(crate::cst::AllOrFunction::All { span: dummy() }),
            span: dummy(),
        };
        let err = walker
            .instance_reference(&reference, &mut lambda_context)
            .unwrap_err();
        assert_eq!(err.message, "Expected a non-empty function caller");
    }

    #[test]
    fn test_all_builds_get_all() {
        let context = ParserContext::new();
        let walker = DomainWalker::new(
            ParseTreeWalkerSourceInformation::new("test", 0, 0),
            &context,
        );
        let mut lambda_context = LambdaContext::new("test");
        let reference = crate::cst::InstanceReference {
            target: crate::cst::InstanceTarget::Element(crate::cst::QualifiedName {
                path: vec![Identifier::new("model", dummy())],
                name: Identifier::new("Person", dummy()),
                span: dummy(),
            }),
            all_or_function: Some(crate::cst::AllOrFunction::All { span: dummy() }),
            span: dummy(),
        };
        let result = walker
            .instance_reference(&reference, &mut lambda_context)
            .unwrap();
        let get_all = as_func(&result);
        assert_eq!(get_all.function, "getAll");
        assert!(matches!(
            &get_all.parameters[0],
            ValueSpecification::PackageableElementPtr(p) if p.full_path == "model::Person"
        ));
    }

    #[test]
    fn test_all_versions_in_range_is_not_supported() {
        let context = ParserContext::new();
        let walker = DomainWalker::new(
            ParseTreeWalkerSourceInformation::new("test", 0, 0),
            &context,
        );
        let mut lambda_context = LambdaContext::new("test");
        let reference = crate::cst::InstanceReference {
            target: crate::cst::InstanceTarget::Element(crate::cst::QualifiedName {
                path: vec![],
                name: Identifier::new("Person", dummy()),
                span: dummy(),
            }),
            all_or_function: Some(crate::cst::AllOrFunction::AllVersionsInRange {
                text: "Person.allVersionsInRange(%2020-01-01, %2020-02-01)".to_string(),
                span: dummy(),
            }),
            span: dummy(),
        };
        let err = walker
            .instance_reference(&reference, &mut lambda_context)
            .unwrap_err();
        assert_eq!(
            err.message,
            "Person.allVersionsInRange(%2020-01-01, %2020-02-01) is not supported"
        );
    }

    #[test]
    fn test_new_instance_shape() {
        let context = ParserContext::new();
        let walker = DomainWalker::new(
            ParseTreeWalkerSourceInformation::new("test", 0, 0),
            &context,
        );
        let mut lambda_context = LambdaContext::new("test");
        let new_instance = crate::cst::NewInstance {
            class: crate::cst::QualifiedName {
                path: vec![Identifier::new("model", dummy())],
                name: Identifier::new("Person", dummy()),
                span: dummy(),
            },
            assignments: vec![crate::cst::PropertyAssignment {
                property: Identifier::new("age", dummy()),
                value: Some(combined(int(30), vec![])),
                span: dummy(),
            }],
            span: dummy(),
        };
        let result = walker
            .new_instance(&new_instance, &mut lambda_context)
            .unwrap();
        let new = as_func(&result);
        assert_eq!(new.function, "new");
        assert!(matches!(
            &new.parameters[0],
            ValueSpecification::PackageableElementPtr(p) if p.full_path == "model::Person"
        ));
        assert!(matches!(
            &new.parameters[1],
            ValueSpecification::CString(s) if s.value.is_empty()
        ));
        let keys = as_collection(&new.parameters[2]);
        let ValueSpecification::KeyExpression(key) = &keys.values[0] else {
            panic!("expected a key expression");
        };
        assert!(matches!(
            key.key.as_ref(),
            ValueSpecification::CString(s) if s.value == "age"
        ));
        assert_eq!(as_int(key.expression.as_ref()), 30);
    }

    #[test]
    fn test_lambda_names_are_deterministic() {
        let lambda = crate::cst::LambdaDefinition {
            parameters: vec![crate::cst::LambdaParam {
                name: Identifier::new("x", dummy()),
                type_: None,
                span: dummy(),
            }],
            body: crate::cst::CodeBlock {
                lines: vec![crate::cst::ProgramLine::Expression(combined(
                    var("x"),
                    vec![],
                ))],
                span: dummy(),
            },
            pipe_span: dummy(),
            span: dummy(),
        };
        let expression = combined(
            Expression {
                base: BaseExpression::Atomic(AtomicExpression::Lambda(lambda)),
                applications: vec![],
                equal_not_equal: None,
                span: dummy(),
            },
            vec![],
        );
        let first = walk(&expression);
        let second = walk(&expression);
        assert_eq!(first, second);
        let ValueSpecification::Lambda(lambda) = first else {
            panic!("expected a lambda");
        };
        assert_eq!(lambda.name.as_deref(), Some("test$0"));
        assert_eq!(lambda.parameters[0].name, "x");
        assert!(lambda.parameters[0].class.is_none());
    }
}
