//! Builders for the packageable elements of the domain grammar.
use crate::cst;
use crate::error::{EngineError, EngineResult};
use crate::island::primitive;
use crate::protocol::domain::{
    AggregationKind, Association, Class, Constraint, DefaultValue, EnumValue, Enumeration,
    Function, Measure, Profile, Property, QualifiedProperty, StereotypePtr, TagPtr, TaggedValue,
    Unit,
};
use crate::protocol::test::{
    EqualTo, EqualToJson, ExternalFormatData, FunctionTest, FunctionTestSuite, ParameterValue,
    StoreProviderPointer, StoreTestData, TestAssertion, TestData,
};
use crate::protocol::value::{Lambda, ValueSpecification, Variable};

use super::{DomainWalker, LambdaContext};

/// Suite and assertion id used for tests written without one.
const DEFAULT_TESTABLE_ID: &str = "default";

impl DomainWalker<'_> {
    pub(crate) fn visit_class(&self, ctx: &cst::ClassDefinition) -> EngineResult<Class> {
        let mut constraints = Vec::with_capacity(ctx.constraints.len());
        for (index, constraint) in ctx.constraints.iter().enumerate() {
            constraints.push(self.visit_constraint(constraint, index)?);
        }
        Ok(Class {
            name: ctx.name.name.name(),
            package: ctx.name.package(),
            super_types: ctx
                .super_types
                .iter()
                .map(cst::QualifiedName::full_path)
                .collect(),
            stereotypes: self.stereotypes(&ctx.stereotypes),
            tagged_values: self.tagged_values(&ctx.tagged_values),
            constraints,
            properties: self.properties(&ctx.properties)?,
            qualified_properties: self.qualified_properties(&ctx.qualified_properties)?,
            source_information: self.node_source_information(ctx.span),
        })
    }

    pub(crate) fn visit_association(
        &self,
        ctx: &cst::AssociationDefinition,
    ) -> EngineResult<Association> {
        Ok(Association {
            name: ctx.name.name.name(),
            package: ctx.name.package(),
            stereotypes: self.stereotypes(&ctx.stereotypes),
            tagged_values: self.tagged_values(&ctx.tagged_values),
            properties: self.properties(&ctx.properties)?,
            qualified_properties: self.qualified_properties(&ctx.qualified_properties)?,
            source_information: self.node_source_information(ctx.span),
        })
    }

    pub(crate) fn visit_enumeration(
        &self,
        ctx: &cst::EnumDefinition,
    ) -> EngineResult<Enumeration> {
        Ok(Enumeration {
            name: ctx.name.name.name(),
            package: ctx.name.package(),
            stereotypes: self.stereotypes(&ctx.stereotypes),
            tagged_values: self.tagged_values(&ctx.tagged_values),
            values: ctx
                .values
                .iter()
                .map(|value| EnumValue {
                    value: value.name.name(),
                    stereotypes: self.stereotypes(&value.stereotypes),
                    tagged_values: self.tagged_values(&value.tagged_values),
                    source_information: self.node_source_information(value.span),
                })
                .collect(),
            source_information: self.node_source_information(ctx.span),
        })
    }

    pub(crate) fn visit_profile(&self, ctx: &cst::ProfileDefinition) -> EngineResult<Profile> {
        Ok(Profile {
            name: ctx.name.name.name(),
            package: ctx.name.package(),
            stereotypes: ctx.stereotypes.iter().map(cst::Identifier::name).collect(),
            tags: ctx.tags.iter().map(cst::Identifier::name).collect(),
            source_information: self.node_source_information(ctx.span),
        })
    }

    /// A function's declared identifier is finalized with a signature suffix
    /// once its parameters and return are known, so overloads of the same
    /// identifier get distinct paths.
    pub(crate) fn visit_function(&self, ctx: &cst::FunctionDefinition) -> EngineResult<Function> {
        let declared_name = ctx.name.name.name();
        let mut lambda_context = LambdaContext::for_element(&ctx.name.full_path());
        let parameters = ctx
            .parameters
            .iter()
            .map(|parameter| self.function_parameter(parameter))
            .collect::<EngineResult<Vec<_>>>()?;
        let body = self.code_block(&ctx.body, &mut lambda_context)?;
        let return_type = ctx.return_type.text();
        let return_multiplicity = self.build_multiplicity(&ctx.return_multiplicity)?;
        let tests = match &ctx.test_suites {
            Some(suites) => self.function_test_suites(suites, &declared_name, &parameters)?,
            None => vec![],
        };
        let name = format!(
            "{}{}",
            declared_name,
            Function::signature_suffix(&parameters, &return_type, &return_multiplicity)
        );
        Ok(Function {
            name,
            package: ctx.name.package(),
            stereotypes: self.stereotypes(&ctx.stereotypes),
            tagged_values: self.tagged_values(&ctx.tagged_values),
            parameters,
            return_type,
            return_multiplicity,
            body,
            tests,
            source_information: self.node_source_information(ctx.span),
        })
    }

    pub(crate) fn visit_measure(&self, ctx: &cst::MeasureDefinition) -> EngineResult<Measure> {
        let name = ctx.name.name.name();
        let package = ctx.name.package();
        let measure_path = ctx.name.full_path();
        let (canonical_unit, non_canonical_units) = match &ctx.body {
            cst::MeasureBody::Canonical { canonical, others } => {
                let canonical = self.visit_unit(canonical, &name, &package, &measure_path)?;
                let others = others
                    .iter()
                    .map(|unit| self.visit_unit(unit, &name, &package, &measure_path))
                    .collect::<EngineResult<Vec<_>>>()?;
                (Some(canonical), others)
            }
            cst::MeasureBody::NonConvertible(units) => {
                let mut units = units
                    .iter()
                    .map(|unit| self.non_convertible_unit(unit, &name, &package, &measure_path))
                    .collect::<Vec<_>>();
                if units.is_empty() {
                    (None, units)
                } else {
                    // the first written unit acts as the canonical one
                    let first = units.remove(0);
                    (Some(first), units)
                }
            }
        };
        Ok(Measure {
            name,
            package,
            canonical_unit,
            non_canonical_units,
            source_information: self.node_source_information(ctx.span),
        })
    }

    /// A convertible unit: `Gram: x -> $x * 1000` under measure `Mass`
    /// becomes unit `Mass~Gram` with a one-parameter conversion lambda.
    fn visit_unit(
        &self,
        ctx: &cst::MeasureExpr,
        measure_name: &str,
        package: &str,
        measure_path: &str,
    ) -> EngineResult<Unit> {
        let unit_name = format!("{}~{}", measure_name, ctx.name.name.name());
        let mut lambda_context = LambdaContext::for_element(&unit_name);
        let parameter = Variable {
            name: ctx.parameter.name(),
            class: None,
            multiplicity: None,
            source_information: None,
        };
        let body = self.code_block(&ctx.body, &mut lambda_context)?;
        Ok(Unit {
            name: unit_name,
            package: package.to_string(),
            measure: measure_path.to_string(),
            super_type: measure_path.to_string(),
            conversion_function: Some(Lambda {
                name: None,
                parameters: vec![parameter],
                body,
                source_information: self.node_source_information(ctx.body.span),
            }),
            source_information: self.node_source_information(ctx.span),
        })
    }

    fn non_convertible_unit(
        &self,
        ctx: &cst::NonConvertibleMeasureExpr,
        measure_name: &str,
        package: &str,
        measure_path: &str,
    ) -> Unit {
        Unit {
            name: format!("{}~{}", measure_name, ctx.name.name.name()),
            package: package.to_string(),
            measure: measure_path.to_string(),
            super_type: measure_path.to_string(),
            conversion_function: None,
            source_information: self.node_source_information(ctx.span),
        }
    }

    /// Simple constraints without an id are named by their position in the
    /// constraint list.
    fn visit_constraint(
        &self,
        ctx: &cst::ConstraintDef,
        index: usize,
    ) -> EngineResult<Constraint> {
        match ctx {
            cst::ConstraintDef::Simple(constraint) => {
                let name = constraint
                    .id
                    .as_ref()
                    .map(cst::Identifier::name)
                    .unwrap_or_else(|| index.to_string());
                let mut lambda_context = LambdaContext::for_element(&name);
                let body =
                    vec![self.combined_expression(&constraint.expression, &mut lambda_context)?];
                Ok(Constraint {
                    name,
                    function_definition: constraint_lambda(body),
                    enforcement_level: None,
                    external_id: None,
                    message_function: None,
                    source_information: self.node_source_information(constraint.span),
                })
            }
            cst::ConstraintDef::Complex(constraint) => {
                let name = constraint.name.name();
                let mut lambda_context = LambdaContext::for_element(&name);
                let function_definition = constraint_lambda(vec![
                    self.combined_expression(&constraint.function, &mut lambda_context)?,
                ]);
                let message_function = match &constraint.message {
                    Some(message) => Some(constraint_lambda(vec![
                        self.combined_expression(message, &mut lambda_context)?,
                    ])),
                    None => None,
                };
                Ok(Constraint {
                    name,
                    function_definition,
                    enforcement_level: constraint
                        .enforcement_level
                        .as_ref()
                        .map(|level| level.text.clone()),
                    external_id: constraint
                        .external_id
                        .as_ref()
                        .map(cst::StringLiteral::value),
                    message_function,
                    source_information: self.node_source_information(constraint.span),
                })
            }
        }
    }

    fn properties(&self, definitions: &[cst::PropertyDef]) -> EngineResult<Vec<Property>> {
        definitions
            .iter()
            .map(|definition| self.visit_property(definition))
            .collect()
    }

    fn visit_property(&self, ctx: &cst::PropertyDef) -> EngineResult<Property> {
        let aggregation = match &ctx.aggregation {
            Some(keyword) => {
                Some(AggregationKind::from_grammar(&keyword.text).ok_or_else(|| {
                    EngineError::parser(
                        format!("Unknown aggregation kind '{}'", keyword.text),
                        self.source_information(keyword.span),
                    )
                })?)
            }
            None => None,
        };
        let name = ctx.name.name();
        let default_value = match &ctx.default_value {
            Some(expression) => Some(self.default_value(expression, &name)?),
            None => None,
        };
        Ok(Property {
            name,
            type_: ctx.type_.text(),
            multiplicity: self.build_multiplicity(&ctx.multiplicity)?,
            aggregation,
            default_value,
            stereotypes: self.stereotypes(&ctx.stereotypes),
            tagged_values: self.tagged_values(&ctx.tagged_values),
            source_information: self.node_source_information(ctx.span),
            property_type_source_information: self.node_source_information(ctx.type_.span()),
        })
    }

    fn default_value(
        &self,
        ctx: &cst::DefaultValueExpression,
        property_name: &str,
    ) -> EngineResult<DefaultValue> {
        let mut lambda_context = LambdaContext::for_element(property_name);
        let value = match ctx {
            cst::DefaultValueExpression::Single(expression) => {
                self.combined_expression(expression, &mut lambda_context)?
            }
            cst::DefaultValueExpression::Array { values, span } => {
                let values = values
                    .iter()
                    .map(|value| self.combined_expression(value, &mut lambda_context))
                    .collect::<EngineResult<Vec<_>>>()?;
                self.collect(values, *span)
            }
        };
        Ok(DefaultValue {
            value,
            source_information: self.node_source_information(ctx.span()),
        })
    }

    fn qualified_properties(
        &self,
        definitions: &[cst::QualifiedPropertyDef],
    ) -> EngineResult<Vec<QualifiedProperty>> {
        definitions
            .iter()
            .map(|definition| self.visit_qualified_property(definition))
            .collect()
    }

    fn visit_qualified_property(
        &self,
        ctx: &cst::QualifiedPropertyDef,
    ) -> EngineResult<QualifiedProperty> {
        let name = ctx.name.name();
        let mut lambda_context = LambdaContext::new(name.clone());
        let parameters = ctx
            .parameters
            .iter()
            .map(|parameter| self.function_parameter(parameter))
            .collect::<EngineResult<Vec<_>>>()?;
        let body = self.code_block(&ctx.body, &mut lambda_context)?;
        Ok(QualifiedProperty {
            name,
            parameters,
            body,
            return_type: ctx.return_type.text(),
            return_multiplicity: self.build_multiplicity(&ctx.return_multiplicity)?,
            stereotypes: self.stereotypes(&ctx.stereotypes),
            tagged_values: self.tagged_values(&ctx.tagged_values),
            source_information: self.node_source_information(ctx.span),
        })
    }

    pub(crate) fn function_parameter(
        &self,
        ctx: &cst::FunctionParameter,
    ) -> EngineResult<Variable> {
        Ok(Variable {
            name: ctx.name.name(),
            class: Some(ctx.type_.text()),
            multiplicity: Some(self.build_multiplicity(&ctx.multiplicity)?),
            source_information: self.node_source_information(ctx.span),
        })
    }

    fn stereotypes(&self, refs: &[cst::StereotypeRef]) -> Vec<StereotypePtr> {
        refs.iter()
            .map(|reference| StereotypePtr {
                profile: reference.profile.full_path(),
                value: reference.value.name(),
                source_information: self.node_source_information(reference.span),
            })
            .collect()
    }

    fn tagged_values(&self, refs: &[cst::TaggedValueRef]) -> Vec<TaggedValue> {
        refs.iter()
            .map(|reference| TaggedValue {
                tag: TagPtr {
                    profile: reference.profile.full_path(),
                    value: reference.tag.name(),
                    source_information: self.node_source_information(reference.profile.span),
                },
                value: reference.value.value(),
                source_information: self.node_source_information(reference.span),
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Function tests
    // -----------------------------------------------------------------------

    /// Tests and data written loose at the top of the test block go into a
    /// default suite; named suites follow.
    fn function_test_suites(
        &self,
        ctx: &cst::FunctionTestSuiteDef,
        function_name: &str,
        parameters: &[Variable],
    ) -> EngineResult<Vec<FunctionTestSuite>> {
        let mut suites = Vec::new();
        if !ctx.tests.is_empty() || !ctx.data.is_empty() {
            suites.push(FunctionTestSuite {
                id: DEFAULT_TESTABLE_ID.to_string(),
                tests: ctx
                    .tests
                    .iter()
                    .map(|test| self.function_test(test, function_name, parameters))
                    .collect::<EngineResult<Vec<_>>>()?,
                test_data: self.store_test_data(&ctx.data),
                source_information: self.node_source_information(ctx.span),
            });
        }
        for suite in &ctx.suites {
            suites.push(FunctionTestSuite {
                id: suite.id.name(),
                tests: suite
                    .tests
                    .iter()
                    .map(|test| self.function_test(test, function_name, parameters))
                    .collect::<EngineResult<Vec<_>>>()?,
                test_data: self.store_test_data(&suite.data),
                source_information: self.node_source_information(suite.span),
            });
        }
        Ok(suites)
    }

    fn function_test(
        &self,
        ctx: &cst::SimpleFunctionTest,
        function_name: &str,
        declared_parameters: &[Variable],
    ) -> EngineResult<FunctionTest> {
        let test_function_name = ctx.function_name.name();
        if test_function_name != function_name {
            return Err(EngineError::parser(
                format!(
                    "Function name in test '{}' does not match function name '{}'",
                    test_function_name, function_name
                ),
                self.source_information(ctx.function_name.span),
            ));
        }
        let mut parameters = Vec::with_capacity(ctx.parameters.len());
        for (index, source) in ctx.parameters.iter().enumerate() {
            let value = self.reparse_primitive(source)?;
            parameters.push(ParameterValue {
                // positional binding; extra values past the declared
                // parameters stay unnamed
                name: declared_parameters
                    .get(index)
                    .map(|parameter| parameter.name.clone()),
                value,
                source_information: self.node_source_information(source.span),
            });
        }
        let assertion = match &ctx.assertion {
            cst::TestAssertionDef::Primitive(source) => TestAssertion::EqualTo(EqualTo {
                id: DEFAULT_TESTABLE_ID.to_string(),
                expected: self.reparse_primitive(source)?,
                source_information: self.node_source_information(source.span),
            }),
            cst::TestAssertionDef::ExternalFormat {
                content_type,
                value,
                span,
            } => TestAssertion::EqualToJson(EqualToJson {
                id: DEFAULT_TESTABLE_ID.to_string(),
                expected: ExternalFormatData {
                    content_type: known_content_type(&content_type.name()),
                    data: value.value(),
                    source_information: None,
                },
                source_information: self.node_source_information(*span),
            }),
        };
        Ok(FunctionTest {
            id: ctx.id.name(),
            doc: ctx.doc.as_ref().map(cst::StringLiteral::value),
            parameters,
            assertions: vec![assertion],
            source_information: self.node_source_information(ctx.span),
        })
    }

    /// Re-parse a raw primitive value slice with coordinates rebased to its
    /// position in the host document.
    fn reparse_primitive(
        &self,
        source: &cst::PrimitiveValueSource,
    ) -> EngineResult<ValueSpecification> {
        let walker = self.walker_source_information().for_island(source.span, 0);
        primitive::parse_primitive_value(&source.text, &walker)
    }

    fn store_test_data(&self, data: &[cst::FunctionData]) -> Option<Vec<StoreTestData>> {
        if data.is_empty() {
            return None;
        }
        Some(
            data.iter()
                .map(|entry| StoreTestData {
                    store: StoreProviderPointer {
                        path: entry.store.full_path(),
                        source_information: self.node_source_information(entry.store.span),
                    },
                    data: entry.value.as_ref().map(|value| match value {
                        cst::FunctionDataValue::Reference(name) => TestData::Reference {
                            data_element: name.full_path(),
                        },
                        cst::FunctionDataValue::ExternalFormat {
                            content_type,
                            value,
                            ..
                        } => TestData::ExternalFormat(ExternalFormatData {
                            content_type: known_content_type(&content_type.name()),
                            data: value.value(),
                            source_information: None,
                        }),
                    }),
                    source_information: self.node_source_information(entry.span),
                })
                .collect(),
        )
    }
}

fn constraint_lambda(body: Vec<ValueSpecification>) -> Lambda {
    Lambda {
        name: None,
        parameters: vec![],
        body,
        source_information: None,
    }
}

/// Well-known short content types written in test blocks.
fn known_content_type(name: &str) -> String {
    match name {
        "JSON" => "application/json".to_string(),
        "XML" => "application/xml".to_string(),
        other => other.to_string(),
    }
}
