//! Packageable element protocol nodes: classes, associations, enumerations,
//! profiles, functions, and measures.
use serde::{Deserialize, Serialize};

use crate::protocol::test::FunctionTestSuite;
use crate::protocol::value::{Lambda, Multiplicity, ValueSpecification, Variable};
use crate::source::SourceInformation;
use crate::utils::names;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum PackageableElement {
    #[serde(rename = "class")]
    Class(Class),
    #[serde(rename = "association")]
    Association(Association),
    #[serde(rename = "Enumeration")]
    Enumeration(Enumeration),
    #[serde(rename = "profile")]
    Profile(Profile),
    #[serde(rename = "function")]
    Function(Function),
    #[serde(rename = "measure")]
    Measure(Measure),
}

impl PackageableElement {
    /// Full path of the element (`package::name`).
    pub fn path(&self) -> String {
        let (package, name) = match self {
            PackageableElement::Class(e) => (&e.package, &e.name),
            PackageableElement::Association(e) => (&e.package, &e.name),
            PackageableElement::Enumeration(e) => (&e.package, &e.name),
            PackageableElement::Profile(e) => (&e.package, &e.name),
            PackageableElement::Function(e) => (&e.package, &e.name),
            PackageableElement::Measure(e) => (&e.package, &e.name),
        };
        names::element_path(package, name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub name: String,
    #[serde(rename = "package")]
    pub package: String,
    pub super_types: Vec<String>,
    pub stereotypes: Vec<StereotypePtr>,
    pub tagged_values: Vec<TaggedValue>,
    pub constraints: Vec<Constraint>,
    pub properties: Vec<Property>,
    pub qualified_properties: Vec<QualifiedProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Association {
    pub name: String,
    #[serde(rename = "package")]
    pub package: String,
    pub stereotypes: Vec<StereotypePtr>,
    pub tagged_values: Vec<TaggedValue>,
    pub properties: Vec<Property>,
    pub qualified_properties: Vec<QualifiedProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enumeration {
    pub name: String,
    #[serde(rename = "package")]
    pub package: String,
    pub stereotypes: Vec<StereotypePtr>,
    pub tagged_values: Vec<TaggedValue>,
    pub values: Vec<EnumValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValue {
    pub value: String,
    pub stereotypes: Vec<StereotypePtr>,
    pub tagged_values: Vec<TaggedValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

/// A profile declares the stereotypes and tags other elements may reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    #[serde(rename = "package")]
    pub package: String,
    pub stereotypes: Vec<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Function {
    /// Finalized name: the declared identifier plus the signature suffix, so
    /// overloads of the same identifier get distinct paths.
    pub name: String,
    #[serde(rename = "package")]
    pub package: String,
    pub stereotypes: Vec<StereotypePtr>,
    pub tagged_values: Vec<TaggedValue>,
    pub parameters: Vec<Variable>,
    pub return_type: String,
    pub return_multiplicity: Multiplicity,
    pub body: Vec<ValueSpecification>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tests: Vec<FunctionTestSuite>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

impl Function {
    /// Signature suffix appended to the declared identifier, built from
    /// parameter type simple names and multiplicity tokens:
    /// `_String_1__Integer_$0_1$__Boolean_1_`.
    pub fn signature_suffix(parameters: &[Variable], return_type: &str, return_multiplicity: &Multiplicity) -> String {
        let params = parameters
            .iter()
            .filter_map(|p| {
                let class = p.class.as_deref()?;
                let multiplicity = p.multiplicity.clone().unwrap_or_else(Multiplicity::one);
                Some(format!(
                    "{}_{}",
                    simple_type_name(class),
                    multiplicity.signature_token()
                ))
            })
            .collect::<Vec<_>>()
            .join("__");
        format!(
            "_{}__{}_{}_",
            params,
            simple_type_name(return_type),
            return_multiplicity.signature_token()
        )
    }
}

/// Last path segment of a (possibly qualified) type name.
fn simple_type_name(name: &str) -> &str {
    match name.rfind(names::PATH_SEPARATOR) {
        Some(idx) => &name[idx + names::PATH_SEPARATOR.len()..],
        None => name,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    pub name: String,
    #[serde(rename = "package")]
    pub package: String,
    pub canonical_unit: Option<Unit>,
    pub non_canonical_units: Vec<Unit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

/// A unit belonging to a measure. The name embeds the owning measure
/// (`Mass~Gram`); convertible units carry a one-parameter conversion lambda.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub name: String,
    #[serde(rename = "package")]
    pub package: String,
    pub measure: String,
    pub super_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion_function: Option<Lambda>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub multiplicity: Multiplicity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<AggregationKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<DefaultValue>,
    pub stereotypes: Vec<StereotypePtr>,
    pub tagged_values: Vec<TaggedValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
    /// Position of the type reference alone, kept separately for editors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type_source_information: Option<SourceInformation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregationKind {
    #[serde(rename = "COMPOSITE")]
    Composite,
    #[serde(rename = "SHARED")]
    Shared,
    #[serde(rename = "NONE")]
    None,
}

impl AggregationKind {
    /// Map grammar text to an aggregation kind.
    pub fn from_grammar(text: &str) -> Option<Self> {
        match text {
            "composite" => Some(AggregationKind::Composite),
            "shared" => Some(AggregationKind::Shared),
            "none" => Some(AggregationKind::None),
            _ => Option::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultValue {
    pub value: ValueSpecification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualifiedProperty {
    pub name: String,
    pub parameters: Vec<Variable>,
    pub body: Vec<ValueSpecification>,
    pub return_type: String,
    pub return_multiplicity: Multiplicity,
    pub stereotypes: Vec<StereotypePtr>,
    pub tagged_values: Vec<TaggedValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

/// Constraint on a class. Simple constraints get their list index as a name
/// when no explicit id is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    pub name: String,
    pub function_definition: Lambda,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enforcement_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_function: Option<Lambda>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StereotypePtr {
    pub profile: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagPtr {
    pub profile: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggedValue {
    pub tag: TagPtr,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

/// One section of a multi-parser document: the imports in scope and the
/// paths of the elements the section declared.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportAwareCodeSection {
    pub imports: Vec<String>,
    pub elements: Vec<String>,
}
