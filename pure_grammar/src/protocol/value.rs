//! Value specification nodes.
//!
//! These are the expression-level protocol nodes the walker emits: literals,
//! variables, applied functions and properties, collections, lambdas, and the
//! handful of reference nodes (element pointers, primitive types, unit types).
//! Island-grammar output is wrapped in [`ClassInstance`] with an opaque JSON
//! payload.
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::source::SourceInformation;

/// Multiplicity bounds; `upper_bound` of `None` means unbounded (`*`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Multiplicity {
    pub lower_bound: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<i64>,
}

impl Multiplicity {
    pub fn new(lower_bound: i64, upper_bound: Option<i64>) -> Self {
        debug_assert!(
            upper_bound.map_or(true, |u| lower_bound <= u),
            "lower bound must not exceed upper bound"
        );
        Self {
            lower_bound,
            upper_bound,
        }
    }

    /// Exactly one: `[1]`
    pub fn one() -> Self {
        Self::new(1, Some(1))
    }

    /// Optional: `[0..1]`
    pub fn zero_one() -> Self {
        Self::new(0, Some(1))
    }

    /// Unbounded: `[*]`
    pub fn zero_many() -> Self {
        Self::new(0, None)
    }

    /// True when at most one value is allowed.
    pub fn is_to_one(&self) -> bool {
        self.upper_bound == Some(1)
    }

    /// Token used in function signature suffixes: `1`, `MANY`, or `$l_u$`.
    pub fn signature_token(&self) -> String {
        match self.upper_bound {
            Some(upper) if upper == self.lower_bound => upper.to_string(),
            None if self.lower_bound == 0 => "MANY".to_string(),
            Some(upper) => format!("${}_{}$", self.lower_bound, upper),
            None => format!("${}_MANY$", self.lower_bound),
        }
    }
}

/// A lambda parameter or a function parameter declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub name: String,
    /// Declared type, absent for untyped lambda parameters.
    #[serde(rename = "class", skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplicity: Option<Multiplicity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CString {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CInteger {
    pub value: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CFloat {
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

/// Fixed-point literal; the textual form is preserved to avoid binary
/// floating point rounding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CDecimal {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CBoolean {
    pub value: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CByteArray {
    pub value: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CDateTime {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CStrictDate {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CStrictTime {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CLatestDate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFunction {
    pub function: String,
    pub parameters: Vec<ValueSpecification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedProperty {
    pub property: String,
    pub parameters: Vec<ValueSpecification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub multiplicity: Multiplicity,
    pub values: Vec<ValueSpecification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

/// Anonymous function. `name` is the synthetic name drawn from the walk's
/// lambda context; it is stable across re-parses of identical source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lambda {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub parameters: Vec<Variable>,
    pub body: Vec<ValueSpecification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

/// `key = expression` pair inside a `^Class(...)` or `new` construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyExpression {
    pub key: Box<ValueSpecification>,
    pub expression: Box<ValueSpecification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

/// Reference to a packageable element by full path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageableElementPtr {
    pub full_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimitiveType {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

/// Class used in type position (e.g. a cast target).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericTypeInstance {
    pub full_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

/// Unit reference `Measure~Unit`, in value or type position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitType {
    pub unit_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

/// Reference to one value of an enumeration (`my::Colour.RED`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValue {
    pub full_path: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

/// Output of an island grammar: a type tag naming the embedded element kind
/// and the payload that embedded parser produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInstance {
    #[serde(rename = "type")]
    pub type_: String,
    pub value: JsonValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_information: Option<SourceInformation>,
}

/// The expression-level protocol node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum ValueSpecification {
    #[serde(rename = "string")]
    CString(CString),
    #[serde(rename = "integer")]
    CInteger(CInteger),
    #[serde(rename = "float")]
    CFloat(CFloat),
    #[serde(rename = "decimal")]
    CDecimal(CDecimal),
    #[serde(rename = "boolean")]
    CBoolean(CBoolean),
    #[serde(rename = "byteArray")]
    CByteArray(CByteArray),
    #[serde(rename = "dateTime")]
    CDateTime(CDateTime),
    #[serde(rename = "strictDate")]
    CStrictDate(CStrictDate),
    #[serde(rename = "strictTime")]
    CStrictTime(CStrictTime),
    #[serde(rename = "latestDate")]
    CLatestDate(CLatestDate),
    #[serde(rename = "var")]
    Variable(Variable),
    #[serde(rename = "func")]
    AppliedFunction(AppliedFunction),
    #[serde(rename = "property")]
    AppliedProperty(AppliedProperty),
    #[serde(rename = "collection")]
    Collection(Collection),
    #[serde(rename = "lambda")]
    Lambda(Lambda),
    #[serde(rename = "keyExpression")]
    KeyExpression(KeyExpression),
    #[serde(rename = "packageableElementPtr")]
    PackageableElementPtr(PackageableElementPtr),
    #[serde(rename = "primitiveType")]
    PrimitiveType(PrimitiveType),
    #[serde(rename = "genericTypeInstance")]
    GenericTypeInstance(GenericTypeInstance),
    #[serde(rename = "unitType")]
    UnitType(UnitType),
    #[serde(rename = "enumValue")]
    EnumValue(EnumValue),
    #[serde(rename = "classInstance")]
    ClassInstance(ClassInstance),
}

impl ValueSpecification {
    /// Replace the source coordinates of this node. `let` rewriting widens a
    /// built expression to cover the whole statement.
    pub fn set_source_information(&mut self, source_information: Option<SourceInformation>) {
        match self {
            ValueSpecification::CString(n) => n.source_information = source_information,
            ValueSpecification::CInteger(n) => n.source_information = source_information,
            ValueSpecification::CFloat(n) => n.source_information = source_information,
            ValueSpecification::CDecimal(n) => n.source_information = source_information,
            ValueSpecification::CBoolean(n) => n.source_information = source_information,
            ValueSpecification::CByteArray(n) => n.source_information = source_information,
            ValueSpecification::CDateTime(n) => n.source_information = source_information,
            ValueSpecification::CStrictDate(n) => n.source_information = source_information,
            ValueSpecification::CStrictTime(n) => n.source_information = source_information,
            ValueSpecification::CLatestDate(n) => n.source_information = source_information,
            ValueSpecification::Variable(n) => n.source_information = source_information,
            ValueSpecification::AppliedFunction(n) => n.source_information = source_information,
            ValueSpecification::AppliedProperty(n) => n.source_information = source_information,
            ValueSpecification::Collection(n) => n.source_information = source_information,
            ValueSpecification::Lambda(n) => n.source_information = source_information,
            ValueSpecification::KeyExpression(n) => n.source_information = source_information,
            ValueSpecification::PackageableElementPtr(n) => n.source_information = source_information,
            ValueSpecification::PrimitiveType(n) => n.source_information = source_information,
            ValueSpecification::GenericTypeInstance(n) => n.source_information = source_information,
            ValueSpecification::UnitType(n) => n.source_information = source_information,
            ValueSpecification::EnumValue(n) => n.source_information = source_information,
            ValueSpecification::ClassInstance(n) => n.source_information = source_information,
        }
    }

    /// Source coordinates of this node, if attached.
    pub fn source_information(&self) -> Option<&SourceInformation> {
        match self {
            ValueSpecification::CString(n) => n.source_information.as_ref(),
            ValueSpecification::CInteger(n) => n.source_information.as_ref(),
            ValueSpecification::CFloat(n) => n.source_information.as_ref(),
            ValueSpecification::CDecimal(n) => n.source_information.as_ref(),
            ValueSpecification::CBoolean(n) => n.source_information.as_ref(),
            ValueSpecification::CByteArray(n) => n.source_information.as_ref(),
            ValueSpecification::CDateTime(n) => n.source_information.as_ref(),
            ValueSpecification::CStrictDate(n) => n.source_information.as_ref(),
            ValueSpecification::CStrictTime(n) => n.source_information.as_ref(),
            ValueSpecification::CLatestDate(n) => n.source_information.as_ref(),
            ValueSpecification::Variable(n) => n.source_information.as_ref(),
            ValueSpecification::AppliedFunction(n) => n.source_information.as_ref(),
            ValueSpecification::AppliedProperty(n) => n.source_information.as_ref(),
            ValueSpecification::Collection(n) => n.source_information.as_ref(),
            ValueSpecification::Lambda(n) => n.source_information.as_ref(),
            ValueSpecification::KeyExpression(n) => n.source_information.as_ref(),
            ValueSpecification::PackageableElementPtr(n) => n.source_information.as_ref(),
            ValueSpecification::PrimitiveType(n) => n.source_information.as_ref(),
            ValueSpecification::GenericTypeInstance(n) => n.source_information.as_ref(),
            ValueSpecification::UnitType(n) => n.source_information.as_ref(),
            ValueSpecification::EnumValue(n) => n.source_information.as_ref(),
            ValueSpecification::ClassInstance(n) => n.source_information.as_ref(),
        }
    }
}
