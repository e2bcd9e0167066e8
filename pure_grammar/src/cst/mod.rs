//! Concrete parse tree for the Pure domain grammar.
//!
//! The grammar itself is parsed externally; these types are the exhaustive,
//! typed shape of the resulting parse tree that the walker consumes. Every
//! alternative in the grammar is a dedicated variant, so walking the tree is
//! a series of `match` statements rather than null checks.
//!
//! Token-level nodes (identifiers, string literals, dates) keep their raw
//! source text; unquoting and numeric parsing happen in the walker so that
//! malformed values are reported with source coordinates.
use crate::utils::names;
use crate::utils::span::Span;

/// An identifier token, possibly quoted (`'my name'`).
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub text: String,
    pub span: Span,
}

impl Identifier {
    pub fn new(text: impl Into<String>, span: Span) -> Self {
        Self {
            text: text.into(),
            span,
        }
    }

    /// The unquoted name.
    pub fn name(&self) -> String {
        names::from_identifier(&self.text)
    }
}

/// `pkg::sub::Name`
#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedName {
    pub path: Vec<Identifier>,
    pub name: Identifier,
    pub span: Span,
}

impl QualifiedName {
    /// Package portion (`pkg::sub`), empty for unqualified names.
    pub fn package(&self) -> String {
        self.path
            .iter()
            .map(Identifier::name)
            .collect::<Vec<_>>()
            .join(names::PATH_SEPARATOR)
    }

    /// The full path (`pkg::sub::Name`).
    pub fn full_path(&self) -> String {
        names::element_path(&self.package(), &self.name.name())
    }
}

/// A string literal token with its quotes.
#[derive(Debug, Clone, PartialEq)]
pub struct StringLiteral {
    pub text: String,
    pub span: Span,
}

impl StringLiteral {
    /// The unquoted, unescaped value.
    pub fn value(&self) -> String {
        names::from_grammar_string(&self.text, true)
    }
}

/// Multiplicity argument as written: `[1]`, `[0..1]`, `[*]`, `[1..*]`.
/// `lower` is absent for the single-bound form.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiplicityArg {
    pub lower: Option<String>,
    pub upper: String,
    pub span: Span,
}

/// `%2020-01-01`, `%2020-01-01T10:00:00` (leading `%` included).
#[derive(Debug, Clone, PartialEq)]
pub struct DateLiteral {
    pub text: String,
    pub span: Span,
}

// ---------------------------------------------------------------------------
// Top-level definition
// ---------------------------------------------------------------------------

/// One parsed section of the domain grammar.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub imports: Vec<ImportStatement>,
    pub elements: Vec<ElementDefinition>,
}

/// `import pkg::sub::*;`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportStatement {
    pub path: Vec<Identifier>,
    pub span: Span,
}

impl ImportStatement {
    pub fn full_path(&self) -> String {
        self.path
            .iter()
            .map(Identifier::name)
            .collect::<Vec<_>>()
            .join(names::PATH_SEPARATOR)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementDefinition {
    Class(ClassDefinition),
    Association(AssociationDefinition),
    Enumeration(EnumDefinition),
    Profile(ProfileDefinition),
    Function(FunctionDefinition),
    Measure(MeasureDefinition),
}

// ---------------------------------------------------------------------------
// Class / association / enumeration / profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDefinition {
    pub name: QualifiedName,
    pub stereotypes: Vec<StereotypeRef>,
    pub tagged_values: Vec<TaggedValueRef>,
    pub super_types: Vec<QualifiedName>,
    pub constraints: Vec<ConstraintDef>,
    pub properties: Vec<PropertyDef>,
    pub qualified_properties: Vec<QualifiedPropertyDef>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssociationDefinition {
    pub name: QualifiedName,
    pub stereotypes: Vec<StereotypeRef>,
    pub tagged_values: Vec<TaggedValueRef>,
    pub properties: Vec<PropertyDef>,
    pub qualified_properties: Vec<QualifiedPropertyDef>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDefinition {
    pub name: QualifiedName,
    pub stereotypes: Vec<StereotypeRef>,
    pub tagged_values: Vec<TaggedValueRef>,
    pub values: Vec<EnumValueDef>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValueDef {
    pub name: Identifier,
    pub stereotypes: Vec<StereotypeRef>,
    pub tagged_values: Vec<TaggedValueRef>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileDefinition {
    pub name: QualifiedName,
    pub stereotypes: Vec<Identifier>,
    pub tags: Vec<Identifier>,
    pub span: Span,
}

/// `<<profile.stereotype>>`
#[derive(Debug, Clone, PartialEq)]
pub struct StereotypeRef {
    pub profile: QualifiedName,
    pub value: Identifier,
    pub span: Span,
}

/// `{profile.tag = 'value'}`
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedValueRef {
    pub profile: QualifiedName,
    pub tag: Identifier,
    pub value: StringLiteral,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDef {
    /// Aggregation kind keyword (`composite`, `shared`, `none`) when written.
    pub aggregation: Option<Identifier>,
    pub stereotypes: Vec<StereotypeRef>,
    pub tagged_values: Vec<TaggedValueRef>,
    pub name: Identifier,
    pub type_: TypeRef,
    pub multiplicity: MultiplicityArg,
    pub default_value: Option<DefaultValueExpression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValueExpression {
    Single(CombinedExpression),
    Array {
        values: Vec<CombinedExpression>,
        span: Span,
    },
}

impl DefaultValueExpression {
    pub fn span(&self) -> Span {
        match self {
            DefaultValueExpression::Single(expression) => expression.span,
            DefaultValueExpression::Array { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedPropertyDef {
    pub stereotypes: Vec<StereotypeRef>,
    pub tagged_values: Vec<TaggedValueRef>,
    pub name: Identifier,
    pub parameters: Vec<FunctionParameter>,
    pub body: CodeBlock,
    pub return_type: TypeRef,
    pub return_multiplicity: MultiplicityArg,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionParameter {
    pub name: Identifier,
    pub type_: TypeRef,
    pub multiplicity: MultiplicityArg,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintDef {
    Simple(SimpleConstraint),
    Complex(ComplexConstraint),
}

impl ConstraintDef {
    pub fn span(&self) -> Span {
        match self {
            ConstraintDef::Simple(c) => c.span,
            ConstraintDef::Complex(c) => c.span,
        }
    }
}

/// `constraintId: expression` (id optional).
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleConstraint {
    pub id: Option<Identifier>,
    pub expression: CombinedExpression,
    pub span: Span,
}

/// Block form with enforcement level, external id and message.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexConstraint {
    pub name: Identifier,
    pub enforcement_level: Option<Identifier>,
    pub external_id: Option<StringLiteral>,
    pub function: CombinedExpression,
    pub message: Option<CombinedExpression>,
    pub span: Span,
}

// ---------------------------------------------------------------------------
// Function
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefinition {
    pub name: QualifiedName,
    pub stereotypes: Vec<StereotypeRef>,
    pub tagged_values: Vec<TaggedValueRef>,
    pub parameters: Vec<FunctionParameter>,
    pub return_type: TypeRef,
    pub return_multiplicity: MultiplicityArg,
    pub body: CodeBlock,
    pub test_suites: Option<FunctionTestSuiteDef>,
    pub span: Span,
}

/// The `{ ... }` test block after a function body: loose tests and data at
/// the top level plus named suites.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionTestSuiteDef {
    pub tests: Vec<SimpleFunctionTest>,
    pub data: Vec<FunctionData>,
    pub suites: Vec<SimpleFunctionSuite>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimpleFunctionSuite {
    pub id: Identifier,
    pub tests: Vec<SimpleFunctionTest>,
    pub data: Vec<FunctionData>,
    pub span: Span,
}

/// `testId | functionName(args) => expected;`
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleFunctionTest {
    pub id: Identifier,
    pub function_name: Identifier,
    pub doc: Option<StringLiteral>,
    pub parameters: Vec<PrimitiveValueSource>,
    pub assertion: TestAssertionDef,
    pub span: Span,
}

/// Raw source slice of a primitive value, re-parsed by the primitive value
/// sub-parser with rebased coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveValueSource {
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TestAssertionDef {
    Primitive(PrimitiveValueSource),
    ExternalFormat {
        content_type: Identifier,
        value: StringLiteral,
        span: Span,
    },
}

/// `storePath: <data>` binding inside a test block.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionData {
    pub store: QualifiedName,
    pub value: Option<FunctionDataValue>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionDataValue {
    Reference(QualifiedName),
    ExternalFormat {
        content_type: Identifier,
        value: StringLiteral,
        span: Span,
    },
}

// ---------------------------------------------------------------------------
// Measure
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MeasureDefinition {
    pub name: QualifiedName,
    pub body: MeasureBody,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MeasureBody {
    /// `*Canonical: x -> ...` plus further convertible units.
    Canonical {
        canonical: MeasureExpr,
        others: Vec<MeasureExpr>,
    },
    /// Units with no conversion functions.
    NonConvertible(Vec<NonConvertibleMeasureExpr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeasureExpr {
    pub name: QualifiedName,
    pub parameter: Identifier,
    pub body: CodeBlock,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NonConvertibleMeasureExpr {
    pub name: QualifiedName,
    pub span: Span,
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    Named(QualifiedName),
    Unit(UnitName),
}

impl TypeRef {
    /// Raw textual form, as the grammar wrote it.
    pub fn text(&self) -> String {
        match self {
            TypeRef::Named(name) => name.full_path(),
            TypeRef::Unit(unit) => unit.full_path(),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            TypeRef::Named(name) => name.span,
            TypeRef::Unit(unit) => unit.span,
        }
    }
}

/// `Measure~Unit`
#[derive(Debug, Clone, PartialEq)]
pub struct UnitName {
    pub measure: QualifiedName,
    pub unit: Identifier,
    pub span: Span,
}

impl UnitName {
    pub fn full_path(&self) -> String {
        format!("{}~{}", self.measure.full_path(), self.unit.text)
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    pub lines: Vec<ProgramLine>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgramLine {
    Expression(CombinedExpression),
    Let(LetExpression),
}

/// `let name = expression`
#[derive(Debug, Clone, PartialEq)]
pub struct LetExpression {
    pub name: Identifier,
    pub value: CombinedExpression,
    pub span: Span,
}

/// A primary expression followed by a flat sequence of operator fragments,
/// exactly as the grammar produced them; precedence is resolved by the
/// walker.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedExpression {
    pub expression: Box<Expression>,
    pub parts: Vec<ExpressionPart>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionPart {
    Arithmetic(ArithmeticPart),
    Boolean(BooleanPart),
}

/// One arithmetic fragment: the operator and its right-hand operand(s).
/// `+`, `-` and `*` fragments may carry several operands (`+ 2 + 3` lexes as
/// one fragment with two operands); comparisons always carry exactly one.
#[derive(Debug, Clone, PartialEq)]
pub struct ArithmeticPart {
    pub op: ArithOp,
    pub op_span: Span,
    pub operands: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Plus,
    Minus,
    Times,
    Divide,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
}

impl ArithOp {
    /// Canonical applied-function name for this operator.
    pub fn function_name(&self) -> &'static str {
        match self {
            ArithOp::Plus => "plus",
            ArithOp::Minus => "minus",
            ArithOp::Times => "times",
            ArithOp::Divide => "divide",
            ArithOp::LessThan => "lessThan",
            ArithOp::LessThanEqual => "lessThanEqual",
            ArithOp::GreaterThan => "greaterThan",
            ArithOp::GreaterThanEqual => "greaterThanEqual",
        }
    }
}

/// One boolean fragment: `and <expr>` or `or <expr>`.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanPart {
    pub op: BoolOp,
    pub op_span: Span,
    pub operand: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    pub fn function_name(&self) -> &'static str {
        match self {
            BoolOp::And => "and",
            BoolOp::Or => "or",
        }
    }
}

/// `== right` or `!= right` trailing an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct EqualNotEqual {
    pub negated: bool,
    pub op_span: Span,
    pub right: CombinedArithmeticOnly,
    pub span: Span,
}

/// Right-hand side of an equality: arithmetic fragments only.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedArithmeticOnly {
    pub expression: Box<Expression>,
    pub parts: Vec<ArithmeticPart>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub base: BaseExpression,
    pub applications: Vec<PropertyOrFunctionApplication>,
    pub equal_not_equal: Option<EqualNotEqual>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BaseExpression {
    /// Parenthesized group.
    Combined(Box<CombinedExpression>),
    Atomic(AtomicExpression),
    Not {
        expression: Box<Expression>,
        span: Span,
    },
    Signed {
        negative: bool,
        expression: Box<Expression>,
        op_span: Span,
        span: Span,
    },
    /// `[e1, e2, ...]`
    Array {
        expressions: Vec<Expression>,
        span: Span,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyOrFunctionApplication {
    Property(PropertyApplication),
    Function(FunctionApplication),
}

/// `.property` or `.property(args)`
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyApplication {
    pub property: Identifier,
    pub arguments: Option<PropertyArguments>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyArguments {
    Expressions(Vec<CombinedExpression>),
    /// `%latest` milestoning argument(s) on a property call.
    LatestDates { count: usize, span: Span },
}

/// `->f(args)->g(args)` chain; each arrow step may itself chain qualified
/// names.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionApplication {
    pub calls: Vec<FunctionCall>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: QualifiedName,
    pub arguments: Vec<CombinedExpression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AtomicExpression {
    Literal(Literal),
    Island(IslandDefinition),
    New(NewInstance),
    Variable(VariableRef),
    /// Type in expression position (cast target, unit type).
    TypeReference(TypeRef),
    Lambda(LambdaDefinition),
    InstanceReference(InstanceReference),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(StringLiteral),
    Integer { text: String, span: Span },
    Float { text: String, span: Span },
    Decimal { text: String, span: Span },
    Date(DateLiteral),
    StrictTime { text: String, span: Span },
    Boolean { text: String, span: Span },
}

impl Literal {
    pub fn span(&self) -> Span {
        match self {
            Literal::String(s) => s.span,
            Literal::Integer { span, .. } => *span,
            Literal::Float { span, .. } => *span,
            Literal::Decimal { span, .. } => *span,
            Literal::Date(d) => d.span,
            Literal::StrictTime { span, .. } => *span,
            Literal::Boolean { span, .. } => *span,
        }
    }
}

/// Lambda in any of its three written forms: `{x, y | ...}`, `x | ...`,
/// `| ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaDefinition {
    pub parameters: Vec<LambdaParam>,
    pub body: CodeBlock,
    /// Span of the pipe and body, reported as the lambda's position.
    pub pipe_span: Span,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LambdaParam {
    pub name: Identifier,
    pub type_: Option<(TypeRef, MultiplicityArg)>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableRef {
    pub name: Identifier,
    pub span: Span,
}

/// `^Class(prop = value, ...)`
#[derive(Debug, Clone, PartialEq)]
pub struct NewInstance {
    pub class: QualifiedName,
    pub assignments: Vec<PropertyAssignment>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyAssignment {
    pub property: Identifier,
    pub value: Option<CombinedExpression>,
    pub span: Span,
}

/// A name in expression position, optionally followed by `.all()` and
/// friends.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceReference {
    pub target: InstanceTarget,
    pub all_or_function: Option<AllOrFunction>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InstanceTarget {
    Element(QualifiedName),
    Unit(UnitName),
    /// `::` with no name; only an error when something is called on it.
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AllOrFunction {
    All {
        span: Span,
    },
    AllVersions {
        span: Span,
    },
    AllVersionsInRange {
        text: String,
        span: Span,
    },
    /// `.all(%2020-01-01, %latest)` style milestoned retrieval.
    Milestoning {
        arguments: Vec<MilestoningArgument>,
        span: Span,
    },
    /// Plain function call on the referenced element.
    Call {
        arguments: Vec<CombinedExpression>,
        span: Span,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum MilestoningArgument {
    Variable(VariableRef),
    Date(DateLiteral),
    Latest { span: Span },
}

// ---------------------------------------------------------------------------
// Islands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum IslandDefinition {
    Extension(IslandExtension),
    NavigationPath(NavigationPathBlock),
}

/// `#{...}#` or `#Tag{...}#`. Content fragments keep their spacing so the
/// dispatched parser sees byte-accurate text.
#[derive(Debug, Clone, PartialEq)]
pub struct IslandExtension {
    /// The opening token text, e.g. `#{` or `#Relational{`.
    pub open_text: String,
    pub open_span: Span,
    pub content: Vec<IslandContent>,
    pub span: Span,
}

impl IslandExtension {
    /// The embedded-parser tag between `#` and `{`, empty for graph fetch.
    pub fn tag(&self) -> &str {
        self.open_text[1..self.open_text.len() - 1].trim()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IslandContent {
    pub text: String,
    pub span: Span,
}

/// `#/Class/path#` navigation block, the full token.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationPathBlock {
    pub text: String,
    pub span: Span,
}
