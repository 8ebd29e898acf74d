//! Semantic annotation expressions.
//!
//! The semantic tree mirrors [`CsdlExpression`] node for node. Names inside it are bound
//! lazily and memoized per node:
//!
//! - `Apply` binds its function through overload resolution ([`EdmApplyExpression::function`])
//! - `Cast` and `IsOf` resolve their asserted type
//! - `Record` resolves its declared structured type
//! - `LabeledElementReference` finds its label anywhere in the model
//! - `EnumMember` resolves `Namespace.Enum/Member` paths
//!
//! Unresolvable names never abort; they become bad elements collected by
//! [`EdmExpression::errors`].

use std::{fmt, sync::Arc};

use crate::{
    csdl::{CsdlExpression, CsdlExpressionKind, CsdlTypeReference},
    edm::{
        BadElement, BadElementKind, BadElementRc, EdmError, EdmErrorCode, EdmPrimitiveTypeKind,
        EdmType, EdmTypeReference, Location,
    },
    semantics::{
        cache::Cache, model::ModelLink, overload, EdmEnumMemberRc, EdmOperation, EdmOperationRc,
        ElementRef, Resolution, SemanticConfig,
    },
};

/// Reference to an [`EdmExpression`]
pub type EdmExpressionRc = Arc<EdmExpression>;
/// Reference to an [`EdmLabeledElement`]
pub type EdmLabeledElementRc = Arc<EdmLabeledElement>;

/// An `Apply` expression: a function call.
pub struct EdmApplyExpression {
    link: ModelLink,
    function_name: String,
    arguments: Vec<EdmExpressionRc>,
    location: Location,
    function: Cache<Resolution<ElementRef<EdmOperation>>>,
}

impl EdmApplyExpression {
    /// The function name as written
    #[must_use]
    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    /// Call arguments in order
    #[must_use]
    pub fn arguments(&self) -> &[EdmExpressionRc] {
        &self.arguments
    }

    /// The function overload the arguments select.
    ///
    /// Computed once with the two-stage overload filter. Failures
    /// carry [`EdmErrorCode::BadUnresolvedOperation`],
    /// [`EdmErrorCode::OperationParametersDontMatch`] or
    /// [`EdmErrorCode::BadAmbiguousOperation`] at the location of this expression.
    pub fn function(&self) -> Resolution<EdmOperationRc> {
        let resolved = self.function.get_or_compute(
            || self.compute_function(),
            || {
                Err(BadElement::new(
                    BadElementKind::Operation,
                    self.function_name.as_str(),
                    EdmError::new(
                        EdmErrorCode::BadUnresolvedOperation,
                        self.location.clone(),
                        format!(
                            "The function '{}' is applied to an argument that depends on itself",
                            self.function_name
                        ),
                    ),
                ))
            },
        );

        match resolved {
            Ok(operation) => operation.upgrade().ok_or_else(|| self.detached()),
            Err(bad) => Err(bad.clone()),
        }
    }

    fn compute_function(&self) -> Resolution<ElementRef<EdmOperation>> {
        let model = self.link.get().ok_or_else(|| self.detached())?;
        overload::resolve_function(&model, &self.function_name, &self.arguments, &self.location)
            .map(|operation| ElementRef::new(&operation))
    }

    fn detached(&self) -> BadElementRc {
        ModelLink::detached(
            BadElementKind::Operation,
            &self.function_name,
            EdmErrorCode::BadUnresolvedOperation,
            &self.location,
        )
    }
}

/// The operand and asserted type of a `Cast` or `IsOf` expression.
pub struct EdmTypeAssertion {
    link: ModelLink,
    declared_type: CsdlTypeReference,
    operand: EdmExpressionRc,
    location: Location,
    type_ref: Cache<EdmTypeReference>,
}

impl EdmTypeAssertion {
    /// The operand expression
    #[must_use]
    pub fn operand(&self) -> &EdmExpressionRc {
        &self.operand
    }

    /// The asserted type.
    pub fn type_ref(&self) -> &EdmTypeReference {
        self.type_ref.get_or_compute(
            || {
                self.link
                    .resolve_type_reference(&self.declared_type, &self.location)
            },
            || {
                EdmTypeReference::unresolved(BadElement::new(
                    BadElementKind::Type,
                    self.declared_type.type_name.as_str(),
                    EdmError::new(
                        EdmErrorCode::BadUnresolvedType,
                        self.location.clone(),
                        "Cyclic type assertion",
                    ),
                ))
            },
        )
    }
}

/// A property value of a `Record` expression.
#[derive(Debug)]
pub struct EdmPropertyConstructor {
    name: String,
    value: EdmExpressionRc,
}

impl EdmPropertyConstructor {
    /// Property name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Property value
    #[must_use]
    pub fn value(&self) -> &EdmExpressionRc {
        &self.value
    }
}

/// A `Record` expression.
pub struct EdmRecordExpression {
    link: ModelLink,
    type_name: Option<String>,
    properties: Vec<EdmPropertyConstructor>,
    location: Location,
    declared_type: Cache<Option<EdmTypeReference>>,
}

impl EdmRecordExpression {
    /// The declared type name, if any
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// Property values in declaration order
    #[must_use]
    pub fn properties(&self) -> &[EdmPropertyConstructor] {
        &self.properties
    }

    /// The value given for `name`
    #[must_use]
    pub fn find_property(&self, name: &str) -> Option<&EdmExpressionRc> {
        self.properties
            .iter()
            .find(|property| property.name == name)
            .map(|property| &property.value)
    }

    /// The declared record type.
    ///
    /// `None` if the record declares no type. A name that is not a structured type yields an
    /// unresolved reference.
    pub fn declared_type(&self) -> Option<&EdmTypeReference> {
        self.declared_type
            .get_or_compute(|| self.compute_declared_type(), || None)
            .as_ref()
    }

    fn compute_declared_type(&self) -> Option<EdmTypeReference> {
        let name = self.type_name.as_deref()?;
        let resolved = self.link.resolve_type_name(name, &self.location);
        if resolved.is_bad() || resolved.is_structured() {
            return Some(EdmTypeReference::new(resolved, false));
        }

        Some(EdmTypeReference::unresolved(BadElement::new(
            BadElementKind::Type,
            name,
            EdmError::new(
                EdmErrorCode::BadUnresolvedType,
                self.location.clone(),
                format!("The record type '{name}' is not a structured type"),
            ),
        )))
    }
}

/// A `LabeledElement`: a named expression that can be referenced elsewhere in the model.
pub struct EdmLabeledElement {
    name: String,
    namespace: String,
    expression: EdmExpressionRc,
    location: Location,
}

impl EdmLabeledElement {
    /// The label as written, simple or qualified
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The namespace of the schema declaring the label
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The labeled expression
    #[must_use]
    pub fn expression(&self) -> &EdmExpressionRc {
        &self.expression
    }

    /// Where the label is declared
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }
}

impl fmt::Debug for EdmLabeledElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdmLabeledElement({}.{})", self.namespace, self.name)
    }
}

/// A `LabeledElementReference` expression.
pub struct EdmLabeledElementReference {
    link: ModelLink,
    name: String,
    location: Location,
    referenced: Cache<Resolution<ElementRef<EdmLabeledElement>>>,
}

impl EdmLabeledElementReference {
    /// The referenced label as written
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The labeled element, found model-wide.
    ///
    /// No match yields [`EdmErrorCode::BadUnresolvedLabeledElement`], more than one
    /// [`EdmErrorCode::BadAmbiguousLabeledElement`].
    pub fn referenced(&self) -> Resolution<EdmLabeledElementRc> {
        let resolved = self.referenced.get_or_compute(
            || self.compute_referenced(),
            || Err(self.bad(EdmErrorCode::BadUnresolvedLabeledElement, "is cyclic")),
        );
        match resolved {
            Ok(label) => label.upgrade().ok_or_else(|| {
                ModelLink::detached(
                    BadElementKind::LabeledElement,
                    &self.name,
                    EdmErrorCode::BadUnresolvedLabeledElement,
                    &self.location,
                )
            }),
            Err(bad) => Err(bad.clone()),
        }
    }

    fn compute_referenced(&self) -> Resolution<ElementRef<EdmLabeledElement>> {
        let found = self
            .link
            .get()
            .map(|model| model.find_labeled_elements(&self.name))
            .unwrap_or_default();
        match found.as_slice() {
            [] => Err(self.bad(EdmErrorCode::BadUnresolvedLabeledElement, "cannot be found")),
            [label] => Ok(ElementRef::new(label)),
            _ => {
                log::debug!("label '{}' is defined {} times", self.name, found.len());
                Err(self.bad(
                    EdmErrorCode::BadAmbiguousLabeledElement,
                    "is defined more than once",
                ))
            }
        }
    }

    fn bad(&self, code: EdmErrorCode, reason: &str) -> BadElementRc {
        BadElement::new(
            BadElementKind::LabeledElement,
            self.name.as_str(),
            EdmError::new(
                code,
                self.location.clone(),
                format!("The labeled element '{}' {reason}", self.name),
            ),
        )
    }
}

/// An `EnumMember` expression.
pub struct EdmEnumMemberExpression {
    link: ModelLink,
    paths: Vec<String>,
    location: Location,
    members: Cache<Resolution<Vec<EdmEnumMemberRc>>>,
}

impl EdmEnumMemberExpression {
    /// The member paths as written (`Namespace.Enum/Member`)
    #[must_use]
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// The referenced members; all of them belong to the same enum type.
    pub fn members(&self) -> Resolution<&[EdmEnumMemberRc]> {
        match self
            .members
            .get_or_compute(|| self.compute_members(), || Err(self.bad("is cyclic")))
        {
            Ok(members) => Ok(members.as_slice()),
            Err(bad) => Err(bad.clone()),
        }
    }

    fn compute_members(&self) -> Resolution<Vec<EdmEnumMemberRc>> {
        let model = self.link.get().ok_or_else(|| self.bad("has no model"))?;
        if self.paths.is_empty() {
            return Err(self.bad("names no member"));
        }

        let mut members: Vec<EdmEnumMemberRc> = Vec::with_capacity(self.paths.len());
        for path in &self.paths {
            let (type_name, member_name) = path
                .split_once('/')
                .ok_or_else(|| self.bad(&format!("path '{path}' is not 'Type/Member'")))?;
            let enum_type = model
                .find_type(type_name)
                .and_then(|found| found.as_enum())
                .ok_or_else(|| self.bad(&format!("type '{type_name}' is not a known enum type")))?;
            let member = enum_type.find_member(member_name).ok_or_else(|| {
                self.bad(&format!(
                    "member '{member_name}' is not declared by '{}'",
                    enum_type.full_name()
                ))
            })?;
            if let Some(first) = members.first() {
                if !first.is_member_of(&enum_type) {
                    return Err(self.bad("mixes members of different enum types"));
                }
            }
            members.push(member);
        }

        Ok(members)
    }

    fn bad(&self, reason: &str) -> BadElementRc {
        BadElement::new(
            BadElementKind::EnumMember,
            self.paths.join(" "),
            EdmError::new(
                EdmErrorCode::BadUnresolvedEnumMember,
                self.location.clone(),
                format!("The enum member expression '{}' {reason}", self.paths.join(" ")),
            ),
        )
    }
}

/// The node kind of an [`EdmExpression`] together with its bound parts.
pub enum EdmExpressionKind {
    /// `Null`
    Null,
    /// Boolean constant
    Boolean(bool),
    /// Integer constant
    Integer(i64),
    /// Floating point constant
    Floating(f64),
    /// Decimal constant, as written
    Decimal(String),
    /// String constant
    String(String),
    /// Binary constant
    Binary(Vec<u8>),
    /// Guid constant
    Guid(String),
    /// Date constant
    Date(String),
    /// DateTimeOffset constant
    DateTimeOffset(String),
    /// Duration constant
    Duration(String),
    /// TimeOfDay constant
    TimeOfDay(String),
    /// Instance path
    Path(String),
    /// Property path
    PropertyPath(String),
    /// Navigation property path
    NavigationPropertyPath(String),
    /// Annotation path
    AnnotationPath(String),
    /// Function call
    Apply(EdmApplyExpression),
    /// Type cast
    Cast(EdmTypeAssertion),
    /// Type test
    IsOf(EdmTypeAssertion),
    /// Conditional
    If {
        /// Condition
        test: EdmExpressionRc,
        /// Value if the condition holds
        if_true: EdmExpressionRc,
        /// Value otherwise
        if_false: EdmExpressionRc,
    },
    /// Collection of values
    Collection(Vec<EdmExpressionRc>),
    /// Structured value
    Record(EdmRecordExpression),
    /// Named expression
    LabeledElement(EdmLabeledElementRc),
    /// Reference to a named expression
    LabeledElementReference(EdmLabeledElementReference),
    /// Enum value
    EnumMember(EdmEnumMemberExpression),
}

/// A node of a semantic annotation expression.
pub struct EdmExpression {
    link: ModelLink,
    kind: EdmExpressionKind,
    location: Location,
    type_ref: Cache<Option<EdmTypeReference>>,
}

impl EdmExpression {
    /// The node kind and its bound parts
    #[must_use]
    pub fn kind(&self) -> &EdmExpressionKind {
        &self.kind
    }

    /// Where the expression is written
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    pub(crate) fn config(&self) -> SemanticConfig {
        self.link.config()
    }

    /// The static type of the expression, where one exists.
    ///
    /// Integer constants are `Edm.Int64`, floating constants `Edm.Double`, `IsOf` is
    /// `Edm.Boolean`, `Apply` is the return type of the bound function, `Cast` its asserted
    /// type and `Record` its declared type. Paths, `Null` and collections have no static type;
    /// neither has a label reference that leads back to itself.
    pub fn type_ref(&self) -> Option<&EdmTypeReference> {
        self.type_ref
            .get_or_compute(|| self.compute_type_ref(), || None)
            .as_ref()
    }

    fn compute_type_ref(&self) -> Option<EdmTypeReference> {
        use EdmPrimitiveTypeKind as P;

        let primitive = |kind| Some(EdmTypeReference::primitive(kind, false));
        match &self.kind {
            EdmExpressionKind::Null
            | EdmExpressionKind::Path(_)
            | EdmExpressionKind::PropertyPath(_)
            | EdmExpressionKind::NavigationPropertyPath(_)
            | EdmExpressionKind::AnnotationPath(_)
            | EdmExpressionKind::Collection(_) => None,
            EdmExpressionKind::Boolean(_) | EdmExpressionKind::IsOf(_) => primitive(P::Boolean),
            EdmExpressionKind::Integer(_) => primitive(P::Int64),
            EdmExpressionKind::Floating(_) => primitive(P::Double),
            EdmExpressionKind::Decimal(_) => primitive(P::Decimal),
            EdmExpressionKind::String(_) => primitive(P::String),
            EdmExpressionKind::Binary(_) => primitive(P::Binary),
            EdmExpressionKind::Guid(_) => primitive(P::Guid),
            EdmExpressionKind::Date(_) => primitive(P::Date),
            EdmExpressionKind::DateTimeOffset(_) => primitive(P::DateTimeOffset),
            EdmExpressionKind::Duration(_) => primitive(P::Duration),
            EdmExpressionKind::TimeOfDay(_) => primitive(P::TimeOfDay),
            EdmExpressionKind::Apply(apply) => apply.function().ok()?.return_type().cloned(),
            EdmExpressionKind::Cast(cast) => Some(cast.type_ref().clone()),
            EdmExpressionKind::If { if_true, .. } => if_true.type_ref().cloned(),
            EdmExpressionKind::Record(record) => record.declared_type().cloned(),
            EdmExpressionKind::LabeledElement(label) => label.expression.type_ref().cloned(),
            EdmExpressionKind::LabeledElementReference(reference) => {
                reference.referenced().ok()?.expression.type_ref().cloned()
            }
            EdmExpressionKind::EnumMember(expression) => {
                let members = expression.members().ok()?;
                let enum_type = members.first()?.declaring_type()?;
                Some(EdmTypeReference::new(EdmType::enumeration(&enum_type), false))
            }
        }
    }

    /// Direct child expressions.
    #[must_use]
    pub fn children(&self) -> Vec<&EdmExpressionRc> {
        match &self.kind {
            EdmExpressionKind::Apply(apply) => apply.arguments.iter().collect(),
            EdmExpressionKind::Cast(assertion) | EdmExpressionKind::IsOf(assertion) => {
                vec![&assertion.operand]
            }
            EdmExpressionKind::If {
                test,
                if_true,
                if_false,
            } => vec![test, if_true, if_false],
            EdmExpressionKind::Collection(items) => items.iter().collect(),
            EdmExpressionKind::Record(record) => {
                record.properties.iter().map(|p| &p.value).collect()
            }
            EdmExpressionKind::LabeledElement(label) => vec![&label.expression],
            _ => Vec::new(),
        }
    }

    /// Resolution errors of this node and every node below it.
    ///
    /// Labeled elements report their body where they are declared; references to them only
    /// report their own resolution.
    #[must_use]
    pub fn errors(&self) -> Vec<EdmError> {
        let mut errors = Vec::new();
        match &self.kind {
            EdmExpressionKind::Apply(apply) => {
                if let Err(bad) = apply.function() {
                    errors.extend(bad.errors.iter().cloned());
                }
            }
            EdmExpressionKind::Cast(assertion) | EdmExpressionKind::IsOf(assertion) => {
                errors.extend(assertion.type_ref().definition.errors());
            }
            EdmExpressionKind::Record(record) => {
                if let Some(declared) = record.declared_type() {
                    errors.extend(declared.definition.errors());
                }
            }
            EdmExpressionKind::LabeledElementReference(reference) => {
                if let Err(bad) = reference.referenced() {
                    errors.extend(bad.errors.iter().cloned());
                }
            }
            EdmExpressionKind::EnumMember(expression) => {
                if let Err(bad) = expression.members() {
                    errors.extend(bad.errors.iter().cloned());
                }
            }
            _ => {}
        }
        for child in self.children() {
            errors.extend(child.errors());
        }
        errors
    }
}

impl fmt::Debug for EdmExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match &self.kind {
            EdmExpressionKind::Null => "Null",
            EdmExpressionKind::Boolean(_) => "Boolean",
            EdmExpressionKind::Integer(_) => "Integer",
            EdmExpressionKind::Floating(_) => "Floating",
            EdmExpressionKind::Decimal(_) => "Decimal",
            EdmExpressionKind::String(_) => "String",
            EdmExpressionKind::Binary(_) => "Binary",
            EdmExpressionKind::Guid(_) => "Guid",
            EdmExpressionKind::Date(_) => "Date",
            EdmExpressionKind::DateTimeOffset(_) => "DateTimeOffset",
            EdmExpressionKind::Duration(_) => "Duration",
            EdmExpressionKind::TimeOfDay(_) => "TimeOfDay",
            EdmExpressionKind::Path(_) => "Path",
            EdmExpressionKind::PropertyPath(_) => "PropertyPath",
            EdmExpressionKind::NavigationPropertyPath(_) => "NavigationPropertyPath",
            EdmExpressionKind::AnnotationPath(_) => "AnnotationPath",
            EdmExpressionKind::Apply(_) => "Apply",
            EdmExpressionKind::Cast(_) => "Cast",
            EdmExpressionKind::IsOf(_) => "IsOf",
            EdmExpressionKind::If { .. } => "If",
            EdmExpressionKind::Collection(_) => "Collection",
            EdmExpressionKind::Record(_) => "Record",
            EdmExpressionKind::LabeledElement(_) => "LabeledElement",
            EdmExpressionKind::LabeledElementReference(_) => "LabeledElementReference",
            EdmExpressionKind::EnumMember(_) => "EnumMember",
        };
        write!(f, "EdmExpression({name} at {})", self.location)
    }
}

/// Builds semantic expressions for one schema and collects the labels declared in them.
pub(crate) struct ExpressionContext<'a> {
    link: ModelLink,
    namespace: &'a str,
    labels: &'a mut Vec<EdmLabeledElementRc>,
}

impl<'a> ExpressionContext<'a> {
    pub(crate) fn new(
        link: &ModelLink,
        namespace: &'a str,
        labels: &'a mut Vec<EdmLabeledElementRc>,
    ) -> Self {
        ExpressionContext {
            link: link.clone(),
            namespace,
            labels,
        }
    }

    pub(crate) fn link(&self) -> &ModelLink {
        &self.link
    }

    pub(crate) fn build(&mut self, csdl: &CsdlExpression) -> EdmExpressionRc {
        let link = self.link.clone();
        let location = csdl.location.clone();

        let kind = match &csdl.kind {
            CsdlExpressionKind::Null => EdmExpressionKind::Null,
            CsdlExpressionKind::Bool(value) => EdmExpressionKind::Boolean(*value),
            CsdlExpressionKind::Int(value) => EdmExpressionKind::Integer(*value),
            CsdlExpressionKind::Float(value) => EdmExpressionKind::Floating(*value),
            CsdlExpressionKind::Decimal(value) => EdmExpressionKind::Decimal(value.clone()),
            CsdlExpressionKind::String(value) => EdmExpressionKind::String(value.clone()),
            CsdlExpressionKind::Binary(value) => EdmExpressionKind::Binary(value.clone()),
            CsdlExpressionKind::Guid(value) => EdmExpressionKind::Guid(value.clone()),
            CsdlExpressionKind::Date(value) => EdmExpressionKind::Date(value.clone()),
            CsdlExpressionKind::DateTimeOffset(value) => {
                EdmExpressionKind::DateTimeOffset(value.clone())
            }
            CsdlExpressionKind::Duration(value) => EdmExpressionKind::Duration(value.clone()),
            CsdlExpressionKind::TimeOfDay(value) => EdmExpressionKind::TimeOfDay(value.clone()),
            CsdlExpressionKind::Path(path) => EdmExpressionKind::Path(path.clone()),
            CsdlExpressionKind::PropertyPath(path) => EdmExpressionKind::PropertyPath(path.clone()),
            CsdlExpressionKind::NavigationPropertyPath(path) => {
                EdmExpressionKind::NavigationPropertyPath(path.clone())
            }
            CsdlExpressionKind::AnnotationPath(path) => {
                EdmExpressionKind::AnnotationPath(path.clone())
            }
            CsdlExpressionKind::Apply {
                function,
                arguments,
            } => EdmExpressionKind::Apply(EdmApplyExpression {
                link: link.clone(),
                function_name: function.clone(),
                arguments: arguments.iter().map(|argument| self.build(argument)).collect(),
                location: location.clone(),
                function: Cache::new(),
            }),
            CsdlExpressionKind::Cast { type_ref, operand } => {
                EdmExpressionKind::Cast(self.type_assertion(type_ref, operand, &location))
            }
            CsdlExpressionKind::IsOf { type_ref, operand } => {
                EdmExpressionKind::IsOf(self.type_assertion(type_ref, operand, &location))
            }
            CsdlExpressionKind::If {
                test,
                if_true,
                if_false,
            } => EdmExpressionKind::If {
                test: self.build(test),
                if_true: self.build(if_true),
                if_false: self.build(if_false),
            },
            CsdlExpressionKind::Collection(items) => {
                EdmExpressionKind::Collection(items.iter().map(|item| self.build(item)).collect())
            }
            CsdlExpressionKind::Record {
                type_name,
                properties,
            } => EdmExpressionKind::Record(EdmRecordExpression {
                link: link.clone(),
                type_name: type_name.clone(),
                properties: properties
                    .iter()
                    .map(|(name, value)| EdmPropertyConstructor {
                        name: name.clone(),
                        value: self.build(value),
                    })
                    .collect(),
                location: location.clone(),
                declared_type: Cache::new(),
            }),
            CsdlExpressionKind::LabeledElement { name, expression } => {
                let label = Arc::new(EdmLabeledElement {
                    name: name.clone(),
                    namespace: self.namespace.to_string(),
                    expression: self.build(expression),
                    location: location.clone(),
                });
                self.labels.push(label.clone());
                EdmExpressionKind::LabeledElement(label)
            }
            CsdlExpressionKind::LabeledElementReference(name) => {
                EdmExpressionKind::LabeledElementReference(EdmLabeledElementReference {
                    link: link.clone(),
                    name: name.clone(),
                    location: location.clone(),
                    referenced: Cache::new(),
                })
            }
            CsdlExpressionKind::EnumMember(paths) => {
                EdmExpressionKind::EnumMember(EdmEnumMemberExpression {
                    link: link.clone(),
                    paths: paths.clone(),
                    location: location.clone(),
                    members: Cache::new(),
                })
            }
        };

        Arc::new(EdmExpression {
            link,
            kind,
            location,
            type_ref: Cache::new(),
        })
    }

    fn type_assertion(
        &mut self,
        type_ref: &CsdlTypeReference,
        operand: &CsdlExpression,
        location: &Location,
    ) -> EdmTypeAssertion {
        EdmTypeAssertion {
            link: self.link.clone(),
            declared_type: type_ref.clone(),
            operand: self.build(operand),
            location: location.clone(),
            type_ref: Cache::new(),
        }
    }
}
