//! Terms, vocabulary annotations and annotation targets.
//!
//! An annotation applies a term to a target element named by a path. Term and target are
//! bound lazily; the value expression is built eagerly with the annotation and type checked
//! against the term type when errors are collected.
//!
//! # Target paths
//!
//! | Path                          | Target                                   |
//! |-------------------------------|------------------------------------------|
//! | `Ns`                          | schema                                   |
//! | `Ns.Type`                     | schema type                              |
//! | `Ns.Type/Property`            | property, navigation property            |
//! | `Ns.Type/A/B`                 | property reached through complex types   |
//! | `Ns.Enum/Member`              | enum member                              |
//! | `Ns.Op`, `Ns.Op(Ns.T,...)`    | every overload, or those of a signature  |
//! | `Ns.Op(...)/param`            | parameter                                |
//! | `Ns.Op(...)/$ReturnType`      | return type                              |
//! | `Ns.Container`                | entity container                         |
//! | `Ns.Container/Child`          | entity set, singleton or operation import |
//! | `Ns.Term`                     | term                                     |

use std::{fmt, sync::Arc};

use crate::{
    csdl::{AppliesTo, CsdlAnnotation, CsdlAnnotations, CsdlTerm, CsdlTypeReference, OperationKind},
    edm::{
        BadElement, BadElementKind, BadElementRc, EdmError, EdmErrorCode, EdmType,
        EdmTypeReference, Location,
    },
    semantics::{
        cache::Cache,
        model::ModelLink,
        paths::{parse_target_path, resolve_property_path, TargetPath, RETURN_TYPE_SEGMENT},
        try_cast, EdmCheckable, EdmEntityContainerRc, EdmEnumMemberRc, EdmExpressionRc,
        EdmModel, EdmNavigationPropertyRc, EdmNavigationSourceRc, EdmOperationImportRc,
        EdmOperationRc, EdmParameterRc, EdmStructuralPropertyRc, ElementRef, ExpressionContext,
        NavigationSourceKind, Resolution,
    },
};

/// Reference to an [`EdmTerm`]
pub type EdmTermRc = Arc<EdmTerm>;
/// Reference to an [`EdmVocabularyAnnotation`]
pub type EdmVocabularyAnnotationRc = Arc<EdmVocabularyAnnotation>;

/// A term: the definition of an annotation's meaning and value type.
pub struct EdmTerm {
    link: ModelLink,
    namespace: String,
    name: String,
    declared_type: CsdlTypeReference,
    base_term_name: Option<String>,
    applies_to: AppliesTo,
    default_value: Option<String>,
    location: Location,
    type_ref: Cache<EdmTypeReference>,
    base_term: Cache<Option<Resolution<ElementRef<EdmTerm>>>>,
}

impl EdmTerm {
    pub(crate) fn new(link: &ModelLink, namespace: &str, csdl: &CsdlTerm) -> EdmTermRc {
        Arc::new(EdmTerm {
            link: link.clone(),
            namespace: namespace.to_string(),
            name: csdl.name.clone(),
            declared_type: csdl.type_ref.clone(),
            base_term_name: csdl.base_term.clone(),
            applies_to: csdl.applies_to,
            default_value: csdl.default_value.clone(),
            location: csdl.location.clone(),
            type_ref: Cache::new(),
            base_term: Cache::new(),
        })
    }

    /// The simple name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `Namespace.Name`
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// Element kinds the term may be applied to; empty means any.
    #[must_use]
    pub fn applies_to(&self) -> AppliesTo {
        self.applies_to
    }

    /// The default value literal
    #[must_use]
    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    /// Where the term is declared
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// The value type of the term.
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
                        "Cyclic term type",
                    ),
                ))
            },
        )
    }

    /// The term this term specializes.
    ///
    /// `None` without a base term. An unknown name, or a chain of base terms leading back
    /// here, yields [`EdmErrorCode::BadUnresolvedTerm`].
    pub fn base_term(&self) -> Option<Resolution<EdmTermRc>> {
        let resolved = self
            .base_term
            .get_or_compute(
                || self.compute_base_term(),
                || Some(Err(self.bad_base("is part of a base term cycle"))),
            )
            .as_ref()?;
        Some(match resolved {
            Ok(base) => base.upgrade().ok_or_else(|| {
                ModelLink::detached(
                    BadElementKind::Term,
                    self.base_term_name.as_deref().unwrap_or_default(),
                    EdmErrorCode::BadUnresolvedTerm,
                    &self.location,
                )
            }),
            Err(bad) => Err(bad.clone()),
        })
    }

    fn compute_base_term(&self) -> Option<Resolution<ElementRef<EdmTerm>>> {
        let name = self.base_term_name.as_deref()?;
        let Some(base) = self.link.get().and_then(|model| model.find_term(name)) else {
            return Some(Err(self.bad_base("cannot be found")));
        };

        // Inductive step: reaches this cell again if the chain is cyclic.
        let _ = base.base_term();

        Some(Ok(ElementRef::new(&base)))
    }

    fn bad_base(&self, reason: &str) -> BadElementRc {
        let name = self.base_term_name.as_deref().unwrap_or_default();
        BadElement::new(
            BadElementKind::Term,
            name,
            EdmError::new(
                EdmErrorCode::BadUnresolvedTerm,
                self.location.clone(),
                format!("The base term '{name}' of '{}' {reason}", self.full_name()),
            ),
        )
    }
}

impl EdmCheckable for EdmTerm {
    fn errors(&self) -> Vec<EdmError> {
        let mut errors = self.type_ref().definition.errors();
        if let Some(Err(bad)) = self.base_term() {
            errors.extend(bad.errors.iter().cloned());
        }
        errors
    }
}

impl fmt::Debug for EdmTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdmTerm({}: {})", self.full_name(), self.declared_type.type_name)
    }
}

/// The element an annotation applies to.
#[derive(Clone)]
pub enum AnnotationTarget {
    /// A schema, by namespace
    Schema(String),
    /// An entity, complex, enum or type definition
    Type(EdmType),
    /// A structural property
    Property(EdmStructuralPropertyRc),
    /// A navigation property
    NavigationProperty(EdmNavigationPropertyRc),
    /// An enum member
    EnumMember(EdmEnumMemberRc),
    /// The overloads selected by the path
    Operation(Vec<EdmOperationRc>),
    /// The named parameter of each selected overload
    Parameter(Vec<EdmParameterRc>),
    /// The return type of each selected overload
    ReturnType(Vec<EdmOperationRc>),
    /// An entity container
    Container(EdmEntityContainerRc),
    /// An entity set or singleton
    NavigationSource(EdmNavigationSourceRc),
    /// The operation imports of that name
    OperationImport(Vec<EdmOperationImportRc>),
    /// A term
    Term(EdmTermRc),
    /// A path that does not resolve
    Unresolved(BadElementRc),
}

fn same_elements<T>(left: &[Arc<T>], right: &[Arc<T>]) -> bool {
    left.len() == right.len() && left.iter().zip(right).all(|(a, b)| Arc::ptr_eq(a, b))
}

impl AnnotationTarget {
    /// Check whether both targets denote the same element(s).
    ///
    /// Unresolved targets are never the same as anything.
    #[must_use]
    pub fn is_same(&self, other: &AnnotationTarget) -> bool {
        match (self, other) {
            (Self::Schema(a), Self::Schema(b)) => a == b,
            (Self::Type(a), Self::Type(b)) => a.is_equivalent_to(b),
            (Self::Property(a), Self::Property(b)) => Arc::ptr_eq(a, b),
            (Self::NavigationProperty(a), Self::NavigationProperty(b)) => Arc::ptr_eq(a, b),
            (Self::EnumMember(a), Self::EnumMember(b)) => Arc::ptr_eq(a, b),
            (Self::Operation(a), Self::Operation(b)) | (Self::ReturnType(a), Self::ReturnType(b)) => {
                same_elements(a, b)
            }
            (Self::Parameter(a), Self::Parameter(b)) => same_elements(a, b),
            (Self::Container(a), Self::Container(b)) => Arc::ptr_eq(a, b),
            (Self::NavigationSource(a), Self::NavigationSource(b)) => Arc::ptr_eq(a, b),
            (Self::OperationImport(a), Self::OperationImport(b)) => same_elements(a, b),
            (Self::Term(a), Self::Term(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// The `AppliesTo` kind of the target; empty for unresolved targets.
    #[must_use]
    pub fn applies_to_flag(&self) -> AppliesTo {
        match self {
            Self::Schema(_) => AppliesTo::SCHEMA,
            Self::Type(EdmType::Entity(_)) => AppliesTo::ENTITY_TYPE,
            Self::Type(EdmType::Complex(_)) => AppliesTo::COMPLEX_TYPE,
            Self::Type(EdmType::Enum(_)) => AppliesTo::ENUM_TYPE,
            Self::Type(EdmType::TypeDefinition(_)) => AppliesTo::TYPE_DEFINITION,
            Self::Type(_) | Self::Unresolved(_) => AppliesTo::empty(),
            Self::Property(_) => AppliesTo::PROPERTY,
            Self::NavigationProperty(_) => AppliesTo::NAVIGATION_PROPERTY,
            Self::EnumMember(_) => AppliesTo::MEMBER,
            Self::Operation(operations) => match operations.first() {
                Some(operation) if operation.is_action() => AppliesTo::ACTION,
                Some(_) => AppliesTo::FUNCTION,
                None => AppliesTo::empty(),
            },
            Self::Parameter(_) => AppliesTo::PARAMETER,
            Self::ReturnType(_) => AppliesTo::RETURN_TYPE,
            Self::Container(_) => AppliesTo::ENTITY_CONTAINER,
            Self::NavigationSource(source) => match source.kind() {
                NavigationSourceKind::EntitySet => AppliesTo::ENTITY_SET,
                NavigationSourceKind::Singleton => AppliesTo::SINGLETON,
            },
            Self::OperationImport(imports) => match imports.first().map(|import| import.kind()) {
                Some(OperationKind::Action) => AppliesTo::ACTION_IMPORT,
                Some(OperationKind::Function) => AppliesTo::FUNCTION_IMPORT,
                None => AppliesTo::empty(),
            },
            Self::Term(_) => AppliesTo::TERM,
        }
    }
}

impl fmt::Debug for AnnotationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema(namespace) => write!(f, "Schema({namespace})"),
            Self::Type(ty) => write!(f, "Type({ty})"),
            Self::Property(property) => write!(f, "Property({})", property.name()),
            Self::NavigationProperty(property) => {
                write!(f, "NavigationProperty({})", property.name())
            }
            Self::EnumMember(member) => write!(f, "EnumMember({})", member.name()),
            Self::Operation(operations) => write!(f, "Operation({} overloads)", operations.len()),
            Self::Parameter(parameters) => write!(f, "Parameter({} overloads)", parameters.len()),
            Self::ReturnType(operations) => write!(f, "ReturnType({} overloads)", operations.len()),
            Self::Container(container) => write!(f, "Container({})", container.full_name()),
            Self::NavigationSource(source) => write!(f, "NavigationSource({})", source.name()),
            Self::OperationImport(imports) => write!(f, "OperationImport({} imports)", imports.len()),
            Self::Term(term) => write!(f, "Term({})", term.full_name()),
            Self::Unresolved(bad) => write!(f, "Unresolved({})", bad.name),
        }
    }
}

fn unresolved_target(path: &str, location: &Location, reason: &str) -> AnnotationTarget {
    log::debug!("annotation target '{path}' {reason} ({location})");
    AnnotationTarget::Unresolved(BadElement::new(
        BadElementKind::Target,
        path,
        EdmError::new(
            EdmErrorCode::BadUnresolvedTarget,
            location.clone(),
            format!("The annotation target '{path}' {reason}"),
        ),
    ))
}

/// Resolve an annotation target path against `model`.
///
/// The head of the path is tried as a namespace, an operation, a type, a container and a
/// term, in that order.
pub(crate) fn resolve_target(model: &EdmModel, path: &str, location: &Location) -> AnnotationTarget {
    let Ok(target) = parse_target_path(path) else {
        return unresolved_target(path, location, "is not a valid target path");
    };

    if target.parameters.is_none() && target.tail.is_empty() {
        if let Some(namespace) = model.resolve_namespace(&target.head) {
            return AnnotationTarget::Schema(namespace);
        }
    }

    let operations = model.find_operations(&target.head);
    if !operations.is_empty() {
        return resolve_operation_target(model, operations, &target, path, location);
    }
    if target.parameters.is_some() {
        return unresolved_target(path, location, "has a signature but names no operation");
    }

    if let Some(ty) = model.find_type(&target.head) {
        if let EdmType::Unresolved(bad) = &ty {
            return AnnotationTarget::Unresolved(bad.clone());
        }
        if matches!(ty, EdmType::Entity(_) | EdmType::Complex(_) | EdmType::Enum(_) | EdmType::TypeDefinition(_)) {
            return resolve_type_target(model, ty, &target.tail, path, location);
        }
    }

    if let Some(container) = model.find_entity_container(&target.head) {
        return match target.tail.as_slice() {
            [] => AnnotationTarget::Container(container),
            [child] => {
                if let Some(source) = container.find_navigation_source(child) {
                    return AnnotationTarget::NavigationSource(source);
                }
                let imports = container.find_operation_imports(child);
                if imports.is_empty() {
                    unresolved_target(path, location, "names no child of the container")
                } else {
                    AnnotationTarget::OperationImport(imports)
                }
            }
            _ => unresolved_target(path, location, "has too many segments for a container"),
        };
    }

    if let Some(term) = model.find_term(&target.head) {
        if target.tail.is_empty() {
            return AnnotationTarget::Term(term);
        }
    }

    unresolved_target(path, location, "cannot be found")
}

fn resolve_operation_target(
    model: &EdmModel,
    operations: Vec<EdmOperationRc>,
    target: &TargetPath,
    path: &str,
    location: &Location,
) -> AnnotationTarget {
    let selected: Vec<EdmOperationRc> = match &target.parameters {
        None => operations,
        Some(signature) => {
            let expected: Vec<EdmType> = signature
                .iter()
                .map(|name| model.resolve_type_name(name, location))
                .collect();
            operations
                .into_iter()
                .filter(|operation| {
                    operation.parameters().len() == expected.len()
                        && operation
                            .parameters()
                            .iter()
                            .zip(&expected)
                            .all(|(parameter, ty)| parameter.type_ref().definition.is_equivalent_to(ty))
                })
                .collect()
        }
    };
    if selected.is_empty() {
        return unresolved_target(path, location, "matches no overload of the operation");
    }

    match target.tail.as_slice() {
        [] => AnnotationTarget::Operation(selected),
        [segment] if segment == RETURN_TYPE_SEGMENT => {
            let returning: Vec<EdmOperationRc> = selected
                .into_iter()
                .filter(|operation| operation.return_type().is_some())
                .collect();
            if returning.is_empty() {
                unresolved_target(path, location, "names the return type of an operation without one")
            } else {
                AnnotationTarget::ReturnType(returning)
            }
        }
        [name] => {
            let parameters: Vec<EdmParameterRc> = selected
                .iter()
                .filter_map(|operation| operation.find_parameter(name))
                .collect();
            if parameters.is_empty() {
                unresolved_target(path, location, "names no parameter of the operation")
            } else {
                AnnotationTarget::Parameter(parameters)
            }
        }
        _ => unresolved_target(path, location, "has too many segments for an operation"),
    }
}

fn resolve_type_target(
    model: &EdmModel,
    ty: EdmType,
    tail: &[String],
    path: &str,
    location: &Location,
) -> AnnotationTarget {
    if tail.is_empty() {
        return AnnotationTarget::Type(ty);
    }

    if let Some(enum_type) = ty.as_enum() {
        return match tail {
            [member] => enum_type.find_member(member).map_or_else(
                || unresolved_target(path, location, "names no member of the enum type"),
                AnnotationTarget::EnumMember,
            ),
            _ => unresolved_target(path, location, "has too many segments for an enum member"),
        };
    }

    let Some(structured) = ty.as_structured() else {
        return unresolved_target(path, location, "descends into a type without properties");
    };
    if let [name] = tail {
        if let Some(navigation) = structured.find_navigation_property(name) {
            return AnnotationTarget::NavigationProperty(navigation);
        }
    }

    match resolve_property_path(&ty, &tail.join("/"), model.config().max_path_segments) {
        Ok(property) => AnnotationTarget::Property(property),
        Err(reason) => unresolved_target(path, location, &reason),
    }
}

/// A term applied to a target element, with an optional value.
pub struct EdmVocabularyAnnotation {
    link: ModelLink,
    term_name: String,
    target_path: String,
    qualifier: Option<String>,
    value: Option<EdmExpressionRc>,
    location: Location,
    term: Cache<Resolution<ElementRef<EdmTerm>>>,
    target: Cache<AnnotationTarget>,
}

impl EdmVocabularyAnnotation {
    pub(crate) fn new(
        block: &CsdlAnnotations,
        csdl: &CsdlAnnotation,
        context: &mut ExpressionContext<'_>,
    ) -> EdmVocabularyAnnotationRc {
        let value = csdl.expression.as_ref().map(|expression| context.build(expression));
        Arc::new(EdmVocabularyAnnotation {
            link: context.link().clone(),
            term_name: csdl.term.clone(),
            target_path: block.target.clone(),
            qualifier: csdl.qualifier.clone().or_else(|| block.qualifier.clone()),
            value,
            location: csdl.location.clone(),
            term: Cache::new(),
            target: Cache::new(),
        })
    }

    /// The term name as written
    #[must_use]
    pub fn term_name(&self) -> &str {
        &self.term_name
    }

    /// The target path as written
    #[must_use]
    pub fn target_path(&self) -> &str {
        &self.target_path
    }

    /// The annotation's qualifier, or else the qualifier of its block
    #[must_use]
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// The value; `None` applies the term's default
    #[must_use]
    pub fn value(&self) -> Option<&EdmExpressionRc> {
        self.value.as_ref()
    }

    /// Where the annotation is declared
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// The applied term.
    ///
    /// An unknown name yields [`EdmErrorCode::BadUnresolvedTerm`]; a name declared in more
    /// than one model yields [`EdmErrorCode::BadAmbiguousElementBinding`].
    pub fn term(&self) -> Resolution<EdmTermRc> {
        let resolved = self.term.get_or_compute(
            || self.compute_term(),
            || Err(self.bad_term(EdmErrorCode::BadUnresolvedTerm, "is cyclic")),
        );
        match resolved {
            Ok(term) => term.upgrade().ok_or_else(|| {
                ModelLink::detached(
                    BadElementKind::Term,
                    &self.term_name,
                    EdmErrorCode::BadUnresolvedTerm,
                    &self.location,
                )
            }),
            Err(bad) => Err(bad.clone()),
        }
    }

    fn compute_term(&self) -> Resolution<ElementRef<EdmTerm>> {
        let found = self
            .link
            .get()
            .map(|model| model.find_terms(&self.term_name))
            .unwrap_or_default();
        match found.as_slice() {
            [] => Err(self.bad_term(EdmErrorCode::BadUnresolvedTerm, "cannot be found")),
            [term] => Ok(ElementRef::new(term)),
            _ => Err(self.bad_term(
                EdmErrorCode::BadAmbiguousElementBinding,
                "is declared more than once",
            )),
        }
    }

    fn bad_term(&self, code: EdmErrorCode, reason: &str) -> BadElementRc {
        BadElement::new(
            BadElementKind::Term,
            self.term_name.as_str(),
            EdmError::new(
                code,
                self.location.clone(),
                format!("The term '{}' {reason}", self.term_name),
            ),
        )
    }

    /// The annotated element.
    pub fn target(&self) -> &AnnotationTarget {
        self.target.get_or_compute(
            || match self.link.get() {
                Some(model) => resolve_target(&model, &self.target_path, &self.location),
                None => AnnotationTarget::Unresolved(ModelLink::detached(
                    BadElementKind::Target,
                    &self.target_path,
                    EdmErrorCode::BadUnresolvedTarget,
                    &self.location,
                )),
            },
            || unresolved_target(&self.target_path, &self.location, "is cyclic"),
        )
    }
}

impl EdmCheckable for EdmVocabularyAnnotation {
    fn errors(&self) -> Vec<EdmError> {
        let mut errors = Vec::new();
        let term = self.term();
        if let Err(bad) = &term {
            errors.extend(bad.errors.iter().cloned());
        }
        let target = self.target();
        if let AnnotationTarget::Unresolved(bad) = target {
            errors.extend(bad.errors.iter().cloned());
        }

        if let Some(value) = &self.value {
            errors.extend(value.errors());
            if let Ok(term) = &term {
                if let Err(mismatches) = try_cast(value, term.type_ref(), false) {
                    errors.extend(mismatches);
                }
            }
        }

        if let Ok(term) = &term {
            let flag = target.applies_to_flag();
            if self.link.config().check_annotation_applicability
                && !term.applies_to().is_empty()
                && !flag.is_empty()
                && !term.applies_to().intersects(flag)
            {
                errors.push(EdmError::new(
                    EdmErrorCode::AnnotationNotApplicable,
                    self.location.clone(),
                    format!(
                        "The term '{}' cannot be applied to '{}'",
                        term.full_name(),
                        self.target_path
                    ),
                ));
            }
        }

        errors
    }
}

impl fmt::Debug for EdmVocabularyAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdmVocabularyAnnotation({} -> {}", self.term_name, self.target_path)?;
        if let Some(qualifier) = &self.qualifier {
            write!(f, "#{qualifier}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        csdl::{CsdlExpression, ModelBuilder, SchemaBuilder},
        test::factories::{model_of, sales_schema, sales_schema_with},
        SemanticConfig,
    };

    fn target_of(model: &EdmModel, path: &str) -> AnnotationTarget {
        resolve_target(model, path, &Location::unknown())
    }

    #[test]
    fn test_target_shapes() {
        let model = model_of(sales_schema());

        assert!(matches!(target_of(&model, "Sales"), AnnotationTarget::Schema(ns) if ns == "Sales"));
        assert!(matches!(target_of(&model, "S"), AnnotationTarget::Schema(ns) if ns == "Sales"));
        assert!(matches!(target_of(&model, "S.Customer"), AnnotationTarget::Type(_)));
        assert!(matches!(target_of(&model, "Sales.Customer/Name"), AnnotationTarget::Property(_)));
        assert!(matches!(
            target_of(&model, "Sales.Customer/Address/City"),
            AnnotationTarget::Property(p) if p.name() == "City"
        ));
        assert!(matches!(
            target_of(&model, "Sales.Customer/Orders"),
            AnnotationTarget::NavigationProperty(_)
        ));
        assert!(matches!(target_of(&model, "Sales.Tier/Gold"), AnnotationTarget::EnumMember(_)));
        assert!(matches!(
            target_of(&model, "Sales.Discount"),
            AnnotationTarget::Operation(ops) if ops.len() == 2
        ));
        assert!(matches!(
            target_of(&model, "Sales.Discount(Edm.Int32)"),
            AnnotationTarget::Operation(ops) if ops.len() == 1
        ));
        assert!(matches!(
            target_of(&model, "Sales.Discount(Edm.Int32)/percent"),
            AnnotationTarget::Parameter(params) if params.len() == 1
        ));
        assert!(matches!(
            target_of(&model, "Sales.Discount/$ReturnType"),
            AnnotationTarget::ReturnType(ops) if ops.len() == 2
        ));
        assert!(matches!(
            target_of(&model, "Sales.TopCustomers(Collection(S.Customer),Edm.Int32)"),
            AnnotationTarget::Operation(ops) if ops.len() == 1
        ));
        assert!(matches!(target_of(&model, "Sales.Service"), AnnotationTarget::Container(_)));
        assert!(matches!(
            target_of(&model, "Sales.Service/Boss"),
            AnnotationTarget::NavigationSource(_)
        ));
        assert!(matches!(
            target_of(&model, "Sales.Service/Discounts"),
            AnnotationTarget::OperationImport(_)
        ));
        assert!(matches!(target_of(&model, "Sales.Note"), AnnotationTarget::Term(_)));
    }

    #[test]
    fn test_unresolved_targets() {
        let model = model_of(sales_schema());
        for path in [
            "Sales.Nope",
            "Sales.Customer/Nope",
            "Sales.Customer/Name/Length",
            "Sales.Tier/Platinum",
            "Sales.Discount(Edm.String)",
            "Sales.Discount/nope",
            "Sales.Rename/$ReturnType",
            "Sales.Service/Nope",
            "Sales.Customer(Edm.Int32)",
            "Edm.Int32",
            "not a path",
        ] {
            match target_of(&model, path) {
                AnnotationTarget::Unresolved(bad) => {
                    assert_eq!(bad.errors[0].code, EdmErrorCode::BadUnresolvedTarget, "{path}");
                }
                other => panic!("'{path}' resolved to {other:?}"),
            }
        }
    }

    #[test]
    fn test_same_target_through_alias() {
        let model = model_of(sales_schema_with(|s| {
            s.annotations("S.Customer/Name", |a| a.annotation("Sales.Label", CsdlExpression::string("Name")))
                .annotations("Sales.Customer/Name", |a| {
                    a.qualifier("Short")
                        .annotation("Sales.Label", CsdlExpression::string("N"))
                })
        }));

        let found = model.find_vocabulary_annotations("Sales.Customer/Name");
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].qualifier(), Some("Short"));
        assert!(model.is_valid(), "{:?}", model.errors());
    }

    #[test]
    fn test_annotation_errors() {
        let model = model_of(sales_schema_with(|s| {
            s.annotations("Sales.Customer/Name", |a| {
                a.annotation("Sales.Label", CsdlExpression::int(5))
                    .annotation("Sales.Missing", CsdlExpression::string("x"))
            })
            .annotations("Sales.Ghost", |a| a.annotation("Sales.Label", CsdlExpression::string("x")))
        }));

        let codes: Vec<Vec<EdmErrorCode>> = model
            .vocabulary_annotations()
            .iter()
            .map(|annotation| annotation.errors().into_iter().map(|e| e.code).collect())
            .collect();
        assert_eq!(
            codes,
            [
                vec![EdmErrorCode::ExpressionPrimitiveKindNotValidForAssertedType],
                vec![EdmErrorCode::BadUnresolvedTerm],
                vec![EdmErrorCode::BadUnresolvedTarget],
            ]
        );
    }

    #[test]
    fn test_applicability_only_in_strict_mode() {
        let schema = sales_schema_with(|s| {
            s.annotations("Sales.Customer", |a| a.annotation("Sales.Label", CsdlExpression::string("x")))
        });
        let csdl = ModelBuilder::new().schema(schema).build().unwrap();

        let lenient = EdmModel::new(&csdl).unwrap();
        assert!(lenient.is_valid());

        let strict = EdmModel::with_config(&csdl, SemanticConfig::strict()).unwrap();
        let codes: Vec<_> = strict.errors().into_iter().map(|e| e.code).collect();
        assert_eq!(codes, [EdmErrorCode::AnnotationNotApplicable]);
    }

    #[test]
    fn test_base_term_cycle() {
        let model = model_of(
            SchemaBuilder::new("Voc")
                .term_with("A", CsdlTypeReference::new("Edm.String", true), &[], Some("Voc.B"))
                .term_with("B", CsdlTypeReference::new("Edm.String", true), &[], Some("Voc.A"))
                .term_with("C", CsdlTypeReference::new("Edm.String", true), &[], Some("Voc.B"))
                .build()
                .unwrap(),
        );

        let errors = model.errors();
        assert!(errors.iter().all(|e| e.code == EdmErrorCode::BadUnresolvedTerm));
        assert!(!errors.is_empty());

        let c = model.find_term("Voc.C").unwrap();
        assert_eq!(c.base_term().unwrap().unwrap().name(), "B");
    }
}
