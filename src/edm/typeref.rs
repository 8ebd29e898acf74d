//! Resolved types, type references and bad-element placeholders.
//!
//! [`EdmType`] is the result of binding a type name against a model. It is either a built-in
//! type, a reference to a schema type, a collection, or an [`EdmType::Unresolved`]
//! placeholder carrying the errors that explain why binding failed. Placeholders flow through
//! the semantic graph like any other type so that resolution never aborts; they are collected
//! later through [`crate::EdmModel::errors`].

use std::{fmt, sync::Arc};

use crate::{
    edm::{EdmError, EdmPrimitiveTypeKind, Location, EDM_UNTYPED},
    semantics::{
        EdmComplexType, EdmComplexTypeRc, EdmEntityType, EdmEntityTypeRc, EdmEnumType,
        EdmEnumTypeRc, EdmStructured, EdmTypeDefinition, EdmTypeDefinitionRc, ElementRef,
    },
};

/// The `MaxLength` facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaxLength {
    /// A fixed upper bound
    Bounded(u32),
    /// The service-defined maximum
    Max,
}

/// Facets restricting the values of a type reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EdmFacets {
    /// Maximum length of string or binary values
    pub max_length: Option<MaxLength>,
    /// Precision of decimal and temporal values
    pub precision: Option<u32>,
    /// Scale of decimal values
    pub scale: Option<u32>,
    /// Spatial reference system identifier
    pub srid: Option<u32>,
    /// Whether string values may contain Unicode characters
    pub unicode: Option<bool>,
}

impl EdmFacets {
    /// The bounded max length, if one is declared.
    #[must_use]
    pub fn bounded_max_length(&self) -> Option<u32> {
        match self.max_length {
            Some(MaxLength::Bounded(length)) => Some(length),
            _ => None,
        }
    }
}

/// What kind of element a [`BadElement`] stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadElementKind {
    /// Any type
    Type,
    /// An operation
    Operation,
    /// A parameter
    Parameter,
    /// A structural property
    Property,
    /// A navigation property
    NavigationProperty,
    /// An entity container
    EntityContainer,
    /// An entity set or singleton
    NavigationSource,
    /// A term
    Term,
    /// An annotation target
    Target,
    /// A labeled element
    LabeledElement,
    /// An enum member
    EnumMember,
}

/// Placeholder for an element that could not be resolved.
///
/// Carries the name that was looked up and every error explaining the failure.
#[derive(Debug, Clone, PartialEq)]
pub struct BadElement {
    /// What the element should have been
    pub kind: BadElementKind,
    /// The name or path that failed to resolve
    pub name: String,
    /// Why resolution failed; never empty
    pub errors: Vec<EdmError>,
}

/// Reference to a [`BadElement`]
pub type BadElementRc = Arc<BadElement>;

impl BadElement {
    /// Create a placeholder with a single error.
    pub fn new(kind: BadElementKind, name: impl Into<String>, error: EdmError) -> BadElementRc {
        Arc::new(BadElement {
            kind,
            name: name.into(),
            errors: vec![error],
        })
    }

    /// Create a placeholder with several errors.
    pub fn with_errors(
        kind: BadElementKind,
        name: impl Into<String>,
        errors: Vec<EdmError>,
    ) -> BadElementRc {
        Arc::new(BadElement {
            kind,
            name: name.into(),
            errors,
        })
    }

    /// The location of the first error.
    #[must_use]
    pub fn location(&self) -> Location {
        self.errors
            .first()
            .map(|error| error.location.clone())
            .unwrap_or_default()
    }
}

/// Coarse classification of an [`EdmType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdmTypeKind {
    /// Built-in primitive
    Primitive,
    /// `Edm.Untyped`
    Untyped,
    /// Entity type
    Entity,
    /// Complex type
    Complex,
    /// Enum type
    Enum,
    /// Type definition
    TypeDefinition,
    /// Collection
    Collection,
    /// Unresolved placeholder
    None,
}

/// A resolved type.
///
/// Schema types are held through [`ElementRef`]s; the owning [`crate::EdmModel`] keeps them
/// alive.
#[derive(Clone)]
pub enum EdmType {
    /// A built-in primitive type
    Primitive(EdmPrimitiveTypeKind),
    /// `Edm.Untyped`
    Untyped,
    /// A schema entity type
    Entity(ElementRef<EdmEntityType>),
    /// A schema complex type
    Complex(ElementRef<EdmComplexType>),
    /// A schema enum type
    Enum(ElementRef<EdmEnumType>),
    /// A schema type definition
    TypeDefinition(ElementRef<EdmTypeDefinition>),
    /// A collection of the element type
    Collection(Box<EdmTypeReference>),
    /// A placeholder for a type that could not be resolved
    Unresolved(BadElementRc),
}

impl EdmType {
    /// Wrap an entity type.
    #[must_use]
    pub fn entity(entity: &EdmEntityTypeRc) -> Self {
        EdmType::Entity(ElementRef::new(entity))
    }

    /// Wrap a complex type.
    #[must_use]
    pub fn complex(complex: &EdmComplexTypeRc) -> Self {
        EdmType::Complex(ElementRef::new(complex))
    }

    /// Wrap an enum type.
    #[must_use]
    pub fn enumeration(enum_type: &EdmEnumTypeRc) -> Self {
        EdmType::Enum(ElementRef::new(enum_type))
    }

    /// Wrap a type definition.
    #[must_use]
    pub fn type_definition(definition: &EdmTypeDefinitionRc) -> Self {
        EdmType::TypeDefinition(ElementRef::new(definition))
    }

    /// Classify this type.
    #[must_use]
    pub fn kind(&self) -> EdmTypeKind {
        match self {
            EdmType::Primitive(_) => EdmTypeKind::Primitive,
            EdmType::Untyped => EdmTypeKind::Untyped,
            EdmType::Entity(_) => EdmTypeKind::Entity,
            EdmType::Complex(_) => EdmTypeKind::Complex,
            EdmType::Enum(_) => EdmTypeKind::Enum,
            EdmType::TypeDefinition(_) => EdmTypeKind::TypeDefinition,
            EdmType::Collection(_) => EdmTypeKind::Collection,
            EdmType::Unresolved(_) => EdmTypeKind::None,
        }
    }

    /// The qualified name, `Collection(...)` for collections.
    #[must_use]
    pub fn full_name(&self) -> String {
        let name = match self {
            EdmType::Primitive(kind) => Some(kind.qualified_name()),
            EdmType::Untyped => Some(EDM_UNTYPED.to_string()),
            EdmType::Entity(entity) => entity.upgrade().map(|e| e.full_name()),
            EdmType::Complex(complex) => complex.upgrade().map(|c| c.full_name()),
            EdmType::Enum(enum_type) => enum_type.upgrade().map(|e| e.full_name()),
            EdmType::TypeDefinition(definition) => definition.upgrade().map(|d| d.full_name()),
            EdmType::Collection(element) => {
                Some(format!("Collection({})", element.definition.full_name()))
            }
            EdmType::Unresolved(bad) => Some(bad.name.clone()),
        };
        name.unwrap_or_else(|| String::from("<dropped>"))
    }

    /// Returns `true` if this type, or a collection element type, is unresolved.
    #[must_use]
    pub fn is_bad(&self) -> bool {
        match self {
            EdmType::Unresolved(_) => true,
            EdmType::Collection(element) => element.definition.is_bad(),
            _ => false,
        }
    }

    /// The errors of an unresolved type (or unresolved collection element).
    #[must_use]
    pub fn errors(&self) -> Vec<EdmError> {
        match self {
            EdmType::Unresolved(bad) => bad.errors.clone(),
            EdmType::Collection(element) => element.definition.errors(),
            _ => Vec::new(),
        }
    }

    /// The primitive kind, looking through type definitions.
    #[must_use]
    pub fn primitive_kind(&self) -> Option<EdmPrimitiveTypeKind> {
        match self {
            EdmType::Primitive(kind) => Some(*kind),
            EdmType::TypeDefinition(definition) => definition
                .upgrade()
                .and_then(|definition| definition.underlying_kind()),
            _ => None,
        }
    }

    /// The entity type, if this is one.
    #[must_use]
    pub fn as_entity(&self) -> Option<EdmEntityTypeRc> {
        match self {
            EdmType::Entity(entity) => entity.upgrade(),
            _ => None,
        }
    }

    /// The complex type, if this is one.
    #[must_use]
    pub fn as_complex(&self) -> Option<EdmComplexTypeRc> {
        match self {
            EdmType::Complex(complex) => complex.upgrade(),
            _ => None,
        }
    }

    /// The enum type, if this is one.
    #[must_use]
    pub fn as_enum(&self) -> Option<EdmEnumTypeRc> {
        match self {
            EdmType::Enum(enum_type) => enum_type.upgrade(),
            _ => None,
        }
    }

    /// The type definition, if this is one.
    #[must_use]
    pub fn as_type_definition(&self) -> Option<EdmTypeDefinitionRc> {
        match self {
            EdmType::TypeDefinition(definition) => definition.upgrade(),
            _ => None,
        }
    }

    /// Entity and complex types as their shared structured view.
    #[must_use]
    pub fn as_structured(&self) -> Option<Arc<dyn EdmStructured>> {
        match self {
            EdmType::Entity(entity) => entity
                .upgrade()
                .map(|entity| entity as Arc<dyn EdmStructured>),
            EdmType::Complex(complex) => complex
                .upgrade()
                .map(|complex| complex as Arc<dyn EdmStructured>),
            _ => None,
        }
    }

    /// Returns `true` for entity and complex types.
    #[must_use]
    pub fn is_structured(&self) -> bool {
        matches!(self, EdmType::Entity(_) | EdmType::Complex(_))
    }

    /// The element type reference of a collection.
    #[must_use]
    pub fn collection_element(&self) -> Option<&EdmTypeReference> {
        match self {
            EdmType::Collection(element) => Some(element),
            _ => None,
        }
    }

    /// Check whether both types denote the same type.
    ///
    /// Schema types compare by identity, primitives by kind and collections by element type.
    /// Unresolved types are never equivalent to anything.
    #[must_use]
    pub fn is_equivalent_to(&self, other: &EdmType) -> bool {
        match (self, other) {
            (EdmType::Primitive(a), EdmType::Primitive(b)) => a == b,
            (EdmType::Untyped, EdmType::Untyped) => true,
            (EdmType::Entity(a), EdmType::Entity(b)) => a.ptr_eq(b),
            (EdmType::Complex(a), EdmType::Complex(b)) => a.ptr_eq(b),
            (EdmType::Enum(a), EdmType::Enum(b)) => a.ptr_eq(b),
            (EdmType::TypeDefinition(a), EdmType::TypeDefinition(b)) => a.ptr_eq(b),
            (EdmType::Collection(a), EdmType::Collection(b)) => {
                a.definition.is_equivalent_to(&b.definition)
            }
            _ => false,
        }
    }

    /// Check whether this type equals `other` or derives from it.
    ///
    /// The base-type walk stops at unresolved or cyclic bases and after `max_depth` steps.
    #[must_use]
    pub fn is_or_inherits_from(&self, other: &EdmType, max_depth: usize) -> bool {
        if self.is_equivalent_to(other) {
            return true;
        }

        let mut current = self.as_structured().and_then(|s| s.base_type());
        let mut depth = 0;
        while let Some(base) = current {
            if depth >= max_depth || base.is_bad() {
                return false;
            }
            if base.is_equivalent_to(other) {
                return true;
            }
            current = base.as_structured().and_then(|s| s.base_type());
            depth += 1;
        }

        false
    }
}

impl fmt::Debug for EdmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdmType::Unresolved(bad) => write!(f, "Unresolved({})", bad.name),
            other => write!(f, "{}", other.full_name()),
        }
    }
}

impl fmt::Display for EdmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())
    }
}

/// A type together with nullability and facets.
#[derive(Debug, Clone)]
pub struct EdmTypeReference {
    /// The referenced type
    pub definition: EdmType,
    /// Whether null is a valid value
    pub nullable: bool,
    /// Value restrictions
    pub facets: EdmFacets,
}

impl EdmTypeReference {
    /// A reference without facets.
    #[must_use]
    pub fn new(definition: EdmType, nullable: bool) -> Self {
        EdmTypeReference {
            definition,
            nullable,
            facets: EdmFacets::default(),
        }
    }

    /// A reference to a primitive type.
    #[must_use]
    pub fn primitive(kind: EdmPrimitiveTypeKind, nullable: bool) -> Self {
        Self::new(EdmType::Primitive(kind), nullable)
    }

    /// A non-nullable collection of `element`.
    #[must_use]
    pub fn collection(element: EdmTypeReference) -> Self {
        Self::new(EdmType::Collection(Box::new(element)), false)
    }

    /// A nullable reference to an unresolved placeholder.
    #[must_use]
    pub fn unresolved(bad: BadElementRc) -> Self {
        Self::new(EdmType::Unresolved(bad), true)
    }

    /// Attach facets.
    #[must_use]
    pub fn with_facets(mut self, facets: EdmFacets) -> Self {
        self.facets = facets;
        self
    }

    /// Returns `true` if the referenced type is unresolved.
    #[must_use]
    pub fn is_bad(&self) -> bool {
        self.definition.is_bad()
    }

    /// Returns `true` for collection references.
    #[must_use]
    pub fn is_collection(&self) -> bool {
        matches!(self.definition, EdmType::Collection(_))
    }

    /// The qualified type name.
    #[must_use]
    pub fn full_name(&self) -> String {
        self.definition.full_name()
    }
}

impl fmt::Display for EdmTypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.definition.full_name())?;
        if !self.nullable && !self.is_collection() {
            write!(f, " (not null)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edm::EdmErrorCode;

    #[test]
    fn test_primitive_equivalence() {
        let a = EdmType::Primitive(EdmPrimitiveTypeKind::Int32);
        let b = EdmType::Primitive(EdmPrimitiveTypeKind::Int32);
        let c = EdmType::Primitive(EdmPrimitiveTypeKind::Int64);

        assert!(a.is_equivalent_to(&b));
        assert!(!a.is_equivalent_to(&c));
        assert!(a.is_or_inherits_from(&b, 8));
        assert_eq!(a.full_name(), "Edm.Int32");
    }

    #[test]
    fn test_collection_equivalence() {
        let strings = EdmTypeReference::collection(EdmTypeReference::primitive(
            EdmPrimitiveTypeKind::String,
            true,
        ));
        let other = EdmTypeReference::collection(EdmTypeReference::primitive(
            EdmPrimitiveTypeKind::String,
            false,
        ));

        assert!(strings.is_collection());
        assert!(!strings.nullable);
        assert!(strings.definition.is_equivalent_to(&other.definition));
        assert_eq!(strings.full_name(), "Collection(Edm.String)");
    }

    #[test]
    fn test_unresolved_is_never_equivalent() {
        let bad = BadElement::new(
            BadElementKind::Type,
            "Sales.Missing",
            EdmError::new(
                EdmErrorCode::BadUnresolvedType,
                Location::unknown(),
                "missing",
            ),
        );
        let unresolved = EdmType::Unresolved(Arc::clone(&bad));

        assert!(unresolved.is_bad());
        assert!(!unresolved.is_equivalent_to(&EdmType::Unresolved(bad)));
        assert_eq!(unresolved.kind(), EdmTypeKind::None);
        assert_eq!(unresolved.errors().len(), 1);

        let collection = EdmTypeReference::collection(EdmTypeReference::new(unresolved, true));
        assert!(collection.is_bad());
        assert_eq!(collection.definition.errors().len(), 1);
    }

    #[test]
    fn test_display() {
        let reference = EdmTypeReference::primitive(EdmPrimitiveTypeKind::Guid, false);
        assert_eq!(reference.to_string(), "Edm.Guid (not null)");
        assert_eq!(
            EdmTypeReference::primitive(EdmPrimitiveTypeKind::Guid, true).to_string(),
            "Edm.Guid"
        );
    }
}
