//! CSDL element records.
//!
//! These are the plain, unresolved records a CSDL document consists of. All cross references
//! are kept as the strings found in the document (`"Sales.Customer"`,
//! `"Collection(Edm.String)"`, `"Orders/Customer"`); binding them is the job of
//! [`crate::semantics`]. The records are usually produced with the builders in
//! [`crate::csdl::builder`].

use bitflags::bitflags;

use crate::{
    csdl::CsdlExpression,
    edm::{EdmFacets, Location},
};

/// A complete CSDL document: one or more schemas plus namespace includes.
#[derive(Debug, Clone, Default)]
pub struct CsdlModel {
    /// OData version of the document (`4.0`, `4.01`)
    pub version: Option<String>,
    /// Schemas declared by this document
    pub schemas: Vec<CsdlSchema>,
    /// Namespaces imported from referenced documents
    pub includes: Vec<CsdlInclude>,
}

/// An `edmx:Include` of a referenced namespace, optionally under an alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsdlInclude {
    /// The included namespace
    pub namespace: String,
    /// The alias the namespace is known by inside this document
    pub alias: Option<String>,
}

/// A CSDL `Schema`.
#[derive(Debug, Clone, Default)]
pub struct CsdlSchema {
    /// Schema namespace
    pub namespace: String,
    /// Optional schema alias
    pub alias: Option<String>,
    /// Entity types
    pub entity_types: Vec<CsdlEntityType>,
    /// Complex types
    pub complex_types: Vec<CsdlComplexType>,
    /// Enum types
    pub enum_types: Vec<CsdlEnumType>,
    /// Type definitions
    pub type_definitions: Vec<CsdlTypeDefinition>,
    /// Functions and actions
    pub operations: Vec<CsdlOperation>,
    /// Terms
    pub terms: Vec<CsdlTerm>,
    /// Entity containers
    pub entity_containers: Vec<CsdlEntityContainer>,
    /// Out-of-line annotation blocks
    pub annotations: Vec<CsdlAnnotations>,
    /// Where the schema is declared
    pub location: Location,
}

/// A type reference as written on a property, parameter, return type or term.
#[derive(Debug, Clone, PartialEq)]
pub struct CsdlTypeReference {
    /// Type name, possibly `Collection(...)`
    pub type_name: String,
    /// Whether null is a valid value
    pub nullable: bool,
    /// Declared facets
    pub facets: EdmFacets,
}

impl CsdlTypeReference {
    /// A reference without facets.
    pub fn new(type_name: impl Into<String>, nullable: bool) -> Self {
        CsdlTypeReference {
            type_name: type_name.into(),
            nullable,
            facets: EdmFacets::default(),
        }
    }
}

/// A structural property.
#[derive(Debug, Clone)]
pub struct CsdlProperty {
    /// Property name
    pub name: String,
    /// Declared type
    pub type_ref: CsdlTypeReference,
    /// Default value literal
    pub default_value: Option<String>,
    /// Where the property is declared
    pub location: Location,
}

/// A referential constraint of a navigation property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsdlReferentialConstraint {
    /// Property path on the declaring (dependent) type
    pub property: String,
    /// Property path on the target (principal) type
    pub referenced_property: String,
}

/// A navigation property.
#[derive(Debug, Clone)]
pub struct CsdlNavigationProperty {
    /// Property name
    pub name: String,
    /// Target type name, `Ns.Entity` or `Collection(Ns.Entity)`
    pub type_name: String,
    /// Whether the single-valued navigation may be null
    pub nullable: bool,
    /// Path to the partner navigation property on the target type
    pub partner: Option<String>,
    /// Whether the target entities are contained in the declaring entity
    pub contains_target: bool,
    /// Referential constraints
    pub referential_constraints: Vec<CsdlReferentialConstraint>,
    /// Where the property is declared
    pub location: Location,
}

/// A `PropertyRef` inside an entity key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsdlPropertyRef {
    /// Path to the key property, may traverse complex properties
    pub path: String,
    /// Alias, required when the path has more than one segment
    pub alias: Option<String>,
}

/// An entity type.
#[derive(Debug, Clone, Default)]
pub struct CsdlEntityType {
    /// Type name
    pub name: String,
    /// Qualified name of the base type
    pub base_type: Option<String>,
    /// Abstract flag
    pub is_abstract: bool,
    /// Open type flag
    pub is_open: bool,
    /// Media entity flag
    pub has_stream: bool,
    /// Declared key; `None` means the key is inherited
    pub key: Option<Vec<CsdlPropertyRef>>,
    /// Structural properties
    pub properties: Vec<CsdlProperty>,
    /// Navigation properties
    pub navigation_properties: Vec<CsdlNavigationProperty>,
    /// Where the type is declared
    pub location: Location,
}

/// A complex type.
#[derive(Debug, Clone, Default)]
pub struct CsdlComplexType {
    /// Type name
    pub name: String,
    /// Qualified name of the base type
    pub base_type: Option<String>,
    /// Abstract flag
    pub is_abstract: bool,
    /// Open type flag
    pub is_open: bool,
    /// Structural properties
    pub properties: Vec<CsdlProperty>,
    /// Navigation properties
    pub navigation_properties: Vec<CsdlNavigationProperty>,
    /// Where the type is declared
    pub location: Location,
}

/// An enum type member.
#[derive(Debug, Clone)]
pub struct CsdlEnumMember {
    /// Member name
    pub name: String,
    /// Explicit value
    pub value: Option<i64>,
    /// Where the member is declared
    pub location: Location,
}

/// An enum type.
#[derive(Debug, Clone, Default)]
pub struct CsdlEnumType {
    /// Type name
    pub name: String,
    /// Underlying integral type, `Edm.Int32` when absent
    pub underlying_type: Option<String>,
    /// Whether members are combinable flags
    pub is_flags: bool,
    /// Members in declaration order
    pub members: Vec<CsdlEnumMember>,
    /// Where the type is declared
    pub location: Location,
}

/// A type definition.
#[derive(Debug, Clone)]
pub struct CsdlTypeDefinition {
    /// Type name
    pub name: String,
    /// Underlying primitive type name
    pub underlying_type: String,
    /// Facets applied to the underlying type
    pub facets: EdmFacets,
    /// Where the type is declared
    pub location: Location,
}

/// Whether an operation is a function or an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Side-effect free, may be composed
    Function,
    /// May have side effects
    Action,
}

/// An operation parameter.
#[derive(Debug, Clone)]
pub struct CsdlParameter {
    /// Parameter name
    pub name: String,
    /// Declared type
    pub type_ref: CsdlTypeReference,
    /// Whether the parameter may be omitted
    pub optional: bool,
    /// Where the parameter is declared
    pub location: Location,
}

/// A function or action.
#[derive(Debug, Clone)]
pub struct CsdlOperation {
    /// Function or action
    pub kind: OperationKind,
    /// Operation name
    pub name: String,
    /// Whether the first parameter is the binding parameter
    pub is_bound: bool,
    /// Whether further path segments may follow (functions only)
    pub is_composable: bool,
    /// Entity set path relative to the binding parameter
    pub entity_set_path: Option<String>,
    /// Parameters in declaration order
    pub parameters: Vec<CsdlParameter>,
    /// Return type, `None` for actions without result
    pub return_type: Option<CsdlTypeReference>,
    /// Where the operation is declared
    pub location: Location,
}

bitflags! {
    /// Element kinds a term can be applied to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AppliesTo: u32 {
        /// Action
        const ACTION = 1;
        /// Action import
        const ACTION_IMPORT = 1 << 1;
        /// Annotation
        const ANNOTATION = 1 << 2;
        /// Complex type
        const COMPLEX_TYPE = 1 << 3;
        /// Entity container
        const ENTITY_CONTAINER = 1 << 4;
        /// Entity set
        const ENTITY_SET = 1 << 5;
        /// Entity type
        const ENTITY_TYPE = 1 << 6;
        /// Enum type
        const ENUM_TYPE = 1 << 7;
        /// Enum member
        const MEMBER = 1 << 8;
        /// Function
        const FUNCTION = 1 << 9;
        /// Function import
        const FUNCTION_IMPORT = 1 << 10;
        /// Navigation property
        const NAVIGATION_PROPERTY = 1 << 11;
        /// Parameter
        const PARAMETER = 1 << 12;
        /// Structural property
        const PROPERTY = 1 << 13;
        /// Return type
        const RETURN_TYPE = 1 << 14;
        /// Schema
        const SCHEMA = 1 << 15;
        /// Singleton
        const SINGLETON = 1 << 16;
        /// Term
        const TERM = 1 << 17;
        /// Type definition
        const TYPE_DEFINITION = 1 << 18;
    }
}

impl AppliesTo {
    /// Parse a CSDL `AppliesTo` keyword (`EntityType`, `Property`, ...).
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let flag = match keyword {
            "Action" => AppliesTo::ACTION,
            "ActionImport" => AppliesTo::ACTION_IMPORT,
            "Annotation" => AppliesTo::ANNOTATION,
            "ComplexType" => AppliesTo::COMPLEX_TYPE,
            "EntityContainer" => AppliesTo::ENTITY_CONTAINER,
            "EntitySet" => AppliesTo::ENTITY_SET,
            "EntityType" => AppliesTo::ENTITY_TYPE,
            "EnumType" => AppliesTo::ENUM_TYPE,
            "Member" => AppliesTo::MEMBER,
            "Function" => AppliesTo::FUNCTION,
            "FunctionImport" => AppliesTo::FUNCTION_IMPORT,
            "NavigationProperty" => AppliesTo::NAVIGATION_PROPERTY,
            "Parameter" => AppliesTo::PARAMETER,
            "Property" => AppliesTo::PROPERTY,
            "ReturnType" => AppliesTo::RETURN_TYPE,
            "Schema" => AppliesTo::SCHEMA,
            "Singleton" => AppliesTo::SINGLETON,
            "Term" => AppliesTo::TERM,
            "TypeDefinition" => AppliesTo::TYPE_DEFINITION,
            _ => return None,
        };
        Some(flag)
    }
}

/// A term declaration.
#[derive(Debug, Clone)]
pub struct CsdlTerm {
    /// Term name
    pub name: String,
    /// Value type
    pub type_ref: CsdlTypeReference,
    /// Qualified name of the base term
    pub base_term: Option<String>,
    /// Element kinds the term applies to; empty means all
    pub applies_to: AppliesTo,
    /// Default value literal
    pub default_value: Option<String>,
    /// Where the term is declared
    pub location: Location,
}

/// A navigation property binding of an entity set or singleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsdlNavigationPropertyBinding {
    /// Path from the source's entity type to a navigation property
    pub path: String,
    /// Target entity set or singleton, `Name` or `Ns.Container/Name`
    pub target: String,
    /// Where the binding is declared
    pub location: Location,
}

/// An entity set.
#[derive(Debug, Clone)]
pub struct CsdlEntitySet {
    /// Set name
    pub name: String,
    /// Qualified entity type name
    pub entity_type: String,
    /// Whether the set is advertised in the service document
    pub include_in_service_document: bool,
    /// Navigation property bindings
    pub navigation_property_bindings: Vec<CsdlNavigationPropertyBinding>,
    /// Where the set is declared
    pub location: Location,
}

/// A singleton.
#[derive(Debug, Clone)]
pub struct CsdlSingleton {
    /// Singleton name
    pub name: String,
    /// Qualified entity type name
    pub type_name: String,
    /// Navigation property bindings
    pub navigation_property_bindings: Vec<CsdlNavigationPropertyBinding>,
    /// Where the singleton is declared
    pub location: Location,
}

/// A function import or action import.
#[derive(Debug, Clone)]
pub struct CsdlOperationImport {
    /// Function import or action import
    pub kind: OperationKind,
    /// Import name
    pub name: String,
    /// Qualified name of the imported operation
    pub operation: String,
    /// Entity set the result belongs to
    pub entity_set: Option<String>,
    /// Whether the import is advertised in the service document (function imports only)
    pub include_in_service_document: bool,
    /// Where the import is declared
    pub location: Location,
}

/// An entity container.
#[derive(Debug, Clone, Default)]
pub struct CsdlEntityContainer {
    /// Container name
    pub name: String,
    /// Qualified name of the extended container
    pub extends: Option<String>,
    /// Entity sets
    pub entity_sets: Vec<CsdlEntitySet>,
    /// Singletons
    pub singletons: Vec<CsdlSingleton>,
    /// Function and action imports
    pub operation_imports: Vec<CsdlOperationImport>,
    /// Where the container is declared
    pub location: Location,
}

/// A single vocabulary annotation.
#[derive(Debug, Clone)]
pub struct CsdlAnnotation {
    /// Qualified term name
    pub term: String,
    /// Qualifier distinguishing multiple applications of the same term
    pub qualifier: Option<String>,
    /// The annotation value; `None` uses the term's default
    pub expression: Option<CsdlExpression>,
    /// Where the annotation is declared
    pub location: Location,
}

/// An out-of-line `Annotations` block.
#[derive(Debug, Clone)]
pub struct CsdlAnnotations {
    /// Target path
    pub target: String,
    /// Qualifier applied to every annotation in the block
    pub qualifier: Option<String>,
    /// The annotations
    pub annotations: Vec<CsdlAnnotation>,
    /// Where the block is declared
    pub location: Location,
}
