//! # edmscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the edmscope library. Import this module to get quick access to the essential
//! types for building and inspecting semantic models.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all edmscope operations
pub use crate::Error;

/// The result type used throughout edmscope
pub use crate::Result;

/// Configuration for name resolution and error reporting
pub use crate::SemanticConfig;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// The semantic model
pub use crate::EdmModel;

/// Builders for CSDL documents
pub use crate::csdl::{ModelBuilder, SchemaBuilder};

/// CSDL records that are commonly constructed by hand
pub use crate::csdl::{CsdlExpression, CsdlModel, CsdlSchema, CsdlTypeReference};

// ================================================================================================
// EDM Vocabulary
// ================================================================================================

/// Semantic errors and their codes
pub use crate::edm::{Diagnostics, EdmError, EdmErrorCode, ErrorCategory, Location};

/// Resolved types
pub use crate::edm::{
    BadElement, BadElementRc, EdmFacets, EdmPrimitiveTypeKind, EdmType, EdmTypeKind,
    EdmTypeReference,
};

/// Name handling
pub use crate::edm::{QualifiedName, TypeName};

// ================================================================================================
// Semantic Elements
// ================================================================================================

/// Schema types
pub use crate::semantics::{
    EdmComplexType, EdmComplexTypeRc, EdmEntityType, EdmEntityTypeRc, EdmEnumType, EdmEnumTypeRc,
    EdmStructured, EdmTypeDefinition, EdmTypeDefinitionRc,
};

/// Properties
pub use crate::semantics::{
    EdmNavigationProperty, EdmNavigationPropertyRc, EdmStructuralProperty,
    EdmStructuralPropertyRc,
};

/// Operations
pub use crate::semantics::{EdmOperation, EdmOperationRc, EdmParameter, EdmParameterRc};

/// Entity containers
pub use crate::semantics::{
    EdmEntityContainer, EdmEntityContainerRc, EdmNavigationSource, EdmNavigationSourceRc,
    EdmOperationImport, EdmOperationImportRc, NavigationSourceKind,
};

/// Vocabulary annotations and their values
pub use crate::semantics::{
    try_cast, AnnotationTarget, EdmExpression, EdmExpressionKind, EdmExpressionRc, EdmTerm,
    EdmTermRc, EdmVocabularyAnnotation, EdmVocabularyAnnotationRc,
};

/// Shared element traits and helpers
pub use crate::semantics::{EdmCheckable, ElementRef, Resolution};
