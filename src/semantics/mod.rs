//! Semantic elements and lazy name binding.
//!
//! An [`EdmModel`] turns the string references of a CSDL document into links between semantic
//! elements. Every link is resolved on first access and cached; a name that cannot be bound
//! yields a [`crate::edm::BadElement`] instead of an error, so a partially broken model can
//! still be navigated and every problem is reported once by [`EdmModel::errors`].
//!
//! # Key Components
//!
//! - [`EdmModel`] - Owns all elements and answers name lookups
//! - [`EdmEntityType`], [`EdmComplexType`], [`EdmEnumType`], [`EdmTypeDefinition`] - Schema types
//! - [`EdmOperation`] - Functions and actions, including overloads
//! - [`EdmEntityContainer`] - Entity sets, singletons and operation imports
//! - [`EdmTerm`] and [`EdmVocabularyAnnotation`] - Vocabulary terms and their applications
//! - [`EdmExpression`] - Annotation values, with [`try_cast`] checking them against a type
//!
//! # Examples
//!
//! ```rust
//! use edmscope::{csdl::{ModelBuilder, SchemaBuilder}, EdmModel};
//!
//! let schema = SchemaBuilder::new("Sales")
//!     .entity_type("Customer", |t| t.key(&["ID"]).property("ID", "Edm.Int32", false))
//!     .entity_type("Vip", |t| t.base("Sales.Customer"))
//!     .build()?;
//! let model = EdmModel::new(&ModelBuilder::new().schema(schema).build()?)?;
//!
//! let vip = model.find_type("Sales.Vip").unwrap();
//! assert_eq!(vip.full_name(), "Sales.Vip");
//! assert!(model.is_valid());
//! # Ok::<(), edmscope::Error>(())
//! ```

mod annotations;
pub(crate) mod cache;
mod config;
mod container;
mod element;
mod expressions;
pub(crate) mod model;
mod operations;
mod overload;
pub(crate) mod paths;
mod properties;
mod typecheck;
mod types;

use crate::edm::BadElementRc;

/// The outcome of binding a name: the element it refers to, or the placeholder standing in
/// for it when binding failed.
pub type Resolution<T> = Result<T, BadElementRc>;

pub use annotations::{
    AnnotationTarget, EdmTerm, EdmTermRc, EdmVocabularyAnnotation, EdmVocabularyAnnotationRc,
};
pub use cache::Cache;
pub use config::SemanticConfig;
pub use container::{
    EdmEntityContainer, EdmEntityContainerRc, EdmNavigationPropertyBinding, EdmNavigationSource,
    EdmNavigationSourceRc, EdmOperationImport, EdmOperationImportRc, NavigationSourceKind,
};
pub use element::ElementRef;
pub(crate) use expressions::ExpressionContext;
pub use expressions::{
    EdmApplyExpression, EdmEnumMemberExpression, EdmExpression, EdmExpressionKind,
    EdmExpressionRc, EdmLabeledElement, EdmLabeledElementRc, EdmLabeledElementReference,
    EdmPropertyConstructor, EdmRecordExpression, EdmTypeAssertion,
};
pub use model::{EdmCheckable, EdmModel};
pub use operations::{EdmOperation, EdmOperationRc, EdmParameter, EdmParameterRc};
pub use paths::{parse_target_path, TargetPath, RETURN_TYPE_SEGMENT};
pub use properties::{
    EdmNavigationProperty, EdmNavigationPropertyRc, EdmReferentialConstraint,
    EdmStructuralProperty, EdmStructuralPropertyRc,
};
pub use typecheck::try_cast;
pub use types::{
    EdmComplexType, EdmComplexTypeRc, EdmEntityType, EdmEntityTypeRc, EdmEnumMember,
    EdmEnumMemberRc, EdmEnumType, EdmEnumTypeRc, EdmKeyProperty, EdmStructured,
    EdmTypeDefinition, EdmTypeDefinitionRc, StructuredType,
};
