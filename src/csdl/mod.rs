//! The CSDL document model.
//!
//! A CSDL document is kept as a tree of plain records ([`CsdlModel`], [`CsdlSchema`],
//! [`CsdlEntityType`], ...) in which every cross reference is still the string written in the
//! document. The records are assembled with the fluent builders in this module and handed to
//! [`crate::EdmModel::new`], which binds the names lazily.
//!
//! # Examples
//!
//! ```rust
//! use edmscope::csdl::SchemaBuilder;
//!
//! let schema = SchemaBuilder::new("Sales")
//!     .alias("S")
//!     .entity_type("Customer", |t| {
//!         t.key(&["ID"])
//!             .property("ID", "Edm.Int32", false)
//!             .property("Name", "Edm.String", true)
//!     })
//!     .build()?;
//!
//! assert_eq!(schema.entity_types.len(), 1);
//! # Ok::<(), edmscope::Error>(())
//! ```

mod ast;
mod builder;
mod expression;

pub use ast::{
    AppliesTo, CsdlAnnotation, CsdlAnnotations, CsdlComplexType, CsdlEntityContainer,
    CsdlEntitySet, CsdlEntityType, CsdlEnumMember, CsdlEnumType, CsdlInclude, CsdlModel,
    CsdlNavigationProperty, CsdlNavigationPropertyBinding, CsdlOperation, CsdlOperationImport,
    CsdlParameter, CsdlProperty, CsdlPropertyRef, CsdlReferentialConstraint, CsdlSchema,
    CsdlSingleton, CsdlTerm, CsdlTypeDefinition, CsdlTypeReference, OperationKind,
};
pub use builder::{
    AnnotationsBuilder, ContainerBuilder, EntitySetBuilder, EnumTypeBuilder, ModelBuilder,
    NavigationPropertyBuilder, OperationBuilder, SchemaBuilder, StructuredTypeBuilder,
};
pub use expression::{CsdlExpression, CsdlExpressionKind};
