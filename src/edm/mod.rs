//! Core EDM vocabulary shared by the CSDL records and the semantic model.
//!
//! This module holds the building blocks that do not depend on a particular model:
//!
//! - [`EdmPrimitiveTypeKind`] - The built-in primitive types and their promotion rules
//! - [`QualifiedName`] and [`TypeName`] - Name syntax and validation
//! - [`Location`] - Source positions carried by every element
//! - [`EdmError`] and [`Diagnostics`] - Semantic errors and their collection
//! - [`EdmType`] and [`EdmTypeReference`] - Resolved types, including the
//!   [`BadElement`] placeholders produced when resolution fails

mod diagnostics;
mod location;
mod name;
mod primitives;
mod typeref;

pub use diagnostics::{Diagnostics, EdmError, EdmErrorCode, ErrorCategory};
pub use location::Location;
pub use name::{is_namespace, is_simple_identifier, parse_type_name, QualifiedName, TypeName};
pub use primitives::{EdmPrimitiveTypeKind, EDM_NAMESPACE, EDM_UNTYPED};
pub use typeref::{
    BadElement, BadElementKind, BadElementRc, EdmFacets, EdmType, EdmTypeKind, EdmTypeReference,
    MaxLength,
};
