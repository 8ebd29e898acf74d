// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![allow(clippy::too_many_arguments)]

//! # edmscope
//!
//! Semantic resolution for OData CSDL schemas. `edmscope` takes the CSDL records of one or
//! more schemas and binds every name in them: base types, property and parameter types,
//! navigation partners, entity set bindings, operation imports, annotation targets and the
//! functions called from annotation values. Binding is lazy and never fails hard; a name
//! that cannot be bound turns into a placeholder element carrying the error, so a broken
//! model can still be walked and all of its problems are reported in one pass.
//!
//! ## Features
//!
//! - **Lazy binding** - Every cross reference is resolved on first access and cached
//! - **Cycle detection** - Cyclic base types, base terms and labeled elements become bad elements
//! - **Overload resolution** - `Apply` expressions pick the function overload their arguments fit
//! - **Expression type checking** - Annotation values are checked against the term type
//! - **Parallel validation** - [`EdmModel::errors`] runs on the rayon thread pool
//!
//! ## Quick Start
//!
//! ```rust
//! use edmscope::prelude::*;
//!
//! let schema = SchemaBuilder::new("Sales")
//!     .alias("S")
//!     .entity_type("Customer", |t| {
//!         t.key(&["ID"])
//!             .property("ID", "Edm.Int32", false)
//!             .property("Name", "Edm.String", true)
//!     })
//!     .term("Label", "Edm.String")
//!     .annotations("S.Customer/Name", |a| {
//!         a.annotation("Sales.Label", CsdlExpression::string("Customer name"))
//!     })
//!     .build()?;
//! let model = EdmModel::new(&ModelBuilder::new().schema(schema).build()?)?;
//!
//! let annotations = model.find_vocabulary_annotations("Sales.Customer/Name");
//! assert_eq!(annotations.len(), 1);
//! assert!(model.errors().is_empty());
//! # Ok::<(), edmscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`csdl`] - The CSDL records and the builders that assemble them
//! - [`edm`] - Names, primitive types, type references and semantic errors
//! - [`semantics`] - The semantic model and its lazily bound elements
//! - [`prelude`] - Convenient re-exports of commonly used types
//! - [`Error`] and [`Result`] - Hard errors for malformed input
//!
//! Semantic problems are not [`Error`]s. They are collected as [`edm::EdmError`]s by
//! [`EdmModel::errors`]:
//!
//! ```rust
//! use edmscope::prelude::*;
//!
//! let schema = SchemaBuilder::new("Sales")
//!     .entity_type("A", |t| t.base("Sales.B"))
//!     .entity_type("B", |t| t.base("Sales.A"))
//!     .build()?;
//! let model = EdmModel::new(&ModelBuilder::new().schema(schema).build()?)?;
//!
//! assert!(model
//!     .errors()
//!     .iter()
//!     .any(|error| error.code == EdmErrorCode::BadCyclicEntity));
//! # Ok::<(), edmscope::Error>(())
//! ```

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use edmscope::prelude::*;
///
/// let schema = SchemaBuilder::new("Sales").build()?;
/// let model = EdmModel::new(&ModelBuilder::new().schema(schema).build()?)?;
/// assert!(model.is_valid());
/// # Ok::<(), edmscope::Error>(())
/// ```
pub mod prelude;

pub mod csdl;
pub mod edm;
pub mod semantics;

/// `edmscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

pub use error::Error;

/// The semantic model; see [`semantics::EdmModel`].
pub use semantics::EdmModel;

/// Options for name resolution and error reporting; see [`semantics::SemanticConfig`].
pub use semantics::SemanticConfig;
