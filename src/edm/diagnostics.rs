//! Semantic errors and their collection.
//!
//! Resolution in a CSDL model never aborts. Whenever a name cannot be bound, an overload is
//! ambiguous or an expression does not fit its asserted type, an [`EdmError`] is attached to a
//! placeholder element and traversal continues. This module defines those errors and the
//! [`Diagnostics`] container used to accumulate them.
//!
//! # Key Components
//!
//! - [`EdmError`] - A single error with code, location and message
//! - [`EdmErrorCode`] - Machine-readable error code
//! - [`ErrorCategory`] - Coarse classification of error codes for filtering
//! - [`Diagnostics`] - Thread-safe container for collected errors
//!
//! # Usage Examples
//!
//! ```rust
//! use edmscope::edm::{Diagnostics, EdmError, EdmErrorCode, ErrorCategory, Location};
//!
//! let diagnostics = Diagnostics::new();
//! diagnostics.push(EdmError::new(
//!     EdmErrorCode::BadUnresolvedType,
//!     Location::unknown(),
//!     "The type 'Sales.Missing' could not be found.",
//! ));
//!
//! assert_eq!(diagnostics.count(), 1);
//! assert_eq!(diagnostics.by_category(ErrorCategory::Type).len(), 1);
//! ```
//!
//! # Thread Safety
//!
//! [`Diagnostics`] uses `boxcar::Vec` internally, which provides lock-free concurrent append
//! operations. Multiple threads can add errors simultaneously without coordination.

use std::fmt::{self, Write};

use strum::{EnumCount, EnumIter};

use crate::edm::Location;

/// Coarse classification of an [`EdmErrorCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Type name resolution and type structure
    Type,
    /// Structural and navigation properties, keys, paths
    Property,
    /// Functions, actions and overload resolution
    Operation,
    /// Entity containers, entity sets, singletons and imports
    Container,
    /// Terms and vocabulary annotations
    Annotation,
    /// Expression type checking
    Expression,
    /// Duplicate definitions and anything not fitting the categories above
    General,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Type => write!(f, "Type"),
            ErrorCategory::Property => write!(f, "Property"),
            ErrorCategory::Operation => write!(f, "Operation"),
            ErrorCategory::Container => write!(f, "Container"),
            ErrorCategory::Annotation => write!(f, "Annotation"),
            ErrorCategory::Expression => write!(f, "Expression"),
            ErrorCategory::General => write!(f, "General"),
        }
    }
}

/// Machine-readable code of an [`EdmError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount, strum::Display)]
pub enum EdmErrorCode {
    /// A type name could not be resolved
    BadUnresolvedType,
    /// A name resolved to an element that is not an entity type
    BadUnresolvedEntityType,
    /// A name resolved to an element that is not a complex type
    BadUnresolvedComplexType,
    /// A name resolved to an element that is not a primitive type
    BadUnresolvedPrimitiveType,
    /// A name resolved to an element that is not an enum type
    BadUnresolvedEnumType,
    /// A name matched elements in more than one model or schema
    BadAmbiguousElementBinding,
    /// An entity type is part of its own base type chain
    BadCyclicEntity,
    /// A complex type is part of its own base type chain
    BadCyclicComplex,
    /// A container is part of its own extends chain
    BadCyclicEntityContainer,
    /// A property could not be found
    BadUnresolvedProperty,
    /// A navigation property path could not be resolved
    BadUnresolvedNavigationPropertyPath,
    /// A navigation partner does not point back to its origin
    NavigationPartnerMismatch,
    /// An enum declares a non-integral underlying type
    EnumUnderlyingTypeNotIntegral,
    /// An enum member value does not fit the underlying type
    EnumMemberValueOutOfRange,
    /// A type definition declares a non-primitive underlying type
    TypeDefinitionUnderlyingTypeNotPrimitive,
    /// No operation with the given name exists
    BadUnresolvedOperation,
    /// More than one operation overload fits the arguments
    BadAmbiguousOperation,
    /// Operations with the name exist, but none accepts the arguments
    OperationParametersDontMatch,
    /// A bound operation declares no binding parameter
    InvalidBindingParameter,
    /// A parameter could not be found on an operation
    BadUnresolvedParameter,
    /// An entity container could not be found
    BadUnresolvedEntityContainer,
    /// An entity set or singleton could not be found
    BadUnresolvedEntitySet,
    /// An operation import targets only bound operations
    OperationImportCannotImportBoundOperation,
    /// A function import targets an action or vice versa
    OperationImportKindMismatch,
    /// The entity set of an operation import could not be found
    OperationImportEntitySetNotFound,
    /// A term could not be found
    BadUnresolvedTerm,
    /// An annotation target path could not be resolved
    BadUnresolvedTarget,
    /// An annotation targets an element kind its term does not apply to
    AnnotationNotApplicable,
    /// A labeled element reference names no labeled element
    BadUnresolvedLabeledElement,
    /// A labeled element name is defined more than once
    BadAmbiguousLabeledElement,
    /// An enum member expression names an unknown member
    BadUnresolvedEnumMember,
    /// An element name is defined more than once in its scope
    AlreadyDefined,
    /// A name has invalid syntax
    InvalidName,
    /// A primitive constant kind does not fit the asserted primitive type
    ExpressionPrimitiveKindNotValidForAssertedType,
    /// A primitive constant is asserted to have a non-primitive type
    PrimitiveConstantExpressionNotValidForNonPrimitiveType,
    /// An expression's type does not fit the asserted type
    ExpressionNotValidForTheAssertedType,
    /// A nullable expression is asserted to have a non-nullable type
    CannotAssertNullableTypeAsNonNullableType,
    /// A null expression is asserted to have a non-nullable type
    NullCannotBeAssertedToBeANonNullableType,
    /// An integer constant is outside the range of the asserted type
    IntegerConstantValueOutOfRange,
    /// A string constant is longer than the asserted max length
    StringConstantLengthOutOfRange,
    /// A binary constant is longer than the asserted max length
    BinaryConstantLengthOutOfRange,
    /// A collection expression is asserted to have a non-collection type
    CollectionExpressionNotValidForNonCollectionType,
    /// A record expression is asserted to have a non-structured type
    RecordExpressionNotValidForNonStructuredType,
    /// A record expression lacks a non-nullable property of its type
    RecordExpressionMissingRequiredProperty,
    /// A record expression has properties its closed type does not declare
    RecordExpressionHasExtraProperties,
}

impl EdmErrorCode {
    /// The category this code belongs to.
    #[must_use]
    pub fn category(self) -> ErrorCategory {
        use EdmErrorCode::*;

        match self {
            BadUnresolvedType
            | BadUnresolvedEntityType
            | BadUnresolvedComplexType
            | BadUnresolvedPrimitiveType
            | BadUnresolvedEnumType
            | BadCyclicEntity
            | BadCyclicComplex
            | EnumUnderlyingTypeNotIntegral
            | EnumMemberValueOutOfRange
            | TypeDefinitionUnderlyingTypeNotPrimitive => ErrorCategory::Type,
            BadUnresolvedProperty
            | BadUnresolvedNavigationPropertyPath
            | NavigationPartnerMismatch => ErrorCategory::Property,
            BadUnresolvedOperation
            | BadAmbiguousOperation
            | OperationParametersDontMatch
            | InvalidBindingParameter
            | BadUnresolvedParameter => ErrorCategory::Operation,
            BadCyclicEntityContainer
            | BadUnresolvedEntityContainer
            | BadUnresolvedEntitySet
            | OperationImportCannotImportBoundOperation
            | OperationImportKindMismatch
            | OperationImportEntitySetNotFound => ErrorCategory::Container,
            BadUnresolvedTerm | BadUnresolvedTarget | AnnotationNotApplicable => {
                ErrorCategory::Annotation
            }
            BadUnresolvedLabeledElement
            | BadAmbiguousLabeledElement
            | BadUnresolvedEnumMember
            | ExpressionPrimitiveKindNotValidForAssertedType
            | PrimitiveConstantExpressionNotValidForNonPrimitiveType
            | ExpressionNotValidForTheAssertedType
            | CannotAssertNullableTypeAsNonNullableType
            | NullCannotBeAssertedToBeANonNullableType
            | IntegerConstantValueOutOfRange
            | StringConstantLengthOutOfRange
            | BinaryConstantLengthOutOfRange
            | CollectionExpressionNotValidForNonCollectionType
            | RecordExpressionNotValidForNonStructuredType
            | RecordExpressionMissingRequiredProperty
            | RecordExpressionHasExtraProperties => ErrorCategory::Expression,
            BadAmbiguousElementBinding | AlreadyDefined | InvalidName => ErrorCategory::General,
        }
    }
}

/// A semantic error discovered while resolving a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdmError {
    /// Machine-readable error code
    pub code: EdmErrorCode,
    /// Where the offending element or expression is declared
    pub location: Location,
    /// Human-readable description
    pub message: String,
}

impl EdmError {
    /// Creates a new error.
    ///
    /// # Arguments
    ///
    /// * `code` - Machine-readable error code
    /// * `location` - Source location of the offending element
    /// * `message` - Human-readable description
    pub fn new(code: EdmErrorCode, location: Location, message: impl Into<String>) -> Self {
        EdmError {
            code,
            location,
            message: message.into(),
        }
    }

    /// The category of this error's code.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }
}

impl fmt::Display for EdmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.location, self.message)
    }
}

impl std::error::Error for EdmError {}

/// Thread-safe container for collecting [`EdmError`]s.
///
/// Uses `boxcar::Vec` internally for lock-free concurrent append operations.
#[derive(Debug)]
pub struct Diagnostics {
    entries: boxcar::Vec<EdmError>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    /// Creates a new empty diagnostics container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: boxcar::Vec::new(),
        }
    }

    /// Adds an error built from its parts.
    pub fn error(&self, code: EdmErrorCode, location: Location, message: impl Into<String>) {
        self.push(EdmError::new(code, location, message));
    }

    /// Adds an error entry directly.
    pub fn push(&self, error: EdmError) {
        self.entries.push(error);
    }

    /// Adds every error of an iterator.
    pub fn extend(&self, errors: impl IntoIterator<Item = EdmError>) {
        for error in errors {
            self.entries.push(error);
        }
    }

    /// Returns true if any errors have been collected.
    pub fn has_any(&self) -> bool {
        self.entries.count() > 0
    }

    /// Returns the total number of errors.
    pub fn count(&self) -> usize {
        self.entries.count()
    }

    /// Returns an iterator over all errors in insertion order.
    ///
    /// Note: boxcar's iterator yields `(index, &EdmError)` tuples, the index is dropped here.
    pub fn iter(&self) -> impl Iterator<Item = &EdmError> {
        self.entries.iter().map(|(_, e)| e)
    }

    /// Returns all errors with the given code.
    pub fn by_code(&self, code: EdmErrorCode) -> Vec<&EdmError> {
        self.iter().filter(|e| e.code == code).collect()
    }

    /// Returns all errors in the given category.
    pub fn by_category(&self, category: ErrorCategory) -> Vec<&EdmError> {
        self.iter().filter(|e| e.category() == category).collect()
    }

    /// Returns owned copies of all errors.
    pub fn to_vec(&self) -> Vec<EdmError> {
        self.iter().cloned().collect()
    }

    /// Formats a summary of all errors for display, grouped by category.
    pub fn summary(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "Diagnostics: {} error(s)", self.count());

        for category in [
            ErrorCategory::Type,
            ErrorCategory::Property,
            ErrorCategory::Operation,
            ErrorCategory::Container,
            ErrorCategory::Annotation,
            ErrorCategory::Expression,
            ErrorCategory::General,
        ] {
            let errors = self.by_category(category);
            if errors.is_empty() {
                continue;
            }

            let _ = writeln!(output, "\n{category}:");
            for error in errors {
                let _ = writeln!(output, "  {error}");
            }
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use strum::IntoEnumIterator;

    #[test]
    fn test_error_creation_and_display() {
        let source: Arc<str> = Arc::from("sales.csdl");
        let error = EdmError::new(
            EdmErrorCode::BadAmbiguousOperation,
            Location::new(&source, 4, 2),
            "Function 'Sales.Discount' is ambiguous.",
        );

        assert_eq!(error.category(), ErrorCategory::Operation);
        let display = error.to_string();
        assert!(display.contains("BadAmbiguousOperation"));
        assert!(display.contains("sales.csdl (4, 2)"));
        assert!(display.contains("Sales.Discount"));
    }

    #[test]
    fn test_every_code_has_a_category() {
        assert_eq!(EdmErrorCode::iter().count(), EdmErrorCode::COUNT);
        for code in EdmErrorCode::iter() {
            let _ = code.category();
        }
        assert_eq!(
            EdmErrorCode::BadCyclicEntity.category(),
            ErrorCategory::Type
        );
        assert_eq!(
            EdmErrorCode::AlreadyDefined.category(),
            ErrorCategory::General
        );
    }

    #[test]
    fn test_diagnostics_container() {
        let diagnostics = Diagnostics::new();
        assert!(!diagnostics.has_any());

        diagnostics.error(EdmErrorCode::BadUnresolvedType, Location::unknown(), "a");
        diagnostics.error(EdmErrorCode::BadUnresolvedTerm, Location::unknown(), "b");
        diagnostics.error(EdmErrorCode::BadUnresolvedType, Location::unknown(), "c");

        assert_eq!(diagnostics.count(), 3);
        assert_eq!(diagnostics.by_code(EdmErrorCode::BadUnresolvedType).len(), 2);
        assert_eq!(diagnostics.by_category(ErrorCategory::Annotation).len(), 1);

        let messages: Vec<_> = diagnostics.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["a", "b", "c"]);

        let summary = diagnostics.summary();
        assert!(summary.contains("3 error(s)"));
        assert!(summary.contains("Annotation:"));
    }

    #[test]
    fn test_diagnostics_thread_safety() {
        let diagnostics = Arc::new(Diagnostics::new());
        let mut handles = vec![];

        for i in 0..10 {
            let diag_clone = Arc::clone(&diagnostics);
            handles.push(thread::spawn(move || {
                diag_clone.error(
                    EdmErrorCode::AlreadyDefined,
                    Location::unknown(),
                    format!("Thread {} duplicate", i),
                );
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(diagnostics.count(), 10);
    }
}
