//! Qualified names and type-name syntax.
//!
//! CSDL refers to every schema element through a *qualified name*: a dotted namespace followed
//! by a simple identifier (`Sales.Customer`). Type references additionally allow the
//! `Collection(...)` wrapper. This module provides the parsing and validation helpers for both
//! forms; resolving them against a model is the job of [`crate::semantics`].

use std::fmt;

use crate::{Error, Result};

/// Prefix of the collection type-name syntax.
const COLLECTION_PREFIX: &str = "Collection(";

/// Maximum length of a simple identifier.
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Check whether `value` is a valid CSDL simple identifier.
///
/// A simple identifier starts with a letter or underscore, continues with letters, digits or
/// underscores and is at most 128 characters long.
#[must_use]
pub fn is_simple_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    value.chars().count() <= MAX_IDENTIFIER_LENGTH
        && (first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Check whether `value` is a valid namespace (dot-separated simple identifiers).
#[must_use]
pub fn is_namespace(value: &str) -> bool {
    !value.is_empty() && value.split('.').all(is_simple_identifier)
}

/// A namespace-qualified element name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    /// The namespace (or alias) part
    pub namespace: String,
    /// The simple name part
    pub name: String,
}

impl QualifiedName {
    /// Create a qualified name from its parts without validation.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        QualifiedName {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Parse a qualified name by splitting at the last `.`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidName`] if there is no namespace part or any part is not a
    /// valid identifier.
    pub fn parse(value: &str) -> Result<Self> {
        let Some((namespace, name)) = value.rsplit_once('.') else {
            return Err(Error::InvalidName(value.to_string()));
        };

        if !is_namespace(namespace) || !is_simple_identifier(name) {
            return Err(Error::InvalidName(value.to_string()));
        }

        Ok(QualifiedName::new(namespace, name))
    }

    /// Returns the full dotted form.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// The syntactic form of a type reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeName {
    /// A single named type
    Named(QualifiedName),
    /// `Collection(...)` of a named type
    Collection(QualifiedName),
}

impl TypeName {
    /// The element name, for collections the name inside the wrapper.
    #[must_use]
    pub fn element(&self) -> &QualifiedName {
        match self {
            TypeName::Named(name) | TypeName::Collection(name) => name,
        }
    }

    /// Returns `true` for the `Collection(...)` form.
    #[must_use]
    pub fn is_collection(&self) -> bool {
        matches!(self, TypeName::Collection(_))
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeName::Named(name) => write!(f, "{name}"),
            TypeName::Collection(name) => write!(f, "Collection({name})"),
        }
    }
}

/// Parse a type name, accepting the `Collection(...)` wrapper once.
///
/// # Errors
/// Returns [`Error::InvalidName`] for malformed names, unbalanced wrappers or nested
/// collections.
pub fn parse_type_name(value: &str) -> Result<TypeName> {
    let trimmed = value.trim();

    if let Some(inner) = trimmed.strip_prefix(COLLECTION_PREFIX) {
        let Some(inner) = inner.strip_suffix(')') else {
            return Err(Error::InvalidName(value.to_string()));
        };
        if inner.starts_with(COLLECTION_PREFIX) {
            return Err(Error::InvalidName(value.to_string()));
        }
        return Ok(TypeName::Collection(QualifiedName::parse(inner.trim())?));
    }

    Ok(TypeName::Named(QualifiedName::parse(trimmed)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_identifier() {
        assert!(is_simple_identifier("Customer"));
        assert!(is_simple_identifier("_private1"));
        assert!(is_simple_identifier("Größe"));
        assert!(!is_simple_identifier(""));
        assert!(!is_simple_identifier("1Customer"));
        assert!(!is_simple_identifier("Cust-omer"));
        assert!(!is_simple_identifier(&"a".repeat(129)));
    }

    #[test]
    fn test_namespace() {
        assert!(is_namespace("Sales"));
        assert!(is_namespace("Org.OData.Core.V1"));
        assert!(!is_namespace(""));
        assert!(!is_namespace("Sales..Orders"));
        assert!(!is_namespace(".Sales"));
    }

    #[test]
    fn test_parse_qualified_name() {
        let name = QualifiedName::parse("Org.OData.Core.V1.Description").unwrap();
        assert_eq!(name.namespace, "Org.OData.Core.V1");
        assert_eq!(name.name, "Description");
        assert_eq!(name.to_string(), "Org.OData.Core.V1.Description");

        assert!(matches!(
            QualifiedName::parse("Customer"),
            Err(Error::InvalidName(_))
        ));
        assert!(QualifiedName::parse("Sales.").is_err());
        assert!(QualifiedName::parse(".Customer").is_err());
    }

    #[test]
    fn test_parse_type_name() {
        assert_eq!(
            parse_type_name("Sales.Customer").unwrap(),
            TypeName::Named(QualifiedName::new("Sales", "Customer"))
        );

        let collection = parse_type_name("Collection(Edm.String)").unwrap();
        assert!(collection.is_collection());
        assert_eq!(collection.element().full_name(), "Edm.String");
        assert_eq!(collection.to_string(), "Collection(Edm.String)");
    }

    #[test]
    fn test_parse_type_name_rejects_malformed() {
        assert!(parse_type_name("Collection(Edm.String").is_err());
        assert!(parse_type_name("Collection(Collection(Edm.String))").is_err());
        assert!(parse_type_name("Collection()").is_err());
        assert!(parse_type_name("String").is_err());
    }
}
