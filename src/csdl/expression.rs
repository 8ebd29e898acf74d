//! CSDL annotation expressions.
//!
//! [`CsdlExpression`] is the unresolved expression tree found in annotation values. Names in
//! it (`Apply` function names, `Cast` types, record types, enum members, labels) are plain
//! strings until [`crate::semantics`] binds them.
//!
//! The constructors on [`CsdlExpression`] produce nodes without a source position; use
//! [`CsdlExpression::at`] to attach one.
//!
//! ```rust
//! use edmscope::csdl::CsdlExpression;
//!
//! let discount = CsdlExpression::apply(
//!     "Sales.Discount",
//!     vec![CsdlExpression::int(10), CsdlExpression::string("SUMMER")],
//! );
//! assert_eq!(discount.children().count(), 2);
//! ```

use crate::{
    csdl::CsdlTypeReference,
    edm::Location,
};

/// The node kinds of a CSDL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum CsdlExpressionKind {
    /// `Null`
    Null,
    /// `Bool` constant
    Bool(bool),
    /// `Int` constant
    Int(i64),
    /// `Float` constant
    Float(f64),
    /// `Decimal` constant, kept as literal text
    Decimal(String),
    /// `String` constant
    String(String),
    /// `Binary` constant
    Binary(Vec<u8>),
    /// `Guid` constant
    Guid(String),
    /// `Date` constant
    Date(String),
    /// `DateTimeOffset` constant
    DateTimeOffset(String),
    /// `Duration` constant
    Duration(String),
    /// `TimeOfDay` constant
    TimeOfDay(String),
    /// `Path` expression
    Path(String),
    /// `PropertyPath` expression
    PropertyPath(String),
    /// `NavigationPropertyPath` expression
    NavigationPropertyPath(String),
    /// `AnnotationPath` expression
    AnnotationPath(String),
    /// `Apply` of a function to arguments
    Apply {
        /// Qualified function name
        function: String,
        /// Arguments in order
        arguments: Vec<CsdlExpression>,
    },
    /// `Cast` of an operand to a type
    Cast {
        /// Target type
        type_ref: CsdlTypeReference,
        /// Operand
        operand: Box<CsdlExpression>,
    },
    /// `IsOf` test of an operand against a type
    IsOf {
        /// Tested type
        type_ref: CsdlTypeReference,
        /// Operand
        operand: Box<CsdlExpression>,
    },
    /// `If` conditional
    If {
        /// Boolean test
        test: Box<CsdlExpression>,
        /// Value when the test is true
        if_true: Box<CsdlExpression>,
        /// Value when the test is false
        if_false: Box<CsdlExpression>,
    },
    /// `Collection` of expressions
    Collection(Vec<CsdlExpression>),
    /// `Record` with optional type and property values
    Record {
        /// Qualified structured type name
        type_name: Option<String>,
        /// Property values in declaration order
        properties: Vec<(String, CsdlExpression)>,
    },
    /// `LabeledElement` naming a reusable expression
    LabeledElement {
        /// Label, qualified or simple
        name: String,
        /// The labeled expression
        expression: Box<CsdlExpression>,
    },
    /// `LabeledElementReference` to a labeled element
    LabeledElementReference(String),
    /// `EnumMember` value, one or more `Ns.Enum/Member` paths
    EnumMember(Vec<String>),
}

/// A CSDL expression node with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct CsdlExpression {
    /// Node kind and payload
    pub kind: CsdlExpressionKind,
    /// Where the expression is written
    pub location: Location,
}

impl CsdlExpression {
    /// Wrap a node kind without a source position.
    #[must_use]
    pub fn new(kind: CsdlExpressionKind) -> Self {
        CsdlExpression {
            kind,
            location: Location::unknown(),
        }
    }

    /// Attach a source position.
    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// `Null`
    #[must_use]
    pub fn null() -> Self {
        Self::new(CsdlExpressionKind::Null)
    }

    /// `Bool` constant
    #[must_use]
    pub fn bool(value: bool) -> Self {
        Self::new(CsdlExpressionKind::Bool(value))
    }

    /// `Int` constant
    #[must_use]
    pub fn int(value: i64) -> Self {
        Self::new(CsdlExpressionKind::Int(value))
    }

    /// `Float` constant
    #[must_use]
    pub fn float(value: f64) -> Self {
        Self::new(CsdlExpressionKind::Float(value))
    }

    /// `Decimal` constant
    pub fn decimal(value: impl Into<String>) -> Self {
        Self::new(CsdlExpressionKind::Decimal(value.into()))
    }

    /// `String` constant
    pub fn string(value: impl Into<String>) -> Self {
        Self::new(CsdlExpressionKind::String(value.into()))
    }

    /// `Binary` constant
    pub fn binary(value: impl Into<Vec<u8>>) -> Self {
        Self::new(CsdlExpressionKind::Binary(value.into()))
    }

    /// `Guid` constant
    pub fn guid(value: impl Into<String>) -> Self {
        Self::new(CsdlExpressionKind::Guid(value.into()))
    }

    /// `Date` constant
    pub fn date(value: impl Into<String>) -> Self {
        Self::new(CsdlExpressionKind::Date(value.into()))
    }

    /// `Path` expression
    pub fn path(value: impl Into<String>) -> Self {
        Self::new(CsdlExpressionKind::Path(value.into()))
    }

    /// `Apply` expression
    pub fn apply(function: impl Into<String>, arguments: Vec<CsdlExpression>) -> Self {
        Self::new(CsdlExpressionKind::Apply {
            function: function.into(),
            arguments,
        })
    }

    /// `Cast` expression
    #[must_use]
    pub fn cast(type_ref: CsdlTypeReference, operand: CsdlExpression) -> Self {
        Self::new(CsdlExpressionKind::Cast {
            type_ref,
            operand: Box::new(operand),
        })
    }

    /// `IsOf` expression
    #[must_use]
    pub fn is_of(type_ref: CsdlTypeReference, operand: CsdlExpression) -> Self {
        Self::new(CsdlExpressionKind::IsOf {
            type_ref,
            operand: Box::new(operand),
        })
    }

    /// `If` expression
    #[must_use]
    pub fn if_else(test: CsdlExpression, if_true: CsdlExpression, if_false: CsdlExpression) -> Self {
        Self::new(CsdlExpressionKind::If {
            test: Box::new(test),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        })
    }

    /// `Collection` expression
    #[must_use]
    pub fn collection(items: Vec<CsdlExpression>) -> Self {
        Self::new(CsdlExpressionKind::Collection(items))
    }

    /// `Record` expression
    pub fn record(
        type_name: Option<&str>,
        properties: impl IntoIterator<Item = (&'static str, CsdlExpression)>,
    ) -> Self {
        Self::new(CsdlExpressionKind::Record {
            type_name: type_name.map(str::to_string),
            properties: properties
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        })
    }

    /// `LabeledElement` expression
    pub fn labeled(name: impl Into<String>, expression: CsdlExpression) -> Self {
        Self::new(CsdlExpressionKind::LabeledElement {
            name: name.into(),
            expression: Box::new(expression),
        })
    }

    /// `LabeledElementReference` expression
    pub fn label_ref(name: impl Into<String>) -> Self {
        Self::new(CsdlExpressionKind::LabeledElementReference(name.into()))
    }

    /// `EnumMember` expression
    pub fn enum_member(paths: &[&str]) -> Self {
        Self::new(CsdlExpressionKind::EnumMember(
            paths.iter().map(|p| (*p).to_string()).collect(),
        ))
    }

    /// Iterate over the direct child expressions.
    pub fn children(&self) -> Box<dyn Iterator<Item = &CsdlExpression> + '_> {
        match &self.kind {
            CsdlExpressionKind::Apply { arguments, .. } => Box::new(arguments.iter()),
            CsdlExpressionKind::Cast { operand, .. } | CsdlExpressionKind::IsOf { operand, .. } => {
                Box::new(std::iter::once(operand.as_ref()))
            }
            CsdlExpressionKind::If {
                test,
                if_true,
                if_false,
            } => Box::new([test.as_ref(), if_true.as_ref(), if_false.as_ref()].into_iter()),
            CsdlExpressionKind::Collection(items) => Box::new(items.iter()),
            CsdlExpressionKind::Record { properties, .. } => {
                Box::new(properties.iter().map(|(_, value)| value))
            }
            CsdlExpressionKind::LabeledElement { expression, .. } => {
                Box::new(std::iter::once(expression.as_ref()))
            }
            _ => Box::new(std::iter::empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children() {
        let expr = CsdlExpression::if_else(
            CsdlExpression::bool(true),
            CsdlExpression::int(1),
            CsdlExpression::null(),
        );
        assert_eq!(expr.children().count(), 3);

        let record = CsdlExpression::record(
            Some("Sales.Address"),
            [("City", CsdlExpression::string("Berlin"))],
        );
        assert_eq!(record.children().count(), 1);

        assert_eq!(CsdlExpression::path("Name").children().count(), 0);
    }

    #[test]
    fn test_at_sets_location() {
        let source: std::sync::Arc<str> = std::sync::Arc::from("doc");
        let expr = CsdlExpression::int(3).at(Location::new(&source, 7, 9));
        assert_eq!(expr.location.line, 7);
        assert_eq!(expr.location.column, 9);
        assert!(CsdlExpression::int(3).location.is_unknown());
    }
}
