use std::{fmt, sync::Arc};

/// Source position of a CSDL element or expression.
///
/// Every AST node carries a `Location` so that errors discovered during lazy resolution can
/// point back to the element that caused them. The source is shared between all locations of
/// one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Location {
    /// Name of the document (file name, URL, schema namespace, ...)
    pub source: Option<Arc<str>>,
    /// 1-based line number, `0` if unknown
    pub line: u32,
    /// 1-based column number, `0` if unknown
    pub column: u32,
}

impl Location {
    /// Create a location inside a named source.
    pub fn new(source: &Arc<str>, line: u32, column: u32) -> Self {
        Location {
            source: Some(Arc::clone(source)),
            line,
            column,
        }
    }

    /// A location for elements that have no source document.
    #[must_use]
    pub fn unknown() -> Self {
        Location::default()
    }

    /// Returns `true` if neither a source nor a position is known.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.source.is_none() && self.line == 0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{source} ({}, {})", self.line, self.column),
            None if self.line > 0 => write!(f, "({}, {})", self.line, self.column),
            None => write!(f, "(unknown)"),
        }
    }
}
