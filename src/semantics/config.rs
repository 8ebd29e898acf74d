//! Semantic model configuration
//!
//! This module controls how [`crate::EdmModel`] resolves names and which checks it reports.
//! Name binding itself is always lazy; the options below only influence where names are
//! searched, how deep recursive walks may go, and how the model-wide error pass runs.

/// Configuration for name resolution and error reporting of an [`crate::EdmModel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemanticConfig {
    /// Run the per-element pass of [`crate::EdmModel::errors`] on the rayon thread pool.
    /// The reported order is the same either way
    pub parallel: bool,

    /// Search referenced models when a name is not declared by the model itself
    pub resolve_in_references: bool,

    /// Report annotations whose target kind is not listed in the term's `AppliesTo`
    pub check_annotation_applicability: bool,

    /// Maximum number of base types followed by inheritance walks (default: 64)
    pub max_inheritance_depth: usize,

    /// Maximum number of segments in a navigation or property path (default: 32)
    pub max_path_segments: usize,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            resolve_in_references: true,
            check_annotation_applicability: false,
            max_inheritance_depth: 64,
            max_path_segments: 32,
        }
    }
}

impl SemanticConfig {
    /// Creates a minimal configuration for single-model, single-threaded use
    ///
    /// Referenced models are ignored and the error pass runs on the calling thread.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            parallel: false,
            resolve_in_references: false,
            check_annotation_applicability: false,
            max_inheritance_depth: 64,
            max_path_segments: 32,
        }
    }

    /// Creates a configuration with every optional check enabled
    #[must_use]
    pub fn strict() -> Self {
        Self {
            check_annotation_applicability: true,
            ..Self::default()
        }
    }
}
