use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all hard errors this library can
/// return.
///
/// Semantic problems inside a schema (unresolvable type names, ambiguous overloads, cyclic
/// base types, ...) are **not** reported through this type. They are attached to placeholder
/// elements as [`crate::edm::EdmError`]s and collected with [`crate::EdmModel::errors`], so a
/// single pass can report every issue in a model. `Error` is reserved for API misuse and input
/// that cannot be turned into a model at all.
///
/// # Error Categories
///
/// ## Input Errors
/// - [`Error::InvalidName`] - A namespace, qualified name or type name has invalid syntax
/// - [`Error::Malformed`] - Builder or model input is structurally invalid
/// - [`Error::Empty`] - An empty input was provided where content is required
///
/// ## Model Construction Errors
/// - [`Error::AliasConflict`] - An alias is bound to more than one namespace
///
/// # Examples
///
/// ```rust
/// use edmscope::{Error, edm::QualifiedName};
///
/// match QualifiedName::parse("NoNamespace") {
///     Ok(name) => println!("parsed {name}"),
///     Err(Error::InvalidName(name)) => eprintln!("invalid name: {name}"),
///     Err(e) => eprintln!("other error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A name does not follow the CSDL naming rules.
    ///
    /// Raised when parsing qualified names (`Namespace.Name`), namespaces, simple identifiers
    /// or type names (`Collection(Namespace.Name)`). The associated value is the offending
    /// input.
    #[error("Invalid name - '{0}'")]
    InvalidName(String),

    /// The input is structurally invalid and could not be processed.
    ///
    /// The error includes the source location where the problem was detected for debugging
    /// purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// An alias is declared for two different namespaces.
    ///
    /// Aliases are model-wide; binding the same alias to different namespaces would make
    /// every name using it ambiguous.
    #[error("Alias '{alias}' is bound to both '{first}' and '{second}'")]
    AliasConflict {
        /// The conflicting alias
        alias: String,
        /// The namespace the alias was bound to first
        first: String,
        /// The namespace of the second binding
        second: String,
    },
}
