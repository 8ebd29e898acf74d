//! Function overload resolution for `Apply` expressions.
//!
//! Candidates are all functions with the applied name, own declarations first. They are
//! filtered in two stages:
//!
//! 1. Parameter count must equal the argument count and every argument must be assignable to
//!    its parameter type (promotion, inheritance and nullable targets allowed)
//! 2. Only if more than one candidate survives: every argument type must match its parameter
//!    type exactly
//!
//! Exactly one survivor binds; anything else is a bad operation at the `Apply` location.

use crate::{
    edm::{BadElement, BadElementKind, BadElementRc, EdmError, EdmErrorCode, Location},
    semantics::{try_cast, EdmExpressionRc, EdmModel, EdmOperationRc, Resolution},
};

fn bad_operation(name: &str, code: EdmErrorCode, location: &Location, message: String) -> BadElementRc {
    BadElement::new(
        BadElementKind::Operation,
        name,
        EdmError::new(code, location.clone(), message),
    )
}

fn accepts(operation: &EdmOperationRc, arguments: &[EdmExpressionRc], match_exactly: bool) -> bool {
    let parameters = operation.parameters();
    parameters.len() == arguments.len()
        && parameters
            .iter()
            .zip(arguments)
            .all(|(parameter, argument)| try_cast(argument, parameter.type_ref(), match_exactly).is_ok())
}

/// Select the function overload `name` that accepts `arguments`.
///
/// # Errors
/// Returns a bad operation carrying [`EdmErrorCode::BadUnresolvedOperation`] if no function
/// has the name, [`EdmErrorCode::OperationParametersDontMatch`] if none accepts the arguments
/// and [`EdmErrorCode::BadAmbiguousOperation`] if several remain after exact matching.
pub(crate) fn resolve_function(
    model: &EdmModel,
    name: &str,
    arguments: &[EdmExpressionRc],
    location: &Location,
) -> Resolution<EdmOperationRc> {
    let candidates: Vec<EdmOperationRc> = model
        .find_operations(name)
        .into_iter()
        .filter(|operation| operation.is_function())
        .collect();
    if candidates.is_empty() {
        return Err(bad_operation(
            name,
            EdmErrorCode::BadUnresolvedOperation,
            location,
            format!("The function '{name}' could not be found"),
        ));
    }

    let loose: Vec<EdmOperationRc> = candidates
        .into_iter()
        .filter(|operation| accepts(operation, arguments, false))
        .collect();
    if loose.len() == 1 {
        return Ok(loose[0].clone());
    }
    if loose.is_empty() {
        return Err(bad_operation(
            name,
            EdmErrorCode::OperationParametersDontMatch,
            location,
            format!(
                "No overload of '{name}' accepts {} argument(s) of the given types",
                arguments.len()
            ),
        ));
    }

    log::trace!("{} overloads of '{name}' accept the arguments, matching exactly", loose.len());
    let exact: Vec<&EdmOperationRc> = loose
        .iter()
        .filter(|operation| accepts(operation, arguments, true))
        .collect();
    match exact.as_slice() {
        [operation] => Ok((*operation).clone()),
        _ => {
            let signatures: Vec<String> = loose.iter().map(|operation| operation.signature()).collect();
            Err(bad_operation(
                name,
                EdmErrorCode::BadAmbiguousOperation,
                location,
                format!(
                    "The call to '{name}' is ambiguous between {}",
                    signatures.join(", ")
                ),
            ))
        }
    }
}
