//! Property paths, navigation paths and annotation target paths.
//!
//! Paths are `/`-separated segment lists evaluated against a structured type:
//!
//! - property paths (keys, referential constraints) traverse complex properties and end at a
//!   structural property
//! - navigation paths (partners, navigation property bindings) may additionally contain type
//!   casts (`Ns.Derived`) and containment navigation properties, and end at a navigation
//!   property
//!
//! Annotation targets use their own syntax and are split by [`parse_target_path`] before the
//! pieces are resolved by [`crate::semantics::AnnotationTarget`].

use crate::{
    edm::{is_namespace, is_simple_identifier, parse_type_name, EdmType, Location},
    semantics::{model::ModelLink, EdmNavigationPropertyRc, EdmStructuralPropertyRc},
    Error, Result,
};

/// The `$ReturnType` segment of an annotation target.
pub const RETURN_TYPE_SEGMENT: &str = "$ReturnType";

fn split_segments(path: &str, max_segments: usize) -> std::result::Result<Vec<&str>, String> {
    let segments: Vec<&str> = path.split('/').collect();
    if path.is_empty() || segments.iter().any(|segment| segment.is_empty()) {
        return Err(String::from("is not a valid path"));
    }
    if segments.len() > max_segments {
        return Err(format!("has more than {max_segments} segments"));
    }
    Ok(segments)
}

/// Resolve a path of structural properties starting at `start`.
///
/// Every segment but the last must be a complex-typed property.
///
/// # Errors
/// Returns a description of the failing segment, phrased to follow the path in a message.
pub(crate) fn resolve_property_path(
    start: &EdmType,
    path: &str,
    max_segments: usize,
) -> std::result::Result<EdmStructuralPropertyRc, String> {
    let segments = split_segments(path, max_segments)?;
    let mut current = start.clone();

    for (index, segment) in segments.iter().enumerate() {
        let Some(structured) = current.as_structured() else {
            return Err(format!(
                "cannot be resolved: '{}' is not a structured type",
                current.full_name()
            ));
        };
        let Some(property) = structured.find_property(segment) else {
            return Err(format!(
                "cannot be resolved: '{}' has no property '{segment}'",
                structured.full_name()
            ));
        };
        if index + 1 == segments.len() {
            return Ok(property);
        }

        current = property.type_ref().definition.clone();
        if !matches!(current, EdmType::Complex(_)) {
            return Err(format!(
                "cannot be resolved: segment '{segment}' is not a complex property"
            ));
        }
    }

    Err(String::from("is not a valid path"))
}

/// Resolve a navigation path starting at `start`.
///
/// Intermediate segments may be type casts to a derived type, complex properties (single or
/// collection) and containment navigation properties. The last segment must be a navigation
/// property.
///
/// # Errors
/// Returns a description of the failing segment, phrased to follow the path in a message.
pub(crate) fn resolve_navigation_path(
    link: &ModelLink,
    start: &EdmType,
    path: &str,
    max_segments: usize,
) -> std::result::Result<EdmNavigationPropertyRc, String> {
    let segments = split_segments(path, max_segments)?;
    let max_depth = link.config().max_inheritance_depth;
    let mut current = start.clone();

    for (index, segment) in segments.iter().enumerate() {
        let last = index + 1 == segments.len();
        let Some(structured) = current.as_structured() else {
            return Err(format!(
                "cannot be resolved: '{}' is not a structured type",
                current.full_name()
            ));
        };

        if segment.contains('.') {
            if last {
                return Err(format!(
                    "cannot be resolved: it ends with the type cast '{segment}'"
                ));
            }
            let cast = link.resolve_type_name(segment, &Location::unknown());
            if cast.is_bad() || !cast.is_structured() {
                return Err(format!(
                    "cannot be resolved: type cast '{segment}' is not a known structured type"
                ));
            }
            if !cast.is_or_inherits_from(&current, max_depth) {
                return Err(format!(
                    "cannot be resolved: '{segment}' does not derive from '{}'",
                    current.full_name()
                ));
            }
            current = cast;
            continue;
        }

        if let Some(navigation) = structured.find_navigation_property(segment) {
            if last {
                return Ok(navigation);
            }
            if !navigation.contains_target() {
                return Err(format!(
                    "cannot be resolved: '{segment}' is a non-containment navigation property"
                ));
            }
            current = navigation.target_edm_type().ok_or_else(|| {
                format!("cannot be resolved: the target type of '{segment}' is unresolved")
            })?;
            continue;
        }

        if let Some(property) = structured.find_property(segment) {
            if last {
                return Err(format!(
                    "cannot be resolved: '{segment}' is not a navigation property"
                ));
            }
            let definition = &property.type_ref().definition;
            current = match definition {
                EdmType::Complex(_) => definition.clone(),
                EdmType::Collection(element)
                    if matches!(element.definition, EdmType::Complex(_)) =>
                {
                    element.definition.clone()
                }
                _ => {
                    return Err(format!(
                        "cannot be resolved: segment '{segment}' is not a complex property"
                    ))
                }
            };
            continue;
        }

        return Err(format!(
            "cannot be resolved: '{}' has no property '{segment}'",
            structured.full_name()
        ));
    }

    Err(String::from("is not a valid path"))
}

/// The syntactic parts of an annotation target path.
///
/// `Ns.Op(Ns.T1,Edm.String)/param` splits into the head `Ns.Op`, the parameter list
/// `["Ns.T1", "Edm.String"]` and the tail `["param"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPath {
    /// A namespace or qualified name
    pub head: String,
    /// Parameter type names of an overload signature, if one is given
    pub parameters: Option<Vec<String>>,
    /// The segments after the head
    pub tail: Vec<String>,
}

/// Split an annotation target path into its parts.
///
/// # Errors
/// Returns [`Error::InvalidName`] if the path is syntactically invalid.
///
/// # Examples
///
/// ```rust
/// use edmscope::semantics::parse_target_path;
///
/// let target = parse_target_path("Sales.Discount(Edm.Int32,Collection(Edm.String))/$ReturnType")?;
/// assert_eq!(target.head, "Sales.Discount");
/// assert_eq!(target.parameters.unwrap(), ["Edm.Int32", "Collection(Edm.String)"]);
/// assert_eq!(target.tail, ["$ReturnType"]);
/// # Ok::<(), edmscope::Error>(())
/// ```
pub fn parse_target_path(path: &str) -> Result<TargetPath> {
    let invalid = || Error::InvalidName(path.to_string());

    let head_end = path.find(['(', '/']).unwrap_or(path.len());
    let head = &path[..head_end];
    if !is_namespace(head) {
        return Err(invalid());
    }

    let mut rest = &path[head_end..];
    let mut parameters = None;

    if rest.starts_with('(') {
        let mut depth = 0_usize;
        let mut close = None;
        for (index, ch) in rest.char_indices() {
            match ch {
                '(' => depth += 1,
                ')' => {
                    depth = depth.checked_sub(1).ok_or_else(invalid)?;
                    if depth == 0 {
                        close = Some(index);
                        break;
                    }
                }
                _ => {}
            }
        }
        let close = close.ok_or_else(invalid)?;
        parameters = Some(split_parameters(&rest[1..close]).ok_or_else(invalid)?);
        rest = &rest[close + 1..];
    }

    let tail = if rest.is_empty() {
        Vec::new()
    } else {
        let segments = rest.strip_prefix('/').ok_or_else(invalid)?;
        let tail: Vec<String> = segments.split('/').map(str::to_string).collect();
        if !tail.iter().all(|segment| is_target_segment(segment)) {
            return Err(invalid());
        }
        tail
    };

    Ok(TargetPath {
        head: head.to_string(),
        parameters,
        tail,
    })
}

fn split_parameters(list: &str) -> Option<Vec<String>> {
    if list.trim().is_empty() {
        return Some(Vec::new());
    }

    let mut parameters = Vec::new();
    let mut depth = 0_usize;
    let mut start = 0;
    for (index, ch) in list.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => {
                parameters.push(list[start..index].trim().to_string());
                start = index + 1;
            }
            _ => {}
        }
    }
    parameters.push(list[start..].trim().to_string());

    parameters
        .iter()
        .all(|parameter| parse_type_name(parameter).is_ok())
        .then_some(parameters)
}

fn is_target_segment(segment: &str) -> bool {
    segment == RETURN_TYPE_SEGMENT || is_simple_identifier(segment) || is_namespace(segment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        csdl::CsdlExpression,
        edm::EdmErrorCode,
        semantics::AnnotationTarget,
        test::factories::{model_of, model_with_config, sales_schema, sales_schema_with},
        SemanticConfig,
    };

    #[test]
    fn test_parse_target_paths() {
        let simple = parse_target_path("Sales.Customer").unwrap();
        assert_eq!(simple.head, "Sales.Customer");
        assert!(simple.parameters.is_none());
        assert!(simple.tail.is_empty());

        let property = parse_target_path("Sales.Customer/Name").unwrap();
        assert_eq!(property.tail, ["Name"]);

        let no_params = parse_target_path("Sales.Now()").unwrap();
        assert_eq!(no_params.parameters, Some(Vec::new()));

        let parameter = parse_target_path("Sales.F(Sales.Customer, Edm.String)/name").unwrap();
        assert_eq!(
            parameter.parameters.unwrap(),
            ["Sales.Customer", "Edm.String"]
        );
        assert_eq!(parameter.tail, ["name"]);

        assert_eq!(parse_target_path("Sales").unwrap().head, "Sales");
    }

    #[test]
    fn test_parse_target_path_rejects_garbage() {
        for path in [
            "",
            "/Name",
            "Sales.Customer/",
            "Sales.Customer//Name",
            "Sales.F(Edm.Int32",
            "Sales.F(Edm.Int32))",
            "Sales.F(Edm.Int32)x",
            "Sales.F(,)",
            "Sales.F(Collection(Collection(Edm.Int32)))",
            "Sales.Customer/Na me",
            "1Sales.Customer",
        ] {
            assert!(parse_target_path(path).is_err(), "accepted '{path}'");
        }
    }

    #[test]
    fn test_property_paths() {
        let model = model_of(sales_schema());
        let customer = model.find_type("Sales.Customer").unwrap();

        let city = resolve_property_path(&customer, "Address/City", 32).unwrap();
        assert_eq!(city.name(), "City");

        let err = resolve_property_path(&customer, "Name/Length", 32).unwrap_err();
        assert!(err.contains("not a complex property"));
        assert!(resolve_property_path(&customer, "Address/City", 1).is_err());
        assert!(resolve_property_path(&customer, "", 32).is_err());
    }

    #[test]
    fn test_navigation_paths_with_casts() {
        let model = model_of(sales_schema());
        let link = ModelLink::for_test(&model);
        let customer = model.find_type("Sales.Customer").unwrap();

        let orders = resolve_navigation_path(&link, &customer, "Orders", 32).unwrap();
        assert_eq!(orders.name(), "Orders");

        let via_cast =
            resolve_navigation_path(&link, &customer, "Sales.VipCustomer/Manager", 32).unwrap();
        assert_eq!(via_cast.name(), "Manager");

        let unrelated = resolve_navigation_path(&link, &customer, "Sales.Order/Customer", 32);
        assert!(unrelated.unwrap_err().contains("does not derive"));

        let structural = resolve_navigation_path(&link, &customer, "Name", 32);
        assert!(structural.unwrap_err().contains("not a navigation property"));
    }

    #[test]
    fn test_segment_limit() {
        let model = model_of(sales_schema());
        let link = ModelLink::for_test(&model);
        let customer = model.find_type("Sales.Customer").unwrap();

        let err = resolve_property_path(&customer, "Address/City", 1).unwrap_err();
        assert!(err.contains("more than 1 segments"));
        let cast = resolve_navigation_path(&link, &customer, "Sales.VipCustomer/Manager", 1);
        assert!(cast.unwrap_err().contains("more than 1 segments"));
        assert!(resolve_navigation_path(&link, &customer, "Orders", 1).is_ok());

        let schema = || {
            sales_schema_with(|s| {
                s.annotations("Sales.Customer/Address/City", |a| {
                    a.annotation("Sales.Label", CsdlExpression::string("Town"))
                })
            })
        };

        let unlimited = model_of(schema());
        assert!(matches!(
            unlimited.vocabulary_annotations()[0].target(),
            AnnotationTarget::Property(property) if property.name() == "City"
        ));

        let config = SemanticConfig {
            max_path_segments: 1,
            ..SemanticConfig::default()
        };
        let limited = model_with_config(schema(), config);
        let codes: Vec<EdmErrorCode> = limited.errors().into_iter().map(|e| e.code).collect();
        assert_eq!(codes, [EdmErrorCode::BadUnresolvedTarget]);
    }
}
