//! Expression type checking.
//!
//! [`try_cast`] decides whether an annotation expression can be used as a value of a type.
//! It backs two callers: overload resolution (loose, then exact) and the value check of
//! vocabulary annotations (loose).

use std::collections::HashSet;

use crate::{
    edm::{EdmError, EdmErrorCode, EdmFacets, EdmPrimitiveTypeKind, EdmType, EdmTypeReference},
    semantics::{EdmExpression, EdmExpressionKind, EdmRecordExpression},
};

/// Check whether `expression` is a valid value of `target`.
///
/// In loose mode integer constants fit any integral type that holds them, primitives promote
/// along the usual numeric widening and structured values may be of a derived type. In exact
/// mode the static type of the expression must be the target type.
///
/// Paths are always accepted; so are expressions whose own resolution failed, since those
/// failures are reported where the expression is checked for errors.
///
/// # Errors
/// Returns every mismatch found, located at the offending (sub)expression.
pub fn try_cast(
    expression: &EdmExpression,
    target: &EdmTypeReference,
    match_exactly: bool,
) -> Result<(), Vec<EdmError>> {
    let mut checker = TypeChecker {
        match_exactly,
        max_depth: expression.config().max_inheritance_depth,
        visited_labels: HashSet::new(),
        errors: Vec::new(),
    };
    checker.check(expression, target);

    if checker.errors.is_empty() {
        Ok(())
    } else {
        Err(checker.errors)
    }
}

struct TypeChecker {
    match_exactly: bool,
    max_depth: usize,
    visited_labels: HashSet<usize>,
    errors: Vec<EdmError>,
}

/// The primitive view of a target, looking through type definitions.
struct PrimitiveTarget {
    kind: EdmPrimitiveTypeKind,
    facets: EdmFacets,
}

fn primitive_target(target: &EdmTypeReference) -> Option<PrimitiveTarget> {
    match &target.definition {
        EdmType::Primitive(kind) => Some(PrimitiveTarget {
            kind: *kind,
            facets: target.facets,
        }),
        EdmType::TypeDefinition(definition) => {
            let definition = definition.upgrade()?;
            let kind = definition.underlying_kind()?;
            let mut facets = *definition.facets();
            if target.facets.max_length.is_some() {
                facets.max_length = target.facets.max_length;
            }
            Some(PrimitiveTarget { kind, facets })
        }
        _ => None,
    }
}

impl TypeChecker {
    fn fail(&mut self, expression: &EdmExpression, code: EdmErrorCode, message: String) {
        self.errors
            .push(EdmError::new(code, expression.location().clone(), message));
    }

    fn check(&mut self, expression: &EdmExpression, target: &EdmTypeReference) {
        if target.is_bad() || matches!(target.definition, EdmType::Untyped) {
            return;
        }

        match expression.kind() {
            EdmExpressionKind::Null => {
                if !target.nullable {
                    self.fail(
                        expression,
                        EdmErrorCode::NullCannotBeAssertedToBeANonNullableType,
                        format!("Null is not a valid value of the non-nullable type '{target}'"),
                    );
                }
            }
            EdmExpressionKind::Path(_)
            | EdmExpressionKind::PropertyPath(_)
            | EdmExpressionKind::NavigationPropertyPath(_)
            | EdmExpressionKind::AnnotationPath(_) => {}
            EdmExpressionKind::Boolean(_)
            | EdmExpressionKind::Integer(_)
            | EdmExpressionKind::Floating(_)
            | EdmExpressionKind::Decimal(_)
            | EdmExpressionKind::String(_)
            | EdmExpressionKind::Binary(_)
            | EdmExpressionKind::Guid(_)
            | EdmExpressionKind::Date(_)
            | EdmExpressionKind::DateTimeOffset(_)
            | EdmExpressionKind::Duration(_)
            | EdmExpressionKind::TimeOfDay(_) => self.check_constant(expression, target),
            EdmExpressionKind::Apply(apply) => {
                if apply.function().is_err() {
                    return;
                }
                if let Some(actual) = expression.type_ref() {
                    self.check_type(expression, actual, target);
                }
            }
            EdmExpressionKind::Cast(_) | EdmExpressionKind::IsOf(_) => {
                if let Some(actual) = expression.type_ref() {
                    self.check_type(expression, actual, target);
                }
            }
            EdmExpressionKind::If {
                if_true, if_false, ..
            } => {
                self.check(if_true, target);
                self.check(if_false, target);
            }
            EdmExpressionKind::Collection(items) => {
                let Some(element) = target.definition.collection_element() else {
                    self.fail(
                        expression,
                        EdmErrorCode::CollectionExpressionNotValidForNonCollectionType,
                        format!("A collection is not a valid value of the type '{target}'"),
                    );
                    return;
                };
                for item in items {
                    self.check(item, element);
                }
            }
            EdmExpressionKind::Record(record) => self.check_record(expression, record, target),
            EdmExpressionKind::LabeledElement(label) => {
                let key = std::sync::Arc::as_ptr(label) as usize;
                if self.visited_labels.insert(key) {
                    self.check(label.expression(), target);
                }
            }
            EdmExpressionKind::LabeledElementReference(reference) => {
                let Ok(label) = reference.referenced() else {
                    return;
                };
                let key = std::sync::Arc::as_ptr(&label) as usize;
                if self.visited_labels.insert(key) {
                    self.check(label.expression(), target);
                }
            }
            EdmExpressionKind::EnumMember(member) => {
                let Ok(members) = member.members() else {
                    return;
                };
                let matches = match (members.first(), target.definition.as_enum()) {
                    (Some(first), Some(expected)) => first.is_member_of(&expected),
                    _ => false,
                };
                if !matches {
                    self.fail(
                        expression,
                        EdmErrorCode::ExpressionNotValidForTheAssertedType,
                        format!(
                            "The enum member '{}' is not a value of the type '{target}'",
                            member.paths().join(" ")
                        ),
                    );
                }
            }
        }
    }

    fn check_constant(&mut self, expression: &EdmExpression, target: &EdmTypeReference) {
        use EdmPrimitiveTypeKind as P;

        let Some(primitive) = primitive_target(target) else {
            self.fail(
                expression,
                EdmErrorCode::PrimitiveConstantExpressionNotValidForNonPrimitiveType,
                format!("A primitive constant is not a valid value of the type '{target}'"),
            );
            return;
        };
        if primitive.kind == P::PrimitiveType {
            return;
        }

        let exact = self.match_exactly;
        let (accepted, constant_kind) = match expression.kind() {
            EdmExpressionKind::Integer(value) => {
                let accepted = if exact {
                    primitive.kind == P::Int64
                } else {
                    primitive.kind.is_integral()
                };
                if accepted {
                    if let Some((min, max)) = primitive.kind.integral_range() {
                        if *value < min || *value > max {
                            self.fail(
                                expression,
                                EdmErrorCode::IntegerConstantValueOutOfRange,
                                format!("The value {value} is out of range for '{target}'"),
                            );
                            return;
                        }
                    }
                }
                (accepted, P::Int64)
            }
            EdmExpressionKind::Floating(_) => {
                let accepted = if exact {
                    primitive.kind == P::Double
                } else {
                    primitive.kind.is_floating()
                };
                (accepted, P::Double)
            }
            EdmExpressionKind::String(value) => {
                let accepted = primitive.kind == P::String;
                if accepted {
                    if let Some(max) = primitive.facets.bounded_max_length() {
                        let length = value.chars().count();
                        if length > max as usize {
                            self.fail(
                                expression,
                                EdmErrorCode::StringConstantLengthOutOfRange,
                                format!("The string length {length} exceeds the maximum {max} of '{target}'"),
                            );
                            return;
                        }
                    }
                }
                (accepted, P::String)
            }
            EdmExpressionKind::Binary(value) => {
                let accepted = primitive.kind == P::Binary;
                if accepted {
                    if let Some(max) = primitive.facets.bounded_max_length() {
                        if value.len() > max as usize {
                            self.fail(
                                expression,
                                EdmErrorCode::BinaryConstantLengthOutOfRange,
                                format!(
                                    "The binary length {} exceeds the maximum {max} of '{target}'",
                                    value.len()
                                ),
                            );
                            return;
                        }
                    }
                }
                (accepted, P::Binary)
            }
            _ => {
                let kind = expression
                    .type_ref()
                    .and_then(|type_ref| type_ref.definition.primitive_kind());
                match kind {
                    Some(kind) => (kind == primitive.kind, kind),
                    None => return,
                }
            }
        };

        if !accepted {
            self.fail(
                expression,
                EdmErrorCode::ExpressionPrimitiveKindNotValidForAssertedType,
                format!("A constant of kind {constant_kind} is not a valid value of the type '{target}'"),
            );
        }
    }

    fn check_type(
        &mut self,
        expression: &EdmExpression,
        actual: &EdmTypeReference,
        target: &EdmTypeReference,
    ) {
        if actual.is_bad() {
            return;
        }
        if actual.nullable && !target.nullable && !actual.is_collection() {
            self.fail(
                expression,
                EdmErrorCode::CannotAssertNullableTypeAsNonNullableType,
                format!("The nullable type '{actual}' cannot be asserted as '{target}'"),
            );
            return;
        }
        if !self.is_assignable(&actual.definition, &target.definition) {
            self.fail(
                expression,
                EdmErrorCode::ExpressionNotValidForTheAssertedType,
                format!("The type '{actual}' is not compatible with '{target}'"),
            );
        }
    }

    fn is_assignable(&self, actual: &EdmType, target: &EdmType) -> bool {
        if self.match_exactly {
            return actual.is_equivalent_to(target);
        }

        match (actual, target) {
            (EdmType::Collection(actual), EdmType::Collection(target)) => {
                target.is_bad() || self.is_assignable(&actual.definition, &target.definition)
            }
            (EdmType::Collection(_), _) | (_, EdmType::Collection(_)) => false,
            _ => match (actual.primitive_kind(), target.primitive_kind()) {
                (Some(from), Some(to)) => from.promotes_to(to),
                _ => actual.is_or_inherits_from(target, self.max_depth),
            },
        }
    }

    fn check_record(
        &mut self,
        expression: &EdmExpression,
        record: &EdmRecordExpression,
        target: &EdmTypeReference,
    ) {
        if !target.definition.is_structured() {
            self.fail(
                expression,
                EdmErrorCode::RecordExpressionNotValidForNonStructuredType,
                format!("A record is not a valid value of the non-structured type '{target}'"),
            );
            return;
        }

        let mut shape = target.definition.clone();
        if let Some(declared) = record.declared_type() {
            if declared.is_bad() {
                return;
            }
            let compatible = if self.match_exactly {
                declared.definition.is_equivalent_to(&target.definition)
            } else {
                declared
                    .definition
                    .is_or_inherits_from(&target.definition, self.max_depth)
            };
            if !compatible {
                self.fail(
                    expression,
                    EdmErrorCode::ExpressionNotValidForTheAssertedType,
                    format!("The record type '{declared}' is not compatible with '{target}'"),
                );
                return;
            }
            shape = declared.definition.clone();
        }

        let Some(structured) = shape.as_structured() else {
            return;
        };

        for property in structured.properties() {
            let type_ref = property.type_ref();
            if !type_ref.nullable
                && !type_ref.is_collection()
                && record.find_property(property.name()).is_none()
            {
                self.fail(
                    expression,
                    EdmErrorCode::RecordExpressionMissingRequiredProperty,
                    format!(
                        "The record lacks the required property '{}' of '{}'",
                        property.name(),
                        structured.full_name()
                    ),
                );
            }
        }

        for constructor in record.properties() {
            if let Some(property) = structured.find_property(constructor.name()) {
                self.check(constructor.value(), property.type_ref());
            } else if let Some(navigation) = structured.find_navigation_property(constructor.name())
            {
                self.check(constructor.value(), navigation.type_ref());
            } else if !structured.structured().is_open() {
                self.fail(
                    constructor.value(),
                    EdmErrorCode::RecordExpressionHasExtraProperties,
                    format!(
                        "The property '{}' is not declared by the closed type '{}'",
                        constructor.name(),
                        structured.full_name()
                    ),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        csdl::{CsdlExpression, CsdlTypeReference, SchemaBuilder},
        edm::MaxLength,
        test::factories::{model_of, sales_schema_with},
        EdmModel,
    };
    use std::sync::Arc;

    fn codes(result: Result<(), Vec<EdmError>>) -> Vec<EdmErrorCode> {
        result
            .err()
            .unwrap_or_default()
            .into_iter()
            .map(|error| error.code)
            .collect()
    }

    /// One annotation per value, checked against `type_name` (non-nullable).
    fn check_all(
        type_name: &str,
        values: Vec<CsdlExpression>,
        match_exactly: bool,
    ) -> Vec<Vec<EdmErrorCode>> {
        let count = values.len();
        let model = model_of(sales_schema_with(|s| {
            s.type_definition_with_facets(
                "Code",
                "Edm.String",
                EdmFacets {
                    max_length: Some(MaxLength::Bounded(3)),
                    ..EdmFacets::default()
                },
            )
            .type_definition_with_facets(
                "Digest",
                "Edm.Binary",
                EdmFacets {
                    max_length: Some(MaxLength::Bounded(2)),
                    ..EdmFacets::default()
                },
            )
            .annotations("Sales.Customer", |mut a| {
                for value in values {
                    a = a.annotation("Sales.Note", value);
                }
                a
            })
        }));
        let target = model.resolve_type_reference(
            &CsdlTypeReference::new(type_name, false),
            &crate::edm::Location::unknown(),
        );
        (0..count)
            .map(|index| {
                let value = model.vocabulary_annotations()[index].value().cloned().unwrap();
                codes(try_cast(&value, &target, match_exactly))
            })
            .collect()
    }

    #[test]
    fn test_integer_constants() {
        let results = check_all(
            "Edm.Byte",
            vec![
                CsdlExpression::int(200),
                CsdlExpression::int(300),
                CsdlExpression::float(1.0),
                CsdlExpression::string("1"),
            ],
            false,
        );
        assert!(results[0].is_empty());
        assert_eq!(results[1], [EdmErrorCode::IntegerConstantValueOutOfRange]);
        assert_eq!(
            results[2],
            [EdmErrorCode::ExpressionPrimitiveKindNotValidForAssertedType]
        );
        assert_eq!(
            results[3],
            [EdmErrorCode::ExpressionPrimitiveKindNotValidForAssertedType]
        );

        let exact = check_all("Edm.Int32", vec![CsdlExpression::int(1)], true);
        assert_eq!(
            exact[0],
            [EdmErrorCode::ExpressionPrimitiveKindNotValidForAssertedType]
        );
    }

    #[test]
    fn test_type_definition_facets() {
        let results = check_all(
            "Sales.Code",
            vec![CsdlExpression::string("abc"), CsdlExpression::string("abcd")],
            false,
        );
        assert!(results[0].is_empty());
        assert_eq!(results[1], [EdmErrorCode::StringConstantLengthOutOfRange]);
    }

    #[test]
    fn test_binary_length() {
        let results = check_all(
            "Sales.Digest",
            vec![
                CsdlExpression::binary(vec![0x01, 0x02]),
                CsdlExpression::binary(vec![0x01, 0x02, 0x03]),
                CsdlExpression::string("ab"),
            ],
            false,
        );
        assert!(results[0].is_empty());
        assert_eq!(results[1], [EdmErrorCode::BinaryConstantLengthOutOfRange]);
        assert_eq!(
            results[2],
            [EdmErrorCode::ExpressionPrimitiveKindNotValidForAssertedType]
        );

        let unbounded = check_all("Edm.Binary", vec![CsdlExpression::binary(vec![0; 64])], true);
        assert!(unbounded[0].is_empty());
    }

    #[test]
    fn test_null_paths_and_untyped() {
        let results = check_all(
            "Edm.String",
            vec![CsdlExpression::null(), CsdlExpression::path("Name")],
            false,
        );
        assert_eq!(
            results[0],
            [EdmErrorCode::NullCannotBeAssertedToBeANonNullableType]
        );
        assert!(results[1].is_empty());

        let untyped = check_all("Edm.Untyped", vec![CsdlExpression::null()], false);
        assert!(untyped[0].is_empty());
    }

    #[test]
    fn test_collections() {
        let results = check_all(
            "Collection(Edm.Int32)",
            vec![
                CsdlExpression::collection(vec![CsdlExpression::int(1), CsdlExpression::int(2)]),
                CsdlExpression::collection(vec![CsdlExpression::string("x")]),
                CsdlExpression::int(1),
            ],
            false,
        );
        assert!(results[0].is_empty());
        assert_eq!(
            results[1],
            [EdmErrorCode::ExpressionPrimitiveKindNotValidForAssertedType]
        );
        assert_eq!(
            results[2],
            [EdmErrorCode::PrimitiveConstantExpressionNotValidForNonPrimitiveType]
        );

        let scalar = check_all("Edm.Int32", vec![CsdlExpression::collection(vec![])], false);
        assert_eq!(
            scalar[0],
            [EdmErrorCode::CollectionExpressionNotValidForNonCollectionType]
        );
    }

    #[test]
    fn test_records() {
        let results = check_all(
            "Sales.Customer",
            vec![
                CsdlExpression::record(None, [("ID", CsdlExpression::int(1))]),
                CsdlExpression::record(None, []),
                CsdlExpression::record(
                    None,
                    [("ID", CsdlExpression::int(1)), ("Shoe", CsdlExpression::int(42))],
                ),
                CsdlExpression::record(Some("Sales.VipCustomer"), [("ID", CsdlExpression::int(1))]),
                CsdlExpression::record(Some("Sales.Order"), [("ID", CsdlExpression::int(1))]),
                CsdlExpression::record(
                    None,
                    [("ID", CsdlExpression::int(1)), ("Name", CsdlExpression::int(7))],
                ),
            ],
            false,
        );
        assert!(results[0].is_empty());
        assert_eq!(results[1], [EdmErrorCode::RecordExpressionMissingRequiredProperty]);
        assert_eq!(results[2], [EdmErrorCode::RecordExpressionHasExtraProperties]);
        assert!(results[3].is_empty());
        assert_eq!(results[4], [EdmErrorCode::ExpressionNotValidForTheAssertedType]);
        assert_eq!(
            results[5],
            [EdmErrorCode::ExpressionPrimitiveKindNotValidForAssertedType]
        );

        let scalar = check_all("Edm.Int32", vec![CsdlExpression::record(None, [])], false);
        assert_eq!(
            scalar[0],
            [EdmErrorCode::RecordExpressionNotValidForNonStructuredType]
        );
    }

    #[test]
    fn test_casts_apply_and_enums() {
        let results = check_all(
            "Edm.Int64",
            vec![
                CsdlExpression::cast(
                    CsdlTypeReference::new("Edm.Int32", false),
                    CsdlExpression::path("ID"),
                ),
                CsdlExpression::cast(
                    CsdlTypeReference::new("Edm.Int32", true),
                    CsdlExpression::path("ID"),
                ),
                CsdlExpression::apply("Sales.Discount", vec![CsdlExpression::int(5)]),
                CsdlExpression::apply("Sales.Missing", vec![]),
                CsdlExpression::enum_member(&["Sales.Tier/Gold"]),
            ],
            false,
        );
        assert!(results[0].is_empty());
        assert_eq!(
            results[1],
            [EdmErrorCode::CannotAssertNullableTypeAsNonNullableType]
        );
        assert_eq!(results[2], [EdmErrorCode::ExpressionNotValidForTheAssertedType]);
        assert!(results[3].is_empty());
        assert_eq!(results[4], [EdmErrorCode::ExpressionNotValidForTheAssertedType]);

        let tiers = check_all("Sales.Tier", vec![CsdlExpression::enum_member(&["Sales.Tier/Gold"])], false);
        assert!(tiers[0].is_empty());

        let exact = check_all(
            "Edm.Int64",
            vec![CsdlExpression::cast(
                CsdlTypeReference::new("Edm.Int32", false),
                CsdlExpression::path("ID"),
            )],
            true,
        );
        assert_eq!(exact[0], [EdmErrorCode::ExpressionNotValidForTheAssertedType]);
    }

    #[test]
    fn test_label_cycles_are_untyped() {
        let model: Arc<EdmModel> = model_of(
            SchemaBuilder::new("Loop")
                .term("Value", "Edm.Int32")
                .annotations("Loop.Value", |a| {
                    a.annotation(
                        "Loop.Value",
                        CsdlExpression::labeled("A", CsdlExpression::label_ref("A")),
                    )
                })
                .build()
                .unwrap(),
        );
        let annotation = &model.vocabulary_annotations()[0];
        let value = annotation.value().unwrap();
        let term = annotation.term().unwrap();
        assert!(try_cast(value, term.type_ref(), false).is_ok());
    }
}
