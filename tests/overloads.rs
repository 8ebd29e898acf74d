//! Integration tests for binding `Apply` expressions to function overloads.

use std::sync::Arc;

use edmscope::{prelude::*, Result};

fn geo_schema() -> SchemaBuilder {
    SchemaBuilder::new("Geo")
        .term("Value", "Edm.Untyped")
        .entity_type("Place", |t| t.key(&["ID"]).property("ID", "Edm.Int32", false))
        .entity_type("City", |t| t.base("Geo.Place").property("Mayor", "Edm.String", true))
        .complex_type("Point", |t| {
            t.property("X", "Edm.Double", false)
                .property("Y", "Edm.Double", false)
        })
        .function("Distance", |f| {
            f.parameter("from", "Geo.Place", false)
                .parameter("to", "Geo.Place", false)
                .returns("Edm.Double", false)
        })
        .function("Scale", |f| {
            f.parameter("factor", "Edm.Single", false)
                .returns("Edm.Single", false)
        })
        .function("Scale", |f| {
            f.parameter("factor", "Edm.Double", false)
                .returns("Edm.Double", false)
        })
        .function("Describe", |f| {
            f.parameter("value", "Edm.String", false)
                .returns("Edm.String", false)
        })
        .function("Describe", |f| {
            f.parameter("value", "Edm.Boolean", false)
                .returns("Edm.String", false)
        })
}

fn model_with_values(values: Vec<CsdlExpression>) -> Result<Arc<EdmModel>> {
    let schema = geo_schema()
        .annotations("Geo.Place", |mut a| {
            for value in values {
                a = a.annotation("Geo.Value", value);
            }
            a
        })
        .build()?;
    EdmModel::new(&ModelBuilder::new().schema(schema).build()?)
}

fn bound_signature(model: &EdmModel, index: usize) -> Resolution<String> {
    let value = model.vocabulary_annotations()[index]
        .value()
        .cloned()
        .expect("annotation has a value");
    match value.kind() {
        EdmExpressionKind::Apply(apply) => apply.function().map(|function| function.signature()),
        _ => panic!("expected an apply expression"),
    }
}

#[test]
fn test_overloads_by_argument_kind() -> Result<()> {
    let model = model_with_values(vec![
        CsdlExpression::apply("Geo.Describe", vec![CsdlExpression::string("north")]),
        CsdlExpression::apply("Geo.Describe", vec![CsdlExpression::bool(true)]),
        CsdlExpression::apply("Geo.Scale", vec![CsdlExpression::float(0.5)]),
    ])?;

    assert_eq!(bound_signature(&model, 0).unwrap(), "Geo.Describe(Edm.String)");
    assert_eq!(bound_signature(&model, 1).unwrap(), "Geo.Describe(Edm.Boolean)");
    assert_eq!(bound_signature(&model, 2).unwrap(), "Geo.Scale(Edm.Double)");
    assert!(model.is_valid(), "{:?}", model.errors());
    Ok(())
}

#[test]
fn test_structured_arguments_accept_derived_types() -> Result<()> {
    let city = CsdlExpression::record(Some("Geo.City"), [("ID", CsdlExpression::int(1))]);
    let place = CsdlExpression::record(Some("Geo.Place"), [("ID", CsdlExpression::int(2))]);
    let point = CsdlExpression::record(
        Some("Geo.Point"),
        [("X", CsdlExpression::float(1.0)), ("Y", CsdlExpression::float(2.0))],
    );
    let model = model_with_values(vec![
        CsdlExpression::apply("Geo.Distance", vec![city, place.clone()]),
        CsdlExpression::apply("Geo.Distance", vec![place, point]),
    ])?;

    assert_eq!(
        bound_signature(&model, 0).unwrap(),
        "Geo.Distance(Geo.Place,Geo.Place)"
    );
    let mismatch = bound_signature(&model, 1).unwrap_err();
    assert_eq!(mismatch.errors[0].code, EdmErrorCode::OperationParametersDontMatch);
    Ok(())
}

#[test]
fn test_apply_value_takes_return_type() -> Result<()> {
    let model = model_with_values(vec![CsdlExpression::apply(
        "Geo.Describe",
        vec![CsdlExpression::bool(false)],
    )])?;

    let value = model.vocabulary_annotations()[0].value().cloned().unwrap();
    let return_type = value.type_ref().unwrap();
    assert_eq!(return_type.full_name(), "Edm.String");
    assert!(!return_type.nullable);

    let as_string = EdmTypeReference::primitive(EdmPrimitiveTypeKind::String, false);
    assert!(try_cast(&value, &as_string, true).is_ok());
    let as_int = EdmTypeReference::primitive(EdmPrimitiveTypeKind::Int32, false);
    assert!(try_cast(&value, &as_int, false).is_err());
    Ok(())
}

#[test]
fn test_failed_binding_is_reported_once_per_annotation() -> Result<()> {
    let model = model_with_values(vec![
        CsdlExpression::apply("Geo.Describe", vec![CsdlExpression::int(3)]),
        CsdlExpression::apply("Geo.Unknown", vec![]),
        CsdlExpression::apply("Geo.Scale", vec![CsdlExpression::int(2)]),
    ])?;

    let codes: Vec<EdmErrorCode> = model.errors().into_iter().map(|error| error.code).collect();
    assert_eq!(
        codes,
        [
            EdmErrorCode::OperationParametersDontMatch,
            EdmErrorCode::BadUnresolvedOperation,
            EdmErrorCode::OperationParametersDontMatch,
        ]
    );
    Ok(())
}
