//! Integration tests for name binding across schemas and referenced models.

use std::sync::Arc;

use edmscope::{prelude::*, Result};

fn build(schema: CsdlSchema, config: SemanticConfig) -> Result<Arc<EdmModel>> {
    EdmModel::with_config(&ModelBuilder::new().schema(schema).build()?, config)
}

fn common_model() -> Result<Arc<EdmModel>> {
    let schema = SchemaBuilder::new("Common")
        .complex_type("Address", |t| {
            t.property("Street", "Edm.String", true)
                .property("City", "Edm.String", true)
        })
        .function("Round", |f| {
            f.parameter("value", "Edm.Decimal", false)
                .returns("Edm.Decimal", false)
        })
        .build()?;
    EdmModel::new(&ModelBuilder::new().schema(schema).build()?)
}

fn sales_referencing_common() -> Result<CsdlModel> {
    let schema = SchemaBuilder::new("Sales")
        .entity_type("Customer", |t| {
            t.key(&["ID"])
                .property("ID", "Edm.Int32", false)
                .property("Address", "C.Address", true)
        })
        .build()?;
    ModelBuilder::new()
        .include("Common", Some("C"))
        .schema(schema)
        .build()
}

#[test]
fn test_types_resolve_in_referenced_models() -> Result<()> {
    let common = common_model()?;
    let csdl = sales_referencing_common()?;
    let model = EdmModel::with_references(&csdl, vec![common], SemanticConfig::default())?;

    let customer = model.find_type("Sales.Customer").unwrap().as_entity().unwrap();
    let address = customer.find_property("Address").unwrap();
    assert_eq!(address.type_ref().full_name(), "Common.Address");
    assert!(address.type_ref().nullable);

    assert_eq!(model.find_operations("C.Round").len(), 1);
    assert!(model.is_valid(), "{:?}", model.errors());
    Ok(())
}

#[test]
fn test_references_ignored_when_disabled() -> Result<()> {
    let common = common_model()?;
    let csdl = sales_referencing_common()?;
    let model = EdmModel::with_references(&csdl, vec![common], SemanticConfig::minimal())?;

    let customer = model.find_type("Sales.Customer").unwrap().as_entity().unwrap();
    assert!(customer.find_property("Address").unwrap().type_ref().is_bad());
    assert!(model
        .errors()
        .iter()
        .any(|error| error.code == EdmErrorCode::BadUnresolvedType));
    Ok(())
}

#[test]
fn test_inheritance_through_aliases() -> Result<()> {
    let schema = SchemaBuilder::new("Sales")
        .alias("S")
        .entity_type("Customer", |t| {
            t.key(&["ID"])
                .property("ID", "Edm.Int32", false)
                .property("Name", "Edm.String", true)
        })
        .entity_type("VipCustomer", |t| t.base("S.Customer").property("Level", "Edm.Byte", false))
        .build()?;
    let model = build(schema, SemanticConfig::default())?;

    let customer = model.find_type("Sales.Customer").unwrap();
    let vip = model.find_type("S.VipCustomer").unwrap();
    assert!(vip.is_or_inherits_from(&customer, 64));
    assert!(!customer.is_or_inherits_from(&vip, 64));

    let vip = vip.as_entity().unwrap();
    assert!(vip.find_property("Name").is_some());
    assert!(vip.find_property("Level").is_some());
    assert_eq!(vip.key().len(), 1);
    assert!(model.is_valid(), "{:?}", model.errors());
    Ok(())
}

#[test]
fn test_broken_model_keeps_working() -> Result<()> {
    let schema = SchemaBuilder::new("Sales")
        .entity_type("A", |t| t.base("Sales.B").key(&["Nope"]))
        .entity_type("B", |t| t.base("Sales.A"))
        .enum_type("Color", |e| e.underlying("Edm.String").member("Red"))
        .type_definition("Weird", "Sales.B")
        .build()?;
    let model = build(schema, SemanticConfig::default())?;

    let a = model.find_type("Sales.A").unwrap().as_entity().unwrap();
    assert!(a.base_type().unwrap().is_bad());
    assert_eq!(a.structured().name(), "A");

    let codes: Vec<EdmErrorCode> = model.errors().into_iter().map(|error| error.code).collect();
    for expected in [
        EdmErrorCode::BadCyclicEntity,
        EdmErrorCode::BadUnresolvedProperty,
        EdmErrorCode::EnumUnderlyingTypeNotIntegral,
        EdmErrorCode::TypeDefinitionUnderlyingTypeNotPrimitive,
    ] {
        assert!(codes.contains(&expected), "missing {expected:?} in {codes:?}");
    }
    assert!(!model.is_valid());
    Ok(())
}

#[test]
fn test_error_pass_is_repeatable() -> Result<()> {
    let schema = SchemaBuilder::new("Sales")
        .entity_type("A", |t| t.base("Sales.Missing"))
        .complex_type("P", |t| t.base("Sales.Q"))
        .complex_type("Q", |t| t.base("Sales.P"))
        .build()?;
    let model = build(schema, SemanticConfig::default())?;

    let first: Vec<EdmErrorCode> = model.errors().into_iter().map(|error| error.code).collect();
    let second: Vec<EdmErrorCode> = model.errors().into_iter().map(|error| error.code).collect();
    assert_eq!(first, second);
    assert!(first.contains(&EdmErrorCode::BadUnresolvedEntityType));
    assert!(first.contains(&EdmErrorCode::BadCyclicComplex));
    Ok(())
}
