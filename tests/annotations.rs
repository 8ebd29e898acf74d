//! Integration tests for vocabulary terms, annotation targets and annotation values.

use std::sync::Arc;

use edmscope::{prelude::*, Result};

fn vocabulary() -> Result<CsdlSchema> {
    SchemaBuilder::new("Org.Vocabulary")
        .alias("Voc")
        .term("Description", "Edm.String")
        .term_with(
            "Computed",
            CsdlTypeReference::new("Edm.Boolean", true),
            &["Property"],
            None,
        )
        .term_with(
            "LongDescription",
            CsdlTypeReference::new("Edm.String", true),
            &[],
            Some("Voc.Description"),
        )
        .term("Range", "Voc.Bounds")
        .complex_type("Bounds", |t| {
            t.property("Min", "Edm.Int32", false)
                .property("Max", "Edm.Int32", false)
        })
        .build()
}

fn catalog(
    extend: impl FnOnce(SchemaBuilder) -> SchemaBuilder,
) -> Result<CsdlSchema> {
    let schema = SchemaBuilder::new("Catalog")
        .entity_type("Product", |t| {
            t.key(&["ID"])
                .property("ID", "Edm.Int32", false)
                .property("Price", "Edm.Decimal", true)
                .property("Stock", "Edm.Int32", false)
        })
        .entity_container("Shop", |c| c.entity_set("Products", "Catalog.Product"));
    extend(schema).build()
}

fn model(
    extend: impl FnOnce(SchemaBuilder) -> SchemaBuilder,
    config: SemanticConfig,
) -> Result<Arc<EdmModel>> {
    let csdl = ModelBuilder::new()
        .schema(vocabulary()?)
        .schema(catalog(extend)?)
        .build()?;
    EdmModel::with_config(&csdl, config)
}

#[test]
fn test_terms_from_another_schema() -> Result<()> {
    let model = model(
        |s| {
            s.annotations("Catalog.Product", |a| {
                a.annotation("Voc.Description", CsdlExpression::string("A product"))
            })
            .annotations("Catalog.Product/Price", |a| {
                a.annotation("Org.Vocabulary.Computed", CsdlExpression::bool(true))
            })
        },
        SemanticConfig::strict(),
    )?;

    let on_product = model.find_vocabulary_annotations("Catalog.Product");
    assert_eq!(on_product.len(), 1);
    let term = on_product[0].term().unwrap();
    assert_eq!(term.full_name(), "Org.Vocabulary.Description");
    assert!(matches!(on_product[0].target(), AnnotationTarget::Type(_)));

    let on_price = model.find_vocabulary_annotations("Catalog.Product/Price");
    assert!(matches!(
        on_price[0].target(),
        AnnotationTarget::Property(property) if property.name() == "Price"
    ));
    assert!(model.is_valid(), "{:?}", model.errors());
    Ok(())
}

#[test]
fn test_base_terms_and_defaults() -> Result<()> {
    let model = model(
        |s| {
            s.annotations("Catalog.Product", |a| a.annotation_default("Voc.Computed"))
        },
        SemanticConfig::default(),
    )?;

    let long = model.find_term("Voc.LongDescription").unwrap();
    assert_eq!(long.base_term().unwrap().unwrap().name(), "Description");
    assert!(model.find_term("Voc.Description").unwrap().base_term().is_none());

    let annotation = &model.vocabulary_annotations()[0];
    assert!(annotation.value().is_none());
    assert!(model.is_valid(), "{:?}", model.errors());
    Ok(())
}

#[test]
fn test_qualified_annotations_share_a_target() -> Result<()> {
    let model = model(
        |s| {
            s.annotations("Catalog.Product/Stock", |a| {
                a.annotation("Voc.Description", CsdlExpression::string("On hand"))
            })
            .annotations("Catalog.Product/Stock", |a| {
                a.qualifier("Tablet")
                    .annotation("Voc.Description", CsdlExpression::string("Qty"))
                    .annotation_qualified("Voc.Description", "Phone", CsdlExpression::string("#"))
            })
        },
        SemanticConfig::default(),
    )?;

    let qualifiers: Vec<Option<&str>> = model
        .vocabulary_annotations()
        .iter()
        .map(|annotation| annotation.qualifier())
        .collect();
    assert_eq!(qualifiers, [None, Some("Tablet"), Some("Phone")]);

    let annotations = model.vocabulary_annotations();
    assert!(annotations[0].target().is_same(annotations[2].target()));
    Ok(())
}

#[test]
fn test_record_values_checked_against_term_type() -> Result<()> {
    let model = model(
        |s| {
            s.annotations("Catalog.Product/Stock", |a| {
                a.annotation(
                    "Voc.Range",
                    CsdlExpression::record(
                        None,
                        [("Min", CsdlExpression::int(0)), ("Max", CsdlExpression::int(100))],
                    ),
                )
                .annotation(
                    "Voc.Range",
                    CsdlExpression::record(None, [("Min", CsdlExpression::int(0))]),
                )
                .annotation(
                    "Voc.Range",
                    CsdlExpression::record(
                        None,
                        [
                            ("Min", CsdlExpression::string("zero")),
                            ("Max", CsdlExpression::int(1)),
                        ],
                    ),
                )
            })
        },
        SemanticConfig::default(),
    )?;

    let codes: Vec<Vec<EdmErrorCode>> = model
        .vocabulary_annotations()
        .iter()
        .map(|annotation| annotation.errors().into_iter().map(|e| e.code).collect())
        .collect();
    assert_eq!(
        codes,
        [
            vec![],
            vec![EdmErrorCode::RecordExpressionMissingRequiredProperty],
            vec![EdmErrorCode::ExpressionPrimitiveKindNotValidForAssertedType],
        ]
    );
    Ok(())
}

#[test]
fn test_labeled_elements_are_shared() -> Result<()> {
    let model = model(
        |s| {
            s.annotations("Catalog.Product", |a| {
                a.annotation(
                    "Voc.Description",
                    CsdlExpression::labeled("Blurb", CsdlExpression::string("Sold by weight")),
                )
            })
            .annotations("Catalog.Shop/Products", |a| {
                a.annotation("Voc.Description", CsdlExpression::label_ref("Catalog.Blurb"))
                    .annotation("Voc.Description", CsdlExpression::label_ref("Catalog.Nothing"))
            })
        },
        SemanticConfig::default(),
    )?;

    let reference = model.vocabulary_annotations()[1].value().cloned().unwrap();
    let EdmExpressionKind::LabeledElementReference(reference) = reference.kind() else {
        panic!("expected a labeled element reference");
    };
    assert_eq!(reference.referenced().unwrap().name(), "Blurb");
    assert!(matches!(
        model.vocabulary_annotations()[1].target(),
        AnnotationTarget::NavigationSource(_)
    ));

    let codes: Vec<EdmErrorCode> = model.errors().into_iter().map(|e| e.code).collect();
    assert_eq!(codes, [EdmErrorCode::BadUnresolvedLabeledElement]);
    Ok(())
}

#[test]
fn test_applicability_in_strict_mode() -> Result<()> {
    let extend = |s: SchemaBuilder| {
        s.annotations("Catalog.Product", |a| {
            a.annotation("Voc.Computed", CsdlExpression::bool(false))
        })
    };

    let lenient = model(extend, SemanticConfig::default())?;
    assert!(lenient.is_valid());

    let strict = model(extend, SemanticConfig::strict())?;
    let codes: Vec<EdmErrorCode> = strict.errors().into_iter().map(|e| e.code).collect();
    assert_eq!(codes, [EdmErrorCode::AnnotationNotApplicable]);
    Ok(())
}
