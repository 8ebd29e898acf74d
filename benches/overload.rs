//! Benchmarks for model construction and the model-wide error pass.
//!
//! The schema is generated with a configurable number of entity types, each carrying a
//! handful of function overloads and annotations whose values call those functions:
//! - Model construction (element graph, name indexes)
//! - Cold error pass (every name resolved for the first time)
//! - Warm error pass (all bindings cached)
//! - Sequential versus parallel error pass

extern crate edmscope;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use edmscope::{
    csdl::{CsdlExpression, CsdlModel, ModelBuilder, SchemaBuilder},
    EdmModel, SemanticConfig,
};
use std::hint::black_box;

/// A schema with `types` entity types, three `Score` overloads per type and two annotations
/// per type, one of them an `Apply` that has to go through overload resolution.
fn generated_model(types: usize) -> CsdlModel {
    let mut schema = SchemaBuilder::new("Bench")
        .alias("B")
        .term("Note", "Edm.Untyped")
        .term("Label", "Edm.String");

    for index in 0..types {
        let name = format!("Entity{index}");
        let qualified = format!("Bench.{name}");
        let base = (index > 0).then(|| format!("Bench.Entity{}", index - 1));

        schema = schema
            .entity_type(&name, |t| {
                let t = match &base {
                    Some(base) => t.base(base),
                    None => t.key(&["ID"]).property("ID", "Edm.Int32", false),
                };
                t.property(&format!("Value{index}"), "Edm.Decimal", true)
            })
            .function(&format!("Score{index}"), |f| {
                f.parameter("x", "Edm.Int32", false).returns("Edm.Int32", false)
            })
            .function(&format!("Score{index}"), |f| {
                f.parameter("x", "Edm.Int64", false).returns("Edm.Int64", false)
            })
            .function(&format!("Score{index}"), |f| {
                f.parameter("x", "Edm.Double", false).returns("Edm.Double", false)
            })
            .annotations(&qualified, |a| {
                a.annotation(
                    "B.Note",
                    CsdlExpression::apply(
                        format!("Bench.Score{index}"),
                        vec![CsdlExpression::int(index as i64)],
                    ),
                )
                .annotation("B.Label", CsdlExpression::string(name.clone()))
            });
    }

    let schema = schema.build().unwrap();
    ModelBuilder::new().schema(schema).build().unwrap()
}

fn bench_model_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("model_construction");
    for types in [10, 100, 1000] {
        let csdl = generated_model(types);
        group.bench_with_input(BenchmarkId::from_parameter(types), &csdl, |b, csdl| {
            b.iter(|| {
                let model = EdmModel::new(black_box(csdl)).unwrap();
                black_box(model)
            });
        });
    }
    group.finish();
}

fn bench_errors_cold(c: &mut Criterion) {
    let mut group = c.benchmark_group("errors_cold");
    for (label, config) in [
        ("sequential", SemanticConfig::minimal()),
        ("parallel", SemanticConfig::default()),
    ] {
        let csdl = generated_model(500);
        group.bench_function(label, |b| {
            b.iter_batched(
                || EdmModel::with_config(&csdl, config).unwrap(),
                |model| black_box(model.errors()),
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_errors_warm(c: &mut Criterion) {
    let model = EdmModel::new(&generated_model(500)).unwrap();
    let _ = model.errors();

    c.bench_function("errors_warm", |b| {
        b.iter(|| black_box(model.errors()));
    });
}

fn bench_type_lookup(c: &mut Criterion) {
    let model = EdmModel::new(&generated_model(500)).unwrap();

    c.bench_function("find_type_aliased", |b| {
        b.iter(|| black_box(model.find_type(black_box("B.Entity250"))));
    });
}

criterion_group!(
    benches,
    bench_model_construction,
    bench_errors_cold,
    bench_errors_warm,
    bench_type_lookup
);
criterion_main!(benches);
