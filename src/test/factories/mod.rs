//! Factory methods for building semantic models in tests.

mod sales;

use std::sync::Arc;

pub use sales::{sales_schema, sales_schema_with};

use crate::{
    csdl::{CsdlSchema, ModelBuilder},
    EdmModel, SemanticConfig,
};

/// Build a model from a single schema with the default configuration.
pub fn model_of(schema: CsdlSchema) -> Arc<EdmModel> {
    model_with_config(schema, SemanticConfig::default())
}

/// Build a model from a single schema with the given configuration.
pub fn model_with_config(schema: CsdlSchema, config: SemanticConfig) -> Arc<EdmModel> {
    let csdl = ModelBuilder::new()
        .schema(schema)
        .build()
        .expect("schema forms a model");
    EdmModel::with_config(&csdl, config).expect("model construction")
}
