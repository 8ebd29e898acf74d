//! The semantic model and its name lookups.
//!
//! [`EdmModel`] owns every semantic element built from a [`CsdlModel`]. Construction is eager
//! for the element graph and lazy for everything that needs name resolution: element records
//! are created up front and indexed by qualified name, while base types, property types,
//! bound functions and annotation targets are resolved on first access through the lookups
//! defined here.
//!
//! # Lookup order
//!
//! Type names are resolved in this order:
//! 1. The built-in `Edm` primitives and `Edm.Untyped`
//! 2. Types declared by this model
//! 3. Types declared by referenced models (if [`SemanticConfig::resolve_in_references`])
//!
//! Every step is alias-aware: a namespace part that matches a schema alias or an include
//! alias is replaced by the namespace it stands for. If more than one declaration matches,
//! the lookup yields an [`EdmType::Unresolved`] carrying
//! [`EdmErrorCode::BadAmbiguousElementBinding`].
//!
//! # Examples
//!
//! ```rust
//! use edmscope::{csdl::{ModelBuilder, SchemaBuilder}, EdmModel};
//!
//! let schema = SchemaBuilder::new("Sales")
//!     .entity_type("Customer", |t| t.key(&["ID"]).property("ID", "Edm.Int32", false))
//!     .build()?;
//! let model = EdmModel::new(&ModelBuilder::new().schema(schema).build()?)?;
//!
//! let customer = model.find_type("Sales.Customer").expect("declared");
//! assert_eq!(customer.full_name(), "Sales.Customer");
//! assert!(model.is_valid());
//! # Ok::<(), edmscope::Error>(())
//! ```

use std::{
    collections::HashMap,
    sync::{Arc, Weak},
};

use dashmap::DashMap;
use rayon::prelude::*;

use crate::{
    csdl::{CsdlModel, CsdlTypeReference},
    edm::{
        is_namespace, is_simple_identifier, parse_type_name, BadElement, BadElementKind,
        Diagnostics, EdmError, EdmErrorCode, EdmPrimitiveTypeKind, EdmType, EdmTypeReference,
        Location, QualifiedName, TypeName, EDM_NAMESPACE, EDM_UNTYPED,
    },
    semantics::{
        annotations::{resolve_target, AnnotationTarget},
        EdmComplexType, EdmComplexTypeRc, EdmEntityContainer, EdmEntityContainerRc,
        EdmEntityType, EdmEntityTypeRc, EdmEnumType, EdmEnumTypeRc, EdmLabeledElementRc,
        EdmOperation, EdmOperationRc, EdmStructured, EdmTerm, EdmTermRc,
        EdmTypeDefinition, EdmTypeDefinitionRc, EdmVocabularyAnnotation, EdmVocabularyAnnotationRc,
        ExpressionContext, SemanticConfig,
    },
    Error, Result,
};

/// An element that can report the semantic errors found in it.
///
/// `errors()` forces every lazy resolution the element owns and returns the errors of all
/// bad elements reached, including those of nested elements (properties, parameters,
/// expression nodes).
pub trait EdmCheckable: Send + Sync {
    /// All semantic errors of this element, in declaration order.
    fn errors(&self) -> Vec<EdmError>;
}

/// Back reference from an element to its owning model.
#[derive(Clone, Debug)]
pub(crate) struct ModelLink(Weak<EdmModel>);

impl ModelLink {
    #[cfg(test)]
    pub(crate) fn for_test(model: &Arc<EdmModel>) -> Self {
        ModelLink(Arc::downgrade(model))
    }

    pub(crate) fn get(&self) -> Option<Arc<EdmModel>> {
        self.0.upgrade()
    }

    pub(crate) fn config(&self) -> SemanticConfig {
        self.get().map(|model| model.config).unwrap_or_default()
    }

    /// Placeholder returned when the owning model has been dropped.
    pub(crate) fn detached(
        kind: BadElementKind,
        name: &str,
        code: EdmErrorCode,
        location: &Location,
    ) -> crate::edm::BadElementRc {
        BadElement::new(
            kind,
            name,
            EdmError::new(
                code,
                location.clone(),
                format!("Cannot resolve '{name}': the owning model has been dropped"),
            ),
        )
    }

    pub(crate) fn resolve_type_name(&self, name: &str, location: &Location) -> EdmType {
        match self.get() {
            Some(model) => model.resolve_type_name(name, location),
            None => EdmType::Unresolved(Self::detached(
                BadElementKind::Type,
                name,
                EdmErrorCode::BadUnresolvedType,
                location,
            )),
        }
    }

    pub(crate) fn resolve_type_reference(
        &self,
        type_ref: &CsdlTypeReference,
        location: &Location,
    ) -> EdmTypeReference {
        match self.get() {
            Some(model) => model.resolve_type_reference(type_ref, location),
            None => EdmTypeReference::unresolved(Self::detached(
                BadElementKind::Type,
                &type_ref.type_name,
                EdmErrorCode::BadUnresolvedType,
                location,
            )),
        }
    }
}

/// The resolved semantic view of a CSDL model.
///
/// Created with [`EdmModel::new`] or [`EdmModel::with_references`] and always handed out as
/// `Arc<EdmModel>`; elements keep a weak back reference to it. The model is `Send + Sync` and
/// every lazy value is computed at most once per cell, so a model can be queried from several
/// threads at the same time.
pub struct EdmModel {
    config: SemanticConfig,
    version: Option<String>,
    namespaces: Vec<String>,
    aliases: HashMap<String, String>,
    references: Vec<Arc<EdmModel>>,

    entity_types: Vec<EdmEntityTypeRc>,
    complex_types: Vec<EdmComplexTypeRc>,
    enum_types: Vec<EdmEnumTypeRc>,
    type_definitions: Vec<EdmTypeDefinitionRc>,
    schema_types: Vec<EdmType>,
    types_by_name: HashMap<String, Vec<EdmType>>,

    operations: Vec<EdmOperationRc>,
    operations_by_name: HashMap<String, Vec<EdmOperationRc>>,

    terms: Vec<EdmTermRc>,
    terms_by_name: HashMap<String, Vec<EdmTermRc>>,

    containers: Vec<EdmEntityContainerRc>,
    containers_by_name: HashMap<String, Vec<EdmEntityContainerRc>>,

    annotations: Vec<EdmVocabularyAnnotationRc>,
    labels: HashMap<String, Vec<EdmLabeledElementRc>>,

    declaration_order: Vec<Arc<dyn EdmCheckable>>,
    type_cache: DashMap<String, EdmType>,
    diagnostics: Diagnostics,
}

impl EdmModel {
    /// Build a model with the default [`SemanticConfig`] and no referenced models.
    ///
    /// # Errors
    /// See [`EdmModel::with_references`].
    pub fn new(csdl: &CsdlModel) -> Result<Arc<EdmModel>> {
        Self::with_references(csdl, Vec::new(), SemanticConfig::default())
    }

    /// Build a model with an explicit configuration.
    ///
    /// # Errors
    /// See [`EdmModel::with_references`].
    pub fn with_config(csdl: &CsdlModel, config: SemanticConfig) -> Result<Arc<EdmModel>> {
        Self::with_references(csdl, Vec::new(), config)
    }

    /// Build a model that can resolve names declared in `references`.
    ///
    /// Construction creates every element and indexes it; no name is resolved yet. Duplicate
    /// declarations are not fatal; they are recorded as [`EdmErrorCode::AlreadyDefined`] and
    /// reported by [`EdmModel::errors`].
    ///
    /// ## Arguments
    /// * 'csdl'       - The document to build from
    /// * 'references' - Models whose declarations are visible to this one
    /// * 'config'     - Resolution and reporting options
    ///
    /// # Errors
    /// - [`Error::Empty`] if the document has no schema
    /// - [`Error::InvalidName`] for an invalid namespace or alias
    /// - [`Error::AliasConflict`] if an alias is bound to two different namespaces
    pub fn with_references(
        csdl: &CsdlModel,
        references: Vec<Arc<EdmModel>>,
        config: SemanticConfig,
    ) -> Result<Arc<EdmModel>> {
        if csdl.schemas.is_empty() {
            return Err(Error::Empty);
        }

        let mut namespaces = Vec::with_capacity(csdl.schemas.len());
        let mut aliases: HashMap<String, String> = HashMap::new();

        let declared_aliases = csdl
            .schemas
            .iter()
            .map(|schema| (&schema.namespace, schema.alias.as_ref()))
            .chain(
                csdl.includes
                    .iter()
                    .map(|include| (&include.namespace, include.alias.as_ref())),
            );

        for (namespace, alias) in declared_aliases {
            if !is_namespace(namespace) || namespace == EDM_NAMESPACE {
                return Err(Error::InvalidName(namespace.clone()));
            }
            let Some(alias) = alias else {
                continue;
            };
            if !is_simple_identifier(alias) || alias == EDM_NAMESPACE {
                return Err(Error::InvalidName(alias.clone()));
            }
            if let Some(first) = aliases.get(alias) {
                if first != namespace {
                    return Err(Error::AliasConflict {
                        alias: alias.clone(),
                        first: first.clone(),
                        second: namespace.clone(),
                    });
                }
            }
            aliases.insert(alias.clone(), namespace.clone());
        }

        for schema in &csdl.schemas {
            if !namespaces.contains(&schema.namespace) {
                namespaces.push(schema.namespace.clone());
            }
        }

        let model = Arc::new_cyclic(|weak| {
            let mut assembler = ModelAssembler::new(ModelLink(Weak::clone(weak)), &aliases);
            for schema in &csdl.schemas {
                assembler.add_schema(schema);
            }
            assembler.finish(ModelHeader {
                config,
                version: csdl.version.clone(),
                namespaces,
                aliases: aliases.clone(),
                references,
            })
        });

        log::debug!(
            "built EDM model [{}]: {} types, {} operations, {} terms, {} containers, {} annotations, {} construction errors",
            model.namespaces.join(", "),
            model.schema_types.len(),
            model.operations.len(),
            model.terms.len(),
            model.containers.len(),
            model.annotations.len(),
            model.diagnostics.count()
        );

        Ok(model)
    }

    /// The configuration the model was built with.
    #[must_use]
    pub fn config(&self) -> &SemanticConfig {
        &self.config
    }

    /// The OData version of the source document.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The namespaces declared by this model.
    #[must_use]
    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    /// The referenced models.
    #[must_use]
    pub fn references(&self) -> &[Arc<EdmModel>] {
        &self.references
    }

    /// Errors detected while building the element graph (duplicate names and the like).
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Replace an alias prefix by the namespace it stands for.
    ///
    /// `S.Customer` becomes `Sales.Customer` if `S` is an alias of `Sales`; names without a
    /// known alias are returned unchanged.
    #[must_use]
    pub fn resolve_alias(&self, name: &str) -> String {
        apply_alias(&self.aliases, name)
    }

    /// Resolve `value` as a namespace or namespace alias known to this model.
    pub(crate) fn resolve_namespace(&self, value: &str) -> Option<String> {
        if let Some(namespace) = self.aliases.get(value) {
            return Some(namespace.clone());
        }
        let known = self.namespaces.iter().any(|namespace| namespace == value)
            || (self.config.resolve_in_references
                && self
                    .references
                    .iter()
                    .any(|reference| reference.namespaces.iter().any(|ns| ns == value)));
        known.then(|| value.to_string())
    }

    /// Schema types declared by this model, in declaration order.
    #[must_use]
    pub fn schema_types(&self) -> &[EdmType] {
        &self.schema_types
    }

    /// Entity types declared by this model.
    #[must_use]
    pub fn entity_types(&self) -> &[EdmEntityTypeRc] {
        &self.entity_types
    }

    /// Complex types declared by this model.
    #[must_use]
    pub fn complex_types(&self) -> &[EdmComplexTypeRc] {
        &self.complex_types
    }

    /// Enum types declared by this model.
    #[must_use]
    pub fn enum_types(&self) -> &[EdmEnumTypeRc] {
        &self.enum_types
    }

    /// Type definitions declared by this model.
    #[must_use]
    pub fn type_definitions(&self) -> &[EdmTypeDefinitionRc] {
        &self.type_definitions
    }

    /// Functions and actions declared by this model.
    #[must_use]
    pub fn operations(&self) -> &[EdmOperationRc] {
        &self.operations
    }

    /// Terms declared by this model.
    #[must_use]
    pub fn terms(&self) -> &[EdmTermRc] {
        &self.terms
    }

    /// Entity containers declared by this model.
    #[must_use]
    pub fn containers(&self) -> &[EdmEntityContainerRc] {
        &self.containers
    }

    /// The first entity container declared by this model.
    #[must_use]
    pub fn entity_container(&self) -> Option<&EdmEntityContainerRc> {
        self.containers.first()
    }

    /// Vocabulary annotations declared by this model.
    #[must_use]
    pub fn vocabulary_annotations(&self) -> &[EdmVocabularyAnnotationRc] {
        &self.annotations
    }

    /// Vocabulary annotations whose target resolves to the same element as `target_path`.
    ///
    /// Returns an empty list if `target_path` itself cannot be resolved.
    #[must_use]
    pub fn find_vocabulary_annotations(&self, target_path: &str) -> Vec<EdmVocabularyAnnotationRc> {
        let target = resolve_target(self, target_path, &Location::unknown());
        if matches!(target, AnnotationTarget::Unresolved(_)) {
            return Vec::new();
        }

        self.annotations
            .iter()
            .filter(|annotation| annotation.target().is_same(&target))
            .cloned()
            .collect()
    }

    /// Find a schema type declared by this model only.
    ///
    /// Returns an unresolved placeholder if the name is declared more than once.
    #[must_use]
    pub fn find_declared_type(&self, name: &str) -> Option<EdmType> {
        let qualified = self.resolve_alias(name);
        let found = self.types_by_name.get(&qualified)?;
        match found.as_slice() {
            [single] => Some(single.clone()),
            _ => Some(Self::ambiguous_type(&qualified, &Location::unknown())),
        }
    }

    /// Find a type by qualified name, including primitives and referenced models.
    ///
    /// Returns an unresolved placeholder if the name matches more than one declaration.
    #[must_use]
    pub fn find_type(&self, name: &str) -> Option<EdmType> {
        self.lookup_type(name, &Location::unknown())
    }

    fn lookup_type(&self, name: &str, location: &Location) -> Option<EdmType> {
        let qualified = self.resolve_alias(name);
        if qualified == EDM_UNTYPED {
            return Some(EdmType::Untyped);
        }
        if let Some(kind) = EdmPrimitiveTypeKind::from_qualified_name(&qualified) {
            return Some(EdmType::Primitive(kind));
        }
        if let Some(hit) = self.type_cache.get(&qualified) {
            return Some(hit.value().clone());
        }

        let mut found: Vec<EdmType> = self
            .types_by_name
            .get(&qualified)
            .cloned()
            .unwrap_or_default();
        if self.config.resolve_in_references {
            for reference in &self.references {
                if let Some(types) = reference.types_by_name.get(&qualified) {
                    found.extend(types.iter().cloned());
                }
            }
        }

        match found.len() {
            0 => None,
            1 => {
                let resolved = found.swap_remove(0);
                self.type_cache.insert(qualified, resolved.clone());
                Some(resolved)
            }
            _ => Some(Self::ambiguous_type(&qualified, location)),
        }
    }

    fn ambiguous_type(qualified: &str, location: &Location) -> EdmType {
        log::debug!("ambiguous type name '{qualified}' at {location}");
        EdmType::Unresolved(BadElement::new(
            BadElementKind::Type,
            qualified,
            EdmError::new(
                EdmErrorCode::BadAmbiguousElementBinding,
                location.clone(),
                format!("The name '{qualified}' is ambiguous"),
            ),
        ))
    }

    /// Resolve a type name, including `Collection(...)`, into a type.
    ///
    /// Never fails: unknown or malformed names yield an [`EdmType::Unresolved`] whose error
    /// carries `location`.
    #[must_use]
    pub fn resolve_type_name(&self, name: &str, location: &Location) -> EdmType {
        match parse_type_name(name) {
            Ok(TypeName::Named(element)) => self.resolve_named_type(&element, location),
            Ok(TypeName::Collection(element)) => EdmType::Collection(Box::new(
                EdmTypeReference::new(self.resolve_named_type(&element, location), true),
            )),
            Err(_) => Self::unresolved_type(name, location, "is not a valid type name"),
        }
    }

    /// Resolve a CSDL type reference, keeping its nullability and facets.
    ///
    /// For `Collection(...)` references the nullability and facets apply to the element type
    /// and the collection itself is not nullable.
    #[must_use]
    pub fn resolve_type_reference(
        &self,
        type_ref: &CsdlTypeReference,
        location: &Location,
    ) -> EdmTypeReference {
        match parse_type_name(&type_ref.type_name) {
            Ok(TypeName::Named(element)) => EdmTypeReference::new(
                self.resolve_named_type(&element, location),
                type_ref.nullable,
            )
            .with_facets(type_ref.facets),
            Ok(TypeName::Collection(element)) => EdmTypeReference::collection(
                EdmTypeReference::new(
                    self.resolve_named_type(&element, location),
                    type_ref.nullable,
                )
                .with_facets(type_ref.facets),
            ),
            Err(_) => EdmTypeReference::new(
                Self::unresolved_type(&type_ref.type_name, location, "is not a valid type name"),
                type_ref.nullable,
            ),
        }
    }

    fn resolve_named_type(&self, name: &QualifiedName, location: &Location) -> EdmType {
        let full_name = name.full_name();
        self.lookup_type(&full_name, location)
            .unwrap_or_else(|| Self::unresolved_type(&full_name, location, "cannot be found"))
    }

    fn unresolved_type(name: &str, location: &Location, reason: &str) -> EdmType {
        log::debug!("unresolved type '{name}' at {location}");
        EdmType::Unresolved(BadElement::new(
            BadElementKind::Type,
            name,
            EdmError::new(
                EdmErrorCode::BadUnresolvedType,
                location.clone(),
                format!("The type '{name}' {reason}"),
            ),
        ))
    }

    /// All functions and actions with the given qualified name, own declarations first.
    #[must_use]
    pub fn find_operations(&self, name: &str) -> Vec<EdmOperationRc> {
        let qualified = self.resolve_alias(name);
        let mut found: Vec<EdmOperationRc> = self
            .operations_by_name
            .get(&qualified)
            .cloned()
            .unwrap_or_default();
        if self.config.resolve_in_references {
            for reference in &self.references {
                if let Some(operations) = reference.operations_by_name.get(&qualified) {
                    found.extend(operations.iter().cloned());
                }
            }
        }
        found
    }

    /// All bound operations that can be invoked on an instance of `binding_type`.
    ///
    /// An operation qualifies if its binding parameter type is `binding_type` or one of its
    /// base types; collection bindings compare their element types the same way.
    #[must_use]
    pub fn find_bound_operations(&self, binding_type: &EdmType) -> Vec<EdmOperationRc> {
        let depth = self.config.max_inheritance_depth;
        self.visible_operations()
            .filter(|operation| operation.is_bound_to(binding_type, depth))
            .collect()
    }

    /// Bound operations with the given name that can be invoked on `binding_type`.
    #[must_use]
    pub fn find_bound_operations_named(
        &self,
        name: &str,
        binding_type: &EdmType,
    ) -> Vec<EdmOperationRc> {
        let depth = self.config.max_inheritance_depth;
        self.find_operations(name)
            .into_iter()
            .filter(|operation| operation.is_bound_to(binding_type, depth))
            .collect()
    }

    fn visible_operations(&self) -> impl Iterator<Item = EdmOperationRc> + '_ {
        let references: &[Arc<EdmModel>] = if self.config.resolve_in_references {
            &self.references
        } else {
            &[]
        };
        self.operations
            .iter()
            .chain(references.iter().flat_map(|r| r.operations.iter()))
            .cloned()
    }

    /// Find a term by qualified name.
    #[must_use]
    pub fn find_term(&self, name: &str) -> Option<EdmTermRc> {
        self.find_terms(name).into_iter().next()
    }

    /// All terms with the given qualified name, own declarations first.
    pub(crate) fn find_terms(&self, name: &str) -> Vec<EdmTermRc> {
        let qualified = self.resolve_alias(name);
        let mut found: Vec<EdmTermRc> = self
            .terms_by_name
            .get(&qualified)
            .cloned()
            .unwrap_or_default();
        if self.config.resolve_in_references {
            for reference in &self.references {
                if let Some(terms) = reference.terms_by_name.get(&qualified) {
                    found.extend(terms.iter().cloned());
                }
            }
        }
        found
    }

    /// Find an entity container by qualified name.
    #[must_use]
    pub fn find_entity_container(&self, name: &str) -> Option<EdmEntityContainerRc> {
        let qualified = self.resolve_alias(name);
        if let Some(container) = self
            .containers_by_name
            .get(&qualified)
            .and_then(|containers| containers.first())
        {
            return Some(container.clone());
        }
        if !self.config.resolve_in_references {
            return None;
        }
        self.references.iter().find_map(|reference| {
            reference
                .containers_by_name
                .get(&qualified)
                .and_then(|containers| containers.first().cloned())
        })
    }

    /// Labeled elements matching `name`.
    ///
    /// A qualified name (`Ns.Label` or `Alias.Label`) matches exactly; a simple name matches
    /// labels of that name in any namespace.
    pub(crate) fn find_labeled_elements(&self, name: &str) -> Vec<EdmLabeledElementRc> {
        if name.contains('.') {
            return self
                .labels
                .get(&self.resolve_alias(name))
                .cloned()
                .unwrap_or_default();
        }

        let mut found: Vec<EdmLabeledElementRc> = self
            .labels
            .values()
            .flatten()
            .filter(|label| label.name() == name)
            .cloned()
            .collect();
        found.sort_by_key(|label| label.location().line);
        found
    }

    /// Every semantic error of the model.
    ///
    /// Construction errors come first, followed by the errors of each element in
    /// declaration order. With [`SemanticConfig::parallel`] the per-element pass runs on the
    /// rayon thread pool; the result is the same.
    #[must_use]
    pub fn errors(&self) -> Vec<EdmError> {
        self.settle_cycles();

        let mut errors = self.diagnostics.to_vec();
        let per_element: Vec<Vec<EdmError>> = if self.config.parallel {
            self.declaration_order
                .par_iter()
                .map(|element| element.errors())
                .collect()
        } else {
            self.declaration_order
                .iter()
                .map(|element| element.errors())
                .collect()
        };
        errors.extend(per_element.into_iter().flatten());
        errors
    }

    /// Returns `true` if [`EdmModel::errors`] is empty.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors().is_empty()
    }

    /// Resolve cyclic chains on the calling thread, in declaration order.
    ///
    /// Which member of a cycle receives the cycle placeholder depends on where the walk
    /// enters it, so these are forced sequentially before any parallel pass.
    fn settle_cycles(&self) {
        for entity in &self.entity_types {
            let _ = entity.base_type();
        }
        for complex in &self.complex_types {
            let _ = complex.base_type();
        }
        for container in &self.containers {
            let _ = container.extends();
        }
        for term in &self.terms {
            let _ = term.base_term();
        }
    }
}

impl std::fmt::Debug for EdmModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdmModel")
            .field("namespaces", &self.namespaces)
            .field("types", &self.schema_types.len())
            .field("operations", &self.operations.len())
            .field("terms", &self.terms.len())
            .field("containers", &self.containers.len())
            .field("annotations", &self.annotations.len())
            .field("references", &self.references.len())
            .finish_non_exhaustive()
    }
}

fn apply_alias(aliases: &HashMap<String, String>, name: &str) -> String {
    match name.rsplit_once('.') {
        Some((namespace, simple)) => match aliases.get(namespace) {
            Some(target) => format!("{target}.{simple}"),
            None => name.to_string(),
        },
        None => name.to_string(),
    }
}

/// Model-level settings passed through construction.
struct ModelHeader {
    config: SemanticConfig,
    version: Option<String>,
    namespaces: Vec<String>,
    aliases: HashMap<String, String>,
    references: Vec<Arc<EdmModel>>,
}

/// What a schema-level name is bound to, for duplicate detection.
#[derive(Clone, Copy, PartialEq, Eq)]
enum DeclarationKind {
    Type,
    Operation,
    Term,
    Container,
}

/// Collects elements and indices while the model is being built.
struct ModelAssembler<'a> {
    link: ModelLink,
    aliases: &'a HashMap<String, String>,
    diagnostics: Diagnostics,
    declared: HashMap<String, DeclarationKind>,

    entity_types: Vec<EdmEntityTypeRc>,
    complex_types: Vec<EdmComplexTypeRc>,
    enum_types: Vec<EdmEnumTypeRc>,
    type_definitions: Vec<EdmTypeDefinitionRc>,
    schema_types: Vec<EdmType>,
    types_by_name: HashMap<String, Vec<EdmType>>,
    operations: Vec<EdmOperationRc>,
    operations_by_name: HashMap<String, Vec<EdmOperationRc>>,
    terms: Vec<EdmTermRc>,
    terms_by_name: HashMap<String, Vec<EdmTermRc>>,
    containers: Vec<EdmEntityContainerRc>,
    containers_by_name: HashMap<String, Vec<EdmEntityContainerRc>>,
    annotations: Vec<EdmVocabularyAnnotationRc>,
    labels: HashMap<String, Vec<EdmLabeledElementRc>>,
    declaration_order: Vec<Arc<dyn EdmCheckable>>,
}

impl<'a> ModelAssembler<'a> {
    fn new(link: ModelLink, aliases: &'a HashMap<String, String>) -> Self {
        ModelAssembler {
            link,
            aliases,
            diagnostics: Diagnostics::new(),
            declared: HashMap::new(),
            entity_types: Vec::new(),
            complex_types: Vec::new(),
            enum_types: Vec::new(),
            type_definitions: Vec::new(),
            schema_types: Vec::new(),
            types_by_name: HashMap::new(),
            operations: Vec::new(),
            operations_by_name: HashMap::new(),
            terms: Vec::new(),
            terms_by_name: HashMap::new(),
            containers: Vec::new(),
            containers_by_name: HashMap::new(),
            annotations: Vec::new(),
            labels: HashMap::new(),
            declaration_order: Vec::new(),
        }
    }

    /// Record a schema-level name. Operations may share a name with other operations only.
    fn declare(&mut self, qualified: &str, kind: DeclarationKind, location: &Location) {
        match self.declared.get(qualified) {
            Some(&existing)
                if existing == DeclarationKind::Operation && kind == DeclarationKind::Operation => {}
            Some(_) => {
                log::warn!("'{qualified}' is declared more than once ({location})");
                self.diagnostics.error(
                    EdmErrorCode::AlreadyDefined,
                    location.clone(),
                    format!("An element with the name '{qualified}' is already defined"),
                );
            }
            None => {
                self.declared.insert(qualified.to_string(), kind);
            }
        }
    }

    fn add_type(&mut self, qualified: String, ty: EdmType, location: &Location) {
        self.declare(&qualified, DeclarationKind::Type, location);
        self.schema_types.push(ty.clone());
        self.types_by_name.entry(qualified).or_default().push(ty);
    }

    fn add_schema(&mut self, schema: &crate::csdl::CsdlSchema) {
        let namespace = schema.namespace.as_str();
        let link = self.link.clone();

        for csdl in &schema.entity_types {
            let entity = EdmEntityType::new(&link, namespace, csdl, &self.diagnostics);
            self.add_type(entity.full_name(), EdmType::entity(&entity), &csdl.location);
            self.declaration_order.push(entity.clone());
            self.entity_types.push(entity);
        }

        for csdl in &schema.complex_types {
            let complex = EdmComplexType::new(&link, namespace, csdl, &self.diagnostics);
            self.add_type(complex.full_name(), EdmType::complex(&complex), &csdl.location);
            self.declaration_order.push(complex.clone());
            self.complex_types.push(complex);
        }

        for csdl in &schema.enum_types {
            let enum_type = EdmEnumType::new(&link, namespace, csdl, &self.diagnostics);
            self.add_type(
                enum_type.full_name(),
                EdmType::enumeration(&enum_type),
                &csdl.location,
            );
            self.declaration_order.push(enum_type.clone());
            self.enum_types.push(enum_type);
        }

        for csdl in &schema.type_definitions {
            let definition = EdmTypeDefinition::new(&link, namespace, csdl);
            self.add_type(
                definition.full_name(),
                EdmType::type_definition(&definition),
                &csdl.location,
            );
            self.declaration_order.push(definition.clone());
            self.type_definitions.push(definition);
        }

        for csdl in &schema.operations {
            let operation = EdmOperation::new(&link, namespace, csdl, &self.diagnostics);
            let qualified = operation.full_name();
            self.declare(&qualified, DeclarationKind::Operation, &csdl.location);
            self.operations_by_name
                .entry(qualified)
                .or_default()
                .push(operation.clone());
            self.declaration_order.push(operation.clone());
            self.operations.push(operation);
        }

        for csdl in &schema.terms {
            let term = EdmTerm::new(&link, namespace, csdl);
            let qualified = term.full_name();
            self.declare(&qualified, DeclarationKind::Term, &csdl.location);
            self.terms_by_name
                .entry(qualified)
                .or_default()
                .push(term.clone());
            self.declaration_order.push(term.clone());
            self.terms.push(term);
        }

        for csdl in &schema.entity_containers {
            let container = EdmEntityContainer::new(&link, namespace, csdl, &self.diagnostics);
            let qualified = container.full_name();
            self.declare(&qualified, DeclarationKind::Container, &csdl.location);
            self.containers_by_name
                .entry(qualified)
                .or_default()
                .push(container.clone());
            self.declaration_order.push(container.clone());
            self.containers.push(container);
        }

        let mut labels = Vec::new();
        for block in &schema.annotations {
            for csdl in &block.annotations {
                let mut context = ExpressionContext::new(&link, namespace, &mut labels);
                let annotation = EdmVocabularyAnnotation::new(block, csdl, &mut context);
                self.declaration_order.push(annotation.clone());
                self.annotations.push(annotation);
            }
        }
        for label in labels {
            let key = if label.name().contains('.') {
                apply_alias(self.aliases, label.name())
            } else {
                format!("{namespace}.{}", label.name())
            };
            self.labels.entry(key).or_default().push(label);
        }
    }

    fn finish(self, header: ModelHeader) -> EdmModel {
        EdmModel {
            config: header.config,
            version: header.version,
            namespaces: header.namespaces,
            aliases: header.aliases,
            references: header.references,
            entity_types: self.entity_types,
            complex_types: self.complex_types,
            enum_types: self.enum_types,
            type_definitions: self.type_definitions,
            schema_types: self.schema_types,
            types_by_name: self.types_by_name,
            operations: self.operations,
            operations_by_name: self.operations_by_name,
            terms: self.terms,
            terms_by_name: self.terms_by_name,
            containers: self.containers,
            containers_by_name: self.containers_by_name,
            annotations: self.annotations,
            labels: self.labels,
            declaration_order: self.declaration_order,
            type_cache: DashMap::new(),
            diagnostics: self.diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        csdl::{CsdlInclude, ModelBuilder, SchemaBuilder},
        test::factories::{model_of, sales_schema},
    };

    #[test]
    fn test_empty_model_is_rejected() {
        assert!(matches!(
            EdmModel::new(&CsdlModel::default()),
            Err(Error::Empty)
        ));
    }

    #[test]
    fn test_alias_conflict() {
        let csdl = ModelBuilder::new()
            .schema(SchemaBuilder::new("Sales").alias("S").build().unwrap())
            .schema(SchemaBuilder::new("Stock").alias("S").build().unwrap())
            .build()
            .unwrap();

        match EdmModel::new(&csdl) {
            Err(Error::AliasConflict { alias, first, second }) => {
                assert_eq!(alias, "S");
                assert_eq!(first, "Sales");
                assert_eq!(second, "Stock");
            }
            other => panic!("expected alias conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_reserved_namespace_is_rejected() {
        let mut csdl = ModelBuilder::new()
            .schema(SchemaBuilder::new("Sales").build().unwrap())
            .build()
            .unwrap();
        csdl.includes.push(CsdlInclude {
            namespace: "Edm".to_string(),
            alias: None,
        });

        assert!(matches!(EdmModel::new(&csdl), Err(Error::InvalidName(_))));
    }

    #[test]
    fn test_lookup_order_and_aliases() {
        let model = model_of(sales_schema());

        assert!(matches!(
            model.find_type("Edm.Int32"),
            Some(EdmType::Primitive(EdmPrimitiveTypeKind::Int32))
        ));
        assert!(matches!(model.find_type("Edm.Untyped"), Some(EdmType::Untyped)));

        let by_alias = model.find_type("S.Customer").unwrap();
        let by_name = model.find_type("Sales.Customer").unwrap();
        assert!(by_alias.is_equivalent_to(&by_name));
        assert_eq!(model.resolve_alias("S.Customer"), "Sales.Customer");
        assert_eq!(model.resolve_alias("Unknown.Customer"), "Unknown.Customer");
        assert!(model.find_type("Sales.Missing").is_none());
    }

    #[test]
    fn test_resolve_type_name_collections() {
        let model = model_of(sales_schema());
        let location = Location::unknown();

        let customers = model.resolve_type_name("Collection(S.Customer)", &location);
        assert_eq!(customers.full_name(), "Collection(Sales.Customer)");

        let missing = model.resolve_type_name("Sales.Nope", &location);
        assert!(missing.is_bad());
        assert_eq!(missing.errors()[0].code, EdmErrorCode::BadUnresolvedType);

        let nested = model.resolve_type_name("Collection(Collection(Edm.Int32))", &location);
        assert!(nested.is_bad());
    }

    #[test]
    fn test_duplicate_declarations() {
        let schema = SchemaBuilder::new("Sales")
            .entity_type("Thing", |t| t.key(&["ID"]).property("ID", "Edm.Int32", false))
            .complex_type("Thing", |t| t)
            .build()
            .unwrap();
        let model = model_of(schema);

        assert_eq!(
            model.diagnostics().by_code(EdmErrorCode::AlreadyDefined).len(),
            1
        );
        let found = model.find_type("Sales.Thing").unwrap();
        assert_eq!(
            found.errors()[0].code,
            EdmErrorCode::BadAmbiguousElementBinding
        );
    }

    #[test]
    fn test_overloads_are_not_duplicates() {
        let schema = SchemaBuilder::new("Sales")
            .function("F", |f| f.parameter("a", "Edm.Int32", false).returns("Edm.Int32", false))
            .function("F", |f| f.parameter("a", "Edm.String", false).returns("Edm.Int32", false))
            .build()
            .unwrap();
        let model = model_of(schema);

        assert!(!model.diagnostics().has_any());
        assert_eq!(model.find_operations("Sales.F").len(), 2);
    }

    #[test]
    fn test_errors_sequential_and_parallel_agree() {
        let schema = SchemaBuilder::new("Sales")
            .entity_type("A", |t| t.base("Sales.B").property("X", "Sales.Missing", true))
            .entity_type("B", |t| t.base("Sales.A"))
            .entity_type("C", |t| t.key(&["Nope"]))
            .build()
            .unwrap();
        let csdl = ModelBuilder::new().schema(schema).build().unwrap();

        let sequential = EdmModel::with_config(&csdl, SemanticConfig::minimal()).unwrap();
        let parallel = EdmModel::with_config(&csdl, SemanticConfig::default()).unwrap();

        let a: Vec<_> = sequential.errors().into_iter().map(|e| e.code).collect();
        let b: Vec<_> = parallel.errors().into_iter().map(|e| e.code).collect();
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }
}
