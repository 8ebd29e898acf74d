//! Fluent builders for CSDL documents.
//!
//! The builders assemble [`CsdlModel`] and [`CsdlSchema`] records in code. Nested elements are
//! configured through closures, the same way a schema document nests them:
//!
//! ```rust
//! use edmscope::csdl::{CsdlExpression, ModelBuilder, SchemaBuilder};
//!
//! let schema = SchemaBuilder::new("Sales")
//!     .entity_type("Order", |t| {
//!         t.key(&["ID"])
//!             .property("ID", "Edm.Int32", false)
//!             .navigation("Customer", "Sales.Customer", |n| n.partner("Orders"))
//!     })
//!     .entity_type("Customer", |t| {
//!         t.key(&["ID"])
//!             .property("ID", "Edm.Int32", false)
//!             .navigation("Orders", "Collection(Sales.Order)", |n| n.partner("Customer"))
//!     })
//!     .function("TopCustomers", |f| {
//!         f.parameter("count", "Edm.Int32", false)
//!             .returns("Collection(Sales.Customer)", false)
//!     })
//!     .entity_container("Default", |c| {
//!         c.entity_set_with("Orders", "Sales.Order", |s| s.binding("Customer", "Customers"))
//!             .entity_set_with("Customers", "Sales.Customer", |s| s.binding("Orders", "Orders"))
//!             .function_import("TopCustomers", "Sales.TopCustomers", Some("Customers"))
//!     })
//!     .annotations("Sales.Customer", |a| {
//!         a.annotation("Sales.Description", CsdlExpression::string("A customer"))
//!     })
//!     .build()?;
//!
//! let model = ModelBuilder::new().schema(schema).build()?;
//! assert_eq!(model.schemas.len(), 1);
//! # Ok::<(), edmscope::Error>(())
//! ```
//!
//! # Locations
//!
//! Builders have no source text, so every element receives a synthetic [`Location`]: the
//! source is the schema namespace and the line is the element's position in build order.
//! Errors reported by the semantic model therefore still point at distinct, stable
//! positions.
//!
//! # Validation
//!
//! Element names are checked to be simple identifiers and namespaces to be dotted
//! identifiers. The first violation is returned from `build()`.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
    sync::Arc,
};

use crate::{
    csdl::{
        AppliesTo, CsdlAnnotation, CsdlAnnotations, CsdlComplexType, CsdlEntityContainer,
        CsdlEntitySet, CsdlEntityType, CsdlEnumMember, CsdlEnumType, CsdlExpression,
        CsdlInclude, CsdlModel, CsdlNavigationProperty, CsdlNavigationPropertyBinding,
        CsdlOperation, CsdlOperationImport, CsdlParameter, CsdlProperty, CsdlPropertyRef,
        CsdlReferentialConstraint, CsdlSchema, CsdlSingleton, CsdlTerm, CsdlTypeDefinition,
        CsdlTypeReference, OperationKind,
    },
    edm::{is_namespace, is_simple_identifier, EdmFacets, Location},
    Error, Result,
};

/// Hands out synthetic source positions in build order.
#[derive(Clone)]
struct LocationSource {
    source: Arc<str>,
    next_line: Rc<Cell<u32>>,
}

impl LocationSource {
    fn new(source: &str) -> Self {
        LocationSource {
            source: Arc::from(source),
            next_line: Rc::new(Cell::new(1)),
        }
    }

    fn next(&self) -> Location {
        let line = self.next_line.get();
        self.next_line.set(line + 1);
        Location::new(&self.source, line, 1)
    }
}

/// Keeps the first validation error of a builder tree.
#[derive(Clone, Default)]
struct ErrorSink {
    first: Rc<RefCell<Option<Error>>>,
}

impl ErrorSink {
    fn check_identifier(&self, name: &str) {
        if !is_simple_identifier(name) {
            self.push(Error::InvalidName(name.to_string()));
        }
    }

    fn push(&self, error: Error) {
        let mut first = self.first.borrow_mut();
        if first.is_none() {
            *first = Some(error);
        }
    }

    fn into_result(self) -> Result<()> {
        match self.first.borrow_mut().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Builder for a [`CsdlModel`].
#[derive(Default)]
pub struct ModelBuilder {
    model: CsdlModel,
}

impl ModelBuilder {
    /// Create an empty model builder.
    #[must_use]
    pub fn new() -> Self {
        ModelBuilder::default()
    }

    /// Set the OData version.
    #[must_use]
    pub fn version(mut self, version: &str) -> Self {
        self.model.version = Some(version.to_string());
        self
    }

    /// Include a namespace of a referenced document, optionally under an alias.
    #[must_use]
    pub fn include(mut self, namespace: &str, alias: Option<&str>) -> Self {
        self.model.includes.push(CsdlInclude {
            namespace: namespace.to_string(),
            alias: alias.map(str::to_string),
        });
        self
    }

    /// Add a schema.
    #[must_use]
    pub fn schema(mut self, schema: CsdlSchema) -> Self {
        self.model.schemas.push(schema);
        self
    }

    /// Finish the model.
    ///
    /// # Errors
    /// Returns [`Error::InvalidName`] if an include has an invalid namespace or alias.
    pub fn build(self) -> Result<CsdlModel> {
        for include in &self.model.includes {
            if !is_namespace(&include.namespace) {
                return Err(Error::InvalidName(include.namespace.clone()));
            }
            if let Some(alias) = &include.alias {
                if !is_simple_identifier(alias) {
                    return Err(Error::InvalidName(alias.clone()));
                }
            }
        }
        Ok(self.model)
    }
}

/// Builder for a [`CsdlSchema`].
pub struct SchemaBuilder {
    schema: CsdlSchema,
    locations: LocationSource,
    errors: ErrorSink,
}

impl SchemaBuilder {
    /// Start a schema for `namespace`.
    #[must_use]
    pub fn new(namespace: &str) -> Self {
        let locations = LocationSource::new(namespace);
        let errors = ErrorSink::default();
        if !is_namespace(namespace) {
            errors.push(Error::InvalidName(namespace.to_string()));
        }

        SchemaBuilder {
            schema: CsdlSchema {
                namespace: namespace.to_string(),
                location: locations.next(),
                ..CsdlSchema::default()
            },
            locations,
            errors,
        }
    }

    /// Set the schema alias.
    #[must_use]
    pub fn alias(mut self, alias: &str) -> Self {
        self.errors.check_identifier(alias);
        self.schema.alias = Some(alias.to_string());
        self
    }

    /// Add an entity type.
    #[must_use]
    pub fn entity_type<F>(mut self, name: &str, configure: F) -> Self
    where
        F: FnOnce(StructuredTypeBuilder) -> StructuredTypeBuilder,
    {
        let builder = configure(StructuredTypeBuilder::new(name, self.ctx()));
        self.schema.entity_types.push(builder.into_entity_type());
        self
    }

    /// Add a complex type.
    #[must_use]
    pub fn complex_type<F>(mut self, name: &str, configure: F) -> Self
    where
        F: FnOnce(StructuredTypeBuilder) -> StructuredTypeBuilder,
    {
        let builder = configure(StructuredTypeBuilder::new(name, self.ctx()));
        let complex = builder.into_complex_type(&self.errors);
        self.schema.complex_types.push(complex);
        self
    }

    /// Add an enum type.
    #[must_use]
    pub fn enum_type<F>(mut self, name: &str, configure: F) -> Self
    where
        F: FnOnce(EnumTypeBuilder) -> EnumTypeBuilder,
    {
        let builder = configure(EnumTypeBuilder::new(name, self.ctx()));
        self.schema.enum_types.push(builder.enum_type);
        self
    }

    /// Add a type definition.
    #[must_use]
    pub fn type_definition(self, name: &str, underlying_type: &str) -> Self {
        self.type_definition_with_facets(name, underlying_type, EdmFacets::default())
    }

    /// Add a type definition with facets.
    #[must_use]
    pub fn type_definition_with_facets(
        mut self,
        name: &str,
        underlying_type: &str,
        facets: EdmFacets,
    ) -> Self {
        self.errors.check_identifier(name);
        self.schema.type_definitions.push(CsdlTypeDefinition {
            name: name.to_string(),
            underlying_type: underlying_type.to_string(),
            facets,
            location: self.locations.next(),
        });
        self
    }

    /// Add a function.
    #[must_use]
    pub fn function<F>(self, name: &str, configure: F) -> Self
    where
        F: FnOnce(OperationBuilder) -> OperationBuilder,
    {
        self.operation(OperationKind::Function, name, configure)
    }

    /// Add an action.
    #[must_use]
    pub fn action<F>(self, name: &str, configure: F) -> Self
    where
        F: FnOnce(OperationBuilder) -> OperationBuilder,
    {
        self.operation(OperationKind::Action, name, configure)
    }

    fn operation<F>(mut self, kind: OperationKind, name: &str, configure: F) -> Self
    where
        F: FnOnce(OperationBuilder) -> OperationBuilder,
    {
        let builder = configure(OperationBuilder::new(kind, name, self.ctx()));
        let operation = builder.into_operation(&self.errors);
        self.schema.operations.push(operation);
        self
    }

    /// Add a term applicable to every element kind.
    #[must_use]
    pub fn term(self, name: &str, type_name: &str) -> Self {
        self.term_with(name, CsdlTypeReference::new(type_name, true), &[], None)
    }

    /// Add a term with restricted applicability, base term or both.
    ///
    /// ## Arguments
    /// * 'name'       - Term name
    /// * 'type_ref'   - Value type of the term
    /// * 'applies_to' - `AppliesTo` keywords (`EntityType`, `Property`, ...); empty for all
    /// * 'base_term'  - Qualified name of the base term
    #[must_use]
    pub fn term_with(
        mut self,
        name: &str,
        type_ref: CsdlTypeReference,
        applies_to: &[&str],
        base_term: Option<&str>,
    ) -> Self {
        self.errors.check_identifier(name);

        let mut flags = AppliesTo::empty();
        for keyword in applies_to {
            match AppliesTo::from_keyword(keyword) {
                Some(flag) => flags |= flag,
                None => self.errors.push(malformed_error!(
                    "Unknown AppliesTo keyword '{}' on term '{}'",
                    keyword,
                    name
                )),
            }
        }

        self.schema.terms.push(CsdlTerm {
            name: name.to_string(),
            type_ref,
            base_term: base_term.map(str::to_string),
            applies_to: flags,
            default_value: None,
            location: self.locations.next(),
        });
        self
    }

    /// Add an entity container.
    #[must_use]
    pub fn entity_container<F>(mut self, name: &str, configure: F) -> Self
    where
        F: FnOnce(ContainerBuilder) -> ContainerBuilder,
    {
        let builder = configure(ContainerBuilder::new(name, self.ctx()));
        self.schema.entity_containers.push(builder.container);
        self
    }

    /// Add an out-of-line annotations block.
    #[must_use]
    pub fn annotations<F>(mut self, target: &str, configure: F) -> Self
    where
        F: FnOnce(AnnotationsBuilder) -> AnnotationsBuilder,
    {
        let builder = configure(AnnotationsBuilder::new(target, self.ctx()));
        self.schema.annotations.push(builder.block);
        self
    }

    /// Finish the schema.
    ///
    /// # Errors
    /// Returns the first validation error recorded while building, e.g.
    /// [`Error::InvalidName`] for an invalid element name.
    pub fn build(self) -> Result<CsdlSchema> {
        self.errors.into_result()?;
        Ok(self.schema)
    }

    fn ctx(&self) -> BuildContext {
        BuildContext {
            locations: self.locations.clone(),
            errors: self.errors.clone(),
        }
    }
}

/// Shared state handed to nested builders.
#[derive(Clone)]
struct BuildContext {
    locations: LocationSource,
    errors: ErrorSink,
}

/// Builder for entity and complex types.
pub struct StructuredTypeBuilder {
    entity: CsdlEntityType,
    ctx: BuildContext,
}

impl StructuredTypeBuilder {
    fn new(name: &str, ctx: BuildContext) -> Self {
        ctx.errors.check_identifier(name);
        StructuredTypeBuilder {
            entity: CsdlEntityType {
                name: name.to_string(),
                location: ctx.locations.next(),
                ..CsdlEntityType::default()
            },
            ctx,
        }
    }

    /// Derive from `base_type`.
    #[must_use]
    pub fn base(mut self, base_type: &str) -> Self {
        self.entity.base_type = Some(base_type.to_string());
        self
    }

    /// Mark the type abstract.
    #[must_use]
    pub fn abstract_type(mut self) -> Self {
        self.entity.is_abstract = true;
        self
    }

    /// Mark the type open.
    #[must_use]
    pub fn open(mut self) -> Self {
        self.entity.is_open = true;
        self
    }

    /// Mark the entity type as media entity.
    #[must_use]
    pub fn has_stream(mut self) -> Self {
        self.entity.has_stream = true;
        self
    }

    /// Declare the key from property paths.
    #[must_use]
    pub fn key(mut self, paths: &[&str]) -> Self {
        let key = self.entity.key.get_or_insert_with(Vec::new);
        key.extend(paths.iter().map(|path| CsdlPropertyRef {
            path: (*path).to_string(),
            alias: None,
        }));
        self
    }

    /// Add an aliased key property, used for paths into complex properties.
    #[must_use]
    pub fn key_alias(mut self, path: &str, alias: &str) -> Self {
        self.ctx.errors.check_identifier(alias);
        self.entity
            .key
            .get_or_insert_with(Vec::new)
            .push(CsdlPropertyRef {
                path: path.to_string(),
                alias: Some(alias.to_string()),
            });
        self
    }

    /// Add a structural property.
    #[must_use]
    pub fn property(self, name: &str, type_name: &str, nullable: bool) -> Self {
        self.property_ref(name, CsdlTypeReference::new(type_name, nullable))
    }

    /// Add a structural property with a full type reference.
    #[must_use]
    pub fn property_ref(mut self, name: &str, type_ref: CsdlTypeReference) -> Self {
        self.ctx.errors.check_identifier(name);
        self.entity.properties.push(CsdlProperty {
            name: name.to_string(),
            type_ref,
            default_value: None,
            location: self.ctx.locations.next(),
        });
        self
    }

    /// Add a navigation property.
    #[must_use]
    pub fn navigation<F>(mut self, name: &str, type_name: &str, configure: F) -> Self
    where
        F: FnOnce(NavigationPropertyBuilder) -> NavigationPropertyBuilder,
    {
        self.ctx.errors.check_identifier(name);
        let builder = configure(NavigationPropertyBuilder {
            property: CsdlNavigationProperty {
                name: name.to_string(),
                type_name: type_name.to_string(),
                nullable: true,
                partner: None,
                contains_target: false,
                referential_constraints: Vec::new(),
                location: self.ctx.locations.next(),
            },
        });
        self.entity.navigation_properties.push(builder.property);
        self
    }

    fn into_entity_type(self) -> CsdlEntityType {
        self.entity
    }

    fn into_complex_type(self, errors: &ErrorSink) -> CsdlComplexType {
        if self.entity.key.is_some() {
            errors.push(malformed_error!(
                "Complex type '{}' cannot declare a key",
                self.entity.name
            ));
        }
        if self.entity.has_stream {
            errors.push(malformed_error!(
                "Complex type '{}' cannot be a media type",
                self.entity.name
            ));
        }

        CsdlComplexType {
            name: self.entity.name,
            base_type: self.entity.base_type,
            is_abstract: self.entity.is_abstract,
            is_open: self.entity.is_open,
            properties: self.entity.properties,
            navigation_properties: self.entity.navigation_properties,
            location: self.entity.location,
        }
    }
}

/// Builder for a navigation property.
pub struct NavigationPropertyBuilder {
    property: CsdlNavigationProperty,
}

impl NavigationPropertyBuilder {
    /// Make a single-valued navigation non-nullable.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.property.nullable = false;
        self
    }

    /// Set the partner path on the target type.
    #[must_use]
    pub fn partner(mut self, partner: &str) -> Self {
        self.property.partner = Some(partner.to_string());
        self
    }

    /// Mark the navigation as containment.
    #[must_use]
    pub fn contains_target(mut self) -> Self {
        self.property.contains_target = true;
        self
    }

    /// Add a referential constraint.
    #[must_use]
    pub fn constraint(mut self, property: &str, referenced_property: &str) -> Self {
        self.property
            .referential_constraints
            .push(CsdlReferentialConstraint {
                property: property.to_string(),
                referenced_property: referenced_property.to_string(),
            });
        self
    }
}

/// Builder for an enum type.
pub struct EnumTypeBuilder {
    enum_type: CsdlEnumType,
    ctx: BuildContext,
}

impl EnumTypeBuilder {
    fn new(name: &str, ctx: BuildContext) -> Self {
        ctx.errors.check_identifier(name);
        EnumTypeBuilder {
            enum_type: CsdlEnumType {
                name: name.to_string(),
                location: ctx.locations.next(),
                ..CsdlEnumType::default()
            },
            ctx,
        }
    }

    /// Set the underlying integral type.
    #[must_use]
    pub fn underlying(mut self, type_name: &str) -> Self {
        self.enum_type.underlying_type = Some(type_name.to_string());
        self
    }

    /// Mark the members as combinable flags.
    #[must_use]
    pub fn flags(mut self) -> Self {
        self.enum_type.is_flags = true;
        self
    }

    /// Add a member with an implicit value.
    #[must_use]
    pub fn member(self, name: &str) -> Self {
        self.push_member(name, None)
    }

    /// Add a member with an explicit value.
    #[must_use]
    pub fn member_value(self, name: &str, value: i64) -> Self {
        self.push_member(name, Some(value))
    }

    fn push_member(mut self, name: &str, value: Option<i64>) -> Self {
        self.ctx.errors.check_identifier(name);
        self.enum_type.members.push(CsdlEnumMember {
            name: name.to_string(),
            value,
            location: self.ctx.locations.next(),
        });
        self
    }
}

/// Builder for a function or action.
pub struct OperationBuilder {
    operation: CsdlOperation,
    ctx: BuildContext,
}

impl OperationBuilder {
    fn new(kind: OperationKind, name: &str, ctx: BuildContext) -> Self {
        ctx.errors.check_identifier(name);
        OperationBuilder {
            operation: CsdlOperation {
                kind,
                name: name.to_string(),
                is_bound: false,
                is_composable: false,
                entity_set_path: None,
                parameters: Vec::new(),
                return_type: None,
                location: ctx.locations.next(),
            },
            ctx,
        }
    }

    /// Bind the operation to the type of its first parameter.
    #[must_use]
    pub fn bound(mut self) -> Self {
        self.operation.is_bound = true;
        self
    }

    /// Mark a function composable.
    #[must_use]
    pub fn composable(mut self) -> Self {
        self.operation.is_composable = true;
        self
    }

    /// Set the entity set path.
    #[must_use]
    pub fn entity_set_path(mut self, path: &str) -> Self {
        self.operation.entity_set_path = Some(path.to_string());
        self
    }

    /// Add a parameter.
    #[must_use]
    pub fn parameter(self, name: &str, type_name: &str, nullable: bool) -> Self {
        self.parameter_ref(name, CsdlTypeReference::new(type_name, nullable), false)
    }

    /// Add an optional parameter.
    #[must_use]
    pub fn optional_parameter(self, name: &str, type_name: &str) -> Self {
        self.parameter_ref(name, CsdlTypeReference::new(type_name, true), true)
    }

    /// Add a parameter with a full type reference.
    #[must_use]
    pub fn parameter_ref(mut self, name: &str, type_ref: CsdlTypeReference, optional: bool) -> Self {
        self.ctx.errors.check_identifier(name);
        self.operation.parameters.push(CsdlParameter {
            name: name.to_string(),
            type_ref,
            optional,
            location: self.ctx.locations.next(),
        });
        self
    }

    /// Set the return type.
    #[must_use]
    pub fn returns(self, type_name: &str, nullable: bool) -> Self {
        self.returns_ref(CsdlTypeReference::new(type_name, nullable))
    }

    /// Set the return type with a full type reference.
    #[must_use]
    pub fn returns_ref(mut self, type_ref: CsdlTypeReference) -> Self {
        self.operation.return_type = Some(type_ref);
        self
    }

    fn into_operation(self, errors: &ErrorSink) -> CsdlOperation {
        if self.operation.kind == OperationKind::Function && self.operation.return_type.is_none()
        {
            errors.push(malformed_error!(
                "Function '{}' must declare a return type",
                self.operation.name
            ));
        }
        if self.operation.kind == OperationKind::Action && self.operation.is_composable {
            errors.push(malformed_error!(
                "Action '{}' cannot be composable",
                self.operation.name
            ));
        }
        self.operation
    }
}

/// Builder for an entity container.
pub struct ContainerBuilder {
    container: CsdlEntityContainer,
    ctx: BuildContext,
}

impl ContainerBuilder {
    fn new(name: &str, ctx: BuildContext) -> Self {
        ctx.errors.check_identifier(name);
        ContainerBuilder {
            container: CsdlEntityContainer {
                name: name.to_string(),
                location: ctx.locations.next(),
                ..CsdlEntityContainer::default()
            },
            ctx,
        }
    }

    /// Extend another container.
    #[must_use]
    pub fn extends(mut self, container: &str) -> Self {
        self.container.extends = Some(container.to_string());
        self
    }

    /// Add an entity set without bindings.
    #[must_use]
    pub fn entity_set(self, name: &str, entity_type: &str) -> Self {
        self.entity_set_with(name, entity_type, |s| s)
    }

    /// Add an entity set configured through an [`EntitySetBuilder`].
    #[must_use]
    pub fn entity_set_with<F>(mut self, name: &str, entity_type: &str, configure: F) -> Self
    where
        F: FnOnce(EntitySetBuilder) -> EntitySetBuilder,
    {
        self.ctx.errors.check_identifier(name);
        let location = self.ctx.locations.next();
        let builder = configure(EntitySetBuilder::new(self.ctx.clone()));
        self.container.entity_sets.push(CsdlEntitySet {
            name: name.to_string(),
            entity_type: entity_type.to_string(),
            include_in_service_document: builder.include_in_service_document,
            navigation_property_bindings: builder.bindings,
            location,
        });
        self
    }

    /// Add a singleton without bindings.
    #[must_use]
    pub fn singleton(self, name: &str, type_name: &str) -> Self {
        self.singleton_with(name, type_name, |s| s)
    }

    /// Add a singleton configured through an [`EntitySetBuilder`].
    #[must_use]
    pub fn singleton_with<F>(mut self, name: &str, type_name: &str, configure: F) -> Self
    where
        F: FnOnce(EntitySetBuilder) -> EntitySetBuilder,
    {
        self.ctx.errors.check_identifier(name);
        let location = self.ctx.locations.next();
        let builder = configure(EntitySetBuilder::new(self.ctx.clone()));
        self.container.singletons.push(CsdlSingleton {
            name: name.to_string(),
            type_name: type_name.to_string(),
            navigation_property_bindings: builder.bindings,
            location,
        });
        self
    }

    /// Add a function import.
    #[must_use]
    pub fn function_import(self, name: &str, function: &str, entity_set: Option<&str>) -> Self {
        self.operation_import(OperationKind::Function, name, function, entity_set)
    }

    /// Add an action import.
    #[must_use]
    pub fn action_import(self, name: &str, action: &str, entity_set: Option<&str>) -> Self {
        self.operation_import(OperationKind::Action, name, action, entity_set)
    }

    fn operation_import(
        mut self,
        kind: OperationKind,
        name: &str,
        operation: &str,
        entity_set: Option<&str>,
    ) -> Self {
        self.ctx.errors.check_identifier(name);
        self.container.operation_imports.push(CsdlOperationImport {
            kind,
            name: name.to_string(),
            operation: operation.to_string(),
            entity_set: entity_set.map(str::to_string),
            include_in_service_document: false,
            location: self.ctx.locations.next(),
        });
        self
    }
}

/// Builder for entity set and singleton details.
pub struct EntitySetBuilder {
    bindings: Vec<CsdlNavigationPropertyBinding>,
    include_in_service_document: bool,
    ctx: BuildContext,
}

impl EntitySetBuilder {
    fn new(ctx: BuildContext) -> Self {
        EntitySetBuilder {
            bindings: Vec::new(),
            include_in_service_document: true,
            ctx,
        }
    }

    /// Bind a navigation property path to a target entity set or singleton.
    #[must_use]
    pub fn binding(mut self, path: &str, target: &str) -> Self {
        self.bindings.push(CsdlNavigationPropertyBinding {
            path: path.to_string(),
            target: target.to_string(),
            location: self.ctx.locations.next(),
        });
        self
    }

    /// Hide the entity set from the service document.
    #[must_use]
    pub fn exclude_from_service_document(mut self) -> Self {
        self.include_in_service_document = false;
        self
    }
}

/// Builder for an out-of-line annotations block.
pub struct AnnotationsBuilder {
    block: CsdlAnnotations,
    ctx: BuildContext,
}

impl AnnotationsBuilder {
    fn new(target: &str, ctx: BuildContext) -> Self {
        AnnotationsBuilder {
            block: CsdlAnnotations {
                target: target.to_string(),
                qualifier: None,
                annotations: Vec::new(),
                location: ctx.locations.next(),
            },
            ctx,
        }
    }

    /// Qualify every annotation of the block.
    #[must_use]
    pub fn qualifier(mut self, qualifier: &str) -> Self {
        self.ctx.errors.check_identifier(qualifier);
        self.block.qualifier = Some(qualifier.to_string());
        self
    }

    /// Add an annotation with a value.
    #[must_use]
    pub fn annotation(self, term: &str, expression: CsdlExpression) -> Self {
        self.push(term, None, Some(expression))
    }

    /// Add a qualified annotation with a value.
    #[must_use]
    pub fn annotation_qualified(self, term: &str, qualifier: &str, expression: CsdlExpression) -> Self {
        self.ctx.errors.check_identifier(qualifier);
        self.push(term, Some(qualifier), Some(expression))
    }

    /// Add an annotation that uses the term's default value.
    #[must_use]
    pub fn annotation_default(self, term: &str) -> Self {
        self.push(term, None, None)
    }

    fn push(mut self, term: &str, qualifier: Option<&str>, expression: Option<CsdlExpression>) -> Self {
        let location = self.ctx.locations.next();
        let expression = expression.map(|expr| {
            if expr.location.is_unknown() {
                expr.at(location.clone())
            } else {
                expr
            }
        });

        self.block.annotations.push(CsdlAnnotation {
            term: term.to_string(),
            qualifier: qualifier.map(str::to_string),
            expression,
            location,
        });
        self
    }
}
