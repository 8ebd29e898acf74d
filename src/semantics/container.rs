//! Entity containers and their children.
//!
//! A container holds entity sets, singletons (together: *navigation sources*) and operation
//! imports. It may extend another container, in which case every lookup falls back to the
//! extended container chain. Cross references inside a container (binding targets, import
//! entity sets, extended containers) are resolved lazily and kept as [`ElementRef`]s.

use std::{collections::HashSet, fmt, sync::Arc};

use crate::{
    csdl::{
        CsdlEntityContainer, CsdlNavigationPropertyBinding, CsdlOperationImport, OperationKind,
    },
    edm::{BadElement, BadElementKind, Diagnostics, EdmError, EdmErrorCode, EdmType, Location},
    semantics::{
        cache::Cache, model::ModelLink, paths, EdmCheckable, EdmNavigationProperty,
        EdmNavigationPropertyRc, EdmOperation, EdmOperationRc, ElementRef, Resolution,
    },
};

/// Reference to an [`EdmEntityContainer`]
pub type EdmEntityContainerRc = Arc<EdmEntityContainer>;
/// Reference to an [`EdmNavigationSource`]
pub type EdmNavigationSourceRc = Arc<EdmNavigationSource>;
/// Reference to an [`EdmOperationImport`]
pub type EdmOperationImportRc = Arc<EdmOperationImport>;

/// Whether a navigation source is an entity set or a singleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum NavigationSourceKind {
    /// A collection of entities
    EntitySet,
    /// A single entity
    Singleton,
}

/// A navigation property binding of an entity set or singleton.
pub struct EdmNavigationPropertyBinding {
    link: ModelLink,
    source: ElementRef<EdmNavigationSource>,
    path: String,
    target_name: String,
    location: Location,
    navigation_property: Cache<Resolution<ElementRef<EdmNavigationProperty>>>,
    target: Cache<Resolution<ElementRef<EdmNavigationSource>>>,
}

impl EdmNavigationPropertyBinding {
    /// The binding path as declared
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The target as declared, `Name` or `Namespace.Container/Name`
    #[must_use]
    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    /// Where the binding is declared
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// The navigation property the path leads to.
    pub fn navigation_property(&self) -> Resolution<EdmNavigationPropertyRc> {
        let resolved = self.navigation_property.get_or_compute(
            || self.compute_navigation_property(),
            || Err(self.bad_path("is cyclic")),
        );
        match resolved {
            Ok(navigation) => navigation
                .upgrade()
                .ok_or_else(|| self.bad_path("refers to a dropped model")),
            Err(bad) => Err(bad.clone()),
        }
    }

    fn compute_navigation_property(&self) -> Resolution<ElementRef<EdmNavigationProperty>> {
        let Some(source) = self.source.upgrade() else {
            return Err(self.bad_path("has no navigation source"));
        };
        let start = source.entity_type();
        if start.is_bad() {
            return Err(self.bad_path("cannot be resolved on an unresolved entity type"));
        }

        let max_segments = self.link.config().max_path_segments;
        paths::resolve_navigation_path(&self.link, start, &self.path, max_segments)
            .map(|navigation| ElementRef::new(&navigation))
            .map_err(|reason| self.bad_path(&reason))
    }

    fn bad_path(&self, reason: &str) -> crate::edm::BadElementRc {
        BadElement::new(
            BadElementKind::NavigationProperty,
            self.path.as_str(),
            EdmError::new(
                EdmErrorCode::BadUnresolvedNavigationPropertyPath,
                self.location.clone(),
                format!("The binding path '{}' {reason}", self.path),
            ),
        )
    }

    /// The entity set or singleton the binding targets.
    pub fn target(&self) -> Resolution<EdmNavigationSourceRc> {
        let resolved = self.target.get_or_compute(
            || self.compute_target(),
            || Err(self.bad_target("is cyclic")),
        );
        match resolved {
            Ok(target) => target
                .upgrade()
                .ok_or_else(|| self.bad_target("refers to a dropped model")),
            Err(bad) => Err(bad.clone()),
        }
    }

    fn compute_target(&self) -> Resolution<ElementRef<EdmNavigationSource>> {
        let container = self
            .source
            .upgrade()
            .and_then(|source| source.container());
        container
            .and_then(|container| container.resolve_source_target(&self.target_name))
            .map(|target| ElementRef::new(&target))
            .ok_or_else(|| self.bad_target("cannot be found"))
    }

    fn bad_target(&self, reason: &str) -> crate::edm::BadElementRc {
        BadElement::new(
            BadElementKind::NavigationSource,
            self.target_name.as_str(),
            EdmError::new(
                EdmErrorCode::BadUnresolvedEntitySet,
                self.location.clone(),
                format!(
                    "The binding target '{}' of path '{}' {reason}",
                    self.target_name, self.path
                ),
            ),
        )
    }

    fn errors(&self) -> Vec<EdmError> {
        let mut errors = Vec::new();
        if let Err(bad) = self.navigation_property() {
            errors.extend(bad.errors.iter().cloned());
        }
        if let Err(bad) = self.target() {
            errors.extend(bad.errors.iter().cloned());
        }
        errors
    }
}

impl fmt::Debug for EdmNavigationPropertyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdmNavigationPropertyBinding({} -> {})", self.path, self.target_name)
    }
}

/// An entity set or singleton.
pub struct EdmNavigationSource {
    link: ModelLink,
    container: ElementRef<EdmEntityContainer>,
    kind: NavigationSourceKind,
    name: String,
    type_name: String,
    include_in_service_document: bool,
    location: Location,
    bindings: Vec<EdmNavigationPropertyBinding>,
    entity_type: Cache<EdmType>,
}

/// The declared parts a navigation source is built from.
struct SourceDeclaration<'a> {
    kind: NavigationSourceKind,
    name: &'a str,
    type_name: &'a str,
    include_in_service_document: bool,
    bindings: &'a [CsdlNavigationPropertyBinding],
    location: &'a Location,
}

impl EdmNavigationSource {
    fn new(
        link: &ModelLink,
        container: ElementRef<EdmEntityContainer>,
        declaration: &SourceDeclaration<'_>,
    ) -> EdmNavigationSourceRc {
        Arc::new_cyclic(|weak| EdmNavigationSource {
            link: link.clone(),
            container,
            kind: declaration.kind,
            name: declaration.name.to_string(),
            type_name: declaration.type_name.to_string(),
            include_in_service_document: declaration.include_in_service_document,
            location: declaration.location.clone(),
            bindings: declaration
                .bindings
                .iter()
                .map(|binding| EdmNavigationPropertyBinding {
                    link: link.clone(),
                    source: ElementRef::from_weak(weak.clone()),
                    path: binding.path.clone(),
                    target_name: binding.target.clone(),
                    location: binding.location.clone(),
                    navigation_property: Cache::new(),
                    target: Cache::new(),
                })
                .collect(),
            entity_type: Cache::new(),
        })
    }

    /// The name within the container
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entity set or singleton
    #[must_use]
    pub fn kind(&self) -> NavigationSourceKind {
        self.kind
    }

    /// The declaring container
    #[must_use]
    pub fn container(&self) -> Option<EdmEntityContainerRc> {
        self.container.upgrade()
    }

    /// Whether the source is listed in the service document
    #[must_use]
    pub fn include_in_service_document(&self) -> bool {
        self.include_in_service_document
    }

    /// Where the source is declared
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Navigation property bindings in declaration order
    #[must_use]
    pub fn navigation_property_bindings(&self) -> &[EdmNavigationPropertyBinding] {
        &self.bindings
    }

    /// Find the binding declared for `path`.
    #[must_use]
    pub fn find_binding(&self, path: &str) -> Option<&EdmNavigationPropertyBinding> {
        self.bindings.iter().find(|binding| binding.path == path)
    }

    /// The entity type of the set or singleton.
    ///
    /// Anything but an entity type yields [`EdmErrorCode::BadUnresolvedEntityType`].
    pub fn entity_type(&self) -> &EdmType {
        self.entity_type.get_or_compute(
            || self.compute_entity_type(),
            || self.bad_entity_type("is cyclic"),
        )
    }

    fn compute_entity_type(&self) -> EdmType {
        let resolved = self.link.resolve_type_name(&self.type_name, &self.location);
        match &resolved {
            EdmType::Entity(_) => resolved,
            _ if resolved.is_bad() => self.bad_entity_type("cannot be found"),
            _ => self.bad_entity_type("is not an entity type"),
        }
    }

    fn bad_entity_type(&self, reason: &str) -> EdmType {
        EdmType::Unresolved(BadElement::new(
            BadElementKind::Type,
            self.type_name.as_str(),
            EdmError::new(
                EdmErrorCode::BadUnresolvedEntityType,
                self.location.clone(),
                format!(
                    "The type '{}' of {} '{}' {reason}",
                    self.type_name, self.kind, self.name
                ),
            ),
        ))
    }

    fn errors(&self) -> Vec<EdmError> {
        let mut errors = self.entity_type().errors();
        for binding in &self.bindings {
            errors.extend(binding.errors());
        }
        errors
    }
}

impl fmt::Debug for EdmNavigationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdmNavigationSource({} {}: {})", self.kind, self.name, self.type_name)
    }
}

/// A function import or action import.
pub struct EdmOperationImport {
    link: ModelLink,
    container: ElementRef<EdmEntityContainer>,
    kind: OperationKind,
    name: String,
    operation_name: String,
    entity_set_name: Option<String>,
    include_in_service_document: bool,
    location: Location,
    operations: Cache<Resolution<Vec<ElementRef<EdmOperation>>>>,
    entity_set: Cache<Option<Resolution<ElementRef<EdmNavigationSource>>>>,
}

impl EdmOperationImport {
    fn new(
        link: &ModelLink,
        container: ElementRef<EdmEntityContainer>,
        csdl: &CsdlOperationImport,
    ) -> EdmOperationImportRc {
        Arc::new(EdmOperationImport {
            link: link.clone(),
            container,
            kind: csdl.kind,
            name: csdl.name.clone(),
            operation_name: csdl.operation.clone(),
            entity_set_name: csdl.entity_set.clone(),
            include_in_service_document: csdl.include_in_service_document,
            location: csdl.location.clone(),
            operations: Cache::new(),
            entity_set: Cache::new(),
        })
    }

    /// The name within the container
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Function import or action import
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// The imported operation name as declared
    #[must_use]
    pub fn operation_name(&self) -> &str {
        &self.operation_name
    }

    /// Whether the import is listed in the service document
    #[must_use]
    pub fn include_in_service_document(&self) -> bool {
        self.include_in_service_document
    }

    /// Where the import is declared
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// The imported operations.
    ///
    /// A function import imports every unbound overload of the function; an action import
    /// must match exactly one unbound action.
    pub fn operations(&self) -> Resolution<Vec<EdmOperationRc>> {
        let resolved = self.operations.get_or_compute(
            || self.compute_operations(),
            || Err(self.bad_operation(EdmErrorCode::BadUnresolvedOperation, "is cyclic")),
        );
        match resolved {
            Ok(operations) => Ok(operations.iter().filter_map(ElementRef::upgrade).collect()),
            Err(bad) => Err(bad.clone()),
        }
    }

    fn compute_operations(&self) -> Resolution<Vec<ElementRef<EdmOperation>>> {
        let candidates = self
            .link
            .get()
            .map(|model| model.find_operations(&self.operation_name))
            .unwrap_or_default();
        if candidates.is_empty() {
            return Err(self.bad_operation(EdmErrorCode::BadUnresolvedOperation, "cannot be found"));
        }

        let of_kind: Vec<&EdmOperationRc> = candidates
            .iter()
            .filter(|operation| operation.kind() == self.kind)
            .collect();
        if of_kind.is_empty() {
            return Err(self.bad_operation(
                EdmErrorCode::OperationImportKindMismatch,
                &format!("is not of kind {:?}", self.kind),
            ));
        }

        let unbound: Vec<ElementRef<EdmOperation>> = of_kind
            .into_iter()
            .filter(|operation| !operation.is_bound())
            .map(ElementRef::new)
            .collect();
        if unbound.is_empty() {
            return Err(self.bad_operation(
                EdmErrorCode::OperationImportCannotImportBoundOperation,
                "only has bound overloads",
            ));
        }
        if self.kind == OperationKind::Action && unbound.len() > 1 {
            return Err(self.bad_operation(
                EdmErrorCode::BadAmbiguousOperation,
                "matches more than one unbound action",
            ));
        }

        Ok(unbound)
    }

    fn bad_operation(&self, code: EdmErrorCode, reason: &str) -> crate::edm::BadElementRc {
        BadElement::new(
            BadElementKind::Operation,
            self.operation_name.as_str(),
            EdmError::new(
                code,
                self.location.clone(),
                format!(
                    "The operation '{}' imported by '{}' {reason}",
                    self.operation_name, self.name
                ),
            ),
        )
    }

    /// The entity set returned entities belong to, if declared.
    pub fn entity_set(&self) -> Option<Resolution<EdmNavigationSourceRc>> {
        let resolved = self
            .entity_set
            .get_or_compute(|| self.compute_entity_set(), || None)
            .as_ref()?;
        Some(match resolved {
            Ok(set) => set
                .upgrade()
                .ok_or_else(|| self.bad_entity_set("refers to a dropped model")),
            Err(bad) => Err(bad.clone()),
        })
    }

    fn compute_entity_set(&self) -> Option<Resolution<ElementRef<EdmNavigationSource>>> {
        let name = self.entity_set_name.as_deref()?;
        let found = self
            .container
            .upgrade()
            .and_then(|container| container.resolve_source_target(name))
            .filter(|source| source.kind() == NavigationSourceKind::EntitySet);
        Some(match found {
            Some(set) => Ok(ElementRef::new(&set)),
            None => Err(self.bad_entity_set("cannot be found")),
        })
    }

    fn bad_entity_set(&self, reason: &str) -> crate::edm::BadElementRc {
        let name = self.entity_set_name.as_deref().unwrap_or_default();
        BadElement::new(
            BadElementKind::NavigationSource,
            name,
            EdmError::new(
                EdmErrorCode::OperationImportEntitySetNotFound,
                self.location.clone(),
                format!("The entity set '{name}' of import '{}' {reason}", self.name),
            ),
        )
    }

    fn errors(&self) -> Vec<EdmError> {
        let mut errors = Vec::new();
        if let Err(bad) = self.operations() {
            errors.extend(bad.errors.iter().cloned());
        }
        if let Some(Err(bad)) = self.entity_set() {
            errors.extend(bad.errors.iter().cloned());
        }
        errors
    }
}

impl fmt::Debug for EdmOperationImport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdmOperationImport({} -> {})", self.name, self.operation_name)
    }
}

/// An entity container.
pub struct EdmEntityContainer {
    link: ModelLink,
    namespace: String,
    name: String,
    extends_name: Option<String>,
    location: Location,
    entity_sets: Vec<EdmNavigationSourceRc>,
    singletons: Vec<EdmNavigationSourceRc>,
    operation_imports: Vec<EdmOperationImportRc>,
    extends: Cache<Option<Resolution<ElementRef<EdmEntityContainer>>>>,
}

impl EdmEntityContainer {
    pub(crate) fn new(
        link: &ModelLink,
        namespace: &str,
        csdl: &CsdlEntityContainer,
        diagnostics: &Diagnostics,
    ) -> EdmEntityContainerRc {
        let full_name = format!("{namespace}.{}", csdl.name);
        let mut seen = HashSet::new();
        let children = csdl
            .entity_sets
            .iter()
            .map(|set| (&set.name, &set.location))
            .chain(csdl.singletons.iter().map(|s| (&s.name, &s.location)))
            .chain(csdl.operation_imports.iter().map(|i| (&i.name, &i.location)));
        for (name, location) in children {
            if !seen.insert(name.as_str()) {
                log::warn!("'{name}' is declared more than once in container '{full_name}'");
                diagnostics.error(
                    EdmErrorCode::AlreadyDefined,
                    location.clone(),
                    format!("An element named '{name}' is already defined in '{full_name}'"),
                );
            }
        }

        Arc::new_cyclic(|weak| {
            let this = || ElementRef::from_weak(weak.clone());
            EdmEntityContainer {
                link: link.clone(),
                namespace: namespace.to_string(),
                name: csdl.name.clone(),
                extends_name: csdl.extends.clone(),
                location: csdl.location.clone(),
                entity_sets: csdl
                    .entity_sets
                    .iter()
                    .map(|set| {
                        let declaration = SourceDeclaration {
                            kind: NavigationSourceKind::EntitySet,
                            name: &set.name,
                            type_name: &set.entity_type,
                            include_in_service_document: set.include_in_service_document,
                            bindings: &set.navigation_property_bindings,
                            location: &set.location,
                        };
                        EdmNavigationSource::new(link, this(), &declaration)
                    })
                    .collect(),
                singletons: csdl
                    .singletons
                    .iter()
                    .map(|singleton| {
                        let declaration = SourceDeclaration {
                            kind: NavigationSourceKind::Singleton,
                            name: &singleton.name,
                            type_name: &singleton.type_name,
                            include_in_service_document: true,
                            bindings: &singleton.navigation_property_bindings,
                            location: &singleton.location,
                        };
                        EdmNavigationSource::new(link, this(), &declaration)
                    })
                    .collect(),
                operation_imports: csdl
                    .operation_imports
                    .iter()
                    .map(|import| EdmOperationImport::new(link, this(), import))
                    .collect(),
                extends: Cache::new(),
            }
        })
    }

    /// The simple name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `Namespace.Name`
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// Where the container is declared
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Entity sets declared by this container
    #[must_use]
    pub fn entity_sets(&self) -> &[EdmNavigationSourceRc] {
        &self.entity_sets
    }

    /// Singletons declared by this container
    #[must_use]
    pub fn singletons(&self) -> &[EdmNavigationSourceRc] {
        &self.singletons
    }

    /// Operation imports declared by this container
    #[must_use]
    pub fn operation_imports(&self) -> &[EdmOperationImportRc] {
        &self.operation_imports
    }

    /// The extended container.
    ///
    /// `None` if the container extends nothing. An unknown name yields
    /// [`EdmErrorCode::BadUnresolvedEntityContainer`], an extends cycle
    /// [`EdmErrorCode::BadCyclicEntityContainer`].
    pub fn extends(&self) -> Option<Resolution<EdmEntityContainerRc>> {
        let resolved = self
            .extends
            .get_or_compute(
                || self.compute_extends(),
                || {
                    Some(Err(self.bad_extends(
                        EdmErrorCode::BadCyclicEntityContainer,
                        "is part of an extends cycle",
                    )))
                },
            )
            .as_ref()?;
        Some(match resolved {
            Ok(base) => base.upgrade().ok_or_else(|| {
                ModelLink::detached(
                    BadElementKind::EntityContainer,
                    self.extends_name.as_deref().unwrap_or_default(),
                    EdmErrorCode::BadUnresolvedEntityContainer,
                    &self.location,
                )
            }),
            Err(bad) => Err(bad.clone()),
        })
    }

    fn compute_extends(&self) -> Option<Resolution<ElementRef<EdmEntityContainer>>> {
        let name = self.extends_name.as_deref()?;
        let Some(base) = self
            .link
            .get()
            .and_then(|model| model.find_entity_container(name))
        else {
            return Some(Err(self.bad_extends(
                EdmErrorCode::BadUnresolvedEntityContainer,
                "cannot be found",
            )));
        };

        // Inductive step: reaches this cell again if the chain is cyclic.
        let _ = base.extends();

        Some(Ok(ElementRef::new(&base)))
    }

    fn bad_extends(&self, code: EdmErrorCode, reason: &str) -> crate::edm::BadElementRc {
        let name = self.extends_name.as_deref().unwrap_or_default();
        BadElement::new(
            BadElementKind::EntityContainer,
            name,
            EdmError::new(
                code,
                self.location.clone(),
                format!(
                    "The container '{name}' extended by '{}' {reason}",
                    self.full_name()
                ),
            ),
        )
    }

    /// Extended containers from the nearest to the most remote.
    fn extends_chain(&self) -> Vec<EdmEntityContainerRc> {
        let max_depth = self.link.config().max_inheritance_depth;
        let mut chain: Vec<EdmEntityContainerRc> = Vec::new();
        let mut current = self.extends();

        while let Some(Ok(base)) = current {
            if chain.len() >= max_depth
                || std::ptr::eq(Arc::as_ptr(&base), self)
                || chain.iter().any(|seen| Arc::ptr_eq(seen, &base))
            {
                break;
            }
            current = base.extends();
            chain.push(base);
        }

        chain
    }

    fn find_in_chain<T>(&self, find: impl Fn(&EdmEntityContainer) -> Option<T>) -> Option<T> {
        find(self).or_else(|| {
            self.extends_chain()
                .iter()
                .find_map(|container| find(container))
        })
    }

    /// Find an entity set here or in the extended containers.
    #[must_use]
    pub fn find_entity_set(&self, name: &str) -> Option<EdmNavigationSourceRc> {
        self.find_in_chain(|container| {
            container
                .entity_sets
                .iter()
                .find(|set| set.name == name)
                .cloned()
        })
    }

    /// Find a singleton here or in the extended containers.
    #[must_use]
    pub fn find_singleton(&self, name: &str) -> Option<EdmNavigationSourceRc> {
        self.find_in_chain(|container| {
            container
                .singletons
                .iter()
                .find(|singleton| singleton.name == name)
                .cloned()
        })
    }

    /// Find an entity set or singleton here or in the extended containers.
    #[must_use]
    pub fn find_navigation_source(&self, name: &str) -> Option<EdmNavigationSourceRc> {
        self.find_in_chain(|container| {
            container
                .entity_sets
                .iter()
                .chain(&container.singletons)
                .find(|source| source.name == name)
                .cloned()
        })
    }

    /// Find the operation imports with `name` in the nearest container declaring any.
    #[must_use]
    pub fn find_operation_imports(&self, name: &str) -> Vec<EdmOperationImportRc> {
        self.find_in_chain(|container| {
            let found: Vec<EdmOperationImportRc> = container
                .operation_imports
                .iter()
                .filter(|import| import.name == name)
                .cloned()
                .collect();
            (!found.is_empty()).then_some(found)
        })
        .unwrap_or_default()
    }

    /// Resolve `Name` in this container or `Namespace.Container/Name` in another one.
    pub(crate) fn resolve_source_target(&self, target: &str) -> Option<EdmNavigationSourceRc> {
        match target.split_once('/') {
            Some((container_name, source_name)) => self
                .link
                .get()?
                .find_entity_container(container_name)?
                .find_navigation_source(source_name),
            None => self.find_navigation_source(target),
        }
    }
}

impl EdmCheckable for EdmEntityContainer {
    fn errors(&self) -> Vec<EdmError> {
        let mut errors = Vec::new();
        if let Some(Err(bad)) = self.extends() {
            errors.extend(bad.errors.iter().cloned());
        }
        for source in self.entity_sets.iter().chain(&self.singletons) {
            errors.extend(source.errors());
        }
        for import in &self.operation_imports {
            errors.extend(import.errors());
        }
        errors
    }
}

impl fmt::Debug for EdmEntityContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdmEntityContainer({})", self.full_name())
    }
}
