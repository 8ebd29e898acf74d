//! Schema types: entity, complex, enum and type definitions.
//!
//! # Structured types
//!
//! Entity and complex types share their data and behavior through [`StructuredType`] and the
//! [`EdmStructured`] trait. The base type is resolved lazily. While it is computed, the chain
//! of declared base names is followed iteratively for at most
//! [`crate::SemanticConfig::max_inheritance_depth`] types. Every type on an inheritance cycle,
//! and every type whose chain is longer than that limit, receives a
//! [`EdmErrorCode::BadCyclicEntity`] (or `BadCyclicComplex`) placeholder as its base, which
//! terminates every later walk over the chain.
//!
//! # Keys
//!
//! A declared key is resolved as a list of property paths; segments may traverse complex
//! properties. An entity type without a declared key inherits the key of its base type.

use std::{collections::HashSet, sync::Arc};

use crate::{
    csdl::{CsdlComplexType, CsdlEntityType, CsdlEnumType, CsdlPropertyRef, CsdlTypeDefinition},
    edm::{
        BadElement, BadElementKind, Diagnostics, EdmError, EdmErrorCode, EdmFacets,
        EdmPrimitiveTypeKind, EdmType, EdmTypeKind, Location,
    },
    semantics::{
        cache::Cache, model::ModelLink, EdmCheckable, EdmNavigationProperty,
        EdmNavigationPropertyRc, EdmStructuralProperty, EdmStructuralPropertyRc, ElementRef,
        Resolution,
    },
};

/// Reference to an [`EdmEntityType`]
pub type EdmEntityTypeRc = Arc<EdmEntityType>;
/// Reference to an [`EdmComplexType`]
pub type EdmComplexTypeRc = Arc<EdmComplexType>;
/// Reference to an [`EdmEnumType`]
pub type EdmEnumTypeRc = Arc<EdmEnumType>;
/// Reference to an [`EdmEnumMember`]
pub type EdmEnumMemberRc = Arc<EdmEnumMember>;
/// Reference to an [`EdmTypeDefinition`]
pub type EdmTypeDefinitionRc = Arc<EdmTypeDefinition>;

/// Data shared by entity and complex types.
pub struct StructuredType {
    link: ModelLink,
    namespace: String,
    name: String,
    kind: EdmTypeKind,
    self_type: EdmType,
    base_type_name: Option<String>,
    is_abstract: bool,
    is_open: bool,
    location: Location,
    declared_properties: Vec<EdmStructuralPropertyRc>,
    declared_navigation_properties: Vec<EdmNavigationPropertyRc>,
    base_type: Cache<Option<EdmType>>,
}

/// Parts of a CSDL entity or complex type that [`StructuredType`] is built from.
struct StructuredSource<'a> {
    name: &'a str,
    base_type: Option<&'a String>,
    is_abstract: bool,
    is_open: bool,
    properties: &'a [crate::csdl::CsdlProperty],
    navigation_properties: &'a [crate::csdl::CsdlNavigationProperty],
    location: &'a Location,
}

impl StructuredType {
    fn new(
        link: &ModelLink,
        namespace: &str,
        kind: EdmTypeKind,
        self_type: EdmType,
        source: &StructuredSource<'_>,
        diagnostics: &Diagnostics,
    ) -> Self {
        let mut seen = HashSet::new();
        let mut check_unique = |name: &str, location: &Location| {
            if !seen.insert(name.to_string()) {
                log::warn!("property '{name}' is declared more than once on '{namespace}.{}'", source.name);
                diagnostics.error(
                    EdmErrorCode::AlreadyDefined,
                    location.clone(),
                    format!(
                        "A property named '{name}' is already defined on '{namespace}.{}'",
                        source.name
                    ),
                );
            }
        };

        let declared_properties = source
            .properties
            .iter()
            .map(|csdl| {
                check_unique(&csdl.name, &csdl.location);
                EdmStructuralProperty::new(link, &self_type, csdl)
            })
            .collect();
        let declared_navigation_properties = source
            .navigation_properties
            .iter()
            .map(|csdl| {
                check_unique(&csdl.name, &csdl.location);
                EdmNavigationProperty::new(link, &self_type, csdl)
            })
            .collect();

        StructuredType {
            link: link.clone(),
            namespace: namespace.to_string(),
            name: source.name.to_string(),
            kind,
            self_type,
            base_type_name: source.base_type.cloned(),
            is_abstract: source.is_abstract,
            is_open: source.is_open,
            location: source.location.clone(),
            declared_properties,
            declared_navigation_properties,
            base_type: Cache::new(),
        }
    }

    /// The simple name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declaring namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// `Namespace.Name`
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// [`EdmTypeKind::Entity`] or [`EdmTypeKind::Complex`].
    #[must_use]
    pub fn kind(&self) -> EdmTypeKind {
        self.kind
    }

    /// Abstract flag
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Open type flag
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Where the type is declared
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// The base type name as written.
    #[must_use]
    pub fn base_type_name(&self) -> Option<&str> {
        self.base_type_name.as_deref()
    }

    /// Structural properties declared on this type (not inherited).
    #[must_use]
    pub fn declared_properties(&self) -> &[EdmStructuralPropertyRc] {
        &self.declared_properties
    }

    /// Navigation properties declared on this type (not inherited).
    #[must_use]
    pub fn declared_navigation_properties(&self) -> &[EdmNavigationPropertyRc] {
        &self.declared_navigation_properties
    }

    /// The resolved base type.
    ///
    /// `None` if no base type is declared. A base of the wrong kind, an unknown base or an
    /// inheritance cycle yields an [`EdmType::Unresolved`].
    pub fn base_type(&self) -> Option<EdmType> {
        self.base_type
            .get_or_compute(|| self.compute_base_type(), || Some(self.cyclic_base()))
            .clone()
    }

    fn compute_base_type(&self) -> Option<EdmType> {
        let name = self.base_type_name.as_deref()?;
        let resolved = self.link.resolve_type_name(name, &self.location);

        let base = match (&resolved, self.kind) {
            (EdmType::Entity(_), EdmTypeKind::Entity)
            | (EdmType::Complex(_), EdmTypeKind::Complex) => resolved,
            (EdmType::Unresolved(bad), _)
                if bad
                    .errors
                    .iter()
                    .any(|e| e.code == EdmErrorCode::BadAmbiguousElementBinding) =>
            {
                resolved
            }
            _ => {
                let (code, expected) = if self.kind == EdmTypeKind::Entity {
                    (EdmErrorCode::BadUnresolvedEntityType, "entity")
                } else {
                    (EdmErrorCode::BadUnresolvedComplexType, "complex")
                };
                EdmType::Unresolved(BadElement::new(
                    BadElementKind::Type,
                    name,
                    EdmError::new(
                        code,
                        self.location.clone(),
                        format!(
                            "The base type '{name}' of '{}' is not a known {expected} type",
                            self.full_name()
                        ),
                    ),
                ))
            }
        };

        if let Some(structured) = base.as_structured() {
            if let Some(bad) = self.check_base_chain(structured) {
                return Some(bad);
            }
        }

        Some(base)
    }

    /// The declared base, resolved by name only. Other types' base caches are not touched.
    fn declared_base(&self) -> Option<Arc<dyn EdmStructured>> {
        let name = self.base_type_name.as_deref()?;
        let base = self
            .link
            .resolve_type_name(name, &self.location)
            .as_structured()?;
        (base.structured().kind == self.kind).then_some(base)
    }

    /// Walks the declared bases from `first` up to `max_inheritance_depth` types.
    ///
    /// Returns a placeholder when the walk comes back to this type or the chain is longer
    /// than the limit. A cycle further up the chain belongs to the types on it.
    fn check_base_chain(&self, first: Arc<dyn EdmStructured>) -> Option<EdmType> {
        let max_depth = self.link.config().max_inheritance_depth;
        let mut seen: HashSet<String> = HashSet::new();
        let mut current = first;
        let mut depth = 1;

        loop {
            if current.as_type().is_equivalent_to(&self.self_type) {
                return Some(self.cyclic_base());
            }
            if !seen.insert(current.full_name()) {
                return None;
            }
            let next = current.structured().declared_base()?;
            if depth >= max_depth {
                return Some(self.too_deep_base(max_depth));
            }
            current = next;
            depth += 1;
        }
    }

    fn cyclic_base(&self) -> EdmType {
        log::debug!("inheritance cycle through '{}'", self.full_name());
        self.bad_base(format!("The base type of '{}' is cyclic", self.full_name()))
    }

    fn too_deep_base(&self, max_depth: usize) -> EdmType {
        log::debug!(
            "inheritance chain of '{}' exceeds {max_depth} types",
            self.full_name()
        );
        self.bad_base(format!(
            "The inheritance chain of '{}' is deeper than {max_depth} types",
            self.full_name()
        ))
    }

    fn bad_base(&self, message: String) -> EdmType {
        let code = if self.kind == EdmTypeKind::Entity {
            EdmErrorCode::BadCyclicEntity
        } else {
            EdmErrorCode::BadCyclicComplex
        };
        EdmType::Unresolved(BadElement::new(
            BadElementKind::Type,
            self.full_name(),
            EdmError::new(code, self.location.clone(), message),
        ))
    }

    /// Base types from the nearest to the most remote, stopping at bad or repeated bases.
    fn ancestors(&self) -> Vec<Arc<dyn EdmStructured>> {
        let max_depth = self.link.config().max_inheritance_depth;
        let mut ancestors: Vec<Arc<dyn EdmStructured>> = Vec::new();
        let mut current = self.base_type();

        while let Some(base) = current {
            if ancestors.len() >= max_depth || base.is_equivalent_to(&self.self_type) {
                break;
            }
            let Some(structured) = base.as_structured() else {
                break;
            };
            if ancestors
                .iter()
                .any(|seen| seen.as_type().is_equivalent_to(&base))
            {
                break;
            }
            current = structured.base_type();
            ancestors.push(structured);
        }

        ancestors
    }

    fn errors(&self) -> Vec<EdmError> {
        let mut errors = self
            .base_type()
            .map(|base| base.errors())
            .unwrap_or_default();
        for property in &self.declared_properties {
            errors.extend(property.errors());
        }
        for navigation in &self.declared_navigation_properties {
            errors.extend(navigation.errors());
        }
        errors
    }
}

/// Shared behavior of entity and complex types.
pub trait EdmStructured: Send + Sync {
    /// The shared structured-type data.
    fn structured(&self) -> &StructuredType;

    /// This type as an [`EdmType`].
    fn as_type(&self) -> EdmType {
        self.structured().self_type.clone()
    }

    /// `Namespace.Name`
    fn full_name(&self) -> String {
        self.structured().full_name()
    }

    /// The resolved base type, see [`StructuredType::base_type`].
    fn base_type(&self) -> Option<EdmType> {
        self.structured().base_type()
    }

    /// All structural properties, inherited ones first.
    fn properties(&self) -> Vec<EdmStructuralPropertyRc> {
        let structured = self.structured();
        let mut properties: Vec<EdmStructuralPropertyRc> = structured
            .ancestors()
            .iter()
            .rev()
            .flat_map(|base| base.structured().declared_properties().to_vec())
            .collect();
        properties.extend(structured.declared_properties().iter().cloned());
        properties
    }

    /// All navigation properties, inherited ones first.
    fn navigation_properties(&self) -> Vec<EdmNavigationPropertyRc> {
        let structured = self.structured();
        let mut properties: Vec<EdmNavigationPropertyRc> = structured
            .ancestors()
            .iter()
            .rev()
            .flat_map(|base| base.structured().declared_navigation_properties().to_vec())
            .collect();
        properties.extend(structured.declared_navigation_properties().iter().cloned());
        properties
    }

    /// Find a structural property, declared or inherited.
    fn find_property(&self, name: &str) -> Option<EdmStructuralPropertyRc> {
        let structured = self.structured();
        if let Some(found) = structured
            .declared_properties()
            .iter()
            .find(|p| p.name() == name)
        {
            return Some(found.clone());
        }
        structured.ancestors().iter().find_map(|base| {
            base.structured()
                .declared_properties()
                .iter()
                .find(|p| p.name() == name)
                .cloned()
        })
    }

    /// Find a navigation property, declared or inherited.
    fn find_navigation_property(&self, name: &str) -> Option<EdmNavigationPropertyRc> {
        let structured = self.structured();
        if let Some(found) = structured
            .declared_navigation_properties()
            .iter()
            .find(|p| p.name() == name)
        {
            return Some(found.clone());
        }
        structured.ancestors().iter().find_map(|base| {
            base.structured()
                .declared_navigation_properties()
                .iter()
                .find(|p| p.name() == name)
                .cloned()
        })
    }

    /// Check whether this type is `other` or derives from it.
    fn is_or_inherits_from(&self, other: &EdmType) -> bool {
        let depth = self.structured().link.config().max_inheritance_depth;
        self.as_type().is_or_inherits_from(other, depth)
    }
}

/// A resolved `PropertyRef` of an entity key.
#[derive(Debug, Clone)]
pub struct EdmKeyProperty {
    /// The path as declared
    pub path: String,
    /// The alias, if declared
    pub alias: Option<String>,
    /// The property the path leads to
    pub property: Resolution<EdmStructuralPropertyRc>,
}

impl EdmKeyProperty {
    /// The name the key property is known by: the alias, or the last path segment.
    #[must_use]
    pub fn name(&self) -> &str {
        self.alias
            .as_deref()
            .unwrap_or_else(|| self.path.rsplit('/').next().unwrap_or(&self.path))
    }
}

/// An entity type.
pub struct EdmEntityType {
    structured: StructuredType,
    has_stream: bool,
    declared_key: Option<Vec<CsdlPropertyRef>>,
    key: Cache<Vec<EdmKeyProperty>>,
}

impl EdmEntityType {
    pub(crate) fn new(
        link: &ModelLink,
        namespace: &str,
        csdl: &CsdlEntityType,
        diagnostics: &Diagnostics,
    ) -> EdmEntityTypeRc {
        Arc::new_cyclic(|weak| {
            let self_type = EdmType::Entity(ElementRef::from_weak(weak.clone()));
            let source = StructuredSource {
                name: &csdl.name,
                base_type: csdl.base_type.as_ref(),
                is_abstract: csdl.is_abstract,
                is_open: csdl.is_open,
                properties: &csdl.properties,
                navigation_properties: &csdl.navigation_properties,
                location: &csdl.location,
            };
            EdmEntityType {
                structured: StructuredType::new(
                    link,
                    namespace,
                    EdmTypeKind::Entity,
                    self_type,
                    &source,
                    diagnostics,
                ),
                has_stream: csdl.has_stream,
                declared_key: csdl.key.clone(),
                key: Cache::new(),
            }
        })
    }

    /// Media entity flag
    #[must_use]
    pub fn has_stream(&self) -> bool {
        self.has_stream
    }

    /// Returns `true` if this type declares its own key.
    #[must_use]
    pub fn declares_key(&self) -> bool {
        self.declared_key.is_some()
    }

    /// The key, declared or inherited from the nearest base that declares one.
    pub fn key(&self) -> &[EdmKeyProperty] {
        self.key
            .get_or_compute(|| self.compute_key(), Vec::new)
            .as_slice()
    }

    fn compute_key(&self) -> Vec<EdmKeyProperty> {
        let Some(declared) = &self.declared_key else {
            return self
                .base_type()
                .and_then(|base| base.as_entity())
                .map(|base| base.key().to_vec())
                .unwrap_or_default();
        };

        declared
            .iter()
            .map(|property_ref| EdmKeyProperty {
                path: property_ref.path.clone(),
                alias: property_ref.alias.clone(),
                property: self.resolve_key_path(&property_ref.path),
            })
            .collect()
    }

    fn resolve_key_path(&self, path: &str) -> Resolution<EdmStructuralPropertyRc> {
        let location = self.structured.location();
        let max_segments = self.structured.link.config().max_path_segments;
        let start = self.as_type();

        crate::semantics::paths::resolve_property_path(&start, path, max_segments).map_err(
            |reason| {
                BadElement::new(
                    BadElementKind::Property,
                    path,
                    EdmError::new(
                        EdmErrorCode::BadUnresolvedProperty,
                        location.clone(),
                        format!(
                            "The key property '{path}' of '{}' {reason}",
                            self.full_name()
                        ),
                    ),
                )
            },
        )
    }
}

impl EdmStructured for EdmEntityType {
    fn structured(&self) -> &StructuredType {
        &self.structured
    }
}

impl EdmCheckable for EdmEntityType {
    fn errors(&self) -> Vec<EdmError> {
        let mut errors = self.structured.errors();
        if self.declared_key.is_some() {
            for key in self.key() {
                if let Err(bad) = &key.property {
                    errors.extend(bad.errors.iter().cloned());
                }
            }
        }
        errors
    }
}

impl std::fmt::Debug for EdmEntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EdmEntityType({})", self.full_name())
    }
}

/// A complex type.
pub struct EdmComplexType {
    structured: StructuredType,
}

impl EdmComplexType {
    pub(crate) fn new(
        link: &ModelLink,
        namespace: &str,
        csdl: &CsdlComplexType,
        diagnostics: &Diagnostics,
    ) -> EdmComplexTypeRc {
        Arc::new_cyclic(|weak| {
            let self_type = EdmType::Complex(ElementRef::from_weak(weak.clone()));
            let source = StructuredSource {
                name: &csdl.name,
                base_type: csdl.base_type.as_ref(),
                is_abstract: csdl.is_abstract,
                is_open: csdl.is_open,
                properties: &csdl.properties,
                navigation_properties: &csdl.navigation_properties,
                location: &csdl.location,
            };
            EdmComplexType {
                structured: StructuredType::new(
                    link,
                    namespace,
                    EdmTypeKind::Complex,
                    self_type,
                    &source,
                    diagnostics,
                ),
            }
        })
    }
}

impl EdmStructured for EdmComplexType {
    fn structured(&self) -> &StructuredType {
        &self.structured
    }
}

impl EdmCheckable for EdmComplexType {
    fn errors(&self) -> Vec<EdmError> {
        self.structured.errors()
    }
}

impl std::fmt::Debug for EdmComplexType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EdmComplexType({})", self.full_name())
    }
}

/// A member of an enum type.
#[derive(Debug)]
pub struct EdmEnumMember {
    name: String,
    value: i64,
    declaring_type: ElementRef<EdmEnumType>,
    location: Location,
}

impl EdmEnumMember {
    /// Member name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The explicit value, or the previous member's value plus one
    #[must_use]
    pub fn value(&self) -> i64 {
        self.value
    }

    /// The enum type declaring this member
    #[must_use]
    pub fn declaring_type(&self) -> Option<EdmEnumTypeRc> {
        self.declaring_type.upgrade()
    }

    /// Returns `true` if this member belongs to `enum_type`.
    #[must_use]
    pub fn is_member_of(&self, enum_type: &EdmEnumTypeRc) -> bool {
        self.declaring_type.is(enum_type)
    }

    /// Where the member is declared
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }
}

/// An enum type.
pub struct EdmEnumType {
    link: ModelLink,
    namespace: String,
    name: String,
    underlying_type_name: Option<String>,
    is_flags: bool,
    location: Location,
    members: Vec<EdmEnumMemberRc>,
    underlying_type: Cache<EdmType>,
}

impl EdmEnumType {
    pub(crate) fn new(
        link: &ModelLink,
        namespace: &str,
        csdl: &CsdlEnumType,
        diagnostics: &Diagnostics,
    ) -> EdmEnumTypeRc {
        let full_name = format!("{namespace}.{}", csdl.name);
        Arc::new_cyclic(|weak| {
            let mut members: Vec<EdmEnumMemberRc> = Vec::with_capacity(csdl.members.len());
            let mut next_value = Some(0_i64);

            for member in &csdl.members {
                if members.iter().any(|m| m.name == member.name) {
                    log::warn!("enum member '{}' is declared more than once on '{full_name}'", member.name);
                    diagnostics.error(
                        EdmErrorCode::AlreadyDefined,
                        member.location.clone(),
                        format!(
                            "A member named '{}' is already defined on '{full_name}'",
                            member.name
                        ),
                    );
                }

                let value = match (member.value, next_value) {
                    (Some(explicit), _) => explicit,
                    (None, Some(implicit)) => implicit,
                    (None, None) => {
                        diagnostics.error(
                            EdmErrorCode::EnumMemberValueOutOfRange,
                            member.location.clone(),
                            format!(
                                "The implicit value of member '{}' of '{full_name}' overflows",
                                member.name
                            ),
                        );
                        i64::MAX
                    }
                };
                next_value = value.checked_add(1);

                members.push(Arc::new(EdmEnumMember {
                    name: member.name.clone(),
                    value,
                    declaring_type: ElementRef::from_weak(weak.clone()),
                    location: member.location.clone(),
                }));
            }

            EdmEnumType {
                link: link.clone(),
                namespace: namespace.to_string(),
                name: csdl.name.clone(),
                underlying_type_name: csdl.underlying_type.clone(),
                is_flags: csdl.is_flags,
                location: csdl.location.clone(),
                members,
                underlying_type: Cache::new(),
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

    /// Whether members are combinable flags
    #[must_use]
    pub fn is_flags(&self) -> bool {
        self.is_flags
    }

    /// Where the type is declared
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Members in declaration order
    #[must_use]
    pub fn members(&self) -> &[EdmEnumMemberRc] {
        &self.members
    }

    /// Find a member by name
    #[must_use]
    pub fn find_member(&self, name: &str) -> Option<EdmEnumMemberRc> {
        self.members.iter().find(|m| m.name == name).cloned()
    }

    /// The underlying integral type, `Edm.Int32` if none is declared.
    ///
    /// A non-integral underlying type yields an [`EdmType::Unresolved`] with
    /// [`EdmErrorCode::EnumUnderlyingTypeNotIntegral`].
    pub fn underlying_type(&self) -> &EdmType {
        self.underlying_type.get_or_compute(
            || self.compute_underlying_type(),
            || EdmType::Primitive(EdmPrimitiveTypeKind::Int32),
        )
    }

    fn compute_underlying_type(&self) -> EdmType {
        let Some(name) = self.underlying_type_name.as_deref() else {
            return EdmType::Primitive(EdmPrimitiveTypeKind::Int32);
        };

        let resolved = self.link.resolve_type_name(name, &self.location);
        match &resolved {
            EdmType::Primitive(kind) if kind.is_integral() => resolved,
            EdmType::Unresolved(_) => resolved,
            _ => EdmType::Unresolved(BadElement::new(
                BadElementKind::Type,
                name,
                EdmError::new(
                    EdmErrorCode::EnumUnderlyingTypeNotIntegral,
                    self.location.clone(),
                    format!(
                        "The underlying type '{name}' of enum '{}' is not an integral type",
                        self.full_name()
                    ),
                ),
            )),
        }
    }
}

impl EdmCheckable for EdmEnumType {
    fn errors(&self) -> Vec<EdmError> {
        let underlying = self.underlying_type();
        let mut errors = underlying.errors();

        if let Some((min, max)) = underlying
            .primitive_kind()
            .and_then(EdmPrimitiveTypeKind::integral_range)
        {
            for member in &self.members {
                if member.value < min || member.value > max {
                    errors.push(EdmError::new(
                        EdmErrorCode::EnumMemberValueOutOfRange,
                        member.location.clone(),
                        format!(
                            "The value {} of member '{}' is out of range for '{}'",
                            member.value,
                            member.name,
                            underlying.full_name()
                        ),
                    ));
                }
            }
        }

        errors
    }
}

impl std::fmt::Debug for EdmEnumType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EdmEnumType({})", self.full_name())
    }
}

/// A type definition: a named primitive type with optional facets.
pub struct EdmTypeDefinition {
    link: ModelLink,
    namespace: String,
    name: String,
    underlying_type_name: String,
    facets: EdmFacets,
    location: Location,
    underlying_type: Cache<EdmType>,
}

impl EdmTypeDefinition {
    pub(crate) fn new(
        link: &ModelLink,
        namespace: &str,
        csdl: &CsdlTypeDefinition,
    ) -> EdmTypeDefinitionRc {
        Arc::new(EdmTypeDefinition {
            link: link.clone(),
            namespace: namespace.to_string(),
            name: csdl.name.clone(),
            underlying_type_name: csdl.underlying_type.clone(),
            facets: csdl.facets,
            location: csdl.location.clone(),
            underlying_type: Cache::new(),
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

    /// Facets declared on the definition
    #[must_use]
    pub fn facets(&self) -> &EdmFacets {
        &self.facets
    }

    /// Where the definition is declared
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// The underlying primitive type.
    ///
    /// Anything but a built-in primitive yields an [`EdmType::Unresolved`] with
    /// [`EdmErrorCode::TypeDefinitionUnderlyingTypeNotPrimitive`].
    pub fn underlying_type(&self) -> &EdmType {
        self.underlying_type.get_or_compute(
            || self.compute_underlying_type(),
            || {
                EdmType::Unresolved(BadElement::new(
                    BadElementKind::Type,
                    self.underlying_type_name.as_str(),
                    EdmError::new(
                        EdmErrorCode::TypeDefinitionUnderlyingTypeNotPrimitive,
                        self.location.clone(),
                        format!("The underlying type of '{}' is cyclic", self.full_name()),
                    ),
                ))
            },
        )
    }

    fn compute_underlying_type(&self) -> EdmType {
        let name = self.underlying_type_name.as_str();
        let resolved = self.link.resolve_type_name(name, &self.location);
        match &resolved {
            EdmType::Primitive(_) | EdmType::Unresolved(_) => resolved,
            _ => EdmType::Unresolved(BadElement::new(
                BadElementKind::Type,
                name,
                EdmError::new(
                    EdmErrorCode::TypeDefinitionUnderlyingTypeNotPrimitive,
                    self.location.clone(),
                    format!(
                        "The underlying type '{name}' of '{}' is not a primitive type",
                        self.full_name()
                    ),
                ),
            )),
        }
    }

    /// The underlying primitive kind, if it resolved.
    #[must_use]
    pub fn underlying_kind(&self) -> Option<EdmPrimitiveTypeKind> {
        match self.underlying_type() {
            EdmType::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }
}

impl EdmCheckable for EdmTypeDefinition {
    fn errors(&self) -> Vec<EdmError> {
        self.underlying_type().errors()
    }
}

impl std::fmt::Debug for EdmTypeDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EdmTypeDefinition({})", self.full_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        csdl::SchemaBuilder,
        test::factories::{model_of, model_with_config},
        SemanticConfig,
    };

    #[test]
    fn test_base_type_and_inherited_properties() {
        let model = model_of(
            SchemaBuilder::new("Sales")
                .entity_type("Person", |t| {
                    t.abstract_type()
                        .key(&["ID"])
                        .property("ID", "Edm.Int32", false)
                        .property("Name", "Edm.String", true)
                })
                .entity_type("Employee", |t| {
                    t.base("Sales.Person").property("Salary", "Edm.Decimal", true)
                })
                .build()
                .unwrap(),
        );

        let employee = model.find_type("Sales.Employee").unwrap().as_entity().unwrap();
        let base = employee.base_type().unwrap();
        assert_eq!(base.full_name(), "Sales.Person");

        let names: Vec<_> = employee
            .properties()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, ["ID", "Name", "Salary"]);
        assert!(employee.find_property("Name").is_some());
        assert!(employee.is_or_inherits_from(&base));

        let key = employee.key();
        assert_eq!(key.len(), 1);
        assert_eq!(key[0].name(), "ID");
        assert!(!employee.declares_key());
        assert!(model.is_valid());
    }

    #[test]
    fn test_self_cycle() {
        let model = model_of(
            SchemaBuilder::new("Sales")
                .entity_type("Loop", |t| t.base("Sales.Loop"))
                .build()
                .unwrap(),
        );

        let looped = model.find_type("Sales.Loop").unwrap().as_entity().unwrap();
        let base = looped.base_type().unwrap();
        assert!(base.is_bad());
        assert_eq!(base.errors()[0].code, EdmErrorCode::BadCyclicEntity);
        assert!(looped.properties().is_empty());
    }

    #[test]
    fn test_two_type_cycle_terminates() {
        let model = model_of(
            SchemaBuilder::new("Sales")
                .complex_type("A", |t| t.base("Sales.B").property("X", "Edm.Int32", true))
                .complex_type("B", |t| t.base("Sales.A").property("Y", "Edm.Int32", true))
                .build()
                .unwrap(),
        );

        let errors = model.errors();
        assert!(errors
            .iter()
            .any(|e| e.code == EdmErrorCode::BadCyclicComplex));

        let a = model.find_type("Sales.A").unwrap().as_complex().unwrap();
        let b = model.find_type("Sales.B").unwrap().as_complex().unwrap();
        assert!(a.properties().len() <= 2);
        assert!(b.properties().len() <= 2);
    }

    #[test]
    fn test_long_chain_declared_derived_first() {
        let mut schema = SchemaBuilder::new("Deep");
        for i in 0..2000 {
            let base = format!("Deep.T{}", i + 1);
            schema = schema.entity_type(&format!("T{i}"), |t| {
                if i < 1999 {
                    t.base(&base)
                } else {
                    t
                }
            });
        }
        let model = model_with_config(schema.build().unwrap(), SemanticConfig::minimal());

        let errors = model.errors();
        assert_eq!(errors.len(), 1935);
        assert!(errors.iter().all(|e| e.code == EdmErrorCode::BadCyclicEntity));

        let base_of = |name: &str| {
            model
                .find_type(name)
                .unwrap()
                .as_entity()
                .unwrap()
                .base_type()
        };
        assert!(base_of("Deep.T1934").unwrap().is_bad());
        assert_eq!(base_of("Deep.T1935").unwrap().full_name(), "Deep.T1936");
        assert!(base_of("Deep.T1999").is_none());
    }

    #[test]
    fn test_inheritance_depth_limit() {
        let schema = SchemaBuilder::new("Sales")
            .entity_type("A", |t| t.base("Sales.B"))
            .entity_type("B", |t| t.base("Sales.C"))
            .entity_type("C", |t| t.base("Sales.D"))
            .entity_type("D", |t| t.key(&["ID"]).property("ID", "Edm.Int32", false))
            .entity_type("E", |t| t.base("Sales.A"))
            .build()
            .unwrap();
        let config = SemanticConfig {
            max_inheritance_depth: 3,
            ..SemanticConfig::minimal()
        };
        let model = model_with_config(schema, config);

        let a = model.find_type("Sales.A").unwrap().as_entity().unwrap();
        assert_eq!(a.base_type().unwrap().full_name(), "Sales.B");
        assert_eq!(a.key().len(), 1);
        assert_eq!(a.properties().len(), 1);

        let e = model.find_type("Sales.E").unwrap().as_entity().unwrap();
        let base = e.base_type().unwrap();
        assert!(base.is_bad());
        assert_eq!(base.errors()[0].code, EdmErrorCode::BadCyclicEntity);
        assert!(e.properties().is_empty());

        let codes: Vec<EdmErrorCode> = model.errors().into_iter().map(|e| e.code).collect();
        assert_eq!(codes, [EdmErrorCode::BadCyclicEntity]);
    }

    #[test]
    fn test_cycle_above_a_type_stays_with_the_cycle() {
        let model = model_of(
            SchemaBuilder::new("Sales")
                .entity_type("Child", |t| t.base("Sales.Loop"))
                .entity_type("Loop", |t| t.base("Sales.Loop"))
                .build()
                .unwrap(),
        );

        let child = model.find_type("Sales.Child").unwrap().as_entity().unwrap();
        assert_eq!(child.base_type().unwrap().full_name(), "Sales.Loop");

        let codes: Vec<EdmErrorCode> = model.errors().into_iter().map(|e| e.code).collect();
        assert_eq!(codes, [EdmErrorCode::BadCyclicEntity]);
    }

    #[test]
    fn test_base_of_wrong_kind() {
        let model = model_of(
            SchemaBuilder::new("Sales")
                .complex_type("Address", |t| t)
                .entity_type("Customer", |t| t.base("Sales.Address"))
                .build()
                .unwrap(),
        );

        let customer = model.find_type("Sales.Customer").unwrap().as_entity().unwrap();
        let base = customer.base_type().unwrap();
        assert_eq!(base.errors()[0].code, EdmErrorCode::BadUnresolvedEntityType);
    }

    #[test]
    fn test_key_through_complex_property() {
        let model = model_of(
            SchemaBuilder::new("Sales")
                .complex_type("Code", |t| t.property("Value", "Edm.String", false))
                .entity_type("Product", |t| {
                    t.key_alias("Code/Value", "CodeValue")
                        .property("Code", "Sales.Code", false)
                })
                .entity_type("Broken", |t| t.key(&["Missing"]))
                .build()
                .unwrap(),
        );

        let product = model.find_type("Sales.Product").unwrap().as_entity().unwrap();
        let key = product.key();
        assert_eq!(key[0].name(), "CodeValue");
        assert_eq!(key[0].property.as_ref().unwrap().name(), "Value");

        let broken = model.find_type("Sales.Broken").unwrap().as_entity().unwrap();
        let errors = broken.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, EdmErrorCode::BadUnresolvedProperty);
    }

    #[test]
    fn test_enum_values_and_range() {
        let model = model_of(
            SchemaBuilder::new("Sales")
                .enum_type("Size", |e| {
                    e.underlying("Edm.Byte")
                        .member("Small")
                        .member_value("Large", 10)
                        .member("Larger")
                        .member_value("Huge", 300)
                })
                .enum_type("Bad", |e| e.underlying("Edm.String").member("A"))
                .build()
                .unwrap(),
        );

        let size = model.find_type("Sales.Size").unwrap().as_enum().unwrap();
        let values: Vec<_> = size.members().iter().map(|m| m.value()).collect();
        assert_eq!(values, [0, 10, 11, 300]);
        assert!(size.find_member("Larger").unwrap().is_member_of(&size));

        let errors = size.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, EdmErrorCode::EnumMemberValueOutOfRange);

        let bad = model.find_type("Sales.Bad").unwrap().as_enum().unwrap();
        assert_eq!(
            bad.errors()[0].code,
            EdmErrorCode::EnumUnderlyingTypeNotIntegral
        );
    }

    #[test]
    fn test_type_definition_underlying() {
        let model = model_of(
            SchemaBuilder::new("Sales")
                .type_definition("Money", "Edm.Decimal")
                .complex_type("Address", |t| t)
                .type_definition("Wrong", "Sales.Address")
                .build()
                .unwrap(),
        );

        let money = model.find_type("Sales.Money").unwrap();
        assert_eq!(money.primitive_kind(), Some(EdmPrimitiveTypeKind::Decimal));

        let wrong = model.find_type("Sales.Wrong").unwrap().as_type_definition().unwrap();
        assert_eq!(
            wrong.errors()[0].code,
            EdmErrorCode::TypeDefinitionUnderlyingTypeNotPrimitive
        );
        assert!(wrong.underlying_kind().is_none());
    }
}
