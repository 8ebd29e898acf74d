//! Structural and navigation properties.

use std::sync::Arc;

use crate::{
    csdl::{CsdlNavigationProperty, CsdlProperty, CsdlReferentialConstraint, CsdlTypeReference},
    edm::{
        BadElement, BadElementKind, EdmError, EdmErrorCode, EdmType, EdmTypeReference, Location,
    },
    semantics::{
        cache::Cache, model::ModelLink, paths, EdmEntityTypeRc, EdmStructured, ElementRef,
        Resolution,
    },
};

/// Reference to an [`EdmStructuralProperty`]
pub type EdmStructuralPropertyRc = Arc<EdmStructuralProperty>;
/// Reference to an [`EdmNavigationProperty`]
pub type EdmNavigationPropertyRc = Arc<EdmNavigationProperty>;

/// A structural property of an entity or complex type.
pub struct EdmStructuralProperty {
    link: ModelLink,
    declaring_type: EdmType,
    name: String,
    declared_type: CsdlTypeReference,
    default_value: Option<String>,
    location: Location,
    type_ref: Cache<EdmTypeReference>,
}

impl EdmStructuralProperty {
    pub(crate) fn new(
        link: &ModelLink,
        declaring_type: &EdmType,
        csdl: &CsdlProperty,
    ) -> EdmStructuralPropertyRc {
        Arc::new(EdmStructuralProperty {
            link: link.clone(),
            declaring_type: declaring_type.clone(),
            name: csdl.name.clone(),
            declared_type: csdl.type_ref.clone(),
            default_value: csdl.default_value.clone(),
            location: csdl.location.clone(),
            type_ref: Cache::new(),
        })
    }

    /// Property name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The entity or complex type declaring this property
    #[must_use]
    pub fn declaring_type(&self) -> &EdmType {
        &self.declaring_type
    }

    /// Default value literal
    #[must_use]
    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    /// Where the property is declared
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// The resolved property type.
    pub fn type_ref(&self) -> &EdmTypeReference {
        self.type_ref.get_or_compute(
            || {
                self.link
                    .resolve_type_reference(&self.declared_type, &self.location)
            },
            || {
                EdmTypeReference::unresolved(BadElement::new(
                    BadElementKind::Type,
                    self.declared_type.type_name.as_str(),
                    EdmError::new(
                        EdmErrorCode::BadUnresolvedType,
                        self.location.clone(),
                        "Cyclic property type",
                    ),
                ))
            },
        )
    }

    pub(crate) fn errors(&self) -> Vec<EdmError> {
        self.type_ref().definition.errors()
    }
}

impl std::fmt::Debug for EdmStructuralProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "EdmStructuralProperty({}/{}: {})",
            self.declaring_type.full_name(),
            self.name,
            self.declared_type.type_name
        )
    }
}

/// A resolved referential constraint.
#[derive(Debug, Clone)]
pub struct EdmReferentialConstraint {
    /// The dependent property on the declaring type
    pub property: Resolution<EdmStructuralPropertyRc>,
    /// The principal property on the target type
    pub referenced_property: Resolution<EdmStructuralPropertyRc>,
}

/// A navigation property of an entity or complex type.
pub struct EdmNavigationProperty {
    link: ModelLink,
    declaring_type: EdmType,
    name: String,
    type_name: String,
    nullable: bool,
    partner_path: Option<String>,
    contains_target: bool,
    declared_constraints: Vec<CsdlReferentialConstraint>,
    location: Location,
    type_ref: Cache<EdmTypeReference>,
    partner: Cache<Option<Resolution<ElementRef<EdmNavigationProperty>>>>,
    constraints: Cache<Vec<EdmReferentialConstraint>>,
}

impl EdmNavigationProperty {
    pub(crate) fn new(
        link: &ModelLink,
        declaring_type: &EdmType,
        csdl: &CsdlNavigationProperty,
    ) -> EdmNavigationPropertyRc {
        Arc::new(EdmNavigationProperty {
            link: link.clone(),
            declaring_type: declaring_type.clone(),
            name: csdl.name.clone(),
            type_name: csdl.type_name.clone(),
            nullable: csdl.nullable,
            partner_path: csdl.partner.clone(),
            contains_target: csdl.contains_target,
            declared_constraints: csdl.referential_constraints.clone(),
            location: csdl.location.clone(),
            type_ref: Cache::new(),
            partner: Cache::new(),
            constraints: Cache::new(),
        })
    }

    /// Property name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The entity or complex type declaring this property
    #[must_use]
    pub fn declaring_type(&self) -> &EdmType {
        &self.declaring_type
    }

    /// The partner path as declared
    #[must_use]
    pub fn partner_path(&self) -> Option<&str> {
        self.partner_path.as_deref()
    }

    /// Containment flag
    #[must_use]
    pub fn contains_target(&self) -> bool {
        self.contains_target
    }

    /// Where the property is declared
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// The resolved type: an entity type, or a collection of entity types.
    pub fn type_ref(&self) -> &EdmTypeReference {
        self.type_ref
            .get_or_compute(|| self.compute_type_ref(), || self.bad_type_ref("is cyclic"))
    }

    fn compute_type_ref(&self) -> EdmTypeReference {
        let resolved = self.link.resolve_type_name(&self.type_name, &self.location);
        match &resolved {
            EdmType::Entity(_) => EdmTypeReference::new(resolved.clone(), self.nullable),
            EdmType::Collection(element) if matches!(element.definition, EdmType::Entity(_)) => {
                EdmTypeReference::collection(EdmTypeReference::new(
                    element.definition.clone(),
                    false,
                ))
            }
            _ if resolved.is_bad() => self.bad_type_ref("cannot be found"),
            _ => self.bad_type_ref("is not an entity type"),
        }
    }

    fn bad_type_ref(&self, reason: &str) -> EdmTypeReference {
        EdmTypeReference::unresolved(BadElement::new(
            BadElementKind::Type,
            self.type_name.as_str(),
            EdmError::new(
                EdmErrorCode::BadUnresolvedEntityType,
                self.location.clone(),
                format!(
                    "The target type '{}' of navigation property '{}' {reason}",
                    self.type_name, self.name
                ),
            ),
        ))
    }

    /// Returns `true` for collection-valued navigation properties.
    #[must_use]
    pub fn is_collection(&self) -> bool {
        self.type_ref().is_collection()
    }

    /// The target entity type, if it resolved.
    #[must_use]
    pub fn target_type(&self) -> Option<EdmEntityTypeRc> {
        let definition = &self.type_ref().definition;
        match definition {
            EdmType::Collection(element) => element.definition.as_entity(),
            other => other.as_entity(),
        }
    }

    /// The target type as an [`EdmType`] (the element type for collections).
    pub(crate) fn target_edm_type(&self) -> Option<EdmType> {
        self.target_type().map(|entity| entity.as_type())
    }

    /// The partner on the target type.
    ///
    /// `None` if no partner is declared. An unresolvable path yields
    /// [`EdmErrorCode::BadUnresolvedNavigationPropertyPath`]; a partner that declares a
    /// partner other than this property yields [`EdmErrorCode::NavigationPartnerMismatch`].
    #[must_use]
    pub fn partner(&self) -> Option<Resolution<EdmNavigationPropertyRc>> {
        let resolved = self
            .partner
            .get_or_compute(
                || self.compute_partner(),
                || {
                    Some(Err(self.bad_partner(
                        EdmErrorCode::BadUnresolvedNavigationPropertyPath,
                        "is cyclic",
                    )))
                },
            )
            .as_ref()?;

        Some(match resolved {
            Ok(partner) => partner.upgrade().ok_or_else(|| {
                ModelLink::detached(
                    BadElementKind::NavigationProperty,
                    self.partner_path.as_deref().unwrap_or_default(),
                    EdmErrorCode::BadUnresolvedNavigationPropertyPath,
                    &self.location,
                )
            }),
            Err(bad) => Err(bad.clone()),
        })
    }

    fn compute_partner(&self) -> Option<Resolution<ElementRef<EdmNavigationProperty>>> {
        let path = self.partner_path.as_deref()?;
        let Some(target) = self.target_edm_type() else {
            return Some(Err(self.bad_partner(
                EdmErrorCode::BadUnresolvedNavigationPropertyPath,
                "cannot be resolved because the target type is unresolved",
            )));
        };

        let max_segments = self.link.config().max_path_segments;
        let partner = match paths::resolve_navigation_path(&self.link, &target, path, max_segments)
        {
            Ok(partner) => partner,
            Err(reason) => {
                return Some(Err(self.bad_partner(
                    EdmErrorCode::BadUnresolvedNavigationPropertyPath,
                    &reason,
                )))
            }
        };

        // The partner's own partner, if declared, must lead back here.
        if let (Some(back_path), Some(back_target)) =
            (partner.partner_path(), partner.target_edm_type())
        {
            let points_back =
                paths::resolve_navigation_path(&self.link, &back_target, back_path, max_segments)
                    .map(|back| std::ptr::eq(Arc::as_ptr(&back), self))
                    .unwrap_or(false);
            if !points_back {
                return Some(Err(self.bad_partner(
                    EdmErrorCode::NavigationPartnerMismatch,
                    &format!(
                        "names '{}' as its partner, which does not name '{}' back",
                        partner.name(),
                        self.name
                    ),
                )));
            }
        }

        Some(Ok(ElementRef::new(&partner)))
    }

    fn bad_partner(&self, code: EdmErrorCode, reason: &str) -> crate::edm::BadElementRc {
        let path = self.partner_path.as_deref().unwrap_or_default();
        BadElement::new(
            BadElementKind::NavigationProperty,
            path,
            EdmError::new(
                code,
                self.location.clone(),
                format!(
                    "The partner '{path}' of navigation property '{}' {reason}",
                    self.name
                ),
            ),
        )
    }

    /// The referential constraints, resolved against the declaring and the target type.
    pub fn referential_constraints(&self) -> &[EdmReferentialConstraint] {
        self.constraints
            .get_or_compute(|| self.compute_constraints(), Vec::new)
            .as_slice()
    }

    fn compute_constraints(&self) -> Vec<EdmReferentialConstraint> {
        let max_segments = self.link.config().max_path_segments;
        let target = self.target_edm_type();

        self.declared_constraints
            .iter()
            .map(|constraint| {
                let property = paths::resolve_property_path(
                    &self.declaring_type,
                    &constraint.property,
                    max_segments,
                )
                .map_err(|reason| self.bad_constraint(&constraint.property, "dependent", &reason));

                let referenced_property = match &target {
                    Some(target) => paths::resolve_property_path(
                        target,
                        &constraint.referenced_property,
                        max_segments,
                    ),
                    None => Err(String::from("cannot be resolved on an unresolved target type")),
                }
                .map_err(|reason| {
                    self.bad_constraint(&constraint.referenced_property, "principal", &reason)
                });

                EdmReferentialConstraint {
                    property,
                    referenced_property,
                }
            })
            .collect()
    }

    fn bad_constraint(&self, path: &str, role: &str, reason: &str) -> crate::edm::BadElementRc {
        BadElement::new(
            BadElementKind::Property,
            path,
            EdmError::new(
                EdmErrorCode::BadUnresolvedProperty,
                self.location.clone(),
                format!(
                    "The {role} property '{path}' of a constraint on '{}' {reason}",
                    self.name
                ),
            ),
        )
    }

    pub(crate) fn errors(&self) -> Vec<EdmError> {
        let mut errors = self.type_ref().definition.errors();
        if let Some(Err(bad)) = self.partner() {
            errors.extend(bad.errors.iter().cloned());
        }
        for constraint in self.referential_constraints() {
            for side in [&constraint.property, &constraint.referenced_property] {
                if let Err(bad) = side {
                    errors.extend(bad.errors.iter().cloned());
                }
            }
        }
        errors
    }
}

impl std::fmt::Debug for EdmNavigationProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "EdmNavigationProperty({}/{}: {})",
            self.declaring_type.full_name(),
            self.name,
            self.type_name
        )
    }
}
