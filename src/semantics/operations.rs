//! Functions, actions and their parameters.
//!
//! Operations are indexed by qualified name in overload lists; see
//! [`crate::EdmModel::find_operations`]. A bound operation takes the instance it is invoked
//! on as its first parameter, the *binding parameter*.

use std::{collections::HashSet, fmt, sync::Arc};

use crate::{
    csdl::{CsdlOperation, CsdlParameter, CsdlTypeReference, OperationKind},
    edm::{
        BadElement, BadElementKind, Diagnostics, EdmError, EdmErrorCode, EdmType,
        EdmTypeReference, Location,
    },
    semantics::{cache::Cache, model::ModelLink, EdmCheckable, ElementRef},
};

/// Reference to an [`EdmOperation`]
pub type EdmOperationRc = Arc<EdmOperation>;
/// Reference to an [`EdmParameter`]
pub type EdmParameterRc = Arc<EdmParameter>;

/// A parameter of a function or action.
pub struct EdmParameter {
    link: ModelLink,
    operation: ElementRef<EdmOperation>,
    name: String,
    declared_type: CsdlTypeReference,
    optional: bool,
    location: Location,
    type_ref: Cache<EdmTypeReference>,
}

impl EdmParameter {
    fn new(
        link: &ModelLink,
        operation: ElementRef<EdmOperation>,
        csdl: &CsdlParameter,
    ) -> EdmParameterRc {
        Arc::new(EdmParameter {
            link: link.clone(),
            operation,
            name: csdl.name.clone(),
            declared_type: csdl.type_ref.clone(),
            optional: csdl.optional,
            location: csdl.location.clone(),
            type_ref: Cache::new(),
        })
    }

    /// Parameter name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Optional parameters may be omitted by callers
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// The declaring operation
    #[must_use]
    pub fn operation(&self) -> Option<EdmOperationRc> {
        self.operation.upgrade()
    }

    /// Where the parameter is declared
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// The resolved parameter type.
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
                        "Cyclic parameter type",
                    ),
                ))
            },
        )
    }
}

impl fmt::Debug for EdmParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdmParameter({}: {})", self.name, self.declared_type.type_name)
    }
}

/// A function or action.
pub struct EdmOperation {
    link: ModelLink,
    namespace: String,
    name: String,
    kind: OperationKind,
    is_bound: bool,
    is_composable: bool,
    entity_set_path: Option<String>,
    parameters: Vec<EdmParameterRc>,
    declared_return_type: Option<CsdlTypeReference>,
    location: Location,
    return_type: Cache<Option<EdmTypeReference>>,
}

impl EdmOperation {
    pub(crate) fn new(
        link: &ModelLink,
        namespace: &str,
        csdl: &CsdlOperation,
        diagnostics: &Diagnostics,
    ) -> EdmOperationRc {
        let mut seen = HashSet::new();
        for parameter in &csdl.parameters {
            if !seen.insert(parameter.name.as_str()) {
                log::warn!(
                    "parameter '{}' is declared more than once on '{namespace}.{}'",
                    parameter.name,
                    csdl.name
                );
                diagnostics.error(
                    EdmErrorCode::AlreadyDefined,
                    parameter.location.clone(),
                    format!(
                        "A parameter named '{}' is already defined on '{namespace}.{}'",
                        parameter.name, csdl.name
                    ),
                );
            }
        }

        Arc::new_cyclic(|weak| EdmOperation {
            link: link.clone(),
            namespace: namespace.to_string(),
            name: csdl.name.clone(),
            kind: csdl.kind,
            is_bound: csdl.is_bound,
            is_composable: csdl.is_composable,
            entity_set_path: csdl.entity_set_path.clone(),
            parameters: csdl
                .parameters
                .iter()
                .map(|parameter| {
                    EdmParameter::new(link, ElementRef::from_weak(weak.clone()), parameter)
                })
                .collect(),
            declared_return_type: csdl.return_type.clone(),
            location: csdl.location.clone(),
            return_type: Cache::new(),
        })
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

    /// The full name followed by the parameter types, e.g. `Sales.Discount(Edm.Int32)`.
    #[must_use]
    pub fn signature(&self) -> String {
        let parameters: Vec<String> = self
            .parameters
            .iter()
            .map(|parameter| parameter.type_ref().full_name())
            .collect();
        format!("{}({})", self.full_name(), parameters.join(","))
    }

    /// Function or action
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Returns `true` for functions.
    #[must_use]
    pub fn is_function(&self) -> bool {
        self.kind == OperationKind::Function
    }

    /// Returns `true` for actions.
    #[must_use]
    pub fn is_action(&self) -> bool {
        self.kind == OperationKind::Action
    }

    /// Bound flag
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.is_bound
    }

    /// Composable flag (functions only)
    #[must_use]
    pub fn is_composable(&self) -> bool {
        self.is_composable
    }

    /// The entity set path as declared
    #[must_use]
    pub fn entity_set_path(&self) -> Option<&str> {
        self.entity_set_path.as_deref()
    }

    /// Where the operation is declared
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Parameters in declaration order, including the binding parameter.
    #[must_use]
    pub fn parameters(&self) -> &[EdmParameterRc] {
        &self.parameters
    }

    /// Find a parameter by name
    #[must_use]
    pub fn find_parameter(&self, name: &str) -> Option<EdmParameterRc> {
        self.parameters.iter().find(|p| p.name == name).cloned()
    }

    /// The first parameter of a bound operation.
    #[must_use]
    pub fn binding_parameter(&self) -> Option<EdmParameterRc> {
        if !self.is_bound {
            return None;
        }
        self.parameters.first().cloned()
    }

    /// The resolved return type; `None` for actions without one.
    pub fn return_type(&self) -> Option<&EdmTypeReference> {
        self.return_type
            .get_or_compute(
                || {
                    self.declared_return_type.as_ref().map(|declared| {
                        self.link.resolve_type_reference(declared, &self.location)
                    })
                },
                || None,
            )
            .as_ref()
    }

    /// Check whether this operation can be invoked on an instance of `binding_type`.
    ///
    /// The binding parameter type must be `binding_type` or one of its bases. A collection
    /// binding only accepts collections, compared by element type.
    #[must_use]
    pub fn is_bound_to(&self, binding_type: &EdmType, max_depth: usize) -> bool {
        let Some(binding) = self.binding_parameter() else {
            return false;
        };
        let declared = &binding.type_ref().definition;
        if declared.is_bad() {
            return false;
        }

        match (binding_type, declared) {
            (EdmType::Collection(actual), EdmType::Collection(expected)) => actual
                .definition
                .is_or_inherits_from(&expected.definition, max_depth),
            (EdmType::Collection(_), _) | (_, EdmType::Collection(_)) => false,
            _ => binding_type.is_or_inherits_from(declared, max_depth),
        }
    }
}

impl EdmCheckable for EdmOperation {
    fn errors(&self) -> Vec<EdmError> {
        let mut errors = Vec::new();
        if self.is_bound && self.parameters.is_empty() {
            errors.push(EdmError::new(
                EdmErrorCode::InvalidBindingParameter,
                self.location.clone(),
                format!(
                    "The bound operation '{}' declares no binding parameter",
                    self.full_name()
                ),
            ));
        }
        for parameter in &self.parameters {
            errors.extend(parameter.type_ref().definition.errors());
        }
        if let Some(return_type) = self.return_type() {
            errors.extend(return_type.definition.errors());
        }
        errors
    }
}

impl fmt::Debug for EdmOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdmOperation({:?} {})", self.kind, self.full_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        csdl::SchemaBuilder,
        test::factories::{model_of, sales_schema},
    };

    #[test]
    fn test_parameters_and_return_type() {
        let model = model_of(sales_schema());
        let discount = &model.find_operations("Sales.Discount")[0];

        assert!(discount.is_function());
        assert!(!discount.is_bound());
        assert_eq!(discount.parameters().len(), 1);
        assert_eq!(
            discount.return_type().unwrap().full_name(),
            "Edm.Decimal"
        );
        let parameter = discount.find_parameter("percent").unwrap();
        assert!(Arc::ptr_eq(&parameter.operation().unwrap(), discount));
        assert!(discount.signature().starts_with("Sales.Discount("));
    }

    #[test]
    fn test_bound_to_derived_and_collections() {
        let model = model_of(sales_schema());
        let customer = model.find_type("Sales.Customer").unwrap();
        let vip = model.find_type("Sales.VipCustomer").unwrap();

        let on_customer = model.find_bound_operations_named("Sales.Rename", &customer);
        assert_eq!(on_customer.len(), 1);
        let on_vip = model.find_bound_operations_named("Sales.Rename", &vip);
        assert_eq!(on_vip.len(), 1);

        let customers = model.resolve_type_name("Collection(Sales.Customer)", &Location::unknown());
        let top = model.find_bound_operations_named("Sales.TopCustomers", &customers);
        assert_eq!(top.len(), 1);
        assert!(model
            .find_bound_operations_named("Sales.TopCustomers", &customer)
            .is_empty());
        assert!(model
            .find_bound_operations_named("Sales.Rename", &customers)
            .is_empty());
    }

    #[test]
    fn test_invalid_binding_and_duplicate_parameters() {
        let model = model_of(
            SchemaBuilder::new("Sales")
                .action("Reset", |a| a.bound())
                .function("Twice", |f| {
                    f.parameter("a", "Edm.Int32", false)
                        .parameter("a", "Sales.Missing", false)
                        .returns("Edm.Int32", false)
                })
                .build()
                .unwrap(),
        );

        let reset = &model.find_operations("Sales.Reset")[0];
        assert!(reset.binding_parameter().is_none());
        assert_eq!(
            reset.errors()[0].code,
            EdmErrorCode::InvalidBindingParameter
        );

        assert_eq!(
            model.diagnostics().by_code(EdmErrorCode::AlreadyDefined).len(),
            1
        );
        let twice = &model.find_operations("Sales.Twice")[0];
        assert_eq!(twice.errors()[0].code, EdmErrorCode::BadUnresolvedType);
    }
}
