//! Contract operation descriptors.
//!
//! A resource contract is declared ahead of use as a named set of operations.
//! Each operation is classified exactly once, at registration, into a tagged
//! [`OperationKind`] plus a declared [`ReturnShape`]; the dispatcher consumes
//! the resulting table as plain data. Classification validity is checked when
//! the contract is built, so invalid combinations surface as configuration
//! errors before any request is processed. Tables are frozen at processor
//! build time and shared read-only by every dispatch.

use std::sync::Arc;

use indexmap::IndexMap;
use traverse_types::{ContentType, Error, Method};

use crate::resource::NameCandidate;

/// Declared shape of an operation's result.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnShape {
    /// Presence check over a relation or form; never a fetch.
    Bool,
    /// Raw data value.
    Value,
    /// A single raw link.
    Link,
    /// Every link for a relation.
    LinkList,
    /// A raw form descriptor.
    Form,
    /// A wrapped resource satisfying the named contract.
    Contract(String),
    /// Wrapped resources for every embedded target of a relation.
    ContractList(String),
}

impl ReturnShape {
    /// Shorthand for [`ReturnShape::Contract`].
    pub fn contract(name: impl Into<String>) -> Self {
        ReturnShape::Contract(name.into())
    }

    /// Shorthand for [`ReturnShape::ContractList`].
    pub fn contract_list(name: impl Into<String>) -> Self {
        ReturnShape::ContractList(name.into())
    }
}

/// Tagged classification of one contract operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationKind {
    /// Compares the underlying resources of two wrapped entities.
    Equals,
    /// Delegates directly to the underlying resource's raw data tree.
    PassThrough,
    /// Link operation over a relation; behavior refines by return shape.
    Link {
        /// Target relation.
        rel: String,
    },
    /// Link operation disambiguated by an explicit name.
    NamedLink {
        /// Target relation.
        rel: String,
        /// Disambiguating name; `None` targets unnamed links.
        name: Option<String>,
    },
    /// First link whose name matches the first candidate with any match.
    FirstLink {
        /// Target relation.
        rel: String,
        /// Ordered name candidates, possibly ending in a wildcard.
        candidates: Vec<NameCandidate>,
    },
    /// Path expression evaluated against the raw data tree.
    Data {
        /// Dot-and-index path.
        path: String,
    },
    /// Form operation by name; behavior refines by return shape.
    Form {
        /// Form name.
        name: String,
    },
    /// Delegates to the injected default-operation handler.
    Default,
}

/// How one positional call argument maps into the outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamBinding {
    /// Template or query parameter with the given name.
    Param(String),
    /// Header with the given name.
    Header(String),
    /// Request content encoded by the handler registered for this type.
    Content(ContentType),
}

/// Frozen classification of one contract operation.
#[derive(Debug, Clone)]
pub struct OperationDescriptor {
    /// Operation name, unique within its contract.
    pub name: String,
    /// Tagged operation kind.
    pub kind: OperationKind,
    /// Declared return shape.
    pub return_shape: ReturnShape,
    /// When true, a missing link or data path yields null instead of raising.
    pub null_when_missing: bool,
    /// Per-operation HTTP method, overriding the link's safe-read default.
    pub method_override: Option<Method>,
    /// Positional argument bindings.
    pub bindings: Vec<ParamBinding>,
}

impl OperationDescriptor {
    fn new(name: impl Into<String>, kind: OperationKind, return_shape: ReturnShape) -> Self {
        Self {
            name: name.into(),
            kind,
            return_shape,
            null_when_missing: false,
            method_override: None,
            bindings: Vec::new(),
        }
    }

    /// A link operation over `rel`, defaulting to a raw-link return.
    pub fn link(name: impl Into<String>, rel: impl Into<String>) -> Self {
        Self::new(name, OperationKind::Link { rel: rel.into() }, ReturnShape::Link)
    }

    /// A link operation disambiguated by name.
    pub fn named_link(name: impl Into<String>, rel: impl Into<String>, link_name: Option<&str>) -> Self {
        Self::new(
            name,
            OperationKind::NamedLink {
                rel: rel.into(),
                name: link_name.map(str::to_string),
            },
            ReturnShape::Link,
        )
    }

    /// A first-matching-link operation.
    pub fn first_link(name: impl Into<String>, rel: impl Into<String>, candidates: Vec<NameCandidate>) -> Self {
        Self::new(
            name,
            OperationKind::FirstLink {
                rel: rel.into(),
                candidates,
            },
            ReturnShape::Link,
        )
    }

    /// A data-extraction operation.
    pub fn data(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, OperationKind::Data { path: path.into() }, ReturnShape::Value)
    }

    /// A form operation, defaulting to a raw-form return.
    pub fn form(name: impl Into<String>, form_name: impl Into<String>) -> Self {
        Self::new(name, OperationKind::Form { name: form_name.into() }, ReturnShape::Form)
    }

    /// Identity equality over the underlying resource.
    pub fn equals(name: impl Into<String>) -> Self {
        Self::new(name, OperationKind::Equals, ReturnShape::Bool)
    }

    /// Direct delegation to the underlying resource's data tree.
    pub fn pass_through(name: impl Into<String>) -> Self {
        Self::new(name, OperationKind::PassThrough, ReturnShape::Value)
    }

    /// Fallback to the injected default-operation handler.
    pub fn fallback(name: impl Into<String>) -> Self {
        Self::new(name, OperationKind::Default, ReturnShape::Value)
    }

    /// Overrides the declared return shape.
    pub fn returns(mut self, shape: ReturnShape) -> Self {
        self.return_shape = shape;
        self
    }

    /// Missing links or data paths yield null instead of raising.
    pub fn null_when_missing(mut self) -> Self {
        self.null_when_missing = true;
        self
    }

    /// Overrides the HTTP method used when the operation issues a request.
    pub fn method(mut self, method: Method) -> Self {
        self.method_override = Some(method);
        self
    }

    /// Appends a positional argument binding.
    pub fn bind(mut self, binding: ParamBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    fn validate(&self, contract: &str) -> Result<(), Error> {
        let valid = match &self.kind {
            OperationKind::Equals => self.return_shape == ReturnShape::Bool,
            OperationKind::PassThrough => self.return_shape == ReturnShape::Value,
            OperationKind::Data { .. } => self.return_shape == ReturnShape::Value,
            OperationKind::FirstLink { .. } => self.return_shape == ReturnShape::Link,
            OperationKind::Link { .. } => !matches!(self.return_shape, ReturnShape::Value | ReturnShape::Form),
            OperationKind::NamedLink { .. } => matches!(
                self.return_shape,
                ReturnShape::Bool | ReturnShape::Link | ReturnShape::LinkList | ReturnShape::Contract(_)
            ),
            OperationKind::Form { .. } => matches!(
                self.return_shape,
                ReturnShape::Bool | ReturnShape::Form | ReturnShape::Contract(_)
            ),
            OperationKind::Default => true,
        };

        if valid {
            Ok(())
        } else {
            Err(Error::configuration(format!(
                "contract [{contract}] operation [{}]: return shape {:?} is not valid for {:?}",
                self.name, self.return_shape, self.kind
            )))
        }
    }
}

/// A frozen contract: name plus ordered operation table.
#[derive(Debug, Clone)]
pub struct ContractDescriptor {
    name: String,
    operations: IndexMap<String, OperationDescriptor>,
}

impl ContractDescriptor {
    /// Starts declaring a contract.
    pub fn builder(name: impl Into<String>) -> ContractBuilder {
        ContractBuilder {
            name: name.into(),
            operations: Vec::new(),
        }
    }

    /// Contract name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up an operation by name.
    pub fn operation(&self, name: &str) -> Option<&OperationDescriptor> {
        self.operations.get(name)
    }

    /// All operations in declaration order.
    pub fn operations(&self) -> impl Iterator<Item = &OperationDescriptor> {
        self.operations.values()
    }
}

/// Accumulates operations for one contract and validates at build.
pub struct ContractBuilder {
    name: String,
    operations: Vec<OperationDescriptor>,
}

impl ContractBuilder {
    /// Adds one operation declaration.
    pub fn operation(mut self, descriptor: OperationDescriptor) -> Self {
        self.operations.push(descriptor);
        self
    }

    /// Validates every classification and freezes the contract.
    pub fn build(self) -> Result<ContractDescriptor, Error> {
        let mut operations = IndexMap::new();
        for descriptor in self.operations {
            descriptor.validate(&self.name)?;
            if operations.insert(descriptor.name.clone(), descriptor.clone()).is_some() {
                return Err(Error::configuration(format!(
                    "contract [{}] declares operation [{}] more than once",
                    self.name, descriptor.name
                )));
            }
        }
        Ok(ContractDescriptor {
            name: self.name,
            operations,
        })
    }
}

/// Frozen contract-name-to-descriptor table.
///
/// This is the process-wide operation descriptor cache: entries are computed
/// once at registration, never invalidated or recomputed, and shared by all
/// dispatch instances.
#[derive(Clone, Default)]
pub struct ContractRegistry {
    contracts: IndexMap<String, Arc<ContractDescriptor>>,
}

impl ContractRegistry {
    /// Registers a contract. Later registrations with the same name replace
    /// earlier ones; this only happens during builder configuration.
    pub fn add(&mut self, contract: ContractDescriptor) {
        self.contracts.insert(contract.name.clone(), Arc::new(contract));
    }

    /// Looks up a contract by name.
    pub fn get(&self, name: &str) -> Option<Arc<ContractDescriptor>> {
        self.contracts.get(name).map(Arc::clone)
    }

    /// Whether a contract with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.contracts.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_builder_freezes_operations_in_order() {
        let contract = ContractDescriptor::builder("Order")
            .operation(OperationDescriptor::link("customer", "customer").returns(ReturnShape::contract("Customer")))
            .operation(OperationDescriptor::data("total", "total.amount"))
            .build()
            .expect("valid contract");

        assert_eq!(contract.name(), "Order");
        let names: Vec<&str> = contract.operations().map(|op| op.name.as_str()).collect();
        assert_eq!(names, vec!["customer", "total"]);
        assert!(contract.operation("customer").is_some());
        assert!(contract.operation("missing").is_none());
    }

    #[test]
    fn duplicate_operation_names_are_rejected() {
        let result = ContractDescriptor::builder("Order")
            .operation(OperationDescriptor::data("total", "total.amount"))
            .operation(OperationDescriptor::data("total", "total.currency"))
            .build();

        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn boolean_over_a_relation_is_a_presence_check_classification() {
        let contract = ContractDescriptor::builder("Order")
            .operation(OperationDescriptor::link("has_discount", "discount").returns(ReturnShape::Bool))
            .build()
            .expect("valid contract");

        let descriptor = contract.operation("has_discount").expect("operation");
        assert_eq!(descriptor.return_shape, ReturnShape::Bool);
    }

    #[test]
    fn invalid_shape_combinations_fail_at_build() {
        // A data path cannot produce a wrapped contract.
        let data = ContractDescriptor::builder("Order")
            .operation(OperationDescriptor::data("broken", "x").returns(ReturnShape::contract("X")))
            .build();
        assert!(matches!(data, Err(Error::Configuration { .. })));

        // First-matching-link only ever yields a raw link.
        let first = ContractDescriptor::builder("Order")
            .operation(
                OperationDescriptor::first_link("broken", "search", vec![NameCandidate::Any]).returns(ReturnShape::Bool),
            )
            .build();
        assert!(matches!(first, Err(Error::Configuration { .. })));

        // A link cannot produce a form.
        let link = ContractDescriptor::builder("Order")
            .operation(OperationDescriptor::link("broken", "customer").returns(ReturnShape::Form))
            .build();
        assert!(matches!(link, Err(Error::Configuration { .. })));
    }

    #[test]
    fn registry_lookup_is_by_contract_name() {
        let mut registry = ContractRegistry::default();
        registry.add(ContractDescriptor::builder("Order").build().expect("contract"));

        assert!(registry.contains("Order"));
        assert!(registry.get("Order").is_some());
        assert!(registry.get("Customer").is_none());
    }
}
