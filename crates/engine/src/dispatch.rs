//! Operation dispatch over wrapped resources.
//!
//! An [`Entity`] pairs a resolved resource with the contract it was requested
//! under plus any additional capabilities subtype selection granted. Invoking
//! an operation looks its frozen descriptor up across the capability
//! contracts in order, then dispatches on the descriptor's kind and declared
//! return shape. Link follows prefer embedded data: a relation resolvable
//! locally produces a wrapped entity without touching the wire.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use traverse_types::{Error, Form, Link, RequestBuilder};

use crate::content::Purpose;
use crate::descriptor::{ContractDescriptor, OperationDescriptor, OperationKind, ParamBinding, ReturnShape};
use crate::processor::Processor;
use crate::resource::Resource;

/// One positional call argument.
#[derive(Clone)]
pub enum Arg {
    /// A plain value, bound per the operation's declared bindings.
    Value(Value),
    /// A wrapped entity; binds as its raw data tree, and participates in
    /// identity comparison.
    Entity(Entity),
}

/// Result of one operation dispatch, shaped by the operation's declared
/// return shape.
#[derive(Debug)]
pub enum Outcome {
    /// A missing link or data path under the null-when-missing policy.
    Null,
    Bool(bool),
    Value(Value),
    Link(Link),
    Links(Vec<Link>),
    Form(Form),
    Entity(Entity),
    Entities(Vec<Entity>),
}

impl Outcome {
    /// The boolean result, if this outcome carries one.
    pub fn into_bool(self) -> Option<bool> {
        match self {
            Outcome::Bool(value) => Some(value),
            _ => None,
        }
    }

    /// The raw value result, if this outcome carries one.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Outcome::Value(value) => Some(value),
            _ => None,
        }
    }

    /// The raw link result, if this outcome carries one.
    pub fn into_link(self) -> Option<Link> {
        match self {
            Outcome::Link(link) => Some(link),
            _ => None,
        }
    }

    /// The wrapped entity result, if this outcome carries one.
    pub fn into_entity(self) -> Option<Entity> {
        match self {
            Outcome::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    /// The wrapped entity list result, if this outcome carries one.
    pub fn into_entities(self) -> Option<Vec<Entity>> {
        match self {
            Outcome::Entities(entities) => Some(entities),
            _ => None,
        }
    }

    /// Whether this is the null outcome.
    pub fn is_null(&self) -> bool {
        matches!(self, Outcome::Null)
    }
}

/// A resolved resource wrapped under a contract, ready for operation
/// dispatch.
///
/// Cheap to clone; the resource, descriptor tables, and processor are all
/// shared.
#[derive(Clone)]
pub struct Entity {
    resource: Arc<dyn Resource>,
    contract: Arc<ContractDescriptor>,
    capabilities: Vec<String>,
    processor: Arc<Processor>,
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("contract", &self.contract.name())
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl Entity {
    pub(crate) fn new(
        resource: Arc<dyn Resource>,
        contract: Arc<ContractDescriptor>,
        capabilities: Vec<String>,
        processor: Arc<Processor>,
    ) -> Self {
        Self {
            resource,
            contract,
            capabilities,
            processor,
        }
    }

    /// The underlying resource.
    pub fn resource(&self) -> &dyn Resource {
        self.resource.as_ref()
    }

    /// The contract this entity was requested under.
    pub fn contract_name(&self) -> &str {
        self.contract.name()
    }

    /// Every capability contract this entity satisfies, requested contract
    /// first.
    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    /// Whether this entity satisfies the named capability contract.
    pub fn satisfies(&self, contract: &str) -> bool {
        self.capabilities.iter().any(|capability| capability == contract)
    }

    /// Invokes a contract operation by name with positional arguments.
    ///
    /// The operation is looked up across capability contracts in order; the
    /// first contract declaring it wins.
    pub fn invoke(&self, operation: &str, args: &[Arg]) -> Result<Outcome, Error> {
        let descriptor = self.find_operation(operation)?;
        debug!(contract = %self.contract.name(), operation = %operation, kind = ?descriptor.kind, "dispatching operation");

        match &descriptor.kind {
            OperationKind::Equals => Ok(Outcome::Bool(match args.first() {
                Some(Arg::Entity(other)) => self.resource.raw() == other.resource.raw(),
                _ => false,
            })),
            OperationKind::PassThrough => Ok(Outcome::Value(self.resource.raw())),
            OperationKind::Data { path } => match self.resource.data(path) {
                Some(value) => Ok(Outcome::Value(value)),
                None if descriptor.null_when_missing => Ok(Outcome::Null),
                None => Err(Error::MissingData { path: path.clone() }),
            },
            OperationKind::Link { rel } => self.dispatch_link(rel, &descriptor, args),
            OperationKind::NamedLink { rel, name } => self.dispatch_named_link(rel, name.as_deref(), &descriptor, args),
            OperationKind::FirstLink { rel, candidates } => {
                Ok(Outcome::Link(self.resource.first_link(rel, candidates)?))
            }
            OperationKind::Form { name } => self.dispatch_form(name, &descriptor, args),
            OperationKind::Default => self.processor.default_handler().invoke(self, &descriptor, args),
        }
    }

    fn find_operation(&self, operation: &str) -> Result<OperationDescriptor, Error> {
        for capability in &self.capabilities {
            if let Some(contract) = self.processor.contract(capability) {
                if let Some(descriptor) = contract.operation(operation) {
                    return Ok(descriptor.clone());
                }
            }
        }
        Err(Error::NoMatchingOperation {
            contract: self.contract.name().to_string(),
            operation: operation.to_string(),
        })
    }

    fn dispatch_link(&self, rel: &str, descriptor: &OperationDescriptor, args: &[Arg]) -> Result<Outcome, Error> {
        match &descriptor.return_shape {
            ReturnShape::Bool => Ok(Outcome::Bool(self.resource.has_link(rel))),
            ReturnShape::Link => {
                if !self.resource.has_link(rel) && descriptor.null_when_missing {
                    return Ok(Outcome::Null);
                }
                Ok(Outcome::Link(self.resource.link(rel)?))
            }
            ReturnShape::LinkList => {
                let links = self.resource.links(rel);
                if links.is_empty() && descriptor.null_when_missing {
                    return Ok(Outcome::Null);
                }
                Ok(Outcome::Links(links))
            }
            ReturnShape::Contract(target) => self.follow_single(rel, target, descriptor, args),
            ReturnShape::ContractList(target) => self.follow_all(rel, target, descriptor),
            shape => Err(dispatch_fault(descriptor, format!("return shape {shape:?} reached link dispatch"))),
        }
    }

    /// Follows a relation to a single wrapped entity.
    ///
    /// Embedded data wins: a locally resolvable single-valued relation never
    /// touches the wire. A multi-valued relation cannot be followed as a
    /// single resource.
    fn follow_single(
        &self,
        rel: &str,
        target: &str,
        descriptor: &OperationDescriptor,
        args: &[Arg],
    ) -> Result<Outcome, Error> {
        if self.resource.is_multi_link(rel) {
            return Err(Error::UnsupportedMultiLinkFollow { rel: rel.to_string() });
        }

        if self.resource.can_resolve_local(rel) {
            debug!(rel = %rel, "resolving relation from embedded data");
            let resource = self.resource.resolve_local(rel)?;
            return Ok(Outcome::Entity(self.processor.wrap(target, Arc::from(resource))?));
        }

        if !self.resource.has_link(rel) {
            return if descriptor.null_when_missing {
                Ok(Outcome::Null)
            } else {
                Err(Error::MissingRequiredLink {
                    rel: rel.to_string(),
                    name: None,
                })
            };
        }

        let link = self.resource.link(rel)?;
        let mut builder = link.to_request_builder();
        self.prepare_follow(&mut builder, descriptor, args)?;
        Ok(Outcome::Entity(self.processor.fetch(target, builder)?))
    }

    /// Resolves every embedded target of a relation into wrapped entities.
    ///
    /// Bulk follows only work over embedded data; issuing one request per
    /// link is out of scope, so a link-only multi-valued relation fails.
    fn follow_all(&self, rel: &str, target: &str, descriptor: &OperationDescriptor) -> Result<Outcome, Error> {
        if self.resource.can_resolve_local(rel) {
            let resources = self.resource.resolve_all_local(rel)?;
            let mut entities = Vec::with_capacity(resources.len());
            for resource in resources {
                entities.push(self.processor.wrap(target, Arc::from(resource))?);
            }
            return Ok(Outcome::Entities(entities));
        }

        if self.resource.has_link(rel) {
            return Err(Error::UnsupportedMultiLinkFollow { rel: rel.to_string() });
        }

        if descriptor.null_when_missing {
            Ok(Outcome::Entities(Vec::new()))
        } else {
            Err(Error::MissingRequiredLink {
                rel: rel.to_string(),
                name: None,
            })
        }
    }

    fn dispatch_named_link(
        &self,
        rel: &str,
        name: Option<&str>,
        descriptor: &OperationDescriptor,
        args: &[Arg],
    ) -> Result<Outcome, Error> {
        match &descriptor.return_shape {
            ReturnShape::Bool => Ok(Outcome::Bool(self.resource.has_named_link(rel, name))),
            ReturnShape::Link => {
                if !self.resource.has_named_link(rel, name) && descriptor.null_when_missing {
                    return Ok(Outcome::Null);
                }
                Ok(Outcome::Link(self.resource.named_link(rel, name)?))
            }
            ReturnShape::LinkList => {
                let links: Vec<Link> = self
                    .resource
                    .links(rel)
                    .into_iter()
                    .filter(|link| link.name.as_deref() == name)
                    .collect();
                if links.is_empty() && descriptor.null_when_missing {
                    return Ok(Outcome::Null);
                }
                Ok(Outcome::Links(links))
            }
            ReturnShape::Contract(target) => {
                if !self.resource.has_named_link(rel, name) && descriptor.null_when_missing {
                    return Ok(Outcome::Null);
                }
                let link = self.resource.named_link(rel, name)?;
                let mut builder = link.to_request_builder();
                self.prepare_follow(&mut builder, descriptor, args)?;
                Ok(Outcome::Entity(self.processor.fetch(target, builder)?))
            }
            shape => Err(dispatch_fault(
                descriptor,
                format!("return shape {shape:?} reached named-link dispatch"),
            )),
        }
    }

    fn dispatch_form(&self, name: &str, descriptor: &OperationDescriptor, args: &[Arg]) -> Result<Outcome, Error> {
        match &descriptor.return_shape {
            ReturnShape::Bool => Ok(Outcome::Bool(self.resource.has_form(name))),
            ReturnShape::Form => Ok(Outcome::Form(self.resource.form(name)?)),
            ReturnShape::Contract(target) => {
                let form = self.resource.form(name)?;
                let mut builder = form.to_request_builder();
                if let Some(method) = descriptor.method_override {
                    builder.set_method(method);
                }
                self.apply_bindings(&mut builder, descriptor, args)?;
                Ok(Outcome::Entity(self.processor.fetch(target, builder)?))
            }
            shape => Err(dispatch_fault(descriptor, format!("return shape {shape:?} reached form dispatch"))),
        }
    }

    /// Applies the per-operation method override and argument bindings to a
    /// link-follow request. Link follows default to a safe GET.
    fn prepare_follow(
        &self,
        builder: &mut RequestBuilder,
        descriptor: &OperationDescriptor,
        args: &[Arg],
    ) -> Result<(), Error> {
        if let Some(method) = descriptor.method_override {
            builder.set_method(method);
        }
        self.apply_bindings(builder, descriptor, args)
    }

    /// Binds positional arguments per the descriptor's declared bindings:
    /// template/query parameter, header, or encoded request content.
    fn apply_bindings(
        &self,
        builder: &mut RequestBuilder,
        descriptor: &OperationDescriptor,
        args: &[Arg],
    ) -> Result<(), Error> {
        if descriptor.bindings.len() != args.len() {
            return Err(dispatch_fault(
                descriptor,
                format!(
                    "expected {} arguments, got {} for request to {}",
                    descriptor.bindings.len(),
                    args.len(),
                    builder.url_template()
                ),
            ));
        }

        for (binding, arg) in descriptor.bindings.iter().zip(args) {
            let value = match arg {
                Arg::Value(value) => value.clone(),
                Arg::Entity(entity) => entity.resource.raw(),
            };
            match binding {
                ParamBinding::Param(name) => builder.set_param(name, value),
                ParamBinding::Header(name) => {
                    let text = match value {
                        Value::String(text) => text,
                        other => other.to_string(),
                    };
                    builder.set_header(name, text);
                }
                ParamBinding::Content(content_type) => {
                    let handler = self
                        .processor
                        .content_registry()
                        .handler_for(content_type, Purpose::PrepareRequest)
                        .ok_or_else(|| Error::ContentEncodeUnsupported {
                            content_type: content_type.essence(),
                        })?;
                    handler.prepare_request(builder, &value)?;
                }
            }
        }
        Ok(())
    }
}

/// Identity: two entities are equal when their underlying data trees are.
impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.resource.raw() == other.resource.raw()
    }
}

/// Handles operations classified as fallbacks, outside the built-in kinds.
pub trait DefaultOperationHandler: Send + Sync {
    /// Invoked with the entity, the frozen descriptor, and the call
    /// arguments; produces whatever outcome the descriptor's shape declares.
    fn invoke(&self, entity: &Entity, descriptor: &OperationDescriptor, args: &[Arg]) -> Result<Outcome, Error>;
}

fn dispatch_fault(descriptor: &OperationDescriptor, detail: String) -> Error {
    Error::Dispatch {
        operation: descriptor.name.clone(),
        detail,
        source: None,
    }
}
