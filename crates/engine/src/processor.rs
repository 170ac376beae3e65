//! The navigation processor.
//!
//! A [`Processor`] owns every frozen collaborator a navigation call needs:
//! the content registry, the contract registry, the response pipeline, the
//! subtype selection strategy, the interceptor chains, and the scheme-keyed
//! transport table. It is assembled once through [`ProcessorBuilder`] and
//! shared behind an [`Arc`]; all configuration happens before the first
//! request and nothing is mutable afterwards, so concurrent navigation calls
//! share it freely.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;
use traverse_types::{ContentType, Error, RequestBuilder};

use crate::content::{ContentRegistry, ContentTypeHandler, Purpose};
use crate::descriptor::{ContractDescriptor, ContractRegistry, OperationDescriptor};
use crate::dispatch::{Arg, DefaultOperationHandler, Entity, Outcome};
use crate::interceptor::{RequestInterceptor, RequestInterceptors, ResponseInterceptor, ResponseInterceptors};
use crate::pipeline::{DefaultErrorHandler, ErrorHandler, PipelineStep, ResponsePipeline};
use crate::resource::Resource;
use crate::select::{SelectionStrategy, SimpleSelectionStrategy};
use crate::transport::Transport;

const ACCEPT_HEADER: &str = "Accept";

/// Frozen orchestrator for hypermedia navigation.
pub struct Processor {
    content_registry: Arc<ContentRegistry>,
    contracts: ContractRegistry,
    pipeline: ResponsePipeline,
    selection: Arc<dyn SelectionStrategy>,
    default_handler: Arc<dyn DefaultOperationHandler>,
    request_interceptors: RequestInterceptors,
    response_interceptors: ResponseInterceptors,
    transports: IndexMap<String, Arc<dyn Transport>>,
}

impl Processor {
    /// Starts assembling a processor.
    pub fn builder() -> ProcessorBuilder {
        ProcessorBuilder::default()
    }

    /// Fetches the entry point of an API: a plain GET against `url`, resolved
    /// and wrapped under the given contract.
    pub fn fetch_url(self: &Arc<Self>, contract: &str, url: &str) -> Result<Entity, Error> {
        self.fetch(contract, RequestBuilder::get(url))
    }

    /// Executes a prepared request and resolves the response into an entity
    /// satisfying the given contract.
    ///
    /// Request interceptors run first, then content negotiation fills the
    /// `Accept` header unless an interceptor or caller already set one. The
    /// transport is selected by URL scheme; an unregistered scheme is a
    /// configuration fault.
    pub fn fetch(self: &Arc<Self>, contract: &str, mut builder: RequestBuilder) -> Result<Entity, Error> {
        self.request_interceptors.intercept(&mut builder);

        if !builder.has_header(ACCEPT_HEADER) {
            let negotiated = self.content_registry.negotiation_header_value(Purpose::ParseResponse);
            if !negotiated.is_empty() {
                builder.set_header(ACCEPT_HEADER, negotiated);
            }
        }

        let request = builder.build()?;
        let scheme = request.scheme()?;
        let transport = self
            .transports
            .get(&scheme)
            .ok_or_else(|| Error::configuration(format!("no transport registered for scheme '{scheme}'")))?;

        debug!(method = %request.method, url = %request.url, contract = %contract, "executing request");
        let response = transport.execute(&request)?;
        debug!(url = %request.url, status = response.status, "response received");

        self.response_interceptors.intercept(&response);

        let resource = self.pipeline.resolve(&response, contract)?;
        self.wrap(contract, Arc::from(resource))
    }

    /// Wraps an already-resolved resource as an entity satisfying the given
    /// contract, running subtype selection. No request is issued.
    pub fn wrap(self: &Arc<Self>, contract: &str, resource: Arc<dyn Resource>) -> Result<Entity, Error> {
        let descriptor = self
            .contracts
            .get(contract)
            .ok_or_else(|| Error::configuration(format!("contract '{contract}' is not registered")))?;
        let capabilities = self.selection.select(contract, resource.as_ref());
        Ok(Entity::new(resource, descriptor, capabilities, Arc::clone(self)))
    }

    pub(crate) fn contract(&self, name: &str) -> Option<Arc<ContractDescriptor>> {
        self.contracts.get(name)
    }

    pub(crate) fn content_registry(&self) -> &ContentRegistry {
        &self.content_registry
    }

    pub(crate) fn default_handler(&self) -> &dyn DefaultOperationHandler {
        self.default_handler.as_ref()
    }
}

/// Fallback used when no default-operation handler is configured: any
/// operation classified as a fallback fails with a configuration fault.
struct NoDefaultOperations;

impl DefaultOperationHandler for NoDefaultOperations {
    fn invoke(&self, _entity: &Entity, descriptor: &OperationDescriptor, _args: &[Arg]) -> Result<Outcome, Error> {
        Err(Error::configuration(format!(
            "operation [{}] requires a default operation handler, but none is configured",
            descriptor.name
        )))
    }
}

/// Accumulates processor configuration and freezes it at build.
#[derive(Default)]
pub struct ProcessorBuilder {
    content_registry: ContentRegistry,
    contracts: ContractRegistry,
    steps: Vec<Arc<dyn PipelineStep>>,
    error_handler: Option<Arc<dyn ErrorHandler>>,
    selection: Option<Arc<dyn SelectionStrategy>>,
    default_handler: Option<Arc<dyn DefaultOperationHandler>>,
    request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
    response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
    transports: IndexMap<String, Arc<dyn Transport>>,
}

impl ProcessorBuilder {
    /// Registers a content type handler under its default media type.
    pub fn content_type_handler(mut self, handler: Arc<dyn ContentTypeHandler>) -> Self {
        self.content_registry.add(handler);
        self
    }

    /// Registers a content type handler under an explicit media type.
    pub fn content_type_handler_for(mut self, handler: Arc<dyn ContentTypeHandler>, content_type: ContentType) -> Self {
        self.content_registry.add_for(handler, content_type);
        self
    }

    /// Registers a content type handler under its default media type with a
    /// quality weight for negotiation.
    pub fn content_type_handler_with_quality(self, handler: Arc<dyn ContentTypeHandler>, quality: f32) -> Self {
        let content_type = handler.default_content_type().with_quality(quality);
        self.content_type_handler_for(handler, content_type)
    }

    /// Registers a contract. Later registrations with the same name replace
    /// earlier ones.
    pub fn contract(mut self, contract: ContractDescriptor) -> Self {
        self.contracts.add(contract);
        self
    }

    /// Appends a response pipeline extension step.
    pub fn pipeline_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Replaces the pipeline error handler.
    pub fn error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// Replaces the subtype selection strategy.
    pub fn selection_strategy(mut self, strategy: Arc<dyn SelectionStrategy>) -> Self {
        self.selection = Some(strategy);
        self
    }

    /// Installs the handler for operations classified as fallbacks.
    pub fn default_operation_handler(mut self, handler: Arc<dyn DefaultOperationHandler>) -> Self {
        self.default_handler = Some(handler);
        self
    }

    /// Appends a request interceptor. Interceptors run in registration order.
    pub fn request_interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.request_interceptors.push(interceptor);
        self
    }

    /// Appends a response interceptor. Interceptors run in registration order.
    pub fn response_interceptor(mut self, interceptor: Arc<dyn ResponseInterceptor>) -> Self {
        self.response_interceptors.push(interceptor);
        self
    }

    /// Registers a transport for every scheme it declares. Later
    /// registrations take over schemes already claimed.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        for scheme in transport.schemes() {
            self.transports.insert((*scheme).to_string(), Arc::clone(&transport));
        }
        self
    }

    /// Validates the configuration and freezes the processor.
    ///
    /// At least one transport is required; everything else has a working
    /// default.
    pub fn build(self) -> Result<Arc<Processor>, Error> {
        if self.transports.is_empty() {
            return Err(Error::configuration("at least one transport must be registered"));
        }

        let content_registry = Arc::new(self.content_registry);
        let error_handler = self.error_handler.unwrap_or_else(|| Arc::new(DefaultErrorHandler));
        let pipeline = ResponsePipeline::new(Arc::clone(&content_registry), error_handler, self.steps);

        Ok(Arc::new(Processor {
            content_registry,
            contracts: self.contracts,
            pipeline,
            selection: self.selection.unwrap_or_else(|| Arc::new(SimpleSelectionStrategy)),
            default_handler: self.default_handler.unwrap_or_else(|| Arc::new(NoDefaultOperations)),
            request_interceptors: RequestInterceptors::new(self.request_interceptors),
            response_interceptors: ResponseInterceptors::new(self.response_interceptors),
            transports: self.transports,
        }))
    }
}
