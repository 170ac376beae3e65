//! Hypermedia navigation engine.
//!
//! This crate turns declared resource contracts into live API traversal:
//! responses are resolved into format-agnostic [`Resource`]s through a
//! pluggable content pipeline, wrapped as [`Entity`]s under frozen contract
//! descriptors, and navigated by invoking named operations that follow
//! links, submit forms, and extract data. Everything is configured once
//! through [`Processor::builder`] and immutable afterwards.
//!
//! The wire itself is abstracted behind [`Transport`]; see the companion
//! HTTP crate for the default client.

pub mod content;
pub mod descriptor;
pub mod dispatch;
pub mod hal;
pub mod interceptor;
pub mod pipeline;
pub mod processor;
pub mod resource;
pub mod select;
pub mod transport;

pub use content::{ContentRegistry, ContentTypeHandler, FormUrlEncodedHandler, JsonHandler, Purpose};
pub use descriptor::{
    ContractBuilder, ContractDescriptor, ContractRegistry, OperationDescriptor, OperationKind, ParamBinding,
    ReturnShape,
};
pub use dispatch::{Arg, DefaultOperationHandler, Entity, Outcome};
pub use hal::{HalJsonHandler, HalResource};
pub use interceptor::{RequestInterceptor, ResponseInterceptor};
pub use pipeline::{DefaultErrorHandler, ErrorHandler, PipelineStep, ResponsePipeline};
pub use processor::{Processor, ProcessorBuilder};
pub use resource::{NameCandidate, Resource, ResourceBox};
pub use select::{ProfileSelectionStrategy, SelectionStrategy, SimpleSelectionStrategy};
pub use transport::Transport;
