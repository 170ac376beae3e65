//! Content type handlers and the negotiation registry.
//!
//! The registry maps media types to pluggable parse/encode capabilities. It
//! is assembled by the processor builder and frozen before any request is
//! processed; lookups are pure reads over an immutable table, so it is safe
//! to share across concurrently executing navigation calls.

use std::sync::Arc;

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;
use tracing::debug;
use traverse_types::{ContentType, Error, RequestBuilder, Response};

use crate::hal::HalResource;
use crate::resource::ResourceBox;

/// What a handler is being selected for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    /// Parsing an inbound response body into a resource.
    ParseResponse,
    /// Encoding outbound request content.
    PrepareRequest,
}

/// Parse/encode capability for one media type.
///
/// Parsing and encoding availability are independent: a handler may offer
/// either or both, and the registry only selects it for purposes it declares.
pub trait ContentTypeHandler: Send + Sync {
    /// The media type this handler registers under by default.
    fn default_content_type(&self) -> ContentType;

    /// Parses a response body into a resource. Raises on malformed bodies.
    fn parse_response(&self, response: &Response) -> Result<ResourceBox, Error>;

    /// Whether this handler can parse responses.
    fn can_parse_response(&self) -> bool;

    /// Encodes content onto an outbound request builder.
    fn prepare_request(&self, builder: &mut RequestBuilder, content: &Value) -> Result<(), Error>;

    /// Whether this handler can encode request content.
    fn can_prepare_request(&self) -> bool;
}

/// Immutable media-type-to-handler table with quality-weighted negotiation.
#[derive(Clone, Default)]
pub struct ContentRegistry {
    entries: Vec<(ContentType, Arc<dyn ContentTypeHandler>)>,
}

impl ContentRegistry {
    /// Registers a handler under its default content type.
    pub fn add(&mut self, handler: Arc<dyn ContentTypeHandler>) {
        let content_type = handler.default_content_type();
        self.add_for(handler, content_type);
    }

    /// Registers a handler under an explicit content type, typically to carry
    /// a non-default quality weight.
    pub fn add_for(&mut self, handler: Arc<dyn ContentTypeHandler>, content_type: ContentType) {
        debug!(content_type = %content_type, "registering content type handler");
        self.entries.retain(|(registered, _)| !registered.matches(&content_type));
        self.entries.push((content_type, handler));
    }

    /// The handler registered for an exact type/subtype match that offers the
    /// given purpose. Never a partial or wildcard match.
    pub fn handler_for(&self, content_type: &ContentType, purpose: Purpose) -> Option<Arc<dyn ContentTypeHandler>> {
        self.entries
            .iter()
            .find(|(registered, handler)| registered.matches(content_type) && offers(handler.as_ref(), purpose))
            .map(|(_, handler)| Arc::clone(handler))
    }

    /// Whether any registered handler serves the content type for the purpose.
    pub fn can_handle(&self, content_type: &ContentType, purpose: Purpose) -> bool {
        self.handler_for(content_type, purpose).is_some()
    }

    /// Quality-weighted list of registered content types for outbound
    /// `Accept`-style negotiation, in registration order.
    pub fn negotiation_header_value(&self, purpose: Purpose) -> String {
        self.entries
            .iter()
            .filter(|(_, handler)| offers(handler.as_ref(), purpose))
            .map(|(content_type, _)| content_type.to_string())
            .collect::<Vec<String>>()
            .join(", ")
    }
}

fn offers(handler: &dyn ContentTypeHandler, purpose: Purpose) -> bool {
    match purpose {
        Purpose::ParseResponse => handler.can_parse_response(),
        Purpose::PrepareRequest => handler.can_prepare_request(),
    }
}

/// Plain JSON handler: parses bodies into [`HalResource`] trees (a JSON
/// document without hypermedia controls is just a resource with no links)
/// and encodes request content as a JSON body.
pub struct JsonHandler;

impl ContentTypeHandler for JsonHandler {
    fn default_content_type(&self) -> ContentType {
        ContentType::new("application", "json")
    }

    fn parse_response(&self, response: &Response) -> Result<ResourceBox, Error> {
        HalResource::parse(&response.body, &response.request.url)
            .map(|resource| Box::new(resource) as ResourceBox)
            .map_err(|cause| Error::ContentParseError {
                url: response.request.url.clone(),
                content_type: self.default_content_type().essence(),
                cause: Box::new(cause),
            })
    }

    fn can_parse_response(&self) -> bool {
        true
    }

    fn prepare_request(&self, builder: &mut RequestBuilder, content: &Value) -> Result<(), Error> {
        builder.set_body(content.to_string(), self.default_content_type());
        Ok(())
    }

    fn can_prepare_request(&self) -> bool {
        true
    }
}

/// Form-urlencoded handler: encode-only.
///
/// Object content is flattened into percent-encoded `key=value` pairs; any
/// other content shape is a configuration fault of the calling operation.
pub struct FormUrlEncodedHandler;

impl ContentTypeHandler for FormUrlEncodedHandler {
    fn default_content_type(&self) -> ContentType {
        ContentType::new("application", "x-www-form-urlencoded")
    }

    fn parse_response(&self, response: &Response) -> Result<ResourceBox, Error> {
        Err(Error::UnhandledContentType {
            url: response.request.url.clone(),
            content_type: response.content_type.clone(),
        })
    }

    fn can_parse_response(&self) -> bool {
        false
    }

    fn prepare_request(&self, builder: &mut RequestBuilder, content: &Value) -> Result<(), Error> {
        let Value::Object(map) = content else {
            return Err(Error::configuration(
                "form-urlencoded content must be an object of field values",
            ));
        };

        let body = map
            .iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                format!(
                    "{}={}",
                    utf8_percent_encode(key, NON_ALPHANUMERIC),
                    utf8_percent_encode(&text, NON_ALPHANUMERIC)
                )
            })
            .collect::<Vec<String>>()
            .join("&");

        builder.set_body(body, self.default_content_type());
        Ok(())
    }

    fn can_prepare_request(&self) -> bool {
        true
    }
}
