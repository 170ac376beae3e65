//! Response resolution pipeline.
//!
//! Takes a raw [`Response`] and produces a [`ResourceBox`] through three
//! stages, each with a pluggable failure hook:
//!
//! 1. content-type resolution — unparseable/absent content type or no
//!    registered parser routes to [`ErrorHandler::unhandled_content_type`];
//! 2. body parsing — a parser failure routes to
//!    [`ErrorHandler::content_parse_error`];
//! 3. status validation — a non-success status routes to
//!    [`ErrorHandler::not_ok_response`] with the parsed resource attached,
//!    since servers often return structured error bodies in the success
//!    format.
//!
//! Whatever an error handler returns becomes the resolved resource, letting
//! callers recover with a placeholder instead of aborting. Extension steps
//! registered at setup time then transform or replace the resolved resource
//! before the terminal result.

use std::sync::Arc;

use tracing::{debug, warn};
use traverse_types::{ContentType, Error, Request, Response};

use crate::content::{ContentRegistry, Purpose};
use crate::resource::ResourceBox;

/// Recovery hooks for the three pipeline failure points.
///
/// Each hook either substitutes a resource (recovery) or raises a terminal
/// failure that propagates to the caller.
pub trait ErrorHandler: Send + Sync {
    /// Response content type missing, unparseable, or without a registered
    /// parser.
    fn unhandled_content_type(
        &self,
        request: &Request,
        response: &Response,
        registry: &ContentRegistry,
        expected_contract: &str,
    ) -> Result<ResourceBox, Error>;

    /// A registered parser raised while parsing the body. The original cause
    /// is preserved.
    fn content_parse_error(
        &self,
        request: &Request,
        response: &Response,
        registry: &ContentRegistry,
        expected_contract: &str,
        cause: Error,
    ) -> Result<ResourceBox, Error>;

    /// The response parsed successfully but carries a failure status. The
    /// parsed resource is made available for structured error bodies.
    fn not_ok_response(
        &self,
        request: &Request,
        response: &Response,
        registry: &ContentRegistry,
        expected_contract: &str,
        parsed: ResourceBox,
    ) -> Result<ResourceBox, Error>;
}

/// Default hooks: every failure point raises its corresponding error kind.
pub struct DefaultErrorHandler;

impl ErrorHandler for DefaultErrorHandler {
    fn unhandled_content_type(
        &self,
        _request: &Request,
        response: &Response,
        _registry: &ContentRegistry,
        _expected_contract: &str,
    ) -> Result<ResourceBox, Error> {
        Err(Error::UnhandledContentType {
            url: response.request.url.clone(),
            content_type: response.content_type.clone(),
        })
    }

    fn content_parse_error(
        &self,
        _request: &Request,
        _response: &Response,
        _registry: &ContentRegistry,
        _expected_contract: &str,
        cause: Error,
    ) -> Result<ResourceBox, Error> {
        // The cause is already a typed kind; never re-wrap it.
        Err(cause)
    }

    fn not_ok_response(
        &self,
        _request: &Request,
        response: &Response,
        _registry: &ContentRegistry,
        _expected_contract: &str,
        _parsed: ResourceBox,
    ) -> Result<ResourceBox, Error> {
        Err(Error::NotOkResponse {
            url: response.request.url.clone(),
            status: response.status,
        })
    }
}

/// One extension unit of the response-to-resource sequence.
pub trait PipelineStep: Send + Sync {
    /// Transforms or replaces the partially-resolved resource.
    fn apply(&self, resource: ResourceBox, response: &Response) -> Result<ResourceBox, Error>;
}

/// The frozen pipeline: registry, error hooks, and extension steps are fixed
/// at processor build time and shared read-only across navigation calls.
pub struct ResponsePipeline {
    registry: Arc<ContentRegistry>,
    error_handler: Arc<dyn ErrorHandler>,
    steps: Vec<Arc<dyn PipelineStep>>,
}

impl ResponsePipeline {
    pub fn new(registry: Arc<ContentRegistry>, error_handler: Arc<dyn ErrorHandler>, steps: Vec<Arc<dyn PipelineStep>>) -> Self {
        Self {
            registry,
            error_handler,
            steps,
        }
    }

    /// Resolves a response into a resource, then applies extension steps in
    /// registration order.
    pub fn resolve(&self, response: &Response, expected_contract: &str) -> Result<ResourceBox, Error> {
        let mut resource = self.build_resource(response, expected_contract)?;
        for step in &self.steps {
            resource = step.apply(resource, response)?;
        }
        Ok(resource)
    }

    fn build_resource(&self, response: &Response, expected_contract: &str) -> Result<ResourceBox, Error> {
        let request = &response.request;

        // Stage 1: do we understand the declared content type?
        let content_type = match &response.content_type {
            None => {
                warn!(url = %request.url, "response carries no content type; invoking unhandled_content_type");
                return self
                    .error_handler
                    .unhandled_content_type(request, response, &self.registry, expected_contract);
            }
            Some(raw) => match raw.parse::<ContentType>() {
                Ok(content_type) => content_type,
                Err(error) => {
                    warn!(url = %request.url, content_type = %raw, error = %error, "unparseable response content type; invoking unhandled_content_type");
                    return self
                        .error_handler
                        .unhandled_content_type(request, response, &self.registry, expected_contract);
                }
            },
        };

        let Some(handler) = self.registry.handler_for(&content_type, Purpose::ParseResponse) else {
            debug!(url = %request.url, content_type = %content_type, "no parser registered; invoking unhandled_content_type");
            return self
                .error_handler
                .unhandled_content_type(request, response, &self.registry, expected_contract);
        };

        // Stage 2: parse the body.
        let resource = match handler.parse_response(response) {
            Ok(resource) => resource,
            Err(cause) => {
                warn!(url = %request.url, content_type = %content_type, error = %cause, "body parse failed; invoking content_parse_error");
                return self
                    .error_handler
                    .content_parse_error(request, response, &self.registry, expected_contract, cause);
            }
        };

        // Stage 3: the body parsed, but is the status a success?
        if !response.is_ok() {
            debug!(url = %request.url, status = response.status, "non-success status; invoking not_ok_response");
            return self
                .error_handler
                .not_ok_response(request, response, &self.registry, expected_contract, resource);
        }

        Ok(resource)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::hal::{HalJsonHandler, HalResource};
    use serde_json::json;
    use traverse_types::RequestBuilder;

    /// Records which hook fired and substitutes an empty resource.
    #[derive(Default)]
    struct RecordingHandler {
        calls: Mutex<Vec<&'static str>>,
    }

    impl RecordingHandler {
        fn substitute() -> ResourceBox {
            Box::new(HalResource::new(json!({"placeholder": true}), "about:blank"))
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ErrorHandler for RecordingHandler {
        fn unhandled_content_type(
            &self,
            _request: &Request,
            _response: &Response,
            _registry: &ContentRegistry,
            _expected_contract: &str,
        ) -> Result<ResourceBox, Error> {
            self.calls.lock().unwrap().push("unhandled_content_type");
            Ok(Self::substitute())
        }

        fn content_parse_error(
            &self,
            _request: &Request,
            _response: &Response,
            _registry: &ContentRegistry,
            _expected_contract: &str,
            _cause: Error,
        ) -> Result<ResourceBox, Error> {
            self.calls.lock().unwrap().push("content_parse_error");
            Ok(Self::substitute())
        }

        fn not_ok_response(
            &self,
            _request: &Request,
            _response: &Response,
            _registry: &ContentRegistry,
            _expected_contract: &str,
            parsed: ResourceBox,
        ) -> Result<ResourceBox, Error> {
            self.calls.lock().unwrap().push("not_ok_response");
            // Pass the parsed error body through so callers can inspect it.
            Ok(parsed)
        }
    }

    fn response(content_type: Option<&str>, body: &str, status: u16) -> Response {
        let request = RequestBuilder::get("http://api/orders/7").build().expect("built");
        let mut builder = Response::builder(request).status(status).body(body);
        if let Some(content_type) = content_type {
            builder = builder.content_type(content_type);
        }
        builder.build()
    }

    fn pipeline(handler: Arc<RecordingHandler>) -> ResponsePipeline {
        let mut registry = ContentRegistry::default();
        registry.add(Arc::new(HalJsonHandler));
        ResponsePipeline::new(Arc::new(registry), handler, Vec::new())
    }

    #[test]
    fn unregistered_content_type_reaches_only_the_unhandled_hook() {
        let handler = Arc::new(RecordingHandler::default());
        let pipeline = pipeline(Arc::clone(&handler));

        let resolved = pipeline
            .resolve(&response(Some("application/xml"), "<order/>", 200), "Order")
            .expect("substituted resource");

        assert_eq!(handler.calls(), vec!["unhandled_content_type"]);
        assert_eq!(resolved.data("placeholder"), Some(json!(true)));
    }

    #[test]
    fn missing_content_type_reaches_the_unhandled_hook() {
        let handler = Arc::new(RecordingHandler::default());
        let pipeline = pipeline(Arc::clone(&handler));

        pipeline.resolve(&response(None, "{}", 200), "Order").expect("substituted");
        assert_eq!(handler.calls(), vec!["unhandled_content_type"]);
    }

    #[test]
    fn garbage_content_type_reaches_the_unhandled_hook() {
        let handler = Arc::new(RecordingHandler::default());
        let pipeline = pipeline(Arc::clone(&handler));

        pipeline
            .resolve(&response(Some("not a media type"), "{}", 200), "Order")
            .expect("substituted");
        assert_eq!(handler.calls(), vec!["unhandled_content_type"]);
    }

    #[test]
    fn malformed_body_reaches_only_the_parse_hook() {
        let handler = Arc::new(RecordingHandler::default());
        let pipeline = pipeline(Arc::clone(&handler));

        pipeline
            .resolve(&response(Some("application/hal+json"), "{broken", 200), "Order")
            .expect("substituted");
        assert_eq!(handler.calls(), vec!["content_parse_error"]);
    }

    #[test]
    fn failure_status_reaches_not_ok_with_the_parsed_resource() {
        let handler = Arc::new(RecordingHandler::default());
        let pipeline = pipeline(Arc::clone(&handler));

        let resolved = pipeline
            .resolve(
                &response(Some("application/hal+json"), r#"{"error":"order not found"}"#, 404),
                "Order",
            )
            .expect("substituted");

        assert_eq!(handler.calls(), vec!["not_ok_response"]);
        assert_eq!(resolved.data("error"), Some(json!("order not found")));
    }

    #[test]
    fn fully_successful_response_touches_no_hook() {
        let handler = Arc::new(RecordingHandler::default());
        let pipeline = pipeline(Arc::clone(&handler));

        let resolved = pipeline
            .resolve(&response(Some("application/hal+json"), r#"{"id": 7}"#, 200), "Order")
            .expect("resolved");

        assert!(handler.calls().is_empty());
        assert_eq!(resolved.data("id"), Some(json!(7)));
    }

    #[test]
    fn default_error_handler_raises_typed_kinds() {
        let mut registry = ContentRegistry::default();
        registry.add(Arc::new(HalJsonHandler));
        let pipeline = ResponsePipeline::new(Arc::new(registry), Arc::new(DefaultErrorHandler), Vec::new());

        let unhandled = pipeline.resolve(&response(Some("application/xml"), "", 200), "Order");
        assert!(matches!(unhandled, Err(Error::UnhandledContentType { .. })));

        let parse = pipeline.resolve(&response(Some("application/hal+json"), "{broken", 200), "Order");
        assert!(matches!(parse, Err(Error::ContentParseError { .. })));

        let not_ok = pipeline.resolve(&response(Some("application/hal+json"), "{}", 500), "Order");
        assert!(matches!(not_ok, Err(Error::NotOkResponse { status: 500, .. })));
    }

    #[test]
    fn extension_steps_run_in_registration_order_on_the_resolved_resource() {
        struct Tag(&'static str);

        impl PipelineStep for Tag {
            fn apply(&self, resource: ResourceBox, _response: &Response) -> Result<ResourceBox, Error> {
                let mut root = resource.raw();
                let tags = root
                    .as_object_mut()
                    .and_then(|map| map.get_mut("tags"))
                    .and_then(|tags| tags.as_array_mut());
                match tags {
                    Some(tags) => tags.push(json!(self.0)),
                    None => {
                        root.as_object_mut().unwrap().insert("tags".into(), json!([self.0]));
                    }
                }
                Ok(Box::new(HalResource::new(root, "about:blank")))
            }
        }

        let mut registry = ContentRegistry::default();
        registry.add(Arc::new(HalJsonHandler));
        let pipeline = ResponsePipeline::new(
            Arc::new(registry),
            Arc::new(DefaultErrorHandler),
            vec![Arc::new(Tag("first")), Arc::new(Tag("second"))],
        );

        let resolved = pipeline
            .resolve(&response(Some("application/hal+json"), "{}", 200), "Order")
            .expect("resolved");
        assert_eq!(resolved.data("tags"), Some(json!(["first", "second"])));
    }
}
