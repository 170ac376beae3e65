//! Inbound response model.

use indexmap::IndexMap;

use crate::request::Request;

/// An immutable inbound result produced by a transport.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Header map in arrival order.
    pub headers: IndexMap<String, String>,
    /// Declared content type string, exactly as received.
    pub content_type: Option<String>,
    /// Raw body text.
    pub body: String,
    /// The request that produced this response.
    pub request: Request,
}

impl Response {
    /// Starts building a response for the given originating request.
    pub fn builder(request: Request) -> ResponseBuilder {
        ResponseBuilder {
            status: 200,
            headers: IndexMap::new(),
            content_type: None,
            body: String::new(),
            request,
        }
    }

    /// Whether the status signals success (2xx).
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Looks up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Accumulator used by transports to assemble a [`Response`].
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    status: u16,
    headers: IndexMap<String, String>,
    content_type: Option<String>,
    body: String,
    request: Request,
}

impl ResponseBuilder {
    /// Sets the HTTP status code.
    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Adds a header. A `Content-Type` header also populates the declared
    /// content type unless one was set explicitly.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        if name.eq_ignore_ascii_case("content-type") && self.content_type.is_none() {
            self.content_type = Some(value.clone());
        }
        self.headers.insert(name, value);
        self
    }

    /// Sets the declared content type string.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Sets the raw body text.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Freezes the response.
    pub fn build(self) -> Response {
        Response {
            status: self.status,
            headers: self.headers,
            content_type: self.content_type,
            body: self.body,
            request: self.request,
        }
    }
}
