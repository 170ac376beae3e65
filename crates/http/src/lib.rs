//! Blocking HTTP transport backed by reqwest.
//!
//! [`ReqwestTransport`] serves the `http` and `https` schemes. Connection
//! pooling, TLS, and compression come from the underlying client; the engine
//! only sees the [`Transport`] surface.

use std::time::Duration;

use tracing::debug;
use traverse_engine::Transport;
use traverse_types::{Error, Method, Request, Response, TransportError};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP/HTTPS transport over a shared blocking client.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Builds a transport with a pooled client and a 30 second timeout.
    pub fn new() -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|error| Error::configuration(format!("failed to build HTTP client: {error}")))?;
        Ok(Self { client })
    }

    /// Wraps a preconfigured client, keeping its timeouts, proxies, and TLS
    /// settings.
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn schemes(&self) -> &[&'static str] {
        &["http", "https"]
    }

    fn execute(&self, request: &Request) -> Result<Response, TransportError> {
        debug!(method = %request.method, url = %request.url, "sending HTTP request");

        let mut outgoing = self.client.request(convert_method(request.method), &request.url);
        for (name, value) in &request.headers {
            outgoing = outgoing.header(name, value);
        }
        if let Some(body) = &request.body {
            if let Some(content_type) = &request.content_type {
                outgoing = outgoing.header(reqwest::header::CONTENT_TYPE, content_type.to_string());
            }
            outgoing = outgoing.body(body.clone());
        }

        let incoming = outgoing
            .send()
            .map_err(|error| TransportError::with_source(&request.url, "request failed", error))?;

        let status = incoming.status().as_u16();
        let mut builder = Response::builder(request.clone()).status(status);
        for (name, value) in incoming.headers() {
            if let Ok(text) = value.to_str() {
                builder = builder.header(name.as_str(), text);
            }
        }

        let body = incoming
            .text()
            .map_err(|error| TransportError::with_source(&request.url, "failed to read response body", error))?;

        debug!(url = %request.url, status, "HTTP response received");
        Ok(builder.body(body).build())
    }
}

fn convert_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
        Method::Patch => reqwest::Method::PATCH,
        Method::Head => reqwest::Method::HEAD,
        Method::Options => reqwest::Method::OPTIONS,
    }
}
