//! Outbound request model.
//!
//! A [`RequestBuilder`] accumulates a URL template, parameters, headers, and
//! an optional body; [`RequestBuilder::build`] expands the template the same
//! way JSON hyper-schema URI templating does (`{key}` placeholders) and
//! appends any unconsumed parameters as query pairs. The resulting
//! [`Request`] is immutable.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;

use crate::content_type::ContentType;
use crate::error::Error;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// Safe read, the default for link traversal.
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl Method {
    /// Canonical upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            other => Err(Error::configuration(format!("unsupported HTTP method '{other}'"))),
        }
    }
}

/// An immutable outbound call, built once per invocation.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Fully resolved URL with template parameters substituted.
    pub url: String,
    /// Header map in insertion order.
    pub headers: IndexMap<String, String>,
    /// Optional body payload.
    pub body: Option<String>,
    /// Declared content type of the body, when a body is present.
    pub content_type: Option<ContentType>,
}

impl Request {
    /// The URL scheme, used by the processor to select a transport.
    pub fn scheme(&self) -> Result<String, Error> {
        let parsed = url::Url::parse(&self.url)
            .map_err(|e| Error::configuration(format!("invalid request URL '{}': {e}", self.url)))?;
        Ok(parsed.scheme().to_string())
    }

    /// Looks up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Mutable accumulator for a single [`Request`].
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    url_template: String,
    method: Method,
    params: IndexMap<String, Value>,
    headers: IndexMap<String, String>,
    body: Option<String>,
    content_type: Option<ContentType>,
}

impl RequestBuilder {
    /// Starts a GET request for the given URL template.
    pub fn get(url_template: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
            ..Self::default()
        }
    }

    /// Starts a request with an explicit method.
    pub fn new(method: Method, url_template: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
            method,
            ..Self::default()
        }
    }

    /// Overrides the HTTP method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// In-place method override, used by dispatch when applying a declared
    /// per-operation method.
    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    /// Sets a template or query parameter.
    pub fn param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set_param(name, value);
        self
    }

    /// In-place parameter assignment, used by interceptors and argument
    /// binding.
    pub fn set_param(&mut self, name: impl Into<String>, value: Value) {
        self.params.insert(name.into(), value);
    }

    /// Sets a header, replacing any previous value for the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// In-place header assignment.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    /// Whether a header is already present, by case-insensitive name.
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.keys().any(|key| key.eq_ignore_ascii_case(name))
    }

    /// Sets the body and its declared content type.
    pub fn set_body(&mut self, body: impl Into<String>, content_type: ContentType) {
        self.body = Some(body.into());
        self.content_type = Some(content_type);
    }

    /// The raw URL template this builder targets.
    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    /// Expands the template and freezes the request.
    ///
    /// Parameters whose name appears as a `{name}` placeholder are substituted
    /// percent-encoded; all remaining parameters are appended as query pairs.
    /// Array parameter values repeat the key once per element.
    pub fn build(self) -> Result<Request, Error> {
        if self.url_template.trim().is_empty() {
            return Err(Error::configuration("request URL template can not be empty"));
        }

        let mut url = self.url_template.clone();
        let mut query: Vec<(String, String)> = Vec::new();

        for (key, value) in &self.params {
            let needle = format!("{{{key}}}");
            if url.contains(&needle) {
                url = url.replace(&needle, &encode_component(value));
            } else {
                match value {
                    Value::Array(items) => {
                        for item in items {
                            query.push((key.clone(), plain_component(item)));
                        }
                    }
                    other => query.push((key.clone(), plain_component(other))),
                }
            }
        }

        if !query.is_empty() {
            let joined = query
                .iter()
                .map(|(key, value)| {
                    format!(
                        "{}={}",
                        utf8_percent_encode(key, NON_ALPHANUMERIC),
                        utf8_percent_encode(value, NON_ALPHANUMERIC)
                    )
                })
                .collect::<Vec<String>>()
                .join("&");
            let separator = if url.contains('?') { '&' } else { '?' };
            url = format!("{url}{separator}{joined}");
        }

        Ok(Request {
            method: self.method,
            url,
            headers: self.headers,
            body: self.body,
            content_type: self.content_type,
        })
    }
}

fn plain_component(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn encode_component(value: &Value) -> String {
    utf8_percent_encode(&plain_component(value), NON_ALPHANUMERIC).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn build_substitutes_template_parameters() {
        let request = RequestBuilder::get("http://api.example.com/orders/{id}")
            .param("id", json!("42"))
            .build()
            .expect("built");

        assert_eq!(request.url, "http://api.example.com/orders/42");
        assert_eq!(request.method, Method::Get);
    }

    #[test]
    fn build_percent_encodes_substituted_values() {
        let request = RequestBuilder::get("http://api.example.com/apps/{app}")
            .param("app", json!("my app/one"))
            .build()
            .expect("built");

        assert_eq!(request.url, "http://api.example.com/apps/my%20app%2Fone");
    }

    #[test]
    fn build_appends_unconsumed_parameters_as_query() {
        let request = RequestBuilder::get("http://api.example.com/orders")
            .param("page", json!(2))
            .param("expand", json!(["items", "customer"]))
            .build()
            .expect("built");

        assert_eq!(request.url, "http://api.example.com/orders?page=2&expand=items&expand=customer");
    }

    #[test]
    fn build_rejects_empty_template() {
        assert!(RequestBuilder::get("  ").build().is_err());
    }

    #[test]
    fn scheme_extraction_and_header_lookup() {
        let request = RequestBuilder::new(Method::Post, "https://api.example.com/orders")
            .header("Accept", "application/hal+json")
            .build()
            .expect("built");

        assert_eq!(request.scheme().expect("scheme"), "https");
        assert_eq!(request.header("accept"), Some("application/hal+json"));
        assert!(request.header("authorization").is_none());
    }

    #[test]
    fn method_round_trips_through_strings() {
        assert_eq!("patch".parse::<Method>().expect("parsed"), Method::Patch);
        assert_eq!(Method::Delete.to_string(), "DELETE");
        assert!("TELEPORT".parse::<Method>().is_err());
    }
}
