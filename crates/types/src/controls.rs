//! Hypermedia controls embedded in a resource: links and forms.

use serde_json::Value;

use crate::request::{Method, RequestBuilder};

/// A hypermedia link found on a resource.
///
/// Links are immutable values owned by the resource they were parsed from. A
/// relation may have zero, one, or many links; the (relation, name) pair is
/// intended to be unique, but duplicates are tolerated in the data model and
/// surfaced as ambiguity errors at lookup time rather than silently resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    /// The semantic role this link plays on its resource, e.g. `self`.
    pub rel: String,
    /// Target URL or URL template.
    pub href: String,
    /// Whether `href` contains template placeholders.
    pub templated: bool,
    /// Optional disambiguating name within the relation.
    pub name: Option<String>,
    /// Optional human-readable title.
    pub title: Option<String>,
    /// Optional profile URI advertised by the link target.
    pub profile: Option<String>,
    /// Optional declared media type of the link target.
    pub media_type: Option<String>,
}

impl Link {
    /// Creates a minimal link with only a relation and an href.
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
            templated: false,
            name: None,
            title: None,
            profile: None,
            media_type: None,
        }
    }

    /// Returns a copy of this link carrying a disambiguating name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Starts a request targeting this link, defaulting to a safe GET.
    pub fn to_request_builder(&self) -> RequestBuilder {
        RequestBuilder::get(&self.href)
    }
}

/// One field of a submittable form.
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    /// Field name, used as the parameter key on submission.
    pub name: String,
    /// Whether the field must carry a value on submission.
    pub required: bool,
    /// Pre-populated value, if the form declared one.
    pub value: Option<Value>,
}

/// A submittable action embedded in a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    /// Form name, unique within its resource.
    pub name: String,
    /// Target URL or URL template.
    pub href: String,
    /// HTTP method the form submits with.
    pub method: Method,
    /// Declared content type for the submission body, if any.
    pub content_type: Option<String>,
    /// Ordered field descriptors.
    pub fields: Vec<FormField>,
}

impl Form {
    /// Starts a request for this form's action.
    ///
    /// Pre-populated field values are seeded as parameters; call arguments
    /// bound by the invoking operation overwrite them.
    pub fn to_request_builder(&self) -> RequestBuilder {
        let mut builder = RequestBuilder::new(self.method, &self.href);
        for field in &self.fields {
            if let Some(value) = &field.value {
                builder.set_param(&field.name, value.clone());
            }
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn link_request_builder_targets_href_with_get() {
        let link = Link::new("customer", "http://api.example.com/customers/42");
        let request = link.to_request_builder().build().expect("built");

        assert_eq!(request.method, Method::Get);
        assert_eq!(request.url, "http://api.example.com/customers/42");
    }

    #[test]
    fn form_request_builder_seeds_field_defaults() {
        let form = Form {
            name: "create-order".into(),
            href: "http://api.example.com/orders".into(),
            method: Method::Post,
            content_type: Some("application/json".into()),
            fields: vec![
                FormField {
                    name: "currency".into(),
                    required: true,
                    value: Some(json!("USD")),
                },
                FormField {
                    name: "note".into(),
                    required: false,
                    value: None,
                },
            ],
        };

        let request = form.to_request_builder().build().expect("built");
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, "http://api.example.com/orders?currency=USD");
    }
}
