//! HAL+JSON resource implementation.
//!
//! Parses `_links`, `_embedded`, and HAL-FORMS-style `_templates` out of a
//! JSON document. A document without any of those keys is still a valid
//! resource; it simply has no hypermedia controls.

use serde_json::Value;
use traverse_types::{ContentType, Error, Form, FormField, Link, Method, RequestBuilder, Response};

use crate::content::ContentTypeHandler;
use crate::resource::{Resource, ResourceBox};

const LINKS_KEY: &str = "_links";
const EMBEDDED_KEY: &str = "_embedded";
const TEMPLATES_KEY: &str = "_templates";

/// A parsed HAL+JSON payload.
#[derive(Debug, Clone)]
pub struct HalResource {
    root: Value,
    source: String,
}

impl HalResource {
    /// Parses a HAL+JSON body. `source` is the URL the document came from,
    /// used as the default form target.
    pub fn parse(body: &str, source: &str) -> Result<Self, serde_json::Error> {
        let root = serde_json::from_str::<Value>(body)?;
        Ok(Self::new(root, source))
    }

    /// Wraps an already-parsed JSON tree.
    pub fn new(root: Value, source: &str) -> Self {
        Self {
            root,
            source: source.to_string(),
        }
    }

    fn link_entries(&self, rel: &str) -> Vec<&Value> {
        match self.root.get(LINKS_KEY).and_then(|links| links.get(rel)) {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(single) => vec![single],
            None => Vec::new(),
        }
    }

    fn embedded_entries(&self, rel: &str) -> Vec<&Value> {
        match self.root.get(EMBEDDED_KEY).and_then(|embedded| embedded.get(rel)) {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(single) => vec![single],
            None => Vec::new(),
        }
    }

    fn link_from_value(rel: &str, value: &Value) -> Option<Link> {
        let href = value.get("href")?.as_str()?;
        let mut link = Link::new(rel, href);
        link.templated = value.get("templated").and_then(Value::as_bool).unwrap_or(false);
        link.name = value.get("name").and_then(Value::as_str).map(str::to_string);
        link.title = value.get("title").and_then(Value::as_str).map(str::to_string);
        link.profile = value.get("profile").and_then(Value::as_str).map(str::to_string);
        link.media_type = value.get("type").and_then(Value::as_str).map(str::to_string);
        Some(link)
    }
}

impl Resource for HalResource {
    fn links(&self, rel: &str) -> Vec<Link> {
        self.link_entries(rel)
            .into_iter()
            .filter_map(|value| Self::link_from_value(rel, value))
            .collect()
    }

    fn can_resolve_local(&self, rel: &str) -> bool {
        !self.embedded_entries(rel).is_empty()
    }

    fn resolve_local(&self, rel: &str) -> Result<ResourceBox, Error> {
        let entries = self.embedded_entries(rel);
        match entries.len() {
            0 => Err(Error::MissingRequiredLink {
                rel: rel.to_string(),
                name: None,
            }),
            1 => Ok(Box::new(HalResource::new(entries[0].clone(), &self.source))),
            _ => Err(Error::UnsupportedMultiLinkFollow { rel: rel.to_string() }),
        }
    }

    fn resolve_all_local(&self, rel: &str) -> Result<Vec<ResourceBox>, Error> {
        Ok(self
            .embedded_entries(rel)
            .into_iter()
            .map(|value| Box::new(HalResource::new(value.clone(), &self.source)) as ResourceBox)
            .collect())
    }

    fn data(&self, path: &str) -> Option<Value> {
        if path.is_empty() || path == "." {
            return Some(self.root.clone());
        }

        let mut current = &self.root;
        for segment in path.split('.') {
            if segment.is_empty() {
                continue;
            }
            current = match segment.parse::<usize>() {
                Ok(index) => current.get(index)?,
                Err(_) => current.get(segment)?,
            };
        }
        Some(current.clone())
    }

    fn raw(&self) -> Value {
        self.root.clone()
    }

    fn form(&self, name: &str) -> Result<Form, Error> {
        let template = self
            .root
            .get(TEMPLATES_KEY)
            .and_then(|templates| templates.get(name))
            .ok_or_else(|| Error::configuration(format!("resource has no form named '{name}'")))?;

        let method = template
            .get("method")
            .and_then(Value::as_str)
            .map(str::parse::<Method>)
            .transpose()?
            .unwrap_or(Method::Get);

        let href = template
            .get("target")
            .and_then(Value::as_str)
            .unwrap_or(&self.source)
            .to_string();

        let fields = template
            .get("properties")
            .and_then(Value::as_array)
            .map(|properties| {
                properties
                    .iter()
                    .filter_map(|property| {
                        let field_name = property.get("name")?.as_str()?;
                        Some(FormField {
                            name: field_name.to_string(),
                            required: property.get("required").and_then(Value::as_bool).unwrap_or(false),
                            value: property.get("value").cloned(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Form {
            name: name.to_string(),
            href,
            method,
            content_type: template.get("contentType").and_then(Value::as_str).map(str::to_string),
            fields,
        })
    }

    fn has_form(&self, name: &str) -> bool {
        self.root
            .get(TEMPLATES_KEY)
            .and_then(|templates| templates.get(name))
            .is_some()
    }

    fn profiles(&self) -> Vec<String> {
        self.links("profile").into_iter().map(|link| link.href).collect()
    }
}

/// HAL+JSON media type handler: parse only.
pub struct HalJsonHandler;

impl ContentTypeHandler for HalJsonHandler {
    fn default_content_type(&self) -> ContentType {
        ContentType::new("application", "hal+json")
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

    fn prepare_request(&self, _builder: &mut RequestBuilder, _content: &Value) -> Result<(), Error> {
        Err(Error::ContentEncodeUnsupported {
            content_type: self.default_content_type().essence(),
        })
    }

    fn can_prepare_request(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order_resource() -> HalResource {
        HalResource::new(
            json!({
                "_links": {
                    "self": { "href": "http://api/orders/7" },
                    "customer": { "href": "http://api/customers/42" },
                    "item": [
                        { "href": "http://api/items/1", "name": "first" },
                        { "href": "http://api/items/2", "name": "second" }
                    ],
                    "profile": { "href": "http://profiles/premium-order" }
                },
                "_embedded": {
                    "item": [
                        { "sku": "A-1", "_links": { "self": { "href": "http://api/items/1" } } },
                        { "sku": "A-2", "_links": { "self": { "href": "http://api/items/2" } } }
                    ],
                    "customer": { "name": "Ada" }
                },
                "_templates": {
                    "add-item": {
                        "method": "POST",
                        "target": "http://api/orders/7/items",
                        "contentType": "application/json",
                        "properties": [
                            { "name": "sku", "required": true },
                            { "name": "quantity", "value": 1 }
                        ]
                    }
                },
                "total": { "amount": "12.99", "currency": "USD" }
            }),
            "http://api/orders/7",
        )
    }

    #[test]
    fn links_handles_single_and_array_forms() {
        let resource = order_resource();

        let customer = resource.links("customer");
        assert_eq!(customer.len(), 1);
        assert_eq!(customer[0].href, "http://api/customers/42");

        let items = resource.links("item");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name.as_deref(), Some("first"));
        assert!(resource.is_multi_link("item"));
        assert!(!resource.is_multi_link("customer"));
    }

    #[test]
    fn missing_relation_has_no_links() {
        let resource = order_resource();
        assert!(resource.links("discount").is_empty());
        assert!(!resource.has_link("discount"));
    }

    #[test]
    fn embedded_resolution_is_local() {
        let resource = order_resource();

        assert!(resource.can_resolve_local("item"));
        let items = resource.resolve_all_local("item").expect("embedded items");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].data("sku"), Some(json!("A-1")));

        let customer = resource.resolve_local("customer").expect("embedded customer");
        assert_eq!(customer.data("name"), Some(json!("Ada")));
    }

    #[test]
    fn resolve_local_refuses_multi_valued_relations() {
        let resource = order_resource();
        assert!(matches!(
            resource.resolve_local("item"),
            Err(Error::UnsupportedMultiLinkFollow { .. })
        ));
    }

    #[test]
    fn data_paths_support_nesting_and_indexes() {
        let resource = order_resource();
        assert_eq!(resource.data("total.amount"), Some(json!("12.99")));
        assert_eq!(resource.data("_embedded.item.1.sku"), Some(json!("A-2")));
        assert!(resource.data("total.missing").is_none());
    }

    #[test]
    fn forms_parse_method_target_and_fields() {
        let resource = order_resource();
        assert!(resource.has_form("add-item"));
        assert!(!resource.has_form("remove-item"));

        let form = resource.form("add-item").expect("form");
        assert_eq!(form.method, Method::Post);
        assert_eq!(form.href, "http://api/orders/7/items");
        assert_eq!(form.content_type.as_deref(), Some("application/json"));
        assert_eq!(form.fields.len(), 2);
        assert!(form.fields[0].required);
        assert_eq!(form.fields[1].value, Some(json!(1)));
    }

    #[test]
    fn form_target_defaults_to_source_url() {
        let resource = HalResource::new(
            json!({ "_templates": { "refresh": { "method": "GET" } } }),
            "http://api/orders/7",
        );
        let form = resource.form("refresh").expect("form");
        assert_eq!(form.href, "http://api/orders/7");
    }

    #[test]
    fn profiles_come_from_profile_links() {
        let resource = order_resource();
        assert_eq!(resource.profiles(), vec!["http://profiles/premium-order".to_string()]);
    }

    #[test]
    fn handler_reports_parse_failures_with_cause() {
        let request = RequestBuilder::get("http://api/orders").build().expect("built");
        let response = Response::builder(request)
            .content_type("application/hal+json")
            .body("{not json")
            .build();

        let error = HalJsonHandler.parse_response(&response).expect_err("malformed body");
        assert!(matches!(error, Error::ContentParseError { .. }));
    }

    #[test]
    fn handler_refuses_request_encoding() {
        let mut builder = RequestBuilder::get("http://api/orders");
        let error = HalJsonHandler
            .prepare_request(&mut builder, &json!({"sku": "B-9"}))
            .expect_err("parse-only handler");
        assert!(matches!(error, Error::ContentEncodeUnsupported { .. }));
    }

    #[test]
    fn plain_json_documents_are_resources_without_controls() {
        let resource = HalResource::parse(r#"{"name":"Ada"}"#, "http://api/people/1").expect("parsed");
        assert!(resource.links("self").is_empty());
        assert_eq!(resource.data("name"), Some(json!("Ada")));
    }
}
