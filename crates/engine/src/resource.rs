//! Resource abstraction over a parsed hypermedia payload.
//!
//! A [`Resource`] exposes link lookup by relation (with optional
//! disambiguating name), embedded-resource lookup, path-based data
//! extraction, and form lookup. Implementations provide the format-specific
//! primitives; the single-link, named-link, and first-matching-link policies
//! are provided methods layered on top so every format shares the same
//! ambiguity rules.

use std::fmt;

use serde_json::Value;
use traverse_types::{Error, Form, Link};

/// Owned, shareable resource handle.
pub type ResourceBox = Box<dyn Resource>;

/// A candidate name for first-matching-link selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameCandidate {
    /// Matches links carrying exactly this name.
    Named(String),
    /// Matches links with no name.
    Unnamed,
    /// Wildcard: matches the first link for the relation regardless of name.
    Any,
}

impl NameCandidate {
    fn matches(&self, link: &Link) -> bool {
        match self {
            NameCandidate::Named(name) => link.name.as_deref() == Some(name.as_str()),
            NameCandidate::Unnamed => link.name.is_none(),
            NameCandidate::Any => true,
        }
    }
}

impl fmt::Display for NameCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameCandidate::Named(name) => f.write_str(name),
            NameCandidate::Unnamed => f.write_str("<unnamed>"),
            NameCandidate::Any => f.write_str("*"),
        }
    }
}

/// Capability interface over a parsed body.
///
/// Resources are read-only once constructed; navigation never mutates them.
pub trait Resource: Send + Sync {
    /// All links for a relation, in original document order. Zero, one, or
    /// many links may share a relation.
    fn links(&self, rel: &str) -> Vec<Link>;

    /// Whether the relation can be resolved purely from embedded data.
    fn can_resolve_local(&self, rel: &str) -> bool;

    /// Resolves a single embedded resource for the relation.
    fn resolve_local(&self, rel: &str) -> Result<ResourceBox, Error>;

    /// Resolves every embedded resource for the relation, in original order.
    fn resolve_all_local(&self, rel: &str) -> Result<Vec<ResourceBox>, Error>;

    /// Evaluates a dot-and-index path expression against the raw data tree.
    fn data(&self, path: &str) -> Option<Value>;

    /// The raw data tree. Identity comparisons between wrapped resources
    /// compare these trees.
    fn raw(&self) -> Value;

    /// Looks up a form by name.
    fn form(&self, name: &str) -> Result<Form, Error>;

    /// Whether a form with the given name is present.
    fn has_form(&self, name: &str) -> bool;

    /// Profile URIs this resource advertises, used for subtype selection.
    fn profiles(&self) -> Vec<String>;

    /// The unique link for a relation.
    ///
    /// Zero links raises missing-required-link; two or more raises
    /// ambiguous-link rather than silently picking one.
    fn link(&self, rel: &str) -> Result<Link, Error> {
        let links = self.links(rel);
        match links.len() {
            0 => Err(Error::MissingRequiredLink {
                rel: rel.to_string(),
                name: None,
            }),
            1 => Ok(links.into_iter().next().unwrap()),
            count => Err(Error::AmbiguousLink {
                rel: rel.to_string(),
                name: None,
                count,
            }),
        }
    }

    /// The unique link matching both relation and name. `None` matches links
    /// that carry no name.
    fn named_link(&self, rel: &str, name: Option<&str>) -> Result<Link, Error> {
        let mut matches: Vec<Link> = self
            .links(rel)
            .into_iter()
            .filter(|link| link.name.as_deref() == name)
            .collect();
        match matches.len() {
            0 => Err(Error::MissingRequiredLink {
                rel: rel.to_string(),
                name: name.map(str::to_string),
            }),
            1 => Ok(matches.remove(0)),
            count => Err(Error::AmbiguousLink {
                rel: rel.to_string(),
                name: name.map(str::to_string),
                count,
            }),
        }
    }

    /// Whether any link exists for the relation.
    fn has_link(&self, rel: &str) -> bool {
        !self.links(rel).is_empty()
    }

    /// Whether any link matches both relation and name.
    fn has_named_link(&self, rel: &str, name: Option<&str>) -> bool {
        self.links(rel).iter().any(|link| link.name.as_deref() == name)
    }

    /// Whether the relation carries more than one link.
    fn is_multi_link(&self, rel: &str) -> bool {
        self.links(rel).len() > 1
    }

    /// First-matching-link selection.
    ///
    /// Returns the first link (in original order) matching the first
    /// candidate that has any match. A wildcard candidate matches the first
    /// link for the relation regardless of name. Raises when the relation has
    /// no links at all, or when no candidate matches.
    fn first_link(&self, rel: &str, candidates: &[NameCandidate]) -> Result<Link, Error> {
        let links = self.links(rel);
        if links.is_empty() {
            return Err(Error::MissingRequiredLink {
                rel: rel.to_string(),
                name: None,
            });
        }

        for candidate in candidates {
            if let Some(link) = links.iter().find(|link| candidate.matches(link)) {
                return Ok(link.clone());
            }
        }

        Err(Error::MissingRequiredLink {
            rel: rel.to_string(),
            name: Some(
                candidates
                    .iter()
                    .map(NameCandidate::to_string)
                    .collect::<Vec<String>>()
                    .join(", "),
            ),
        })
    }
}

impl fmt::Debug for dyn Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource").field("raw", &self.raw()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal resource exercising the provided lookup methods, mirroring how
    /// a format implementation only supplies the `links` primitive.
    struct LinkTable {
        links: Vec<Link>,
    }

    impl Resource for LinkTable {
        fn links(&self, rel: &str) -> Vec<Link> {
            self.links.iter().filter(|link| link.rel == rel).cloned().collect()
        }

        fn can_resolve_local(&self, _rel: &str) -> bool {
            false
        }

        fn resolve_local(&self, rel: &str) -> Result<ResourceBox, Error> {
            Err(Error::MissingRequiredLink {
                rel: rel.to_string(),
                name: None,
            })
        }

        fn resolve_all_local(&self, rel: &str) -> Result<Vec<ResourceBox>, Error> {
            Err(Error::MissingRequiredLink {
                rel: rel.to_string(),
                name: None,
            })
        }

        fn data(&self, _path: &str) -> Option<Value> {
            None
        }

        fn raw(&self) -> Value {
            Value::Null
        }

        fn form(&self, name: &str) -> Result<Form, Error> {
            Err(Error::configuration(format!("no form named '{name}'")))
        }

        fn has_form(&self, _name: &str) -> bool {
            false
        }

        fn profiles(&self) -> Vec<String> {
            Vec::new()
        }
    }

    fn table(links: Vec<Link>) -> LinkTable {
        LinkTable { links }
    }

    #[test]
    fn link_with_exactly_one_match_returns_it() {
        let resource = table(vec![Link::new("customer", "http://api/customers/42")]);
        let link = resource.link("customer").expect("unique link");
        assert_eq!(link.href, "http://api/customers/42");
    }

    #[test]
    fn link_with_zero_matches_is_missing() {
        let resource = table(Vec::new());
        assert!(matches!(resource.link("customer"), Err(Error::MissingRequiredLink { .. })));
    }

    #[test]
    fn link_with_two_matches_is_ambiguous() {
        let resource = table(vec![Link::new("item", "http://api/items/1"), Link::new("item", "http://api/items/2")]);
        assert!(matches!(resource.link("item"), Err(Error::AmbiguousLink { count: 2, .. })));
    }

    #[test]
    fn named_link_requires_unique_rel_name_pair() {
        let resource = table(vec![
            Link::new("item", "http://api/items/1").with_name("first"),
            Link::new("item", "http://api/items/2").with_name("second"),
        ]);

        let link = resource.named_link("item", Some("second")).expect("named link");
        assert_eq!(link.href, "http://api/items/2");

        assert!(matches!(
            resource.named_link("item", Some("third")),
            Err(Error::MissingRequiredLink { .. })
        ));
    }

    #[test]
    fn named_link_surfaces_duplicate_pairs_as_ambiguous() {
        let resource = table(vec![
            Link::new("item", "http://api/items/1").with_name("dup"),
            Link::new("item", "http://api/items/2").with_name("dup"),
        ]);

        assert!(matches!(
            resource.named_link("item", Some("dup")),
            Err(Error::AmbiguousLink { count: 2, .. })
        ));
    }

    #[test]
    fn named_link_with_none_matches_unnamed_links() {
        let resource = table(vec![
            Link::new("item", "http://api/items/named").with_name("x"),
            Link::new("item", "http://api/items/bare"),
        ]);

        let link = resource.named_link("item", None).expect("unnamed link");
        assert_eq!(link.href, "http://api/items/bare");
    }

    #[test]
    fn first_link_picks_first_candidate_with_any_match() {
        let resource = table(vec![
            Link::new("search", "http://api/search/simple").with_name("simple"),
            Link::new("search", "http://api/search/advanced").with_name("advanced"),
        ]);

        let candidates = [
            NameCandidate::Named("missing".into()),
            NameCandidate::Named("advanced".into()),
            NameCandidate::Named("simple".into()),
        ];
        let link = resource.first_link("search", &candidates).expect("first match");
        assert_eq!(link.href, "http://api/search/advanced");
    }

    #[test]
    fn first_link_wildcard_matches_first_in_document_order() {
        let resource = table(vec![
            Link::new("search", "http://api/search/simple").with_name("simple"),
            Link::new("search", "http://api/search/advanced").with_name("advanced"),
        ]);

        let candidates = [NameCandidate::Named("missing".into()), NameCandidate::Any];
        let link = resource.first_link("search", &candidates).expect("wildcard match");
        assert_eq!(link.href, "http://api/search/simple");
    }

    #[test]
    fn first_link_without_any_match_raises() {
        let resource = table(vec![Link::new("search", "http://api/search/simple").with_name("simple")]);

        let candidates = [NameCandidate::Named("missing".into())];
        assert!(matches!(
            resource.first_link("search", &candidates),
            Err(Error::MissingRequiredLink { .. })
        ));
    }

    #[test]
    fn first_link_with_zero_links_raises() {
        let resource = table(Vec::new());
        assert!(matches!(
            resource.first_link("search", &[NameCandidate::Any]),
            Err(Error::MissingRequiredLink { .. })
        ));
    }

    #[test]
    fn unnamed_candidate_matches_links_without_names() {
        let resource = table(vec![
            Link::new("doc", "http://api/docs/named").with_name("alt"),
            Link::new("doc", "http://api/docs/plain"),
        ]);

        let candidates = [NameCandidate::Unnamed];
        let link = resource.first_link("doc", &candidates).expect("unnamed match");
        assert_eq!(link.href, "http://api/docs/plain");
    }
}
