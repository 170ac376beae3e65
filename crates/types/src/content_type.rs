//! Media type value with quality weighting for content negotiation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A parsed media type such as `application/hal+json`.
///
/// A `ContentType` carries an optional quality weight used when composing
/// `Accept`-style negotiation headers. Two content types are considered the
/// same registration key when their type and subtype match exactly; quality
/// and parameters never participate in lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentType {
    /// Primary type, e.g. `application`.
    pub type_: String,
    /// Subtype, e.g. `hal+json`.
    pub subtype: String,
    /// Quality weight in `0.0..=1.0`, defaulting to `1.0`.
    pub quality: f32,
}

impl ContentType {
    /// Creates a content type with the default quality of `1.0`.
    pub fn new(type_: impl Into<String>, subtype: impl Into<String>) -> Self {
        Self {
            type_: type_.into(),
            subtype: subtype.into(),
            quality: 1.0,
        }
    }

    /// Returns a copy of this content type carrying the given quality weight.
    pub fn with_quality(&self, quality: f32) -> Self {
        Self {
            type_: self.type_.clone(),
            subtype: self.subtype.clone(),
            quality: quality.clamp(0.0, 1.0),
        }
    }

    /// Renders `type/subtype` without any parameters.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.type_, self.subtype)
    }

    /// Whether two content types share the same type and subtype.
    ///
    /// This is the registry lookup predicate: exact match only, never a
    /// wildcard or partial match.
    pub fn matches(&self, other: &ContentType) -> bool {
        self.type_.eq_ignore_ascii_case(&other.type_) && self.subtype.eq_ignore_ascii_case(&other.subtype)
    }
}

impl FromStr for ContentType {
    type Err = Error;

    /// Parses a media type string such as `application/hal+json; q=0.8`.
    ///
    /// Parameters other than `q` are accepted and discarded. The value before
    /// the first `;` must be a `type/subtype` pair with non-empty halves.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut sections = raw.split(';');
        let essence = sections.next().unwrap_or_default().trim();

        let (type_, subtype) = essence
            .split_once('/')
            .ok_or_else(|| Error::InvalidContentType { value: raw.to_string() })?;
        if type_.trim().is_empty() || subtype.trim().is_empty() {
            return Err(Error::InvalidContentType { value: raw.to_string() });
        }

        let mut quality = 1.0f32;
        for section in sections {
            if let Some((key, value)) = section.split_once('=')
                && key.trim().eq_ignore_ascii_case("q")
            {
                quality = value
                    .trim()
                    .parse::<f32>()
                    .map_err(|_| Error::InvalidContentType { value: raw.to_string() })?
                    .clamp(0.0, 1.0);
            }
        }

        Ok(Self {
            type_: type_.trim().to_ascii_lowercase(),
            subtype: subtype.trim().to_ascii_lowercase(),
            quality,
        })
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if (self.quality - 1.0).abs() < f32::EPSILON {
            write!(f, "{}/{}", self.type_, self.subtype)
        } else {
            write!(f, "{}/{};q={}", self.type_, self.subtype, self.quality)
        }
    }
}

impl PartialEq for ContentType {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other)
    }
}

impl Eq for ContentType {}
