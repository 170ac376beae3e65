//! Error family shared across the Traverse workspace.
//!
//! Every failure surfaced to a caller is a variant of [`Error`] carrying
//! enough context to log or retry manually. Specific kinds are never
//! re-wrapped as a generic failure; only genuinely unexpected faults during
//! dispatch are wrapped with [`Error::Dispatch`] context.

use thiserror::Error;

/// Failure raised by a transport while executing a request.
///
/// The engine does not interpret transport failures beyond propagating them
/// to the caller wrapped in [`Error::Transport`].
#[derive(Debug, Error)]
#[error("transport error for {url}: {message}")]
pub struct TransportError {
    /// URL the transport attempted to reach.
    pub url: String,
    /// Transport-specific failure description.
    pub message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    /// Creates a transport error without an underlying cause.
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a transport error preserving the underlying cause.
    pub fn with_source(
        url: impl Into<String>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Errors surfaced by resource navigation and response resolution.
#[derive(Debug, Error)]
pub enum Error {
    /// Response content type was missing, unparseable, or has no registered
    /// parser. Recoverable through the error handler.
    #[error("no content type handler for response from {url} (content type: {content_type:?})")]
    UnhandledContentType {
        /// URL the response came from.
        url: String,
        /// Declared content type string, if any.
        content_type: Option<String>,
    },

    /// A registered parser raised while parsing the response body.
    /// Recoverable through the error handler.
    #[error("failed to parse {content_type} response from {url}: {cause}")]
    ContentParseError {
        /// URL the response came from.
        url: String,
        /// Content type the failing handler was registered for.
        content_type: String,
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Response parsed successfully but carries a failure status.
    /// Recoverable through the error handler.
    #[error("response from {url} has non-success status {status}")]
    NotOkResponse {
        /// URL the response came from.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// A required relation had zero matches and no null-when-missing policy.
    #[error("missing required link with relation [{rel}]{}", name_suffix(.name))]
    MissingRequiredLink {
        /// Link relation that was required.
        rel: String,
        /// Disambiguating name, when one was supplied.
        name: Option<String>,
    },

    /// A relation had more than one match where exactly one was required.
    #[error("found {count} links with relation [{rel}]{} where exactly one was required", name_suffix(.name))]
    AmbiguousLink {
        /// Link relation that was looked up.
        rel: String,
        /// Disambiguating name, when one was supplied.
        name: Option<String>,
        /// Number of matching links.
        count: usize,
    },

    /// A multi-valued relation was requested as a single follow without an
    /// array return shape or a disambiguating name.
    #[error("cannot follow multi-valued relation [{rel}] as a single resource")]
    UnsupportedMultiLinkFollow {
        /// The multi-valued relation.
        rel: String,
    },

    /// No classification applies to a requested contract operation. This is a
    /// contract-definition error, not a runtime data error.
    #[error("contract [{contract}] has no operation [{operation}]")]
    NoMatchingOperation {
        /// Contract the operation was invoked on.
        contract: String,
        /// Operation name that failed to resolve.
        operation: String,
    },

    /// A prepare-request call was required but the selected handler cannot
    /// encode.
    #[error("content type handler for {content_type} does not support request encoding")]
    ContentEncodeUnsupported {
        /// Content type whose handler refused to encode.
        content_type: String,
    },

    /// A data path had no value and the operation carries no null-when-missing
    /// policy.
    #[error("no data at path [{path}]")]
    MissingData {
        /// The path expression that resolved to nothing.
        path: String,
    },

    /// A media type string could not be parsed.
    #[error("invalid content type string: {value}")]
    InvalidContentType {
        /// The offending raw string.
        value: String,
    },

    /// Processor or contract configuration fault detected at build or
    /// dispatch time, e.g. an unregistered URL scheme.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the misconfiguration.
        message: String,
    },

    /// Transport-level failure propagated from the injected client.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Unexpected fault wrapped with dispatch context. Typed kinds above are
    /// never re-wrapped into this variant.
    #[error("unexpected error dispatching operation [{operation}]: {detail}")]
    Dispatch {
        /// Operation that was being dispatched.
        operation: String,
        /// Context describing what went wrong.
        detail: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Shorthand for a [`Error::Configuration`] fault.
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration { message: message.into() }
    }

    /// Whether this error kind is routed through the pluggable error handler
    /// so callers may recover by substituting a placeholder resource.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::UnhandledContentType { .. } | Error::ContentParseError { .. } | Error::NotOkResponse { .. }
        )
    }
}

fn name_suffix(name: &Option<String>) -> String {
    match name {
        Some(name) => format!(" and name [{name}]"),
        None => String::new(),
    }
}
