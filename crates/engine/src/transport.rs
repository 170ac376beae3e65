//! Wire transport abstraction.
//!
//! The engine never implements HTTP itself. A transport is injected at
//! processor build time and selected per request by URL scheme. Execution is
//! synchronous; retry, backoff, and timeouts are concerns of the transport,
//! opaque to this layer.

use traverse_types::{Request, Response, TransportError};

/// Executes a single request against the wire.
pub trait Transport: Send + Sync {
    /// URL schemes this transport serves, e.g. `["http", "https"]`.
    fn schemes(&self) -> &[&'static str];

    /// Executes the request, blocking until the response arrives. Failures
    /// propagate to the caller untouched.
    fn execute(&self, request: &Request) -> Result<Response, TransportError>;
}
