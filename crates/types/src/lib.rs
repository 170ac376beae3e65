//! # Traverse shared types
//!
//! Immutable value types shared across the Traverse hypermedia client:
//! requests and responses, hypermedia controls (links and forms), media types
//! with quality weighting, and the workspace-wide error family.
//!
//! These types carry no policy. Negotiation, resolution, and dispatch live in
//! `traverse-engine`; concrete wire transports live in `traverse-http`.

pub mod content_type;
pub mod controls;
pub mod error;
pub mod request;
pub mod response;

pub use content_type::ContentType;
pub use controls::{Form, FormField, Link};
pub use error::{Error, TransportError};
pub use request::{Method, Request, RequestBuilder};
pub use response::{Response, ResponseBuilder};
