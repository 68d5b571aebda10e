//! Forwarding core.
//!
//! # Data Flow
//! ```text
//! caller path + headers
//!     → forward::validate (namespace prefix, no dot segments, x-goog-api-key)
//!     → InboundRequest (method, path, query, body)
//!     → Forwarder::build_request (same method/query/body, two headers)
//!     → shared reqwest::Client (pooled, total timeout)
//!     → UpstreamResponse (status, headers, body) relayed verbatim
//!
//! Failures at any step:
//!     → ProxyError → JSON error response
//! ```
//!
//! # Design Decisions
//! - Exactly one upstream call per inbound request, no retries, no redirects
//! - Bodies are opaque and fully buffered in both directions
//! - Upstream 4xx/5xx are successful exchanges, not errors

pub mod error;
pub mod forward;

pub use error::{ensure_method, ProxyError};
pub use forward::{validate, Forwarder, InboundRequest, UpstreamResponse, API_KEY_HEADER, API_PREFIX};
