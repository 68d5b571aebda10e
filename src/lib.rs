//! Reverse proxy for the Google generative-language API.
//!
//! Requests under `/v1beta/...` carrying an `x-goog-api-key` header are
//! forwarded once to the upstream host and the answer is relayed verbatim.

pub mod auth;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
