//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, request ID, tracing, identity, CORS)
//!     → handlers.rs (method check, path + credential validation)
//!     → request.rs (buffer body, build InboundRequest)
//!     → proxy::Forwarder (single upstream call)
//!     → response.rs (JSON errors) or verbatim upstream relay
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use response::{ErrorBody, ErrorResponse, StatusMessage};
pub use server::{AppState, HttpServer};
