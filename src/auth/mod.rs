//! Caller identity.
//!
//! The proxy does not own users or sessions. It asks an [`IdentityProvider`]
//! who the caller is, attaches the answer to the request, and optionally
//! refuses to forward for unknown callers.

pub mod identity;
pub mod middleware;

use std::sync::Arc;

use crate::config::AuthConfig;

pub use identity::{Anonymous, Identity, IdentityProvider, StaticTokens};
pub use middleware::{identify, require_identity};

/// Pick the provider described by the auth config.
pub fn provider_from_config(config: &AuthConfig) -> Arc<dyn IdentityProvider> {
    if config.tokens.is_empty() {
        Arc::new(Anonymous)
    } else {
        Arc::new(StaticTokens::new(config.tokens.clone()))
    }
}
