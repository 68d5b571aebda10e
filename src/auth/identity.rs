//! Identity providers.

use std::collections::HashMap;

use axum::http::{header, HeaderMap};

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
}

/// Decides who, if anyone, is behind a request.
pub trait IdentityProvider: Send + Sync + std::fmt::Debug {
    /// The caller's identity, or `None` when not authenticated.
    fn authenticate(&self, headers: &HeaderMap) -> Option<Identity>;

    fn is_authenticated(&self, headers: &HeaderMap) -> bool {
        self.authenticate(headers).is_some()
    }
}

/// Nobody is ever authenticated.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl IdentityProvider for Anonymous {
    fn authenticate(&self, _headers: &HeaderMap) -> Option<Identity> {
        None
    }
}

/// Fixed table of bearer tokens to user names.
#[derive(Debug, Clone, Default)]
pub struct StaticTokens {
    tokens: HashMap<String, String>,
}

impl StaticTokens {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }
}

impl IdentityProvider for StaticTokens {
    fn authenticate(&self, headers: &HeaderMap) -> Option<Identity> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))?
            .trim();

        self.tokens.get(token).map(|name| Identity { name: name.clone() })
    }
}
