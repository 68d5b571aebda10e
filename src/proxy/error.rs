//! Proxy error taxonomy and its mapping onto HTTP responses.
//!
//! Upstream 4xx/5xx answers are not errors here; they are relayed as-is.

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::response::ErrorResponse;

/// Everything that can stop a request from being relayed.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Path lacks the `v1beta/` namespace prefix or has a dot segment.
    #[error("Not a valid API path")]
    InvalidPath { path: String },

    /// No usable `x-goog-api-key` header.
    #[error("API key required")]
    MissingCredential,

    /// Identity gate is on and the caller is unknown.
    #[error("Authentication required")]
    Unauthenticated,

    /// Only GET, HEAD, POST, PUT and DELETE are served.
    #[error("Method not allowed")]
    MethodNotAllowed { method: Method },

    #[error("Request body too large")]
    PayloadTooLarge { limit: usize },

    /// Connect failure, timeout or reset while talking to upstream.
    /// Also covers a body cut short mid-read.
    #[error("Upstream connection error")]
    UpstreamConnection(#[source] reqwest::Error),

    #[error("Internal proxy error")]
    Internal(String),
}

impl ProxyError {
    /// Classify a client error from the upstream exchange.
    pub fn from_upstream(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() || err.is_body() {
            ProxyError::UpstreamConnection(err.without_url())
        } else {
            ProxyError::Internal(error_chain(&err.without_url()))
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidPath { .. } => StatusCode::NOT_FOUND,
            ProxyError::MissingCredential => StatusCode::BAD_REQUEST,
            ProxyError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ProxyError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::UpstreamConnection(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Diagnostic text exposed in the `details` field, if any.
    pub fn details(&self) -> Option<String> {
        match self {
            ProxyError::UpstreamConnection(e) => Some(error_chain(e)),
            ProxyError::Internal(detail) => Some(detail.clone()),
            _ => None,
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::InvalidPath { .. } => "invalid_path",
            ProxyError::MissingCredential => "missing_credential",
            ProxyError::Unauthenticated => "unauthenticated",
            ProxyError::MethodNotAllowed { .. } => "method_not_allowed",
            ProxyError::PayloadTooLarge { .. } => "payload_too_large",
            ProxyError::UpstreamConnection(_) => "upstream_connection",
            ProxyError::Internal(_) => "internal",
        }
    }
}

/// Reject methods the proxy does not serve.
pub fn ensure_method(method: &Method) -> Result<(), ProxyError> {
    const SERVED: [Method; 5] = [
        Method::GET,
        Method::HEAD,
        Method::POST,
        Method::PUT,
        Method::DELETE,
    ];

    if SERVED.contains(method) {
        Ok(())
    } else {
        Err(ProxyError::MethodNotAllowed {
            method: method.clone(),
        })
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        ErrorResponse::new(self.status(), self.to_string(), self.details()).into_response()
    }
}

/// Render an error and its sources as `outer: inner: root`.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        // hyper and reqwest often repeat the inner message in the outer one
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}
