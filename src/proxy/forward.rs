//! Request forwarding to the upstream API.
//!
//! # Responsibilities
//! - Validate the namespace prefix and credential header
//! - Build the single outbound request (method, URL, two headers, body)
//! - Execute it on the shared pooled client under a total timeout
//! - Buffer the whole upstream response for relay

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::config::UpstreamConfig;
use crate::proxy::error::ProxyError;

/// Every forwardable path starts with this.
pub const API_PREFIX: &str = "v1beta/";

/// Header carrying the caller's API key.
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-goog-api-key");

/// Framing headers that belong to the upstream connection, not the payload.
const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::TRANSFER_ENCODING,
    header::TE,
    header::TRAILER,
    header::UPGRADE,
];

/// A request as received from the caller.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    /// Path without the leading `/`, still percent-encoded as received.
    pub path: String,
    /// Raw query string, forwarded untouched.
    pub query: Option<String>,
    pub body: Bytes,
}

/// Upstream answer, buffered in full.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        let mut headers = self.headers;
        for name in &HOP_BY_HOP {
            headers.remove(name);
        }
        // hyper frames a non-empty body itself. An empty one (HEAD, 304)
        // keeps upstream's length.
        if !self.body.is_empty() {
            headers.remove(header::CONTENT_LENGTH);
        }

        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = headers;
        response
    }
}

/// Check the namespace prefix and pull out the credential.
///
/// Paths with `.` or `..` segments are refused: URL parsing would resolve
/// them and the request could land outside `v1beta/`.
pub fn validate(path: &str, headers: &HeaderMap) -> Result<HeaderValue, ProxyError> {
    if !path.starts_with(API_PREFIX) || path.split('/').any(is_dot_segment) {
        return Err(ProxyError::InvalidPath {
            path: path.to_string(),
        });
    }

    match headers.get(&API_KEY_HEADER) {
        Some(key) if !key.is_empty() => Ok(key.clone()),
        _ => Err(ProxyError::MissingCredential),
    }
}

/// `.` or `..`, including the `%2e` spellings.
fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

/// Forwards validated requests to a fixed upstream base URL.
///
/// Holds the one `reqwest::Client` of the process. Cloning the client is
/// cheap and shares its connection pool, so a single `Forwarder` behind an
/// `Arc` serves every request concurrently.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    base_url: String,
}

impl Forwarder {
    /// Build the pooled client from upstream settings.
    ///
    /// Redirects are relayed to the caller, never followed.
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
            .build()?;
        Ok(Self::with_client(client, &config.base_url))
    }

    /// Use an already configured client.
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Target URL: base, `/`, then path and query exactly as received.
    pub fn upstream_url(&self, path: &str, query: Option<&str>) -> String {
        let mut url = format!("{}/{}", self.base_url, path);
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        url
    }

    /// Forward an already validated request.
    pub async fn forward(
        &self,
        inbound: &InboundRequest,
        api_key: HeaderValue,
    ) -> Result<UpstreamResponse, ProxyError> {
        let request = self.build_request(inbound, api_key)?;

        let response = self
            .client
            .execute(request)
            .await
            .map_err(ProxyError::from_upstream)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(ProxyError::from_upstream)?;

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }

    /// Derive the outbound request. Only two headers survive.
    pub fn build_request(
        &self,
        inbound: &InboundRequest,
        api_key: HeaderValue,
    ) -> Result<reqwest::Request, ProxyError> {
        let url = self.upstream_url(&inbound.path, inbound.query.as_deref());

        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(API_KEY_HEADER, api_key);

        self.client
            .request(inbound.method.clone(), url)
            .headers(headers)
            .body(inbound.body.clone())
            .build()
            .map_err(ProxyError::from_upstream)
    }
}
