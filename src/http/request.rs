//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4)
//! - Buffer the inbound body under the configured limit
//! - Turn an axum request into an `InboundRequest` for the forwarder

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Method, Request, Uri};
use http_body_util::LengthLimitError;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::proxy::{InboundRequest, ProxyError};

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Produces a fresh UUID v4 for requests that arrive without an ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The request ID set by the request-id layer, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Buffer the body and capture what the forwarder needs.
pub async fn read_inbound(
    method: Method,
    uri: &Uri,
    body: Body,
    max_body_bytes: usize,
) -> Result<InboundRequest, ProxyError> {
    let body = axum::body::to_bytes(body, max_body_bytes)
        .await
        .map_err(|e| {
            if exceeds_limit(&e) {
                ProxyError::PayloadTooLarge {
                    limit: max_body_bytes,
                }
            } else {
                ProxyError::Internal(format!("failed to read request body: {e}"))
            }
        })?;

    Ok(InboundRequest {
        method,
        path: uri.path().trim_start_matches('/').to_string(),
        query: uri.query().map(str::to_string),
        body,
    })
}

fn exceeds_limit(err: &axum::Error) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_distinct_uuids() {
        let mut maker = MakeRequestUuid;
        let req = Request::new(());
        let a = maker.make_request_id(&req).unwrap();
        let b = maker.make_request_id(&req).unwrap();
        assert_ne!(a.header_value(), b.header_value());
        assert!(Uuid::parse_str(a.header_value().to_str().unwrap()).is_ok());
    }

    #[test]
    fn request_id_falls_back_to_unknown() {
        assert_eq!(request_id(&HeaderMap::new()), "unknown");

        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("abc"));
        assert_eq!(request_id(&headers), "abc");
    }

    #[tokio::test]
    async fn strips_leading_slash_and_keeps_raw_query() {
        let uri: Uri = "/v1beta/files/a%20b?x=1&x=2".parse().unwrap();
        let inbound = read_inbound(Method::PUT, &uri, Body::from("raw"), 1024)
            .await
            .unwrap();

        assert_eq!(inbound.method, Method::PUT);
        assert_eq!(inbound.path, "v1beta/files/a%20b");
        assert_eq!(inbound.query.as_deref(), Some("x=1&x=2"));
        assert_eq!(&inbound.body[..], b"raw");
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let uri: Uri = "/v1beta/models".parse().unwrap();
        let err = read_inbound(Method::POST, &uri, Body::from(vec![0u8; 64]), 16)
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::PayloadTooLarge { limit: 16 }));
    }
}
