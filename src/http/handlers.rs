//! Request handlers.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Method, Request, Uri},
    response::{IntoResponse, Response},
    Json,
};

use crate::auth::Identity;
use crate::http::request::{read_inbound, request_id};
use crate::http::response::StatusMessage;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::proxy::{ensure_method, validate, ProxyError, UpstreamResponse};

/// `/`: report that the proxy is up. Never contacts upstream.
pub async fn root_handler(request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();

    let response = match ensure_method(request.method()) {
        Ok(()) => {
            let user = request
                .extensions()
                .get::<Identity>()
                .map(|identity| identity.name.clone());
            Json(StatusMessage::running(user)).into_response()
        }
        Err(err) => {
            metrics::record_error(err.kind());
            err.into_response()
        }
    };

    metrics::record_request(&method, response.status().as_u16(), start_time);
    response
}

/// `/{*path}`: validate, forward to upstream, relay the answer.
pub async fn proxy_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&headers).to_string();
    let method_str = method.to_string();
    let path = uri.path().trim_start_matches('/').to_string();

    let response = match forward(&state, method, &uri, &headers, body).await {
        Ok(upstream) => {
            tracing::info!(
                request_id = %request_id,
                path = %path,
                status = upstream.status.as_u16(),
                bytes = upstream.body.len(),
                "Upstream responded"
            );
            upstream.into_response()
        }
        Err(err) => {
            log_failure(&err, &request_id, &path);
            metrics::record_error(err.kind());
            err.into_response()
        }
    };

    metrics::record_request(&method_str, response.status().as_u16(), start_time);
    response
}

async fn forward(
    state: &AppState,
    method: Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: Body,
) -> Result<UpstreamResponse, ProxyError> {
    ensure_method(&method)?;

    // Cheap checks first; nothing is buffered for requests that will be refused.
    let api_key = validate(uri.path().trim_start_matches('/'), headers)?;
    tracing::info!(
        request_id = %request_id(headers),
        method = %method,
        path = %uri.path(),
        "Proxying request"
    );

    let inbound = read_inbound(method, uri, body, state.max_body_bytes).await?;
    state.forwarder.forward(&inbound, api_key).await
}

fn log_failure(err: &ProxyError, request_id: &str, path: &str) {
    match err {
        ProxyError::InvalidPath { path } => {
            tracing::warn!(request_id = %request_id, path = %path, "Ignoring request for invalid path");
        }
        ProxyError::UpstreamConnection(_) | ProxyError::Internal(_) => {
            tracing::error!(
                request_id = %request_id,
                path = %path,
                error = %err,
                details = %err.details().unwrap_or_default(),
                "Forwarding failed"
            );
        }
        _ => {
            tracing::warn!(request_id = %request_id, path = %path, error = %err, "Request rejected");
        }
    }
}
