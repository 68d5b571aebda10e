use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::identity::{Identity, IdentityProvider};
use crate::proxy::ProxyError;

/// Attach the caller's `Identity` to the request, if there is one.
pub async fn identify(
    State(provider): State<Arc<dyn IdentityProvider>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if let Some(identity) = provider.authenticate(request.headers()) {
        tracing::debug!(user = %identity.name, "Caller identified");
        request.extensions_mut().insert(identity);
    }
    next.run(request).await
}

/// Reject requests that `identify` could not attach an identity to.
pub async fn require_identity(request: Request<Body>, next: Next) -> Response {
    if request.extensions().get::<Identity>().is_none() {
        tracing::warn!(path = %request.uri().path(), "Unauthenticated request rejected");
        return ProxyError::Unauthenticated.into_response();
    }
    next.run(request).await
}
