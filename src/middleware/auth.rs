use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::Principal;
use crate::error::ApiError;
use crate::services::RequestContext;
use crate::state::AppState;

/// Bearer authentication for everything under `/api/v1` except the public
/// auth routes. Verifies the token, resolves the live account behind it and
/// stores the resulting [`Principal`] in the request extensions.
///
/// Every failure is the same 401 to the client; the reason goes to the log.
pub async fn require_principal(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers).map_err(|msg| {
        tracing::debug!("Rejected request without usable credentials: {}", msg);
        ApiError::unauthorized("Authentication required")
    })?;

    let claims = state.services.auth.verify(token)?;
    let ctx = RequestContext::new(state.config.request_timeout());
    let principal = state.services.auth.resolve_principal(&ctx, &claims).await?;

    request.extensions_mut().insert(principal);
    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("Missing Authorization header")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        Some(_) => Err("Empty bearer token"),
        None => Err("Authorization header must use Bearer token format"),
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .copied()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}
