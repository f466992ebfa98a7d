use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use souk_auth::{JwtValidator, Principal};

use crate::context::Caller;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

impl AuthState {
    fn principal(&self, token: &str) -> Result<Principal, StatusCode> {
        let claims = self
            .jwt
            .validate(token, Utc::now().timestamp())
            .map_err(|e| {
                tracing::debug!(error = %e, "bearer token rejected");
                StatusCode::UNAUTHORIZED
            })?;
        Ok(claims.principal())
    }
}

/// Requires a valid bearer token and inserts the caller's [`Principal`].
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = extract_bearer(req.headers())?.ok_or(StatusCode::UNAUTHORIZED)?;
    let principal = state.principal(token)?;

    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

/// Public routes: a missing token yields an anonymous [`Caller`], a bad one is still 401.
pub async fn optional_auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let caller = match extract_bearer(req.headers())? {
        Some(token) => Caller::authenticated(state.principal(token)?),
        None => Caller::anonymous(),
    };

    req.extensions_mut().insert(caller);

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, StatusCode> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(Some(token))
}
