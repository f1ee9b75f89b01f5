use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::COOKIE, request::Parts},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;

use super::session::{TenantContext, TenantIdentity, resolve_session, session_token_from_cookie_header};
use crate::server::AppState;

/// Extractor that requires a validated tenant session.
pub struct RequireTenant(pub TenantIdentity);

/// The single externally visible authentication failure. A missing cookie,
/// an unknown token and an expired token all produce this same response.
#[derive(Debug)]
pub struct AuthError;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = json!({ "data": null, "error": "Authentication required" });
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

impl FromRequestParts<Arc<AppState>> for RequireTenant {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let cookie_header = parts.headers.get(COOKIE).and_then(|h| h.to_str().ok());
        let token = session_token_from_cookie_header(cookie_header);

        match resolve_session(state.store.as_ref(), token.as_deref(), Utc::now()) {
            TenantContext::Valid(identity) => Ok(RequireTenant(identity)),
            TenantContext::Invalid => Err(AuthError),
        }
    }
}
