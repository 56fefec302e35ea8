//! Bearer-token extraction for protected routes.
//!
//! Handlers that take a [`CurrentUser`] argument require a valid
//! `Authorization: Bearer` header; absence or an invalid/expired token yields
//! a 401 with a `WWW-Authenticate: Bearer` header.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::ApiError;
use crate::AppState;

/// The authenticated caller, as proven by their bearer token.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: String,
    pub role: String,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Expected a bearer token"))?;

        let claims = state.signer.verify(token)?;
        Ok(CurrentUser {
            id: claims.sub,
            role: claims.role,
        })
    }
}
