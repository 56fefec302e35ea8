//! Local user registration and login.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use medwallet_store::UserProfile;

use crate::error::{ApiError, ErrorBody};
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterUserReq {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    /// One of `patient`, `clinician`, `admin`.
    pub role: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginReq {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenRes {
    pub access_token: String,
    pub token_type: String,
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterUserReq,
    responses(
        (status = 201, description = "User created"),
        (status = 409, description = "Email already registered", body = ErrorBody),
        (status = 422, description = "Invalid role", body = ErrorBody)
    )
)]
/// Register a local user account.
///
/// The password is hashed before storage; the response never echoes it.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterUserReq>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    let user = state
        .users
        .create(&req.email, &req.password, req.full_name.as_deref(), &req.role)
        .await?;
    Ok((StatusCode::CREATED, Json(user.to_profile())))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Bearer token issued", body = TokenRes),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    )
)]
/// Exchange credentials for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginReq>,
) -> Result<Json<TokenRes>, ApiError> {
    let Some(user) = state.users.authenticate(&req.email, &req.password).await? else {
        return Err(ApiError::unauthorized("Invalid credentials"));
    };

    let access_token = state.signer.issue(&user.id.to_string(), &user.role)?;
    tracing::info!(email = %req.email, "user logged in");
    Ok(Json(TokenRes {
        access_token,
        token_type: "bearer".to_string(),
    }))
}
