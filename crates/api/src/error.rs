//! Boundary error mapping.
//!
//! Every error kind from the core, store and auth layers maps to one HTTP
//! status and a structured `{error_code, message, details}` body. Upstream
//! resource-store failures are reported generically; the upstream status code
//! appears in `details` but no upstream internals leak.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use medwallet_auth::AuthError;
use medwallet_core::{ClientError, GatewayError};
use medwallet_store::StoreError;

/// The JSON body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error_code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// An HTTP-mapped error, ready to respond with.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error_code: &'static str,
    message: String,
    details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            error_code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Internal server error",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error_code: self.error_code.to_string(),
            message: self.message,
            details: self.details,
        });
        let mut response = (self.status, body).into_response();
        if self.status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, "Bearer".parse().expect("header"));
        }
        response
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Validation(validation) => {
                let details = validation
                    .field()
                    .map(|field| json!({ "field": field, "error": validation.to_string() }));
                let mut api = ApiError::new(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "VALIDATION_ERROR",
                    "Payload failed validation",
                );
                if let Some(details) = details {
                    api = api.with_details(details);
                }
                api
            }
            GatewayError::NotFound { resource_type, id } => ApiError::new(
                StatusCode::NOT_FOUND,
                "RESOURCE_NOT_FOUND",
                format!("{resource_type} {id} not found"),
            ),
            GatewayError::Client(ClientError::Timeout) => ApiError::new(
                StatusCode::GATEWAY_TIMEOUT,
                "UPSTREAM_TIMEOUT",
                "The record server did not respond in time",
            ),
            GatewayError::Client(ClientError::Status(status)) => ApiError::new(
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                "The record server rejected the request",
            )
            .with_details(json!({ "upstream_status": status })),
            GatewayError::Client(ClientError::Transport(_)) => ApiError::new(
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                "The record server could not be reached",
            ),
            GatewayError::RegistrationFailed { message, orphaned } => ApiError::new(
                StatusCode::BAD_GATEWAY,
                "REGISTRATION_FAILED",
                message,
            )
            .with_details(json!({ "orphaned": orphaned })),
            GatewayError::Config(message) => {
                tracing::error!(%message, "configuration error surfaced at the boundary");
                ApiError::internal()
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EmailTaken(email) => ApiError::new(
                StatusCode::CONFLICT,
                "EMAIL_TAKEN",
                format!("'{email}' is already registered"),
            ),
            StoreError::InvalidRole(role) => ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                "Payload failed validation",
            )
            .with_details(json!({ "field": "role", "error": format!("'{role}' is not a valid role") })),
            StoreError::Database(e) => {
                tracing::error!(error = %e, "database error");
                ApiError::internal()
            }
            StoreError::Auth(e) => {
                tracing::error!(error = %e, "password hashing error");
                ApiError::internal()
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Malformed | AuthError::BadSignature | AuthError::Expired => {
                ApiError::unauthorized("Invalid authentication credentials")
            }
            other => {
                tracing::error!(error = %other, "token signing error");
                ApiError::internal()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404_with_code() {
        let api: ApiError = GatewayError::NotFound {
            resource_type: "Patient".to_string(),
            id: "p-404".to_string(),
        }
        .into();
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert_eq!(api.error_code, "RESOURCE_NOT_FOUND");
        assert!(api.message.contains("p-404"));
    }

    #[test]
    fn upstream_status_appears_only_in_details() {
        let api: ApiError = GatewayError::Client(ClientError::Status(500)).into();
        assert_eq!(api.status, StatusCode::BAD_GATEWAY);
        assert_eq!(api.details, Some(json!({ "upstream_status": 500 })));
        assert!(!api.message.contains("500"));
    }

    #[test]
    fn validation_carries_field_details() {
        let api: ApiError = GatewayError::Validation(fhir::FhirError::InvalidField {
            field: "gender".to_string(),
            message: "bad".to_string(),
        })
        .into();
        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(api.details.as_ref().unwrap()["field"], "gender");
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let api: ApiError = AuthError::Expired.into();
        assert_eq!(api.status, StatusCode::UNAUTHORIZED);
    }
}
