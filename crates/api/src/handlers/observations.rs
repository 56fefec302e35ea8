//! Observation routes: CRUD passthrough plus the per-patient listing.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use crate::error::{ApiError, ErrorBody};
use crate::extract::CurrentUser;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/observations",
    responses(
        (status = 201, description = "Observation created at the record server"),
        (status = 422, description = "Payload failed validation", body = ErrorBody),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody)
    ),
    security(("bearer_token" = []))
)]
/// Record a new observation (lab result, vital sign) for a patient.
pub async fn create_observation(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let created = state.observations.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/observations/{id}",
    params(("id" = String, Path, description = "Observation resource id")),
    responses(
        (status = 200, description = "Observation resource"),
        (status = 404, description = "Observation not found", body = ErrorBody)
    ),
    security(("bearer_token" = []))
)]
pub async fn get_observation(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.observations.get(&id).await?))
}

#[utoipa::path(
    put,
    path = "/observations/{id}",
    params(("id" = String, Path, description = "Observation resource id")),
    responses(
        (status = 200, description = "Observation replaced"),
        (status = 422, description = "Payload failed validation", body = ErrorBody)
    ),
    security(("bearer_token" = []))
)]
pub async fn update_observation(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.observations.update(&id, &payload).await?))
}

#[utoipa::path(
    patch,
    path = "/observations/{id}",
    params(("id" = String, Path, description = "Observation resource id")),
    responses(
        (status = 200, description = "Observation partially updated")
    ),
    security(("bearer_token" = []))
)]
pub async fn patch_observation(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
    Json(partial): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.observations.patch(&id, &partial).await?))
}

#[utoipa::path(
    delete,
    path = "/observations/{id}",
    params(("id" = String, Path, description = "Observation resource id")),
    responses(
        (status = 200, description = "Observation deleted")
    ),
    security(("bearer_token" = []))
)]
pub async fn delete_observation(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.observations.delete(&id).await?))
}

#[utoipa::path(
    get,
    path = "/observations/patient/{patient_id}",
    params(("patient_id" = String, Path, description = "Patient resource id")),
    responses(
        (status = 200, description = "Bundle of the patient's observations")
    ),
    security(("bearer_token" = []))
)]
/// List every observation recorded against a patient.
pub async fn list_patient_observations(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.observations.list_for_patient(&patient_id).await?))
}
