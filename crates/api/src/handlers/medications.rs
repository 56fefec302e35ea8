//! Medication routes: CRUD passthrough plus the per-patient listing.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use crate::error::{ApiError, ErrorBody};
use crate::extract::CurrentUser;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/medications",
    responses(
        (status = 201, description = "Medication created at the record server"),
        (status = 422, description = "Payload failed validation", body = ErrorBody),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody)
    ),
    security(("bearer_token" = []))
)]
/// Record a new medication definition.
pub async fn create_medication(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let created = state.medications.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/medications/{id}",
    params(("id" = String, Path, description = "Medication resource id")),
    responses(
        (status = 200, description = "Medication resource"),
        (status = 404, description = "Medication not found", body = ErrorBody)
    ),
    security(("bearer_token" = []))
)]
pub async fn get_medication(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.medications.get(&id).await?))
}

#[utoipa::path(
    put,
    path = "/medications/{id}",
    params(("id" = String, Path, description = "Medication resource id")),
    responses(
        (status = 200, description = "Medication replaced"),
        (status = 422, description = "Payload failed validation", body = ErrorBody)
    ),
    security(("bearer_token" = []))
)]
pub async fn update_medication(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.medications.update(&id, &payload).await?))
}

#[utoipa::path(
    patch,
    path = "/medications/{id}",
    params(("id" = String, Path, description = "Medication resource id")),
    responses(
        (status = 200, description = "Medication partially updated")
    ),
    security(("bearer_token" = []))
)]
pub async fn patch_medication(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
    Json(partial): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.medications.patch(&id, &partial).await?))
}

#[utoipa::path(
    delete,
    path = "/medications/{id}",
    params(("id" = String, Path, description = "Medication resource id")),
    responses(
        (status = 200, description = "Medication deleted")
    ),
    security(("bearer_token" = []))
)]
pub async fn delete_medication(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.medications.delete(&id).await?))
}

#[utoipa::path(
    get,
    path = "/medications/patient/{patient_id}",
    params(("patient_id" = String, Path, description = "Patient resource id")),
    responses(
        (status = 200, description = "Bundle of the patient's medications")
    ),
    security(("bearer_token" = []))
)]
/// List every medication recorded against a patient.
pub async fn list_patient_medications(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.medications.list_for_patient(&patient_id).await?))
}
