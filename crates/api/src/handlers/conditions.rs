//! Condition routes: CRUD passthrough plus the per-patient listing.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use crate::error::{ApiError, ErrorBody};
use crate::extract::CurrentUser;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/conditions",
    responses(
        (status = 201, description = "Condition created at the record server"),
        (status = 422, description = "Payload failed validation", body = ErrorBody),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody)
    ),
    security(("bearer_token" = []))
)]
/// Record a new condition (diagnosis) for a patient.
pub async fn create_condition(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let created = state.conditions.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/conditions/{id}",
    params(("id" = String, Path, description = "Condition resource id")),
    responses(
        (status = 200, description = "Condition resource"),
        (status = 404, description = "Condition not found", body = ErrorBody)
    ),
    security(("bearer_token" = []))
)]
pub async fn get_condition(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.conditions.get(&id).await?))
}

#[utoipa::path(
    put,
    path = "/conditions/{id}",
    params(("id" = String, Path, description = "Condition resource id")),
    responses(
        (status = 200, description = "Condition replaced"),
        (status = 422, description = "Payload failed validation", body = ErrorBody)
    ),
    security(("bearer_token" = []))
)]
pub async fn update_condition(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.conditions.update(&id, &payload).await?))
}

#[utoipa::path(
    patch,
    path = "/conditions/{id}",
    params(("id" = String, Path, description = "Condition resource id")),
    responses(
        (status = 200, description = "Condition partially updated")
    ),
    security(("bearer_token" = []))
)]
pub async fn patch_condition(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
    Json(partial): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.conditions.patch(&id, &partial).await?))
}

#[utoipa::path(
    delete,
    path = "/conditions/{id}",
    params(("id" = String, Path, description = "Condition resource id")),
    responses(
        (status = 200, description = "Condition deleted")
    ),
    security(("bearer_token" = []))
)]
pub async fn delete_condition(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.conditions.delete(&id).await?))
}

#[utoipa::path(
    get,
    path = "/conditions/patient/{patient_id}",
    params(("patient_id" = String, Path, description = "Patient resource id")),
    responses(
        (status = 200, description = "Bundle of the patient's conditions")
    ),
    security(("bearer_token" = []))
)]
/// List every condition recorded against a patient.
pub async fn list_patient_conditions(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.conditions.list_for_patient(&patient_id).await?))
}
