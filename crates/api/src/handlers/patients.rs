//! Patient routes: CRUD proxying, search, and the CKD composites.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use fhir::LabValue;
use medwallet_core::{CkdRegistered, CkdRegistration};

use crate::error::{ApiError, ErrorBody};
use crate::extract::CurrentUser;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/patients",
    responses(
        (status = 201, description = "Patient created at the record server"),
        (status = 422, description = "Payload failed validation", body = ErrorBody),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody)
    ),
    security(("bearer_token" = []))
)]
/// Register a new patient at the remote record server.
pub async fn create_patient(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let created = state.patients.create(&payload).await?;
    tracing::info!(user = %user.id, patient = ?created["id"].as_str(), "patient created");
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Deserialize)]
pub struct PatientSearchQuery {
    pub name: Option<String>,
    pub identifier: Option<String>,
}

#[utoipa::path(
    get,
    path = "/patients",
    params(
        ("name" = Option<String>, Query, description = "Name to search for"),
        ("identifier" = Option<String>, Query, description = "Identifier to search for")
    ),
    responses(
        (status = 200, description = "Search bundle"),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody)
    ),
    security(("bearer_token" = []))
)]
/// Search patients by name or identifier.
pub async fn search_patients(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<PatientSearchQuery>,
) -> Result<Json<Value>, ApiError> {
    let mut params = Vec::new();
    if let Some(name) = query.name {
        params.push(("name".to_string(), name));
    }
    if let Some(identifier) = query.identifier {
        params.push(("identifier".to_string(), identifier));
    }
    Ok(Json(state.patients.search(&params).await?))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient resource id")),
    responses(
        (status = 200, description = "Patient resource"),
        (status = 404, description = "Patient not found", body = ErrorBody),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody)
    ),
    security(("bearer_token" = []))
)]
/// Retrieve a patient's FHIR resource by id.
pub async fn get_patient(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.patients.get(&id).await?))
}

#[utoipa::path(
    put,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient resource id")),
    responses(
        (status = 200, description = "Patient replaced"),
        (status = 422, description = "Payload failed validation", body = ErrorBody)
    ),
    security(("bearer_token" = []))
)]
pub async fn update_patient(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.patients.update(&id, &payload).await?))
}

#[utoipa::path(
    patch,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient resource id")),
    responses(
        (status = 200, description = "Patient partially updated")
    ),
    security(("bearer_token" = []))
)]
/// Merge only the supplied fields into a patient.
pub async fn patch_patient(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
    Json(partial): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.patients.patch(&id, &partial).await?))
}

#[utoipa::path(
    delete,
    path = "/patients/{id}",
    params(("id" = String, Path, description = "Patient resource id")),
    responses(
        (status = 200, description = "Patient deleted")
    ),
    security(("bearer_token" = []))
)]
/// Delete a patient at the record server, soft-deleting any local shadow.
pub async fn delete_patient(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let result = state.patients.delete(&id).await?;

    // The shadow is non-authoritative; losing the soft delete is logged, not fatal.
    match state.shadows.find_by_fhir_id(&id).await {
        Ok(Some(shadow)) => {
            if let Err(e) = state.records.soft_delete_for_patient(shadow.id).await {
                tracing::warn!(fhir_id = %id, error = %e, "failed to soft-delete records");
            }
            if let Err(e) = state.shadows.soft_delete_by_fhir_id(&id).await {
                tracing::warn!(fhir_id = %id, error = %e, "failed to soft-delete shadow");
            }
        }
        Ok(None) => (),
        Err(e) => tracing::warn!(fhir_id = %id, error = %e, "shadow lookup failed"),
    }

    tracing::info!(user = %user.id, fhir_id = %id, "patient deleted");
    Ok(Json(result))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CkdRegisterReq {
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    #[schema(value_type = String, format = Date)]
    pub birth_date: NaiveDate,
    /// Declared CKD stage; defaults to "3".
    pub ckd_stage: Option<String>,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub initial_labs: Vec<LabValue>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CkdRegisterRes {
    pub patient_id: String,
    pub condition_id: String,
    pub observation_ids: Vec<String>,
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/patients/ckd",
    request_body = CkdRegisterReq,
    responses(
        (status = 201, description = "CKD patient registered", body = CkdRegisterRes),
        (status = 422, description = "Payload failed validation", body = ErrorBody),
        (status = 502, description = "Registration failed; rollback attempted", body = ErrorBody)
    ),
    security(("bearer_token" = []))
)]
/// Register a CKD patient: patient, stage condition and initial labs.
pub async fn register_ckd_patient(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CkdRegisterReq>,
) -> Result<(StatusCode, Json<CkdRegisterRes>), ApiError> {
    let registration = CkdRegistration {
        first_name: req.first_name,
        last_name: req.last_name,
        gender: req.gender,
        birth_date: req.birth_date,
        ckd_stage: req.ckd_stage,
        initial_labs: req.initial_labs,
    };

    let registered = state.ckd.register(&registration).await?;
    persist_shadow(&state, &registration, &registered).await;

    tracing::info!(user = %user.id, patient_id = %registered.patient_id, "CKD patient registered");
    Ok((
        StatusCode::CREATED,
        Json(CkdRegisterRes {
            patient_id: registered.patient_id,
            condition_id: registered.condition_id,
            observation_ids: registered.observation_ids,
            message: registered.message,
        }),
    ))
}

/// Write the local shadow row and one record per created lab.
///
/// The shadow is non-authoritative, so store failures are logged rather than
/// failing a registration that already succeeded remotely.
async fn persist_shadow(
    state: &AppState,
    registration: &CkdRegistration,
    registered: &CkdRegistered,
) {
    let shadow = match state
        .shadows
        .create(
            &registered.patient_id,
            &registration.last_name,
            &registration.first_name,
            &registration.gender,
            registration.birth_date,
            &registered.patient,
        )
        .await
    {
        Ok(shadow) => shadow,
        Err(e) => {
            tracing::warn!(patient_id = %registered.patient_id, error = %e, "shadow write failed");
            return;
        }
    };

    for (lab_type, document) in &registered.labs {
        if let Err(e) = state.records.create(shadow.id, lab_type, document).await {
            tracing::warn!(patient_id = %registered.patient_id, lab_type, error = %e, "record write failed");
        }
    }
}

#[utoipa::path(
    get,
    path = "/patients/{id}/ckd-summary",
    params(("id" = String, Path, description = "Patient resource id")),
    responses(
        (status = 200, description = "Aggregated CKD summary"),
        (status = 404, description = "Patient not found", body = ErrorBody)
    ),
    security(("bearer_token" = []))
)]
/// Aggregate and return the CKD-specific summary for a patient.
pub async fn ckd_summary(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let summary = state.ckd.summarize(&id).await?;
    let body = serde_json::to_value(&summary).map_err(|e| {
        tracing::error!(error = %e, "summary serialisation failed");
        ApiError::internal()
    })?;
    Ok(Json(body))
}
