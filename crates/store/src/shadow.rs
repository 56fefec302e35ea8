//! Local shadows of remote FHIR Patient resources.
//!
//! A shadow row carries denormalised identity fields plus an opaque copy of
//! the FHIR document as it was created. The remote store stays the source of
//! truth; rows here exist so the gateway can associate local records with a
//! patient without another remote round trip.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::StoreResult;

/// One `patients` row.
#[derive(Clone, Debug, FromRow)]
pub struct PatientShadow {
    pub id: Uuid,
    /// Id of the Patient resource at the remote store.
    pub fhir_id: String,
    pub family: String,
    pub given: String,
    pub gender: String,
    pub birth_date: NaiveDate,
    /// Opaque copy of the FHIR document at creation time.
    pub resource: Json<Value>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct PatientShadowStore {
    pool: PgPool,
}

impl PatientShadowStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        fhir_id: &str,
        family: &str,
        given: &str,
        gender: &str,
        birth_date: NaiveDate,
        resource: &Value,
    ) -> StoreResult<PatientShadow> {
        let shadow = sqlx::query_as::<_, PatientShadow>(
            "INSERT INTO patients (id, fhir_id, family, given, gender, birth_date, resource) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(fhir_id)
        .bind(family)
        .bind(given)
        .bind(gender)
        .bind(birth_date)
        .bind(Json(resource.clone()))
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(fhir_id, "patient shadow created");
        Ok(shadow)
    }

    /// Find the live shadow for a remote Patient id.
    pub async fn find_by_fhir_id(&self, fhir_id: &str) -> StoreResult<Option<PatientShadow>> {
        let shadow = sqlx::query_as::<_, PatientShadow>(
            "SELECT * FROM patients WHERE fhir_id = $1 AND deleted_at IS NULL",
        )
        .bind(fhir_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(shadow)
    }

    /// Soft-delete the shadow for a remote Patient id, if one exists.
    pub async fn soft_delete_by_fhir_id(&self, fhir_id: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE patients SET deleted_at = NOW() \
             WHERE fhir_id = $1 AND deleted_at IS NULL",
        )
        .bind(fhir_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
