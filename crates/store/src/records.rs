//! Records: opaque FHIR documents owned by a shadow patient.
//!
//! Each row wraps one document plus a record-type tag (e.g. `"egfr"` for a
//! registration lab). The document is never interpreted locally.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::StoreResult;

/// One `records` row.
#[derive(Clone, Debug, FromRow)]
pub struct Record {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub record_type: String,
    pub resource: Json<Value>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct RecordStore {
    pool: PgPool,
}

impl RecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        patient_id: Uuid,
        record_type: &str,
        resource: &Value,
    ) -> StoreResult<Record> {
        let record = sqlx::query_as::<_, Record>(
            "INSERT INTO records (id, patient_id, record_type, resource) \
             VALUES ($1, $2, $3, $4) \
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(patient_id)
        .bind(record_type)
        .bind(Json(resource.clone()))
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(%patient_id, record_type, "record stored");
        Ok(record)
    }

    /// Live records for a shadow patient, newest first.
    pub async fn list_for_patient(&self, patient_id: Uuid) -> StoreResult<Vec<Record>> {
        let records = sqlx::query_as::<_, Record>(
            "SELECT * FROM records \
             WHERE patient_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at DESC",
        )
        .bind(patient_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// Soft-delete all live records for a shadow patient.
    pub async fn soft_delete_for_patient(&self, patient_id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE records SET deleted_at = NOW() \
             WHERE patient_id = $1 AND deleted_at IS NULL",
        )
        .bind(patient_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
