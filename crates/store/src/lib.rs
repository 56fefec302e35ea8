//! Relational shadow store for the Medical Wallet gateway.
//!
//! Postgres (via sqlx) holds the only locally authoritative data: user
//! accounts for the authentication layer, plus non-authoritative shadows of
//! remote FHIR Patients and their records (opaque documents with a type tag).
//! Rows are soft-deleted by setting `deleted_at`; no reconciliation against
//! the remote store is performed.

pub mod records;
pub mod shadow;
pub mod users;

pub use records::RecordStore;
pub use shadow::PatientShadowStore;
pub use users::{User, UserProfile, UserStore};

/// Errors returned by the relational store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("email '{0}' is already registered")]
    EmailTaken(String),

    #[error("'{0}' is not a valid role")]
    InvalidRole(String),

    #[error(transparent)]
    Auth(#[from] medwallet_auth::AuthError),
}

/// Type alias for Results that can fail with a [`StoreError`].
pub type StoreResult<T> = Result<T, StoreError>;
