//! FHIR wire/boundary support for the Medical Wallet gateway.
//!
//! This crate provides **wire models** and **validation/translation helpers** for the
//! FHIR JSON resources the gateway proxies to the remote record server:
//! - Patient, Condition, Observation and Medication payloads
//!
//! This crate focuses on:
//! - strict payload validation before transmission (required fields, value sets)
//! - serialisation/deserialisation of the FHIR JSON shapes
//! - building the CKD condition and lab observation resources the registration
//!   flow submits
//!
//! It deliberately does **not** contain transport concerns; the HTTP client that
//! carries these documents lives in `medwallet-core`.

pub mod codes;
pub mod condition;
pub mod datetime;
pub mod medication;
pub mod observation;
pub mod patient;
pub mod types;

// Re-export resource facades
pub use condition::ConditionResource;
pub use medication::MedicationResource;
pub use observation::ObservationResource;
pub use patient::PatientResource;

// Re-export public data shapes
pub use medication::MedicationStatus;
pub use observation::{LabValue, ObservationStatus};
pub use types::{CodeableConcept, Coding, ContactPoint, HumanName, Quantity, Reference};

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid {field}: {message}")]
    InvalidField { field: String, message: String },

    #[error("schema mismatch at {path}: {message}")]
    SchemaMismatch { path: String, message: String },

    #[error("serialisation failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FhirError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        FhirError::InvalidField {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// The offending field, where the error is attributable to one.
    pub fn field(&self) -> Option<&str> {
        match self {
            FhirError::InvalidField { field, .. } => Some(field),
            FhirError::SchemaMismatch { path, .. } => Some(path),
            FhirError::Serialization(_) => None,
        }
    }
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;

/// Deserialize a JSON document into a wire struct, surfacing the path to the
/// failing field (e.g. `name.0.family`) rather than a bare serde message.
pub(crate) fn from_value<T: serde::de::DeserializeOwned>(
    value: &serde_json::Value,
) -> FhirResult<T> {
    serde_path_to_error::deserialize(value).map_err(|err| {
        let path = err.path().to_string();
        let path = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        FhirError::SchemaMismatch {
            path,
            message: err.into_inner().to_string(),
        }
    })
}
