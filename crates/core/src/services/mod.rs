//! Per-resource-type services over the FHIR client.
//!
//! Each service validates and shapes its resource's payload before submission
//! and exposes create/get/update/patch/delete plus a type-specific list or
//! search. `ClientError`s propagate unchanged except for the 404
//! re-shaping on `get`, which becomes a resource-specific not-found.

mod condition;
mod medication;
mod observation;
mod patient;

pub use condition::ConditionApi;
pub use medication::MedicationApi;
pub use observation::ObservationApi;
pub use patient::PatientApi;

use serde_json::Value;

use crate::error::{GatewayError, GatewayResult};

/// Require a JSON object for PATCH bodies.
///
/// Partial documents pass through untouched so that only the keys the caller
/// supplied are transmitted ("not provided" stays distinct from "explicitly
/// cleared").
pub(crate) fn require_object(partial: &Value) -> GatewayResult<()> {
    if !partial.is_object() {
        return Err(GatewayError::Validation(fhir::FhirError::InvalidField {
            field: "<root>".to_string(),
            message: "patch body must be a JSON object".to_string(),
        }));
    }
    Ok(())
}

/// Re-shape a 404 from a `get` into a resource-specific not-found.
pub(crate) fn shape_get_error(
    err: crate::error::ClientError,
    resource_type: &str,
    id: &str,
) -> GatewayError {
    if err.is_not_found() {
        GatewayError::not_found(resource_type, id)
    } else {
        GatewayError::Client(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patch_body_must_be_an_object() {
        assert!(require_object(&json!({"status": "inactive"})).is_ok());
        assert!(require_object(&json!(["status"])).is_err());
        assert!(require_object(&json!("status")).is_err());
    }

    #[test]
    fn only_404_reshapes_to_not_found() {
        let err = shape_get_error(crate::error::ClientError::Status(404), "Patient", "p-1");
        assert!(matches!(err, GatewayError::NotFound { .. }));

        let err = shape_get_error(crate::error::ClientError::Status(500), "Patient", "p-1");
        assert!(matches!(
            err,
            GatewayError::Client(crate::error::ClientError::Status(500))
        ));
    }
}
