//! FHIR Observation wire model, the status value set, and the lab observation
//! builder used by CKD registration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codes::{self, OBSERVATION_CATEGORY_SYSTEM, UCUM_SYSTEM};
use crate::types::{CodeableConcept, Coding, Quantity, Reference};
use crate::{from_value, FhirError, FhirResult};

/// The FHIR observation status value set.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ObservationStatus {
    Registered,
    Preliminary,
    Final,
    Amended,
    Corrected,
    Cancelled,
    EnteredInError,
    Unknown,
}

/// Wire representation of an Observation create/replace payload.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ObservationResource {
    #[serde(rename = "resourceType", default = "default_resource_type")]
    pub resource_type: String,

    /// Server-assigned id; present on updates, absent on creates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub status: ObservationStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Vec<CodeableConcept>>,

    pub code: CodeableConcept,

    pub subject: Reference,

    #[serde(
        rename = "effectiveDateTime",
        default,
        with = "crate::datetime::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub effective_date_time: Option<DateTime<Utc>>,

    #[serde(rename = "valueQuantity", skip_serializing_if = "Option::is_none")]
    pub value_quantity: Option<Quantity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<Vec<CodeableConcept>>,
}

fn default_resource_type() -> String {
    "Observation".to_string()
}

impl ObservationResource {
    /// Parse and validate an Observation payload from a JSON document.
    ///
    /// Status values outside the FHIR value set are rejected during
    /// deserialisation; `code` must carry at least one coding.
    pub fn parse(value: &Value) -> FhirResult<Self> {
        let resource: ObservationResource = from_value(value)?;
        resource.validate()?;
        Ok(resource)
    }

    fn validate(&self) -> FhirResult<()> {
        if self.resource_type != "Observation" {
            return Err(FhirError::invalid(
                "resourceType",
                format!("expected 'Observation', got '{}'", self.resource_type),
            ));
        }
        self.code.require_coding("code")?;
        Ok(())
    }

    /// Serialise for transmission to the remote store.
    pub fn to_value(&self) -> FhirResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// An initial lab value supplied at CKD registration time.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct LabValue {
    /// Lab type: `"egfr"`, `"creatinine"` or `"bun"`.
    #[serde(rename = "type")]
    pub lab_type: String,

    pub value: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(
        default,
        with = "crate::datetime::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<DateTime<Utc>>,
}

/// Build a final laboratory Observation for a registration lab value.
///
/// The unit defaults to `mg/dL` and the effective time to now.
///
/// # Errors
///
/// Returns [`FhirError`] when the lab type is not one of the renal lab types.
pub fn lab_observation(patient_id: &str, lab: &LabValue) -> FhirResult<ObservationResource> {
    let coding = codes::lab_coding(&lab.lab_type).ok_or_else(|| {
        FhirError::invalid(
            "type",
            format!("'{}' is not a known lab type", lab.lab_type),
        )
    })?;

    Ok(ObservationResource {
        resource_type: "Observation".to_string(),
        id: None,
        status: ObservationStatus::Final,
        category: Some(vec![CodeableConcept::from_coding(Coding::new(
            OBSERVATION_CATEGORY_SYSTEM,
            "laboratory",
            "Laboratory",
        ))]),
        code: CodeableConcept::from_coding(coding),
        subject: Reference::patient(patient_id),
        effective_date_time: Some(lab.date.unwrap_or_else(Utc::now)),
        value_quantity: Some(Quantity {
            value: lab.value,
            unit: Some(lab.unit.clone().unwrap_or_else(|| "mg/dL".to_string())),
            system: Some(UCUM_SYSTEM.to_string()),
            code: None,
        }),
        interpretation: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_egfr_observation() {
        let lab = LabValue {
            lab_type: "egfr".to_string(),
            value: 25.0,
            unit: None,
            date: None,
        };
        let obs = lab_observation("p-1", &lab).expect("build observation");
        assert!(obs.code.has_code(codes::EGFR_CODE));
        assert_eq!(obs.status, ObservationStatus::Final);
        let quantity = obs.value_quantity.expect("quantity");
        assert_eq!(quantity.value, 25.0);
        assert_eq!(quantity.unit.as_deref(), Some("mg/dL"));
    }

    #[test]
    fn rejects_unknown_lab_type() {
        let lab = LabValue {
            lab_type: "potassium".to_string(),
            value: 4.1,
            unit: None,
            date: None,
        };
        let err = lab_observation("p-1", &lab).expect_err("should reject lab type");
        assert_eq!(err.field(), Some("type"));
    }

    #[test]
    fn rejects_status_outside_value_set() {
        let value = json!({
            "resourceType": "Observation",
            "status": "pending",
            "code": {"coding": [{"system": "http://loinc.org", "code": "48642-3"}]},
            "subject": {"reference": "Patient/p-1"}
        });
        let err = ObservationResource::parse(&value).expect_err("should reject status");
        match err {
            FhirError::SchemaMismatch { path, .. } => assert!(path.contains("status")),
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn accepts_date_only_effective_datetime() {
        let value = json!({
            "resourceType": "Observation",
            "status": "final",
            "code": {"coding": [{"system": "http://loinc.org", "code": "48642-3"}]},
            "subject": {"reference": "Patient/p-1"},
            "effectiveDateTime": "2024-03-01"
        });
        let obs = ObservationResource::parse(&value).expect("date-only effectiveDateTime");
        let wire = obs.to_value().expect("serialise");
        assert_eq!(wire["effectiveDateTime"], json!("2024-03-01T00:00:00Z"));
    }

    #[test]
    fn lab_value_date_accepts_partial_precision() {
        let lab: LabValue = serde_json::from_value(json!({
            "type": "creatinine",
            "value": 2.1,
            "date": "2024-03"
        }))
        .expect("partial-precision date");
        assert_eq!(
            lab.date.expect("date").to_rfc3339(),
            "2024-03-01T00:00:00+00:00"
        );
    }

    #[test]
    fn status_serialises_kebab_case() {
        let value = serde_json::to_value(ObservationStatus::EnteredInError).expect("serialise");
        assert_eq!(value, json!("entered-in-error"));
    }
}
