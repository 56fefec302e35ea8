//! FHIR Patient wire model and validation.
//!
//! Responsibilities:
//! - Define the strict wire model for Patient create/update payloads
//! - Enforce required fields and the administrative-gender value set
//! - Normalise values (gender lower-cased) before transmission
//!
//! The remote store owns the resource lifecycle; this model only guards what the
//! gateway transmits.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{ContactPoint, HumanName};
use crate::{from_value, FhirError, FhirResult};

const GENDERS: [&str; 4] = ["male", "female", "other", "unknown"];

/// Wire representation of a Patient create/replace payload.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PatientResource {
    #[serde(rename = "resourceType", default = "default_resource_type")]
    pub resource_type: String,

    /// Server-assigned id; present on updates, absent on creates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: Vec<HumanName>,

    pub gender: String,

    #[serde(rename = "birthDate")]
    pub birth_date: NaiveDate,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub telecom: Option<Vec<ContactPoint>>,
}

fn default_resource_type() -> String {
    "Patient".to_string()
}

impl PatientResource {
    /// Parse and validate a Patient payload from a JSON document.
    ///
    /// The returned resource has its gender normalised to lower case and is safe
    /// to serialise for transmission.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] when the document does not match the wire schema,
    /// `resourceType` is not `"Patient"`, the name list is empty, the gender is
    /// outside the administrative-gender value set, or the birth date is not in
    /// the past.
    pub fn parse(value: &Value) -> FhirResult<Self> {
        let mut resource: PatientResource = from_value(value)?;
        resource.validate()?;
        resource.gender = resource.gender.to_lowercase();
        Ok(resource)
    }

    fn validate(&self) -> FhirResult<()> {
        if self.resource_type != "Patient" {
            return Err(FhirError::invalid(
                "resourceType",
                format!("expected 'Patient', got '{}'", self.resource_type),
            ));
        }
        if self.name.is_empty() {
            return Err(FhirError::invalid("name", "at least one name is required"));
        }
        let gender = self.gender.to_lowercase();
        if !GENDERS.contains(&gender.as_str()) {
            return Err(FhirError::invalid(
                "gender",
                format!("'{}' is not one of {GENDERS:?}", self.gender),
            ));
        }
        let today = chrono::Utc::now().date_naive();
        if self.birth_date >= today {
            return Err(FhirError::invalid("birthDate", "must be in the past"));
        }
        Ok(())
    }

    /// Serialise for transmission to the remote store.
    pub fn to_value(&self) -> FhirResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Build the Patient payload created during CKD registration.
pub fn registration_patient(
    first_name: &str,
    last_name: &str,
    gender: &str,
    birth_date: NaiveDate,
) -> FhirResult<PatientResource> {
    let resource = PatientResource {
        resource_type: "Patient".to_string(),
        id: None,
        name: vec![HumanName {
            family: last_name.to_string(),
            given: vec![first_name.to_string()],
        }],
        gender: gender.to_lowercase(),
        birth_date,
        telecom: None,
    };
    resource.validate()?;
    Ok(resource)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_and_normalises_gender() {
        let value = json!({
            "resourceType": "Patient",
            "name": [{"family": "Williams", "given": ["Sarah"]}],
            "gender": "Female",
            "birthDate": "1992-03-20"
        });
        let patient = PatientResource::parse(&value).expect("parse patient");
        assert_eq!(patient.gender, "female");
        let echoed = patient.to_value().expect("serialise");
        assert_eq!(echoed["resourceType"], "Patient");
    }

    #[test]
    fn rejects_unknown_gender() {
        let value = json!({
            "resourceType": "Patient",
            "name": [{"family": "Williams"}],
            "gender": "none",
            "birthDate": "1992-03-20"
        });
        let err = PatientResource::parse(&value).expect_err("should reject gender");
        assert_eq!(err.field(), Some("gender"));
    }

    #[test]
    fn rejects_future_birth_date() {
        let value = json!({
            "resourceType": "Patient",
            "name": [{"family": "Williams"}],
            "gender": "female",
            "birthDate": "2999-01-01"
        });
        let err = PatientResource::parse(&value).expect_err("should reject birthDate");
        assert_eq!(err.field(), Some("birthDate"));
    }

    #[test]
    fn rejects_wrong_resource_type() {
        let value = json!({
            "resourceType": "Practitioner",
            "name": [{"family": "Williams"}],
            "gender": "female",
            "birthDate": "1992-03-20"
        });
        let err = PatientResource::parse(&value).expect_err("should reject resourceType");
        assert_eq!(err.field(), Some("resourceType"));
    }

    #[test]
    fn surfaces_path_to_bad_field() {
        let value = json!({
            "resourceType": "Patient",
            "name": [{"family": "Williams", "given": "not-an-array"}],
            "gender": "female",
            "birthDate": "1992-03-20"
        });
        let err = PatientResource::parse(&value).expect_err("should reject given");
        match err {
            FhirError::SchemaMismatch { path, .. } => assert!(path.contains("given")),
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }
}
