//! FHIR Condition wire model, validation and the CKD condition builder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codes::{
    self, CONDITION_CATEGORY_SYSTEM, CONDITION_CLINICAL_SYSTEM, CONDITION_VER_STATUS_SYSTEM,
};
use crate::types::{CodeableConcept, Coding, Reference};
use crate::{from_value, FhirError, FhirResult};

/// Wire representation of a Condition create/replace payload.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConditionResource {
    #[serde(rename = "resourceType", default = "default_resource_type")]
    pub resource_type: String,

    /// Server-assigned id; present on updates, absent on creates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "clinicalStatus")]
    pub clinical_status: CodeableConcept,

    #[serde(rename = "verificationStatus")]
    pub verification_status: CodeableConcept,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Vec<CodeableConcept>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<CodeableConcept>,

    pub code: CodeableConcept,

    pub subject: Reference,

    #[serde(
        rename = "onsetDateTime",
        default,
        with = "crate::datetime::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub onset_date_time: Option<DateTime<Utc>>,

    #[serde(
        rename = "abatementDateTime",
        default,
        with = "crate::datetime::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub abatement_date_time: Option<DateTime<Utc>>,

    #[serde(
        rename = "recordedDate",
        default,
        with = "crate::datetime::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub recorded_date: Option<DateTime<Utc>>,
}

fn default_resource_type() -> String {
    "Condition".to_string()
}

impl ConditionResource {
    /// Parse and validate a Condition payload from a JSON document.
    pub fn parse(value: &Value) -> FhirResult<Self> {
        let resource: ConditionResource = from_value(value)?;
        resource.validate()?;
        Ok(resource)
    }

    fn validate(&self) -> FhirResult<()> {
        if self.resource_type != "Condition" {
            return Err(FhirError::invalid(
                "resourceType",
                format!("expected 'Condition', got '{}'", self.resource_type),
            ));
        }
        self.code.require_coding("code")?;
        self.clinical_status.require_coding("clinicalStatus")?;
        self.verification_status
            .require_coding("verificationStatus")?;
        Ok(())
    }

    /// Serialise for transmission to the remote store.
    pub fn to_value(&self) -> FhirResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Build the active, confirmed, problem-list CKD Condition submitted during
/// registration, coded for the declared stage.
pub fn ckd_condition(patient_id: &str, stage: &str) -> ConditionResource {
    ConditionResource {
        resource_type: "Condition".to_string(),
        id: None,
        clinical_status: CodeableConcept::from_coding(Coding::new(
            CONDITION_CLINICAL_SYSTEM,
            "active",
            "Active",
        )),
        verification_status: CodeableConcept::from_coding(Coding::new(
            CONDITION_VER_STATUS_SYSTEM,
            "confirmed",
            "Confirmed",
        )),
        category: Some(vec![CodeableConcept::from_coding(Coding::new(
            CONDITION_CATEGORY_SYSTEM,
            "problem-list-item",
            "Problem List Item",
        ))]),
        severity: None,
        code: CodeableConcept::from_coding(codes::ckd_stage_coding(stage)),
        subject: Reference::patient(patient_id),
        onset_date_time: None,
        abatement_date_time: None,
        recorded_date: Some(Utc::now()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_stage_four_condition() {
        let condition = ckd_condition("p-1", "4");
        assert!(condition.code.has_code("431857002"));
        assert_eq!(condition.subject.reference, "Patient/p-1");
        assert!(condition.clinical_status.has_code("active"));
        assert!(condition.verification_status.has_code("confirmed"));
    }

    #[test]
    fn parses_minimal_condition() {
        let value = json!({
            "resourceType": "Condition",
            "clinicalStatus": {"coding": [{"system": CONDITION_CLINICAL_SYSTEM, "code": "active"}]},
            "verificationStatus": {"coding": [{"system": CONDITION_VER_STATUS_SYSTEM, "code": "confirmed"}]},
            "code": {"coding": [{"system": "http://snomed.info/sct", "code": "431855005"}]},
            "subject": {"reference": "Patient/p-2"}
        });
        let condition = ConditionResource::parse(&value).expect("parse condition");
        assert!(condition.code.has_code("431855005"));
    }

    #[test]
    fn accepts_offsetless_onset_datetime() {
        let value = json!({
            "resourceType": "Condition",
            "clinicalStatus": {"coding": [{"system": CONDITION_CLINICAL_SYSTEM, "code": "active"}]},
            "verificationStatus": {"coding": [{"system": CONDITION_VER_STATUS_SYSTEM, "code": "confirmed"}]},
            "code": {"coding": [{"system": "http://snomed.info/sct", "code": "431855005"}]},
            "subject": {"reference": "Patient/p-2"},
            "onsetDateTime": "2023-11-05T08:15:00"
        });
        let condition = ConditionResource::parse(&value).expect("offset-less onsetDateTime");
        let wire = condition.to_value().expect("serialise");
        assert_eq!(wire["onsetDateTime"], json!("2023-11-05T08:15:00Z"));
    }

    #[test]
    fn rejects_empty_code_coding() {
        let value = json!({
            "resourceType": "Condition",
            "clinicalStatus": {"coding": [{"code": "active"}]},
            "verificationStatus": {"coding": [{"code": "confirmed"}]},
            "code": {"coding": []},
            "subject": {"reference": "Patient/p-2"}
        });
        let err = ConditionResource::parse(&value).expect_err("should reject empty coding");
        assert_eq!(err.field(), Some("code"));
    }
}
