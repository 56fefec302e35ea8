//! FHIR Medication wire model and validation.
//!
//! The one shaping rule beyond required fields: an absent or null `manufacturer`
//! reference is stripped rather than transmitted as null, which some FHIR
//! servers reject.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{CodeableConcept, Reference};
use crate::{from_value, FhirError, FhirResult};

/// The FHIR medication status value set.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MedicationStatus {
    Active,
    Inactive,
    EnteredInError,
}

/// Wire representation of a Medication create/replace payload.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MedicationResource {
    #[serde(rename = "resourceType", default = "default_resource_type")]
    pub resource_type: String,

    /// Server-assigned id; present on updates, absent on creates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub code: CodeableConcept,

    #[serde(default = "default_status")]
    pub status: MedicationStatus,

    // serialisation skips None, so a cleared manufacturer is never sent as null
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<Reference>,
}

fn default_resource_type() -> String {
    "Medication".to_string()
}

fn default_status() -> MedicationStatus {
    MedicationStatus::Active
}

impl MedicationResource {
    /// Parse and validate a Medication payload from a JSON document.
    pub fn parse(value: &Value) -> FhirResult<Self> {
        // Tolerate an explicit null manufacturer: drop the key before strict
        // deserialisation.
        let resource: MedicationResource = if value.get("manufacturer") == Some(&Value::Null) {
            let mut trimmed = value.clone();
            if let Some(obj) = trimmed.as_object_mut() {
                obj.remove("manufacturer");
            }
            from_value(&trimmed)?
        } else {
            from_value(value)?
        };
        resource.validate()?;
        Ok(resource)
    }

    fn validate(&self) -> FhirResult<()> {
        if self.resource_type != "Medication" {
            return Err(FhirError::invalid(
                "resourceType",
                format!("expected 'Medication', got '{}'", self.resource_type),
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_manufacturer_is_stripped() {
        let value = json!({
            "resourceType": "Medication",
            "code": {"coding": [{"system": "http://www.nlm.nih.gov/research/umls/rxnorm", "code": "197361"}]},
            "status": "active",
            "manufacturer": null
        });
        let medication = MedicationResource::parse(&value).expect("parse medication");
        assert!(medication.manufacturer.is_none());

        let wire = medication.to_value().expect("serialise");
        assert!(wire.get("manufacturer").is_none());
    }

    #[test]
    fn status_defaults_to_active() {
        let value = json!({
            "resourceType": "Medication",
            "code": {"coding": [{"code": "197361"}]}
        });
        let medication = MedicationResource::parse(&value).expect("parse medication");
        assert_eq!(medication.status, MedicationStatus::Active);
    }

    #[test]
    fn rejects_status_outside_value_set() {
        let value = json!({
            "resourceType": "Medication",
            "code": {"coding": [{"code": "197361"}]},
            "status": "discontinued"
        });
        assert!(MedicationResource::parse(&value).is_err());
    }
}
