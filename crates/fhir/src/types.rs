//! Shared FHIR data shapes used across resource payloads.
//!
//! These match the JSON structures of the FHIR specification closely enough for
//! pass-through proxying; the gateway validates what it relies upon and forwards
//! the rest untouched.

use serde::{Deserialize, Serialize};

use crate::{FhirError, FhirResult};

/// One entry of a [`CodeableConcept`]'s coding list.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Coding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    pub fn new(system: &str, code: &str, display: &str) -> Self {
        Self {
            system: Some(system.to_string()),
            code: Some(code.to_string()),
            display: Some(display.to_string()),
        }
    }
}

/// A coded value: an ordered, non-empty list of codings plus optional free text.
///
/// When searching a concept for a known code, the first matching coding wins.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CodeableConcept {
    pub coding: Vec<Coding>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    pub fn from_coding(coding: Coding) -> Self {
        Self {
            coding: vec![coding],
            text: None,
        }
    }

    /// True when any coding carries the given code.
    pub fn has_code(&self, code: &str) -> bool {
        self.coding
            .iter()
            .any(|c| c.code.as_deref() == Some(code))
    }

    pub(crate) fn require_coding(&self, field: &str) -> FhirResult<()> {
        if self.coding.is_empty() {
            return Err(FhirError::invalid(field, "coding list must not be empty"));
        }
        Ok(())
    }
}

/// A pointer to another resource, e.g. `"Patient/123"`.
///
/// No referential integrity is enforced locally; a broken reference surfaces only
/// when the remote store rejects it.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Reference {
    pub reference: String,
}

impl Reference {
    /// Build a `Patient/{id}` subject reference.
    pub fn patient(patient_id: &str) -> Self {
        Self {
            reference: format!("Patient/{patient_id}"),
        }
    }
}

/// A measured quantity, attached to an Observation's `valueQuantity`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Quantity {
    pub value: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// A human name as carried on Patient resources.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HumanName {
    pub family: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
}

/// A contact point (phone, email, ...) on a Patient resource.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ContactPoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concept_matches_any_coding() {
        let concept = CodeableConcept {
            coding: vec![
                Coding::new("http://snomed.info/sct", "431855005", "CKD stage 1"),
                Coding::new("http://snomed.info/sct", "431857002", "CKD stage 4"),
            ],
            text: None,
        };
        assert!(concept.has_code("431857002"));
        assert!(!concept.has_code("999999"));
    }

    #[test]
    fn patient_reference_shape() {
        assert_eq!(Reference::patient("abc-1").reference, "Patient/abc-1");
    }
}
