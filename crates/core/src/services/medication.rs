//! Medication resource service.
//!
//! Shaping rule: a null manufacturer reference is stripped (not sent as null);
//! the wire model in the `fhir` crate enforces this on serialisation.

use fhir::MedicationResource;
use reqwest::Method;
use serde_json::Value;

use crate::client::FhirClient;
use crate::error::GatewayResult;

use super::{require_object, shape_get_error};

#[derive(Clone)]
pub struct MedicationApi {
    client: FhirClient,
}

impl MedicationApi {
    pub fn new(client: FhirClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, payload: &Value) -> GatewayResult<Value> {
        let resource = MedicationResource::parse(payload)?;
        Ok(self
            .client
            .request(Method::POST, "Medication", Some(&resource.to_value()?))
            .await?)
    }

    pub async fn get(&self, id: &str) -> GatewayResult<Value> {
        self.client
            .request(Method::GET, &format!("Medication/{id}"), None)
            .await
            .map_err(|e| shape_get_error(e, "Medication", id))
    }

    pub async fn update(&self, id: &str, payload: &Value) -> GatewayResult<Value> {
        let resource = MedicationResource::parse(payload)?;
        Ok(self
            .client
            .request(
                Method::PUT,
                &format!("Medication/{id}"),
                Some(&resource.to_value()?),
            )
            .await?)
    }

    pub async fn patch(&self, id: &str, partial: &Value) -> GatewayResult<Value> {
        require_object(partial)?;
        Ok(self
            .client
            .request(Method::PATCH, &format!("Medication/{id}"), Some(partial))
            .await?)
    }

    pub async fn delete(&self, id: &str) -> GatewayResult<Value> {
        Ok(self
            .client
            .request(Method::DELETE, &format!("Medication/{id}"), None)
            .await?)
    }

    /// All medications whose subject is the given patient (a search bundle).
    pub async fn list_for_patient(&self, patient_id: &str) -> GatewayResult<Value> {
        Ok(self
            .client
            .request(
                Method::GET,
                &format!("Medication?subject=Patient/{patient_id}"),
                None,
            )
            .await?)
    }
}
