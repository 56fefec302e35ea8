//! Patient resource service.

use fhir::PatientResource;
use reqwest::Method;
use serde_json::Value;

use crate::client::FhirClient;
use crate::error::GatewayResult;

use super::{require_object, shape_get_error};

#[derive(Clone)]
pub struct PatientApi {
    client: FhirClient,
}

impl PatientApi {
    pub fn new(client: FhirClient) -> Self {
        Self { client }
    }

    /// Validate and create a Patient resource.
    pub async fn create(&self, payload: &Value) -> GatewayResult<Value> {
        let resource = PatientResource::parse(payload)?;
        Ok(self
            .client
            .request(Method::POST, "Patient", Some(&resource.to_value()?))
            .await?)
    }

    /// Fetch a Patient by id. A 404 becomes a patient-specific not-found.
    pub async fn get(&self, id: &str) -> GatewayResult<Value> {
        self.client
            .request(Method::GET, &format!("Patient/{id}"), None)
            .await
            .map_err(|e| shape_get_error(e, "Patient", id))
    }

    /// Replace a Patient (PUT semantics), validated like create.
    pub async fn update(&self, id: &str, payload: &Value) -> GatewayResult<Value> {
        let resource = PatientResource::parse(payload)?;
        Ok(self
            .client
            .request(Method::PUT, &format!("Patient/{id}"), Some(&resource.to_value()?))
            .await?)
    }

    /// Merge only the supplied fields (PATCH semantics).
    pub async fn patch(&self, id: &str, partial: &Value) -> GatewayResult<Value> {
        require_object(partial)?;
        Ok(self
            .client
            .request(Method::PATCH, &format!("Patient/{id}"), Some(partial))
            .await?)
    }

    pub async fn delete(&self, id: &str) -> GatewayResult<Value> {
        Ok(self
            .client
            .request(Method::DELETE, &format!("Patient/{id}"), None)
            .await?)
    }

    /// Search patients by query parameters (e.g. `name`, `identifier`).
    pub async fn search(&self, params: &[(String, String)]) -> GatewayResult<Value> {
        let query = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let path = if query.is_empty() {
            "Patient".to_string()
        } else {
            format!("Patient?{query}")
        };
        Ok(self.client.request(Method::GET, &path, None).await?)
    }
}
