//! Observation resource service.

use fhir::ObservationResource;
use reqwest::Method;
use serde_json::Value;

use crate::client::FhirClient;
use crate::error::GatewayResult;

use super::{require_object, shape_get_error};

#[derive(Clone)]
pub struct ObservationApi {
    client: FhirClient,
}

impl ObservationApi {
    pub fn new(client: FhirClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, payload: &Value) -> GatewayResult<Value> {
        let resource = ObservationResource::parse(payload)?;
        Ok(self
            .client
            .request(Method::POST, "Observation", Some(&resource.to_value()?))
            .await?)
    }

    pub async fn get(&self, id: &str) -> GatewayResult<Value> {
        self.client
            .request(Method::GET, &format!("Observation/{id}"), None)
            .await
            .map_err(|e| shape_get_error(e, "Observation", id))
    }

    pub async fn update(&self, id: &str, payload: &Value) -> GatewayResult<Value> {
        let resource = ObservationResource::parse(payload)?;
        Ok(self
            .client
            .request(
                Method::PUT,
                &format!("Observation/{id}"),
                Some(&resource.to_value()?),
            )
            .await?)
    }

    pub async fn patch(&self, id: &str, partial: &Value) -> GatewayResult<Value> {
        require_object(partial)?;
        Ok(self
            .client
            .request(Method::PATCH, &format!("Observation/{id}"), Some(partial))
            .await?)
    }

    pub async fn delete(&self, id: &str) -> GatewayResult<Value> {
        Ok(self
            .client
            .request(Method::DELETE, &format!("Observation/{id}"), None)
            .await?)
    }

    /// All observations whose subject is the given patient (a search bundle).
    pub async fn list_for_patient(&self, patient_id: &str) -> GatewayResult<Value> {
        Ok(self
            .client
            .request(
                Method::GET,
                &format!("Observation?subject=Patient/{patient_id}"),
                None,
            )
            .await?)
    }
}
