//! Condition resource service.

use fhir::ConditionResource;
use reqwest::Method;
use serde_json::Value;

use crate::client::FhirClient;
use crate::error::GatewayResult;

use super::{require_object, shape_get_error};

#[derive(Clone)]
pub struct ConditionApi {
    client: FhirClient,
}

impl ConditionApi {
    pub fn new(client: FhirClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, payload: &Value) -> GatewayResult<Value> {
        let resource = ConditionResource::parse(payload)?;
        Ok(self
            .client
            .request(Method::POST, "Condition", Some(&resource.to_value()?))
            .await?)
    }

    pub async fn get(&self, id: &str) -> GatewayResult<Value> {
        self.client
            .request(Method::GET, &format!("Condition/{id}"), None)
            .await
            .map_err(|e| shape_get_error(e, "Condition", id))
    }

    pub async fn update(&self, id: &str, payload: &Value) -> GatewayResult<Value> {
        let resource = ConditionResource::parse(payload)?;
        Ok(self
            .client
            .request(
                Method::PUT,
                &format!("Condition/{id}"),
                Some(&resource.to_value()?),
            )
            .await?)
    }

    pub async fn patch(&self, id: &str, partial: &Value) -> GatewayResult<Value> {
        require_object(partial)?;
        Ok(self
            .client
            .request(Method::PATCH, &format!("Condition/{id}"), Some(partial))
            .await?)
    }

    pub async fn delete(&self, id: &str) -> GatewayResult<Value> {
        Ok(self
            .client
            .request(Method::DELETE, &format!("Condition/{id}"), None)
            .await?)
    }

    /// All conditions whose subject is the given patient (a search bundle).
    pub async fn list_for_patient(&self, patient_id: &str) -> GatewayResult<Value> {
        Ok(self
            .client
            .request(
                Method::GET,
                &format!("Condition?subject=Patient/{patient_id}"),
                None,
            )
            .await?)
    }
}
