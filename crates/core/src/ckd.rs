//! CKD aggregation engine.
//!
//! Derives a chronic-kidney-disease summary from raw FHIR resources:
//! conditions filtered to the fixed SNOMED CKD code set, renal lab
//! observations ranked by recency, a stage derived from the latest eGFR value,
//! and a risk classification. The filtering/derivation steps are pure
//! functions over fetched JSON and are tested directly.
//!
//! Also owns the CKD registration composite: patient, stage condition and
//! initial labs created against the remote store under saga discipline, with
//! compensating deletes on failure.

use chrono::NaiveDate;
use futures::future::join_all;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use fhir::codes::{self, EGFR_CODE};
use fhir::LabValue;

use crate::client::FhirClient;
use crate::error::{ClientError, GatewayError, GatewayResult};

/// How many ranked lab observations the summary keeps.
///
/// Stage derivation only scans this window, so an eGFR older than the five
/// most recent renal labs of any type is invisible to it. Known scope limit.
const LAB_WINDOW: usize = 5;

const RECOMMENDATIONS: [&str; 3] = [
    "Monitor blood pressure regularly",
    "Follow nephrology appointments",
    "Maintain protein-restricted diet",
];

/// Input for the CKD registration composite.
#[derive(Clone, Debug, Deserialize)]
pub struct CkdRegistration {
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub birth_date: NaiveDate,
    /// Declared CKD stage; defaults to "3" when absent.
    pub ckd_stage: Option<String>,
    #[serde(default)]
    pub initial_labs: Vec<LabValue>,
}

/// Result of a successful CKD registration.
#[derive(Clone, Debug)]
pub struct CkdRegistered {
    pub patient_id: String,
    pub condition_id: String,
    pub observation_ids: Vec<String>,
    pub message: String,
    /// The created Patient document, for the local shadow row.
    pub patient: Value,
    /// Created lab documents, tagged by lab type, for local record rows.
    pub labs: Vec<(String, Value)>,
}

/// The derived stage/risk block of a CKD summary.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct StageSummary {
    pub ckd_stage: String,
    pub risk_level: String,
    pub recommendations: Vec<String>,
}

/// Full CKD summary response for one patient.
#[derive(Clone, Debug, Serialize)]
pub struct CkdSummary {
    pub patient: Value,
    pub ckd_conditions: Vec<Value>,
    pub latest_labs: Vec<Value>,
    pub summary: StageSummary,
}

/// CKD registration and summary over the remote resource store.
#[derive(Clone)]
pub struct CkdService {
    client: FhirClient,
}

impl CkdService {
    pub fn new(client: FhirClient) -> Self {
        Self { client }
    }

    /// Aggregate a CKD summary for one patient.
    ///
    /// Fetches the patient, their conditions and their observations
    /// concurrently; a failure in any fetch aborts the whole operation with a
    /// patient-not-found shaped error (no partial summary).
    pub async fn summarize(&self, patient_id: &str) -> GatewayResult<CkdSummary> {
        let (patient, conditions, observations) = {
            let patient_path = format!("Patient/{patient_id}");
            let conditions_path = format!("Condition?subject=Patient/{patient_id}");
            let observations_path = format!("Observation?subject=Patient/{patient_id}");
            let (p, c, o) = tokio::join!(
                self.client.request(Method::GET, &patient_path, None),
                self.client.request(Method::GET, &conditions_path, None),
                self.client.request(Method::GET, &observations_path, None),
            );
            match (p, c, o) {
                (Ok(p), Ok(c), Ok(o)) => (p, c, o),
                (p, c, o) => {
                    for cause in [p.err(), c.err(), o.err()].into_iter().flatten() {
                        tracing::error!(%patient_id, error = %cause, "CKD summary fetch failed");
                    }
                    return Err(GatewayError::not_found("Patient", patient_id));
                }
            }
        };

        let ckd_conditions = filter_ckd_conditions(&conditions);
        let latest_labs = latest_ckd_labs(&observations);
        let stage = derive_stage(&latest_labs);
        let summary = StageSummary {
            risk_level: risk_level(&stage).to_string(),
            ckd_stage: stage,
            recommendations: RECOMMENDATIONS.iter().map(|r| r.to_string()).collect(),
        };

        tracing::info!(%patient_id, stage = %summary.ckd_stage, "CKD summary generated");

        Ok(CkdSummary {
            patient,
            ckd_conditions,
            latest_labs,
            summary,
        })
    }

    /// Register a new CKD patient: patient resource, stage condition, and the
    /// initial labs as an unordered concurrent batch.
    ///
    /// Created resource ids are tracked as they succeed; on any failure,
    /// compensating deletes are attempted for every already-created sibling.
    /// The returned error reports a clean rollback (empty orphan list) or the
    /// `Type/id` references left behind when compensation itself failed.
    pub async fn register(&self, registration: &CkdRegistration) -> GatewayResult<CkdRegistered> {
        // Build every payload up front so validation failures happen before
        // anything is created remotely.
        let patient_payload = fhir::patient::registration_patient(
            &registration.first_name,
            &registration.last_name,
            &registration.gender,
            registration.birth_date,
        )?
        .to_value()?;
        let stage = registration.ckd_stage.as_deref().unwrap_or("3");
        for lab in &registration.initial_labs {
            if codes::lab_coding(&lab.lab_type).is_none() {
                return Err(fhir::FhirError::InvalidField {
                    field: "initial_labs.type".to_string(),
                    message: format!("'{}' is not a known lab type", lab.lab_type),
                }
                .into());
            }
        }

        let mut ledger = SagaLedger::default();

        let patient = self
            .client
            .request(Method::POST, "Patient", Some(&patient_payload))
            .await
            .map_err(GatewayError::Client)?;
        let patient_id = resource_id(&patient)?;
        ledger.record("Patient", &patient_id);

        let lab_payloads = match registration
            .initial_labs
            .iter()
            .map(|lab| {
                let payload = fhir::observation::lab_observation(&patient_id, lab)?.to_value()?;
                Ok((lab.lab_type.clone(), payload))
            })
            .collect::<GatewayResult<Vec<_>>>()
        {
            Ok(payloads) => payloads,
            Err(cause) => return Err(self.abort(ledger, cause).await),
        };

        let condition_payload = fhir::condition::ckd_condition(&patient_id, stage).to_value()?;
        let condition = match self
            .client
            .request(Method::POST, "Condition", Some(&condition_payload))
            .await
        {
            Ok(condition) => condition,
            Err(cause) => return Err(self.abort(ledger, cause.into()).await),
        };
        let condition_id = match resource_id(&condition) {
            Ok(id) => id,
            Err(cause) => return Err(self.abort(ledger, cause).await),
        };
        ledger.record("Condition", &condition_id);

        let creations = join_all(lab_payloads.iter().map(|(lab_type, payload)| async move {
            let created = self
                .client
                .request(Method::POST, "Observation", Some(payload))
                .await?;
            Ok::<_, ClientError>((lab_type.clone(), created))
        }))
        .await;

        let mut labs = Vec::with_capacity(creations.len());
        let mut first_failure = None;
        for outcome in creations {
            match outcome {
                Ok((lab_type, created)) => {
                    if let Ok(id) = resource_id(&created) {
                        ledger.record("Observation", &id);
                    }
                    labs.push((lab_type, created));
                }
                Err(cause) => first_failure = first_failure.or(Some(cause)),
            }
        }
        if let Some(cause) = first_failure {
            return Err(self.abort(ledger, cause.into()).await);
        }

        let observation_ids = labs
            .iter()
            .filter_map(|(_, created)| resource_id(created).ok())
            .collect();

        tracing::info!(%patient_id, %condition_id, "CKD patient registered");

        Ok(CkdRegistered {
            patient_id,
            condition_id,
            observation_ids,
            message: "CKD patient registered successfully".to_string(),
            patient,
            labs,
        })
    }

    /// Roll back a partially completed registration.
    async fn abort(&self, ledger: SagaLedger, cause: GatewayError) -> GatewayError {
        let mut orphaned = Vec::new();
        for reference in ledger.into_compensation_order() {
            if let Err(e) = self.client.request(Method::DELETE, &reference, None).await {
                tracing::error!(%reference, error = %e, "compensating delete failed");
                orphaned.push(reference);
            }
        }
        if orphaned.is_empty() {
            tracing::warn!(error = %cause, "CKD registration rolled back cleanly");
        }
        GatewayError::RegistrationFailed {
            message: cause.to_string(),
            orphaned,
        }
    }
}

/// Ledger of remotely created resources, consumed in reverse for rollback.
#[derive(Debug, Default)]
struct SagaLedger {
    created: Vec<String>,
}

impl SagaLedger {
    fn record(&mut self, resource_type: &str, id: &str) {
        self.created.push(format!("{resource_type}/{id}"));
    }

    fn into_compensation_order(self) -> Vec<String> {
        let mut references = self.created;
        references.reverse();
        references
    }
}

fn resource_id(resource: &Value) -> GatewayResult<String> {
    resource["id"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| {
            GatewayError::Client(ClientError::Transport(
                "created resource is missing an id".to_string(),
            ))
        })
}

/// The resources of a FHIR search bundle.
fn bundle_resources(bundle: &Value) -> impl Iterator<Item = &Value> {
    bundle["entry"]
        .as_array()
        .into_iter()
        .flatten()
        .map(|entry| &entry["resource"])
}

/// Codes attached to a resource's `code.coding` list, in order.
fn resource_codes(resource: &Value) -> impl Iterator<Item = &str> {
    resource["code"]["coding"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|coding| coding["code"].as_str())
}

/// Keep only conditions carrying one of the five CKD codes.
///
/// A condition matches on the first coding found to match; coding order does
/// not otherwise matter for inclusion.
pub fn filter_ckd_conditions(conditions: &Value) -> Vec<Value> {
    bundle_resources(conditions)
        .filter(|condition| resource_codes(condition).any(codes::is_ckd_condition_code))
        .cloned()
        .collect()
}

/// Keep renal lab observations, ranked by `effectiveDateTime` descending and
/// truncated to the five most recent.
///
/// A missing datetime sorts as the empty string, i.e. last.
pub fn latest_ckd_labs(observations: &Value) -> Vec<Value> {
    let mut labs: Vec<Value> = bundle_resources(observations)
        .filter(|observation| resource_codes(observation).any(codes::is_ckd_lab_code))
        .cloned()
        .collect();

    labs.sort_by(|a, b| effective_date_time(b).cmp(effective_date_time(a)));
    labs.truncate(LAB_WINDOW);
    labs
}

fn effective_date_time(observation: &Value) -> &str {
    observation["effectiveDateTime"].as_str().unwrap_or("")
}

/// Map an eGFR value to a CKD stage via fixed clinical thresholds, highest
/// bucket first.
pub fn stage_from_egfr(egfr: f64) -> &'static str {
    if egfr >= 90.0 {
        "1"
    } else if egfr >= 60.0 {
        "2"
    } else if egfr >= 45.0 {
        "3A"
    } else if egfr >= 30.0 {
        "3B"
    } else if egfr >= 15.0 {
        "4"
    } else {
        "5"
    }
}

/// Derive the stage from the first eGFR observation in the ranked lab window,
/// or "unknown" when the window holds none.
pub fn derive_stage(latest_labs: &[Value]) -> String {
    let egfr = latest_labs
        .iter()
        .find(|observation| resource_codes(observation).any(|code| code == EGFR_CODE))
        .and_then(|observation| observation["valueQuantity"]["value"].as_f64());

    match egfr {
        Some(value) => stage_from_egfr(value).to_string(),
        None => "unknown".to_string(),
    }
}

/// Risk classification for a stage. "unknown" classifies as High, the
/// conservative default.
pub fn risk_level(stage: &str) -> &'static str {
    match stage {
        "3A" | "3B" | "4" => "Moderate",
        "1" | "2" => "Low",
        _ => "High",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lab(code: &str, effective: Option<&str>, value: f64) -> Value {
        let mut observation = json!({
            "resourceType": "Observation",
            "status": "final",
            "code": {"coding": [{"system": "http://loinc.org", "code": code}]},
            "subject": {"reference": "Patient/p-1"},
            "valueQuantity": {"value": value, "unit": "mg/dL"}
        });
        if let Some(effective) = effective {
            observation["effectiveDateTime"] = json!(effective);
        }
        observation
    }

    fn bundle(resources: Vec<Value>) -> Value {
        json!({
            "resourceType": "Bundle",
            "type": "searchset",
            "entry": resources.into_iter().map(|r| json!({"resource": r})).collect::<Vec<_>>()
        })
    }

    #[test]
    fn stage_thresholds() {
        assert_eq!(stage_from_egfr(92.0), "1");
        assert_eq!(stage_from_egfr(75.0), "2");
        assert_eq!(stage_from_egfr(50.0), "3A");
        assert_eq!(stage_from_egfr(32.0), "3B");
        assert_eq!(stage_from_egfr(20.0), "4");
        assert_eq!(stage_from_egfr(10.0), "5");
    }

    #[test]
    fn stage_boundaries_take_the_higher_bucket() {
        assert_eq!(stage_from_egfr(90.0), "1");
        assert_eq!(stage_from_egfr(60.0), "2");
        assert_eq!(stage_from_egfr(45.0), "3A");
        assert_eq!(stage_from_egfr(30.0), "3B");
        assert_eq!(stage_from_egfr(15.0), "4");
        assert_eq!(stage_from_egfr(14.9), "5");
    }

    #[test]
    fn risk_classification() {
        assert_eq!(risk_level("1"), "Low");
        assert_eq!(risk_level("2"), "Low");
        assert_eq!(risk_level("3A"), "Moderate");
        assert_eq!(risk_level("3B"), "Moderate");
        assert_eq!(risk_level("4"), "Moderate");
        assert_eq!(risk_level("5"), "High");
        assert_eq!(risk_level("unknown"), "High");
    }

    #[test]
    fn condition_filter_keeps_ckd_codes_only() {
        let ckd = json!({
            "resourceType": "Condition",
            "code": {"coding": [
                {"system": "http://snomed.info/sct", "code": "38341003"},
                {"system": "http://snomed.info/sct", "code": "431857002"}
            ]}
        });
        let hypertension = json!({
            "resourceType": "Condition",
            "code": {"coding": [{"system": "http://snomed.info/sct", "code": "38341003"}]}
        });
        let uncoded = json!({"resourceType": "Condition"});

        let filtered = filter_ckd_conditions(&bundle(vec![
            ckd.clone(),
            hypertension,
            uncoded,
        ]));
        assert_eq!(filtered, vec![ckd]);
    }

    #[test]
    fn lab_ranking_is_recency_descending_with_missing_last() {
        let labs = latest_ckd_labs(&bundle(vec![
            lab("48642-3", Some("2024-01-01T00:00:00Z"), 50.0),
            lab("33914-3", Some("2024-03-01T00:00:00Z"), 2.1),
            lab("14682-9", None, 18.0),
        ]));

        let dates: Vec<&str> = labs
            .iter()
            .map(|o| o["effectiveDateTime"].as_str().unwrap_or(""))
            .collect();
        assert_eq!(dates, vec!["2024-03-01T00:00:00Z", "2024-01-01T00:00:00Z", ""]);
    }

    #[test]
    fn lab_window_truncates_to_five() {
        let mut observations = Vec::new();
        for day in 1..=7 {
            observations.push(lab(
                "33914-3",
                Some(&format!("2024-05-{day:02}T00:00:00Z")),
                2.0,
            ));
        }
        let labs = latest_ckd_labs(&bundle(observations));
        assert_eq!(labs.len(), 5);
        assert_eq!(
            labs[0]["effectiveDateTime"].as_str().unwrap(),
            "2024-05-07T00:00:00Z"
        );
    }

    #[test]
    fn non_renal_labs_are_excluded() {
        let labs = latest_ckd_labs(&bundle(vec![
            lab("2160-0", Some("2024-03-01T00:00:00Z"), 1.0),
            lab("48642-3", Some("2024-01-01T00:00:00Z"), 25.0),
        ]));
        assert_eq!(labs.len(), 1);
        assert!(labs[0]["code"]["coding"][0]["code"] == json!("48642-3"));
    }

    #[test]
    fn stage_derives_from_most_recent_egfr_in_window() {
        let labs = latest_ckd_labs(&bundle(vec![
            lab("48642-3", Some("2024-01-01T00:00:00Z"), 80.0),
            lab("48642-3", Some("2024-04-01T00:00:00Z"), 25.0),
            lab("33914-3", Some("2024-05-01T00:00:00Z"), 2.1),
        ]));
        // eGFR=25 falls in [15, 30)
        assert_eq!(derive_stage(&labs), "4");
    }

    #[test]
    fn stage_unknown_without_egfr_in_window() {
        let labs = latest_ckd_labs(&bundle(vec![
            lab("33914-3", Some("2024-03-01T00:00:00Z"), 2.1),
            lab("14682-9", Some("2024-02-01T00:00:00Z"), 18.0),
        ]));
        assert_eq!(derive_stage(&labs), "unknown");
        assert_eq!(risk_level(&derive_stage(&labs)), "High");
    }

    #[test]
    fn egfr_older_than_window_is_invisible() {
        let mut observations = vec![lab("48642-3", Some("2024-01-01T00:00:00Z"), 25.0)];
        for day in 10..15 {
            observations.push(lab(
                "33914-3",
                Some(&format!("2024-03-{day}T00:00:00Z")),
                2.0,
            ));
        }
        let labs = latest_ckd_labs(&bundle(observations));
        assert_eq!(labs.len(), 5);
        assert_eq!(derive_stage(&labs), "unknown");
    }

    #[test]
    fn ledger_compensates_in_reverse_creation_order() {
        let mut ledger = SagaLedger::default();
        ledger.record("Patient", "p-1");
        ledger.record("Condition", "c-1");
        ledger.record("Observation", "o-1");
        ledger.record("Observation", "o-2");

        assert_eq!(
            ledger.into_compensation_order(),
            vec!["Observation/o-2", "Observation/o-1", "Condition/c-1", "Patient/p-1"]
        );
    }

    #[tokio::test]
    async fn summary_fetch_failure_surfaces_as_patient_not_found() {
        use axum::http::StatusCode;
        use axum::routing::get;
        use axum::{Json, Router};

        let empty_bundle =
            || async { Json(json!({"resourceType": "Bundle", "type": "searchset"})) };
        let app = Router::new()
            .route(
                "/Patient/:id",
                get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
            )
            .route("/Condition", get(empty_bundle))
            .route("/Observation", get(empty_bundle));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let base = format!("http://{}", listener.local_addr().expect("addr"));
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        let config = crate::config::GatewayConfig::new(
            base,
            std::time::Duration::from_secs(5),
            None,
            "secret".to_string(),
            30,
            vec![],
            "postgresql://localhost/medwallet".to_string(),
            "0.0.0.0:8000".to_string(),
        )
        .expect("config");
        let service = CkdService::new(FhirClient::new(&config).expect("client"));

        let err = service.summarize("p-x").await.expect_err("should fail");
        match err {
            GatewayError::NotFound { resource_type, id } => {
                assert_eq!(resource_type, "Patient");
                assert_eq!(id, "p-x");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn missing_resource_id_is_a_transport_error() {
        let err = resource_id(&json!({"resourceType": "Patient"})).expect_err("no id");
        assert!(matches!(
            err,
            GatewayError::Client(ClientError::Transport(_))
        ));
    }

    #[test]
    fn empty_bundle_yields_empty_summary_parts() {
        let empty = json!({"resourceType": "Bundle", "type": "searchset"});
        assert!(filter_ckd_conditions(&empty).is_empty());
        assert!(latest_ckd_labs(&empty).is_empty());
        assert_eq!(derive_stage(&[]), "unknown");
    }
}
