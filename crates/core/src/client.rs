//! Outbound FHIR resource client.
//!
//! A thin transport capability: typed CRUD + search against the remote
//! FHIR-like store over HTTP, with bearer auth, `application/fhir+json` media
//! type, and uniform translation of transport failures into [`ClientError`].
//!
//! Deliberately simple: no retries, no backoff, no pooling policy beyond the
//! reqwest defaults.

use reqwest::Method;
use serde_json::Value;

use crate::config::GatewayConfig;
use crate::error::ClientError;

const FHIR_MEDIA_TYPE: &str = "application/fhir+json";

/// HTTP client for the remote resource store.
///
/// Cheap to clone; the underlying reqwest client shares its connection pool.
#[derive(Clone)]
pub struct FhirClient {
    base_url: String,
    auth_token: Option<String>,
    http: reqwest::Client,
}

impl FhirClient {
    /// Build a client from the resolved gateway configuration.
    ///
    /// The configured timeout applies to every request; there is no additional
    /// timeout layered above it.
    pub fn new(config: &GatewayConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.fhir_timeout())
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: config.fhir_base_url().to_string(),
            auth_token: config.fhir_auth_token().map(str::to_string),
            http,
        })
    }

    /// Perform one request against the resource store.
    ///
    /// `path` is relative to the configured base URL (e.g. `Patient/123` or
    /// `Observation?subject=Patient/123`). An empty response body decodes to
    /// JSON null rather than failing, which covers DELETE responses.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Status`] for any non-2xx response
    /// - [`ClientError::Timeout`] when the configured timeout elapses
    /// - [`ClientError::Transport`] for any other transport-level failure
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(reqwest::header::CONTENT_TYPE, FHIR_MEDIA_TYPE)
            .header(reqwest::header::ACCEPT, FHIR_MEDIA_TYPE);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                tracing::error!(%url, "FHIR server timeout");
                ClientError::Timeout
            } else {
                tracing::error!(%url, error = %e, "FHIR transport failure");
                ClientError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(%url, status = status.as_u16(), "FHIR server error");
            return Err(ClientError::Status(status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        tracing::info!(%method, %url, "FHIR request succeeded");

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| ClientError::Transport(format!("malformed response body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{delete, get, post};
    use axum::{Json, Router};
    use serde_json::json;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });
        format!("http://{addr}")
    }

    fn client_for(base: &str, timeout: Duration, token: Option<&str>) -> FhirClient {
        let config = GatewayConfig::new(
            base.to_string(),
            timeout,
            token.map(str::to_string),
            "secret".to_string(),
            30,
            vec![],
            "postgresql://localhost/medwallet".to_string(),
            "0.0.0.0:8000".to_string(),
        )
        .expect("config");
        FhirClient::new(&config).expect("client")
    }

    #[tokio::test]
    async fn create_then_get_round_trip_with_fhir_media_type() {
        let app = Router::new()
            .route(
                "/Patient",
                post(
                    |headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
                        Json(json!({
                            "resourceType": body["resourceType"],
                            "id": "p-1",
                            "receivedContentType": headers
                                .get("content-type")
                                .and_then(|v| v.to_str().ok())
                                .unwrap_or(""),
                        }))
                    },
                ),
            )
            .route(
                "/Patient/:id",
                get(|| async { Json(json!({"resourceType": "Patient", "id": "p-1"})) }),
            );
        let client = client_for(&serve(app).await, Duration::from_secs(5), None);

        let created = client
            .request(
                Method::POST,
                "Patient",
                Some(&json!({"resourceType": "Patient"})),
            )
            .await
            .expect("create");
        assert_eq!(created["id"], "p-1");
        assert_eq!(created["receivedContentType"], "application/fhir+json");

        let fetched = client
            .request(Method::GET, "Patient/p-1", None)
            .await
            .expect("get");
        assert_eq!(fetched["resourceType"], "Patient");
    }

    #[tokio::test]
    async fn non_2xx_becomes_a_status_error_carrying_the_code() {
        let app = Router::new()
            .route("/Patient/missing", get(|| async { StatusCode::NOT_FOUND }))
            .route(
                "/Patient/broken",
                get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
            );
        let client = client_for(&serve(app).await, Duration::from_secs(5), None);

        let err = client
            .request(Method::GET, "Patient/missing", None)
            .await
            .expect_err("404");
        assert!(matches!(err, ClientError::Status(404)));
        assert!(err.is_not_found());

        let err = client
            .request(Method::GET, "Patient/broken", None)
            .await
            .expect_err("500");
        assert!(matches!(err, ClientError::Status(500)));
    }

    #[tokio::test]
    async fn empty_delete_body_decodes_to_json_null() {
        let app =
            Router::new().route("/Observation/:id", delete(|| async { StatusCode::OK }));
        let client = client_for(&serve(app).await, Duration::from_secs(5), None);

        let body = client
            .request(Method::DELETE, "Observation/o-1", None)
            .await
            .expect("delete");
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn configured_bearer_token_is_attached() {
        let app = Router::new().route(
            "/Patient/p-1",
            get(|headers: HeaderMap| async move {
                Json(json!({
                    "authorization": headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or(""),
                }))
            }),
        );
        let client = client_for(&serve(app).await, Duration::from_secs(5), Some("tok-1"));

        let body = client
            .request(Method::GET, "Patient/p-1", None)
            .await
            .expect("get");
        assert_eq!(body["authorization"], "Bearer tok-1");
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let app = Router::new().route(
            "/Patient/p-1",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                StatusCode::OK
            }),
        );
        let client = client_for(&serve(app).await, Duration::from_millis(50), None);

        let err = client
            .request(Method::GET, "Patient/p-1", None)
            .await
            .expect_err("timeout");
        assert!(matches!(err, ClientError::Timeout));
    }
}
