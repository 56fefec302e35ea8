//! Gateway runtime configuration.
//!
//! This module defines configuration that should be resolved once at process
//! startup and then passed into services. The intent is to avoid reading
//! process-wide environment variables during request handling, which can lead
//! to inconsistent behaviour in multi-threaded runtimes and test harnesses.

use std::time::Duration;

use crate::error::{GatewayError, GatewayResult};

const DEFAULT_FHIR_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Gateway configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    fhir_base_url: String,
    fhir_timeout: Duration,
    fhir_auth_token: Option<String>,
    secret_key: String,
    token_ttl_minutes: i64,
    allowed_origins: Vec<String>,
    database_url: String,
    bind_addr: String,
}

impl GatewayConfig {
    /// Create a new `GatewayConfig`.
    ///
    /// The base URL has any trailing slash trimmed so path joining stays
    /// predictable.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fhir_base_url: String,
        fhir_timeout: Duration,
        fhir_auth_token: Option<String>,
        secret_key: String,
        token_ttl_minutes: i64,
        allowed_origins: Vec<String>,
        database_url: String,
        bind_addr: String,
    ) -> GatewayResult<Self> {
        if fhir_base_url.trim().is_empty() {
            return Err(GatewayError::Config(
                "FHIR base URL cannot be empty".into(),
            ));
        }
        if secret_key.trim().is_empty() {
            return Err(GatewayError::Config(
                "token signing secret cannot be empty".into(),
            ));
        }
        if database_url.trim().is_empty() {
            return Err(GatewayError::Config("database URL cannot be empty".into()));
        }

        Ok(Self {
            fhir_base_url: fhir_base_url.trim_end_matches('/').to_string(),
            fhir_timeout,
            fhir_auth_token,
            secret_key,
            token_ttl_minutes,
            allowed_origins,
            database_url,
            bind_addr,
        })
    }

    /// Resolve the configuration from the process environment.
    ///
    /// Reads `FHIR_SERVER_URL`, `FHIR_TIMEOUT_SECS`, `FHIR_AUTH_TOKEN`,
    /// `SECRET_KEY`, `ACCESS_TOKEN_EXPIRE_MINUTES`, `ALLOWED_ORIGINS`
    /// (comma-separated), `DATABASE_URL` and `MEDWALLET_ADDR`. This is the only
    /// place the gateway touches environment variables.
    pub fn from_env() -> GatewayResult<Self> {
        let fhir_base_url = std::env::var("FHIR_SERVER_URL")
            .unwrap_or_else(|_| "http://localhost:8080/fhir".into());
        let fhir_timeout = std::env::var("FHIR_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_FHIR_TIMEOUT_SECS);
        let fhir_auth_token = std::env::var("FHIR_AUTH_TOKEN")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let secret_key = std::env::var("SECRET_KEY")
            .map_err(|_| GatewayError::Config("SECRET_KEY must be set".into()))?;
        let token_ttl_minutes = std::env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_TOKEN_TTL_MINUTES);
        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| GatewayError::Config("DATABASE_URL must be set".into()))?;
        let bind_addr =
            std::env::var("MEDWALLET_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.into());

        Self::new(
            fhir_base_url,
            Duration::from_secs(fhir_timeout),
            fhir_auth_token,
            secret_key,
            token_ttl_minutes,
            allowed_origins,
            database_url,
            bind_addr,
        )
    }

    pub fn fhir_base_url(&self) -> &str {
        &self.fhir_base_url
    }

    pub fn fhir_timeout(&self) -> Duration {
        self.fhir_timeout
    }

    pub fn fhir_auth_token(&self) -> Option<&str> {
        self.fhir_auth_token.as_deref()
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    pub fn token_ttl_minutes(&self) -> i64 {
        self.token_ttl_minutes
    }

    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_base(base: &str) -> GatewayResult<GatewayConfig> {
        GatewayConfig::new(
            base.to_string(),
            Duration::from_secs(30),
            None,
            "secret".to_string(),
            30,
            vec![],
            "postgresql://localhost/medwallet".to_string(),
            DEFAULT_BIND_ADDR.to_string(),
        )
    }

    #[test]
    fn trims_trailing_slash_on_base_url() {
        let config = config_with_base("http://fhir.example/fhir/").expect("config");
        assert_eq!(config.fhir_base_url(), "http://fhir.example/fhir");
    }

    #[test]
    fn rejects_empty_secret() {
        let err = GatewayConfig::new(
            "http://fhir.example".to_string(),
            Duration::from_secs(30),
            None,
            "  ".to_string(),
            30,
            vec![],
            "postgresql://localhost/medwallet".to_string(),
            DEFAULT_BIND_ADDR.to_string(),
        )
        .expect_err("should reject empty secret");
        assert!(matches!(err, GatewayError::Config(_)));
    }
}
