//! Error taxonomy for the gateway core.
//!
//! Every service boundary returns a tagged error rather than a catch-all, so
//! callers are forced to handle the transport/validation/not-found distinction
//! explicitly.

/// A failure talking to the remote resource store.
///
/// All upstream HTTP statuses collapse into one kind carrying the code as
/// data; callers that need to branch (404 vs 400 vs 5xx) inspect the code.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("upstream resource store returned status {0}")]
    Status(u16),

    #[error("upstream resource store timed out")]
    Timeout,

    #[error("transport failure: {0}")]
    Transport(String),
}

impl ClientError {
    /// True for a 404-shaped failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Status(404))
    }
}

/// Errors surfaced by the gateway's services and the aggregation engine.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Validation(#[from] fhir::FhirError),

    #[error("{resource_type} {id} not found")]
    NotFound { resource_type: String, id: String },

    #[error("CKD registration failed: {message}")]
    RegistrationFailed {
        message: String,
        /// `Type/id` references left behind when compensating deletes failed;
        /// empty means the rollback was clean.
        orphaned: Vec<String>,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl GatewayError {
    pub(crate) fn not_found(resource_type: &str, id: &str) -> Self {
        GatewayError::NotFound {
            resource_type: resource_type.to_string(),
            id: id.to_string(),
        }
    }
}

/// Type alias for Results that can fail with a [`GatewayError`].
pub type GatewayResult<T> = Result<T, GatewayError>;
