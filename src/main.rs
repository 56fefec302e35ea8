use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medwallet_api::AppState;
use medwallet_auth::TokenSigner;
use medwallet_core::{
    CkdService, ConditionApi, FhirClient, GatewayConfig, MedicationApi, ObservationApi, PatientApi,
};
use medwallet_store::{PatientShadowStore, RecordStore, UserStore};

/// Main entry point for the Medical Wallet gateway.
///
/// Loads configuration from the environment, connects to Postgres, runs any
/// pending migrations, and serves the REST API.
///
/// # Environment Variables
/// - `FHIR_SERVER_URL`: base URL of the FHIR record server (required)
/// - `FHIR_TIMEOUT_SECS`: upstream request timeout (default: 30)
/// - `FHIR_AUTH_TOKEN`: optional bearer token for the record server
/// - `SECRET_KEY`: HMAC key for access tokens (required)
/// - `ACCESS_TOKEN_EXPIRE_MINUTES`: token lifetime (default: 30)
/// - `ALLOWED_ORIGINS`: comma-separated CORS origins (default: permissive)
/// - `DATABASE_URL`: Postgres connection string (required)
/// - `MEDWALLET_ADDR`: listen address (default: "0.0.0.0:8000")
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, database, or server startup fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medwallet=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatewayConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(config.database_url())
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let client = FhirClient::new(&config)?;
    let state = AppState {
        patients: PatientApi::new(client.clone()),
        conditions: ConditionApi::new(client.clone()),
        observations: ObservationApi::new(client.clone()),
        medications: MedicationApi::new(client.clone()),
        ckd: CkdService::new(client),
        users: UserStore::new(pool.clone()),
        shadows: PatientShadowStore::new(pool.clone()),
        records: RecordStore::new(pool),
        signer: TokenSigner::new(config.secret_key(), config.token_ttl_minutes()),
    };

    let app = medwallet_api::router(state, config.allowed_origins());

    let listener = TcpListener::bind(config.bind_addr()).await?;
    tracing::info!("REST server listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
