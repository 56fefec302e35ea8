//! # Medical Wallet API
//!
//! REST surface for the Medical Wallet gateway.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - bearer-token authentication of resource routes
//! - translation of core/store errors into `{error_code, message, details}`
//!   responses
//! - OpenAPI/Swagger documentation
//!
//! Business logic lives in `medwallet-core`; this crate only maps HTTP to it.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod extract;
pub mod handlers;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use medwallet_auth::TokenSigner;
use medwallet_core::{CkdService, ConditionApi, MedicationApi, ObservationApi, PatientApi};
use medwallet_store::{PatientShadowStore, RecordStore, UserStore};

pub use error::ApiError;

/// Application state shared across REST handlers.
///
/// Every component is cheap to clone; the HTTP connection pool and the
/// database pool are shared behind their respective clients.
#[derive(Clone)]
pub struct AppState {
    pub patients: PatientApi,
    pub conditions: ConditionApi,
    pub observations: ObservationApi,
    pub medications: MedicationApi,
    pub ckd: CkdService,
    pub users: UserStore,
    pub shadows: PatientShadowStore,
    pub records: RecordStore,
    pub signer: TokenSigner,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::root,
        handlers::health::health,
        handlers::auth::register,
        handlers::auth::login,
        handlers::patients::create_patient,
        handlers::patients::search_patients,
        handlers::patients::get_patient,
        handlers::patients::update_patient,
        handlers::patients::patch_patient,
        handlers::patients::delete_patient,
        handlers::patients::register_ckd_patient,
        handlers::patients::ckd_summary,
        handlers::conditions::create_condition,
        handlers::conditions::get_condition,
        handlers::conditions::update_condition,
        handlers::conditions::patch_condition,
        handlers::conditions::delete_condition,
        handlers::conditions::list_patient_conditions,
        handlers::observations::create_observation,
        handlers::observations::get_observation,
        handlers::observations::update_observation,
        handlers::observations::patch_observation,
        handlers::observations::delete_observation,
        handlers::observations::list_patient_observations,
        handlers::medications::create_medication,
        handlers::medications::get_medication,
        handlers::medications::update_medication,
        handlers::medications::patch_medication,
        handlers::medications::delete_medication,
        handlers::medications::list_patient_medications,
    ),
    components(schemas(
        handlers::auth::RegisterUserReq,
        handlers::auth::LoginReq,
        handlers::auth::TokenRes,
        handlers::patients::CkdRegisterReq,
        handlers::patients::CkdRegisterRes,
        error::ErrorBody,
    )),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Build the application router.
///
/// `allowed_origins` configures CORS; an empty list or a `"*"` entry yields a
/// permissive policy.
pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    let cors = cors_layer(allowed_origins);

    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route(
            "/patients",
            post(handlers::patients::create_patient).get(handlers::patients::search_patients),
        )
        .route("/patients/ckd", post(handlers::patients::register_ckd_patient))
        .route(
            "/patients/:id",
            get(handlers::patients::get_patient)
                .put(handlers::patients::update_patient)
                .patch(handlers::patients::patch_patient)
                .delete(handlers::patients::delete_patient),
        )
        .route("/patients/:id/ckd-summary", get(handlers::patients::ckd_summary))
        .route("/conditions", post(handlers::conditions::create_condition))
        .route(
            "/conditions/:id",
            get(handlers::conditions::get_condition)
                .put(handlers::conditions::update_condition)
                .patch(handlers::conditions::patch_condition)
                .delete(handlers::conditions::delete_condition),
        )
        .route(
            "/conditions/patient/:patient_id",
            get(handlers::conditions::list_patient_conditions),
        )
        .route("/observations", post(handlers::observations::create_observation))
        .route(
            "/observations/:id",
            get(handlers::observations::get_observation)
                .put(handlers::observations::update_observation)
                .patch(handlers::observations::patch_observation)
                .delete(handlers::observations::delete_observation),
        )
        .route(
            "/observations/patient/:patient_id",
            get(handlers::observations::list_patient_observations),
        )
        .route("/medications", post(handlers::medications::create_medication))
        .route(
            "/medications/:id",
            get(handlers::medications::get_medication)
                .put(handlers::medications::update_medication)
                .patch(handlers::medications::patch_medication)
                .delete(handlers::medications::delete_medication),
        )
        .route(
            "/medications/patient/:patient_id",
            get(handlers::medications::list_patient_medications),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
