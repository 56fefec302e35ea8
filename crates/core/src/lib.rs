//! # Medical Wallet Core
//!
//! Core gateway logic for the Medical Wallet system:
//! - Immutable runtime configuration resolved once at startup
//! - The outbound FHIR resource client (HTTP transport + uniform error
//!   translation)
//! - Per-resource services that validate and shape payloads before submission
//! - The CKD aggregation engine (summary derivation and registration saga)
//!
//! **No API concerns**: HTTP serving, token verification and the relational
//! store belong in `medwallet-api`, `medwallet-auth` and `medwallet-store`.

pub mod ckd;
pub mod client;
pub mod config;
pub mod error;
pub mod services;

pub use ckd::{CkdRegistered, CkdRegistration, CkdService, CkdSummary};
pub use client::FhirClient;
pub use config::GatewayConfig;
pub use error::{ClientError, GatewayError, GatewayResult};
pub use services::{ConditionApi, MedicationApi, ObservationApi, PatientApi};
