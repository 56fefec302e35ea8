//! REST handlers, grouped by route prefix.

pub mod auth;
pub mod conditions;
pub mod health;
pub mod medications;
pub mod observations;
pub mod patients;
