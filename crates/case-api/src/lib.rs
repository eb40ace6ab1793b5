//! Case-management REST API for the legal-aid casework service.
//!
//! Caseworkers authenticate with username/password at `/token` and use
//! the returned bearer token for the case CRUD routes under `/v1` and
//! `/latest`.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
