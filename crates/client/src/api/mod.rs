//! Feedback backend REST client.
//!
//! This module provides:
//! - [`ApiClient`] for calling the backend's concept/action endpoints
//! - [`ApiError`] describing transport and backend failures
//!
//! Endpoints are grouped by backend concept: `HRAdmin` (identity),
//! `OrgGraph` (teams) and `FormTemplate` (form templates).

mod client;
mod error;
mod form_template;
mod hr_admin;
mod org_graph;

pub use client::ApiClient;
pub use error::ApiError;
