//! Core types for the HR feedback client.
//!
//! This module provides type-safe wrappers and records for the domain the
//! client caches: admins, teams and form templates.

pub mod admin;
pub mod email;
pub mod form;
pub mod id;
pub mod status;
pub mod team;

pub use admin::AdminIdentity;
pub use email::{Email, EmailError};
pub use form::{FeedbackQuestion, FormTemplate};
pub use id::*;
pub use status::*;
pub use team::{Team, TeamMember};
