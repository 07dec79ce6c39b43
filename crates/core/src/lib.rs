//! HR Feedback Core - Shared types library.
//!
//! This crate provides the domain types used across the HR feedback
//! components:
//! - `client` - Session-scoped persistence/cache layer and REST client
//! - `cli` - Command-line front end driving the client
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - IDs, email, admin identity, teams, form templates and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
