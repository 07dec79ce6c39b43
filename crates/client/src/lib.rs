//! HR Feedback client library.
//!
//! Session-scoped persistence and caching in front of the HR 360-feedback
//! backend. An [`AdminSession`] ties together:
//!
//! - [`AuthStore`]: the logged-in admin, persisted per session
//! - [`TeamStore`] and [`FormStore`]: the admin's teams and form templates,
//!   loaded from the backend with a local fallback cache
//!
//! Storage is abstracted behind [`KeyValueStore`] so the same logic runs
//! against in-memory maps in tests and JSON files on disk in the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod api;
pub mod auth;
pub mod config;
pub mod resources;
pub mod session;
pub mod storage;

#[cfg(test)]
mod test_support;

pub use access::MemberAccessCode;
pub use api::{ApiClient, ApiError};
pub use auth::{AuthBackend, AuthError, AuthStore};
pub use config::{ClientConfig, ConfigError};
pub use resources::{
    FormStore, LoadPhase, Resource, ResourceBackend, ResourceStore, StoreError, SyncReport,
    SyncStatus, TeamStore, WritePolicy,
};
pub use session::{AdminSession, SentForm, SessionBackends};
pub use storage::{FileStorage, KeyValueStore, MemoryStorage, StorageError};
