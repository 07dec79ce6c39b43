//! Admin-owned resource caches (teams and form templates).
//!
//! This module provides:
//! - [`ResourceStore`], the generic backend-synced list with a local fallback cache
//! - the [`Resource`] and [`ResourceBackend`] seams it is generic over
//! - [`TeamStore`] and [`FormStore`], its two instantiations
//!
//! # Flow
//!
//! 1. The owning session points the store at an admin (`set_owner`)
//! 2. `load_from_backend` fetches the admin's list, falling back to the
//!    cached copy under `<key>_<adminId>` when the backend is unreachable
//! 3. Mutations apply locally and to the cache, and are sent to the backend
//!    according to the store's [`WritePolicy`]
//! 4. Records the backend never confirmed keep a `temp_` ID until
//!    `sync_pending` pushes them

mod error;
mod forms;
mod store;
mod teams;

pub use error::StoreError;
pub use forms::{FORM_TEMP_PREFIX, FormStore};
pub use store::ResourceStore;
pub use teams::{TEAM_TEMP_PREFIX, TeamStore};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use hr_feedback_core::{AdminId, ResourceId};

use crate::api::ApiError;

/// A record a [`ResourceStore`] can cache.
pub trait Resource: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Human-readable kind, used in logs and errors.
    const KIND: &'static str;
    /// Base of the admin-namespaced cache key.
    const STORAGE_KEY: &'static str;
    /// Prefix of temporary IDs; must start with `temp_`.
    const TEMP_PREFIX: &'static str;

    /// The record's ID, or `None` if it has never been saved.
    fn id(&self) -> Option<&ResourceId>;

    fn set_id(&mut self, id: ResourceId);

    /// Stamp the owning admin onto a record about to be created.
    fn assign_owner(&mut self, owner: &AdminId);
}

/// Remote source of truth for one kind of resource.
#[async_trait]
pub trait ResourceBackend<R: Resource>: Send + Sync {
    async fn list(&self, owner: &AdminId) -> Result<Vec<R>, ApiError>;
    async fn create(&self, owner: &AdminId, record: &R) -> Result<ResourceId, ApiError>;
    async fn update(&self, record: &R) -> Result<(), ApiError>;
    async fn delete(&self, id: &ResourceId) -> Result<(), ApiError>;
}

/// How a store reacts when a backend write fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WritePolicy {
    /// Apply locally first; backend failures are logged and the record is
    /// marked [`SyncStatus::Unsynced`].
    #[default]
    Optimistic,
    /// Write to the backend first; on failure resync from the backend and
    /// return the error.
    Strict,
}

impl std::fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Optimistic => write!(f, "optimistic"),
            Self::Strict => write!(f, "strict"),
        }
    }
}

impl std::str::FromStr for WritePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "optimistic" => Ok(Self::Optimistic),
            "strict" => Ok(Self::Strict),
            _ => Err(format!("invalid write policy: {s} (expected optimistic or strict)")),
        }
    }
}

/// Whether the backend knows about a record's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncStatus {
    /// Matches the backend as far as this store knows.
    Synced,
    /// Created while the backend was unreachable; carries a temporary ID.
    LocalOnly,
    /// Changed locally, but the backend write failed.
    Unsynced,
}

/// Load state of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadPhase {
    Uninitialized,
    Loading,
    Loaded,
}

/// Outcome of [`ResourceStore::sync_pending`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncReport {
    /// Records the backend accepted.
    pub synced: usize,
    /// Records that are still pending.
    pub failed: usize,
    /// Temporary IDs and the backend IDs that replaced them.
    pub replaced: Vec<(ResourceId, ResourceId)>,
}
