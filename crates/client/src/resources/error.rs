//! Resource store errors.

use thiserror::Error;

use crate::api::ApiError;

/// Errors surfaced by a resource store.
///
/// Read failures never appear here: they degrade to the cached copy.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A write was attempted with no admin logged in.
    #[error("No admin is logged in")]
    NotAuthenticated,

    /// The record has never been saved, so it cannot be updated.
    #[error("The {kind} has no id")]
    MissingId { kind: &'static str },

    /// No record with this ID is cached.
    #[error("No {kind} with id {id}")]
    NotFound { kind: &'static str, id: String },

    /// The admin changed while the request was in flight; the response was dropped.
    #[error("The logged-in admin changed before the {kind} request completed")]
    OwnerChanged { kind: &'static str },

    /// The backend rejected a write (strict policy only).
    #[error("Could not save {kind}: {source}")]
    Backend {
        kind: &'static str,
        #[source]
        source: ApiError,
    },
}
