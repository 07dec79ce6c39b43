//! Key-value storage standing in for browser `localStorage`/`sessionStorage`.
//!
//! Two kinds of store are used by an [`AdminSession`](crate::AdminSession):
//! - a **local** store shared by every session on the machine (cached teams,
//!   forms and persisted identities), and
//! - a **tab** store private to one session (the session identifier).
//!
//! Both are plain string-to-string maps holding JSON-serialized values.
//! Operations are synchronous and never suspend.

mod file;
mod keys;
mod memory;

pub use file::FileStorage;
pub use keys::{
    ADMIN_EMAIL_KEY, ADMIN_ID_KEY, CURRENT_ADMIN_KEY, FORMS_KEY, SESSION_ID_KEY, SessionKeys,
    TEAMS_KEY, admin_key,
};
pub use memory::MemoryStorage;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be serialized.
    #[error("storage encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// The backing file exists but is not a JSON object of strings.
    #[error("storage file {path} is corrupt: {message}")]
    Corrupt { path: String, message: String },

    /// A previous writer panicked while holding the lock.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// A string-keyed, string-valued store.
///
/// `set_many` and `remove_many` must appear atomic to callers: after they
/// return, either every entry was applied or none was.
pub trait KeyValueStore: Send + Sync {
    /// Read a raw value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a raw value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing medium cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing medium cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Write several entries as one unit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing medium cannot be written.
    fn set_many(&self, entries: &[(String, String)]) -> Result<(), StorageError>;

    /// Remove several keys as one unit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing medium cannot be written.
    fn remove_many(&self, keys: &[String]) -> Result<(), StorageError>;
}

/// Result of decoding a stored JSON value.
///
/// Makes the "discard on corruption" policy explicit: callers decide what a
/// `Corrupt` entry means for them instead of catching a parse error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded<T> {
    /// The entry existed and decoded cleanly.
    Value(T),
    /// No entry under the key.
    Missing,
    /// The entry existed (or could not be read) but did not decode.
    Corrupt(String),
}

impl<T> Decoded<T> {
    /// Decode an optional raw string.
    #[must_use]
    pub fn from_raw(raw: Option<&str>) -> Self
    where
        T: DeserializeOwned,
    {
        match raw {
            None => Self::Missing,
            Some(raw) => match serde_json::from_str(raw) {
                Ok(value) => Self::Value(value),
                Err(e) => Self::Corrupt(e.to_string()),
            },
        }
    }

    /// The decoded value, if any.
    #[must_use]
    pub fn value(self) -> Option<T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Missing | Self::Corrupt(_) => None,
        }
    }

    #[must_use]
    pub const fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt(_))
    }
}

impl<T: Default> Decoded<T> {
    /// The decoded value, or `T::default()` when missing or corrupt.
    #[must_use]
    pub fn unwrap_or_default(self) -> T {
        self.value().unwrap_or_default()
    }
}

/// Read and decode the JSON value stored under `key`.
///
/// A read failure is reported as `Corrupt` so that callers apply the same
/// discard policy as for undecodable data.
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Decoded<T> {
    match store.get(key) {
        Ok(raw) => Decoded::from_raw(raw.as_deref()),
        Err(e) => Decoded::Corrupt(e.to_string()),
    }
}

/// Serialize `value` as JSON and store it under `key`.
///
/// # Errors
///
/// Returns `StorageError` if serialization or the write fails.
pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decoded_from_raw() {
        assert_eq!(Decoded::<Vec<u32>>::from_raw(None), Decoded::Missing);
        assert_eq!(
            Decoded::<Vec<u32>>::from_raw(Some("[1,2]")),
            Decoded::Value(vec![1, 2])
        );
        let corrupt = Decoded::<Vec<u32>>::from_raw(Some("[1,"));
        assert!(corrupt.is_corrupt());
        assert_eq!(corrupt.unwrap_or_default(), Vec::<u32>::new());
    }

    #[test]
    fn test_read_write_json() {
        let store = MemoryStorage::new();
        write_json(&store, "k", &vec!["a", "b"]).unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some(r#"["a","b"]"#));
        assert_eq!(
            read_json::<Vec<String>>(&store, "k"),
            Decoded::Value(vec!["a".to_owned(), "b".to_owned()])
        );
        assert_eq!(read_json::<Vec<String>>(&store, "missing"), Decoded::Missing);
    }
}
