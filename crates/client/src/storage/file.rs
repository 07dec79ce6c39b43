//! JSON-file storage.
//!
//! The whole map lives in one file. Every write goes to a sibling temporary
//! file which is then renamed over the original, so a crash mid-write leaves
//! either the old map or the new one on disk. A file that does not parse is
//! moved aside to `<name>.corrupt` and the store starts over empty.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use super::{KeyValueStore, StorageError};

type Entries = BTreeMap<String, String>;

/// Key-value store persisted as a single JSON object on disk.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    guard: Mutex<()>,
}

impl FileStorage {
    /// Open (lazily) a store backed by `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Entries, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Entries::new());
        }
        match serde_json::from_str(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                self.quarantine(&e.to_string())?;
                Ok(Entries::new())
            }
        }
    }

    /// Move an unreadable file out of the way so the next write starts fresh.
    fn quarantine(&self, reason: &str) -> Result<(), StorageError> {
        let mut aside = self.path.clone().into_os_string();
        aside.push(".corrupt");
        let aside = PathBuf::from(aside);
        warn!(
            path = %self.path.display(),
            moved_to = %aside.display(),
            reason,
            "Discarding corrupt storage file"
        );
        fs::rename(&self.path, &aside).map_err(|e| StorageError::Corrupt {
            path: self.path.display().to_string(),
            message: format!("{reason}; could not move aside: {e}"),
        })
    }

    fn write_entries(&self, entries: &Entries) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, serde_json::to_string_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut Entries)) -> Result<(), StorageError> {
        let _guard = self.guard.lock().map_err(|_| StorageError::Poisoned)?;
        let mut entries = self.read_entries()?;
        apply(&mut entries);
        self.write_entries(&entries)
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.guard.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }

    fn set_many(&self, new_entries: &[(String, String)]) -> Result<(), StorageError> {
        self.update(|entries| {
            for (key, value) in new_entries {
                entries.insert(key.clone(), value.clone());
            }
        })
    }

    fn remove_many(&self, keys: &[String]) -> Result<(), StorageError> {
        self.update(|entries| {
            for key in keys {
                entries.remove(key);
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempdir().unwrap();
        let store = FileStorage::new(dir.path().join("local.json"));
        assert_eq!(store.get("hrSessionId").unwrap(), None);
    }

    #[test]
    fn test_persists_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("local.json");

        FileStorage::new(&path)
            .set_many(&[
                ("hrAdminId_s1".to_owned(), "u1".to_owned()),
                ("hrAdminEmail_s1".to_owned(), "hr@x.com".to_owned()),
            ])
            .unwrap();

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get("hrAdminId_s1").unwrap().as_deref(), Some("u1"));
        reopened.remove("hrAdminId_s1").unwrap();
        assert_eq!(reopened.get("hrAdminId_s1").unwrap(), None);
        assert!(!dir.path().join("nested").join("local.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_reads_empty_and_is_moved_aside() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("local.json");
        fs::write(&path, "{not json").unwrap();

        let store = FileStorage::new(&path);

        assert_eq!(store.get("anything").unwrap(), None);
        assert!(!path.exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("local.json.corrupt")).unwrap(),
            "{not json"
        );
    }

    #[test]
    fn test_writes_succeed_after_corruption() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, r#"{"hrTeams_a1": "[]""#).unwrap();
        let store = FileStorage::new(&path);

        store.set("k", "v").unwrap();
        store
            .remove_many(&["hrAdminId_s1".to_owned(), "hrAdminEmail_s1".to_owned()])
            .unwrap();

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(reopened.get("hrTeams_a1").unwrap(), None);
    }
}
