//! services/api/src/adapters/file_storage.rs
//!
//! This module contains the on-disk storage adapter, which is the concrete
//! implementation of the `LocalStorage` port from the `core` crate. Each key is
//! stored as one JSON file inside the configured directory.

use doc_studio_core::ports::{LocalStorage, PortError, PortResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A storage adapter that implements the `LocalStorage` port with plain files.
#[derive(Clone, Debug)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Creates a new `FileStorage`, creating `root` if it does not exist.
    pub fn new(root: impl Into<PathBuf>) -> PortResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            PortError::Unexpected(format!("Cannot create storage dir {}: {}", root.display(), e))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a key to a file name. `[A-Za-z0-9-]` is kept; every other byte,
    /// `_` included, becomes `_XX` in hex, so distinct keys never share a file
    /// and no key can escape the storage directory.
    fn path_for(&self, key: &str) -> PathBuf {
        let mut safe = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                safe.push(byte as char);
            } else {
                safe.push_str(&format!("_{:02X}", byte));
            }
        }
        self.root.join(format!("{}.json", safe))
    }
}

//=========================================================================================
// `LocalStorage` Trait Implementation
//=========================================================================================

impl LocalStorage for FileStorage {
    fn get(&self, key: &str) -> PortResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str) -> PortResult<()> {
        // Readers must never see a partially written array.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|e| PortError::Unexpected(e.to_string()))?;
        fs::rename(&tmp, &path).map_err(|e| PortError::Unexpected(e.to_string()))
    }

    fn remove(&self, key: &str) -> PortResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_studio_core::{DocumentKind, DocumentStore, NewDocument};
    use std::sync::Arc;

    #[test]
    fn missing_key_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        assert_eq!(storage.get("documents_alice").unwrap(), None);
        storage.remove("documents_alice").unwrap();
    }

    #[test]
    fn set_then_get_returns_value() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        storage.set("documents_alice", "[]").unwrap();
        assert_eq!(storage.get("documents_alice").unwrap().as_deref(), Some("[]"));
        assert!(dir.path().join("documents_5Falice.json").exists());
    }

    #[test]
    fn keys_cannot_escape_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested")).unwrap();
        storage.set("documents_../../etc", "x").unwrap();
        assert!(storage
            .root()
            .join("documents_5F_2E_2E_2F_2E_2E_2Fetc.json")
            .exists());
        assert_eq!(std::fs::read_dir(storage.root()).unwrap().count(), 1);
    }

    #[test]
    fn look_alike_owners_get_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(FileStorage::new(dir.path()).unwrap());
        let note = |name: &str| NewDocument {
            name: name.to_string(),
            kind: DocumentKind::Summary,
            source: name.to_string(),
            result: "text".to_string(),
        };

        let mut alice = DocumentStore::bound(storage.clone(), "alice@x.com");
        alice.add(note("alice-secret")).unwrap();

        let mut other = DocumentStore::bound(storage.clone(), "alice_x_com");
        assert!(other.documents().is_empty());
        other.add(note("other-doc")).unwrap();

        let alice = DocumentStore::bound(storage, "alice@x.com");
        let names: Vec<_> = alice.documents().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["alice-secret"]);
    }

    #[test]
    fn store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(FileStorage::new(dir.path()).unwrap());

        let mut store = DocumentStore::bound(storage.clone(), "alice");
        let added = store
            .add(NewDocument {
                name: "notes.txt".to_string(),
                kind: DocumentKind::Summary,
                source: "notes.txt".to_string(),
                result: "short".to_string(),
            })
            .unwrap();

        let reopened = DocumentStore::bound(storage, "alice");
        assert_eq!(reopened.documents(), &[added]);
    }
}
