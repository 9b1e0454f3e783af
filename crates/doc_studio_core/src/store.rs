//! crates/doc_studio_core/src/store.rs
//!
//! The owner-scoped Document Store.
//!
//! A store is constructed unbound and holds nothing until an owner is bound.
//! Binding loads that owner's sequence from `LocalStorage` under the key
//! `documents_<ownerId>`; every `add` writes the full sequence back. Storage
//! problems never reach the caller as errors: a bad read yields an empty
//! sequence, a failed write keeps the in-memory add and leaves a
//! `StorageFault` for the caller to surface as a warning.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{Document, DocumentId, DocumentKind, NewDocument};
use crate::ports::LocalStorage;

/// Non-fatal storage problems, reported as warnings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageFault {
    #[error("Could not read saved documents: {0}")]
    Read(String),
    #[error("Saved documents were unreadable and have been ignored: {0}")]
    Corrupt(String),
    #[error("Could not save documents: {0}")]
    Write(String),
}

/// Summary counters shown on the profile page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStats {
    pub total: usize,
    pub summaries: usize,
    pub presentations: usize,
    /// Rough storage gauge: 2.5% per document, capped at 100.
    pub usage_percent: f64,
}

pub fn storage_key(owner_id: &str) -> String {
    format!("documents_{}", owner_id)
}

pub struct DocumentStore {
    storage: Arc<dyn LocalStorage>,
    owner: Option<String>,
    documents: Vec<Document>,
    fault: Option<StorageFault>,
}

impl DocumentStore {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self {
            storage,
            owner: None,
            documents: Vec::new(),
            fault: None,
        }
    }

    /// Convenience for `new` followed by `bind`.
    pub fn bound(storage: Arc<dyn LocalStorage>, owner_id: &str) -> Self {
        let mut store = Self::new(storage);
        store.bind(owner_id);
        store
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Switches the store to `owner_id`, replacing the in-memory sequence with
    /// whatever is persisted for that owner.
    pub fn bind(&mut self, owner_id: &str) {
        self.owner = Some(owner_id.to_string());
        self.documents = self.load(owner_id);
        info!(
            owner = owner_id,
            count = self.documents.len(),
            "Document store bound."
        );
    }

    pub fn unbind(&mut self) {
        self.owner = None;
        self.documents.clear();
    }

    fn load(&mut self, owner_id: &str) -> Vec<Document> {
        let raw = match self.storage.get(&storage_key(owner_id)) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(owner = owner_id, "Failed to read documents: {}", e);
                self.fault = Some(StorageFault::Read(e.to_string()));
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Document>>(&raw) {
            Ok(documents) => documents,
            Err(e) => {
                warn!(owner = owner_id, "Stored documents are corrupt: {}", e);
                self.fault = Some(StorageFault::Corrupt(e.to_string()));
                Vec::new()
            }
        }
    }

    fn persist(&mut self) {
        let Some(owner_id) = self.owner.as_deref() else {
            return;
        };
        let result = serde_json::to_string(&self.documents)
            .map_err(|e| e.to_string())
            .and_then(|json| {
                self.storage
                    .set(&storage_key(owner_id), &json)
                    .map_err(|e| e.to_string())
            });
        if let Err(e) = result {
            warn!(owner = owner_id, "Failed to persist documents: {}", e);
            self.fault = Some(StorageFault::Write(e));
        }
    }

    /// Appends a new document for the bound owner.
    ///
    /// Returns `None` without doing anything when no owner is bound.
    pub fn add(&mut self, new: NewDocument) -> Option<Document> {
        let owner_id = self.owner.clone()?;
        let created_at = Utc::now();
        let document = Document {
            id: DocumentId::generate(created_at),
            name: new.name,
            kind: new.kind,
            source: new.source,
            result: new.result,
            created_at,
            owner_id,
        };
        self.documents.push(document.clone());
        self.persist();
        Some(document)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn list_by_kind(&self, kind: DocumentKind) -> Vec<&Document> {
        self.documents.iter().filter(|d| d.kind == kind).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id.as_str() == id)
    }

    /// Deletes every document of the bound owner, in memory and in storage.
    pub fn clear(&mut self) {
        let Some(owner_id) = self.owner.as_deref() else {
            return;
        };
        if let Err(e) = self.storage.remove(&storage_key(owner_id)) {
            warn!(owner = owner_id, "Failed to clear stored documents: {}", e);
            self.fault = Some(StorageFault::Write(e.to_string()));
        }
        self.documents.clear();
    }

    pub fn stats(&self) -> StoreStats {
        let summaries = self.list_by_kind(DocumentKind::Summary).len();
        let presentations = self.list_by_kind(DocumentKind::Presentation).len();
        let total = self.documents.len();
        StoreStats {
            total,
            summaries,
            presentations,
            usage_percent: (total as f64 * 2.5).min(100.0),
        }
    }

    /// Returns and clears the most recent storage fault, if any.
    pub fn take_fault(&mut self) -> Option<StorageFault> {
        self.fault.take()
    }
}
