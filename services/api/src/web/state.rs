//! services/api/src/web/state.rs
//!
//! Defines the application's shared and session-specific states.

use crate::config::Config;
use axum::extract::ws::{Message, WebSocket};
use doc_studio_core::{
    domain::{DocumentKind, Identity},
    editor::EditorSession,
    ports::{GenerationService, LocalStorage},
    rewrite::RewriteEngine,
    store::DocumentStore,
};
use futures::stream::SplitSink;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// The write half of a WebSocket, shared between the message loop and the generation task.
pub type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub generator: Arc<dyn GenerationService>,
    pub rewrite_engine: Arc<RewriteEngine>,
    pub stores: Arc<StoreRegistry>,
}

/// One `DocumentStore` per owner, bound on first use.
///
/// Every connection of the same owner goes through the same store, so
/// concurrent sessions append to one sequence instead of overwriting each other.
pub struct StoreRegistry {
    storage: Arc<dyn LocalStorage>,
    stores: std::sync::Mutex<HashMap<String, DocumentStore>>,
}

impl StoreRegistry {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self {
            storage,
            stores: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Runs `f` against the store bound to `owner_id`.
    pub fn with_store<R>(&self, owner_id: &str, f: impl FnOnce(&mut DocumentStore) -> R) -> R {
        let mut stores = self
            .stores
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let store = stores
            .entry(owner_id.to_string())
            .or_insert_with(|| DocumentStore::bound(self.storage.clone(), owner_id));
        f(store)
    }

    /// `with_store` on the blocking pool. The stores write through to disk
    /// under a std mutex, so async handlers go through here.
    pub async fn with_store_blocking<R, F>(
        self: Arc<Self>,
        owner_id: String,
        f: F,
    ) -> Result<R, tokio::task::JoinError>
    where
        F: FnOnce(&mut DocumentStore) -> R + Send + 'static,
        R: Send + 'static,
    {
        tokio::task::spawn_blocking(move || self.with_store(&owner_id, f)).await
    }
}

//=========================================================================================
// SessionState (Specific to One WebSocket Connection)
//=========================================================================================

/// The state for a single, active editor connection.
pub struct SessionState {
    pub identity: Identity,
    pub editor: EditorSession,
    /// A token to cancel the in-flight generation task.
    pub cancellation_token: CancellationToken,
}

impl SessionState {
    pub fn new(identity: Identity, kind: DocumentKind) -> Self {
        Self {
            identity,
            editor: EditorSession::new(kind),
            cancellation_token: CancellationToken::new(),
        }
    }
}

#[cfg(test)]
impl AppState {
    /// In-memory state with an instant mock generator.
    pub(crate) fn for_tests() -> Self {
        use crate::adapters::MockGenerationAdapter;
        use doc_studio_core::storage::MemoryStorage;
        use std::time::Duration;

        let config = match Config::from_lookup(|_| None) {
            Ok(config) => config,
            Err(e) => panic!("default config must load: {}", e),
        };
        Self {
            config: Arc::new(config),
            generator: Arc::new(MockGenerationAdapter::new(Duration::ZERO)),
            rewrite_engine: Arc::new(RewriteEngine::default()),
            stores: Arc::new(StoreRegistry::new(Arc::new(MemoryStorage::new()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_studio_core::{domain::NewDocument, storage::MemoryStorage};

    #[tokio::test]
    async fn blocking_access_shares_the_owner_store() {
        let registry = Arc::new(StoreRegistry::new(Arc::new(MemoryStorage::new())));
        let added = registry
            .clone()
            .with_store_blocking("owner-1".to_string(), |store| {
                store.add(NewDocument {
                    name: "notes.txt".to_string(),
                    kind: DocumentKind::Summary,
                    source: "notes.txt".to_string(),
                    result: "Short summary".to_string(),
                });
                store.documents().len()
            })
            .await
            .unwrap();
        assert_eq!(added, 1);

        assert_eq!(registry.with_store("owner-1", |store| store.documents().len()), 1);
        let other = registry
            .with_store_blocking("owner-2".to_string(), |store| store.documents().len())
            .await
            .unwrap();
        assert_eq!(other, 0);
    }
}
