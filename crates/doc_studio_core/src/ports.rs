//! crates/doc_studio_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific storage, generation, or export implementations.

use async_trait::async_trait;

use crate::domain::{ContentBlock, ExportArtifact, ExportPayload};
use crate::generation::GenerationRequest;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., disk, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Durable per-user key/value storage (the browser's local storage, a directory
/// on disk, ...). Values are opaque strings; the store writes JSON.
///
/// This port is synchronous: every store operation completes inside one event
/// handler.
pub trait LocalStorage: Send + Sync {
    /// Returns `Ok(None)` when the key has never been written.
    fn get(&self, key: &str) -> PortResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> PortResult<()>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> PortResult<()>;
}

#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Produces the content blocks for a validated request: one block for a
    /// summary, `slide_count` blocks numbered from 1 for a presentation.
    ///
    /// Callers cancel an in-flight generation by dropping the future.
    async fn generate(&self, request: &GenerationRequest) -> PortResult<Vec<ContentBlock>>;
}

pub trait ExportAdapter: Send + Sync {
    /// Short format identifier, e.g. `txt` or `docx`.
    fn format(&self) -> &'static str;

    /// Encodes the reconciled payload into a downloadable artifact.
    fn export(&self, payload: &ExportPayload) -> PortResult<ExportArtifact>;
}
