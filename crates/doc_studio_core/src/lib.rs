pub mod domain;
pub mod editor;
pub mod generation;
pub mod ports;
pub mod rewrite;
pub mod selection;
pub mod storage;
pub mod store;

pub use domain::{
    ContentBlock, Document, DocumentId, DocumentKind, ExportArtifact, ExportPayload, Identity,
    NewDocument, Notice, NoticeLevel, RegionId, SlideBody,
};
pub use editor::{
    stored_export_payload, EditorError, EditorPhase, EditorSession, GenerationTicket,
    RewriteOutcome,
};
pub use generation::{GenerationRequest, PresentationRequest, SummaryRequest, ValidationError};
pub use ports::{ExportAdapter, GenerationService, LocalStorage, PortError, PortResult};
pub use rewrite::{RewriteEngine, RewriteOp, SynonymTable};
pub use selection::{compute_anchor, Anchor, Rect, SelectionContext, SelectionEvent};
pub use store::{DocumentStore, StorageFault, StoreStats};
