//! crates/doc_studio_core/src/editor.rs
//!
//! The editor session shared by the summary and presentation surfaces.
//!
//! A session moves through `Idle → Generating → Reviewing → Approved →
//! Exported`. While reviewing, each content block is exposed as an
//! `EditableRegion` holding two copies of its text: the live text the user is
//! typing into, and the block that will be committed. Rewrites write both;
//! direct edits only touch the live text until `reconcile` copies it over.
//! Approval and export always reconcile first.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{
    ContentBlock, Document, DocumentKind, ExportArtifact, ExportPayload, NewDocument, Notice,
    RegionId, SlideBody,
};
use crate::generation::{GenerationRequest, ValidationError};
use crate::ports::{ExportAdapter, PortError};
use crate::rewrite::{replace_first, RewriteEngine, RewriteOp};
use crate::selection::{SelectionContext, SelectionEvent, SelectionTracker};
use crate::store::DocumentStore;

//=========================================================================================
// Phases, tickets, outcomes, errors
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorPhase {
    Idle,
    Generating,
    Reviewing,
    Approved,
    Exported,
}

impl fmt::Display for EditorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EditorPhase::Idle => "idle",
            EditorPhase::Generating => "generating",
            EditorPhase::Reviewing => "reviewing",
            EditorPhase::Approved => "approved",
            EditorPhase::Exported => "exported",
        };
        f.write_str(name)
    }
}

/// Identifies one generation attempt. Results carrying an older ticket are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenerationTicket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// The region now holds `text` in both its live view and its block.
    Applied { region: RegionId, text: String },
    /// The selected text is no longer in the region; nothing changed.
    StaleSelection,
    /// There was no active selection.
    NoSelection,
}

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Cannot {action} while the editor is {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: EditorPhase,
    },

    #[error("A {requested} request was sent to a {editor} editor")]
    KindMismatch {
        requested: DocumentKind,
        editor: DocumentKind,
    },

    #[error("Unknown {0}")]
    UnknownRegion(RegionId),

    #[error("Failed to encode the document payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Export failed: {0}")]
    Export(#[source] PortError),
}

//=========================================================================================
// Editable regions
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditableRegion {
    id: RegionId,
    block: ContentBlock,
    live: String,
}

impl EditableRegion {
    fn new(id: RegionId, block: ContentBlock) -> Self {
        let live = block.body.to_text();
        Self { id, block, live }
    }

    pub fn id(&self) -> RegionId {
        self.id
    }

    /// What the user currently sees.
    pub fn live_text(&self) -> &str {
        &self.live
    }

    /// The in-memory block, as of the last rewrite or reconcile.
    pub fn block(&self) -> &ContentBlock {
        &self.block
    }

    fn commit(&mut self, text: String) {
        self.block.body = SlideBody::Text(text.clone());
        self.live = text;
    }

    fn reconcile(&mut self) {
        self.block.body = SlideBody::Text(self.live.clone());
    }
}

/// The presentation result payload stored with an approved deck.
#[derive(Serialize)]
struct PresentationPayload<'a> {
    title: &'a str,
    template: &'a str,
    structure: &'a str,
    slides: Vec<&'a ContentBlock>,
}

#[derive(Deserialize)]
struct StoredPresentation {
    title: String,
    template: String,
    slides: Vec<ContentBlock>,
}

/// Rebuilds the export payload of a previously approved document.
pub fn stored_export_payload(document: &Document) -> Result<ExportPayload, EditorError> {
    Ok(match document.kind {
        DocumentKind::Summary => ExportPayload::Summary {
            title: document.name.clone(),
            text: document.result.clone(),
        },
        DocumentKind::Presentation => {
            let stored: StoredPresentation = serde_json::from_str(&document.result)?;
            ExportPayload::Presentation {
                title: stored.title,
                template: stored.template,
                slides: stored.slides,
            }
        }
    })
}

//=========================================================================================
// The session
//=========================================================================================

pub struct EditorSession {
    id: Uuid,
    kind: DocumentKind,
    phase: EditorPhase,
    /// Phase to fall back to if the in-flight generation fails.
    resume_phase: EditorPhase,
    next_ticket: u64,
    pending: Option<(GenerationTicket, GenerationRequest)>,
    /// The request the current regions were generated from.
    request: Option<GenerationRequest>,
    regions: Vec<EditableRegion>,
    selection: SelectionTracker,
    notices: Vec<Notice>,
}

impl EditorSession {
    pub fn new(kind: DocumentKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            phase: EditorPhase::Idle,
            resume_phase: EditorPhase::Idle,
            next_ticket: 0,
            pending: None,
            request: None,
            regions: Vec::new(),
            selection: SelectionTracker::new(),
            notices: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn phase(&self) -> EditorPhase {
        self.phase
    }

    pub fn regions(&self) -> &[EditableRegion] {
        &self.regions
    }

    pub fn blocks(&self) -> Vec<&ContentBlock> {
        self.regions.iter().map(|r| &r.block).collect()
    }

    pub fn selection(&self) -> Option<&SelectionContext> {
        self.selection.context()
    }

    /// Drains the notices raised since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn require(&self, action: &'static str, allowed: &[EditorPhase]) -> Result<(), EditorError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(EditorError::InvalidTransition {
                action,
                phase: self.phase,
            })
        }
    }

    fn region_mut(&mut self, region: RegionId) -> Result<&mut EditableRegion, EditorError> {
        self.regions
            .get_mut(region.0)
            .ok_or(EditorError::UnknownRegion(region))
    }

    // --- Generation ---

    /// Validates `request` and enters `Generating`.
    ///
    /// On a validation failure exactly one error notice is raised and the
    /// session is left untouched.
    pub fn begin_generation(
        &mut self,
        request: &GenerationRequest,
    ) -> Result<GenerationTicket, EditorError> {
        self.require("generate", &[EditorPhase::Idle, EditorPhase::Reviewing])?;
        if request.kind() != self.kind {
            return Err(EditorError::KindMismatch {
                requested: request.kind(),
                editor: self.kind,
            });
        }
        if let Err(e) = request.validate() {
            self.notices.push(Notice::error(e.to_string()));
            return Err(e.into());
        }

        self.next_ticket += 1;
        let ticket = GenerationTicket(self.next_ticket);
        self.pending = Some((ticket, request.clone()));
        self.resume_phase = self.phase;
        self.phase = EditorPhase::Generating;
        self.selection.clear();
        info!(session = %self.id, kind = %self.kind, "Generation started.");
        Ok(ticket)
    }

    fn take_pending(&mut self, ticket: GenerationTicket) -> Option<GenerationRequest> {
        let awaited = matches!(&self.pending, Some((pending, _)) if *pending == ticket);
        if !awaited || self.phase != EditorPhase::Generating {
            return None;
        }
        self.pending.take().map(|(_, request)| request)
    }

    /// Installs generated blocks as editable regions.
    ///
    /// Returns `false` (and changes nothing) when `ticket` is not the
    /// generation the session is waiting for.
    pub fn complete_generation(&mut self, ticket: GenerationTicket, blocks: Vec<ContentBlock>) -> bool {
        let Some(request) = self.take_pending(ticket) else {
            warn!(session = %self.id, "Dropping a stale generation result.");
            return false;
        };

        self.regions = blocks
            .into_iter()
            .enumerate()
            .map(|(i, block)| EditableRegion::new(RegionId(i), block))
            .collect();
        self.request = Some(request);
        self.phase = EditorPhase::Reviewing;
        self.notices.push(Notice::success(match self.kind {
            DocumentKind::Summary => "Summary generated successfully!",
            DocumentKind::Presentation => {
                "Presentation content generated! Review and edit before approval."
            }
        }));
        info!(session = %self.id, regions = self.regions.len(), "Generation complete.");
        true
    }

    /// Abandons the in-flight generation and returns to the previous phase.
    pub fn fail_generation(&mut self, ticket: GenerationTicket, reason: &str) -> bool {
        if self.take_pending(ticket).is_none() {
            return false;
        }
        self.phase = self.resume_phase;
        self.notices
            .push(Notice::error(format!("Generation failed: {}", reason)));
        true
    }

    // --- Selection ---

    pub fn select(
        &mut self,
        event: &SelectionEvent,
        region: RegionId,
    ) -> Result<Option<&SelectionContext>, EditorError> {
        self.require("select text", &[EditorPhase::Reviewing])?;
        if region.0 >= self.regions.len() {
            return Err(EditorError::UnknownRegion(region));
        }
        Ok(self.selection.on_selection(event, region))
    }

    pub fn outside_click(&mut self) {
        self.selection.on_outside_click();
    }

    // --- Editing ---

    /// The user typed directly into a region. Only the live text changes.
    pub fn edit_live(&mut self, region: RegionId, text: impl Into<String>) -> Result<(), EditorError> {
        self.require("edit", &[EditorPhase::Reviewing])?;
        self.region_mut(region)?.live = text.into();
        Ok(())
    }

    /// Applies `op` to the current selection and commits the result.
    pub fn apply_rewrite(
        &mut self,
        op: RewriteOp,
        engine: &RewriteEngine,
    ) -> Result<RewriteOutcome, EditorError> {
        self.require("rewrite", &[EditorPhase::Reviewing])?;
        let Some(ctx) = self.selection.context().cloned() else {
            return Ok(RewriteOutcome::NoSelection);
        };
        // The menu closes whatever happens next; the anchor is stale either way.
        self.selection.clear();

        let replacement = engine.transform(op, &ctx.selected_text);
        let region = self.region_mut(ctx.region)?;
        match replace_first(&region.live, &ctx.selected_text, &replacement) {
            Some(updated) => {
                region.commit(updated.clone());
                self.notices.push(Notice::success(op.success_message()));
                Ok(RewriteOutcome::Applied {
                    region: ctx.region,
                    text: updated,
                })
            }
            None => {
                debug!(session = %self.id, region = %ctx.region, "Selection no longer present; rewrite skipped.");
                Ok(RewriteOutcome::StaleSelection)
            }
        }
    }

    /// Copies every region's live text into its block.
    pub fn reconcile(&mut self) {
        for region in &mut self.regions {
            region.reconcile();
        }
    }

    // --- Approval and export ---

    fn request(&self) -> Result<&GenerationRequest, EditorError> {
        self.request.as_ref().ok_or(EditorError::InvalidTransition {
            action: "read content",
            phase: self.phase,
        })
    }

    fn result_payload(&self) -> Result<String, EditorError> {
        match self.request()? {
            GenerationRequest::Summary(_) => Ok(self.summary_text()),
            GenerationRequest::Presentation(req) => Ok(serde_json::to_string(&PresentationPayload {
                title: &req.title,
                template: req.template.as_str(),
                structure: req.structure.as_str(),
                slides: self.blocks(),
            })?),
        }
    }

    fn summary_text(&self) -> String {
        self.regions
            .iter()
            .map(|r| r.block.body.to_text())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Reconciles, commits one document to `store`, and locks the session.
    ///
    /// Returns `Ok(None)` if the store has no owner bound.
    pub fn approve(&mut self, store: &mut DocumentStore) -> Result<Option<Document>, EditorError> {
        self.require("approve", &[EditorPhase::Reviewing])?;
        self.reconcile();

        let request = self.request()?;
        let new = NewDocument {
            name: request.document_name(),
            kind: self.kind,
            source: request.source_descriptor(),
            result: self.result_payload()?,
        };
        let document = store.add(new);
        if let Some(fault) = store.take_fault() {
            self.notices.push(Notice::warning(fault.to_string()));
        }
        if document.is_none() {
            debug!(session = %self.id, "No owner bound; approved content was not stored.");
            self.notices
                .push(Notice::info("Sign in to keep approved documents in your profile."));
        }

        self.phase = EditorPhase::Approved;
        self.selection.clear();
        self.notices.push(Notice::success(match self.kind {
            DocumentKind::Summary => "Summary approved!",
            DocumentKind::Presentation => "Presentation approved and generated!",
        }));
        info!(session = %self.id, kind = %self.kind, "Content approved.");
        Ok(document)
    }

    pub fn export_payload(&self) -> Result<ExportPayload, EditorError> {
        Ok(match self.request()? {
            GenerationRequest::Summary(_) => ExportPayload::Summary {
                title: self.request()?.export_title(),
                text: self.summary_text(),
            },
            GenerationRequest::Presentation(req) => ExportPayload::Presentation {
                title: req.title.clone(),
                template: req.template.as_str().to_string(),
                slides: self.blocks().into_iter().cloned().collect(),
            },
        })
    }

    /// Hands the approved content to `adapter`.
    ///
    /// A failing adapter raises an error notice; the stored document is unaffected.
    pub fn export(&mut self, adapter: &dyn ExportAdapter) -> Result<ExportArtifact, EditorError> {
        self.require("export", &[EditorPhase::Approved, EditorPhase::Exported])?;
        let payload = self.export_payload()?;
        match adapter.export(&payload) {
            Ok(artifact) => {
                self.phase = EditorPhase::Exported;
                self.notices
                    .push(Notice::success(format!("Downloaded {}", artifact.file_name)));
                Ok(artifact)
            }
            Err(e) => {
                warn!(session = %self.id, format = adapter.format(), "Export failed: {}", e);
                self.notices
                    .push(Notice::error(format!("Export failed: {}", e)));
                Err(EditorError::Export(e))
            }
        }
    }
}
