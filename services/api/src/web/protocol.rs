//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the API server
//! for one editor session.

use doc_studio_core::{
    domain::{ContentBlock, Document, DocumentKind, Notice, RegionId},
    editor::EditorPhase,
    generation::GenerationRequest,
    rewrite::RewriteOp,
    selection::{Rect, SelectionContext},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================
// NOTE: A click on the floating menu must be sent as `rewrite`, never as
// `outside_click`; the client stops the click from reaching the document.
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Starts (or restarts) generation with the given inputs.
    Generate { request: GenerationRequest },

    /// The user selected text inside an editable region.
    Select {
        region: RegionId,
        text: String,
        bounds: Rect,
    },

    /// A click landed outside every editable region.
    OutsideClick,

    /// The user typed into a region; `text` is its full current content.
    EditRegion { region: RegionId, text: String },

    /// A floating-menu action on the current selection.
    Rewrite { op: RewriteOp },

    /// Reconcile every region and commit the document.
    Approve,

    /// Encode the approved content; `format` is `txt`, `docx` or `pptx`.
    Export { format: String },
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================
// NOTE: An exported file is sent as one raw Binary frame right after its
// `export_ready` message.
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once when the connection is ready.
    SessionReady { session_id: Uuid, kind: DocumentKind },

    PhaseChanged { phase: EditorPhase },

    /// The generated blocks to render as editable regions.
    Blocks { blocks: Vec<ContentBlock> },

    /// Show the floating menu at `context.anchor`.
    Selection { context: SelectionContext },

    /// Hide the floating menu.
    SelectionCleared,

    /// Replace the region's displayed text.
    RegionUpdated { region: RegionId, text: String },

    /// `document` is absent when nothing was stored.
    Approved { document: Option<Document> },

    ExportReady {
        file_name: String,
        media_type: String,
        size: usize,
    },

    /// A user-facing toast.
    Notice(Notice),

    /// Reports a rejected message to the client.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_studio_core::generation::SlideCount;
    use serde_json::json;

    #[test]
    fn generate_message_carries_a_tagged_request() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "generate",
            "request": {
                "kind": "presentation",
                "file_name": "a.pdf",
                "title": "Deck",
                "slide_count": 3
            }
        }))
        .unwrap();
        match msg {
            ClientMessage::Generate {
                request: GenerationRequest::Presentation(req),
            } => assert_eq!(req.slide_count, SlideCount::try_from(3).unwrap()),
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn select_message_parses_bounds() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "select",
            "region": 1,
            "text": "important",
            "bounds": {"left": 1.0, "top": 2.0, "width": 3.0, "height": 4.0}
        }))
        .unwrap();
        assert!(matches!(msg, ClientMessage::Select { region: RegionId(1), .. }));
    }

    #[test]
    fn notice_is_flattened_into_the_envelope() {
        let value = serde_json::to_value(ServerMessage::Notice(Notice::success("Synonym applied!"))).unwrap();
        assert_eq!(
            value,
            json!({"type": "notice", "level": "success", "message": "Synonym applied!"})
        );
    }

    #[test]
    fn rewrite_op_is_snake_case() {
        let msg: ClientMessage =
            serde_json::from_value(json!({"type": "rewrite", "op": "develop"})).unwrap();
        assert!(matches!(msg, ClientMessage::Rewrite { op: RewriteOp::Develop }));
    }
}
