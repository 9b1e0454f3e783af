//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for an editor WebSocket connection.
//! Each connection owns one `EditorSession`; client events are applied to it one
//! at a time, in arrival order.

use crate::{
    adapters::exporter_for,
    error::ApiError,
    web::{
        generation_task::generation_process,
        protocol::{ClientMessage, ServerMessage},
        state::{AppState, SessionState, WsSender},
    },
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use doc_studio_core::{
    domain::{DocumentKind, Identity},
    editor::{EditorError, GenerationTicket, RewriteOutcome},
    generation::GenerationRequest,
    selection::SelectionEvent,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::{runtime::RuntimeFlavor, sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

//=========================================================================================
// Outbound frames
//=========================================================================================

/// A frame to send back to the client.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Text(ServerMessage),
    Binary(Vec<u8>),
}

/// What handling one client message produced.
#[derive(Debug, Default)]
pub struct Reply {
    pub frames: Vec<Outbound>,
    /// Set when a generation was accepted and must now be run.
    pub start_generation: Option<(GenerationTicket, GenerationRequest)>,
}

impl Reply {
    fn send(&mut self, msg: ServerMessage) {
        self.frames.push(Outbound::Text(msg));
    }

    fn reject(&mut self, err: &EditorError) {
        self.send(ServerMessage::Error {
            message: err.to_string(),
        });
    }
}

/// Moves the editor's pending notices into `frames`.
pub(crate) fn drain_notices(session: &mut SessionState, frames: &mut Vec<Outbound>) {
    frames.extend(
        session
            .editor
            .take_notices()
            .into_iter()
            .map(|n| Outbound::Text(ServerMessage::Notice(n))),
    );
}

pub(crate) async fn send_frames(ws_sender: &WsSender, frames: Vec<Outbound>) -> Result<(), ApiError> {
    let mut sender = ws_sender.lock().await;
    for frame in frames {
        let message = match frame {
            Outbound::Text(msg) => Message::Text(serde_json::to_string(&msg)?.into()),
            Outbound::Binary(bytes) => Message::Binary(bytes.into()),
        };
        sender.send(message).await?;
    }
    Ok(())
}

//=========================================================================================
// Message handling
//=========================================================================================

/// Applies one client message to the session.
///
/// This never touches the socket; the caller sends `Reply::frames` and starts
/// the generation task if one was requested.
pub fn handle_client_message(app_state: &AppState, session: &mut SessionState, msg: ClientMessage) -> Reply {
    let mut reply = Reply::default();
    match msg {
        ClientMessage::Generate { request } => match session.editor.begin_generation(&request) {
            Ok(ticket) => {
                reply.send(ServerMessage::SelectionCleared);
                reply.send(ServerMessage::PhaseChanged {
                    phase: session.editor.phase(),
                });
                reply.start_generation = Some((ticket, request));
            }
            // The validation notice is all the client needs.
            Err(EditorError::Validation(_)) => {}
            Err(e) => reply.reject(&e),
        },
        ClientMessage::Select { region, text, bounds } => {
            let event = SelectionEvent { text, bounds };
            match session.editor.select(&event, region) {
                Ok(Some(context)) => reply.send(ServerMessage::Selection {
                    context: context.clone(),
                }),
                Ok(None) => reply.send(ServerMessage::SelectionCleared),
                Err(e) => reply.reject(&e),
            }
        }
        ClientMessage::OutsideClick => {
            session.editor.outside_click();
            reply.send(ServerMessage::SelectionCleared);
        }
        ClientMessage::EditRegion { region, text } => {
            if let Err(e) = session.editor.edit_live(region, text) {
                reply.reject(&e);
            }
        }
        ClientMessage::Rewrite { op } => {
            match session.editor.apply_rewrite(op, &app_state.rewrite_engine) {
                Ok(RewriteOutcome::Applied { region, text }) => {
                    reply.send(ServerMessage::RegionUpdated { region, text });
                    reply.send(ServerMessage::SelectionCleared);
                }
                Ok(RewriteOutcome::StaleSelection) => reply.send(ServerMessage::SelectionCleared),
                Ok(RewriteOutcome::NoSelection) => {}
                Err(e) => reply.reject(&e),
            }
        }
        ClientMessage::Approve => {
            let owner_id = session.identity.id.clone();
            let editor = &mut session.editor;
            match app_state.stores.with_store(&owner_id, |store| editor.approve(store)) {
                Ok(document) => {
                    reply.send(ServerMessage::SelectionCleared);
                    reply.send(ServerMessage::Approved { document });
                    reply.send(ServerMessage::PhaseChanged {
                        phase: session.editor.phase(),
                    });
                }
                Err(e) => reply.reject(&e),
            }
        }
        ClientMessage::Export { format } => match exporter_for(&format) {
            Some(adapter) => match session.editor.export(adapter.as_ref()) {
                Ok(artifact) => {
                    reply.send(ServerMessage::ExportReady {
                        file_name: artifact.file_name,
                        media_type: artifact.media_type,
                        size: artifact.bytes.len(),
                    });
                    reply.frames.push(Outbound::Binary(artifact.bytes));
                    reply.send(ServerMessage::PhaseChanged {
                        phase: session.editor.phase(),
                    });
                }
                // Export faults are surfaced through the error notice.
                Err(EditorError::Export(_)) => {}
                Err(e) => reply.reject(&e),
            },
            None => reply.send(ServerMessage::Error {
                message: format!("Unsupported export format '{}'", format),
            }),
        },
    }
    drain_notices(session, &mut reply.frames);
    reply
}

//=========================================================================================
// Socket lifecycle
//=========================================================================================

/// The handler for upgrading HTTP requests to editor WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(kind): Path<DocumentKind>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, identity, kind))
}

/// Runs store-touching work without stalling the other tasks on this worker.
/// A current-thread runtime has no worker to hand them to, so it runs inline.
fn run_blocking<R>(f: impl FnOnce() -> R) -> R {
    match tokio::runtime::Handle::current().runtime_flavor() {
        RuntimeFlavor::MultiThread => tokio::task::block_in_place(f),
        _ => f(),
    }
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>, identity: Identity, kind: DocumentKind) {
    let (sender, mut receiver) = socket.split();
    let ws_sender: WsSender = Arc::new(Mutex::new(sender));

    let session = SessionState::new(identity, kind);
    let session_id = session.editor.id();
    info!(session = %session_id, owner = %session.identity.id, %kind, "Editor connection established.");
    let session_state_lock = Arc::new(Mutex::new(session));

    let ready = vec![
        Outbound::Text(ServerMessage::SessionReady { session_id, kind }),
        Outbound::Text(ServerMessage::PhaseChanged {
            phase: session_state_lock.lock().await.editor.phase(),
        }),
    ];
    if let Err(e) = send_frames(&ws_sender, ready).await {
        error!("Failed to send session ready message: {}", e);
        return;
    }

    let mut generation_task_handle: Option<JoinHandle<()>> = None;

    loop {
        let Some(Ok(msg)) = receiver.next().await else {
            info!("Client disconnected.");
            break;
        };
        match msg {
            Message::Text(text) => {
                let client_msg = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => client_msg,
                    Err(e) => {
                        warn!("Failed to deserialize client message: {}", e);
                        let frames = vec![Outbound::Text(ServerMessage::Error {
                            message: format!("Malformed message: {}", e),
                        })];
                        if send_frames(&ws_sender, frames).await.is_err() {
                            break;
                        }
                        continue;
                    }
                };

                let reply = {
                    let mut session = session_state_lock.lock().await;
                    let reply = run_blocking(|| {
                        handle_client_message(&app_state, &mut session, client_msg)
                    });
                    if reply.start_generation.is_some() {
                        session.cancellation_token.cancel();
                        session.cancellation_token = CancellationToken::new();
                    }
                    reply
                };

                if let Err(e) = send_frames(&ws_sender, reply.frames).await {
                    error!("Failed to send reply: {}", e);
                    break;
                }

                if let Some((ticket, request)) = reply.start_generation {
                    let token = session_state_lock.lock().await.cancellation_token.clone();
                    let app_state = app_state.clone();
                    let session_state_lock = session_state_lock.clone();
                    let ws_sender = ws_sender.clone();
                    generation_task_handle = Some(tokio::spawn(async move {
                        if let Err(e) = generation_process(
                            app_state,
                            session_state_lock,
                            ws_sender,
                            ticket,
                            request,
                            token,
                        )
                        .await
                        {
                            error!("Generation process failed: {}", e);
                        }
                    }));
                }
            }
            Message::Close(_) => {
                info!("Client sent close message.");
                break;
            }
            _ => {}
        }
    }

    // --- Cleanup ---
    session_state_lock.lock().await.cancellation_token.cancel();
    if let Some(handle) = generation_task_handle {
        handle.abort();
    }
    info!(session = %session_id, "Editor connection closed.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_studio_core::{
        domain::{NoticeLevel, RegionId},
        editor::EditorPhase,
        generation::{templated_blocks, PresentationRequest, SlideCount, SummaryRequest},
        rewrite::RewriteOp,
        selection::Rect,
    };

    fn app_state() -> AppState {
        AppState::for_tests()
    }

    fn session(kind: DocumentKind) -> SessionState {
        SessionState::new(
            Identity {
                id: "owner-1".to_string(),
                name: None,
                email: None,
            },
            kind,
        )
    }

    fn texts(reply: &Reply) -> Vec<&ServerMessage> {
        reply
            .frames
            .iter()
            .filter_map(|f| match f {
                Outbound::Text(msg) => Some(msg),
                Outbound::Binary(_) => None,
            })
            .collect()
    }

    /// Drives a session through generation so it is ready for review.
    fn reviewing(app: &AppState, kind: DocumentKind, request: GenerationRequest) -> SessionState {
        let mut session = session(kind);
        let reply = handle_client_message(app, &mut session, ClientMessage::Generate { request });
        let (ticket, request) = reply.start_generation.unwrap();
        assert!(session.editor.complete_generation(ticket, templated_blocks(&request)));
        session.editor.take_notices();
        session
    }

    fn pasted_summary() -> GenerationRequest {
        GenerationRequest::Summary(SummaryRequest {
            text: Some("An important finding.".to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn invalid_generate_sends_only_a_notice() {
        let app = app_state();
        let mut session = session(DocumentKind::Presentation);
        let reply = handle_client_message(
            &app,
            &mut session,
            ClientMessage::Generate {
                request: GenerationRequest::Presentation(PresentationRequest::default()),
            },
        );
        assert!(reply.start_generation.is_none());
        let msgs = texts(&reply);
        assert_eq!(msgs.len(), 1);
        assert!(matches!(
            msgs[0],
            ServerMessage::Notice(n) if n.level == NoticeLevel::Error
        ));
        assert_eq!(session.editor.phase(), EditorPhase::Idle);
    }

    #[test]
    fn accepted_generate_reports_generating_phase() {
        let app = app_state();
        let mut session = session(DocumentKind::Presentation);
        let request = GenerationRequest::Presentation(PresentationRequest {
            file_name: Some("a.pdf".to_string()),
            title: "Deck".to_string(),
            slide_count: SlideCount::try_from(3).unwrap(),
            ..Default::default()
        });
        let reply = handle_client_message(&app, &mut session, ClientMessage::Generate { request });
        assert!(reply.start_generation.is_some());
        assert!(texts(&reply).contains(&&ServerMessage::PhaseChanged {
            phase: EditorPhase::Generating
        }));
    }

    #[test]
    fn select_then_rewrite_updates_region() {
        let app = app_state();
        let mut session = reviewing(&app, DocumentKind::Summary, pasted_summary());
        handle_client_message(
            &app,
            &mut session,
            ClientMessage::EditRegion {
                region: RegionId(0),
                text: "An important finding.".to_string(),
            },
        );

        let reply = handle_client_message(
            &app,
            &mut session,
            ClientMessage::Select {
                region: RegionId(0),
                text: "important".to_string(),
                bounds: Rect { left: 10.0, top: 30.0, width: 20.0, height: 12.0 },
            },
        );
        match texts(&reply)[0] {
            ServerMessage::Selection { context } => {
                assert_eq!((context.anchor.x, context.anchor.y), (20.0, 20.0))
            }
            other => panic!("unexpected {:?}", other),
        }

        let reply = handle_client_message(&app, &mut session, ClientMessage::Rewrite { op: RewriteOp::Synonym });
        let msgs = texts(&reply);
        assert_eq!(
            msgs[0],
            &ServerMessage::RegionUpdated {
                region: RegionId(0),
                text: "An crucial finding.".to_string()
            }
        );
        assert_eq!(msgs[1], &ServerMessage::SelectionCleared);
        assert!(matches!(msgs[2], ServerMessage::Notice(_)));
    }

    #[test]
    fn approve_commits_to_the_owner_store() {
        let app = app_state();
        let mut session = reviewing(&app, DocumentKind::Summary, pasted_summary());
        let reply = handle_client_message(&app, &mut session, ClientMessage::Approve);
        assert!(texts(&reply)
            .iter()
            .any(|m| matches!(m, ServerMessage::Approved { document: Some(_) })));
        let stored = app.stores.with_store("owner-1", |store| store.documents().len());
        assert_eq!(stored, 1);
    }

    fn approve_off_the_worker(app: &AppState) -> usize {
        let mut session = reviewing(app, DocumentKind::Summary, pasted_summary());
        run_blocking(|| handle_client_message(app, &mut session, ClientMessage::Approve));
        app.stores.with_store("owner-1", |store| store.documents().len())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn approve_runs_off_a_multi_thread_worker() {
        assert_eq!(approve_off_the_worker(&app_state()), 1);
    }

    #[tokio::test]
    async fn approve_runs_inline_on_a_current_thread_runtime() {
        assert_eq!(approve_off_the_worker(&app_state()), 1);
    }

    #[test]
    fn export_sends_header_then_bytes() {
        let app = app_state();
        let mut session = reviewing(&app, DocumentKind::Summary, pasted_summary());
        handle_client_message(&app, &mut session, ClientMessage::Approve);

        let reply = handle_client_message(
            &app,
            &mut session,
            ClientMessage::Export {
                format: "txt".to_string(),
            },
        );
        assert!(matches!(
            &reply.frames[0],
            Outbound::Text(ServerMessage::ExportReady { file_name, .. }) if file_name == "summary_summary.txt"
        ));
        assert!(matches!(&reply.frames[1], Outbound::Binary(bytes) if !bytes.is_empty()));
        assert_eq!(session.editor.phase(), EditorPhase::Exported);
    }

    #[test]
    fn unknown_export_format_is_rejected() {
        let app = app_state();
        let mut session = reviewing(&app, DocumentKind::Summary, pasted_summary());
        handle_client_message(&app, &mut session, ClientMessage::Approve);
        let reply = handle_client_message(
            &app,
            &mut session,
            ClientMessage::Export {
                format: "odp".to_string(),
            },
        );
        assert!(matches!(texts(&reply)[0], ServerMessage::Error { .. }));
        assert_eq!(session.editor.phase(), EditorPhase::Approved);
    }

    #[test]
    fn edits_after_approval_are_rejected() {
        let app = app_state();
        let mut session = reviewing(&app, DocumentKind::Summary, pasted_summary());
        handle_client_message(&app, &mut session, ClientMessage::Approve);
        let reply = handle_client_message(
            &app,
            &mut session,
            ClientMessage::EditRegion {
                region: RegionId(0),
                text: "late".to_string(),
            },
        );
        assert!(matches!(texts(&reply)[0], ServerMessage::Error { .. }));
    }
}
