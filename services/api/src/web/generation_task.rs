//! services/api/src/web/generation_task.rs
//!
//! This module contains the asynchronous "worker" function that runs one
//! content generation for an editor session.

use crate::{
    error::ApiError,
    web::{
        protocol::ServerMessage,
        state::{AppState, SessionState, WsSender},
        ws_handler::{drain_notices, send_frames, Outbound},
    },
};
use doc_studio_core::{
    domain::ContentBlock, editor::GenerationTicket, generation::GenerationRequest,
    ports::PortResult,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Runs the generator for `request` and hands the result to the session.
///
/// Cancelling `cancellation_token` abandons the call; the session then keeps
/// waiting for a newer ticket, or is being torn down.
pub async fn generation_process(
    app_state: Arc<AppState>,
    session_state_lock: Arc<Mutex<SessionState>>,
    ws_sender: WsSender,
    ticket: GenerationTicket,
    request: GenerationRequest,
    cancellation_token: CancellationToken,
) -> Result<(), ApiError> {
    info!(kind = %request.kind(), "Generation process started.");

    let outcome = tokio::select! {
        _ = cancellation_token.cancelled() => {
            info!("Generation process cancelled.");
            return Ok(());
        }
        outcome = app_state.generator.generate(&request) => outcome,
    };

    let frames = {
        let mut session = session_state_lock.lock().await;
        finish_generation(&mut session, ticket, outcome)
    };
    send_frames(&ws_sender, frames).await
}

/// Applies a finished generation to the session and returns what to tell the client.
///
/// A result for a superseded ticket produces no frames.
pub(crate) fn finish_generation(
    session: &mut SessionState,
    ticket: GenerationTicket,
    outcome: PortResult<Vec<ContentBlock>>,
) -> Vec<Outbound> {
    let mut frames = Vec::new();
    match outcome {
        Ok(blocks) => {
            if !session.editor.complete_generation(ticket, blocks) {
                return frames;
            }
            let blocks = session.editor.blocks().into_iter().cloned().collect();
            frames.push(Outbound::Text(ServerMessage::Blocks { blocks }));
        }
        Err(e) => {
            warn!("Generation failed: {}", e);
            if !session.editor.fail_generation(ticket, &e.to_string()) {
                return frames;
            }
        }
    }
    frames.push(Outbound::Text(ServerMessage::PhaseChanged {
        phase: session.editor.phase(),
    }));
    drain_notices(session, &mut frames);
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_studio_core::{
        domain::{DocumentKind, Identity, NoticeLevel},
        editor::EditorPhase,
        generation::{templated_blocks, PresentationRequest, SlideCount},
        ports::PortError,
    };

    fn deck() -> GenerationRequest {
        GenerationRequest::Presentation(PresentationRequest {
            file_name: Some("report.pdf".to_string()),
            title: "Review".to_string(),
            slide_count: SlideCount::try_from(5).unwrap(),
            ..Default::default()
        })
    }

    fn session() -> SessionState {
        SessionState::new(
            Identity {
                id: "owner-1".to_string(),
                name: None,
                email: None,
            },
            DocumentKind::Presentation,
        )
    }

    #[test]
    fn completed_generation_sends_blocks_phase_and_notice() {
        let mut session = session();
        let request = deck();
        let ticket = session.editor.begin_generation(&request).unwrap();

        let frames = finish_generation(&mut session, ticket, Ok(templated_blocks(&request)));
        assert_eq!(frames.len(), 3);
        assert!(matches!(
            &frames[0],
            Outbound::Text(ServerMessage::Blocks { blocks }) if blocks.len() == 5
        ));
        assert_eq!(
            frames[1],
            Outbound::Text(ServerMessage::PhaseChanged {
                phase: EditorPhase::Reviewing
            })
        );
        assert!(matches!(
            &frames[2],
            Outbound::Text(ServerMessage::Notice(n)) if n.level == NoticeLevel::Success
        ));
    }

    #[test]
    fn failed_generation_returns_to_idle_with_error_notice() {
        let mut session = session();
        let ticket = session.editor.begin_generation(&deck()).unwrap();

        let frames = finish_generation(
            &mut session,
            ticket,
            Err(PortError::Unexpected("quota exceeded".to_string())),
        );
        assert_eq!(
            frames[0],
            Outbound::Text(ServerMessage::PhaseChanged {
                phase: EditorPhase::Idle
            })
        );
        assert!(matches!(
            &frames[1],
            Outbound::Text(ServerMessage::Notice(n)) if n.message.contains("quota exceeded")
        ));
    }

    #[test]
    fn superseded_result_sends_nothing() {
        let mut session = session();
        let request = deck();
        let stale = session.editor.begin_generation(&request).unwrap();
        session.editor.fail_generation(stale, "cancelled");
        session.editor.take_notices();
        session.editor.begin_generation(&request).unwrap();

        let frames = finish_generation(&mut session, stale, Ok(templated_blocks(&request)));
        assert!(frames.is_empty());
        assert_eq!(session.editor.phase(), EditorPhase::Generating);
    }
}
