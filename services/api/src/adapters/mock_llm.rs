//! services/api/src/adapters/mock_llm.rs
//!
//! A stand-in generation adapter: waits a fixed delay, then returns the
//! deterministic templated content from the core crate.

use async_trait::async_trait;
use doc_studio_core::{
    domain::{ContentBlock, DocumentKind},
    generation::{templated_blocks, GenerationRequest},
    ports::{GenerationService, PortResult},
};
use std::time::Duration;
use tracing::debug;

/// Extra wait applied to presentations on top of the base delay.
const PRESENTATION_EXTRA_DELAY: Duration = Duration::from_millis(500);

#[derive(Clone, Debug)]
pub struct MockGenerationAdapter {
    delay: Duration,
}

impl MockGenerationAdapter {
    /// Creates a new `MockGenerationAdapter` that answers after `delay`.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    fn delay_for(&self, kind: DocumentKind) -> Duration {
        match kind {
            DocumentKind::Summary => self.delay,
            DocumentKind::Presentation => self.delay + PRESENTATION_EXTRA_DELAY,
        }
    }
}

#[async_trait]
impl GenerationService for MockGenerationAdapter {
    async fn generate(&self, request: &GenerationRequest) -> PortResult<Vec<ContentBlock>> {
        let delay = self.delay_for(request.kind());
        debug!(?delay, kind = %request.kind(), "Simulating generation.");
        tokio::time::sleep(delay).await;
        Ok(templated_blocks(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_studio_core::generation::{PresentationRequest, SlideCount};

    #[tokio::test]
    async fn returns_templated_blocks_after_the_delay() {
        let adapter = MockGenerationAdapter::new(Duration::from_millis(20));
        let request = GenerationRequest::Presentation(PresentationRequest {
            file_name: Some("a.pdf".to_string()),
            title: "Deck".to_string(),
            slide_count: SlideCount::try_from(7).unwrap(),
            ..Default::default()
        });

        let started = std::time::Instant::now();
        let blocks = adapter.generate(&request).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(520));
        assert_eq!(blocks, templated_blocks(&request));
        assert_eq!(blocks.len(), 7);
    }
}
