//! services/api/src/adapters/openai_llm.rs
//!
//! This module contains the adapter for the content-generating LLM.
//! It implements the `GenerationService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use doc_studio_core::{
    domain::{ContentBlock, SlideBody},
    generation::{
        templated_blocks, ContentFormat, GenerationRequest, PresentationRequest, SummaryLength,
        SummaryRequest,
    },
    ports::{GenerationService, PortError, PortResult},
};
use tracing::warn;

/// Line separating slides in the model's answer.
const SLIDE_SEPARATOR: &str = "---";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `GenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiGenerationAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiGenerationAdapter {
    /// Creates a new `OpenAiGenerationAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    async fn complete(&self, system: String, user: String) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected("Generation LLM response contained no text content.".to_string())
            })
    }
}

//=========================================================================================
// Prompts
//=========================================================================================

fn source_material(file_name: Option<&str>, text: Option<&str>) -> String {
    match (text.filter(|t| !t.trim().is_empty()), file_name) {
        (Some(text), _) => format!("SOURCE TEXT:\n{}", text),
        (None, Some(name)) => format!("SOURCE FILE: {}", name),
        (None, None) => "SOURCE: (none provided)".to_string(),
    }
}

fn summary_prompt(req: &SummaryRequest) -> (String, String) {
    let opts = &req.options;
    let length = match opts.custom_word_count {
        Some(words) if opts.length == SummaryLength::Custom => format!("about {} words", words),
        _ => opts.length.as_str().to_string(),
    };
    let system = format!(
        "You are a summarization assistant. Write a {} summary of the source using {}. \
         Use a {} tone, write in {}, and keep it {} in length. Respond with the summary only.",
        opts.summary_type.as_str(),
        match opts.format {
            ContentFormat::Bullet => "bullet points, one per line starting with '• '",
            ContentFormat::Paragraph => "flowing paragraphs",
        },
        opts.tone.as_str(),
        opts.language.as_str(),
        length,
    );
    (system, source_material(req.file_name.as_deref(), req.text.as_deref()))
}

fn presentation_prompt(req: &PresentationRequest) -> (String, String) {
    let system = format!(
        "You are a presentation assistant. Produce exactly {count} slides for a deck titled \"{title}\" \
         in a {template} style. Separate slides with a line containing only {sep}. \
         For each slide, write the slide title on the first line and the body below it, {body}. \
         Respond with the slides only.",
        count = req.slide_count.get(),
        title = req.title,
        template = req.template.as_str(),
        sep = SLIDE_SEPARATOR,
        body = match req.structure {
            ContentFormat::Bullet => "as short bullet lines",
            ContentFormat::Paragraph => "as one paragraph",
        },
    );
    (system, source_material(req.file_name.as_deref(), None))
}

/// Splits a model answer into exactly `slide_count` slides.
///
/// Missing slides are filled from the templated placeholders; extra ones are dropped.
pub fn parse_slides(answer: &str, req: &PresentationRequest) -> Vec<ContentBlock> {
    let mut slides: Vec<ContentBlock> = answer
        .lines()
        .collect::<Vec<_>>()
        .split(|line| line.trim() == SLIDE_SEPARATOR)
        .filter_map(|chunk| {
            let mut lines = chunk.iter().map(|l| l.trim()).filter(|l| !l.is_empty());
            let title = lines.next()?.trim_start_matches('#').trim().to_string();
            let body: Vec<String> = lines.map(str::to_string).collect();
            Some((title, body))
        })
        .enumerate()
        .map(|(i, (title, body))| ContentBlock {
            number: i + 1,
            title,
            body: match req.structure {
                ContentFormat::Bullet => SlideBody::Lines(body),
                ContentFormat::Paragraph => SlideBody::Text(body.join(" ")),
            },
        })
        .collect();

    let request = GenerationRequest::Presentation(req.clone());
    let wanted = request.expected_blocks();
    if slides.len() != wanted {
        warn!(got = slides.len(), wanted, "LLM returned the wrong number of slides.");
    }
    slides.truncate(wanted);
    let placeholders = templated_blocks(&request);
    slides.extend(placeholders.into_iter().skip(slides.len()));
    slides
}

//=========================================================================================
// `GenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl GenerationService for OpenAiGenerationAdapter {
    async fn generate(&self, request: &GenerationRequest) -> PortResult<Vec<ContentBlock>> {
        match request {
            GenerationRequest::Summary(req) => {
                let (system, user) = summary_prompt(req);
                let text = self.complete(system, user).await?;
                Ok(vec![ContentBlock {
                    number: 1,
                    title: request.document_name(),
                    body: SlideBody::Text(text.trim().to_string()),
                }])
            }
            GenerationRequest::Presentation(req) => {
                let (system, user) = presentation_prompt(req);
                let answer = self.complete(system, user).await?;
                Ok(parse_slides(&answer, req))
            }
        }
    }
}
