//! crates/doc_studio_core/src/generation.rs
//!
//! Generation requests, their validation, and the deterministic templated
//! content used by the mock generator. The templates stand in for a real
//! model call; `GenerationService` implementations are free to ignore them.

use serde::{Deserialize, Serialize};

use crate::domain::{ContentBlock, DocumentKind, SlideBody};

//=========================================================================================
// Options
//=========================================================================================

macro_rules! option_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            #[default]
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }
    };
}

option_enum!(
    /// Bullet points or running prose. Shared by summaries and slide structure.
    ContentFormat { Bullet => "bullet", Paragraph => "paragraph" }
);
option_enum!(SummaryType {
    General => "general",
    Executive => "executive",
    Technical => "technical",
    Academic => "academic",
});
option_enum!(SummaryTone {
    Neutral => "neutral",
    Formal => "formal",
    Casual => "casual",
    Professional => "professional",
});
option_enum!(
    /// Selectable output language. The rewrite tables ignore it.
    SummaryLanguage { English => "english", French => "french" }
);
option_enum!(SlideTemplate {
    Professional => "professional",
    Modern => "modern",
    Minimal => "minimal",
    Creative => "creative",
    Academic => "academic",
});

/// Defaults to medium, so it is written out rather than generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
    Custom,
}

impl SummaryLength {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryLength::Short => "short",
            SummaryLength::Medium => "medium",
            SummaryLength::Long => "long",
            SummaryLength::Custom => "custom",
        }
    }
}

/// Slide counts offered to the user.
pub const SLIDE_COUNTS: [u8; 4] = [3, 5, 7, 10];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SlideCount(u8);

impl SlideCount {
    pub fn get(&self) -> usize {
        self.0 as usize
    }
}

impl Default for SlideCount {
    fn default() -> Self {
        SlideCount(5)
    }
}

impl TryFrom<u8> for SlideCount {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if SLIDE_COUNTS.contains(&value) {
            Ok(SlideCount(value))
        } else {
            Err(format!(
                "slide count must be one of {:?}, got {}",
                SLIDE_COUNTS, value
            ))
        }
    }
}

impl From<SlideCount> for u8 {
    fn from(count: SlideCount) -> Self {
        count.0
    }
}

//=========================================================================================
// Requests
//=========================================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryOptions {
    pub format: ContentFormat,
    pub summary_type: SummaryType,
    pub tone: SummaryTone,
    pub language: SummaryLanguage,
    pub length: SummaryLength,
    /// Only read when `length` is `custom`.
    pub custom_word_count: Option<u32>,
}

impl SummaryOptions {
    fn length_label(&self) -> String {
        match (self.length, self.custom_word_count) {
            (SummaryLength::Custom, Some(words)) => format!("{} words", words),
            (SummaryLength::Custom, None) => "custom".to_string(),
            (other, _) => other.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRequest {
    /// Name of the uploaded file, if any.
    #[serde(default)]
    pub file_name: Option<String>,
    /// Pasted text, if any.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub options: SummaryOptions,
}

impl SummaryRequest {
    fn pasted_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }

    fn file(&self) -> Option<&str> {
        self.file_name.as_deref().filter(|f| !f.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationRequest {
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slide_count: SlideCount,
    #[serde(default)]
    pub template: SlideTemplate,
    #[serde(default)]
    pub structure: ContentFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationRequest {
    Summary(SummaryRequest),
    Presentation(PresentationRequest),
}

/// A missing input detected before generation starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please upload a file or enter text")]
    MissingSource,
    #[error("Please upload a file")]
    MissingFile,
    #[error("Please enter a presentation title")]
    MissingTitle,
}

impl GenerationRequest {
    pub fn kind(&self) -> DocumentKind {
        match self {
            GenerationRequest::Summary(_) => DocumentKind::Summary,
            GenerationRequest::Presentation(_) => DocumentKind::Presentation,
        }
    }

    /// Reports only the first missing precondition.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            GenerationRequest::Summary(req) => {
                if req.file().is_none() && req.pasted_text().is_none() {
                    return Err(ValidationError::MissingSource);
                }
            }
            GenerationRequest::Presentation(req) => {
                if req.file_name.as_deref().map_or(true, |f| f.trim().is_empty()) {
                    return Err(ValidationError::MissingFile);
                }
                if req.title.trim().is_empty() {
                    return Err(ValidationError::MissingTitle);
                }
            }
        }
        Ok(())
    }

    /// Name the approved document is stored under.
    pub fn document_name(&self) -> String {
        match self {
            GenerationRequest::Summary(req) => {
                req.file().unwrap_or("Text Summary").to_string()
            }
            GenerationRequest::Presentation(req) => req.title.clone(),
        }
    }

    /// Title used for downloads: the file name, or `summary` for pasted text.
    pub fn export_title(&self) -> String {
        match self {
            GenerationRequest::Summary(req) => req.file().unwrap_or("summary").to_string(),
            GenerationRequest::Presentation(req) => req.title.clone(),
        }
    }

    /// Describes where the content came from: pasted text wins over a file name.
    pub fn source_descriptor(&self) -> String {
        match self {
            GenerationRequest::Summary(req) => req
                .pasted_text()
                .or(req.file())
                .unwrap_or_default()
                .to_string(),
            GenerationRequest::Presentation(req) => req.file_name.clone().unwrap_or_default(),
        }
    }

    /// Number of content blocks a generator must return.
    pub fn expected_blocks(&self) -> usize {
        match self {
            GenerationRequest::Summary(_) => 1,
            GenerationRequest::Presentation(req) => req.slide_count.get(),
        }
    }
}

//=========================================================================================
// Templated content
//=========================================================================================

/// Deterministic placeholder content for a validated request.
pub fn templated_blocks(request: &GenerationRequest) -> Vec<ContentBlock> {
    match request {
        GenerationRequest::Summary(req) => vec![ContentBlock {
            number: 1,
            title: request.document_name(),
            body: SlideBody::Text(templated_summary(req)),
        }],
        GenerationRequest::Presentation(req) => (0..req.slide_count.get())
            .map(|i| ContentBlock {
                number: i + 1,
                title: if i == 0 {
                    req.title.clone()
                } else {
                    format!("Slide {}: Key Point {}", i + 1, i)
                },
                body: templated_slide_body(req, i),
            })
            .collect(),
    }
}

fn templated_summary(req: &SummaryRequest) -> String {
    let opts = &req.options;
    let format_text = match opts.format {
        ContentFormat::Bullet => "bullet points",
        ContentFormat::Paragraph => "paragraph",
    };
    let length_text = opts.length_label();
    let mut summary = format!(
        "Summary of \"{}\" ({}, {} style, {} tone, {}, {} length):\n\n",
        req.file().unwrap_or("your text"),
        format_text,
        opts.summary_type.as_str(),
        opts.tone.as_str(),
        opts.language.as_str(),
        length_text,
    );

    match opts.format {
        ContentFormat::Bullet => summary.push_str(&format!(
            "• Main topic identified and analyzed based on {} approach\n\
             • Content processed with {} tone in {}\n\
             • Supporting arguments and evidence summarized\n\
             • Key conclusions and recommendations highlighted\n\
             • Action items extracted (if applicable)\n\n\
             The summary condenses the original content while preserving essential information and context.",
            opts.summary_type.as_str(),
            opts.tone.as_str(),
            opts.language.as_str(),
        )),
        ContentFormat::Paragraph => summary.push_str(&format!(
            "This {} summary has been generated with a {} tone in {}. \
             The AI has analyzed the content and extracted the main topics, supporting arguments, and key conclusions. \
             All essential information has been preserved while condensing the original content to approximately {} in length. \
             The summary maintains context and provides a comprehensive overview of the document's core message and important details.",
            opts.summary_type.as_str(),
            opts.tone.as_str(),
            opts.language.as_str(),
            length_text,
        )),
    }
    summary
}

fn templated_slide_body(req: &PresentationRequest, index: usize) -> SlideBody {
    match req.structure {
        ContentFormat::Bullet => SlideBody::Lines(vec![
            format!("Main point {} from the document", index + 1),
            "Supporting detail A".to_string(),
            "Supporting detail B".to_string(),
            "Conclusion or takeaway".to_string(),
        ]),
        ContentFormat::Paragraph => SlideBody::Text(format!(
            "This slide presents key information extracted from the document. \
             The content has been organized using the {} structure and formatted according to the {} template. \
             The AI has analyzed the source material and created a cohesive presentation flow that effectively communicates the main ideas.",
            req.structure.as_str(),
            req.template.as_str(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deck(count: u8) -> GenerationRequest {
        GenerationRequest::Presentation(PresentationRequest {
            file_name: Some("report.pdf".to_string()),
            title: "Quarterly Review".to_string(),
            slide_count: SlideCount::try_from(count).unwrap(),
            ..Default::default()
        })
    }

    #[test]
    fn three_slides_are_numbered_in_order() {
        let blocks = templated_blocks(&deck(3));
        assert_eq!(blocks.len(), 3);
        let numbers: Vec<_> = blocks.iter().map(|b| b.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(blocks[0].title, "Quarterly Review");
        assert_eq!(blocks[2].title, "Slide 3: Key Point 2");
    }

    #[test]
    fn bullet_slides_are_line_lists() {
        let blocks = templated_blocks(&deck(5));
        assert_eq!(
            blocks[1].body.to_text(),
            "Main point 2 from the document\nSupporting detail A\nSupporting detail B\nConclusion or takeaway"
        );
    }

    #[test]
    fn slide_count_outside_the_menu_is_rejected() {
        assert!(SlideCount::try_from(4).is_err());
        assert!(serde_json::from_str::<SlideCount>("4").is_err());
        assert_eq!(serde_json::from_str::<SlideCount>("7").unwrap().get(), 7);
    }

    #[test]
    fn summary_needs_file_or_text() {
        let empty = GenerationRequest::Summary(SummaryRequest {
            text: Some("   ".to_string()),
            ..Default::default()
        });
        assert_eq!(empty.validate(), Err(ValidationError::MissingSource));

        let pasted = GenerationRequest::Summary(SummaryRequest {
            text: Some("Some text".to_string()),
            ..Default::default()
        });
        assert_eq!(pasted.validate(), Ok(()));
        assert_eq!(pasted.document_name(), "Text Summary");
        assert_eq!(pasted.source_descriptor(), "Some text");
    }

    #[test]
    fn presentation_reports_missing_file_before_title() {
        let nothing = GenerationRequest::Presentation(PresentationRequest::default());
        assert_eq!(nothing.validate(), Err(ValidationError::MissingFile));

        let untitled = GenerationRequest::Presentation(PresentationRequest {
            file_name: Some("a.pdf".to_string()),
            ..Default::default()
        });
        assert_eq!(untitled.validate(), Err(ValidationError::MissingTitle));
    }

    #[test]
    fn summary_template_mentions_chosen_options() {
        let request = GenerationRequest::Summary(SummaryRequest {
            file_name: Some("paper.pdf".to_string()),
            text: None,
            options: SummaryOptions {
                format: ContentFormat::Paragraph,
                length: SummaryLength::Custom,
                custom_word_count: Some(150),
                ..Default::default()
            },
        });
        let blocks = templated_blocks(&request);
        assert_eq!(blocks.len(), 1);
        let text = blocks[0].body.to_text();
        assert!(text.starts_with(
            "Summary of \"paper.pdf\" (paragraph, general style, neutral tone, english, 150 words length):"
        ));
        assert!(text.contains("approximately 150 words in length"));
    }

    #[test]
    fn request_json_is_tagged_by_kind() {
        let request: GenerationRequest = serde_json::from_str(
            r#"{"kind":"presentation","file_name":"a.pdf","title":"T","slide_count":3,"template":"modern","structure":"paragraph"}"#,
        )
        .unwrap();
        assert_eq!(request.kind(), DocumentKind::Presentation);
        assert_eq!(request.expected_blocks(), 3);
    }
}
