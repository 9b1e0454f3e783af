//! crates/doc_studio_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs carry serde derives so the store can persist them as JSON,
//! but they are otherwise independent of any storage or transport.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

//=========================================================================================
// Documents
//=========================================================================================

/// The two kinds of artifact the studio produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Summary,
    Presentation,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Summary => "summary",
            DocumentKind::Presentation => "presentation",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a stored document: `<unix-millis>-<seq>`.
///
/// `seq` is drawn from a process-wide counter, so two ids minted by the same
/// process never collide even within one millisecond.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

static NEXT_DOCUMENT_SEQ: AtomicU64 = AtomicU64::new(0);

impl DocumentId {
    pub fn generate(at: DateTime<Utc>) -> Self {
        let seq = NEXT_DOCUMENT_SEQ.fetch_add(1, Ordering::Relaxed);
        DocumentId(format!("{}-{}", at.timestamp_millis(), seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A generated artifact committed to an owner's store.
///
/// Field names on the wire follow the layout the browser client already keeps
/// in local storage (`type`, `content`, `result`, `createdAt`, `userId`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DocumentKind,
    /// Where the content came from: a file name or the pasted text.
    #[serde(rename = "content")]
    pub source: String,
    /// The approved payload. Plain text for summaries, JSON for presentations.
    pub result: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "userId")]
    pub owner_id: String,
}

/// The caller-supplied part of a document; the store fills in the rest.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub name: String,
    pub kind: DocumentKind,
    pub source: String,
    pub result: String,
}

//=========================================================================================
// Content blocks (summary text, slides)
//=========================================================================================

/// The body of a content block: free text, or an ordered list of lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlideBody {
    Text(String),
    Lines(Vec<String>),
}

impl SlideBody {
    /// The text shown in the editable region for this body.
    pub fn to_text(&self) -> String {
        match self {
            SlideBody::Text(text) => text.clone(),
            SlideBody::Lines(lines) => lines.join("\n"),
        }
    }
}

/// One generated unit of content. A summary has exactly one; a presentation
/// has one per slide. `number` is 1-based and stable for the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub number: usize,
    pub title: String,
    #[serde(rename = "content")]
    pub body: SlideBody,
}

/// Identifies an editable region within a session (0-based block position).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub usize);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region {}", self.0)
    }
}

//=========================================================================================
// Identity
//=========================================================================================

/// The authenticated user as handed over by the identity provider.
/// The core only ever uses `id`, as an opaque scoping key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

//=========================================================================================
// Notices
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A short user-facing message (what the browser renders as a toast).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

//=========================================================================================
// Export
//=========================================================================================

/// The reconciled content handed to an export adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportPayload {
    Summary {
        title: String,
        text: String,
    },
    Presentation {
        title: String,
        template: String,
        slides: Vec<ContentBlock>,
    },
}

impl ExportPayload {
    pub fn title(&self) -> &str {
        match self {
            ExportPayload::Summary { title, .. } | ExportPayload::Presentation { title, .. } => {
                title
            }
        }
    }
}

/// A downloadable file produced by an export adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_ids_are_unique_within_a_millisecond() {
        let now = Utc::now();
        let a = DocumentId::generate(now);
        let b = DocumentId::generate(now);
        assert_ne!(a, b);
        assert!(a.as_str().starts_with(&now.timestamp_millis().to_string()));
    }

    #[test]
    fn document_serializes_with_browser_field_names() {
        let doc = Document {
            id: DocumentId("1-0".to_string()),
            name: "notes.txt".to_string(),
            kind: DocumentKind::Summary,
            source: "notes.txt".to_string(),
            result: "short".to_string(),
            created_at: Utc::now(),
            owner_id: "u1".to_string(),
        };
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["type"], "summary");
        assert_eq!(value["content"], "notes.txt");
        assert_eq!(value["userId"], "u1");
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn slide_body_accepts_string_or_list() {
        let text: SlideBody = serde_json::from_str("\"one\\ntwo\"").unwrap();
        let lines: SlideBody = serde_json::from_str("[\"one\",\"two\"]").unwrap();
        assert_eq!(text.to_text(), lines.to_text());
    }
}
