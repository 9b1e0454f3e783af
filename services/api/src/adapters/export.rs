//! services/api/src/adapters/export.rs
//!
//! Export adapters implementing the `ExportAdapter` port: a plain-text encoder
//! and a minimal WordprocessingML (DOCX) encoder built on `zip`. The PPTX
//! encoder lives in `pptx.rs`.

use doc_studio_core::{
    domain::{ContentBlock, ExportArtifact, ExportPayload},
    ports::{ExportAdapter, PortError, PortResult},
};
use std::io::{Cursor, Write};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use super::pptx::PptxExporter;

const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Builds the download name: `<title>_summary.<ext>` or `<title>.<ext>`.
///
/// Path separators and other characters file systems reject become `_`;
/// control characters become spaces so the name stays valid in a
/// `Content-Disposition` header.
pub(super) fn file_name(payload: &ExportPayload, extension: &str) -> String {
    let stem: String = payload
        .title()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect();
    let stem = stem.trim();
    let stem = if stem.is_empty() { "document" } else { stem };
    match payload {
        ExportPayload::Summary { .. } => format!("{}_summary.{}", stem, extension),
        ExportPayload::Presentation { .. } => format!("{}.{}", stem, extension),
    }
}

pub(super) fn slide_heading(slide: &ContentBlock) -> String {
    format!("Slide {}: {}", slide.number, slide.title)
}

//=========================================================================================
// Plain text
//=========================================================================================

#[derive(Clone, Copy, Debug, Default)]
pub struct TextExporter;

impl ExportAdapter for TextExporter {
    fn format(&self) -> &'static str {
        "txt"
    }

    fn export(&self, payload: &ExportPayload) -> PortResult<ExportArtifact> {
        let text = match payload {
            ExportPayload::Summary { text, .. } => text.clone(),
            ExportPayload::Presentation { title, slides, .. } => {
                let mut out = format!("{}\n", title);
                for slide in slides {
                    out.push('\n');
                    out.push_str(&slide_heading(slide));
                    out.push('\n');
                    out.push_str(&slide.body.to_text());
                    out.push('\n');
                }
                out
            }
        };
        Ok(ExportArtifact {
            file_name: file_name(payload, "txt"),
            media_type: "text/plain; charset=utf-8".to_string(),
            bytes: text.into_bytes(),
        })
    }
}

//=========================================================================================
// DOCX
//=========================================================================================

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

pub(super) fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// One `<w:p>`; `size` is in half-points.
fn paragraph(text: &str, bold: bool, size: u32) -> String {
    let bold = if bold { "<w:b/>" } else { "" };
    format!(
        r#"<w:p><w:r><w:rPr>{}<w:sz w:val="{}"/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        bold,
        size,
        escape_xml(text)
    )
}

fn text_paragraphs(text: &str, size: u32) -> String {
    text.lines().map(|line| paragraph(line, false, size)).collect()
}

fn document_xml(payload: &ExportPayload) -> String {
    let mut body = paragraph(payload.title(), true, 48);
    match payload {
        ExportPayload::Summary { text, .. } => body.push_str(&text_paragraphs(text, 24)),
        ExportPayload::Presentation { template, slides, .. } => {
            body.push_str(&paragraph(&format!("Template: {}", template), false, 20));
            for slide in slides {
                body.push_str(&paragraph(&slide_heading(slide), true, 32));
                body.push_str(&text_paragraphs(&slide.body.to_text(), 24));
            }
        }
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    )
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DocxExporter;

impl DocxExporter {
    fn package(&self, payload: &ExportPayload) -> Result<Vec<u8>, zip::result::ZipError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let parts = [
            ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
            ("_rels/.rels", ROOT_RELS_XML.to_string()),
            ("word/document.xml", document_xml(payload)),
        ];
        for (path, contents) in parts {
            zip.start_file(path, options)?;
            zip.write_all(contents.as_bytes())?;
        }

        Ok(zip.finish()?.into_inner())
    }
}

impl ExportAdapter for DocxExporter {
    fn format(&self) -> &'static str {
        "docx"
    }

    fn export(&self, payload: &ExportPayload) -> PortResult<ExportArtifact> {
        let bytes = self
            .package(payload)
            .map_err(|e| PortError::Unexpected(format!("Failed to build DOCX: {}", e)))?;
        Ok(ExportArtifact {
            file_name: file_name(payload, "docx"),
            media_type: DOCX_MEDIA_TYPE.to_string(),
            bytes,
        })
    }
}

/// Looks up an exporter by its format identifier.
pub fn exporter_for(format: &str) -> Option<Box<dyn ExportAdapter>> {
    match format {
        "txt" => Some(Box::new(TextExporter)),
        "docx" => Some(Box::new(DocxExporter)),
        "pptx" => Some(Box::new(PptxExporter)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_studio_core::domain::SlideBody;
    use std::io::Read;

    fn deck() -> ExportPayload {
        ExportPayload::Presentation {
            title: "Q3 <Review>".to_string(),
            template: "modern".to_string(),
            slides: vec![
                ContentBlock {
                    number: 1,
                    title: "Intro".to_string(),
                    body: SlideBody::Text("Hello & welcome".to_string()),
                },
                ContentBlock {
                    number: 2,
                    title: "Numbers".to_string(),
                    body: SlideBody::Lines(vec!["up".to_string(), "down".to_string()]),
                },
            ],
        }
    }

    #[test]
    fn summary_text_export_is_the_text() {
        let payload = ExportPayload::Summary {
            title: "notes.txt".to_string(),
            text: "line one\nline two".to_string(),
        };
        let artifact = TextExporter.export(&payload).unwrap();
        assert_eq!(artifact.file_name, "notes.txt_summary.txt");
        assert_eq!(artifact.bytes, b"line one\nline two");
    }

    #[test]
    fn presentation_text_export_lists_slides() {
        let artifact = TextExporter.export(&deck()).unwrap();
        let text = String::from_utf8(artifact.bytes).unwrap();
        assert!(text.starts_with("Q3 <Review>\n"));
        assert!(text.contains("Slide 2: Numbers\nup\ndown\n"));
        assert_eq!(artifact.file_name, "Q3 _Review_.txt");
    }

    #[test]
    fn docx_package_contains_escaped_document() {
        let artifact = DocxExporter.export(&deck()).unwrap();
        assert_eq!(artifact.media_type, DOCX_MEDIA_TYPE);

        let mut archive = zip::ZipArchive::new(Cursor::new(artifact.bytes)).unwrap();
        assert!(archive.by_name("[Content_Types].xml").is_ok());
        assert!(archive.by_name("_rels/.rels").is_ok());
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();
        assert!(xml.contains("Q3 &lt;Review&gt;"));
        assert!(xml.contains("Hello &amp; welcome"));
        assert!(xml.contains("Slide 2: Numbers"));
    }

    #[test]
    fn control_characters_are_dropped_from_file_names() {
        let payload = ExportPayload::Presentation {
            title: "Q3\nReview\t".to_string(),
            template: "modern".to_string(),
            slides: Vec::new(),
        };
        assert_eq!(file_name(&payload, "txt"), "Q3 Review.txt");

        let blank = ExportPayload::Summary {
            title: "\r\n".to_string(),
            text: String::new(),
        };
        assert_eq!(file_name(&blank, "docx"), "document_summary.docx");
    }

    #[test]
    fn exporters_are_looked_up_by_format() {
        assert!(exporter_for("odp").is_none());
        assert_eq!(exporter_for("docx").unwrap().format(), "docx");
        assert_eq!(exporter_for("pptx").unwrap().format(), "pptx");
    }
}
