//! services/api/src/adapters/pptx.rs
//!
//! A minimal PresentationML (PPTX) encoder: one title slide, then one slide
//! per content block, each laid out with plain text boxes on a single blank
//! layout.

use doc_studio_core::{
    domain::{ContentBlock, ExportArtifact, ExportPayload, SlideBody},
    ports::{ExportAdapter, PortError, PortResult},
};
use std::io::{Cursor, Write};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use super::export::{escape_xml, file_name};

const PPTX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

const NS_DRAWING: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_OFFICE_RELS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PRESENTATION: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_PACKAGE_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

const REL_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
const REL_SLIDE_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
const REL_THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";

/// EMUs per inch.
const INCH: u64 = 914_400;
/// 16:9, 10 x 5.625 inches.
const SLIDE_WIDTH: u64 = 10 * INCH;
const SLIDE_HEIGHT: u64 = 5_143_500;

/// One rendered slide: a heading and optional body lines.
struct SlideText {
    heading: String,
    heading_size: u32,
    body: Vec<String>,
}

fn slides_for(payload: &ExportPayload) -> Vec<SlideText> {
    let title_slide = |subtitle: Vec<String>| SlideText {
        heading: payload.title().to_string(),
        heading_size: 48,
        body: subtitle,
    };
    match payload {
        ExportPayload::Summary { text, .. } => vec![
            title_slide(Vec::new()),
            SlideText {
                heading: "Summary".to_string(),
                heading_size: 36,
                body: text.lines().map(str::to_string).collect(),
            },
        ],
        ExportPayload::Presentation { template, slides, .. } => {
            let mut out = vec![title_slide(vec![format!("Template: {}", template)])];
            out.extend(slides.iter().map(content_slide));
            out
        }
    }
}

fn content_slide(block: &ContentBlock) -> SlideText {
    let body = match &block.body {
        SlideBody::Lines(lines) => lines.clone(),
        SlideBody::Text(text) => text.lines().map(str::to_string).collect(),
    };
    SlideText {
        heading: block.title.clone(),
        heading_size: 36,
        body,
    }
}

//=========================================================================================
// Part builders
//=========================================================================================

/// `size` is in hundredths of a point.
fn text_paragraph(text: &str, size: u32, bold: bool) -> String {
    if text.is_empty() {
        return r#"<a:p><a:endParaRPr lang="en-US"/></a:p>"#.to_string();
    }
    format!(
        r#"<a:p><a:r><a:rPr lang="en-US" sz="{}" b="{}" dirty="0"/><a:t>{}</a:t></a:r></a:p>"#,
        size,
        u8::from(bold),
        escape_xml(text)
    )
}

fn text_box(id: u32, name: &str, y: u64, height: u64, paragraphs: String) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr><p:txBody><a:bodyPr wrap="square"><a:normAutofit/></a:bodyPr><a:lstStyle/>{paragraphs}</p:txBody></p:sp>"#,
        id = id,
        name = name,
        x = INCH / 2,
        y = y,
        cx = 9 * INCH,
        cy = height,
        paragraphs = paragraphs,
    )
}

fn slide_xml(slide: &SlideText) -> String {
    let mut shapes = text_box(
        2,
        "Title",
        INCH / 2,
        INCH,
        text_paragraph(&slide.heading, slide.heading_size * 100, true),
    );
    if !slide.body.is_empty() {
        let body: String = slide
            .body
            .iter()
            .map(|line| text_paragraph(line, 2400, false))
            .collect();
        shapes.push_str(&text_box(3, "Body", INCH * 3 / 2, SLIDE_HEIGHT - 2 * INCH, body));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
        NS_DRAWING, NS_OFFICE_RELS, NS_PRESENTATION, shapes
    )
}

fn relationships(entries: &[(String, &str, String)]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{}">"#,
        NS_PACKAGE_RELS
    );
    for (id, kind, target) in entries {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            id, kind, target
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn content_types_xml(slide_count: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>"#,
    );
    for i in 1..=slide_count {
        xml.push_str(&format!(
            r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
            i
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn presentation_xml(slide_count: usize) -> String {
    // rId1 is the master, rId2 the theme; slides follow from rId3.
    let slide_ids: String = (1..=slide_count)
        .map(|i| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 255 + i, i + 2))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{}</p:sldIdLst><p:sldSz cx="{}" cy="{}"/><p:notesSz cx="{}" cy="{}"/></p:presentation>"#,
        NS_DRAWING, NS_OFFICE_RELS, NS_PRESENTATION, slide_ids, SLIDE_WIDTH, SLIDE_HEIGHT, SLIDE_HEIGHT, SLIDE_WIDTH
    )
}

fn presentation_rels(slide_count: usize) -> String {
    let mut entries = vec![
        ("rId1".to_string(), REL_SLIDE_MASTER, "slideMasters/slideMaster1.xml".to_string()),
        ("rId2".to_string(), REL_THEME, "theme/theme1.xml".to_string()),
    ];
    entries.extend(
        (1..=slide_count).map(|i| (format!("rId{}", i + 2), REL_SLIDE, format!("slides/slide{}.xml", i))),
    );
    relationships(&entries)
}

fn slide_master_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#,
        NS_DRAWING, NS_OFFICE_RELS, NS_PRESENTATION
    )
}

fn slide_layout_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="{}" xmlns:r="{}" xmlns:p="{}" type="blank" preserve="1"><p:cSld name="Blank"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#,
        NS_DRAWING, NS_OFFICE_RELS, NS_PRESENTATION
    )
}

fn theme_xml(name: &str) -> String {
    let fill = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    let line = |w: u32| format!(r#"<a:ln w="{}">{}</a:ln>"#, w, fill);
    let effect = "<a:effectStyle><a:effectLst/></a:effectStyle>";
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="{ns}" name="{name}"><a:themeElements><a:clrScheme name="Office"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="44546A"/></a:dk2><a:lt2><a:srgbClr val="E7E6E6"/></a:lt2><a:accent1><a:srgbClr val="4472C4"/></a:accent1><a:accent2><a:srgbClr val="ED7D31"/></a:accent2><a:accent3><a:srgbClr val="A5A5A5"/></a:accent3><a:accent4><a:srgbClr val="FFC000"/></a:accent4><a:accent5><a:srgbClr val="5B9BD5"/></a:accent5><a:accent6><a:srgbClr val="70AD47"/></a:accent6><a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink></a:clrScheme><a:fontScheme name="Office"><a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Office"><a:fillStyleLst>{fill}{fill}{fill}</a:fillStyleLst><a:lnStyleLst>{l1}{l2}{l3}</a:lnStyleLst><a:effectStyleLst>{effect}{effect}{effect}</a:effectStyleLst><a:bgFillStyleLst>{fill}{fill}{fill}</a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>"#,
        ns = NS_DRAWING,
        name = escape_xml(name),
        fill = fill,
        l1 = line(6350),
        l2 = line(12700),
        l3 = line(19050),
        effect = effect,
    )
}

//=========================================================================================
// The exporter
//=========================================================================================

#[derive(Clone, Copy, Debug, Default)]
pub struct PptxExporter;

impl PptxExporter {
    fn package(&self, payload: &ExportPayload) -> Result<Vec<u8>, zip::result::ZipError> {
        let slides = slides_for(payload);
        let theme_name = match payload {
            ExportPayload::Presentation { template, .. } => template.as_str(),
            ExportPayload::Summary { .. } => "summary",
        };

        let mut parts: Vec<(String, String)> = vec![
            ("[Content_Types].xml".to_string(), content_types_xml(slides.len())),
            (
                "_rels/.rels".to_string(),
                relationships(&[(
                    "rId1".to_string(),
                    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument",
                    "ppt/presentation.xml".to_string(),
                )]),
            ),
            ("ppt/presentation.xml".to_string(), presentation_xml(slides.len())),
            ("ppt/_rels/presentation.xml.rels".to_string(), presentation_rels(slides.len())),
            ("ppt/theme/theme1.xml".to_string(), theme_xml(theme_name)),
            ("ppt/slideMasters/slideMaster1.xml".to_string(), slide_master_xml()),
            (
                "ppt/slideMasters/_rels/slideMaster1.xml.rels".to_string(),
                relationships(&[
                    ("rId1".to_string(), REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml".to_string()),
                    ("rId2".to_string(), REL_THEME, "../theme/theme1.xml".to_string()),
                ]),
            ),
            ("ppt/slideLayouts/slideLayout1.xml".to_string(), slide_layout_xml()),
            (
                "ppt/slideLayouts/_rels/slideLayout1.xml.rels".to_string(),
                relationships(&[(
                    "rId1".to_string(),
                    REL_SLIDE_MASTER,
                    "../slideMasters/slideMaster1.xml".to_string(),
                )]),
            ),
        ];
        for (i, slide) in slides.iter().enumerate() {
            let n = i + 1;
            parts.push((format!("ppt/slides/slide{}.xml", n), slide_xml(slide)));
            parts.push((
                format!("ppt/slides/_rels/slide{}.xml.rels", n),
                relationships(&[(
                    "rId1".to_string(),
                    REL_SLIDE_LAYOUT,
                    "../slideLayouts/slideLayout1.xml".to_string(),
                )]),
            ));
        }

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (path, contents) in parts {
            zip.start_file(path, options)?;
            zip.write_all(contents.as_bytes())?;
        }
        Ok(zip.finish()?.into_inner())
    }
}

impl ExportAdapter for PptxExporter {
    fn format(&self) -> &'static str {
        "pptx"
    }

    fn export(&self, payload: &ExportPayload) -> PortResult<ExportArtifact> {
        let bytes = self
            .package(payload)
            .map_err(|e| PortError::Unexpected(format!("Failed to build PPTX: {}", e)))?;
        Ok(ExportArtifact {
            file_name: file_name(payload, "pptx"),
            media_type: PPTX_MEDIA_TYPE.to_string(),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn read_part(archive: &mut zip::ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
        let mut xml = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut xml).unwrap();
        xml
    }

    fn deck() -> ExportPayload {
        ExportPayload::Presentation {
            title: "Q3 & Beyond".to_string(),
            template: "modern".to_string(),
            slides: vec![
                ContentBlock {
                    number: 1,
                    title: "Intro".to_string(),
                    body: SlideBody::Text("Welcome <all>".to_string()),
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
    fn deck_package_has_title_slide_plus_one_per_block() {
        let artifact = PptxExporter.export(&deck()).unwrap();
        assert_eq!(artifact.media_type, PPTX_MEDIA_TYPE);
        assert_eq!(artifact.file_name, "Q3 & Beyond.pptx");

        let mut archive = zip::ZipArchive::new(Cursor::new(artifact.bytes)).unwrap();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "ppt/presentation.xml",
            "ppt/_rels/presentation.xml.rels",
            "ppt/theme/theme1.xml",
            "ppt/slideMasters/slideMaster1.xml",
            "ppt/slideLayouts/slideLayout1.xml",
            "ppt/slides/_rels/slide3.xml.rels",
        ] {
            assert!(archive.by_name(part).is_ok(), "missing {}", part);
        }
        assert!(archive.by_name("ppt/slides/slide4.xml").is_err());

        let title = read_part(&mut archive, "ppt/slides/slide1.xml");
        assert!(title.contains("Q3 &amp; Beyond"));
        assert!(title.contains("Template: modern"));

        let intro = read_part(&mut archive, "ppt/slides/slide2.xml");
        assert!(intro.contains("<a:t>Intro</a:t>"));
        assert!(intro.contains("Welcome &lt;all&gt;"));

        let numbers = read_part(&mut archive, "ppt/slides/slide3.xml");
        assert!(numbers.contains("<a:t>up</a:t>") && numbers.contains("<a:t>down</a:t>"));

        let presentation = read_part(&mut archive, "ppt/presentation.xml");
        assert_eq!(presentation.matches("<p:sldId ").count(), 3);
        let types = read_part(&mut archive, "[Content_Types].xml");
        assert!(types.contains("/ppt/slides/slide3.xml"));
    }

    #[test]
    fn summary_becomes_a_two_slide_deck() {
        let payload = ExportPayload::Summary {
            title: "notes.txt".to_string(),
            text: "first\nsecond".to_string(),
        };
        let artifact = PptxExporter.export(&payload).unwrap();
        assert_eq!(artifact.file_name, "notes.txt_summary.pptx");

        let mut archive = zip::ZipArchive::new(Cursor::new(artifact.bytes)).unwrap();
        let body = read_part(&mut archive, "ppt/slides/slide2.xml");
        assert!(body.contains("<a:t>first</a:t>"));
        assert!(archive.by_name("ppt/slides/slide3.xml").is_err());
    }
}
