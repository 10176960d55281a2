//! PDF serialization of a [`ReportLayout`] with `lopdf`.
//!
//! The document is written uncompressed, without creation dates or a file
//! `/ID`, so identical records give identical bytes.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use thiserror::Error;

use crate::config::ReportConfig;
use crate::inspection::InspectionRecord;

use super::layout::{LineStyle, ReportLayout, ReportPage};

/// MIME type of the rendered report.
pub const REPORT_MIME: &str = "application/pdf";

const PDF_VERSION: &str = "1.5";
const BODY_FONT: &str = "F1";
const TITLE_FONT: &str = "F2";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to encode page content: {0}")]
    Content(String),

    #[error("failed to write PDF: {0}")]
    Write(String),
}

/// Render `record` as a PDF document.
///
/// ```
/// use truck_inspect::config::ReportConfig;
/// use truck_inspect::inspection::InspectionRecord;
/// use truck_inspect::report::render_pdf;
///
/// let record = InspectionRecord::new("1", "2024-01-01 10:00:00");
/// let pdf = render_pdf(&record, &ReportConfig::default()).unwrap();
/// assert!(pdf.starts_with(b"%PDF-1.5"));
/// ```
pub fn render_pdf(record: &InspectionRecord, config: &ReportConfig) -> Result<Vec<u8>, ReportError> {
    let layout = ReportLayout::build(record, config);
    write_layout(&layout, config)
}

/// Serialize an already laid-out report.
pub fn write_layout(layout: &ReportLayout, config: &ReportConfig) -> Result<Vec<u8>, ReportError> {
    let mut doc = Document::with_version(PDF_VERSION);
    let pages_id = doc.new_object_id();

    let body_font = doc.add_object(font("Helvetica"));
    let title_font = doc.add_object(font("Helvetica-Bold"));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            BODY_FONT => body_font,
            TITLE_FONT => title_font,
        },
    });

    let mut kids = Vec::with_capacity(layout.pages.len());
    for page in &layout.pages {
        let page_id = add_page(&mut doc, pages_id, page, config)?;
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                config.page_width.into(),
                config.page_height.into(),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| ReportError::Write(e.to_string()))?;
    log::debug!(
        "report: {} page(s), {} bytes",
        layout.page_count(),
        bytes.len()
    );
    Ok(bytes)
}

fn font(base: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    page: &ReportPage,
    config: &ReportConfig,
) -> Result<ObjectId, ReportError> {
    let mut operations = Vec::with_capacity(page.lines.len() * 5);
    for line in &page.lines {
        let (font, size) = match line.style {
            LineStyle::Title => (TITLE_FONT, config.title_size),
            LineStyle::Body => (BODY_FONT, config.body_size),
        };
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec![font.into(), size.into()]));
        operations.push(Operation::new("Td", vec![line.x.into(), line.y.into()]));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(encode_win_ansi(&line.text))],
        ));
        operations.push(Operation::new("ET", vec![]));
    }

    let content = Content { operations }
        .encode()
        .map_err(|e| ReportError::Content(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    }))
}

/// Single-byte text for the standard fonts; characters outside Latin-1
/// (and the C1 control range) become `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u32::from(c) {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
            _ => b'?',
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
