//! Text lines of a report and their placement on pages.
//!
//! Coordinates are PDF points with the origin at the bottom-left corner.
//!
//! ```text
//!  page_height ┬──────────────────────────────
//!   margin_top │
//!              │  Truck Inspection Report        ← title (page 1 only)
//!              │    ↓ title_step
//!              │  Inspection ID: 1
//!              │    ↓ line_step
//!              │  Tires:
//!              │    Tire Pressure for Left Front: 32psi
//!              │  ...
//! margin_bottom│  ── next line below here → new page
//!            0 ┴──────────────────────────────
//! ```

use crate::config::ReportConfig;
use crate::inspection::{FieldValue, InspectionRecord};

/// Body lines in record order: `"key: value"` for scalars, `"key:"` plus
/// `"  sub: value"` per sub-field for sections.
pub fn report_lines(record: &InspectionRecord) -> Vec<String> {
    let mut lines = Vec::with_capacity(record.len());
    for (key, value) in record.entries() {
        match value {
            FieldValue::Text(text) => lines.push(format!("{key}: {text}")),
            FieldValue::Section(fields) => {
                lines.push(format!("{key}:"));
                lines.extend(fields.iter().map(|(sub, text)| format!("  {sub}: {text}")));
            }
        }
    }
    lines
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Title,
    Body,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedLine {
    pub text: String,
    pub style: LineStyle,
    pub x: i64,
    /// Baseline.
    pub y: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportPage {
    pub lines: Vec<PlacedLine>,
}

/// All pages of a report, ready for serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLayout {
    pub pages: Vec<ReportPage>,
}

impl ReportLayout {
    /// Lay the title and the record's lines out top to bottom, starting a new
    /// page whenever a line would fall below the bottom margin.  Every page
    /// takes at least one line, however small the page.
    pub fn build(record: &InspectionRecord, config: &ReportConfig) -> Self {
        let top = config.page_height - config.margin_top;
        let mut pages = vec![ReportPage::default()];
        let mut y = top;

        pages[0].lines.push(PlacedLine {
            text: config.title.clone(),
            style: LineStyle::Title,
            x: config.margin_left,
            y,
        });
        y -= config.title_step;

        for text in report_lines(record) {
            let on_page = pages.last().map_or(0, |p| p.lines.len());
            if y < config.margin_bottom && on_page > 0 {
                pages.push(ReportPage::default());
                y = top;
            }
            if let Some(page) = pages.last_mut() {
                page.lines.push(PlacedLine {
                    text,
                    style: LineStyle::Body,
                    x: config.margin_left,
                    y,
                });
            }
            y -= config.line_step;
        }

        Self { pages }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every line across all pages, in reading order.
    pub fn lines(&self) -> impl Iterator<Item = &PlacedLine> {
        self.pages.iter().flat_map(|p| p.lines.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_record() -> InspectionRecord {
        let mut record = InspectionRecord::new("1", "2024-01-01 10:00:00");
        record.set_text("Truck Serial Number", "SN1");
        record.set_section(
            "Tires",
            vec![("Tire Pressure for Left Front".into(), "32psi".into())],
        );
        record
    }

    #[test]
    fn lines_follow_record_order() {
        assert_eq!(
            report_lines(&example_record()),
            vec![
                "Inspection ID: 1",
                "Date & Time of Inspection: 2024-01-01 10:00:00",
                "Truck Serial Number: SN1",
                "Tires:",
                "  Tire Pressure for Left Front: 32psi",
            ]
        );
    }

    #[test]
    fn single_page_positions() {
        let layout = ReportLayout::build(&example_record(), &ReportConfig::default());
        assert_eq!(layout.page_count(), 1);

        let lines = &layout.pages[0].lines;
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0].style, LineStyle::Title);
        assert_eq!(lines[0].text, "Truck Inspection Report");
        assert_eq!((lines[0].x, lines[0].y), (50, 742));
        assert_eq!(lines[1].y, 712);
        assert_eq!(lines[2].y, 692);
        assert_eq!(lines[5].y, 632);
        assert!(lines[1..].iter().all(|l| l.style == LineStyle::Body));
    }

    #[test]
    fn long_records_break_onto_new_pages() {
        let mut record = InspectionRecord::new("1", "2024-01-01 10:00:00");
        for i in 0..60 {
            record.set_text(format!("Field {i}"), "ok");
        }
        let config = ReportConfig::default();
        let layout = ReportLayout::build(&record, &config);

        // Page 1: title at 742, body lines 712 down to 52.
        assert_eq!(layout.page_count(), 2);
        assert_eq!(layout.pages[0].lines.len(), 1 + 34);
        assert_eq!(layout.pages[1].lines.len(), 62 - 34);
        assert_eq!(layout.pages[1].lines[0].y, 742);
        assert!(layout
            .lines()
            .all(|l| l.y >= config.margin_bottom && l.y <= config.page_height));
        assert!(layout.pages[1]
            .lines
            .iter()
            .all(|l| l.style == LineStyle::Body));
        assert_eq!(layout.lines().count(), 1 + 62);
    }

    #[test]
    fn tiny_page_still_makes_progress() {
        let config = ReportConfig {
            page_height: 60,
            margin_top: 10,
            margin_bottom: 50,
            ..ReportConfig::default()
        };
        let layout = ReportLayout::build(&example_record(), &config);
        // One line per page.
        assert_eq!(layout.page_count(), 6);
        assert!(layout.pages.iter().all(|p| !p.lines.is_empty()));
    }
}
