//! Inspection report rendering.
//!
//! `InspectionRecord → ReportLayout (pages of placed lines) → PDF bytes`

pub mod layout;
pub mod pdf;

pub use layout::{report_lines, LineStyle, PlacedLine, ReportLayout, ReportPage};
pub use pdf::{render_pdf, write_layout, ReportError, REPORT_MIME};
