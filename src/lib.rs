//! Truck Inspect: spoken-dialogue truck inspection collection.
//!
//! An operator answers an ordered set of spoken questions; the answers are
//! accumulated into an [`inspection::InspectionRecord`], upsert-merged into a
//! document store and rendered as a paginated PDF report.
//!
//! # Module map
//!
//! ```text
//! config ─────────────┐
//!                     ▼
//! audio ─▶ stt ─▶ speech (PromptListener) ─▶ session ─▶ app ─┬─▶ store
//!                                              ▲             └─▶ report
//!                                   inspection (record + schedule)
//!
//! images  (independent HTTP endpoint, shares the database only)
//! ```

pub mod app;
pub mod audio;
pub mod config;
pub mod images;
pub mod inspection;
pub mod report;
pub mod session;
pub mod speech;
pub mod store;
pub mod stt;
