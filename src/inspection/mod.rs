//! Inspection data model.
//!
//! * [`InspectionRecord`]: insertion-ordered mapping of field path → value,
//!   built by the session and handed by value to persistence and reporting.
//! * [`QuestionSchedule`]: the static, ordered list of prompts that drives a
//!   session (flat questions first, then each section in declared order).

pub mod record;
pub mod schedule;

pub use record::{format_timestamp, FieldValue, InspectionRecord, INSPECTED_AT, INSPECTION_ID};
pub use schedule::{
    FieldPath, Question, QuestionSchedule, ScheduleError, Section, Step, PATH_SEPARATOR,
};
