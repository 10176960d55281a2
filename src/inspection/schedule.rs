//! [`QuestionSchedule`]: the ordered prompts that drive a session.
//!
//! Order is an external contract: flat questions are asked strictly before
//! section questions, and within a section in declared order.  The same
//! order determines the order of lines in the rendered report.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::record::{INSPECTED_AT, INSPECTION_ID};

/// Separator used for nested keys in store updates (`section.field`).
pub const PATH_SEPARATOR: char = '.';

// ---------------------------------------------------------------------------
// ScheduleError
// ---------------------------------------------------------------------------

/// Reasons a schedule is rejected before a session starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    #[error("schedule has no questions")]
    Empty,

    #[error("field name must not be blank")]
    BlankField,

    #[error("field {0:?} is declared more than once")]
    DuplicateField(String),

    #[error("field {0:?} is reserved for the session")]
    ReservedField(String),

    #[error("field {0:?} must not contain '.'")]
    DottedField(String),

    #[error("section {0:?} has no questions")]
    EmptySection(String),
}

// ---------------------------------------------------------------------------
// Schedule types
// ---------------------------------------------------------------------------

/// One prompt and the field its answer is stored under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub field: String,
    pub prompt: String,
}

impl Question {
    pub fn new(field: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            prompt: prompt.into(),
        }
    }
}

/// A nested group of questions stored as one sub-mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub questions: Vec<Question>,
}

/// Static ordered question list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSchedule {
    #[serde(default)]
    pub flat: Vec<Question>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// Where an answer is written in the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPath<'a> {
    Top(&'a str),
    Nested { section: &'a str, field: &'a str },
}

impl<'a> FieldPath<'a> {
    /// The leaf field name (used in apologies).
    pub fn field(&self) -> &'a str {
        match *self {
            FieldPath::Top(field) => field,
            FieldPath::Nested { field, .. } => field,
        }
    }
}

impl fmt::Display for FieldPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Top(field) => f.write_str(field),
            FieldPath::Nested { section, field } => {
                write!(f, "{section}{PATH_SEPARATOR}{field}")
            }
        }
    }
}

/// One position in the flattened question sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step<'a> {
    pub path: FieldPath<'a>,
    pub prompt: &'a str,
    /// `true` for the last question of a section: the section is attached
    /// to the record once this answer is accepted.
    pub closes_section: bool,
}

impl QuestionSchedule {
    /// The truck inspection questionnaire.
    pub fn truck_inspection() -> Self {
        Self {
            flat: vec![
                Question::new("Truck Serial Number", "Please provide the Truck Serial Number."),
                Question::new("Truck Model", "Please provide the Truck Model."),
                Question::new("Inspector Name", "Please provide your name."),
                Question::new("Inspection Employee ID", "Please provide your Employee ID."),
                Question::new(
                    "Location of Inspection",
                    "Please provide the Location of Inspection.",
                ),
            ],
            sections: vec![Section {
                name: "Tires".into(),
                questions: vec![
                    Question::new(
                        "Tire Pressure for Left Front",
                        "Tire Pressure for Left Front:",
                    ),
                    Question::new(
                        "Tire Pressure for Right Front",
                        "Tire Pressure for Right Front:",
                    ),
                    Question::new(
                        "Tire Condition for Left Front",
                        "Tire Condition for Left Front (Good, Ok, Needs Replacement):",
                    ),
                ],
            }],
        }
    }

    /// Check names before a session starts.
    ///
    /// # Errors
    ///
    /// Rejects empty schedules, blank / dotted / reserved / duplicate field
    /// names and sections without questions.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.len() == 0 {
            return Err(ScheduleError::Empty);
        }

        let mut top_level: HashSet<&str> = HashSet::new();
        top_level.insert(INSPECTION_ID);
        top_level.insert(INSPECTED_AT);

        let top_names = self
            .flat
            .iter()
            .map(|q| q.field.as_str())
            .chain(self.sections.iter().map(|s| s.name.as_str()));
        for name in top_names {
            check_name(name)?;
            if name == INSPECTION_ID || name == INSPECTED_AT {
                return Err(ScheduleError::ReservedField(name.to_string()));
            }
            if !top_level.insert(name) {
                return Err(ScheduleError::DuplicateField(name.to_string()));
            }
        }

        for section in &self.sections {
            if section.questions.is_empty() {
                return Err(ScheduleError::EmptySection(section.name.clone()));
            }
            let mut seen = HashSet::new();
            for question in &section.questions {
                check_name(&question.field)?;
                if !seen.insert(question.field.as_str()) {
                    return Err(ScheduleError::DuplicateField(format!(
                        "{}{PATH_SEPARATOR}{}",
                        section.name, question.field
                    )));
                }
            }
        }
        Ok(())
    }

    /// Total number of questions (flat + all sections).
    pub fn len(&self) -> usize {
        self.flat.len() + self.sections.iter().map(|s| s.questions.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The question at position `index` of the flattened sequence.
    pub fn step(&self, index: usize) -> Option<Step<'_>> {
        if let Some(q) = self.flat.get(index) {
            return Some(Step {
                path: FieldPath::Top(&q.field),
                prompt: &q.prompt,
                closes_section: false,
            });
        }

        let mut offset = index - self.flat.len();
        for section in &self.sections {
            let count = section.questions.len();
            if offset < count {
                let q = &section.questions[offset];
                return Some(Step {
                    path: FieldPath::Nested {
                        section: &section.name,
                        field: &q.field,
                    },
                    prompt: &q.prompt,
                    closes_section: offset + 1 == count,
                });
            }
            offset -= count;
        }
        None
    }

    /// Every question in ask order.
    pub fn steps(&self) -> impl Iterator<Item = Step<'_>> {
        (0..self.len()).filter_map(move |i| self.step(i))
    }
}

impl Default for QuestionSchedule {
    fn default() -> Self {
        Self::truck_inspection()
    }
}

fn check_name(name: &str) -> Result<(), ScheduleError> {
    if name.trim().is_empty() {
        return Err(ScheduleError::BlankField);
    }
    if name.contains(PATH_SEPARATOR) {
        return Err(ScheduleError::DottedField(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
