//! [`InspectionRecord`]: the in-memory result of one inspection session.
//!
//! Entries keep the order in which they were written.  The session writes
//! the identifier and timestamp first, then flat answers in schedule order,
//! then each completed section, so iteration order equals report order.

use chrono::NaiveDateTime;
use serde_json::{Map, Value};

/// Key of the identifier minted at session start.
pub const INSPECTION_ID: &str = "Inspection ID";

/// Key of the timestamp captured at session start.
pub const INSPECTED_AT: &str = "Date & Time of Inspection";

/// `YYYY-MM-DD HH:MM:SS`
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a session start time the way it is stored and reported.
///
/// ```
/// use chrono::NaiveDate;
/// use truck_inspect::inspection::format_timestamp;
///
/// let at = NaiveDate::from_ymd_opt(2024, 1, 1)
///     .unwrap()
///     .and_hms_opt(10, 0, 0)
///     .unwrap();
/// assert_eq!(format_timestamp(at), "2024-01-01 10:00:00");
/// ```
pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

// ---------------------------------------------------------------------------
// FieldValue
// ---------------------------------------------------------------------------

/// A record value: free-form captured text, or one level of nested fields.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    /// Sub-field name → answer, in the section's schedule order.
    Section(Vec<(String, String)>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::Section(_) => None,
        }
    }

    pub fn as_section(&self) -> Option<&[(String, String)]> {
        match self {
            FieldValue::Text(_) => None,
            FieldValue::Section(fields) => Some(fields),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(text) => Value::String(text.clone()),
            FieldValue::Section(fields) => {
                let mut map = Map::with_capacity(fields.len());
                for (key, value) in fields {
                    map.insert(key.clone(), Value::String(value.clone()));
                }
                Value::Object(map)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// InspectionRecord
// ---------------------------------------------------------------------------

/// Ordered mapping from field path to captured value.
///
/// The identifier and timestamp are set by [`InspectionRecord::new`] and
/// cannot be overwritten through [`set_text`](Self::set_text).
#[derive(Debug, Clone, PartialEq)]
pub struct InspectionRecord {
    entries: Vec<(String, FieldValue)>,
}

impl InspectionRecord {
    /// Create a record holding only the identifier and the timestamp.
    pub fn new(inspection_id: impl Into<String>, inspected_at: impl Into<String>) -> Self {
        Self {
            entries: vec![
                (INSPECTION_ID.to_string(), FieldValue::Text(inspection_id.into())),
                (INSPECTED_AT.to_string(), FieldValue::Text(inspected_at.into())),
            ],
        }
    }

    pub fn inspection_id(&self) -> &str {
        self.text(INSPECTION_ID).unwrap_or_default()
    }

    pub fn inspected_at(&self) -> &str {
        self.text(INSPECTED_AT).unwrap_or_default()
    }

    /// Write a flat answer.  An existing key keeps its position.
    ///
    /// Writes to the identifier or timestamp keys are ignored.
    pub fn set_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        if key == INSPECTION_ID || key == INSPECTED_AT {
            log::warn!("record: refusing to overwrite reserved field {key:?}");
            return;
        }
        self.upsert(key, FieldValue::Text(value.into()));
    }

    /// Attach a completed section.  An existing key keeps its position.
    pub fn set_section(&mut self, name: impl Into<String>, fields: Vec<(String, String)>) {
        self.upsert(name.into(), FieldValue::Section(fields));
    }

    fn upsert(&mut self, key: String, value: FieldValue) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_text)
    }

    pub fn section(&self, name: &str) -> Option<&[(String, String)]> {
        self.get(name).and_then(FieldValue::as_section)
    }

    /// Entries in write order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Top-level keys in write order.
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`: a record carries at least the identifier and timestamp.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Convert to a store document; sections become true nested objects.
    pub fn to_document(&self) -> Map<String, Value> {
        let mut doc = Map::with_capacity(self.entries.len());
        for (key, value) in &self.entries {
            doc.insert(key.clone(), value.to_json());
        }
        doc
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
