//! Upsert-merge of a finished record into the store.

use serde_json::Value;

use crate::inspection::{FieldValue, InspectionRecord, PATH_SEPARATOR};

use super::{InspectionStore, StoreError, UpdateEntry};

/// What [`save`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted,
    Updated,
}

/// Flatten a record into update keys: scalars under their own key, section
/// sub-fields under `"section.subField"`.  Record order is preserved.
///
/// ```
/// use truck_inspect::inspection::InspectionRecord;
/// use truck_inspect::store::flatten_update;
///
/// let mut record = InspectionRecord::new("1", "2024-01-01 10:00:00");
/// record.set_section("Tires", vec![("Left".into(), "32psi".into())]);
///
/// let keys: Vec<String> = flatten_update(&record).into_iter().map(|(k, _)| k).collect();
/// assert_eq!(keys, ["Inspection ID", "Date & Time of Inspection", "Tires.Left"]);
/// ```
pub fn flatten_update(record: &InspectionRecord) -> Vec<UpdateEntry> {
    let mut updates = Vec::new();
    for (key, value) in record.entries() {
        match value {
            FieldValue::Text(text) => updates.push((key.to_string(), Value::String(text.clone()))),
            FieldValue::Section(fields) => {
                for (sub, text) in fields {
                    updates.push((
                        format!("{key}{PATH_SEPARATOR}{sub}"),
                        Value::String(text.clone()),
                    ));
                }
            }
        }
    }
    updates
}

/// Insert the record if its identifier is new, otherwise merge it into the
/// stored document.
///
/// # Errors
///
/// Any [`StoreError`] from the backend; nothing is retried or swallowed.
pub fn save<S>(store: &S, record: &InspectionRecord) -> Result<SaveOutcome, StoreError>
where
    S: InspectionStore + ?Sized,
{
    let id = record.inspection_id();

    if store.find_inspection(id)?.is_none() {
        match store.insert(record.to_document()) {
            Ok(()) => {
                log::info!("store: inserted inspection {id}");
                return Ok(SaveOutcome::Inserted);
            }
            // Inserted by someone else since the lookup; fall through to merge.
            Err(StoreError::Duplicate(_)) => {}
            Err(e) => return Err(e),
        }
    }

    store.update(id, &flatten_update(record))?;
    log::info!("store: updated inspection {id}");
    Ok(SaveOutcome::Updated)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
