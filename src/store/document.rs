//! Stored document shape and dotted-path updates.
//!
//! A document is an insertion-ordered JSON object.  Update keys are either a
//! top-level field (`"Truck Model"`) or a one-level path
//! (`"Tires.Tire Pressure for Left Front"`).  Paths are resolved into the
//! nested object, so a document never holds a literal dotted key.

use serde_json::{Map, Value};

use crate::inspection::PATH_SEPARATOR;

/// One inspection as stored.
pub type Document = Map<String, Value>;

/// A single `key → value` assignment of an update set.
pub type UpdateEntry = (String, Value);

/// Apply `updates` to `doc` in order.
///
/// Keys not named by `updates` are left untouched.  A path whose section is
/// missing (or is not an object) creates the section object.
pub fn apply_update(doc: &mut Document, updates: &[UpdateEntry]) {
    for (key, value) in updates {
        match key.split_once(PATH_SEPARATOR) {
            None => {
                doc.insert(key.clone(), value.clone());
            }
            Some((section, field)) => {
                let slot = doc
                    .entry(section.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !slot.is_object() {
                    log::warn!("store: replacing scalar {section:?} with a section object");
                    *slot = Value::Object(Map::new());
                }
                if let Value::Object(fields) = slot {
                    fields.insert(field.to_string(), value.clone());
                }
            }
        }
    }
}

/// Look up `"field"` or `"section.field"`.
pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    match path.split_once(PATH_SEPARATOR) {
        None => doc.get(path),
        Some((section, field)) => doc.get(section)?.as_object()?.get(field),
    }
}

/// The document's `Inspection ID`, if it carries a string one.
pub fn document_id(doc: &Document) -> Option<&str> {
    doc.get(crate::inspection::INSPECTION_ID)?.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn dotted_keys_land_in_nested_objects() {
        let mut d = doc(json!({
            "Inspection ID": "1",
            "Tires": { "Left": "30psi", "Right": "31psi" }
        }));
        apply_update(
            &mut d,
            &[
                ("Truck Model".into(), json!("Volvo")),
                ("Tires.Left".into(), json!("32psi")),
            ],
        );

        assert_eq!(d["Truck Model"], "Volvo");
        assert_eq!(d["Tires"]["Left"], "32psi");
        assert_eq!(d["Tires"]["Right"], "31psi");
        assert!(!d.contains_key("Tires.Left"));
    }

    #[test]
    fn missing_section_is_created() {
        let mut d = doc(json!({ "Inspection ID": "1" }));
        apply_update(&mut d, &[("Brakes.Pad Wear".into(), json!("low"))]);
        assert_eq!(d["Brakes"], json!({ "Pad Wear": "low" }));
    }

    #[test]
    fn scalar_is_replaced_by_section() {
        let mut d = doc(json!({ "Tires": "n/a" }));
        apply_update(&mut d, &[("Tires.Left".into(), json!("32psi"))]);
        assert_eq!(d["Tires"], json!({ "Left": "32psi" }));
    }

    #[test]
    fn existing_keys_keep_their_position() {
        let mut d = doc(json!({ "a": "1", "b": "2", "c": "3" }));
        apply_update(&mut d, &[("b".into(), json!("x")), ("d".into(), json!("4"))]);
        let keys: Vec<&str> = d.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn get_path_reads_both_levels() {
        let d = doc(json!({ "Inspection ID": "3", "Tires": { "Left": "32psi" } }));
        assert_eq!(get_path(&d, "Tires.Left"), Some(&json!("32psi")));
        assert_eq!(get_path(&d, "Tires.Right"), None);
        assert_eq!(get_path(&d, "Inspection ID.x"), None);
        assert_eq!(document_id(&d), Some("3"));
    }
}
