//! In-process store for tests and runs without a database.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::document::{apply_update, document_id};
use super::{Document, InspectionStore, StoreError, UpdateEntry};

/// Documents kept in insertion order behind a mutex.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<Vec<Document>>,
    sequence: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn docs(&self) -> MutexGuard<'_, Vec<Document>> {
        self.docs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl InspectionStore for MemoryStore {
    fn next_inspection_id(&self) -> Result<u64, StoreError> {
        Ok(self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.docs().len())
    }

    fn find_inspection(&self, inspection_id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .docs()
            .iter()
            .find(|d| document_id(d) == Some(inspection_id))
            .cloned())
    }

    fn insert(&self, doc: Document) -> Result<(), StoreError> {
        let id = document_id(&doc).ok_or(StoreError::MissingId)?.to_string();
        let mut docs = self.docs();
        if docs.iter().any(|d| document_id(d) == Some(id.as_str())) {
            return Err(StoreError::Duplicate(id));
        }
        docs.push(doc);
        Ok(())
    }

    fn update(&self, inspection_id: &str, updates: &[UpdateEntry]) -> Result<(), StoreError> {
        let mut docs = self.docs();
        let doc = docs
            .iter_mut()
            .find(|d| document_id(d) == Some(inspection_id))
            .ok_or_else(|| StoreError::NotFound(inspection_id.to_string()))?;
        apply_update(doc, updates);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str) -> Document {
        let mut d = Document::new();
        d.insert("Inspection ID".into(), json!(id));
        d
    }

    #[test]
    fn ids_are_sequential_from_one() {
        let store = MemoryStore::new();
        assert_eq!(store.next_inspection_id().unwrap(), 1);
        assert_eq!(store.next_inspection_id().unwrap(), 2);
        assert_eq!(store.next_inspection_id().unwrap(), 3);
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let store = MemoryStore::new();
        store.insert(doc("1")).unwrap();
        assert!(matches!(store.insert(doc("1")), Err(StoreError::Duplicate(id)) if id == "1"));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn insert_without_id_is_rejected() {
        let store = MemoryStore::new();
        assert!(matches!(store.insert(Document::new()), Err(StoreError::MissingId)));
    }

    #[test]
    fn update_of_unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let err = store.update("9", &[("a".into(), json!("b"))]).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == "9"));
    }

    #[test]
    fn concurrent_ids_never_collide() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    (0..50)
                        .map(|_| store.next_inspection_id().unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 200);
        assert_eq!(ids.first(), Some(&1));
        assert_eq!(ids.last(), Some(&200));
    }
}
