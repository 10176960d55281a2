//! Inspection persistence.
//!
//! # Architecture
//!
//! ```text
//! InspectionRecord ──save()──▶ find_inspection(id)
//!                                 ├─ None    → insert(record.to_document())   → Inserted
//!                                 └─ Some(_) → update(id, flatten_update(..)) → Updated
//!                                                  │
//!                                                  ▼
//!                                  apply_update: "section.field" → doc[section][field]
//!
//! InspectionStore ── MemoryStore  (tests, ephemeral runs)
//!                 └─ SledStore    (inspections / meta / images trees)
//! ```

pub mod document;
pub mod memory;
pub mod merge;
pub mod sled_store;

use thiserror::Error;

pub use document::{apply_update, get_path, Document, UpdateEntry};
pub use memory::MemoryStore;
pub use merge::{flatten_update, save, SaveOutcome};
pub use sled_store::SledStore;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sled::Error),

    #[error("document encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("document has no \"Inspection ID\"")]
    MissingId,

    #[error("inspection {0:?} already exists")]
    Duplicate(String),

    #[error("inspection {0:?} not found")]
    NotFound(String),

    #[error("corrupt {0}")]
    Corrupt(&'static str),
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// One collection of inspection documents keyed by `Inspection ID`.
pub trait InspectionStore: Send + Sync {
    /// Atomically reserve the next identifier (1, 2, 3, …).
    fn next_inspection_id(&self) -> Result<u64, StoreError>;

    fn count(&self) -> Result<usize, StoreError>;

    fn find_inspection(&self, inspection_id: &str) -> Result<Option<Document>, StoreError>;

    /// Store a new document verbatim.
    ///
    /// Fails with [`StoreError::Duplicate`] when the identifier is taken.
    fn insert(&self, doc: Document) -> Result<(), StoreError>;

    /// Merge `updates` into an existing document (see [`apply_update`]).
    fn update(&self, inspection_id: &str, updates: &[UpdateEntry]) -> Result<(), StoreError>;
}

impl<T: InspectionStore + ?Sized> InspectionStore for std::sync::Arc<T> {
    fn next_inspection_id(&self) -> Result<u64, StoreError> {
        (**self).next_inspection_id()
    }

    fn count(&self) -> Result<usize, StoreError> {
        (**self).count()
    }

    fn find_inspection(&self, inspection_id: &str) -> Result<Option<Document>, StoreError> {
        (**self).find_inspection(inspection_id)
    }

    fn insert(&self, doc: Document) -> Result<(), StoreError> {
        (**self).insert(doc)
    }

    fn update(&self, inspection_id: &str, updates: &[UpdateEntry]) -> Result<(), StoreError> {
        (**self).update(inspection_id, updates)
    }
}
