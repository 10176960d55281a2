//! Durable store on an embedded sled database.
//!
//! Trees:
//!   `inspections`: `Inspection ID` → JSON document
//!   `meta`: `inspection_seq` → big-endian u64, last issued id
//!   `images`: handed to [`ImageCatalog`](crate::images::ImageCatalog)

use std::path::Path;

use sled::{Db, Tree};

use super::document::{apply_update, document_id};
use super::{Document, InspectionStore, StoreError, UpdateEntry};

const INSPECTIONS_TREE: &str = "inspections";
const META_TREE: &str = "meta";
const IMAGES_TREE: &str = "images";
const SEQUENCE_KEY: &[u8] = b"inspection_seq";

pub struct SledStore {
    db: Db,
    inspections: Tree,
    meta: Tree,
}

impl SledStore {
    /// Open (or create) the database directory at `path`.
    pub fn open_path(path: &Path) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        log::info!("store: opened {}", path.display());
        Self::from_db(db)
    }

    /// A throwaway database removed on drop.
    pub fn temporary() -> Result<Self, StoreError> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: Db) -> Result<Self, StoreError> {
        Ok(Self {
            inspections: db.open_tree(INSPECTIONS_TREE)?,
            meta: db.open_tree(META_TREE)?,
            db,
        })
    }

    /// The tree backing the image catalog.
    pub fn images_tree(&self) -> Result<Tree, StoreError> {
        Ok(self.db.open_tree(IMAGES_TREE)?)
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}

fn decode_u64(bytes: &[u8]) -> Option<u64> {
    <[u8; 8]>::try_from(bytes).ok().map(u64::from_be_bytes)
}

impl InspectionStore for SledStore {
    fn next_inspection_id(&self) -> Result<u64, StoreError> {
        // Databases written before the sequence existed continue after the
        // documents already stored.
        let seed = self.inspections.len() as u64;
        let next = self.meta.update_and_fetch(SEQUENCE_KEY, |old| {
            let current = old.and_then(decode_u64).unwrap_or(seed);
            Some(current.saturating_add(1).to_be_bytes().to_vec())
        })?;
        next.as_deref()
            .and_then(decode_u64)
            .ok_or(StoreError::Corrupt("inspection sequence"))
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.inspections.len())
    }

    fn find_inspection(&self, inspection_id: &str) -> Result<Option<Document>, StoreError> {
        match self.inspections.get(inspection_id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn insert(&self, doc: Document) -> Result<(), StoreError> {
        let id = document_id(&doc).ok_or(StoreError::MissingId)?.to_string();
        let bytes = serde_json::to_vec(&doc)?;
        self.inspections
            .compare_and_swap(id.as_bytes(), None as Option<&[u8]>, Some(bytes))?
            .map_err(|_| StoreError::Duplicate(id.clone()))?;
        self.inspections.flush()?;
        Ok(())
    }

    fn update(&self, inspection_id: &str, updates: &[UpdateEntry]) -> Result<(), StoreError> {
        let key = inspection_id.as_bytes();
        loop {
            let old = self
                .inspections
                .get(key)?
                .ok_or_else(|| StoreError::NotFound(inspection_id.to_string()))?;
            let mut doc: Document = serde_json::from_slice(&old)?;
            apply_update(&mut doc, updates);
            let new = serde_json::to_vec(&doc)?;

            // Retry when another writer changed the document in between.
            if self
                .inspections
                .compare_and_swap(key, Some(&old), Some(new))?
                .is_ok()
            {
                break;
            }
        }
        self.inspections.flush()?;
        Ok(())
    }
}
