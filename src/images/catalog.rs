//! Filename → image path lookup kept in a sled tree.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ImageError;

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub filename: String,
    pub image_path: PathBuf,
}

/// Registered inspection images, keyed by filename.
#[derive(Debug, Clone)]
pub struct ImageCatalog {
    tree: sled::Tree,
}

impl ImageCatalog {
    pub fn new(tree: sled::Tree) -> Self {
        Self { tree }
    }

    /// Add or replace the entry for `filename`.
    pub fn register(&self, filename: &str, image_path: &Path) -> Result<(), ImageError> {
        if filename.is_empty() {
            return Err(ImageError::EmptyFilename);
        }
        let record = ImageRecord {
            filename: filename.to_string(),
            image_path: image_path.to_path_buf(),
        };
        self.tree
            .insert(filename.as_bytes(), serde_json::to_vec(&record)?)?;
        self.tree.flush()?;
        log::info!("images: registered {filename} → {}", image_path.display());
        Ok(())
    }

    pub fn lookup(&self, filename: &str) -> Result<Option<ImageRecord>, ImageError> {
        match self.tree.get(filename.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn temporary_catalog() -> ImageCatalog {
    let db = sled::Config::new()
        .temporary(true)
        .open()
        .expect("temporary sled db");
    ImageCatalog::new(db.open_tree("images").expect("images tree"))
}
