//! Inspection image lookup.
//!
//! A standalone HTTP endpoint beside the inspection flow: filenames are
//! registered in the `images` tree of the database and served as PNG.
//!
//! ```text
//! GET /image/{filename} ──▶ ImageCatalog::lookup ──▶ read image_path ──▶ 200 image/png
//!                                 └─ unknown / unreadable ─────────────▶ 404 {"error": ...}
//! ```

pub mod catalog;
pub mod server;

use thiserror::Error;

pub use catalog::{ImageCatalog, ImageRecord};
pub use server::{get_image, router, serve};

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image filename must not be empty")]
    EmptyFilename,

    #[error("database error: {0}")]
    Database(#[from] sled::Error),

    #[error("catalog entry encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(std::io::Error),
}
