//! `GET /image/{filename}` over axum.

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::{ImageCatalog, ImageError};

const PNG_MIME: &str = "image/png";

pub fn router(catalog: Arc<ImageCatalog>) -> Router {
    Router::new()
        .route("/image/:filename", get(get_image))
        .with_state(catalog)
}

/// The image bytes as `image/png`, or `404 {"error": "Image not found"}`
/// when the filename is unknown or its file cannot be read.
pub async fn get_image(
    State(catalog): State<Arc<ImageCatalog>>,
    Path(filename): Path<String>,
) -> Response {
    let record = match catalog.lookup(&filename) {
        Ok(Some(record)) => record,
        Ok(None) => return not_found(),
        Err(e) => {
            log::error!("images: lookup of {filename:?} failed: {e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Image lookup failed" })),
            )
                .into_response();
        }
    };

    match tokio::fs::read(&record.image_path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, PNG_MIME)], bytes).into_response(),
        Err(e) => {
            log::warn!(
                "images: {filename:?} is registered but {} is unreadable: {e}",
                record.image_path.display()
            );
            not_found()
        }
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Image not found" })),
    )
        .into_response()
}

/// Serve the image endpoint on `bind` until `shutdown` resolves.
pub async fn serve<F>(bind: &str, catalog: Arc<ImageCatalog>, shutdown: F) -> Result<(), ImageError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|source| ImageError::Bind {
            addr: bind.to_string(),
            source,
        })?;
    log::info!("images: listening on http://{bind}/image/<filename>");

    axum::serve(listener, router(catalog))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ImageError::Serve)
}
