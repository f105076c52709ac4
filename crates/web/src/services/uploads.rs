//! Store photo uploads.
//!
//! Photos are written to the uploads directory as `{uuid}.{subtype}` and
//! served back by `ServeDir` under `/uploads`.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when storing an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The file is not an image.
    #[error("That filetype isn't allowed!")]
    UnsupportedType,

    /// Writing the file failed.
    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Where uploaded photos live on disk.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
}

impl PhotoStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory photos are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write an uploaded photo and return its stored filename.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::UnsupportedType` unless `content_type` is `image/*`.
    /// Returns `UploadError::Io` if the file cannot be written.
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn save(&self, content_type: &str, bytes: &[u8]) -> Result<String, UploadError> {
        let extension = image_extension(content_type).ok_or(UploadError::UnsupportedType)?;
        let filename = format!("{}.{extension}", Uuid::new_v4());

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&filename), bytes).await?;

        tracing::info!(%filename, "photo stored");
        Ok(filename)
    }
}

/// File extension for an `image/*` content type, e.g. `image/jpeg` → `jpeg`.
///
/// Parameters are ignored and the subtype is cut at the first character
/// that is not ASCII alphanumeric, so `image/svg+xml` becomes `svg`.
fn image_extension(content_type: &str) -> Option<String> {
    let essence = content_type.split(';').next()?.trim();
    let (kind, subtype) = essence.split_once('/')?;
    if !kind.eq_ignore_ascii_case("image") {
        return None;
    }
    let extension: String = subtype
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    (!extension.is_empty()).then_some(extension)
}
