//! Media asset storage capability
//!
//! Uploads are stored by a collaborator that returns a stable URL
//! string; the core treats that string as an opaque gallery entry and
//! never validates that it still references an existing file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;

use crate::{Error, error::ValidationError};

/// File extensions accepted for gallery media.
pub const ALLOWED_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "mp4", "mov", "webm"];

/// Check whether a filename carries an allowed media extension
/// (case-insensitive).
pub fn is_allowed_media(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[async_trait]
pub trait AssetStore: Send + Sync + 'static {
    /// Store an upload and return its stable public URL.
    async fn store(&self, filename: &str, bytes: &[u8]) -> Result<String, Error>;
}

/// Filesystem-backed asset store. Files land under `root` with a
/// timestamp prefix so repeated uploads of the same filename do not
/// collide, and are addressed as `{public_prefix}/{stored_name}`.
pub struct LocalAssetStore {
    root: PathBuf,
    public_prefix: String,
}

impl LocalAssetStore {
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into(),
        }
    }

    fn sanitized(filename: &str) -> String {
        Path::new(filename)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
            .replace(['/', '\\'], "_")
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn store(&self, filename: &str, bytes: &[u8]) -> Result<String, Error> {
        let name = Self::sanitized(filename);
        if name.is_empty() {
            return Err(ValidationError::EmptyUpload.into());
        }

        let stored_name = format!("{}_{}", Utc::now().timestamp(), name);

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| crate::error::StorageError::Database(e.to_string()))?;
        tokio::fs::write(self.root.join(&stored_name), bytes)
            .await
            .map_err(|e| crate::error::StorageError::Database(e.to_string()))?;

        Ok(format!("{}/{}", self.public_prefix, stored_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_media_extensions() {
        assert!(is_allowed_media("site.jpg"));
        assert!(is_allowed_media("clip.MOV"));
        assert!(is_allowed_media("wiring.webm"));
        assert!(!is_allowed_media("notes.txt"));
        assert!(!is_allowed_media("no_extension"));
    }

    #[test]
    fn test_sanitized_strips_paths() {
        assert_eq!(LocalAssetStore::sanitized("../../etc/passwd"), "passwd");
        assert_eq!(LocalAssetStore::sanitized("photo.png"), "photo.png");
    }
}
