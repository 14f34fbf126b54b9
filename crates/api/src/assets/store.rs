//! Filesystem storage for uploaded assets.
//!
//! Layout: `<root>/<category>/<stored name>`. Files are written to a
//! temporary name in the target directory and renamed into place, so readers
//! never observe a partial file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use stock_core::assets::{is_safe_name, AssetCategory};
use stock_core::error::CoreError;
use tokio::fs::File;

/// An opened asset ready to be streamed.
#[derive(Debug)]
pub struct OpenAsset {
    pub file: File,
    pub len: u64,
    pub content_type: &'static str,
}

/// Asset store rooted at the configured upload directory.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the per-category directories.
    pub async fn ensure_dirs(&self) -> Result<(), CoreError> {
        for category in AssetCategory::ALL {
            tokio::fs::create_dir_all(self.category_dir(category))
                .await
                .map_err(|e| io_error("create asset directory", e))?;
        }
        Ok(())
    }

    pub fn category_dir(&self, category: AssetCategory) -> PathBuf {
        self.root.join(category.dir_name())
    }

    /// Full path of a stored asset. Refuses names that could leave the
    /// category directory.
    pub fn path_for(&self, name: &str, category: AssetCategory) -> Result<PathBuf, CoreError> {
        if !is_safe_name(name) {
            return Err(CoreError::Internal(format!(
                "Refusing unsafe asset name '{name}'"
            )));
        }
        Ok(self.category_dir(category).join(name))
    }

    /// Write `bytes` under `name`.
    pub async fn put(
        &self,
        name: &str,
        category: AssetCategory,
        bytes: &[u8],
    ) -> Result<(), CoreError> {
        let target = self.path_for(name, category)?;
        let dir = self.category_dir(category);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_error("create asset directory", e))?;

        let temp = dir.join(format!(".upload-{}.tmp", uuid::Uuid::new_v4()));
        let written = match tokio::fs::write(&temp, bytes).await {
            Ok(()) => tokio::fs::rename(&temp, &target).await,
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&temp).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    tracing::warn!(path = %temp.display(), error = %cleanup, "Failed to remove temporary upload");
                }
            }
            return Err(io_error("store asset", e));
        }

        tracing::debug!(%category, name, size = bytes.len(), "Asset stored");
        Ok(())
    }

    /// Remove a stored asset. An empty name or an already missing file is
    /// not an error.
    pub async fn delete(&self, name: &str, category: AssetCategory) -> Result<(), CoreError> {
        if name.is_empty() {
            return Ok(());
        }
        let path = self.path_for(name, category)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(%category, name, "Asset deleted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("delete asset", e)),
        }
    }

    /// Open a stored asset for streaming. Returns `None` when `name` is empty
    /// or the file is gone.
    pub async fn open(
        &self,
        name: &str,
        category: AssetCategory,
    ) -> Result<Option<OpenAsset>, CoreError> {
        if name.is_empty() {
            return Ok(None);
        }
        let path = self.path_for(name, category)?;
        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(%category, name, "Referenced asset is missing on disk");
                return Ok(None);
            }
            Err(e) => return Err(io_error("open asset", e)),
        };
        let len = file
            .metadata()
            .await
            .map_err(|e| io_error("stat asset", e))?
            .len();

        Ok(Some(OpenAsset {
            file,
            len,
            content_type: content_type_for(name),
        }))
    }
}

/// MIME type for a stored name, by extension.
pub fn content_type_for(name: &str) -> &'static str {
    match stock_core::assets::extension_of(name).as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

fn io_error(action: &str, err: std::io::Error) -> CoreError {
    CoreError::Internal(format!("Failed to {action}: {err}"))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use tokio::io::AsyncReadExt;

    use super::*;

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    #[tokio::test]
    async fn put_then_open_round_trips_bytes() {
        let root = tempfile::tempdir().unwrap();
        let store = AssetStore::new(root.path());

        store
            .put("abc.png", AssetCategory::Users, b"\x89PNG data")
            .await
            .unwrap();

        let mut opened = store
            .open("abc.png", AssetCategory::Users)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(opened.len, 9);
        assert_eq!(opened.content_type, "image/png");
        let mut read = Vec::new();
        opened.file.read_to_end(&mut read).await.unwrap();
        assert_eq!(read, b"\x89PNG data");

        assert_eq!(
            files_in(&store.category_dir(AssetCategory::Users)),
            vec!["abc.png"]
        );
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let store = AssetStore::new(root.path());
        store
            .put("x.jpg", AssetCategory::Products, b"jpeg")
            .await
            .unwrap();

        store.delete("x.jpg", AssetCategory::Products).await.unwrap();
        store.delete("x.jpg", AssetCategory::Products).await.unwrap();
        store.delete("", AssetCategory::Products).await.unwrap();
        assert!(files_in(&store.category_dir(AssetCategory::Products)).is_empty());
    }

    #[tokio::test]
    async fn open_missing_or_empty_is_none() {
        let root = tempfile::tempdir().unwrap();
        let store = AssetStore::new(root.path());

        assert!(store.open("", AssetCategory::Users).await.unwrap().is_none());
        assert!(store
            .open("gone.png", AssetCategory::Users)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn unsafe_names_are_refused() {
        let root = tempfile::tempdir().unwrap();
        let store = AssetStore::new(root.path());

        assert_matches!(
            store.put("../escape.png", AssetCategory::Users, b"x").await,
            Err(CoreError::Internal(_))
        );
        assert_matches!(
            store.delete("../../etc/passwd", AssetCategory::Users).await,
            Err(CoreError::Internal(_))
        );
    }

    #[tokio::test]
    async fn failed_put_leaves_no_file() {
        let root = tempfile::tempdir().unwrap();
        let store = AssetStore::new(root.path());
        std::fs::create_dir_all(store.category_dir(AssetCategory::Users)).unwrap();
        // A directory occupying the target name makes the rename fail.
        std::fs::create_dir(store.category_dir(AssetCategory::Users).join("taken.png")).unwrap();

        assert!(store
            .put("taken.png", AssetCategory::Users, b"bytes")
            .await
            .is_err());
        assert_eq!(
            files_in(&store.category_dir(AssetCategory::Users)),
            vec!["taken.png"]
        );
    }

    #[tokio::test]
    async fn ensure_dirs_creates_every_category() {
        let root = tempfile::tempdir().unwrap();
        let store = AssetStore::new(root.path().join("nested"));
        store.ensure_dirs().await.unwrap();

        assert!(store.category_dir(AssetCategory::Users).is_dir());
        assert!(store.category_dir(AssetCategory::Products).is_dir());
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for("a.PNG"), "image/png");
        assert_eq!(content_type_for("a.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("a"), "application/octet-stream");
    }
}
