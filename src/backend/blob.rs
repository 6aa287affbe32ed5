use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use super::BackendError;

/// Blob storage for pet photos.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under the slash-separated `path`, replacing any previous blob.
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<(), BackendError>;

    /// Public URL for a previously uploaded blob.
    async fn download_url(&self, path: &str) -> Result<String, BackendError>;
}

/// Blob store rooted in a local directory. Download URLs use the `file://` scheme.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a blob path below the root, refusing anything that could escape it.
    fn resolve(&self, path: &str) -> Result<PathBuf, BackendError> {
        let relative = Path::new(path);
        let is_plain = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(BackendError::PermissionDenied(format!(
                "invalid blob path: {path:?}"
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<(), BackendError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let size = bytes.len();
        tokio::fs::write(&target, bytes).await?;
        tracing::debug!(path, size, "Blob uploaded");
        Ok(())
    }

    async fn download_url(&self, path: &str) -> Result<String, BackendError> {
        let target = self.resolve(path)?;
        if !tokio::fs::try_exists(&target).await? {
            return Err(BackendError::NotFound {
                collection: "blobs".into(),
                id: path.into(),
            });
        }
        Ok(format!("file://{}", target.display()))
    }
}
