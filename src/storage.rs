use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use axum::async_trait;
use bytes::Bytes;

/// Persistence seam for uploaded photos.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    async fn put(&self, name: &str, body: Bytes) -> anyhow::Result<()>;
    async fn get(&self, name: &str) -> anyhow::Result<Bytes>;
    /// Remove a stored photo. A missing file is not an error.
    async fn delete(&self, name: &str) -> anyhow::Result<()>;
}

/// Filesystem store rooted at the configured upload directory.
#[derive(Clone)]
pub struct LocalPhotos {
    root: PathBuf,
}

impl LocalPhotos {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

#[async_trait]
impl PhotoStore for LocalPhotos {
    async fn put(&self, name: &str, body: Bytes) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("create upload dir {}", self.root.display()))?;
        let path = self.path_for(name);
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write photo {}", path.display()))?;
        Ok(())
    }

    async fn get(&self, name: &str) -> anyhow::Result<Bytes> {
        let path = self.path_for(name);
        let data = tokio::fs::read(&path)
            .await
            .with_context(|| format!("read photo {}", path.display()))?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, name: &str) -> anyhow::Result<()> {
        let path = self.path_for(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("delete photo {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_store() -> LocalPhotos {
        LocalPhotos::new(std::env::temp_dir().join(format!("userhub-storage-{}", Uuid::new_v4())))
    }

    #[tokio::test]
    async fn put_get_delete_roundtrip() {
        let store = temp_store();
        store
            .put("a.png", Bytes::from_static(b"pixels"))
            .await
            .expect("put should succeed");

        let body = store.get("a.png").await.expect("get should succeed");
        assert_eq!(&body[..], b"pixels");

        store.delete("a.png").await.expect("delete should succeed");
        assert!(store.get("a.png").await.is_err());
    }

    #[tokio::test]
    async fn put_overwrites_in_place() {
        let store = temp_store();
        store.put("b.jpg", Bytes::from_static(b"old")).await.unwrap();
        store.put("b.jpg", Bytes::from_static(b"new")).await.unwrap();
        let body = store.get("b.jpg").await.unwrap();
        assert_eq!(&body[..], b"new");
    }

    #[tokio::test]
    async fn delete_of_missing_file_is_ok() {
        let store = temp_store();
        store
            .delete("never-written.png")
            .await
            .expect("missing file should not error");
    }
}
