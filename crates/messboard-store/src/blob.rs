use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use messboard_types::ImageRef;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BlobError, BlobResult};
use crate::traits::BlobStore;

/// Handle returned by [`BlobStore::store`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRef {
    pub url: String,
    pub id: String,
}

impl From<BlobRef> for ImageRef {
    fn from(blob: BlobRef) -> Self {
        ImageRef::new(blob.url, blob.id)
    }
}

/// Bytes of a stored blob plus the content type it was uploaded with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredBlob {
    pub data: Bytes,
    pub content_type: Option<String>,
}

fn new_blob_id() -> String {
    uuid::Uuid::now_v7().simple().to_string()
}

/// Only ids this module could have generated are accepted; anything else
/// (path separators, dots) is rejected before it reaches the filesystem.
fn validate_id(id: &str) -> BlobResult<()> {
    let ok = !id.is_empty()
        && id.len() <= 64
        && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if ok {
        Ok(())
    } else {
        Err(BlobError::InvalidId(id.to_string()))
    }
}

fn blob_url(public_base: &str, id: &str) -> String {
    format!("{}/{}", public_base.trim_end_matches('/'), id)
}

/// In-memory blob store.
///
/// Counts delete attempts and can be told to fail deletes, so callers'
/// best-effort cleanup paths can be observed in tests.
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, StoredBlob>>,
    public_base: String,
    fail_deletes: AtomicBool,
    delete_attempts: AtomicUsize,
}

impl InMemoryBlobStore {
    pub fn new(public_base: impl Into<String>) -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            public_base: public_base.into(),
            fail_deletes: AtomicBool::new(false),
            delete_attempts: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.blobs.read().expect("lock poisoned").contains_key(id)
    }

    /// Make every subsequent `delete` fail with [`BlobError::Unavailable`].
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Number of `delete` calls made so far, successful or not.
    pub fn delete_attempts(&self) -> usize {
        self.delete_attempts.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new("/blobs")
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn store(&self, data: Bytes, content_type: Option<&str>) -> BlobResult<BlobRef> {
        if data.is_empty() {
            return Err(BlobError::Empty);
        }
        let id = new_blob_id();
        let blob = StoredBlob {
            data,
            content_type: content_type.map(str::to_string),
        };
        self.blobs
            .write()
            .expect("lock poisoned")
            .insert(id.clone(), blob);
        Ok(BlobRef {
            url: blob_url(&self.public_base, &id),
            id,
        })
    }

    async fn fetch(&self, id: &str) -> BlobResult<Option<StoredBlob>> {
        Ok(self.blobs.read().expect("lock poisoned").get(id).cloned())
    }

    async fn delete(&self, id: &str) -> BlobResult<bool> {
        self.delete_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(BlobError::Unavailable("deletes disabled".into()));
        }
        Ok(self.blobs.write().expect("lock poisoned").remove(id).is_some())
    }
}

/// Blob store keeping one file per blob under a directory.
///
/// Layout: `<dir>/<id>` holds the bytes, `<dir>/<id>.type` the content type
/// when one was supplied.
#[derive(Debug)]
pub struct FsBlobStore {
    dir: PathBuf,
    public_base: String,
}

impl FsBlobStore {
    /// Open (creating if needed) a blob directory.
    pub fn open(dir: impl AsRef<Path>, public_base: impl Into<String>) -> BlobResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            public_base: public_base.into(),
        })
    }

    fn data_path(&self, id: &str) -> PathBuf {
        self.dir.join(id)
    }

    fn type_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.type"))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn store(&self, data: Bytes, content_type: Option<&str>) -> BlobResult<BlobRef> {
        if data.is_empty() {
            return Err(BlobError::Empty);
        }
        let id = new_blob_id();
        tokio::fs::write(self.data_path(&id), &data).await?;
        if let Some(ct) = content_type {
            tokio::fs::write(self.type_path(&id), ct.as_bytes()).await?;
        }
        debug!(id = %id, bytes = data.len(), "blob stored");
        Ok(BlobRef {
            url: blob_url(&self.public_base, &id),
            id,
        })
    }

    async fn fetch(&self, id: &str) -> BlobResult<Option<StoredBlob>> {
        validate_id(id)?;
        let data = match tokio::fs::read(self.data_path(id)).await {
            Ok(data) => Bytes::from(data),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let content_type = match tokio::fs::read_to_string(self.type_path(id)).await {
            Ok(ct) => Some(ct.trim().to_string()),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        Ok(Some(StoredBlob { data, content_type }))
    }

    async fn delete(&self, id: &str) -> BlobResult<bool> {
        validate_id(id)?;
        let existed = match tokio::fs::remove_file(self.data_path(id)).await {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        match tokio::fs::remove_file(self.type_path(id)).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        debug!(id = %id, existed, "blob deleted");
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_validation() {
        assert!(validate_id("0190f1c2a3b4").is_ok());
        assert!(validate_id("abc-DEF_1").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id("../etc/passwd").is_err());
        assert!(validate_id("a.type").is_err());
    }

    #[test]
    fn url_joins_without_double_slash() {
        assert_eq!(blob_url("/blobs/", "x"), "/blobs/x");
        assert_eq!(blob_url("https://cdn.example/menus", "x"), "https://cdn.example/menus/x");
    }

    #[tokio::test]
    async fn memory_store_fetch_delete() {
        let store = InMemoryBlobStore::default();
        let blob = store
            .store(Bytes::from_static(b"png"), Some("image/png"))
            .await
            .unwrap();
        assert!(blob.url.ends_with(&blob.id));

        let fetched = store.fetch(&blob.id).await.unwrap().unwrap();
        assert_eq!(fetched.data, Bytes::from_static(b"png"));
        assert_eq!(fetched.content_type.as_deref(), Some("image/png"));

        assert!(store.delete(&blob.id).await.unwrap());
        assert!(!store.delete(&blob.id).await.unwrap());
        assert_eq!(store.delete_attempts(), 2);
    }

    #[tokio::test]
    async fn memory_store_rejects_empty() {
        let store = InMemoryBlobStore::default();
        let err = store.store(Bytes::new(), None).await.unwrap_err();
        assert!(matches!(err, BlobError::Empty));
    }

    #[tokio::test]
    async fn memory_store_failing_deletes() {
        let store = InMemoryBlobStore::default();
        let blob = store.store(Bytes::from_static(b"x"), None).await.unwrap();
        store.set_fail_deletes(true);
        assert!(store.delete(&blob.id).await.is_err());
        assert!(store.contains(&blob.id));
    }

    #[tokio::test]
    async fn fs_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path().join("blobs"), "/blobs").unwrap();

        let blob = store
            .store(Bytes::from_static(b"jpeg-bytes"), Some("image/jpeg"))
            .await
            .unwrap();
        assert_eq!(blob.url, format!("/blobs/{}", blob.id));

        let fetched = store.fetch(&blob.id).await.unwrap().unwrap();
        assert_eq!(&fetched.data[..], b"jpeg-bytes");
        assert_eq!(fetched.content_type.as_deref(), Some("image/jpeg"));

        assert!(store.delete(&blob.id).await.unwrap());
        assert!(store.fetch(&blob.id).await.unwrap().is_none());
        assert!(!store.delete(&blob.id).await.unwrap());
    }

    #[tokio::test]
    async fn fs_store_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path(), "/blobs").unwrap();
        assert!(matches!(
            store.fetch("../secret").await,
            Err(BlobError::InvalidId(_))
        ));
    }

    #[test]
    fn blob_ref_into_image_ref() {
        let image: ImageRef = BlobRef {
            url: "/blobs/a".into(),
            id: "a".into(),
        }
        .into();
        assert_eq!(image.blob_id(), Some("a"));
    }
}
