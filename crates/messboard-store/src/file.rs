use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use messboard_types::{Record, RecordDraft, RecordId};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::filter::RecordFilter;
use crate::traits::RecordStore;

/// Record store mirrored to a single JSON file.
///
/// The full record set is held in memory and the file is rewritten after
/// every mutation: serialized to a temp file in the same directory, synced,
/// then renamed over the old file. The flush runs on the blocking pool while
/// the record lock is held, so writes stay ordered. A mutation whose write
/// fails leaves both the file and the in-memory state untouched.
pub struct FileRecordStore {
    path: PathBuf,
    records: Mutex<HashMap<RecordId, Record>>,
}

impl FileRecordStore {
    /// Open the store at `path`, loading existing records if the file exists.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let records = if path.exists() {
            let raw = fs::read(&path)?;
            let list: Vec<Record> = if raw.iter().all(u8::is_ascii_whitespace) {
                Vec::new()
            } else {
                serde_json::from_slice(&raw).map_err(|e| StoreError::Corrupt {
                    path: path.clone(),
                    reason: e.to_string(),
                })?
            };
            list.into_iter().map(|r| (r.id, r)).collect()
        } else {
            HashMap::new()
        };

        info!(path = %path.display(), count = records.len(), "record store opened");

        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `mutate` to a copy of the record set, persist the copy, and only
    /// then make it current.
    async fn commit<T, F>(&self, mutate: F) -> StoreResult<T>
    where
        F: FnOnce(&mut HashMap<RecordId, Record>) -> T + Send,
        T: Send,
    {
        let mut guard = self.records.lock().await;
        let mut next = guard.clone();
        let out = mutate(&mut next);

        let path = self.path.clone();
        let next = tokio::task::spawn_blocking(move || {
            write_records(&path, &next)?;
            Ok::<_, StoreError>(next)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("record flush aborted: {e}")))??;

        *guard = next;
        Ok(out)
    }
}

fn write_records(path: &Path, records: &HashMap<RecordId, Record>) -> StoreResult<()> {
    let mut list: Vec<&Record> = records.values().collect();
    list.sort_by_key(|r| (r.created_at, r.id));
    let json =
        serde_json::to_vec_pretty(&list).map_err(|e| StoreError::Serialization(e.to_string()))?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(&json)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;

    debug!(path = %path.display(), count = list.len(), "record store flushed");
    Ok(())
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn insert(&self, draft: RecordDraft) -> StoreResult<Record> {
        let record = Record::from_draft(RecordId::new(), draft);
        let stored = record.clone();
        self.commit(move |map| {
            map.insert(stored.id, stored);
        })
        .await?;
        Ok(record)
    }

    async fn get(&self, id: &RecordId) -> StoreResult<Option<Record>> {
        let map = self.records.lock().await;
        Ok(map.get(id).cloned())
    }

    async fn find(&self, filter: &RecordFilter) -> StoreResult<Vec<Record>> {
        let map = self.records.lock().await;
        Ok(map.values().filter(|r| filter.matches(r)).cloned().collect())
    }

    async fn delete(&self, id: &RecordId) -> StoreResult<bool> {
        if !self.records.lock().await.contains_key(id) {
            return Ok(false);
        }
        self.commit(|map| map.remove(id).is_some()).await
    }

    async fn delete_many(&self, filter: &RecordFilter) -> StoreResult<u64> {
        self.commit(|map| {
            let before = map.len();
            map.retain(|_, r| !filter.matches(r));
            (before - map.len()) as u64
        })
        .await
    }
}

impl std::fmt::Debug for FileRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = f.debug_struct("FileRecordStore");
        out.field("path", &self.path);
        if let Ok(records) = self.records.try_lock() {
            out.field("record_count", &records.len());
        }
        out.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use messboard_types::{EpochMillis, ImageRef, MenuCategory};

    fn draft(name: &str, expires_at: u64) -> RecordDraft {
        RecordDraft {
            name: name.into(),
            location: "Shivajinagar".into(),
            phone: "9111111111".into(),
            menu_type: Some(MenuCategory::Budget),
            menu_text: "Poha, chai".into(),
            price: Some("Rs 40".into()),
            image: Some(ImageRef::new("/blobs/x", "x")),
            date: "2024-03-15".into(),
            created_at: EpochMillis::new(1),
            expires_at: EpochMillis::new(expires_at),
        }
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");

        let inserted = {
            let store = FileRecordStore::open(&path).unwrap();
            store.insert(draft("a", 100)).await.unwrap()
        };

        let reopened = FileRecordStore::open(&path).unwrap();
        let got = reopened.get(&inserted.id).await.unwrap();
        assert_eq!(got, Some(inserted));
    }

    #[tokio::test]
    async fn delete_many_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");

        let store = FileRecordStore::open(&path).unwrap();
        store.insert(draft("old", 10)).await.unwrap();
        store.insert(draft("new", 1_000)).await.unwrap();
        let removed = store
            .delete_many(&RecordFilter::ExpiredAt(EpochMillis::new(10)))
            .await
            .unwrap();
        assert_eq!(removed, 1);

        let reopened = FileRecordStore::open(&path).unwrap();
        let all = reopened.find(&RecordFilter::All).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "new");
    }

    #[tokio::test]
    async fn delete_missing_does_not_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        let store = FileRecordStore::open(&path).unwrap();
        assert!(!store.delete(&RecordId::new()).await.unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        fs::write(&path, b"{not json").unwrap();
        let err = FileRecordStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn empty_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        fs::write(&path, b"\n").unwrap();
        let store = FileRecordStore::open(&path).unwrap();
        assert_eq!(store.records.blocking_lock().len(), 0);
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/records.json");
        let store = FileRecordStore::open(&path).unwrap();
        assert_eq!(store.path(), path.as_path());
        assert!(path.parent().unwrap().is_dir());
    }

    #[tokio::test]
    async fn failed_write_leaves_records_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        let store = FileRecordStore::open(&path).unwrap();
        let kept = store.insert(draft("kept", 100)).await.unwrap();

        // A directory at the target path makes the rename fail.
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        assert!(store.insert(draft("lost", 100)).await.is_err());
        let all = store.find(&RecordFilter::All).await.unwrap();
        assert_eq!(all, vec![kept.clone()]);

        assert!(store.delete(&kept.id).await.is_err());
        assert_eq!(store.get(&kept.id).await.unwrap(), Some(kept));
    }
}
