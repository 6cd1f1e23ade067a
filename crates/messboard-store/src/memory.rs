use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use messboard_types::{Record, RecordDraft, RecordId};

use crate::error::{StoreError, StoreResult};
use crate::filter::RecordFilter;
use crate::traits::RecordStore;

/// In-memory, HashMap-based record store.
///
/// Intended for tests and single-process deployments. Records live behind a
/// `RwLock`; every call takes the lock once, so `delete_many` is atomic.
/// [`set_available`](Self::set_available) lets tests simulate an outage.
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<RecordId, Record>>,
    available: AtomicBool,
}

impl InMemoryRecordStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Number of records currently stored, expired or not.
    pub fn len(&self) -> usize {
        self.records.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.read().expect("lock poisoned").is_empty()
    }

    /// Toggle simulated availability. While unavailable every call fails
    /// with [`StoreError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store marked unavailable".into()))
        }
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert(&self, draft: RecordDraft) -> StoreResult<Record> {
        self.check_available()?;
        let record = Record::from_draft(RecordId::new(), draft);
        let mut map = self.records.write().expect("lock poisoned");
        map.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: &RecordId) -> StoreResult<Option<Record>> {
        self.check_available()?;
        let map = self.records.read().expect("lock poisoned");
        Ok(map.get(id).cloned())
    }

    async fn find(&self, filter: &RecordFilter) -> StoreResult<Vec<Record>> {
        self.check_available()?;
        let map = self.records.read().expect("lock poisoned");
        Ok(map.values().filter(|r| filter.matches(r)).cloned().collect())
    }

    async fn delete(&self, id: &RecordId) -> StoreResult<bool> {
        self.check_available()?;
        let mut map = self.records.write().expect("lock poisoned");
        Ok(map.remove(id).is_some())
    }

    async fn delete_many(&self, filter: &RecordFilter) -> StoreResult<u64> {
        self.check_available()?;
        let mut map = self.records.write().expect("lock poisoned");
        let before = map.len();
        map.retain(|_, r| !filter.matches(r));
        Ok((before - map.len()) as u64)
    }
}

impl std::fmt::Debug for InMemoryRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRecordStore")
            .field("record_count", &self.len())
            .field("available", &self.available.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use messboard_types::EpochMillis;

    fn draft(name: &str, created_at: u64, expires_at: u64) -> RecordDraft {
        RecordDraft {
            name: name.into(),
            location: "Kothrud".into(),
            phone: "9000000000".into(),
            menu_type: None,
            menu_text: "Thali".into(),
            price: None,
            image: None,
            date: "2024-03-15".into(),
            created_at: EpochMillis::new(created_at),
            expires_at: EpochMillis::new(expires_at),
        }
    }

    #[tokio::test]
    async fn insert_assigns_distinct_ids() {
        let store = InMemoryRecordStore::new();
        let a = store.insert(draft("a", 0, 10)).await.unwrap();
        let b = store.insert(draft("b", 0, 10)).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn get_returns_inserted() {
        let store = InMemoryRecordStore::new();
        let rec = store.insert(draft("a", 0, 10)).await.unwrap();
        assert_eq!(store.get(&rec.id).await.unwrap(), Some(rec));
        assert_eq!(store.get(&RecordId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn find_applies_filter() {
        let store = InMemoryRecordStore::new();
        store.insert(draft("old", 0, 100)).await.unwrap();
        store.insert(draft("new", 50, 200)).await.unwrap();

        let now = EpochMillis::new(100);
        let active = store.find(&RecordFilter::ActiveAt(now)).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "new");

        let expired = store.find(&RecordFilter::ExpiredAt(now)).await.unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].name, "old");
    }

    #[tokio::test]
    async fn delete_reports_existence() {
        let store = InMemoryRecordStore::new();
        let rec = store.insert(draft("a", 0, 10)).await.unwrap();
        assert!(store.delete(&rec.id).await.unwrap());
        assert!(!store.delete(&rec.id).await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn delete_many_removes_only_matching() {
        let store = InMemoryRecordStore::new();
        store.insert(draft("a", 0, 10)).await.unwrap();
        store.insert(draft("b", 0, 20)).await.unwrap();
        store.insert(draft("c", 0, 30)).await.unwrap();

        let removed = store
            .delete_many(&RecordFilter::ExpiredAt(EpochMillis::new(20)))
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.count(&RecordFilter::All).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_call() {
        let store = InMemoryRecordStore::new();
        store.set_available(false);
        let err = store.insert(draft("a", 0, 10)).await.unwrap_err();
        assert!(err.is_unavailable());
        assert!(store.find(&RecordFilter::All).await.is_err());

        store.set_available(true);
        assert!(store.find(&RecordFilter::All).await.unwrap().is_empty());
    }
}
