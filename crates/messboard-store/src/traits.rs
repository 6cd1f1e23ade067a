use async_trait::async_trait;
use bytes::Bytes;
use messboard_types::{Record, RecordDraft, RecordId};

use crate::blob::{BlobRef, StoredBlob};
use crate::error::{BlobResult, StoreResult};
use crate::filter::RecordFilter;

/// Durable storage for posted records.
///
/// All implementations must satisfy these invariants:
/// - `insert` assigns a fresh, globally unique [`RecordId`].
/// - Stored records are never modified; there is no update operation.
/// - `delete_many` removes exactly the records matching the filter at the
///   moment of the call, atomically with respect to other store calls.
/// - Backend failures are returned, never silently ignored.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a draft and return the stored record with its new id.
    async fn insert(&self, draft: RecordDraft) -> StoreResult<Record>;

    /// Look up one record. Returns `Ok(None)` if it does not exist.
    async fn get(&self, id: &RecordId) -> StoreResult<Option<Record>>;

    /// All records matching the filter, in no particular order.
    async fn find(&self, filter: &RecordFilter) -> StoreResult<Vec<Record>>;

    /// Delete one record by id. Returns `true` if the record existed.
    async fn delete(&self, id: &RecordId) -> StoreResult<bool>;

    /// Delete every record matching the filter and return how many went.
    async fn delete_many(&self, filter: &RecordFilter) -> StoreResult<u64>;

    /// Number of records matching the filter.
    ///
    /// Default implementation counts the result of `find()`.
    async fn count(&self, filter: &RecordFilter) -> StoreResult<u64> {
        Ok(self.find(filter).await?.len() as u64)
    }
}

/// Storage for uploaded menu images.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store the bytes and return a display URL plus the id needed to delete them.
    async fn store(&self, data: Bytes, content_type: Option<&str>) -> BlobResult<BlobRef>;

    /// Fetch a stored blob. Returns `Ok(None)` if it does not exist.
    async fn fetch(&self, id: &str) -> BlobResult<Option<StoredBlob>>;

    /// Delete a blob. Returns `true` if the blob existed.
    async fn delete(&self, id: &str) -> BlobResult<bool>;
}
