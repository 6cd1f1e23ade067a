//! Record and image storage for Messboard.
//!
//! The lifecycle engine treats both stores as opaque collaborators reached
//! through async traits:
//!
//! - [`RecordStore`] -- insert / get / find-by-filter / delete-by-id /
//!   delete-by-filter over posted [`Record`](messboard_types::Record)s
//! - [`BlobStore`] -- store / fetch / delete of uploaded menu images
//!
//! # Backends
//!
//! - [`InMemoryRecordStore`] -- `HashMap` behind a `RwLock`, for tests and
//!   single-process deployments
//! - [`FileRecordStore`] -- in-memory map mirrored to a JSON file, rewritten
//!   atomically after every mutation
//! - [`InMemoryBlobStore`] / [`FsBlobStore`] -- image bytes in memory or in a
//!   directory on disk
//!
//! # Design Rules
//!
//! 1. The store assigns record identifiers; callers never choose them.
//! 2. Records are never updated in place.
//! 3. `delete_many` is atomic per call: the filter is evaluated and matching
//!    records removed under one write lock.
//! 4. Backend failures are reported, never swallowed. Deciding whether a
//!    failure is fatal is the caller's business.

pub mod blob;
pub mod error;
pub mod file;
pub mod filter;
pub mod memory;
pub mod traits;

pub use blob::{BlobRef, FsBlobStore, InMemoryBlobStore, StoredBlob};
pub use error::{BlobError, BlobResult, StoreError, StoreResult};
pub use file::FileRecordStore;
pub use filter::RecordFilter;
pub use memory::InMemoryRecordStore;
pub use traits::{BlobStore, RecordStore};
