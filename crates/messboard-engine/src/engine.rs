use std::sync::Arc;
use std::time::Duration;

use messboard_fabric::{LifecycleEvent, NotificationChannel};
use messboard_store::{BlobStore, RecordFilter, RecordStore};
use messboard_types::{ActiveRecord, Clock, EpochMillis, Record, RecordDraft, RecordId};
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::policy::{compute_expiration, remaining, DEFAULT_TTL};
use crate::validation::RecordInput;

/// Configuration for the [`LifecycleEngine`].
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Lifetime of every posted record.
    pub ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { ttl: DEFAULT_TTL }
    }
}

/// Outcome of one sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Records removed from the store.
    pub deleted_count: u64,
    /// Images actually removed from the blob store. Images that were
    /// already gone are not counted.
    pub blobs_deleted: usize,
    /// Image deletions that failed and were skipped.
    pub blob_failures: usize,
}

/// Result of a best-effort image cleanup.
enum BlobCleanup {
    NoImage,
    Deleted,
    AlreadyGone,
    Failed,
}

/// Orchestrates the record lifecycle over injected collaborators.
///
/// The engine holds no locks of its own. Concurrent operations are arbitrated
/// by the record store, and sweeps are idempotent, so a record missed by one
/// sweep is caught by the next.
pub struct LifecycleEngine {
    store: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    channel: Arc<dyn NotificationChannel>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl LifecycleEngine {
    pub fn new(
        store: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        channel: Arc<dyn NotificationChannel>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        info!(ttl_secs = config.ttl.as_secs(), "lifecycle engine ready");
        Self {
            store,
            blobs,
            channel,
            clock,
            config,
        }
    }

    /// Current time according to the injected clock.
    pub fn now(&self) -> EpochMillis {
        self.clock.now()
    }

    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    /// Attach the remaining-time label for `now`.
    pub fn decorate(&self, record: Record, now: EpochMillis) -> ActiveRecord {
        let remaining = remaining(now, record.expires_at);
        ActiveRecord { record, remaining }
    }

    /// Validate, stamp, and persist a new record, then announce it.
    ///
    /// Store failures propagate without retry.
    pub async fn create(&self, input: RecordInput, now: EpochMillis) -> EngineResult<Record> {
        let valid = input.validate()?;

        let draft = RecordDraft {
            name: valid.name,
            location: valid.location,
            phone: valid.phone,
            menu_type: valid.menu_type,
            menu_text: valid.menu_text,
            price: valid.price,
            image: valid.image,
            date: valid.date.unwrap_or_else(|| now.date_label()),
            created_at: now,
            expires_at: compute_expiration(now, self.config.ttl),
        };

        let record = self.store.insert(draft).await?;
        info!(
            id = %record.id,
            expires_at = record.expires_at.as_millis(),
            "record created"
        );

        self.channel.publish(LifecycleEvent::Created(record.clone()));
        Ok(record)
    }

    /// Active records at `now`, newest first, each with its remaining time.
    ///
    /// A store failure yields an empty list: reads favour availability.
    pub async fn list_active(&self, now: EpochMillis) -> Vec<ActiveRecord> {
        let mut records = match self.store.find(&RecordFilter::ActiveAt(now)).await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "listing active records failed, returning none");
                return Vec::new();
            }
        };

        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        records
            .into_iter()
            .map(|record| self.decorate(record, now))
            .collect()
    }

    /// Delete one record and, best-effort, its image.
    pub async fn delete_one(&self, id: &RecordId) -> EngineResult<()> {
        let record = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;

        self.release_blob(&record).await;

        // A concurrent sweep may have removed it between get and delete.
        if !self.store.delete(id).await? {
            return Err(EngineError::NotFound(id.to_string()));
        }

        info!(id = %id, "record deleted");
        self.channel.publish(LifecycleEvent::Deleted { id: *id });
        Ok(())
    }

    /// Purge every record expired at `now`, plus their images.
    ///
    /// Image deletion is not transactional with record deletion: failures are
    /// logged and counted, and the records are removed regardless. A `swept`
    /// event is published only when something was removed.
    pub async fn sweep(&self, now: EpochMillis) -> EngineResult<SweepReport> {
        let filter = RecordFilter::ExpiredAt(now);
        let expired = self.store.find(&filter).await?;

        let mut report = SweepReport::default();
        for record in &expired {
            match self.release_blob(record).await {
                BlobCleanup::Deleted => report.blobs_deleted += 1,
                BlobCleanup::Failed => report.blob_failures += 1,
                BlobCleanup::NoImage | BlobCleanup::AlreadyGone => {}
            }
        }

        report.deleted_count = self.store.delete_many(&filter).await?;

        if report.deleted_count > 0 {
            info!(
                count = report.deleted_count,
                blobs = report.blobs_deleted,
                blob_failures = report.blob_failures,
                "swept expired records"
            );
            self.channel.publish(LifecycleEvent::Swept {
                deleted_count: report.deleted_count,
            });
        } else {
            debug!(now = now.as_millis(), "sweep found nothing to purge");
        }

        Ok(report)
    }

    async fn release_blob(&self, record: &Record) -> BlobCleanup {
        let Some(blob_id) = record.image_blob_id() else {
            return BlobCleanup::NoImage;
        };
        match self.blobs.delete(blob_id).await {
            Ok(true) => {
                debug!(id = %record.id, blob = blob_id, "image released");
                BlobCleanup::Deleted
            }
            Ok(false) => {
                debug!(id = %record.id, blob = blob_id, "image already gone");
                BlobCleanup::AlreadyGone
            }
            Err(e) => {
                warn!(id = %record.id, blob = blob_id, error = %e, "image delete failed, continuing");
                BlobCleanup::Failed
            }
        }
    }
}

impl std::fmt::Debug for LifecycleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
