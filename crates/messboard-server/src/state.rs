use std::sync::Arc;

use messboard_engine::{EngineConfig, LifecycleEngine};
use messboard_fabric::BroadcastChannel;
use messboard_store::{
    BlobStore, FileRecordStore, FsBlobStore, InMemoryBlobStore, InMemoryRecordStore, RecordStore,
};
use messboard_types::{Clock, SystemClock};
use tokio::sync::watch;
use tracing::info;

use crate::config::{BlobConfig, ServerConfig, StoreConfig};
use crate::error::{ServerError, ServerResult};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<LifecycleEngine>,
    pub blobs: Arc<dyn BlobStore>,
    pub events: Arc<BroadcastChannel>,
    pub config: Arc<ServerConfig>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl AppState {
    /// Open the configured backends and wire up the engine on the system
    /// clock.
    pub fn from_config(config: ServerConfig) -> ServerResult<Self> {
        let store = open_record_store(&config.store)?;
        let blobs = open_blobs(&config.blobs)?;
        Ok(Self::with_parts(config, store, blobs, Arc::new(SystemClock)))
    }

    /// Assemble state from explicit collaborators.
    pub fn with_parts(
        config: ServerConfig,
        store: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let events = Arc::new(BroadcastChannel::new(config.event_channel_capacity));
        let engine = Arc::new(LifecycleEngine::new(
            store,
            blobs.clone(),
            events.clone(),
            clock,
            EngineConfig { ttl: config.ttl() },
        ));
        Self {
            engine,
            blobs,
            events,
            config: Arc::new(config),
            shutdown: Arc::new(watch::channel(false).0),
        }
    }

    /// Tell long-lived responses (event streams) to finish.
    pub fn begin_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Flips to `true` once [`AppState::begin_shutdown`] is called.
    pub fn shutdown_watch(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}

/// Open the configured record backend.
pub fn open_record_store(config: &StoreConfig) -> ServerResult<Arc<dyn RecordStore>> {
    Ok(match config {
        StoreConfig::Memory => {
            info!("using in-memory record store");
            Arc::new(InMemoryRecordStore::new())
        }
        StoreConfig::File { path } => {
            info!(path = %path.display(), "using file record store");
            Arc::new(FileRecordStore::open(path).map_err(|e| ServerError::Config(e.to_string()))?)
        }
    })
}

/// Open the configured blob backend.
pub fn open_blobs(config: &BlobConfig) -> ServerResult<Arc<dyn BlobStore>> {
    Ok(match config {
        BlobConfig::Memory { public_base } => {
            info!("using in-memory blob store");
            Arc::new(InMemoryBlobStore::new(public_base.clone()))
        }
        BlobConfig::Filesystem { dir, public_base } => {
            info!(dir = %dir.display(), "using filesystem blob store");
            Arc::new(
                FsBlobStore::open(dir, public_base.clone())
                    .map_err(|e| ServerError::Config(e.to_string()))?,
            )
        }
    })
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("engine", &self.engine)
            .field("events", &self.events)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_default_config() {
        let state = AppState::from_config(ServerConfig::default()).unwrap();
        assert_eq!(state.engine.ttl(), ServerConfig::default().ttl());
        assert_eq!(state.events.subscriber_count(), 0);
    }

    #[test]
    fn builds_file_backends() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            store: StoreConfig::File {
                path: dir.path().join("data/records.json"),
            },
            blobs: BlobConfig::Filesystem {
                dir: dir.path().join("blobs"),
                public_base: "/blobs".into(),
            },
            ..Default::default()
        };
        AppState::from_config(config).unwrap();
        assert!(dir.path().join("blobs").is_dir());
    }

    #[test]
    fn corrupt_store_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(&path, "{not json").unwrap();
        let config = ServerConfig {
            store: StoreConfig::File { path },
            ..Default::default()
        };
        assert!(matches!(
            AppState::from_config(config),
            Err(ServerError::Config(_))
        ));
    }

    #[test]
    fn shutdown_is_seen_by_clones() {
        let state = AppState::from_config(ServerConfig::default()).unwrap();
        let watch = state.shutdown_watch();
        assert!(!state.is_shutting_down());

        state.clone().begin_shutdown();
        assert!(state.is_shutting_down());
        assert!(*watch.borrow());
    }
}
