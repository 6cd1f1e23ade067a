use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use messboard_engine::{DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ServerError, ServerResult};

pub const ENV_BIND: &str = "MESSBOARD_BIND";
pub const ENV_TTL_SECS: &str = "MESSBOARD_TTL_SECS";
pub const ENV_SWEEP_INTERVAL_SECS: &str = "MESSBOARD_SWEEP_INTERVAL_SECS";
pub const ENV_STORE_PATH: &str = "MESSBOARD_STORE_PATH";
pub const ENV_BLOB_DIR: &str = "MESSBOARD_BLOB_DIR";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Record lifetime in seconds.
    pub ttl_secs: u64,
    pub sweep_interval_secs: u64,
    /// Kick off an opportunistic sweep whenever records are listed.
    pub sweep_on_read: bool,
    pub max_upload_bytes: usize,
    /// Per-subscriber queue length for the live event stream.
    pub event_channel_capacity: usize,
    pub store: StoreConfig,
    pub blobs: BlobConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            ttl_secs: DEFAULT_TTL.as_secs(),
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL.as_secs(),
            sweep_on_read: false,
            max_upload_bytes: 10 * 1024 * 1024,
            event_channel_capacity: 256,
            store: StoreConfig::default(),
            blobs: BlobConfig::default(),
        }
    }
}

/// Where records are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    #[default]
    Memory,
    File { path: PathBuf },
}

/// Where uploaded images are kept.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum BlobConfig {
    Memory {
        #[serde(default = "default_public_base")]
        public_base: String,
    },
    Filesystem {
        dir: PathBuf,
        #[serde(default = "default_public_base")]
        public_base: String,
    },
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self::Memory {
            public_base: default_public_base(),
        }
    }
}

fn default_public_base() -> String {
    "/blobs".to_string()
}

impl ServerConfig {
    /// Load from an optional TOML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> ServerResult<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    ServerError::Config(format!("cannot read {}: {e}", path.display()))
                })?;
                let config = Self::from_toml(&raw)?;
                info!(path = %path.display(), "configuration file loaded");
                config
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> ServerResult<Self> {
        toml::from_str(raw).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Apply `MESSBOARD_*` overrides supplied by `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ServerResult<()> {
        if let Some(raw) = lookup(ENV_BIND) {
            self.bind_addr = parse_var(ENV_BIND, &raw)?;
        }
        if let Some(raw) = lookup(ENV_TTL_SECS) {
            self.ttl_secs = parse_var(ENV_TTL_SECS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_SWEEP_INTERVAL_SECS) {
            self.sweep_interval_secs = parse_var(ENV_SWEEP_INTERVAL_SECS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_STORE_PATH) {
            info!(key = ENV_STORE_PATH, "using file record store from environment");
            self.store = StoreConfig::File {
                path: PathBuf::from(raw),
            };
        }
        if let Some(raw) = lookup(ENV_BLOB_DIR) {
            let public_base = match &self.blobs {
                BlobConfig::Memory { public_base } | BlobConfig::Filesystem { public_base, .. } => {
                    public_base.clone()
                }
            };
            self.blobs = BlobConfig::Filesystem {
                dir: PathBuf::from(raw),
                public_base,
            };
        }
        Ok(())
    }

    pub fn validate(&self) -> ServerResult<()> {
        if self.ttl_secs == 0 {
            return Err(ServerError::Config("ttl_secs must be greater than zero".into()));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ServerError::Config(
                "sweep_interval_secs must be greater than zero".into(),
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(ServerError::Config("max_upload_bytes must be greater than zero".into()));
        }
        Ok(())
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

fn parse_var<T>(key: &str, raw: &str) -> ServerResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| ServerError::Config(format!("invalid {key} value {raw:?}: {e}")))
}
