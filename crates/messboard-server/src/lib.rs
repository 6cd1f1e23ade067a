//! HTTP server for Messboard.
//!
//! Exposes the lifecycle engine over a JSON API, stores uploaded images,
//! streams lifecycle events to live clients as Server-Sent Events, and runs
//! the background sweeper for as long as the server is up.

pub mod config;
pub mod error;
pub mod events;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::{BlobConfig, ServerConfig, StoreConfig};
pub use error::{ServerError, ServerResult};
pub use router::build_router;
pub use server::{shutdown_signal, MessboardServer};
pub use state::{open_blobs, open_record_store, AppState};
