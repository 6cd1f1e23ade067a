//! Expiring-record lifecycle engine.
//!
//! Every posted record lives for a fixed time-to-live and is then gone. The
//! engine owns the rules:
//!
//! - **Expiry policy** ([`policy`]) -- `expires_at = created_at + ttl`, the
//!   strict `now < expires_at` activity predicate, and the remaining-time
//!   label shown to clients.
//! - **Lifecycle operations** ([`LifecycleEngine`]) -- create, list-active,
//!   delete-one, and sweep, each announcing its effect on a
//!   [`NotificationChannel`](messboard_fabric::NotificationChannel).
//! - **Background sweeping** ([`Sweeper`]) -- a periodic task purging expired
//!   records and their images.
//!
//! Lazy filtering on read and eager sweeping enforce the same predicate
//! independently: an expired record is hidden from `list_active` whether or
//! not a sweep has run yet.
//!
//! # Record States
//!
//! ```text
//! Active --(time passes)--> Expired --(delete_one | sweep)--> Purged
//! ```
//!
//! There is no edit and no reactivation.

pub mod engine;
pub mod error;
pub mod policy;
pub mod sweeper;
pub mod validation;

pub use engine::{EngineConfig, LifecycleEngine, SweepReport};
pub use error::{EngineError, EngineResult};
pub use policy::{
    compute_expiration, is_active, remaining, DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL, EXPIRED_LABEL,
};
pub use sweeper::{Sweeper, SweeperHandle};
pub use validation::{RecordInput, ValidInput};
