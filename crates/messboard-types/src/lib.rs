//! Foundation types for Messboard.
//!
//! This crate provides the data model shared by every other Messboard crate:
//! the posted menu [`Record`], its identifier, and the millisecond timestamps
//! that drive expiry.
//!
//! # Key Types
//!
//! - [`Record`]: A posted menu entry with immutable creation/expiration instants
//! - [`RecordDraft`]: A record before the store has assigned its identifier
//! - [`RecordId`]: UUID v7 record identifier
//! - [`EpochMillis`]: Milliseconds since the UNIX epoch
//! - [`Clock`]: Injectable time source ([`SystemClock`], [`ManualClock`])
//! - [`ActiveRecord`]: A record decorated with its [`Remaining`] time

pub mod error;
pub mod identity;
pub mod record;
pub mod temporal;

pub use error::TypeError;
pub use identity::RecordId;
pub use record::{ActiveRecord, ImageRef, MenuCategory, Record, RecordDraft, Remaining};
pub use temporal::{Clock, EpochMillis, ManualClock, SystemClock};
