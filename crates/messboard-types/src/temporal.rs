use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Wall-clock instant in milliseconds since the UNIX epoch.
///
/// Serialized as a bare integer so persisted records carry
/// `createdAt`/`expiresAt` as plain numbers.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpochMillis(u64);

impl EpochMillis {
    pub const fn new(ms: u64) -> Self {
        Self(ms)
    }

    /// The epoch itself.
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self(ms)
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Returns this instant shifted forward by `duration`, saturating at `u64::MAX`.
    pub fn saturating_add(self, duration: Duration) -> Self {
        let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(ms))
    }

    /// Returns this instant shifted backward by `duration`, saturating at zero.
    pub fn saturating_sub(self, duration: Duration) -> Self {
        let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_sub(ms))
    }

    /// Milliseconds from `self` until `later`, or zero if `later` is not after `self`.
    pub fn millis_until(self, later: Self) -> u64 {
        later.0.saturating_sub(self.0)
    }

    /// Strictly-before comparison. `a.is_before(a)` is `false`.
    pub fn is_before(self, other: Self) -> bool {
        self.0 < other.0
    }

    /// Calendar day (UTC) this instant falls on, as `YYYY-MM-DD`.
    pub fn date_label(self) -> String {
        i64::try_from(self.0)
            .ok()
            .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }
}

impl From<u64> for EpochMillis {
    fn from(ms: u64) -> Self {
        Self(ms)
    }
}

impl fmt::Debug for EpochMillis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EpochMillis({})", self.0)
    }
}

impl fmt::Display for EpochMillis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Source of wall-clock time.
///
/// The lifecycle engine never reads the system clock directly, so expiry can
/// be exercised in tests without real time passing.
pub trait Clock: Send + Sync {
    fn now(&self) -> EpochMillis;
}

/// Clock backed by [`SystemTime`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> EpochMillis {
        EpochMillis::now()
    }
}

/// Manually driven clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    ms: AtomicU64,
}

impl ManualClock {
    pub fn new(start: EpochMillis) -> Self {
        Self {
            ms: AtomicU64::new(start.as_millis()),
        }
    }

    pub fn set(&self, at: EpochMillis) {
        self.ms.store(at.as_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        let ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> EpochMillis {
        EpochMillis(self.ms.load(Ordering::SeqCst))
    }
}
