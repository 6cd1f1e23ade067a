use messboard_types::{EpochMillis, Record};

/// Predicate over stored records, evaluated by the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordFilter {
    /// Every record.
    All,
    /// Records still active at the instant: `expires_at > now`.
    ActiveAt(EpochMillis),
    /// Records expired at the instant: `expires_at <= now`.
    ExpiredAt(EpochMillis),
}

impl RecordFilter {
    /// Returns `true` if the given record matches this filter.
    pub fn matches(&self, record: &Record) -> bool {
        match *self {
            Self::All => true,
            Self::ActiveAt(now) => record.is_active_at(now),
            Self::ExpiredAt(now) => record.is_expired_at(now),
        }
    }
}
