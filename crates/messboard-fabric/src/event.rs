use std::fmt;
use std::str::FromStr;

use messboard_types::{Record, RecordId};
use serde::Serialize;

/// Classification of lifecycle events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A record was posted.
    Created,
    /// A single record was removed on request.
    Deleted,
    /// A sweep purged one or more expired records.
    Swept,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [Self::Created, Self::Deleted, Self::Swept];

    /// Name used on the wire (SSE `event:` field, filter query strings).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Deleted => "deleted",
            Self::Swept => "swept",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown event kind {0:?}, expected one of: created, deleted, swept")]
pub struct UnknownEventKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownEventKind(s.to_string()))
    }
}

/// A change to the record set.
///
/// Serializes to the event payload only (the kind travels separately):
/// `created` carries the full record, `deleted` carries `{id}`, `swept`
/// carries `{deletedCount}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LifecycleEvent {
    Created(Record),
    Deleted {
        id: RecordId,
    },
    Swept {
        #[serde(rename = "deletedCount")]
        deleted_count: u64,
    },
}

impl LifecycleEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Created(_) => EventKind::Created,
            Self::Deleted { .. } => EventKind::Deleted,
            Self::Swept { .. } => EventKind::Swept,
        }
    }

    /// Payload as a JSON value.
    pub fn payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// A published event stamped with its position in the channel's sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    /// Monotonically increasing, starting at 1, per channel.
    pub seq: u64,
    pub event: LifecycleEvent,
}

impl Notification {
    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }
}
