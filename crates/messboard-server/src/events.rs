//! Live lifecycle events over Server-Sent Events.

use std::convert::Infallible;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream};
use messboard_fabric::{EventFilter, Notification};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    /// Comma-separated kinds, e.g. `created,deleted`. Absent means all.
    pub kinds: Option<String>,
}

fn to_sse(notification: &Notification) -> Event {
    Event::default()
        .event(notification.kind().as_str())
        .id(notification.seq.to_string())
        .data(notification.event.payload().to_string())
}

/// Subscribe to the event channel and stream matching notifications.
///
/// A client that falls behind skips the events it missed and keeps
/// receiving from there. The stream ends when the server begins shutting
/// down.
pub async fn events_handler(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> ServerResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let filter = match query.kinds.as_deref() {
        Some(list) => EventFilter::parse(list).map_err(|e| ServerError::BadRequest(e.to_string()))?,
        None => EventFilter::default(),
    };
    debug!(?filter, "event stream subscriber connected");
    let receiver = state.events.subscribe(filter);

    let stream = stream::unfold(
        (receiver, state.shutdown_watch()),
        |(mut receiver, mut stop)| async move {
            loop {
                if *stop.borrow() {
                    return None;
                }
                tokio::select! {
                    received = receiver.recv() => match received {
                        Ok(notification) => {
                            let event = Ok::<_, Infallible>(to_sse(&notification));
                            return Some((event, (receiver, stop)));
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "event stream subscriber lagged");
                        }
                        Err(RecvError::Closed) => return None,
                    },
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            debug!("event stream closed for shutdown");
                            return None;
                        }
                    }
                }
            }
        },
    );

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
