use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use super::AppState;

/// Push a notification whenever a transcript is created or appended to.
/// Clients re-query the live endpoints on each event.
pub async fn transcript_changes(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.watcher.subscribe();
    let stream = BroadcastStream::new(rx).map(|result| {
        let event = match result {
            Ok(change) => Event::default()
                .event(change.name())
                .data(serde_json::to_string(&change).unwrap_or_default()),
            Err(_) => Event::default().comment("missed event"),
        };
        Ok(event)
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
