//! Live update stream (SSE)

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use tokio_stream::{wrappers::errors::BroadcastStreamRecvError, wrappers::BroadcastStream, Stream, StreamExt};

use super::AuthenticatedUser;

/// Subscribe to the change-event stream.
///
/// Emits one `change` event per committed write. A `lagged` event signals
/// dropped notifications; the client should re-list to resync.
#[utoipa::path(
    get,
    path = "/events",
    tag = "events",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "SSE stream of change events"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn subscribe(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.services.events.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|item| match item {
        Ok(event) => Event::default()
            .event("change")
            .json_data(&event)
            .ok()
            .map(Ok),
        Err(BroadcastStreamRecvError::Lagged(missed)) => {
            Some(Ok(Event::default().event("lagged").data(missed.to_string())))
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
