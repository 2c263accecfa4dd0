// src/handlers/events.rs
//
// Feed SSE do canal de notificações. O painel escuta para saber que algo
// mudou e reler o estado; o payload é só uma dica, sem garantia de
// entrega (assinante atrasado perde eventos e segue em frente).

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use tokio::sync::broadcast;

use crate::config::AppState;

// GET /api/events
pub async fn change_feed(
    State(app_state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = app_state.events.subscribe();
    let stream = futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(change) => {
                    let event = Event::default().event("change").json_data(&change).ok()?;
                    return Some((Ok(event), rx));
                }
                // Atrasou: descarta o que perdeu e continua escutando.
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
