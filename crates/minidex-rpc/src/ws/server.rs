use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures_util::stream::{SplitSink, SplitStream, StreamExt};
use futures_util::SinkExt;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use super::events::{EventBroadcaster, Subscription, WsEvent};

/// Router serving the `/ws` event feed
pub fn create_ws_router(broadcaster: Arc<EventBroadcaster>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(broadcaster)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(broadcaster): State<Arc<EventBroadcaster>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, broadcaster))
}

async fn handle_socket(socket: WebSocket, broadcaster: Arc<EventBroadcaster>) {
    let (sink, stream) = socket.split();
    let events = broadcaster.subscribe();
    let (filter_tx, filter_rx) = watch::channel(Subscription::default());

    info!("WebSocket client connected");

    let mut forward = tokio::spawn(forward_events(sink, events, filter_rx));
    let mut listen = tokio::spawn(read_filters(stream, filter_tx));

    // Whichever side finishes first ends the session.
    tokio::select! {
        _ = &mut forward => listen.abort(),
        _ = &mut listen => forward.abort(),
    }

    info!("WebSocket client disconnected");
}

/// Push broadcast events that pass the client's current filter
async fn forward_events(
    mut sink: SplitSink<WebSocket, Message>,
    mut events: broadcast::Receiver<WsEvent>,
    filter: watch::Receiver<Subscription>,
) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("WebSocket client lagged, {} events dropped", skipped);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        if !filter.borrow().accepts(&event) {
            continue;
        }

        let text = match serde_json::to_string(&event) {
            Ok(text) => text,
            Err(e) => {
                warn!("Skipping unserializable event: {}", e);
                continue;
            }
        };
        if sink.send(Message::Text(text.into())).await.is_err() {
            break;
        }
    }
}

/// Apply filter frames until the client goes away
async fn read_filters(mut stream: SplitStream<WebSocket>, filter: watch::Sender<Subscription>) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<Subscription>(text.as_str()) {
                Ok(subscription) => {
                    debug!("WebSocket filter set to {:?}", subscription.emitter);
                    filter.send_replace(subscription);
                }
                Err(e) => debug!("Ignoring malformed filter frame: {}", e),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket read error: {}", e);
                break;
            }
        }
    }
}
