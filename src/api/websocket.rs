//! WebSocket handler for the live heat-event feed
//!
//! On connect the client is subscribed to the fanout; the welcome frame
//! arrives first, then every published event as it is produced. The
//! connection stays open until the client disconnects, at which point the
//! subscriber is deregistered promptly so the fanout stops writing to it.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{stream::StreamExt, SinkExt};
use tracing::{debug, error, info};

use crate::api::state::ApiState;

/// WebSocket upgrade handler
///
/// GET /api/v1/stream
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<ApiState>) -> Response {
    ws.on_upgrade(|socket| handle_websocket(socket, state))
}

async fn handle_websocket(socket: WebSocket, state: ApiState) {
    let subscription = match state.fanout.subscribe().await {
        Ok(subscription) => subscription,
        Err(e) => {
            error!("failed to subscribe websocket client: {e}");
            return;
        }
    };

    let subscriber_id = subscription.id;
    let mut frames = subscription.rx;
    info!("websocket client connected as subscriber {subscriber_id}");

    let (mut sender, mut receiver) = socket.split();

    // Forward fanout frames to the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            if sender.send(Message::Text(frame)).await.is_err() {
                debug!("websocket send failed, client disconnected");
                break;
            }
        }
    });

    // Watch for the client closing its half; the feed is one-way, so
    // everything else is ignored.
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
        }
        _ = (&mut recv_task) => {
            send_task.abort();
        }
    }

    if let Err(e) = state.fanout.unsubscribe(subscriber_id).await {
        error!("failed to unsubscribe websocket client {subscriber_id}: {e}");
    }

    info!("websocket client {subscriber_id} disconnected");
}
