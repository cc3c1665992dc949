//! WebSocket handler for live probe updates

use async_trait::async_trait;
use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, stream::SplitSink, stream::StreamExt};
use tracing::{debug, info};

use crate::api::state::ApiState;
use crate::subscription::{DeliveryError, MessageSink};

/// Write half of an upgraded socket, registered with the broadcaster
pub struct WebSocketSink(SplitSink<WebSocket, Message>);

#[async_trait]
impl MessageSink for WebSocketSink {
    async fn send(&mut self, message: &str) -> Result<(), DeliveryError> {
        self.0
            .send(Message::Text(message.to_owned()))
            .await
            .map_err(|e| DeliveryError::Write(e.to_string()))
    }

    async fn close(&mut self) {
        let _ = self.0.send(Message::Close(None)).await;
        let _ = self.0.close().await;
    }
}

/// WebSocket upgrade handler
///
/// GET /ws
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<ApiState>) -> Response {
    ws.on_upgrade(|socket| handle_websocket(socket, state))
}

/// Handle one viewer connection
///
/// The viewer receives the current snapshot and then every live event. Any
/// data or close frame from the client ends the subscription.
async fn handle_websocket(socket: WebSocket, state: ApiState) {
    let (sender, mut receiver) = socket.split();

    let handle = match state.monitor.subscribe(Box::new(WebSocketSink(sender))).await {
        Ok(handle) => handle,
        Err(e) => {
            debug!("WebSocket client dropped during snapshot: {e}");
            return;
        }
    };
    info!("WebSocket client connected as {}", handle.id());

    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            Ok(Message::Close(_)) => {
                debug!("{} sent close frame", handle.id());
                break;
            }
            Ok(_) => {
                debug!("{} sent a data frame, ending subscription", handle.id());
                break;
            }
            Err(e) => {
                debug!("{} read error: {e}", handle.id());
                break;
            }
        }
    }

    let id = handle.id();
    state.monitor.unsubscribe(handle).await;
    info!("WebSocket client {id} disconnected");
}
