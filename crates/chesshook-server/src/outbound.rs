use async_trait::async_trait;
use axum::extract::ws::{Message as WsMessage, WebSocket};
use chesshook_core::TransportError;
use futures::stream::SplitSink;
use futures::SinkExt;
use tokio::sync::Mutex;

/// Write half of one client connection.
///
/// Both the session's reply path and the broadcaster write through the same
/// handle, so implementations must serialize writes.
#[async_trait]
pub trait Outbound: Send + Sync {
    async fn send_line(&self, line: &str) -> Result<(), TransportError>;

    async fn close(&self);
}

/// WebSocket sink guarded by a per-connection mutex.
pub struct WsOutbound {
    sink: Mutex<SplitSink<WebSocket, WsMessage>>,
}

impl WsOutbound {
    pub fn new(sink: SplitSink<WebSocket, WsMessage>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }
}

#[async_trait]
impl Outbound for WsOutbound {
    async fn send_line(&self, line: &str) -> Result<(), TransportError> {
        let mut sink = self.sink.lock().await;
        sink.send(WsMessage::Text(line.into()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn close(&self) {
        let mut sink = self.sink.lock().await;
        if let Err(e) = sink.close().await {
            tracing::trace!(error = %e, "Close on already closed socket");
        }
    }
}
