//! Websocket adapter over tokio-tungstenite

use ama_core::{EventStream, EventTransport, RoomId, SyncError};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace};

use crate::error::{ApiError, ApiResult};

/// Opens `GET {ws_url}/subscribe/{room_id}`
#[derive(Debug, Clone)]
pub struct WsTransport {
    base: Url,
}

impl WsTransport {
    pub fn new(ws_url: &str) -> ApiResult<Self> {
        let base = Url::parse(ws_url).map_err(|e| ApiError::Url(format!("{ws_url}: {e}")))?;
        if !matches!(base.scheme(), "ws" | "wss") {
            return Err(ApiError::Url(format!("{ws_url}: expected ws:// or wss://")));
        }
        Ok(Self { base })
    }

    /// Subscription URL of a room
    pub fn subscribe_url(&self, room_id: &RoomId) -> ApiResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Url(self.base.to_string()))?
            .pop_if_empty()
            .extend(["subscribe", room_id.as_str()]);
        Ok(url)
    }
}

#[async_trait]
impl EventTransport for WsTransport {
    async fn connect(&self, room_id: &RoomId) -> Result<Box<dyn EventStream>, SyncError> {
        let url = self.subscribe_url(room_id)?;
        debug!(url = %url, "Connecting to room stream");

        let (socket, _response) = connect_async(url.as_str())
            .await
            .map_err(ApiError::from)?;
        info!(room_id = %room_id, "Room stream connected");

        Ok(Box::new(WsEventStream { socket }))
    }
}

/// Text frames of one websocket connection
pub struct WsEventStream {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl EventStream for WsEventStream {
    async fn next_frame(&mut self) -> Option<Result<String, SyncError>> {
        while let Some(frame) = self.socket.next().await {
            match frame {
                Ok(WsMessage::Text(text)) => return Some(Ok(text)),
                Ok(WsMessage::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => trace!("Skipping non-UTF-8 binary frame"),
                },
                Ok(WsMessage::Close(frame)) => {
                    debug!(?frame, "Server closed room stream");
                    return None;
                }
                // Pings are answered by tungstenite itself
                Ok(_) => {}
                Err(e) => return Some(Err(SyncError::from(ApiError::from(e)))),
            }
        }
        None
    }

    async fn close(&mut self) {
        if let Err(e) = self.socket.close(None).await {
            debug!(error = %e, "Error closing room stream");
        }
    }
}
