//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! WebSocket transport implementation.
//!
//! Hub URLs are usually given with an `http`/`https` scheme; they are mapped
//! to `ws`/`wss` before connecting. Text frames carry text-format protocols
//! (JSON) and binary frames carry everything else; both are accepted on
//! receive.
//!
//! # Examples
//!
//! ```rust,no_run
//! use hubwire::transport::{Transport, WebSocketConfig, WebSocketTransport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = WebSocketTransport::new(WebSocketConfig::default());
//! let channel = transport.open("http://localhost:5000/chathub", &[]).await?;
//! # Ok(())
//! # }
//! ```

use crate::transport::{
    Transport, TransportChannel, TransportError, TransportId, TransportMetadata,
    TransportReceiver, TransportSender,
};
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig as TungsteniteConfig;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async_with_config};
use tracing::{debug, info};
use url::Url;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

static NEXT_WEBSOCKET_ID: AtomicU64 = AtomicU64::new(1);

/// Configuration for the WebSocket transport.
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// Maximum size of a single WebSocket frame (default: 16 MB)
    pub max_frame_size: usize,

    /// Maximum size of a complete message (default: 64 MB)
    pub max_message_size: usize,

    /// Send valid UTF-8 payloads as text frames (default: true)
    ///
    /// The JSON hub protocol is a text protocol and hub servers expect text
    /// frames for it.
    pub prefer_text_frames: bool,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            max_frame_size: 16 * 1024 * 1024,
            max_message_size: 64 * 1024 * 1024,
            prefer_text_frames: true,
        }
    }
}

/// WebSocket transport.
#[derive(Debug, Clone, Default)]
pub struct WebSocketTransport {
    config: WebSocketConfig,
}

impl WebSocketTransport {
    /// Creates a WebSocket transport with the given configuration.
    pub fn new(config: WebSocketConfig) -> Self {
        Self { config }
    }

    /// Get the WebSocket configuration.
    pub fn config(&self) -> &WebSocketConfig {
        &self.config
    }

    /// Maps an `http(s)` hub URL to its `ws(s)` equivalent.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidConfiguration`] for unparsable URLs
    /// or unsupported schemes.
    pub fn websocket_url(url: &str) -> Result<Url, TransportError> {
        let mut parsed = Url::parse(url).map_err(|e| {
            TransportError::invalid_configuration(format!("invalid hub url '{url}': {e}"))
        })?;
        let scheme = match parsed.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(TransportError::invalid_configuration(format!(
                    "unsupported url scheme '{other}'"
                )));
            }
        };
        parsed.set_scheme(scheme).map_err(|_| {
            TransportError::invalid_configuration(format!("cannot use scheme '{scheme}'"))
        })?;
        Ok(parsed)
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn open(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<TransportChannel, TransportError> {
        let ws_url = Self::websocket_url(url)?;
        let mut request = ws_url.as_str().into_client_request()?;
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                TransportError::invalid_configuration(format!("invalid header name: {e}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                TransportError::invalid_configuration(format!("invalid header value: {e}"))
            })?;
            request.headers_mut().insert(name, value);
        }

        let mut ws_config = TungsteniteConfig::default();
        ws_config.max_frame_size = Some(self.config.max_frame_size);
        ws_config.max_message_size = Some(self.config.max_message_size);

        let (stream, _response) = connect_async_with_config(request, Some(ws_config), false)
            .await
            .map_err(|e| TransportError::connection_failed(ws_url.as_str(), e.to_string()))?;

        let peer_addr = match stream.get_ref() {
            MaybeTlsStream::Plain(tcp) => tcp.peer_addr().ok(),
            _ => None,
        };
        let id = TransportId::new(NEXT_WEBSOCKET_ID.fetch_add(1, Ordering::Relaxed));
        let mut metadata = TransportMetadata::new(id, "websocket");
        if let Some(addr) = peer_addr {
            metadata = metadata.with_peer_addr(addr);
        }

        info!(%id, url = %ws_url, "opened websocket transport");

        let (sink, stream) = stream.split();
        Ok(TransportChannel::new(
            Box::new(WebSocketSender {
                sink,
                prefer_text: self.config.prefer_text_frames,
                closed: false,
            }),
            Box::new(WebSocketReceiver { stream }),
            metadata,
        ))
    }

    fn name(&self) -> &str {
        "websocket"
    }
}

struct WebSocketSender {
    sink: SplitSink<WsStream, Message>,
    prefer_text: bool,
    closed: bool,
}

struct WebSocketReceiver {
    stream: SplitStream<WsStream>,
}

#[async_trait]
impl TransportSender for WebSocketSender {
    async fn send(&mut self, bytes: Vec<u8>) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let message = if self.prefer_text {
            match String::from_utf8(bytes) {
                Ok(text) => Message::Text(text),
                Err(e) => Message::Binary(e.into_bytes()),
            }
        } else {
            Message::Binary(bytes)
        };
        self.sink.send(message).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.sink.close().await?;
        Ok(())
    }
}

#[async_trait]
impl TransportReceiver for WebSocketReceiver {
    async fn recv(&mut self) -> Option<Result<Vec<u8>, TransportError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.into_bytes())),
                Ok(Message::Binary(data)) => return Some(Ok(data)),
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => continue,
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "websocket closed by peer");
                    return None;
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}
