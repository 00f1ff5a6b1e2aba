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

//! Handshake protocol for hub protocol selection.
//!
//! # Handshake Flow
//!
//! 1. Client sends `{"protocol":"json","version":1}` followed by `0x1E`
//! 2. Server answers `{}` (accepted) or `{"error":"..."}` (rejected)
//! 3. Bytes after the answer belong to the hub protocol
//!
//! The handshake is always JSON regardless of the negotiated protocol.

use crate::protocol::framing::{split_record, write_record};
use crate::protocol::{HubProtocol, NegotiationError, ProtocolError};
use crate::transport::{TransportReceiver, TransportSender};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default time to wait for the handshake response.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(15);

/// Handshake request sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeRequest {
    /// Protocol name (e.g., `"json"`)
    pub protocol: String,
    /// Protocol version
    pub version: u32,
}

impl HandshakeRequest {
    /// Creates a request for the given protocol.
    pub fn for_protocol(protocol: &dyn HubProtocol) -> Self {
        Self {
            protocol: protocol.name().to_string(),
            version: protocol.version(),
        }
    }

    /// Encodes the request as a delimited frame.
    pub fn to_frame(&self) -> Result<Vec<u8>, ProtocolError> {
        let payload =
            serde_json::to_vec(self).map_err(|source| ProtocolError::Encode { source })?;
        let mut frame = Vec::with_capacity(payload.len() + 1);
        write_record(&mut frame, &payload);
        Ok(frame)
    }
}

/// Handshake response sent by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeResponse {
    /// Rejection reason; absent when the handshake succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HandshakeResponse {
    /// Parses the response from the front of `buffer`.
    ///
    /// Returns `None` while the response is incomplete, otherwise the
    /// response and the bytes following it.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Framing`] if the response is not a JSON
    /// object.
    pub fn parse(buffer: &[u8]) -> Result<Option<(Self, &[u8])>, ProtocolError> {
        let Some((record, rest)) = split_record(buffer)? else {
            return Ok(None);
        };
        let response = serde_json::from_slice(record)
            .map_err(|e| ProtocolError::framing(format!("invalid handshake response: {e}")))?;
        Ok(Some((response, rest)))
    }
}

/// State of a [`HandshakeNegotiator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Nothing sent yet.
    Idle,
    /// Request sent, waiting for the response.
    AwaitingAck,
    /// Server accepted the protocol.
    Complete,
    /// Handshake failed; the connection attempt is over.
    Failed,
}

/// Drives the handshake over a freshly opened transport channel.
///
/// # Examples
///
/// ```rust
/// use hubwire::protocol::{HandshakeNegotiator, HandshakeState, JsonHubProtocol};
/// use hubwire::transport::{MemoryTransport, Transport};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (transport, mut server) = MemoryTransport::new();
/// let mut channel = transport.open("memory://hub", &[]).await?;
/// let peer = server.accept().await.expect("peer");
/// peer.send(b"{}\x1e{\"type\":6}\x1e".to_vec());
///
/// let mut negotiator = HandshakeNegotiator::new(&JsonHubProtocol::new(), Duration::from_secs(15));
/// let leftover = negotiator
///     .negotiate(channel.sender.as_mut(), channel.receiver.as_mut())
///     .await?;
/// assert_eq!(negotiator.state(), HandshakeState::Complete);
/// assert_eq!(leftover, b"{\"type\":6}\x1e");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct HandshakeNegotiator {
    request: HandshakeRequest,
    timeout: Duration,
    state: HandshakeState,
}

impl HandshakeNegotiator {
    /// Creates a negotiator for `protocol` with a response timeout.
    pub fn new(protocol: &dyn HubProtocol, timeout: Duration) -> Self {
        Self {
            request: HandshakeRequest::for_protocol(protocol),
            timeout,
            state: HandshakeState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// The request this negotiator sends.
    pub fn request(&self) -> &HandshakeRequest {
        &self.request
    }

    /// Runs the handshake.
    ///
    /// Sends the request, then reads until a complete response arrives. The
    /// timeout applies to each wait for more bytes, so a response trickling
    /// in across several transport messages keeps the handshake alive.
    ///
    /// Returns the bytes that followed the response in the same transport
    /// message; they must be fed to the hub protocol decoder.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError`] on rejection, timeout, malformed
    /// response, or transport failure. The negotiator is then `Failed`.
    pub async fn negotiate(
        &mut self,
        sender: &mut dyn TransportSender,
        receiver: &mut dyn TransportReceiver,
    ) -> Result<Vec<u8>, NegotiationError> {
        let result = self.run(sender, receiver).await;
        self.state = match result {
            Ok(_) => HandshakeState::Complete,
            Err(ref e) => {
                warn!(error = %e, "handshake failed");
                HandshakeState::Failed
            }
        };
        result
    }

    async fn run(
        &mut self,
        sender: &mut dyn TransportSender,
        receiver: &mut dyn TransportReceiver,
    ) -> Result<Vec<u8>, NegotiationError> {
        let frame = self.request.to_frame().map_err(NegotiationError::Malformed)?;
        debug!(
            protocol = %self.request.protocol,
            version = self.request.version,
            "sending handshake request"
        );
        sender.send(frame).await.map_err(NegotiationError::Transport)?;
        self.state = HandshakeState::AwaitingAck;

        let mut buffer = Vec::new();
        loop {
            let received = tokio::time::timeout(self.timeout, receiver.recv())
                .await
                .map_err(|_| NegotiationError::TimedOut {
                    duration: self.timeout,
                })?;
            match received {
                None => return Err(NegotiationError::TransportClosed),
                Some(Err(e)) => return Err(NegotiationError::Transport(e)),
                Some(Ok(bytes)) => buffer.extend_from_slice(&bytes),
            }

            let Some((response, rest)) =
                HandshakeResponse::parse(&buffer).map_err(NegotiationError::Malformed)?
            else {
                continue;
            };
            if let Some(reason) = response.error {
                return Err(NegotiationError::Rejected { reason });
            }
            debug!(leftover = rest.len(), "handshake complete");
            return Ok(rest.to_vec());
        }
    }
}
