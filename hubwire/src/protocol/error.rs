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

//! Protocol error types.

use crate::transport::TransportError;
use std::time::Duration;
use thiserror::Error;

/// Errors produced while encoding or decoding protocol records.
///
/// A decode error means the byte stream can no longer be trusted; the
/// connection is closed rather than resynchronized.
///
/// # Examples
///
/// ```rust
/// use hubwire::protocol::{HubProtocol, JsonHubProtocol, ProtocolError};
///
/// let protocol = JsonHubProtocol::new();
/// let error = protocol.decode(b"{not json}\x1e").unwrap_err();
/// assert!(matches!(error, ProtocolError::Framing { .. }));
/// ```
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A delimited frame could not be parsed into a record.
    #[error("malformed frame: {reason}")]
    Framing {
        /// Description of what was wrong with the frame
        reason: String,
    },

    /// More bytes were buffered than a single record may contain.
    #[error("record of {size} bytes exceeds maximum allowed size {max}")]
    RecordTooLarge {
        /// Bytes buffered without a record separator
        size: usize,
        /// Maximum record size
        max: usize,
    },

    /// A record could not be serialized.
    #[error("failed to encode record: {source}")]
    Encode {
        /// The underlying serializer error
        #[source]
        source: serde_json::Error,
    },
}

impl ProtocolError {
    /// Creates a [`ProtocolError::Framing`].
    pub fn framing(reason: impl Into<String>) -> Self {
        ProtocolError::Framing {
            reason: reason.into(),
        }
    }
}

/// Errors produced by the handshake.
///
/// Each of these fails the current connection attempt.
#[derive(Debug, Error)]
pub enum NegotiationError {
    /// The server answered the handshake with an error.
    #[error("handshake rejected by server: {reason}")]
    Rejected {
        /// The error string sent by the server
        reason: String,
    },

    /// No handshake response arrived in time.
    #[error("handshake timed out after {duration:?}")]
    TimedOut {
        /// The configured handshake timeout
        duration: Duration,
    },

    /// The transport closed before the handshake response arrived.
    #[error("transport closed before handshake completed")]
    TransportClosed,

    /// The handshake response could not be parsed.
    #[error("invalid handshake response: {0}")]
    Malformed(#[source] ProtocolError),

    /// The transport failed while handshaking.
    #[error("transport failed during handshake: {0}")]
    Transport(#[source] TransportError),
}
