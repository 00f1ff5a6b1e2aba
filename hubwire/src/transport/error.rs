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

//! Transport layer error types.
//!
//! Transport errors are the lowest level of the hubwire error hierarchy and
//! represent failures of the underlying socket. They never describe protocol
//! problems; those live in [`ProtocolError`](crate::protocol::ProtocolError).
//!
//! # Recovery Strategy
//!
//! A transport error on an established connection always ends that
//! connection. Whether a new one is attempted is decided by the configured
//! [`ReconnectionPolicy`](crate::reconnection::ReconnectionPolicy).

use std::io;
use thiserror::Error;

/// Errors that can occur in the transport layer.
///
/// # Examples
///
/// ```rust
/// use hubwire::transport::TransportError;
///
/// let error = TransportError::connection_lost("peer reset");
/// assert!(error.is_recoverable());
/// assert_eq!(error.to_string(), "connection lost: peer reset");
/// ```
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to open a connection to the hub.
    #[error("failed to connect to {url}: {reason}")]
    ConnectionFailed {
        /// The URL that failed to connect
        url: String,
        /// Description of the failure
        reason: String,
    },

    /// An established connection was lost.
    #[error("connection lost: {reason}")]
    ConnectionLost {
        /// Description of why the connection was lost
        reason: String,
        /// The underlying I/O error, if available
        #[source]
        source: Option<io::Error>,
    },

    /// Failed to write a frame to the transport.
    #[error("send failed: {reason}")]
    SendFailed {
        /// Description of the failure
        reason: String,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout {
        /// The duration that was exceeded
        duration: std::time::Duration,
    },

    /// Invalid transport configuration, such as an unsupported URL scheme.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the configuration error
        reason: String,
    },

    /// Transport was explicitly closed.
    #[error("transport is closed")]
    Closed,

    /// WebSocket-specific error.
    #[cfg(feature = "websocket")]
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

impl TransportError {
    /// Creates a [`TransportError::ConnectionFailed`].
    pub fn connection_failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        TransportError::ConnectionFailed {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a [`TransportError::ConnectionLost`] without an I/O source.
    pub fn connection_lost(reason: impl Into<String>) -> Self {
        TransportError::ConnectionLost {
            reason: reason.into(),
            source: None,
        }
    }

    /// Creates a [`TransportError::InvalidConfiguration`].
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        TransportError::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Returns `true` if a new connection attempt may succeed.
    ///
    /// Invalid configuration and explicit closes are permanent; everything
    /// else may be transient.
    pub fn is_recoverable(&self) -> bool {
        match self {
            TransportError::ConnectionFailed { .. }
            | TransportError::ConnectionLost { .. }
            | TransportError::SendFailed { .. }
            | TransportError::Timeout { .. } => true,

            #[cfg(feature = "websocket")]
            TransportError::WebSocket(e) => {
                use tokio_tungstenite::tungstenite::Error as WsError;
                matches!(
                    e,
                    WsError::Io(_) | WsError::ConnectionClosed | WsError::AlreadyClosed
                )
            }

            TransportError::InvalidConfiguration { .. } | TransportError::Closed => false,
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(error: io::Error) -> Self {
        TransportError::ConnectionLost {
            reason: error.to_string(),
            source: Some(error),
        }
    }
}
