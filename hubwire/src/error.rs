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

//! Top-level error type for hubwire.
//!
//! Errors fall into three layers, each handled differently:
//!
//! 1. **Connection errors** ([`HubError::ConnectionLost`], transport,
//!    protocol and negotiation failures): every pending invocation is
//!    drained with the same error and the reconnection policy is consulted.
//! 2. **Invocation errors** ([`HubError::Invocation`],
//!    [`HubError::Cancelled`], [`HubError::Deserialize`]): reported to one
//!    caller only; other invocations and the connection are unaffected.
//! 3. **Usage errors** ([`HubError::NotConnected`],
//!    [`HubError::InvalidState`], [`HubError::InvalidConfiguration`]):
//!    returned immediately, nothing is sent.
//!
//! # Examples
//!
//! ```rust
//! use hubwire::HubError;
//! use hubwire::transport::TransportError;
//!
//! let error: HubError = TransportError::Closed.into();
//! assert!(error.is_connection_error());
//!
//! let error = HubError::Invocation { message: "boom".to_string() };
//! assert!(!error.is_connection_error());
//! ```

use crate::protocol::{NegotiationError, ProtocolError};
use crate::transport::TransportError;
use thiserror::Error;

/// Errors surfaced by a [`HubConnection`](crate::HubConnection).
#[derive(Debug, Error)]
pub enum HubError {
    /// The handshake failed.
    #[error("negotiation failed: {0}")]
    Negotiation(#[from] NegotiationError),

    /// A record could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The operation requires a connected hub.
    #[error("hub connection is not connected")]
    NotConnected,

    /// The operation is not allowed in the connection's current state.
    #[error("invalid state: {reason}")]
    InvalidState {
        /// What was attempted and why it is not allowed
        reason: String,
    },

    /// The server completed the invocation with an error.
    #[error("invocation failed: {message}")]
    Invocation {
        /// Error string sent by the server
        message: String,
    },

    /// The connection was lost while the operation was outstanding.
    #[error("connection lost: {reason}")]
    ConnectionLost {
        /// Why the connection ended
        reason: String,
    },

    /// The access token provider failed.
    #[error("access token provider failed: {reason}")]
    TokenProvider {
        /// Error reported by the provider
        reason: String,
    },

    /// Automatic reconnection gave up.
    #[error("reconnection gave up after {attempts} attempts: {last_error}")]
    ReconnectExhausted {
        /// Number of reconnect attempts made
        attempts: u32,
        /// The error that ended the last attempt (or the connection)
        last_error: String,
    },

    /// The invocation was cancelled before it completed.
    #[error("invocation cancelled")]
    Cancelled,

    /// The transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A result could not be converted into the requested type.
    #[error("failed to deserialize result: {0}")]
    Deserialize(#[source] serde_json::Error),

    /// The connection was configured incorrectly.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// What is wrong with the configuration
        reason: String,
    },
}

impl HubError {
    /// Creates a [`HubError::ConnectionLost`].
    pub fn connection_lost(reason: impl Into<String>) -> Self {
        HubError::ConnectionLost {
            reason: reason.into(),
        }
    }

    /// Creates a [`HubError::InvalidConfiguration`].
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        HubError::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Returns `true` if the error ends the connection as a whole.
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            HubError::Negotiation(_)
                | HubError::Protocol(_)
                | HubError::ConnectionLost { .. }
                | HubError::TokenProvider { .. }
                | HubError::ReconnectExhausted { .. }
                | HubError::Transport(_)
        )
    }

    /// Returns `true` if the error only affects a single invocation.
    #[must_use]
    pub fn is_invocation_error(&self) -> bool {
        matches!(
            self,
            HubError::Invocation { .. } | HubError::Cancelled | HubError::Deserialize(_)
        )
    }

    /// Returns `true` if a later connection attempt may succeed.
    ///
    /// A rejected handshake or bad configuration will fail again the same
    /// way, so reconnection stops at the first such failure unless the
    /// policy's [`retry_unrecoverable`](crate::ReconnectionPolicy::retry_unrecoverable)
    /// says otherwise.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            HubError::Transport(e) => e.is_recoverable(),
            HubError::Negotiation(NegotiationError::Transport(e)) => e.is_recoverable(),
            HubError::Negotiation(NegotiationError::Rejected { .. }) => false,
            HubError::Negotiation(_) => true,
            HubError::ConnectionLost { .. } | HubError::Protocol(_) => true,
            HubError::TokenProvider { .. } => true,
            _ => false,
        }
    }
}
