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

//! Connection state.

use std::fmt;

/// State of a [`HubConnection`](crate::HubConnection).
///
/// ```text
/// Disconnected -> Connecting -> Negotiating -> Connected
///                                                 |
///                      Connected <- Reconnecting <-+-> Disconnected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HubConnectionState {
    /// Not connected and not trying to connect.
    Disconnected,

    /// Opening the transport.
    Connecting,

    /// Transport open, handshake in progress.
    Negotiating,

    /// Handshake complete; invocations may be sent.
    Connected,

    /// Connection lost; the reconnection policy is driving new attempts.
    Reconnecting,
}

impl HubConnectionState {
    /// Returns `true` if invocations may be sent.
    pub fn is_connected(self) -> bool {
        self == HubConnectionState::Connected
    }

    /// Returns `true` while a connection attempt is in progress.
    pub fn is_connecting(self) -> bool {
        matches!(
            self,
            HubConnectionState::Connecting
                | HubConnectionState::Negotiating
                | HubConnectionState::Reconnecting
        )
    }
}

impl fmt::Display for HubConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Negotiating => write!(f, "Negotiating"),
            Self::Connected => write!(f, "Connected"),
            Self::Reconnecting => write!(f, "Reconnecting"),
        }
    }
}
