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

use std::fmt;
use std::net::SocketAddr;

/// Process-local number of an opened transport channel.
///
/// Appears in connection logs so one channel can be followed across
/// reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransportId(u64);

impl TransportId {
    /// Wraps a channel number.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The channel number.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a transport reports about a channel it opened.
///
/// The connection logs the id, peer and lifetime of each channel, and hands
/// the connection id to `on_reconnected` observers.
#[derive(Debug, Clone)]
pub struct TransportMetadata {
    /// Channel number, unique within the process
    pub id: TransportId,

    /// Connection id issued by the server, if the transport learned one
    pub connection_id: Option<String>,

    /// Remote address, when the transport knows it
    pub peer_addr: Option<SocketAddr>,

    /// Name of the transport that opened the channel
    pub transport_type: String,

    /// When the channel was opened
    pub created_at: std::time::Instant,
}

impl TransportMetadata {
    /// Metadata for channel `id` opened by `transport_type`.
    pub fn new(id: TransportId, transport_type: impl Into<String>) -> Self {
        Self {
            id,
            connection_id: None,
            peer_addr: None,
            transport_type: transport_type.into(),
            created_at: std::time::Instant::now(),
        }
    }

    /// Sets the server-issued connection id.
    pub fn with_connection_id(mut self, connection_id: impl Into<String>) -> Self {
        self.connection_id = Some(connection_id.into());
        self
    }

    /// Sets the remote address.
    pub fn with_peer_addr(mut self, addr: SocketAddr) -> Self {
        self.peer_addr = Some(addr);
        self
    }

    /// How long ago the channel was opened.
    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }
}
