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

//! Transport layer abstractions for hubwire.
//!
//! The hub protocol is message oriented: the transport delivers whole
//! messages, and a message may contain several protocol records. This module
//! defines the collaborator boundary the connection engine talks to:
//!
//! - [`Transport`]: opens a [`TransportChannel`] to a URL with headers
//! - [`TransportSender`]: `send(bytes)` / `close()`
//! - [`TransportReceiver`]: `recv()` yielding messages until the peer closes
//!
//! Two implementations ship with the crate:
//!
//! - [`MemoryTransport`]: in-process channels with a scriptable server side,
//!   used by the test suite
//! - [`WebSocketTransport`]: WebSocket client (requires `websocket` feature,
//!   enabled by default)
//!
//! # Errors
//!
//! All transport operations report [`TransportError`]. Errors on an open
//! channel end the connection; the hub connection decides whether to
//! reconnect.

mod error;
mod memory;
mod traits;
mod types;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use memory::{MemoryPeer, MemoryServer, MemoryTransport};
pub use traits::{Transport, TransportChannel, TransportReceiver, TransportSender};
pub use types::{TransportId, TransportMetadata};
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConfig, WebSocketTransport};
