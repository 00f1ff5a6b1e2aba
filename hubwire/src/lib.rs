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

#![doc = include_str!("../../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

//! ## Architecture
//!
//! - **[`transport`]**: message-oriented channels (WebSocket, in-memory)
//! - **[`protocol`]**: record framing, the JSON hub protocol and the handshake
//! - **[`invocation`]**: invocation ids, the pending-invocation registry and
//!   stream handles
//! - **[`connection`]**: the [`HubConnection`] state machine, handlers,
//!   keep-alive and configuration
//! - **[`reconnection`]**: policies deciding when to reconnect
//! - **[`observability`]**: traffic counters

pub mod connection;
mod error;
pub mod invocation;
pub mod observability;
pub mod protocol;
pub mod reconnection;
pub mod transport;

pub use connection::{
    AccessTokenProvider, HandlerError, HandlerId, HubConnection, HubConnectionBuilder,
    HubConnectionConfig, HubConnectionState,
};
pub use error::HubError;
pub use invocation::{HubStream, StreamCallbacks, StreamObserver, Subscription, UploadStream};
pub use observability::HubMetricsSnapshot;
pub use protocol::{HubMessage, HubProtocol, JsonHubProtocol};
pub use reconnection::{ExponentialBackoff, FixedDelays, NoReconnect, ReconnectionPolicy};
pub use transport::{Transport, TransportError};
