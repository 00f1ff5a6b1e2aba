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

//! Hub protocol records, codecs, and the handshake.
//!
//! This module contains everything that touches bytes on the wire:
//!
//! - [`HubMessage`] and its record structs
//! - [`HubProtocol`]: the codec trait, implemented by [`JsonHubProtocol`]
//! - [`framing`]: record separator framing shared by codecs and handshake
//! - [`HandshakeNegotiator`]: protocol selection on a fresh connection
//!
//! # Wire Format
//!
//! ```text
//! client: {"protocol":"json","version":1}<RS>
//! server: {}<RS>
//! client: {"type":1,"invocationId":"1","target":"Add","arguments":[2,3]}<RS>
//! server: {"type":3,"invocationId":"1","result":5}<RS>
//! ```

mod error;
pub mod framing;
mod handshake;
mod json;
mod message;
mod traits;

pub use error::{NegotiationError, ProtocolError};
pub use handshake::{
    DEFAULT_HANDSHAKE_TIMEOUT, HandshakeNegotiator, HandshakeRequest, HandshakeResponse,
    HandshakeState,
};
pub use json::JsonHubProtocol;
pub use message::{
    CancelInvocationMessage, CloseMessage, CompletionMessage, HubMessage, InvocationMessage,
    MessageType, StreamInvocationMessage, StreamItemMessage,
};
pub use traits::{HubProtocol, TransferFormat};
