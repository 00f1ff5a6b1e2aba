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

use crate::transport::{TransportError, TransportMetadata};
use async_trait::async_trait;

/// Factory for message-oriented transport channels.
///
/// A `Transport` opens one [`TransportChannel`] per connection attempt. The
/// hub connection calls [`open`](Transport::open) again for every reconnect,
/// so implementations must not assume they are used only once.
///
/// # Implementing a custom transport
///
/// ```rust
/// use async_trait::async_trait;
/// use hubwire::transport::{Transport, TransportChannel, TransportError};
///
/// struct Refusing;
///
/// #[async_trait]
/// impl Transport for Refusing {
///     async fn open(
///         &self,
///         url: &str,
///         _headers: &[(String, String)],
///     ) -> Result<TransportChannel, TransportError> {
///         Err(TransportError::connection_failed(url, "always refuses"))
///     }
///
///     fn name(&self) -> &str {
///         "refusing"
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Opens a new channel to `url`, sending `headers` with the upgrade request.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the channel cannot be established.
    async fn open(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<TransportChannel, TransportError>;

    /// Human-readable transport name used in logs.
    fn name(&self) -> &str;
}

/// Write half of an opened transport channel.
#[async_trait]
pub trait TransportSender: Send + Sync {
    /// Sends one transport message.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the message could not be written.
    async fn send(&mut self, bytes: Vec<u8>) -> Result<(), TransportError>;

    /// Closes the channel. Closing twice is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the close handshake fails.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Read half of an opened transport channel.
#[async_trait]
pub trait TransportReceiver: Send {
    /// Waits for the next transport message.
    ///
    /// Returns `None` once the peer has closed the channel cleanly, and
    /// `Some(Err(_))` when the channel failed.
    async fn recv(&mut self) -> Option<Result<Vec<u8>, TransportError>>;
}

/// An opened, full-duplex transport channel.
pub struct TransportChannel {
    /// Write half.
    pub sender: Box<dyn TransportSender>,
    /// Read half.
    pub receiver: Box<dyn TransportReceiver>,
    /// Metadata describing the channel.
    pub metadata: TransportMetadata,
}

impl TransportChannel {
    /// Assembles a channel from its halves.
    pub fn new(
        sender: Box<dyn TransportSender>,
        receiver: Box<dyn TransportReceiver>,
        metadata: TransportMetadata,
    ) -> Self {
        Self {
            sender,
            receiver,
            metadata,
        }
    }
}

impl std::fmt::Debug for TransportChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportChannel")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}
