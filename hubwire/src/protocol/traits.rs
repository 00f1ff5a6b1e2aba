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

//! Hub protocol trait definitions.

use crate::protocol::{HubMessage, ProtocolError};

/// How encoded records are carried by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferFormat {
    /// Records are UTF-8 text.
    Text,
    /// Records are arbitrary bytes.
    Binary,
}

/// A hub protocol codec.
///
/// The codec turns [`HubMessage`] records into delimited byte frames and
/// back. It is stateless: partial frames stay in the caller's buffer until
/// more bytes arrive.
///
/// # Thread Safety
///
/// Protocols must be `Send + Sync + 'static`; one instance is shared by the
/// connection and every caller encoding through it.
///
/// # Examples
///
/// ```rust
/// use hubwire::protocol::{HubMessage, HubProtocol, JsonHubProtocol};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let protocol = JsonHubProtocol::new();
/// let bytes = protocol.encode(&HubMessage::Ping)?;
///
/// let (message, rest) = protocol.decode(&bytes)?;
/// assert_eq!(message, Some(HubMessage::Ping));
/// assert!(rest.is_empty());
/// # Ok(())
/// # }
/// ```
pub trait HubProtocol: Send + Sync + 'static {
    /// Protocol name announced in the handshake (e.g., `"json"`).
    fn name(&self) -> &str;

    /// Protocol version announced in the handshake.
    fn version(&self) -> u32;

    /// Transfer format required from the transport.
    fn transfer_format(&self) -> TransferFormat;

    /// Encodes one record, including its frame delimiter.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Encode`] if the record cannot be serialized.
    fn encode(&self, message: &HubMessage) -> Result<Vec<u8>, ProtocolError>;

    /// Decodes at most one record from the front of `buffer`.
    ///
    /// Returns the record (or `None` if `buffer` holds no complete frame)
    /// and the unconsumed remainder.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] for an ill-formed frame. The stream cannot
    /// be resynchronized after an error.
    fn decode<'a>(&self, buffer: &'a [u8])
    -> Result<(Option<HubMessage>, &'a [u8]), ProtocolError>;
}
