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

//! JSON hub protocol.
//!
//! Each record is a JSON object with an integer `type` field, followed by the
//! record separator:
//!
//! ```text
//! {"type":1,"invocationId":"1","target":"Add","arguments":[2,3]}<0x1E>
//! ```

use crate::protocol::framing::{split_record, write_record};
use crate::protocol::{HubMessage, HubProtocol, MessageType, ProtocolError, TransferFormat};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// The JSON hub protocol, version 1.
///
/// # Examples
///
/// ```rust
/// use hubwire::protocol::{HubProtocol, JsonHubProtocol};
///
/// let protocol = JsonHubProtocol::new();
/// assert_eq!(protocol.name(), "json");
/// assert_eq!(protocol.version(), 1);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonHubProtocol;

impl JsonHubProtocol {
    /// Creates the JSON protocol.
    pub fn new() -> Self {
        Self
    }
}

impl HubProtocol for JsonHubProtocol {
    fn name(&self) -> &str {
        "json"
    }

    fn version(&self) -> u32 {
        1
    }

    fn transfer_format(&self) -> TransferFormat {
        TransferFormat::Text
    }

    fn encode(&self, message: &HubMessage) -> Result<Vec<u8>, ProtocolError> {
        let (code, fields) = match message {
            HubMessage::Invocation(m) => (MessageType::Invocation.code(), to_fields(m)?),
            HubMessage::StreamItem(m) => (MessageType::StreamItem.code(), to_fields(m)?),
            HubMessage::Completion(m) => (MessageType::Completion.code(), to_fields(m)?),
            HubMessage::StreamInvocation(m) => {
                (MessageType::StreamInvocation.code(), to_fields(m)?)
            }
            HubMessage::CancelInvocation(m) => {
                (MessageType::CancelInvocation.code(), to_fields(m)?)
            }
            HubMessage::Ping => (MessageType::Ping.code(), Map::new()),
            HubMessage::Close(m) => (MessageType::Close.code(), to_fields(m)?),
            HubMessage::Unknown { message_type } => (*message_type, Map::new()),
        };

        let mut object = Map::with_capacity(fields.len() + 1);
        object.insert("type".to_string(), Value::from(code));
        object.extend(fields);

        let payload = serde_json::to_vec(&Value::Object(object))
            .map_err(|source| ProtocolError::Encode { source })?;
        let mut frame = Vec::with_capacity(payload.len() + 1);
        write_record(&mut frame, &payload);
        Ok(frame)
    }

    fn decode<'a>(
        &self,
        buffer: &'a [u8],
    ) -> Result<(Option<HubMessage>, &'a [u8]), ProtocolError> {
        let Some((record, rest)) = split_record(buffer)? else {
            return Ok((None, buffer));
        };

        let value: Value = serde_json::from_slice(record)
            .map_err(|e| ProtocolError::framing(format!("invalid JSON: {e}")))?;
        if !value.is_object() {
            return Err(ProtocolError::framing("record is not a JSON object"));
        }
        let code = value
            .get("type")
            .ok_or_else(|| ProtocolError::framing("missing 'type' field"))?
            .as_u64()
            .ok_or_else(|| ProtocolError::framing("'type' is not a non-negative integer"))?;

        let message = match MessageType::from_code(code) {
            Some(MessageType::Invocation) => HubMessage::Invocation(from_fields(value)?),
            Some(MessageType::StreamItem) => HubMessage::StreamItem(from_fields(value)?),
            Some(MessageType::Completion) => HubMessage::Completion(from_fields(value)?),
            Some(MessageType::StreamInvocation) => {
                HubMessage::StreamInvocation(from_fields(value)?)
            }
            Some(MessageType::CancelInvocation) => {
                HubMessage::CancelInvocation(from_fields(value)?)
            }
            Some(MessageType::Ping) => HubMessage::Ping,
            Some(MessageType::Close) => HubMessage::Close(from_fields(value)?),
            None => HubMessage::Unknown { message_type: code },
        };
        Ok((Some(message), rest))
    }
}

fn to_fields<T: Serialize>(record: &T) -> Result<Map<String, Value>, ProtocolError> {
    match serde_json::to_value(record).map_err(|source| ProtocolError::Encode { source })? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

fn from_fields<T: DeserializeOwned>(value: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(value).map_err(|e| ProtocolError::framing(e.to_string()))
}
