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

//! Hub protocol records.
//!
//! Every record exchanged after the handshake is one of the variants of
//! [`HubMessage`]. On the wire a record is tagged with an integer `type`
//! (see [`MessageType`]); the record structs here hold the remaining fields
//! and serialize them in camelCase.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Wire discriminator of a hub record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Call a method on the other side.
    Invocation = 1,
    /// One item of a stream.
    StreamItem = 2,
    /// Completion of an invocation or stream.
    Completion = 3,
    /// Start a server-to-client stream.
    StreamInvocation = 4,
    /// Cancel a stream.
    CancelInvocation = 5,
    /// Keep-alive.
    Ping = 6,
    /// Orderly connection close.
    Close = 7,
}

impl MessageType {
    /// Returns the integer value sent on the wire.
    pub fn code(self) -> u64 {
        self as u64
    }

    /// Maps a wire value to a known message type.
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            1 => Some(MessageType::Invocation),
            2 => Some(MessageType::StreamItem),
            3 => Some(MessageType::Completion),
            4 => Some(MessageType::StreamInvocation),
            5 => Some(MessageType::CancelInvocation),
            6 => Some(MessageType::Ping),
            7 => Some(MessageType::Close),
            _ => None,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageType::Invocation => "Invocation",
            MessageType::StreamItem => "StreamItem",
            MessageType::Completion => "Completion",
            MessageType::StreamInvocation => "StreamInvocation",
            MessageType::CancelInvocation => "CancelInvocation",
            MessageType::Ping => "Ping",
            MessageType::Close => "Close",
        };
        f.write_str(name)
    }
}

/// A decoded hub protocol record.
///
/// # Examples
///
/// ```rust
/// use hubwire::protocol::{HubMessage, InvocationMessage};
/// use serde_json::json;
///
/// let message = HubMessage::Invocation(
///     InvocationMessage::new("Add", vec![json!(2), json!(3)]).with_invocation_id("1"),
/// );
/// assert_eq!(message.invocation_id(), Some("1"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum HubMessage {
    /// Method call (type 1).
    Invocation(InvocationMessage),
    /// Stream item (type 2).
    StreamItem(StreamItemMessage),
    /// Completion (type 3).
    Completion(CompletionMessage),
    /// Stream invocation (type 4).
    StreamInvocation(StreamInvocationMessage),
    /// Stream cancellation (type 5).
    CancelInvocation(CancelInvocationMessage),
    /// Keep-alive (type 6).
    Ping,
    /// Orderly close (type 7).
    Close(CloseMessage),
    /// A record with a `type` this client does not know.
    ///
    /// Decoded rather than rejected so newer servers can add record kinds;
    /// the connection ignores it.
    Unknown {
        /// The wire `type` value
        message_type: u64,
    },
}

impl HubMessage {
    /// Returns the record's known [`MessageType`], if any.
    pub fn message_type(&self) -> Option<MessageType> {
        match self {
            HubMessage::Invocation(_) => Some(MessageType::Invocation),
            HubMessage::StreamItem(_) => Some(MessageType::StreamItem),
            HubMessage::Completion(_) => Some(MessageType::Completion),
            HubMessage::StreamInvocation(_) => Some(MessageType::StreamInvocation),
            HubMessage::CancelInvocation(_) => Some(MessageType::CancelInvocation),
            HubMessage::Ping => Some(MessageType::Ping),
            HubMessage::Close(_) => Some(MessageType::Close),
            HubMessage::Unknown { .. } => None,
        }
    }

    /// Returns the invocation id the record refers to, if it carries one.
    pub fn invocation_id(&self) -> Option<&str> {
        match self {
            HubMessage::Invocation(m) => m.invocation_id.as_deref(),
            HubMessage::StreamItem(m) => Some(&m.invocation_id),
            HubMessage::Completion(m) => Some(&m.invocation_id),
            HubMessage::StreamInvocation(m) => Some(&m.invocation_id),
            HubMessage::CancelInvocation(m) => Some(&m.invocation_id),
            HubMessage::Ping | HubMessage::Close(_) | HubMessage::Unknown { .. } => None,
        }
    }
}

/// Invocation record.
///
/// Without an `invocation_id` the call is fire-and-forget and the receiver
/// sends no completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationMessage {
    /// Correlation id, absent for fire-and-forget calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_id: Option<String>,
    /// Method name
    pub target: String,
    /// Positional arguments
    #[serde(default)]
    pub arguments: Vec<Value>,
    /// Ids of client-to-server streams fed by this call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stream_ids: Vec<String>,
    /// Optional string headers
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

impl InvocationMessage {
    /// Creates a fire-and-forget invocation.
    pub fn new(target: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            invocation_id: None,
            target: target.into(),
            arguments,
            stream_ids: Vec::new(),
            headers: HashMap::new(),
        }
    }

    /// Sets the correlation id.
    pub fn with_invocation_id(mut self, id: impl Into<String>) -> Self {
        self.invocation_id = Some(id.into());
        self
    }

    /// Sets the upload stream ids.
    pub fn with_stream_ids(mut self, stream_ids: Vec<String>) -> Self {
        self.stream_ids = stream_ids;
        self
    }
}

/// Stream item record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamItemMessage {
    /// Id of the stream
    pub invocation_id: String,
    /// The item, possibly `null`
    #[serde(default)]
    pub item: Value,
    /// Optional string headers
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

impl StreamItemMessage {
    /// Creates a stream item record.
    pub fn new(invocation_id: impl Into<String>, item: Value) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            item,
            headers: HashMap::new(),
        }
    }
}

/// Completion record.
///
/// Carries either a `result`, an `error`, or neither (void completion).
/// A `result` of JSON `null` is kept distinct from an absent result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionMessage {
    /// Id of the completed invocation or stream
    pub invocation_id: String,
    /// Return value
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub result: Option<Value>,
    /// Error string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Optional string headers
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

impl CompletionMessage {
    /// Completion carrying a result.
    pub fn with_result(invocation_id: impl Into<String>, result: Value) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            result: Some(result),
            error: None,
            headers: HashMap::new(),
        }
    }

    /// Completion carrying an error.
    pub fn with_error(invocation_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            result: None,
            error: Some(error.into()),
            headers: HashMap::new(),
        }
    }

    /// Completion with neither result nor error.
    pub fn empty(invocation_id: impl Into<String>) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            result: None,
            error: None,
            headers: HashMap::new(),
        }
    }

    /// Converts the completion into the outcome delivered to the caller.
    ///
    /// A void completion resolves to `Value::Null`.
    pub fn into_outcome(self) -> Result<Value, String> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// Stream invocation record (server-to-client stream request).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamInvocationMessage {
    /// Id of the stream
    pub invocation_id: String,
    /// Method name
    pub target: String,
    /// Positional arguments
    #[serde(default)]
    pub arguments: Vec<Value>,
    /// Ids of client-to-server streams fed by this call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stream_ids: Vec<String>,
    /// Optional string headers
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

impl StreamInvocationMessage {
    /// Creates a stream invocation record.
    pub fn new(
        invocation_id: impl Into<String>,
        target: impl Into<String>,
        arguments: Vec<Value>,
    ) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            target: target.into(),
            arguments,
            stream_ids: Vec::new(),
            headers: HashMap::new(),
        }
    }
}

/// Cancel invocation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelInvocationMessage {
    /// Id of the stream to cancel
    pub invocation_id: String,
    /// Optional string headers
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

impl CancelInvocationMessage {
    /// Creates a cancel record.
    pub fn new(invocation_id: impl Into<String>) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            headers: HashMap::new(),
        }
    }
}

/// Close record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseMessage {
    /// Reason given by the server, if the close was caused by an error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the server allows the client to reconnect
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub allow_reconnect: bool,
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_type_codes() {
        for code in 1..=7 {
            let kind = MessageType::from_code(code).unwrap();
            assert_eq!(kind.code(), code);
        }
        assert_eq!(MessageType::from_code(0), None);
        assert_eq!(MessageType::from_code(8), None);
        assert_eq!(MessageType::Close.to_string(), "Close");
    }

    #[test]
    fn test_invocation_fields_camel_case() {
        let message = InvocationMessage::new("Send", vec![json!("hi")])
            .with_invocation_id("7")
            .with_stream_ids(vec!["8".to_string()]);
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["invocationId"], "7");
        assert_eq!(value["streamIds"], json!(["8"]));
        assert!(value.get("headers").is_none());
    }

    #[test]
    fn test_completion_null_result_distinct_from_absent() {
        let with_null: CompletionMessage =
            serde_json::from_value(json!({"invocationId": "1", "result": null})).unwrap();
        assert_eq!(with_null.result, Some(Value::Null));

        let void: CompletionMessage = serde_json::from_value(json!({"invocationId": "1"})).unwrap();
        assert_eq!(void.result, None);
        assert_eq!(void.into_outcome(), Ok(Value::Null));
    }

    #[test]
    fn test_completion_outcome() {
        assert_eq!(
            CompletionMessage::with_result("1", json!(5)).into_outcome(),
            Ok(json!(5))
        );
        assert_eq!(
            CompletionMessage::with_error("1", "boom").into_outcome(),
            Err("boom".to_string())
        );
    }

    #[test]
    fn test_close_allow_reconnect_default() {
        let close: CloseMessage = serde_json::from_value(json!({})).unwrap();
        assert!(!close.allow_reconnect);
        assert!(close.error.is_none());
        assert_eq!(serde_json::to_value(&close).unwrap(), json!({}));
    }

    #[test]
    fn test_invocation_id_accessor() {
        assert_eq!(HubMessage::Ping.invocation_id(), None);
        let cancel = HubMessage::CancelInvocation(CancelInvocationMessage::new("3"));
        assert_eq!(cancel.invocation_id(), Some("3"));
        assert_eq!(cancel.message_type(), Some(MessageType::CancelInvocation));
    }
}
