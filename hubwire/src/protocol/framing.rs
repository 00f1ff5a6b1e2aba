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

//! Record framing for text hub protocols.
//!
//! Every record, including the handshake, is followed by a single record
//! separator byte (ASCII `0x1E`):
//!
//! ```text
//! +-------------------+------+-------------------+------+
//! | Record (N bytes)  | 0x1E | Record (M bytes)  | 0x1E | ...
//! +-------------------+------+-------------------+------+
//! ```
//!
//! A transport message may carry any number of records, and a record may be
//! split across transport messages, so readers buffer bytes and call
//! [`split_record`] until it yields `None`.
//!
//! # Examples
//!
//! ```rust
//! use hubwire::protocol::framing::{split_record, write_record};
//!
//! let mut buffer = Vec::new();
//! write_record(&mut buffer, br#"{"type":6}"#);
//! write_record(&mut buffer, br#"{"type":6}"#);
//!
//! let (first, rest) = split_record(&buffer).unwrap().unwrap();
//! assert_eq!(first, br#"{"type":6}"#);
//! let (_, rest) = split_record(rest).unwrap().unwrap();
//! assert!(rest.is_empty());
//! ```

use crate::protocol::ProtocolError;

/// Record separator terminating every record.
pub const RECORD_SEPARATOR: u8 = 0x1E;

/// Maximum record size (16 MB).
///
/// Buffering more than this without seeing a separator is treated as a
/// framing error.
pub const MAX_RECORD_SIZE: usize = 16 * 1024 * 1024;

/// Appends `payload` followed by the record separator to `buffer`.
pub fn write_record(buffer: &mut Vec<u8>, payload: &[u8]) {
    buffer.reserve(payload.len() + 1);
    buffer.extend_from_slice(payload);
    buffer.push(RECORD_SEPARATOR);
}

/// Splits the first complete record off `buffer`.
///
/// Returns `Ok(Some((record, remainder)))` where `record` excludes the
/// separator, or `Ok(None)` if `buffer` holds no complete record yet.
///
/// # Errors
///
/// Returns [`ProtocolError::RecordTooLarge`] if more than
/// [`MAX_RECORD_SIZE`] bytes are buffered without a separator.
pub fn split_record(buffer: &[u8]) -> Result<Option<(&[u8], &[u8])>, ProtocolError> {
    match buffer.iter().position(|&b| b == RECORD_SEPARATOR) {
        Some(index) => Ok(Some((&buffer[..index], &buffer[index + 1..]))),
        None if buffer.len() > MAX_RECORD_SIZE => Err(ProtocolError::RecordTooLarge {
            size: buffer.len(),
            max: MAX_RECORD_SIZE,
        }),
        None => Ok(None),
    }
}
