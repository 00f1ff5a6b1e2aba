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

//! Invocation id generation.
//!
//! Ids are decimal strings of a monotonic counter starting at 1. A generator
//! lives as long as its connection, so ids are never reused across
//! reconnects.

use std::sync::atomic::{AtomicU64, Ordering};

/// Generates unique invocation ids.
///
/// # Examples
///
/// ```rust
/// use hubwire::invocation::InvocationIdGenerator;
///
/// let generator = InvocationIdGenerator::new();
/// assert_eq!(generator.next(), "1");
/// assert_eq!(generator.next(), "2");
/// ```
#[derive(Debug)]
pub struct InvocationIdGenerator {
    next_id: AtomicU64,
}

impl InvocationIdGenerator {
    /// Creates a generator starting at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }

    /// Returns the next id.
    #[must_use]
    pub fn next(&self) -> String {
        self.next_id.fetch_add(1, Ordering::Relaxed).to_string()
    }

    /// Returns the value the next call to [`next`](Self::next) will use.
    #[must_use]
    pub fn peek(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed)
    }
}

impl Default for InvocationIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
