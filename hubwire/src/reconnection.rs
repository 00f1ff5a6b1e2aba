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

//! Reconnection policies for lost hub connections.
//!
//! When an established connection is lost, the hub connection asks its
//! [`ReconnectionPolicy`] how long to wait before each attempt, passing a
//! [`RetryContext`]. Returning `None` gives up for good.
//!
//! # Available Policies
//!
//! - [`ExponentialBackoff`]: growing delays with bounded jitter
//! - [`FixedDelays`]: a fixed list of delays, or a constant interval
//! - [`NoReconnect`]: never reconnect
//!
//! # Examples
//!
//! ```
//! use hubwire::reconnection::{ExponentialBackoff, FixedDelays};
//! use std::time::Duration;
//!
//! let backoff = ExponentialBackoff::builder()
//!     .initial_delay(Duration::from_millis(100))
//!     .max_delay(Duration::from_secs(30))
//!     .max_attempts(Some(10))
//!     .build();
//!
//! let fixed = FixedDelays::new(vec![Duration::ZERO, Duration::from_secs(5)]);
//! ```

mod exponential;
mod fixed;
mod no_reconnect;
mod traits;

pub use exponential::{ExponentialBackoff, ExponentialBackoffBuilder};
pub use fixed::{DEFAULT_RETRY_DELAYS, FixedDelays};
pub use no_reconnect::NoReconnect;
pub use traits::{ReconnectionMetrics, ReconnectionPolicy, RetryContext};
