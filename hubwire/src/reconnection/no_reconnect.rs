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

//! Policy that never reconnects.

use crate::reconnection::{ReconnectionPolicy, RetryContext};
use std::time::Duration;

/// A policy that always gives up.
///
/// Configuring it is equivalent to configuring no policy at all, except
/// that a server Close carrying `allowReconnect` is also treated as final.
///
/// # Examples
///
/// ```
/// use hubwire::reconnection::NoReconnect;
///
/// let policy = NoReconnect::new();
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct NoReconnect;

impl NoReconnect {
    /// Creates the policy.
    pub fn new() -> Self {
        Self
    }
}

impl ReconnectionPolicy for NoReconnect {
    fn next_retry_delay(&self, _context: &RetryContext<'_>) -> Option<Duration> {
        None
    }

    fn name(&self) -> &str {
        "NoReconnect"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HubError;

    #[test]
    fn test_never_retries() {
        let policy = NoReconnect::new();
        let reason = HubError::connection_lost("reset");
        for attempt in [0, 1, 100] {
            let context = RetryContext {
                previous_retry_count: attempt,
                elapsed: Duration::ZERO,
                retry_reason: &reason,
            };
            assert!(policy.next_retry_delay(&context).is_none());
        }
        assert_eq!(policy.metrics().total_attempts, 0);
    }
}
