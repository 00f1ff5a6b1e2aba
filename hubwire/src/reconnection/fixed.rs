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

//! Fixed delay reconnection policies.

use crate::HubError;
use crate::reconnection::{ReconnectionMetrics, ReconnectionPolicy, RetryContext};
use parking_lot::Mutex;
use std::time::Duration;

/// Delays used by [`FixedDelays::default`]: 0s, 2s, 10s, 30s.
pub const DEFAULT_RETRY_DELAYS: [Duration; 4] = [
    Duration::ZERO,
    Duration::from_secs(2),
    Duration::from_secs(10),
    Duration::from_secs(30),
];

#[derive(Debug, Clone)]
enum Schedule {
    List(Vec<Duration>),
    Interval {
        delay: Duration,
        max_attempts: Option<u32>,
    },
}

/// Fixed delay reconnection policy.
///
/// Either walks a finite list of delays, one per attempt, giving up when the
/// list is exhausted, or waits a constant interval between attempts.
///
/// # Examples
///
/// ```rust
/// use hubwire::reconnection::FixedDelays;
/// use std::time::Duration;
///
/// // 0s, 2s, 10s, 30s, then give up.
/// let policy = FixedDelays::default();
///
/// // Every 5 seconds, at most 5 times.
/// let policy = FixedDelays::interval(Duration::from_secs(5), Some(5));
/// ```
#[derive(Debug)]
pub struct FixedDelays {
    schedule: Schedule,
    metrics: Mutex<ReconnectionMetrics>,
}

impl FixedDelays {
    /// Creates a policy walking `delays` in order.
    pub fn new(delays: Vec<Duration>) -> Self {
        Self::with_schedule(Schedule::List(delays))
    }

    /// Creates a policy waiting `delay` before every attempt.
    ///
    /// `max_attempts` of `None` retries forever.
    pub fn interval(delay: Duration, max_attempts: Option<u32>) -> Self {
        Self::with_schedule(Schedule::Interval {
            delay,
            max_attempts,
        })
    }

    fn with_schedule(schedule: Schedule) -> Self {
        Self {
            schedule,
            metrics: Mutex::new(ReconnectionMetrics::new()),
        }
    }
}

impl Default for FixedDelays {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_DELAYS.to_vec())
    }
}

impl ReconnectionPolicy for FixedDelays {
    fn next_retry_delay(&self, context: &RetryContext<'_>) -> Option<Duration> {
        match &self.schedule {
            Schedule::List(delays) => delays.get(context.previous_retry_count as usize).copied(),
            Schedule::Interval {
                delay,
                max_attempts,
            } => match max_attempts {
                Some(max) if context.previous_retry_count >= *max => None,
                _ => Some(*delay),
            },
        }
    }

    fn on_attempt(&self) {
        self.metrics.lock().record_attempt();
    }

    fn on_reconnected(&self) {
        self.metrics.lock().record_success();
    }

    fn on_attempt_failed(&self, error: &HubError) {
        self.metrics.lock().record_failure(error);
    }

    fn metrics(&self) -> ReconnectionMetrics {
        self.metrics.lock().clone()
    }

    fn name(&self) -> &str {
        "FixedDelays"
    }
}
