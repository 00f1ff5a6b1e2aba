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

//! Core reconnection policy trait and types.

use crate::HubError;
use std::time::Duration;

/// Information handed to a [`ReconnectionPolicy`] before each attempt.
#[derive(Debug)]
pub struct RetryContext<'a> {
    /// Number of reconnect attempts already made since the connection was
    /// lost (0 before the first attempt)
    pub previous_retry_count: u32,
    /// Time since the connection was lost
    pub elapsed: Duration,
    /// Why the connection was lost, or why the last attempt failed
    pub retry_reason: &'a HubError,
}

/// Trait for reconnection policies.
///
/// A policy decides whether and when to attempt reconnection after the
/// connection is lost. The decision itself is a function of the
/// [`RetryContext`]; the notification hooks only feed
/// [`ReconnectionMetrics`].
///
/// # Examples
///
/// ```rust
/// use hubwire::reconnection::{ReconnectionPolicy, RetryContext};
/// use std::time::Duration;
///
/// struct TwiceQuickly;
///
/// impl ReconnectionPolicy for TwiceQuickly {
///     fn next_retry_delay(&self, context: &RetryContext<'_>) -> Option<Duration> {
///         (context.previous_retry_count < 2).then(|| Duration::from_millis(10))
///     }
///
///     fn name(&self) -> &str {
///         "TwiceQuickly"
///     }
/// }
/// ```
pub trait ReconnectionPolicy: Send + Sync {
    /// Returns the delay before the next attempt, or `None` to give up.
    fn next_retry_delay(&self, context: &RetryContext<'_>) -> Option<Duration>;

    /// Called when a reconnect attempt starts.
    fn on_attempt(&self) {}

    /// Called when a reconnect attempt succeeds.
    fn on_reconnected(&self) {}

    /// Called when a reconnect attempt fails.
    fn on_attempt_failed(&self, error: &HubError) {
        let _ = error;
    }

    /// Returns `true` to keep retrying after an attempt failed with an
    /// error that will likely repeat, such as a rejected handshake.
    ///
    /// See [`HubError::is_recoverable`]. Defaults to `false`: such a
    /// failure ends reconnection at once.
    fn retry_unrecoverable(&self) -> bool {
        false
    }

    /// Returns a snapshot of the policy's metrics.
    fn metrics(&self) -> ReconnectionMetrics {
        ReconnectionMetrics::default()
    }

    /// Returns the name of this policy.
    fn name(&self) -> &str;
}

/// Metrics for tracking reconnection behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconnectionMetrics {
    /// Total number of reconnection attempts
    pub total_attempts: u64,

    /// Number of successful reconnections
    pub successful_reconnections: u64,

    /// Number of failed reconnection attempts
    pub failed_reconnections: u64,

    /// Current consecutive failure count
    pub consecutive_failures: u32,

    /// Last error message (if any)
    pub last_error: Option<String>,
}

impl ReconnectionMetrics {
    /// Creates new empty metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a reconnection attempt.
    pub fn record_attempt(&mut self) {
        self.total_attempts += 1;
    }

    /// Records a successful reconnection.
    pub fn record_success(&mut self) {
        self.successful_reconnections += 1;
        self.consecutive_failures = 0;
        self.last_error = None;
    }

    /// Records a failed reconnection attempt.
    pub fn record_failure(&mut self, error: &HubError) {
        self.failed_reconnections += 1;
        self.consecutive_failures += 1;
        self.last_error = Some(error.to_string());
    }

    /// Resets all metrics.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_record_cycle() {
        let mut metrics = ReconnectionMetrics::new();
        metrics.record_attempt();
        metrics.record_failure(&HubError::connection_lost("refused"));
        metrics.record_attempt();
        metrics.record_failure(&HubError::connection_lost("refused"));

        assert_eq!(metrics.total_attempts, 2);
        assert_eq!(metrics.failed_reconnections, 2);
        assert_eq!(metrics.consecutive_failures, 2);
        assert_eq!(
            metrics.last_error.as_deref(),
            Some("connection lost: refused")
        );

        metrics.record_attempt();
        metrics.record_success();
        assert_eq!(metrics.successful_reconnections, 1);
        assert_eq!(metrics.consecutive_failures, 0);
        assert!(metrics.last_error.is_none());
    }

    #[test]
    fn test_metrics_reset() {
        let mut metrics = ReconnectionMetrics::new();
        metrics.total_attempts = 10;
        metrics.consecutive_failures = 3;
        metrics.last_error = Some("error".to_string());

        metrics.reset();
        assert_eq!(metrics, ReconnectionMetrics::default());
    }
}
