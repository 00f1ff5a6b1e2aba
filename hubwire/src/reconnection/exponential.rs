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

//! Exponential backoff reconnection policy.

use crate::HubError;
use crate::reconnection::{ReconnectionMetrics, ReconnectionPolicy, RetryContext};
use parking_lot::Mutex;
use std::time::Duration;

/// Exponential backoff reconnection policy.
///
/// The delay before attempt `n` (counting from 0) is
/// `initial_delay * multiplier^n`, capped at `max_delay`. With a jitter
/// fraction `j`, the delay is then scaled by a random factor in
/// `[1 - j, 1 + j]` and capped again.
///
/// # Examples
///
/// ```rust
/// use hubwire::reconnection::ExponentialBackoff;
/// use std::time::Duration;
///
/// let policy = ExponentialBackoff::builder()
///     .initial_delay(Duration::from_millis(500))
///     .max_delay(Duration::from_secs(30))
///     .multiplier(2.0)
///     .jitter(0.2)
///     .max_attempts(Some(10))
///     .build();
/// ```
#[derive(Debug)]
pub struct ExponentialBackoff {
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter: f64,
    max_attempts: Option<u32>,
    metrics: Mutex<ReconnectionMetrics>,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        ExponentialBackoffBuilder::default().build()
    }
}

impl ExponentialBackoff {
    /// Creates a builder for configuring exponential backoff.
    pub fn builder() -> ExponentialBackoffBuilder {
        ExponentialBackoffBuilder::default()
    }

    /// Delay for the given zero-based attempt, before jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay_ms = self.initial_delay.as_millis() as f64 * self.multiplier.powi(exponent);
        if !delay_ms.is_finite() || delay_ms >= self.max_delay.as_millis() as f64 {
            return self.max_delay;
        }
        Duration::from_millis(delay_ms as u64)
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.jitter <= 0.0 {
            return delay;
        }
        let factor = 1.0 - self.jitter + rand::random::<f64>() * 2.0 * self.jitter;
        delay.mul_f64(factor.max(0.0)).min(self.max_delay)
    }
}

impl ReconnectionPolicy for ExponentialBackoff {
    fn next_retry_delay(&self, context: &RetryContext<'_>) -> Option<Duration> {
        if let Some(max) = self.max_attempts {
            if context.previous_retry_count >= max {
                return None;
            }
        }
        Some(self.jittered(self.base_delay(context.previous_retry_count)))
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
        "ExponentialBackoff"
    }
}

/// Builder for [`ExponentialBackoff`].
#[derive(Debug)]
pub struct ExponentialBackoffBuilder {
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter: f64,
    max_attempts: Option<u32>,
}

impl Default for ExponentialBackoffBuilder {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
            jitter: 0.1,
            max_attempts: None,
        }
    }
}

impl ExponentialBackoffBuilder {
    /// Sets the delay before the first attempt (default: 1s).
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay (default: 60s).
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the growth factor between attempts (default: 2.0).
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Sets the jitter fraction, clamped to `[0, 1]` (default: 0.1).
    ///
    /// `0.0` disables jitter.
    pub fn jitter(mut self, fraction: f64) -> Self {
        self.jitter = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }

    /// Sets the maximum number of attempts (default: unlimited).
    pub fn max_attempts(mut self, max: Option<u32>) -> Self {
        self.max_attempts = max;
        self
    }

    /// Builds the policy.
    pub fn build(self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_delay: self.initial_delay,
            max_delay: self.max_delay,
            multiplier: self.multiplier,
            jitter: self.jitter,
            max_attempts: self.max_attempts,
            metrics: Mutex::new(ReconnectionMetrics::new()),
        }
    }
}
