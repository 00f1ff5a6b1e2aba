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

//! Keep-alive bookkeeping.
//!
//! Two deadlines are tracked:
//!
//! - **ping**: `keep_alive_interval` after the last activity in either
//!   direction; when it passes, a Ping is sent so the server knows the
//!   client is alive
//! - **server timeout**: `server_timeout` after the last inbound frame; when
//!   it passes, the connection is considered dead
//!
//! An inbound frame resets both deadlines, an outbound record only the ping.
//!
//! The monitor only does arithmetic on [`Instant`]s. The connection driver
//! sleeps until [`KeepAliveMonitor::next_deadline`] and then asks which
//! deadline fired.

use tokio::time::{Duration, Instant};

/// Default interval between keep-alive pings.
pub const DEFAULT_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Default time without any inbound frame before the connection is dead.
pub const DEFAULT_SERVER_TIMEOUT: Duration = Duration::from_secs(30);

/// Tracks activity in both directions of one connection.
///
/// # Examples
///
/// ```rust
/// use hubwire::connection::KeepAliveMonitor;
/// use tokio::time::{Duration, Instant};
///
/// let start = Instant::now();
/// let monitor = KeepAliveMonitor::new(Duration::from_secs(15), Duration::from_secs(30), start);
///
/// assert!(!monitor.ping_due(start + Duration::from_secs(14)));
/// assert!(monitor.ping_due(start + Duration::from_secs(15)));
/// assert!(monitor.timed_out(start + Duration::from_secs(30)));
/// ```
#[derive(Debug, Clone)]
pub struct KeepAliveMonitor {
    keep_alive_interval: Duration,
    server_timeout: Duration,
    last_sent: Instant,
    last_received: Instant,
}

impl KeepAliveMonitor {
    /// Creates a monitor whose timers start at `now`.
    pub fn new(keep_alive_interval: Duration, server_timeout: Duration, now: Instant) -> Self {
        Self {
            keep_alive_interval,
            server_timeout,
            last_sent: now,
            last_received: now,
        }
    }

    /// Restarts both timers, e.g. after a (re)connect.
    pub fn reset(&mut self, now: Instant) {
        self.last_sent = now;
        self.last_received = now;
    }

    /// Records an outbound record.
    pub fn on_sent(&mut self, now: Instant) {
        self.last_sent = now;
    }

    /// Records an inbound frame of any kind.
    pub fn on_received(&mut self, now: Instant) {
        self.last_received = now;
        self.last_sent = self.last_sent.max(now);
    }

    /// When the next Ping is due.
    pub fn ping_at(&self) -> Instant {
        self.last_sent + self.keep_alive_interval
    }

    /// When the server timeout expires.
    pub fn server_deadline(&self) -> Instant {
        self.last_received + self.server_timeout
    }

    /// The earlier of the two deadlines.
    pub fn next_deadline(&self) -> Instant {
        self.ping_at().min(self.server_deadline())
    }

    /// Returns `true` if a Ping should be sent at `now`.
    pub fn ping_due(&self, now: Instant) -> bool {
        now >= self.ping_at()
    }

    /// Returns `true` if the server has been silent for too long at `now`.
    pub fn timed_out(&self, now: Instant) -> bool {
        now >= self.server_deadline()
    }

    /// The configured ping interval.
    pub fn keep_alive_interval(&self) -> Duration {
        self.keep_alive_interval
    }

    /// The configured server timeout.
    pub fn server_timeout(&self) -> Duration {
        self.server_timeout
    }
}
