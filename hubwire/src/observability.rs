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

//! Connection metrics.
//!
//! Counters are kept in atomics on every build and are additionally exported
//! to the `metrics` crate when the `observability` feature is enabled.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one [`HubConnection`](crate::HubConnection).
///
/// # Examples
///
/// ```rust
/// use hubwire::observability::HubMetrics;
///
/// let metrics = HubMetrics::new();
/// metrics.record_message_sent(64);
/// metrics.record_invocation();
///
/// let snapshot = metrics.snapshot();
/// assert_eq!(snapshot.messages_sent, 1);
/// assert_eq!(snapshot.bytes_sent, 64);
/// assert_eq!(snapshot.invocations, 1);
/// ```
#[derive(Debug, Default)]
pub struct HubMetrics {
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    bytes_sent: AtomicU64,
    bytes_received: AtomicU64,
    invocations: AtomicU64,
    pings_sent: AtomicU64,
    handler_failures: AtomicU64,
    reconnect_attempts: AtomicU64,
    connections_opened: AtomicU64,
}

/// Point-in-time copy of [`HubMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubMetricsSnapshot {
    /// Records sent
    pub messages_sent: u64,
    /// Records received
    pub messages_received: u64,
    /// Bytes sent, including framing
    pub bytes_sent: u64,
    /// Bytes received from the transport
    pub bytes_received: u64,
    /// Invocations and streams started by this client
    pub invocations: u64,
    /// Keep-alive pings sent
    pub pings_sent: u64,
    /// Handlers that returned an error or panicked
    pub handler_failures: u64,
    /// Reconnect attempts made
    pub reconnect_attempts: u64,
    /// Connections established, including reconnects
    pub connections_opened: u64,
}

impl HubMetrics {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one record of `bytes` written to the transport.
    pub fn record_message_sent(&self, bytes: usize) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        {
            metrics::counter!("hubwire.messages.sent").increment(1);
            metrics::counter!("hubwire.bytes.sent").increment(bytes as u64);
        }
    }

    /// Records `bytes` read from the transport.
    pub fn record_bytes_received(&self, bytes: usize) {
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("hubwire.bytes.received").increment(bytes as u64);
    }

    /// Records one decoded record.
    pub fn record_message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("hubwire.messages.received").increment(1);
    }

    /// Records an invocation or stream started by this client.
    pub fn record_invocation(&self) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("hubwire.invocations").increment(1);
    }

    /// Records a keep-alive ping.
    pub fn record_ping(&self) {
        self.pings_sent.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("hubwire.pings.sent").increment(1);
    }

    /// Records a handler failure.
    pub fn record_handler_failure(&self) {
        self.handler_failures.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("hubwire.handlers.failed").increment(1);
    }

    /// Records a reconnect attempt.
    pub fn record_reconnect_attempt(&self) {
        self.reconnect_attempts.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("hubwire.reconnect.attempts").increment(1);
    }

    /// Records an established connection.
    pub fn record_connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        metrics::counter!("hubwire.connections.opened").increment(1);
    }

    /// Returns a copy of every counter.
    pub fn snapshot(&self) -> HubMetricsSnapshot {
        HubMetricsSnapshot {
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            invocations: self.invocations.load(Ordering::Relaxed),
            pings_sent: self.pings_sent.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
            reconnect_attempts: self.reconnect_attempts.load(Ordering::Relaxed),
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = HubMetrics::new();
        metrics.record_message_sent(10);
        metrics.record_message_sent(5);
        metrics.record_bytes_received(7);
        metrics.record_message_received();
        metrics.record_ping();
        metrics.record_handler_failure();
        metrics.record_reconnect_attempt();
        metrics.record_connection_opened();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.messages_sent, 2);
        assert_eq!(snapshot.bytes_sent, 15);
        assert_eq!(snapshot.bytes_received, 7);
        assert_eq!(snapshot.messages_received, 1);
        assert_eq!(snapshot.pings_sent, 1);
        assert_eq!(snapshot.handler_failures, 1);
        assert_eq!(snapshot.reconnect_attempts, 1);
        assert_eq!(snapshot.connections_opened, 1);
        assert_eq!(snapshot.invocations, 0);
    }
}
