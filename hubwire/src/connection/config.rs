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

//! Configuration types for hub connections.

use crate::HubError;
use crate::connection::keepalive::{DEFAULT_KEEP_ALIVE_INTERVAL, DEFAULT_SERVER_TIMEOUT};
use crate::protocol::DEFAULT_HANDSHAKE_TIMEOUT;
use crate::reconnection::ReconnectionPolicy;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for a [`HubConnection`](crate::HubConnection).
///
/// # Examples
///
/// ```rust
/// use hubwire::connection::HubConnectionConfig;
/// use hubwire::reconnection::FixedDelays;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let config = HubConnectionConfig::new()
///     .with_keep_alive_interval(Duration::from_secs(10))
///     .with_server_timeout(Duration::from_secs(20))
///     .with_reconnection_policy(Arc::new(FixedDelays::default()));
///
/// assert_eq!(config.handshake_timeout, Duration::from_secs(15));
/// ```
#[derive(Clone)]
pub struct HubConnectionConfig {
    /// Time to wait for the handshake response (default: 15s)
    pub handshake_timeout: Duration,

    /// Idle time after the last outbound record before a Ping is sent
    /// (default: 15s)
    pub keep_alive_interval: Duration,

    /// Time without any inbound frame before the connection is considered
    /// dead (default: 30s)
    pub server_timeout: Duration,

    /// Extra headers sent when opening the transport (default: none)
    pub headers: Vec<(String, String)>,

    /// Policy consulted after the connection is lost (default: none, the
    /// connection goes straight to `Disconnected`)
    pub reconnection_policy: Option<Arc<dyn ReconnectionPolicy>>,

    /// Consult the reconnection policy when the first connection attempt
    /// fails (default: false)
    pub retry_initial_connection: bool,
}

impl Default for HubConnectionConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            keep_alive_interval: DEFAULT_KEEP_ALIVE_INTERVAL,
            server_timeout: DEFAULT_SERVER_TIMEOUT,
            headers: Vec::new(),
            reconnection_policy: None,
            retry_initial_connection: false,
        }
    }
}

impl std::fmt::Debug for HubConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let header_names: Vec<&str> = self.headers.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("HubConnectionConfig")
            .field("handshake_timeout", &self.handshake_timeout)
            .field("keep_alive_interval", &self.keep_alive_interval)
            .field("server_timeout", &self.server_timeout)
            .field("headers", &header_names)
            .field(
                "reconnection_policy",
                &self.reconnection_policy.as_ref().map(|p| p.name()),
            )
            .field("retry_initial_connection", &self.retry_initial_connection)
            .finish()
    }
}

impl HubConnectionConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the handshake timeout.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Sets the keep-alive ping interval.
    pub fn with_keep_alive_interval(mut self, interval: Duration) -> Self {
        self.keep_alive_interval = interval;
        self
    }

    /// Sets the server timeout.
    pub fn with_server_timeout(mut self, timeout: Duration) -> Self {
        self.server_timeout = timeout;
        self
    }

    /// Adds a header sent when opening the transport.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the reconnection policy.
    pub fn with_reconnection_policy(mut self, policy: Arc<dyn ReconnectionPolicy>) -> Self {
        self.reconnection_policy = Some(policy);
        self
    }

    /// Sets whether a failed first connection attempt is retried.
    pub fn with_retry_initial_connection(mut self, retry: bool) -> Self {
        self.retry_initial_connection = retry;
        self
    }

    /// Checks the configuration for values that cannot work.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidConfiguration`] if a timeout or interval
    /// is zero.
    pub fn validate(&self) -> Result<(), HubError> {
        if self.handshake_timeout.is_zero() {
            return Err(HubError::invalid_configuration(
                "handshake timeout must be greater than zero",
            ));
        }
        if self.keep_alive_interval.is_zero() {
            return Err(HubError::invalid_configuration(
                "keep-alive interval must be greater than zero",
            ));
        }
        if self.server_timeout.is_zero() {
            return Err(HubError::invalid_configuration(
                "server timeout must be greater than zero",
            ));
        }
        Ok(())
    }
}
