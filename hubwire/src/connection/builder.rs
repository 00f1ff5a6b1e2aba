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

//! Builder pattern for ergonomic connection configuration.

use crate::HubError;
use crate::connection::{AccessTokenProvider, HubConnection, HubConnectionConfig};
use crate::protocol::{HubProtocol, JsonHubProtocol};
use crate::reconnection::{ExponentialBackoff, FixedDelays, ReconnectionPolicy};
use crate::transport::Transport;
use std::sync::Arc;
use std::time::Duration;

/// Builder for [`HubConnection`]s.
///
/// Defaults to the JSON hub protocol and, with the `websocket` feature, the
/// WebSocket transport.
///
/// # Examples
///
/// ## Basic connection
///
/// ```rust
/// use hubwire::HubConnectionBuilder;
/// use hubwire::transport::MemoryTransport;
///
/// # fn example() -> Result<(), hubwire::HubError> {
/// let (transport, _server) = MemoryTransport::new();
/// let connection = HubConnectionBuilder::new()
///     .with_url("memory://chat")
///     .with_transport(transport)
///     .build()?;
/// assert_eq!(connection.url(), "memory://chat");
/// # Ok(())
/// # }
/// ```
///
/// ## Token and automatic reconnect
///
/// ```rust
/// use hubwire::HubConnectionBuilder;
/// use hubwire::connection::StaticToken;
/// use hubwire::transport::MemoryTransport;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), hubwire::HubError> {
/// let (transport, _server) = MemoryTransport::new();
/// let connection = HubConnectionBuilder::new()
///     .with_url("memory://chat")
///     .with_transport(transport)
///     .with_access_token_provider(StaticToken::new("secret"))
///     .with_reconnect_interval(Duration::from_secs(2), Some(5))
///     .with_keep_alive_interval(Duration::from_secs(10))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct HubConnectionBuilder {
    url: Option<String>,
    config: HubConnectionConfig,
    transport: Option<Arc<dyn Transport>>,
    protocol: Arc<dyn HubProtocol>,
    token_provider: Option<Arc<dyn AccessTokenProvider>>,
}

impl Default for HubConnectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HubConnectionBuilder {
    /// Creates a builder with default configuration.
    pub fn new() -> Self {
        Self {
            url: None,
            config: HubConnectionConfig::default(),
            transport: None,
            protocol: Arc::new(JsonHubProtocol::new()),
            token_provider: None,
        }
    }

    /// Sets the hub URL. Required.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Uses `transport` instead of the default WebSocket transport.
    pub fn with_transport(self, transport: impl Transport) -> Self {
        self.with_shared_transport(Arc::new(transport))
    }

    /// Uses an already shared transport.
    pub fn with_shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Uses `protocol` instead of the JSON hub protocol.
    pub fn with_protocol(mut self, protocol: impl HubProtocol) -> Self {
        self.protocol = Arc::new(protocol);
        self
    }

    /// Sets the provider of the bearer token sent with each connection
    /// attempt.
    pub fn with_access_token_provider(mut self, provider: impl AccessTokenProvider + 'static) -> Self {
        self.token_provider = Some(Arc::new(provider));
        self
    }

    /// Reconnects automatically after the connection is lost, as decided by
    /// `policy`.
    pub fn with_automatic_reconnect(mut self, policy: impl ReconnectionPolicy + 'static) -> Self {
        self.config.reconnection_policy = Some(Arc::new(policy));
        self
    }

    /// Reconnects at a constant `interval`, at most `max_attempts` times in a
    /// row (unlimited when `None`).
    pub fn with_reconnect_interval(self, interval: Duration, max_attempts: Option<u32>) -> Self {
        self.with_automatic_reconnect(FixedDelays::interval(interval, max_attempts))
    }

    /// Reconnects with exponential backoff starting at `initial_delay`, at
    /// most `max_attempts` times in a row (unlimited when `None`).
    pub fn with_exponential_reconnect(self, initial_delay: Duration, max_attempts: Option<u32>) -> Self {
        let policy = ExponentialBackoff::builder()
            .initial_delay(initial_delay)
            .max_attempts(max_attempts)
            .build();
        self.with_automatic_reconnect(policy)
    }

    /// Also consults the reconnection policy when the first connection
    /// attempt of [`start`](HubConnection::start) fails.
    pub fn with_retry_initial_connection(mut self, retry: bool) -> Self {
        self.config.retry_initial_connection = retry;
        self
    }

    /// Sets the keep-alive ping interval.
    pub fn with_keep_alive_interval(mut self, interval: Duration) -> Self {
        self.config.keep_alive_interval = interval;
        self
    }

    /// Sets the server timeout.
    pub fn with_server_timeout(mut self, timeout: Duration) -> Self {
        self.config.server_timeout = timeout;
        self
    }

    /// Sets the handshake timeout.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    /// Adds a header sent when opening the transport.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.push((name.into(), value.into()));
        self
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, config: HubConnectionConfig) -> Self {
        self.config = config;
        self
    }

    /// Modifies the configuration in place.
    ///
    /// ```rust
    /// use hubwire::HubConnectionBuilder;
    /// use std::time::Duration;
    ///
    /// let builder = HubConnectionBuilder::new()
    ///     .configure(|config| config.with_server_timeout(Duration::from_secs(60)));
    /// ```
    pub fn configure<F>(mut self, f: F) -> Self
    where
        F: FnOnce(HubConnectionConfig) -> HubConnectionConfig,
    {
        self.config = f(self.config);
        self
    }

    /// Builds the connection. It starts `Disconnected`.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidConfiguration`] if:
    /// - no URL was given, or it is empty
    /// - a timeout or interval is zero
    /// - no transport was given and the `websocket` feature is disabled
    /// - the default WebSocket transport cannot use the URL
    pub fn build(self) -> Result<HubConnection, HubError> {
        let url = match self.url {
            Some(url) if !url.trim().is_empty() => url,
            _ => return Err(HubError::invalid_configuration("hub url must not be empty")),
        };
        self.config.validate()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport(&url)?,
        };

        tracing::debug!(
            url = %url,
            transport = transport.name(),
            protocol = self.protocol.name(),
            "built hub connection"
        );
        Ok(HubConnection::new(
            url,
            self.config,
            transport,
            self.protocol,
            self.token_provider,
        ))
    }
}

#[cfg(feature = "websocket")]
fn default_transport(url: &str) -> Result<Arc<dyn Transport>, HubError> {
    use crate::transport::WebSocketTransport;

    WebSocketTransport::websocket_url(url)
        .map_err(|e| HubError::invalid_configuration(e.to_string()))?;
    Ok(Arc::new(WebSocketTransport::default()))
}

#[cfg(not(feature = "websocket"))]
fn default_transport(_url: &str) -> Result<Arc<dyn Transport>, HubError> {
    Err(HubError::invalid_configuration(
        "no transport configured and the websocket feature is disabled",
    ))
}

impl std::fmt::Debug for HubConnectionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubConnectionBuilder")
            .field("url", &self.url)
            .field("config", &self.config)
            .field("transport", &self.transport.as_ref().map(|t| t.name()))
            .field("protocol", &self.protocol.name())
            .field("token_provider", &self.token_provider.is_some())
            .finish()
    }
}
