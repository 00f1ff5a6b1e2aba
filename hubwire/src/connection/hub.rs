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

//! The hub connection and its public API.
//!
//! # Locking
//!
//! Mutable connection state lives in one [`parking_lot::Mutex`] that is
//! never held across an `.await` or while user callbacks run. Writes go
//! through a separate async mutex holding the transport sender, tagged with
//! the generation of the connection that opened it.
//!
//! Every start, reconnect and stop bumps the generation. A task that
//! observes a different generation than the one it started with has been
//! superseded and must not touch the connection any more.

use crate::HubError;
use crate::connection::config::HubConnectionConfig;
use crate::connection::driver;
use crate::connection::handlers::{HandlerError, HandlerId, HandlerRegistry, Observers, run_observer};
use crate::connection::keepalive::KeepAliveMonitor;
use crate::connection::state::HubConnectionState;
use crate::connection::token::AccessTokenProvider;
use crate::connection::HubConnectionBuilder;
use crate::invocation::{HubStream, InvocationControl, InvocationRegistry, PendingGuard, UploadStream};
use crate::observability::{HubMetrics, HubMetricsSnapshot};
use crate::protocol::{
    CancelInvocationMessage, HandshakeNegotiator, HubMessage, HubProtocol, InvocationMessage,
    StreamInvocationMessage,
};
use crate::reconnection::{ReconnectionMetrics, RetryContext};
use crate::transport::{Transport, TransportMetadata, TransportReceiver, TransportSender};
use async_trait::async_trait;
use parking_lot::{Mutex, MutexGuard};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex as AsyncMutex, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

/// A client connection to a hub.
///
/// Cheap to clone; all clones share the same underlying connection.
///
/// # Examples
///
/// ```rust,no_run
/// use hubwire::HubConnectionBuilder;
/// use serde_json::json;
///
/// # async fn example() -> Result<(), hubwire::HubError> {
/// let connection = HubConnectionBuilder::new()
///     .with_url("ws://localhost:5000/chat")
///     .build()?;
///
/// connection.on("ReceiveMessage", |args| {
///     println!("{args:?}");
///     Ok(())
/// });
///
/// connection.start().await?;
/// let sum: i64 = connection.invoke_as("Add", vec![json!(2), json!(3)]).await?;
/// assert_eq!(sum, 5);
/// connection.stop().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HubConnection {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    pub(crate) url: String,
    pub(crate) config: HubConnectionConfig,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) protocol: Arc<dyn HubProtocol>,
    pub(crate) token_provider: Option<Arc<dyn AccessTokenProvider>>,
    pub(crate) metrics: HubMetrics,
    shared: Mutex<Shared>,
    writer: AsyncMutex<Option<Writer>>,
}

pub(crate) struct Shared {
    pub(crate) state: HubConnectionState,
    pub(crate) connection_id: Option<String>,
    pub(crate) generation: u64,
    pub(crate) registry: InvocationRegistry,
    pub(crate) handlers: HandlerRegistry,
    pub(crate) keepalive: KeepAliveMonitor,
    pub(crate) observers: Observers,
    pub(crate) stop_tx: Option<watch::Sender<bool>>,
    pub(crate) driver: Option<JoinHandle<()>>,
}

struct Writer {
    generation: u64,
    sender: Box<dyn TransportSender>,
}

/// A transport channel that completed the handshake.
pub(crate) struct Established {
    sender: Box<dyn TransportSender>,
    receiver: Box<dyn TransportReceiver>,
    leftover: Vec<u8>,
    metadata: TransportMetadata,
}

/// The read side of an installed connection, handed to the driver.
pub(crate) struct Installed {
    pub(crate) receiver: Box<dyn TransportReceiver>,
    /// Bytes received together with the handshake response.
    pub(crate) leftover: Vec<u8>,
    pub(crate) metadata: TransportMetadata,
}

impl Inner {
    pub(crate) fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock()
    }

    pub(crate) fn set_state_if(&self, generation: u64, state: HubConnectionState) {
        let mut shared = self.lock();
        if shared.generation == generation {
            shared.state = state;
        }
    }

    fn connected_generation(&self) -> Result<u64, HubError> {
        let shared = self.lock();
        if shared.state.is_connected() {
            Ok(shared.generation)
        } else {
            Err(HubError::NotConnected)
        }
    }

    /// Opens the transport and performs the handshake.
    ///
    /// The access token is fetched anew for every call. `initial` moves the
    /// state to `Negotiating` once the transport is open; reconnects stay
    /// in `Reconnecting`.
    pub(crate) async fn connect_once(&self, generation: u64, initial: bool) -> Result<Established, HubError> {
        let mut headers = self.config.headers.clone();
        if let Some(provider) = &self.token_provider {
            let token = provider.access_token().await.map_err(|e| HubError::TokenProvider {
                reason: e.to_string(),
            })?;
            headers.retain(|(name, _)| !name.eq_ignore_ascii_case("Authorization"));
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        debug!(url = %self.url, transport = self.transport.name(), "opening transport");
        let channel = self.transport.open(&self.url, &headers).await?;
        debug!(
            transport_id = %channel.metadata.id,
            peer_addr = ?channel.metadata.peer_addr,
            "transport opened"
        );
        if initial {
            self.set_state_if(generation, HubConnectionState::Negotiating);
        }

        let mut sender = channel.sender;
        let mut receiver = channel.receiver;
        let mut negotiator = HandshakeNegotiator::new(self.protocol.as_ref(), self.config.handshake_timeout);
        match negotiator.negotiate(sender.as_mut(), receiver.as_mut()).await {
            Ok(leftover) => Ok(Established {
                sender,
                receiver,
                leftover,
                metadata: channel.metadata,
            }),
            Err(e) => {
                let _ = sender.close().await;
                Err(e.into())
            }
        }
    }

    /// First connection attempt of `start`, retried through the policy when
    /// `retry_initial_connection` is set.
    async fn connect_initial(&self, generation: u64) -> Result<Established, HubError> {
        let error = match self.connect_once(generation, true).await {
            Ok(established) => return Ok(established),
            Err(error) => error,
        };
        let policy = match (&self.config.reconnection_policy, self.config.retry_initial_connection) {
            (Some(policy), true) if error.is_recoverable() || policy.retry_unrecoverable() => {
                policy.clone()
            }
            _ => return Err(error),
        };

        let started = Instant::now();
        let mut attempts = 0u32;
        let mut last_error = error;
        loop {
            let context = RetryContext {
                previous_retry_count: attempts,
                elapsed: started.elapsed(),
                retry_reason: &last_error,
            };
            let Some(delay) = policy.next_retry_delay(&context) else {
                if attempts == 0 {
                    return Err(last_error);
                }
                return Err(HubError::ReconnectExhausted {
                    attempts,
                    last_error: last_error.to_string(),
                });
            };
            warn!(error = %last_error, ?delay, "initial connection failed, retrying");
            tokio::time::sleep(delay).await;

            attempts += 1;
            policy.on_attempt();
            self.metrics.record_reconnect_attempt();
            self.set_state_if(generation, HubConnectionState::Connecting);
            match self.connect_once(generation, true).await {
                Ok(established) => {
                    policy.on_reconnected();
                    return Ok(established);
                }
                Err(e) => {
                    policy.on_attempt_failed(&e);
                    if !e.is_recoverable() && !policy.retry_unrecoverable() {
                        return Err(HubError::ReconnectExhausted {
                            attempts,
                            last_error: e.to_string(),
                        });
                    }
                    last_error = e;
                }
            }
        }
    }

    /// Makes `established` the live connection for `generation`.
    ///
    /// Fails if the generation was superseded while connecting.
    pub(crate) async fn install(
        &self,
        generation: u64,
        established: Established,
    ) -> Result<Installed, HubError> {
        let Established {
            sender,
            receiver,
            leftover,
            metadata,
        } = established;

        *self.writer.lock().await = Some(Writer { generation, sender });

        let installed = {
            let mut shared = self.lock();
            if shared.generation == generation {
                shared.state = HubConnectionState::Connected;
                shared.connection_id = metadata.connection_id.clone();
                shared.keepalive.reset(Instant::now());
                true
            } else {
                false
            }
        };
        if !installed {
            self.close_writer(Some(generation)).await;
            return Err(HubError::connection_lost("connection stopped"));
        }
        self.metrics.record_connection_opened();
        Ok(Installed {
            receiver,
            leftover,
            metadata,
        })
    }

    /// Closes the writer, only if it belongs to `generation` when given.
    pub(crate) async fn close_writer(&self, generation: Option<u64>) {
        let writer = {
            let mut slot = self.writer.lock().await;
            match (slot.as_ref(), generation) {
                (Some(w), Some(g)) if w.generation != g => None,
                _ => slot.take(),
            }
        };
        if let Some(mut writer) = writer {
            if let Err(e) = writer.sender.close().await {
                debug!(error = %e, "error closing transport");
            }
        }
    }

    /// Encodes `message` and writes it on the connection of `generation`.
    pub(crate) async fn write_record(&self, generation: u64, message: &HubMessage) -> Result<(), HubError> {
        let bytes = self.protocol.encode(message)?;
        let len = bytes.len();
        {
            let mut slot = self.writer.lock().await;
            match slot.as_mut() {
                Some(writer) if writer.generation == generation => writer.sender.send(bytes).await?,
                _ => return Err(HubError::NotConnected),
            }
        }
        self.lock().keepalive.on_sent(Instant::now());
        self.metrics.record_message_sent(len);
        trace!(message_type = ?message.message_type(), bytes = len, "record sent");
        Ok(())
    }

    async fn send_record(&self, message: HubMessage) -> Result<(), HubError> {
        let generation = self.connected_generation()?;
        self.write_record(generation, &message).await
    }

    fn fail_start(&self, generation: u64) {
        let mut shared = self.lock();
        if shared.generation == generation {
            shared.state = HubConnectionState::Disconnected;
            shared.connection_id = None;
            shared.stop_tx = None;
        }
    }
}

#[async_trait]
impl InvocationControl for Inner {
    fn cancel_invocation(self: Arc<Self>, invocation_id: &str) {
        let (kind, generation, connected) = {
            let mut shared = self.lock();
            (
                shared.registry.cancel(invocation_id),
                shared.generation,
                shared.state.is_connected(),
            )
        };
        let Some(kind) = kind else {
            return;
        };
        if !kind.emits_cancel() || !connected {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!(invocation_id, "no runtime available to send CancelInvocation");
            return;
        };
        let message = HubMessage::CancelInvocation(CancelInvocationMessage::new(invocation_id));
        runtime.spawn(async move {
            if let Err(e) = self.write_record(generation, &message).await {
                debug!(error = %e, "failed to send CancelInvocation");
            }
        });
    }

    async fn send_message(&self, message: HubMessage) -> Result<(), HubError> {
        self.send_record(message).await
    }
}

impl HubConnection {
    pub(crate) fn new(
        url: String,
        config: HubConnectionConfig,
        transport: Arc<dyn Transport>,
        protocol: Arc<dyn HubProtocol>,
        token_provider: Option<Arc<dyn AccessTokenProvider>>,
    ) -> Self {
        let keepalive = KeepAliveMonitor::new(config.keep_alive_interval, config.server_timeout, Instant::now());
        let shared = Shared {
            state: HubConnectionState::Disconnected,
            connection_id: None,
            generation: 0,
            registry: InvocationRegistry::new(),
            handlers: HandlerRegistry::new(),
            keepalive,
            observers: Observers::default(),
            stop_tx: None,
            driver: None,
        };
        Self {
            inner: Arc::new(Inner {
                url,
                config,
                transport,
                protocol,
                token_provider,
                metrics: HubMetrics::new(),
                shared: Mutex::new(shared),
                writer: AsyncMutex::new(None),
            }),
        }
    }

    /// Returns a builder for configuring a new connection.
    pub fn builder() -> HubConnectionBuilder {
        HubConnectionBuilder::new()
    }

    /// Starts the connection: opens the transport, performs the handshake
    /// and starts the receive loop.
    ///
    /// # Errors
    ///
    /// - [`HubError::InvalidState`] if the connection is not `Disconnected`
    /// - the transport, token or negotiation error that made the attempt
    ///   fail; the connection is `Disconnected` again afterwards
    /// - [`HubError::ConnectionLost`] if [`stop`](Self::stop) was called
    ///   while starting
    pub async fn start(&self) -> Result<(), HubError> {
        let inner = &self.inner;
        let (generation, stop_rx) = {
            let mut shared = inner.lock();
            if shared.state != HubConnectionState::Disconnected {
                return Err(HubError::InvalidState {
                    reason: format!("cannot start a connection that is {}", shared.state),
                });
            }
            shared.state = HubConnectionState::Connecting;
            shared.generation += 1;
            let (stop_tx, stop_rx) = watch::channel(false);
            shared.stop_tx = Some(stop_tx);
            (shared.generation, stop_rx)
        };
        info!(url = %inner.url, transport = inner.transport.name(), "starting hub connection");

        let mut stop_signal = stop_rx.clone();
        let connected = tokio::select! {
            biased;
            _ = driver::stopped(&mut stop_signal) => Err(HubError::connection_lost("connection stopped")),
            result = inner.connect_initial(generation) => result,
        };
        let established = match connected {
            Ok(established) => established,
            Err(e) => {
                warn!(error = %e, "failed to start hub connection");
                inner.fail_start(generation);
                return Err(e);
            }
        };
        let installed = match inner.install(generation, established).await {
            Ok(installed) => installed,
            Err(e) => {
                inner.fail_start(generation);
                return Err(e);
            }
        };

        let transport_id = installed.metadata.id;
        let connection_id = installed.metadata.connection_id.clone();
        let task = tokio::spawn(driver::drive(inner.clone(), generation, installed, stop_rx));
        let observers = {
            let mut shared = inner.lock();
            if shared.generation != generation {
                return Err(HubError::connection_lost("connection stopped"));
            }
            shared.driver = Some(task);
            shared.observers.open.clone()
        };
        info!(%transport_id, connection_id = ?connection_id, "hub connection started");
        for observer in observers {
            run_observer("open", || observer());
        }
        Ok(())
    }

    /// Stops the connection.
    ///
    /// Every pending invocation fails with [`HubError::ConnectionLost`],
    /// the transport is closed and `on_close` observers are notified with
    /// `None`. Stopping a disconnected connection does nothing. A start in
    /// progress is aborted.
    pub async fn stop(&self) -> Result<(), HubError> {
        let inner = &self.inner;
        let (previous, stop_tx, task, drained) = {
            let mut shared = inner.lock();
            let previous = shared.state;
            if previous == HubConnectionState::Disconnected && shared.stop_tx.is_none() {
                return Ok(());
            }
            shared.state = HubConnectionState::Disconnected;
            shared.connection_id = None;
            shared.generation += 1;
            let drained = shared.registry.drain_all("connection stopped");
            (previous, shared.stop_tx.take(), shared.driver.take(), drained)
        };
        info!(state = %previous, drained, "stopping hub connection");

        if let Some(stop_tx) = stop_tx {
            stop_tx.send_replace(true);
        }
        if let Some(task) = task {
            if let Err(e) = task.await {
                if e.is_panic() {
                    error!("connection driver panicked");
                }
            }
        }
        inner.close_writer(None).await;

        if matches!(
            previous,
            HubConnectionState::Connected | HubConnectionState::Reconnecting
        ) {
            let observers = inner.lock().observers.close.clone();
            for observer in observers {
                run_observer("close", || observer(None));
            }
        }
        Ok(())
    }

    /// Registers a handler for the client method `method`.
    ///
    /// Several handlers may be registered for one method; they run in
    /// registration order. Method names are case-sensitive.
    pub fn on<F>(&self, method: &str, handler: F) -> HandlerId
    where
        F: Fn(&[Value]) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.inner.lock().handlers.add(method, Arc::new(handler))
    }

    /// Removes one handler for `method`, or all of them when `id` is
    /// `None`. Returns the number of handlers removed.
    pub fn off(&self, method: &str, id: Option<HandlerId>) -> usize {
        self.inner.lock().handlers.remove(method, id)
    }

    /// Removes every handler.
    pub fn clear_handlers(&self) {
        self.inner.lock().handlers.clear();
    }

    /// Registers an observer called each time the connection starts.
    pub fn on_open<F>(&self, observer: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.lock().observers.open.push(Arc::new(observer));
    }

    /// Registers an observer called when the connection ends for good.
    ///
    /// Receives `None` after [`stop`](Self::stop), otherwise the error that
    /// ended the connection.
    pub fn on_close<F>(&self, observer: F)
    where
        F: Fn(Option<&HubError>) + Send + Sync + 'static,
    {
        self.inner.lock().observers.close.push(Arc::new(observer));
    }

    /// Registers an observer called before each reconnect attempt.
    pub fn on_reconnecting<F>(&self, observer: F)
    where
        F: Fn(&HubError) + Send + Sync + 'static,
    {
        self.inner.lock().observers.reconnecting.push(Arc::new(observer));
    }

    /// Registers an observer called after a successful reconnect with the
    /// new connection id.
    pub fn on_reconnected<F>(&self, observer: F)
    where
        F: Fn(Option<&str>) + Send + Sync + 'static,
    {
        self.inner.lock().observers.reconnected.push(Arc::new(observer));
    }

    /// Invokes `method` without expecting a reply.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotConnected`] unless the connection is
    /// `Connected`, or the error that made the write fail.
    pub async fn send(&self, method: &str, arguments: Vec<Value>) -> Result<(), HubError> {
        let message = HubMessage::Invocation(InvocationMessage::new(method, arguments));
        self.inner.send_record(message).await?;
        self.inner.metrics.record_invocation();
        Ok(())
    }

    /// Invokes `method` and waits for its completion.
    ///
    /// Resolves to the completion's result, or `Value::Null` for a
    /// completion without one. Dropping the returned future, e.g. on a
    /// timeout, forgets the invocation; a later completion is ignored.
    ///
    /// # Errors
    ///
    /// - [`HubError::NotConnected`] unless the connection is `Connected`
    /// - [`HubError::Invocation`] if the server completed with an error
    /// - [`HubError::ConnectionLost`] if the connection ended first
    pub async fn invoke(&self, method: &str, arguments: Vec<Value>) -> Result<Value, HubError> {
        let (generation, invocation_id, result) = {
            let mut shared = self.inner.lock();
            if !shared.state.is_connected() {
                return Err(HubError::NotConnected);
            }
            let (invocation_id, result) = shared.registry.register_unary();
            (shared.generation, invocation_id, result)
        };
        debug!(method, invocation_id = %invocation_id, "invoking hub method");
        let _pending = PendingGuard::new(invocation_id.clone(), self.control());

        let message = HubMessage::Invocation(
            InvocationMessage::new(method, arguments).with_invocation_id(invocation_id.clone()),
        );
        match self.inner.write_record(generation, &message).await {
            Ok(()) => self.inner.metrics.record_invocation(),
            Err(e) => {
                self.inner.lock().registry.fail(&invocation_id, e);
            }
        }
        result
            .await
            .unwrap_or_else(|_| Err(HubError::connection_lost("invocation dropped")))
    }

    /// Invokes `method` and deserializes the result into `T`.
    ///
    /// # Errors
    ///
    /// As [`invoke`](Self::invoke), plus [`HubError::Deserialize`] if the
    /// result does not fit `T`.
    pub async fn invoke_as<T>(&self, method: &str, arguments: Vec<Value>) -> Result<T, HubError>
    where
        T: DeserializeOwned,
    {
        let value = self.invoke(method, arguments).await?;
        serde_json::from_value(value).map_err(HubError::Deserialize)
    }

    /// Starts a server-to-client stream.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotConnected`] unless the connection is
    /// `Connected`, or the error that made the write fail. Errors after the
    /// stream started are yielded by the stream itself.
    pub async fn stream(&self, method: &str, arguments: Vec<Value>) -> Result<HubStream, HubError> {
        let (generation, invocation_id, events) = {
            let mut shared = self.inner.lock();
            if !shared.state.is_connected() {
                return Err(HubError::NotConnected);
            }
            let (invocation_id, events) = shared.registry.register_stream();
            (shared.generation, invocation_id, events)
        };
        debug!(method, invocation_id = %invocation_id, "starting stream");

        let message = HubMessage::StreamInvocation(StreamInvocationMessage::new(
            invocation_id.clone(),
            method,
            arguments,
        ));
        if let Err(e) = self.inner.write_record(generation, &message).await {
            self.inner.lock().registry.fail(&invocation_id, HubError::Cancelled);
            return Err(e);
        }
        self.inner.metrics.record_invocation();
        Ok(HubStream::new(invocation_id, events, self.control()))
    }

    /// Invokes `method` with one client-to-server stream argument.
    ///
    /// The stream placeholder follows `arguments` on the wire. Push items
    /// through the returned [`UploadStream`], complete it, then await
    /// [`UploadStream::result`] for the invocation's completion.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotConnected`] unless the connection is
    /// `Connected`, or the error that made the write fail.
    pub async fn upload(&self, method: &str, arguments: Vec<Value>) -> Result<UploadStream, HubError> {
        let (generation, invocation_id, stream_id, result) = {
            let mut shared = self.inner.lock();
            if !shared.state.is_connected() {
                return Err(HubError::NotConnected);
            }
            let (invocation_id, result) = shared.registry.register_client_stream();
            let stream_id = shared.registry.next_id();
            (shared.generation, invocation_id, stream_id, result)
        };
        debug!(method, invocation_id = %invocation_id, stream_id = %stream_id, "starting upload");

        let message = HubMessage::Invocation(
            InvocationMessage::new(method, arguments)
                .with_invocation_id(invocation_id.clone())
                .with_stream_ids(vec![stream_id.clone()]),
        );
        if let Err(e) = self.inner.write_record(generation, &message).await {
            self.inner.lock().registry.fail(&invocation_id, HubError::Cancelled);
            return Err(e);
        }
        self.inner.metrics.record_invocation();
        Ok(UploadStream::new(stream_id, invocation_id, self.control(), result))
    }

    fn control(&self) -> Weak<dyn InvocationControl> {
        let control: Weak<Inner> = Arc::downgrade(&self.inner);
        control
    }

    /// Current lifecycle state.
    pub fn state(&self) -> HubConnectionState {
        self.inner.lock().state
    }

    /// Identifier of the current transport connection, if connected and the
    /// transport reported one.
    pub fn connection_id(&self) -> Option<String> {
        self.inner.lock().connection_id.clone()
    }

    /// The hub URL.
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// The connection's configuration.
    pub fn config(&self) -> &HubConnectionConfig {
        &self.inner.config
    }

    /// Number of invocations awaiting a completion.
    pub fn pending_invocations(&self) -> usize {
        self.inner.lock().registry.len()
    }

    /// Snapshot of the connection's traffic counters.
    pub fn metrics(&self) -> HubMetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    /// Metrics of the reconnection policy, if one is configured.
    pub fn reconnection_metrics(&self) -> Option<ReconnectionMetrics> {
        self.inner
            .config
            .reconnection_policy
            .as_ref()
            .map(|policy| policy.metrics())
    }
}

impl fmt::Debug for HubConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.inner.lock();
        f.debug_struct("HubConnection")
            .field("url", &self.inner.url)
            .field("transport", &self.inner.transport.name())
            .field("protocol", &self.inner.protocol.name())
            .field("state", &shared.state)
            .field("connection_id", &shared.connection_id)
            .field("pending", &shared.registry.len())
            .finish()
    }
}
