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

//! The per-connection background task.
//!
//! One driver runs from a successful `start` until the connection ends for
//! good, surviving reconnects. It owns the transport receiver, decodes
//! inbound records, dispatches them, keeps the connection alive, and runs
//! the reconnect loop when the transport is lost.

use crate::HubError;
use crate::connection::handlers::{run_handlers, run_observer};
use crate::connection::hub::{Inner, Installed};
use crate::connection::state::HubConnectionState;
use crate::protocol::{CompletionMessage, HubMessage, InvocationMessage};
use crate::reconnection::{ReconnectionPolicy, RetryContext};
use crate::transport::TransportReceiver;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

/// Why a receive loop ended.
#[derive(Debug)]
enum Ended {
    /// `stop` was called.
    Stopped,
    /// The transport failed, closed, timed out or sent garbage.
    Lost(HubError),
    /// The server sent a Close record.
    ServerClosed {
        error: Option<String>,
        allow_reconnect: bool,
    },
}

/// Resolves once the stop signal is raised or its sender is gone.
pub(crate) async fn stopped(stop_rx: &mut watch::Receiver<bool>) {
    loop {
        if *stop_rx.borrow_and_update() {
            return;
        }
        if stop_rx.changed().await.is_err() {
            return;
        }
    }
}

pub(crate) async fn drive(
    inner: Arc<Inner>,
    mut generation: u64,
    installed: Installed,
    mut stop_rx: watch::Receiver<bool>,
) {
    let Installed {
        mut receiver,
        leftover: mut buffer,
        mut metadata,
    } = installed;
    loop {
        let ended = receive_loop(&inner, generation, receiver.as_mut(), &mut buffer, &mut stop_rx).await;
        let (error, may_reconnect) = match ended {
            Ended::Stopped => {
                debug!("connection driver stopped");
                return;
            }
            Ended::Lost(error) => {
                warn!(
                    error = %error,
                    transport_id = %metadata.id,
                    connected_for = ?metadata.age(),
                    "connection lost"
                );
                (error, true)
            }
            Ended::ServerClosed {
                error,
                allow_reconnect,
            } => {
                info!(
                    error = ?error,
                    allow_reconnect,
                    transport_id = %metadata.id,
                    connected_for = ?metadata.age(),
                    "server closed the connection"
                );
                let reason = match error {
                    Some(error) => format!("server closed the connection with an error: {error}"),
                    None => "server closed the connection".to_string(),
                };
                (HubError::connection_lost(reason), allow_reconnect)
            }
        };
        drop(receiver);
        inner.close_writer(Some(generation)).await;

        let policy = inner
            .config
            .reconnection_policy
            .clone()
            .filter(|_| may_reconnect);
        let Some(policy) = policy else {
            finish(&inner, generation, error);
            return;
        };

        match reconnect(&inner, generation, policy.as_ref(), error, &mut stop_rx).await {
            Some((next, installed)) => {
                generation = next;
                receiver = installed.receiver;
                buffer = installed.leftover;
                metadata = installed.metadata;
            }
            None => return,
        }
    }
}

async fn receive_loop(
    inner: &Arc<Inner>,
    generation: u64,
    receiver: &mut dyn TransportReceiver,
    buffer: &mut Vec<u8>,
    stop_rx: &mut watch::Receiver<bool>,
) -> Ended {
    loop {
        loop {
            let total = buffer.len();
            let decoded = inner
                .protocol
                .decode(buffer.as_slice())
                .map(|(message, rest)| (message, total - rest.len()));
            match decoded {
                Ok((Some(message), consumed)) => {
                    buffer.drain(..consumed);
                    inner.metrics.record_message_received();
                    if let Some(ended) = dispatch(inner, generation, message).await {
                        return ended;
                    }
                }
                Ok((None, _)) => break,
                Err(e) => {
                    error!(error = %e, "malformed record, closing connection");
                    return Ended::Lost(e.into());
                }
            }
        }

        let deadline = inner.lock().keepalive.next_deadline();
        tokio::select! {
            biased;
            _ = stopped(stop_rx) => return Ended::Stopped,
            received = receiver.recv() => match received {
                Some(Ok(bytes)) => {
                    inner.lock().keepalive.on_received(Instant::now());
                    inner.metrics.record_bytes_received(bytes.len());
                    buffer.extend_from_slice(&bytes);
                }
                Some(Err(e)) => return Ended::Lost(e.into()),
                None => return Ended::Lost(HubError::connection_lost("transport closed")),
            },
            _ = tokio::time::sleep_until(deadline) => {
                let now = Instant::now();
                let (timed_out, ping_due) = {
                    let shared = inner.lock();
                    (shared.keepalive.timed_out(now), shared.keepalive.ping_due(now))
                };
                if timed_out {
                    let timeout = inner.config.server_timeout;
                    warn!(?timeout, "server timeout elapsed without receiving a message");
                    return Ended::Lost(HubError::connection_lost(format!(
                        "server timeout elapsed ({timeout:?}) without receiving a message"
                    )));
                }
                if ping_due {
                    trace!("sending keep-alive ping");
                    if let Err(e) = inner.write_record(generation, &HubMessage::Ping).await {
                        return Ended::Lost(e);
                    }
                    inner.metrics.record_ping();
                }
            }
        }
    }
}

/// Handles one inbound record. Returns `Some` if the record ends the
/// connection.
async fn dispatch(inner: &Arc<Inner>, generation: u64, message: HubMessage) -> Option<Ended> {
    match message {
        HubMessage::Invocation(invocation) => {
            handle_invocation(inner, generation, invocation).await;
        }
        HubMessage::StreamItem(stream_item) => {
            inner
                .lock()
                .registry
                .push_stream_item(&stream_item.invocation_id, stream_item.item);
        }
        HubMessage::Completion(completion) => {
            let invocation_id = completion.invocation_id.clone();
            let outcome = completion.into_outcome();
            inner.lock().registry.resolve_completion(&invocation_id, outcome);
        }
        HubMessage::StreamInvocation(stream_invocation) => {
            warn!(
                method = %stream_invocation.target,
                "server requested a client-side stream, which is not supported"
            );
            reply(
                inner,
                generation,
                CompletionMessage::with_error(
                    stream_invocation.invocation_id,
                    "Client does not support streaming invocations",
                ),
            )
            .await;
        }
        HubMessage::CancelInvocation(cancel) => {
            let failed = inner.lock().registry.fail(
                &cancel.invocation_id,
                HubError::Invocation {
                    message: "invocation cancelled by the server".to_string(),
                },
            );
            debug!(invocation_id = %cancel.invocation_id, failed, "server cancelled an invocation");
        }
        HubMessage::Ping => trace!("ping received"),
        HubMessage::Close(close) => {
            return Some(Ended::ServerClosed {
                error: close.error,
                allow_reconnect: close.allow_reconnect,
            });
        }
        HubMessage::Unknown { message_type } => {
            debug!(message_type, "ignoring record of unknown type");
        }
    }
    None
}

async fn handle_invocation(inner: &Arc<Inner>, generation: u64, invocation: InvocationMessage) {
    let InvocationMessage {
        invocation_id,
        target,
        arguments,
        ..
    } = invocation;
    let handlers = inner.lock().handlers.handlers_for(&target);
    if handlers.is_empty() {
        warn!(method = %target, "no handler registered for client method");
    }

    let outcome = run_handlers(&target, &handlers, &arguments);
    for _ in 0..outcome.failed {
        inner.metrics.record_handler_failure();
    }

    let Some(invocation_id) = invocation_id else {
        return;
    };
    let completion = if handlers.is_empty() {
        CompletionMessage::with_error(
            invocation_id,
            format!("Client did not provide a result for '{target}'"),
        )
    } else if let Some(error) = outcome.first_error {
        CompletionMessage::with_error(invocation_id, error)
    } else {
        CompletionMessage::with_result(invocation_id, Value::Null)
    };
    reply(inner, generation, completion).await;
}

async fn reply(inner: &Arc<Inner>, generation: u64, completion: CompletionMessage) {
    let invocation_id = completion.invocation_id.clone();
    if let Err(e) = inner
        .write_record(generation, &HubMessage::Completion(completion))
        .await
    {
        debug!(invocation_id = %invocation_id, error = %e, "failed to send completion");
    }
}

/// Reason recorded on drained invocations.
fn loss_reason(error: &HubError) -> String {
    match error {
        HubError::ConnectionLost { reason } => reason.clone(),
        other => other.to_string(),
    }
}

/// Ends the connection for good after an unrecovered loss.
fn finish(inner: &Arc<Inner>, generation: u64, error: HubError) {
    let observers = {
        let mut shared = inner.lock();
        if shared.generation != generation {
            return;
        }
        shared.state = HubConnectionState::Disconnected;
        shared.connection_id = None;
        shared.generation += 1;
        let drained = shared.registry.drain_all(&loss_reason(&error));
        shared.stop_tx = None;
        shared.driver = None;
        debug!(drained, "connection closed");
        shared.observers.close.clone()
    };
    info!(error = %error, "hub connection closed");
    for observer in observers {
        run_observer("close", || observer(Some(&error)));
    }
}

/// Runs reconnect attempts until one succeeds, the policy gives up or the
/// connection is stopped.
///
/// Returns the new generation and the installed connection on success.
async fn reconnect(
    inner: &Arc<Inner>,
    generation: u64,
    policy: &dyn ReconnectionPolicy,
    error: HubError,
    stop_rx: &mut watch::Receiver<bool>,
) -> Option<(u64, Installed)> {
    {
        let mut shared = inner.lock();
        if shared.generation != generation {
            return None;
        }
        shared.state = HubConnectionState::Reconnecting;
        shared.connection_id = None;
        let drained = shared.registry.drain_all(&loss_reason(&error));
        debug!(drained, "pending invocations failed, reconnecting");
    }

    let lost_at = Instant::now();
    let mut attempts = 0u32;
    let mut last_error = error;
    loop {
        let context = RetryContext {
            previous_retry_count: attempts,
            elapsed: lost_at.elapsed(),
            retry_reason: &last_error,
        };
        let Some(delay) = policy.next_retry_delay(&context) else {
            warn!(attempts, policy = policy.name(), "reconnection gave up");
            let exhausted = HubError::ReconnectExhausted {
                attempts,
                last_error: last_error.to_string(),
            };
            finish(inner, generation, exhausted);
            return None;
        };
        info!(attempt = attempts + 1, ?delay, policy = policy.name(), "reconnecting");

        tokio::select! {
            biased;
            _ = stopped(stop_rx) => return None,
            _ = tokio::time::sleep(delay) => {}
        }

        let observers = {
            let shared = inner.lock();
            if shared.generation != generation {
                return None;
            }
            shared.observers.reconnecting.clone()
        };
        for observer in observers {
            run_observer("reconnecting", || observer(&last_error));
        }

        attempts += 1;
        policy.on_attempt();
        inner.metrics.record_reconnect_attempt();

        let attempt = tokio::select! {
            biased;
            _ = stopped(stop_rx) => return None,
            result = inner.connect_once(generation, false) => result,
        };
        let established = match attempt {
            Ok(established) => established,
            Err(e) => {
                warn!(attempt = attempts, error = %e, "reconnect attempt failed");
                policy.on_attempt_failed(&e);
                if !e.is_recoverable() && !policy.retry_unrecoverable() {
                    warn!(attempts, error = %e, "unrecoverable error, reconnection stopped");
                    let exhausted = HubError::ReconnectExhausted {
                        attempts,
                        last_error: e.to_string(),
                    };
                    finish(inner, generation, exhausted);
                    return None;
                }
                last_error = e;
                continue;
            }
        };

        let next = {
            let mut shared = inner.lock();
            if shared.generation != generation {
                return None;
            }
            shared.generation += 1;
            shared.generation
        };
        let installed = match inner.install(next, established).await {
            Ok(installed) => installed,
            Err(_) => return None,
        };
        policy.on_reconnected();
        let connection_id = installed.metadata.connection_id.clone();
        info!(
            attempts,
            transport_id = %installed.metadata.id,
            connection_id = ?connection_id,
            "reconnected"
        );

        let observers = inner.lock().observers.reconnected.clone();
        for observer in observers {
            run_observer("reconnected", || observer(connection_id.as_deref()));
        }
        return Some((next, installed));
    }
}
