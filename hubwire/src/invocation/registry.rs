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

//! Tracking of pending invocations awaiting completions.
//!
//! Every outstanding call or stream is registered under a fresh id before
//! anything is sent. Completions, stream items, cancellations and
//! connection loss all remove or feed entries here, and removal is the only
//! way an outcome is delivered, so each invocation observes exactly one
//! outcome no matter how those events race.

use crate::HubError;
use crate::invocation::{InvocationIdGenerator, StreamEvent};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

/// Outcome delivered to a unary or client-stream invocation.
pub type InvocationResult = Result<Value, HubError>;

/// Number of recently cancelled ids remembered to quiet late frames.
const RECENTLY_CANCELLED: usize = 64;

/// Kind of a pending invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationKind {
    /// Request/response call.
    Unary,
    /// Call fed by one or more client-to-server streams.
    ClientStream,
    /// Server-to-client stream.
    ServerStream,
}

impl InvocationKind {
    /// Returns `true` if cancelling this kind must be sent to the server.
    ///
    /// Only server-to-client streams accept a CancelInvocation record.
    pub fn emits_cancel(self) -> bool {
        matches!(self, InvocationKind::ServerStream)
    }
}

impl fmt::Display for InvocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationKind::Unary => f.write_str("unary"),
            InvocationKind::ClientStream => f.write_str("client-stream"),
            InvocationKind::ServerStream => f.write_str("server-stream"),
        }
    }
}

enum Sink {
    Single(oneshot::Sender<InvocationResult>),
    Stream(mpsc::UnboundedSender<StreamEvent>),
}

impl Sink {
    fn finish(self, outcome: InvocationResult) {
        match self {
            Sink::Single(tx) => {
                let _ = tx.send(outcome);
            }
            Sink::Stream(tx) => {
                let event = match outcome {
                    Ok(_) => StreamEvent::Complete,
                    Err(error) => StreamEvent::Error(error),
                };
                let _ = tx.send(event);
            }
        }
    }
}

struct PendingInvocation {
    kind: InvocationKind,
    sink: Sink,
    created_at: Instant,
}

/// Registry of pending invocations.
///
/// The registry is not synchronized on its own; the connection keeps it in
/// its shared-state lock and never awaits while holding it.
///
/// # Examples
///
/// ```rust
/// use hubwire::invocation::InvocationRegistry;
/// use serde_json::json;
///
/// # async fn example() {
/// let mut registry = InvocationRegistry::new();
/// let (id, rx) = registry.register_unary();
///
/// assert!(registry.resolve_completion(&id, Ok(json!(5))));
/// assert_eq!(rx.await.unwrap().unwrap(), json!(5));
///
/// // A second completion for the same id is ignored.
/// assert!(!registry.resolve_completion(&id, Ok(json!(6))));
/// # }
/// ```
pub struct InvocationRegistry {
    ids: InvocationIdGenerator,
    pending: HashMap<String, PendingInvocation>,
    cancelled: VecDeque<String>,
}

impl InvocationRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ids: InvocationIdGenerator::new(),
            pending: HashMap::new(),
            cancelled: VecDeque::with_capacity(RECENTLY_CANCELLED),
        }
    }

    /// Mints an id without registering anything.
    ///
    /// Used for client-to-server stream ids, which share the id space.
    pub fn next_id(&self) -> String {
        self.ids.next()
    }

    /// Registers a request/response invocation.
    pub fn register_unary(&mut self) -> (String, oneshot::Receiver<InvocationResult>) {
        self.register_single(InvocationKind::Unary)
    }

    /// Registers an invocation fed by client-to-server streams.
    pub fn register_client_stream(&mut self) -> (String, oneshot::Receiver<InvocationResult>) {
        self.register_single(InvocationKind::ClientStream)
    }

    /// Registers a server-to-client stream.
    pub fn register_stream(&mut self) -> (String, mpsc::UnboundedReceiver<StreamEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.insert(InvocationKind::ServerStream, Sink::Stream(tx));
        (id, rx)
    }

    fn register_single(
        &mut self,
        kind: InvocationKind,
    ) -> (String, oneshot::Receiver<InvocationResult>) {
        let (tx, rx) = oneshot::channel();
        let id = self.insert(kind, Sink::Single(tx));
        (id, rx)
    }

    fn insert(&mut self, kind: InvocationKind, sink: Sink) -> String {
        let id = self.ids.next();
        trace!(invocation_id = %id, %kind, "registered invocation");
        self.pending.insert(
            id.clone(),
            PendingInvocation {
                kind,
                sink,
                created_at: Instant::now(),
            },
        );
        id
    }

    /// Delivers a completion and removes the invocation.
    ///
    /// `Err` carries the server's error string. Streams end on completion;
    /// a result value on a stream completion is discarded.
    ///
    /// Returns `false` if no invocation with this id is pending.
    pub fn resolve_completion(&mut self, id: &str, outcome: Result<Value, String>) -> bool {
        let Some(pending) = self.pending.remove(id) else {
            if self.was_cancelled(id) {
                trace!(invocation_id = %id, "dropping completion for cancelled invocation");
            } else {
                debug!(invocation_id = %id, "completion for unknown invocation");
            }
            return false;
        };
        trace!(
            invocation_id = %id,
            kind = %pending.kind,
            elapsed = ?pending.created_at.elapsed(),
            "invocation completed"
        );
        pending
            .sink
            .finish(outcome.map_err(|message| HubError::Invocation { message }));
        true
    }

    /// Delivers one item to a pending server-to-client stream.
    ///
    /// Returns `false` if the id is unknown or not a server stream.
    pub fn push_stream_item(&mut self, id: &str, item: Value) -> bool {
        match self.pending.get(id) {
            Some(PendingInvocation {
                sink: Sink::Stream(tx),
                ..
            }) => {
                if tx.send(StreamEvent::Item(item)).is_err() {
                    trace!(invocation_id = %id, "stream consumer gone");
                }
                true
            }
            Some(pending) => {
                debug!(invocation_id = %id, kind = %pending.kind, "stream item for non-stream invocation");
                false
            }
            None if self.was_cancelled(id) => {
                trace!(invocation_id = %id, "dropping stream item for cancelled stream");
                false
            }
            None => {
                warn!(invocation_id = %id, "stream item for unknown stream");
                false
            }
        }
    }

    /// Cancels an invocation, delivering [`HubError::Cancelled`].
    ///
    /// Returns the kind of the removed invocation so the caller can tell the
    /// server about stream cancellations, or `None` if nothing was pending.
    pub fn cancel(&mut self, id: &str) -> Option<InvocationKind> {
        let pending = self.pending.remove(id)?;
        debug!(invocation_id = %id, kind = %pending.kind, "invocation cancelled");
        if self.cancelled.len() == RECENTLY_CANCELLED {
            self.cancelled.pop_front();
        }
        self.cancelled.push_back(id.to_string());
        pending.sink.finish(Err(HubError::Cancelled));
        Some(pending.kind)
    }

    /// Fails one invocation with `error`.
    ///
    /// Returns `false` if nothing was pending under `id`.
    pub fn fail(&mut self, id: &str, error: HubError) -> bool {
        match self.pending.remove(id) {
            Some(pending) => {
                pending.sink.finish(Err(error));
                true
            }
            None => false,
        }
    }

    /// Fails every pending invocation with [`HubError::ConnectionLost`].
    ///
    /// Returns the number of invocations drained.
    pub fn drain_all(&mut self, reason: &str) -> usize {
        let count = self.pending.len();
        if count > 0 {
            debug!(count, reason, "draining pending invocations");
        }
        for (_, pending) in self.pending.drain() {
            pending.sink.finish(Err(HubError::connection_lost(reason)));
        }
        count
    }

    /// Returns the kind of the invocation pending under `id`.
    pub fn kind(&self, id: &str) -> Option<InvocationKind> {
        self.pending.get(id).map(|p| p.kind)
    }

    /// Returns `true` if an invocation is pending under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    /// Number of pending invocations.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn was_cancelled(&self, id: &str) -> bool {
        self.cancelled.iter().any(|c| c == id)
    }
}

impl Default for InvocationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InvocationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationRegistry")
            .field("pending", &self.pending.len())
            .field("next_id", &self.ids.peek())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_register_and_complete() {
        let mut registry = InvocationRegistry::new();
        let (id, rx) = registry.register_unary();
        assert_eq!(id, "1");
        assert_eq!(registry.len(), 1);

        assert!(registry.resolve_completion(&id, Ok(json!("done"))));
        assert_eq!(rx.await.unwrap().unwrap(), json!("done"));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_completion_error() {
        let mut registry = InvocationRegistry::new();
        let (id, rx) = registry.register_unary();

        registry.resolve_completion(&id, Err("boom".to_string()));
        match rx.await.unwrap() {
            Err(HubError::Invocation { message }) => assert_eq!(message, "boom"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_complete_unknown_id() {
        let mut registry = InvocationRegistry::new();
        assert!(!registry.resolve_completion("99", Ok(Value::Null)));
    }

    #[tokio::test]
    async fn test_exactly_once() {
        let mut registry = InvocationRegistry::new();
        let (id, rx) = registry.register_unary();

        assert!(registry.resolve_completion(&id, Ok(json!(1))));
        assert!(!registry.resolve_completion(&id, Ok(json!(2))));
        assert_eq!(registry.cancel(&id), None);
        assert_eq!(registry.drain_all("gone"), 0);
        assert_eq!(rx.await.unwrap().unwrap(), json!(1));
    }

    #[tokio::test]
    async fn test_cancel_then_late_completion() {
        let mut registry = InvocationRegistry::new();
        let (id, rx) = registry.register_unary();

        assert_eq!(registry.cancel(&id), Some(InvocationKind::Unary));
        assert!(!registry.resolve_completion(&id, Ok(json!(5))));
        assert!(matches!(rx.await.unwrap(), Err(HubError::Cancelled)));
    }

    #[tokio::test]
    async fn test_stream_items_and_completion() {
        let mut registry = InvocationRegistry::new();
        let (id, mut rx) = registry.register_stream();
        assert_eq!(registry.kind(&id), Some(InvocationKind::ServerStream));

        for i in 0..3 {
            assert!(registry.push_stream_item(&id, json!(i)));
        }
        assert!(registry.resolve_completion(&id, Ok(Value::Null)));
        assert!(!registry.push_stream_item(&id, json!(3)));

        for i in 0..3 {
            assert!(matches!(rx.recv().await, Some(StreamEvent::Item(v)) if v == json!(i)));
        }
        assert!(matches!(rx.recv().await, Some(StreamEvent::Complete)));
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_stream_item_for_unary_rejected() {
        let mut registry = InvocationRegistry::new();
        let (id, _rx) = registry.register_unary();
        assert!(!registry.push_stream_item(&id, json!(1)));
        assert!(registry.contains(&id));
    }

    #[tokio::test]
    async fn test_fail_single() {
        let mut registry = InvocationRegistry::new();
        let (id, mut rx) = registry.register_stream();
        let (other, other_rx) = registry.register_unary();

        assert!(registry.fail(
            &id,
            HubError::Invocation {
                message: "cancelled by server".to_string()
            }
        ));
        assert!(matches!(
            rx.recv().await,
            Some(StreamEvent::Error(HubError::Invocation { .. }))
        ));
        assert!(registry.contains(&other));
        drop(registry);
        assert!(other_rx.await.is_err());
    }

    #[tokio::test]
    async fn test_drain_all() {
        let mut registry = InvocationRegistry::new();
        let (_, rx1) = registry.register_unary();
        let (_, rx2) = registry.register_client_stream();
        let (_, mut rx3) = registry.register_stream();

        assert_eq!(registry.drain_all("transport closed"), 3);
        assert!(registry.is_empty());
        assert!(matches!(rx1.await.unwrap(), Err(HubError::ConnectionLost { .. })));
        assert!(matches!(rx2.await.unwrap(), Err(HubError::ConnectionLost { .. })));
        assert!(matches!(
            rx3.recv().await,
            Some(StreamEvent::Error(HubError::ConnectionLost { .. }))
        ));
    }

    #[test]
    fn test_ids_unique_across_kinds() {
        let mut registry = InvocationRegistry::new();
        let (a, _) = registry.register_unary();
        let stream_id = registry.next_id();
        let (b, _) = registry.register_stream();
        assert_eq!(a, "1");
        assert_eq!(stream_id, "2");
        assert_eq!(b, "3");
    }

    #[test]
    fn test_kind_emits_cancel() {
        assert!(!InvocationKind::Unary.emits_cancel());
        assert!(!InvocationKind::ClientStream.emits_cancel());
        assert!(InvocationKind::ServerStream.emits_cancel());
    }
}
