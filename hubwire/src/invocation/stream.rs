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

//! Streaming invocations in both directions.
//!
//! - [`HubStream`]: items pushed by the server for a `StreamInvocation`,
//!   consumed as a [`futures_util::Stream`] or through a [`StreamObserver`]
//! - [`UploadStream`]: items pushed by the client for an invocation that
//!   declared `streamIds`

use crate::HubError;
use crate::invocation::InvocationResult;
use crate::protocol::{CompletionMessage, HubMessage, StreamItemMessage};
use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use serde_json::Value;
use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll, ready};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::trace;

/// Event delivered to a server-to-client stream.
#[derive(Debug)]
pub enum StreamEvent {
    /// One item.
    Item(Value),
    /// The server completed the stream.
    Complete,
    /// The stream ended with an error.
    Error(HubError),
}

/// Connection operations needed by stream handles.
///
/// Handles keep a weak reference so an outstanding stream never keeps a
/// dropped connection alive.
#[async_trait]
pub(crate) trait InvocationControl: Send + Sync + 'static {
    /// Cancels the invocation locally and notifies the server if needed.
    ///
    /// Must not block; called from `Drop`.
    fn cancel_invocation(self: Arc<Self>, invocation_id: &str);

    /// Encodes and sends one record on the current connection.
    async fn send_message(&self, message: HubMessage) -> Result<(), HubError>;
}

/// Cancels a pending invocation locally when dropped.
///
/// Held for as long as someone awaits the outcome. Dropping it after the
/// invocation resolved is a no-op, since the registry no longer knows the id.
pub(crate) struct PendingGuard {
    invocation_id: String,
    control: Weak<dyn InvocationControl>,
}

impl PendingGuard {
    pub(crate) fn new(invocation_id: String, control: Weak<dyn InvocationControl>) -> Self {
        Self {
            invocation_id,
            control,
        }
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if let Some(control) = self.control.upgrade() {
            control.cancel_invocation(&self.invocation_id);
        }
    }
}

/// A server-to-client stream.
///
/// Yields `Ok(item)` for every item, then ends after the server completes
/// the stream. An error completion, cancellation by the server, or loss of
/// the connection yields a single `Err` before the end.
///
/// Dropping the stream (or calling [`unsubscribe`](Self::unsubscribe))
/// before it ends cancels it and sends a CancelInvocation record.
///
/// # Examples
///
/// ```rust,no_run
/// use futures_util::StreamExt;
/// use hubwire::HubConnection;
/// use serde_json::json;
///
/// # async fn example(connection: HubConnection) -> Result<(), hubwire::HubError> {
/// let mut stream = connection.stream("Counter", vec![json!(3), json!(10)]).await?;
/// while let Some(item) = stream.next().await {
///     println!("counter: {}", item?);
/// }
/// # Ok(())
/// # }
/// ```
pub struct HubStream {
    invocation_id: String,
    events: mpsc::UnboundedReceiver<StreamEvent>,
    control: Option<Weak<dyn InvocationControl>>,
    finished: bool,
}

impl HubStream {
    pub(crate) fn new(
        invocation_id: String,
        events: mpsc::UnboundedReceiver<StreamEvent>,
        control: Weak<dyn InvocationControl>,
    ) -> Self {
        Self {
            invocation_id,
            events,
            control: Some(control),
            finished: false,
        }
    }

    /// The invocation id of this stream.
    pub fn invocation_id(&self) -> &str {
        &self.invocation_id
    }

    /// Returns `true` once the stream has ended.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Cancels the stream.
    ///
    /// Has no effect if the stream already ended.
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    /// Drives the stream on a background task, feeding `observer`.
    ///
    /// Returns a [`Subscription`] that cancels the stream when
    /// unsubscribed. Must be called within a Tokio runtime.
    pub fn subscribe<O>(mut self, mut observer: O) -> Subscription
    where
        O: StreamObserver,
    {
        let invocation_id = self.invocation_id.clone();
        let task = tokio::spawn(async move {
            while let Some(next) = self.next().await {
                match next {
                    Ok(item) => observer.on_next(item),
                    Err(error) => {
                        observer.on_error(error);
                        return;
                    }
                }
            }
            observer.on_complete();
        });
        Subscription { invocation_id, task }
    }

    fn finish(&mut self) {
        self.finished = true;
        self.control = None;
        self.events.close();
    }

    fn cancel(&mut self) {
        if self.finished {
            return;
        }
        let control = self.control.take().and_then(|weak| weak.upgrade());
        self.finish();
        if let Some(control) = control {
            trace!(invocation_id = %self.invocation_id, "cancelling stream");
            control.cancel_invocation(&self.invocation_id);
        }
    }
}

impl Stream for HubStream {
    type Item = Result<Value, HubError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }
        match ready!(self.events.poll_recv(cx)) {
            Some(StreamEvent::Item(item)) => Poll::Ready(Some(Ok(item))),
            Some(StreamEvent::Complete) => {
                self.finish();
                Poll::Ready(None)
            }
            Some(StreamEvent::Error(error)) => {
                self.finish();
                Poll::Ready(Some(Err(error)))
            }
            None => {
                self.finish();
                Poll::Ready(Some(Err(HubError::connection_lost("connection dropped"))))
            }
        }
    }
}

impl Drop for HubStream {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for HubStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubStream")
            .field("invocation_id", &self.invocation_id)
            .field("finished", &self.finished)
            .finish()
    }
}

/// Callbacks receiving the events of a [`HubStream`].
///
/// Exactly one of [`on_complete`](Self::on_complete) and
/// [`on_error`](Self::on_error) is called, last, unless the subscription is
/// cancelled first.
pub trait StreamObserver: Send + 'static {
    /// Called for each item.
    fn on_next(&mut self, item: Value);

    /// Called when the server completes the stream.
    fn on_complete(&mut self) {}

    /// Called when the stream ends with an error.
    fn on_error(&mut self, error: HubError) {
        let _ = error;
    }
}

type NextFn = Box<dyn FnMut(Value) + Send>;
type CompleteFn = Box<dyn FnMut() + Send>;
type ErrorFn = Box<dyn FnMut(HubError) + Send>;

/// A [`StreamObserver`] assembled from closures.
///
/// # Examples
///
/// ```rust
/// use hubwire::invocation::StreamCallbacks;
///
/// let observer = StreamCallbacks::new(|item| println!("next: {item}"))
///     .on_complete(|| println!("done"))
///     .on_error(|error| eprintln!("failed: {error}"));
/// ```
pub struct StreamCallbacks {
    next: NextFn,
    complete: Option<CompleteFn>,
    error: Option<ErrorFn>,
}

impl StreamCallbacks {
    /// Creates an observer calling `next` for each item.
    pub fn new(next: impl FnMut(Value) + Send + 'static) -> Self {
        Self {
            next: Box::new(next),
            complete: None,
            error: None,
        }
    }

    /// Sets the completion callback.
    pub fn on_complete(mut self, complete: impl FnMut() + Send + 'static) -> Self {
        self.complete = Some(Box::new(complete));
        self
    }

    /// Sets the error callback.
    pub fn on_error(mut self, error: impl FnMut(HubError) + Send + 'static) -> Self {
        self.error = Some(Box::new(error));
        self
    }
}

impl StreamObserver for StreamCallbacks {
    fn on_next(&mut self, item: Value) {
        (self.next)(item);
    }

    fn on_complete(&mut self) {
        if let Some(complete) = self.complete.as_mut() {
            complete();
        }
    }

    fn on_error(&mut self, error: HubError) {
        if let Some(callback) = self.error.as_mut() {
            callback(error);
        }
    }
}

/// Handle to a stream driven by [`HubStream::subscribe`].
#[derive(Debug)]
pub struct Subscription {
    invocation_id: String,
    task: JoinHandle<()>,
}

impl Subscription {
    /// The invocation id of the underlying stream.
    pub fn invocation_id(&self) -> &str {
        &self.invocation_id
    }

    /// Returns `true` once the observer received its final callback.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancels the stream. No further callbacks are made.
    pub fn unsubscribe(self) {
        self.task.abort();
    }
}

/// A client-to-server stream feeding an invocation.
///
/// Created by [`HubConnection::upload`](crate::HubConnection::upload). Send
/// items with [`send`](Self::send), end the stream with
/// [`complete`](Self::complete), then await the server's answer with
/// [`result`](Self::result). Dropping the handle, or the `result` future,
/// before the server answers forgets the invocation locally.
///
/// # Examples
///
/// ```rust,no_run
/// use hubwire::HubConnection;
/// use serde_json::json;
///
/// # async fn example(connection: HubConnection) -> Result<(), hubwire::HubError> {
/// let mut upload = connection.upload("UploadStream", vec![]).await?;
/// for word in ["a", "b", "c"] {
///     upload.send(json!(word)).await?;
/// }
/// upload.complete().await?;
/// let total = upload.result().await?;
/// # Ok(())
/// # }
/// ```
pub struct UploadStream {
    stream_id: String,
    invocation_id: String,
    control: Weak<dyn InvocationControl>,
    result: oneshot::Receiver<InvocationResult>,
    completed: bool,
    pending: PendingGuard,
}

impl UploadStream {
    pub(crate) fn new(
        stream_id: String,
        invocation_id: String,
        control: Weak<dyn InvocationControl>,
        result: oneshot::Receiver<InvocationResult>,
    ) -> Self {
        let pending = PendingGuard::new(invocation_id.clone(), control.clone());
        Self {
            stream_id,
            invocation_id,
            control,
            result,
            completed: false,
            pending,
        }
    }

    /// The stream id announced in the invocation's `streamIds`.
    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    /// The id of the invocation this stream feeds.
    pub fn invocation_id(&self) -> &str {
        &self.invocation_id
    }

    /// Sends one item.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::InvalidState`] after [`complete`](Self::complete)
    /// and [`HubError::NotConnected`] if the connection is gone.
    pub async fn send(&self, item: Value) -> Result<(), HubError> {
        if self.completed {
            return Err(HubError::InvalidState {
                reason: format!("upload stream {} already completed", self.stream_id),
            });
        }
        let message = HubMessage::StreamItem(StreamItemMessage::new(self.stream_id.clone(), item));
        self.control()?.send_message(message).await
    }

    /// Ends the stream successfully.
    pub async fn complete(&mut self) -> Result<(), HubError> {
        self.finish(CompletionMessage::empty(self.stream_id.clone()))
            .await
    }

    /// Ends the stream with an error reported to the server.
    pub async fn complete_with_error(&mut self, error: impl Into<String>) -> Result<(), HubError> {
        self.finish(CompletionMessage::with_error(self.stream_id.clone(), error))
            .await
    }

    /// Waits for the server's completion of the invocation.
    pub async fn result(self) -> Result<Value, HubError> {
        let UploadStream {
            result,
            invocation_id,
            pending,
            ..
        } = self;
        let outcome = result.await.unwrap_or_else(|_| {
            Err(HubError::connection_lost(format!(
                "invocation {invocation_id} was dropped"
            )))
        });
        drop(pending);
        outcome
    }

    async fn finish(&mut self, completion: CompletionMessage) -> Result<(), HubError> {
        if self.completed {
            return Ok(());
        }
        self.control()?
            .send_message(HubMessage::Completion(completion))
            .await?;
        self.completed = true;
        Ok(())
    }

    fn control(&self) -> Result<Arc<dyn InvocationControl>, HubError> {
        self.control.upgrade().ok_or(HubError::NotConnected)
    }
}

impl fmt::Debug for UploadStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadStream")
            .field("stream_id", &self.stream_id)
            .field("invocation_id", &self.invocation_id)
            .field("completed", &self.completed)
            .finish()
    }
}
