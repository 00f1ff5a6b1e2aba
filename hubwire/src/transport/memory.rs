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

//! In-memory transport implementation for testing.
//!
//! This module provides an in-memory transport that uses Tokio channels for
//! communication. Every call to [`Transport::open`] creates a fresh channel
//! pair and hands the server side to the paired [`MemoryServer`], which lets
//! tests script a hub server (including disconnects and reconnects) without
//! any network I/O.

use crate::transport::{
    Transport, TransportChannel, TransportError, TransportId, TransportMetadata,
    TransportReceiver, TransportSender,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Global counter for generating unique transport IDs.
static NEXT_MEMORY_TRANSPORT_ID: AtomicU64 = AtomicU64::new(1);

/// In-memory transport implementation.
///
/// # Examples
///
/// ```rust
/// use hubwire::transport::{MemoryTransport, Transport};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (transport, mut server) = MemoryTransport::new();
///
/// let mut channel = transport.open("memory://hub", &[]).await?;
/// let mut peer = server.accept().await.expect("peer");
///
/// channel.sender.send(b"Hello!".to_vec()).await?;
/// assert_eq!(peer.recv().await.as_deref(), Some(&b"Hello!"[..]));
///
/// peer.send(b"World".to_vec());
/// let reply = channel.receiver.recv().await.expect("open")?;
/// assert_eq!(reply, b"World");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MemoryTransport {
    accept_tx: mpsc::UnboundedSender<MemoryPeer>,
    refuse_remaining: Arc<AtomicU32>,
    opened: Arc<AtomicU32>,
}

/// Server side of a [`MemoryTransport`]: yields one [`MemoryPeer`] per open.
pub struct MemoryServer {
    accept_rx: mpsc::UnboundedReceiver<MemoryPeer>,
}

/// The server end of one opened memory channel.
pub struct MemoryPeer {
    /// URL passed to [`Transport::open`].
    pub url: String,
    /// Headers passed to [`Transport::open`].
    pub headers: Vec<(String, String)>,
    /// Identifier shared with the client's [`TransportMetadata`].
    pub id: TransportId,
    tx: Option<mpsc::UnboundedSender<Result<Vec<u8>, TransportError>>>,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

struct MemorySender {
    tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
}

struct MemoryReceiver {
    rx: mpsc::UnboundedReceiver<Result<Vec<u8>, TransportError>>,
}

impl MemoryTransport {
    /// Creates a transport and the server that accepts its channels.
    pub fn new() -> (Self, MemoryServer) {
        let (accept_tx, accept_rx) = mpsc::unbounded_channel();
        let transport = Self {
            accept_tx,
            refuse_remaining: Arc::new(AtomicU32::new(0)),
            opened: Arc::new(AtomicU32::new(0)),
        };
        (transport, MemoryServer { accept_rx })
    }

    /// Makes the next `count` calls to [`Transport::open`] fail.
    pub fn refuse_next(&self, count: u32) {
        self.refuse_remaining.store(count, Ordering::SeqCst);
    }

    /// Number of channels successfully opened so far.
    pub fn opened(&self) -> u32 {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn open(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<TransportChannel, TransportError> {
        let refused = self
            .refuse_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            debug!(url, "memory transport refusing open");
            return Err(TransportError::connection_failed(url, "connection refused"));
        }

        let (client_tx, server_rx) = mpsc::unbounded_channel();
        let (server_tx, client_rx) = mpsc::unbounded_channel();
        let id = TransportId::new(NEXT_MEMORY_TRANSPORT_ID.fetch_add(1, Ordering::Relaxed));

        let peer = MemoryPeer {
            url: url.to_string(),
            headers: headers.to_vec(),
            id,
            tx: Some(server_tx),
            rx: server_rx,
        };
        self.accept_tx
            .send(peer)
            .map_err(|_| TransportError::connection_failed(url, "memory server dropped"))?;
        self.opened.fetch_add(1, Ordering::SeqCst);

        info!(%id, url, "opened memory transport");

        Ok(TransportChannel::new(
            Box::new(MemorySender {
                tx: Some(client_tx),
            }),
            Box::new(MemoryReceiver { rx: client_rx }),
            TransportMetadata::new(id, "memory").with_connection_id(format!("memory-{}", id.as_u64())),
        ))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

impl MemoryServer {
    /// Waits for the next opened channel.
    ///
    /// Returns `None` once every clone of the transport has been dropped.
    pub async fn accept(&mut self) -> Option<MemoryPeer> {
        self.accept_rx.recv().await
    }

    /// Returns an already-opened channel without waiting.
    pub fn try_accept(&mut self) -> Option<MemoryPeer> {
        self.accept_rx.try_recv().ok()
    }
}

impl MemoryPeer {
    /// Sends one message to the client. Ignored once the peer is closed.
    pub fn send(&self, bytes: Vec<u8>) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(Ok(bytes));
        }
    }

    /// Waits for the next message from the client.
    ///
    /// Returns `None` once the client has closed its side.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }

    /// Returns the next message from the client without waiting.
    pub fn try_recv(&mut self) -> Option<Vec<u8>> {
        self.rx.try_recv().ok()
    }

    /// Closes the server side cleanly; the client observes end-of-stream.
    pub fn close(&mut self) {
        self.tx = None;
    }

    /// Fails the channel; the client observes a connection-lost error.
    pub fn fail(&mut self, reason: &str) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Err(TransportError::connection_lost(reason)));
        }
    }

    /// Returns `true` if the server side has been closed or failed.
    pub fn is_closed(&self) -> bool {
        self.tx.is_none()
    }

    /// Returns the value of the header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[async_trait]
impl TransportSender for MemorySender {
    async fn send(&mut self, bytes: Vec<u8>) -> Result<(), TransportError> {
        let tx = self.tx.as_ref().ok_or(TransportError::Closed)?;
        tx.send(bytes)
            .map_err(|_| TransportError::connection_lost("memory peer dropped"))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.tx = None;
        Ok(())
    }
}

#[async_trait]
impl TransportReceiver for MemoryReceiver {
    async fn recv(&mut self) -> Option<Result<Vec<u8>, TransportError>> {
        self.rx.recv().await
    }
}
