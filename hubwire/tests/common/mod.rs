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

//! A scripted hub server over the in-memory transport.

#![allow(dead_code)]

use hubwire::protocol::framing::{split_record, write_record};
use hubwire::transport::{MemoryPeer, MemoryServer, MemoryTransport};
use hubwire::{HubConnection, HubConnectionBuilder, HubConnectionState};
use serde_json::{Value, json};
use std::time::Duration;

/// Upper bound for waiting on anything in a test.
pub const WAIT: Duration = Duration::from_secs(5);

pub const HUB_URL: &str = "memory://hub";

/// Accepts channels opened by the client and speaks the hub protocol.
pub struct FakeHub {
    server: MemoryServer,
}

/// One accepted channel.
pub struct HubPeer {
    pub peer: MemoryPeer,
    buffer: Vec<u8>,
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

impl FakeHub {
    pub fn new() -> (MemoryTransport, FakeHub) {
        init_tracing();
        let (transport, server) = MemoryTransport::new();
        (transport, FakeHub { server })
    }

    /// Waits for the client to open a channel.
    pub async fn accept(&mut self) -> HubPeer {
        let peer = tokio::time::timeout(WAIT, self.server.accept())
            .await
            .expect("timed out waiting for the client to connect")
            .expect("transport dropped");
        HubPeer {
            peer,
            buffer: Vec::new(),
        }
    }

    /// Accepts a channel and completes the handshake.
    pub async fn accept_handshake(&mut self) -> HubPeer {
        let mut peer = self.accept().await;
        let request = peer.next_record().await;
        assert_eq!(request, json!({"protocol": "json", "version": 1}));
        peer.send_raw(b"{}\x1e".to_vec());
        peer
    }
}

impl HubPeer {
    /// Reads the next record sent by the client, including pings.
    pub async fn next_record(&mut self) -> Value {
        loop {
            if let Some((record, rest)) = split_record(&self.buffer).expect("framing") {
                let value = serde_json::from_slice(record).expect("record is JSON");
                let consumed = self.buffer.len() - rest.len();
                self.buffer.drain(..consumed);
                return value;
            }
            let bytes = tokio::time::timeout(WAIT, self.peer.recv())
                .await
                .expect("timed out waiting for a record")
                .expect("client closed the channel");
            self.buffer.extend_from_slice(&bytes);
        }
    }

    /// Reads the next record that is not a Ping.
    pub async fn next_message(&mut self) -> Value {
        loop {
            let record = self.next_record().await;
            if record["type"] != json!(6) {
                return record;
            }
        }
    }

    /// Waits until the client closes its side, skipping any records.
    pub async fn closed_by_client(&mut self) {
        loop {
            match tokio::time::timeout(WAIT, self.peer.recv()).await {
                Ok(Some(_)) => continue,
                Ok(None) => return,
                Err(_) => panic!("timed out waiting for the client to close"),
            }
        }
    }

    pub fn send_raw(&self, bytes: Vec<u8>) {
        self.peer.send(bytes);
    }

    pub fn send_json(&self, record: Value) {
        let mut bytes = Vec::new();
        write_record(&mut bytes, record.to_string().as_bytes());
        self.peer.send(bytes);
    }

    pub fn complete(&self, invocation_id: &str, result: Value) {
        self.send_json(json!({"type": 3, "invocationId": invocation_id, "result": result}));
    }

    pub fn complete_with_error(&self, invocation_id: &str, error: &str) {
        self.send_json(json!({"type": 3, "invocationId": invocation_id, "error": error}));
    }

    pub fn stream_item(&self, invocation_id: &str, item: Value) {
        self.send_json(json!({"type": 2, "invocationId": invocation_id, "item": item}));
    }

    pub fn close(&mut self) {
        self.peer.close();
    }
}

/// Extracts the `invocationId` of a record.
pub fn invocation_id(record: &Value) -> String {
    record["invocationId"]
        .as_str()
        .expect("record has an invocationId")
        .to_string()
}

pub fn builder(transport: MemoryTransport) -> HubConnectionBuilder {
    HubConnectionBuilder::new()
        .with_url(HUB_URL)
        .with_transport(transport)
}

/// Starts `connection` against `hub`, returning the accepted peer.
pub async fn start(connection: &HubConnection, hub: &mut FakeHub) -> HubPeer {
    let (started, peer) = tokio::join!(connection.start(), hub.accept_handshake());
    started.expect("start failed");
    assert_eq!(connection.state(), HubConnectionState::Connected);
    peer
}

/// Polls until the connection reaches `state`.
pub async fn wait_for_state(connection: &HubConnection, state: HubConnectionState) {
    tokio::time::timeout(WAIT, async {
        while connection.state() != state {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {state}, still {}", connection.state()));
}
