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

//! Integration tests for automatic reconnection.

mod common;

use common::{FakeHub, WAIT, builder, invocation_id, start, wait_for_state};
use hubwire::connection::TokenError;
use hubwire::reconnection::{FixedDelays, ReconnectionPolicy, RetryContext};
use hubwire::{HubConnectionState, HubError};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

const RETRY: Duration = Duration::from_millis(10);

const REJECTION: &[u8] = b"{\"error\":\"Requested protocol 'json' is not available.\"}\x1e";

/// Retries quickly and records the retry count it was asked about.
#[derive(Default)]
struct RecordingPolicy {
    retry_counts: Mutex<Vec<u32>>,
    retry_unrecoverable: bool,
}

impl ReconnectionPolicy for RecordingPolicy {
    fn next_retry_delay(&self, context: &RetryContext<'_>) -> Option<Duration> {
        self.retry_counts.lock().push(context.previous_retry_count);
        (context.previous_retry_count < 5).then_some(RETRY)
    }

    fn retry_unrecoverable(&self) -> bool {
        self.retry_unrecoverable
    }

    fn name(&self) -> &str {
        "Recording"
    }
}

#[tokio::test]
async fn test_reconnects_with_fresh_token() {
    let (transport, mut hub) = FakeHub::new();
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let connection = builder(transport)
        .with_access_token_provider(move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Ok::<_, TokenError>(format!("token-{n}"))
            }
        })
        .with_reconnect_interval(RETRY, Some(5))
        .build()
        .unwrap();

    let events = Arc::new(Mutex::new(Vec::new()));
    let log = events.clone();
    connection.on_reconnecting(move |error| log.lock().push(format!("reconnecting: {error}")));
    let (reconnected_tx, mut reconnected_rx) = mpsc::unbounded_channel();
    connection.on_reconnected(move |connection_id| {
        let _ = reconnected_tx.send(connection_id.map(str::to_string));
    });

    let mut first = start(&connection, &mut hub).await;
    assert_eq!(first.peer.header("Authorization"), Some("Bearer token-1"));
    let first_id = connection.connection_id().unwrap();

    // an invocation in flight when the connection drops fails with ConnectionLost
    let pending = {
        let connection = connection.clone();
        tokio::spawn(async move { connection.invoke("LongRunning", vec![]).await })
    };
    first.next_message().await;
    first.close();

    let result = tokio::time::timeout(WAIT, pending).await.unwrap().unwrap();
    assert!(matches!(result, Err(HubError::ConnectionLost { .. })));

    let mut second = hub.accept_handshake().await;
    assert_eq!(second.peer.header("Authorization"), Some("Bearer token-2"));

    let reconnected_id = tokio::time::timeout(WAIT, reconnected_rx.recv())
        .await
        .unwrap()
        .unwrap()
        .expect("connection id");
    assert_ne!(reconnected_id, first_id);
    assert_eq!(connection.state(), HubConnectionState::Connected);
    assert_eq!(connection.connection_id(), Some(reconnected_id));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(events.lock().len(), 1);

    // handlers and invocations work on the new connection
    let (result, ()) = tokio::join!(connection.invoke("Add", vec![json!(2), json!(3)]), async {
        let record = second.next_message().await;
        second.complete(&invocation_id(&record), json!(5));
    });
    assert_eq!(result.unwrap(), json!(5));

    let metrics = connection.reconnection_metrics().unwrap();
    assert_eq!(metrics.successful_reconnections, 1);
    assert_eq!(connection.metrics().connections_opened, 2);
}

#[tokio::test]
async fn test_state_is_reconnecting_between_attempts() {
    let (transport, mut hub) = FakeHub::new();
    let refusing = transport.clone();
    let connection = builder(transport)
        .with_reconnect_interval(Duration::from_millis(50), None)
        .build()
        .unwrap();

    let mut peer = start(&connection, &mut hub).await;
    refusing.refuse_next(3);
    peer.close();

    wait_for_state(&connection, HubConnectionState::Reconnecting).await;
    assert!(matches!(
        connection.invoke("Add", vec![]).await,
        Err(HubError::NotConnected)
    ));

    let _peer = hub.accept_handshake().await;
    wait_for_state(&connection, HubConnectionState::Connected).await;
    assert_eq!(connection.metrics().reconnect_attempts, 4);
}

#[tokio::test]
async fn test_reconnect_gives_up() {
    let (transport, mut hub) = FakeHub::new();
    let refusing = transport.clone();
    let connection = builder(transport)
        .with_reconnect_interval(RETRY, Some(2))
        .build()
        .unwrap();

    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();
    connection.on_reconnecting(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let (closed_tx, mut closed_rx) = mpsc::unbounded_channel();
    connection.on_close(move |error| {
        let exhausted = matches!(error, Some(HubError::ReconnectExhausted { attempts: 2, .. }));
        let _ = closed_tx.send(exhausted);
    });

    let mut peer = start(&connection, &mut hub).await;
    refusing.refuse_next(10);
    peer.close();

    let exhausted = tokio::time::timeout(WAIT, closed_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(exhausted);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(connection.state(), HubConnectionState::Disconnected);

    let metrics = connection.reconnection_metrics().unwrap();
    assert_eq!(metrics.failed_reconnections, 2);
}

#[tokio::test]
async fn test_stop_while_reconnecting() {
    let (transport, mut hub) = FakeHub::new();
    let connection = builder(transport)
        .with_automatic_reconnect(FixedDelays::new(vec![Duration::from_secs(3600)]))
        .build()
        .unwrap();

    let closes = Arc::new(Mutex::new(Vec::new()));
    let log = closes.clone();
    connection.on_close(move |error| log.lock().push(error.is_none()));

    let mut peer = start(&connection, &mut hub).await;
    peer.close();
    wait_for_state(&connection, HubConnectionState::Reconnecting).await;

    tokio::time::timeout(WAIT, connection.stop())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(connection.state(), HubConnectionState::Disconnected);
    assert_eq!(*closes.lock(), vec![true]);
}

#[tokio::test]
async fn test_server_close_with_allow_reconnect() {
    let (transport, mut hub) = FakeHub::new();
    let connection = builder(transport)
        .with_reconnect_interval(RETRY, Some(3))
        .build()
        .unwrap();

    let (reasons_tx, mut reasons_rx) = mpsc::unbounded_channel();
    connection.on_reconnecting(move |error| {
        let _ = reasons_tx.send(error.to_string());
    });

    let peer = start(&connection, &mut hub).await;
    peer.send_json(json!({"type": 7, "error": "rebalancing", "allowReconnect": true}));

    let reason = tokio::time::timeout(WAIT, reasons_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(reason.contains("rebalancing"));

    let _second = hub.accept_handshake().await;
    wait_for_state(&connection, HubConnectionState::Connected).await;
}

#[tokio::test]
async fn test_server_close_without_allow_reconnect_is_final() {
    let (transport, mut hub) = FakeHub::new();
    let opened = transport.clone();
    let connection = builder(transport)
        .with_reconnect_interval(RETRY, Some(3))
        .build()
        .unwrap();

    let peer = start(&connection, &mut hub).await;
    peer.send_json(json!({"type": 7, "error": "banned"}));

    wait_for_state(&connection, HubConnectionState::Disconnected).await;
    tokio::time::sleep(RETRY * 5).await;
    assert_eq!(opened.opened(), 1);
}

#[tokio::test]
async fn test_rejected_handshake_stops_reconnecting() {
    let (transport, mut hub) = FakeHub::new();
    let opened = transport.clone();
    let connection = builder(transport)
        .with_reconnect_interval(RETRY, None)
        .build()
        .unwrap();

    let (closed_tx, mut closed_rx) = mpsc::unbounded_channel();
    connection.on_close(move |error| {
        let _ = closed_tx.send(error.map(ToString::to_string));
    });

    let mut peer = start(&connection, &mut hub).await;
    peer.close();

    let mut second = hub.accept().await;
    second.next_record().await;
    second.send_raw(REJECTION.to_vec());

    let reason = tokio::time::timeout(WAIT, closed_rx.recv())
        .await
        .unwrap()
        .unwrap()
        .expect("close carries an error");
    assert!(reason.starts_with("reconnection gave up after 1 attempts"), "{reason}");
    assert!(reason.contains("not available"), "{reason}");
    assert_eq!(connection.state(), HubConnectionState::Disconnected);

    tokio::time::sleep(RETRY * 5).await;
    assert_eq!(opened.opened(), 2);
    assert_eq!(connection.metrics().reconnect_attempts, 1);
}

#[tokio::test]
async fn test_policy_may_retry_rejected_handshake() {
    let (transport, mut hub) = FakeHub::new();
    let policy = RecordingPolicy {
        retry_unrecoverable: true,
        ..Default::default()
    };
    let connection = builder(transport)
        .with_automatic_reconnect(policy)
        .build()
        .unwrap();

    let mut peer = start(&connection, &mut hub).await;
    peer.close();

    let mut rejected = hub.accept().await;
    rejected.next_record().await;
    rejected.send_raw(REJECTION.to_vec());

    let _third = hub.accept_handshake().await;
    wait_for_state(&connection, HubConnectionState::Connected).await;
    assert_eq!(connection.metrics().reconnect_attempts, 2);
}

#[tokio::test]
async fn test_handlers_survive_reconnect() {
    let (transport, mut hub) = FakeHub::new();
    let connection = builder(transport)
        .with_reconnect_interval(RETRY, Some(3))
        .build()
        .unwrap();

    let (received_tx, mut received_rx) = mpsc::unbounded_channel();
    connection.on("ReceiveMessage", move |args| {
        let _ = received_tx.send(args.to_vec());
        Ok(())
    });

    let mut first = start(&connection, &mut hub).await;
    first.close();
    let second = hub.accept_handshake().await;
    wait_for_state(&connection, HubConnectionState::Connected).await;

    second.send_json(json!({"type": 1, "target": "ReceiveMessage", "arguments": ["alice", "hello"]}));
    let args = tokio::time::timeout(WAIT, received_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(args, vec![json!("alice"), json!("hello")]);
}

#[tokio::test]
async fn test_retry_count_resets_after_reconnect() {
    let (transport, mut hub) = FakeHub::new();
    let refusing = transport.clone();
    let policy = Arc::new(RecordingPolicy::default());
    let connection = builder(transport)
        .with_automatic_reconnect(SharedPolicy(policy.clone()))
        .build()
        .unwrap();

    let mut first = start(&connection, &mut hub).await;
    refusing.refuse_next(1);
    first.close();
    let mut second = hub.accept_handshake().await;
    wait_for_state(&connection, HubConnectionState::Connected).await;

    second.close();
    let _third = hub.accept_handshake().await;
    wait_for_state(&connection, HubConnectionState::Connected).await;

    assert_eq!(*policy.retry_counts.lock(), vec![0, 1, 0]);
}

/// Lets a test keep a handle on the policy it configured.
struct SharedPolicy(Arc<RecordingPolicy>);

impl ReconnectionPolicy for SharedPolicy {
    fn next_retry_delay(&self, context: &RetryContext<'_>) -> Option<Duration> {
        self.0.next_retry_delay(context)
    }

    fn name(&self) -> &str {
        self.0.name()
    }
}
