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

//! Integration tests for starting and stopping hub connections.

mod common;

use common::{FakeHub, builder, start, wait_for_state};
use hubwire::connection::{StaticToken, TokenError};
use hubwire::protocol::NegotiationError;
use hubwire::{HubConnectionState, HubError};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_start_and_stop() {
    let (transport, mut hub) = FakeHub::new();
    let connection = builder(transport).build().unwrap();

    let events = Arc::new(Mutex::new(Vec::new()));
    let log = events.clone();
    connection.on_open(move || log.lock().push("open".to_string()));
    let log = events.clone();
    connection.on_close(move |error| log.lock().push(format!("close:{}", error.is_none())));

    let mut peer = start(&connection, &mut hub).await;
    let connection_id = connection.connection_id().expect("connection id");
    assert!(connection_id.starts_with("memory-"));

    connection.stop().await.unwrap();
    assert_eq!(connection.state(), HubConnectionState::Disconnected);
    assert!(connection.connection_id().is_none());
    peer.closed_by_client().await;

    // a second stop is a no-op
    connection.stop().await.unwrap();
    assert_eq!(*events.lock(), vec!["open".to_string(), "close:true".to_string()]);
}

#[tokio::test]
async fn test_start_twice_is_invalid() {
    let (transport, mut hub) = FakeHub::new();
    let connection = builder(transport).build().unwrap();
    let _peer = start(&connection, &mut hub).await;

    let result = connection.start().await;
    assert!(matches!(result, Err(HubError::InvalidState { .. })));
    assert_eq!(connection.state(), HubConnectionState::Connected);
}

#[tokio::test]
async fn test_restart_after_stop() {
    let (transport, mut hub) = FakeHub::new();
    let connection = builder(transport).build().unwrap();

    let _first = start(&connection, &mut hub).await;
    connection.stop().await.unwrap();

    let mut second = start(&connection, &mut hub).await;
    let (result, ()) = tokio::join!(connection.invoke("Echo", vec![json!("again")]), async {
        let record = second.next_message().await;
        second.complete(&common::invocation_id(&record), record["arguments"][0].clone());
    });
    assert_eq!(result.unwrap(), json!("again"));
}

#[tokio::test]
async fn test_close_before_handshake_fails_start() {
    let (transport, mut hub) = FakeHub::new();
    let connection = builder(transport).build().unwrap();

    let (result, ()) = tokio::join!(connection.start(), async {
        let mut peer = hub.accept().await;
        peer.next_record().await;
        peer.close();
    });

    assert!(matches!(
        result,
        Err(HubError::Negotiation(NegotiationError::TransportClosed))
    ));
    assert_eq!(connection.state(), HubConnectionState::Disconnected);
    assert_eq!(connection.pending_invocations(), 0);
    assert!(matches!(
        connection.invoke("Add", vec![]).await,
        Err(HubError::NotConnected)
    ));
}

#[tokio::test]
async fn test_handshake_rejected() {
    let (transport, mut hub) = FakeHub::new();
    let connection = builder(transport).build().unwrap();

    let (result, ()) = tokio::join!(connection.start(), async {
        let mut peer = hub.accept().await;
        peer.next_record().await;
        peer.send_raw(b"{\"error\":\"Requested protocol 'json' is not available.\"}\x1e".to_vec());
    });

    match result {
        Err(HubError::Negotiation(NegotiationError::Rejected { reason })) => {
            assert!(reason.contains("not available"));
        }
        other => panic!("expected a rejected handshake, got {other:?}"),
    }
    assert_eq!(connection.state(), HubConnectionState::Disconnected);
}

#[tokio::test]
async fn test_refused_transport_fails_start() {
    let (transport, _hub) = FakeHub::new();
    transport.refuse_next(1);
    let connection = builder(transport).build().unwrap();

    let result = connection.start().await;
    assert!(matches!(result, Err(HubError::Transport(_))));
    assert_eq!(connection.state(), HubConnectionState::Disconnected);
}

#[tokio::test]
async fn test_retry_initial_connection() {
    let (transport, mut hub) = FakeHub::new();
    transport.refuse_next(2);
    let opened = transport.clone();
    let connection = builder(transport)
        .with_reconnect_interval(Duration::from_millis(10), Some(5))
        .with_retry_initial_connection(true)
        .build()
        .unwrap();

    let _peer = start(&connection, &mut hub).await;
    assert_eq!(opened.opened(), 1);
    assert_eq!(connection.metrics().reconnect_attempts, 2);
}

#[tokio::test]
async fn test_retry_initial_connection_stops_on_rejection() {
    let (transport, mut hub) = FakeHub::new();
    let opened = transport.clone();
    let connection = builder(transport)
        .with_reconnect_interval(Duration::from_millis(10), None)
        .with_retry_initial_connection(true)
        .build()
        .unwrap();

    let (result, ()) = tokio::join!(connection.start(), async {
        let mut peer = hub.accept().await;
        peer.next_record().await;
        peer.send_raw(b"{\"error\":\"Requested protocol 'json' is not available.\"}\x1e".to_vec());
    });

    assert!(matches!(
        result,
        Err(HubError::Negotiation(NegotiationError::Rejected { .. }))
    ));
    assert_eq!(connection.state(), HubConnectionState::Disconnected);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(opened.opened(), 1);
    assert_eq!(connection.metrics().reconnect_attempts, 0);
}

#[tokio::test]
async fn test_access_token_sent_as_bearer() {
    let (transport, mut hub) = FakeHub::new();
    let connection = builder(transport)
        .with_access_token_provider(StaticToken::new("secret"))
        .with_header("X-Client", "tests")
        .build()
        .unwrap();

    let peer = start(&connection, &mut hub).await;
    assert_eq!(peer.peer.header("authorization"), Some("Bearer secret"));
    assert_eq!(peer.peer.header("X-Client"), Some("tests"));
}

#[tokio::test]
async fn test_access_token_replaces_authorization_header() {
    let (transport, mut hub) = FakeHub::new();
    let connection = builder(transport)
        .with_header("authorization", "Bearer stale")
        .with_access_token_provider(StaticToken::new("fresh"))
        .build()
        .unwrap();

    let peer = start(&connection, &mut hub).await;
    let authorization: Vec<&str> = peer
        .peer
        .headers
        .iter()
        .filter(|(name, _)| name.eq_ignore_ascii_case("Authorization"))
        .map(|(_, value)| value.as_str())
        .collect();
    assert_eq!(authorization, vec!["Bearer fresh"]);
}

#[tokio::test]
async fn test_token_provider_failure_aborts_start() {
    let (transport, _hub) = FakeHub::new();
    let opened = transport.clone();
    let connection = builder(transport)
        .with_access_token_provider(|| async { Err::<String, TokenError>("expired".into()) })
        .build()
        .unwrap();

    match connection.start().await {
        Err(HubError::TokenProvider { reason }) => assert_eq!(reason, "expired"),
        other => panic!("expected a token provider error, got {other:?}"),
    }
    assert_eq!(opened.opened(), 0);
    assert_eq!(connection.state(), HubConnectionState::Disconnected);
}

#[tokio::test]
async fn test_stop_during_start_aborts_it() {
    let (transport, mut hub) = FakeHub::new();
    let connection = builder(transport).build().unwrap();

    let (result, ()) = tokio::join!(connection.start(), async {
        let mut peer = hub.accept().await;
        peer.next_record().await;
        connection.stop().await.unwrap();
        // a late acknowledgement must not revive the connection
        peer.send_raw(b"{}\x1e".to_vec());
    });

    assert!(matches!(result, Err(HubError::ConnectionLost { .. })));
    assert_eq!(connection.state(), HubConnectionState::Disconnected);
}

#[tokio::test]
async fn test_server_close_without_reconnect() {
    let (transport, mut hub) = FakeHub::new();
    let connection = builder(transport).build().unwrap();

    let (closed_tx, mut closed_rx) = tokio::sync::mpsc::unbounded_channel();
    connection.on_close(move |error| {
        let _ = closed_tx.send(error.map(|e| e.to_string()));
    });

    let peer = start(&connection, &mut hub).await;
    peer.send_json(json!({"type": 7, "error": "server shutting down"}));

    let error = tokio::time::timeout(common::WAIT, closed_rx.recv())
        .await
        .unwrap()
        .unwrap()
        .expect("close carries an error");
    assert!(error.contains("server shutting down"));
    assert_eq!(connection.state(), HubConnectionState::Disconnected);
}

#[tokio::test]
async fn test_server_close_allowing_reconnect_needs_policy() {
    let (transport, mut hub) = FakeHub::new();
    let connection = builder(transport).build().unwrap();

    let peer = start(&connection, &mut hub).await;
    peer.send_json(json!({"type": 7, "allowReconnect": true}));

    wait_for_state(&connection, HubConnectionState::Disconnected).await;
}
