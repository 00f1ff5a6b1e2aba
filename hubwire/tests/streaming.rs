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

//! Integration tests for server-to-client and client-to-server streams.

mod common;

use common::{FakeHub, WAIT, builder, invocation_id, start};
use futures_util::StreamExt;
use hubwire::invocation::StreamCallbacks;
use hubwire::{HubConnectionState, HubError};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::oneshot;

#[tokio::test]
async fn test_counter_stream_yields_items_then_completes() {
    let (transport, mut hub) = FakeHub::new();
    let connection = builder(transport).build().unwrap();
    let mut peer = start(&connection, &mut hub).await;

    let stream = connection
        .stream("Counter", vec![json!(3), json!(0)])
        .await
        .unwrap();

    let record = peer.next_message().await;
    assert_eq!(record["type"], json!(4));
    assert_eq!(record["target"], json!("Counter"));
    assert_eq!(record["arguments"], json!([3, 0]));
    let id = invocation_id(&record);
    assert_eq!(stream.invocation_id(), id);

    for n in 0..3 {
        peer.stream_item(&id, json!(n));
    }
    peer.send_json(json!({"type": 3, "invocationId": id}));

    let items: Vec<Value> = stream.map(|item| item.unwrap()).collect().await;
    assert_eq!(items, vec![json!(0), json!(1), json!(2)]);
    assert_eq!(connection.pending_invocations(), 0);
}

#[tokio::test]
async fn test_subscribe_completes_exactly_once() {
    let (transport, mut hub) = FakeHub::new();
    let connection = builder(transport).build().unwrap();
    let mut peer = start(&connection, &mut hub).await;

    let stream = connection.stream("Counter", vec![json!(3)]).await.unwrap();
    let id = invocation_id(&peer.next_message().await);

    let items = Arc::new(Mutex::new(Vec::new()));
    let errors = Arc::new(Mutex::new(0));
    let (done_tx, done_rx) = oneshot::channel();
    let mut done_tx = Some(done_tx);
    let seen = items.clone();
    let failed = errors.clone();
    let subscription = stream.subscribe(
        StreamCallbacks::new(move |item| seen.lock().push(item))
            .on_complete(move || {
                if let Some(tx) = done_tx.take() {
                    let _ = tx.send(());
                }
            })
            .on_error(move |_| *failed.lock() += 1),
    );

    for n in 0..3 {
        peer.stream_item(&id, json!(n));
    }
    peer.send_json(json!({"type": 3, "invocationId": id}));
    // late frames after completion are dropped
    peer.stream_item(&id, json!(99));
    peer.send_json(json!({"type": 3, "invocationId": id}));

    tokio::time::timeout(WAIT, done_rx).await.unwrap().unwrap();
    tokio::time::timeout(WAIT, async {
        while !subscription.is_finished() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    assert_eq!(*items.lock(), vec![json!(0), json!(1), json!(2)]);
    assert_eq!(*errors.lock(), 0);
}

#[tokio::test]
async fn test_stream_error_completion() {
    let (transport, mut hub) = FakeHub::new();
    let connection = builder(transport).build().unwrap();
    let mut peer = start(&connection, &mut hub).await;

    let mut stream = connection.stream("Counter", vec![]).await.unwrap();
    let id = invocation_id(&peer.next_message().await);
    peer.stream_item(&id, json!("first"));
    peer.complete_with_error(&id, "counter exploded");

    assert_eq!(stream.next().await.unwrap().unwrap(), json!("first"));
    match stream.next().await {
        Some(Err(HubError::Invocation { message })) => assert_eq!(message, "counter exploded"),
        other => panic!("expected an invocation error, got {other:?}"),
    }
    assert!(stream.next().await.is_none());
    assert!(stream.is_finished());
}

#[tokio::test]
async fn test_transport_close_mid_stream() {
    let (transport, mut hub) = FakeHub::new();
    let connection = builder(transport).build().unwrap();
    let mut peer = start(&connection, &mut hub).await;

    let mut stream = connection.stream("Counter", vec![json!(10)]).await.unwrap();
    let id = invocation_id(&peer.next_message().await);
    peer.stream_item(&id, json!(0));
    peer.close();

    assert_eq!(stream.next().await.unwrap().unwrap(), json!(0));
    assert!(matches!(
        stream.next().await,
        Some(Err(HubError::ConnectionLost { .. }))
    ));
    assert!(stream.next().await.is_none());

    assert_eq!(connection.state(), HubConnectionState::Disconnected);
    assert!(matches!(
        connection.invoke("Add", vec![json!(1), json!(2)]).await,
        Err(HubError::NotConnected)
    ));
}

#[tokio::test]
async fn test_dropping_stream_cancels_and_ignores_late_frames() {
    let (transport, mut hub) = FakeHub::new();
    let connection = builder(transport).build().unwrap();
    let mut peer = start(&connection, &mut hub).await;

    let stream = connection.stream("Counter", vec![]).await.unwrap();
    let id = invocation_id(&peer.next_message().await);
    drop(stream);

    let cancel = peer.next_message().await;
    assert_eq!(cancel, json!({"type": 5, "invocationId": id}));
    assert_eq!(connection.pending_invocations(), 0);

    // the server had already produced these
    peer.stream_item(&id, json!(1));
    peer.send_json(json!({"type": 3, "invocationId": id}));

    let (result, ()) = tokio::join!(connection.invoke("Add", vec![json!(2), json!(3)]), async {
        let record = peer.next_message().await;
        peer.complete(&invocation_id(&record), json!(5));
    });
    assert_eq!(result.unwrap(), json!(5));
    assert_eq!(connection.state(), HubConnectionState::Connected);
}

#[tokio::test]
async fn test_unsubscribe_sends_cancel() {
    let (transport, mut hub) = FakeHub::new();
    let connection = builder(transport).build().unwrap();
    let mut peer = start(&connection, &mut hub).await;

    let stream = connection.stream("Ticker", vec![]).await.unwrap();
    let id = invocation_id(&peer.next_message().await);
    stream.unsubscribe();

    let cancel = peer.next_message().await;
    assert_eq!(cancel["type"], json!(5));
    assert_eq!(invocation_id(&cancel), id);
}

#[tokio::test]
async fn test_server_cancel_errors_stream() {
    let (transport, mut hub) = FakeHub::new();
    let connection = builder(transport).build().unwrap();
    let mut peer = start(&connection, &mut hub).await;

    let mut stream = connection.stream("Ticker", vec![]).await.unwrap();
    let id = invocation_id(&peer.next_message().await);
    peer.send_json(json!({"type": 5, "invocationId": id}));

    assert!(matches!(
        stream.next().await,
        Some(Err(HubError::Invocation { .. }))
    ));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_upload_stream() {
    let (transport, mut hub) = FakeHub::new();
    let connection = builder(transport).build().unwrap();
    let mut peer = start(&connection, &mut hub).await;

    let mut upload = connection.upload("Sum", vec![json!("numbers")]).await.unwrap();
    let invocation = peer.next_message().await;
    assert_eq!(invocation["type"], json!(1));
    assert_eq!(invocation["target"], json!("Sum"));
    assert_eq!(invocation["arguments"], json!(["numbers"]));
    assert_eq!(invocation["streamIds"], json!([upload.stream_id()]));
    assert_eq!(invocation_id(&invocation), upload.invocation_id());
    assert_ne!(upload.stream_id(), upload.invocation_id());

    for n in 1..=3 {
        upload.send(json!(n)).await.unwrap();
    }
    upload.complete().await.unwrap();

    let mut total = 0;
    for _ in 0..3 {
        let item = peer.next_message().await;
        assert_eq!(item["type"], json!(2));
        assert_eq!(invocation_id(&item), upload.stream_id());
        total += item["item"].as_i64().unwrap();
    }
    let completion = peer.next_message().await;
    assert_eq!(completion, json!({"type": 3, "invocationId": upload.stream_id()}));

    assert!(matches!(
        upload.send(json!(4)).await,
        Err(HubError::InvalidState { .. })
    ));

    peer.complete(upload.invocation_id(), json!(total));
    assert_eq!(upload.result().await.unwrap(), json!(6));
}
