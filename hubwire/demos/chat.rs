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

//! Interactive chat client.
//!
//! Connects to a chat hub exposing `SendMessage(user, message)` and calling
//! `ReceiveMessage(user, message)` on every client, then sends each line
//! typed on stdin. Type `exit()` to quit.
//!
//! # Running the Example
//! ```bash
//! cargo run --example chat -- ws://localhost:5000/chathub alice
//! ```
//!
//! Set `RUST_LOG=hubwire=debug` to watch the connection lifecycle.

use hubwire::{HubConnectionBuilder, HubError};
use serde_json::json;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

const DEFAULT_URL: &str = "ws://localhost:5000/chathub";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let url = args.next().unwrap_or_else(|| DEFAULT_URL.to_string());
    let username = args.next().unwrap_or_else(|| "guest".to_string());

    let connection = HubConnectionBuilder::new()
        .with_url(&url)
        .with_keep_alive_interval(Duration::from_secs(10))
        .with_reconnect_interval(Duration::from_secs(5), Some(5))
        .build()?;

    connection.on("ReceiveMessage", |args| {
        let user = args.first().and_then(|v| v.as_str()).unwrap_or("?");
        let message = args.get(1).and_then(|v| v.as_str()).unwrap_or_default();
        println!("{user}: {message}");
        Ok(())
    });
    connection.on_open(|| println!("connected"));
    connection.on_reconnecting(|error| println!("connection lost ({error}), reconnecting..."));
    connection.on_reconnected(|id| println!("reconnected as {}", id.unwrap_or("?")));
    connection.on_close(|error| match error {
        Some(error) => println!("disconnected: {error}"),
        None => println!("disconnected"),
    });

    connection.start().await?;
    println!("chatting on {url} as {username}; type exit() to quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let message = line.trim();
        if message == "exit()" {
            break;
        }
        if message.is_empty() {
            continue;
        }
        match connection
            .send("SendMessage", vec![json!(username), json!(message)])
            .await
        {
            Ok(()) => {}
            Err(HubError::NotConnected) => println!("not connected, message dropped"),
            Err(e) => return Err(e.into()),
        }
    }

    connection.stop().await?;
    Ok(())
}
