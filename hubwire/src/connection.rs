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

//! Client connection to a hub.
//!
//! [`HubConnection`] owns one logical session with a hub: it opens the
//! transport, negotiates the protocol, correlates invocations with their
//! completions, dispatches server invocations to registered handlers, keeps
//! the connection alive and reconnects when a policy allows it.
//!
//! Connections are assembled with [`HubConnectionBuilder`]:
//!
//! ```rust,no_run
//! use hubwire::HubConnectionBuilder;
//! use hubwire::reconnection::FixedDelays;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), hubwire::HubError> {
//! let connection = HubConnectionBuilder::new()
//!     .with_url("https://localhost:5001/chat")
//!     .with_automatic_reconnect(FixedDelays::default())
//!     .build()?;
//!
//! connection.on_reconnecting(|error| eprintln!("connection lost: {error}"));
//! connection.on("ReceiveMessage", |args| {
//!     println!("{} says {}", args[0], args[1]);
//!     Ok(())
//! });
//!
//! connection.start().await?;
//! connection.send("SendMessage", vec![json!("alice"), json!("hello")]).await?;
//! # Ok(())
//! # }
//! ```

mod builder;
mod config;
mod driver;
mod handlers;
mod hub;
mod keepalive;
mod state;
mod token;

pub use builder::HubConnectionBuilder;
pub use config::HubConnectionConfig;
pub use handlers::{HandlerError, HandlerId};
pub use hub::HubConnection;
pub use keepalive::{DEFAULT_KEEP_ALIVE_INTERVAL, DEFAULT_SERVER_TIMEOUT, KeepAliveMonitor};
pub use state::HubConnectionState;
pub use token::{AccessTokenProvider, StaticToken, TokenError};
