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

//! Invocation correlation.
//!
//! Outbound calls are correlated with inbound completions and stream items
//! by invocation id:
//!
//! - [`InvocationIdGenerator`]: monotonic decimal ids
//! - [`InvocationRegistry`]: pending invocations and their sinks
//! - [`HubStream`] / [`UploadStream`]: handles for streaming invocations

mod id;
mod registry;
mod stream;

pub use id::InvocationIdGenerator;
pub use registry::{InvocationKind, InvocationRegistry, InvocationResult};
pub(crate) use stream::{InvocationControl, PendingGuard};
pub use stream::{
    HubStream, StreamCallbacks, StreamEvent, StreamObserver, Subscription, UploadStream,
};
