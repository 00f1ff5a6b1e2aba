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

//! Client method handlers and lifecycle observers.
//!
//! Handlers are registered per method name (case-sensitive) and run in
//! registration order. Each handler runs in isolation: an `Err` or a panic is
//! logged and the remaining handlers still run.

use crate::HubError;
use serde_json::Value;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::{error, warn};

/// Error type returned by client method handlers.
pub type HandlerError = Box<dyn Error + Send + Sync>;

pub(crate) type Handler = Arc<dyn Fn(&[Value]) -> Result<(), HandlerError> + Send + Sync>;

/// Identifies one registered handler for [`off`](crate::HubConnection::off).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    /// Returns the raw id value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({})", self.0)
    }
}

/// Method name to ordered handler list.
#[derive(Default)]
pub(crate) struct HandlerRegistry {
    next_id: u64,
    handlers: HashMap<String, Vec<(HandlerId, Handler)>>,
}

impl HandlerRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, method: &str, handler: Handler) -> HandlerId {
        self.next_id += 1;
        let id = HandlerId(self.next_id);
        self.handlers
            .entry(method.to_string())
            .or_default()
            .push((id, handler));
        id
    }

    /// Removes one handler, or every handler for `method` when `id` is
    /// `None`. Returns the number removed.
    pub(crate) fn remove(&mut self, method: &str, id: Option<HandlerId>) -> usize {
        let Some(list) = self.handlers.get_mut(method) else {
            return 0;
        };
        let removed = match id {
            Some(id) => {
                let before = list.len();
                list.retain(|(existing, _)| *existing != id);
                before - list.len()
            }
            None => list.len(),
        };
        if id.is_none() || list.is_empty() {
            self.handlers.remove(method);
        }
        removed
    }

    pub(crate) fn clear(&mut self) {
        self.handlers.clear();
    }

    /// Snapshot of the handlers for `method`, to be called outside any lock.
    pub(crate) fn handlers_for(&self, method: &str) -> Vec<Handler> {
        self.handlers
            .get(method)
            .map(|list| list.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default()
    }

    pub(crate) fn count(&self, method: &str) -> usize {
        self.handlers.get(method).map_or(0, Vec::len)
    }
}

/// Outcome of running every handler for one invocation.
#[derive(Debug, Default)]
pub(crate) struct DispatchOutcome {
    pub(crate) handled: usize,
    pub(crate) failed: usize,
    pub(crate) first_error: Option<String>,
}

/// Runs `handlers` in order, isolating failures.
pub(crate) fn run_handlers(target: &str, handlers: &[Handler], arguments: &[Value]) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();
    for handler in handlers {
        outcome.handled += 1;
        let failure = match catch_unwind(AssertUnwindSafe(|| handler(arguments))) {
            Ok(Ok(())) => None,
            Ok(Err(e)) => {
                warn!(method = target, error = %e, "handler returned an error");
                Some(e.to_string())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(method = target, panic = %message, "handler panicked");
                Some(format!("handler panicked: {message}"))
            }
        };
        if failure.is_some() {
            outcome.failed += 1;
        }
        if outcome.first_error.is_none() {
            outcome.first_error = failure;
        }
    }
    outcome
}

/// Runs an observer callback, logging a panic instead of unwinding.
pub(crate) fn run_observer(kind: &str, observer: impl FnOnce()) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(observer)) {
        error!(observer = kind, panic = %panic_message(panic.as_ref()), "observer panicked");
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

pub(crate) type OpenObserver = Arc<dyn Fn() + Send + Sync>;
pub(crate) type CloseObserver = Arc<dyn Fn(Option<&HubError>) + Send + Sync>;
pub(crate) type ReconnectingObserver = Arc<dyn Fn(&HubError) + Send + Sync>;
pub(crate) type ReconnectedObserver = Arc<dyn Fn(Option<&str>) + Send + Sync>;

/// Lifecycle callbacks registered on a connection.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    pub(crate) open: Vec<OpenObserver>,
    pub(crate) close: Vec<CloseObserver>,
    pub(crate) reconnecting: Vec<ReconnectingObserver>,
    pub(crate) reconnected: Vec<ReconnectedObserver>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    fn recording(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> Handler {
        let log = log.clone();
        Arc::new(move |args: &[Value]| -> Result<(), HandlerError> {
            log.lock().push(format!("{tag}:{}", args.len()));
            Ok(())
        })
    }

    #[test]
    fn test_handlers_run_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HandlerRegistry::new();
        registry.add("ReceiveMessage", recording(&log, "a"));
        registry.add("ReceiveMessage", recording(&log, "b"));

        let handlers = registry.handlers_for("ReceiveMessage");
        let outcome = run_handlers("ReceiveMessage", &handlers, &[json!("x"), json!("y")]);

        assert_eq!(outcome.handled, 2);
        assert!(outcome.first_error.is_none());
        assert_eq!(*log.lock(), vec!["a:2".to_string(), "b:2".to_string()]);
    }

    #[test]
    fn test_method_names_case_sensitive() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HandlerRegistry::new();
        registry.add("receive", recording(&log, "a"));
        assert_eq!(registry.count("Receive"), 0);
        assert_eq!(registry.count("receive"), 1);
    }

    #[test]
    fn test_remove_single_and_all() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HandlerRegistry::new();
        let first = registry.add("m", recording(&log, "a"));
        let second = registry.add("m", recording(&log, "b"));
        assert_ne!(first, second);

        assert_eq!(registry.remove("m", Some(first)), 1);
        assert_eq!(registry.remove("m", Some(first)), 0);
        assert_eq!(registry.count("m"), 1);

        registry.add("m", recording(&log, "c"));
        assert_eq!(registry.remove("m", None), 2);
        assert_eq!(registry.count("m"), 0);
        assert_eq!(registry.remove("missing", None), 0);
    }

    #[test]
    fn test_failures_isolated() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let handlers: Vec<Handler> = vec![
            Arc::new(|_: &[Value]| -> Result<(), HandlerError> { Err("first failed".into()) }),
            Arc::new(|_: &[Value]| -> Result<(), HandlerError> { panic!("second exploded") }),
            recording(&log, "third"),
        ];

        let outcome = run_handlers("m", &handlers, &[]);
        assert_eq!(outcome.handled, 3);
        assert_eq!(outcome.failed, 2);
        assert_eq!(outcome.first_error.as_deref(), Some("first failed"));
        assert_eq!(*log.lock(), vec!["third:0".to_string()]);
    }

    #[test]
    fn test_observer_panic_contained() {
        let mut ran = false;
        run_observer("open", || panic!("observer exploded"));
        run_observer("open", || ran = true);
        assert!(ran);
    }
}
