//! events
//!
//! Listener registry for the `console:*` and `dispatch:*` lifecycle events.
//!
//! Listeners attach either to a whole component (`"dispatch"`) or to one
//! event (`"dispatch:beforeDispatch"`). Firing stops at the first listener
//! that returns `Some(false)`, and callers treat that as a veto.
//!
//! # Example
//!
//! ```
//! use phiz_cli::events::EventsManager;
//! use serde_json::json;
//!
//! let mut events = EventsManager::new();
//! events.attach("dispatch:beforeDispatch", |event| {
//!     Some(event.data["task"] != "forbidden")
//! });
//!
//! assert_eq!(events.fire("dispatch:beforeDispatch", json!({"task": "echo"})), Some(true));
//! assert_eq!(events.fire("dispatch:beforeDispatch", json!({"task": "forbidden"})), Some(false));
//! assert_eq!(events.fire("console:boot", json!(null)), None);
//! ```

use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

/// Callback attached to an event type.
pub type Listener = Arc<dyn Fn(&Event) -> Option<bool> + Send + Sync>;

/// A fired event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Full name, `component:type`.
    pub name: String,
    /// Event payload.
    pub data: Value,
}

impl Event {
    /// Part before the colon (`dispatch`).
    pub fn component(&self) -> &str {
        self.name.split_once(':').map_or(&self.name, |(c, _)| c)
    }

    /// Part after the colon (`beforeDispatch`).
    pub fn kind(&self) -> &str {
        self.name.split_once(':').map_or("", |(_, k)| k)
    }
}

/// Registry of event listeners.
#[derive(Clone, Default)]
pub struct EventsManager {
    listeners: Vec<(String, Listener)>,
}

impl std::fmt::Debug for EventsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventsManager")
            .field(
                "listeners",
                &self.listeners.iter().map(|(t, _)| t).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl EventsManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a listener to a component or a single event.
    pub fn attach(
        &mut self,
        event_type: impl Into<String>,
        listener: impl Fn(&Event) -> Option<bool> + Send + Sync + 'static,
    ) -> &mut Self {
        self.listeners.push((event_type.into(), Arc::new(listener)));
        self
    }

    /// Remove listeners for one event type, or all of them.
    pub fn detach_all(&mut self, event_type: Option<&str>) {
        match event_type {
            Some(t) => self.listeners.retain(|(existing, _)| existing != t),
            None => self.listeners.clear(),
        }
    }

    pub fn has_listeners(&self, event_type: &str) -> bool {
        self.listeners.iter().any(|(t, _)| t == event_type)
    }

    /// Fire an event.
    ///
    /// Returns the last listener result, `Some(false)` as soon as one
    /// listener vetoes, or `None` when nothing listened.
    pub fn fire(&self, name: &str, data: Value) -> Option<bool> {
        let event = Event {
            name: name.to_string(),
            data,
        };
        let component = event.component();

        let mut status = None;
        for (event_type, listener) in &self.listeners {
            if event_type != name && event_type != component {
                continue;
            }
            trace!(event = name, listener = %event_type, "Firing event");
            status = listener(&event);
            if status == Some(false) {
                break;
            }
        }
        status
    }
}

/// Fire through an optional manager and report whether a listener vetoed.
pub(crate) fn vetoed(events: Option<&EventsManager>, name: &str, data: Value) -> bool {
    events.map_or(false, |events| events.fire(name, data) == Some(false))
}
