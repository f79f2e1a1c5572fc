//! Typed events collected while a call runs.
//!
//! Handlers and keepers append to the context's [`EventManager`]; the
//! dispatch layer drains it into the call's output on success. A failed
//! call's buffer is dropped with the context, so no event from a failed
//! call can leak out.

/// One emitted event: a kind plus ordered key/value attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Event kind, e.g. `"ibc_transfer"`.
    pub kind: String,
    /// Ordered attribute pairs.
    pub attributes: Vec<(String, String)>,
}

impl Event {
    /// Creates an event with no attributes.
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into(), attributes: Vec::new() }
    }

    /// Appends an attribute, builder style.
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }
}

/// Append-only buffer of events for one call.
#[derive(Debug, Default)]
pub struct EventManager {
    events: Vec<Event>,
}

impl EventManager {
    /// Creates an empty buffer.
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Appends an event.
    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Events emitted so far, in emission order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Drains the buffer, leaving it empty.
    pub fn take(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Returns true when nothing was emitted.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
