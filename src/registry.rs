//! Listener registries
//!
//! `ListenerRegistry` is an insertion-ordered identity set.
//! `NamedEventRegistry` keeps one of those per event name, created on first
//! subscription and dropped again once its last listener leaves.

use std::collections::HashMap;

use crate::listener::Listener;

/// Ordered set of listeners keyed by identity
#[derive(Debug)]
pub(crate) struct ListenerRegistry<T> {
    entries: Vec<Listener<T>>,
}

impl<T> ListenerRegistry<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a listener unless it is already registered
    ///
    /// Returns true if the registry changed.
    pub(crate) fn insert(&mut self, listener: Listener<T>) -> bool {
        if self.contains(&listener) {
            return false;
        }
        self.entries.push(listener);
        true
    }

    /// Remove a listener if present
    ///
    /// Returns true if the registry changed.
    pub(crate) fn remove(&mut self, listener: &Listener<T>) -> bool {
        match self.entries.iter().position(|l| l.ptr_eq(listener)) {
            Some(idx) => {
                // keep registration order for the rest
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    pub(crate) fn contains(&self, listener: &Listener<T>) -> bool {
        self.entries.iter().any(|l| l.ptr_eq(listener))
    }

    /// Point-in-time copy of who gets notified, in registration order
    pub(crate) fn snapshot(&self) -> Vec<Listener<T>> {
        self.entries.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for ListenerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-event-name listener registries
#[derive(Debug)]
pub(crate) struct NamedEventRegistry<T> {
    events: HashMap<String, ListenerRegistry<T>>,
}

impl<T> NamedEventRegistry<T> {
    pub(crate) fn new() -> Self {
        Self {
            events: HashMap::new(),
        }
    }

    /// Registry for `event_name`, created if missing
    pub(crate) fn entry(&mut self, event_name: &str) -> &mut ListenerRegistry<T> {
        self.events.entry(event_name.to_string()).or_default()
    }

    /// Remove a listener from `event_name`, dropping the registry when empty
    ///
    /// Returns true if a listener was removed.
    pub(crate) fn remove(&mut self, event_name: &str, listener: &Listener<T>) -> bool {
        let Some(registry) = self.events.get_mut(event_name) else {
            return false;
        };
        let removed = registry.remove(listener);
        if registry.is_empty() {
            self.events.remove(event_name);
        }
        removed
    }

    /// Listeners for `event_name`; empty when the event is unknown
    pub(crate) fn snapshot(&self, event_name: &str) -> Vec<Listener<T>> {
        self.events
            .get(event_name)
            .map(ListenerRegistry::snapshot)
            .unwrap_or_default()
    }

    pub(crate) fn len(&self, event_name: &str) -> usize {
        self.events.get(event_name).map_or(0, ListenerRegistry::len)
    }

    pub(crate) fn contains_event(&self, event_name: &str) -> bool {
        self.events.contains_key(event_name)
    }
}

impl<T> Default for NamedEventRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
