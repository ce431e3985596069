//! Named-event channel
//!
//! Same identity-set rules as state listeners, keyed by event name. The
//! payload is whatever the dispatcher passes, not the state.

use std::sync::Arc;

use tracing::{debug, error, trace};

use super::Station;
use crate::error::StationError;
use crate::fanout;
use crate::listener::Listeners;

impl<S, D> Station<S, D>
where
    S: Clone,
{
    /// Register listeners for `event_name`
    ///
    /// The event's registry is created on first use. An empty event name is
    /// logged and ignored.
    pub fn subscribe_on_event(&self, event_name: &str, listeners: impl Into<Listeners<D>>) {
        if let Err(e) = self.try_subscribe_on_event(event_name, listeners.into()) {
            error!(station = %self.inner.name, error = %e, "subscribe_on_event failed");
        }
    }

    /// Remove listeners from `event_name`; unknown events and listeners are ignored
    pub fn unsubscribe_on_event(&self, event_name: &str, listeners: impl Into<Listeners<D>>) {
        if let Err(e) = self.try_unsubscribe_on_event(event_name, listeners.into()) {
            error!(station = %self.inner.name, error = %e, "unsubscribe_on_event failed");
        }
    }

    /// Send `data` to every listener of `event_name` without waiting
    ///
    /// No-op when the event has no listeners.
    pub fn dispatch(&self, event_name: &str, data: D) {
        if let Err(e) = validate_event_name(event_name) {
            error!(station = %self.inner.name, error = %e, "dispatch failed");
            return;
        }

        let listeners = self.inner.events.read().snapshot(event_name);
        if listeners.is_empty() {
            trace!(station = %self.inner.name, event = event_name, "No listeners for event");
            return;
        }

        fanout::settle_all(
            &self.inner.name,
            &listeners,
            Arc::new(data),
            self.inner.runtime.as_ref(),
        );
    }

    /// Number of listeners registered for `event_name`
    pub fn event_listener_count(&self, event_name: &str) -> usize {
        self.inner.events.read().len(event_name)
    }

    fn try_subscribe_on_event(
        &self,
        event_name: &str,
        listeners: Listeners<D>,
    ) -> Result<(), StationError> {
        validate_event_name(event_name)?;
        if listeners.is_empty() {
            return Ok(());
        }

        let (added, total) = {
            let mut events = self.inner.events.write();
            let registry = events.entry(event_name);
            let added = listeners
                .into_iter()
                .map(|listener| registry.insert(listener))
                .filter(|&changed| changed)
                .count();
            (added, registry.len())
        };

        debug!(
            station = %self.inner.name,
            event = event_name,
            added,
            total,
            "Event listeners subscribed"
        );
        self.warn_if_crowded(Some(event_name), total, added);

        Ok(())
    }

    fn try_unsubscribe_on_event(
        &self,
        event_name: &str,
        listeners: Listeners<D>,
    ) -> Result<(), StationError> {
        validate_event_name(event_name)?;

        let removed = {
            let mut events = self.inner.events.write();
            if !events.contains_event(event_name) {
                return Ok(());
            }
            listeners
                .into_iter()
                .filter(|listener| events.remove(event_name, listener))
                .count()
        };

        debug!(
            station = %self.inner.name,
            event = event_name,
            removed,
            "Event listeners unsubscribed"
        );

        Ok(())
    }
}

fn validate_event_name(event_name: &str) -> Result<(), StationError> {
    if event_name.is_empty() {
        return Err(StationError::EmptyEventName);
    }
    Ok(())
}
