//! Station - observable state container
//!
//! Holds one object-shaped state value, shallow-merges partial updates into
//! it and broadcasts a snapshot to every registered listener. A second
//! registry keyed by event name carries caller-supplied payloads.
//!
//! Reading and subscribing go through [`Station`]. Writing needs the
//! [`StateWriter`] capability, which only the constructor hands out:
//!
//! ```
//! use std::sync::Arc;
//! use station::{Listener, ShallowMerge, StateWriter, Station};
//!
//! #[derive(Clone, Default, Debug, PartialEq)]
//! struct Counter {
//!     count: Option<i64>,
//! }
//!
//! impl ShallowMerge for Counter {
//!     fn shallow_merge(&mut self, partial: Self) {
//!         if partial.count.is_some() {
//!             self.count = partial.count;
//!         }
//!     }
//! }
//!
//! /// Domain station: callers can observe it, only `increment` writes
//! struct CounterStation {
//!     writer: StateWriter<Counter>,
//! }
//!
//! impl CounterStation {
//!     fn new() -> Self {
//!         let (_, writer) = Station::new(Counter { count: Some(0) });
//!         Self { writer }
//!     }
//!
//!     fn station(&self) -> &Station<Counter> {
//!         self.writer.station()
//!     }
//!
//!     fn increment(&self) {
//!         let next = self.station().state().count.unwrap_or(0) + 1;
//!         self.writer.set_state(Counter { count: Some(next) });
//!     }
//! }
//!
//! let counter = CounterStation::new();
//! counter.station().subscribe(Listener::from_fn(|state: Arc<Counter>| {
//!     println!("count is now {:?}", state.count);
//!     Ok(())
//! }));
//! counter.increment();
//! assert_eq!(counter.station().state().count, Some(1));
//! ```

mod events;

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

use crate::config::StationConfig;
use crate::fanout;
use crate::listener::Listeners;
use crate::merge::ShallowMerge;
use crate::registry::{ListenerRegistry, NamedEventRegistry};

/// Shared state behind every `Station` / `StateWriter` handle
struct Inner<S, D> {
    name: String,
    listener_warn_threshold: usize,
    /// Runtime current at construction, used for deferred listener work
    /// broadcast from threads without a runtime
    runtime: Option<Handle>,
    state: RwLock<S>,
    listeners: RwLock<ListenerRegistry<S>>,
    events: RwLock<NamedEventRegistry<D>>,
}

/// Read-and-subscribe handle to an observable state value
///
/// Cheap to clone; all clones observe the same state and registries.
/// `D` is the payload type of the named-event channel.
pub struct Station<S, D = Value> {
    inner: Arc<Inner<S, D>>,
}

/// Write capability for a [`Station`]
///
/// Returned once by the constructor. Whoever owns it defines the domain
/// mutators; everyone else only gets the `Station`.
pub struct StateWriter<S, D = Value> {
    station: Station<S, D>,
}

impl<S, D> Station<S, D>
where
    S: ShallowMerge + Clone + Send + Sync + 'static,
    D: Send + Sync + 'static,
{
    /// Create a station holding `initial`, with default configuration
    pub fn new(initial: S) -> (Self, StateWriter<S, D>) {
        Self::with_config(initial, &StationConfig::default())
    }

    /// Create a station holding `initial`
    ///
    /// Deferred listener work runs on the runtime current at broadcast time.
    /// The runtime current here, if any, is kept as the fallback for
    /// broadcasts from threads without one.
    pub fn with_config(initial: S, config: &StationConfig) -> (Self, StateWriter<S, D>) {
        let station = Station {
            inner: Arc::new(Inner {
                name: config.name.clone(),
                listener_warn_threshold: config.listener_warn_threshold,
                runtime: Handle::try_current().ok(),
                state: RwLock::new(initial),
                listeners: RwLock::new(ListenerRegistry::new()),
                events: RwLock::new(NamedEventRegistry::new()),
            }),
        };

        debug!(
            station = %station.inner.name,
            has_runtime = station.inner.runtime.is_some(),
            "Station created"
        );

        let writer = StateWriter {
            station: station.clone(),
        };
        (station, writer)
    }

    /// Create a station holding `S::default()`
    pub fn empty() -> (Self, StateWriter<S, D>)
    where
        S: Default,
    {
        Self::new(S::default())
    }
}

impl<S, D> Station<S, D>
where
    S: Clone,
{
    /// Name used in log fields
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Register one or more state listeners
    ///
    /// Listeners already registered are skipped, so each listener is
    /// invoked at most once per broadcast. New listeners are notified from
    /// the next broadcast on.
    pub fn subscribe(&self, listeners: impl Into<Listeners<S>>) {
        let listeners = listeners.into();
        let (added, total) = {
            let mut registry = self.inner.listeners.write();
            let added = listeners
                .into_iter()
                .map(|listener| registry.insert(listener))
                .filter(|&changed| changed)
                .count();
            (added, registry.len())
        };

        debug!(station = %self.inner.name, added, total, "State listeners subscribed");
        self.warn_if_crowded(None, total, added);
    }

    /// Remove one or more state listeners; unknown listeners are ignored
    pub fn unsubscribe(&self, listeners: impl Into<Listeners<S>>) {
        let listeners = listeners.into();
        let (removed, total) = {
            let mut registry = self.inner.listeners.write();
            let removed = listeners
                .into_iter()
                .filter(|listener| registry.remove(listener))
                .count();
            (removed, registry.len())
        };

        debug!(station = %self.inner.name, removed, total, "State listeners unsubscribed");
    }

    /// Copy of the current state
    ///
    /// The copy is detached; changing it never touches the station.
    pub fn state(&self) -> S {
        self.inner.state.read().clone()
    }

    /// Number of registered state listeners
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.read().len()
    }

    /// Log once when a registry first grows past the configured threshold
    fn warn_if_crowded(&self, event_name: Option<&str>, total: usize, added: usize) {
        let threshold = self.inner.listener_warn_threshold;
        if crossed_threshold(threshold, total, added) {
            warn!(
                station = %self.inner.name,
                event = event_name.unwrap_or("<state>"),
                listeners = total,
                threshold,
                "Listener count above threshold, possible listener leak"
            );
        }
    }
}

/// True when growing a registry by `added` to `total` moved it past `threshold`
fn crossed_threshold(threshold: usize, total: usize, added: usize) -> bool {
    total > threshold && total.saturating_sub(added) <= threshold
}

impl<S, D> StateWriter<S, D>
where
    S: ShallowMerge + Clone,
{
    /// Merge `partial` into the state and notify every state listener
    ///
    /// Top-level fields of `partial` overwrite the current ones, the rest
    /// are kept. When listeners are registered, each receives the same
    /// post-merge snapshot. Returns without waiting for any listener;
    /// listener failures are logged and never reach the caller.
    pub fn set_state(&self, partial: S) {
        let inner = &self.station.inner;

        let (listeners, snapshot) = {
            let mut state = inner.state.write();
            state.shallow_merge(partial);

            let listeners = inner.listeners.read().snapshot();
            if listeners.is_empty() {
                trace!(station = %inner.name, "State updated, no listeners");
                return;
            }
            (listeners, Arc::new(state.clone()))
        };

        fanout::settle_all(&inner.name, &listeners, snapshot, inner.runtime.as_ref());
    }

    /// The station this writer controls
    pub fn station(&self) -> &Station<S, D> {
        &self.station
    }
}

impl<S, D> Clone for Station<S, D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, D> fmt::Debug for Station<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Station")
            .field("name", &self.inner.name)
            .field("listeners", &self.inner.listeners.read().len())
            .finish_non_exhaustive()
    }
}

impl<S, D> fmt::Debug for StateWriter<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateWriter")
            .field("station", &self.station)
            .finish()
    }
}
