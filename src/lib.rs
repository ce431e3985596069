//! Station - observable state container
//!
//! A [`Station`] owns one object-shaped state value. Updates are
//! shallow-merged in through a [`StateWriter`] and every registered
//! [`Listener`] receives the post-merge snapshot. Listeners are fired and
//! forgotten: the writer never waits for them and never sees their errors.
//! A secondary channel dispatches arbitrary payloads to listeners keyed by
//! event name.
//!
//! ```text
//!   StateWriter::set_state(partial)
//!          │ shallow merge
//!          ▼
//!   ┌──────────────┐  snapshot   ┌────────────┐
//!   │   state: S   │ ──────────▶ │ listener 1 │  sync part inline,
//!   └──────────────┘      │      └────────────┘  async part spawned
//!                         └────▶ │ listener 2 │
//!                                └────────────┘
//! ```
//!
//! Registries stay inside the station; only their sizes are exposed, through
//! [`Station::listener_count`] and [`Station::event_listener_count`]:
//!
//! ```compile_fail
//! use station::registry::ListenerRegistry;
//! ```

pub mod config;
pub mod error;
mod fanout;
pub mod listener;
pub mod merge;
mod registry;
pub mod station;

pub use config::StationConfig;
pub use error::{ListenerError, ListenerResult, StationError};
pub use listener::{Listener, ListenerFuture, Listeners, Settlement};
pub use merge::ShallowMerge;
pub use station::{StateWriter, Station};

/// JSON-object state, the shape most stations hold
pub type StateMap = serde_json::Map<String, serde_json::Value>;
