//! Fire-and-forget listener fan-out
//!
//! Every listener is invoked in registration order on the broadcasting
//! thread. Whatever is left as async work goes into a task group that a
//! detached supervisor drains, logging failures and discarding results.
//! Nothing is ever reported back to the broadcaster.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinSet;
use tracing::{debug, trace, warn};

use crate::error::{ListenerResult, StationError};
use crate::listener::{Listener, ListenerFuture, Settlement};

/// Outcome counters for one broadcast, used for tracing and tests
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FanoutReport {
    /// Listeners invoked
    pub(crate) invoked: usize,
    /// Listeners that failed (error or panic) synchronously
    pub(crate) failed: usize,
    /// Deferred futures handed to the runtime
    pub(crate) spawned: usize,
    /// Deferred futures dropped for lack of a runtime
    pub(crate) dropped: usize,
}

/// Invoke `listeners` with `value` and settle everything without waiting
///
/// Deferred work runs on the runtime current at broadcast time. `fallback`,
/// the handle captured when the station was built, is used only when the
/// broadcasting thread has no runtime of its own.
pub(crate) fn settle_all<T>(
    station: &str,
    listeners: &[Listener<T>],
    value: Arc<T>,
    fallback: Option<&Handle>,
) -> FanoutReport {
    let mut report = FanoutReport::default();
    let mut pending: Vec<ListenerFuture> = Vec::new();

    for listener in listeners {
        report.invoked += 1;
        let value = Arc::clone(&value);

        match catch_unwind(AssertUnwindSafe(|| listener.call(value))) {
            Ok(Settlement::Ready(Ok(()))) => {}
            Ok(Settlement::Ready(Err(e))) => {
                report.failed += 1;
                log_failure(station, &StationError::Listener(e));
            }
            Ok(Settlement::Deferred(fut)) => pending.push(fut),
            Err(payload) => {
                report.failed += 1;
                log_failure(station, &StationError::from_panic(payload.as_ref()));
            }
        }
    }

    if !pending.is_empty() {
        match select_runtime(fallback) {
            Some(handle) => {
                report.spawned = pending.len();
                spawn_group(station, pending, &handle);
            }
            None => {
                report.dropped = pending.len();
                warn!(
                    station = %station,
                    "{}",
                    StationError::NoRuntime {
                        dropped: report.dropped
                    }
                );
            }
        }
    }

    trace!(
        station = %station,
        invoked = report.invoked,
        failed = report.failed,
        spawned = report.spawned,
        "Broadcast settled"
    );

    report
}

/// Runtime of the calling context, else the captured fallback
fn select_runtime(fallback: Option<&Handle>) -> Option<Handle> {
    Handle::try_current().ok().or_else(|| fallback.cloned())
}

/// Spawn every future now, then hand the group to a detached supervisor
fn spawn_group(station: &str, pending: Vec<ListenerFuture>, handle: &Handle) {
    let mut group: JoinSet<ListenerResult> = JoinSet::new();
    for fut in pending {
        group.spawn_on(fut, handle);
    }

    let station = station.to_string();
    handle.spawn(async move {
        while let Some(joined) = group.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log_failure(&station, &StationError::Listener(e)),
                Err(join_err) if join_err.is_panic() => {
                    let payload = join_err.into_panic();
                    log_failure(&station, &StationError::from_panic(payload.as_ref()));
                }
                // runtime shutting down
                Err(_) => {}
            }
        }
    });
}

fn log_failure(station: &str, err: &StationError) {
    match err {
        StationError::ListenerPanicked(_) => warn!(station = %station, error = %err, "Listener panicked"),
        _ => debug!(station = %station, error = %err, "Listener failed"),
    }
}
