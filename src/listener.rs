//! Listener callbacks
//!
//! A listener is a shared callable that receives an immutable snapshot.
//! Identity is by allocation: clones of a `Listener` are the same listener,
//! two listeners built from identical closures are not.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::ListenerResult;

/// Boxed future produced by an async listener
pub type ListenerFuture = Pin<Box<dyn Future<Output = ListenerResult> + Send + 'static>>;

/// What a listener hands back when invoked
///
/// The synchronous part of a listener has already run by the time this is
/// returned. `Deferred` work is spawned by the fan-out and never awaited.
pub enum Settlement {
    /// Listener finished synchronously
    Ready(ListenerResult),
    /// Listener has async work left to do
    Deferred(ListenerFuture),
}

impl fmt::Debug for Settlement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Settlement::Ready(result) => f.debug_tuple("Ready").field(&result.is_ok()).finish(),
            Settlement::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

type ListenerFn<T> = dyn Fn(Arc<T>) -> Settlement + Send + Sync;

/// Identity-keyed callback receiving `Arc<T>` snapshots
pub struct Listener<T> {
    func: Arc<ListenerFn<T>>,
}

impl<T: Send + Sync + 'static> Listener<T> {
    /// Create a listener with an async body
    ///
    /// Anything the closure does before returning its future runs inline
    /// during the broadcast; the future itself is spawned.
    ///
    /// ```ignore
    /// let listener = Listener::new(|state: Arc<Counter>| async move {
    ///     render(state.count).await?;
    ///     Ok(())
    /// });
    /// ```
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ListenerResult> + Send + 'static,
    {
        Self::from_settlement(move |value| Settlement::Deferred(Box::pin(f(value))))
    }

    /// Create a listener that runs to completion synchronously
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(Arc<T>) -> ListenerResult + Send + Sync + 'static,
    {
        Self::from_settlement(move |value| Settlement::Ready(f(value)))
    }

    /// Create a listener that decides per call whether it settles now or later
    pub fn from_settlement<F>(f: F) -> Self
    where
        F: Fn(Arc<T>) -> Settlement + Send + Sync + 'static,
    {
        Self { func: Arc::new(f) }
    }
}

impl<T> Listener<T> {
    /// True when both handles refer to the same registered callback
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }

    /// Invoke the callback; the synchronous part runs on the caller's thread
    pub(crate) fn call(&self, value: Arc<T>) -> Settlement {
        (self.func)(value)
    }

    fn addr(&self) -> *const u8 {
        Arc::as_ptr(&self.func) as *const u8
    }
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
        }
    }
}

impl<T> PartialEq for Listener<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T> Eq for Listener<T> {}

impl<T> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", self.addr())
    }
}

/// One listener or an ordered sequence of listeners
#[derive(Debug)]
pub struct Listeners<T>(Vec<Listener<T>>);

impl<T> Listeners<T> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> IntoIterator for Listeners<T> {
    type Item = Listener<T>;
    type IntoIter = std::vec::IntoIter<Listener<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<T> From<Listener<T>> for Listeners<T> {
    fn from(listener: Listener<T>) -> Self {
        Listeners(vec![listener])
    }
}

impl<T> From<&Listener<T>> for Listeners<T> {
    fn from(listener: &Listener<T>) -> Self {
        Listeners(vec![listener.clone()])
    }
}

impl<T> From<Vec<Listener<T>>> for Listeners<T> {
    fn from(listeners: Vec<Listener<T>>) -> Self {
        Listeners(listeners)
    }
}

impl<T> From<&[Listener<T>]> for Listeners<T> {
    fn from(listeners: &[Listener<T>]) -> Self {
        Listeners(listeners.to_vec())
    }
}

impl<T, const N: usize> From<[Listener<T>; N]> for Listeners<T> {
    fn from(listeners: [Listener<T>; N]) -> Self {
        Listeners(listeners.into())
    }
}
