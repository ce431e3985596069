//! Shallow merge of partial state
//!
//! Top-level keys of the partial overwrite the same keys of the target.
//! Keys missing from the partial are kept. Nested values are replaced whole,
//! never merged recursively.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use serde_json::{Map, Value};
use tracing::warn;

/// State shape a station can hold
///
/// Typed states usually model "absent" fields as `Option` and only copy
/// the ones that are set:
///
/// ```
/// use station::ShallowMerge;
///
/// #[derive(Clone, Default)]
/// struct Player {
///     volume: Option<u8>,
///     track: Option<String>,
/// }
///
/// impl ShallowMerge for Player {
///     fn shallow_merge(&mut self, partial: Self) {
///         if partial.volume.is_some() {
///             self.volume = partial.volume;
///         }
///         if partial.track.is_some() {
///             self.track = partial.track;
///         }
///     }
/// }
/// ```
pub trait ShallowMerge {
    fn shallow_merge(&mut self, partial: Self);
}

impl ShallowMerge for Map<String, Value> {
    fn shallow_merge(&mut self, partial: Self) {
        for (key, value) in partial {
            self.insert(key, value);
        }
    }
}

/// Object semantics: the target becomes an object, a non-object partial is ignored
impl ShallowMerge for Value {
    fn shallow_merge(&mut self, partial: Self) {
        let fields = match partial {
            Value::Object(fields) => fields,
            other => {
                warn!(partial = %other, "Ignoring non-object partial state");
                return;
            }
        };
        if !self.is_object() {
            *self = Value::Object(Map::new());
        }
        if let Value::Object(target) = self {
            target.shallow_merge(fields);
        }
    }
}

impl<K: Eq + Hash, V> ShallowMerge for HashMap<K, V> {
    fn shallow_merge(&mut self, partial: Self) {
        self.extend(partial);
    }
}

impl<K: Ord, V> ShallowMerge for BTreeMap<K, V> {
    fn shallow_merge(&mut self, partial: Self) {
        self.extend(partial);
    }
}
