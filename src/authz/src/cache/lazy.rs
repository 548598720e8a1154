//! Deferred cache fields
//!
//! A [`LazyField`] either holds a value captured when the cache entry was built,
//! or derives it on first read from a freshly fetched source. Memoization is
//! best-effort: two readers racing on an empty field may both fetch and derive,
//! and whichever publishes first wins. The derivation is a plain `fn` pointer,
//! so it cannot capture request state and always yields equal values for equal
//! sources.

use std::fmt;
use std::sync::{Arc, OnceLock};

enum State<S, V> {
    Eager(Arc<V>),
    Deferred {
        derive: fn(&S) -> V,
        default: fn() -> V,
        cell: OnceLock<Arc<V>>,
    },
}

/// Field computed from a source of type `S` on first demand
pub struct LazyField<S, V> {
    state: State<S, V>,
}

impl<S, V> LazyField<S, V> {
    /// Field whose value is already known
    pub fn eager(value: V) -> Self {
        Self {
            state: State::Eager(Arc::new(value)),
        }
    }

    /// Field derived from the source on first read, or `default()` when no
    /// source can be fetched
    pub fn deferred(derive: fn(&S) -> V, default: fn() -> V) -> Self {
        Self {
            state: State::Deferred {
                derive,
                default,
                cell: OnceLock::new(),
            },
        }
    }

    /// Read the field, fetching the source only when nothing is held yet
    ///
    /// A missing source yields the default without memoizing it, so a later
    /// read can still pick up the real value.
    pub fn get<F>(&self, fetch: F) -> Arc<V>
    where
        F: FnOnce() -> Option<S>,
    {
        match &self.state {
            State::Eager(value) => Arc::clone(value),
            State::Deferred {
                derive,
                default,
                cell,
            } => {
                if let Some(value) = cell.get() {
                    return Arc::clone(value);
                }

                match fetch() {
                    Some(source) => {
                        let derived = Arc::new(derive(&source));
                        // Lost race: keep the published value
                        let _ = cell.set(Arc::clone(&derived));
                        cell.get().map_or(derived, Arc::clone)
                    }
                    None => Arc::new(default()),
                }
            }
        }
    }

    /// True once a value is held without needing a fetch
    pub fn is_materialized(&self) -> bool {
        match &self.state {
            State::Eager(_) => true,
            State::Deferred { cell, .. } => cell.get().is_some(),
        }
    }
}

impl<S, V: fmt::Debug> fmt::Debug for LazyField<S, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            State::Eager(value) => f.debug_tuple("Eager").field(value).finish(),
            State::Deferred { cell, .. } => match cell.get() {
                Some(value) => f.debug_tuple("Materialized").field(value).finish(),
                None => f.write_str("Deferred"),
            },
        }
    }
}
