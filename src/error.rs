//! Error types returned by `Table`.

use thiserror::Error;

/// Construction was asked for fewer than one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("capacity must be at least 1, got {requested}")]
pub struct InvalidCapacity {
    pub(crate) requested: i128,
}

impl InvalidCapacity {
    /// The rejected capacity as the caller passed it.
    pub fn requested(&self) -> i128 {
        self.requested
    }
}

/// No entry with an equal key exists; carries the key that was looked up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("key not found: {key:?}")]
pub struct KeyNotFound<K> {
    key: K,
}

impl<K> KeyNotFound<K> {
    pub(crate) fn new(key: K) -> Self {
        Self { key }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn into_key(self) -> K {
        self.key
    }
}
