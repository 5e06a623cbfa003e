//! Scratch-object pooling.
//!
//! The tick hot paths reuse their auxiliary buffers (wave receiver lists,
//! relative-position visited sets) instead of reallocating them every tick.
//! [`Pool`] is intentionally minimal: `get` hands out a pooled value or a
//! fresh default, `put` takes it back.

use parking_lot::Mutex;

/// A shared pool of reusable values.
#[derive(Debug, Default)]
pub(crate) struct Pool<T> {
    items: Mutex<Vec<T>>,
}

impl<T: Default> Pool<T> {
    pub(crate) const fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    /// Take a value from the pool, or a fresh default if the pool is empty.
    pub(crate) fn get(&self) -> T {
        self.items.lock().pop().unwrap_or_default()
    }

    /// Return a value to the pool. The caller is responsible for clearing
    /// any contents it does not want the next user to see.
    pub(crate) fn put(&self, item: T) {
        self.items.lock().push(item);
    }
}
