// ── Single cache cell ──

use parking_lot::RwLock;

use crate::signal::TimedSignal;

/// One optional value plus the signal fired whenever it is replaced or
/// removed. Reads hand out clones; the stored value is never exposed by
/// reference.
#[derive(Debug)]
pub struct EntryCache<T> {
    value: RwLock<Option<T>>,
    signal: TimedSignal,
}

impl<T> Default for EntryCache<T> {
    fn default() -> Self {
        Self {
            value: RwLock::new(None),
            signal: TimedSignal::new(),
        }
    }
}

impl<T: Clone> EntryCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<T> {
        self.value.read().clone()
    }

    /// Replace the value and fire the signal.
    pub fn set(&self, value: T) {
        *self.value.write() = Some(value);
        self.signal.trigger();
    }

    /// Drop the value and fire the signal, so waiters on a deleted key
    /// unblock instead of running into their timeout.
    pub fn remove(&self) -> Option<T> {
        let previous = self.value.write().take();
        self.signal.trigger();
        previous
    }

    /// Drop the value without firing the signal.
    pub fn reset(&self) {
        self.value.write().take();
    }

    pub fn is_populated(&self) -> bool {
        self.value.read().is_some()
    }

    pub fn signal(&self) -> &TimedSignal {
        &self.signal
    }
}
