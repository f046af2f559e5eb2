// Instance holder: the slot for the singleton plus its creation counter.
//
// Nothing here synchronizes the check-then-fill sequence. `InstanceHolder`
// needs `&mut self` to write, so whoever shares it decides how that
// exclusive access is obtained.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug)]
pub struct InstanceHolder<T> {
    slot: Option<Arc<T>>,
}

impl<T> InstanceHolder<T> {
    pub const fn new() -> Self {
        Self { slot: None }
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    /// Stores `value`, replacing whatever was there. Last write wins.
    pub fn fill(&mut self, value: T) -> Arc<T> {
        let instance = Arc::new(value);
        self.slot = Some(Arc::clone(&instance));
        instance
    }
}

impl<T> Default for InstanceHolder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts real constructions. Diagnostic only.
#[derive(Debug, Default)]
pub struct CreationCounter(AtomicUsize);

impl CreationCounter {
    pub const fn new() -> Self {
        Self(AtomicUsize::new(0))
    }

    /// Records one construction and returns the new total.
    pub fn record(&self) -> usize {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }
}
