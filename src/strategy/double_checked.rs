// Double-checked locking.
//
// Fast path: an Acquire load of the published pointer, no lock.
// Slow path: take the mutex, check again, construct, then publish with
// Release so a reader that sees the pointer also sees the finished payload.

use super::{lock, Accessor, Construction, Constructor, Strategy};
use crate::error::SingletonError;
use crate::holder::InstanceHolder;
use crate::state::GuardState;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::sync::{Arc, Mutex};

pub struct DoubleChecked<T> {
    /// Borrowed view of the `Arc` owned by `holder`; null until ready.
    published: AtomicPtr<T>,
    holder: Mutex<InstanceHolder<T>>,
    construction: Construction<T>,
}

impl<T> DoubleChecked<T> {
    pub fn new(constructor: Constructor<T>) -> Self {
        Self {
            published: AtomicPtr::new(ptr::null_mut()),
            holder: Mutex::new(InstanceHolder::new()),
            construction: Construction::new(Strategy::DoubleChecked, constructor),
        }
    }

    fn load_published(&self) -> Option<Arc<T>> {
        let raw = self.published.load(Ordering::Acquire);
        if raw.is_null() {
            return None;
        }

        // Safety: `raw` came from `Arc::as_ptr` on the instance stored in
        // `holder`. The holder keeps that strong reference for as long as
        // `self` lives and is never refilled once published, so the
        // allocation is alive and we may take another reference to it.
        unsafe {
            Arc::increment_strong_count(raw);
            Some(Arc::from_raw(raw))
        }
    }
}

impl<T: Send + Sync> Accessor<T> for DoubleChecked<T> {
    fn get_instance(&self) -> Result<Arc<T>, SingletonError> {
        if let Some(instance) = self.load_published() {
            return Ok(instance);
        }

        let mut holder = lock(&self.holder);
        if let Some(instance) = holder.get() {
            return Ok(instance);
        }

        let value = self.construction.run()?;
        let instance = holder.fill(value);
        self.published
            .store(Arc::as_ptr(&instance) as *mut T, Ordering::Release);
        self.construction.mark_ready();
        Ok(instance)
    }

    fn creation_count(&self) -> usize {
        self.construction.counter.get()
    }

    fn state(&self) -> GuardState {
        self.construction.state.get()
    }

    fn strategy(&self) -> Strategy {
        Strategy::DoubleChecked
    }
}
