// Eager initialization: the composition root builds the instance before any
// caller can race for it, so the accessor is a plain clone.

use super::{Accessor, Strategy};
use crate::error::SingletonError;
use crate::holder::CreationCounter;
use crate::state::GuardState;
use std::sync::Arc;
use tracing::info;

pub struct Eager<T> {
    instance: Arc<T>,
    counter: CreationCounter,
}

impl<T> Eager<T> {
    /// Constructs the instance immediately. Call this once, from `main`,
    /// before handing the provider to other threads.
    pub fn new<F>(constructor: F) -> Result<Self, SingletonError>
    where
        F: FnOnce() -> Result<T, SingletonError>,
    {
        let instance = Arc::new(constructor()?);
        let counter = CreationCounter::new();
        let total = counter.record();
        info!("eager: instance constructed at startup (creation count {})", total);
        Ok(Self { instance, counter })
    }
}

impl<T: Send + Sync> Accessor<T> for Eager<T> {
    fn get_instance(&self) -> Result<Arc<T>, SingletonError> {
        Ok(Arc::clone(&self.instance))
    }

    fn creation_count(&self) -> usize {
        self.counter.get()
    }

    fn state(&self) -> GuardState {
        GuardState::Ready
    }

    fn strategy(&self) -> Strategy {
        Strategy::Eager
    }
}
