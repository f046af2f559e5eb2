// Full-method mutual exclusion: every call takes the lock, even after the
// instance is ready.

use super::{lock, Accessor, Construction, Constructor, Strategy};
use crate::error::SingletonError;
use crate::holder::InstanceHolder;
use crate::state::GuardState;
use std::sync::{Arc, Mutex};

pub struct Synchronized<T> {
    holder: Mutex<InstanceHolder<T>>,
    construction: Construction<T>,
}

impl<T> Synchronized<T> {
    pub fn new(constructor: Constructor<T>) -> Self {
        Self {
            holder: Mutex::new(InstanceHolder::new()),
            construction: Construction::new(Strategy::Synchronized, constructor),
        }
    }
}

impl<T: Send + Sync> Accessor<T> for Synchronized<T> {
    fn get_instance(&self) -> Result<Arc<T>, SingletonError> {
        let mut holder = lock(&self.holder);
        if let Some(instance) = holder.get() {
            return Ok(instance);
        }

        let value = self.construction.run()?;
        let instance = holder.fill(value);
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
        Strategy::Synchronized
    }
}
