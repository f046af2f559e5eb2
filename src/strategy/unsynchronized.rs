// Unsynchronized lazy initialization. This is the negative example.
//
// Every single read or write of the slot is locked, so the program stays
// memory-safe, but check, construct and store are three separate steps.
// Callers that all see an empty slot all construct, and the last store wins.

use super::{lock, Accessor, Construction, Constructor, Strategy};
use crate::error::SingletonError;
use crate::holder::InstanceHolder;
use crate::state::GuardState;
use std::sync::{Arc, Mutex};

pub struct Unsynchronized<T> {
    holder: Mutex<InstanceHolder<T>>,
    construction: Construction<T>,
}

impl<T> Unsynchronized<T> {
    pub fn new(constructor: Constructor<T>) -> Self {
        Self {
            holder: Mutex::new(InstanceHolder::new()),
            construction: Construction::new(Strategy::Unsynchronized, constructor),
        }
    }
}

impl<T: Send + Sync> Accessor<T> for Unsynchronized<T> {
    fn get_instance(&self) -> Result<Arc<T>, SingletonError> {
        if let Some(instance) = lock(&self.holder).get() {
            return Ok(instance);
        }

        // Nothing stops another caller from getting here too.
        let value = self.construction.run()?;
        let instance = lock(&self.holder).fill(value);
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
        Strategy::Unsynchronized
    }
}
