// The demo payload: a stand-in for some slow-to-acquire shared resource.

use crate::delay::ConstructionDelay;
use crate::error::SingletonError;
use crate::strategy::{Constructor, Strategy};
use rand::Rng;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    pub label: String,
    pub strategy: Strategy,
    pub seed: u32,
}

impl Resource {
    /// Waits out `delay`, then builds the resource with a fresh random seed.
    pub fn acquire(strategy: Strategy, delay: &ConstructionDelay) -> Result<Self, SingletonError> {
        delay.wait()?;
        Ok(Self {
            label: format!("{} Singleton", strategy.label()),
            strategy,
            seed: rand::thread_rng().gen_range(10..1010),
        })
    }

    /// The eager payload also shows its seed, so every caller can see it
    /// holds the value drawn once in the composition root.
    pub fn greeting(&self, creation_count: usize) -> String {
        match self.strategy {
            Strategy::Eager => format!(
                "Hello from {}! Count: {}, seed: {}",
                self.label, creation_count, self.seed
            ),
            _ => format!("Hello from {}! Count: {}", self.label, creation_count),
        }
    }
}

pub fn constructor(strategy: Strategy, delay: ConstructionDelay) -> Constructor<Resource> {
    Box::new(move || Resource::acquire(strategy, &delay))
}
