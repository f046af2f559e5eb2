// Concurrent caller driver.
//
// Spawns N callers, lines them up on a barrier so they hit the accessor
// together, and reports what each one observed.

use crate::state::GuardState;
use crate::strategy::{Accessor, Strategy};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error};

#[derive(Debug, Clone, Serialize)]
pub struct Observation {
    pub caller: usize,
    /// Creation count seen right after this caller's `get_instance()`.
    pub creation_count: usize,
    /// Address of the instance received; equal addresses mean the same instance.
    pub instance: Option<usize>,
    pub elapsed_ms: f64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub strategy: Strategy,
    pub callers: usize,
    pub observations: Vec<Observation>,
    pub total_elapsed_ms: f64,
    pub creation_count: usize,
    pub distinct_instances: usize,
    pub final_state: GuardState,
}

impl RunReport {
    pub fn failures(&self) -> usize {
        self.observations.iter().filter(|o| o.error.is_some()).count()
    }

    /// True when every successful caller received the same instance and
    /// exactly one construction happened.
    pub fn is_single_instance(&self) -> bool {
        self.creation_count == 1 && self.distinct_instances == 1
    }

    pub fn total_elapsed(&self) -> Duration {
        Duration::from_secs_f64(self.total_elapsed_ms / 1000.0)
    }
}

pub fn run_concurrent<T>(provider: &Arc<dyn Accessor<T>>, callers: usize) -> RunReport
where
    T: Send + Sync + 'static,
{
    run_concurrent_with(provider, callers, |_, _| {})
}

/// Like [`run_concurrent`], calling `inspect` from each caller's thread
/// once it holds the instance.
pub fn run_concurrent_with<T, F>(
    provider: &Arc<dyn Accessor<T>>,
    callers: usize,
    inspect: F,
) -> RunReport
where
    T: Send + Sync + 'static,
    F: Fn(&Observation, &T) + Sync,
{
    let barrier = Barrier::new(callers);
    let start = Instant::now();

    let outcomes: Vec<(Observation, Option<Arc<T>>)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..callers)
            .map(|caller| {
                let barrier = &barrier;
                let inspect = &inspect;
                let provider = Arc::clone(provider);
                scope.spawn(move || {
                    barrier.wait();
                    call_once(caller, &*provider, start, inspect)
                })
            })
            .collect();

        handles
            .into_iter()
            .enumerate()
            .map(|(caller, handle)| {
                handle.join().unwrap_or_else(|_| {
                    error!("caller {} panicked", caller);
                    (failed(caller, 0, start, "caller panicked".to_string()), None)
                })
            })
            .collect()
    });

    let total_elapsed = start.elapsed();

    // Every Arc is still alive here, so distinct instances have distinct addresses.
    let distinct_instances = outcomes
        .iter()
        .filter_map(|(_, instance)| instance.as_ref().map(address_of))
        .collect::<HashSet<_>>()
        .len();

    RunReport {
        strategy: provider.strategy(),
        callers,
        observations: outcomes.into_iter().map(|(obs, _)| obs).collect(),
        total_elapsed_ms: millis(total_elapsed),
        creation_count: provider.creation_count(),
        distinct_instances,
        final_state: provider.state(),
    }
}

fn call_once<T, F>(
    caller: usize,
    provider: &dyn Accessor<T>,
    start: Instant,
    inspect: &F,
) -> (Observation, Option<Arc<T>>)
where
    F: Fn(&Observation, &T),
{
    match provider.get_instance() {
        Ok(instance) => {
            let observation = Observation {
                caller,
                creation_count: provider.creation_count(),
                instance: Some(address_of(&instance)),
                elapsed_ms: millis(start.elapsed()),
                error: None,
            };
            debug!("caller {} got instance {:#x}", caller, address_of(&instance));
            inspect(&observation, &*instance);
            (observation, Some(instance))
        }
        Err(err) => (
            failed(caller, provider.creation_count(), start, err.to_string()),
            None,
        ),
    }
}

fn failed(caller: usize, creation_count: usize, start: Instant, error: String) -> Observation {
    Observation {
        caller,
        creation_count,
        instance: None,
        elapsed_ms: millis(start.elapsed()),
        error: Some(error),
    }
}

fn address_of<T>(instance: &Arc<T>) -> usize {
    Arc::as_ptr(instance) as *const () as usize
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
