// Construction guard strategies and the common accessor interface.
//
// Four ways to guard the same state machine:
// - Unsynchronized: check-then-construct with no exclusion (racy on purpose)
// - Synchronized: the whole accessor call holds one mutex
// - DoubleChecked: lock-free fast path, mutex only on the slow path
// - Eager: built by the composition root before any caller exists

mod double_checked;
mod eager;
mod synchronized;
mod unsynchronized;

pub use double_checked::DoubleChecked;
pub use eager::Eager;
pub use synchronized::Synchronized;
pub use unsynchronized::Unsynchronized;

use crate::error::{ConfigError, SingletonError};
use crate::holder::CreationCounter;
use crate::state::{GuardState, StateCell};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Builds the payload. Called once per real construction attempt.
pub type Constructor<T> = Box<dyn Fn() -> Result<T, SingletonError> + Send + Sync>;

/// The `get_instance()` entry point shared by every strategy.
pub trait Accessor<T>: Send + Sync {
    /// Returns the singleton, constructing it if no instance is ready yet.
    fn get_instance(&self) -> Result<Arc<T>, SingletonError>;

    fn creation_count(&self) -> usize;

    fn state(&self) -> GuardState;

    fn strategy(&self) -> Strategy;
}

/// Deserializes through [`FromStr`], so config files accept the same
/// spellings and aliases as the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum Strategy {
    Unsynchronized,
    Synchronized,
    DoubleChecked,
    Eager,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Unsynchronized,
        Strategy::Synchronized,
        Strategy::DoubleChecked,
        Strategy::Eager,
    ];

    /// Whether the strategy guarantees a single construction.
    pub fn is_thread_safe(self) -> bool {
        !matches!(self, Strategy::Unsynchronized)
    }

    pub fn label(self) -> &'static str {
        match self {
            Strategy::Unsynchronized => "Non-Thread Safe",
            Strategy::Synchronized => "Thread Safe",
            Strategy::DoubleChecked => "Double-Checked Locking",
            Strategy::Eager => "Eager",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Unsynchronized => "unsynchronized",
            Strategy::Synchronized => "synchronized",
            Strategy::DoubleChecked => "double-checked",
            Strategy::Eager => "eager",
        };
        f.write_str(name)
    }
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unsynchronized" | "unsafe" | "racy" => Ok(Strategy::Unsynchronized),
            "synchronized" | "mutex" => Ok(Strategy::Synchronized),
            "double-checked" | "double-checked-locking" | "dcl" => Ok(Strategy::DoubleChecked),
            "eager" | "static" => Ok(Strategy::Eager),
            other => Err(ConfigError::UnknownStrategy(other.to_string())),
        }
    }
}

impl TryFrom<String> for Strategy {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Builds the guard for `strategy`. For `Eager` the constructor runs now,
/// so this is where an eager construction failure surfaces.
pub fn provider<T>(
    strategy: Strategy,
    constructor: Constructor<T>,
) -> Result<Arc<dyn Accessor<T>>, SingletonError>
where
    T: Send + Sync + 'static,
{
    let provider: Arc<dyn Accessor<T>> = match strategy {
        Strategy::Unsynchronized => Arc::new(Unsynchronized::new(constructor)),
        Strategy::Synchronized => Arc::new(Synchronized::new(constructor)),
        Strategy::DoubleChecked => Arc::new(DoubleChecked::new(constructor)),
        Strategy::Eager => Arc::new(Eager::new(constructor)?),
    };
    Ok(provider)
}

// ============================================================================
// Shared construction bookkeeping
// ============================================================================

/// Constructor plus the counter and state every lazy guard keeps.
struct Construction<T> {
    strategy: Strategy,
    constructor: Constructor<T>,
    counter: CreationCounter,
    state: StateCell,
}

impl<T> Construction<T> {
    fn new(strategy: Strategy, constructor: Constructor<T>) -> Self {
        Self {
            strategy,
            constructor,
            counter: CreationCounter::new(),
            state: StateCell::default(),
        }
    }

    /// Runs the constructor. On failure the state goes back to `Empty` and
    /// the counter is left alone; publishing and `Ready` are up to the guard.
    fn run(&self) -> Result<T, SingletonError> {
        self.state.set(GuardState::Constructing);
        debug!("{}: constructing instance", self.strategy);

        // Resets to `Empty` on error and on unwind out of the constructor.
        let attempt = AbortOnDrop::new(&self.state);
        match (self.constructor)() {
            Ok(value) => {
                attempt.disarm();
                let total = self.counter.record();
                info!("{}: instance constructed (creation count {})", self.strategy, total);
                Ok(value)
            }
            Err(err) => {
                warn!("{}: construction failed: {}", self.strategy, err);
                Err(err)
            }
        }
    }

    fn mark_ready(&self) {
        self.state.set(GuardState::Ready);
    }
}

struct AbortOnDrop<'a> {
    state: &'a StateCell,
    armed: bool,
}

impl<'a> AbortOnDrop<'a> {
    fn new(state: &'a StateCell) -> Self {
        Self { state, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AbortOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.abort();
        }
    }
}

/// The holder is written at most once per construction, so a panic in
/// another caller never leaves it half-updated.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}


#[cfg(test)]
mod tests {
    use super::test_support::slow_counter;
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("dcl".parse::<Strategy>().unwrap(), Strategy::DoubleChecked);
        assert_eq!(" Eager ".parse::<Strategy>().unwrap(), Strategy::Eager);
        assert_eq!("mutex".parse::<Strategy>().unwrap(), Strategy::Synchronized);
        assert!(matches!(
            "lazy".parse::<Strategy>(),
            Err(ConfigError::UnknownStrategy(_))
        ));
    }

    #[test]
    fn test_display_parses_back() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.to_string().parse::<Strategy>().unwrap(), strategy);
        }
    }

    #[test]
    fn test_only_unsynchronized_is_unsafe() {
        let unsafe_ones: Vec<_> = Strategy::ALL
            .iter()
            .filter(|s| !s.is_thread_safe())
            .collect();
        assert_eq!(unsafe_ones, vec![&Strategy::Unsynchronized]);
    }

    #[test]
    fn test_provider_builds_requested_strategy() {
        for strategy in Strategy::ALL {
            let accessor = provider(strategy, slow_counter(Duration::ZERO)).unwrap();
            assert_eq!(accessor.strategy(), strategy);
            assert_eq!(*accessor.get_instance().unwrap(), 0);
            assert_eq!(accessor.creation_count(), 1);
            assert_eq!(accessor.state(), GuardState::Ready);
        }
    }

    #[test]
    fn test_strategy_deserializes_like_from_str() {
        let parsed: Vec<Strategy> =
            serde_json::from_str(r#"["DCL", " Mutex", "double-checked"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![Strategy::DoubleChecked, Strategy::Synchronized, Strategy::DoubleChecked]
        );

        let err = serde_json::from_str::<Strategy>(r#""lazy""#).unwrap_err();
        assert!(err.to_string().contains("unknown strategy 'lazy'"));

        let json = serde_json::to_string(&Strategy::DoubleChecked).unwrap();
        assert_eq!(json, r#""double-checked""#);
    }

    #[test]
    fn test_panicking_constructor_leaves_guard_empty() {
        for strategy in [Strategy::Unsynchronized, Strategy::Synchronized, Strategy::DoubleChecked] {
            let calls = AtomicUsize::new(0);
            let accessor = provider::<u32>(
                strategy,
                Box::new(move || -> Result<u32, SingletonError> {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        panic!("constructor blew up");
                    }
                    Ok(7)
                }),
            )
            .unwrap();

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| accessor.get_instance()));
            assert!(outcome.is_err(), "{}", strategy);
            assert_eq!(accessor.state(), GuardState::Empty, "{}", strategy);
            assert_eq!(accessor.creation_count(), 0);

            assert_eq!(*accessor.get_instance().unwrap(), 7);
            assert_eq!(accessor.state(), GuardState::Ready);
            assert_eq!(accessor.creation_count(), 1);
        }
    }

    #[test]
    fn test_eager_provider_surfaces_failure() {
        let result = provider::<u8>(
            Strategy::Eager,
            Box::new(|| Err(SingletonError::construction_failed("no device"))),
        );
        assert!(matches!(result, Err(SingletonError::ConstructionFailed { .. })));
    }
}
