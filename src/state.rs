// Construction guard state machine: Empty -> Constructing -> Ready.
// A failed or cancelled construction moves Constructing back to Empty.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardState {
    Empty,
    Constructing,
    Ready,
}

impl GuardState {
    const fn as_u8(self) -> u8 {
        match self {
            GuardState::Empty => 0,
            GuardState::Constructing => 1,
            GuardState::Ready => 2,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => GuardState::Empty,
            1 => GuardState::Constructing,
            _ => GuardState::Ready,
        }
    }
}

impl fmt::Display for GuardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GuardState::Empty => "EMPTY",
            GuardState::Constructing => "CONSTRUCTING",
            GuardState::Ready => "READY",
        };
        f.write_str(name)
    }
}

/// Observable guard state, shared between the guard and diagnostics.
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl StateCell {
    pub const fn new(initial: GuardState) -> Self {
        Self(AtomicU8::new(initial.as_u8()))
    }

    pub fn get(&self) -> GuardState {
        GuardState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, state: GuardState) {
        self.0.store(state.as_u8(), Ordering::Release);
    }

    /// Moves `Constructing` back to `Empty`; a `Ready` guard stays ready.
    pub fn abort(&self) {
        let _ = self.0.compare_exchange(
            GuardState::Constructing.as_u8(),
            GuardState::Empty.as_u8(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new(GuardState::Empty)
    }
}
