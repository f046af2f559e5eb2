// Cancellable, bounded construction delay.
//
// Stands in for slow resource acquisition. Cancellation is signalled by
// disconnecting a channel: nothing is ever sent, so a completed `recv`
// on the token always means the handle is gone.

use crate::error::SingletonError;
use crossbeam::channel::{self, select, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Owner side of a cancellation signal.
///
/// Cancelling (or dropping) the handle wakes every [`ConstructionDelay`]
/// waiting on one of its tokens.
#[derive(Debug)]
pub struct CancelHandle {
    _tx: Sender<()>,
    token: CancelToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, rx) = channel::bounded(0);
        Self {
            _tx: tx,
            token: CancelToken { rx },
        }
    }

    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn cancel(self) {
        debug!("cancellation requested");
    }

    /// Cancels from a background thread once `after` has elapsed, unless the
    /// returned timer is disarmed first.
    pub fn cancel_after(self, after: Duration) -> CancelTimer {
        let (done, finished) = channel::bounded::<()>(0);
        let handle = self;
        let thread = thread::spawn(move || {
            select! {
                recv(finished) -> _ => false,
                default(after) => {
                    info!("cancelling construction after {:?}", after);
                    handle.cancel();
                    true
                }
            }
        });
        CancelTimer { done, thread }
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Pending cancellation started by [`CancelHandle::cancel_after`].
///
/// Dropping the timer without disarming it also stops the countdown (and
/// cancels, since the handle goes with it), but does not wait for the thread.
#[derive(Debug)]
pub struct CancelTimer {
    done: Sender<()>,
    thread: JoinHandle<bool>,
}

impl CancelTimer {
    /// Stops the countdown and waits for the timer thread. Returns whether
    /// the cancellation had already fired. The handle is dropped either way.
    pub fn disarm(self) -> bool {
        drop(self.done);
        self.thread.join().unwrap_or_else(|_| {
            error!("cancellation timer panicked");
            false
        })
    }
}

#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: Receiver<()>,
}

impl CancelToken {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        Self {
            rx: channel::never(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }
}

#[derive(Debug, Clone)]
pub struct ConstructionDelay {
    duration: Duration,
    token: CancelToken,
}

impl ConstructionDelay {
    pub fn new(duration: Duration, token: CancelToken) -> Self {
        Self { duration, token }
    }

    pub fn uncancellable(duration: Duration) -> Self {
        Self::new(duration, CancelToken::never())
    }

    pub fn none() -> Self {
        Self::uncancellable(Duration::ZERO)
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Waits for the configured duration, or returns `Cancelled` as soon as
    /// the owning handle is cancelled.
    pub fn wait(&self) -> Result<(), SingletonError> {
        select! {
            recv(self.token.rx) -> _ => {
                warn!("construction delay of {:?} interrupted", self.duration);
                Err(SingletonError::Cancelled)
            }
            default(self.duration) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_wait_runs_full_duration() {
        let delay = ConstructionDelay::uncancellable(Duration::from_millis(30));
        let start = Instant::now();
        assert!(delay.wait().is_ok());
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_zero_delay_returns_immediately() {
        assert_eq!(ConstructionDelay::none().wait(), Ok(()));
    }

    #[test]
    fn test_never_token_is_not_cancelled() {
        assert!(!CancelToken::never().is_cancelled());
    }

    #[test]
    fn test_cancel_before_wait() {
        let handle = CancelHandle::new();
        let token = handle.token();
        assert!(!token.is_cancelled());

        handle.cancel();
        assert!(token.is_cancelled());

        let delay = ConstructionDelay::new(Duration::from_secs(10), token);
        assert_eq!(delay.wait(), Err(SingletonError::Cancelled));
    }

    #[test]
    fn test_cancel_interrupts_wait() {
        let handle = CancelHandle::new();
        let delay = ConstructionDelay::new(Duration::from_secs(10), handle.token());

        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            handle.cancel();
        });

        let start = Instant::now();
        assert_eq!(delay.wait(), Err(SingletonError::Cancelled));
        assert!(start.elapsed() < Duration::from_secs(5));
        canceller.join().unwrap();
    }

    #[test]
    fn test_timer_fires_after_deadline() {
        let handle = CancelHandle::new();
        let token = handle.token();
        let timer = handle.cancel_after(Duration::from_millis(20));

        let delay = ConstructionDelay::new(Duration::from_secs(10), token.clone());
        assert_eq!(delay.wait(), Err(SingletonError::Cancelled));
        assert!(timer.disarm());
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_disarmed_timer_returns_without_waiting() {
        let handle = CancelHandle::new();
        let token = handle.token();
        let timer = handle.cancel_after(Duration::from_secs(10));

        let start = Instant::now();
        assert!(!timer.disarm());
        assert!(start.elapsed() < Duration::from_secs(5));
        // The handle went away with the timer thread.
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_dropping_handle_cancels() {
        let token = CancelHandle::new().token();
        assert!(token.is_cancelled());
    }
}
