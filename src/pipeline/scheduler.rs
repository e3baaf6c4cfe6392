//! Periodic activity scheduling.
//!
//! - [`CancellationToken`] - shared stop signal. Cancelling drops the sender
//!   half of a channel, which wakes every `select!` waiting on it.
//! - [`run_periodic`] - blocking tick loop driven by `crossbeam_channel::tick`.
//!   The token is checked before every tick, so no new work starts once it is
//!   cancelled.
//! - [`InFlightGuard`] - admits at most one inference job at a time; a tick
//!   that finds a job running is dropped rather than queued. Releasing the
//!   permit wakes anyone blocked in [`InFlightGuard::wait_idle`].

use crossbeam_channel::{bounded, select, tick, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

struct TokenInner {
    cancelled: AtomicBool,
    sender: Mutex<Option<Sender<()>>>,
    receiver: Receiver<()>,
}

/// Cloneable cancellation signal shared by the periodic activities
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

impl CancellationToken {
    pub fn new() -> Self {
        let (sender, receiver) = bounded(0);
        Self {
            inner: Arc::new(TokenInner {
                cancelled: AtomicBool::new(false),
                sender: Mutex::new(Some(sender)),
                receiver,
            }),
        }
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        let mut sender = self
            .inner
            .sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        sender.take();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Channel that becomes disconnected on cancellation, for use in `select!`
    pub fn receiver(&self) -> &Receiver<()> {
        &self.inner.receiver
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Call `on_tick` every `interval` until `token` is cancelled.
///
/// The first call happens one interval after entry. Returns the number of
/// ticks executed.
pub fn run_periodic<F>(interval: Duration, token: &CancellationToken, mut on_tick: F) -> u64
where
    F: FnMut(),
{
    let ticker = tick(interval);
    let mut ticks = 0;
    loop {
        if token.is_cancelled() {
            break;
        }
        select! {
            recv(ticker) -> _ => {
                if token.is_cancelled() {
                    break;
                }
                on_tick();
                ticks += 1;
            }
            recv(token.receiver()) -> _ => break,
        }
    }
    ticks
}

#[derive(Debug, Default)]
struct Slot {
    busy: AtomicBool,
    lock: Mutex<()>,
    released: Condvar,
}

/// At-most-one admission guard for inference jobs
#[derive(Debug, Clone, Default)]
pub struct InFlightGuard {
    slot: Arc<Slot>,
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot, or `None` if a job is already running
    pub fn try_acquire(&self) -> Option<InFlightPermit> {
        self.slot
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightPermit {
                slot: Arc::clone(&self.slot),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.slot.busy.load(Ordering::Acquire)
    }

    /// Block until the slot is free, up to `timeout`.
    /// Returns `true` if it was free in time.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let guard = self.slot.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (_guard, _) = self
            .slot
            .released
            .wait_timeout_while(guard, timeout, |_| self.is_busy())
            .unwrap_or_else(PoisonError::into_inner);
        !self.is_busy()
    }
}

/// Releases the in-flight slot when dropped
#[derive(Debug)]
pub struct InFlightPermit {
    slot: Arc<Slot>,
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        self.slot.busy.store(false, Ordering::Release);
        // Waiters check `busy` while holding the lock
        let _guard = self.slot.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.slot.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_token_starts_uncancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
        assert!(token.clone().is_cancelled());
    }

    #[test]
    fn test_cancelled_receiver_disconnects() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(token.receiver().recv().is_err());
    }

    #[test]
    fn test_run_periodic_returns_immediately_when_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let ticks = run_periodic(Duration::from_millis(1), &token, || {
            panic!("no tick may run after cancellation")
        });
        assert_eq!(ticks, 0);
    }

    #[test]
    fn test_run_periodic_stops_on_cancel() {
        let token = CancellationToken::new();
        let counter = Arc::new(AtomicU64::new(0));

        let handle = {
            let token = token.clone();
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                run_periodic(Duration::from_millis(2), &token, || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
            })
        };

        thread::sleep(Duration::from_millis(50));
        let started = Instant::now();
        token.cancel();
        let ticks = handle.join().unwrap();

        assert!(ticks > 0);
        assert_eq!(ticks, counter.load(Ordering::SeqCst));
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_in_flight_guard_admits_one() {
        let guard = InFlightGuard::new();
        let permit = guard.try_acquire().expect("first acquire succeeds");
        assert!(guard.is_busy());
        assert!(guard.try_acquire().is_none());
        drop(permit);
        assert!(!guard.is_busy());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn test_permit_released_across_threads() {
        let guard = InFlightGuard::new();
        let permit = guard.try_acquire().unwrap();
        thread::spawn(move || drop(permit)).join().unwrap();
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn test_wait_idle_wakes_on_release() {
        let guard = InFlightGuard::new();
        let permit = guard.try_acquire().unwrap();
        let releaser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            drop(permit);
        });

        let started = Instant::now();
        assert!(guard.wait_idle(Duration::from_secs(2)));
        assert!(started.elapsed() < Duration::from_secs(1));
        releaser.join().unwrap();
    }

    #[test]
    fn test_wait_idle_times_out_while_held() {
        let guard = InFlightGuard::new();
        assert!(guard.wait_idle(Duration::ZERO));

        let _permit = guard.try_acquire().unwrap();
        assert!(!guard.wait_idle(Duration::from_millis(10)));
    }
}
