// ── Timestamped signal ──
//
// A manual-reset flag that also remembers when it was last set. Waiters
// pass the instant they started caring about an update; a set that
// happened after that instant satisfies the wait even if it was already
// cleared again, which closes the gap between "request sent" and
// "waiter subscribed".

use std::time::{Duration, Instant};

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Default)]
struct SignalState {
    set: bool,
    last_set: Option<Instant>,
}

/// Binary signal with a last-set timestamp, observable by any number of
/// concurrent waiters.
#[derive(Debug)]
pub struct TimedSignal {
    state: watch::Sender<SignalState>,
}

impl Default for TimedSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl TimedSignal {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SignalState::default());
        Self { state }
    }

    /// Mark signalled and record the current instant.
    pub fn set(&self) {
        self.state.send_modify(|s| {
            s.set = true;
            s.last_set = Some(Instant::now());
        });
    }

    /// Unmark. The last-set instant is kept.
    pub fn clear(&self) {
        self.state.send_if_modified(|s| {
            s.set = false;
            false
        });
    }

    /// Set then immediately clear, as one step. Current waiters wake and
    /// later waiters see the fresh timestamp, but the signal does not stay
    /// raised.
    pub fn trigger(&self) {
        self.state.send_modify(|s| {
            s.set = false;
            s.last_set = Some(Instant::now());
        });
    }

    pub fn is_set(&self) -> bool {
        self.state.borrow().set
    }

    pub fn last_set(&self) -> Option<Instant> {
        self.state.borrow().last_set
    }

    /// Whether the signal is raised or was set strictly after `after`.
    pub fn fired_since(&self, after: Option<Instant>) -> bool {
        Self::satisfied(&self.state.borrow(), after)
    }

    fn satisfied(state: &SignalState, after: Option<Instant>) -> bool {
        state.set || matches!((after, state.last_set), (Some(after), Some(last)) if last > after)
    }

    /// Wait until the signal is set, or until `timeout` elapses.
    ///
    /// Returns `true` immediately when the signal is raised or, given
    /// `after`, was set strictly after that instant. Otherwise waits for
    /// the next set or trigger.
    pub async fn wait(&self, timeout: Duration, after: Option<Instant>) -> bool {
        let mut rx = self.state.subscribe();
        let baseline = {
            let state = rx.borrow_and_update();
            if Self::satisfied(&state, after) {
                return true;
            }
            state.last_set
        };

        let fired = async {
            while rx.changed().await.is_ok() {
                let state = rx.borrow_and_update();
                if state.set || state.last_set != baseline {
                    return true;
                }
            }
            false
        };

        tokio::time::timeout(timeout, fired).await.unwrap_or(false)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tokio_test::{assert_pending, assert_ready};

    use super::*;

    const SHORT: Duration = Duration::from_millis(50);

    /// An instant that is strictly earlier than anything recorded after
    /// this call returns.
    fn mark() -> Instant {
        let mark = Instant::now();
        std::thread::sleep(Duration::from_millis(1));
        mark
    }

    #[tokio::test]
    async fn set_signal_returns_immediately() {
        let signal = TimedSignal::new();
        signal.set();
        assert!(signal.is_set());
        assert!(signal.wait(Duration::ZERO, None).await);

        signal.clear();
        assert!(!signal.is_set());
        assert!(signal.last_set().is_some());
        assert!(!signal.wait(SHORT, None).await);
    }

    #[tokio::test]
    async fn trigger_is_visible_only_through_timestamp() {
        let signal = TimedSignal::new();
        let before = mark();
        signal.trigger();

        assert!(!signal.is_set());
        assert!(signal.wait(Duration::ZERO, Some(before)).await);
        assert!(!signal.wait(SHORT, None).await);
    }

    #[tokio::test]
    async fn set_before_wait_start_is_not_missed() {
        let signal = TimedSignal::new();
        let start = mark();
        signal.trigger();
        assert!(signal.fired_since(Some(start)));
        assert!(signal.wait(SHORT, Some(start)).await);
    }

    #[tokio::test]
    async fn wait_after_latest_set_blocks_until_next_set() {
        let signal = TimedSignal::new();
        signal.trigger();
        let start = Instant::now();
        assert!(!signal.fired_since(Some(start)));

        let mut waiter = tokio_test::task::spawn(signal.wait(Duration::from_secs(5), Some(start)));
        assert_pending!(waiter.poll());

        signal.trigger();
        assert!(waiter.is_woken());
        assert!(assert_ready!(waiter.poll()));
    }

    #[tokio::test]
    async fn times_out_without_set() {
        let signal = TimedSignal::new();
        let start = Instant::now();
        assert!(!signal.wait(SHORT, Some(start)).await);
        assert!(start.elapsed() >= SHORT);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn many_waiters_wake_on_one_trigger() {
        let signal = Arc::new(TimedSignal::new());
        let start = mark();

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let signal = Arc::clone(&signal);
                tokio::spawn(async move { signal.wait(Duration::from_secs(5), Some(start)).await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(20)).await;
        signal.trigger();

        for waiter in waiters {
            assert!(waiter.await.unwrap());
        }
    }
}
