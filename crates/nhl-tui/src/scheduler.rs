//! LiveScheduler — periodic refresh gated by a predicate over fresh state.
//!
//! One scheduler per owning view, at most one timer each. The gate is
//! evaluated at tick time against the store's current snapshot, so a game
//! that stops being live halts refreshes on the next tick even before the
//! owner calls `stop`.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace};

use crate::app_state::{AppState, ViewKind};
use crate::store::Store;

/// Shortest accepted tick period; shorter requests are raised to it.
pub const MIN_INTERVAL: Duration = Duration::from_millis(100);

enum PollState {
    Idle,
    Polling {
        interval: Duration,
        /// Cleared by `stop` and by the task itself when the gate closes.
        active: Rc<Cell<bool>>,
        task: JoinHandle<()>,
    },
}

pub struct LiveScheduler {
    owner: ViewKind,
    store: Store,
    state: PollState,
}

impl LiveScheduler {
    pub fn new(owner: ViewKind, store: Store) -> Self {
        Self {
            owner,
            store,
            state: PollState::Idle,
        }
    }

    /// Start ticking every `interval`; each tick calls `refresh` if
    /// `predicate` holds for the current state. An active timer is replaced.
    /// Must run inside a `LocalSet`.
    pub fn start<P, R>(&mut self, interval: Duration, predicate: P, refresh: R)
    where
        P: Fn(&AppState) -> bool + 'static,
        R: Fn() + 'static,
    {
        self.stop();
        let interval = interval.max(MIN_INTERVAL);

        let active = Rc::new(Cell::new(true));
        let guard = active.clone();
        let store = self.store.clone();
        let owner = self.owner;

        let task = tokio::task::spawn_local(async move {
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if !guard.get() {
                    break;
                }
                if predicate(&store.get_state()) {
                    trace!("[poll] {:?} tick: refresh", owner);
                    refresh();
                } else {
                    debug!("[poll] {:?} tick: gate closed, going idle", owner);
                    guard.set(false);
                    break;
                }
            }
        });

        debug!("[poll] {:?} started every {:?}", self.owner, interval);
        self.state = PollState::Polling {
            interval,
            active,
            task,
        };
    }

    /// Cancel the timer. Idempotent.
    pub fn stop(&mut self) {
        if let PollState::Polling { active, task, .. } =
            std::mem::replace(&mut self.state, PollState::Idle)
        {
            active.set(false);
            task.abort();
            debug!("[poll] {:?} stopped", self.owner);
        }
    }

    pub fn is_polling(&self) -> bool {
        match &self.state {
            PollState::Idle => false,
            PollState::Polling { active, .. } => active.get(),
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        match &self.state {
            PollState::Polling { interval, active, .. } if active.get() => Some(*interval),
            _ => None,
        }
    }
}

impl Drop for LiveScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::PartialState;
    use crate::test_support::today;
    use tokio::task::LocalSet;

    const EVERY: Duration = Duration::from_secs(10);

    fn counter() -> (Rc<Cell<usize>>, impl Fn() + 'static) {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        (count, move || c.set(c.get() + 1))
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_start_leaves_one_timer() {
        LocalSet::new()
            .run_until(async {
                let store = Store::new(AppState::new(today()));
                let mut scheduler = LiveScheduler::new(ViewKind::Game, store);
                let (count, refresh) = counter();
                let refresh = Rc::new(refresh);

                let r1 = refresh.clone();
                scheduler.start(EVERY, |_| true, move || r1());
                let r2 = refresh.clone();
                scheduler.start(EVERY, |_| true, move || r2());
                assert!(scheduler.is_polling());

                time::sleep(EVERY * 3 + Duration::from_millis(1)).await;
                assert_eq!(count.get(), 3);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        LocalSet::new()
            .run_until(async {
                let store = Store::new(AppState::new(today()));
                let mut scheduler = LiveScheduler::new(ViewKind::Game, store);
                scheduler.stop();

                let (count, refresh) = counter();
                scheduler.start(EVERY, |_| true, refresh);
                scheduler.stop();
                scheduler.stop();
                assert!(!scheduler.is_polling());
                assert_eq!(scheduler.interval(), None);

                time::sleep(EVERY * 2).await;
                assert_eq!(count.get(), 0);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_is_read_at_tick_time() {
        LocalSet::new()
            .run_until(async {
                let store = Store::new(AppState::new(today()));
                let mut scheduler = LiveScheduler::new(ViewKind::Game, store.clone());
                let (count, refresh) = counter();
                scheduler.start(EVERY, |s: &AppState| s.loading, refresh);

                // Gate opens only after start.
                store.set_state(PartialState::new().loading(true));
                time::sleep(EVERY + Duration::from_millis(1)).await;
                assert_eq!(count.get(), 1);

                store.set_state(PartialState::new().loading(false));
                time::sleep(EVERY).await;
                assert_eq!(count.get(), 1);
                assert!(!scheduler.is_polling());

                time::sleep(EVERY * 3).await;
                assert_eq!(count.get(), 1);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_is_raised_to_floor() {
        LocalSet::new()
            .run_until(async {
                let store = Store::new(AppState::new(today()));
                let mut scheduler = LiveScheduler::new(ViewKind::Game, store);
                let (count, refresh) = counter();
                scheduler.start(Duration::ZERO, |_| true, refresh);
                assert_eq!(scheduler.interval(), Some(MIN_INTERVAL));

                time::sleep(MIN_INTERVAL * 2 + Duration::from_millis(1)).await;
                assert_eq!(count.get(), 2);
                scheduler.stop();
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_timer() {
        LocalSet::new()
            .run_until(async {
                let store = Store::new(AppState::new(today()));
                let (count, refresh) = counter();
                {
                    let mut scheduler = LiveScheduler::new(ViewKind::Game, store);
                    scheduler.start(EVERY, |_| true, refresh);
                }
                time::sleep(EVERY * 2).await;
                assert_eq!(count.get(), 0);
            })
            .await;
    }
}
