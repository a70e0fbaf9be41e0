// Raffle client - Live countdown ticker
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use solana_program::clock::UnixTimestamp;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

use crate::lifecycle::{raffle_state, RaffleState};
use crate::state::RaffleSnapshot;

/// Period between re-evaluations while a raffle is live
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Wall-clock source, injectable so tests can drive time by hand
pub trait Clock: Send + 'static {
    /// Current unix time in seconds
    fn now(&self) -> UnixTimestamp;
}

/// Clock backed by the system time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> UnixTimestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

/// Re-evaluates a raffle's lifecycle state once a second and publishes the
/// result, stopping on its own the first time the raffle is no longer live.
///
/// Snapshot updates arriving on the input channel replace the evaluator's
/// inputs, trigger an immediate re-evaluation and reset the tick schedule.
/// Dropping the ticker (or calling [`CountdownTicker::stop`]) cancels the
/// background task; nothing is left to be collected later.
pub struct CountdownTicker {
    states: watch::Receiver<RaffleState>,
    task: JoinHandle<()>,
}

impl CountdownTicker {
    /// Evaluate once immediately, then start ticking.
    pub fn spawn<C: Clock>(mut snapshots: watch::Receiver<RaffleSnapshot>, clock: C) -> Self {
        let initial = {
            let snap = snapshots.borrow_and_update().clone();
            raffle_state(&snap.raffle, snap.entrants.as_ref(), clock.now())
        };
        let (tx, rx) = watch::channel(initial);
        let task = tokio::spawn(run(snapshots, tx, clock, initial));
        CountdownTicker { states: rx, task }
    }

    /// Latest published state
    pub fn state(&self) -> RaffleState {
        *self.states.borrow()
    }

    /// Receiver observing state transitions. The channel closes once the
    /// ticker has stopped.
    pub fn subscribe(&self) -> watch::Receiver<RaffleState> {
        self.states.clone()
    }

    /// Whether the ticker has stopped on its own
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the ticker explicitly
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<C: Clock>(
    mut snapshots: watch::Receiver<RaffleSnapshot>,
    states: watch::Sender<RaffleState>,
    clock: C,
    initial: RaffleState,
) {
    if !initial.is_live() {
        debug!(state = ?initial, "raffle not live at spawn, ticker idle");
        return;
    }

    // The spawn-time evaluation covered the immediate tick, so the first
    // interval tick fires one full period later.
    let mut interval = time::interval_at(time::Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut feed_open = true;

    loop {
        if feed_open {
            tokio::select! {
                _ = interval.tick() => {}
                changed = snapshots.changed() => match changed {
                    // Fresh inputs restart the schedule.
                    Ok(()) => interval.reset(),
                    // Feed gone; keep ticking on the last snapshot.
                    Err(_) => feed_open = false,
                },
            }
        } else {
            interval.tick().await;
        }

        let snap = snapshots.borrow_and_update().clone();
        let state = raffle_state(&snap.raffle, snap.entrants.as_ref(), clock.now());
        if states.send(state).is_err() {
            // Every observer is gone.
            return;
        }
        if !state.is_live() {
            debug!(?state, "raffle left live state, ticker stopping");
            return;
        }
    }
}
