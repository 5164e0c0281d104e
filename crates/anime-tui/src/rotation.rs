//! Carousel rotation: a cyclic index plus the periodic task that advances it.
//!
//! `RotationState` is the pure index arithmetic. `RotationTimer` owns at most
//! one ticker task; the ticker is a scoped resource whose `Drop` aborts the
//! task, so replacing or dropping the timer never leaves a dangling interval.
//!
//! Every ticker is stamped with an epoch. Ticks from a ticker that has since
//! been replaced may still sit in the channel; they are recognised by their
//! stale epoch and ignored, so one tick period can never advance twice.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RotationState {
    index: usize,
    count: usize,
}

impl RotationState {
    pub fn new(count: usize) -> Self {
        Self { index: 0, count }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn should_rotate(&self) -> bool {
        self.count > 1
    }

    /// Step to the next element. Returns whether the index moved.
    pub fn advance(&mut self) -> bool {
        if !self.should_rotate() {
            return false;
        }
        self.index = (self.index + 1) % self.count;
        true
    }
}

struct Ticker {
    epoch: u64,
    handle: AbortHandle,
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub struct RotationTimer {
    state: RotationState,
    period: Duration,
    epoch: u64,
    ticker: Option<Ticker>,
}

impl RotationTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            state: RotationState::default(),
            period,
            epoch: 0,
            ticker: None,
        }
    }

    pub fn index(&self) -> usize {
        self.state.index()
    }

    pub fn count(&self) -> usize {
        self.state.count()
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Install a new element count: cancel the current ticker, go back to
    /// index 0, and start a fresh ticker if there is anything to rotate.
    /// Each tick sends `make_tick(epoch)` on `tx`.
    pub fn reset<M, F>(&mut self, count: usize, tx: &mpsc::Sender<M>, make_tick: F)
    where
        M: Send + 'static,
        F: Fn(u64) -> M + Send + 'static,
    {
        self.stop();
        self.state = RotationState::new(count);
        if !self.state.should_rotate() {
            debug!("rotation: {} element(s), timer disabled", count);
            return;
        }

        self.epoch += 1;
        let epoch = self.epoch;
        let period = self.period;
        let tx = tx.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if tx.send(make_tick(epoch)).await.is_err() {
                    break;
                }
            }
        });
        debug!("rotation: {} elements, ticker epoch {} every {:?}", count, epoch, period);
        self.ticker = Some(Ticker {
            epoch,
            handle: handle.abort_handle(),
        });
    }

    /// Apply a tick. Ticks from a cancelled ticker are ignored.
    /// Returns whether the index moved.
    pub fn on_tick(&mut self, epoch: u64) -> bool {
        match &self.ticker {
            Some(t) if t.epoch == epoch => self.state.advance(),
            _ => false,
        }
    }

    /// Cancel the ticker, keeping the current index.
    pub fn stop(&mut self) {
        if self.ticker.take().is_some() {
            debug!("rotation: ticker cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_element_never_moves() {
        let mut state = RotationState::new(1);
        for _ in 0..10 {
            assert!(!state.advance());
        }
        assert_eq!(state.index(), 0);
        assert!(!state.should_rotate());
    }

    #[test]
    fn test_empty_never_moves() {
        let mut state = RotationState::new(0);
        assert!(!state.advance());
        assert_eq!(state.index(), 0);
    }

    #[test]
    fn test_three_elements_wrap() {
        let mut state = RotationState::new(3);
        assert_eq!(state.index(), 0);
        for k in 1..=10 {
            assert!(state.advance());
            assert_eq!(state.index(), k % 3);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_element_starts_no_ticker() {
        let (tx, mut rx) = mpsc::channel::<u64>(8);
        let mut timer = RotationTimer::new(Duration::from_millis(3000));
        timer.reset(1, &tx, |e| e);
        assert!(!timer.is_running());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(timer.index(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_switch_from_one_to_three_elements() {
        let (tx, mut rx) = mpsc::channel::<u64>(8);
        let mut timer = RotationTimer::new(Duration::from_millis(3000));
        timer.reset(1, &tx, |e| e);
        assert!(!timer.is_running());

        timer.reset(3, &tx, |e| e);
        assert!(timer.is_running());
        assert_eq!(timer.count(), 3);

        let started = Instant::now();
        for expected in [1, 2, 0, 1] {
            let epoch = rx.recv().await.unwrap();
            assert!(timer.on_tick(epoch));
            assert_eq!(timer.index(), expected);
        }
        // four periods of 3s on the paused clock
        assert!(started.elapsed() >= Duration::from_millis(12_000));
        assert!(started.elapsed() < Duration::from_millis(15_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_discards_ticks_from_old_ticker() {
        let (tx, mut rx) = mpsc::channel::<u64>(8);
        let mut timer = RotationTimer::new(Duration::from_millis(3000));
        timer.reset(3, &tx, |e| e);
        let old_epoch = rx.recv().await.unwrap();

        // New data arrives: the old ticker is replaced.
        timer.reset(4, &tx, |e| e);
        assert_eq!(timer.index(), 0);
        assert!(!timer.on_tick(old_epoch));
        assert_eq!(timer.index(), 0);

        let new_epoch = rx.recv().await.unwrap();
        assert_ne!(new_epoch, old_epoch);
        assert!(timer.on_tick(new_epoch));
        assert_eq!(timer.index(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_ticker() {
        let (tx, mut rx) = mpsc::channel::<u64>(8);
        let mut timer = RotationTimer::new(Duration::from_millis(3000));
        timer.reset(3, &tx, |e| e);
        drop(timer);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_keeps_index() {
        let (tx, mut rx) = mpsc::channel::<u64>(8);
        let mut timer = RotationTimer::new(Duration::from_millis(3000));
        timer.reset(3, &tx, |e| e);
        let epoch = rx.recv().await.unwrap();
        assert!(timer.on_tick(epoch));
        timer.stop();
        assert!(!timer.is_running());
        assert_eq!(timer.index(), 1);
        assert!(!timer.on_tick(epoch));
    }
}
