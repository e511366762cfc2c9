use crate::tick::GameTick;
use chrono::TimeDelta;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Source of game ticks.
///
/// A clock is sampled by instrumentation but never advanced by it; whoever
/// drives the simulation loop owns the clock's progress.
pub trait TickClock: Send + Sync {
    /// Current tick value. Non-decreasing over the life of the clock under
    /// normal operation.
    fn current_tick(&self) -> GameTick;

    /// Converts a tick count into wall-clock time, for display only.
    ///
    /// The default assumes one tick per nanosecond.
    #[inline]
    fn to_duration(&self, ticks: GameTick) -> TimeDelta {
        TimeDelta::nanoseconds(ticks.get())
    }
}

impl<T: TickClock + ?Sized> TickClock for &T {
    #[inline]
    fn current_tick(&self) -> GameTick {
        (**self).current_tick()
    }

    #[inline]
    fn to_duration(&self, ticks: GameTick) -> TimeDelta {
        (**self).to_duration(ticks)
    }
}

impl<T: TickClock + ?Sized> TickClock for Arc<T> {
    #[inline]
    fn current_tick(&self) -> GameTick {
        (**self).current_tick()
    }

    #[inline]
    fn to_duration(&self, ticks: GameTick) -> TimeDelta {
        (**self).to_duration(ticks)
    }
}

static GLOBAL_GAME_TICK: AtomicI64 = AtomicI64::new(0);
static PROCESS_START: Lazy<Instant> = Lazy::new(Instant::now);

/// Reads the process-wide game tick.
#[inline]
pub fn global_tick() -> GameTick {
    GameTick::new(GLOBAL_GAME_TICK.load(Ordering::Acquire))
}

/// Advances the process-wide game tick by `by` ticks and returns the new value.
#[inline]
pub fn advance_global_tick(by: GameTick) -> GameTick {
    let previous = GLOBAL_GAME_TICK.fetch_add(by.get(), Ordering::AcqRel);
    GameTick::new(previous.wrapping_add(by.get()))
}

/// Moves the process-wide game tick up to the nanoseconds elapsed since the
/// first use of the global clock. Never moves it backwards.
pub fn sync_global_tick() -> GameTick {
    let elapsed = i64::try_from(PROCESS_START.elapsed().as_nanos()).unwrap_or(i64::MAX);
    let previous = GLOBAL_GAME_TICK.fetch_max(elapsed, Ordering::AcqRel);
    GameTick::new(previous.max(elapsed))
}

/// Handle onto the process-wide game tick counter.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalClock;

impl TickClock for GlobalClock {
    #[inline]
    fn current_tick(&self) -> GameTick {
        global_tick()
    }
}

/// Clock whose value only changes when told to.
///
/// Meant for tests and deterministic replays where the tick sequence has to
/// be exact.
#[derive(Debug, Default)]
pub struct ManualClock {
    tick: AtomicI64,
}

impl ManualClock {
    #[inline]
    pub fn new(start: GameTick) -> Self {
        Self {
            tick: AtomicI64::new(start.get()),
        }
    }

    #[inline]
    pub fn set(&self, tick: GameTick) {
        self.tick.store(tick.get(), Ordering::Release);
    }

    /// Advances the clock and returns the new tick.
    #[inline]
    pub fn advance(&self, by: GameTick) -> GameTick {
        let previous = self.tick.fetch_add(by.get(), Ordering::AcqRel);
        GameTick::new(previous.wrapping_add(by.get()))
    }
}

impl TickClock for ManualClock {
    #[inline]
    fn current_tick(&self) -> GameTick {
        GameTick::new(self.tick.load(Ordering::Acquire))
    }
}
