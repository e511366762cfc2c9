use crate::error::{JitterError, Result};
use game_tick::{format_time_delta, GameTick, GlobalClock, TickClock};
use parking_lot::RwLock;
use std::fmt;
use tracing::{debug, trace};

/// Label used by [`JitterTracker::describe`] when the tracker has no name.
pub const DEFAULT_NAME: &str = "GameTickJitter";

#[derive(Debug, Default)]
struct IntervalState {
    last_act_tick: GameTick,
    event_count: i64,
    last_jitter_pct: f64,
    last_duration: GameTick,
    avg_duration: GameTick,
}

impl IntervalState {
    fn record(&mut self, start_tick: GameTick, tick: GameTick) -> f64 {
        if self.event_count == 0 {
            // No previous interval yet: seed the average, keep jitter as is.
            self.last_act_tick = tick;
            self.event_count += 1;
            self.avg_duration = tick - start_tick;
            return self.last_jitter_pct;
        }

        self.event_count += 1;
        let this_duration = tick - self.last_act_tick;
        let old_avg = self.avg_duration;
        self.avg_duration = (old_avg + this_duration) / 2;
        self.last_duration = this_duration;
        // Unchecked: a zero old_avg yields inf or NaN.
        self.last_jitter_pct = (self.last_duration - old_avg).as_f64() * 100.0 / old_avg.as_f64();
        self.last_act_tick = tick;
        self.last_jitter_pct
    }

    /// Refuses ticks that go backwards and any event that would leave the
    /// running average at zero, since the next jitter would divide by it.
    fn check(&self, start_tick: GameTick, tick: GameTick) -> Result<()> {
        if tick < self.last_act_tick {
            return Err(JitterError::TickRegression {
                tick,
                last: self.last_act_tick,
            });
        }

        let next_avg = if self.event_count == 0 {
            tick - start_tick
        } else {
            // Already zero through the unchecked path.
            if self.avg_duration.is_zero() {
                return Err(JitterError::ZeroAverage { tick });
            }
            (self.avg_duration + (tick - self.last_act_tick)) / 2
        };
        if next_avg.is_zero() {
            return Err(JitterError::ZeroAverage { tick });
        }
        Ok(())
    }
}

/// Tracks the interval between successive events of a periodic loop and how
/// far the latest interval strays from the running average.
///
/// The average is a two-point blend, `avg = (avg + delta) / 2`, and jitter is
/// `(delta - old_avg) * 100 / old_avg` percent. Recording takes an exclusive
/// lock, reads take a shared one, so a tracker can be shared across threads
/// behind an `Arc`.
pub struct JitterTracker<C: TickClock = GlobalClock> {
    name: String,
    start_tick: GameTick,
    clock: C,
    state: RwLock<IntervalState>,
}

impl JitterTracker<GlobalClock> {
    /// Creates a tracker that samples the process-wide game tick.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_clock(name, GlobalClock)
    }
}

impl<C: TickClock> JitterTracker<C> {
    /// Creates a tracker on an explicit clock. The clock's current tick
    /// becomes both the start tick and the last event tick.
    pub fn with_clock(name: impl Into<String>, clock: C) -> Self {
        let start_tick = clock.current_tick();
        Self {
            name: name.into(),
            start_tick,
            clock,
            state: RwLock::new(IntervalState {
                last_act_tick: start_tick,
                ..IntervalState::default()
            }),
        }
    }

    /// Records an event at the clock's current tick and returns the new
    /// jitter percentage.
    ///
    /// The clock is sampled inside the critical section, so concurrent
    /// callers record non-decreasing ticks as long as the clock itself is
    /// monotonic.
    pub fn record_event(&self) -> f64 {
        let mut state = self.state.write();
        let tick = self.clock.current_tick();
        self.apply(&mut state, tick)
    }

    /// Records an event at `tick` and returns the new jitter percentage.
    ///
    /// The first event only seeds the average and returns the unchanged
    /// jitter. Ticks earlier than the previous event are accepted and produce
    /// negative durations; an average of zero produces a non-finite jitter.
    /// Use [`try_record_event_at`](Self::try_record_event_at) to refuse both.
    pub fn record_event_at(&self, tick: GameTick) -> f64 {
        let mut state = self.state.write();
        self.apply(&mut state, tick)
    }

    /// Validated form of [`record_event`](Self::record_event).
    pub fn try_record_event(&self) -> Result<f64> {
        let mut state = self.state.write();
        let tick = self.clock.current_tick();
        self.try_apply(&mut state, tick)
    }

    /// Validated form of [`record_event_at`](Self::record_event_at).
    ///
    /// Refuses a tick earlier than the last event, and any tick that would
    /// leave the running average at zero (including a first event at the
    /// start tick). A refused call changes nothing, so the tracker keeps
    /// accepting later well-formed ticks.
    pub fn try_record_event_at(&self, tick: GameTick) -> Result<f64> {
        let mut state = self.state.write();
        self.try_apply(&mut state, tick)
    }

    fn try_apply(&self, state: &mut IntervalState, tick: GameTick) -> Result<f64> {
        if let Err(err) = state.check(self.start_tick, tick) {
            debug!(tracker = %self.display_name(), %tick, error = %err, "event rejected");
            return Err(err);
        }
        Ok(self.apply(state, tick))
    }

    fn apply(&self, state: &mut IntervalState, tick: GameTick) -> f64 {
        let seeding = state.event_count == 0;
        let jitter = state.record(self.start_tick, tick);

        if seeding {
            debug!(
                tracker = %self.display_name(),
                %tick,
                avg = %state.avg_duration,
                "first event seeded average duration"
            );
        } else {
            trace!(
                tracker = %self.display_name(),
                %tick,
                count = state.event_count,
                last = %state.last_duration,
                avg = %state.avg_duration,
                jitter,
                "event recorded"
            );
        }

        jitter
    }

    /// Stored running average of the inter-event durations.
    #[inline]
    pub fn average_duration(&self) -> GameTick {
        self.state.read().avg_duration
    }

    #[inline]
    pub fn last_jitter_percent(&self) -> f64 {
        self.state.read().last_jitter_pct
    }

    #[inline]
    pub fn last_duration(&self) -> GameTick {
        self.state.read().last_duration
    }

    #[inline]
    pub fn event_count(&self) -> i64 {
        self.state.read().event_count
    }

    #[inline]
    pub fn last_act_tick(&self) -> GameTick {
        self.state.read().last_act_tick
    }

    #[inline]
    pub fn start_tick(&self) -> GameTick {
        self.start_tick
    }

    /// Whether at least one event has been recorded, i.e. the durations and
    /// jitter carry meaning.
    #[inline]
    pub fn is_steady(&self) -> bool {
        self.state.read().event_count > 0
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name, or [`DEFAULT_NAME`] when it is empty.
    #[inline]
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            DEFAULT_NAME
        } else {
            &self.name
        }
    }

    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// One-line summary such as
    /// `Render[Count:3 Avg:16.67ms Last[17.01ms 2.04%]`.
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl<C: TickClock> fmt::Display for JitterTracker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (count, avg, last, jitter) = {
            let state = self.state.read();
            (
                state.event_count,
                state.avg_duration,
                state.last_duration,
                state.last_jitter_pct,
            )
        };

        write!(
            f,
            "{}[Count:{} Avg:{} Last[{} {}%]",
            self.display_name(),
            count,
            format_time_delta(self.clock.to_duration(avg)),
            format_time_delta(self.clock.to_duration(last)),
            format_jitter(jitter)
        )
    }
}

/// Two decimals, with non-finite values spelled `+Inf`, `-Inf` and `NaN`.
fn format_jitter(jitter: f64) -> String {
    if jitter.is_nan() {
        "NaN".to_string()
    } else if jitter == f64::INFINITY {
        "+Inf".to_string()
    } else if jitter == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        format!("{:4.2}", jitter)
    }
}

impl<C: TickClock> fmt::Debug for JitterTracker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JitterTracker")
            .field("name", &self.display_name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_tick::ManualClock;

    fn tracker_at(start: i64) -> JitterTracker<ManualClock> {
        JitterTracker::with_clock("test", ManualClock::new(GameTick::new(start)))
    }

    #[test]
    fn test_construction() {
        let tracker = tracker_at(500);

        assert_eq!(tracker.start_tick(), GameTick::new(500));
        assert_eq!(tracker.last_act_tick(), GameTick::new(500));
        assert_eq!(tracker.event_count(), 0);
        assert_eq!(tracker.average_duration(), GameTick::ZERO);
        assert_eq!(tracker.last_duration(), GameTick::ZERO);
        assert_eq!(tracker.last_jitter_percent(), 0.0);
        assert!(!tracker.is_steady());
    }

    #[test]
    fn test_first_event_seeds_average() {
        let tracker = tracker_at(40);

        let jitter = tracker.record_event_at(GameTick::new(140));

        assert_eq!(jitter, 0.0);
        assert_eq!(tracker.event_count(), 1);
        assert_eq!(tracker.average_duration(), GameTick::new(100));
        assert_eq!(tracker.last_duration(), GameTick::ZERO);
        assert_eq!(tracker.last_act_tick(), GameTick::new(140));
        assert!(tracker.is_steady());
    }

    #[test]
    fn test_second_event_arithmetic() {
        let tracker = tracker_at(0);

        tracker.record_event_at(GameTick::new(100));
        assert_eq!(tracker.average_duration(), GameTick::new(100));

        let jitter = tracker.record_event_at(GameTick::new(300));

        assert_eq!(jitter, 100.0);
        assert_eq!(tracker.last_jitter_percent(), 100.0);
        assert_eq!(tracker.last_duration(), GameTick::new(200));
        assert_eq!(tracker.average_duration(), GameTick::new(150));
        assert_eq!(tracker.event_count(), 2);
        assert_eq!(tracker.last_act_tick(), GameTick::new(300));
    }

    #[test]
    fn test_faster_interval_gives_negative_jitter() {
        let tracker = tracker_at(0);

        tracker.record_event_at(GameTick::new(100));
        tracker.record_event_at(GameTick::new(200));
        let jitter = tracker.record_event_at(GameTick::new(250));

        assert_eq!(jitter, -50.0);
        assert_eq!(tracker.average_duration(), GameTick::new(75));
    }

    #[test]
    fn test_record_event_samples_clock() {
        let tracker = tracker_at(1_000);

        tracker.clock().advance(GameTick::new(16));
        tracker.record_event();
        tracker.clock().advance(GameTick::new(24));
        let jitter = tracker.record_event();

        assert_eq!(tracker.last_act_tick(), GameTick::new(1_040));
        assert_eq!(tracker.last_duration(), GameTick::new(24));
        assert_eq!(tracker.average_duration(), GameTick::new(20));
        assert_eq!(jitter, 50.0);
    }

    #[test]
    fn test_idempotent_reads() {
        let tracker = tracker_at(0);
        tracker.record_event_at(GameTick::new(100));
        tracker.record_event_at(GameTick::new(330));

        let avg = tracker.average_duration();
        let last = tracker.last_duration();
        let jitter = tracker.last_jitter_percent();

        for _ in 0..5 {
            assert_eq!(tracker.average_duration(), avg);
            assert_eq!(tracker.last_duration(), last);
            assert_eq!(tracker.last_jitter_percent(), jitter);
        }
    }

    #[test]
    fn test_zero_average_gives_non_finite_jitter() {
        let tracker = tracker_at(7_000);

        tracker.record_event_at(GameTick::new(7_000));
        assert_eq!(tracker.average_duration(), GameTick::ZERO);

        let jitter = tracker.record_event_at(GameTick::new(7_005));
        assert!(jitter.is_infinite() || jitter.is_nan());
        assert_eq!(tracker.event_count(), 2);
    }

    #[test]
    fn test_zero_average_and_zero_delta_is_nan() {
        let tracker = tracker_at(10);

        tracker.record_event_at(GameTick::new(10));
        let jitter = tracker.record_event_at(GameTick::new(10));

        assert!(jitter.is_nan());
    }

    #[test]
    fn test_regression_is_accepted_unchecked() {
        let tracker = tracker_at(0);
        tracker.record_event_at(GameTick::new(100));

        let jitter = tracker.record_event_at(GameTick::new(40));

        assert_eq!(tracker.last_duration(), GameTick::new(-60));
        assert_eq!(tracker.average_duration(), GameTick::new(20));
        assert_eq!(jitter, -160.0);
        assert_eq!(tracker.last_act_tick(), GameTick::new(40));
    }

    #[test]
    fn test_try_record_rejects_regression() {
        let tracker = tracker_at(0);
        tracker.record_event_at(GameTick::new(100));

        let err = tracker.try_record_event_at(GameTick::new(50)).unwrap_err();

        assert_eq!(
            err,
            JitterError::TickRegression {
                tick: GameTick::new(50),
                last: GameTick::new(100),
            }
        );
        assert_eq!(tracker.event_count(), 1);
        assert_eq!(tracker.last_act_tick(), GameTick::new(100));
        assert_eq!(tracker.average_duration(), GameTick::new(100));
    }

    #[test]
    fn test_try_record_rejects_seed_at_start_tick() {
        let tracker = tracker_at(300);

        let err = tracker.try_record_event_at(GameTick::new(300)).unwrap_err();

        assert_eq!(err, JitterError::ZeroAverage { tick: GameTick::new(300) });
        assert_eq!(tracker.event_count(), 0);
        assert!(!tracker.is_steady());

        // A later tick still seeds normally.
        assert_eq!(tracker.try_record_event_at(GameTick::new(316)), Ok(0.0));
        assert_eq!(tracker.average_duration(), GameTick::new(16));
    }

    #[test]
    fn test_try_record_rejects_interval_that_zeroes_average() {
        let tracker = tracker_at(0);
        assert!(tracker.try_record_event_at(GameTick::new(1)).is_ok());
        assert_eq!(tracker.average_duration(), GameTick::new(1));

        // (1 + 0) / 2 would leave a zero average.
        let err = tracker.try_record_event_at(GameTick::new(1)).unwrap_err();
        assert_eq!(err, JitterError::ZeroAverage { tick: GameTick::new(1) });
        assert_eq!(tracker.event_count(), 1);
        assert_eq!(tracker.average_duration(), GameTick::new(1));

        let jitter = tracker.try_record_event_at(GameTick::new(100)).unwrap();
        assert_eq!(tracker.average_duration(), GameTick::new(50));
        assert_eq!(jitter, 9800.0);
    }

    #[test]
    fn test_validated_tracker_keeps_accepting_increasing_ticks() {
        let tracker = tracker_at(0);

        assert!(tracker.try_record_event_at(GameTick::ZERO).is_err());
        for i in 1..=1000 {
            let jitter = tracker.try_record_event_at(GameTick::new(i * 16)).unwrap();
            assert!(jitter.is_finite());
        }

        assert_eq!(tracker.event_count(), 1000);
        assert_eq!(tracker.average_duration(), GameTick::new(16));
    }

    #[test]
    fn test_try_record_refuses_zero_average_left_by_unchecked_path() {
        let tracker = tracker_at(300);
        tracker.record_event_at(GameTick::new(300));
        assert_eq!(tracker.average_duration(), GameTick::ZERO);

        let err = tracker.try_record_event_at(GameTick::new(305)).unwrap_err();

        assert_eq!(err, JitterError::ZeroAverage { tick: GameTick::new(305) });
        assert_eq!(tracker.event_count(), 1);
        assert_eq!(tracker.last_jitter_percent(), 0.0);
    }

    #[test]
    fn test_describe_non_finite_jitter() {
        let tracker = JitterTracker::with_clock("Edge", ManualClock::default());
        tracker.record_event_at(GameTick::ZERO);
        tracker.record_event_at(GameTick::new(5));
        assert!(tracker.describe().ends_with("Last[5ns +Inf%]"));

        let tracker = JitterTracker::with_clock("Edge", ManualClock::default());
        tracker.record_event_at(GameTick::ZERO);
        tracker.record_event_at(GameTick::ZERO);
        assert!(tracker.describe().ends_with("Last[0ns NaN%]"));
    }

    #[test]
    fn test_format_jitter() {
        assert_eq!(format_jitter(0.0), "0.00");
        assert_eq!(format_jitter(-12.5), "-12.50");
        assert_eq!(format_jitter(f64::NEG_INFINITY), "-Inf");
    }

    #[test]
    fn test_try_record_matches_unchecked_path() {
        let checked = tracker_at(0);
        let unchecked = tracker_at(0);

        for tick in [100, 300, 420, 600] {
            let a = checked.try_record_event_at(GameTick::new(tick)).unwrap();
            let b = unchecked.record_event_at(GameTick::new(tick));
            assert_eq!(a, b);
        }

        assert_eq!(checked.average_duration(), unchecked.average_duration());
        assert_eq!(checked.event_count(), unchecked.event_count());
    }

    #[test]
    fn test_try_record_event_uses_clock() {
        let tracker = tracker_at(0);
        tracker.clock().set(GameTick::new(100));
        assert!(tracker.try_record_event().is_ok());

        tracker.clock().set(GameTick::new(90));
        assert!(matches!(
            tracker.try_record_event(),
            Err(JitterError::TickRegression { .. })
        ));
    }

    #[test]
    fn test_describe_fallback_name() {
        let tracker = JitterTracker::with_clock("", ManualClock::default());

        let text = tracker.describe();

        assert!(text.contains(DEFAULT_NAME));
        assert_eq!(text, "GameTickJitter[Count:0 Avg:0ns Last[0ns 0.00%]");
        assert_eq!(tracker.name(), "");
        assert_eq!(tracker.display_name(), DEFAULT_NAME);
    }

    #[test]
    fn test_describe_named_tracker() {
        let tracker = JitterTracker::with_clock("Physics", ManualClock::default());
        tracker.record_event_at(GameTick::new(16_000_000));
        tracker.record_event_at(GameTick::new(33_000_000));
        tracker.record_event_at(GameTick::new(49_500));

        let text = tracker.describe();

        assert!(text.starts_with("Physics[Count:3 "));
        assert!(!text.contains(DEFAULT_NAME));
    }

    #[test]
    fn test_describe_formats_wall_time() {
        let tracker = JitterTracker::with_clock("Loop", ManualClock::default());
        tracker.record_event_at(GameTick::new(1_000_000));
        tracker.record_event_at(GameTick::new(3_000_000));

        assert_eq!(tracker.to_string(), "Loop[Count:2 Avg:1.50ms Last[2.00ms 100.00%]");
    }

    #[test]
    fn test_debug_hides_state() {
        let tracker = tracker_at(0);
        tracker.record_event_at(GameTick::new(12_345));

        let debug = format!("{:?}", tracker);

        assert!(debug.contains("test"));
        assert!(!debug.contains("12345"));
    }
}
