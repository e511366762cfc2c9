//! Simulated game loops instrumented with a jitter tracker.

use crate::config::LoopConfig;
use game_tick::sync_global_tick;
use jitter_tracker::JitterTracker;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct LoopReport {
    pub name: String,
    pub frames: u64,
    pub events: i64,
    pub summary: String,
}

/// A periodic loop that sleeps for its frame interval, drives the global
/// tick clock forward and records one event per frame.
pub struct SimulatedLoop {
    config: LoopConfig,
    tracker: Arc<JitterTracker>,
}

impl SimulatedLoop {
    pub fn new(config: LoopConfig) -> Self {
        let tracker = Arc::new(JitterTracker::new(config.name.clone()));
        Self { config, tracker }
    }

    pub fn tracker(&self) -> Arc<JitterTracker> {
        Arc::clone(&self.tracker)
    }

    pub fn frame_delay<R: Rng + ?Sized>(&self, frame: u64, rng: &mut R) -> Duration {
        let mut delay = Duration::from_millis(self.config.frame_interval_ms);

        if self.config.stall_every > 0 && frame % self.config.stall_every == 0 {
            delay += Duration::from_millis(self.config.stall_ms);
        }
        if self.config.spread_us > 0 {
            delay += Duration::from_micros(rng.gen_range(0..=self.config.spread_us));
        }

        delay
    }

    /// Runs up to `frames` frames, stopping early when `shutdown` changes.
    pub async fn run(&self, frames: u64, report_every: u64, mut shutdown: watch::Receiver<bool>) -> LoopReport {
        let mut rng = StdRng::from_entropy();
        let mut completed = 0;

        for frame in 1..=frames {
            let delay = self.frame_delay(frame, &mut rng);
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => break,
            }

            sync_global_tick();
            let jitter = self.tracker.record_event();
            completed = frame;

            if !jitter.is_finite() {
                warn!(name = %self.tracker.display_name(), frame, "jitter is not finite, average duration was zero");
            }
            if report_every > 0 && frame % report_every == 0 {
                info!("{}", self.tracker);
            }
        }

        LoopReport {
            name: self.tracker.display_name().to_string(),
            frames: completed,
            events: self.tracker.event_count(),
            summary: self.tracker.describe(),
        }
    }
}
