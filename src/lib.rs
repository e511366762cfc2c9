//! # Tick Jitter: loop timing instrumentation
//!
//! Measures how evenly a periodic game or simulation loop runs:
//! - A process-wide game tick clock the loop drives forward
//! - A lock-protected tracker of tick-to-tick durations and their jitter
//! - TOML configuration and a simulated loop for trying it out

pub mod config;
pub mod simulation;

pub use game_tick;
pub use jitter_tracker;

pub use config::{ConfigError, JitterConfig, LoopConfig};
pub use game_tick::{GameTick, GlobalClock, ManualClock, TickClock};
pub use jitter_tracker::{JitterError, JitterTracker};
pub use simulation::{LoopReport, SimulatedLoop};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
