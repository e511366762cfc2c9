//! # Game tick
//!
//! The tick timeline shared by a simulation and the instrumentation that
//! watches it. [`GameTick`] is the unit, [`TickClock`] is the read-only
//! capability handed to instrumentation, and [`GlobalClock`] is the default
//! process-wide counter driven by the simulation loop.

pub mod clock;
pub mod format;
pub mod tick;

pub use clock::{advance_global_tick, global_tick, sync_global_tick, GlobalClock, ManualClock, TickClock};
pub use format::format_time_delta;
pub use tick::GameTick;

pub use chrono::TimeDelta;
