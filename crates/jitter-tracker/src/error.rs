use game_tick::GameTick;
use thiserror::Error;

/// Reasons a validated record is refused. The tracker is left untouched.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum JitterError {
    #[error("Tick {tick} is earlier than the last recorded tick {last}")]
    TickRegression { tick: GameTick, last: GameTick },
    #[error("Event at tick {tick} would leave a zero average duration")]
    ZeroAverage { tick: GameTick },
}

pub type Result<T> = std::result::Result<T, JitterError>;
