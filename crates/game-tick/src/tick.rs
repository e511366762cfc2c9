use std::fmt;
use std::ops::{Add, Div, Sub};

/// A point on, or span of, the game tick timeline.
///
/// One tick is one nanosecond of simulation time. The value is signed so that
/// a span computed from out-of-order ticks stays representable instead of
/// saturating. Addition and subtraction wrap on overflow and never panic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameTick(i64);

impl GameTick {
    pub const ZERO: GameTick = GameTick(0);
    pub const MAX: GameTick = GameTick(i64::MAX);

    #[inline]
    pub const fn new(ticks: i64) -> Self {
        Self(ticks)
    }

    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }
}

impl From<i64> for GameTick {
    #[inline]
    fn from(ticks: i64) -> Self {
        Self(ticks)
    }
}

impl From<GameTick> for i64 {
    #[inline]
    fn from(tick: GameTick) -> Self {
        tick.0
    }
}

impl Add for GameTick {
    type Output = GameTick;

    #[inline]
    fn add(self, rhs: GameTick) -> GameTick {
        GameTick(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for GameTick {
    type Output = GameTick;

    #[inline]
    fn sub(self, rhs: GameTick) -> GameTick {
        GameTick(self.0.wrapping_sub(rhs.0))
    }
}

/// Integer division truncating toward zero.
///
/// Panics on a zero divisor like any integer division.
impl Div<i64> for GameTick {
    type Output = GameTick;

    #[inline]
    fn div(self, rhs: i64) -> GameTick {
        GameTick(self.0.wrapping_div(rhs))
    }
}

impl fmt::Display for GameTick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
