//! Triangular-wave state machine driving the threads-active metric.

/// Direction of the next oscillator step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Stepping towards the upper bound.
    Rising,
    /// Stepping towards zero.
    Falling,
}

/// Bounded triangular-wave oscillator.
///
/// Starting at `(0, Rising)`, each tick steps the value by one towards the
/// current direction and flips direction on arrival at a boundary, producing
/// a wave that bounces between `0` and `bound` inclusive with period
/// `2 * bound`. Every tick emits exactly one `+1` or `-1` delta; the tick
/// that reaches a boundary still emits a step, never a no-op.
///
/// The state is owned exclusively by the update scheduler's task. It is
/// deliberately not shared with the asynchronous observation callbacks, so
/// no synchronization is needed around it.
#[derive(Debug, Clone)]
pub struct Oscillator {
    current: i64,
    bound: i64,
    direction: Direction,
}

impl Oscillator {
    /// Create an oscillator bouncing between `0` and `bound` inclusive.
    ///
    /// A negative bound is treated as zero.
    pub fn new(bound: i64) -> Self {
        Self {
            current: 0,
            bound: bound.max(0),
            direction: Direction::Rising,
        }
    }

    /// Current value, always within `[0, bound]`.
    pub fn current(&self) -> i64 {
        self.current
    }

    /// Direction of the next step.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Advance one tick, returning the emitted delta.
    ///
    /// For `bound >= 1` this always returns `Some(1)` or `Some(-1)`. For the
    /// degenerate `bound == 0` there is no room to step: the value stays at
    /// zero, the direction alternates, and no delta is emitted.
    pub fn tick(&mut self) -> Option<i64> {
        if self.bound == 0 {
            self.direction = match self.direction {
                Direction::Rising => Direction::Falling,
                Direction::Falling => Direction::Rising,
            };
            return None;
        }

        let delta = match self.direction {
            Direction::Rising => 1,
            Direction::Falling => -1,
        };
        self.current += delta;

        if self.current == self.bound {
            self.direction = Direction::Falling;
        } else if self.current == 0 {
            self.direction = Direction::Rising;
        }

        Some(delta)
    }
}
