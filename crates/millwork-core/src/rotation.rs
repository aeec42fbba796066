use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fixed::{Fixed64, fixed64_to_f64};
use crate::pos::Direction;

/// A rotation state: signed angular speed (radians per tick) around an axis.
///
/// The axis is a [`Direction`], not just an [`Axis`](crate::pos::Axis), so the
/// sign of `speed` follows the right-hand rule about that direction. The same
/// physical rotation can be expressed about the opposite direction with the
/// speed negated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rotation {
    pub axis: Direction,
    pub speed: Fixed64,
}

impl Rotation {
    pub fn new(axis: Direction, speed: Fixed64) -> Self {
        Self { axis, speed }
    }

    /// The same speed, re-expressed along `axis`.
    pub fn with_axis(self, axis: Direction) -> Self {
        Self { axis, ..self }
    }

    /// The same physical rotation described about the opposite direction.
    pub fn flipped(self) -> Self {
        Self {
            axis: self.axis.opposite(),
            speed: -self.speed,
        }
    }

    pub fn is_stationary(&self) -> bool {
        self.speed == Fixed64::ZERO
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rotation[axis={}, speed={}]",
            self.axis,
            fixed64_to_f64(self.speed)
        )
    }
}
