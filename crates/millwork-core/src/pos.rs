//! Grid coordinates and the six axis-aligned directions between cells.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Axis
// ---------------------------------------------------------------------------

/// One of the three grid axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// The two directions along this axis, negative first.
    pub fn directions(self) -> [Direction; 2] {
        match self {
            Axis::X => [Direction::West, Direction::East],
            Axis::Y => [Direction::Down, Direction::Up],
            Axis::Z => [Direction::North, Direction::South],
        }
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// An outgoing direction from a grid cell to one of its face neighbors.
///
/// The declaration order is the iteration order everywhere in the engine:
/// when several directions could qualify, the earliest one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    Down = 0,
    Up = 1,
    North = 2,
    South = 3,
    West = 4,
    East = 5,
}

impl Direction {
    /// All six directions, in iteration order.
    pub fn all() -> [Direction; 6] {
        [
            Direction::Down,
            Direction::Up,
            Direction::North,
            Direction::South,
            Direction::West,
            Direction::East,
        ]
    }

    /// The direction pointing the other way.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::East => Direction::West,
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Direction::Down | Direction::Up => Axis::Y,
            Direction::North | Direction::South => Axis::Z,
            Direction::West | Direction::East => Axis::X,
        }
    }

    /// Unit offset `(dx, dy, dz)`. North is -z, East is +x, Up is +y.
    pub fn offset(self) -> (i32, i32, i32) {
        match self {
            Direction::Down => (0, -1, 0),
            Direction::Up => (0, 1, 0),
            Direction::North => (0, 0, -1),
            Direction::South => (0, 0, 1),
            Direction::West => (-1, 0, 0),
            Direction::East => (1, 0, 0),
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::Down => "down",
            Direction::Up => "up",
            Direction::North => "north",
            Direction::South => "south",
            Direction::West => "west",
            Direction::East => "east",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// DirectionSet
// ---------------------------------------------------------------------------

/// A set of directions, stored as a six-bit mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectionSet(u8);

impl DirectionSet {
    pub const EMPTY: DirectionSet = DirectionSet(0);

    pub fn new() -> Self {
        Self::EMPTY
    }

    /// Both directions along an axis (a straight shaft).
    pub fn along(axis: Axis) -> Self {
        axis.directions().into_iter().collect()
    }

    pub fn all() -> Self {
        Direction::all().into_iter().collect()
    }

    pub fn contains(&self, direction: Direction) -> bool {
        self.0 & direction.bit() != 0
    }

    /// Insert a direction. Returns `true` if it was not already present.
    pub fn insert(&mut self, direction: Direction) -> bool {
        let added = !self.contains(direction);
        self.0 |= direction.bit();
        added
    }

    /// Remove a direction. Returns `true` if it was present.
    pub fn remove(&mut self, direction: Direction) -> bool {
        let present = self.contains(direction);
        self.0 &= !direction.bit();
        present
    }

    pub fn with(mut self, direction: Direction) -> Self {
        self.insert(direction);
        self
    }

    pub fn without(mut self, direction: Direction) -> Self {
        self.remove(direction);
        self
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate in [`Direction::all`] order.
    pub fn iter(&self) -> impl Iterator<Item = Direction> + '_ {
        let mask = self.0;
        Direction::all()
            .into_iter()
            .filter(move |d| mask & d.bit() != 0)
    }
}

impl FromIterator<Direction> for DirectionSet {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut set = DirectionSet::new();
        for direction in iter {
            set.insert(direction);
        }
        set
    }
}

impl<const N: usize> From<[Direction; N]> for DirectionSet {
    fn from(directions: [Direction; N]) -> Self {
        directions.into_iter().collect()
    }
}

impl fmt::Display for DirectionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, direction) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(direction.name())?;
        }
        f.write_str("]")
    }
}

// ---------------------------------------------------------------------------
// BlockPos
// ---------------------------------------------------------------------------

/// A cell of the 3D grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const ORIGIN: BlockPos = BlockPos { x: 0, y: 0, z: 0 };

    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The face neighbor in `direction`.
    pub fn offset(self, direction: Direction) -> Self {
        let (dx, dy, dz) = direction.offset();
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Manhattan distance to another position.
    pub fn manhattan_distance(&self, other: &BlockPos) -> u32 {
        (self.x - other.x).unsigned_abs()
            + (self.y - other.y).unsigned_abs()
            + (self.z - other.z).unsigned_abs()
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}
