//! Square grid coordinates, tile sides and sub-edge labels.
//!
//! This module provides the foundational geometry for the tile grid:
//! - `Coord`: Identifies a cell on the unbounded board
//! - `Direction`: The four sides of a tile
//! - `EdgeLabel`: The twelve sub-edges (three per side) zones are declared on
//! - `Rotation`: Clockwise quarter turns applied to a placed tile
//!
//! Sub-edges keep a fixed orientation: "left"/"right" sit on the west/east end
//! of a horizontal side, "top"/"bottom" on the north/south end of a vertical one.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Side of a square tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All sides in clockwise order starting from North
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Grid offset (dx, dy) of the neighbor on this side. North is `y - 1`.
    pub const fn offset(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    pub const fn opposite(&self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// The plain (middle) sub-edge of this side
    pub const fn label(&self) -> EdgeLabel {
        match self {
            Direction::North => EdgeLabel::North,
            Direction::East => EdgeLabel::East,
            Direction::South => EdgeLabel::South,
            Direction::West => EdgeLabel::West,
        }
    }

    /// The three sub-edges of this side, west-to-east or north-to-south
    pub const fn sub_edges(&self) -> [EdgeLabel; 3] {
        match self {
            Direction::North => [EdgeLabel::NorthLeft, EdgeLabel::North, EdgeLabel::NorthRight],
            Direction::East => [EdgeLabel::EastTop, EdgeLabel::East, EdgeLabel::EastBottom],
            Direction::South => [EdgeLabel::SouthLeft, EdgeLabel::South, EdgeLabel::SouthRight],
            Direction::West => [EdgeLabel::WestTop, EdgeLabel::West, EdgeLabel::WestBottom],
        }
    }
}

/// One of the twelve positions along the border of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeLabel {
    NorthLeft,
    North,
    NorthRight,
    EastTop,
    East,
    EastBottom,
    SouthLeft,
    South,
    SouthRight,
    WestTop,
    West,
    WestBottom,
}

impl EdgeLabel {
    pub const ALL: [EdgeLabel; 12] = [
        EdgeLabel::NorthLeft,
        EdgeLabel::North,
        EdgeLabel::NorthRight,
        EdgeLabel::EastTop,
        EdgeLabel::East,
        EdgeLabel::EastBottom,
        EdgeLabel::SouthLeft,
        EdgeLabel::South,
        EdgeLabel::SouthRight,
        EdgeLabel::WestTop,
        EdgeLabel::West,
        EdgeLabel::WestBottom,
    ];

    /// The side this sub-edge lies on
    pub const fn side(&self) -> Direction {
        match self {
            EdgeLabel::NorthLeft | EdgeLabel::North | EdgeLabel::NorthRight => Direction::North,
            EdgeLabel::EastTop | EdgeLabel::East | EdgeLabel::EastBottom => Direction::East,
            EdgeLabel::SouthLeft | EdgeLabel::South | EdgeLabel::SouthRight => Direction::South,
            EdgeLabel::WestTop | EdgeLabel::West | EdgeLabel::WestBottom => Direction::West,
        }
    }

    /// The label after a single 90 degree clockwise turn of the tile
    pub const fn rotate_clockwise(&self) -> EdgeLabel {
        match self {
            EdgeLabel::North => EdgeLabel::East,
            EdgeLabel::NorthLeft => EdgeLabel::EastTop,
            EdgeLabel::NorthRight => EdgeLabel::EastBottom,
            EdgeLabel::East => EdgeLabel::South,
            EdgeLabel::EastTop => EdgeLabel::SouthRight,
            EdgeLabel::EastBottom => EdgeLabel::SouthLeft,
            EdgeLabel::South => EdgeLabel::West,
            EdgeLabel::SouthLeft => EdgeLabel::WestTop,
            EdgeLabel::SouthRight => EdgeLabel::WestBottom,
            EdgeLabel::West => EdgeLabel::North,
            EdgeLabel::WestTop => EdgeLabel::NorthRight,
            EdgeLabel::WestBottom => EdgeLabel::NorthLeft,
        }
    }

    /// The label after turning the tile by `rotation`
    pub fn rotated(&self, rotation: Rotation) -> EdgeLabel {
        (0..rotation.quarter_turns()).fold(*self, |label, _| label.rotate_clockwise())
    }

    /// The sub-edge it touches on the neighboring tile across the shared side.
    ///
    /// The sub-position is preserved: `north-left` faces `south-left`.
    pub const fn opposite(&self) -> EdgeLabel {
        match self {
            EdgeLabel::North => EdgeLabel::South,
            EdgeLabel::NorthLeft => EdgeLabel::SouthLeft,
            EdgeLabel::NorthRight => EdgeLabel::SouthRight,
            EdgeLabel::East => EdgeLabel::West,
            EdgeLabel::EastTop => EdgeLabel::WestTop,
            EdgeLabel::EastBottom => EdgeLabel::WestBottom,
            EdgeLabel::South => EdgeLabel::North,
            EdgeLabel::SouthLeft => EdgeLabel::NorthLeft,
            EdgeLabel::SouthRight => EdgeLabel::NorthRight,
            EdgeLabel::West => EdgeLabel::East,
            EdgeLabel::WestTop => EdgeLabel::EastTop,
            EdgeLabel::WestBottom => EdgeLabel::EastBottom,
        }
    }
}

/// Raised when a rotation outside 0/90/180/270 is decoded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid rotation {0}, expected 0, 90, 180 or 270")]
pub struct InvalidRotation(pub u16);

/// Clockwise rotation of a tile, in degrees on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [Rotation::R0, Rotation::R90, Rotation::R180, Rotation::R270];

    pub const fn degrees(&self) -> u16 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 90,
            Rotation::R180 => 180,
            Rotation::R270 => 270,
        }
    }

    pub const fn quarter_turns(&self) -> u8 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 1,
            Rotation::R180 => 2,
            Rotation::R270 => 3,
        }
    }

    pub const fn from_quarter_turns(turns: u8) -> Rotation {
        match turns % 4 {
            0 => Rotation::R0,
            1 => Rotation::R90,
            2 => Rotation::R180,
            _ => Rotation::R270,
        }
    }

    /// The next rotation, a further 90 degrees clockwise
    pub const fn clockwise(&self) -> Rotation {
        Rotation::from_quarter_turns(self.quarter_turns() + 1)
    }

    /// The rotation that undoes this one
    pub const fn inverse(&self) -> Rotation {
        Rotation::from_quarter_turns(4 - self.quarter_turns())
    }
}

impl TryFrom<u16> for Rotation {
    type Error = InvalidRotation;

    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Rotation::R0),
            90 => Ok(Rotation::R90),
            180 => Ok(Rotation::R180),
            270 => Ok(Rotation::R270),
            other => Err(InvalidRotation(other)),
        }
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

/// Cell on the board grid.
///
/// `x` grows eastward and `y` grows southward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The adjacent cell across the given side, if it is on the grid
    pub const fn step(&self, direction: Direction) -> Option<Coord> {
        let (dx, dy) = direction.offset();
        self.offset(dx, dy)
    }

    const fn offset(&self, dx: i32, dy: i32) -> Option<Coord> {
        match (self.x.checked_add(dx), self.y.checked_add(dy)) {
            (Some(x), Some(y)) => Some(Coord::new(x, y)),
            _ => None,
        }
    }

    /// The orthogonal neighbors on the grid, clockwise from North
    pub fn neighbors(&self) -> Vec<(Direction, Coord)> {
        Direction::ALL
            .iter()
            .filter_map(|direction| self.step(*direction).map(|c| (*direction, c)))
            .collect()
    }

    /// The cells at Chebyshev distance one; fewer than eight at the grid rim
    pub fn surrounding(&self) -> Vec<Coord> {
        [
            (-1, -1),
            (0, -1),
            (1, -1),
            (1, 0),
            (1, 1),
            (0, 1),
            (-1, 1),
            (-1, 0),
        ]
        .iter()
        .filter_map(|(dx, dy)| self.offset(*dx, *dy))
        .collect()
    }
}

/// Side length of the meeple anchor grid on a tile
pub const ANCHOR_GRID: u8 = 5;

/// Rotate a meeple anchor (1..=25, row-major on a 5x5 grid) clockwise.
///
/// Values outside the grid are returned unchanged.
pub fn rotate_position(position: u8, rotation: Rotation) -> u8 {
    let cells = ANCHOR_GRID * ANCHOR_GRID;
    if position == 0 || position > cells {
        return position;
    }

    let mut row = (position - 1) / ANCHOR_GRID;
    let mut col = (position - 1) % ANCHOR_GRID;
    for _ in 0..rotation.quarter_turns() {
        let next_row = col;
        col = ANCHOR_GRID - 1 - row;
        row = next_row;
    }
    row * ANCHOR_GRID + col + 1
}
