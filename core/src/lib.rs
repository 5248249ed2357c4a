#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Sonar Hunt engine.
//!
//! This crate defines the value types that connect the immutable grid, the
//! search and tracking systems, and the adapters that speak the turn protocol.
//! The grid is built once from the startup map, systems are constructed
//! against it, and every turn the adapters feed parsed [`Order`] values and
//! feedback signals into the systems before querying their read-only state.

use std::fmt;

use serde::{Deserialize, Serialize};

mod cell_set;
mod config;
mod diagnostics;
mod orders;

pub use cell_set::CellSet;
pub use config::{EngineConfig, SearchConfig, TrackingConfig};
pub use diagnostics::{
    Diagnostic, DiagnosticSink, FilterKind, NullSink, ReseedCause, SearchKind, TracingSink,
};
pub use orders::{parse_orders, Order, SonarResult};

/// Life every submarine starts the game with.
pub const INITIAL_LIFE: u32 = 6;

/// Integer point on the grid, or an offset between two such points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    x: i32,
    y: i32,
}

impl Coordinate {
    /// Creates a new coordinate from column and row components.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column component, growing eastwards.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row component, growing southwards.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Component-wise sum of two coordinates.
    #[must_use]
    pub const fn sum(self, other: Coordinate) -> Self {
        Self {
            x: self.x.saturating_add(other.x),
            y: self.y.saturating_add(other.y),
        }
    }

    /// Length of the coordinate read as an offset, measured along the axes.
    #[must_use]
    pub const fn manhattan_length(self) -> u32 {
        self.x.unsigned_abs().saturating_add(self.y.unsigned_abs())
    }

    /// Number of cardinal steps separating two coordinates on an open grid.
    #[must_use]
    pub fn manhattan_distance(self, other: Coordinate) -> u32 {
        self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y))
    }

    /// Largest per-axis difference between two coordinates.
    #[must_use]
    pub fn chebyshev_distance(self, other: Coordinate) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

/// Cardinal movement directions available to submarines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// Every direction in protocol order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Offset of a single step in this direction.
    #[must_use]
    pub const fn unit(self) -> Coordinate {
        match self {
            Self::North => Coordinate::new(0, -1),
            Self::East => Coordinate::new(1, 0),
            Self::South => Coordinate::new(0, 1),
            Self::West => Coordinate::new(-1, 0),
        }
    }

    /// Single-letter symbol used by the turn protocol.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::North => 'N',
            Self::East => 'E',
            Self::South => 'S',
            Self::West => 'W',
        }
    }

    /// Parses a protocol symbol such as `N`.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "N" => Some(Self::North),
            "E" => Some(Self::East),
            "S" => Some(Self::South),
            "W" => Some(Self::West),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Row-major position of a cell inside the grid. Cells are identified by it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellIndex(usize);

impl CellIndex {
    /// Wraps a row-major cell position.
    #[must_use]
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    /// Retrieves the row-major position.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }
}

/// One-based identifier of a 5×5 region, numbered row-major.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(u32);

impl RegionId {
    /// Creates a region identifier with the provided one-based value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the one-based numeric value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of terrain occupying a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    /// Open water that submarines may travel through.
    Navigable,
    /// Island that blocks movement.
    Blocked,
}

impl Terrain {
    /// Parses a startup map symbol: `.` for water, `X` for island.
    #[must_use]
    pub const fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '.' => Some(Self::Navigable),
            'X' => Some(Self::Blocked),
            _ => None,
        }
    }

    /// Startup map symbol of the terrain.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Navigable => '.',
            Self::Blocked => 'X',
        }
    }
}

/// Single element of a planned path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathStep {
    /// Cell occupied at this point of the path.
    pub cell: CellIndex,
    /// Direction taken when leaving the cell; `None` on the final step.
    pub direction: Option<Direction>,
}

/// Life bookkeeping shared by both submarines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    life: u32,
    last_life_lost: u32,
}

impl AgentState {
    /// Creates a state with the provided life and no recorded loss.
    #[must_use]
    pub const fn new(life: u32) -> Self {
        Self {
            life,
            last_life_lost: 0,
        }
    }

    /// Remaining life.
    #[must_use]
    pub const fn life(&self) -> u32 {
        self.life
    }

    /// Life lost between the two most recent readings.
    #[must_use]
    pub const fn last_life_lost(&self) -> u32 {
        self.last_life_lost
    }

    /// Records a fresh life reading and derives the loss since the previous one.
    pub fn record_life(&mut self, life: u32) {
        self.last_life_lost = self.life.saturating_sub(life);
        self.life = life;
    }
}

impl Default for AgentState {
    fn default() -> Self {
        Self::new(INITIAL_LIFE)
    }
}
