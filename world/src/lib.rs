#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Immutable grid model shared by the search and tracking systems.
//!
//! The grid is parsed once from the startup map and never mutated afterwards.
//! Adjacency is derived from coordinates on demand; only the cells, their
//! regions and the list of navigable cells are stored.

use sonar_hunt_core::{CellIndex, Coordinate, Direction, RegionId, Terrain};
use thiserror::Error;

mod navigation;

pub use navigation::DistanceField;

/// Side length of the square regions the grid is partitioned into.
pub const REGION_SIZE: u32 = 5;

/// Fatal problems detected while parsing the startup map.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// Either dimension is zero or the cell count does not fit in memory.
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested column count.
        width: u32,
        /// Requested row count.
        height: u32,
    },
    /// The terrain description does not hold one symbol per cell.
    #[error("expected {expected} terrain symbols, found {actual}")]
    TerrainLength {
        /// Symbols required by the dimensions.
        expected: usize,
        /// Symbols present in the input.
        actual: usize,
    },
    /// A terrain row is shorter or longer than the first one.
    #[error("row {row} holds {actual} symbols, expected {expected}")]
    RaggedRows {
        /// Zero-based row number.
        row: usize,
        /// Width established by the first row.
        expected: usize,
        /// Width of the offending row.
        actual: usize,
    },
    /// A symbol other than `.` or `X` was found.
    #[error("unknown terrain symbol {symbol:?} at cell {position}")]
    UnknownTerrain {
        /// Offending symbol.
        symbol: char,
        /// Row-major position of the symbol.
        position: usize,
    },
}

/// Immutable cell of the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    index: CellIndex,
    coordinate: Coordinate,
    terrain: Terrain,
    region: RegionId,
}

impl Cell {
    /// Row-major position identifying the cell.
    #[must_use]
    pub const fn index(&self) -> CellIndex {
        self.index
    }

    /// Location of the cell.
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    /// Terrain occupying the cell.
    #[must_use]
    pub const fn terrain(&self) -> Terrain {
        self.terrain
    }

    /// Region the cell belongs to.
    #[must_use]
    pub const fn region(&self) -> RegionId {
        self.region
    }

    /// Reports whether submarines may occupy the cell.
    #[must_use]
    pub fn is_navigable(&self) -> bool {
        self.terrain == Terrain::Navigable
    }

    /// Number of cardinal steps to another cell on an open grid.
    #[must_use]
    pub fn manhattan_distance(&self, other: &Cell) -> u32 {
        self.coordinate.manhattan_distance(other.coordinate)
    }

    /// Largest per-axis distance to another cell.
    #[must_use]
    pub fn chebyshev_distance(&self, other: &Cell) -> u32 {
        self.coordinate.chebyshev_distance(other.coordinate)
    }
}

/// Fixed square block of cells sharing one region identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    id: RegionId,
    cells: Vec<CellIndex>,
}

impl Region {
    /// Identifier of the region.
    #[must_use]
    pub const fn id(&self) -> RegionId {
        self.id
    }

    /// Every cell of the region, navigable or not, in index order.
    #[must_use]
    pub fn cells(&self) -> &[CellIndex] {
        &self.cells
    }
}

/// Immutable navigable map built once from the startup input.
#[derive(Clone, Debug)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
    regions: Vec<Region>,
    navigable: Vec<CellIndex>,
}

impl Grid {
    /// Parses a row-major terrain description. Whitespace is ignored so the
    /// startup rows may be passed joined by newlines.
    pub fn build(width: u32, height: u32, terrain: &str) -> Result<Self, GridError> {
        let invalid = GridError::InvalidDimensions { width, height };
        if width == 0 || height == 0 || i32::try_from(width).is_err() || i32::try_from(height).is_err()
        {
            return Err(invalid);
        }
        let columns = usize::try_from(width).map_err(|_| invalid.clone())?;
        let expected = usize::try_from(u64::from(width) * u64::from(height)).map_err(|_| invalid)?;

        let symbols: Vec<char> = terrain.chars().filter(|c| !c.is_whitespace()).collect();
        if symbols.len() != expected {
            return Err(GridError::TerrainLength {
                expected,
                actual: symbols.len(),
            });
        }

        let regions_per_row = width.div_ceil(REGION_SIZE);
        let region_count = regions_per_row * height.div_ceil(REGION_SIZE);
        let mut regions: Vec<Region> = (1..=region_count)
            .map(|id| Region {
                id: RegionId::new(id),
                cells: Vec::new(),
            })
            .collect();

        let mut cells = Vec::with_capacity(expected);
        let mut navigable = Vec::new();
        for (position, symbol) in symbols.into_iter().enumerate() {
            let terrain =
                Terrain::from_symbol(symbol).ok_or(GridError::UnknownTerrain { symbol, position })?;
            let (Ok(x), Ok(y)) = (
                i32::try_from(position % columns),
                i32::try_from(position / columns),
            ) else {
                return Err(GridError::InvalidDimensions { width, height });
            };
            let (column, row) = (x.unsigned_abs(), y.unsigned_abs());
            let region = RegionId::new(
                column / REGION_SIZE + (row / REGION_SIZE) * regions_per_row + 1,
            );
            let index = CellIndex::new(position);
            if terrain == Terrain::Navigable {
                navigable.push(index);
            }
            regions[(region.get() - 1) as usize].cells.push(index);
            cells.push(Cell {
                index,
                coordinate: Coordinate::new(x, y),
                terrain,
                region,
            });
        }

        Ok(Self {
            width,
            height,
            cells,
            regions,
            navigable,
        })
    }

    /// Parses one string per row, rejecting rows of unequal length.
    pub fn from_rows<S>(rows: &[S]) -> Result<Self, GridError>
    where
        S: AsRef<str>,
    {
        let expected = rows.first().map_or(0, |row| row.as_ref().trim().chars().count());
        for (row, line) in rows.iter().enumerate() {
            let actual = line.as_ref().trim().chars().count();
            if actual != expected {
                return Err(GridError::RaggedRows {
                    row,
                    expected,
                    actual,
                });
            }
        }
        let width = u32::try_from(expected).unwrap_or(0);
        let height = u32::try_from(rows.len()).unwrap_or(0);
        let terrain: String = rows.iter().map(|row| row.as_ref().trim()).collect();
        Self::build(width, height, &terrain)
    }

    /// Builds a grid without islands.
    pub fn open(width: u32, height: u32) -> Result<Self, GridError> {
        let count = usize::try_from(u64::from(width) * u64::from(height))
            .map_err(|_| GridError::InvalidDimensions { width, height })?;
        Self::build(width, height, &".".repeat(count))
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Every cell in index order.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cell stored at the index, if it lies within the grid.
    #[must_use]
    pub fn cell(&self, index: CellIndex) -> Option<&Cell> {
        self.cells.get(index.get())
    }

    /// Index of the cell at the coordinate; `None` when off-grid.
    #[must_use]
    pub fn index_of(&self, coordinate: Coordinate) -> Option<CellIndex> {
        let column = u32::try_from(coordinate.x()).ok()?;
        let row = u32::try_from(coordinate.y()).ok()?;
        if column >= self.width || row >= self.height {
            return None;
        }
        Some(CellIndex::new(row as usize * self.width as usize + column as usize))
    }

    /// Coordinate of the cell at the index; `None` when off-grid.
    #[must_use]
    pub fn coordinate_of(&self, index: CellIndex) -> Option<Coordinate> {
        self.cell(index).map(Cell::coordinate)
    }

    /// Cell at the coordinate; `None` when off-grid.
    #[must_use]
    pub fn cell_at(&self, coordinate: Coordinate) -> Option<&Cell> {
        self.index_of(coordinate).and_then(|index| self.cell(index))
    }

    /// Reports whether the index names an in-bounds navigable cell.
    #[must_use]
    pub fn is_navigable(&self, index: CellIndex) -> bool {
        self.cell(index).is_some_and(Cell::is_navigable)
    }

    /// Every navigable cell in index order.
    #[must_use]
    pub fn navigable_cells(&self) -> &[CellIndex] {
        &self.navigable
    }

    /// Every region in identifier order.
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Region with the identifier, if it exists.
    #[must_use]
    pub fn region(&self, id: RegionId) -> Option<&Region> {
        let offset = id.get().checked_sub(1)?;
        self.regions.get(offset as usize)
    }

    /// Region containing the cell.
    #[must_use]
    pub fn region_of(&self, index: CellIndex) -> Option<RegionId> {
        self.cell(index).map(Cell::region)
    }

    /// Navigable cells of the region in index order; empty for unknown ids.
    #[must_use]
    pub fn navigable_cells_of_region(&self, id: RegionId) -> Vec<CellIndex> {
        self.region(id)
            .map(|region| {
                region
                    .cells
                    .iter()
                    .copied()
                    .filter(|&cell| self.is_navigable(cell))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Central coordinate of the region, clamped into the grid for partial
    /// regions along the right and bottom edges.
    #[must_use]
    pub fn region_center(&self, id: RegionId) -> Option<Coordinate> {
        let region = self.region(id)?;
        let offset = region.id.get() - 1;
        let regions_per_row = self.width.div_ceil(REGION_SIZE);
        let half = REGION_SIZE / 2;
        let x = (offset % regions_per_row * REGION_SIZE + half).min(self.width - 1);
        let y = (offset / regions_per_row * REGION_SIZE + half).min(self.height - 1);
        Some(Coordinate::new(x as i32, y as i32))
    }

    /// Central coordinate of the grid, rounding down.
    #[must_use]
    pub const fn middle(&self) -> Coordinate {
        Coordinate::new((self.width / 2) as i32, (self.height / 2) as i32)
    }

    /// Cell one step away in the direction, if it lies within the grid.
    #[must_use]
    pub fn neighbor(&self, index: CellIndex, direction: Direction) -> Option<CellIndex> {
        let coordinate = self.coordinate_of(index)?;
        self.index_of(coordinate.sum(direction.unit()))
    }

    /// Cardinal neighbours of the cell that are navigable, in protocol order.
    pub fn navigable_neighbors(
        &self,
        index: CellIndex,
    ) -> impl Iterator<Item = (Direction, CellIndex)> + '_ {
        Direction::ALL.into_iter().filter_map(move |direction| {
            self.neighbor(index, direction)
                .filter(|&next| self.is_navigable(next))
                .map(|next| (direction, next))
        })
    }

    /// Manhattan distance between two cells; `None` when either is off-grid.
    #[must_use]
    pub fn manhattan_distance(&self, a: CellIndex, b: CellIndex) -> Option<u32> {
        Some(self.cell(a)?.manhattan_distance(self.cell(b)?))
    }

    /// Chebyshev distance between two cells; `None` when either is off-grid.
    #[must_use]
    pub fn chebyshev_distance(&self, a: CellIndex, b: CellIndex) -> Option<u32> {
        Some(self.cell(a)?.chebyshev_distance(self.cell(b)?))
    }
}

/// Pure area queries over a grid.
pub mod query {
    use sonar_hunt_core::{CellIndex, Coordinate};

    use super::Grid;

    /// Manhattan radius reached by a torpedo.
    pub const TORPEDO_RANGE: u32 = 4;

    /// Chebyshev radius damaged by an explosion.
    pub const BLAST_RADIUS: u32 = 1;

    /// Navigable cells a torpedo fired around `center` can reach by distance,
    /// in index order.
    #[must_use]
    pub fn torpedo_area(grid: &Grid, center: Coordinate) -> Vec<CellIndex> {
        navigable_within(grid, center, TORPEDO_RANGE, |coordinate| {
            coordinate.manhattan_distance(center) <= TORPEDO_RANGE
        })
    }

    /// Navigable cells damaged by an explosion at `center`, in index order.
    #[must_use]
    pub fn danger_area(grid: &Grid, center: Coordinate) -> Vec<CellIndex> {
        navigable_within(grid, center, BLAST_RADIUS, |coordinate| {
            coordinate.chebyshev_distance(center) <= BLAST_RADIUS
        })
    }

    /// Torpedo area of `center` without its danger area, in index order.
    #[must_use]
    pub fn torpedo_area_excluding_danger_area(grid: &Grid, center: Coordinate) -> Vec<CellIndex> {
        navigable_within(grid, center, TORPEDO_RANGE, |coordinate| {
            coordinate.manhattan_distance(center) <= TORPEDO_RANGE
                && coordinate.chebyshev_distance(center) > BLAST_RADIUS
        })
    }

    fn navigable_within<F>(grid: &Grid, center: Coordinate, radius: u32, keep: F) -> Vec<CellIndex>
    where
        F: Fn(Coordinate) -> bool,
    {
        // Scan window clamped to the grid so far-off centres stay in range.
        let radius = i64::from(radius);
        let min_x = (i64::from(center.x()) - radius).max(0);
        let max_x = (i64::from(center.x()) + radius).min(i64::from(grid.width()) - 1);
        let min_y = (i64::from(center.y()) - radius).max(0);
        let max_y = (i64::from(center.y()) + radius).min(i64::from(grid.height()) - 1);

        let mut area = Vec::new();
        for y in (min_y..=max_y).filter_map(|y| i32::try_from(y).ok()) {
            for x in (min_x..=max_x).filter_map(|x| i32::try_from(x).ok()) {
                let coordinate = Coordinate::new(x, y);
                if !keep(coordinate) {
                    continue;
                }
                if let Some(index) = grid.index_of(coordinate) {
                    if grid.is_navigable(index) {
                        area.push(index);
                    }
                }
            }
        }
        area
    }
}
