//! Breadth-first distance field over the navigable cells of a grid.

use std::collections::VecDeque;

use sonar_hunt_core::CellIndex;

use crate::Grid;

/// Dense water-distance grid seeded from one or more origin cells.
///
/// Distances are stored row-major and default to `u32::MAX` for cells that
/// are islands, blocked by the caller, or cut off from every origin.
#[derive(Clone, Debug, Default)]
pub struct DistanceField {
    distances: Vec<u32>,
    reachable: usize,
}

impl DistanceField {
    /// Runs a breadth-first search from `origins` across navigable cells for
    /// which `is_blocked` returns `false`. Blocked origins are skipped.
    pub fn build<F>(grid: &Grid, origins: &[CellIndex], mut is_blocked: F) -> Self
    where
        F: FnMut(CellIndex) -> bool,
    {
        let mut distances = vec![u32::MAX; grid.cells().len()];
        let mut reachable = 0;
        let mut queue = VecDeque::new();

        for &origin in origins {
            if !grid.is_navigable(origin) || is_blocked(origin) {
                continue;
            }
            if distances[origin.get()] == 0 {
                continue;
            }
            distances[origin.get()] = 0;
            reachable += 1;
            queue.push_back(origin);
        }

        while let Some(cell) = queue.pop_front() {
            let next_distance = distances[cell.get()] + 1;
            for (_, neighbor) in grid.navigable_neighbors(cell) {
                if distances[neighbor.get()] <= next_distance || is_blocked(neighbor) {
                    continue;
                }
                distances[neighbor.get()] = next_distance;
                reachable += 1;
                queue.push_back(neighbor);
            }
        }

        Self {
            distances,
            reachable,
        }
    }

    /// Steps from the nearest origin; `None` when unreachable or off-grid.
    #[must_use]
    pub fn distance(&self, cell: CellIndex) -> Option<u32> {
        self.distances
            .get(cell.get())
            .copied()
            .filter(|&distance| distance != u32::MAX)
    }

    /// Number of cells reached, origins included.
    #[must_use]
    pub fn reachable_count(&self) -> usize {
        self.reachable
    }

    /// Reached cells in index order.
    pub fn reachable_cells(&self) -> impl Iterator<Item = CellIndex> + '_ {
        self.distances
            .iter()
            .enumerate()
            .filter(|(_, &distance)| distance != u32::MAX)
            .map(|(index, _)| CellIndex::new(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonar_hunt_core::Coordinate;

    fn at(grid: &Grid, x: i32, y: i32) -> CellIndex {
        grid.index_of(Coordinate::new(x, y)).expect("in bounds")
    }

    #[test]
    fn origins_start_at_zero() {
        let grid = Grid::open(3, 4).expect("grid");
        let field = DistanceField::build(&grid, &[at(&grid, 1, 2)], |_| false);

        assert_eq!(field.distance(at(&grid, 1, 2)), Some(0));
        assert_eq!(field.distance(at(&grid, 1, 1)), Some(1));
        assert_eq!(field.distance(at(&grid, 1, 0)), Some(2));
        assert_eq!(field.distance(at(&grid, 0, 0)), Some(3));
        assert_eq!(field.reachable_count(), 12);
    }

    #[test]
    fn islands_and_blocked_cells_are_detoured() {
        let grid = Grid::from_rows(&["...", ".X.", "...", "..."]).expect("grid");
        let origin = at(&grid, 1, 2);
        let blocked = at(&grid, 0, 1);
        let field = DistanceField::build(&grid, &[origin], |cell| cell == blocked);

        assert_eq!(field.distance(at(&grid, 1, 1)), None);
        assert_eq!(field.distance(blocked), None);
        assert_eq!(field.distance(at(&grid, 1, 0)), Some(4));
        assert_eq!(field.distance(at(&grid, 0, 0)), Some(5));
        assert_eq!(field.reachable_count(), 10);
        assert_eq!(field.reachable_cells().count(), 10);
    }

    #[test]
    fn blocked_origins_reach_nothing() {
        let grid = Grid::from_rows(&[".X."]).expect("grid");
        let field = DistanceField::build(&grid, &[CellIndex::new(1)], |_| false);
        assert_eq!(field.reachable_count(), 0);
        assert_eq!(field.distance(CellIndex::new(0)), None);
    }
}
