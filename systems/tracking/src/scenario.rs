//! Hypothesis records and the move-sequence groups that own them.

use std::collections::BTreeMap;

use sonar_hunt_core::{CellIndex, CellSet, Direction};
use sonar_hunt_world::Grid;

/// One candidate trajectory of the opponent.
///
/// The visited set only ever grows. Pruning discards the whole record rather
/// than rewinding it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathScenario {
    start: CellIndex,
    position: CellIndex,
    visited: CellSet,
}

impl PathScenario {
    /// Creates a fresh hypothesis sitting on its start cell.
    #[must_use]
    pub fn new(start: CellIndex) -> Self {
        let mut visited = CellSet::new();
        let _ = visited.insert(start);
        Self {
            start,
            position: start,
            visited,
        }
    }

    /// Cell the trajectory started from.
    #[must_use]
    pub const fn start(&self) -> CellIndex {
        self.start
    }

    /// Cell the opponent occupies under this hypothesis.
    #[must_use]
    pub const fn position(&self) -> CellIndex {
        self.position
    }

    /// Cells the trajectory passed through, the current one included.
    #[must_use]
    pub fn visited(&self) -> &CellSet {
        &self.visited
    }

    /// Number of visited cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.visited.len()
    }

    /// Always `false`: a hypothesis holds at least its start cell.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }

    /// Steps one cell in `direction`. Returns `false`, leaving the record
    /// untouched, when the step leaves the grid, hits an island or re-enters a
    /// visited cell.
    pub fn advance(&mut self, grid: &Grid, direction: Direction) -> bool {
        let Some(next) = grid.neighbor(self.position, direction) else {
            return false;
        };
        if !grid.is_navigable(next) || !self.visited.insert(next) {
            return false;
        }
        self.position = next;
        true
    }
}

/// Hypotheses that underwent one particular move sequence, keyed by start.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveScenario {
    paths: BTreeMap<CellIndex, PathScenario>,
}

impl MoveScenario {
    /// One fresh hypothesis per start cell.
    #[must_use]
    pub fn seeded(starts: &[CellIndex]) -> Self {
        Self {
            paths: starts
                .iter()
                .map(|&start| (start, PathScenario::new(start)))
                .collect(),
        }
    }

    /// Number of live hypotheses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Reports whether every hypothesis was pruned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Hypothesis for the start cell, if it survived.
    #[must_use]
    pub fn get(&self, start: CellIndex) -> Option<&PathScenario> {
        self.paths.get(&start)
    }

    /// Start cells still represented, ascending.
    pub fn starts(&self) -> impl Iterator<Item = CellIndex> + '_ {
        self.paths.keys().copied()
    }

    /// Live hypotheses ordered by start cell.
    pub fn paths(&self) -> impl Iterator<Item = &PathScenario> + '_ {
        self.paths.values()
    }

    /// Advances every hypothesis one step, dropping those that cannot move.
    pub fn advance(&mut self, grid: &Grid, direction: Direction) {
        self.paths.retain(|_, path| path.advance(grid, direction));
    }

    /// Keeps only the hypotheses accepted by `keep`.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&PathScenario) -> bool,
    {
        self.paths.retain(|_, path| keep(path));
    }
}
