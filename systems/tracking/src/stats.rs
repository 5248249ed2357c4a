//! Aggregate read model over the tracked hypotheses.

use std::collections::BTreeMap;

use sonar_hunt_core::{CellIndex, Coordinate, RegionId};
use sonar_hunt_world::Grid;

/// Snapshot of where the opponent may be.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PositionStats {
    /// Candidate cells mapped to the number of hypotheses ending there.
    pub cells: BTreeMap<CellIndex, usize>,
    /// Regions mapped to the number of distinct candidate cells inside them.
    pub regions: BTreeMap<RegionId, usize>,
    /// Live hypotheses across every move scenario.
    pub hypothesis_count: usize,
    /// Live move scenarios.
    pub scenario_count: usize,
    /// Start positions still represented by a hypothesis.
    pub start_position_count: usize,
    /// Cells mapped to the number of hypotheses that passed through them.
    pub visit_counts: BTreeMap<CellIndex, usize>,
}

impl PositionStats {
    /// Distinct candidate cells in index order.
    pub fn candidates(&self) -> impl Iterator<Item = CellIndex> + '_ {
        self.cells.keys().copied()
    }

    /// Number of distinct candidate cells.
    #[must_use]
    pub fn candidate_count(&self) -> usize {
        self.cells.len()
    }

    /// Region holding the most candidate cells, lowest identifier on ties.
    #[must_use]
    pub fn busiest_region(&self) -> Option<RegionId> {
        let mut best: Option<(RegionId, usize)> = None;
        for (&region, &count) in &self.regions {
            if best.map_or(true, |(_, top)| count > top) {
                best = Some((region, count));
            }
        }
        best.map(|(region, _)| region)
    }

    /// Best single-cell estimate of the opponent position.
    ///
    /// One candidate is returned as is. Two to four candidates packed inside
    /// a 3×3 box resolve to the centre of their bounding box when it is
    /// navigable. Anything else is too spread out to pin down.
    #[must_use]
    pub fn locate(&self, grid: &Grid) -> Option<CellIndex> {
        let mut candidates = self.candidates();
        match self.candidate_count() {
            1 => candidates.next(),
            2..=4 => {
                let coordinates: Vec<Coordinate> = candidates
                    .filter_map(|cell| grid.coordinate_of(cell))
                    .collect();
                let min_x = coordinates.iter().map(Coordinate::x).min()?;
                let max_x = coordinates.iter().map(Coordinate::x).max()?;
                let min_y = coordinates.iter().map(Coordinate::y).min()?;
                let max_y = coordinates.iter().map(Coordinate::y).max()?;
                if max_x - min_x > 2 || max_y - min_y > 2 {
                    return None;
                }
                let centre = Coordinate::new((min_x + max_x) / 2, (min_y + max_y) / 2);
                grid.index_of(centre).filter(|&cell| grid.is_navigable(cell))
            }
            _ => None,
        }
    }
}
