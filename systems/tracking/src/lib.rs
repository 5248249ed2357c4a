#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Multi-hypothesis tracking of the hidden opponent submarine.
//!
//! The engine never observes the opponent directly. It keeps every
//! (start cell, trajectory) pair consistent with the order classes the
//! opponent announced and with the feedback we received, so the set of cells
//! the opponent may occupy can be read off after each turn.

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use sonar_hunt_core::{
    CellIndex, Coordinate, Diagnostic, DiagnosticSink, Direction, FilterKind, NullSink, Order,
    RegionId, ReseedCause, SonarResult, TrackingConfig,
};
use sonar_hunt_world::{query, Grid};

mod scenario;
mod stats;

pub use scenario::{MoveScenario, PathScenario};
pub use stats::PositionStats;

/// Maximum number of unobserved steps a silence may cover.
pub const SILENCE_RANGE: usize = 4;

/// Hypothesis tracker for one opponent.
#[derive(Debug)]
pub struct TrackingEngine<S = NullSink> {
    grid: Arc<Grid>,
    config: TrackingConfig,
    start_positions: Vec<CellIndex>,
    scenarios: Vec<MoveScenario>,
    sink: S,
}

impl TrackingEngine<NullSink> {
    /// Creates an engine seeded with every navigable cell.
    #[must_use]
    pub fn new(grid: Arc<Grid>, config: TrackingConfig) -> Self {
        Self::with_sink(grid, config, NullSink)
    }
}

impl<S> TrackingEngine<S>
where
    S: DiagnosticSink,
{
    /// Creates an engine seeded with every navigable cell, reporting to the
    /// provided sink.
    #[must_use]
    pub fn with_sink(grid: Arc<Grid>, config: TrackingConfig, sink: S) -> Self {
        let start_positions = grid.navigable_cells().to_vec();
        let scenarios = vec![MoveScenario::seeded(&start_positions)];
        Self {
            grid,
            config,
            start_positions,
            scenarios,
            sink,
        }
    }

    /// Grid the opponent moves on.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Active tracking bounds.
    #[must_use]
    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// Start cells still represented by at least one hypothesis, ascending.
    #[must_use]
    pub fn start_positions(&self) -> &[CellIndex] {
        &self.start_positions
    }

    /// Live move scenarios.
    #[must_use]
    pub fn scenarios(&self) -> &[MoveScenario] {
        &self.scenarios
    }

    /// Number of live move scenarios.
    #[must_use]
    pub fn scenario_count(&self) -> usize {
        self.scenarios.len()
    }

    /// Number of live hypotheses across every scenario.
    #[must_use]
    pub fn hypothesis_count(&self) -> usize {
        self.scenarios.iter().map(MoveScenario::len).sum()
    }

    /// Folds one turn of announced opponent orders into the hypothesis set.
    ///
    /// `opponent_life_lost` is the life the opponent lost since the previous
    /// turn; it decides how much of a torpedo's range is still plausible.
    /// When earlier evidence emptied the set, the engine first reseeds from
    /// every navigable cell if configured to.
    pub fn apply_orders(&mut self, orders: &[Order], opponent_life_lost: u32) {
        if self.scenarios.is_empty() && self.config.reseed_when_exhausted {
            let everywhere = self.grid.navigable_cells().to_vec();
            self.reseed_from(everywhere, ReseedCause::Exhausted);
        }

        for order in orders {
            match *order {
                Order::Move { direction } => self.apply_move(direction),
                Order::Silence => self.apply_silence(),
                Order::Torpedo { target } => self.apply_torpedo(target, opponent_life_lost),
                Order::Surface { region } => self.apply_surface(region),
                Order::Sonar { .. } | Order::Mine | Order::Trigger { .. } => {}
            }
            self.bound_hypotheses();
        }

        let candidates = self.possible_positions().len();
        self.sink.record(&Diagnostic::OrdersApplied {
            orders: orders.len(),
            scenarios: self.scenarios.len(),
            hypotheses: self.hypothesis_count(),
            candidates,
        });
    }

    /// Keeps only hypotheses whose current cell is listed.
    pub fn restrict_to_cells(&mut self, cells: &[CellIndex]) {
        let allowed: BTreeSet<CellIndex> = cells.iter().copied().collect();
        self.filter(FilterKind::RestrictCells, |path| {
            allowed.contains(&path.position())
        });
    }

    /// Drops hypotheses whose current cell is listed.
    pub fn exclude_cells(&mut self, cells: &[CellIndex]) {
        let banned: BTreeSet<CellIndex> = cells.iter().copied().collect();
        self.filter(FilterKind::ExcludeCells, |path| {
            !banned.contains(&path.position())
        });
    }

    /// Keeps only hypotheses inside the region.
    ///
    /// With no scenario left, or more than the configured reseed threshold,
    /// the set is rebuilt from the navigable cells of the region instead.
    pub fn restrict_to_region(&mut self, region: RegionId) {
        let count = self.scenarios.len();
        if count == 0 || count > self.config.region_reseed_threshold {
            let cells = self.grid.navigable_cells_of_region(region);
            self.reseed_from(cells, ReseedCause::RegionReseed);
            return;
        }
        let grid = Arc::clone(&self.grid);
        self.filter(FilterKind::RestrictRegion, |path| {
            grid.region_of(path.position()) == Some(region)
        });
    }

    /// Drops hypotheses inside the region.
    ///
    /// With no scenario left the set is rebuilt from every navigable cell
    /// outside the region.
    pub fn exclude_region(&mut self, region: RegionId) {
        let grid = Arc::clone(&self.grid);
        if self.scenarios.is_empty() {
            let cells: Vec<CellIndex> = grid
                .navigable_cells()
                .iter()
                .copied()
                .filter(|&cell| grid.region_of(cell) != Some(region))
                .collect();
            self.reseed_from(cells, ReseedCause::RegionReseed);
            return;
        }
        self.filter(FilterKind::ExcludeRegion, |path| {
            grid.region_of(path.position()) != Some(region)
        });
    }

    /// Applies the answer to our own sonar probe of `region`.
    pub fn apply_sonar_result(&mut self, region: RegionId, result: SonarResult) {
        match result {
            SonarResult::Found => self.restrict_to_region(region),
            SonarResult::Missed => self.exclude_region(region),
            SonarResult::Unavailable => {}
        }
    }

    /// Applies what the opponent's life loss reveals after our torpedo or
    /// mine exploded at `target`.
    ///
    /// A miss clears the blast area, a one-point hit places the opponent next
    /// to the target, and a two-point hit places it on the target. Other
    /// losses carry no usable constraint.
    pub fn apply_attack_outcome(&mut self, target: Coordinate, opponent_life_lost: u32) {
        let blast = query::danger_area(&self.grid, target);
        let centre = self.grid.index_of(target);
        match opponent_life_lost {
            0 => self.exclude_cells(&blast),
            1 => {
                let ring: Vec<CellIndex> = blast
                    .into_iter()
                    .filter(|&cell| Some(cell) != centre)
                    .collect();
                self.restrict_to_cells(&ring);
            }
            2 => {
                let direct: Vec<CellIndex> = centre.into_iter().collect();
                self.restrict_to_cells(&direct);
            }
            _ => {}
        }
    }

    /// Forgets all evidence and starts over from every navigable cell.
    pub fn reseed(&mut self) {
        let everywhere = self.grid.navigable_cells().to_vec();
        self.reseed_from(everywhere, ReseedCause::Requested);
    }

    /// Distinct cells the opponent may currently occupy, ascending.
    #[must_use]
    pub fn possible_positions(&self) -> Vec<CellIndex> {
        self.scenarios
            .iter()
            .flat_map(MoveScenario::paths)
            .map(PathScenario::position)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Aggregates the hypothesis set. Pure: repeated calls without an
    /// intervening mutation return equal results.
    #[must_use]
    pub fn position_stats(&self) -> PositionStats {
        let mut stats = PositionStats {
            scenario_count: self.scenarios.len(),
            start_position_count: self.start_positions.len(),
            ..PositionStats::default()
        };
        for path in self.scenarios.iter().flat_map(MoveScenario::paths) {
            stats.hypothesis_count += 1;
            *stats.cells.entry(path.position()).or_default() += 1;
            for cell in path.visited().iter() {
                *stats.visit_counts.entry(cell).or_default() += 1;
            }
        }
        for &cell in stats.cells.keys() {
            if let Some(region) = self.grid.region_of(cell) {
                *stats.regions.entry(region).or_default() += 1;
            }
        }
        stats
    }

    fn apply_move(&mut self, direction: Direction) {
        let grid = Arc::clone(&self.grid);
        let before = self.hypothesis_count();
        for scenario in &mut self.scenarios {
            scenario.advance(&grid, direction);
        }
        self.refresh();
        self.report_filter(FilterKind::Move, before);
    }

    fn apply_silence(&mut self) {
        let before = self.hypothesis_count();
        self.deduplicate();
        let fan_out = 1 + 4 * SILENCE_RANGE;
        if self.hypothesis_count().saturating_mul(fan_out)
            > self.config.hypothesis_collapse_threshold
        {
            self.collapse();
        }

        let grid = Arc::clone(&self.grid);
        let parents = std::mem::take(&mut self.scenarios);
        let mut expanded = Vec::with_capacity(parents.len() * (1 + 4 * SILENCE_RANGE));
        for parent in parents {
            let mut children = Vec::new();
            for direction in Direction::ALL {
                let mut branch = parent.clone();
                for _ in 0..SILENCE_RANGE {
                    branch.advance(&grid, direction);
                    if branch.is_empty() {
                        break;
                    }
                    children.push(branch.clone());
                }
            }
            expanded.push(parent);
            expanded.append(&mut children);
        }
        self.scenarios = expanded;
        self.refresh();
        self.report_filter(FilterKind::Silence, before);
    }

    fn apply_torpedo(&mut self, target: Coordinate, opponent_life_lost: u32) {
        let area = if opponent_life_lost == 0 {
            query::torpedo_area_excluding_danger_area(&self.grid, target)
        } else {
            query::torpedo_area(&self.grid, target)
        };
        let reachable: BTreeSet<CellIndex> = area.into_iter().collect();
        self.filter(FilterKind::Torpedo, |path| {
            reachable.contains(&path.position())
        });
    }

    fn apply_surface(&mut self, region: RegionId) {
        let grid = Arc::clone(&self.grid);
        let inside: Vec<CellIndex> = self
            .possible_positions()
            .into_iter()
            .filter(|&cell| grid.region_of(cell) == Some(region))
            .collect();
        let starts = if inside.is_empty() {
            grid.navigable_cells_of_region(region)
        } else {
            inside
        };
        self.reseed_from(starts, ReseedCause::Surfaced);
    }

    /// Keeps one smallest-history hypothesis per (start, position) pair. The
    /// earliest scenario wins ties.
    fn deduplicate(&mut self) {
        let mut keepers: HashMap<(CellIndex, CellIndex), (usize, usize)> = HashMap::new();
        for (slot, scenario) in self.scenarios.iter().enumerate() {
            for path in scenario.paths() {
                let key = (path.start(), path.position());
                let candidate = (slot, path.len());
                let _ = keepers
                    .entry(key)
                    .and_modify(|kept| {
                        if candidate.1 < kept.1 {
                            *kept = candidate;
                        }
                    })
                    .or_insert(candidate);
            }
        }
        for (slot, scenario) in self.scenarios.iter_mut().enumerate() {
            scenario.retain(|path| {
                keepers
                    .get(&(path.start(), path.position()))
                    .is_some_and(|&(kept, _)| kept == slot)
            });
        }
        self.refresh();
    }

    /// Forgets trajectories once the hypothesis count outgrows its bound.
    fn bound_hypotheses(&mut self) {
        if self.hypothesis_count() > self.config.hypothesis_collapse_threshold {
            self.collapse();
        }
    }

    fn collapse(&mut self) {
        let cells = self.possible_positions();
        self.reseed_from(cells, ReseedCause::Collapsed);
    }

    fn filter<F>(&mut self, kind: FilterKind, mut keep: F)
    where
        F: FnMut(&PathScenario) -> bool,
    {
        let before = self.hypothesis_count();
        for scenario in &mut self.scenarios {
            scenario.retain(&mut keep);
        }
        self.refresh();
        self.report_filter(kind, before);
    }

    fn reseed_from(&mut self, starts: Vec<CellIndex>, cause: ReseedCause) {
        let scenario = MoveScenario::seeded(&starts);
        self.scenarios = if scenario.is_empty() {
            Vec::new()
        } else {
            vec![scenario]
        };
        self.refresh();
        self.sink.record(&Diagnostic::HypothesesReseeded {
            cause,
            start_positions: self.start_positions.len(),
        });
    }

    /// Prunes empty scenarios and unrepresented start positions.
    fn refresh(&mut self) {
        self.scenarios.retain(|scenario| !scenario.is_empty());
        self.start_positions = self
            .scenarios
            .iter()
            .flat_map(MoveScenario::starts)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
    }

    fn report_filter(&mut self, kind: FilterKind, before: usize) {
        let after = self.hypothesis_count();
        self.sink.record(&Diagnostic::HypothesesFiltered {
            kind,
            before,
            after,
        });
    }
}
