#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Iteration-bounded path searches over the navigable cells of a grid.
//!
//! Every search is a depth-first backtracking walk over an explicit node
//! stack. The walk is capped by a multiple of the free-cell count and returns
//! the best path seen when the cap triggers.

use std::sync::Arc;

use sonar_hunt_core::{
    CellIndex, CellSet, Coordinate, Diagnostic, DiagnosticSink, Direction, NullSink, PathStep,
    SearchConfig, SearchKind,
};
use sonar_hunt_world::{DistanceField, Grid};

/// Path search engine owning our own visited-cell history.
#[derive(Debug)]
pub struct PathFinder<S = NullSink> {
    grid: Arc<Grid>,
    config: SearchConfig,
    visited: CellSet,
    sink: S,
    last_iterations: usize,
}

/// Start cell chosen for the game together with its coverage path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StartCell {
    /// Cell to announce as our starting position.
    pub cell: CellIndex,
    /// Coverage path found from that cell.
    pub path: Vec<PathStep>,
}

impl PathFinder<NullSink> {
    /// Creates a path finder that discards diagnostics.
    #[must_use]
    pub fn new(grid: Arc<Grid>, config: SearchConfig) -> Self {
        Self::with_sink(grid, config, NullSink)
    }
}

impl<S> PathFinder<S>
where
    S: DiagnosticSink,
{
    /// Creates a path finder reporting to the provided sink.
    #[must_use]
    pub fn with_sink(grid: Arc<Grid>, config: SearchConfig, sink: S) -> Self {
        let visited = CellSet::with_capacity(grid.cells().len());
        Self {
            grid,
            config,
            visited,
            sink,
            last_iterations: 0,
        }
    }

    /// Grid the searches run on.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Active search bounds.
    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Loop iterations consumed by the most recent search.
    #[must_use]
    pub fn last_iterations(&self) -> usize {
        self.last_iterations
    }

    /// Marks a cell as visited since the last surface.
    pub fn add_visited_cell(&mut self, cell: CellIndex) {
        let _ = self.visited.insert(cell);
    }

    /// Forgets the visited history, as happens when surfacing.
    pub fn clear_visited_cells(&mut self) {
        self.visited.clear();
    }

    /// Reports whether the cell was visited since the last surface.
    #[must_use]
    pub fn is_visited_cell(&self, cell: CellIndex) -> bool {
        self.visited.contains(cell)
    }

    /// Cells visited since the last surface.
    #[must_use]
    pub fn visited_cells(&self) -> &CellSet {
        &self.visited
    }

    /// Searches a long simple path from `start` through unvisited water.
    ///
    /// The search stops once the best path covers the configured fraction of
    /// the free cells reachable from `start`, or when the iteration cap runs
    /// out. The final step carries no direction. A blocked start, or a start
    /// with no reachable free cell, yields an empty path.
    pub fn search_longest_path(&mut self, start: CellIndex) -> Vec<PathStep> {
        let (path, iterations) = self.longest_path_from(start);
        self.finish(SearchKind::Longest, iterations, path.len());
        path
    }

    /// Searches a path from `start` to `target` through unvisited water,
    /// never stepping away from the target in Manhattan distance.
    ///
    /// Returns an empty path when the target is visited, blocked or cannot be
    /// reached under that pruning within the iteration cap.
    pub fn search_shortest_path(&mut self, start: CellIndex, target: CellIndex) -> Vec<PathStep> {
        if self.visited.contains(target) {
            self.finish(SearchKind::Shortest, 0, 0);
            return Vec::new();
        }
        let (path, iterations) = self.directed_path(start, target, true);
        self.finish(SearchKind::Shortest, iterations, path.len());
        path
    }

    /// Searches a torpedo trajectory from `start` to `target`. Torpedoes may
    /// cross water we already visited, so the history is ignored.
    pub fn search_torpedo_path(&mut self, start: CellIndex, target: CellIndex) -> Vec<PathStep> {
        let (path, iterations) = self.directed_path(start, target, false);
        self.finish(SearchKind::Torpedo, iterations, path.len());
        path
    }

    /// Picks the starting position with the longest coverage path among the
    /// navigable grid corners and the grid middle, falling back to every
    /// navigable cell when none of those qualify. Ties keep the first
    /// candidate in index order.
    pub fn search_start_cell(&mut self) -> Option<StartCell> {
        let mut candidates: Vec<CellIndex> = self
            .grid
            .navigable_cells()
            .iter()
            .copied()
            .filter(|&cell| self.is_preferred_start(cell))
            .collect();
        if candidates.is_empty() {
            candidates = self.grid.navigable_cells().to_vec();
        }

        let mut best: Option<StartCell> = None;
        let mut total_iterations = 0usize;
        for cell in candidates {
            let (path, iterations) = self.longest_path_from(cell);
            total_iterations = total_iterations.saturating_add(iterations);
            let improves = best
                .as_ref()
                .map_or(true, |current| path.len() > current.path.len());
            if improves {
                best = Some(StartCell { cell, path });
            }
        }

        let path_length = best.as_ref().map_or(0, |start| start.path.len());
        self.finish(SearchKind::StartCell, total_iterations, path_length);
        best
    }

    fn is_preferred_start(&self, cell: CellIndex) -> bool {
        let Some(coordinate) = self.grid.coordinate_of(cell) else {
            return false;
        };
        let last_column = self.grid.width() as i32 - 1;
        let last_row = self.grid.height() as i32 - 1;
        let on_column_edge = coordinate.x() == 0 || coordinate.x() == last_column;
        let on_row_edge = coordinate.y() == 0 || coordinate.y() == last_row;
        (on_column_edge && on_row_edge) || coordinate == self.grid.middle()
    }

    fn longest_path_from(&self, start: CellIndex) -> (Vec<PathStep>, usize) {
        if !self.grid.is_navigable(start) {
            return (Vec::new(), 0);
        }

        let mut available: CellSet = self
            .grid
            .navigable_cells()
            .iter()
            .copied()
            .filter(|&cell| cell != start && !self.visited.contains(cell))
            .collect();
        let field = DistanceField::build(&self.grid, &[start], |cell| {
            cell != start && !available.contains(cell)
        });
        let reachable = field.reachable_count().saturating_sub(1);
        if reachable == 0 {
            return (Vec::new(), 0);
        }

        let fraction = self.config.coverage_fraction.clamp(0.0, 1.0);
        let target_moves = (reachable as f64 * fraction).ceil() as usize;
        let cap = reachable.saturating_mul(self.config.longest_iteration_factor);

        let mut stack = vec![PathNode::new(start)];
        let mut best: Vec<PathStep> = Vec::new();
        let mut iterations = 0;
        while !stack.is_empty() && best.len().saturating_sub(1) < target_moves && iterations < cap
        {
            let top = stack.len() - 1;
            if stack[top].moves.is_none() {
                stack[top].moves = Some(self.coverage_moves(stack[top].cell, &available));
            }
            match stack[top].moves.as_mut().and_then(Vec::pop) {
                Some((next, direction)) => {
                    let _ = available.remove(next);
                    stack[top].direction = Some(direction);
                    stack.push(PathNode::new(next));
                }
                None => {
                    if stack.len() > best.len() {
                        best = snapshot(&stack);
                    }
                    if let Some(node) = stack.pop() {
                        let _ = available.insert(node.cell);
                    }
                }
            }
            iterations += 1;
        }
        if stack.len() > best.len() {
            best = snapshot(&stack);
        }

        (best, iterations)
    }

    /// Candidate moves ordered so that `pop` yields the preferred one: fewest
    /// onward moves first, then the quadrant rotation of `cell`.
    fn coverage_moves(&self, cell: CellIndex, available: &CellSet) -> Vec<(CellIndex, Direction)> {
        let Some(coordinate) = self.grid.coordinate_of(cell) else {
            return Vec::new();
        };
        let priority = Quadrant::of(coordinate, &self.grid).priority();
        let mut candidates: Vec<Candidate> = priority
            .iter()
            .enumerate()
            .filter_map(|(rank, &direction)| {
                let next = self.grid.neighbor(cell, direction)?;
                if !available.contains(next) {
                    return None;
                }
                let onward = Direction::ALL
                    .iter()
                    .filter_map(|&step| self.grid.neighbor(next, step))
                    .filter(|&beyond| available.contains(beyond))
                    .count();
                Some(Candidate {
                    cell: next,
                    direction,
                    primary: onward,
                    rank,
                })
            })
            .collect();
        candidates.sort_by(|a, b| b.order(a));
        candidates
            .into_iter()
            .map(|candidate| (candidate.cell, candidate.direction))
            .collect()
    }

    fn directed_path(
        &self,
        start: CellIndex,
        target: CellIndex,
        respect_visited: bool,
    ) -> (Vec<PathStep>, usize) {
        if !self.grid.is_navigable(start) || !self.grid.is_navigable(target) {
            return (Vec::new(), 0);
        }
        if start == target {
            return (
                vec![PathStep {
                    cell: start,
                    direction: None,
                }],
                0,
            );
        }

        let mut available: CellSet = self
            .grid
            .navigable_cells()
            .iter()
            .copied()
            .filter(|&cell| cell != start && !(respect_visited && self.visited.contains(cell)))
            .collect();
        let cap = available
            .len()
            .saturating_mul(self.config.shortest_iteration_factor);

        let mut stack = vec![PathNode::new(start)];
        let mut iterations = 0;
        while !stack.is_empty() && iterations < cap {
            let top = stack.len() - 1;
            if stack[top].moves.is_none() {
                stack[top].moves = Some(self.approach_moves(stack[top].cell, target, &available));
            }
            match stack[top].moves.as_mut().and_then(Vec::pop) {
                Some((next, direction)) => {
                    let _ = available.remove(next);
                    stack[top].direction = Some(direction);
                    stack.push(PathNode::new(next));
                    iterations += 1;
                    if next == target {
                        return (snapshot(&stack), iterations);
                    }
                }
                None => {
                    if let Some(node) = stack.pop() {
                        let _ = available.insert(node.cell);
                    }
                    iterations += 1;
                }
            }
        }

        (Vec::new(), iterations)
    }

    /// Moves that do not increase the Manhattan distance to `target`, ordered
    /// so that `pop` yields the closest one first.
    fn approach_moves(
        &self,
        cell: CellIndex,
        target: CellIndex,
        available: &CellSet,
    ) -> Vec<(CellIndex, Direction)> {
        let Some(current) = self.grid.manhattan_distance(cell, target) else {
            return Vec::new();
        };
        let mut candidates: Vec<Candidate> = Direction::ALL
            .iter()
            .enumerate()
            .filter_map(|(rank, &direction)| {
                let next = self.grid.neighbor(cell, direction)?;
                if !available.contains(next) {
                    return None;
                }
                let distance = self.grid.manhattan_distance(next, target)? as usize;
                (distance <= current as usize).then_some(Candidate {
                    cell: next,
                    direction,
                    primary: distance,
                    rank,
                })
            })
            .collect();
        candidates.sort_by(|a, b| b.order(a));
        candidates
            .into_iter()
            .map(|candidate| (candidate.cell, candidate.direction))
            .collect()
    }

    fn finish(&mut self, kind: SearchKind, iterations: usize, path_length: usize) {
        self.last_iterations = iterations;
        self.sink.record(&Diagnostic::SearchCompleted {
            kind,
            iterations,
            path_length,
        });
    }
}

#[derive(Debug)]
struct PathNode {
    cell: CellIndex,
    moves: Option<Vec<(CellIndex, Direction)>>,
    direction: Option<Direction>,
}

impl PathNode {
    fn new(cell: CellIndex) -> Self {
        Self {
            cell,
            moves: None,
            direction: None,
        }
    }
}

fn snapshot(stack: &[PathNode]) -> Vec<PathStep> {
    let last = stack.len().saturating_sub(1);
    stack
        .iter()
        .enumerate()
        .map(|(position, node)| PathStep {
            cell: node.cell,
            direction: if position == last {
                None
            } else {
                node.direction
            },
        })
        .collect()
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    cell: CellIndex,
    direction: Direction,
    primary: usize,
    rank: usize,
}

impl Candidate {
    /// Lower ranks are preferred.
    fn order(&self, other: &Candidate) -> std::cmp::Ordering {
        (self.primary, self.rank).cmp(&(other.primary, other.rank))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Quadrant {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl Quadrant {
    fn of(coordinate: Coordinate, grid: &Grid) -> Self {
        let west = 2 * i64::from(coordinate.x()) < i64::from(grid.width());
        let north = 2 * i64::from(coordinate.y()) < i64::from(grid.height());
        match (north, west) {
            (true, true) => Self::NorthWest,
            (true, false) => Self::NorthEast,
            (false, true) => Self::SouthWest,
            (false, false) => Self::SouthEast,
        }
    }

    /// Rotation that sweeps away from the nearest corner.
    const fn priority(self) -> [Direction; 4] {
        use Direction::{East, North, South, West};
        match self {
            Self::NorthWest => [South, East, North, West],
            Self::NorthEast => [West, South, East, North],
            Self::SouthWest => [East, North, West, South],
            Self::SouthEast => [North, West, South, East],
        }
    }
}
