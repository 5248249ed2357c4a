use std::{collections::BTreeSet, sync::Arc};

use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sonar_hunt_core::{
    parse_orders, CellIndex, Coordinate, Diagnostic, Direction, FilterKind, Order, RegionId,
    ReseedCause, SonarResult, TrackingConfig,
};
use sonar_hunt_system_tracking::{PathScenario, TrackingEngine};
use sonar_hunt_world::{query, Grid};

fn open_engine(width: u32, height: u32) -> TrackingEngine {
    let grid = Grid::open(width, height).expect("open grid");
    TrackingEngine::new(Arc::new(grid), TrackingConfig::default())
}

fn cell(engine: &TrackingEngine, x: i32, y: i32) -> CellIndex {
    engine
        .grid()
        .index_of(Coordinate::new(x, y))
        .expect("in bounds")
}

fn coordinate(engine: &TrackingEngine, cell: CellIndex) -> Coordinate {
    engine.grid().coordinate_of(cell).expect("in bounds")
}

#[test]
fn move_north_prunes_the_top_row() {
    let mut engine = open_engine(5, 5);
    engine.apply_orders(&parse_orders("MOVE N"), 0);

    assert_eq!(engine.hypothesis_count(), 20);
    assert_eq!(engine.start_positions().len(), 20);
    for path in engine.scenarios().iter().flat_map(|scenario| scenario.paths()) {
        let start = coordinate(&engine, path.start());
        assert!(start.y() > 0);
        assert_eq!(
            coordinate(&engine, path.position()),
            start.sum(Direction::North.unit())
        );
        assert_eq!(path.len(), 2);
        assert!(path.visited().contains(path.start()));
    }
}

#[test]
fn reversing_a_move_is_impossible_without_silence() {
    let mut engine = open_engine(5, 5);
    engine.apply_orders(&parse_orders("MOVE E|MOVE W"), 0);
    assert_eq!(engine.hypothesis_count(), 0);
    assert!(engine.possible_positions().is_empty());
    assert!(engine.start_positions().is_empty());
}

#[test]
fn surfacing_in_the_only_region_keeps_every_candidate() {
    let mut engine = open_engine(5, 5);
    let before = engine.possible_positions();
    engine.apply_orders(&parse_orders("SURFACE 1"), 0);
    assert_eq!(engine.possible_positions(), before);
    assert_eq!(engine.possible_positions().len(), 25);
    assert_eq!(engine.scenario_count(), 1);
}

#[test]
fn surfacing_localises_to_the_region() {
    let mut engine = open_engine(15, 15);
    let near = cell(&engine, 4, 4);
    let far = cell(&engine, 6, 4);
    engine.restrict_to_cells(&[near, far]);

    engine.apply_orders(&parse_orders("SURFACE 1"), 0);
    assert_eq!(engine.possible_positions(), vec![near]);
    assert_eq!(engine.start_positions(), &[near]);

    engine.apply_orders(&parse_orders("SURFACE 9"), 0);
    let region = engine.grid().navigable_cells_of_region(RegionId::new(9));
    assert_eq!(engine.possible_positions(), region);
    assert_eq!(engine.start_positions().len(), 25);
}

#[test]
fn torpedo_keeps_the_manhattan_ball_around_the_target() {
    let mut engine = open_engine(15, 15);
    engine.apply_orders(&parse_orders("TORPEDO 7 7"), 1);

    let positions = engine.possible_positions();
    assert_eq!(positions.len(), 41);
    let target = Coordinate::new(7, 7);
    let mut expected = Vec::new();
    for y in 0..15 {
        for x in 0..15 {
            let point = Coordinate::new(x, y);
            if point.manhattan_distance(target) <= 4 {
                expected.push(cell(&engine, x, y));
            }
        }
    }
    assert_eq!(positions, expected);
}

#[test]
fn torpedo_without_self_damage_rules_out_the_blast() {
    let mut engine = open_engine(15, 15);
    engine.apply_orders(&parse_orders("TORPEDO 7 7"), 0);

    let positions = engine.possible_positions();
    assert_eq!(positions.len(), 32);
    let target = Coordinate::new(7, 7);
    assert!(positions.iter().all(|&position| {
        coordinate(&engine, position).chebyshev_distance(target) > 1
    }));
}

#[test]
fn silence_fans_out_from_a_single_hypothesis() {
    let mut engine = open_engine(5, 5);
    engine.restrict_to_cells(&[cell(&engine, 2, 2)]);
    engine.apply_orders(&parse_orders("SILENCE"), 0);

    let positions: BTreeSet<Coordinate> = engine
        .possible_positions()
        .into_iter()
        .map(|position| coordinate(&engine, position))
        .collect();
    assert_eq!(positions.len(), 9);
    assert!(positions
        .iter()
        .all(|point| point.x() == 2 || point.y() == 2));
}

#[test]
fn silence_reaches_four_cells_along_each_axis() {
    let mut engine = open_engine(15, 15);
    engine.restrict_to_cells(&[cell(&engine, 7, 7)]);
    engine.apply_orders(&parse_orders("SILENCE"), 0);

    let positions: BTreeSet<Coordinate> = engine
        .possible_positions()
        .into_iter()
        .map(|position| coordinate(&engine, position))
        .collect();
    let centre = Coordinate::new(7, 7);
    let mut expected = BTreeSet::from([centre]);
    for step in 1..=4 {
        let _ = expected.insert(Coordinate::new(7 + step, 7));
        let _ = expected.insert(Coordinate::new(7 - step, 7));
        let _ = expected.insert(Coordinate::new(7, 7 + step));
        let _ = expected.insert(Coordinate::new(7, 7 - step));
    }
    assert_eq!(positions, expected);
    assert_eq!(positions.len(), 17);
    assert!(positions
        .iter()
        .all(|point| point.manhattan_distance(centre) <= 4));
}

#[test]
fn repeated_silences_stay_within_the_hypothesis_bound() {
    let grid = Arc::new(Grid::open(15, 15).expect("open grid"));
    let config = TrackingConfig::default();
    let bound = config.hypothesis_collapse_threshold;
    let mut bounded = TrackingEngine::new(Arc::clone(&grid), config);
    let mut exact = TrackingEngine::new(
        Arc::clone(&grid),
        TrackingConfig {
            hypothesis_collapse_threshold: usize::MAX,
            ..TrackingConfig::default()
        },
    );

    let turns = ["MOVE E|SILENCE", "MOVE S|SILENCE", "MOVE W|SILENCE", "MOVE N|SILENCE"];
    for (round, turn) in turns.iter().cycle().take(8).enumerate() {
        let orders = parse_orders(turn);
        bounded.apply_orders(&orders, 0);
        assert!(
            bounded.hypothesis_count() <= bound,
            "turn {round}: {} hypotheses",
            bounded.hypothesis_count()
        );

        if round < 2 {
            exact.apply_orders(&orders, 0);
            let kept: BTreeSet<CellIndex> = bounded.possible_positions().into_iter().collect();
            assert!(exact
                .possible_positions()
                .iter()
                .all(|position| kept.contains(position)));
        }
    }
    assert!(!bounded.possible_positions().is_empty());
}

#[test]
fn extreme_targets_never_panic() {
    let mut engine = open_engine(15, 15);
    engine.apply_attack_outcome(Coordinate::new(i32::MIN, 0), 0);
    engine.apply_attack_outcome(Coordinate::new(i32::MAX, i32::MIN), 1);
    assert!(engine.possible_positions().is_empty());

    let mut engine = open_engine(15, 15);
    engine.apply_attack_outcome(Coordinate::new(i32::MIN, i32::MAX), 0);
    assert_eq!(engine.possible_positions().len(), 225);

    engine.apply_orders(&parse_orders("TORPEDO 2147483647 0"), 0);
    assert!(engine.possible_positions().is_empty());
    engine.apply_orders(&parse_orders("TORPEDO -2147483648 -2147483648"), 1);
}

#[test]
fn position_stats_are_idempotent() {
    let mut engine = open_engine(15, 15);
    engine.apply_orders(&parse_orders("MOVE S|SILENCE|MOVE E"), 0);

    let first = engine.position_stats();
    let second = engine.position_stats();
    assert_eq!(first, second);
    assert_eq!(first.hypothesis_count, engine.hypothesis_count());
    assert_eq!(first.scenario_count, engine.scenario_count());
    assert_eq!(first.start_position_count, engine.start_positions().len());
    assert_eq!(
        first.candidates().collect::<Vec<_>>(),
        engine.possible_positions()
    );
    assert_eq!(
        first.cells.values().sum::<usize>(),
        first.hypothesis_count
    );
    assert_eq!(
        first.regions.values().sum::<usize>(),
        first.candidate_count()
    );
}

#[test]
fn visit_counts_follow_every_hypothesis() {
    let mut engine = open_engine(5, 5);
    engine.restrict_to_cells(&[cell(&engine, 0, 0), cell(&engine, 0, 1)]);
    engine.apply_orders(&parse_orders("MOVE E"), 0);

    let stats = engine.position_stats();
    assert_eq!(stats.visit_counts.len(), 4);
    assert!(stats.visit_counts.values().all(|&count| count == 1));
    assert_eq!(stats.busiest_region(), Some(RegionId::new(1)));
}

#[test]
fn filters_never_grow_the_candidate_set() {
    let grid = Arc::new(Grid::open(15, 15).expect("open grid"));
    let mut rng = ChaCha8Rng::seed_from_u64(0x7ac4_0001);
    for _ in 0..6 {
        let mut engine = TrackingEngine::new(Arc::clone(&grid), TrackingConfig::default());
        engine.apply_orders(&parse_orders("MOVE N|SILENCE|MOVE W"), 0);

        for _ in 0..5 {
            let before_count = engine.hypothesis_count();
            let before: BTreeSet<CellIndex> = engine.possible_positions().into_iter().collect();
            let picked: Vec<CellIndex> = grid
                .navigable_cells()
                .choose_multiple(&mut rng, 60)
                .copied()
                .collect();
            match rng.gen_range(0..3) {
                0 => engine.restrict_to_cells(&picked),
                1 => engine.exclude_cells(&picked),
                _ => {
                    let target = Order::Torpedo {
                        target: Coordinate::new(rng.gen_range(0..15), rng.gen_range(0..15)),
                    };
                    let lost = rng.gen_range(0..2);
                    engine.apply_orders(&[target], lost);
                }
            }
            let after: BTreeSet<CellIndex> = engine.possible_positions().into_iter().collect();
            assert!(engine.hypothesis_count() <= before_count);
            assert!(after.is_subset(&before));
            if after.is_empty() {
                break;
            }
        }
    }
}

#[test]
fn sonar_results_restrict_or_exclude_regions() {
    let mut engine = open_engine(15, 15);
    engine.apply_sonar_result(RegionId::new(5), SonarResult::Missed);
    assert_eq!(engine.possible_positions().len(), 200);

    engine.apply_sonar_result(RegionId::new(2), SonarResult::Unavailable);
    assert_eq!(engine.possible_positions().len(), 200);

    engine.apply_sonar_result(RegionId::new(1), SonarResult::Found);
    let positions = engine.possible_positions();
    assert_eq!(positions.len(), 25);
    assert!(positions
        .iter()
        .all(|&position| engine.grid().region_of(position) == Some(RegionId::new(1))));
}

#[test]
fn oversized_or_empty_sets_reseed_from_the_region() {
    let grid = Arc::new(Grid::open(15, 15).expect("open grid"));
    let config = TrackingConfig {
        region_reseed_threshold: 0,
        ..TrackingConfig::default()
    };
    let mut engine = TrackingEngine::new(Arc::clone(&grid), config);
    engine.apply_orders(&parse_orders("MOVE E"), 0);
    assert_eq!(engine.possible_positions().len(), 210);

    engine.restrict_to_region(RegionId::new(1));
    assert_eq!(
        engine.possible_positions(),
        grid.navigable_cells_of_region(RegionId::new(1))
    );

    let mut filtering = TrackingEngine::new(Arc::clone(&grid), TrackingConfig::default());
    filtering.apply_orders(&parse_orders("MOVE E"), 0);
    filtering.restrict_to_region(RegionId::new(1));
    assert_eq!(filtering.possible_positions().len(), 20);

    filtering.exclude_cells(grid.navigable_cells());
    assert_eq!(filtering.scenario_count(), 0);
    filtering.exclude_region(RegionId::new(1));
    assert_eq!(filtering.possible_positions().len(), 200);

    filtering.exclude_cells(grid.navigable_cells());
    filtering.restrict_to_region(RegionId::new(3));
    assert_eq!(
        filtering.possible_positions(),
        grid.navigable_cells_of_region(RegionId::new(3))
    );
}

#[test]
fn exhausted_sets_reseed_on_the_next_turn() {
    let mut engine = open_engine(15, 15);
    let everything = engine.grid().navigable_cells().to_vec();
    engine.exclude_cells(&everything);
    assert_eq!(engine.hypothesis_count(), 0);

    engine.apply_orders(&[], 0);
    assert_eq!(engine.hypothesis_count(), 225);

    let grid = Arc::new(Grid::open(5, 5).expect("open grid"));
    let config = TrackingConfig {
        reseed_when_exhausted: false,
        ..TrackingConfig::default()
    };
    let mut strict = TrackingEngine::new(Arc::clone(&grid), config);
    strict.exclude_cells(grid.navigable_cells());
    strict.apply_orders(&parse_orders("MOVE N"), 0);
    assert_eq!(strict.hypothesis_count(), 0);

    strict.reseed();
    assert_eq!(strict.hypothesis_count(), 25);
}

#[test]
fn attack_outcomes_narrow_around_the_target() {
    let target = Coordinate::new(7, 7);

    let mut missed = open_engine(15, 15);
    missed.apply_attack_outcome(target, 0);
    assert_eq!(missed.possible_positions().len(), 216);

    let mut grazed = open_engine(15, 15);
    grazed.apply_attack_outcome(target, 1);
    let ring = grazed.possible_positions();
    assert_eq!(ring.len(), 8);
    assert!(!ring.contains(&cell(&grazed, 7, 7)));

    let mut struck = open_engine(15, 15);
    struck.apply_attack_outcome(target, 2);
    assert_eq!(struck.possible_positions(), vec![cell(&struck, 7, 7)]);
    assert_eq!(
        struck.position_stats().locate(struck.grid()),
        Some(cell(&struck, 7, 7))
    );

    let mut unclear = open_engine(15, 15);
    unclear.apply_attack_outcome(target, 3);
    assert_eq!(unclear.possible_positions().len(), 225);
}

#[test]
fn diagnostics_reach_an_injected_closure() {
    let grid = Arc::new(Grid::open(5, 5).expect("open grid"));
    let mut seen = Vec::new();
    {
        let sink = |diagnostic: &Diagnostic| seen.push(diagnostic.clone());
        let mut engine = TrackingEngine::with_sink(grid, TrackingConfig::default(), sink);
        engine.apply_orders(&parse_orders("MOVE N|SURFACE 1"), 0);
    }
    assert_eq!(
        seen,
        vec![
            Diagnostic::HypothesesFiltered {
                kind: FilterKind::Move,
                before: 25,
                after: 20,
            },
            Diagnostic::HypothesesReseeded {
                cause: ReseedCause::Surfaced,
                start_positions: 20,
            },
            Diagnostic::OrdersApplied {
                orders: 2,
                scenarios: 1,
                hypotheses: 20,
                candidates: 20,
            },
        ]
    );
}

#[test]
fn true_trajectory_is_never_pruned() {
    for seed in 0..8 {
        let mut rng = ChaCha8Rng::seed_from_u64(0x50_0000 + seed);
        let terrain: String = (0..225)
            .map(|_| if rng.gen_bool(0.1) { 'X' } else { '.' })
            .collect();
        let grid = Arc::new(Grid::build(15, 15, &terrain).expect("map"));
        let mut engine = TrackingEngine::new(Arc::clone(&grid), TrackingConfig::default());
        let mut opponent = Opponent::spawn(&grid, &mut rng);

        for turn in 0..30 {
            let mut orders = Vec::new();
            let mut lost = 0;
            if turn == 12 {
                orders.push(opponent.silence(&grid, &mut rng));
            } else {
                orders.push(opponent.step(&grid, &mut rng));
            }
            if rng.gen_bool(0.3) {
                if let Some(target) = opponent.torpedo_target(&grid, &mut rng) {
                    orders.push(Order::Torpedo { target });
                }
            } else if rng.gen_bool(0.1) {
                lost = 1;
                if let Some(target) = opponent.torpedo_target(&grid, &mut rng) {
                    orders.push(Order::Torpedo { target });
                }
            }

            engine.apply_orders(&orders, lost);
            assert!(
                engine.possible_positions().contains(&opponent.position()),
                "seed {seed} turn {turn}: lost the opponent after {orders:?}"
            );

            if turn % 7 == 3 {
                let region = grid.region_of(opponent.position()).expect("region");
                engine.apply_sonar_result(region, SonarResult::Found);
                assert!(engine.possible_positions().contains(&opponent.position()));
            }
        }
    }
}

/// Ground-truth opponent driven by a seeded generator.
struct Opponent {
    path: PathScenario,
    silenced: bool,
}

impl Opponent {
    fn spawn(grid: &Grid, rng: &mut ChaCha8Rng) -> Self {
        let start = *grid
            .navigable_cells()
            .choose(rng)
            .expect("map has water");
        Self {
            path: PathScenario::new(start),
            silenced: false,
        }
    }

    fn position(&self) -> CellIndex {
        self.path.position()
    }

    fn step(&mut self, grid: &Grid, rng: &mut ChaCha8Rng) -> Order {
        let mut directions = Direction::ALL;
        directions.shuffle(rng);
        for direction in directions {
            if self.path.advance(grid, direction) {
                return Order::Move { direction };
            }
        }
        let region = grid.region_of(self.position()).expect("region");
        self.path = PathScenario::new(self.position());
        Order::Surface { region }
    }

    fn silence(&mut self, grid: &Grid, rng: &mut ChaCha8Rng) -> Order {
        assert!(!self.silenced, "the simulation silences once");
        self.silenced = true;
        let direction = *Direction::ALL.choose(rng).expect("four directions");
        let length = rng.gen_range(0..=4);
        for _ in 0..length {
            if !self.path.advance(grid, direction) {
                break;
            }
        }
        Order::Silence
    }

    fn torpedo_target(&self, grid: &Grid, rng: &mut ChaCha8Rng) -> Option<Coordinate> {
        let here = grid.coordinate_of(self.position())?;
        let outer = query::torpedo_area_excluding_danger_area(grid, here);
        let cell = outer.choose(rng)?;
        grid.coordinate_of(*cell)
    }
}
