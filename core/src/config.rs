//! Tunables for the search and tracking systems.

use serde::{Deserialize, Serialize};

/// Bounds applied to the path searches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Share of the reachable free cells a coverage path must visit before
    /// the longest-path search stops early.
    pub coverage_fraction: f64,
    /// Iteration cap of the longest-path search, as a multiple of the
    /// reachable free-cell count.
    pub longest_iteration_factor: usize,
    /// Iteration cap of the shortest-path searches, as a multiple of the free
    /// cell count.
    pub shortest_iteration_factor: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            coverage_fraction: 0.9,
            longest_iteration_factor: 32,
            shortest_iteration_factor: 4,
        }
    }
}

/// Memory bounds applied to the hypothesis set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Scenario count above which a positive region restriction reseeds from
    /// the raw region cells instead of filtering every scenario.
    pub region_reseed_threshold: usize,
    /// Hypothesis count above which the engine forgets trajectories and keeps
    /// one fresh hypothesis per candidate cell. A silence collapses first
    /// when its fan-out would cross this bound.
    pub hypothesis_collapse_threshold: usize,
    /// Reseed from every navigable cell when contradictory evidence emptied
    /// the hypothesis set.
    pub reseed_when_exhausted: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            region_reseed_threshold: 300,
            hypothesis_collapse_threshold: 4096,
            reseed_when_exhausted: true,
        }
    }
}

/// Complete engine configuration, usually loaded from a TOML file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Path search bounds.
    pub search: SearchConfig,
    /// Hypothesis tracking bounds.
    pub tracking: TrackingConfig,
}
