//! Diagnostics contract injected into the search and tracking systems.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Hypothesis filter that narrowed the tracked set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    /// Announced single step.
    Move,
    /// Silence fan-out after deduplication.
    Silence,
    /// Torpedo blast range.
    Torpedo,
    /// Explicit keep-list of cells.
    RestrictCells,
    /// Explicit drop-list of cells.
    ExcludeCells,
    /// Positive region evidence.
    RestrictRegion,
    /// Negative region evidence.
    ExcludeRegion,
}

/// Reason the hypothesis set was rebuilt from scratch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReseedCause {
    /// Contradictory evidence left no hypotheses behind.
    Exhausted,
    /// The opponent resurfaced.
    Surfaced,
    /// Region evidence arrived while the set was empty or oversized.
    RegionReseed,
    /// Trajectories were forgotten to bound the scenario count.
    Collapsed,
    /// A caller asked for a reseed.
    Requested,
}

/// Search routine that finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchKind {
    /// Coverage-maximising path.
    Longest,
    /// Path to a target respecting our visited history.
    Shortest,
    /// Path to a target ignoring visited history.
    Torpedo,
    /// Start-cell selection over several coverage searches.
    StartCell,
}

/// Observation emitted by a system so an external observer can report it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// A batch of orders was folded into the hypothesis set.
    OrdersApplied {
        /// Number of orders in the batch.
        orders: usize,
        /// Move scenarios alive afterwards.
        scenarios: usize,
        /// Hypotheses alive afterwards.
        hypotheses: usize,
        /// Distinct candidate cells afterwards.
        candidates: usize,
    },
    /// A filter pruned hypotheses.
    HypothesesFiltered {
        /// Which filter ran.
        kind: FilterKind,
        /// Hypothesis count before filtering.
        before: usize,
        /// Hypothesis count after filtering.
        after: usize,
    },
    /// The hypothesis set was rebuilt.
    HypothesesReseeded {
        /// Why the rebuild happened.
        cause: ReseedCause,
        /// Start positions after the rebuild.
        start_positions: usize,
    },
    /// A path search returned.
    SearchCompleted {
        /// Which search ran.
        kind: SearchKind,
        /// Loop iterations consumed.
        iterations: usize,
        /// Steps in the returned path.
        path_length: usize,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OrdersApplied {
                orders,
                scenarios,
                hypotheses,
                candidates,
            } => write!(
                f,
                "applied {orders} orders: {scenarios} scenarios, {hypotheses} hypotheses, {candidates} candidate cells"
            ),
            Self::HypothesesFiltered {
                kind,
                before,
                after,
            } => write!(f, "{kind:?} filter kept {after} of {before} hypotheses"),
            Self::HypothesesReseeded {
                cause,
                start_positions,
            } => write!(f, "reseeded ({cause:?}) from {start_positions} start positions"),
            Self::SearchCompleted {
                kind,
                iterations,
                path_length,
            } => write!(
                f,
                "{kind:?} search returned {path_length} steps after {iterations} iterations"
            ),
        }
    }
}

/// Receiver of diagnostics emitted by the systems.
pub trait DiagnosticSink {
    /// Handles a single diagnostic.
    fn record(&mut self, diagnostic: &Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: FnMut(&Diagnostic),
{
    fn record(&mut self, diagnostic: &Diagnostic) {
        (*self)(diagnostic);
    }
}

/// Sink that discards every diagnostic.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&mut self, _diagnostic: &Diagnostic) {}
}

/// Sink that forwards diagnostics as structured `tracing` events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&mut self, diagnostic: &Diagnostic) {
        match diagnostic {
            Diagnostic::OrdersApplied {
                orders,
                scenarios,
                hypotheses,
                candidates,
            } => tracing::info!(
                target: "sonar_hunt",
                orders,
                scenarios,
                hypotheses,
                candidates,
                "orders applied"
            ),
            Diagnostic::HypothesesFiltered {
                kind,
                before,
                after,
            } => tracing::debug!(
                target: "sonar_hunt",
                kind = ?kind,
                before,
                after,
                "hypotheses filtered"
            ),
            Diagnostic::HypothesesReseeded {
                cause,
                start_positions,
            } => tracing::info!(
                target: "sonar_hunt",
                cause = ?cause,
                start_positions,
                "hypotheses reseeded"
            ),
            Diagnostic::SearchCompleted {
                kind,
                iterations,
                path_length,
            } => tracing::debug!(
                target: "sonar_hunt",
                kind = ?kind,
                iterations,
                path_length,
                "search completed"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_act_as_sinks() {
        let mut seen = Vec::new();
        {
            let mut sink = |diagnostic: &Diagnostic| seen.push(diagnostic.clone());
            sink.record(&Diagnostic::HypothesesReseeded {
                cause: ReseedCause::Requested,
                start_positions: 25,
            });
        }
        assert_eq!(
            seen,
            vec![Diagnostic::HypothesesReseeded {
                cause: ReseedCause::Requested,
                start_positions: 25,
            }]
        );
    }

    #[test]
    fn display_summarises_filters() {
        let diagnostic = Diagnostic::HypothesesFiltered {
            kind: FilterKind::Torpedo,
            before: 225,
            after: 41,
        };
        assert_eq!(diagnostic.to_string(), "Torpedo filter kept 41 of 225 hypotheses");
    }
}
