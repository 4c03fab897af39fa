pub mod explorer;
pub mod hungarian;

pub use self::explorer::{MultiSeedExplorer, SeedCandidate};
pub use self::hungarian::{AssignmentSolver, HungarianSolver, WeightMatrix};

use crate::consts::FORCED_WEIGHT;
use crate::core_types::{is_permutation, Matching};
use crate::error::{SfResult, ShiftForgeError};
use crate::graph::CandidateGraph;
use std::sync::Arc;
use tracing::warn;

/// Produces concrete matchings from the candidate graph through the assignment solver,
/// optionally forcing chosen (entity, peak) pairs.
pub struct SeedMatcher {
    pub graph: Arc<CandidateGraph>,
    solver: Arc<dyn AssignmentSolver>,
}

impl SeedMatcher {
    pub fn new(graph: Arc<CandidateGraph>, solver: Arc<dyn AssignmentSolver>) -> Self {
        Self { graph, solver }
    }

    pub fn with_default_solver(graph: Arc<CandidateGraph>) -> Self {
        Self::new(graph, Arc::new(HungarianSolver))
    }

    /// Context scores for every padded cell, with required pairs lifted to a dominant weight.
    pub fn weight_matrix(&self, requirement: Option<&[Option<usize>]>) -> WeightMatrix {
        let graph = &*self.graph;
        let n = graph.size();
        let mut weights = WeightMatrix::zeros(n);
        for e in 0..n {
            for p in 0..n {
                weights.set(e, p, graph.weight(e, p));
            }
        }

        if let Some(req) = requirement {
            for (e, required) in req.iter().enumerate() {
                let Some(p) = *required else { continue };
                if e < n && p < n && graph.edge(e, p).is_some() {
                    weights.set(e, p, FORCED_WEIGHT);
                } else {
                    warn!(
                        "Ignoring requirement ({}, {}): not a candidate pair",
                        e, p
                    );
                }
            }
        }
        weights
    }

    pub fn solve(&self, requirement: Option<&[Option<usize>]>) -> SfResult<Matching> {
        let weights = self.weight_matrix(requirement);
        let matching = self.solver.solve(&weights)?;
        if matching.len() != self.graph.size() || !is_permutation(&matching) {
            return Err(ShiftForgeError::Solver(format!(
                "solver returned an invalid assignment of length {}",
                matching.len()
            )));
        }
        Ok(matching)
    }

    /// Unconstrained matching.
    pub fn baseline(&self) -> SfResult<Matching> {
        self.solve(None)
    }
}
