pub mod crossover;
pub mod initialization;
pub mod mutation;
pub mod runner;
pub mod selection;

pub use self::mutation::AdaptiveRates;
pub use self::runner::{
    EvolutionaryRefiner, NoProgress, ProgressCallback, RefinementResult, RefinerOptions,
    StopReason,
};

use crate::core_types::Matching;

/// A matching together with its cached fitness (`None` until evaluated).
#[derive(Debug, Clone, PartialEq)]
pub struct Chromosome {
    pub genes: Vec<usize>,
    pub fitness: Option<f64>,
}

impl Chromosome {
    pub fn from_matching(matching: Matching) -> Self {
        Self {
            genes: matching,
            fitness: None,
        }
    }

    pub fn into_matching(self) -> Matching {
        self.genes
    }

    /// Fitness for ranking; unevaluated members rank below everything.
    #[inline]
    pub fn score(&self) -> f64 {
        self.fitness.unwrap_or(f64::NEG_INFINITY)
    }
}

impl From<Matching> for Chromosome {
    fn from(matching: Matching) -> Self {
        Self::from_matching(matching)
    }
}
