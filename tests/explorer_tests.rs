mod common;

use common::*;
use shiftforge::config::ScoringWeights;
use shiftforge::error::{SfResult, ShiftForgeError};
use shiftforge::graph::CandidateGraph;
use shiftforge::matcher::{
    AssignmentSolver, HungarianSolver, MultiSeedExplorer, SeedMatcher, WeightMatrix,
};
use shiftforge::scorer::GlobalScorer;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Two entities that both fit both peaks; the diagonal is best.
fn swappable() -> Arc<CandidateGraph> {
    let problem = one_dim(
        vec![atom("a0", 50.0, 1.0), atom("a1", 50.3, 1.0)],
        vec![entity("e0", "a0"), entity("e1", "a1")],
        vec![peak("p0", 50.0, 0.1), peak("p1", 50.3, 0.1)],
    );
    Arc::new(CandidateGraph::from_problem(&problem, &ScoringWeights::default()).unwrap())
}

#[test]
fn test_multi_match_ranks_forced_alternatives() {
    let graph = swappable();
    let scorer = GlobalScorer::new(graph.clone(), &ScoringWeights::default());
    let matcher = SeedMatcher::with_default_solver(graph.clone());
    let explorer = MultiSeedExplorer::new(&matcher, &scorer, 4);

    let baseline = matcher.baseline().unwrap();
    assert_eq!(baseline, vec![0, 1]);

    let ranked = explorer.multi_match(&baseline);
    assert_eq!(ranked.len(), 2);
    assert_eq!((ranked[0].peak, ranked[0].entity), (0, 1));
    assert_eq!((ranked[1].peak, ranked[1].entity), (1, 0));
    for seed in &ranked {
        assert_eq!(seed.matching, vec![1, 0]);
        assert!(seed.fitness < scorer.fitness(&baseline));
    }
    assert!(ranked.windows(2).all(|w| w[0].fitness >= w[1].fitness));
}

#[test]
fn test_refine_only_reports_improvements() {
    let graph = swappable();
    let scorer = GlobalScorer::new(graph.clone(), &ScoringWeights::default());
    let matcher = SeedMatcher::with_default_solver(graph.clone());
    let explorer = MultiSeedExplorer::new(&matcher, &scorer, 4);

    let baseline = matcher.baseline().unwrap();
    let baseline_fitness = scorer.fitness(&baseline);
    let ranked = explorer.multi_match(&baseline);

    assert!(explorer.refine(baseline_fitness, &ranked).is_none());

    let (matching, fitness) = explorer.refine(f64::NEG_INFINITY, &ranked).unwrap();
    assert_eq!(matching, vec![1, 0]);
    assert_eq!(fitness, scorer.fitness(&matching));
}

#[test]
fn test_refine_with_nothing_ranked() {
    let graph = swappable();
    let scorer = GlobalScorer::new(graph.clone(), &ScoringWeights::default());
    let matcher = SeedMatcher::with_default_solver(graph);
    let explorer = MultiSeedExplorer::new(&matcher, &scorer, 4);
    assert!(explorer.refine(0.0, &[]).is_none());
}

/// Two independent blocks. Within each, the solver prefers the diagonal (weights 1.0 + 0.05
/// against 0.45 + 0.45) while global consistency prefers the swap, so forcing either
/// off-diagonal pair of a block improves fitness and both swaps together improve it again.
fn two_blocks() -> Arc<CandidateGraph> {
    let problem = one_dim(
        vec![
            atom("a0", 0.0, 1.0),
            atom("a1", 0.21, 0.278),
            atom("a2", 100.0, 1.0),
            atom("a3", 100.21, 0.278),
        ],
        vec![
            entity("e0", "a0"),
            entity("e1", "a1"),
            entity("e2", "a2"),
            entity("e3", "a3"),
        ],
        vec![
            peak("p0", 0.0, 0.05),
            peak("p1", 0.755, 0.05),
            peak("p2", 100.0, 0.05),
            peak("p3", 100.755, 0.05),
        ],
    );
    Arc::new(CandidateGraph::from_problem(&problem, &ScoringWeights::default()).unwrap())
}

#[test]
fn test_refine_stacks_independent_swaps() {
    let graph = two_blocks();
    let scorer = GlobalScorer::new(graph.clone(), &ScoringWeights::default());
    let matcher = SeedMatcher::with_default_solver(graph.clone());
    let explorer = MultiSeedExplorer::new(&matcher, &scorer, 4);

    let baseline = matcher.baseline().unwrap();
    assert_eq!(baseline, vec![0, 1, 2, 3]);
    let baseline_fitness = scorer.fitness(&baseline);

    let ranked = explorer.multi_match(&baseline);
    assert_eq!(ranked.len(), 4);
    assert!(ranked.iter().all(|c| c.fitness > baseline_fitness));

    // the first stack of two pairs repeats one swap, is marked bad and retried
    let (matching, fitness) = explorer.refine(baseline_fitness, &ranked).unwrap();
    assert_eq!(matching, vec![1, 0, 3, 2]);
    assert!(fitness > ranked[0].fitness);
    assert_eq!(fitness, scorer.fitness(&matching));
}

#[test]
fn test_refine_gives_up_after_retry_limit() {
    let graph = two_blocks();
    let scorer = GlobalScorer::new(graph.clone(), &ScoringWeights::default());
    let matcher = SeedMatcher::with_default_solver(graph.clone());
    let explorer = MultiSeedExplorer::new(&matcher, &scorer, 0);

    let baseline = matcher.baseline().unwrap();
    let ranked = explorer.multi_match(&baseline);
    let (matching, fitness) = explorer.refine(scorer.fitness(&baseline), &ranked).unwrap();

    // no retry allowed after the first unproductive stack: one block swapped only
    assert!(matching == vec![1, 0, 2, 3] || matching == vec![0, 1, 3, 2]);
    assert_eq!(fitness, ranked[0].fitness);
}

/// Solves normally unless more than one pair is forced.
struct SinglePairSolver {
    calls: AtomicUsize,
}

impl AssignmentSolver for SinglePairSolver {
    fn solve(&self, weights: &WeightMatrix) -> SfResult<Vec<usize>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if weights.data.iter().filter(|&&w| w >= 1000.0).count() > 1 {
            return Err(ShiftForgeError::Solver("too many forced pairs".to_string()));
        }
        HungarianSolver.solve(weights)
    }
}

#[test]
fn test_refine_skips_failed_solves() {
    let graph = two_blocks();
    let scorer = GlobalScorer::new(graph.clone(), &ScoringWeights::default());
    let solver = Arc::new(SinglePairSolver {
        calls: AtomicUsize::new(0),
    });
    let matcher = SeedMatcher::new(graph.clone(), solver.clone());
    let explorer = MultiSeedExplorer::new(&matcher, &scorer, 4);

    let baseline = matcher.baseline().unwrap();
    let ranked = explorer.multi_match(&baseline);
    assert_eq!(ranked.len(), 4);
    assert_eq!(solver.calls.load(Ordering::SeqCst), 5);

    let (matching, fitness) = explorer.refine(scorer.fitness(&baseline), &ranked).unwrap();
    assert_eq!(matching, ranked[0].matching);
    assert_eq!(fitness, ranked[0].fitness);
    // one single-pair solve, then every two-pair stack fails until candidates run out
    assert_eq!(solver.calls.load(Ordering::SeqCst), 5 + 1 + 3);
}

/// Fails every forced solve, succeeds on the unconstrained one.
struct FlakySolver {
    calls: AtomicUsize,
}

impl AssignmentSolver for FlakySolver {
    fn solve(&self, weights: &WeightMatrix) -> SfResult<Vec<usize>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if weights.data.iter().any(|&w| w >= 1000.0) {
            return Err(ShiftForgeError::Solver("refused".to_string()));
        }
        Ok((0..weights.n).collect())
    }
}

#[test]
fn test_solver_failures_are_skipped() {
    let graph = swappable();
    let scorer = GlobalScorer::new(graph.clone(), &ScoringWeights::default());
    let solver = Arc::new(FlakySolver {
        calls: AtomicUsize::new(0),
    });
    let matcher = SeedMatcher::new(graph.clone(), solver.clone());
    let explorer = MultiSeedExplorer::new(&matcher, &scorer, 4);

    let baseline = matcher.baseline().unwrap();
    assert!(explorer.multi_match(&baseline).is_empty());
    assert_eq!(solver.calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_refine_survives_solver_failures() {
    let graph = swappable();
    let scorer = GlobalScorer::new(graph.clone(), &ScoringWeights::default());
    let matcher = SeedMatcher::new(
        graph.clone(),
        Arc::new(FlakySolver {
            calls: AtomicUsize::new(0),
        }),
    );
    let explorer = MultiSeedExplorer::new(&matcher, &scorer, 4);

    // ranked by a working solver, refined through a failing one
    let healthy = SeedMatcher::with_default_solver(graph.clone());
    let ranked = MultiSeedExplorer::new(&healthy, &scorer, 4).multi_match(&[0, 1]);
    assert_eq!(ranked.len(), 2);
    assert!(explorer.refine(f64::NEG_INFINITY, &ranked).is_none());
}
