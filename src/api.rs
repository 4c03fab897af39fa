use crate::config::Config;
use crate::core_types::Matching;
use crate::error::SfResult;
use crate::graph::CandidateGraph;
use crate::matcher::{
    AssignmentSolver, HungarianSolver, MultiSeedExplorer, SeedCandidate, SeedMatcher,
};
use crate::model::Problem;
use crate::optimizer::{
    EvolutionaryRefiner, ProgressCallback, RefinementResult, RefinerOptions, StopReason,
};
use crate::scorer::{Evaluation, GlobalScorer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::info;

/// Outcome of the seed exploration stage.
#[derive(Debug, Clone, Default)]
pub struct Exploration {
    /// Complete single-pair seeds, best first.
    pub ranked: Vec<SeedCandidate>,
    /// Best stacked combination, only when it beat the baseline.
    pub refined: Option<(Matching, f64)>,
}

#[derive(Debug, Clone)]
pub struct AssignmentResult {
    pub matching: Matching,
    pub fitness: f64,
    pub evaluation: Evaluation,
    pub baseline: Matching,
    pub baseline_fitness: f64,
    pub generations: usize,
    pub stop_reason: StopReason,
}

impl AssignmentResult {
    pub fn per_entity(&self) -> &[f64] {
        &self.evaluation.per_entity
    }
}

/// One assignment problem wired to its graph, scorer and solver.
pub struct AssignmentSession {
    pub config: Config,
    pub graph: Arc<CandidateGraph>,
    pub scorer: Arc<GlobalScorer>,
    pub matcher: SeedMatcher,
}

impl AssignmentSession {
    pub fn new(problem: &Problem, config: Config) -> SfResult<Self> {
        Self::with_solver(problem, config, Arc::new(HungarianSolver))
    }

    pub fn with_solver(
        problem: &Problem,
        config: Config,
        solver: Arc<dyn AssignmentSolver>,
    ) -> SfResult<Self> {
        config.validate()?;
        problem.validate()?;

        let graph = Arc::new(CandidateGraph::from_problem(problem, &config.weights)?);
        let scorer = Arc::new(GlobalScorer::new(graph.clone(), &config.weights));
        let matcher = SeedMatcher::new(graph.clone(), solver);

        info!(
            "Session ready: {} entities x {} peaks, padded to {}, {} edges",
            graph.real_entities,
            graph.real_peaks,
            graph.size(),
            graph.edges.len()
        );

        Ok(Self {
            config,
            graph,
            scorer,
            matcher,
        })
    }

    pub fn evaluate(&self, matching: &[usize]) -> Evaluation {
        self.scorer.evaluate(matching)
    }

    /// Unconstrained matching and its fitness.
    pub fn baseline(&self) -> SfResult<(Matching, f64)> {
        let matching = self.matcher.baseline()?;
        let fitness = self.scorer.fitness(&matching);
        info!(
            "Baseline: {}/{} entities assigned, fitness {:.5}",
            self.graph.assigned_count(&matching),
            self.graph.real_entities,
            fitness
        );
        Ok((matching, fitness))
    }

    pub fn explore(&self, baseline: &[usize], baseline_fitness: f64) -> Exploration {
        let explorer = MultiSeedExplorer::new(
            &self.matcher,
            &self.scorer,
            self.config.search.refine_retries,
        );
        let ranked = explorer.multi_match(baseline);
        let refined = explorer.refine(baseline_fitness, &ranked);
        info!(
            "Exploration: {} alternative seeds, refine {}",
            ranked.len(),
            match &refined {
                Some((_, f)) => format!("improved to {:.5}", f),
                None => "found no improvement".to_string(),
            }
        );
        Exploration { ranked, refined }
    }

    pub fn refine_evolutionary<CB: ProgressCallback + ?Sized>(
        &self,
        seeds: Vec<Matching>,
        callback: &CB,
    ) -> RefinementResult {
        let options = RefinerOptions::from(&self.config);
        let refiner = EvolutionaryRefiner::new(self.scorer.clone(), options);
        refiner.run(seeds, callback)
    }

    /// Baseline, exploration and evolutionary search as one blocking call.
    pub fn run<CB: ProgressCallback + ?Sized>(&self, callback: &CB) -> SfResult<AssignmentResult> {
        let (baseline, baseline_fitness) = self.baseline()?;

        let mut seeds = vec![baseline.clone()];
        if self.config.search.use_multi {
            let exploration = self.explore(&baseline, baseline_fitness);
            if let Some((matching, _)) = exploration.refined {
                seeds.push(matching);
            }
            seeds.extend(
                exploration
                    .ranked
                    .into_iter()
                    .take(self.config.search.multi_max_limit)
                    .map(|c| c.matching),
            );
        }

        let refined = self.refine_evolutionary(seeds, callback);
        let (matching, fitness) = if refined.fitness >= baseline_fitness {
            (refined.matching, refined.fitness)
        } else {
            (baseline.clone(), baseline_fitness)
        };
        let evaluation = self.scorer.evaluate(&matching);

        Ok(AssignmentResult {
            matching,
            fitness,
            evaluation,
            baseline,
            baseline_fitness,
            generations: refined.generations,
            stop_reason: refined.stop_reason,
        })
    }

    /// `(entity id, assigned peak id)` for every real entity.
    pub fn describe(&self, matching: &[usize]) -> Vec<(String, Option<String>)> {
        (0..self.graph.real_entities)
            .map(|e| {
                let peak = self
                    .graph
                    .assigned_peak(matching, e)
                    .map(|p| self.graph.peaks[p].id.clone());
                (self.graph.entities[e].id.clone(), peak)
            })
            .collect()
    }
}

/// Shared flag checked by the refiner at generation boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

impl ProgressCallback for CancelToken {
    fn on_progress(&self, _generation: usize, _best: f64, _mean: f64) -> bool {
        !self.is_cancelled()
    }
}

/// Runs the whole pipeline on a background thread.
///
/// Cancelling the token stops the evolutionary stage at the next generation boundary; the
/// handle still yields the best result found so far.
pub fn spawn_assignment(
    problem: Problem,
    config: Config,
) -> SfResult<(JoinHandle<SfResult<AssignmentResult>>, CancelToken)> {
    let token = CancelToken::new();
    let worker_token = token.clone();
    let handle = std::thread::Builder::new()
        .name("shiftforge-run".to_string())
        .spawn(move || {
            let session = AssignmentSession::new(&problem, config)?;
            session.run(&worker_token)
        })?;
    Ok((handle, token))
}
