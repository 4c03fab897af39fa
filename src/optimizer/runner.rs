use super::crossover::crossover_pmx;
use super::initialization::generate_random_matching;
use super::mutation::{mutate_adaptive, scheduled_rate, AdaptiveRates};
use super::selection::{sort_by_fitness, tournament};
use super::Chromosome;
use crate::config::Config;
use crate::core_types::{is_permutation, Matching};
use crate::scorer::GlobalScorer;
use rayon::prelude::*;
use std::sync::Arc;
use strum_macros::Display;
use tracing::{debug, info, warn};

pub struct RefinerOptions {
    pub population_size: usize,
    pub max_generations: usize,
    pub steady_generations: usize,
    pub elite_number: usize,
    pub tournament_size: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    pub gamma: f64,
    pub min_rate: f64,
    pub max_rate: f64,
    pub target_fitness: Option<f64>,
    pub seed: Option<u64>,
}

impl From<&Config> for RefinerOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            population_size: cfg.search.population_size,
            max_generations: cfg.search.max_generations,
            steady_generations: cfg.search.steady_generations(),
            elite_number: cfg.search.elite_number,
            tournament_size: cfg.search.tournament_size,
            crossover_rate: cfg.search.crossover_rate,
            mutation_rate: cfg.search.mutation_rate,
            gamma: cfg.search.gamma,
            min_rate: cfg.search.min_rate,
            max_rate: cfg.search.max_rate,
            target_fitness: cfg.search.target_fitness,
            seed: cfg.search.seed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum StopReason {
    MaxGenerations,
    SteadyFitness,
    TargetReached,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct RefinementResult {
    pub matching: Matching,
    pub fitness: f64,
    pub generations: usize,
    pub stop_reason: StopReason,
}

/// A trait for receiving updates once per generation.
/// Boolean return value indicates if the search should continue (true) or abort (false).
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, generation: usize, best_fitness: f64, mean_fitness: f64) -> bool;
}

/// Callback that never stops the search.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_progress(&self, _generation: usize, _best: f64, _mean: f64) -> bool {
        true
    }
}

/// Population search over permutations, seeded with externally produced matchings.
pub struct EvolutionaryRefiner {
    scorer: Arc<GlobalScorer>,
    options: RefinerOptions,
}

impl EvolutionaryRefiner {
    pub fn new(scorer: Arc<GlobalScorer>, options: RefinerOptions) -> Self {
        Self { scorer, options }
    }

    pub fn options(&self) -> &RefinerOptions {
        &self.options
    }

    /// Runs generations until a stop condition fires. The returned best is tracked across
    /// the whole run, so it never falls below the best evaluated seed.
    pub fn run<CB: ProgressCallback + ?Sized>(
        &self,
        seeds: Vec<Matching>,
        callback: &CB,
    ) -> RefinementResult {
        let opts = &self.options;
        let graph = &*self.scorer.graph;
        let size = graph.size();
        let pop_size = opts.population_size.max(2);
        let elites = opts.elite_number.min(pop_size - 1);

        let mut rng = if let Some(s) = opts.seed {
            fastrand::Rng::with_seed(s)
        } else {
            fastrand::Rng::new()
        };

        // 1. Seed population
        let mut population: Vec<Chromosome> = Vec::with_capacity(pop_size);
        for seed in seeds {
            if population.len() == pop_size {
                break;
            }
            if seed.len() != size || !is_permutation(&seed) {
                warn!("Dropping malformed seed of length {}", seed.len());
                continue;
            }
            population.push(Chromosome::from_matching(seed));
        }
        let seeded = population.len();
        while population.len() < pop_size {
            population.push(Chromosome::from_matching(generate_random_matching(
                graph, &mut rng,
            )));
        }
        self.evaluate(&mut population);
        sort_by_fitness(&mut population);

        let mut best = population[0].clone();
        info!(
            "Refiner: {} seeds + {} random, initial best {:.5}",
            seeded,
            pop_size - seeded,
            best.score()
        );

        let mutable = graph.mutable_positions();
        let mut rates = AdaptiveRates::new(graph, opts.min_rate, opts.max_rate, opts.gamma);
        let mut generation = 0;
        let mut steady = 0;

        // 2. Generations
        let stop_reason = loop {
            if let Some(target) = opts.target_fitness {
                if best.score() > target {
                    break StopReason::TargetReached;
                }
            }
            if generation >= opts.max_generations {
                break StopReason::MaxGenerations;
            }
            if steady > opts.steady_generations {
                break StopReason::SteadyFitness;
            }

            let mean = population.iter().map(Chromosome::score).sum::<f64>() / pop_size as f64;
            if !callback.on_progress(generation, best.score(), mean) {
                break StopReason::Cancelled;
            }

            // A. Adaptive rates from the evaluated snapshot
            rates.update(graph, &mutable, &population);
            let rate = scheduled_rate(opts.mutation_rate, generation, size, opts.max_generations);

            // B. Breed
            let mut next = self.breed(&population, elites, &mutable, &rates, rate, &mut rng);

            // C. Evaluate and track
            self.evaluate(&mut next);
            sort_by_fitness(&mut next);
            population = next;
            generation += 1;

            if population[0].score() > best.score() {
                best = population[0].clone();
                steady = 0;
                debug!("Gen {}: new best {:.5}", generation, best.score());
            } else {
                steady += 1;
            }
        };

        info!(
            "Refiner stopped ({}) after {} generations, best {:.5}",
            stop_reason,
            generation,
            best.score()
        );

        RefinementResult {
            fitness: best.score(),
            matching: best.into_matching(),
            generations: generation,
            stop_reason,
        }
    }

    /// Next generation from a population sorted best first: the top `elites` are carried
    /// over unchanged, the rest are bred from tournament winners.
    fn breed(
        &self,
        population: &[Chromosome],
        elites: usize,
        mutable: &[usize],
        rates: &AdaptiveRates,
        rate: f64,
        rng: &mut fastrand::Rng,
    ) -> Vec<Chromosome> {
        let opts = &self.options;
        let graph = &*self.scorer.graph;
        let mut next: Vec<Chromosome> = population[..elites.min(population.len())].to_vec();
        while next.len() < population.len() {
            let parent = tournament(population, opts.tournament_size, rng);
            let mut genes = if rng.f64() < opts.crossover_rate {
                let other = tournament(population, opts.tournament_size, rng);
                crossover_pmx(&parent.genes, &other.genes, rng)
            } else {
                parent.genes.clone()
            };
            mutate_adaptive(&mut genes, graph, mutable, rates, rate, rng);

            if genes == parent.genes {
                next.push(parent.clone());
            } else {
                next.push(Chromosome::from_matching(genes));
            }
        }
        next
    }

    /// Scores every unevaluated member in parallel, one accumulator arena per worker.
    fn evaluate(&self, population: &mut [Chromosome]) {
        let scorer = &*self.scorer;
        let fitness: Vec<f64> = population
            .par_iter()
            .map_init(
                || scorer.scratch(),
                |scratch, c| match c.fitness {
                    Some(f) => f,
                    None => scorer.evaluate_with(&c.genes, scratch).fitness,
                },
            )
            .collect();
        for (c, f) in population.iter_mut().zip(fitness) {
            c.fitness = Some(f);
        }
    }
}
