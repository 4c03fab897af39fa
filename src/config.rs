use crate::consts::{
    DEFAULT_MISSING_VALUE, DEFAULT_PROB_FLOOR, DEFAULT_REFERENCE_DEVIATION,
    DEFAULT_REJECT_FACTOR, DEFAULT_SPREAD_FACTOR,
};
use crate::error::{SfResult, ShiftForgeError};
use clap::{parser::ValueSource, ArgAction, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    #[command(flatten)]
    pub search: SearchParams,
    #[command(flatten)]
    pub weights: ScoringWeights,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    // === POPULATION ===
    #[arg(long, default_value_t = 64)]
    pub population_size: usize,
    #[arg(long, default_value_t = 500)]
    pub max_generations: usize,
    /// Stop once the best fitness has been flat for this fraction of max_generations.
    #[arg(long, default_value_t = 0.1)]
    pub steady_fraction: f64,
    #[arg(long, default_value_t = 2)]
    pub elite_number: usize,
    #[arg(long, default_value_t = 2)]
    pub tournament_size: usize,
    #[arg(long, allow_negative_numbers = true)]
    pub target_fitness: Option<f64>,

    // === OPERATORS ===
    #[arg(long, default_value_t = 0.6)]
    pub crossover_rate: f64,
    /// Numerator of the decaying global mutation schedule.
    #[arg(long, default_value_t = 0.1)]
    pub mutation_rate: f64,

    // === ADAPTIVE EDGE RATES ===
    #[arg(long, default_value_t = 0.05)]
    pub gamma: f64,
    #[arg(long, default_value_t = 0.01)]
    pub min_rate: f64,
    #[arg(long, default_value_t = 0.5)]
    pub max_rate: f64,

    // === SEEDING ===
    #[arg(long, default_value_t = 10)]
    pub multi_max_limit: usize,
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub use_multi: bool,
    #[arg(long, default_value_t = 8)]
    pub refine_retries: usize,

    #[arg(long)]
    pub seed: Option<u64>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            population_size: 64,
            max_generations: 500,
            steady_fraction: 0.1,
            elite_number: 2,
            tournament_size: 2,
            target_fitness: None,
            crossover_rate: 0.6,
            mutation_rate: 0.1,
            gamma: 0.05,
            min_rate: 0.01,
            max_rate: 0.5,
            multi_max_limit: 10,
            use_multi: true,
            refine_retries: 8,
            seed: None,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    // === FITNESS BLEND ===
    #[arg(long, default_value_t = 1.0)]
    pub weight_pred: f64,
    #[arg(long, default_value_t = 2.0)]
    pub weight_multi: f64,

    // === ACCUMULATOR ===
    #[arg(long, default_value_t = DEFAULT_REJECT_FACTOR)]
    pub reject_factor: f64,
    #[arg(long, default_value_t = DEFAULT_SPREAD_FACTOR)]
    pub spread_factor: f64,
    #[arg(long, default_value_t = DEFAULT_REFERENCE_DEVIATION)]
    pub reference_deviation: f64,
    #[arg(long, default_value_t = DEFAULT_MISSING_VALUE, allow_negative_numbers = true)]
    pub missing_value: f64,

    // === CANDIDATE GRAPH ===
    #[arg(long, default_value_t = DEFAULT_PROB_FLOOR)]
    pub prob_floor: f64,
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub use_context: bool,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            weight_pred: 1.0,
            weight_multi: 2.0,
            reject_factor: DEFAULT_REJECT_FACTOR,
            spread_factor: DEFAULT_SPREAD_FACTOR,
            reference_deviation: DEFAULT_REFERENCE_DEVIATION,
            missing_value: DEFAULT_MISSING_VALUE,
            prob_floor: DEFAULT_PROB_FLOOR,
            use_context: true,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> SfResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Rejects knob combinations the search cannot run with.
    pub fn validate(&self) -> SfResult<()> {
        let s = &self.search;
        if s.population_size < 2 {
            return Err(ShiftForgeError::Config(format!(
                "population_size must be at least 2 (got {})",
                s.population_size
            )));
        }
        if s.elite_number >= s.population_size {
            return Err(ShiftForgeError::Config(format!(
                "elite_number ({}) must be smaller than population_size ({})",
                s.elite_number, s.population_size
            )));
        }
        if s.max_generations == 0 {
            return Err(ShiftForgeError::Config(
                "max_generations must be positive".to_string(),
            ));
        }
        if s.tournament_size == 0 {
            return Err(ShiftForgeError::Config(
                "tournament_size must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("crossover_rate", s.crossover_rate),
            ("mutation_rate", s.mutation_rate),
            ("min_rate", s.min_rate),
            ("max_rate", s.max_rate),
            ("steady_fraction", s.steady_fraction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ShiftForgeError::Config(format!(
                    "{} must lie in [0, 1] (got {})",
                    name, value
                )));
            }
        }
        if s.min_rate > s.max_rate {
            return Err(ShiftForgeError::Config(format!(
                "min_rate ({}) exceeds max_rate ({})",
                s.min_rate, s.max_rate
            )));
        }

        let w = &self.weights;
        if w.reference_deviation <= 0.0 || w.spread_factor < 1.0 {
            return Err(ShiftForgeError::Config(
                "reference_deviation must be positive and spread_factor at least 1".to_string(),
            ));
        }
        if w.weight_pred < 0.0 || w.weight_multi < 0.0 {
            return Err(ShiftForgeError::Config(
                "fitness weights must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn merge_from_cli(&mut self, cli: &Config, matches: &ArgMatches) {
        self.search.merge_from_cli(&cli.search, matches);
        self.weights.merge_from_cli(&cli.weights, matches);
    }
}

impl SearchParams {
    /// Number of flat generations tolerated before the steady-fitness cutoff fires.
    pub fn steady_generations(&self) -> usize {
        (self.steady_fraction * self.max_generations as f64) as usize
    }

    pub fn merge_from_cli(&mut self, cli: &SearchParams, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($field:ident, $arg_name:expr) => {
                if matches.value_source($arg_name) == Some(ValueSource::CommandLine) {
                    self.$field = cli.$field.clone();
                }
            };
        }

        update_if_present!(population_size, "population_size");
        update_if_present!(max_generations, "max_generations");
        update_if_present!(steady_fraction, "steady_fraction");
        update_if_present!(elite_number, "elite_number");
        update_if_present!(tournament_size, "tournament_size");
        update_if_present!(target_fitness, "target_fitness");

        update_if_present!(crossover_rate, "crossover_rate");
        update_if_present!(mutation_rate, "mutation_rate");

        update_if_present!(gamma, "gamma");
        update_if_present!(min_rate, "min_rate");
        update_if_present!(max_rate, "max_rate");

        update_if_present!(multi_max_limit, "multi_max_limit");
        update_if_present!(use_multi, "use_multi");
        update_if_present!(refine_retries, "refine_retries");
        update_if_present!(seed, "seed");
    }
}

impl ScoringWeights {
    pub fn merge_from_cli(&mut self, cli: &ScoringWeights, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($field:ident, $arg_name:expr) => {
                if matches.value_source($arg_name) == Some(ValueSource::CommandLine) {
                    self.$field = cli.$field;
                }
            };
        }

        update_if_present!(weight_pred, "weight_pred");
        update_if_present!(weight_multi, "weight_multi");
        update_if_present!(reject_factor, "reject_factor");
        update_if_present!(spread_factor, "spread_factor");
        update_if_present!(reference_deviation, "reference_deviation");
        update_if_present!(missing_value, "missing_value");
        update_if_present!(prob_floor, "prob_floor");
        update_if_present!(use_context, "use_context");
    }
}
