use super::Chromosome;
use crate::core_types::invert;
use crate::graph::CandidateGraph;
use fastrand::Rng;

/// Global per-position mutation probability for a generation.
///
/// `base / (2 + generation * (len - 2) / (max_generations - 1))`, decreasing over the run.
pub fn scheduled_rate(
    base: f64,
    generation: usize,
    chromosome_len: usize,
    max_generations: usize,
) -> f64 {
    let span = max_generations.saturating_sub(1).max(1) as f64;
    let growth = chromosome_len.saturating_sub(2) as f64;
    base / (2.0 + generation as f64 * growth / span)
}

/// Per-edge adaptive rates, indexed like `CandidateGraph::edges`.
///
/// Kept out of the graph so the graph stays shared and read-only during a run.
#[derive(Debug, Clone)]
pub struct AdaptiveRates {
    rates: Vec<f64>,
    min_rate: f64,
    max_rate: f64,
    gamma: f64,
}

impl AdaptiveRates {
    pub fn new(graph: &CandidateGraph, min_rate: f64, max_rate: f64, gamma: f64) -> Self {
        let start = 0.5 * (min_rate + max_rate);
        Self {
            rates: vec![start; graph.edges.len()],
            min_rate,
            max_rate,
            gamma,
        }
    }

    #[inline]
    pub fn rate(&self, edge: usize) -> f64 {
        self.rates[edge]
    }

    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    /// Preference for moving a gene onto `edge`: edges whose carriers do well get
    /// a higher weight.
    #[inline]
    pub fn preference(&self, edge: usize) -> f64 {
        (self.max_rate + self.min_rate - self.rates[edge]).max(0.0)
    }

    /// Nudges every edge at the mutable positions from an evaluated population snapshot.
    ///
    /// An edge whose carriers average below the population mean drifts toward `max_rate`,
    /// otherwise toward `min_rate`. Edges nobody carries keep their rate.
    pub fn update(&mut self, graph: &CandidateGraph, mutable: &[usize], population: &[Chromosome]) {
        let scored: Vec<(&[usize], f64)> = population
            .iter()
            .filter_map(|c| c.fitness.map(|f| (c.genes.as_slice(), f)))
            .collect();
        if scored.is_empty() {
            return;
        }
        let mean = scored.iter().map(|(_, f)| f).sum::<f64>() / scored.len() as f64;

        for &pos in mutable {
            for &ei in &graph.by_entity[pos] {
                let peak = graph.edges[ei].peak;
                let (sum, count) = scored
                    .iter()
                    .filter(|(genes, _)| genes[pos] == peak)
                    .fold((0.0, 0usize), |(s, n), (_, f)| (s + f, n + 1));
                if count == 0 {
                    continue;
                }
                let step = if sum / (count as f64) < mean {
                    self.gamma
                } else {
                    -self.gamma
                };
                self.rates[ei] = (self.rates[ei] + step).clamp(self.min_rate, self.max_rate);
            }
        }
    }
}

fn pick_weighted(rng: &mut Rng, weights: &[(usize, f64)]) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }
    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    if total <= 0.0 || !total.is_finite() {
        return Some(weights[rng.usize(0..weights.len())].0);
    }
    let target = rng.f64() * total;
    let mut current = 0.0;
    for &(value, w) in weights {
        current += w;
        if current >= target {
            return Some(value);
        }
    }
    weights.last().map(|&(value, _)| value)
}

/// Constraint-aware swap mutation over the mutable positions.
///
/// Each position fires with probability `rate`. A firing position gets another of its
/// candidate peaks, weighted by the adaptive preference, and trades genes with the
/// position that held that peak, so the result stays a permutation. Returns the
/// number of swaps made.
pub fn mutate_adaptive(
    genes: &mut [usize],
    graph: &CandidateGraph,
    mutable: &[usize],
    rates: &AdaptiveRates,
    rate: f64,
    rng: &mut Rng,
) -> usize {
    let mut holder = invert(genes);
    let mut options: Vec<(usize, f64)> = Vec::new();
    let mut swaps = 0;

    for &pos in mutable {
        if rng.f64() >= rate {
            continue;
        }
        let current = genes[pos];
        options.clear();
        options.extend(
            graph.by_entity[pos]
                .iter()
                .map(|&ei| (graph.edges[ei].peak, rates.preference(ei)))
                .filter(|&(peak, _)| peak != current),
        );
        let Some(target) = pick_weighted(rng, &options) else {
            continue;
        };

        let other = holder[target];
        genes.swap(pos, other);
        holder[target] = pos;
        holder[current] = other;
        swaps += 1;
    }

    swaps
}
