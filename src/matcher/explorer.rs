use super::SeedMatcher;
use crate::core_types::{Matching, Requirement};
use crate::scorer::GlobalScorer;
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::{debug, warn};

/// A seed matching obtained by forcing `entity` onto `peak`.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedCandidate {
    pub peak: usize,
    pub entity: usize,
    pub fitness: f64,
    pub matching: Matching,
}

/// Looks for materially different high-quality seeds by forcing pairs the baseline
/// did not choose, alone and in non-conflicting combinations.
pub struct MultiSeedExplorer<'a> {
    matcher: &'a SeedMatcher,
    scorer: &'a GlobalScorer,
    max_retries: usize,
}

impl<'a> MultiSeedExplorer<'a> {
    pub fn new(matcher: &'a SeedMatcher, scorer: &'a GlobalScorer, max_retries: usize) -> Self {
        Self {
            matcher,
            scorer,
            max_retries,
        }
    }

    /// Forces every alternative pair on contested peaks and ranks the complete results,
    /// best fitness first.
    pub fn multi_match(&self, baseline: &[usize]) -> Vec<SeedCandidate> {
        let graph = &*self.matcher.graph;

        let mut pairs = Vec::new();
        for peak in 0..graph.real_peaks {
            if graph.by_peak[peak].len() < 2 {
                continue;
            }
            for &ei in &graph.by_peak[peak] {
                let entity = graph.edges[ei].entity;
                if baseline.get(entity) != Some(&peak) {
                    pairs.push((peak, entity));
                }
            }
        }

        let mut ranked: Vec<SeedCandidate> = pairs
            .par_iter()
            .filter_map(|&(peak, entity)| {
                let mut requirement: Requirement = vec![None; graph.size()];
                requirement[entity] = Some(peak);
                match self.matcher.solve(Some(requirement.as_slice())) {
                    Ok(matching) if graph.is_complete(&matching) => {
                        let fitness = self.scorer.fitness(&matching);
                        Some(SeedCandidate {
                            peak,
                            entity,
                            fitness,
                            matching,
                        })
                    }
                    Ok(_) => None,
                    Err(e) => {
                        warn!("Skipping forced pair ({}, {}): {}", entity, peak, e);
                        None
                    }
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.fitness
                .total_cmp(&a.fitness)
                .then(a.peak.cmp(&b.peak))
                .then(a.entity.cmp(&b.entity))
        });

        debug!(
            "Multi-seed: {} forced pairs tried, {} feasible",
            pairs.len(),
            ranked.len()
        );
        ranked
    }

    /// Greedily stacks the best mutually compatible forced pairs, growing the stack while
    /// fitness keeps improving. Returns the best matching only if it beats `baseline_fitness`.
    pub fn refine(
        &self,
        baseline_fitness: f64,
        ranked: &[SeedCandidate],
    ) -> Option<(Matching, f64)> {
        let graph = &*self.matcher.graph;
        let mut best: Option<(Matching, f64)> = None;
        let mut best_fitness = baseline_fitness;
        let mut known_bad: HashSet<(usize, usize)> = HashSet::new();

        let max_try = ranked.len() / 4;
        let mut i_try = 0;
        let mut retries = 0;

        while i_try <= max_try {
            let wanted = i_try + 1;
            let mut requirement: Requirement = vec![None; graph.size()];
            let mut used_peaks = HashSet::new();
            let mut used_entities = HashSet::new();
            let mut chosen = Vec::with_capacity(wanted);

            for cand in ranked {
                if chosen.len() == wanted {
                    break;
                }
                if known_bad.contains(&(cand.peak, cand.entity))
                    || used_peaks.contains(&cand.peak)
                    || used_entities.contains(&cand.entity)
                {
                    continue;
                }
                used_peaks.insert(cand.peak);
                used_entities.insert(cand.entity);
                requirement[cand.entity] = Some(cand.peak);
                chosen.push((cand.peak, cand.entity));
            }

            let Some(&newest) = chosen.last() else {
                break;
            };
            if chosen.len() < wanted {
                break;
            }

            let improved = match self.matcher.solve(Some(requirement.as_slice())) {
                Ok(matching) if graph.is_complete(&matching) => {
                    let fitness = self.scorer.fitness(&matching);
                    if fitness > best_fitness {
                        debug!(
                            "Refine: {} forced pairs -> fitness {:.5}",
                            chosen.len(),
                            fitness
                        );
                        best_fitness = fitness;
                        best = Some((matching, fitness));
                        true
                    } else {
                        false
                    }
                }
                Ok(_) => false,
                Err(e) => {
                    warn!("Refine solve failed, skipping combination: {}", e);
                    false
                }
            };

            if improved {
                i_try += 1;
                retries = 0;
            } else {
                known_bad.insert(newest);
                retries += 1;
                if retries > self.max_retries {
                    break;
                }
            }
        }

        best
    }
}
