use crate::core_types::Matching;
use crate::graph::CandidateGraph;
use fastrand::Rng;
use std::collections::HashSet;

/// Random matching biased toward feasibility.
///
/// Unambiguous entities take their only candidate first, the remaining real entities draw
/// from their still-unused candidates in random order, and whatever rows are left get the
/// leftover peaks shuffled.
pub fn generate_random_matching(graph: &CandidateGraph, rng: &mut Rng) -> Matching {
    let n = graph.size();
    let mut genes: Vec<Option<usize>> = vec![None; n];
    let mut used_peaks = HashSet::new();

    for (e, gene) in genes.iter_mut().enumerate().take(graph.real_entities) {
        if graph.candidate_count(e) == 1 {
            let peak = graph.edges[graph.by_entity[e][0]].peak;
            if used_peaks.insert(peak) {
                *gene = Some(peak);
            }
        }
    }

    let mut ambiguous: Vec<usize> = (0..graph.real_entities)
        .filter(|&e| graph.candidate_count(e) > 1)
        .collect();
    rng.shuffle(&mut ambiguous);

    let mut open = Vec::new();
    for e in ambiguous {
        open.clear();
        open.extend(
            graph
                .candidates(e)
                .map(|edge| edge.peak)
                .filter(|p| !used_peaks.contains(p)),
        );
        if open.is_empty() {
            continue;
        }
        let peak = open[rng.usize(0..open.len())];
        used_peaks.insert(peak);
        genes[e] = Some(peak);
    }

    let mut free: Vec<usize> = (0..n).filter(|p| !used_peaks.contains(p)).collect();
    rng.shuffle(&mut free);
    let mut free = free.into_iter();

    genes
        .into_iter()
        .map(|g| g.or_else(|| free.next()).unwrap_or_default())
        .collect()
}
