pub mod accumulator;
pub mod quality;

use self::accumulator::ShiftAccumulator;
use self::quality::QualityScale;
use crate::config::ScoringWeights;
use crate::consts::UNASSIGNED_TOTAL;
use crate::graph::CandidateGraph;
use std::sync::Arc;

/// Score breakdown for one atom under one matching.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AtomScore {
    pub count: usize,
    pub average: f64,
    pub quality_pred: f64,
    pub quality_multi: f64,
    pub total: f64,
    pub norm: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub fitness: f64,
    /// One value per real entity; feedback for the adaptive mutation, not used for selection.
    pub per_entity: Vec<f64>,
    /// Indexed like `CandidateGraph::atoms`. Atoms no real entity references stay default.
    pub atoms: Vec<AtomScore>,
}

/// Reduces a complete matching to a scalar fitness by pooling every assigned peak value
/// onto its atoms and measuring prediction agreement and self-consistency.
pub struct GlobalScorer {
    pub graph: Arc<CandidateGraph>,
    pub weight_pred: f64,
    pub weight_multi: f64,
    pub scale: QualityScale,
    participating: Vec<usize>,
}

impl GlobalScorer {
    pub fn new(graph: Arc<CandidateGraph>, weights: &ScoringWeights) -> Self {
        let mut participating: Vec<usize> = graph.entities[..graph.real_entities]
            .iter()
            .flat_map(|e| e.atoms.iter().flatten().copied())
            .collect();
        participating.sort_unstable();
        participating.dedup();

        Self {
            graph,
            weight_pred: weights.weight_pred,
            weight_multi: weights.weight_multi,
            scale: QualityScale::new(weights.reference_deviation),
            participating,
        }
    }

    /// Fresh per-evaluation accumulator arena, one slot per atom.
    pub fn scratch(&self) -> Vec<ShiftAccumulator> {
        vec![ShiftAccumulator::new(self.graph.settings); self.graph.atoms.len()]
    }

    pub fn evaluate(&self, matching: &[usize]) -> Evaluation {
        let mut scratch = self.scratch();
        self.evaluate_with(matching, &mut scratch)
    }

    pub fn fitness(&self, matching: &[usize]) -> f64 {
        self.evaluate(matching).fitness
    }

    /// Same as [`evaluate`](Self::evaluate) but reuses a caller-owned arena.
    pub fn evaluate_with(&self, matching: &[usize], scratch: &mut [ShiftAccumulator]) -> Evaluation {
        let graph = &*self.graph;
        for acc in scratch.iter_mut() {
            acc.clear();
        }

        for e in 0..graph.real_entities {
            let Some(p) = graph.assigned_peak(matching, e) else {
                continue;
            };
            let peak = &graph.peaks[p];
            for (dim, slot) in graph.entities[e].atoms.iter().enumerate() {
                if let (Some(atom), Some(pd)) = (slot, peak.dims.get(dim)) {
                    scratch[*atom].add_value(pd.value, pd.tolerance);
                }
            }
        }

        let mut atoms = vec![AtomScore::default(); graph.atoms.len()];
        let mut sum_total = 0.0;
        let mut sum_norm = 0.0;

        for &a in &self.participating {
            let score = self.atom_score(a, &scratch[a]);
            sum_total += score.total;
            sum_norm += score.norm;
            atoms[a] = score;
        }

        let mut per_entity = Vec::with_capacity(graph.real_entities);
        let mut seen = Vec::new();
        for entity in &graph.entities[..graph.real_entities] {
            seen.clear();
            let (mut total, mut norm) = (0.0, 0.0);
            for &a in entity.atoms.iter().flatten() {
                if !seen.contains(&a) {
                    seen.push(a);
                    total += atoms[a].total;
                    norm += atoms[a].norm;
                }
            }
            if seen.is_empty() {
                // structurally empty rows can never be assigned
                total = UNASSIGNED_TOTAL;
                norm = self.weight_pred;
                sum_total += total;
                sum_norm += norm;
            }
            per_entity.push(ratio(total, norm));
        }

        Evaluation {
            fitness: ratio(sum_total, sum_norm),
            per_entity,
            atoms,
        }
    }

    fn atom_score(&self, atom: usize, acc: &ShiftAccumulator) -> AtomScore {
        if acc.is_empty() {
            return AtomScore {
                total: UNASSIGNED_TOTAL,
                norm: self.weight_pred,
                ..Default::default()
            };
        }
        let predicted = &self.graph.atoms[atom];
        let quality_pred = acc.quality_vs_predicted(predicted.value, predicted.sigma, &self.scale);
        let quality_multi = acc.quality_of_consistency(&self.scale);
        AtomScore {
            count: acc.count(),
            average: acc.average(),
            quality_pred,
            quality_multi,
            total: self.weight_pred * quality_pred + self.weight_multi * quality_multi,
            norm: self.weight_pred + self.weight_multi * acc.count() as f64,
        }
    }
}

#[inline]
fn ratio(total: f64, norm: f64) -> f64 {
    if norm > 0.0 && total.is_finite() {
        total / norm
    } else {
        UNASSIGNED_TOTAL
    }
}
