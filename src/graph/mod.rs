pub mod context;

pub use self::context::{DimensionOverlap, OverlapTest, Side};

use self::context::context_bonus;
use crate::config::ScoringWeights;
use crate::consts::PADDING_WEIGHT;
use crate::error::{SfResult, ShiftForgeError};
use crate::model::{Atom, PeakDim, Problem};
use crate::scorer::accumulator::{AccumulatorSettings, ShiftAccumulator};
use std::collections::HashMap;
use tracing::debug;
use typed_builder::TypedBuilder;

/// Matching row. Holds one atom index per dimension; padding rows hold none.
#[derive(Debug, Clone)]
pub struct EntityNode {
    pub index: usize,
    pub id: String,
    pub atoms: Vec<Option<usize>>,
    pub prev: Option<usize>,
    pub next: Option<usize>,
    pub padding: bool,
}

impl EntityNode {
    pub fn present_dims(&self) -> usize {
        self.atoms.iter().filter(|a| a.is_some()).count()
    }
}

/// Matching column. Padding columns carry no dimensions.
#[derive(Debug, Clone)]
pub struct PeakNode {
    pub index: usize,
    pub id: String,
    pub dims: Vec<PeakDim>,
    pub padding: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateEdge {
    pub entity: usize,
    pub peak: usize,
    pub raw: f64,
    pub context: f64,
}

/// Admissible (entity, peak) pairs for one problem, padded to a square index space.
#[derive(Debug, Clone)]
pub struct CandidateGraph {
    pub atoms: Vec<Atom>,
    pub entities: Vec<EntityNode>,
    pub peaks: Vec<PeakNode>,
    pub real_entities: usize,
    pub real_peaks: usize,
    pub edges: Vec<CandidateEdge>,
    pub by_entity: Vec<Vec<usize>>,
    pub by_peak: Vec<Vec<usize>>,
    pub settings: AccumulatorSettings,
    pub prob_floor: f64,
    lookup: HashMap<(usize, usize), usize>,
}

#[derive(TypedBuilder)]
pub struct GraphBuildParams<'a> {
    pub problem: &'a Problem,
    #[builder(default)]
    pub weights: ScoringWeights,
    #[builder(default, setter(strip_option))]
    pub overlap: Option<&'a dyn OverlapTest>,
}

impl GraphBuildParams<'_> {
    pub fn build_graph(self) -> SfResult<CandidateGraph> {
        let problem = self.problem;
        let weights = self.weights;

        let atom_ids = problem.atom_index();
        let entity_ids = problem.entity_index();
        let dims = problem.dim_count();

        let real_entities = problem.entities.len();
        let real_peaks = problem.peaks.len();
        let size = real_entities.max(real_peaks);

        let mut entities = Vec::with_capacity(size);
        for (index, def) in problem.entities.iter().enumerate() {
            let mut atoms = Vec::with_capacity(dims);
            for slot in &def.atoms {
                match slot {
                    Some(id) => {
                        let idx = atom_ids.get(id.as_str()).copied().ok_or_else(|| {
                            ShiftForgeError::Validation(format!(
                                "Entity '{}' references unknown atom '{}'",
                                def.id, id
                            ))
                        })?;
                        atoms.push(Some(idx));
                    }
                    None => atoms.push(None),
                }
            }
            let resolve = |n: &Option<String>| n.as_deref().and_then(|id| entity_ids.get(id).copied());
            entities.push(EntityNode {
                index,
                id: def.id.clone(),
                atoms,
                prev: resolve(&def.prev),
                next: resolve(&def.next),
                padding: false,
            });
        }
        for index in real_entities..size {
            entities.push(EntityNode {
                index,
                id: format!("_pad_e{}", index),
                atoms: vec![None; dims],
                prev: None,
                next: None,
                padding: true,
            });
        }

        let mut peaks = Vec::with_capacity(size);
        for (index, peak) in problem.peaks.iter().enumerate() {
            if peak.dims.len() != dims {
                return Err(ShiftForgeError::Validation(format!(
                    "Peak '{}' has {} dimensions, expected {}",
                    peak.id,
                    peak.dims.len(),
                    dims
                )));
            }
            peaks.push(PeakNode {
                index,
                id: peak.id.clone(),
                dims: peak.dims.clone(),
                padding: false,
            });
        }
        for index in real_peaks..size {
            peaks.push(PeakNode {
                index,
                id: format!("_pad_p{}", index),
                dims: Vec::new(),
                padding: true,
            });
        }

        let mut graph = CandidateGraph {
            atoms: problem.atoms.clone(),
            entities,
            peaks,
            real_entities,
            real_peaks,
            edges: Vec::new(),
            by_entity: vec![Vec::new(); size],
            by_peak: vec![Vec::new(); size],
            settings: AccumulatorSettings::from(&weights),
            prob_floor: weights.prob_floor,
            lookup: HashMap::new(),
        };

        for e in 0..real_entities {
            for p in 0..real_peaks {
                let raw = graph.compatibility(e, p);
                if raw >= graph.prob_floor && raw > 0.0 {
                    let idx = graph.edges.len();
                    graph.edges.push(CandidateEdge {
                        entity: e,
                        peak: p,
                        raw,
                        context: raw,
                    });
                    graph.by_entity[e].push(idx);
                    graph.by_peak[p].push(idx);
                    graph.lookup.insert((e, p), idx);
                }
            }
        }

        if weights.use_context {
            if let Some(test) = self.overlap {
                graph.contextualize(test);
            }
        }

        debug!(
            "Candidate graph: {} entities, {} peaks, padded to {}, {} edges",
            real_entities,
            real_peaks,
            size,
            graph.edges.len()
        );

        Ok(graph)
    }
}

impl CandidateGraph {
    /// Builds the graph for a problem, wiring the problem's overlap pairs into the
    /// default [`DimensionOverlap`] test.
    pub fn from_problem(problem: &Problem, weights: &ScoringWeights) -> SfResult<Self> {
        let overlap = DimensionOverlap::new(problem.overlap.clone());
        GraphBuildParams::builder()
            .problem(problem)
            .weights(weights.clone())
            .overlap(&overlap as &dyn OverlapTest)
            .build()
            .build_graph()
    }

    /// Side length of the padded square index space.
    pub fn size(&self) -> usize {
        self.entities.len()
    }

    /// Product of per-dimension tail probabilities over the structurally present
    /// dimensions, using each atom's prediction as the estimate.
    pub fn compatibility(&self, entity: usize, peak: usize) -> f64 {
        let (Some(e), Some(p)) = (self.entities.get(entity), self.peaks.get(peak)) else {
            return 0.0;
        };
        if e.padding || p.padding {
            return 0.0;
        }
        let probe = ShiftAccumulator::new(self.settings);
        let mut prob = 1.0;
        let mut evaluated = 0;
        for (dim, slot) in e.atoms.iter().enumerate() {
            let Some(atom_idx) = slot else { continue };
            let Some(pd) = p.dims.get(dim) else { continue };
            if pd.value.is_nan() || pd.value == self.settings.missing_value {
                continue;
            }
            let atom = &self.atoms[*atom_idx];
            prob *= probe.get_prob(pd.value, pd.tolerance, atom.value, atom.sigma);
            evaluated += 1;
        }
        if evaluated == 0 || prob < self.prob_floor {
            0.0
        } else {
            prob
        }
    }

    /// Recomputes every context score from the chain neighbours' candidate sets.
    pub fn contextualize(&mut self, test: &dyn OverlapTest) {
        let mut updated = Vec::with_capacity(self.edges.len());
        for edge in &self.edges {
            let entity = &self.entities[edge.entity];
            let peak = &self.peaks[edge.peak];

            let side_ok = |neighbour: Option<usize>, side: Side| -> bool {
                neighbour.is_some_and(|n| {
                    self.by_entity[n]
                        .iter()
                        .any(|&ei| test.consistent(peak, &self.peaks[self.edges[ei].peak], side))
                })
            };

            let bonus = context_bonus(
                entity.prev.is_some(),
                side_ok(entity.prev, Side::Prev),
                entity.next.is_some(),
                side_ok(entity.next, Side::Next),
            );
            updated.push(edge.raw + bonus);
        }
        for (edge, context) in self.edges.iter_mut().zip(updated) {
            edge.context = context;
        }
    }

    pub fn edge(&self, entity: usize, peak: usize) -> Option<&CandidateEdge> {
        self.lookup.get(&(entity, peak)).map(|&i| &self.edges[i])
    }

    pub fn edge_index(&self, entity: usize, peak: usize) -> Option<usize> {
        self.lookup.get(&(entity, peak)).copied()
    }

    pub fn candidates(&self, entity: usize) -> impl Iterator<Item = &CandidateEdge> + '_ {
        self.by_entity
            .get(entity)
            .into_iter()
            .flatten()
            .map(move |&i| &self.edges[i])
    }

    pub fn candidate_count(&self, entity: usize) -> usize {
        self.by_entity.get(entity).map_or(0, Vec::len)
    }

    /// An entity is mutable when it has more than one compatible peak.
    pub fn is_mutable(&self, entity: usize) -> bool {
        self.candidate_count(entity) > 1
    }

    /// Real peak held by `entity` in `matching`, if that pair is admissible.
    pub fn assigned_peak(&self, matching: &[usize], entity: usize) -> Option<usize> {
        if entity >= self.real_entities {
            return None;
        }
        let peak = *matching.get(entity)?;
        self.edge_index(entity, peak).map(|_| peak)
    }

    /// Number of real entities that hold an admissible peak.
    pub fn assigned_count(&self, matching: &[usize]) -> usize {
        (0..self.real_entities)
            .filter(|&e| self.assigned_peak(matching, e).is_some())
            .count()
    }

    /// True when every real entity that has any candidate holds one of them.
    pub fn is_complete(&self, matching: &[usize]) -> bool {
        (0..self.real_entities)
            .all(|e| self.candidate_count(e) == 0 || self.assigned_peak(matching, e).is_some())
    }

    pub fn mutable_positions(&self) -> Vec<usize> {
        (0..self.real_entities)
            .filter(|&e| self.is_mutable(e))
            .collect()
    }

    /// Solver weight of a cell: the context score for admissible pairs, a token weight for
    /// padding pairs that keeps the square problem feasible, zero otherwise.
    pub fn weight(&self, entity: usize, peak: usize) -> f64 {
        if let Some(edge) = self.edge(entity, peak) {
            return edge.context;
        }
        let e_pad = self.entities[entity].padding;
        let p_pad = self.peaks[peak].padding;
        if (e_pad && p_pad) || ((e_pad || p_pad) && entity == peak) {
            PADDING_WEIGHT
        } else {
            0.0
        }
    }
}
