use super::PeakNode;
use strum_macros::Display;

/// Which neighbour of a chain entity is being inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Side {
    Prev,
    Next,
}

/// Decides whether a peak assigned to an entity is consistent with a candidate peak of
/// one of its chain neighbours.
pub trait OverlapTest: Send + Sync {
    fn consistent(&self, peak: &PeakNode, neighbour: &PeakNode, side: Side) -> bool;
}

/// Neighbour consistency through shared dimensions.
///
/// Each pair `(a, b)` says dimension `a` of a peak measures the same atom as dimension `b`
/// of the peak of its *previous* neighbour (for example the i-1 carbon seen in both an
/// HNCA-type and an HN(CO)CA-type dimension). For the next neighbour the roles swap.
#[derive(Debug, Clone, Default)]
pub struct DimensionOverlap {
    pub pairs: Vec<(usize, usize)>,
}

impl DimensionOverlap {
    pub fn new(pairs: Vec<(usize, usize)>) -> Self {
        Self { pairs }
    }

    fn within(a: &PeakNode, da: usize, b: &PeakNode, db: usize) -> bool {
        match (a.dims.get(da), b.dims.get(db)) {
            (Some(x), Some(y)) => (x.value - y.value).abs() <= x.tolerance + y.tolerance,
            _ => false,
        }
    }
}

impl OverlapTest for DimensionOverlap {
    fn consistent(&self, peak: &PeakNode, neighbour: &PeakNode, side: Side) -> bool {
        if self.pairs.is_empty() || peak.padding || neighbour.padding {
            return false;
        }
        self.pairs.iter().all(|&(a, b)| match side {
            Side::Prev => Self::within(peak, a, neighbour, b),
            Side::Next => Self::within(neighbour, a, peak, b),
        })
    }
}

/// Bonus added on top of the raw score given which neighbour sides exist and agree.
pub fn context_bonus(has_prev: bool, prev_ok: bool, has_next: bool, next_ok: bool) -> f64 {
    use crate::consts::{CONTEXT_BONUS_FULL, CONTEXT_BONUS_SINGLE};
    match (has_prev, has_next) {
        (true, true) => match (prev_ok, next_ok) {
            (true, true) => CONTEXT_BONUS_FULL,
            (true, false) | (false, true) => CONTEXT_BONUS_SINGLE,
            (false, false) => 0.0,
        },
        // chain end: its only neighbour agreeing is as good as it gets
        (true, false) if prev_ok => CONTEXT_BONUS_FULL,
        (false, true) if next_ok => CONTEXT_BONUS_FULL,
        _ => 0.0,
    }
}
