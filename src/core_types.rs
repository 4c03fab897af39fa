/// A complete assignment over the padded index space: `matching[entity] = peak`.
///
/// Always a permutation of `0..size`. Whether a row is really assigned is decided by the
/// candidate graph: a row sitting on a padding column, or on a column it has no edge to,
/// counts as unassigned.
pub type Matching = Vec<usize>;

/// Per-entity required peak used to force pairs into a seed matching.
pub type Requirement = Vec<Option<usize>>;

/// True if `matching` is a permutation of `0..matching.len()`.
pub fn is_permutation(matching: &[usize]) -> bool {
    let mut seen = vec![false; matching.len()];
    for &p in matching {
        if p >= seen.len() || seen[p] {
            return false;
        }
        seen[p] = true;
    }
    true
}

/// Inverse permutation: `inverse[peak] = entity`.
pub fn invert(matching: &[usize]) -> Vec<usize> {
    let mut inverse = vec![0; matching.len()];
    for (e, &p) in matching.iter().enumerate() {
        inverse[p] = e;
    }
    inverse
}
