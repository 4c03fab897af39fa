use crate::core_types::invert;
use fastrand::Rng;

const EMPTY: usize = usize::MAX;

/// Partially-matched crossover (PMX) for permutations.
///
/// Copies a random slice of `p1`, then places the `p2` genes of that slice through the
/// p1/p2 position mapping and fills the rest from `p2` directly. The child is always a
/// permutation of the parents' genes.
pub fn crossover_pmx(p1: &[usize], p2: &[usize], rng: &mut Rng) -> Vec<usize> {
    let len = p1.len();
    if len < 2 || p2.len() != len {
        return p1.to_vec();
    }

    let mut a = rng.usize(0..len);
    let mut b = rng.usize(0..len);
    if a > b {
        std::mem::swap(&mut a, &mut b);
    }
    crossover_pmx_segment(p1, p2, a, b)
}

/// PMX with an explicit inclusive segment `[a, b]`.
pub fn crossover_pmx_segment(p1: &[usize], p2: &[usize], a: usize, b: usize) -> Vec<usize> {
    let len = p1.len();
    let mut child = vec![EMPTY; len];
    let mut placed = vec![false; len];
    let p2_pos = invert(p2);

    for i in a..=b {
        child[i] = p1[i];
        placed[p1[i]] = true;
    }

    for i in a..=b {
        let gene = p2[i];
        if placed[gene] {
            continue;
        }
        // follow the mapping until it leaves the copied segment
        let mut pos = i;
        loop {
            pos = p2_pos[p1[pos]];
            if pos < a || pos > b {
                break;
            }
        }
        child[pos] = gene;
        placed[gene] = true;
    }

    for i in 0..len {
        if child[i] == EMPTY {
            child[i] = p2[i];
        }
    }

    debug_assert!(crate::core_types::is_permutation(&child));
    child
}
