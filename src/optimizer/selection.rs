use super::Chromosome;
use fastrand::Rng;
use std::cmp::Ordering;

/// Best first. Unevaluated chromosomes sort last.
pub fn sort_by_fitness(population: &mut [Chromosome]) {
    population.sort_by(|a, b| compare(b, a));
}

#[inline]
fn compare(a: &Chromosome, b: &Chromosome) -> Ordering {
    a.score().total_cmp(&b.score())
}

/// Draws `k` members at random (with replacement) and returns the fittest.
pub fn tournament<'a>(population: &'a [Chromosome], k: usize, rng: &mut Rng) -> &'a Chromosome {
    let mut best = &population[rng.usize(0..population.len())];
    for _ in 1..k.max(1) {
        let challenger = &population[rng.usize(0..population.len())];
        if compare(challenger, best) == Ordering::Greater {
            best = challenger;
        }
    }
    best
}
