use crate::error::{SfResult, ShiftForgeError};

/// Dense square weight matrix, row-major (`data[row * n + col]`).
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMatrix {
    pub n: usize,
    pub data: Vec<f64>,
}

impl WeightMatrix {
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    #[inline(always)]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n + col]
    }

    #[inline(always)]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.n + col] = value;
    }
}

/// Maximum-weight perfect bipartite matching on a square matrix.
///
/// Zero or negative cells are legal and simply never preferred; callers decide afterwards
/// whether a chosen cell counts as a real assignment.
pub trait AssignmentSolver: Send + Sync {
    fn solve(&self, weights: &WeightMatrix) -> SfResult<Vec<usize>>;
}

/// Kuhn-Munkres with row/column potentials, O(n^3). Deterministic for a given matrix.
#[derive(Debug, Clone, Copy, Default)]
pub struct HungarianSolver;

impl AssignmentSolver for HungarianSolver {
    fn solve(&self, weights: &WeightMatrix) -> SfResult<Vec<usize>> {
        let n = weights.n;
        if weights.data.len() != n * n {
            return Err(ShiftForgeError::Solver(format!(
                "weight matrix is not square: {} cells for n = {}",
                weights.data.len(),
                n
            )));
        }
        if n == 0 {
            return Ok(Vec::new());
        }
        if let Some(bad) = weights.data.iter().position(|w| !w.is_finite()) {
            return Err(ShiftForgeError::Solver(format!(
                "non-finite weight at row {}, col {}",
                bad / n,
                bad % n
            )));
        }

        // maximise weight == minimise (max - weight)
        let max = weights.data.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        let cost = |i: usize, j: usize| max - weights.get(i, j);

        // 1-based potentials; column 0 is the virtual start
        let mut u = vec![0.0f64; n + 1];
        let mut v = vec![0.0f64; n + 1];
        let mut owner = vec![0usize; n + 1];
        let mut way = vec![0usize; n + 1];

        for row in 1..=n {
            owner[0] = row;
            let mut j0 = 0;
            let mut minv = vec![f64::INFINITY; n + 1];
            let mut used = vec![false; n + 1];

            loop {
                used[j0] = true;
                let i0 = owner[j0];
                let mut delta = f64::INFINITY;
                let mut j1 = 0;

                for j in 1..=n {
                    if used[j] {
                        continue;
                    }
                    let cur = cost(i0 - 1, j - 1) - u[i0] - v[j];
                    if cur < minv[j] {
                        minv[j] = cur;
                        way[j] = j0;
                    }
                    if minv[j] < delta {
                        delta = minv[j];
                        j1 = j;
                    }
                }

                if j1 == 0 {
                    return Err(ShiftForgeError::Solver(
                        "no augmenting column found".to_string(),
                    ));
                }

                for j in 0..=n {
                    if used[j] {
                        u[owner[j]] += delta;
                        v[j] -= delta;
                    } else {
                        minv[j] -= delta;
                    }
                }

                j0 = j1;
                if owner[j0] == 0 {
                    break;
                }
            }

            loop {
                let j1 = way[j0];
                owner[j0] = owner[j1];
                j0 = j1;
                if j0 == 0 {
                    break;
                }
            }
        }

        let mut assignment = vec![0usize; n];
        for j in 1..=n {
            assignment[owner[j] - 1] = j - 1;
        }
        Ok(assignment)
    }
}
