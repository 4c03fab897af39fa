use crate::consts::MIN_TAIL_PROB;
use statrs::function::erf::erfc;
use std::f64::consts::SQRT_2;

/// Two-sided tail probability of a deviation of `x` standard deviations.
#[inline]
pub fn tail_probability(x: f64) -> f64 {
    if !x.is_finite() {
        return 0.0;
    }
    erfc(x.abs() / SQRT_2)
}

/// `ln(1 - erf(|x|/sqrt 2))`, clamped so it never reaches -inf.
#[inline]
pub fn log_tail(x: f64) -> f64 {
    tail_probability(x).max(MIN_TAIL_PROB).ln()
}

/// Normalised log-probability scale: 1.0 for a perfect hit, 0.0 at the reference deviation,
/// negative beyond it.
#[derive(Debug, Clone, Copy)]
pub struct QualityScale {
    reference: f64,
}

impl QualityScale {
    pub fn new(reference_deviation: f64) -> Self {
        let reference = log_tail(reference_deviation).abs();
        Self {
            // A zero reference would divide by zero; fall back to the 2-sigma scale.
            reference: if reference > 0.0 {
                reference
            } else {
                log_tail(crate::consts::DEFAULT_REFERENCE_DEVIATION).abs()
            },
        }
    }

    #[inline]
    pub fn normalized(&self, x: f64) -> f64 {
        1.0 + log_tail(x) / self.reference
    }

    /// Quality floor used for degenerate inputs.
    #[inline]
    pub fn worst(&self) -> f64 {
        1.0 + MIN_TAIL_PROB.ln() / self.reference
    }

    /// Quality of `delta` measured in units of `width`. Zero, negative or non-finite
    /// widths and deltas map to the floor.
    #[inline]
    pub fn deviation(&self, delta: f64, width: f64) -> f64 {
        if !(width > 0.0) || !width.is_finite() || !delta.is_finite() {
            return self.worst();
        }
        self.normalized(delta / width)
    }
}

impl Default for QualityScale {
    fn default() -> Self {
        Self::new(crate::consts::DEFAULT_REFERENCE_DEVIATION)
    }
}
