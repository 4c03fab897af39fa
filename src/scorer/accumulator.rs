use super::quality::{tail_probability, QualityScale};
use crate::config::ScoringWeights;

#[derive(Debug, Clone, Copy)]
pub struct AccumulatorSettings {
    pub missing_value: f64,
    pub reject_factor: f64,
    pub spread_factor: f64,
}

impl From<&ScoringWeights> for AccumulatorSettings {
    fn from(w: &ScoringWeights) -> Self {
        Self {
            missing_value: w.missing_value,
            reject_factor: w.reject_factor,
            spread_factor: w.spread_factor,
        }
    }
}

impl Default for AccumulatorSettings {
    fn default() -> Self {
        Self::from(&ScoringWeights::default())
    }
}

/// Observed values collected for one atom while a single matching is evaluated.
#[derive(Debug, Clone)]
pub struct ShiftAccumulator {
    settings: AccumulatorSettings,
    contributions: Vec<(f64, f64)>,
    average: f64,
}

impl ShiftAccumulator {
    pub fn new(settings: AccumulatorSettings) -> Self {
        Self {
            settings,
            contributions: Vec::new(),
            average: 0.0,
        }
    }

    pub fn count(&self) -> usize {
        self.contributions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }

    pub fn average(&self) -> f64 {
        self.average
    }

    pub fn contributions(&self) -> &[(f64, f64)] {
        &self.contributions
    }

    /// Returns whether the value was accepted.
    pub fn add_value(&mut self, value: f64, tolerance: f64) -> bool {
        if value.is_nan() || value == self.settings.missing_value {
            return false;
        }
        if !self.contributions.is_empty()
            && !((value - self.average).abs() < tolerance * self.settings.reject_factor)
        {
            return false;
        }
        self.contributions.push((value, tolerance));
        let n = self.contributions.len() as f64;
        self.average += (value - self.average) / n;
        true
    }

    pub fn clear(&mut self) {
        self.contributions.clear();
        self.average = 0.0;
    }

    /// Best single-value estimate: the running mean once something was observed.
    #[inline]
    pub fn estimate(&self, predicted: f64) -> f64 {
        if self.contributions.is_empty() {
            predicted
        } else {
            self.average
        }
    }

    /// Tail probability of `value` against the current estimate, with the wider of the
    /// atom sigma and the peak tolerance as the width.
    pub fn get_prob(&self, value: f64, tolerance: f64, predicted: f64, sigma: f64) -> f64 {
        if value.is_nan() || value == self.settings.missing_value {
            return 0.0;
        }
        let width = sigma.max(tolerance);
        if !(width > 0.0) {
            return if value == self.estimate(predicted) { 1.0 } else { 0.0 };
        }
        tail_probability((value - self.estimate(predicted)) / width)
    }

    pub fn quality_vs_predicted(&self, predicted: f64, sigma: f64, scale: &QualityScale) -> f64 {
        scale.deviation(self.average - predicted, sigma)
    }

    pub fn quality_of_consistency(&self, scale: &QualityScale) -> f64 {
        let spread = self.settings.spread_factor;
        self.contributions
            .iter()
            .map(|&(value, tolerance)| scale.deviation(value - self.average, tolerance * spread))
            .sum()
    }
}
