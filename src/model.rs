use crate::error::{SfResult, ShiftForgeError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// A predicted shift owner: the value the prediction model expects and its uncertainty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Atom {
    pub id: String,
    pub value: f64,
    pub sigma: f64,
}

/// One measured coordinate of a peak.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PeakDim {
    pub value: f64,
    pub tolerance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Peak {
    pub id: String,
    pub dims: Vec<PeakDim>,
}

/// A matchable unit (for example a residue) with one atom slot per peak dimension.
/// `None` marks a dimension the entity structurally lacks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityDef {
    pub id: String,
    pub atoms: Vec<Option<String>>,
    #[serde(default)]
    pub prev: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Problem {
    pub dimensions: Vec<String>,
    pub atoms: Vec<Atom>,
    pub entities: Vec<EntityDef>,
    pub peaks: Vec<Peak>,
    /// (dimension of a peak, dimension of its neighbour's peak) pairs that must agree
    /// for two chain neighbours to count as consistent.
    #[serde(default)]
    pub overlap: Vec<(usize, usize)>,
}

impl Problem {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> SfResult<Self> {
        let content = fs::read_to_string(path)?;
        let problem: Problem = serde_json::from_str(&content)?;
        problem.validate()?;
        Ok(problem)
    }

    pub fn dim_count(&self) -> usize {
        self.dimensions.len()
    }

    pub fn atom_index(&self) -> HashMap<&str, usize> {
        self.atoms
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id.as_str(), i))
            .collect()
    }

    pub fn entity_index(&self) -> HashMap<&str, usize> {
        self.entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.as_str(), i))
            .collect()
    }

    /// Checks the problem is well formed before any matching starts.
    pub fn validate(&self) -> SfResult<()> {
        let dims = self.dim_count();
        if dims == 0 {
            return Err(ShiftForgeError::Validation(
                "Problem declares no dimensions".to_string(),
            ));
        }
        if self.entities.is_empty() {
            return Err(ShiftForgeError::Validation(
                "Problem has no entities".to_string(),
            ));
        }
        if self.peaks.is_empty() {
            return Err(ShiftForgeError::Validation(
                "Problem has no peaks".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for atom in &self.atoms {
            if !seen.insert(atom.id.as_str()) {
                return Err(ShiftForgeError::Validation(format!(
                    "Duplicate atom id '{}'",
                    atom.id
                )));
            }
            if !atom.value.is_finite() {
                return Err(ShiftForgeError::Validation(format!(
                    "Atom '{}' has a non-finite predicted value",
                    atom.id
                )));
            }
            if !(atom.sigma >= 0.0) {
                return Err(ShiftForgeError::Validation(format!(
                    "Atom '{}' has an invalid sigma {}",
                    atom.id, atom.sigma
                )));
            }
        }

        let atoms = self.atom_index();
        let entities = self.entity_index();
        if entities.len() != self.entities.len() {
            return Err(ShiftForgeError::Validation(
                "Entity ids are not unique".to_string(),
            ));
        }

        for entity in &self.entities {
            if entity.atoms.len() != dims {
                return Err(ShiftForgeError::Validation(format!(
                    "Entity '{}' has {} atom slots, expected {}",
                    entity.id,
                    entity.atoms.len(),
                    dims
                )));
            }
            if entity.atoms.iter().all(Option::is_none) {
                return Err(ShiftForgeError::Validation(format!(
                    "Entity '{}' has no structurally present dimension",
                    entity.id
                )));
            }
            for id in entity.atoms.iter().flatten() {
                if !atoms.contains_key(id.as_str()) {
                    return Err(ShiftForgeError::Validation(format!(
                        "Entity '{}' references unknown atom '{}'",
                        entity.id, id
                    )));
                }
            }
            for neighbour in [&entity.prev, &entity.next].into_iter().flatten() {
                if !entities.contains_key(neighbour.as_str()) {
                    return Err(ShiftForgeError::Validation(format!(
                        "Entity '{}' references unknown neighbour '{}'",
                        entity.id, neighbour
                    )));
                }
            }
        }

        for peak in &self.peaks {
            if peak.dims.len() != dims {
                return Err(ShiftForgeError::Validation(format!(
                    "Peak '{}' has {} dimensions, expected {}",
                    peak.id,
                    peak.dims.len(),
                    dims
                )));
            }
            if peak.dims.iter().any(|d| !(d.tolerance >= 0.0)) {
                return Err(ShiftForgeError::Validation(format!(
                    "Peak '{}' has an invalid tolerance",
                    peak.id
                )));
            }
        }

        for &(a, b) in &self.overlap {
            if a >= dims || b >= dims {
                return Err(ShiftForgeError::Validation(format!(
                    "Overlap pair ({}, {}) is out of range for {} dimensions",
                    a, b, dims
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> Problem {
        Problem {
            dimensions: vec!["H".into()],
            atoms: vec![Atom {
                id: "a".into(),
                value: 8.0,
                sigma: 0.2,
            }],
            entities: vec![EntityDef {
                id: "e".into(),
                atoms: vec![Some("a".into())],
                prev: None,
                next: None,
            }],
            peaks: vec![Peak {
                id: "p".into(),
                dims: vec![PeakDim {
                    value: 8.1,
                    tolerance: 0.05,
                }],
            }],
            overlap: vec![],
        }
    }

    #[test]
    fn test_valid_problem() {
        assert!(tiny().validate().is_ok());
    }

    #[test]
    fn test_rejects_dimension_mismatch() {
        let mut p = tiny();
        p.peaks[0].dims.push(PeakDim {
            value: 120.0,
            tolerance: 0.3,
        });
        assert!(matches!(p.validate(), Err(ShiftForgeError::Validation(_))));
    }

    #[test]
    fn test_rejects_empty_entity() {
        let mut p = tiny();
        p.entities[0].atoms = vec![None];
        assert!(matches!(p.validate(), Err(ShiftForgeError::Validation(_))));
    }

    #[test]
    fn test_rejects_unknown_neighbour() {
        let mut p = tiny();
        p.entities[0].next = Some("ghost".into());
        assert!(p.validate().is_err());
    }
}
